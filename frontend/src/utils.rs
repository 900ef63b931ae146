use gloo_timers::callback::Timeout;
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::JsCast;

use crate::dom;
use crate::error::Result;

/// A single "already pending" flag shared between a trigger and the
/// callback that eventually runs.
#[derive(Debug, Default)]
pub struct TickGate {
    pending: Cell<bool>,
}

impl TickGate {
    /// Returns `false` when a run is already pending.
    pub fn try_begin(&self) -> bool {
        !self.pending.replace(true)
    }

    pub fn finish(&self) {
        self.pending.set(false);
    }

    #[cfg(test)]
    pub fn is_pending(&self) -> bool {
        self.pending.get()
    }
}

/// Deferred callbacks. Dropping the returned handle cancels the callback.
pub trait Timer {
    type Handle;

    fn after(&self, ms: u32, callback: impl FnOnce() + 'static) -> Self::Handle;
}

/// `setTimeout` through gloo.
#[derive(Debug, Clone, Copy, Default)]
pub struct GlooTimer;

impl Timer for GlooTimer {
    type Handle = Timeout;

    fn after(&self, ms: u32, callback: impl FnOnce() + 'static) -> Timeout {
        Timeout::new(ms, callback)
    }
}

/// Runs the wrapped action once the calls stop arriving for `wait_ms`.
/// Each trigger drops the previous timeout, which cancels it, so the
/// latest argument is the one the action sees.
pub struct Debouncer<A, T: Timer = GlooTimer> {
    wait_ms: u32,
    timer: T,
    pending: RefCell<Option<T::Handle>>,
    action: Rc<dyn Fn(A)>,
}

impl<A: 'static> Debouncer<A> {
    pub fn new(wait_ms: u32, action: impl Fn(A) + 'static) -> Self {
        Self::with_timer(GlooTimer, wait_ms, action)
    }
}

impl<A: 'static, T: Timer> Debouncer<A, T> {
    pub fn with_timer(timer: T, wait_ms: u32, action: impl Fn(A) + 'static) -> Self {
        Self {
            wait_ms,
            timer,
            pending: RefCell::new(None),
            action: Rc::new(action),
        }
    }

    pub fn trigger(&self, arg: A) {
        self.pending.borrow_mut().take();
        let action = self.action.clone();
        let handle = self.timer.after(self.wait_ms, move || action(arg));
        *self.pending.borrow_mut() = Some(handle);
    }
}

/// Leading call wins; calls inside the window are dropped.
pub struct Throttle<T: Timer = GlooTimer> {
    limit_ms: u32,
    timer: T,
    gate: Rc<TickGate>,
    reopen: RefCell<Option<T::Handle>>,
}

impl Throttle {
    pub fn new(limit_ms: u32) -> Self {
        Self::with_timer(GlooTimer, limit_ms)
    }
}

impl<T: Timer> Throttle<T> {
    pub fn with_timer(timer: T, limit_ms: u32) -> Self {
        Self {
            limit_ms,
            timer,
            gate: Rc::new(TickGate::default()),
            reopen: RefCell::new(None),
        }
    }

    pub fn run(&self, action: impl FnOnce()) {
        if !self.gate.try_begin() {
            return;
        }
        action();
        let gate = self.gate.clone();
        let handle = self.timer.after(self.limit_ms, move || gate.finish());
        *self.reopen.borrow_mut() = Some(handle);
    }
}

/// Bounds work to at most one pending animation frame.
#[derive(Clone, Default)]
pub struct FrameGuard {
    gate: Rc<TickGate>,
}

impl FrameGuard {
    pub fn schedule(&self, work: impl FnOnce() + 'static) -> Result<bool> {
        let window = dom::window()?;
        self.schedule_with(work, move |frame| {
            let callback = Closure::once_into_js(move || frame());
            window.request_animation_frame(callback.unchecked_ref())?;
            Ok(())
        })
    }

    /// `request` hands the frame callback to whatever drives frames.
    /// Returns `Ok(false)` while an earlier frame is still pending.
    pub fn schedule_with(
        &self,
        work: impl FnOnce() + 'static,
        request: impl FnOnce(Box<dyn FnOnce()>) -> Result<()>,
    ) -> Result<bool> {
        if !self.gate.try_begin() {
            return Ok(false);
        }
        let gate = self.gate.clone();
        let frame: Box<dyn FnOnce()> = Box::new(move || {
            work();
            gate.finish();
        });
        if let Err(err) = request(frame) {
            self.gate.finish();
            return Err(err);
        }
        Ok(true)
    }
}

/// A per-frame task that reschedules itself while `tick` returns `true`.
/// Dropping the handle cancels the pending frame.
pub struct FrameLoop {
    pending: Rc<Cell<Option<i32>>>,
    callback: Rc<RefCell<Option<Closure<dyn FnMut()>>>>,
}

impl FrameLoop {
    pub fn start(mut tick: impl FnMut() -> bool + 'static) -> Result<Self> {
        let window = dom::window()?;
        let pending = Rc::new(Cell::new(None));
        let callback: Rc<RefCell<Option<Closure<dyn FnMut()>>>> = Rc::new(RefCell::new(None));

        let next_pending = pending.clone();
        let next_callback = callback.clone();
        let frame_window = window.clone();
        *callback.borrow_mut() = Some(Closure::wrap(Box::new(move || {
            next_pending.set(None);
            if !tick() {
                return;
            }
            if let Some(cb) = next_callback.borrow().as_ref() {
                if let Ok(id) = frame_window.request_animation_frame(cb.as_ref().unchecked_ref()) {
                    next_pending.set(Some(id));
                }
            }
        }) as Box<dyn FnMut()>));

        if let Some(cb) = callback.borrow().as_ref() {
            let id = window.request_animation_frame(cb.as_ref().unchecked_ref())?;
            pending.set(Some(id));
        }

        Ok(Self { pending, callback })
    }
}

impl Drop for FrameLoop {
    fn drop(&mut self) {
        if let Some(id) = self.pending.take() {
            if let Some(window) = web_sys::window() {
                let _ = window.cancel_animation_frame(id);
            }
        }
        // Breaks the self-reference held by the frame closure.
        self.callback.borrow_mut().take();
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub top: f64,
    pub left: f64,
    pub bottom: f64,
    pub right: f64,
}

impl From<&web_sys::DomRect> for Rect {
    fn from(rect: &web_sys::DomRect) -> Self {
        Self {
            top: rect.top(),
            left: rect.left(),
            bottom: rect.bottom(),
            right: rect.right(),
        }
    }
}

pub fn is_in_viewport(rect: Rect, viewport_width: f64, viewport_height: f64) -> bool {
    rect.top >= 0.0
        && rect.left >= 0.0
        && rect.bottom <= viewport_height
        && rect.right <= viewport_width
}

/// Checks an element against the window's inner size, falling back to the
/// root element's client size.
pub fn element_in_viewport(element: &web_sys::Element) -> Result<bool> {
    let window = dom::window()?;
    let root = window.document().and_then(|d| d.document_element());
    let width = window
        .inner_width()
        .ok()
        .and_then(|w| w.as_f64())
        .filter(|w| *w > 0.0)
        .or_else(|| root.as_ref().map(|r| r.client_width() as f64))
        .unwrap_or(0.0);
    let height = window
        .inner_height()
        .ok()
        .and_then(|h| h.as_f64())
        .filter(|h| *h > 0.0)
        .or_else(|| root.as_ref().map(|r| r.client_height() as f64))
        .unwrap_or(0.0);
    let rect = Rect::from(&element.get_bounding_client_rect());
    Ok(is_in_viewport(rect, width, height))
}
