use log::{debug, warn};
use std::cell::Cell;
use std::rc::Rc;
use web_sys::{Document, Element, HtmlElement};

use crate::config::SiteConfig;
use crate::dom;
use crate::error::Result;
use crate::overlay::{self, Openable};
use crate::utils::{self, FrameGuard, Throttle};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuState {
    Closed,
    Open,
}

/// What opening and closing the mobile menu does to the page.
pub trait MenuSurface {
    fn show(&self) -> Result<()>;
    fn hide(&self) -> Result<()>;
}

pub struct MobileMenu {
    state: Cell<MenuState>,
    surface: Box<dyn MenuSurface>,
}

impl MobileMenu {
    pub fn new(surface: Box<dyn MenuSurface>) -> Self {
        Self {
            state: Cell::new(MenuState::Closed),
            surface,
        }
    }

    #[cfg(test)]
    pub fn state(&self) -> MenuState {
        self.state.get()
    }

    pub fn open(&self) -> Result<()> {
        self.surface.show()?;
        self.state.set(MenuState::Open);
        debug!("Mobile menu opened");
        Ok(())
    }

    pub fn toggle(&self) -> Result<()> {
        match self.state.get() {
            MenuState::Open => self.close(),
            MenuState::Closed => self.open(),
        }
    }
}

impl Openable for MobileMenu {
    fn is_open(&self) -> bool {
        self.state.get() == MenuState::Open
    }

    fn close(&self) -> Result<()> {
        self.surface.hide()?;
        self.state.set(MenuState::Closed);
        Ok(())
    }
}

struct OverlaySurface {
    overlay: Element,
    trigger: Option<Element>,
    body: Option<HtmlElement>,
}

impl MenuSurface for OverlaySurface {
    fn show(&self) -> Result<()> {
        self.overlay.class_list().add_1("active")?;
        if let Some(trigger) = &self.trigger {
            trigger.set_attribute("aria-expanded", "true")?;
        }
        if let Some(body) = &self.body {
            body.style().set_property("overflow", "hidden")?;
        }
        Ok(())
    }

    fn hide(&self) -> Result<()> {
        self.overlay.class_list().remove_1("active")?;
        if let Some(trigger) = &self.trigger {
            trigger.set_attribute("aria-expanded", "false")?;
        }
        if let Some(body) = &self.body {
            body.style().remove_property("overflow")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollDirection {
    Up,
    Down,
}

impl ScrollDirection {
    pub fn as_str(self) -> &'static str {
        match self {
            ScrollDirection::Up => "up",
            ScrollDirection::Down => "down",
        }
    }
}

#[derive(Debug)]
pub struct ScrollTracker {
    last_y: Cell<f64>,
}

impl ScrollTracker {
    pub fn new(initial_y: f64) -> Self {
        Self {
            last_y: Cell::new(initial_y),
        }
    }

    /// Anything that is not strictly further down counts as up.
    pub fn observe(&self, y: f64) -> ScrollDirection {
        let previous = self.last_y.replace(y);
        if y > previous {
            ScrollDirection::Down
        } else {
            ScrollDirection::Up
        }
    }
}

pub fn init(document: &Document, config: &SiteConfig) -> Result<()> {
    let window = dom::window()?;

    let toggle = dom::query::<Element>(document, ".mobile-menu-toggle");
    if let Some(overlay) = dom::query::<Element>(document, ".mobile-nav-overlay") {
        let menu = Rc::new(MobileMenu::new(Box::new(OverlaySurface {
            overlay: overlay.clone(),
            trigger: toggle.clone(),
            body: document.body(),
        })));
        bind_menu(document, &menu, &overlay, toggle.as_ref())?;
    }

    let nav = dom::query::<Element>(document, ".site-nav");
    let announcement = dom::query::<Element>(document, ".announcement-bar");
    let tracker = Rc::new(ScrollTracker::new(window.scroll_y().unwrap_or(0.0)));
    let guard = FrameGuard::default();
    let threshold = config.scroll_threshold;

    let on_scroll = move || {
        let nav = nav.clone();
        let announcement = announcement.clone();
        let tracker = tracker.clone();
        let scheduled = guard.schedule(move || {
            let Ok(y) = dom::window().and_then(|w| w.scroll_y().map_err(Into::into)) else {
                return;
            };
            let direction = tracker.observe(y);
            if let Some(nav) = &nav {
                if let Err(e) = apply_scroll_hooks(nav, announcement.as_ref(), direction, y > threshold) {
                    warn!("Scroll hooks failed: {}", e);
                }
            }
        });
        if let Err(e) = scheduled {
            warn!("Could not schedule scroll frame: {}", e);
        }
    };

    on_scroll();
    let throttle = Throttle::new(config.scroll_throttle_ms);
    dom::listen(&window, "scroll", move |_| throttle.run(&on_scroll))?;
    Ok(())
}

fn bind_menu(
    document: &Document,
    menu: &Rc<MobileMenu>,
    overlay: &Element,
    toggle: Option<&Element>,
) -> Result<()> {
    if let Some(toggle) = toggle {
        let menu = menu.clone();
        dom::listen(toggle, "click", move |_| {
            if let Err(e) = menu.toggle() {
                warn!("Mobile menu toggle failed: {}", e);
            }
        })?;
    }

    let closers = dom::query_all(document, ".mobile-menu-close")
        .into_iter()
        .chain(dom::query_all(document, ".mobile-nav-link"));
    for closer in closers {
        let menu = menu.clone();
        dom::listen(&closer, "click", move |_| {
            if let Err(e) = menu.close() {
                warn!("Mobile menu close failed: {}", e);
            }
        })?;
    }

    {
        let menu = menu.clone();
        let backdrop = overlay.clone();
        dom::listen(overlay, "click", move |event| {
            if dom::is_target(&event, &backdrop) {
                if let Err(e) = menu.close() {
                    warn!("Mobile menu close failed: {}", e);
                }
            }
        })?;
    }

    overlay::close_on_escape(document, menu.clone())
}

fn apply_scroll_hooks(
    nav: &Element,
    announcement: Option<&Element>,
    direction: ScrollDirection,
    scrolled: bool,
) -> Result<()> {
    nav.set_attribute("data-scroll-direction", direction.as_str())?;
    nav.class_list().toggle_with_force("scrolled", scrolled)?;
    if let Some(bar) = announcement {
        let out_of_view = !utils::element_in_viewport(bar)?;
        nav.class_list()
            .toggle_with_force("banner-out-of-view", out_of_view)?;
    }
    Ok(())
}
