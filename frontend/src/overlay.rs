use log::warn;
use std::rc::Rc;
use wasm_bindgen::JsCast;
use web_sys::{Document, KeyboardEvent};

use crate::dom;
use crate::error::Result;

pub const ESCAPE: &str = "Escape";

/// A region of the page that can be shown and dismissed.
pub trait Openable {
    fn is_open(&self) -> bool;
    fn close(&self) -> Result<()>;

    /// Closes on Escape while open; reports whether the key was consumed.
    fn dismiss_on(&self, key: &str) -> Result<bool> {
        if key == ESCAPE && self.is_open() {
            self.close()?;
            return Ok(true);
        }
        Ok(false)
    }
}

/// Forwards document `keydown` to `handler` with the key name.
pub fn on_key(document: &Document, handler: impl Fn(&str) -> Result<()> + 'static) -> Result<()> {
    dom::listen(document, "keydown", move |event| {
        let Some(event) = event.dyn_ref::<KeyboardEvent>() else {
            return;
        };
        if let Err(e) = handler(&event.key()) {
            warn!("Keyboard handler failed: {}", e);
        }
    })
}

pub fn close_on_escape(document: &Document, target: Rc<dyn Openable>) -> Result<()> {
    on_key(document, move |key| target.dismiss_on(key).map(|_| ()))
}
