use log::{debug, warn};
use std::cell::Cell;
use std::rc::Rc;
use wasm_bindgen::JsCast;
use web_sys::{Document, Element, HtmlImageElement};

use crate::dom;
use crate::error::Result;
use crate::overlay::{self, Openable};

/// Index into a fixed-length sequence, always reduced modulo its length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GallerySelection {
    index: usize,
    len: usize,
}

impl GallerySelection {
    pub fn new(len: usize) -> Self {
        Self { index: 0, len }
    }

    #[cfg(test)]
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn select(&mut self, index: usize) -> Option<usize> {
        if self.len == 0 {
            return None;
        }
        self.index = index % self.len;
        Some(self.index)
    }

    pub fn next(&mut self) -> Option<usize> {
        if self.len == 0 {
            return None;
        }
        self.index = (self.index + 1) % self.len;
        Some(self.index)
    }

    pub fn previous(&mut self) -> Option<usize> {
        if self.len == 0 {
            return None;
        }
        self.index = (self.index + self.len - 1) % self.len;
        Some(self.index)
    }
}

/// The modal view the gallery projects entries into.
pub trait GalleryView {
    /// Returns `false` when the entry or the modal parts are missing.
    fn project(&self, index: usize) -> Result<bool>;
    fn show(&self) -> Result<()>;
    fn hide(&self) -> Result<()>;
}

pub struct GalleryModal {
    selection: Cell<GallerySelection>,
    open: Cell<bool>,
    view: Box<dyn GalleryView>,
}

impl GalleryModal {
    pub fn new(len: usize, view: Box<dyn GalleryView>) -> Self {
        Self {
            selection: Cell::new(GallerySelection::new(len)),
            open: Cell::new(false),
            view,
        }
    }

    #[cfg(test)]
    pub fn current(&self) -> usize {
        self.selection.get().index()
    }

    pub fn open_at(&self, index: usize) -> Result<()> {
        let mut selection = self.selection.get();
        let Some(index) = selection.select(index) else {
            return Ok(());
        };
        if !self.view.project(index)? {
            return Ok(());
        }
        self.selection.set(selection);
        self.view.show()?;
        self.open.set(true);
        debug!("Gallery opened at {}", index);
        Ok(())
    }

    pub fn next(&self) -> Result<()> {
        self.step(GallerySelection::next)
    }

    pub fn previous(&self) -> Result<()> {
        self.step(GallerySelection::previous)
    }

    fn step(&self, advance: fn(&mut GallerySelection) -> Option<usize>) -> Result<()> {
        let mut selection = self.selection.get();
        if let Some(index) = advance(&mut selection) {
            self.selection.set(selection);
            self.view.project(index)?;
        }
        Ok(())
    }

    /// Escape closes, arrows navigate; inert while the modal is closed.
    pub fn handle_key(&self, key: &str) -> Result<()> {
        if !self.open.get() {
            return Ok(());
        }
        match key {
            "ArrowLeft" => self.previous(),
            "ArrowRight" => self.next(),
            _ => self.dismiss_on(key).map(|_| ()),
        }
    }
}

impl Openable for GalleryModal {
    fn is_open(&self) -> bool {
        self.open.get()
    }

    fn close(&self) -> Result<()> {
        self.view.hide()?;
        self.open.set(false);
        Ok(())
    }
}

struct ModalView {
    items: Vec<Element>,
    modal: Element,
    image: HtmlImageElement,
    caption: Element,
}

impl GalleryView for ModalView {
    fn project(&self, index: usize) -> Result<bool> {
        let Some(item) = self.items.get(index) else {
            return Ok(false);
        };
        let img = dom::query_in::<HtmlImageElement>(item, "img");
        let caption = dom::query_in::<Element>(item, ".gallery-caption");
        let (Some(img), Some(caption)) = (img, caption) else {
            return Ok(false);
        };
        self.image.set_src(&img.src());
        self.image.set_alt(&img.alt());
        self.caption.set_text_content(caption.text_content().as_deref());
        Ok(true)
    }

    fn show(&self) -> Result<()> {
        dom::set_style(&self.modal, "display", "flex")
    }

    fn hide(&self) -> Result<()> {
        dom::set_style(&self.modal, "display", "none")
    }
}

pub fn init(document: &Document) -> Result<()> {
    let items = dom::query_all(document, ".gallery-item");
    let modal = dom::by_id::<Element>(document, "gallery-modal");
    let image = dom::by_id::<HtmlImageElement>(document, "modal-image");
    let caption = dom::by_id::<Element>(document, "modal-caption");
    let (Some(modal), Some(image), Some(caption)) = (modal, image, caption) else {
        return Ok(());
    };

    let gallery = Rc::new(GalleryModal::new(
        items.len(),
        Box::new(ModalView {
            items: items.clone(),
            modal: modal.clone(),
            image,
            caption,
        }),
    ));

    for (index, item) in items.iter().enumerate() {
        let gallery = gallery.clone();
        dom::listen(item, "click", move |_| {
            if let Err(e) = gallery.open_at(index) {
                warn!("Failed to open gallery: {}", e);
            }
        })?;
    }

    {
        let gallery = gallery.clone();
        let backdrop = modal.clone();
        dom::listen(&modal, "click", move |event| {
            let on_close_button = event
                .target()
                .and_then(|t| t.dyn_into::<Element>().ok())
                .map_or(false, |el| el.class_list().contains("modal-close"));
            if dom::is_target(&event, &backdrop) || on_close_button {
                if let Err(e) = gallery.close() {
                    warn!("Failed to close gallery: {}", e);
                }
            }
        })?;
    }

    if let Some(prev) = dom::query::<Element>(document, ".gallery-btn.prev") {
        let gallery = gallery.clone();
        dom::listen(&prev, "click", move |event| {
            event.stop_propagation();
            if let Err(e) = gallery.previous() {
                warn!("Gallery navigation failed: {}", e);
            }
        })?;
    }
    if let Some(next) = dom::query::<Element>(document, ".gallery-btn.next") {
        let gallery = gallery.clone();
        dom::listen(&next, "click", move |event| {
            event.stop_propagation();
            if let Err(e) = gallery.next() {
                warn!("Gallery navigation failed: {}", e);
            }
        })?;
    }

    overlay::on_key(document, move |key| gallery.handle_key(key))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    #[derive(Default)]
    struct Projection {
        shown: Vec<usize>,
        visible: bool,
    }

    struct FakeView {
        len: usize,
        state: Rc<RefCell<Projection>>,
    }

    impl GalleryView for FakeView {
        fn project(&self, index: usize) -> Result<bool> {
            if index >= self.len {
                return Ok(false);
            }
            self.state.borrow_mut().shown.push(index);
            Ok(true)
        }

        fn show(&self) -> Result<()> {
            self.state.borrow_mut().visible = true;
            Ok(())
        }

        fn hide(&self) -> Result<()> {
            self.state.borrow_mut().visible = false;
            Ok(())
        }
    }

    fn gallery(len: usize) -> (GalleryModal, Rc<RefCell<Projection>>) {
        let state = Rc::new(RefCell::new(Projection::default()));
        let view = FakeView { len, state: state.clone() };
        (GalleryModal::new(len, Box::new(view)), state)
    }

    #[test]
    fn wraps_around_at_both_ends() {
        for n in 1..=5 {
            for i in [0, n - 1] {
                let mut selection = GallerySelection::new(n);
                selection.select(i);
                assert_eq!(selection.next(), Some((i + 1) % n));

                let mut selection = GallerySelection::new(n);
                selection.select(i);
                assert_eq!(selection.previous(), Some((i + n - 1) % n));
            }
        }
    }

    #[test]
    fn empty_selection_never_moves() {
        let mut selection = GallerySelection::new(0);
        assert!(selection.is_empty());
        assert_eq!(selection.next(), None);
        assert_eq!(selection.previous(), None);
        assert_eq!(selection.select(3), None);
    }

    #[test]
    fn keyboard_is_inert_while_closed() {
        let (gallery, state) = gallery(3);
        gallery.handle_key("ArrowRight").unwrap();
        gallery.handle_key("Escape").unwrap();
        assert_eq!(gallery.current(), 0);
        assert!(state.borrow().shown.is_empty());
    }

    #[test]
    fn arrows_navigate_and_escape_closes() {
        let (gallery, state) = gallery(3);
        gallery.open_at(2).unwrap();
        assert!(gallery.is_open());

        gallery.handle_key("ArrowRight").unwrap();
        assert_eq!(gallery.current(), 0);
        gallery.handle_key("ArrowLeft").unwrap();
        gallery.handle_key("ArrowLeft").unwrap();
        assert_eq!(gallery.current(), 1);

        gallery.handle_key("Escape").unwrap();
        assert!(!gallery.is_open());
        let state = state.borrow();
        assert!(!state.visible);
        assert_eq!(state.shown, vec![2, 0, 2, 1]);
    }

    #[test]
    fn reopening_resets_selection() {
        let (gallery, _) = gallery(4);
        gallery.open_at(1).unwrap();
        gallery.next().unwrap();
        gallery.close().unwrap();

        gallery.open_at(3).unwrap();
        assert_eq!(gallery.current(), 3);
    }
}
