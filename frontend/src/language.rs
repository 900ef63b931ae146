use log::{debug, warn};
use serde::Serialize;
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use web_sys::{CustomEvent, CustomEventInit, Document, Element, HtmlInputElement};

use crate::dom;
use crate::error::Result;
use crate::i18n::Language;

pub const LANGUAGE_CHANGED_EVENT: &str = "languageChanged";

struct BusInner {
    current: Cell<Language>,
    subscribers: RefCell<Vec<Box<dyn Fn(Language)>>>,
}

/// Current language plus in-process listeners. Cheap to clone.
#[derive(Clone)]
pub struct LanguageBus {
    inner: Rc<BusInner>,
}

impl LanguageBus {
    pub fn new(initial: Language) -> Self {
        Self {
            inner: Rc::new(BusInner {
                current: Cell::new(initial),
                subscribers: RefCell::new(Vec::new()),
            }),
        }
    }

    pub fn current(&self) -> Language {
        self.inner.current.get()
    }

    /// Hook for in-process listeners; nothing on the page subscribes yet.
    #[allow(dead_code)]
    pub fn subscribe(&self, listener: impl Fn(Language) + 'static) {
        self.inner.subscribers.borrow_mut().push(Box::new(listener));
    }

    /// Only `LanguageManager` writes. Returns `false` for a self-transition.
    pub(crate) fn publish(&self, lang: Language) -> bool {
        if self.inner.current.replace(lang) == lang {
            return false;
        }
        for listener in self.inner.subscribers.borrow().iter() {
            listener(lang);
        }
        true
    }
}

/// Everything on the page that reflects the current language.
pub trait LanguageSurface {
    fn apply(&self, lang: Language) -> Result<()>;
    fn announce(&self, lang: Language) -> Result<()>;
}

pub struct LanguageManager {
    bus: LanguageBus,
    surface: Rc<dyn LanguageSurface>,
}

impl LanguageManager {
    pub fn new(bus: LanguageBus, surface: Rc<dyn LanguageSurface>) -> Self {
        Self { bus, surface }
    }

    #[cfg(test)]
    pub fn current(&self) -> Language {
        self.bus.current()
    }

    /// Returns `Ok(false)` without touching anything when `lang` is already active.
    pub fn set_language(&self, lang: Language) -> Result<bool> {
        if self.bus.current() == lang {
            return Ok(false);
        }
        self.surface.apply(lang)?;
        self.bus.publish(lang);
        self.surface.announce(lang)?;
        debug!("Language switched to {}", lang);
        Ok(true)
    }
}

#[derive(Serialize)]
struct LanguageChangedDetail {
    language: Language,
}

/// Document-backed surface: `lang` attribute, both toggles, meta tags,
/// ARIA labels and the `languageChanged` DOM event.
pub struct DocumentLanguage {
    document: Document,
    root: Element,
    toggles: Vec<HtmlInputElement>,
}

impl DocumentLanguage {
    pub fn new(document: Document, root: Element) -> Self {
        let toggles = ["lang-toggle", "mobile-lang-toggle"]
            .iter()
            .filter_map(|id| dom::by_id::<HtmlInputElement>(&document, id))
            .collect();
        Self {
            document,
            root,
            toggles,
        }
    }

    pub fn update_meta_tags(&self, lang: Language) -> Result<()> {
        let meta = lang.page_meta();
        if let Some(tag) = dom::query::<Element>(&self.document, "meta[name=\"description\"]") {
            tag.set_attribute("content", meta.description)?;
        }
        self.document.set_title(meta.title);
        Ok(())
    }

    fn update_aria_labels(&self, lang: Language) -> Result<()> {
        let labels = lang.aria_labels();
        let targets = [
            (".gallery-btn.prev", labels.prev_image),
            (".gallery-btn.next", labels.next_image),
            (".modal-close", labels.close_modal),
            (".mobile-menu-toggle", labels.open_menu),
            (".mobile-menu-close", labels.close_menu),
        ];
        for (selector, label) in targets {
            if let Some(el) = dom::query::<Element>(&self.document, selector) {
                el.set_attribute("aria-label", label)?;
            }
        }
        Ok(())
    }
}

impl LanguageSurface for DocumentLanguage {
    fn apply(&self, lang: Language) -> Result<()> {
        self.root.set_attribute("lang", lang.code())?;
        for toggle in &self.toggles {
            toggle.set_checked(lang.toggle_checked());
        }
        self.update_meta_tags(lang)?;
        self.update_aria_labels(lang)
    }

    fn announce(&self, lang: Language) -> Result<()> {
        let detail = serde_wasm_bindgen::to_value(&LanguageChangedDetail { language: lang })?;
        let init = CustomEventInit::new();
        init.set_detail(&detail);
        let event = CustomEvent::new_with_event_init_dict(LANGUAGE_CHANGED_EVENT, &init)?;
        self.document.dispatch_event(&event)?;
        Ok(())
    }
}

/// Wires the desktop and mobile toggles to a manager seeded from the document.
pub fn init(document: &Document, bus: &LanguageBus) -> Result<Rc<LanguageManager>> {
    let root = document
        .document_element()
        .ok_or(crate::error::SiteError::MissingElement("html"))?;
    let surface = Rc::new(DocumentLanguage::new(document.clone(), root));
    surface.update_meta_tags(bus.current())?;

    let toggles = surface.toggles.clone();
    let manager = Rc::new(LanguageManager::new(bus.clone(), surface));
    for toggle in toggles {
        let manager = manager.clone();
        let source = toggle.clone();
        dom::listen(&toggle, "change", move |_| {
            let lang = Language::from_toggle(source.checked());
            if let Err(e) = manager.set_language(lang) {
                warn!("Failed to switch language: {}", e);
            }
        })?;
    }
    Ok(manager)
}

/// Initial language: the document's declared `lang`, else the configured default.
pub fn initial_language(document: &Document, fallback: Language) -> Language {
    document
        .document_element()
        .and_then(|root| root.get_attribute("lang"))
        .as_deref()
        .and_then(Language::parse)
        .unwrap_or(fallback)
}
