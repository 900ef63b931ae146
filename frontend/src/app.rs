use log::{debug, error, info};
use std::rc::Rc;
use web_sys::Document;

use crate::browser::{DataLayer, LocalStorage, ScriptTag};
use crate::components::cookie_banner;
use crate::config::SiteConfig;
use crate::consent::ConsentManager;
use crate::context::AppContext;
use crate::error::{Result, SiteError};
use crate::language::{self, LanguageBus};
use crate::{banner, dom, faq, gallery, mentor_cards, navigation, performance};

/// Runs `start` now if the DOM is parsed, otherwise on `DOMContentLoaded`.
pub fn on_ready(start: impl FnOnce() + 'static) -> Result<()> {
    let document = dom::document()?;
    if dom::ready_state(&document).as_deref() != Some("loading") {
        start();
        return Ok(());
    }
    let mut start = Some(start);
    dom::listen(&document, "DOMContentLoaded", move |_| {
        if let Some(start) = start.take() {
            start();
        }
    })
}

fn report(part: &str, result: Result<()>) {
    match result {
        Ok(()) => debug!("{} ready", part),
        Err(e) => error!("Error initializing {}: {}", part, e),
    }
}

fn browser_context(document: &Document) -> Result<AppContext> {
    let root = document
        .document_element()
        .ok_or(SiteError::MissingElement("html"))?;
    let config = SiteConfig::from_document_root(&root);
    let lang = language::initial_language(document, config.default_lang);
    Ok(AppContext::new(
        config,
        Rc::new(LocalStorage::new()),
        Rc::new(DataLayer::new()?),
        Rc::new(ScriptTag::new(document.clone())),
        LanguageBus::new(lang),
    ))
}

fn start_consent(document: &Document, ctx: &AppContext) -> Result<()> {
    let manager = Rc::new(ConsentManager::new(ctx));
    if let Some(texts) = manager.start()? {
        cookie_banner::mount(document, manager, texts, &ctx.config)?;
    }
    Ok(())
}

/// Each manager binds independently; one failing does not stop the rest.
pub fn start() -> Result<()> {
    let document = dom::document()?;
    let ctx = browser_context(&document)?;

    report("language", language::init(&document, &ctx.language).map(|_| ()));
    report("cookie consent", start_consent(&document, &ctx));
    report("navigation", navigation::init(&document, &ctx.config));
    report("banner", banner::init(&document, &ctx.config));
    report("gallery", gallery::init(&document));
    report("faq", faq::init(&document));
    report("mentor cards", mentor_cards::init(&document, &ctx.config));
    report("performance", performance::init().map(|_| ()));

    info!("Skansen Game Jam 2025 - Application initialized successfully");
    Ok(())
}
