use log::{debug, info, warn};
use std::cell::Cell;
use std::rc::Rc;

use crate::analytics::AnalyticsBridge;
use crate::context::{AppContext, KeyValueStore};
use crate::error::Result;
use crate::i18n::{ConsentTexts, Language};

const GRANTED_VALUE: &str = "true";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsentState {
    Granted,
    Undecided,
}

pub struct ConsentStore {
    storage: Rc<dyn KeyValueStore>,
    key: &'static str,
}

impl ConsentStore {
    pub fn new(ctx: &AppContext) -> Self {
        Self {
            storage: ctx.storage.clone(),
            key: ctx.config.consent_key,
        }
    }

    /// Unavailable storage reads as undecided, so the banner re-prompts.
    pub fn load(&self) -> ConsentState {
        match self.storage.get_item(self.key).as_deref() {
            Some(GRANTED_VALUE) => ConsentState::Granted,
            _ => ConsentState::Undecided,
        }
    }

    pub fn grant(&self) {
        if let Err(e) = self.storage.set_item(self.key, GRANTED_VALUE) {
            warn!("Could not persist cookie consent: {}", e);
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BannerPhase {
    Hidden,
    Visible,
    Hiding,
    Removed,
}

/// Startup read, banner lifecycle and the one-way upgrade to granted.
pub struct ConsentManager {
    store: ConsentStore,
    bridge: AnalyticsBridge,
    phase: Cell<BannerPhase>,
    language: Language,
}

impl ConsentManager {
    pub fn new(ctx: &AppContext) -> Self {
        Self {
            store: ConsentStore::new(ctx),
            bridge: AnalyticsBridge::new(ctx),
            phase: Cell::new(BannerPhase::Hidden),
            language: ctx.language.current(),
        }
    }

    /// Returns the banner strings when the visitor still has to decide.
    pub fn start(&self) -> Result<Option<&'static ConsentTexts>> {
        let state = self.store.load();
        self.bridge.init(state)?;
        match state {
            ConsentState::Granted => {
                debug!("Stored cookie consent found");
                Ok(None)
            }
            ConsentState::Undecided => {
                self.phase.set(BannerPhase::Visible);
                Ok(Some(self.language.consent_texts()))
            }
        }
    }

    /// Persists consent and starts the fade. Returns `false` if the banner
    /// is not showing (double click, already dismissed).
    pub fn accept(&self) -> bool {
        if self.phase.get() != BannerPhase::Visible {
            return false;
        }
        self.store.grant();
        self.phase.set(BannerPhase::Hiding);
        info!("Cookie consent accepted");
        true
    }

    /// Runs after the fade delay: the banner is gone, then analytics hears about it.
    pub fn finish_dismiss(&self) -> Result<()> {
        if self.phase.get() != BannerPhase::Hiding {
            return Ok(());
        }
        self.phase.set(BannerPhase::Removed);
        self.bridge.grant()
    }

    #[cfg(test)]
    pub fn phase(&self) -> BannerPhase {
        self.phase.get()
    }

    #[cfg(test)]
    pub fn bridge(&self) -> &AnalyticsBridge {
        &self.bridge
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::GtagCommand;
    use crate::config::SiteConfig;
    use crate::context::testing::fixture;

    fn grant_count(commands: &[GtagCommand]) -> usize {
        commands.iter().filter(|c| c.is_grant()).count()
    }

    #[test]
    fn fresh_visitor_sees_banner_in_declared_language() {
        for lang in Language::ALL {
            let fx = fixture(SiteConfig::default(), lang);
            let manager = ConsentManager::new(&fx.ctx);

            let texts = manager.start().unwrap().expect("banner should render");

            assert_eq!(texts, lang.consent_texts());
            assert_eq!(manager.phase(), BannerPhase::Visible);
        }
    }

    #[test]
    fn stored_grant_skips_banner_and_grants_analytics() {
        let fx = fixture(SiteConfig::default(), Language::Pl);
        fx.store
            .items
            .borrow_mut()
            .insert("cookieConsent".into(), "true".into());
        let manager = ConsentManager::new(&fx.ctx);

        assert!(manager.start().unwrap().is_none());
        assert_eq!(manager.phase(), BannerPhase::Hidden);
        assert!(manager.bridge().is_granted());
        assert_eq!(grant_count(&fx.sink.commands.borrow()), 1);
    }

    #[test]
    fn unrecognized_stored_value_counts_as_undecided() {
        let fx = fixture(SiteConfig::default(), Language::En);
        fx.store
            .items
            .borrow_mut()
            .insert("cookieConsent".into(), "false".into());
        let store = ConsentStore::new(&fx.ctx);
        assert_eq!(store.load(), ConsentState::Undecided);
    }

    #[test]
    fn unavailable_storage_reprompts_every_load() {
        let fx = fixture(SiteConfig::default(), Language::En);
        fx.store.unavailable.set(true);

        let first = ConsentManager::new(&fx.ctx);
        assert!(first.start().unwrap().is_some());
        assert!(first.accept());
        first.finish_dismiss().unwrap();

        let second = ConsentManager::new(&fx.ctx);
        assert!(second.start().unwrap().is_some());
    }

    #[test]
    fn accept_is_refused_until_the_banner_shows() {
        let fx = fixture(SiteConfig::default(), Language::En);
        let manager = ConsentManager::new(&fx.ctx);

        assert!(!manager.accept());
        assert_eq!(manager.phase(), BannerPhase::Hidden);
        assert!(fx.store.items.borrow().is_empty());
    }

    #[test]
    fn fresh_polish_visitor_accepts_end_to_end() {
        let fx = fixture(SiteConfig::default(), Language::Pl);
        let manager = ConsentManager::new(&fx.ctx);

        let texts = manager.start().unwrap().unwrap();
        assert_eq!(texts.title, "Ciasteczka gry 🎮");
        assert!(fx.injector.sources.borrow().is_empty());

        assert!(manager.accept());
        assert_eq!(
            fx.store.items.borrow().get("cookieConsent").map(String::as_str),
            Some("true")
        );
        // Still fading: nothing signalled yet.
        assert_eq!(manager.phase(), BannerPhase::Hiding);
        assert_eq!(grant_count(&fx.sink.commands.borrow()), 0);

        manager.finish_dismiss().unwrap();
        assert_eq!(manager.phase(), BannerPhase::Removed);
        assert_eq!(grant_count(&fx.sink.commands.borrow()), 1);
        assert_eq!(fx.injector.sources.borrow().len(), 1);

        // Late clicks and timers are ignored.
        assert!(!manager.accept());
        manager.finish_dismiss().unwrap();
        assert_eq!(grant_count(&fx.sink.commands.borrow()), 1);
    }
}
