use chrono::{DateTime, Utc};
use log::{debug, info};
use serde::Serialize;
use std::cell::Cell;
use std::rc::Rc;

use crate::config::AnalyticsPolicy;
use crate::consent::ConsentState;
use crate::context::{AppContext, CommandSink, ScriptInjector};
use crate::error::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Signal {
    Granted,
    Denied,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConsentSignals {
    pub ad_user_data: Signal,
    pub ad_personalization: Signal,
    pub ad_storage: Signal,
    pub analytics_storage: Signal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wait_for_update: Option<u32>,
}

impl ConsentSignals {
    pub fn all(signal: Signal) -> Self {
        Self {
            ad_user_data: signal,
            ad_personalization: signal,
            ad_storage: signal,
            analytics_storage: signal,
            wait_for_update: None,
        }
    }

    pub fn with_wait_for_update(mut self, ms: u32) -> Self {
        self.wait_for_update = Some(ms);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsentMode {
    Default,
    Update,
}

impl ConsentMode {
    pub fn as_str(self) -> &'static str {
        match self {
            ConsentMode::Default => "default",
            ConsentMode::Update => "update",
        }
    }
}

/// One `gtag(...)` call.
#[derive(Debug, Clone, PartialEq)]
pub enum GtagCommand {
    Consent(ConsentMode, ConsentSignals),
    Js(DateTime<Utc>),
    Config(String),
}

impl GtagCommand {
    pub fn name(&self) -> &'static str {
        match self {
            GtagCommand::Consent(..) => "consent",
            GtagCommand::Js(_) => "js",
            GtagCommand::Config(_) => "config",
        }
    }

    #[cfg(test)]
    pub fn is_grant(&self) -> bool {
        matches!(
            self,
            GtagCommand::Consent(ConsentMode::Update, signals)
                if signals.analytics_storage == Signal::Granted
        )
    }
}

pub fn script_url(base: &str, tag_id: &str) -> String {
    format!("{}?id={}", base, urlencoding::encode(tag_id))
}

/// Feeds consent-mode commands to the tag queue and decides when the tag
/// script itself is requested.
pub struct AnalyticsBridge {
    tag_id: String,
    script_src: String,
    policy: AnalyticsPolicy,
    wait_for_update_ms: u32,
    commands: Rc<dyn CommandSink>,
    scripts: Rc<dyn ScriptInjector>,
    script_loaded: Cell<bool>,
    granted: Cell<bool>,
}

impl AnalyticsBridge {
    pub fn new(ctx: &AppContext) -> Self {
        let config = &ctx.config;
        Self {
            tag_id: config.analytics_id.to_string(),
            script_src: script_url(config.analytics_script_base, config.analytics_id),
            policy: config.analytics_policy,
            wait_for_update_ms: config.consent_wait_for_update_ms,
            commands: ctx.commands.clone(),
            scripts: ctx.scripts.clone(),
            script_loaded: Cell::new(false),
            granted: Cell::new(false),
        }
    }

    /// Pushes the denied default, then either grants right away (stored
    /// consent) or waits for the banner.
    pub fn init(&self, consent: ConsentState) -> Result<()> {
        let denied = ConsentSignals::all(Signal::Denied).with_wait_for_update(self.wait_for_update_ms);
        self.commands
            .push(&GtagCommand::Consent(ConsentMode::Default, denied))?;

        if self.policy == AnalyticsPolicy::LoadWithDeniedDefault {
            self.load_tag()?;
        }

        match consent {
            ConsentState::Granted => self.grant(),
            ConsentState::Undecided => {
                debug!("Analytics waiting for consent ({:?})", self.policy);
                Ok(())
            }
        }
    }

    /// Signals `granted` once; later calls are ignored.
    pub fn grant(&self) -> Result<()> {
        if self.granted.get() {
            return Ok(());
        }
        self.commands.push(&GtagCommand::Consent(
            ConsentMode::Update,
            ConsentSignals::all(Signal::Granted),
        ))?;
        self.granted.set(true);
        info!("Analytics consent granted");

        self.load_tag()
    }

    #[cfg(test)]
    pub fn is_granted(&self) -> bool {
        self.granted.get()
    }

    #[cfg(test)]
    pub fn is_script_loaded(&self) -> bool {
        self.script_loaded.get()
    }

    fn load_tag(&self) -> Result<()> {
        if self.script_loaded.get() {
            return Ok(());
        }
        self.commands.push(&GtagCommand::Js(Utc::now()))?;
        self.commands.push(&GtagCommand::Config(self.tag_id.clone()))?;
        self.scripts.inject(&self.script_src)?;
        self.script_loaded.set(true);
        debug!("Injected analytics tag {}", self.script_src);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SiteConfig;
    use crate::context::testing::fixture;
    use crate::i18n::Language;

    fn names(commands: &[GtagCommand]) -> Vec<&'static str> {
        commands.iter().map(GtagCommand::name).collect()
    }

    #[test]
    fn script_url_encodes_tag_id() {
        assert_eq!(
            script_url("https://www.googletagmanager.com/gtag/js", "G-9XDQY1GJGD"),
            "https://www.googletagmanager.com/gtag/js?id=G-9XDQY1GJGD"
        );
        assert_eq!(script_url("https://x/js", "a b&c"), "https://x/js?id=a%20b%26c");
    }

    #[test]
    fn deferred_policy_never_requests_script_before_consent() {
        let fx = fixture(SiteConfig::default(), Language::Pl);
        let bridge = AnalyticsBridge::new(&fx.ctx);

        bridge.init(ConsentState::Undecided).unwrap();

        assert!(fx.injector.sources.borrow().is_empty());
        let commands = fx.sink.commands.borrow();
        assert_eq!(names(&commands), vec!["consent"]);
        assert_eq!(
            commands[0],
            GtagCommand::Consent(
                ConsentMode::Default,
                ConsentSignals::all(Signal::Denied).with_wait_for_update(500)
            )
        );
    }

    #[test]
    fn deferred_policy_loads_script_after_grant() {
        let fx = fixture(SiteConfig::default(), Language::Pl);
        let bridge = AnalyticsBridge::new(&fx.ctx);
        bridge.init(ConsentState::Undecided).unwrap();

        bridge.grant().unwrap();

        assert_eq!(
            *fx.injector.sources.borrow(),
            vec!["https://www.googletagmanager.com/gtag/js?id=G-9XDQY1GJGD".to_string()]
        );
        assert_eq!(names(&fx.sink.commands.borrow()), vec!["consent", "consent", "js", "config"]);
        assert!(bridge.is_granted() && bridge.is_script_loaded());
    }

    #[test]
    fn eager_policy_loads_script_with_denied_default() {
        let config = SiteConfig::default().with_overrides(None, Some("eager"));
        let fx = fixture(config, Language::En);
        let bridge = AnalyticsBridge::new(&fx.ctx);

        bridge.init(ConsentState::Undecided).unwrap();

        assert_eq!(fx.injector.sources.borrow().len(), 1);
        assert!(!fx.sink.commands.borrow().iter().any(GtagCommand::is_grant));
        assert_eq!(
            fx.sink.commands.borrow()[2],
            GtagCommand::Config("G-9XDQY1GJGD".into())
        );
    }

    #[test]
    fn stored_consent_grants_immediately() {
        let fx = fixture(SiteConfig::default(), Language::Pl);
        let bridge = AnalyticsBridge::new(&fx.ctx);

        bridge.init(ConsentState::Granted).unwrap();

        let grants = fx.sink.commands.borrow().iter().filter(|c| c.is_grant()).count();
        assert_eq!(grants, 1);
        assert_eq!(fx.injector.sources.borrow().len(), 1);
    }

    #[test]
    fn repeated_grant_signals_once_and_injects_once() {
        let config = SiteConfig::default().with_overrides(None, Some("eager"));
        let fx = fixture(config, Language::Pl);
        let bridge = AnalyticsBridge::new(&fx.ctx);
        bridge.init(ConsentState::Undecided).unwrap();

        bridge.grant().unwrap();
        bridge.grant().unwrap();

        let grants = fx.sink.commands.borrow().iter().filter(|c| c.is_grant()).count();
        assert_eq!(grants, 1);
        assert_eq!(fx.injector.sources.borrow().len(), 1);
    }

    #[test]
    fn signals_serialize_with_gtag_field_names() {
        let json = serde_json::to_value(
            ConsentSignals::all(Signal::Denied).with_wait_for_update(500),
        )
        .unwrap();
        assert_eq!(json["analytics_storage"], "denied");
        assert_eq!(json["wait_for_update"], 500);

        let json = serde_json::to_value(ConsentSignals::all(Signal::Granted)).unwrap();
        assert_eq!(json["ad_user_data"], "granted");
        assert!(json.get("wait_for_update").is_none());
    }
}
