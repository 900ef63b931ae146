use log::Level;

use crate::i18n::Language;

#[cfg(debug_assertions)]
pub fn get_log_level() -> Level {
    Level::Debug // Verbose transitions while developing locally
}

#[cfg(not(debug_assertions))]
pub fn get_log_level() -> Level {
    Level::Info
}

/// When the third-party tag script may be requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalyticsPolicy {
    /// Never fetch the tag script before the visitor accepts.
    DeferUntilConsent,
    /// Fetch the script at startup and gate only the consent signal.
    LoadWithDeniedDefault,
}

impl AnalyticsPolicy {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "defer" => Some(AnalyticsPolicy::DeferUntilConsent),
            "eager" => Some(AnalyticsPolicy::LoadWithDeniedDefault),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SiteConfig {
    pub default_lang: Language,
    pub consent_key: &'static str,
    pub analytics_id: &'static str,
    pub analytics_script_base: &'static str,
    pub cookie_policy_url: &'static str,
    pub analytics_policy: AnalyticsPolicy,
    pub consent_wait_for_update_ms: u32,
    pub banner_fade_ms: u32,
    pub resize_debounce_ms: u32,
    pub scroll_throttle_ms: u32,
    pub scroll_threshold: f64,
    pub tilt_divisor: f64,
    pub perspective_px: u32,
    pub game_pixel_count: usize,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            default_lang: Language::Pl,
            consent_key: "cookieConsent",
            analytics_id: "G-9XDQY1GJGD",
            analytics_script_base: "https://www.googletagmanager.com/gtag/js",
            cookie_policy_url: "https://policies.google.com/technologies/cookies",
            analytics_policy: AnalyticsPolicy::DeferUntilConsent,
            consent_wait_for_update_ms: 500,
            banner_fade_ms: 500,
            resize_debounce_ms: 250,
            scroll_throttle_ms: 16,
            scroll_threshold: 100.0,
            tilt_divisor: 10.0,
            perspective_px: 1000,
            game_pixel_count: 15,
        }
    }
}

impl SiteConfig {
    /// Applies the page-level overrides found on `<html data-default-lang data-analytics-policy>`.
    /// Unknown values keep the defaults.
    pub fn with_overrides(mut self, default_lang: Option<&str>, policy: Option<&str>) -> Self {
        if let Some(lang) = default_lang.and_then(Language::parse) {
            self.default_lang = lang;
        }
        if let Some(policy) = policy.and_then(AnalyticsPolicy::parse) {
            self.analytics_policy = policy;
        }
        self
    }

    pub fn from_document_root(root: &web_sys::Element) -> Self {
        let default_lang = root.get_attribute("data-default-lang");
        let policy = root.get_attribute("data-analytics-policy");
        Self::default().with_overrides(default_lang.as_deref(), policy.as_deref())
    }
}
