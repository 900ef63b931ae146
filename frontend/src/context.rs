//! Capabilities handed to each manager at construction instead of reaching
//! for `window` globals.

use std::rc::Rc;

use crate::analytics::GtagCommand;
use crate::config::SiteConfig;
use crate::error::Result;
use crate::language::LanguageBus;

pub trait KeyValueStore {
    /// `None` when the key is absent or storage is unavailable.
    fn get_item(&self, key: &str) -> Option<String>;
    fn set_item(&self, key: &str, value: &str) -> Result<()>;
}

/// Append-only queue read by the analytics runtime.
pub trait CommandSink {
    fn push(&self, command: &GtagCommand) -> Result<()>;
}

pub trait ScriptInjector {
    fn inject(&self, src: &str) -> Result<()>;
}

#[derive(Clone)]
pub struct AppContext {
    pub config: SiteConfig,
    pub storage: Rc<dyn KeyValueStore>,
    pub commands: Rc<dyn CommandSink>,
    pub scripts: Rc<dyn ScriptInjector>,
    pub language: LanguageBus,
}

impl AppContext {
    pub fn new(
        config: SiteConfig,
        storage: Rc<dyn KeyValueStore>,
        commands: Rc<dyn CommandSink>,
        scripts: Rc<dyn ScriptInjector>,
        language: LanguageBus,
    ) -> Self {
        Self {
            config,
            storage,
            commands,
            scripts,
            language,
        }
    }
}
