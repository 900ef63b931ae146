//! web-sys backed implementations of the `context` capabilities.

use log::warn;
use wasm_bindgen::JsValue;
use web_sys::js_sys::{Array, Date, Function};
use wasm_bindgen::JsCast;
use web_sys::{Document, HtmlScriptElement, Node, Storage};

use crate::analytics::GtagCommand;
use crate::context::{CommandSink, KeyValueStore, ScriptInjector};
use crate::dom;
use crate::error::{Result, SiteError};

pub struct LocalStorage {
    storage: Option<Storage>,
}

impl LocalStorage {
    /// Private browsing and disabled storage leave this empty; every read then misses.
    pub fn new() -> Self {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();
        if storage.is_none() {
            warn!("localStorage unavailable, consent will not persist");
        }
        Self { storage }
    }
}

impl KeyValueStore for LocalStorage {
    fn get_item(&self, key: &str) -> Option<String> {
        self.storage
            .as_ref()
            .and_then(|s| s.get_item(key).ok())
            .flatten()
    }

    fn set_item(&self, key: &str, value: &str) -> Result<()> {
        let storage = self
            .storage
            .as_ref()
            .ok_or_else(|| SiteError::Js("localStorage unavailable".into()))?;
        storage.set_item(key, value)?;
        Ok(())
    }
}

/// `window.dataLayer` through a `gtag` shim; gtag.js only consumes
/// `Arguments` objects, not plain arrays.
pub struct DataLayer {
    gtag: Function,
}

impl DataLayer {
    pub fn new() -> Result<Self> {
        dom::window()?;
        let gtag = Function::new_no_args(
            "window.dataLayer = window.dataLayer || []; window.dataLayer.push(arguments);",
        );
        Ok(Self { gtag })
    }

    fn arguments(command: &GtagCommand) -> Result<Array> {
        let args = Array::new();
        args.push(&JsValue::from_str(command.name()));
        match command {
            GtagCommand::Consent(mode, signals) => {
                args.push(&JsValue::from_str(mode.as_str()));
                args.push(&serde_wasm_bindgen::to_value(signals)?);
            }
            GtagCommand::Js(at) => {
                args.push(&Date::new(&JsValue::from_f64(at.timestamp_millis() as f64)));
            }
            GtagCommand::Config(tag_id) => {
                args.push(&JsValue::from_str(tag_id));
            }
        }
        Ok(args)
    }
}

impl CommandSink for DataLayer {
    fn push(&self, command: &GtagCommand) -> Result<()> {
        let args = Self::arguments(command)?;
        self.gtag.apply(&JsValue::NULL, &args)?;
        Ok(())
    }
}

/// Inserts async `<script>` tags ahead of the first script on the page.
pub struct ScriptTag {
    document: Document,
}

impl ScriptTag {
    pub fn new(document: Document) -> Self {
        Self { document }
    }
}

impl ScriptInjector for ScriptTag {
    fn inject(&self, src: &str) -> Result<()> {
        let script = self
            .document
            .create_element("script")?
            .dyn_into::<HtmlScriptElement>()
            .map_err(|_| SiteError::Js("created element is not a script".into()))?;
        script.set_async(true);
        script.set_src(src);

        let first = self.document.get_elements_by_tag_name("script").item(0);
        match first.and_then(|s| s.parent_node().map(|parent| (s, parent))) {
            Some((first, parent)) => {
                let first: &Node = &first;
                parent.insert_before(&script, Some(first))?;
            }
            None => {
                let head = self.document.head().ok_or(SiteError::MissingElement("head"))?;
                head.append_child(&script)?;
            }
        }
        Ok(())
    }
}
