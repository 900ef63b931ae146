use thiserror::Error;
use wasm_bindgen::JsValue;

#[derive(Debug, Error)]
pub enum SiteError {
    #[error("no global window available")]
    NoWindow,
    #[error("window has no document")]
    NoDocument,
    #[error("document has no <{0}> element")]
    MissingElement(&'static str),
    #[error("javascript error: {0}")]
    Js(String),
    #[error("failed to serialize value for javascript: {0}")]
    Serialize(String),
}

impl From<JsValue> for SiteError {
    fn from(value: JsValue) -> Self {
        SiteError::Js(value.as_string().unwrap_or_else(|| format!("{:?}", value)))
    }
}

impl From<serde_wasm_bindgen::Error> for SiteError {
    fn from(err: serde_wasm_bindgen::Error) -> Self {
        SiteError::Serialize(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, SiteError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_element_names_the_tag() {
        assert_eq!(
            SiteError::MissingElement("body").to_string(),
            "document has no <body> element"
        );
        assert_eq!(SiteError::NoDocument.to_string(), "window has no document");
    }
}
