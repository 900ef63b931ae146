use log::{debug, warn};
use std::rc::Rc;
use web_sys::{Document, Element};

use crate::config::SiteConfig;
use crate::dom;
use crate::error::Result;
use crate::utils::Debouncer;

pub const BANNER_HEIGHT_VAR: &str = "--banner-h";

pub fn px(value: f64) -> String {
    format!("{}px", value)
}

/// Republishes the announcement bar height as `--banner-h` and offsets the nav.
pub struct BannerManager {
    banner: Element,
    root: Element,
    nav: Option<Element>,
}

impl BannerManager {
    pub fn set_banner_height(&self) -> Result<()> {
        let height = self.banner.get_bounding_client_rect().height();
        dom::set_style(&self.root, BANNER_HEIGHT_VAR, &px(height))?;
        if let Some(nav) = &self.nav {
            dom::set_style(nav, "top", &px(height))?;
        }
        debug!("Banner height {}", height);
        Ok(())
    }
}

pub fn init(document: &Document, config: &SiteConfig) -> Result<()> {
    let Some(banner) = dom::query::<Element>(document, ".announcement-bar") else {
        return Ok(());
    };
    let Some(root) = document.document_element() else {
        return Ok(());
    };
    let manager = Rc::new(BannerManager {
        banner,
        root,
        nav: dom::query::<Element>(document, ".site-nav"),
    });
    manager.set_banner_height()?;

    let debounced = Debouncer::new(config.resize_debounce_ms, move |_: ()| {
        if let Err(e) = manager.set_banner_height() {
            warn!("Failed to measure banner: {}", e);
        }
    });
    let window = dom::window()?;
    dom::listen(&window, "resize", move |_| debounced.trigger(()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn heights_render_as_css_pixels() {
        assert_eq!(px(48.0), "48px");
        assert_eq!(px(37.5), "37.5px");
        assert_eq!(px(0.0), "0px");
    }
}
