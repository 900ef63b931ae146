use log::info;

mod analytics;
mod app;
mod banner;
mod browser;
mod config;
mod consent;
mod context;
mod dom;
mod error;
mod faq;
mod gallery;
mod i18n;
mod language;
mod mentor_cards;
mod navigation;
mod overlay;
mod performance;
mod utils;

mod components {
    pub mod cookie_banner;
}

fn main() {
    // Initialize console error panic hook for better error messages
    console_error_panic_hook::set_once();

    // Initialize logging
    if console_log::init_with_level(config::get_log_level()).is_err() {
        gloo_console::warn!("console logger already initialized");
    }

    info!("Starting Skansen Game Jam site");
    let started = app::on_ready(|| {
        if let Err(e) = app::start() {
            gloo_console::error!(format!("Error initializing application: {}", e));
            log::error!("Error initializing application: {}", e);
        }
    });
    if let Err(e) = started {
        gloo_console::error!(format!("Error initializing application: {}", e));
    }
}
