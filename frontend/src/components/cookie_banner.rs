use gloo_timers::future::TimeoutFuture;
use log::{error, warn};
use std::cell::RefCell;
use std::rc::Rc;
use web_sys::{Document, Element, MouseEvent};
use yew::prelude::*;
use yew::AppHandle;

use crate::config::SiteConfig;
use crate::consent::ConsentManager;
use crate::dom;
use crate::error::{Result, SiteError};
use crate::i18n::ConsentTexts;
use crate::utils::FrameLoop;

/// A floating square bouncing inside the banner.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pixel {
    x: f64,
    y: f64,
    dx: f64,
    dy: f64,
}

impl Pixel {
    /// `random` yields values in `[0, 1)`; velocity ends up in `[-1, 1)` px per frame.
    pub fn spawn(mut random: impl FnMut() -> f64, width: f64, height: f64) -> Self {
        Self {
            x: random() * width,
            y: random() * height,
            dx: (random() - 0.5) * 2.0,
            dy: (random() - 0.5) * 2.0,
        }
    }

    pub fn step(&mut self, width: f64, height: f64) -> (f64, f64) {
        self.x += self.dx;
        self.y += self.dy;
        if self.x < 0.0 || self.x > width {
            self.dx = -self.dx;
        }
        if self.y < 0.0 || self.y > height {
            self.dy = -self.dy;
        }
        (self.x, self.y)
    }
}

fn random() -> f64 {
    web_sys::js_sys::Math::random()
}

/// Drives every `.game-pixel` inside `banner` until the banner leaves the document.
fn animate_pixels(banner: &Element) -> Result<FrameLoop> {
    let bounds = banner.get_bounding_client_rect();
    let (width, height) = (bounds.width(), bounds.height());
    let mut pixels: Vec<(Element, Pixel)> = dom::query_all_in(banner, ".game-pixel")
        .into_iter()
        .map(|el| (el, Pixel::spawn(random, width, height)))
        .collect();
    let banner = banner.clone();

    FrameLoop::start(move || {
        if !banner.is_connected() {
            return false;
        }
        for (el, pixel) in pixels.iter_mut() {
            let (x, y) = pixel.step(width, height);
            let _ = dom::set_style(el, "transform", &format!("translate({}px, {}px)", x, y));
        }
        true
    })
}

/// The fade starts only once the manager has taken the click.
fn press_accept(on_accept: &Callback<(), bool>, start_fade: impl FnOnce()) {
    if on_accept.emit(()) {
        start_fade();
    }
}

#[derive(Properties, PartialEq)]
pub struct CookieBannerProps {
    pub texts: &'static ConsentTexts,
    pub pixel_count: usize,
    /// Returns `false` when the click was ignored.
    pub on_accept: Callback<(), bool>,
    pub on_settings: Callback<()>,
}

#[function_component(CookieBanner)]
pub fn cookie_banner(props: &CookieBannerProps) -> Html {
    let hiding = use_state(|| false);
    let banner_ref = use_node_ref();
    let pixel_count = props.pixel_count;
    let positions = use_state(move || {
        (0..pixel_count)
            .map(|_| (random() * 100.0, random() * 100.0))
            .collect::<Vec<_>>()
    });

    {
        let banner_ref = banner_ref.clone();
        use_effect_with_deps(move |_| {
            let animation = banner_ref.cast::<Element>().and_then(|banner| {
                animate_pixels(&banner)
                    .map_err(|e| warn!("Banner animation unavailable: {}", e))
                    .ok()
            });
            // Dropping the loop cancels its pending frame.
            move || drop(animation)
        }, ());
    }

    let on_accept = {
        let hiding = hiding.clone();
        let on_accept = props.on_accept.clone();
        Callback::from(move |e: MouseEvent| {
            e.prevent_default();
            press_accept(&on_accept, || hiding.set(true));
        })
    };

    let on_settings = {
        let on_settings = props.on_settings.clone();
        Callback::from(move |_: MouseEvent| on_settings.emit(()))
    };

    html! {
        <div class={classes!("cookie-consent", (*hiding).then(|| "hiding"))} ref={banner_ref}>
            <div class="cookie-content">
                <div class="cookie-icon">{"🍪"}</div>
                <div class="cookie-text">
                    <h3>{props.texts.title}</h3>
                    <p>{props.texts.description}</p>
                </div>
            </div>
            <div class="cookie-buttons">
                <button class="cookie-btn settings-btn" onclick={on_settings}>
                    {props.texts.settings}
                </button>
                <button class="cookie-btn accept-btn" onclick={on_accept}>
                    {props.texts.accept}
                </button>
            </div>
            {
                for positions.iter().map(|(left, top)| html! {
                    <div class="game-pixel" style={format!("left: {}%; top: {}%;", left, top)}></div>
                })
            }
        </div>
    }
}

/// Renders the banner at the end of `<body>`. After accept and the fade delay
/// the component is destroyed, its host removed, and analytics is told.
pub fn mount(
    document: &Document,
    manager: Rc<ConsentManager>,
    texts: &'static ConsentTexts,
    config: &SiteConfig,
) -> Result<()> {
    let body = document.body().ok_or(SiteError::MissingElement("body"))?;
    let host = document.create_element("div")?;
    host.set_class_name("cookie-consent-host");
    body.append_child(&host)?;

    let handle: Rc<RefCell<Option<AppHandle<CookieBanner>>>> = Rc::new(RefCell::new(None));
    let fade_ms = config.banner_fade_ms;

    let on_accept = {
        let handle = handle.clone();
        let host = host.clone();
        Callback::from(move |_: ()| {
            if !manager.accept() {
                return false;
            }
            let handle = handle.clone();
            let host = host.clone();
            let manager = manager.clone();
            wasm_bindgen_futures::spawn_local(async move {
                TimeoutFuture::new(fade_ms).await;
                let app = handle.borrow_mut().take();
                if let Some(app) = app {
                    app.destroy();
                }
                host.remove();
                if let Err(e) = manager.finish_dismiss() {
                    error!("Failed to grant analytics consent: {}", e);
                }
            });
            true
        })
    };

    let policy_url = config.cookie_policy_url;
    let on_settings = Callback::from(move |_: ()| {
        let opened = dom::window().and_then(|w| {
            w.open_with_url_and_target(policy_url, "_blank")
                .map_err(SiteError::from)
        });
        if let Err(e) = opened {
            warn!("Could not open cookie policy: {}", e);
        }
    });

    let app = yew::Renderer::<CookieBanner>::with_root_and_props(
        host,
        CookieBannerProps {
            texts,
            pixel_count: config.game_pixel_count,
            on_accept,
            on_settings,
        },
    )
    .render();
    *handle.borrow_mut() = Some(app);
    Ok(())
}
