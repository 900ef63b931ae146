//! Decorative 3D tilt on `.mentor-card` following the pointer.

use log::warn;
use wasm_bindgen::JsCast;
use web_sys::{Document, Element, MouseEvent};

use crate::config::SiteConfig;
use crate::dom;
use crate::error::Result;

const GLOW_STOPS: &str = "#60a5fa, #4ade80, #a855f7, #60a5fa";

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tilt {
    pub rotate_x: f64,
    pub rotate_y: f64,
    /// Direction from the card centre to the pointer, in degrees.
    pub glow_angle: f64,
}

impl Tilt {
    /// `x`/`y` are relative to the card's top-left corner.
    pub fn from_pointer(x: f64, y: f64, width: f64, height: f64, divisor: f64) -> Self {
        let center_x = width / 2.0;
        let center_y = height / 2.0;
        Self {
            rotate_x: (y - center_y) / divisor,
            rotate_y: (center_x - x) / divisor,
            glow_angle: (y - center_y).atan2(x - center_x).to_degrees(),
        }
    }

    pub fn transform(&self, perspective_px: u32) -> String {
        format!(
            "perspective({}px) rotateX({}deg) rotateY({}deg) translateZ(10px)",
            perspective_px, self.rotate_x, self.rotate_y
        )
    }

    pub fn glow(&self) -> String {
        format!("linear-gradient({}deg, {})", self.glow_angle, GLOW_STOPS)
    }
}

pub fn neutral_transform(perspective_px: u32) -> String {
    format!("perspective({}px) rotateX(0) rotateY(0) translateZ(0)", perspective_px)
}

fn on_move(card: &Element, event: &MouseEvent, divisor: f64, perspective: u32) -> Result<()> {
    let rect = card.get_bounding_client_rect();
    let x = event.client_x() as f64 - rect.left();
    let y = event.client_y() as f64 - rect.top();
    let tilt = Tilt::from_pointer(x, y, rect.width(), rect.height(), divisor);

    dom::set_style(card, "transform", &tilt.transform(perspective))?;
    if let Some(border) = dom::query_in::<Element>(card, ".mentor-card-border") {
        dom::set_style(&border, "background", &tilt.glow())?;
    }
    Ok(())
}

pub fn init(document: &Document, config: &SiteConfig) -> Result<()> {
    let divisor = config.tilt_divisor;
    let perspective = config.perspective_px;

    for card in dom::query_all(document, ".mentor-card") {
        let target = card.clone();
        dom::listen(&card, "mousemove", move |event| {
            let Some(event) = event.dyn_ref::<MouseEvent>() else {
                return;
            };
            if let Err(e) = on_move(&target, event, divisor, perspective) {
                warn!("Mentor card tilt failed: {}", e);
            }
        })?;

        let target = card.clone();
        dom::listen(&card, "mouseleave", move |_| {
            if let Err(e) = dom::set_style(&target, "transform", &neutral_transform(perspective)) {
                warn!("Mentor card reset failed: {}", e);
            }
        })?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn centre_is_flat() {
        let tilt = Tilt::from_pointer(100.0, 50.0, 200.0, 100.0, 10.0);
        assert_eq!(tilt.rotate_x, 0.0);
        assert_eq!(tilt.rotate_y, 0.0);
    }

    #[test]
    fn corners_rotate_linearly() {
        let tilt = Tilt::from_pointer(0.0, 0.0, 200.0, 100.0, 10.0);
        assert_eq!(tilt.rotate_x, -5.0);
        assert_eq!(tilt.rotate_y, 10.0);
        assert_eq!(
            tilt.transform(1000),
            "perspective(1000px) rotateX(-5deg) rotateY(10deg) translateZ(10px)"
        );
    }

    #[test]
    fn glow_points_at_pointer() {
        let right = Tilt::from_pointer(200.0, 50.0, 200.0, 100.0, 10.0);
        assert_eq!(right.glow_angle, 0.0);
        assert_eq!(right.glow(), "linear-gradient(0deg, #60a5fa, #4ade80, #a855f7, #60a5fa)");

        let below = Tilt::from_pointer(100.0, 100.0, 200.0, 100.0, 10.0);
        assert!((below.glow_angle - 90.0).abs() < 1e-9);
    }

    #[test]
    fn leave_resets_to_neutral() {
        assert_eq!(
            neutral_transform(1000),
            "perspective(1000px) rotateX(0) rotateY(0) translateZ(0)"
        );
    }
}
