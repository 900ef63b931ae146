//! Best-effort web-vitals logging. Nothing here changes page behavior.

use log::{debug, info};
use serde::Serialize;
use std::cell::RefCell;
use std::rc::Rc;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::js_sys::{Array, Reflect};
use web_sys::{PerformanceObserver, PerformanceObserverEntryList, PerformanceObserverInit, Window};

use crate::dom;
use crate::error::Result;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageLoad {
    pub dom_content_loaded: f64,
    pub load_complete: f64,
    pub total_time: f64,
}

impl PageLoad {
    pub fn from_timing(timing: &NavigationTiming) -> Self {
        Self {
            dom_content_loaded: timing.dom_content_loaded_event_end
                - timing.dom_content_loaded_event_start,
            load_complete: timing.load_event_end - timing.load_event_start,
            total_time: timing.load_event_end - timing.fetch_start,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct NavigationTiming {
    pub fetch_start: f64,
    pub dom_content_loaded_event_start: f64,
    pub dom_content_loaded_event_end: f64,
    pub load_event_start: f64,
    pub load_event_end: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Metrics {
    pub page_load: Option<PageLoad>,
    pub lcp: Option<f64>,
    pub fid: Option<f64>,
    pub cls: Option<f64>,
}

/// Sums layout shifts that were not caused by recent input.
#[derive(Debug, Clone, Copy, Default)]
pub struct ClsAccumulator {
    total: f64,
}

impl ClsAccumulator {
    pub fn record(&mut self, value: f64, had_recent_input: bool) -> f64 {
        if !had_recent_input {
            self.total += value;
        }
        self.total
    }
}

pub struct PerformanceMonitor {
    metrics: RefCell<Metrics>,
    cls: RefCell<ClsAccumulator>,
}

impl PerformanceMonitor {
    pub fn new() -> Self {
        Self {
            metrics: RefCell::new(Metrics::default()),
            cls: RefCell::new(ClsAccumulator::default()),
        }
    }

    #[cfg(test)]
    pub fn metrics(&self) -> Metrics {
        self.metrics.borrow().clone()
    }

    pub fn record_page_load(&self, timing: &NavigationTiming) {
        let load = PageLoad::from_timing(timing);
        self.metrics.borrow_mut().page_load = Some(load);
        info!("Page Load Metrics: {}", to_json(&load));
    }

    /// The most recent candidate wins.
    pub fn record_lcp(&self, start_times: &[f64]) {
        if let Some(last) = start_times.last() {
            self.metrics.borrow_mut().lcp = Some(*last);
            info!("LCP: {}", last);
        }
    }

    pub fn record_first_input(&self, processing_start: f64, start_time: f64) {
        let fid = processing_start - start_time;
        self.metrics.borrow_mut().fid = Some(fid);
        info!("FID: {}", fid);
    }

    pub fn record_layout_shifts(&self, shifts: &[(f64, bool)]) {
        let mut cls = self.cls.borrow_mut();
        let mut total = 0.0;
        for (value, had_recent_input) in shifts {
            total = cls.record(*value, *had_recent_input);
        }
        if shifts.is_empty() {
            return;
        }
        self.metrics.borrow_mut().cls = Some(total);
        info!("CLS: {}", total);
    }
}

fn to_json<T: Serialize>(value: &T) -> String {
    serde_json::to_string(value).unwrap_or_default()
}

fn number(entry: &JsValue, field: &str) -> f64 {
    Reflect::get(entry, &JsValue::from_str(field))
        .ok()
        .and_then(|v| v.as_f64())
        .unwrap_or(0.0)
}

fn flag(entry: &JsValue, field: &str) -> bool {
    Reflect::get(entry, &JsValue::from_str(field))
        .ok()
        .and_then(|v| v.as_bool())
        .unwrap_or(false)
}

fn supports_observer(window: &Window) -> bool {
    Reflect::has(window, &JsValue::from_str("PerformanceObserver")).unwrap_or(false)
}

/// `buffered` replays entries recorded before the observer existed.
#[derive(Serialize)]
struct ObserveOptions {
    #[serde(rename = "type")]
    entry_type: &'static str,
    buffered: bool,
}

impl ObserveOptions {
    fn buffered(entry_type: &'static str) -> Self {
        Self {
            entry_type,
            buffered: true,
        }
    }
}

/// The wasm bundle may boot after `load` has already fired.
fn load_has_fired(ready_state: Option<&str>) -> bool {
    ready_state == Some("complete")
}

fn observe(entry_type: &'static str, mut on_entries: impl FnMut(Array) + 'static) -> Result<()> {
    let callback = Closure::wrap(Box::new(move |list: PerformanceObserverEntryList, _: JsValue| {
        on_entries(list.get_entries());
    }) as Box<dyn FnMut(PerformanceObserverEntryList, JsValue)>);
    let observer = PerformanceObserver::new(callback.as_ref().unchecked_ref())?;
    let options: PerformanceObserverInit =
        serde_wasm_bindgen::to_value(&ObserveOptions::buffered(entry_type))?.unchecked_into();
    observer.observe(&options);
    callback.forget();
    Ok(())
}

fn navigation_timing(window: &Window) -> Option<NavigationTiming> {
    let entry = window
        .performance()?
        .get_entries_by_type("navigation")
        .get(0);
    if entry.is_undefined() {
        return None;
    }
    Some(NavigationTiming {
        fetch_start: number(&entry, "fetchStart"),
        dom_content_loaded_event_start: number(&entry, "domContentLoadedEventStart"),
        dom_content_loaded_event_end: number(&entry, "domContentLoadedEventEnd"),
        load_event_start: number(&entry, "loadEventStart"),
        load_event_end: number(&entry, "loadEventEnd"),
    })
}

pub fn init() -> Result<Rc<PerformanceMonitor>> {
    let window = dom::window()?;
    let monitor = Rc::new(PerformanceMonitor::new());

    {
        let monitor = monitor.clone();
        let timing_window = window.clone();
        // loadEventEnd is only filled in after the load handlers return.
        let record = move || {
            let monitor = monitor.clone();
            let timing_window = timing_window.clone();
            gloo_timers::callback::Timeout::new(0, move || {
                if let Some(timing) = navigation_timing(&timing_window) {
                    monitor.record_page_load(&timing);
                }
            })
            .forget();
        };
        if load_has_fired(dom::ready_state(&dom::document()?).as_deref()) {
            record();
        } else {
            dom::listen(&window, "load", move |_| record())?;
        }
    }

    if !supports_observer(&window) {
        debug!("PerformanceObserver unsupported, skipping web vitals");
        return Ok(monitor);
    }

    {
        let monitor = monitor.clone();
        observe("largest-contentful-paint", move |entries| {
            let times: Vec<f64> = entries.iter().map(|e| number(&e, "startTime")).collect();
            monitor.record_lcp(&times);
        })?;
    }
    {
        let monitor = monitor.clone();
        observe("first-input", move |entries| {
            for entry in entries.iter() {
                monitor.record_first_input(number(&entry, "processingStart"), number(&entry, "startTime"));
            }
        })?;
    }
    {
        let monitor = monitor.clone();
        observe("layout-shift", move |entries| {
            let shifts: Vec<(f64, bool)> = entries
                .iter()
                .map(|e| (number(&e, "value"), flag(&e, "hadRecentInput")))
                .collect();
            monitor.record_layout_shifts(&shifts);
        })?;
    }

    Ok(monitor)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_load_durations_from_navigation_timing() {
        let timing = NavigationTiming {
            fetch_start: 5.0,
            dom_content_loaded_event_start: 300.0,
            dom_content_loaded_event_end: 312.0,
            load_event_start: 800.0,
            load_event_end: 805.0,
        };
        assert_eq!(
            PageLoad::from_timing(&timing),
            PageLoad {
                dom_content_loaded: 12.0,
                load_complete: 5.0,
                total_time: 800.0,
            }
        );
    }

    #[test]
    fn cls_skips_shifts_after_recent_input() {
        let monitor = PerformanceMonitor::new();
        monitor.record_layout_shifts(&[(0.25, false), (0.5, true)]);
        monitor.record_layout_shifts(&[(0.125, false)]);
        assert_eq!(monitor.metrics().cls, Some(0.375));
    }

    #[test]
    fn lcp_keeps_last_candidate_and_fid_is_processing_delay() {
        let monitor = PerformanceMonitor::new();
        monitor.record_lcp(&[120.0, 340.0]);
        monitor.record_lcp(&[]);
        monitor.record_first_input(1010.0, 1000.0);

        let metrics = monitor.metrics();
        assert_eq!(metrics.lcp, Some(340.0));
        assert_eq!(metrics.fid, Some(10.0));
        assert_eq!(metrics.cls, None);
    }

    #[test]
    fn observers_ask_for_buffered_entries() {
        let json = serde_json::to_value(ObserveOptions::buffered("layout-shift")).unwrap();
        assert_eq!(json, serde_json::json!({ "type": "layout-shift", "buffered": true }));
    }

    #[test]
    fn page_load_is_recorded_immediately_once_complete() {
        assert!(load_has_fired(Some("complete")));
        assert!(!load_has_fired(Some("interactive")));
        assert!(!load_has_fired(Some("loading")));
        assert!(!load_has_fired(None));
    }

    #[test]
    fn metrics_log_in_camel_case() {
        let load = PageLoad {
            dom_content_loaded: 1.0,
            load_complete: 2.0,
            total_time: 3.0,
        };
        assert_eq!(
            to_json(&load),
            r#"{"domContentLoaded":1.0,"loadComplete":2.0,"totalTime":3.0}"#
        );
    }
}
