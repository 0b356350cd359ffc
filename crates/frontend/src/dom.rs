//! Browser side channels the map page needs outside of Leaflet.

use dioxus::logger::tracing::warn;
use foodmap_shared::error::{MapError, Result};
use foodmap_shared::export::{EXPORT_BACKGROUND, EXPORT_SCALE, SHARE_COPIED, SHARE_PROMPT};
use foodmap_shared::panel::Size;
use serde_json::json;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;

#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(catch, js_name = html2canvas)]
    fn html2canvas(element: &web_sys::HtmlElement, options: &JsValue) -> std::result::Result<js_sys::Promise, JsValue>;
}

fn window_has(name: &str) -> bool {
    web_sys::window()
        .and_then(|w| js_sys::Reflect::get(&w, &JsValue::from_str(name)).ok())
        .is_some_and(|v| !v.is_undefined() && !v.is_null())
}

fn js_message(err: &JsValue) -> String {
    js_sys::Reflect::get(err, &JsValue::from_str("message"))
        .ok()
        .and_then(|m| m.as_string())
        .or_else(|| err.as_string())
        .unwrap_or_else(|| "unknown error".to_string())
}

fn element(id: &str) -> Option<web_sys::HtmlElement> {
    web_sys::window()?
        .document()?
        .get_element_by_id(id)?
        .dyn_into::<web_sys::HtmlElement>()
        .ok()
}

pub fn alert(message: &str) {
    if let Some(window) = web_sys::window() {
        window.alert_with_message(message).ok();
    }
}

pub fn prompt(message: &str, default: &str) {
    if let Some(window) = web_sys::window() {
        window.prompt_with_message_and_default(message, default).ok();
    }
}

pub fn page_url() -> String {
    web_sys::window()
        .and_then(|w| w.location().href().ok())
        .unwrap_or_default()
}

pub fn page_title() -> String {
    web_sys::window()
        .and_then(|w| w.document())
        .map(|d| d.title())
        .unwrap_or_default()
}

pub fn matches_media(query: &str) -> bool {
    web_sys::window()
        .and_then(|w| w.match_media(query).ok().flatten())
        .is_some_and(|m| m.matches())
}

pub fn viewport_height() -> f64 {
    web_sys::window()
        .and_then(|w| w.inner_height().ok())
        .and_then(|h| h.as_f64())
        .unwrap_or(0.0)
}

/// Rendered size of the element with `id`; zero when it is not in the page.
pub fn measure(id: &str) -> Size {
    element(id)
        .map(|e| {
            let rect = e.get_bounding_client_rect();
            Size::new(rect.width(), rect.height())
        })
        .unwrap_or(Size::new(0.0, 0.0))
}

/// Viewport-relative top and bottom edges of the element with `id`.
pub fn vertical_extent(id: &str) -> Option<(f64, f64)> {
    element(id).map(|e| {
        let rect = e.get_bounding_client_rect();
        (rect.top(), rect.bottom())
    })
}

/// The heat plugin has no opacity option, so the canvases are styled directly.
pub fn set_canvas_opacity(container_id: &str, opacity: f64) {
    let Some(document) = web_sys::window().and_then(|w| w.document()) else {
        return;
    };
    let selector = format!("#{container_id} div.leaflet-overlay-pane > canvas");
    let Ok(canvases) = document.query_selector_all(&selector) else {
        return;
    };
    for i in 0..canvases.length() {
        let Some(canvas) = canvases
            .item(i)
            .and_then(|n| n.dyn_into::<web_sys::HtmlElement>().ok())
        else {
            continue;
        };
        canvas.style().set_property("opacity", &opacity.to_string()).ok();
    }
}

pub fn scroll_into_view(id: &str) {
    if let Some(el) = element(id) {
        let options = web_sys::ScrollIntoViewOptions::new();
        options.set_behavior(web_sys::ScrollBehavior::Instant);
        options.set_block(web_sys::ScrollLogicalPosition::Start);
        el.scroll_into_view_with_scroll_into_view_options(&options);
    }
}

/// Stops the page behind an open drawer from scrolling.
pub fn set_scroll_locked(locked: bool) {
    let Some(body) = web_sys::window()
        .and_then(|w| w.document())
        .and_then(|d| d.body())
    else {
        return;
    };
    let style = body.style();
    if locked {
        style.set_property("overflow", "hidden").ok();
    } else {
        style.remove_property("overflow").ok();
    }
}

pub fn print() {
    if let Some(window) = web_sys::window() {
        window.print().ok();
    }
}

pub fn snapshot_available() -> bool {
    window_has("html2canvas")
}

/// Renders the element with `id` to a PNG and downloads it as `file_name`.
pub async fn download_snapshot(id: &str, file_name: &str) -> Result<()> {
    let target = element(id).ok_or_else(|| MapError::Snapshot(format!("#{id} not found")))?;
    let options = js_sys::JSON::parse(
        &json!({
            "backgroundColor": EXPORT_BACKGROUND,
            "scale": EXPORT_SCALE,
            "useCORS": true,
            "allowTaint": true,
            "foreignObjectRendering": false,
            "logging": false,
            "width": target.offset_width(),
            "height": target.offset_height(),
        })
        .to_string(),
    )
    .map_err(|e| MapError::Snapshot(js_message(&e)))?;

    let promise = html2canvas(&target, &options).map_err(|e| MapError::Snapshot(js_message(&e)))?;
    let canvas = JsFuture::from(promise)
        .await
        .map_err(|e| MapError::Snapshot(js_message(&e)))?
        .dyn_into::<web_sys::HtmlCanvasElement>()
        .map_err(|_| MapError::Snapshot("snapshot did not return a canvas".to_string()))?;
    let data_url = canvas
        .to_data_url()
        .map_err(|e| MapError::Snapshot(js_message(&e)))?;

    let link = web_sys::window()
        .and_then(|w| w.document())
        .and_then(|d| d.create_element("a").ok())
        .and_then(|a| a.dyn_into::<web_sys::HtmlAnchorElement>().ok())
        .ok_or_else(|| MapError::Snapshot("cannot create download link".to_string()))?;
    link.set_download(file_name);
    link.set_href(&data_url);
    link.click();
    Ok(())
}

/// Hands the page link to the user: native share sheet, then clipboard, then a prompt.
pub async fn share_link() {
    use foodmap_shared::export::{choose_share_method, ShareMethod};

    let Some(window) = web_sys::window() else {
        return;
    };
    let navigator = window.navigator();
    let url = page_url();
    let share = js_sys::Reflect::get(&navigator, &JsValue::from_str("share"))
        .ok()
        .and_then(|f| f.dyn_into::<js_sys::Function>().ok());
    let clipboard = js_sys::Reflect::get(&navigator, &JsValue::from_str("clipboard"))
        .is_ok_and(|c| !c.is_undefined() && !c.is_null());

    match choose_share_method(share.is_some(), clipboard) {
        ShareMethod::Native => {
            let Some(share) = share else { return };
            let data = js_sys::JSON::parse(&json!({ "title": page_title(), "url": url }).to_string())
                .unwrap_or(JsValue::UNDEFINED);
            if let Ok(promise) = share.call1(&navigator, &data) {
                if let Err(e) = JsFuture::from(js_sys::Promise::from(promise)).await {
                    warn!(error = %js_message(&e), "share dismissed");
                }
            }
        }
        ShareMethod::Clipboard => {
            let written = JsFuture::from(navigator.clipboard().write_text(&url)).await;
            match written {
                Ok(_) => alert(SHARE_COPIED),
                Err(_) => prompt(SHARE_PROMPT, &url),
            }
        }
        ShareMethod::Prompt => prompt(SHARE_PROMPT, &url),
    }
}

/// A window event listener that is removed when dropped.
pub struct WindowListener {
    event: &'static str,
    callback: Closure<dyn FnMut(web_sys::Event)>,
}

impl WindowListener {
    pub fn new(event: &'static str, handler: impl FnMut(web_sys::Event) + 'static) -> Option<Self> {
        let window = web_sys::window()?;
        let callback = Closure::<dyn FnMut(web_sys::Event)>::new(handler);
        window
            .add_event_listener_with_callback(event, callback.as_ref().unchecked_ref())
            .ok()?;
        Some(Self { event, callback })
    }
}

impl Drop for WindowListener {
    fn drop(&mut self) {
        if let Some(window) = web_sys::window() {
            window
                .remove_event_listener_with_callback(self.event, self.callback.as_ref().unchecked_ref())
                .ok();
        }
    }
}

/// Key name of a keyboard event, empty for anything else.
pub fn event_key(event: &web_sys::Event) -> String {
    event
        .dyn_ref::<web_sys::KeyboardEvent>()
        .map(|e| e.key())
        .unwrap_or_default()
}

/// Runs `f` on the next animation frame.
pub fn next_frame(f: impl FnOnce() + 'static) {
    let Some(window) = web_sys::window() else {
        return;
    };
    let callback = Closure::once_into_js(f);
    if window
        .request_animation_frame(callback.unchecked_ref())
        .is_err()
    {
        warn!("requestAnimationFrame failed");
    }
}
