use std::rc::Rc;

use dioxus::prelude::*;
use foodmap_shared::panel::{ArrowKey, Axis, MOBILE_QUERY};
use wasm_bindgen::JsCast;

use crate::dom::{self, WindowListener};
use crate::pages::map::{measured_layout, measured_panel, MapContext};

fn arrow_key(key: &Key) -> Option<ArrowKey> {
    match key {
        Key::ArrowLeft => Some(ArrowKey::Left),
        Key::ArrowRight => Some(ArrowKey::Right),
        Key::ArrowUp => Some(ArrowKey::Up),
        Key::ArrowDown => Some(ArrowKey::Down),
        _ => None,
    }
}

fn pointer_position(event: &web_sys::Event) -> Option<(f64, f64)> {
    event
        .dyn_ref::<web_sys::MouseEvent>()
        .map(|e| (f64::from(e.client_x()), f64::from(e.client_y())))
}

/// Re-picks the axis after a layout change, or re-clamps if it stayed the same.
fn sync_layout(ctx: &MapContext) {
    let mut panel = ctx.panel;
    let mobile = dom::matches_media(MOBILE_QUERY);
    let axis = Axis::for_layout(mobile);
    let changed = if panel.peek().axis != axis {
        panel
            .write()
            .update_axis(mobile, measured_panel(), measured_layout())
    } else {
        panel.write().handle_resize(measured_layout())
    };
    if changed.is_some() {
        ctx.request_invalidate();
    }
}

/// Drag handle between the control panel and the map.
#[component]
pub fn PanelResizer() -> Element {
    let ctx = use_context::<MapContext>();
    let mut panel = ctx.panel;

    // Pointer moves are tracked on the window so a fast drag does not lose the handle.
    use_hook({
        let ctx = ctx.clone();
        move || {
            let on_move = {
                let ctx = ctx.clone();
                move |event: web_sys::Event| {
                    if !panel.peek().is_dragging() {
                        return;
                    }
                    let Some(pointer) = pointer_position(&event) else {
                        return;
                    };
                    if panel.write().drag_to(pointer, measured_layout()).is_some() {
                        ctx.request_invalidate();
                    }
                }
            };
            let on_up = {
                let ctx = ctx.clone();
                move |_: web_sys::Event| {
                    if !panel.peek().is_dragging() {
                        return;
                    }
                    if panel.write().end_drag().is_some() {
                        ctx.request_invalidate();
                    }
                }
            };
            let on_resize = move |_: web_sys::Event| sync_layout(&ctx);
            let listeners: Vec<WindowListener> = [
                WindowListener::new("pointermove", on_move),
                WindowListener::new("pointerup", on_up.clone()),
                WindowListener::new("pointercancel", on_up),
                WindowListener::new("resize", on_resize),
            ]
            .into_iter()
            .flatten()
            .collect();
            Rc::new(listeners)
        }
    });

    let geometry = panel.read();
    if geometry.is_collapsed() {
        return rsx! {};
    }
    let orientation = geometry.axis.orientation();
    let aria_label = geometry.axis.aria_label();
    let class = if geometry.is_dragging() {
        "panel-resizer dragging"
    } else {
        "panel-resizer"
    };
    drop(geometry);

    rsx! {
        div {
            id: "panel-resizer",
            class: "{class}",
            role: "separator",
            tabindex: "0",
            "aria-orientation": "{orientation}",
            "aria-label": "{aria_label}",
            onmounted: {
                let ctx = ctx.clone();
                move |_| sync_layout(&ctx)
            },
            onpointerdown: move |evt: Event<PointerData>| {
                evt.prevent_default();
                let client = evt.client_coordinates();
                panel
                    .write()
                    .begin_drag(evt.pointer_id(), (client.x, client.y), measured_panel());
            },
            onkeydown: {
                let ctx = ctx.clone();
                move |evt: Event<KeyboardData>| {
                    let Some(key) = arrow_key(&evt.key()) else {
                        return;
                    };
                    evt.prevent_default();
                    if panel.write().step(key, measured_layout()).is_some() {
                        ctx.request_invalidate();
                    }
                }
            },
        }
    }
}
