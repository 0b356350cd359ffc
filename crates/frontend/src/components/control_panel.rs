use std::rc::Rc;

use dioxus::logger::tracing::info;
use dioxus::prelude::*;
use foodmap_shared::error::Result;
use foodmap_shared::export::{export_image, EXPORT_FILE_NAME, EXPORT_SETTLE_MS};
use foodmap_shared::export::{PRINT_DIALOG_MS, PRINT_RESTORE_MS, PRINT_SETTLE_MS};
use foodmap_shared::filter::{parse_radius_km, run_filter, CenterInput};
use foodmap_shared::models::Category;
use gloo_timers::future::TimeoutFuture;

use crate::api::{self, NominatimGeocoder};
use crate::dom;
use crate::pages::map::{MapContext, MAP_ID, MAP_STAGE_ID};

#[component]
pub fn ControlPanel() -> Element {
    rsx! {
        PanelHeader {}
        div { class: "panel-body",
            HeatControls {}
            LayerToggles {}
            FilterForm {}
            QuickFilter {}
            ExportControls {}
        }
    }
}

#[component]
fn PanelHeader() -> Element {
    let ctx = use_context::<MapContext>();
    let mut panel = ctx.panel;
    let compact = panel.read().mode == foodmap_shared::panel::PanelMode::Compact;
    let icon = if compact { "fas fa-expand-alt" } else { "fas fa-compress-alt" };

    rsx! {
        div { class: "panel-header",
            h2 { "Map Controls" }
            div { class: "panel-header-actions",
                button {
                    class: "icon-btn",
                    title: "Compact panel",
                    onclick: {
                        let ctx = ctx.clone();
                        move |_| {
                            if panel.write().toggle_compact() {
                                ctx.request_invalidate();
                            }
                        }
                    },
                    i { class: "{icon}" }
                }
                button {
                    class: "icon-btn",
                    title: "Minimize panel",
                    onclick: {
                        let ctx = ctx.clone();
                        move |_| {
                            if panel.write().minimize() {
                                ctx.request_invalidate();
                            }
                        }
                    },
                    i { class: "fas fa-window-minimize" }
                }
            }
        }
    }
}

#[component]
fn HeatControls() -> Element {
    let ctx = use_context::<MapContext>();
    let config = api::site_config();
    // Sliders start at their maximum, which is also the configured default.
    let mut radius = use_signal(|| config.heat_radius.to_string());
    let mut intensity = use_signal(|| config.heat_intensity.to_string());

    let apply = move || {
        let (r, i) = (radius.peek().clone(), intensity.peek().clone());
        ctx.with(|c| c.apply_heat_inputs(Some(&r), Some(&i)));
    };

    rsx! {
        section { class: "panel-section",
            h3 { "Heatmap" }
            label { r#for: "intensitySlider", "Intensity" }
            input {
                id: "intensitySlider",
                r#type: "range",
                min: "0.1",
                max: "{config.heat_intensity}",
                step: "0.1",
                value: "{intensity}",
                oninput: {
                    let apply = apply.clone();
                    move |evt: Event<FormData>| {
                        intensity.set(evt.value());
                        apply();
                    }
                },
            }
            label { r#for: "sizeSlider", "Size" }
            input {
                id: "sizeSlider",
                r#type: "range",
                min: "5",
                max: "{config.heat_radius}",
                step: "1",
                value: "{radius}",
                oninput: move |evt: Event<FormData>| {
                    radius.set(evt.value());
                    apply();
                },
            }
        }
    }
}

#[component]
fn LayerToggles() -> Element {
    let ctx = use_context::<MapContext>();
    let labels = *ctx.labels.read();

    let toggle = |category: Category| {
        let ctx = ctx.clone();
        move |_: Event<FormData>| {
            ctx.with(|c| c.toggle_category(category));
        }
    };

    rsx! {
        section { class: "panel-section",
            h3 { "Layers" }
            label { class: "toggle",
                input {
                    id: "produceToggle",
                    r#type: "checkbox",
                    checked: labels.produce_checked,
                    onchange: toggle(Category::Produce),
                }
                " Fresh Food"
            }
            label { class: "toggle",
                input {
                    id: "fastfoodToggle",
                    r#type: "checkbox",
                    checked: labels.fast_food_checked,
                    onchange: toggle(Category::FastFood),
                }
                " Fast Food"
            }
            label { class: "toggle",
                input {
                    id: "accessToggle",
                    r#type: "checkbox",
                    checked: labels.accessible_checked,
                    onchange: {
                        let ctx = ctx.clone();
                        move |evt: Event<FormData>| {
                            let accessible = evt.checked();
                            ctx.with(|c| c.set_accessible_palette(accessible));
                        }
                    },
                }
                " Colour-blind friendly"
            }
            div { class: "button-row",
                button {
                    id: "layerModeBtn",
                    onclick: {
                        let ctx = ctx.clone();
                        move |_| {
                            ctx.with(|c| c.toggle_mode());
                        }
                    },
                    "{labels.mode_button}"
                }
                button {
                    id: "legendToggleBtn",
                    "aria-pressed": "{labels.legend_pressed}",
                    onclick: {
                        let ctx = ctx.clone();
                        move |_| {
                            ctx.with(|c| c.toggle_legend());
                        }
                    },
                    "{labels.legend_button}"
                }
                button {
                    id: "borderToggleBtn",
                    onclick: {
                        let ctx = ctx.clone();
                        move |_| {
                            ctx.with(|c| c.toggle_border());
                        }
                    },
                    "{labels.border_button}"
                }
            }
        }
    }
}

/// Geocodes if needed, then filters. Failures are alerted and leave the map as it was.
fn start_filter(ctx: &MapContext, input: Result<CenterInput>, radius_km: f64) {
    let input = match input {
        Ok(input) => input,
        Err(e) => {
            dom::alert(&e.to_string());
            return;
        }
    };
    let ctx = ctx.clone();
    spawn(async move {
        let controller = Rc::clone(&ctx.controller);
        let Some(cell) = controller.get() else {
            return;
        };
        let geocoder = NominatimGeocoder::new(api::site_config().geocoder_url);
        match run_filter(cell, &geocoder, input, radius_km).await {
            Ok(Some(summary)) => {
                info!(produce = summary.produce, fast_food = summary.fast_food, "filter shown")
            }
            Ok(None) => {}
            Err(e) => dom::alert(&e.to_string()),
        }
        ctx.sync();
    });
}

#[component]
fn FilterForm() -> Element {
    let ctx = use_context::<MapContext>();
    let mut address = use_signal(String::new);
    let mut lat = use_signal(String::new);
    let mut lng = use_signal(String::new);
    let mut radius = use_signal(|| "1".to_string());

    rsx! {
        section { class: "panel-section",
            h3 { "Filter by Area" }
            input {
                id: "addressInput",
                r#type: "text",
                placeholder: "Address",
                value: "{address}",
                oninput: move |evt: Event<FormData>| address.set(evt.value()),
            }
            div { class: "coord-row",
                input {
                    id: "latInput",
                    r#type: "text",
                    inputmode: "decimal",
                    placeholder: "Latitude",
                    value: "{lat}",
                    oninput: move |evt: Event<FormData>| lat.set(evt.value()),
                }
                input {
                    id: "lngInput",
                    r#type: "text",
                    inputmode: "decimal",
                    placeholder: "Longitude",
                    value: "{lng}",
                    oninput: move |evt: Event<FormData>| lng.set(evt.value()),
                }
            }
            label { r#for: "radiusInput", "Radius (km)" }
            input {
                id: "radiusInput",
                r#type: "number",
                min: "0",
                step: "0.1",
                value: "{radius}",
                oninput: move |evt: Event<FormData>| radius.set(evt.value()),
            }
            button {
                id: "centerFilterBtn",
                onclick: move |_| {
                    let input = CenterInput::from_form(&lat.read(), &lng.read(), &address.read());
                    start_filter(&ctx, input, parse_radius_km(&radius.read()));
                },
                "Center & Filter"
            }
        }
    }
}

#[component]
fn QuickFilter() -> Element {
    let ctx = use_context::<MapContext>();
    let mut address = use_signal(String::new);
    let mut radius = use_signal(|| "1".to_string());

    rsx! {
        section { class: "panel-section quick-filter",
            input {
                id: "address",
                r#type: "text",
                placeholder: "Quick address search",
                value: "{address}",
                oninput: move |evt: Event<FormData>| address.set(evt.value()),
            }
            input {
                id: "radius",
                r#type: "number",
                min: "0",
                step: "0.1",
                value: "{radius}",
                oninput: move |evt: Event<FormData>| radius.set(evt.value()),
            }
            button {
                id: "filterBtn",
                onclick: move |_| {
                    let input = CenterInput::from_address(&address.read());
                    start_filter(&ctx, input, parse_radius_km(&radius.read()));
                },
                "Filter"
            }
        }
    }
}

fn start_export(ctx: &MapContext) {
    let ctx = ctx.clone();
    spawn(async move {
        let controller = Rc::clone(&ctx.controller);
        let Some(cell) = controller.get() else {
            return;
        };
        let settle = {
            let ctx = ctx.clone();
            async move {
                ctx.sync();
                ctx.request_invalidate();
                TimeoutFuture::new(EXPORT_SETTLE_MS).await;
            }
        };
        let capture = dom::snapshot_available()
            .then_some(|| dom::download_snapshot(MAP_STAGE_ID, EXPORT_FILE_NAME));
        let result = export_image(cell, settle, capture).await;
        ctx.sync();
        ctx.request_invalidate();
        if let Err(e) = result {
            dom::alert(&e.to_string());
        }
    });
}

fn start_print(ctx: &MapContext) {
    let ctx = ctx.clone();
    spawn(async move {
        let Some(snapshot) = ctx.with(|c| c.begin_print()).flatten() else {
            return;
        };
        TimeoutFuture::new(PRINT_SETTLE_MS).await;
        ctx.with(|c| c.show_print_view());
        dom::scroll_into_view(MAP_ID);
        TimeoutFuture::new(PRINT_DIALOG_MS).await;
        dom::print();
        TimeoutFuture::new(PRINT_RESTORE_MS).await;
        // Only synchronous actions hold the controller; wait them out so the
        // printing flag is always cleared.
        while ctx.with(|c| c.finish_print(snapshot)).is_none() && ctx.controller.get().is_some() {
            TimeoutFuture::new(PRINT_SETTLE_MS).await;
        }
    });
}

#[component]
fn ExportControls() -> Element {
    let ctx = use_context::<MapContext>();
    let (exporting, busy) = {
        let presentation = ctx.presentation.read();
        (presentation.exporting, presentation.busy())
    };

    rsx! {
        section { class: "panel-section",
            h3 { "Share" }
            div { class: "button-row",
                button {
                    id: "exportImgBtn",
                    disabled: busy,
                    onclick: {
                        let ctx = ctx.clone();
                        move |_| start_export(&ctx)
                    },
                    i { class: "fas fa-image" }
                    " Export Image"
                    if exporting {
                        span { id: "exportSpinner", class: "spinner", "aria-hidden": "true" }
                    }
                }
                button {
                    id: "printBtn",
                    disabled: busy,
                    onclick: {
                        let ctx = ctx.clone();
                        move |_| start_print(&ctx)
                    },
                    i { class: "fas fa-print" }
                    " Print"
                }
                button {
                    id: "shareLinkBtn",
                    onclick: move |_| {
                        spawn(dom::share_link());
                    },
                    i { class: "fas fa-share-alt" }
                    " Share Link"
                }
            }
        }
    }
}
