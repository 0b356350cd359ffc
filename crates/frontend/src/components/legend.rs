use dioxus::prelude::*;
use foodmap_shared::export::LEGEND_ROWS;

use crate::pages::map::MapContext;

fn swatch_class(row: &str) -> &'static str {
    match row {
        "Fresh Food" => "swatch swatch-produce",
        "Fast Food" => "swatch swatch-fast-food",
        "Newark" => "swatch swatch-boundary",
        "Filter" => "swatch swatch-filter",
        _ => "swatch swatch-cluster",
    }
}

#[component]
pub fn Legend() -> Element {
    let ctx = use_context::<MapContext>();
    if !ctx.labels.read().legend_pressed {
        return rsx! {};
    }
    let presentation = ctx.presentation.read();
    let accessible = ctx.labels.read().accessible_checked;
    let rows: Vec<&'static str> = LEGEND_ROWS
        .iter()
        .copied()
        .filter(|row| !presentation.hidden_legend_rows.contains(row))
        .collect();

    rsx! {
        div {
            class: if accessible { "map-legend accessible" } else { "map-legend" },
            "aria-label": "Map legend",
            for row in rows {
                div { key: "{row}", class: "legend-row",
                    span { class: swatch_class(row) }
                    span { "{row}" }
                }
            }
        }
    }
}

/// Title drawn over the map while an export is captured.
#[component]
pub fn ExportTitle() -> Element {
    let ctx = use_context::<MapContext>();
    let title = ctx.presentation.read().title;
    match title {
        Some(title) => rsx! {
            div { class: "export-title", "{title}" }
        },
        None => rsx! {},
    }
}
