use std::collections::BTreeSet;

use dioxus::logger::tracing::error;
use dioxus::prelude::*;
use foodmap_shared::kpi::{
    format_cell, is_read_only, is_text_column, ColumnVisibility, KpiRow, KpiTable, Role, CATEGORY, PRODUCE,
};

use crate::api;

fn text_cell<'a>(row: &'a KpiRow, header: &str) -> &'a str {
    if header == PRODUCE {
        &row.produce
    } else if header == CATEGORY {
        &row.category
    } else {
        ""
    }
}

fn parse_role(raw: &str) -> Option<Role> {
    Role::ALL.into_iter().find(|r| r.to_string() == raw)
}

#[component]
pub fn KpiPage() -> Element {
    let sheet = use_resource(|| async { api::fetch_kpi_table(&api::site_config()).await });

    let view = match &*sheet.read() {
        None => rsx! {
            main { class: "kpi-page", p { class: "loading", "Loading supply chain data…" } }
        },
        Some(Err(e)) => {
            error!(error = %e, "failed to load KPI sheet");
            rsx! {
                main { class: "kpi-page", p { class: "error", "{e}" } }
            }
        }
        Some(Ok(table)) => rsx! {
            KpiBuilder { initial: table.clone() }
        },
    };
    view
}

#[component]
fn KpiBuilder(initial: KpiTable) -> Element {
    let mut table = use_signal(|| initial.clone());
    let mut role = use_signal(|| Some(Role::Farm));
    let mut columns = use_signal(ColumnVisibility::default);
    let mut selected = use_signal(|| initial.crops().into_iter().collect::<BTreeSet<String>>());

    let current_role = *role.read();
    let sheet = table.read();
    let visibility = columns.read();
    let chosen = selected.read();
    let headers: Vec<String> = sheet
        .headers
        .iter()
        .filter(|h| visibility.is_visible(h, current_role))
        .cloned()
        .collect();
    let optional: Vec<(String, bool)> = sheet
        .headers
        .iter()
        .filter(|h| !is_text_column(h))
        .map(|h| (h.clone(), visibility.is_visible(h, current_role)))
        .collect();
    let crops: Vec<(String, bool)> = sheet
        .crops()
        .into_iter()
        .map(|c| {
            let on = chosen.contains(&c);
            (c, on)
        })
        .collect();
    let totals = current_role.map(|r| {
        let t = sheet.totals(r, &chosen);
        (
            r,
            [
                ("Quantity (lbs)", format!("{:.0}", t.qty)),
                ("Revenue", format!("${:.2}", t.revenue)),
                ("Gross profit", format!("${:.2}", t.gross_profit)),
                ("Margin", format!("{:.1}%", t.margin_pct)),
            ],
        )
    });
    let rows: Vec<(usize, Vec<(String, String, bool)>)> = sheet
        .rows
        .iter()
        .enumerate()
        .filter(|(_, row)| chosen.contains(&row.produce))
        .map(|(i, row)| {
            let cells = headers
                .iter()
                .map(|h| {
                    let shown = if is_text_column(h) {
                        text_cell(row, h).to_string()
                    } else {
                        format_cell(h, row.get(h))
                    };
                    (h.clone(), shown, is_read_only(h))
                })
                .collect();
            (i, cells)
        })
        .collect();
    drop((sheet, visibility, chosen));

    rsx! {
        main { class: "kpi-page",
            h1 { "Supply Chain KPI Builder" }
            div { class: "kpi-controls",
                label { r#for: "roleSelect", "Role" }
                select {
                    id: "roleSelect",
                    onchange: move |evt: Event<FormData>| role.set(parse_role(&evt.value())),
                    option { value: "", selected: current_role.is_none(), "No role" }
                    for r in Role::ALL {
                        option {
                            key: "{r}",
                            value: "{r}",
                            selected: current_role == Some(r),
                            "{r}"
                        }
                    }
                }
                fieldset { class: "crop-filter",
                    legend { "Crops" }
                    for (crop, on) in crops {
                        label { key: "{crop}", class: "toggle",
                            input {
                                r#type: "checkbox",
                                checked: on,
                                onchange: {
                                    let crop = crop.clone();
                                    move |evt: Event<FormData>| {
                                        if evt.checked() {
                                            selected.write().insert(crop.clone());
                                        } else {
                                            selected.write().remove(&crop);
                                        }
                                    }
                                },
                            }
                            " {crop}"
                        }
                    }
                }
                fieldset { class: "column-filter",
                    legend { "Columns" }
                    for (header, visible) in optional {
                        label { key: "{header}", class: "toggle",
                            input {
                                r#type: "checkbox",
                                checked: visible,
                                onchange: {
                                    let header = header.clone();
                                    move |evt: Event<FormData>| columns.write().set(&header, evt.checked())
                                },
                            }
                            " {header}"
                        }
                    }
                }
            }
            div { class: "kpi-table-wrap",
                table { class: "kpi-table",
                    thead {
                        tr {
                            for h in headers.iter() {
                                th { key: "{h}", "{h}" }
                            }
                        }
                    }
                    tbody {
                        for (i, cells) in rows {
                            tr { key: "{i}",
                                for (header, shown, read_only) in cells {
                                    td { key: "{header}",
                                        if read_only {
                                            "{shown}"
                                        } else {
                                            input {
                                                r#type: "number",
                                                step: "any",
                                                value: "{shown}",
                                                onchange: {
                                                    let header = header.clone();
                                                    move |evt: Event<FormData>| {
                                                        table.write().set_cell(i, &header, &evt.value());
                                                    }
                                                },
                                            }
                                        }
                                    }
                                }
                            }
                        }
                    }
                }
            }
            if let Some((r, figures)) = totals {
                section { class: "kpi-totals",
                    h2 { "{r} totals" }
                    dl {
                        for (name, value) in figures {
                            dt { key: "{name}", "{name}" }
                            dd { "{value}" }
                        }
                    }
                }
            }
        }
    }
}
