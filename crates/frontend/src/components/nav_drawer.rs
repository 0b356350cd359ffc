use std::rc::Rc;

use dioxus::prelude::*;
use gloo_timers::future::TimeoutFuture;

use crate::dom::{self, WindowListener};
use crate::Route;

/// Matches the slide-out transition in main.css.
const OVERLAY_HIDE_MS: u32 = 350;

const LINKS: [(&str, fn() -> Route); 5] = [
    ("Home", || Route::Home {}),
    ("Our Story", || Route::StoryPage {}),
    ("Gallery", || Route::GalleryPage {}),
    ("Food Access Map", || Route::MapPage {}),
    ("KPI Builder", || Route::KpiPage {}),
];

/// Off-canvas site navigation with a dimming overlay.
#[component]
pub fn NavDrawer() -> Element {
    let mut open = use_signal(|| false);
    let mut overlay_hidden = use_signal(|| true);

    let mut close = move || {
        if !*open.peek() {
            return;
        }
        open.set(false);
        dom::set_scroll_locked(false);
        spawn(async move {
            TimeoutFuture::new(OVERLAY_HIDE_MS).await;
            if !*open.peek() {
                overlay_hidden.set(true);
            }
        });
    };

    let toggle = move |_: Event<MouseData>| {
        if *open.peek() {
            close();
        } else {
            open.set(true);
            overlay_hidden.set(false);
            dom::set_scroll_locked(true);
        }
    };

    use_hook(move || {
        Rc::new(WindowListener::new("keydown", move |event| {
            if *open.peek() && dom::event_key(&event) == "Escape" {
                open.set(false);
                dom::set_scroll_locked(false);
                overlay_hidden.set(true);
            }
        }))
    });

    let is_open = *open.read();
    let state = if is_open { " is-open" } else { "" };

    rsx! {
        header { class: "site-header",
            button {
                id: "navToggle",
                class: "nav-toggle{state}",
                "aria-controls": "mobileNav",
                "aria-expanded": "{is_open}",
                "aria-label": "Toggle navigation",
                onclick: toggle,
                span { class: "bar" }
                span { class: "bar" }
                span { class: "bar" }
            }
            span { class: "site-title", "Newark Food Access" }
        }
        nav { id: "mobileNav", class: "offcanvas-nav{state}",
            ul {
                for (label, route) in LINKS {
                    li { key: "{label}",
                        Link { to: route(), onclick: move |_| close(), "{label}" }
                    }
                }
            }
        }
        div {
            id: "navOverlay",
            class: "nav-overlay{state}",
            hidden: *overlay_hidden.read(),
            onclick: move |_| close(),
        }
    }
}
