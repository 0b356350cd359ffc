use std::rc::Rc;

use dioxus::prelude::*;

use crate::components::carousel::{wrap_index, Slide};
use crate::dom::{self, WindowListener};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LightboxAction {
    Close,
    Prev,
    Next,
}

/// Keyboard shortcuts while the lightbox is open.
pub fn key_action(key: &str) -> Option<LightboxAction> {
    match key {
        "Escape" => Some(LightboxAction::Close),
        "ArrowLeft" => Some(LightboxAction::Prev),
        "ArrowRight" => Some(LightboxAction::Next),
        _ => None,
    }
}

/// Photo shown after `action`, wrapping at both ends; `None` once closed.
pub fn step(current: usize, len: usize, action: LightboxAction) -> Option<usize> {
    match action {
        LightboxAction::Close => None,
        LightboxAction::Prev => Some(wrap_index(current as isize - 1, len)),
        LightboxAction::Next => Some(wrap_index(current as isize + 1, len)),
    }
}

fn apply(mut open: Signal<Option<usize>>, len: usize, action: LightboxAction) {
    let Some(current) = *open.peek() else {
        return;
    };
    open.set(step(current, len, action));
}

/// Full-screen viewer over `photos`. `open` holds the index on display.
#[component]
pub fn Lightbox(photos: Vec<Slide>, open: Signal<Option<usize>>) -> Element {
    let len = photos.len();

    use_hook(move || {
        Rc::new(WindowListener::new("keydown", move |event| {
            if let Some(action) = key_action(&dom::event_key(&event)) {
                apply(open, len, action);
            }
        }))
    });
    use_effect(move || dom::set_scroll_locked(open.read().is_some()));
    use_drop(|| dom::set_scroll_locked(false));

    let index = *open.read();
    let Some(photo) = index.and_then(|i| photos.get(i)).cloned() else {
        return rsx! {};
    };

    rsx! {
        div {
            class: "lightbox",
            role: "dialog",
            "aria-modal": "true",
            "aria-label": "Photo viewer",
            onclick: move |_| apply(open, len, LightboxAction::Close),
            img {
                src: "{photo.src}",
                alt: photo.alt,
                onclick: |evt: Event<MouseData>| evt.stop_propagation(),
            }
            button {
                class: "lightbox-close",
                "aria-label": "Close",
                onclick: move |evt: Event<MouseData>| {
                    evt.stop_propagation();
                    apply(open, len, LightboxAction::Close);
                },
                i { class: "fas fa-times" }
            }
            button {
                class: "lightbox-prev",
                "aria-label": "Previous photo",
                onclick: move |evt: Event<MouseData>| {
                    evt.stop_propagation();
                    apply(open, len, LightboxAction::Prev);
                },
                i { class: "fas fa-chevron-left" }
            }
            button {
                class: "lightbox-next",
                "aria-label": "Next photo",
                onclick: move |evt: Event<MouseData>| {
                    evt.stop_propagation();
                    apply(open, len, LightboxAction::Next);
                },
                i { class: "fas fa-chevron-right" }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_action() {
        assert_eq!(key_action("Escape"), Some(LightboxAction::Close));
        assert_eq!(key_action("ArrowLeft"), Some(LightboxAction::Prev));
        assert_eq!(key_action("ArrowRight"), Some(LightboxAction::Next));
        assert_eq!(key_action("Enter"), None);
    }

    #[test]
    fn test_step_wraps_and_closes() {
        assert_eq!(step(0, 6, LightboxAction::Prev), Some(5));
        assert_eq!(step(5, 6, LightboxAction::Next), Some(0));
        assert_eq!(step(2, 6, LightboxAction::Next), Some(3));
        assert_eq!(step(2, 6, LightboxAction::Close), None);
    }
}
