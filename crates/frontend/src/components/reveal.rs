use std::cell::RefCell;
use std::rc::Rc;

use dioxus::prelude::*;
use foodmap_shared::panel::FrameGate;

use crate::dom::{self, WindowListener};

/// Share of the viewport trimmed from the top and from the bottom.
const ROOT_MARGIN: f64 = 0.1;
/// Share of an element that must sit inside the trimmed viewport.
const THRESHOLD: f64 = 0.15;

/// Whether an element spanning `top..bottom` (viewport coordinates) has come into view.
pub fn revealed(top: f64, bottom: f64, viewport_height: f64) -> bool {
    let height = bottom - top;
    if height <= 0.0 {
        return false;
    }
    let visible = bottom.min(viewport_height * (1.0 - ROOT_MARGIN)) - top.max(viewport_height * ROOT_MARGIN);
    visible / height >= THRESHOLD
}

/// How far the page has scrolled through an element, from 0 when its top
/// reaches the top of the viewport to 1 when its bottom reaches the bottom.
pub fn scroll_progress(top: f64, height: f64, viewport_height: f64) -> f64 {
    let span = height - viewport_height;
    if span <= 0.0 {
        return if top <= 0.0 { 1.0 } else { 0.0 };
    }
    (-top / span).clamp(0.0, 1.0)
}

pub fn prefers_reduced_motion() -> bool {
    dom::matches_media("(prefers-reduced-motion: reduce)")
}

fn check_revealed(id: &str, mut shown: Signal<bool>) {
    if *shown.peek() {
        return;
    }
    if dom::vertical_extent(id).is_some_and(|(top, bottom)| revealed(top, bottom, dom::viewport_height())) {
        shown.set(true);
    }
}

/// Becomes true once the element with `id` scrolls into view and stays true.
/// Starts true when the user prefers reduced motion.
pub fn use_revealed(id: String) -> Signal<bool> {
    let shown = use_signal(prefers_reduced_motion);
    let mounted_id = id.clone();
    use_hook(move || {
        let (scroll_id, resize_id) = (id.clone(), id);
        Rc::new((
            WindowListener::new("scroll", move |_| check_revealed(&scroll_id, shown)),
            WindowListener::new("resize", move |_| check_revealed(&resize_id, shown)),
        ))
    });
    use_effect(move || check_revealed(&mounted_id, shown));
    shown
}

fn update_progress(id: &str, mut progress: Signal<f64>) {
    let Some((top, bottom)) = dom::vertical_extent(id) else {
        return;
    };
    let next = scroll_progress(top, bottom - top, dom::viewport_height());
    if *progress.peek() != next {
        progress.set(next);
    }
}

/// Scroll progress through the element with `id`, recomputed at most once per frame.
pub fn use_scroll_progress(id: &'static str) -> Signal<f64> {
    let progress = use_signal(|| 0.0);
    use_hook(move || {
        let gate = Rc::new(RefCell::new(FrameGate::default()));
        let on_event = move |_: web_sys::Event| {
            if !gate.borrow_mut().request() {
                return;
            }
            let gate = Rc::clone(&gate);
            dom::next_frame(move || {
                gate.borrow_mut().fire();
                update_progress(id, progress);
            });
        };
        Rc::new((
            WindowListener::new("scroll", on_event.clone()),
            WindowListener::new("resize", on_event),
        ))
    });
    use_effect(move || update_progress(id, progress));
    progress
}

/// Fades its children in the first time they scroll into view.
#[component]
pub fn Reveal(id: String, #[props(default)] class: String, children: Element) -> Element {
    let shown = use_revealed(id.clone());
    let state = if *shown.read() { " is-visible" } else { "" };

    rsx! {
        div { id: "{id}", class: "reveal {class}{state}", {children} }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_revealed_needs_share_inside_margins() {
        // Viewport 1000 px tall: only 100..900 counts.
        assert!(revealed(200.0, 400.0, 1000.0));
        assert!(!revealed(1000.0, 1200.0, 1000.0));
        // 200 px element with 20 px past the bottom margin is 10 %.
        assert!(!revealed(880.0, 1080.0, 1000.0));
        // 40 px past the margin is 20 %.
        assert!(revealed(860.0, 1060.0, 1000.0));
        assert!(!revealed(300.0, 300.0, 1000.0));
    }

    #[test]
    fn test_scroll_progress_is_clamped() {
        assert_eq!(scroll_progress(100.0, 3000.0, 1000.0), 0.0);
        assert_eq!(scroll_progress(-1000.0, 3000.0, 1000.0), 0.5);
        assert_eq!(scroll_progress(-5000.0, 3000.0, 1000.0), 1.0);
    }

    #[test]
    fn test_scroll_progress_short_element() {
        assert_eq!(scroll_progress(0.0, 500.0, 1000.0), 1.0);
        assert_eq!(scroll_progress(20.0, 500.0, 1000.0), 0.0);
    }
}
