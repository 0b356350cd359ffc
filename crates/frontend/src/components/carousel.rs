use dioxus::prelude::*;
use gloo_timers::future::TimeoutFuture;

/// How long a slide change blocks the next one.
pub const SLIDE_LOCK_MS: u32 = 400;
/// Horizontal travel in px that counts as a swipe.
pub const SWIPE_THRESHOLD: f64 = 50.0;

/// Index after moving `index` by `delta`, wrapping at both ends.
pub fn wrap_index(index: isize, len: usize) -> usize {
    if len == 0 {
        return 0;
    }
    index.rem_euclid(len as isize) as usize
}

/// Slide step for a finished swipe: right goes back, left goes forward.
pub fn swipe_step(diff_x: f64) -> Option<isize> {
    if diff_x.abs() <= SWIPE_THRESHOLD {
        None
    } else if diff_x > 0.0 {
        Some(-1)
    } else {
        Some(1)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Slide {
    pub src: String,
    pub alt: &'static str,
}

#[component]
pub fn Carousel(slides: Vec<Slide>) -> Element {
    let mut index = use_signal(|| 0_usize);
    let mut locked = use_signal(|| false);
    let mut touch_start = use_signal(|| None::<f64>);
    let len = slides.len();

    let mut go = move |delta: isize| {
        if *locked.peek() {
            return;
        }
        locked.set(true);
        let next = wrap_index(*index.peek() as isize + delta, len);
        index.set(next);
        spawn(async move {
            TimeoutFuture::new(SLIDE_LOCK_MS).await;
            locked.set(false);
        });
    };

    let offset = *index.read() * 100;

    rsx! {
        div { id: "image-carousel", class: "carousel",
            div {
                class: "carousel-track",
                style: "transform: translateX(-{offset}%);",
                ontouchstart: move |evt: Event<TouchData>| {
                    if let Some(t) = evt.data().touches().first() {
                        touch_start.set(Some(t.client_coordinates().x));
                    }
                },
                ontouchend: move |evt: Event<TouchData>| {
                    let Some(start) = touch_start.take() else {
                        return;
                    };
                    if let Some(t) = evt.data().touches_changed().first() {
                        if let Some(step) = swipe_step(t.client_coordinates().x - start) {
                            go(step);
                        }
                    }
                },
                for slide in slides.iter() {
                    div { key: "{slide.src}", class: "carousel-slide",
                        img { src: "{slide.src}", alt: slide.alt, loading: "lazy" }
                    }
                }
            }
            button {
                class: "carousel-btn prev",
                "aria-label": "Previous slide",
                onclick: move |_| go(-1),
                i { class: "fas fa-chevron-left" }
            }
            button {
                class: "carousel-btn next",
                "aria-label": "Next slide",
                onclick: move |_| go(1),
                i { class: "fas fa-chevron-right" }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrap_index_wraps_both_ends() {
        assert_eq!(wrap_index(3, 3), 0);
        assert_eq!(wrap_index(-1, 3), 2);
        assert_eq!(wrap_index(1, 3), 1);
        assert_eq!(wrap_index(-1, 0), 0);
    }

    #[test]
    fn test_swipe_needs_threshold() {
        assert_eq!(swipe_step(50.0), None);
        assert_eq!(swipe_step(-20.0), None);
        assert_eq!(swipe_step(80.0), Some(-1));
        assert_eq!(swipe_step(-51.0), Some(1));
    }
}
