use dioxus::prelude::*;

use crate::api;
use crate::components::carousel::Slide;
use crate::components::lightbox::Lightbox;
use crate::components::reveal::Reveal;

const PHOTOS: [(&str, &str); 6] = [
    ("images/gallery/broad-street-market.jpg", "Vendors setting out produce on Broad Street"),
    ("images/gallery/ironbound-grocer.jpg", "Shelves of fresh vegetables at an Ironbound grocer"),
    ("images/gallery/central-ward-garden.jpg", "Volunteers harvesting greens in a Central Ward garden"),
    ("images/gallery/corner-bodega.jpg", "Fruit baskets at the counter of a corner bodega"),
    ("images/gallery/fast-food-strip.jpg", "A row of fast food storefronts along a commercial strip"),
    ("images/gallery/farmers-market.jpg", "Shoppers at the Saturday farmers market"),
];

#[component]
pub fn GalleryPage() -> Element {
    let config = api::site_config();
    let photos: Vec<Slide> = PHOTOS
        .iter()
        .map(|&(path, alt)| Slide {
            src: config.resolve(path),
            alt,
        })
        .collect();
    let mut open = use_signal(|| None::<usize>);

    rsx! {
        main { class: "gallery-page",
            section { class: "hero",
                div { class: "hero-text",
                    h1 { "Gallery" }
                    p { "Markets, gardens and storefronts from across Newark's wards." }
                }
            }
            section { class: "gallery-section",
                Reveal { id: "gallery-heading",
                    h2 { "Around the City" }
                }
                div { class: "gallery-grid",
                    for (i, photo) in photos.iter().enumerate() {
                        Reveal { key: "{photo.src}", id: "gallery-thumb-{i}", class: "gallery-thumb",
                            button {
                                class: "thumb-btn",
                                "aria-label": "Open photo: {photo.alt}",
                                onclick: move |_| open.set(Some(i)),
                                img { src: "{photo.src}", alt: photo.alt, loading: "lazy" }
                            }
                        }
                    }
                }
            }
            Lightbox { photos: photos.clone(), open }
        }
    }
}
