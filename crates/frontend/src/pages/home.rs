use dioxus::prelude::*;

use crate::api;
use crate::components::carousel::{Carousel, Slide};
use crate::components::reveal::Reveal;
use crate::Route;

const SLIDES: [(&str, &str); 3] = [
    ("images/carousel/market.jpg", "Produce stand at a Newark corner market"),
    ("images/carousel/garden.jpg", "Community garden beds in the Central Ward"),
    ("images/carousel/bodega.jpg", "Fresh fruit display inside a neighborhood bodega"),
];

#[component]
pub fn Home() -> Element {
    let config = api::site_config();
    let slides: Vec<Slide> = SLIDES
        .iter()
        .map(|&(path, alt)| Slide {
            src: config.resolve(path),
            alt,
        })
        .collect();

    rsx! {
        main { class: "home-page",
            section { class: "hero",
                div { class: "hero-text",
                    h1 { "Newark Food Access" }
                    p {
                        "Where fresh food and fast food are sold across Newark, and what it costs "
                        "to move produce from the farm to the corner store."
                    }
                }
                div { class: "hero-actions",
                    Link { class: "button", to: Route::MapPage {}, "Open the map" }
                    Link { class: "button secondary", to: Route::KpiPage {}, "Build supply chain KPIs" }
                }
            }
            Carousel { slides }
            Reveal { id: "home-map", class: "content-section",
                h2 { "The map" }
                p {
                    "Heat and cluster views of fresh food and fast food sellers, with the city "
                    "boundary, an area filter and image export."
                }
                Link { to: Route::MapPage {}, "Explore the map" }
            }
            Reveal { id: "home-story", class: "content-section",
                h2 { "The story" }
                p { "How produce moves from farms to bodegas, and where access falls short." }
                Link { to: Route::StoryPage {}, "Read our story" }
            }
            Reveal { id: "home-gallery", class: "content-section",
                h2 { "The gallery" }
                p { "Photos of the markets, gardens and storefronts behind the data." }
                Link { to: Route::GalleryPage {}, "View the gallery" }
            }
        }
    }
}
