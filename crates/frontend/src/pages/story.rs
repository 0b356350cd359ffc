use dioxus::prelude::*;

use crate::components::reveal::{use_revealed, use_scroll_progress};
use crate::Route;

const TIMELINE_ID: &str = "story-timeline";

#[derive(Debug, Clone, Copy, PartialEq)]
struct Chapter {
    icon: &'static str,
    title: &'static str,
    text: &'static str,
}

const CHAPTERS: [Chapter; 4] = [
    Chapter {
        icon: "fas fa-store",
        title: "Corner stores carry the load",
        text: "In many Newark blocks the nearest place to buy food is a bodega. \
               Shelves lean toward packaged snacks, and fresh produce is the exception.",
    },
    Chapter {
        icon: "fas fa-hamburger",
        title: "Fast food fills the gap",
        text: "Along the busiest corridors fast food outlets outnumber grocers. \
               The map's heat layers show where the two overlap and where they do not.",
    },
    Chapter {
        icon: "fas fa-seedling",
        title: "Growers close to home",
        text: "Community gardens and farmers markets bring produce into the wards, \
               but their reach depends on distance, season and price.",
    },
    Chapter {
        icon: "fas fa-truck",
        title: "Following the margins",
        text: "Every hop from farm to distributor to store adds handling and markup. \
               The KPI builder breaks down who earns what on each crop.",
    },
];

#[component]
pub fn StoryPage() -> Element {
    let progress = use_scroll_progress(TIMELINE_ID);

    rsx! {
        main { class: "story-page",
            section { class: "hero",
                div { class: "hero-text",
                    h1 { "Our Story" }
                    p { "How food reaches Newark's tables, one stop at a time." }
                }
            }
            div { id: TIMELINE_ID, class: "timeline",
                div { class: "storyline", "aria-hidden": "true",
                    div { class: "storyline-fill", style: "transform: scaleY({progress});" }
                }
                for (index, chapter) in CHAPTERS.into_iter().enumerate() {
                    ChapterCard { key: "{index}", index, chapter }
                }
            }
            section { class: "story-tagline",
                p { "See it for yourself." }
                Link { class: "button", to: Route::MapPage {}, "Open the map" }
            }
        }
    }
}

#[component]
fn ChapterCard(index: usize, chapter: Chapter) -> Element {
    let id = format!("chapter-{index}");
    let visible = use_revealed(id.clone());
    let (state, icon_state) = if *visible.read() { (" visible", " active") } else { ("", "") };
    let side = if index % 2 == 0 { "left" } else { "right" };

    rsx! {
        article { id: "{id}", class: "chapter {side}{state}",
            div { class: "icon{icon_state}",
                i { class: "{chapter.icon}" }
            }
            div { class: "chapter-body",
                h2 { "{chapter.title}" }
                p { "{chapter.text}" }
            }
        }
    }
}
