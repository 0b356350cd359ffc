mod api;
mod components;
mod dom;
mod leaflet;
mod pages;

use dioxus::prelude::*;

use components::nav_drawer::NavDrawer;
use pages::gallery::GalleryPage;
use pages::home::Home;
use pages::kpi::KpiPage;
use pages::map::MapPage;
use pages::story::StoryPage;

#[derive(Routable, Clone, PartialEq)]
#[rustfmt::skip]
enum Route {
    #[layout(Shell)]
        #[route("/")]
        Home {},
        #[route("/story")]
        StoryPage {},
        #[route("/gallery")]
        GalleryPage {},
        #[route("/map")]
        MapPage {},
        #[route("/kpi-builder")]
        KpiPage {},
}

#[component]
fn Shell() -> Element {
    rsx! {
        NavDrawer {}
        Outlet::<Route> {}
    }
}

const CSS: Asset = asset!("/assets/main.css");
const FAVICON: Asset = asset!("/assets/favicon.svg");

#[allow(non_snake_case)]
fn App() -> Element {
    rsx! {
        document::Link { rel: "icon", r#type: "image/svg+xml", href: FAVICON }
        document::Stylesheet { href: CSS }
        Router::<Route> {}
    }
}

fn main() {
    launch(App);
}
