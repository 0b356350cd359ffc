use std::cell::{OnceCell, RefCell};
use std::rc::{Rc, Weak};

use dioxus::logger::tracing::{error, info, warn};
use dioxus::prelude::*;
use foodmap_shared::config::SiteConfig;
use foodmap_shared::error::{MapError, Result};
use foodmap_shared::heat::DEFERRED_APPLY_MS;
use foodmap_shared::loader::GeoDataLoader;
use foodmap_shared::models::{Category, ControlLabels, HeatSettings};
use foodmap_shared::panel::{FrameGate, PanelGeometry, Size, INVALIDATE_DELAY_MS};
use foodmap_shared::state::Presentation;
use foodmap_shared::MapController;
use gloo_timers::future::TimeoutFuture;

use crate::api::{self, HttpFetcher};
use crate::components::control_panel::ControlPanel;
use crate::components::legend::{ExportTitle, Legend};
use crate::components::panel_resizer::PanelResizer;
use crate::dom;
use crate::leaflet::{self, LeafletSurface, MapHandle, VIEWPORT_EVENTS};

/// Element Leaflet renders into.
pub const MAP_ID: &str = "map";
/// Wrapper around the map and its overlays; this is what an export captures.
pub const MAP_STAGE_ID: &str = "map-stage";
pub const PANEL_ID: &str = "control-panel";
pub const LAYOUT_ID: &str = "map-layout";

const LEAFLET_POLL_MS: u32 = 100;
const LEAFLET_POLL_LIMIT: u32 = 100;

type Controller = MapController<LeafletSurface>;

/// Shared by every widget on the map page. The controller is set once the
/// engine is mounted; the signals mirror what the widgets render.
#[derive(Clone)]
pub struct MapContext {
    pub controller: Rc<OnceCell<RefCell<Controller>>>,
    map: Rc<RefCell<Option<MapHandle>>>,
    frame_gate: Rc<RefCell<FrameGate>>,
    pub labels: Signal<ControlLabels>,
    pub presentation: Signal<Presentation>,
    pub panel: Signal<PanelGeometry>,
    pub ready: Signal<bool>,
}

impl MapContext {
    /// Runs `f` on the controller and republishes its labels and presentation.
    /// Returns `None` before the map is mounted or while another action holds it.
    pub fn with<R>(&self, f: impl FnOnce(&mut Controller) -> R) -> Option<R> {
        let (result, labels, presentation) = {
            let mut ctrl = self.controller.get()?.try_borrow_mut().ok()?;
            let result = f(&mut ctrl);
            (result, ctrl.labels(), ctrl.presentation().clone())
        };
        self.publish(labels, presentation);
        Some(result)
    }

    /// Re-reads labels and presentation after an async action released the controller.
    pub fn sync(&self) {
        self.with(|_| ());
    }

    fn publish(&self, labels: ControlLabels, presentation: Presentation) {
        let (mut l, mut p) = (self.labels, self.presentation);
        if *l.peek() != labels {
            l.set(labels);
        }
        if *p.peek() != presentation {
            p.set(presentation);
        }
    }

    /// Asks the map to re-measure its container, at most once per frame and
    /// after the layout transition has settled.
    pub fn request_invalidate(&self) {
        if !self.frame_gate.borrow_mut().request() {
            return;
        }
        let (gate, cell) = (Rc::clone(&self.frame_gate), Rc::downgrade(&self.controller));
        dom::next_frame(move || {
            gate.borrow_mut().fire();
            wasm_bindgen_futures::spawn_local(async move {
                TimeoutFuture::new(INVALIDATE_DELAY_MS).await;
                with_weak(&cell, |c| c.invalidate_size());
            });
        });
    }
}

/// Controller access from engine callbacks, which must not keep the page alive.
fn with_weak(cell: &Weak<OnceCell<RefCell<Controller>>>, f: impl FnOnce(&mut Controller)) {
    let Some(cell) = cell.upgrade() else {
        return;
    };
    // Leaflet fires layeradd synchronously inside addLayer; the action that
    // holds the borrow finishes with its own refresh.
    if let Some(mut ctrl) = cell.get().and_then(|c| c.try_borrow_mut().ok()) {
        f(&mut ctrl);
    };
}

async fn wait_for_leaflet() -> Result<()> {
    for _ in 0..LEAFLET_POLL_LIMIT {
        if leaflet::leaflet_available() {
            return Ok(());
        }
        TimeoutFuture::new(LEAFLET_POLL_MS).await;
    }
    Err(MapError::RenderUnavailable("Map engine"))
}

async fn init_map(ctx: MapContext, config: SiteConfig) -> Result<()> {
    wait_for_leaflet().await?;
    let mut surface = LeafletSurface::mount(MAP_ID)?;
    *ctx.map.borrow_mut() = Some(surface.handle());

    let weak = Rc::downgrade(&ctx.controller);
    surface.on(VIEWPORT_EVENTS, move || with_weak(&weak, |c| c.on_viewport_change()));

    // The sliders open at their maximum, which is the configured default.
    let heat = HeatSettings {
        radius: config.heat_radius,
        intensity: config.heat_intensity,
    };
    let mut controller = MapController::new(surface, heat);
    controller.fit_default_view();
    if ctx.controller.set(RefCell::new(controller)).is_err() {
        warn!("map controller already initialized");
    }
    ctx.sync();

    let loader = GeoDataLoader::new(HttpFetcher::default());
    for (category, path) in [
        (Category::Produce, &config.produce_data),
        (Category::FastFood, &config.fast_food_data),
    ] {
        let url = config.resolve(path);
        match loader.load(&url).await {
            Ok(collection) => {
                ctx.with(|c| c.install_category(category, collection.features.clone()));
            }
            Err(e) => error!(%category, error = %e, "failed to load map layer"),
        }
    }

    let url = config.resolve(&config.boundary_data);
    match loader.load(&url).await {
        Ok(collection) => {
            ctx.with(|c| c.install_boundary(&collection));
        }
        Err(e) => error!(error = %e, "failed to load city boundary"),
    }

    ctx.with(|c| c.refresh_view());
    let mut ready = ctx.ready;
    ready.set(true);
    info!("map ready");

    TimeoutFuture::new(DEFERRED_APPLY_MS).await;
    ctx.with(|c| c.refresh_heatmap());
    Ok(())
}

#[component]
pub fn MapPage() -> Element {
    let labels = use_signal(ControlLabels::default);
    let presentation = use_signal(Presentation::default);
    let panel = use_signal(|| PanelGeometry::new(dom::measure(PANEL_ID), dom::viewport_height()));
    let ready = use_signal(|| false);

    let ctx = use_context_provider(|| MapContext {
        controller: Rc::new(OnceCell::new()),
        map: Rc::new(RefCell::new(None)),
        frame_gate: Rc::new(RefCell::new(FrameGate::default())),
        labels,
        presentation,
        panel,
        ready,
    });

    use_hook({
        let ctx = ctx.clone();
        move || {
            spawn(async move {
                if let Err(e) = init_map(ctx, api::site_config()).await {
                    error!(error = %e, "failed to initialize map");
                }
            });
        }
    });

    use_drop({
        let ctx = ctx.clone();
        move || {
            if let Some(map) = ctx.map.borrow_mut().take() {
                map.teardown();
            }
        }
    });

    let geometry = panel.read();
    let collapsed = geometry.is_collapsed() || presentation.read().panel_collapsed;
    let panel_class = if presentation.read().panel_collapsed {
        "control-panel collapsed"
    } else {
        geometry.class()
    };
    let panel_style = if collapsed {
        String::new()
    } else {
        geometry.sizing().style()
    };
    let layout_class = format!("map-layout axis-{}", geometry.axis.orientation());
    drop(geometry);

    rsx! {
        div { id: LAYOUT_ID, class: "{layout_class}",
            aside {
                id: PANEL_ID,
                class: "{panel_class}",
                style: "{panel_style}",
                ControlPanel {}
            }
            PanelResizer {}
            div { id: MAP_STAGE_ID, class: "map-stage",
                div { id: MAP_ID, class: "map" }
                Legend {}
                ExportTitle {}
                if !*ready.read() {
                    div { class: "map-loading", "Loading map data…" }
                }
            }
            if collapsed && !presentation.read().exporting {
                button {
                    class: "show-panel-btn",
                    onclick: {
                        let ctx = ctx.clone();
                        move |_| {
                            let mut panel = ctx.panel;
                            if panel.write().restore() {
                                ctx.request_invalidate();
                            }
                        }
                    },
                    "Show Controls"
                }
            }
        }
    }
}

/// Measured sizes the panel geometry works against.
pub fn measured_panel() -> Size {
    dom::measure(PANEL_ID)
}

pub fn measured_layout() -> Size {
    dom::measure(LAYOUT_ID)
}
