use std::cell::Cell;
use std::collections::HashMap;
use std::rc::Rc;

use dioxus::logger::tracing::{debug, warn};
use foodmap_shared::error::{MapError, Result};
use foodmap_shared::models::{Feature, Gradient, HeatPoint, LatLng, MarkerIcon};
use foodmap_shared::spatial::{LatLngBounds, NEWARK_BOUNDS};
use foodmap_shared::surface::{
    BaseTiles, BoundaryStyle, LayerId, MapSurface, MapView, MarkerSpec, FILTER_CIRCLE_COLOR,
    FILTER_CIRCLE_DASH,
};
use serde_json::{json, Value};
use wasm_bindgen::prelude::*;

use crate::dom;

const STANDARD_TILES: &str = "https://{s}.tile.openstreetmap.org/{z}/{x}/{y}.png";
const STANDARD_ATTRIBUTION: &str = "&copy; OpenStreetMap contributors";
const GRAY_TILES: &str = "https://tiles.stadiamaps.com/tiles/alidade_smooth/{z}/{x}/{y}{r}.png";
const GRAY_ATTRIBUTION: &str = "&copy; OpenMapTiles & Stadia Maps";
const BOUNDARY_COLOR: &str = "#008000";
const MAX_ZOOM: f64 = 18.0;
const INITIAL_ZOOM: f64 = 13.0;

/// Events after which the heat canvas has to be redrawn.
pub const VIEWPORT_EVENTS: &str = "layeradd layerremove zoomend moveend";

#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(js_namespace = L)]
    #[derive(Clone)]
    pub type Map;

    #[wasm_bindgen(js_namespace = L, js_name = map)]
    fn create_map(id: &str, options: &JsValue) -> Map;

    #[wasm_bindgen(method, js_name = addLayer)]
    fn add_layer(this: &Map, layer: &Layer);

    #[wasm_bindgen(method, js_name = removeLayer)]
    fn remove_layer(this: &Map, layer: &Layer);

    #[wasm_bindgen(method, js_name = hasLayer)]
    fn has_layer(this: &Map, layer: &Layer) -> bool;

    #[wasm_bindgen(method, js_name = setView)]
    fn set_view(this: &Map, center: &JsValue, zoom: f64, options: &JsValue);

    #[wasm_bindgen(method, js_name = getCenter)]
    fn get_center(this: &Map) -> Coordinates;

    #[wasm_bindgen(method, js_name = getZoom)]
    fn get_zoom(this: &Map) -> f64;

    #[wasm_bindgen(method, js_name = fitBounds)]
    fn fit_bounds(this: &Map, bounds: &JsValue);

    #[wasm_bindgen(method, js_name = setMaxBounds)]
    fn set_max_bounds(this: &Map, bounds: &JsValue);

    #[wasm_bindgen(method, js_name = getBoundsZoom)]
    fn get_bounds_zoom(this: &Map, bounds: &JsValue, inside: bool) -> f64;

    #[wasm_bindgen(method, js_name = setMinZoom)]
    fn set_min_zoom(this: &Map, zoom: f64);

    #[wasm_bindgen(method, js_name = invalidateSize)]
    fn invalidate_size(this: &Map);

    #[wasm_bindgen(method)]
    fn on(this: &Map, events: &str, handler: &js_sys::Function);

    #[wasm_bindgen(method)]
    fn remove(this: &Map);

    #[wasm_bindgen(js_namespace = L, js_name = LatLng)]
    type Coordinates;

    #[wasm_bindgen(method, getter)]
    fn lat(this: &Coordinates) -> f64;

    #[wasm_bindgen(method, getter)]
    fn lng(this: &Coordinates) -> f64;

    #[wasm_bindgen(js_namespace = L)]
    #[derive(Clone)]
    pub type Layer;

    #[wasm_bindgen(js_namespace = L, js_name = tileLayer)]
    fn tile_layer(url: &str, options: &JsValue) -> Layer;

    #[wasm_bindgen(js_namespace = L, js_name = heatLayer)]
    fn heat_layer(points: &JsValue, options: &JsValue) -> Layer;

    #[wasm_bindgen(js_namespace = L, js_name = markerClusterGroup)]
    fn marker_cluster_group(options: &JsValue) -> Layer;

    #[wasm_bindgen(js_namespace = L, js_name = geoJSON)]
    fn geo_json(data: &JsValue, options: &JsValue) -> Layer;

    #[wasm_bindgen(js_namespace = L, js_name = circle)]
    fn circle(center: &JsValue, options: &JsValue) -> Layer;

    #[wasm_bindgen(js_namespace = L, js_name = marker)]
    fn marker(position: &JsValue, options: &JsValue) -> Layer;

    #[wasm_bindgen(js_namespace = L, js_name = divIcon)]
    fn div_icon(options: &JsValue) -> JsValue;

    #[wasm_bindgen(method, js_name = bindPopup)]
    fn bind_popup(this: &Layer, html: &str) -> Layer;

    #[wasm_bindgen(method, js_name = setOptions)]
    fn set_options(this: &Layer, options: &JsValue);

    #[wasm_bindgen(method, js_name = setLatLngs)]
    fn set_lat_lngs(this: &Layer, points: &JsValue);

    #[wasm_bindgen(method, js_name = clearLayers)]
    fn clear_layers(this: &Layer);

    #[wasm_bindgen(method, js_name = addLayer)]
    fn add_child(this: &Layer, child: &Layer);

    /// The map a layer is currently on; `undefined` when detached.
    #[wasm_bindgen(method, getter, js_name = _map)]
    fn owner(this: &Layer) -> JsValue;
}

/// True once the Leaflet script has defined `L` along with both plugins.
pub fn leaflet_available() -> bool {
    let Some(window) = web_sys::window() else {
        return false;
    };
    let Some(l) = js_sys::Reflect::get(&window, &JsValue::from_str("L"))
        .ok()
        .filter(|l| !l.is_undefined() && !l.is_null())
    else {
        return false;
    };
    ["heatLayer", "markerClusterGroup"]
        .iter()
        .all(|name| js_sys::Reflect::has(&l, &JsValue::from_str(name)).unwrap_or(false))
}

fn js(value: &Value) -> JsValue {
    js_sys::JSON::parse(&value.to_string()).unwrap_or(JsValue::UNDEFINED)
}

fn lat_lng(p: LatLng) -> JsValue {
    js(&json!([p.lat, p.lng]))
}

fn bounds(b: LatLngBounds) -> JsValue {
    js(&json!([
        [b.south_west.lat, b.south_west.lng],
        [b.north_east.lat, b.north_east.lng]
    ]))
}

fn heat_points(points: &[HeatPoint]) -> JsValue {
    let rows: Vec<[f64; 3]> = points.iter().map(|p| [p.lat, p.lng, p.intensity]).collect();
    js(&json!(rows))
}

fn gradient(g: &Gradient) -> Value {
    let stops: serde_json::Map<String, Value> = g
        .stops
        .iter()
        .map(|(at, color)| (at.to_string(), Value::from(*color)))
        .collect();
    Value::Object(stops)
}

/// Clone of the map plus the liveness flag, kept by the page so it can tear
/// the map down on unmount while the surface is owned by the controller.
#[derive(Clone)]
pub struct MapHandle {
    map: Map,
    alive: Rc<Cell<bool>>,
}

impl MapHandle {
    pub fn teardown(&self) {
        if self.alive.replace(false) {
            self.map.remove();
            debug!("map removed");
        }
    }
}

/// [`MapSurface`] over a Leaflet map. Every call checks that the map has not
/// been torn down; heat layer updates also require the layer to be on a map.
pub struct LeafletSurface {
    map: Map,
    container_id: &'static str,
    alive: Rc<Cell<bool>>,
    layers: HashMap<LayerId, Layer>,
    next_id: u32,
    standard_tiles: Layer,
    gray_tiles: Layer,
    tiles: BaseTiles,
    last_view: MapView,
    handlers: Vec<Closure<dyn FnMut()>>,
}

impl LeafletSurface {
    /// Creates the map inside the element with id `container_id`, on the
    /// standard tiles and framed on the fallback city box.
    pub fn mount(container_id: &'static str) -> Result<Self> {
        if !leaflet_available() {
            return Err(MapError::RenderUnavailable("Map engine"));
        }
        let center = NEWARK_BOUNDS.center();
        let map = create_map(
            container_id,
            &js(&json!({
                "maxZoom": MAX_ZOOM,
                "center": [center.lat, center.lng],
                "zoom": INITIAL_ZOOM,
                "minZoom": 12,
                "maxBoundsViscosity": 1,
                "scrollWheelZoom": true,
                "doubleClickZoom": true,
                "touchZoom": true,
                "bounceAtZoomLimits": false,
            })),
        );
        let standard_tiles = tile_layer(STANDARD_TILES, &js(&json!({ "attribution": STANDARD_ATTRIBUTION })));
        let gray_tiles = tile_layer(GRAY_TILES, &js(&json!({ "attribution": GRAY_ATTRIBUTION })));
        map.add_layer(&standard_tiles);

        Ok(Self {
            map,
            container_id,
            alive: Rc::new(Cell::new(true)),
            layers: HashMap::new(),
            next_id: 0,
            standard_tiles,
            gray_tiles,
            tiles: BaseTiles::Standard,
            last_view: MapView {
                center,
                zoom: INITIAL_ZOOM,
            },
            handlers: Vec::new(),
        })
    }

    pub fn handle(&self) -> MapHandle {
        MapHandle {
            map: self.map.clone(),
            alive: Rc::clone(&self.alive),
        }
    }

    /// Subscribes `handler` to the space-separated Leaflet `events`.
    pub fn on(&mut self, events: &str, handler: impl FnMut() + 'static) {
        let closure = Closure::<dyn FnMut()>::new(handler);
        self.map.on(events, closure.as_ref().unchecked_ref());
        self.handlers.push(closure);
    }

    fn live(&self) -> bool {
        self.alive.get()
    }

    fn insert(&mut self, layer: Layer) -> LayerId {
        self.next_id += 1;
        let id = LayerId(self.next_id);
        self.layers.insert(id, layer);
        id
    }

    /// A heat layer that is both known and currently drawn on a live map.
    fn drawn_heat(&self, id: LayerId) -> Option<&Layer> {
        if !self.live() {
            return None;
        }
        self.layers.get(&id).filter(|layer| {
            let owner = layer.owner();
            !owner.is_undefined() && !owner.is_null()
        })
    }
}

impl MapSurface for LeafletSurface {
    fn create_heat_layer(&mut self, points: &[HeatPoint], radius: u32, g: &Gradient) -> LayerId {
        let layer = heat_layer(
            &heat_points(points),
            &js(&json!({ "radius": radius, "gradient": gradient(g) })),
        );
        self.insert(layer)
    }

    fn create_cluster_layer(&mut self) -> LayerId {
        let layer = marker_cluster_group(&js(&json!({ "chunkedLoading": true })));
        self.insert(layer)
    }

    fn create_boundary_layer(&mut self, feature: &Feature, style: BoundaryStyle) -> LayerId {
        let data = serde_json::to_value(feature).unwrap_or(Value::Null);
        let options = match style {
            BoundaryStyle::Outline => json!({
                "style": {
                    "color": BOUNDARY_COLOR,
                    "weight": 4,
                    "fillColor": BOUNDARY_COLOR,
                    "fillOpacity": 0.04,
                }
            }),
            BoundaryStyle::Ghost => json!({
                "style": { "opacity": 0, "fillOpacity": 0 },
                "interactive": false,
            }),
        };
        let layer = geo_json(&js(&data), &js(&options));
        self.insert(layer)
    }

    fn create_circle(&mut self, center: LatLng, radius_m: f64) -> LayerId {
        let layer = circle(
            &lat_lng(center),
            &js(&json!({
                "radius": radius_m,
                "color": FILTER_CIRCLE_COLOR,
                "dashArray": FILTER_CIRCLE_DASH,
            })),
        );
        self.insert(layer)
    }

    fn discard(&mut self, id: LayerId) {
        if let Some(layer) = self.layers.remove(&id) {
            if self.live() {
                self.map.remove_layer(&layer);
            }
        }
    }

    fn attach(&mut self, id: LayerId) {
        if !self.live() {
            return;
        }
        if let Some(layer) = self.layers.get(&id) {
            if !self.map.has_layer(layer) {
                self.map.add_layer(layer);
            }
        }
    }

    fn detach(&mut self, id: LayerId) {
        if !self.live() {
            return;
        }
        if let Some(layer) = self.layers.get(&id) {
            if self.map.has_layer(layer) {
                self.map.remove_layer(layer);
            }
        }
    }

    fn has_layer(&self, id: LayerId) -> bool {
        self.live()
            && self
                .layers
                .get(&id)
                .is_some_and(|layer| self.map.has_layer(layer))
    }

    fn set_heat_radius(&mut self, id: LayerId, radius: u32) {
        if let Some(layer) = self.drawn_heat(id) {
            layer.set_options(&js(&json!({ "radius": radius })));
        }
    }

    fn set_heat_points(&mut self, id: LayerId, points: &[HeatPoint]) {
        if let Some(layer) = self.drawn_heat(id) {
            layer.set_lat_lngs(&heat_points(points));
        }
    }

    fn set_heat_gradient(&mut self, id: LayerId, g: &Gradient) {
        // Detached layers keep the new gradient in their options for the next draw.
        if let Some(layer) = self.layers.get(&id) {
            if self.live() {
                layer.set_options(&js(&json!({ "gradient": gradient(g) })));
            }
        }
    }

    fn set_heat_opacity(&mut self, opacity: f64) {
        if self.live() {
            dom::set_canvas_opacity(self.container_id, opacity);
        }
    }

    fn clear_markers(&mut self, cluster: LayerId) {
        if let Some(layer) = self.layers.get(&cluster) {
            layer.clear_layers();
        }
    }

    fn add_marker(&mut self, cluster: LayerId, icon: &MarkerIcon, spec: &MarkerSpec) {
        let Some(group) = self.layers.get(&cluster) else {
            return;
        };
        let (size, anchor) = (icon.size, icon.anchor());
        let icon = div_icon(&js(&json!({
            "html": icon.html,
            "className": icon.class_name,
            "iconSize": [size, size],
            "iconAnchor": [anchor, anchor],
        })));
        let options = js_sys::Object::new();
        if js_sys::Reflect::set(&options, &JsValue::from_str("icon"), &icon).is_err() {
            warn!("could not set marker icon");
        }
        let m = marker(&lat_lng(spec.position), &options);
        m.bind_popup(&spec.popup_html);
        group.add_child(&m);
    }

    fn view(&self) -> MapView {
        if !self.live() {
            return self.last_view;
        }
        let center = self.map.get_center();
        MapView {
            center: LatLng::new(center.lat(), center.lng()),
            zoom: self.map.get_zoom(),
        }
    }

    fn set_view(&mut self, view: MapView) {
        self.last_view = view;
        if self.live() {
            self.map
                .set_view(&lat_lng(view.center), view.zoom, &js(&json!({ "animate": false })));
        }
    }

    fn fit_within(&mut self, fit: LatLngBounds, max: LatLngBounds) {
        if !self.live() {
            return;
        }
        self.map.fit_bounds(&bounds(fit));
        self.map.set_max_bounds(&bounds(max));
        let min_zoom = self.map.get_bounds_zoom(&bounds(max), false);
        self.map.set_min_zoom(min_zoom);
        debug!(min_zoom, "fitted map bounds");
    }

    fn invalidate_size(&mut self) {
        if self.live() {
            self.map.invalidate_size();
        }
    }

    fn set_base_tiles(&mut self, tiles: BaseTiles) {
        if !self.live() || tiles == self.tiles {
            return;
        }
        let (from, to) = match tiles {
            BaseTiles::Gray => (&self.standard_tiles, &self.gray_tiles),
            BaseTiles::Standard => (&self.gray_tiles, &self.standard_tiles),
        };
        self.map.remove_layer(from);
        self.map.add_layer(to);
        self.tiles = tiles;
    }
}
