//! In-memory doubles for the map surface, HTTP transport and geocoder.

use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::error::{MapError, Result};
use crate::filter::Geocoder;
use crate::loader::{Fetcher, HttpResponse};
use crate::models::{Feature, FeatureCollection, Gradient, HeatPoint, LatLng, MarkerIcon};
use crate::spatial::LatLngBounds;
use crate::surface::{BaseTiles, BoundaryStyle, LayerId, MapSurface, MapView, MarkerSpec};

/// Two usable points a few kilometres apart plus one feature without geometry.
pub fn sample_features() -> Vec<Feature> {
    vec![
        Feature::point(40.73, -74.17, &[("name", "Broad St Market")]),
        Feature::point(40.75, -74.20, &[("name", "Park Ave Grocer")]),
        Feature::default(),
    ]
}

/// A rectangular stand-in for the city boundary around both sample points.
pub fn newark_square() -> FeatureCollection {
    let raw = r#"{"type":"FeatureCollection","features":[{"type":"Feature",
        "properties":{"NAME":"Newark"},
        "geometry":{"type":"Polygon","coordinates":[[[-74.25,40.67],[-74.11,40.67],[-74.11,40.79],[-74.25,40.79],[-74.25,40.67]]]}}]}"#;
    serde_json::from_str(raw).expect("valid boundary fixture")
}

#[derive(Debug, Clone, PartialEq)]
enum Layer {
    Heat {
        points: Vec<HeatPoint>,
        radius: u32,
        gradient: Gradient,
    },
    Cluster(Vec<MarkerSpec>),
    Boundary(BoundaryStyle),
    Circle(LatLng, f64),
}

/// Records what the controllers ask of the map.
#[derive(Debug)]
pub struct RecordingSurface {
    next_id: u32,
    layers: BTreeMap<LayerId, Layer>,
    attached: BTreeSet<LayerId>,
    view: MapView,
    pub tiles: BaseTiles,
    pub fitted: Option<(LatLngBounds, LatLngBounds)>,
    pub heat_opacity: Option<f64>,
    pub heat_redraws: usize,
}

impl Default for RecordingSurface {
    fn default() -> Self {
        Self {
            next_id: 0,
            layers: BTreeMap::new(),
            attached: BTreeSet::new(),
            view: MapView {
                center: LatLng::new(40.7357, -74.1724),
                zoom: 12.0,
            },
            tiles: BaseTiles::Standard,
            fitted: None,
            heat_opacity: None,
            heat_redraws: 0,
        }
    }
}

impl RecordingSurface {
    fn insert(&mut self, layer: Layer) -> LayerId {
        self.next_id += 1;
        let id = LayerId(self.next_id);
        self.layers.insert(id, layer);
        id
    }

    pub fn markers(&self, cluster: LayerId) -> &[MarkerSpec] {
        match self.layers.get(&cluster) {
            Some(Layer::Cluster(markers)) => markers,
            _ => &[],
        }
    }

    pub fn heat_radius(&self, layer: LayerId) -> Option<u32> {
        match self.layers.get(&layer)? {
            Layer::Heat { radius, .. } => Some(*radius),
            _ => None,
        }
    }

    pub fn heat_points(&self, layer: LayerId) -> Option<&[HeatPoint]> {
        match self.layers.get(&layer)? {
            Layer::Heat { points, .. } => Some(points),
            _ => None,
        }
    }

    pub fn heat_gradient(&self, layer: LayerId) -> Option<Gradient> {
        match self.layers.get(&layer)? {
            Layer::Heat { gradient, .. } => Some(*gradient),
            _ => None,
        }
    }

    pub fn circle(&self, layer: LayerId) -> Option<(LatLng, f64)> {
        match self.layers.get(&layer)? {
            Layer::Circle(center, radius) => Some((*center, *radius)),
            _ => None,
        }
    }

    pub fn circles_attached(&self) -> usize {
        self.attached
            .iter()
            .filter(|id| matches!(self.layers.get(id), Some(Layer::Circle(..))))
            .count()
    }
}

impl MapSurface for RecordingSurface {
    fn create_heat_layer(&mut self, points: &[HeatPoint], radius: u32, gradient: &Gradient) -> LayerId {
        self.insert(Layer::Heat {
            points: points.to_vec(),
            radius,
            gradient: *gradient,
        })
    }

    fn create_cluster_layer(&mut self) -> LayerId {
        self.insert(Layer::Cluster(Vec::new()))
    }

    fn create_boundary_layer(&mut self, _feature: &Feature, style: BoundaryStyle) -> LayerId {
        self.insert(Layer::Boundary(style))
    }

    fn create_circle(&mut self, center: LatLng, radius_m: f64) -> LayerId {
        self.insert(Layer::Circle(center, radius_m))
    }

    fn discard(&mut self, layer: LayerId) {
        self.attached.remove(&layer);
        self.layers.remove(&layer);
    }

    fn attach(&mut self, layer: LayerId) {
        if self.layers.contains_key(&layer) {
            self.attached.insert(layer);
        }
    }

    fn detach(&mut self, layer: LayerId) {
        self.attached.remove(&layer);
    }

    fn has_layer(&self, layer: LayerId) -> bool {
        self.attached.contains(&layer)
    }

    fn set_heat_radius(&mut self, layer: LayerId, new_radius: u32) {
        if let Some(Layer::Heat { radius, .. }) = self.layers.get_mut(&layer) {
            *radius = new_radius;
        }
    }

    fn set_heat_points(&mut self, layer: LayerId, new_points: &[HeatPoint]) {
        if let Some(Layer::Heat { points, .. }) = self.layers.get_mut(&layer) {
            *points = new_points.to_vec();
            self.heat_redraws += 1;
        }
    }

    fn set_heat_gradient(&mut self, layer: LayerId, new_gradient: &Gradient) {
        if let Some(Layer::Heat { gradient, .. }) = self.layers.get_mut(&layer) {
            *gradient = *new_gradient;
        }
    }

    fn set_heat_opacity(&mut self, opacity: f64) {
        self.heat_opacity = Some(opacity);
    }

    fn clear_markers(&mut self, cluster: LayerId) {
        if let Some(Layer::Cluster(markers)) = self.layers.get_mut(&cluster) {
            markers.clear();
        }
    }

    fn add_marker(&mut self, cluster: LayerId, _icon: &MarkerIcon, marker: &MarkerSpec) {
        if let Some(Layer::Cluster(markers)) = self.layers.get_mut(&cluster) {
            markers.push(marker.clone());
        }
    }

    fn view(&self) -> MapView {
        self.view
    }

    fn set_view(&mut self, view: MapView) {
        self.view = view;
    }

    fn fit_within(&mut self, fit: LatLngBounds, max: LatLngBounds) {
        self.view = MapView {
            center: fit.center(),
            zoom: self.view.zoom,
        };
        self.fitted = Some((fit, max));
    }

    fn invalidate_size(&mut self) {}

    fn set_base_tiles(&mut self, tiles: BaseTiles) {
        self.tiles = tiles;
    }
}

/// Serves canned responses; anything else is a 404.
#[derive(Debug, Default)]
pub struct FakeFetcher {
    responses: HashMap<String, HttpResponse>,
    calls: RefCell<HashMap<String, usize>>,
}

impl FakeFetcher {
    pub fn with(mut self, url: &str, response: HttpResponse) -> Self {
        self.responses.insert(url.to_string(), response);
        self
    }

    pub fn calls(&self, url: &str) -> usize {
        self.calls.borrow().get(url).copied().unwrap_or(0)
    }
}

impl Fetcher for FakeFetcher {
    async fn get(&self, url: &str) -> Result<HttpResponse> {
        *self.calls.borrow_mut().entry(url.to_string()).or_default() += 1;
        Ok(self.responses.get(url).cloned().unwrap_or_else(|| HttpResponse {
            status: 404,
            status_text: "Not Found".to_string(),
            body: String::new(),
        }))
    }
}

/// Answers every query with the same result.
#[derive(Debug)]
pub struct FakeGeocoder {
    answer: Result<LatLng>,
    queries: RefCell<Vec<String>>,
}

impl FakeGeocoder {
    pub fn found(position: LatLng) -> Self {
        Self {
            answer: Ok(position),
            queries: RefCell::default(),
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            answer: Err(MapError::Geocode(message.to_string())),
            queries: RefCell::default(),
        }
    }

    pub fn queries(&self) -> Vec<String> {
        self.queries.borrow().clone()
    }
}

impl Geocoder for FakeGeocoder {
    async fn geocode(&self, query: &str) -> Result<LatLng> {
        self.queries.borrow_mut().push(query.to_string());
        self.answer.clone()
    }
}
