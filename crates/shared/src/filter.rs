use std::cell::RefCell;
use std::future::Future;

use serde::Deserialize;
use tracing::{debug, info};

use crate::cluster;
use crate::controller::MapController;
use crate::error::{MapError, Result};
use crate::loader::to_heat_points;
use crate::models::{Category, Feature, LatLng};
use crate::popup::popup_html;
use crate::spatial::{distance, within_radius, BoundaryShape};
use crate::state::ActiveFilter;
use crate::surface::{MapSurface, MapView};

/// Zoom level used when centering on a filter.
pub const FILTER_ZOOM: f64 = 14.0;

pub const MSG_NEED_CENTER: &str = "Enter an address or latitude/longitude.";
pub const MSG_NEED_ADDRESS: &str = "Enter an address.";
pub const MSG_NOT_FOUND: &str = "Address not found.";
pub const MSG_BAD_COORDINATES: &str = "Invalid latitude/longitude.";

/// Where a filter should be centered, as typed by the user.
#[derive(Debug, Clone, PartialEq)]
pub enum CenterInput {
    Coordinates(LatLng),
    Address(String),
}

impl CenterInput {
    /// Reads the main filter form. Typed coordinates win over an address.
    pub fn from_form(lat: &str, lng: &str, address: &str) -> Result<Self> {
        let (lat, lng, address) = (lat.trim(), lng.trim(), address.trim());
        if !lat.is_empty() && !lng.is_empty() {
            let pos = match (lat.parse::<f64>(), lng.parse::<f64>()) {
                (Ok(lat), Ok(lng)) => LatLng::new(lat, lng),
                _ => return Err(MapError::InvalidInput(MSG_BAD_COORDINATES.to_string())),
            };
            if !pos.is_finite() {
                return Err(MapError::InvalidInput(MSG_BAD_COORDINATES.to_string()));
            }
            return Ok(CenterInput::Coordinates(pos));
        }
        if !address.is_empty() {
            return Ok(CenterInput::Address(address.to_string()));
        }
        Err(MapError::InvalidInput(MSG_NEED_CENTER.to_string()))
    }

    /// Reads the quick filter form, which only takes an address.
    pub fn from_address(address: &str) -> Result<Self> {
        let address = address.trim();
        if address.is_empty() {
            return Err(MapError::InvalidInput(MSG_NEED_ADDRESS.to_string()));
        }
        Ok(CenterInput::Address(address.to_string()))
    }
}

/// Radius field in kilometres. Empty means zero; anything unparsable is NaN,
/// which makes the filter a no-op.
pub fn parse_radius_km(raw: &str) -> f64 {
    let raw = raw.trim();
    if raw.is_empty() {
        return 0.0;
    }
    raw.parse::<f64>().unwrap_or(f64::NAN)
}

/// Free-text address lookup.
pub trait Geocoder {
    fn geocode(&self, query: &str) -> impl Future<Output = Result<LatLng>>;
}

#[derive(Debug, Deserialize)]
struct Candidate {
    lat: String,
    lon: String,
}

/// Reads a Nominatim search response and returns the first candidate.
pub fn parse_geocode_response(body: &str) -> Result<LatLng> {
    let candidates: Vec<Candidate> = serde_json::from_str(body)
        .map_err(|_| MapError::Geocode(MSG_NOT_FOUND.to_string()))?;
    let first = candidates
        .first()
        .ok_or_else(|| MapError::Geocode(MSG_NOT_FOUND.to_string()))?;
    match (first.lat.trim().parse::<f64>(), first.lon.trim().parse::<f64>()) {
        (Ok(lat), Ok(lng)) => Ok(LatLng::new(lat, lng)),
        _ => Err(MapError::Geocode(MSG_NOT_FOUND.to_string())),
    }
}

pub async fn resolve_center<G: Geocoder>(geocoder: &G, input: CenterInput) -> Result<LatLng> {
    match input {
        CenterInput::Coordinates(pos) => Ok(pos),
        CenterInput::Address(query) => geocoder.geocode(&query).await,
    }
}

/// Inside the radius (inclusive) and inside the boundary, if one is loaded.
pub fn matches_filter(
    feature: &Feature,
    center: LatLng,
    radius_km: f64,
    boundary: Option<&BoundaryShape>,
) -> bool {
    let Some(pos) = feature.position() else {
        return false;
    };
    within_radius(distance(center, pos), radius_km) && boundary.is_none_or(|b| b.contains(pos))
}

/// Identifies one filter request. Only the most recent ticket may apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilterTicket(u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilterSummary {
    pub produce: usize,
    pub fast_food: usize,
}

impl<S: MapSurface> MapController<S> {
    /// Starts a filter request, invalidating any request still in flight.
    pub fn begin_filter(&mut self) -> FilterTicket {
        self.state.filter_seq += 1;
        FilterTicket(self.state.filter_seq)
    }

    pub fn is_current(&self, ticket: FilterTicket) -> bool {
        ticket.0 == self.state.filter_seq
    }

    /// Centers the view and filters, unless a newer request has started.
    pub fn apply_filter_request(
        &mut self,
        ticket: FilterTicket,
        center: LatLng,
        radius_km: f64,
    ) -> Option<FilterSummary> {
        if !self.is_current(ticket) {
            debug!(ticket = ticket.0, latest = self.state.filter_seq, "discarding stale filter");
            return None;
        }
        self.surface.set_view(MapView {
            center,
            zoom: FILTER_ZOOM,
        });
        self.apply_filter(Some(center), radius_km)
    }

    /// Replaces the radius circle and rebuilds both categories from their
    /// unfiltered features. No-op without a center or with a NaN radius.
    pub fn apply_filter(&mut self, center: Option<LatLng>, radius_km: f64) -> Option<FilterSummary> {
        let center = center?;
        if radius_km.is_nan() {
            return None;
        }

        if let Some(old) = self.state.filter.circle.take() {
            self.surface.discard(old);
        }
        let circle = self.surface.create_circle(center, radius_km * 1000.0);
        self.surface.attach(circle);
        self.state.filter = ActiveFilter {
            center: Some(center),
            radius_km,
            circle: Some(circle),
        };

        let boundary = self.state.boundary.as_ref().map(|b| &b.shape);
        let kept: Vec<(Category, Vec<Feature>)> = Category::ALL
            .iter()
            .map(|&category| {
                let features = self
                    .state
                    .layer(category)
                    .raw_features
                    .iter()
                    .filter(|f| matches_filter(f, center, radius_km, boundary))
                    .cloned()
                    .collect();
                (category, features)
            })
            .collect();

        let intensity = self.state.heat.intensity;
        for (category, features) in kept {
            let layer = self.state.layer_mut(category);
            if let Some(cluster) = layer.cluster_layer {
                let icon = layer.icon;
                cluster::populate(&mut self.surface, cluster, &features, &icon, |f| {
                    popup_html(category, f)
                });
            }
            layer.heat_points = to_heat_points(&features, intensity);
            layer.shown_features = features;
        }

        let summary = FilterSummary {
            produce: self.state.produce.shown_features.len(),
            fast_food: self.state.fast_food.shown_features.len(),
        };
        info!(%center, radius_km, produce = summary.produce, fast_food = summary.fast_food, "filter applied");

        self.refresh_heatmap();
        self.refresh_view();
        Some(summary)
    }
}

/// Resolves the center and applies the filter. The controller is never
/// borrowed across the geocoding await, and a request overtaken by a newer
/// one is dropped.
pub async fn run_filter<S, G>(
    controller: &RefCell<MapController<S>>,
    geocoder: &G,
    input: CenterInput,
    radius_km: f64,
) -> Result<Option<FilterSummary>>
where
    S: MapSurface,
    G: Geocoder,
{
    let ticket = controller.borrow_mut().begin_filter();
    let center = resolve_center(geocoder, input).await?;
    Ok(controller
        .borrow_mut()
        .apply_filter_request(ticket, center, radius_km))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::HeatSettings;
    use crate::testing::{newark_square, sample_features, FakeGeocoder, RecordingSurface};
    use futures::executor::block_on;

    fn loaded(with_boundary: bool) -> MapController<RecordingSurface> {
        let mut c = MapController::new(RecordingSurface::default(), HeatSettings::default());
        c.install_category(Category::Produce, sample_features());
        c.install_category(Category::FastFood, sample_features());
        if with_boundary {
            c.install_boundary(&newark_square());
        }
        c.refresh_view();
        c
    }

    #[test]
    fn test_from_form_prefers_coordinates() {
        let input = CenterInput::from_form("40.7", "-74.2", "1 Broad St").unwrap();
        assert_eq!(input, CenterInput::Coordinates(LatLng::new(40.7, -74.2)));
        let input = CenterInput::from_form("40.7", "", "1 Broad St").unwrap();
        assert_eq!(input, CenterInput::Address("1 Broad St".to_string()));
    }

    #[test]
    fn test_from_form_requires_something() {
        let err = CenterInput::from_form("", "", "  ").unwrap_err();
        assert_eq!(err.to_string(), MSG_NEED_CENTER);
        let err = CenterInput::from_address("").unwrap_err();
        assert_eq!(err.to_string(), MSG_NEED_ADDRESS);
        assert!(CenterInput::from_form("north", "-74", "").is_err());
    }

    #[test]
    fn test_parse_radius_km() {
        assert_eq!(parse_radius_km(""), 0.0);
        assert_eq!(parse_radius_km("2.5"), 2.5);
        assert!(parse_radius_km("far").is_nan());
    }

    #[test]
    fn test_parse_geocode_response() {
        let pos = parse_geocode_response(r#"[{"lat":"40.7357","lon":"-74.1724","display_name":"Newark"}]"#).unwrap();
        assert_eq!(pos, LatLng::new(40.7357, -74.1724));
        let err = parse_geocode_response("[]").unwrap_err();
        assert_eq!(err, MapError::Geocode(MSG_NOT_FOUND.to_string()));
    }

    #[test]
    fn test_matches_filter_without_boundary_is_radius_only() {
        let f = Feature::point(40.90, -74.17, &[]);
        let center = LatLng::new(40.90, -74.17);
        assert!(matches_filter(&f, center, 0.0, None));
        assert!(!matches_filter(&Feature::default(), center, 100.0, None));
    }

    #[test]
    fn test_matches_filter_respects_boundary() {
        let fc = newark_square();
        let shape = BoundaryShape::from_feature(&fc.features[0]).unwrap();
        let outside = Feature::point(40.90, -74.17, &[]);
        let center = LatLng::new(40.90, -74.17);
        assert!(!matches_filter(&outside, center, 50.0, Some(&shape)));
        let inside = Feature::point(40.73, -74.17, &[]);
        assert!(matches_filter(&inside, center, 50.0, Some(&shape)));
    }

    /// A point east of `center` whose distance survives the km conversion
    /// exactly, so the radius can sit on it with no rounding slack.
    fn exact_edge(center: LatLng) -> (LatLng, f64) {
        (1..200)
            .map(|k| LatLng::new(center.lat, center.lng + k as f64 * 0.0001))
            .map(|p| (p, distance(center, p)))
            .find(|&(_, d)| (d / 1000.0) * 1000.0 == d)
            .expect("some offset round-trips through km")
    }

    #[test]
    fn test_filter_radius_edge_is_inclusive() {
        let center = LatLng::new(40.73, -74.17);
        let (edge, d) = exact_edge(center);
        let radius_km = d / 1000.0;
        assert_eq!(radius_km * 1000.0, d);

        let fc = newark_square();
        let shape = BoundaryShape::from_feature(&fc.features[0]).unwrap();
        let feature = Feature::point(edge.lat, edge.lng, &[("name", "Edge Grocer")]);
        assert!(matches_filter(&feature, center, radius_km, None));
        assert!(matches_filter(&feature, center, radius_km, Some(&shape)));
        assert!(!matches_filter(&feature, center, radius_km * (1.0 - 1e-9), Some(&shape)));

        let mut c = MapController::new(RecordingSurface::default(), HeatSettings::default());
        c.install_category(Category::Produce, vec![feature]);
        c.install_boundary(&fc);
        c.refresh_view();
        let summary = c.apply_filter(Some(center), radius_km).unwrap();
        assert_eq!(summary, FilterSummary { produce: 1, fast_food: 0 });
        let summary = c.apply_filter(Some(center), radius_km * (1.0 - 1e-9)).unwrap();
        assert_eq!(summary.produce, 0);
    }

    #[test]
    fn test_apply_filter_keeps_nearby_features() {
        let mut c = loaded(true);
        let center = LatLng::new(40.73, -74.17);
        let summary = c.apply_filter(Some(center), 0.5).unwrap();

        assert_eq!(summary, FilterSummary { produce: 1, fast_food: 1 });
        let produce = &c.state().produce;
        assert_eq!(produce.raw_features.len(), 3);
        assert_eq!(produce.heat_points.len(), 1);
        assert_eq!(c.surface().markers(produce.cluster_layer.unwrap()).len(), 1);

        let circle = c.state().filter.circle.unwrap();
        assert!(c.surface().has_layer(circle));
        assert_eq!(c.surface().circle(circle), Some((center, 500.0)));
    }

    #[test]
    fn test_apply_filter_replaces_circle_and_starts_from_raw() {
        let mut c = loaded(false);
        let center = LatLng::new(40.73, -74.17);
        c.apply_filter(Some(center), 0.5);
        let first = c.state().filter.circle.unwrap();
        let summary = c.apply_filter(Some(center), 50.0).unwrap();

        assert_eq!(summary.produce, 2);
        assert!(!c.surface().has_layer(first));
        assert_eq!(c.surface().circles_attached(), 1);
    }

    #[test]
    fn test_apply_filter_noops() {
        let mut c = loaded(false);
        assert!(c.apply_filter(None, 1.0).is_none());
        assert!(c.apply_filter(Some(LatLng::new(40.7, -74.1)), f64::NAN).is_none());
        assert!(c.state().filter.circle.is_none());
        assert_eq!(c.state().produce.shown_features.len(), 3);
    }

    #[test]
    fn test_filter_in_cluster_mode_keeps_clusters() {
        let mut c = loaded(false);
        c.toggle_mode();
        c.apply_filter(Some(LatLng::new(40.73, -74.17)), 0.5);
        let produce = &c.state().produce;
        assert!(c.surface().has_layer(produce.cluster_layer.unwrap()));
        assert!(!c.surface().has_layer(produce.heat_layer.unwrap()));
    }

    #[test]
    fn test_request_centers_view() {
        let mut c = loaded(false);
        let ticket = c.begin_filter();
        let center = LatLng::new(40.74, -74.18);
        c.apply_filter_request(ticket, center, 1.0).unwrap();
        assert_eq!(c.surface().view(), MapView { center, zoom: FILTER_ZOOM });
    }

    #[test]
    fn test_stale_ticket_is_discarded() {
        let mut c = loaded(false);
        let older = c.begin_filter();
        let newer = c.begin_filter();
        assert!(c.apply_filter_request(older, LatLng::new(40.73, -74.17), 0.5).is_none());
        assert!(c.state().filter.center.is_none());
        assert!(c.apply_filter_request(newer, LatLng::new(40.73, -74.17), 0.5).is_some());
    }

    #[test]
    fn test_geocode_without_results_leaves_markers_alone() {
        let controller = RefCell::new(loaded(false));
        let cluster = controller.borrow().state().produce.cluster_layer.unwrap();
        let before = controller.borrow().surface().markers(cluster).to_vec();
        let geocoder = FakeGeocoder::failing(MSG_NOT_FOUND);

        let result = block_on(run_filter(
            &controller,
            &geocoder,
            CenterInput::Address("nowhere".to_string()),
            1.0,
        ));

        assert_eq!(result, Err(MapError::Geocode(MSG_NOT_FOUND.to_string())));
        let c = controller.borrow();
        assert!(c.state().filter.center.is_none());
        assert_eq!(c.surface().markers(cluster), before.as_slice());
    }

    #[test]
    fn test_run_filter_with_address() {
        let controller = RefCell::new(loaded(false));
        let geocoder = FakeGeocoder::found(LatLng::new(40.73, -74.17));

        let summary = block_on(run_filter(
            &controller,
            &geocoder,
            CenterInput::Address("Broad St".to_string()),
            0.5,
        ))
        .unwrap()
        .unwrap();

        assert_eq!(summary.produce, 1);
        assert_eq!(geocoder.queries(), vec!["Broad St".to_string()]);
    }
}
