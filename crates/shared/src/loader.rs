use std::cell::RefCell;
use std::collections::HashMap;
use std::future::Future;
use std::rc::Rc;

use tracing::{debug, warn};

use crate::error::{MapError, Result};
use crate::models::{Feature, FeatureCollection, HeatPoint};

/// Raw HTTP response handed back by a [`Fetcher`].
#[derive(Debug, Clone, PartialEq)]
pub struct HttpResponse {
    pub status: u16,
    pub status_text: String,
    pub body: String,
}

impl HttpResponse {
    pub fn ok(body: impl Into<String>) -> Self {
        Self {
            status: 200,
            status_text: "OK".to_string(),
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Transport used to fetch data files. Transport failures surface as
/// [`MapError::Fetch`] with status 0.
pub trait Fetcher {
    fn get(&self, url: &str) -> impl Future<Output = Result<HttpResponse>>;
}

/// Loads GeoJSON collections, memoized per URL for the lifetime of the loader.
/// Only successful loads are cached.
pub struct GeoDataLoader<F> {
    fetcher: F,
    cache: RefCell<HashMap<String, Rc<FeatureCollection>>>,
}

impl<F: Fetcher> GeoDataLoader<F> {
    pub fn new(fetcher: F) -> Self {
        Self {
            fetcher,
            cache: RefCell::new(HashMap::new()),
        }
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    pub fn is_cached(&self, url: &str) -> bool {
        self.cache.borrow().contains_key(url)
    }

    pub async fn load(&self, url: &str) -> Result<Rc<FeatureCollection>> {
        let cached = self.cache.borrow().get(url).cloned();
        if let Some(hit) = cached {
            return Ok(hit);
        }

        let resp = self.fetcher.get(url).await?;
        if !resp.is_success() {
            warn!(url, status = resp.status, "data request failed");
            return Err(MapError::Fetch {
                url: url.to_string(),
                status: resp.status,
                status_text: resp.status_text,
            });
        }

        let collection: FeatureCollection =
            serde_json::from_str(&resp.body).map_err(|e| MapError::Parse {
                url: url.to_string(),
                message: e.to_string(),
            })?;
        debug!(url, features = collection.features.len(), "loaded feature collection");

        let collection = Rc::new(collection);
        self.cache
            .borrow_mut()
            .insert(url.to_string(), Rc::clone(&collection));
        Ok(collection)
    }
}

/// Heat samples for every feature with a usable point position.
pub fn to_heat_points(features: &[Feature], intensity: f64) -> Vec<HeatPoint> {
    features
        .iter()
        .filter_map(Feature::position)
        .map(|p| HeatPoint {
            lat: p.lat,
            lng: p.lng,
            intensity,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeFetcher;
    use futures::executor::block_on;

    const ONE_POINT: &str = r#"{"type":"FeatureCollection","features":[
        {"type":"Feature","geometry":{"type":"Point","coordinates":[-74.17,40.73]},"properties":{"name":"A"}}]}"#;

    #[test]
    fn test_load_caches_successful_result() {
        let fetcher = FakeFetcher::default().with("data/a.geojson", HttpResponse::ok(ONE_POINT));
        let loader = GeoDataLoader::new(fetcher);

        let first = block_on(loader.load("data/a.geojson")).unwrap();
        let second = block_on(loader.load("data/a.geojson")).unwrap();

        assert!(Rc::ptr_eq(&first, &second));
        assert_eq!(loader.fetcher().calls("data/a.geojson"), 1);
    }

    #[test]
    fn test_load_reports_http_status() {
        let loader = GeoDataLoader::new(FakeFetcher::default());
        let err = block_on(loader.load("data/missing.geojson")).unwrap_err();
        assert_eq!(
            err,
            MapError::Fetch {
                url: "data/missing.geojson".to_string(),
                status: 404,
                status_text: "Not Found".to_string(),
            }
        );
        assert!(!loader.is_cached("data/missing.geojson"));
    }

    #[test]
    fn test_failed_load_is_retried() {
        let loader = GeoDataLoader::new(FakeFetcher::default());
        let _ = block_on(loader.load("data/missing.geojson"));
        let _ = block_on(loader.load("data/missing.geojson"));
        assert_eq!(loader.fetcher().calls("data/missing.geojson"), 2);
    }

    #[test]
    fn test_load_rejects_invalid_json() {
        let fetcher = FakeFetcher::default().with("data/bad.geojson", HttpResponse::ok("{not json"));
        let loader = GeoDataLoader::new(fetcher);
        let err = block_on(loader.load("data/bad.geojson")).unwrap_err();
        assert!(matches!(err, MapError::Parse { .. }));
    }

    #[test]
    fn test_to_heat_points_swaps_axes() {
        let fc: FeatureCollection = serde_json::from_str(ONE_POINT).unwrap();
        let pts = to_heat_points(&fc.features, 1.0);
        assert_eq!(
            pts,
            vec![HeatPoint {
                lat: 40.73,
                lng: -74.17,
                intensity: 1.0
            }]
        );
    }

    #[test]
    fn test_to_heat_points_skips_unusable_features() {
        let mut features = vec![Feature::point(40.7, -74.1, &[])];
        features.push(Feature::default());
        let pts = to_heat_points(&features, 0.5);
        assert_eq!(pts.len(), 1);
        assert!((pts[0].intensity - 0.5).abs() < 1e-12);
    }
}
