use serde::{Deserialize, Serialize};

use crate::models::{DEFAULT_HEAT_INTENSITY, DEFAULT_HEAT_RADIUS};

pub const PRODUCE_DATA: &str = "data/fixed_fresh_food.geojson";
pub const FAST_FOOD_DATA: &str = "data/fast_food.geojson";
pub const BOUNDARY_DATA: &str = "data/newark_boundary_corrected.geojson";
pub const KPI_DATA: &str = "data/Supply_Chain_KPI_Builder.csv";
pub const NOMINATIM_SEARCH: &str = "https://nominatim.openstreetmap.org/search";

/// Site-wide settings. The base path is baked in at build time from
/// `FOODMAP_BASE_PATH` so the site can be served from a sub-path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SiteConfig {
    pub base_path: String,
    pub produce_data: String,
    pub fast_food_data: String,
    pub boundary_data: String,
    pub kpi_data: String,
    pub geocoder_url: String,
    pub heat_radius: u32,
    pub heat_intensity: f64,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            base_path: "/".to_string(),
            produce_data: PRODUCE_DATA.to_string(),
            fast_food_data: FAST_FOOD_DATA.to_string(),
            boundary_data: BOUNDARY_DATA.to_string(),
            kpi_data: KPI_DATA.to_string(),
            geocoder_url: NOMINATIM_SEARCH.to_string(),
            heat_radius: DEFAULT_HEAT_RADIUS,
            heat_intensity: DEFAULT_HEAT_INTENSITY,
        }
    }
}

impl SiteConfig {
    pub fn with_base_path(base_path: Option<&str>) -> Self {
        Self {
            base_path: base_path
                .filter(|p| !p.trim().is_empty())
                .unwrap_or("/")
                .to_string(),
            ..Self::default()
        }
    }

    /// Resolves a site-relative path against the base path.
    pub fn resolve(&self, path: &str) -> String {
        join_base_path(&self.base_path, path)
    }
}

fn is_absolute_url(path: &str) -> bool {
    if path.starts_with("//") {
        return true;
    }
    match path.split_once("://") {
        Some((scheme, _)) => !scheme.is_empty() && scheme.chars().all(|c| c.is_ascii_alphabetic()),
        None => false,
    }
}

/// Joins `path` onto `base` with exactly one slash between them.
/// Absolute URLs pass through untouched.
pub fn join_base_path(base: &str, path: &str) -> String {
    let base = if base.is_empty() { "/" } else { base };
    if path.is_empty() {
        return base.to_string();
    }
    if is_absolute_url(path) {
        return path.to_string();
    }
    let base = if base.ends_with('/') {
        base.to_string()
    } else {
        format!("{base}/")
    };
    format!("{base}{}", path.trim_start_matches('/'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_inserts_single_slash() {
        assert_eq!(join_base_path("/foodmap", "data/x.geojson"), "/foodmap/data/x.geojson");
        assert_eq!(join_base_path("/foodmap/", "/data/x.geojson"), "/foodmap/data/x.geojson");
        assert_eq!(join_base_path("/", "data/x.geojson"), "/data/x.geojson");
    }

    #[test]
    fn test_join_keeps_absolute_urls() {
        assert_eq!(join_base_path("/foodmap", "https://a.b/c"), "https://a.b/c");
        assert_eq!(join_base_path("/foodmap", "//cdn.x/y.js"), "//cdn.x/y.js");
    }

    #[test]
    fn test_join_empty_path_returns_base() {
        assert_eq!(join_base_path("/foodmap", ""), "/foodmap");
        assert_eq!(join_base_path("", ""), "/");
    }

    #[test]
    fn test_blank_base_path_falls_back_to_root() {
        let cfg = SiteConfig::with_base_path(Some("  "));
        assert_eq!(cfg.base_path, "/");
        assert_eq!(cfg.resolve(PRODUCE_DATA), "/data/fixed_fresh_food.geojson");
    }

    #[test]
    fn test_config_deserializes_partial_json() {
        let cfg: SiteConfig = serde_json::from_str(r#"{"basePath":"/site","heatRadius":40}"#).unwrap();
        assert_eq!(cfg.base_path, "/site");
        assert_eq!(cfg.heat_radius, 40);
        assert_eq!(cfg.fast_food_data, FAST_FOOD_DATA);
    }
}
