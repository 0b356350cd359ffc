use dioxus::logger::tracing::debug;
use foodmap_shared::config::SiteConfig;
use foodmap_shared::error::{MapError, Result};
use foodmap_shared::filter::{parse_geocode_response, Geocoder};
use foodmap_shared::kpi::KpiTable;
use foodmap_shared::loader::{Fetcher, HttpResponse};
use foodmap_shared::models::LatLng;

/// Site settings for this build. `FOODMAP_BASE_PATH` is read at compile time.
pub fn site_config() -> SiteConfig {
    SiteConfig::with_base_path(option_env!("FOODMAP_BASE_PATH"))
}

fn transport_error(url: &str, err: reqwest::Error) -> MapError {
    MapError::Fetch {
        url: url.to_string(),
        status: 0,
        status_text: err.to_string(),
    }
}

/// [`Fetcher`] over the browser's `fetch`.
#[derive(Clone, Default)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl Fetcher for HttpFetcher {
    async fn get(&self, url: &str) -> Result<HttpResponse> {
        let resp = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| transport_error(url, e))?;
        let status = resp.status();
        let body = resp.text().await.map_err(|e| transport_error(url, e))?;
        debug!(url, status = status.as_u16(), bytes = body.len(), "fetched");
        Ok(HttpResponse {
            status: status.as_u16(),
            status_text: status.canonical_reason().unwrap_or_default().to_string(),
            body,
        })
    }
}

/// Address lookup against a Nominatim search endpoint.
#[derive(Clone)]
pub struct NominatimGeocoder {
    client: reqwest::Client,
    endpoint: String,
}

impl NominatimGeocoder {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into(),
        }
    }
}

impl Geocoder for NominatimGeocoder {
    async fn geocode(&self, query: &str) -> Result<LatLng> {
        let resp = self
            .client
            .get(&self.endpoint)
            .query(&[("format", "json"), ("q", query)])
            .send()
            .await
            .map_err(|e| MapError::Geocode(e.to_string()))?;
        if !resp.status().is_success() {
            return Err(MapError::Geocode(format!(
                "Geocoding failed: {}",
                resp.status()
            )));
        }
        let body = resp
            .text()
            .await
            .map_err(|e| MapError::Geocode(e.to_string()))?;
        parse_geocode_response(&body)
    }
}

/// Loads and parses the supply chain sheet.
pub async fn fetch_kpi_table(config: &SiteConfig) -> Result<KpiTable> {
    let url = config.resolve(&config.kpi_data);
    let resp = HttpFetcher::default().get(&url).await?;
    if !resp.is_success() {
        return Err(MapError::Fetch {
            url,
            status: resp.status,
            status_text: resp.status_text,
        });
    }
    KpiTable::parse(&url, &resp.body)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_site_config_resolves_data_under_base_path() {
        let config = SiteConfig::with_base_path(Some("/food-map/"));
        assert_eq!(
            config.resolve(&config.produce_data),
            "/food-map/data/fixed_fresh_food.geojson"
        );
    }

    #[test]
    fn test_site_config_defaults_to_root() {
        let config = SiteConfig::with_base_path(None);
        assert_eq!(config.resolve(&config.kpi_data), "/data/Supply_Chain_KPI_Builder.csv");
        assert_eq!(config.geocoder_url, "https://nominatim.openstreetmap.org/search");
    }
}
