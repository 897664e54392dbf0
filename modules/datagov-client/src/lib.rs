pub mod error;
pub mod types;

pub use error::{DataGovError, Result};
pub use types::{ForecastEntry, ForecastLocation, FloodWarningStation, LocationCategory};

use serde::de::DeserializeOwned;

pub const DEFAULT_BASE_URL: &str = "https://api.data.gov.my";

/// Client for the open-data weather and flood warning endpoints.
///
/// Both endpoints return the full national dataset; matching against a
/// location is left to the caller.
#[derive(Clone)]
pub struct DataGovClient {
    client: reqwest::Client,
    base_url: String,
}

impl DataGovClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_http_client(reqwest::Client::new(), base_url)
    }

    pub fn with_http_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = format!("{}/{}", self.base_url, path);
        let resp = self.client.get(&url).send().await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(DataGovError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        let body = resp.text().await?;
        Ok(serde_json::from_str(&body)?)
    }

    /// Fetch the 7-day forecast for every published location.
    pub async fn weather_forecast(&self) -> Result<Vec<ForecastEntry>> {
        let entries: Vec<ForecastEntry> = self.get_json("weather/forecast").await?;
        tracing::debug!(count = entries.len(), "Fetched weather forecast entries");
        Ok(entries)
    }

    /// Fetch the current flood warning station records.
    pub async fn flood_warnings(&self) -> Result<Vec<FloodWarningStation>> {
        let stations: Vec<FloodWarningStation> = self.get_json("flood-warning").await?;
        tracing::debug!(count = stations.len(), "Fetched flood warning stations");
        Ok(stations)
    }
}
