use anyhow::Result;
use async_trait::async_trait;

use datagov_client::{DataGovClient, FloodWarningStation, ForecastEntry};

use crate::traits::{WarningSource, WeatherSource};

#[async_trait]
impl WeatherSource for DataGovClient {
    async fn forecast(&self) -> Result<Vec<ForecastEntry>> {
        Ok(self.weather_forecast().await?)
    }
}

#[async_trait]
impl WarningSource for DataGovClient {
    async fn stations(&self) -> Result<Vec<FloodWarningStation>> {
        Ok(self.flood_warnings().await?)
    }
}
