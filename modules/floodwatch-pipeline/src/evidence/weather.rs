use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;

use datagov_client::ForecastEntry;
use floodwatch_common::{EvidencePayload, EvidenceSource, LocationCandidateSet, WeatherEvidence};

use super::EvidenceCollector;
use crate::traits::WeatherSource;

/// First candidate (most specific first) with any forecast entries wins.
/// Matched entries are returned oldest date first.
pub fn match_forecast(
    entries: &[ForecastEntry],
    candidates: &LocationCandidateSet,
) -> Result<WeatherEvidence> {
    for candidate in candidates.iter() {
        let mut matched: Vec<&ForecastEntry> =
            entries.iter().filter(|e| e.matches(candidate)).collect();
        if matched.is_empty() {
            continue;
        }
        matched.sort_by_key(|e| e.date);
        let entries = matched
            .into_iter()
            .map(serde_json::to_value)
            .collect::<Result<Vec<_>, _>>()?;
        return Ok(WeatherEvidence {
            matched_location: Some(candidate.to_string()),
            entries,
        });
    }

    Ok(WeatherEvidence {
        matched_location: None,
        entries: Vec::new(),
    })
}

pub struct WeatherCollector {
    source: Arc<dyn WeatherSource>,
}

impl WeatherCollector {
    pub fn new(source: Arc<dyn WeatherSource>) -> Self {
        Self { source }
    }
}

#[async_trait]
impl EvidenceCollector for WeatherCollector {
    fn source(&self) -> EvidenceSource {
        EvidenceSource::Weather
    }

    async fn collect(&self, candidates: &LocationCandidateSet) -> Result<EvidencePayload> {
        let forecast = self.source.forecast().await?;
        Ok(EvidencePayload::Weather(match_forecast(&forecast, candidates)?))
    }
}
