use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;

use datagov_client::FloodWarningStation;
use floodwatch_common::{EvidencePayload, EvidenceSource, LocationCandidateSet, WarningEvidence};

use super::EvidenceCollector;
use crate::traits::WarningSource;

/// Stations matching the first candidate that matches any, oldest update first.
pub fn match_stations(
    stations: &[FloodWarningStation],
    candidates: &LocationCandidateSet,
) -> Result<WarningEvidence> {
    let total_stations = stations.len();

    for candidate in candidates.iter() {
        let mut matched: Vec<&FloodWarningStation> =
            stations.iter().filter(|s| s.matches(candidate)).collect();
        if matched.is_empty() {
            continue;
        }
        // ISO-8601 timestamps order lexically; stations without one sort first.
        matched.sort_by(|a, b| a.water_level_update_datetime.cmp(&b.water_level_update_datetime));
        let matching_stations = matched
            .into_iter()
            .map(serde_json::to_value)
            .collect::<Result<Vec<_>, _>>()?;
        return Ok(WarningEvidence {
            location: Some(candidate.to_string()),
            matches_found: matching_stations.len(),
            matching_stations,
            total_stations,
        });
    }

    Ok(WarningEvidence {
        location: None,
        matching_stations: Vec::new(),
        total_stations,
        matches_found: 0,
    })
}

pub struct WarningCollector {
    source: Arc<dyn WarningSource>,
}

impl WarningCollector {
    pub fn new(source: Arc<dyn WarningSource>) -> Self {
        Self { source }
    }
}

#[async_trait]
impl EvidenceCollector for WarningCollector {
    fn source(&self) -> EvidenceSource {
        EvidenceSource::Warning
    }

    async fn collect(&self, candidates: &LocationCandidateSet) -> Result<EvidencePayload> {
        let stations = self.source.stations().await?;
        Ok(EvidencePayload::Warning(match_stations(&stations, candidates)?))
    }
}
