use std::fmt;

use serde::{Deserialize, Serialize};

/// The four corroborating sources, in report order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvidenceSource {
    Social,
    Weather,
    Warning,
    RiskModel,
}

impl EvidenceSource {
    pub const ALL: [EvidenceSource; 4] = [
        EvidenceSource::Social,
        EvidenceSource::Weather,
        EvidenceSource::Warning,
        EvidenceSource::RiskModel,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EvidenceSource::Social => "social",
            EvidenceSource::Weather => "weather",
            EvidenceSource::Warning => "warning",
            EvidenceSource::RiskModel => "risk_model",
        }
    }
}

impl fmt::Display for EvidenceSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvidenceStatus {
    Success,
    Error,
    Skipped,
}

// --- Payloads ---

/// Social search volume for the candidate locations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SocialEvidence {
    pub query: String,
    pub result_count: u32,
    #[serde(default)]
    pub posts: Vec<serde_json::Value>,
}

/// Forecast entries for the first candidate that matched, oldest date first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherEvidence {
    pub matched_location: Option<String>,
    #[serde(default)]
    pub entries: Vec<serde_json::Value>,
}

impl WeatherEvidence {
    pub fn is_present(&self) -> bool {
        !self.entries.is_empty()
    }
}

/// Warning stations for the first candidate that matched any station.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WarningEvidence {
    pub location: Option<String>,
    #[serde(default)]
    pub matching_stations: Vec<serde_json::Value>,
    pub total_stations: usize,
    pub matches_found: usize,
}

impl WarningEvidence {
    pub fn has_match(&self) -> bool {
        self.matches_found > 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLabel {
    High,
    Low,
}

impl RiskLabel {
    pub fn display(&self) -> &'static str {
        match self {
            RiskLabel::High => "High Risk of Flood",
            RiskLabel::Low => "Low Risk of Flood",
        }
    }
}

/// Calibrated probability and its thresholded label.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RiskAssessment {
    pub probability: f64,
    pub label: RiskLabel,
}

impl RiskAssessment {
    pub const THRESHOLD: f64 = 0.5;

    /// Label is `High` iff probability is strictly above the threshold.
    pub fn from_probability(probability: f64) -> Self {
        let label = if probability > Self::THRESHOLD {
            RiskLabel::High
        } else {
            RiskLabel::Low
        };
        Self { probability, label }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EvidencePayload {
    Social(SocialEvidence),
    Weather(WeatherEvidence),
    Warning(WarningEvidence),
    RiskModel(RiskAssessment),
}

// --- Result ---

/// Outcome of one collector call. Always produced, whatever the source did.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvidenceResult {
    pub source: EvidenceSource,
    pub status: EvidenceStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<EvidencePayload>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub elapsed_ms: u64,
}

impl EvidenceResult {
    pub fn success(source: EvidenceSource, payload: EvidencePayload, elapsed_ms: u64) -> Self {
        Self {
            source,
            status: EvidenceStatus::Success,
            payload: Some(payload),
            error: None,
            elapsed_ms,
        }
    }

    pub fn error(source: EvidenceSource, error: impl Into<String>, elapsed_ms: u64) -> Self {
        Self {
            source,
            status: EvidenceStatus::Error,
            payload: None,
            error: Some(error.into()),
            elapsed_ms,
        }
    }

    pub fn skipped(source: EvidenceSource, reason: impl Into<String>) -> Self {
        Self {
            source,
            status: EvidenceStatus::Skipped,
            payload: None,
            error: Some(reason.into()),
            elapsed_ms: 0,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == EvidenceStatus::Success
    }

    // Typed views. Each returns `None` unless the call succeeded with the
    // matching payload, so scoring never reads a failed source.

    pub fn social(&self) -> Option<&SocialEvidence> {
        match (&self.status, &self.payload) {
            (EvidenceStatus::Success, Some(EvidencePayload::Social(s))) => Some(s),
            _ => None,
        }
    }

    pub fn weather(&self) -> Option<&WeatherEvidence> {
        match (&self.status, &self.payload) {
            (EvidenceStatus::Success, Some(EvidencePayload::Weather(w))) => Some(w),
            _ => None,
        }
    }

    pub fn warning(&self) -> Option<&WarningEvidence> {
        match (&self.status, &self.payload) {
            (EvidenceStatus::Success, Some(EvidencePayload::Warning(w))) => Some(w),
            _ => None,
        }
    }

    pub fn risk(&self) -> Option<&RiskAssessment> {
        match (&self.status, &self.payload) {
            (EvidenceStatus::Success, Some(EvidencePayload::RiskModel(r))) => Some(r),
            _ => None,
        }
    }
}

/// Signals extracted from a set of evidence results. Missing, skipped and
/// failed sources all read as "no signal".
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct EvidenceSignals {
    pub social_count: u32,
    pub weather_present: bool,
    pub warning_match: bool,
    pub risk: Option<RiskAssessment>,
}

impl EvidenceSignals {
    pub fn from_results(results: &[EvidenceResult]) -> Self {
        let mut signals = Self::default();
        for result in results {
            if let Some(social) = result.social() {
                signals.social_count = signals.social_count.max(social.result_count);
            }
            if let Some(weather) = result.weather() {
                signals.weather_present |= weather.is_present();
            }
            if let Some(warning) = result.warning() {
                signals.warning_match |= warning.has_match();
            }
            if let Some(risk) = result.risk() {
                signals.risk = Some(*risk);
            }
        }
        signals
    }

    pub fn high_risk(&self) -> bool {
        matches!(self.risk, Some(RiskAssessment { label: RiskLabel::High, .. }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn risk_threshold_is_strict() {
        assert_eq!(RiskAssessment::from_probability(0.5).label, RiskLabel::Low);
        assert_eq!(RiskAssessment::from_probability(0.51).label, RiskLabel::High);
    }

    #[test]
    fn error_results_contribute_no_signal() {
        let results = vec![
            EvidenceResult::error(EvidenceSource::Social, "timeout", 10),
            EvidenceResult::skipped(EvidenceSource::RiskModel, "not configured"),
            EvidenceResult::success(
                EvidenceSource::Warning,
                EvidencePayload::Warning(WarningEvidence {
                    location: Some("Klang".into()),
                    matching_stations: vec![serde_json::json!({"station_id": "1"})],
                    total_stations: 40,
                    matches_found: 1,
                }),
                5,
            ),
        ];
        let signals = EvidenceSignals::from_results(&results);
        assert_eq!(signals.social_count, 0);
        assert!(signals.warning_match);
        assert!(!signals.weather_present);
        assert!(signals.risk.is_none());
    }

    #[test]
    fn payload_serializes_with_kind_tag() {
        let result = EvidenceResult::success(
            EvidenceSource::RiskModel,
            EvidencePayload::RiskModel(RiskAssessment::from_probability(0.8)),
            3,
        );
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["source"], "risk_model");
        assert_eq!(json["status"], "success");
        assert_eq!(json["payload"]["kind"], "risk_model");
        assert_eq!(json["payload"]["label"], "high");
        assert!(json.get("error").is_none());
    }
}
