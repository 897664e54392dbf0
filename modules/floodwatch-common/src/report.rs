use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::evidence::EvidenceResult;
use crate::severity::Severity;
use crate::types::{GatekeeperVerdict, LocationClassification};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStatus {
    Completed,
    Rejected,
    Incomplete,
}

/// Where the report narrative came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NarrativeSource {
    Generated,
    GatekeeperSummary,
}

/// The fused record for an accepted report. Built once by the assembler.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsolidatedReport {
    pub report_id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub status: PipelineStatus,
    pub flood_detection: GatekeeperVerdict,
    pub location_classification: LocationClassification,
    pub evidence: Vec<EvidenceResult>,
    pub credibility_score: f64,
    pub severity_level: Severity,
    pub recommendations: Vec<String>,
    pub summary: String,
    pub narrative_source: NarrativeSource,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub archived_images: Vec<String>,
}

impl ConsolidatedReport {
    /// Most specific resolved place, falling back to the post's own wording.
    pub fn headline_location(&self) -> &str {
        self.location_classification
            .ordered_locations
            .most_specific()
            .unwrap_or(self.flood_detection.location.as_str())
    }
}

/// Terminal result of one pipeline run.
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineOutcome {
    Rejected {
        reason: String,
        verdict: Option<GatekeeperVerdict>,
    },
    Incomplete {
        reason: String,
        verdict: GatekeeperVerdict,
        location: Option<LocationClassification>,
    },
    Completed(Box<ConsolidatedReport>),
}

impl PipelineOutcome {
    pub fn status(&self) -> PipelineStatus {
        match self {
            PipelineOutcome::Rejected { .. } => PipelineStatus::Rejected,
            PipelineOutcome::Incomplete { .. } => PipelineStatus::Incomplete,
            PipelineOutcome::Completed(_) => PipelineStatus::Completed,
        }
    }

    pub fn report(&self) -> Option<&ConsolidatedReport> {
        match self {
            PipelineOutcome::Completed(report) => Some(report),
            _ => None,
        }
    }

    pub fn into_response(self) -> PipelineResponse {
        PipelineResponse::from(self)
    }
}

/// Boundary response shape handed to callers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineResponse {
    pub status: PipelineStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub report_id: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flood_detection: Option<GatekeeperVerdict>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location_classification: Option<LocationClassification>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evidence: Option<Vec<EvidenceResult>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credibility_score: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub severity_level: Option<Severity>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recommendations: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
}

impl PipelineResponse {
    fn bare(status: PipelineStatus, reason: String) -> Self {
        Self {
            status,
            reason: Some(reason),
            report_id: None,
            timestamp: None,
            flood_detection: None,
            location_classification: None,
            evidence: None,
            credibility_score: None,
            severity_level: None,
            recommendations: None,
            summary: None,
        }
    }
}

impl From<PipelineOutcome> for PipelineResponse {
    fn from(outcome: PipelineOutcome) -> Self {
        match outcome {
            PipelineOutcome::Rejected { reason, verdict } => Self {
                flood_detection: verdict,
                ..Self::bare(PipelineStatus::Rejected, reason)
            },
            PipelineOutcome::Incomplete {
                reason,
                verdict,
                location,
            } => Self {
                flood_detection: Some(verdict),
                location_classification: location,
                ..Self::bare(PipelineStatus::Incomplete, reason)
            },
            PipelineOutcome::Completed(report) => {
                let report = *report;
                Self {
                    status: PipelineStatus::Completed,
                    reason: None,
                    report_id: Some(report.report_id),
                    timestamp: Some(report.timestamp),
                    flood_detection: Some(report.flood_detection),
                    location_classification: Some(report.location_classification),
                    evidence: Some(report.evidence),
                    credibility_score: Some(report.credibility_score),
                    severity_level: Some(report.severity_level),
                    recommendations: Some(report.recommendations),
                    summary: Some(report.summary),
                }
            }
        }
    }
}
