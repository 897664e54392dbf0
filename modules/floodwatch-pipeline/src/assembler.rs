//! Consolidated report assembly and narrative.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tracing::{debug, warn};
use uuid::Uuid;

use ai_client::strip_code_blocks;
use floodwatch_common::{
    ConsolidatedReport, EvidenceResult, EvidenceSignals, GatekeeperVerdict, LocationClassification,
    NarrativeSource, PipelineStatus, Severity,
};

use crate::scoring::Assessment;
use crate::traits::NarrativeGenerator;

pub const REC_HIGH_RISK: &str = "High risk of flood predicted";
pub const REC_HIGH_CREDIBILITY: &str =
    "High credibility - consider immediate alert distribution";
pub const REC_EMERGENCY_PROTOCOLS: &str =
    "High severity detected - activate emergency protocols";
pub const REC_CONTACT_AUTHORITIES: &str = "Contact local authorities immediately";
pub const REC_SOCIAL_CONFIRMED: &str = "Multiple social media reports confirm the incident";
pub const REC_WARNINGS_ACTIVE: &str = "Official flood warnings are active for this area";
pub const REC_MONITOR_WEATHER: &str = "Monitor weather conditions for further developments";

const HIGH_CREDIBILITY: f64 = 0.7;
const SOCIAL_CONFIRMATION: u32 = 3;

/// Recommendations in fixed order. Pure.
pub fn recommendations(score: f64, severity: Severity, signals: &EvidenceSignals) -> Vec<String> {
    let mut out = Vec::new();
    if signals.high_risk() {
        out.push(REC_HIGH_RISK);
    }
    if score > HIGH_CREDIBILITY {
        out.push(REC_HIGH_CREDIBILITY);
    }
    if severity.is_high() {
        out.push(REC_EMERGENCY_PROTOCOLS);
        out.push(REC_CONTACT_AUTHORITIES);
    }
    if signals.social_count > SOCIAL_CONFIRMATION {
        out.push(REC_SOCIAL_CONFIRMED);
    }
    if signals.warning_match {
        out.push(REC_WARNINGS_ACTIVE);
    }
    if signals.weather_present {
        out.push(REC_MONITOR_WEATHER);
    }
    out.into_iter().map(String::from).collect()
}

pub struct AssemblyInput {
    pub verdict: GatekeeperVerdict,
    pub location: LocationClassification,
    pub evidence: Vec<EvidenceResult>,
    pub assessment: Assessment,
    pub archived_images: Vec<String>,
}

pub struct ReportAssembler {
    narrator: Arc<dyn NarrativeGenerator>,
    timeout: Duration,
}

impl ReportAssembler {
    pub fn new(narrator: Arc<dyn NarrativeGenerator>, timeout: Duration) -> Self {
        Self { narrator, timeout }
    }

    /// Build the report, then replace its summary with a generated narrative
    /// when the generator produces usable text within `timeout`.
    pub async fn assemble(&self, input: AssemblyInput) -> ConsolidatedReport {
        let AssemblyInput {
            verdict,
            location,
            evidence,
            assessment,
            archived_images,
        } = input;

        let mut report = ConsolidatedReport {
            report_id: Uuid::new_v4(),
            timestamp: Utc::now(),
            status: PipelineStatus::Completed,
            recommendations: recommendations(
                assessment.score,
                assessment.severity,
                &assessment.signals,
            ),
            summary: fallback_summary(&verdict, &location, assessment.severity),
            narrative_source: NarrativeSource::GatekeeperSummary,
            flood_detection: verdict,
            location_classification: location,
            evidence,
            credibility_score: assessment.score,
            severity_level: assessment.severity,
            archived_images,
        };

        if let Some(narrative) = self.narrate(&report).await {
            report.summary = narrative;
            report.narrative_source = NarrativeSource::Generated;
        }
        report
    }

    async fn narrate(&self, report: &ConsolidatedReport) -> Option<String> {
        let payload = match serde_json::to_value(report) {
            Ok(v) => v,
            Err(e) => {
                warn!(error = %e, "Failed to serialize report for narrative");
                return None;
            }
        };

        match tokio::time::timeout(self.timeout, self.narrator.summarize(&payload)).await {
            Ok(Ok(text)) => {
                let text = strip_code_blocks(&text);
                if text.is_empty() {
                    warn!(
                        report_id = %report.report_id,
                        "Narrative was empty, using gatekeeper summary"
                    );
                    None
                } else {
                    debug!(report_id = %report.report_id, "Narrative generated");
                    Some(text.to_string())
                }
            }
            Ok(Err(e)) => {
                warn!(
                    report_id = %report.report_id,
                    error = %e,
                    "Narrative generation failed, using gatekeeper summary"
                );
                None
            }
            Err(_) => {
                warn!(
                    report_id = %report.report_id,
                    timeout_ms = self.timeout.as_millis() as u64,
                    "Narrative generation timed out, using gatekeeper summary"
                );
                None
            }
        }
    }
}

/// Gatekeeper summary, or a one-liner when that is blank too.
fn fallback_summary(
    verdict: &GatekeeperVerdict,
    location: &LocationClassification,
    severity: Severity,
) -> String {
    let summary = verdict.summary.trim();
    if !summary.is_empty() {
        return summary.to_string();
    }
    let place = location
        .ordered_locations
        .most_specific()
        .or_else(|| verdict.location_text())
        .unwrap_or("an unspecified location");
    format!("Flood reported in {place} (severity: {severity}).")
}
