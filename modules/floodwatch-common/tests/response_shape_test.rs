//! Boundary response shape as seen by callers of the pipeline.

use chrono::Utc;
use serde_json::json;
use uuid::Uuid;

use floodwatch_common::{
    ConsolidatedReport, EvidencePayload, EvidenceResult, EvidenceSource, GatekeeperVerdict,
    LocationClassification, LocationFields, NarrativeSource, PipelineOutcome, PipelineResponse,
    PipelineStatus, ResolutionSource, RiskAssessment, Severity,
};

fn verdict(is_flood: bool) -> GatekeeperVerdict {
    GatekeeperVerdict {
        is_flood,
        location: "Klang".into(),
        severity: Severity::Moderate,
        summary: "Flash flood reported in Klang".into(),
    }
}

fn classification() -> LocationClassification {
    let fields = LocationFields {
        town: Some("Klang".into()),
        recreation_centre: Some("None".into()),
        district: Some("Klang".into()),
        division: None,
        state: Some("Selangor".into()),
    };
    LocationClassification {
        ordered_locations: fields.ordered_candidates(),
        fields,
        resolved_by: ResolutionSource::KnowledgeBase,
    }
}

#[test]
fn rejected_response_carries_only_status_and_reason() {
    let response = PipelineOutcome::Rejected {
        reason: "Not identified as flood by MLLM".into(),
        verdict: None,
    }
    .into_response();

    let json = serde_json::to_value(&response).unwrap();
    assert_eq!(
        json,
        json!({"status": "rejected", "reason": "Not identified as flood by MLLM"})
    );
}

#[test]
fn incomplete_response_keeps_the_verdict() {
    let response = PipelineOutcome::Incomplete {
        reason: "No location identified".into(),
        verdict: verdict(true),
        location: None,
    }
    .into_response();

    assert_eq!(response.status, PipelineStatus::Incomplete);
    assert!(response.flood_detection.is_some());
    assert!(response.credibility_score.is_none());

    let json = serde_json::to_value(&response).unwrap();
    assert_eq!(json["flood_detection"]["severity"], "moderate");
    assert!(json.get("evidence").is_none());
}

#[test]
fn completed_response_round_trips_through_json() {
    let report = ConsolidatedReport {
        report_id: Uuid::new_v4(),
        timestamp: Utc::now(),
        status: PipelineStatus::Completed,
        flood_detection: verdict(true),
        location_classification: classification(),
        evidence: vec![
            EvidenceResult::success(
                EvidenceSource::RiskModel,
                EvidencePayload::RiskModel(RiskAssessment::from_probability(0.8)),
                12,
            ),
            EvidenceResult::error(EvidenceSource::Social, "status 429", 40),
        ],
        credibility_score: 0.4,
        severity_level: Severity::Severe,
        recommendations: vec!["High risk of flood predicted".into()],
        summary: "Flooding in Klang".into(),
        narrative_source: NarrativeSource::Generated,
        archived_images: vec![],
    };

    let response = PipelineOutcome::Completed(Box::new(report.clone())).into_response();
    let json = serde_json::to_string(&response).unwrap();
    let back: PipelineResponse = serde_json::from_str(&json).unwrap();

    assert_eq!(back, response);
    assert_eq!(back.report_id, Some(report.report_id));
    assert_eq!(back.severity_level, Some(Severity::Severe));

    let location = back.location_classification.unwrap();
    assert_eq!(location.ordered_locations.as_slice(), &["Klang", "Selangor"]);
    assert_eq!(location.fields.state.as_deref(), Some("Selangor"));
}

#[test]
fn location_fields_are_flattened_into_classification() {
    let json = serde_json::to_value(classification()).unwrap();
    assert_eq!(json["town"], "Klang");
    assert_eq!(json["ordered_locations"], json!(["Klang", "Selangor"]));
    assert_eq!(json["resolved_by"], "knowledge_base");
}
