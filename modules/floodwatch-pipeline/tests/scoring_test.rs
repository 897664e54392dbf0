//! Exhaustive checks over every signal combination and rule order.

use floodwatch_common::{
    EscalationRule, EvidencePayload, EvidenceResult, EvidenceSignals, EvidenceSource,
    GatekeeperVerdict, LocationCandidateSet, RiskAssessment, Severity, SocialEvidence,
    WarningEvidence, WeatherEvidence,
};
use floodwatch_pipeline::assembler::recommendations;
use floodwatch_pipeline::scoring::{EscalationPolicy, ScoreWeights, ScoringEngine, ScoringInput};

const LEVELS: [Severity; 5] = [
    Severity::Unknown,
    Severity::Minor,
    Severity::Moderate,
    Severity::Severe,
    Severity::Critical,
];

fn all_orders() -> Vec<Vec<EscalationRule>> {
    use EscalationRule::*;
    vec![
        vec![Social, Warning, RiskModel],
        vec![Social, RiskModel, Warning],
        vec![Warning, Social, RiskModel],
        vec![Warning, RiskModel, Social],
        vec![RiskModel, Social, Warning],
        vec![RiskModel, Warning, Social],
    ]
}

fn all_signals() -> Vec<EvidenceSignals> {
    let mut out = Vec::new();
    for social_count in [0, 3, 6, 40] {
        for weather_present in [false, true] {
            for warning_match in [false, true] {
                for risk in [None, Some(0.2), Some(0.5), Some(0.51), Some(1.0)] {
                    out.push(EvidenceSignals {
                        social_count,
                        weather_present,
                        warning_match,
                        risk: risk.map(RiskAssessment::from_probability),
                    });
                }
            }
        }
    }
    out
}

fn verdict(is_flood: bool, severity: Severity) -> GatekeeperVerdict {
    GatekeeperVerdict {
        is_flood,
        location: "Klang".into(),
        severity,
        summary: "Flood".into(),
    }
}

/// Evidence results that produce exactly `signals`.
fn results_for(signals: &EvidenceSignals) -> Vec<EvidenceResult> {
    let mut results = vec![
        EvidenceResult::success(
            EvidenceSource::Social,
            EvidencePayload::Social(SocialEvidence {
                query: "q".into(),
                result_count: signals.social_count,
                posts: Vec::new(),
            }),
            1,
        ),
        EvidenceResult::success(
            EvidenceSource::Weather,
            EvidencePayload::Weather(WeatherEvidence {
                matched_location: None,
                entries: if signals.weather_present {
                    vec![serde_json::json!({"date": "2025-01-03"})]
                } else {
                    Vec::new()
                },
            }),
            1,
        ),
        EvidenceResult::success(
            EvidenceSource::Warning,
            EvidencePayload::Warning(WarningEvidence {
                location: None,
                matching_stations: Vec::new(),
                total_stations: 10,
                matches_found: usize::from(signals.warning_match),
            }),
            1,
        ),
    ];
    results.push(match signals.risk {
        Some(risk) => EvidenceResult::success(
            EvidenceSource::RiskModel,
            EvidencePayload::RiskModel(risk),
            1,
        ),
        None => EvidenceResult::error(EvidenceSource::RiskModel, "endpoint unavailable", 1),
    });
    results
}

#[test]
fn score_is_bounded_for_every_combination() {
    let engine = ScoringEngine::default();
    let located = LocationCandidateSet::new(vec!["Klang".into()]);
    let unlocated = LocationCandidateSet::default();

    for signals in all_signals() {
        let evidence = results_for(&signals);
        for is_flood in [false, true] {
            for candidates in [&located, &unlocated] {
                let v = verdict(is_flood, Severity::Moderate);
                let score = engine.score(&ScoringInput {
                    verdict: &v,
                    candidates,
                    evidence: &evidence,
                });
                assert!((0.0..=1.0).contains(&score), "score {score} for {signals:?}");
            }
        }
    }
}

#[test]
fn heavy_weights_are_clamped_to_one() {
    let weights = ScoreWeights {
        gatekeeper: 0.5,
        warning: 0.5,
        risk_model: 0.5,
        social: 0.5,
        weather: 0.5,
        location: 0.5,
    };
    let engine = ScoringEngine::new(weights, EscalationPolicy::default());
    let signals = EvidenceSignals {
        social_count: 10,
        weather_present: true,
        warning_match: true,
        risk: Some(RiskAssessment::from_probability(0.9)),
    };
    let v = verdict(true, Severity::Minor);
    let candidates = LocationCandidateSet::new(vec!["Klang".into()]);
    let score = engine.score(&ScoringInput {
        verdict: &v,
        candidates: &candidates,
        evidence: &results_for(&signals),
    });
    assert_eq!(score, 1.0);
}

#[test]
fn failed_sources_contribute_nothing() {
    let engine = ScoringEngine::default();
    let v = verdict(true, Severity::Minor);
    let candidates = LocationCandidateSet::new(vec!["Klang".into()]);
    let evidence: Vec<_> = EvidenceSource::ALL
        .iter()
        .map(|source| EvidenceResult::error(*source, "down", 5))
        .collect();

    let assessment = engine.assess(&ScoringInput {
        verdict: &v,
        candidates: &candidates,
        evidence: &evidence,
    });
    assert!((assessment.score - 0.30).abs() < 1e-9);
    assert_eq!(assessment.severity, Severity::Minor);
}

#[test]
fn escalation_never_lowers_severity_under_any_order() {
    for order in all_orders() {
        let policy = EscalationPolicy::with_order(order.clone());
        let engine = ScoringEngine::new(ScoreWeights::default(), policy);
        for signals in all_signals() {
            for initial in LEVELS {
                let escalated = engine.escalate(initial, &signals);
                assert!(
                    escalated >= initial,
                    "{initial} -> {escalated} with {order:?} {signals:?}"
                );
                if initial == Severity::Unknown {
                    assert_eq!(escalated, Severity::Unknown);
                }
            }
        }
    }
}

#[test]
fn escalation_is_idempotent_on_its_own_output_ceiling() {
    // Re-escalating a critical report is a no-op regardless of evidence.
    let engine = ScoringEngine::default();
    for signals in all_signals() {
        assert_eq!(engine.escalate(Severity::Critical, &signals), Severity::Critical);
    }
}

#[test]
fn no_signals_means_no_escalation() {
    let quiet = EvidenceSignals::default();
    for order in all_orders() {
        let policy = EscalationPolicy::with_order(order);
        let engine = ScoringEngine::new(ScoreWeights::default(), policy);
        for initial in LEVELS {
            assert_eq!(engine.escalate(initial, &quiet), initial);
        }
    }
}

#[test]
fn scoring_is_deterministic_for_identical_inputs() {
    let candidates = LocationCandidateSet::new(vec!["Klang".into()]);
    for order in all_orders() {
        let policy = EscalationPolicy::with_order(order.clone());
        let engine = ScoringEngine::new(ScoreWeights::default(), policy);
        for signals in all_signals() {
            let evidence = results_for(&signals);
            for initial in LEVELS {
                let v = verdict(true, initial);
                let input = ScoringInput {
                    verdict: &v,
                    candidates: &candidates,
                    evidence: &evidence,
                };
                let first = engine.assess(&input);
                let second = engine.assess(&input);
                assert_eq!(first.score, second.score, "{order:?} {signals:?} {initial}");
                assert_eq!(first.severity, second.severity, "{order:?} {signals:?} {initial}");
                assert_eq!(first.signals, second.signals);
            }
        }
    }
}

#[test]
fn social_alone_tops_out_at_severe() {
    let signals = EvidenceSignals {
        social_count: 100,
        ..EvidenceSignals::default()
    };
    let engine = ScoringEngine::default();
    assert_eq!(engine.escalate(Severity::Minor, &signals), Severity::Moderate);
    assert_eq!(engine.escalate(Severity::Moderate, &signals), Severity::Severe);
    assert_eq!(engine.escalate(Severity::Severe, &signals), Severity::Severe);
}

#[test]
fn recommendations_follow_fixed_order() {
    let engine = ScoringEngine::default();
    for signals in all_signals() {
        let severity = engine.escalate(Severity::Moderate, &signals);
        let recs = recommendations(0.9, severity, &signals);
        let mut sorted = recs.clone();
        sorted.dedup();
        assert_eq!(sorted.len(), recs.len(), "duplicate recommendation in {recs:?}");

        if signals.high_risk() {
            assert_eq!(recs[0], "High risk of flood predicted");
        } else {
            assert_eq!(recs[0], "High credibility - consider immediate alert distribution");
        }
    }
}
