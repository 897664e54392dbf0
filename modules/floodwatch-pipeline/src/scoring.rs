//! Credibility score and severity escalation.
//!
//! Both are pure functions of the gatekeeper verdict, the resolved
//! candidates and the evidence results. Only successful evidence counts.

use floodwatch_common::{
    EscalationRule, EvidenceResult, EvidenceSignals, GatekeeperVerdict, LocationCandidateSet,
    Severity,
};

/// Additive weight per signal. The defaults sum to 0.90.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreWeights {
    pub gatekeeper: f64,
    pub warning: f64,
    pub risk_model: f64,
    pub social: f64,
    pub weather: f64,
    pub location: f64,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            gatekeeper: 0.25,
            warning: 0.20,
            risk_model: 0.10,
            social: 0.15,
            weather: 0.15,
            location: 0.05,
        }
    }
}

/// Ordered escalation rules and their thresholds.
#[derive(Debug, Clone, PartialEq)]
pub struct EscalationPolicy {
    order: Vec<EscalationRule>,
    /// Social volume strictly above this escalates one step.
    pub social_threshold: u32,
}

impl Default for EscalationPolicy {
    fn default() -> Self {
        Self {
            order: EscalationRule::DEFAULT_ORDER.to_vec(),
            social_threshold: 5,
        }
    }
}

impl EscalationPolicy {
    /// Repeated rules keep their first position; each rule fires at most
    /// once per walk.
    pub fn with_order(order: Vec<EscalationRule>) -> Self {
        let mut unique = Vec::with_capacity(order.len());
        for rule in order {
            if !unique.contains(&rule) {
                unique.push(rule);
            }
        }
        Self {
            order: unique,
            ..Self::default()
        }
    }
}

pub struct ScoringInput<'a> {
    pub verdict: &'a GatekeeperVerdict,
    pub candidates: &'a LocationCandidateSet,
    pub evidence: &'a [EvidenceResult],
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Assessment {
    pub score: f64,
    pub severity: Severity,
    pub signals: EvidenceSignals,
}

#[derive(Debug, Clone, Default)]
pub struct ScoringEngine {
    weights: ScoreWeights,
    policy: EscalationPolicy,
}

impl ScoringEngine {
    pub fn new(weights: ScoreWeights, policy: EscalationPolicy) -> Self {
        Self { weights, policy }
    }

    pub fn assess(&self, input: &ScoringInput<'_>) -> Assessment {
        let signals = EvidenceSignals::from_results(input.evidence);
        Assessment {
            score: self.score_signals(input.verdict, input.candidates, &signals),
            severity: self.escalate(input.verdict.severity, &signals),
            signals,
        }
    }

    pub fn score(&self, input: &ScoringInput<'_>) -> f64 {
        let signals = EvidenceSignals::from_results(input.evidence);
        self.score_signals(input.verdict, input.candidates, &signals)
    }

    fn score_signals(
        &self,
        verdict: &GatekeeperVerdict,
        candidates: &LocationCandidateSet,
        signals: &EvidenceSignals,
    ) -> f64 {
        let w = &self.weights;
        let parts = [
            (verdict.is_flood, w.gatekeeper),
            (signals.warning_match, w.warning),
            (signals.high_risk(), w.risk_model),
            (signals.social_count > 0, w.social),
            (signals.weather_present, w.weather),
            (!candidates.is_empty(), w.location),
        ];
        let sum: f64 = parts.iter().filter(|(hit, _)| *hit).map(|(_, weight)| weight).sum();
        sum.clamp(0.0, 1.0)
    }

    /// Walk the lattice from `initial`, one step per rule in policy order.
    /// Never returns a level below `initial`.
    pub fn escalate(&self, initial: Severity, signals: &EvidenceSignals) -> Severity {
        let walked = self
            .policy
            .order
            .iter()
            .fold(initial, |level, rule| self.apply(*rule, level, signals));
        walked.max(initial)
    }

    fn apply(&self, rule: EscalationRule, level: Severity, signals: &EvidenceSignals) -> Severity {
        match rule {
            EscalationRule::Social if signals.social_count > self.policy.social_threshold => {
                match level {
                    Severity::Minor => Severity::Moderate,
                    Severity::Moderate => Severity::Severe,
                    other => other,
                }
            }
            EscalationRule::Warning if signals.warning_match => step_to_severe(level),
            EscalationRule::RiskModel if signals.high_risk() => step_to_severe(level),
            _ => level,
        }
    }
}

fn step_to_severe(level: Severity) -> Severity {
    match level {
        Severity::Minor | Severity::Moderate => Severity::Severe,
        Severity::Severe => Severity::Critical,
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use floodwatch_common::RiskAssessment;

    fn signals(social: u32, warning: bool, risk: Option<f64>) -> EvidenceSignals {
        EvidenceSignals {
            social_count: social,
            weather_present: false,
            warning_match: warning,
            risk: risk.map(RiskAssessment::from_probability),
        }
    }

    #[test]
    fn social_steps_once() {
        let engine = ScoringEngine::default();
        let busy = signals(6, false, None);
        assert_eq!(engine.escalate(Severity::Minor, &busy), Severity::Moderate);
        assert_eq!(engine.escalate(Severity::Moderate, &busy), Severity::Severe);
        assert_eq!(engine.escalate(Severity::Severe, &busy), Severity::Severe);
        let quiet = signals(5, false, None);
        assert_eq!(engine.escalate(Severity::Minor, &quiet), Severity::Minor);
    }

    #[test]
    fn warning_and_model_stack_to_critical() {
        let engine = ScoringEngine::default();
        let both = signals(0, true, Some(0.9));
        assert_eq!(engine.escalate(Severity::Minor, &both), Severity::Critical);
        let warning = signals(0, true, None);
        assert_eq!(engine.escalate(Severity::Moderate, &warning), Severity::Severe);
    }

    #[test]
    fn unknown_is_never_escalated() {
        let engine = ScoringEngine::default();
        let all = signals(50, true, Some(0.99));
        assert_eq!(engine.escalate(Severity::Unknown, &all), Severity::Unknown);
    }

    #[test]
    fn order_matters_near_boundaries() {
        // minor: social -> moderate, warning -> severe, model -> critical
        let everything = signals(6, true, Some(0.9));
        let default = ScoringEngine::default();
        assert_eq!(default.escalate(Severity::Minor, &everything), Severity::Critical);

        // minor: warning -> severe, model -> critical, social no-op
        let reordered = ScoringEngine::new(
            ScoreWeights::default(),
            EscalationPolicy::with_order(vec![
                EscalationRule::Warning,
                EscalationRule::RiskModel,
                EscalationRule::Social,
            ]),
        );
        assert_eq!(reordered.escalate(Severity::Minor, &everything), Severity::Critical);

        // moderate, social only after warning: warning -> severe, social no-op
        let social_last = ScoringEngine::new(
            ScoreWeights::default(),
            EscalationPolicy::with_order(vec![EscalationRule::Warning, EscalationRule::Social]),
        );
        let social_and_warning = signals(6, true, None);
        assert_eq!(
            social_last.escalate(Severity::Moderate, &social_and_warning),
            Severity::Severe
        );
        // social first: moderate -> severe, warning -> critical
        let social_first = ScoringEngine::new(
            ScoreWeights::default(),
            EscalationPolicy::with_order(vec![EscalationRule::Social, EscalationRule::Warning]),
        );
        assert_eq!(
            social_first.escalate(Severity::Moderate, &social_and_warning),
            Severity::Critical
        );
    }

    #[test]
    fn repeated_rules_fire_once() {
        let policy = EscalationPolicy::with_order(vec![
            EscalationRule::Social,
            EscalationRule::Social,
            EscalationRule::Warning,
            EscalationRule::Social,
        ]);
        assert_eq!(policy.order, vec![EscalationRule::Social, EscalationRule::Warning]);

        let engine = ScoringEngine::new(ScoreWeights::default(), policy);
        // A doubled social rule would reach severe from minor.
        let busy = signals(6, false, None);
        assert_eq!(engine.escalate(Severity::Minor, &busy), Severity::Moderate);
    }
}
