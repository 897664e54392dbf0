use std::fmt;
use std::str::FromStr;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::FloodWatchError;

/// Flood severity lattice. Declaration order is the escalation order, so the
/// derived `Ord` gives `unknown < minor < moderate < severe < critical`.
///
/// `Unknown` only ever comes from the gatekeeper; no escalation rule moves a
/// report out of it.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    JsonSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    #[default]
    Unknown,
    Minor,
    Moderate,
    Severe,
    Critical,
}

impl Severity {
    /// Lenient label parse for model output. Anything unrecognised is `Unknown`.
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_ascii_lowercase().as_str() {
            "minor" => Severity::Minor,
            "moderate" => Severity::Moderate,
            "severe" => Severity::Severe,
            "critical" => Severity::Critical,
            _ => Severity::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Unknown => "unknown",
            Severity::Minor => "minor",
            Severity::Moderate => "moderate",
            Severity::Severe => "severe",
            Severity::Critical => "critical",
        }
    }

    /// `severe` or `critical`.
    pub fn is_high(&self) -> bool {
        *self >= Severity::Severe
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One step of the severity walk, keyed by the evidence it reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EscalationRule {
    /// Social volume above threshold: minor -> moderate, moderate -> severe.
    Social,
    /// Official warning match: minor/moderate -> severe, severe -> critical.
    Warning,
    /// High-risk model label: minor/moderate -> severe, severe -> critical.
    RiskModel,
}

impl EscalationRule {
    pub const DEFAULT_ORDER: [EscalationRule; 3] = [
        EscalationRule::Social,
        EscalationRule::Warning,
        EscalationRule::RiskModel,
    ];
}

impl FromStr for EscalationRule {
    type Err = FloodWatchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "social" => Ok(EscalationRule::Social),
            "warning" => Ok(EscalationRule::Warning),
            "risk_model" | "model" => Ok(EscalationRule::RiskModel),
            other => Err(FloodWatchError::Config(format!(
                "unknown escalation rule '{other}' (expected social, warning, risk_model)"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lattice_is_totally_ordered() {
        assert!(Severity::Unknown < Severity::Minor);
        assert!(Severity::Minor < Severity::Moderate);
        assert!(Severity::Moderate < Severity::Severe);
        assert!(Severity::Severe < Severity::Critical);
    }

    #[test]
    fn from_label_is_lenient() {
        assert_eq!(Severity::from_label(" Severe "), Severity::Severe);
        assert_eq!(Severity::from_label("CRITICAL"), Severity::Critical);
        assert_eq!(Severity::from_label("catastrophic"), Severity::Unknown);
        assert_eq!(Severity::from_label(""), Severity::Unknown);
    }

    #[test]
    fn serde_uses_snake_case_labels() {
        assert_eq!(serde_json::to_string(&Severity::Moderate).unwrap(), "\"moderate\"");
        let s: Severity = serde_json::from_str("\"critical\"").unwrap();
        assert_eq!(s, Severity::Critical);
    }

    #[test]
    fn escalation_rule_parse() {
        assert_eq!("social".parse::<EscalationRule>().unwrap(), EscalationRule::Social);
        assert_eq!(" Risk_Model".parse::<EscalationRule>().unwrap(), EscalationRule::RiskModel);
        assert!("weather".parse::<EscalationRule>().is_err());
    }
}
