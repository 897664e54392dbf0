//! Flood / not-flood classification of an incoming post.
//!
//! The gatekeeper is the only stage that can stop a report before any
//! evidence is gathered, so every doubt resolves to a reject: a transport
//! failure, unparseable output or a missing key all produce the fail-safe
//! verdict.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Deserializer};
use tracing::{debug, warn};

use ai_client::strip_code_blocks;
use floodwatch_common::{GatekeeperVerdict, Severity};

use crate::images::ReportImage;
use crate::traits::GatekeeperModel;

pub const GATEKEEPER_SYSTEM_PROMPT: &str = "\
You are a flood detection assistant for Malaysia. \
Given a text description and optional images, determine whether it reports a flood \
that is happening. If it does, summarise the post and extract the exact location string \
as it appears in the post. \
Classify severity as one of: minor, moderate, severe, critical. \
Respond with a single JSON object with keys: is_flood (boolean), summary (string), \
location (string, or null if no place is named), severity (string). No other text.";

/// Result of decoding the model's raw output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelOutput {
    Parsed(GatekeeperVerdict),
    Malformed { reason: String },
}

#[derive(Deserialize)]
struct RawVerdict {
    is_flood: bool,
    summary: String,
    severity: String,
    // Present-but-null is allowed; absent is not.
    #[serde(deserialize_with = "required_nullable")]
    location: Option<String>,
}

fn required_nullable<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer)
}

/// Decode raw model text into a verdict. Markdown fences are stripped first.
pub fn decode_verdict(raw: &str) -> ModelOutput {
    let body = strip_code_blocks(raw);
    if body.is_empty() {
        return ModelOutput::Malformed {
            reason: "empty model output".into(),
        };
    }

    match serde_json::from_str::<RawVerdict>(body) {
        Ok(v) => ModelOutput::Parsed(GatekeeperVerdict {
            is_flood: v.is_flood,
            location: v.location.map(|l| l.trim().to_string()).unwrap_or_default(),
            severity: Severity::from_label(&v.severity),
            summary: v.summary.trim().to_string(),
        }),
        Err(e) => ModelOutput::Malformed {
            reason: format!("model output did not match verdict schema: {e}"),
        },
    }
}

pub struct Gatekeeper {
    model: Arc<dyn GatekeeperModel>,
    timeout: Duration,
}

impl Gatekeeper {
    pub fn new(model: Arc<dyn GatekeeperModel>, timeout: Duration) -> Self {
        Self { model, timeout }
    }

    /// Never fails. Blank text is rejected without calling the model; a call
    /// that outlives `timeout` is treated like a transport failure.
    pub async fn classify(&self, text: &str, images: &[ReportImage]) -> GatekeeperVerdict {
        let text = text.trim();
        if text.is_empty() {
            return GatekeeperVerdict::fail_safe("empty input");
        }

        let call = self.model.classify(text, images);
        let raw = match tokio::time::timeout(self.timeout, call).await {
            Ok(Ok(raw)) => raw,
            Ok(Err(e)) => {
                warn!(error = %e, "Gatekeeper model call failed, rejecting");
                return GatekeeperVerdict::fail_safe(format!("classifier unavailable: {e}"));
            }
            Err(_) => {
                let timeout_ms = self.timeout.as_millis() as u64;
                warn!(timeout_ms, "Gatekeeper model call timed out, rejecting");
                return GatekeeperVerdict::fail_safe(format!(
                    "classifier timed out after {timeout_ms}ms"
                ));
            }
        };

        match decode_verdict(&raw) {
            ModelOutput::Parsed(verdict) => {
                debug!(
                    is_flood = verdict.is_flood,
                    severity = %verdict.severity,
                    location = verdict.location.as_str(),
                    "Gatekeeper verdict"
                );
                verdict
            }
            ModelOutput::Malformed { reason } => {
                warn!(reason = reason.as_str(), "Gatekeeper output malformed, rejecting");
                GatekeeperVerdict::fail_safe(reason)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parsed(raw: &str) -> GatekeeperVerdict {
        match decode_verdict(raw) {
            ModelOutput::Parsed(v) => v,
            ModelOutput::Malformed { reason } => panic!("expected parse, got: {reason}"),
        }
    }

    #[test]
    fn decodes_fenced_json() {
        let v = parsed(concat!(
            "```json\n",
            r#"{"is_flood": true, "summary": "Roads submerged", "#,
            r#""location": "downtown", "severity": "Severe"}"#,
            "\n```",
        ));
        assert!(v.is_flood);
        assert_eq!(v.location, "downtown");
        assert_eq!(v.severity, Severity::Severe);
    }

    #[test]
    fn null_location_becomes_empty() {
        let v = parsed(
            r#"{"is_flood": true, "summary": "s", "location": null, "severity": "minor"}"#,
        );
        assert_eq!(v.location, "");
    }

    #[test]
    fn unknown_severity_label_maps_to_unknown() {
        let v = parsed(
            r#"{"is_flood": true, "summary": "s", "location": "Klang", "severity": "extreme"}"#,
        );
        assert_eq!(v.severity, Severity::Unknown);
    }

    #[test]
    fn missing_keys_are_malformed() {
        assert!(matches!(
            decode_verdict(r#"{"is_flood": true, "summary": "s", "severity": "minor"}"#),
            ModelOutput::Malformed { .. }
        ));
        assert!(matches!(
            decode_verdict(r#"{"summary": "s", "location": "x", "severity": "minor"}"#),
            ModelOutput::Malformed { .. }
        ));
    }

    #[test]
    fn prose_is_malformed() {
        assert!(matches!(
            decode_verdict("Yes, this looks like a flood in Klang."),
            ModelOutput::Malformed { .. }
        ));
        assert!(matches!(decode_verdict("   "), ModelOutput::Malformed { .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn stalled_model_rejects_after_timeout() {
        use crate::testing::MockGatekeeper;

        let gatekeeper = Gatekeeper::new(
            Arc::new(MockGatekeeper::new().hanging()),
            Duration::from_secs(30),
        );
        let verdict = gatekeeper.classify("Banjir di Klang", &[]).await;
        assert!(!verdict.is_flood);
        assert_eq!(verdict.severity, Severity::Unknown);
        assert_eq!(verdict.summary, "classifier timed out after 30000ms");
    }
}
