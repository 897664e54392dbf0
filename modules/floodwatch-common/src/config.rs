use std::env;
use std::path::PathBuf;
use std::time::Duration;

use tracing::info;

use crate::error::FloodWatchError;
use crate::severity::EscalationRule;

pub const DEFAULT_MODEL: &str = "claude-haiku-4-5-20251001";
pub const DEFAULT_DATAGOV_BASE_URL: &str = "https://api.data.gov.my";
pub const DEFAULT_EVIDENCE_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_MODEL_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_SOCIAL_MAX_RESULTS: u32 = 10;
pub const DEFAULT_REPORT_BUCKET: &str = "floodwatch-reports";

/// Baseline risk-model features: ten days of rainfall (mm), altitude (m),
/// continent code. Used until per-location feature extraction exists.
pub const DEFAULT_RISK_FEATURES: [f64; 12] =
    [12.5, 0.0, 5.0, 8.2, 0.0, 10.1, 3.0, 0.0, 1.2, 6.3, 150.0, 1.0];

/// Twilio credentials plus recipients. All-or-nothing.
#[derive(Debug, Clone)]
pub struct SmsConfig {
    pub account_sid: String,
    pub auth_token: String,
    pub from_number: String,
    pub recipients: Vec<String>,
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    // Models
    pub anthropic_api_key: String,
    pub gatekeeper_model: String,
    pub narrative_model: String,
    pub model_timeout: Duration,

    // Evidence sources
    pub datagov_base_url: String,
    pub x_bearer_token: Option<String>,
    pub social_max_results: u32,
    pub risk_model_url: Option<String>,
    pub risk_model_token: Option<String>,
    pub risk_model_features: Vec<f64>,
    pub evidence_timeout: Duration,

    // Location
    pub gazetteer_path: Option<PathBuf>,

    // Scoring
    pub escalation_order: Vec<EscalationRule>,

    // Sinks
    pub report_store_dir: PathBuf,
    pub report_bucket: String,
    pub sms: Option<SmsConfig>,
}

impl Config {
    /// Load configuration from the process environment (and `.env` if present).
    /// Missing or malformed required values are returned as `Config` errors.
    pub fn from_env() -> Result<Self, FloodWatchError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, FloodWatchError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let required = |key: &str| {
            get(key).ok_or_else(|| {
                FloodWatchError::Config(format!("{key} environment variable is required"))
            })
        };

        let evidence_timeout = parse_timeout(
            get("EVIDENCE_TIMEOUT_SECS"),
            "EVIDENCE_TIMEOUT_SECS",
            DEFAULT_EVIDENCE_TIMEOUT_SECS,
        )?;
        let model_timeout = parse_timeout(
            get("MODEL_TIMEOUT_SECS"),
            "MODEL_TIMEOUT_SECS",
            DEFAULT_MODEL_TIMEOUT_SECS,
        )?;

        let social_max_results: u32 = parse_or(
            get("SOCIAL_MAX_RESULTS"),
            "SOCIAL_MAX_RESULTS",
            DEFAULT_SOCIAL_MAX_RESULTS,
        )?;
        if !(10..=100).contains(&social_max_results) {
            return Err(FloodWatchError::Config(
                "SOCIAL_MAX_RESULTS must be between 10 and 100".into(),
            ));
        }

        let risk_model_features = match get("RISK_MODEL_FEATURES") {
            Some(raw) => parse_features(&raw)?,
            None => DEFAULT_RISK_FEATURES.to_vec(),
        };

        let escalation_order = match get("SEVERITY_ESCALATION_ORDER") {
            Some(raw) => parse_escalation_order(&raw)?,
            None => EscalationRule::DEFAULT_ORDER.to_vec(),
        };

        let sms = match (
            get("TWILIO_ACCOUNT_SID"),
            get("TWILIO_AUTH_TOKEN"),
            get("TWILIO_FROM_NUMBER"),
            get("ALERT_RECIPIENTS"),
        ) {
            (Some(account_sid), Some(auth_token), Some(from_number), Some(recipients)) => {
                Some(SmsConfig {
                    account_sid,
                    auth_token,
                    from_number,
                    recipients: recipients
                        .split(',')
                        .map(|s| s.trim().to_string())
                        .filter(|s| !s.is_empty())
                        .collect(),
                })
            }
            (None, None, None, None) => None,
            _ => {
                return Err(FloodWatchError::Config(
                    "TWILIO_ACCOUNT_SID, TWILIO_AUTH_TOKEN, TWILIO_FROM_NUMBER and \
                     ALERT_RECIPIENTS must be set together"
                        .into(),
                ))
            }
        };

        Ok(Self {
            anthropic_api_key: required("ANTHROPIC_API_KEY")?,
            gatekeeper_model: get("GATEKEEPER_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            narrative_model: get("NARRATIVE_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            model_timeout,
            datagov_base_url: get("DATAGOV_BASE_URL")
                .unwrap_or_else(|| DEFAULT_DATAGOV_BASE_URL.to_string()),
            x_bearer_token: get("X_BEARER_TOKEN"),
            social_max_results,
            risk_model_url: get("RISK_MODEL_URL"),
            risk_model_token: get("RISK_MODEL_TOKEN"),
            risk_model_features,
            evidence_timeout,
            gazetteer_path: get("GAZETTEER_PATH").map(PathBuf::from),
            escalation_order,
            report_store_dir: get("REPORT_STORE_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("data")),
            report_bucket: get("REPORT_BUCKET")
                .unwrap_or_else(|| DEFAULT_REPORT_BUCKET.to_string()),
            sms,
        })
    }

    /// Log the effective configuration with secrets reduced to presence flags.
    pub fn log_redacted(&self) {
        info!(
            gatekeeper_model = self.gatekeeper_model.as_str(),
            narrative_model = self.narrative_model.as_str(),
            datagov_base_url = self.datagov_base_url.as_str(),
            social_search = self.x_bearer_token.is_some(),
            social_max_results = self.social_max_results,
            risk_model = self.risk_model_url.is_some(),
            evidence_timeout_secs = self.evidence_timeout.as_secs(),
            model_timeout_secs = self.model_timeout.as_secs(),
            gazetteer = ?self.gazetteer_path,
            escalation_order = ?self.escalation_order,
            report_store_dir = %self.report_store_dir.display(),
            report_bucket = self.report_bucket.as_str(),
            sms_alerts = self.sms.as_ref().map(|s| s.recipients.len()).unwrap_or(0),
            "Configuration loaded"
        );
    }
}

fn parse_or<T: std::str::FromStr>(
    raw: Option<String>,
    key: &str,
    default: T,
) -> Result<T, FloodWatchError> {
    match raw {
        Some(value) => value
            .parse()
            .map_err(|_| FloodWatchError::Config(format!("{key} has an invalid value: {value}"))),
        None => Ok(default),
    }
}

/// Whole seconds, strictly positive.
fn parse_timeout(
    raw: Option<String>,
    key: &str,
    default_secs: u64,
) -> Result<Duration, FloodWatchError> {
    let secs: u64 = parse_or(raw, key, default_secs)?;
    if secs == 0 {
        return Err(FloodWatchError::Config(format!(
            "{key} must be greater than zero"
        )));
    }
    Ok(Duration::from_secs(secs))
}

fn parse_features(raw: &str) -> Result<Vec<f64>, FloodWatchError> {
    let features = raw
        .split(',')
        .map(|part| {
            part.trim().parse::<f64>().map_err(|_| {
                FloodWatchError::Config(format!(
                    "RISK_MODEL_FEATURES has a non-numeric value: {part}"
                ))
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    if features.len() != DEFAULT_RISK_FEATURES.len() {
        return Err(FloodWatchError::Config(format!(
            "RISK_MODEL_FEATURES needs {} values, got {}",
            DEFAULT_RISK_FEATURES.len(),
            features.len()
        )));
    }
    Ok(features)
}

fn parse_escalation_order(raw: &str) -> Result<Vec<EscalationRule>, FloodWatchError> {
    let rules = raw
        .split(',')
        .filter(|s| !s.trim().is_empty())
        .map(str::parse::<EscalationRule>)
        .collect::<Result<Vec<_>, _>>()?;

    for (i, rule) in rules.iter().enumerate() {
        if rules[..i].contains(rule) {
            return Err(FloodWatchError::Config(format!(
                "SEVERITY_ESCALATION_ORDER lists {rule:?} more than once"
            )));
        }
    }
    Ok(rules)
}
