use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use typed_builder::TypedBuilder;

use crate::error::FloodWatchError;
use crate::severity::Severity;

// --- Request ---

/// A disaster report as submitted by a caller. Never mutated after submission.
///
/// Wire names follow the public ingest contract (`save_to_s3`, `s3_bucket`)
/// even though the storage target is whatever the report sink writes to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TypedBuilder)]
pub struct ReportRequest {
    #[builder(setter(into))]
    pub text_input: String,
    /// Local image paths, sent inline to the gatekeeper.
    #[serde(default)]
    #[builder(default)]
    pub image_files: Vec<String>,
    /// Remote image URLs, passed to the gatekeeper by reference.
    #[serde(default)]
    #[builder(default)]
    pub image_urls: Vec<String>,
    #[serde(default, rename = "save_to_s3")]
    #[builder(default)]
    pub save_images: bool,
    #[serde(default, rename = "s3_bucket")]
    #[builder(default, setter(strip_option, into))]
    pub storage_target: Option<String>,
}

impl ReportRequest {
    /// Trimmed text; empty means the request is rejected before any model call.
    pub fn text(&self) -> &str {
        self.text_input.trim()
    }

    pub fn is_blank(&self) -> bool {
        self.text().is_empty()
    }

    pub fn has_images(&self) -> bool {
        !self.image_files.is_empty() || !self.image_urls.is_empty()
    }

    /// Boundary check run before the pipeline starts.
    pub fn validate(&self) -> Result<(), FloodWatchError> {
        if self.is_blank() {
            return Err(FloodWatchError::Validation("empty input".into()));
        }
        if let Some(url) = self
            .image_urls
            .iter()
            .find(|u| !(u.starts_with("http://") || u.starts_with("https://")))
        {
            return Err(FloodWatchError::Validation(format!(
                "image url must be http(s): {url}"
            )));
        }
        if self.image_files.iter().any(|f| f.trim().is_empty()) {
            return Err(FloodWatchError::Validation("image file path is empty".into()));
        }
        Ok(())
    }
}

// --- Gatekeeper ---

/// The gatekeeper's decision for one request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatekeeperVerdict {
    pub is_flood: bool,
    /// Location string as written in the post; may be empty.
    pub location: String,
    pub severity: Severity,
    pub summary: String,
}

impl GatekeeperVerdict {
    /// Safe default when classifier output cannot be trusted.
    pub fn fail_safe(diagnostic: impl Into<String>) -> Self {
        Self {
            is_flood: false,
            location: String::new(),
            severity: Severity::Unknown,
            summary: diagnostic.into(),
        }
    }

    /// Location text with the "unknown" placeholder treated as absent.
    pub fn location_text(&self) -> Option<&str> {
        let trimmed = self.location.trim();
        if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("unknown") {
            None
        } else {
            Some(trimmed)
        }
    }
}

// --- Location ---

/// Structured gazetteer classification of a free-text place name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct LocationFields {
    /// Town name, or "None"
    pub town: Option<String>,
    /// Recreation centre name, or "None"
    pub recreation_centre: Option<String>,
    /// District name, or "None"
    pub district: Option<String>,
    /// Division name (Sarawak), or "None"
    pub division: Option<String>,
    /// State or federal territory name, or "None"
    pub state: Option<String>,
}

/// Sentinel the classifier uses for "does not apply".
pub const NONE_SENTINEL: &str = "none";

impl LocationFields {
    /// Fields in granularity order, most specific first.
    pub fn by_granularity(&self) -> [&Option<String>; 5] {
        [
            &self.town,
            &self.recreation_centre,
            &self.district,
            &self.division,
            &self.state,
        ]
    }

    /// Candidate set in granularity order, dropping blanks and the sentinel.
    /// A name repeated at a coarser level (town and district both "Klang")
    /// appears once, at its most specific position.
    pub fn ordered_candidates(&self) -> LocationCandidateSet {
        let mut out: Vec<String> = Vec::new();
        for value in self.by_granularity().into_iter().flatten() {
            let value = value.trim();
            if value.is_empty() || value.eq_ignore_ascii_case(NONE_SENTINEL) {
                continue;
            }
            if !out.iter().any(|existing| existing.eq_ignore_ascii_case(value)) {
                out.push(value.to_string());
            }
        }
        LocationCandidateSet(out)
    }

    pub fn is_empty(&self) -> bool {
        self.ordered_candidates().is_empty()
    }
}

/// Ranked geographic resolutions, most specific first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LocationCandidateSet(Vec<String>);

impl LocationCandidateSet {
    pub fn new(candidates: Vec<String>) -> Self {
        Self(candidates)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn most_specific(&self) -> Option<&str> {
        self.0.first().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }
}

/// Resolver output as carried in reports.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocationClassification {
    #[serde(flatten)]
    pub fields: LocationFields,
    pub ordered_locations: LocationCandidateSet,
    /// Which reference produced the fields.
    pub resolved_by: ResolutionSource,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionSource {
    KnowledgeBase,
    ReferenceCorpus,
    #[default]
    Unresolved,
}
