// Capability seams for the flood pipeline.
//
// Every external collaborator sits behind one of these traits so the core
// can run against in-memory mocks (see `testing.rs`): no network, no model
// calls. Errors are plain `anyhow::Result`; the pipeline turns them into
// typed values at each component boundary.

use std::path::Path;

use anyhow::Result;
use async_trait::async_trait;

use datagov_client::{FloodWarningStation, ForecastEntry};
use floodwatch_common::{ConsolidatedReport, LocationFields};

use crate::images::ReportImage;

// ---------------------------------------------------------------------------
// Models
// ---------------------------------------------------------------------------

#[async_trait]
pub trait GatekeeperModel: Send + Sync {
    /// Classify a post. Returns the model's raw text; decoding is the
    /// gatekeeper's job, not the model adapter's.
    async fn classify(&self, text: &str, images: &[ReportImage]) -> Result<String>;
}

#[async_trait]
pub trait LocationKnowledgeBase: Send + Sync {
    /// Structured gazetteer fields for a free-text place, or `None` when the
    /// knowledge base has nothing relevant.
    async fn lookup(&self, text: &str) -> Result<Option<LocationFields>>;
}

#[async_trait]
pub trait NarrativeGenerator: Send + Sync {
    /// Human-readable paragraph over the structured report payload.
    async fn summarize(&self, payload: &serde_json::Value) -> Result<String>;
}

// ---------------------------------------------------------------------------
// Evidence sources
// ---------------------------------------------------------------------------

/// One page of social search.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SocialPage {
    pub result_count: u32,
    pub posts: Vec<serde_json::Value>,
}

#[async_trait]
pub trait SocialSearch: Send + Sync {
    async fn search(&self, query: &str) -> Result<SocialPage>;
}

#[async_trait]
pub trait WeatherSource: Send + Sync {
    /// Full forecast dataset. Matching happens in the collector.
    async fn forecast(&self) -> Result<Vec<ForecastEntry>>;
}

#[async_trait]
pub trait WarningSource: Send + Sync {
    /// Current flood warning stations. Matching happens in the collector.
    async fn stations(&self) -> Result<Vec<FloodWarningStation>>;
}

#[async_trait]
pub trait RiskModel: Send + Sync {
    /// Flood probability in `[0, 1]` for one feature vector.
    async fn predict(&self, features: &[f64]) -> Result<f64>;
}

// ---------------------------------------------------------------------------
// Sinks
// ---------------------------------------------------------------------------

#[async_trait]
pub trait ReportSink: Send + Sync {
    /// Store a completed report under `bucket`. Returns where it landed.
    async fn persist(&self, bucket: &str, report: &ConsolidatedReport) -> Result<String>;

    /// Copy a local image into `bucket`. Returns where it landed.
    async fn archive_image(&self, bucket: &str, path: &Path) -> Result<String>;
}

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, report: &ConsolidatedReport) -> Result<()>;
}
