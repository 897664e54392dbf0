// Test mocks for the flood pipeline.
//
// One mock per capability trait:
// - MockGatekeeper (GatekeeperModel): scripted raw replies keyed by text
// - MockKnowledgeBase (LocationKnowledgeBase): HashMap place -> fields
// - MockSocial / MockWeather / MockWarnings / MockRiskModel: canned data,
//   with failing, slow and panicking variants
// - MockNarrator (NarrativeGenerator): fixed text, failure, or a call that
//   never returns
// - RecordingSink / RecordingNotifier: capture what was dispatched
//
// Every mock counts its calls so tests can assert what did not run.

use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{anyhow, bail, Result};
use async_trait::async_trait;

use datagov_client::{FloodWarningStation, ForecastEntry};
use floodwatch_common::{ConsolidatedReport, LocationFields};

use crate::deps::ServiceContext;
use crate::images::ReportImage;
use crate::location::Gazetteer;
use crate::traits::{
    GatekeeperModel, LocationKnowledgeBase, NarrativeGenerator, Notifier, ReportSink, RiskModel,
    SocialPage, SocialSearch, WarningSource, WeatherSource,
};

// ---------------------------------------------------------------------------
// Call counting
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Clone)]
pub struct CallCounter(Arc<AtomicUsize>);

impl CallCounter {
    pub fn hit(&self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }

    pub fn get(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }
}

/// How a canned source behaves when called.
#[derive(Debug, Clone)]
pub enum Behavior<T> {
    Return(T),
    Fail(String),
    Slow(Duration, T),
    Panic(String),
}

impl<T: Clone> Behavior<T> {
    async fn run(&self) -> Result<T> {
        match self {
            Behavior::Return(v) => Ok(v.clone()),
            Behavior::Fail(msg) => Err(anyhow!("{msg}")),
            Behavior::Slow(delay, v) => {
                tokio::time::sleep(*delay).await;
                Ok(v.clone())
            }
            Behavior::Panic(msg) => panic!("{msg}"),
        }
    }
}

// ---------------------------------------------------------------------------
// Gatekeeper
// ---------------------------------------------------------------------------

/// Replies keyed by the exact (trimmed) post text. Unscripted text errors.
#[derive(Default)]
pub struct MockGatekeeper {
    replies: HashMap<String, String>,
    hang: bool,
    pub calls: CallCounter,
    pub images_seen: Mutex<Vec<usize>>,
}

impl MockGatekeeper {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw model text for `post`.
    pub fn on_raw(mut self, post: &str, raw: &str) -> Self {
        self.replies.insert(post.trim().to_string(), raw.to_string());
        self
    }

    /// Every call stalls forever.
    pub fn hanging(mut self) -> Self {
        self.hang = true;
        self
    }

    /// Well-formed verdict JSON for `post`.
    pub fn on_verdict(
        self,
        post: &str,
        is_flood: bool,
        location: &str,
        severity: &str,
        summary: &str,
    ) -> Self {
        let raw = serde_json::json!({
            "is_flood": is_flood,
            "location": location,
            "severity": severity,
            "summary": summary,
        })
        .to_string();
        self.on_raw(post, &raw)
    }
}

#[async_trait]
impl GatekeeperModel for MockGatekeeper {
    async fn classify(&self, text: &str, images: &[ReportImage]) -> Result<String> {
        self.calls.hit();
        if let Ok(mut seen) = self.images_seen.lock() {
            seen.push(images.len());
        }
        if self.hang {
            std::future::pending::<()>().await;
        }
        self.replies
            .get(text.trim())
            .cloned()
            .ok_or_else(|| anyhow!("MockGatekeeper: no reply scripted for {text:?}"))
    }
}

// ---------------------------------------------------------------------------
// Knowledge base
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct MockKnowledgeBase {
    entries: HashMap<String, LocationFields>,
    fail: bool,
    hang: bool,
    pub calls: CallCounter,
}

impl MockKnowledgeBase {
    pub fn new() -> Self {
        Self::default()
    }

    /// Knowledge base that errors on every lookup.
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    /// Knowledge base whose lookups never return.
    pub fn hanging() -> Self {
        Self {
            hang: true,
            ..Self::default()
        }
    }

    pub fn on(mut self, place: &str, fields: LocationFields) -> Self {
        self.entries.insert(place.to_lowercase(), fields);
        self
    }
}

#[async_trait]
impl LocationKnowledgeBase for MockKnowledgeBase {
    async fn lookup(&self, text: &str) -> Result<Option<LocationFields>> {
        self.calls.hit();
        if self.hang {
            std::future::pending::<()>().await;
        }
        if self.fail {
            bail!("MockKnowledgeBase: unavailable");
        }
        Ok(self.entries.get(&text.to_lowercase()).cloned())
    }
}

/// Fields with only the given levels set.
pub fn fields(
    town: Option<&str>,
    district: Option<&str>,
    state: Option<&str>,
) -> LocationFields {
    LocationFields {
        town: town.map(String::from),
        recreation_centre: Some("None".into()),
        district: district.map(String::from),
        division: None,
        state: state.map(String::from),
    }
}

// ---------------------------------------------------------------------------
// Evidence sources
// ---------------------------------------------------------------------------

pub struct MockSocial {
    behavior: Behavior<SocialPage>,
    pub calls: CallCounter,
    pub queries: Mutex<Vec<String>>,
}

impl MockSocial {
    pub fn new(behavior: Behavior<SocialPage>) -> Self {
        Self {
            behavior,
            calls: CallCounter::default(),
            queries: Mutex::new(Vec::new()),
        }
    }

    /// `count` results with one placeholder post each.
    pub fn returning(count: u32) -> Self {
        let posts = (0..count)
            .map(|i| serde_json::json!({"id": i.to_string(), "text": "banjir"}))
            .collect();
        Self::new(Behavior::Return(SocialPage {
            result_count: count,
            posts,
        }))
    }
}

#[async_trait]
impl SocialSearch for MockSocial {
    async fn search(&self, query: &str) -> Result<SocialPage> {
        self.calls.hit();
        if let Ok(mut q) = self.queries.lock() {
            q.push(query.to_string());
        }
        self.behavior.run().await
    }
}

pub struct MockWeather {
    behavior: Behavior<Vec<ForecastEntry>>,
    pub calls: CallCounter,
}

impl MockWeather {
    pub fn new(behavior: Behavior<Vec<ForecastEntry>>) -> Self {
        Self {
            behavior,
            calls: CallCounter::default(),
        }
    }
}

#[async_trait]
impl WeatherSource for MockWeather {
    async fn forecast(&self) -> Result<Vec<ForecastEntry>> {
        self.calls.hit();
        self.behavior.run().await
    }
}

pub struct MockWarnings {
    behavior: Behavior<Vec<FloodWarningStation>>,
    pub calls: CallCounter,
}

impl MockWarnings {
    pub fn new(behavior: Behavior<Vec<FloodWarningStation>>) -> Self {
        Self {
            behavior,
            calls: CallCounter::default(),
        }
    }
}

#[async_trait]
impl WarningSource for MockWarnings {
    async fn stations(&self) -> Result<Vec<FloodWarningStation>> {
        self.calls.hit();
        self.behavior.run().await
    }
}

pub struct MockRiskModel {
    behavior: Behavior<f64>,
    pub calls: CallCounter,
}

impl MockRiskModel {
    pub fn new(behavior: Behavior<f64>) -> Self {
        Self {
            behavior,
            calls: CallCounter::default(),
        }
    }
}

#[async_trait]
impl RiskModel for MockRiskModel {
    async fn predict(&self, _features: &[f64]) -> Result<f64> {
        self.calls.hit();
        self.behavior.run().await
    }
}

/// One forecast entry.
pub fn forecast_entry(id: &str, name: &str, date: &str) -> ForecastEntry {
    serde_json::from_value(serde_json::json!({
        "location": {"location_id": id, "location_name": name},
        "date": date,
        "summary_forecast": "Ribut petir",
    }))
    .expect("valid forecast entry")
}

/// One warning station.
pub fn station(id: &str, name: &str, district: &str, state: &str) -> FloodWarningStation {
    serde_json::from_value(serde_json::json!({
        "station_id": id,
        "station_name": name,
        "district": district,
        "state": state,
        "water_level_update_datetime": "2025-01-03T10:15:00",
    }))
    .expect("valid station")
}

// ---------------------------------------------------------------------------
// Narrative
// ---------------------------------------------------------------------------

pub struct MockNarrator {
    reply: Option<String>,
    hang: bool,
    pub calls: CallCounter,
}

impl MockNarrator {
    pub fn replying(text: &str) -> Self {
        Self {
            reply: Some(text.to_string()),
            hang: false,
            calls: CallCounter::default(),
        }
    }

    pub fn failing() -> Self {
        Self {
            reply: None,
            hang: false,
            calls: CallCounter::default(),
        }
    }

    /// Narrator whose call never returns.
    pub fn hanging() -> Self {
        Self {
            reply: None,
            hang: true,
            calls: CallCounter::default(),
        }
    }
}

#[async_trait]
impl NarrativeGenerator for MockNarrator {
    async fn summarize(&self, _payload: &serde_json::Value) -> Result<String> {
        self.calls.hit();
        if self.hang {
            std::future::pending::<()>().await;
        }
        self.reply
            .clone()
            .ok_or_else(|| anyhow!("MockNarrator: model unavailable"))
    }
}

// ---------------------------------------------------------------------------
// Sinks
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct RecordingSink {
    pub reports: Mutex<Vec<(String, ConsolidatedReport)>>,
    pub images: Mutex<Vec<(String, String)>>,
    pub fail: bool,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn persisted(&self) -> usize {
        self.reports.lock().map(|r| r.len()).unwrap_or(0)
    }
}

#[async_trait]
impl ReportSink for RecordingSink {
    async fn persist(&self, bucket: &str, report: &ConsolidatedReport) -> Result<String> {
        if self.fail {
            bail!("RecordingSink: storage unavailable");
        }
        let location = format!("mem://{bucket}/flood_reports/{}.json", report.report_id);
        self.reports
            .lock()
            .map_err(|_| anyhow!("poisoned"))?
            .push((bucket.to_string(), report.clone()));
        Ok(location)
    }

    async fn archive_image(&self, bucket: &str, path: &Path) -> Result<String> {
        if self.fail {
            bail!("RecordingSink: storage unavailable");
        }
        let location = format!("mem://{bucket}/flood_reports/{}", path.display());
        self.images
            .lock()
            .map_err(|_| anyhow!("poisoned"))?
            .push((bucket.to_string(), path.display().to_string()));
        Ok(location)
    }
}

#[derive(Default)]
pub struct RecordingNotifier {
    pub sent: Mutex<Vec<ConsolidatedReport>>,
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, report: &ConsolidatedReport) -> Result<()> {
        self.sent
            .lock()
            .map_err(|_| anyhow!("poisoned"))?
            .push(report.clone());
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Context
// ---------------------------------------------------------------------------

/// Context with every evidence slot empty and the bundled gazetteer.
pub fn context(
    gatekeeper: Arc<MockGatekeeper>,
    knowledge_base: Arc<MockKnowledgeBase>,
    narrator: Arc<MockNarrator>,
) -> ServiceContext {
    ServiceContext::builder()
        .gatekeeper(gatekeeper)
        .knowledge_base(knowledge_base)
        .gazetteer(Arc::new(Gazetteer::bundled().expect("bundled gazetteer")))
        .narrator(narrator)
        .build()
}
