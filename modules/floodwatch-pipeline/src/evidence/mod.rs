//! Best-effort evidence fan-out.
//!
//! Four collectors run concurrently, each under its own timeout and panic
//! guard. The join waits for all of them; whatever a collector does, it
//! comes back as exactly one `EvidenceResult`.

pub mod risk;
pub mod social;
pub mod warning;
pub mod weather;

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use futures::FutureExt;
use tokio::time::Instant;
use tracing::{debug, warn};

use floodwatch_common::{EvidencePayload, EvidenceResult, EvidenceSource, LocationCandidateSet};

pub use risk::RiskCollector;
pub use social::{build_query, SocialCollector};
pub use warning::{match_stations, WarningCollector};
pub use weather::{match_forecast, WeatherCollector};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

#[async_trait]
pub trait EvidenceCollector: Send + Sync {
    fn source(&self) -> EvidenceSource;

    async fn collect(&self, candidates: &LocationCandidateSet) -> Result<EvidencePayload>;
}

/// Run one collector behind its boundary: errors, panics and timeouts all
/// become `status = error`.
pub async fn query(
    collector: &dyn EvidenceCollector,
    candidates: &LocationCandidateSet,
    timeout: Duration,
) -> EvidenceResult {
    let source = collector.source();
    let started = Instant::now();
    let guarded = AssertUnwindSafe(collector.collect(candidates)).catch_unwind();
    let outcome = tokio::time::timeout(timeout, guarded).await;
    let elapsed_ms = started.elapsed().as_millis() as u64;

    match outcome {
        Ok(Ok(Ok(payload))) => {
            debug!(source = %source, elapsed_ms, "Evidence collected");
            EvidenceResult::success(source, payload, elapsed_ms)
        }
        Ok(Ok(Err(e))) => {
            warn!(source = %source, error = %e, "Evidence collector failed");
            EvidenceResult::error(source, format!("{e:#}"), elapsed_ms)
        }
        Ok(Err(panic)) => {
            let message = panic_message(panic.as_ref());
            warn!(source = %source, panic = message.as_str(), "Evidence collector panicked");
            EvidenceResult::error(source, format!("collector panicked: {message}"), elapsed_ms)
        }
        Err(_) => {
            warn!(
                source = %source,
                timeout_ms = timeout.as_millis() as u64,
                "Evidence collector timed out"
            );
            EvidenceResult::error(
                source,
                format!("timed out after {}ms", timeout.as_millis()),
                elapsed_ms,
            )
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// The four collector slots. An empty slot reports `skipped`.
#[derive(Clone)]
pub struct EvidenceFanOut {
    social: Option<Arc<dyn EvidenceCollector>>,
    weather: Option<Arc<dyn EvidenceCollector>>,
    warning: Option<Arc<dyn EvidenceCollector>>,
    risk: Option<Arc<dyn EvidenceCollector>>,
    timeout: Duration,
}

impl EvidenceFanOut {
    pub fn new(timeout: Duration) -> Self {
        Self {
            social: None,
            weather: None,
            warning: None,
            risk: None,
            timeout,
        }
    }

    /// Place a collector in the slot for its source.
    pub fn with(mut self, collector: Arc<dyn EvidenceCollector>) -> Self {
        let slot = match collector.source() {
            EvidenceSource::Social => &mut self.social,
            EvidenceSource::Weather => &mut self.weather,
            EvidenceSource::Warning => &mut self.warning,
            EvidenceSource::RiskModel => &mut self.risk,
        };
        *slot = Some(collector);
        self
    }

    /// Query every slot concurrently and wait for all four. Results come
    /// back in `EvidenceSource::ALL` order.
    pub async fn gather(&self, candidates: &LocationCandidateSet) -> Vec<EvidenceResult> {
        let (social, weather, warning, risk) = tokio::join!(
            self.run_slot(EvidenceSource::Social, &self.social, candidates),
            self.run_slot(EvidenceSource::Weather, &self.weather, candidates),
            self.run_slot(EvidenceSource::Warning, &self.warning, candidates),
            self.run_slot(EvidenceSource::RiskModel, &self.risk, candidates),
        );
        vec![social, weather, warning, risk]
    }

    async fn run_slot(
        &self,
        source: EvidenceSource,
        slot: &Option<Arc<dyn EvidenceCollector>>,
        candidates: &LocationCandidateSet,
    ) -> EvidenceResult {
        match slot {
            Some(collector) => query(collector.as_ref(), candidates, self.timeout).await,
            None => EvidenceResult::skipped(source, "source not configured"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use floodwatch_common::{EvidenceStatus, RiskAssessment};

    struct Fixed(f64);

    #[async_trait]
    impl EvidenceCollector for Fixed {
        fn source(&self) -> EvidenceSource {
            EvidenceSource::RiskModel
        }

        async fn collect(&self, _: &LocationCandidateSet) -> Result<EvidencePayload> {
            Ok(EvidencePayload::RiskModel(RiskAssessment::from_probability(self.0)))
        }
    }

    struct Panics;

    #[async_trait]
    impl EvidenceCollector for Panics {
        fn source(&self) -> EvidenceSource {
            EvidenceSource::Weather
        }

        async fn collect(&self, _: &LocationCandidateSet) -> Result<EvidencePayload> {
            panic!("forecast feed changed shape")
        }
    }

    fn klang() -> LocationCandidateSet {
        LocationCandidateSet::new(vec!["Klang".into(), "Selangor".into()])
    }

    #[tokio::test]
    async fn empty_slots_are_skipped_in_fixed_order() {
        let fan_out = EvidenceFanOut::new(DEFAULT_TIMEOUT).with(Arc::new(Fixed(0.8)));
        let results = fan_out.gather(&klang()).await;

        let sources: Vec<_> = results.iter().map(|r| r.source).collect();
        assert_eq!(sources, EvidenceSource::ALL.to_vec());
        assert_eq!(results[0].status, EvidenceStatus::Skipped);
        assert_eq!(results[3].status, EvidenceStatus::Success);
    }

    #[tokio::test]
    async fn panic_is_contained() {
        let result = query(&Panics, &klang(), DEFAULT_TIMEOUT).await;
        assert_eq!(result.status, EvidenceStatus::Error);
        assert!(result.error.unwrap().contains("forecast feed changed shape"));
    }
}
