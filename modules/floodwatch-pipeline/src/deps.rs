//! Long-lived service handles shared by every pipeline run.

use std::sync::Arc;
use std::time::Duration;

use typed_builder::TypedBuilder;

use floodwatch_common::config::{
    DEFAULT_MODEL_TIMEOUT_SECS, DEFAULT_REPORT_BUCKET, DEFAULT_RISK_FEATURES,
};

use crate::evidence::{
    EvidenceFanOut, RiskCollector, SocialCollector, WarningCollector, WeatherCollector,
    DEFAULT_TIMEOUT,
};
use crate::location::Gazetteer;
use crate::scoring::ScoringEngine;
use crate::traits::{
    GatekeeperModel, LocationKnowledgeBase, NarrativeGenerator, Notifier, ReportSink, RiskModel,
    SocialSearch, WarningSource, WeatherSource,
};

/// Constructed once at startup and passed to every run. Read-only; each
/// handle is safe for concurrent use. Unset evidence sources are reported
/// as `skipped`; unset sinks are not dispatched to.
#[derive(Clone, TypedBuilder)]
pub struct ServiceContext {
    pub gatekeeper: Arc<dyn GatekeeperModel>,
    pub knowledge_base: Arc<dyn LocationKnowledgeBase>,
    pub gazetteer: Arc<Gazetteer>,
    pub narrator: Arc<dyn NarrativeGenerator>,

    #[builder(default, setter(strip_option))]
    pub social: Option<Arc<dyn SocialSearch>>,
    #[builder(default, setter(strip_option))]
    pub weather: Option<Arc<dyn WeatherSource>>,
    #[builder(default, setter(strip_option))]
    pub warnings: Option<Arc<dyn WarningSource>>,
    #[builder(default, setter(strip_option))]
    pub risk_model: Option<Arc<dyn RiskModel>>,

    #[builder(default, setter(strip_option))]
    pub sink: Option<Arc<dyn ReportSink>>,
    #[builder(default, setter(strip_option))]
    pub notifier: Option<Arc<dyn Notifier>>,

    #[builder(default)]
    pub scoring: ScoringEngine,
    #[builder(default = DEFAULT_TIMEOUT)]
    pub evidence_timeout: Duration,
    /// Bound on each gatekeeper, knowledge-base and narrative call.
    #[builder(default = Duration::from_secs(DEFAULT_MODEL_TIMEOUT_SECS))]
    pub model_timeout: Duration,
    #[builder(default = DEFAULT_RISK_FEATURES.to_vec())]
    pub risk_features: Vec<f64>,
    #[builder(default = DEFAULT_REPORT_BUCKET.to_string(), setter(into))]
    pub default_bucket: String,
}

impl ServiceContext {
    /// Evidence fan-out over whichever sources are configured.
    pub fn fan_out(&self) -> EvidenceFanOut {
        let mut fan_out = EvidenceFanOut::new(self.evidence_timeout);
        if let Some(search) = &self.social {
            fan_out = fan_out.with(Arc::new(SocialCollector::new(search.clone())));
        }
        if let Some(source) = &self.weather {
            fan_out = fan_out.with(Arc::new(WeatherCollector::new(source.clone())));
        }
        if let Some(source) = &self.warnings {
            fan_out = fan_out.with(Arc::new(WarningCollector::new(source.clone())));
        }
        if let Some(model) = &self.risk_model {
            let collector = RiskCollector::new(model.clone(), self.risk_features.clone());
            fan_out = fan_out.with(Arc::new(collector));
        }
        fan_out
    }
}
