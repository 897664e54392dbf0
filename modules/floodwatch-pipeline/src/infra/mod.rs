//! Concrete adapters for the capability traits, and wiring from `Config`.

pub mod claude;
pub mod datagov;
pub mod file_sink;
pub mod risk;
pub mod sms;
pub mod social;

use std::sync::Arc;

use anyhow::Result;
use tracing::{info, warn};

use ai_client::Claude;
use datagov_client::DataGovClient;
use floodwatch_common::Config;
use twilio::{TwilioOptions, TwilioService};
use xsearch_client::XSearchClient;

use crate::deps::ServiceContext;
use crate::location::Gazetteer;
use crate::scoring::{EscalationPolicy, ScoreWeights, ScoringEngine};

pub use claude::{ClaudeGatekeeper, ClaudeKnowledgeBase, ClaudeNarrator};
pub use file_sink::FileReportSink;
pub use risk::HttpRiskModel;
pub use sms::SmsNotifier;
pub use social::XSocialSearch;

/// Build every long-lived handle once. Sources without credentials are
/// left unset and will report `skipped`.
///
/// Place names from the live forecast feed are added to the reference
/// corpus. If the feed is down the static corpus is used alone.
pub async fn build_context(config: &Config) -> Result<ServiceContext> {
    let http = reqwest::Client::builder()
        .timeout(config.evidence_timeout)
        .build()?;
    let model_http = reqwest::Client::builder()
        .timeout(config.model_timeout)
        .build()?;

    let datagov = Arc::new(DataGovClient::with_http_client(
        http.clone(),
        &config.datagov_base_url,
    ));

    let mut gazetteer = match &config.gazetteer_path {
        Some(path) => Gazetteer::from_path(path)?,
        None => Gazetteer::bundled()?,
    };
    match datagov.weather_forecast().await {
        Ok(forecast) => {
            let added = gazetteer.extend(Gazetteer::from_forecast_entries(&forecast)?);
            info!(added, "Forecast locations added to reference corpus");
        }
        Err(e) => warn!(error = %e, "Forecast feed unavailable, using static corpus only"),
    }
    let gazetteer = Arc::new(gazetteer);
    info!(entries = gazetteer.len(), "Reference corpus loaded");

    let gatekeeper_model = Claude::new(&config.anthropic_api_key, &config.gatekeeper_model)
        .with_http_client(model_http.clone());
    let narrative_model = Claude::new(&config.anthropic_api_key, &config.narrative_model)
        .with_http_client(model_http)
        .with_max_tokens(600);
    let knowledge_base = ClaudeKnowledgeBase::new(gatekeeper_model.clone(), &gazetteer.names());

    let scoring = ScoringEngine::new(
        ScoreWeights::default(),
        EscalationPolicy::with_order(config.escalation_order.clone()),
    );

    let mut ctx = ServiceContext::builder()
        .gatekeeper(Arc::new(ClaudeGatekeeper::new(gatekeeper_model)))
        .knowledge_base(Arc::new(knowledge_base))
        .gazetteer(gazetteer)
        .narrator(Arc::new(ClaudeNarrator::new(narrative_model)))
        .scoring(scoring)
        .evidence_timeout(config.evidence_timeout)
        .model_timeout(config.model_timeout)
        .risk_features(config.risk_model_features.clone())
        .default_bucket(config.report_bucket.clone())
        .sink(Arc::new(FileReportSink::new(config.report_store_dir.clone())))
        .build();

    ctx.weather = Some(datagov.clone());
    ctx.warnings = Some(datagov);

    if let Some(token) = &config.x_bearer_token {
        let client = XSearchClient::new(token.clone()).with_http_client(http.clone());
        ctx.social = Some(Arc::new(XSocialSearch::new(client, config.social_max_results)));
    }

    if let Some(url) = &config.risk_model_url {
        ctx.risk_model = Some(Arc::new(HttpRiskModel::with_http_client(
            http.clone(),
            url.clone(),
            config.risk_model_token.clone(),
        )));
    }

    if let Some(sms) = &config.sms {
        let twilio = TwilioService::new(TwilioOptions {
            account_sid: sms.account_sid.clone(),
            auth_token: sms.auth_token.clone(),
            from_number: sms.from_number.clone(),
        });
        ctx.notifier = Some(Arc::new(SmsNotifier::new(twilio, sms.recipients.clone())));
    }

    Ok(ctx)
}
