use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::traits::RiskModel;

#[derive(Serialize)]
struct PredictRequest<'a> {
    inputs: &'a [f64],
}

#[derive(Deserialize)]
struct PredictResponse {
    prediction: Vec<Vec<f64>>,
}

/// Inference endpoint taking `{"inputs": [...]}` and answering
/// `{"prediction": [[p]]}`.
pub struct HttpRiskModel {
    http: reqwest::Client,
    url: String,
    token: Option<String>,
}

impl HttpRiskModel {
    pub fn with_http_client(
        http: reqwest::Client,
        url: impl Into<String>,
        token: Option<String>,
    ) -> Self {
        Self {
            http,
            url: url.into(),
            token,
        }
    }
}

/// First value of the first row.
fn first_probability(body: &str) -> Result<f64> {
    let parsed: PredictResponse =
        serde_json::from_str(body).context("unexpected risk model response")?;
    parsed
        .prediction
        .first()
        .and_then(|row| row.first())
        .copied()
        .ok_or_else(|| anyhow!("risk model returned an empty prediction"))
}

#[async_trait]
impl RiskModel for HttpRiskModel {
    async fn predict(&self, features: &[f64]) -> Result<f64> {
        let mut request = self.http.post(&self.url).json(&PredictRequest { inputs: features });
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let resp = request.send().await?;
        let status = resp.status();
        let body = resp.text().await?;
        if !status.is_success() {
            bail!("risk model endpoint returned {}: {}", status.as_u16(), body);
        }
        first_probability(&body)
    }
}
