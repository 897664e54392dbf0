use std::sync::Arc;

use anyhow::{ensure, Result};
use async_trait::async_trait;

use floodwatch_common::{EvidencePayload, EvidenceSource, LocationCandidateSet, RiskAssessment};

use super::EvidenceCollector;
use crate::traits::RiskModel;

/// Scores a fixed feature vector. Candidates don't feed the features yet.
pub struct RiskCollector {
    model: Arc<dyn RiskModel>,
    features: Vec<f64>,
}

impl RiskCollector {
    pub fn new(model: Arc<dyn RiskModel>, features: Vec<f64>) -> Self {
        Self { model, features }
    }
}

#[async_trait]
impl EvidenceCollector for RiskCollector {
    fn source(&self) -> EvidenceSource {
        EvidenceSource::RiskModel
    }

    async fn collect(&self, _candidates: &LocationCandidateSet) -> Result<EvidencePayload> {
        let probability = self.model.predict(&self.features).await?;
        ensure!(
            probability.is_finite() && (0.0..=1.0).contains(&probability),
            "risk model returned probability {probability} outside [0, 1]"
        );
        Ok(EvidencePayload::RiskModel(RiskAssessment::from_probability(probability)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{Behavior, MockRiskModel};
    use floodwatch_common::RiskLabel;

    fn collector(behavior: Behavior<f64>) -> RiskCollector {
        RiskCollector::new(Arc::new(MockRiskModel::new(behavior)), vec![0.0; 12])
    }

    #[tokio::test]
    async fn labels_probability() {
        let payload = collector(Behavior::Return(0.8))
            .collect(&LocationCandidateSet::default())
            .await
            .unwrap();
        match payload {
            EvidencePayload::RiskModel(risk) => {
                assert_eq!(risk.label, RiskLabel::High);
                assert_eq!(risk.probability, 0.8);
            }
            other => panic!("unexpected payload {other:?}"),
        }
    }

    #[tokio::test]
    async fn out_of_range_probability_is_an_error() {
        for bad in [1.5, -0.1, f64::NAN] {
            let err = collector(Behavior::Return(bad))
                .collect(&LocationCandidateSet::default())
                .await
                .unwrap_err();
            assert!(err.to_string().contains("outside [0, 1]"));
        }
    }
}
