pub mod gazetteer;

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use floodwatch_common::{LocationClassification, LocationFields, ResolutionSource};

use crate::traits::LocationKnowledgeBase;
pub use gazetteer::{Gazetteer, GazetteerEntry};

/// Expands a free-text place into ranked candidates.
///
/// The knowledge base is asked first; when it errors, times out or yields no
/// usable field, the static corpus is consulted. Nothing resolving is not an error,
/// just an empty candidate set.
pub struct LocationResolver {
    knowledge_base: Arc<dyn LocationKnowledgeBase>,
    gazetteer: Arc<Gazetteer>,
    timeout: Duration,
}

impl LocationResolver {
    pub fn new(
        knowledge_base: Arc<dyn LocationKnowledgeBase>,
        gazetteer: Arc<Gazetteer>,
        timeout: Duration,
    ) -> Self {
        Self {
            knowledge_base,
            gazetteer,
            timeout,
        }
    }

    pub async fn resolve(&self, text: &str) -> LocationClassification {
        let text = text.trim();
        if text.is_empty() {
            return LocationClassification::default();
        }

        match tokio::time::timeout(self.timeout, self.knowledge_base.lookup(text)).await {
            Ok(Ok(Some(fields))) if !fields.is_empty() => {
                return classified(fields, ResolutionSource::KnowledgeBase);
            }
            Ok(Ok(_)) => {
                debug!(location = text, "Knowledge base had no match, trying reference corpus")
            }
            Ok(Err(e)) => warn!(
                location = text,
                error = %e,
                "Knowledge base lookup failed, trying reference corpus"
            ),
            Err(_) => warn!(
                location = text,
                timeout_ms = self.timeout.as_millis() as u64,
                "Knowledge base lookup timed out, trying reference corpus"
            ),
        }

        match self.gazetteer.lookup(text) {
            Some(fields) if !fields.is_empty() => {
                classified(fields, ResolutionSource::ReferenceCorpus)
            }
            _ => {
                debug!(location = text, "Location unresolved");
                LocationClassification::default()
            }
        }
    }
}

fn classified(fields: LocationFields, resolved_by: ResolutionSource) -> LocationClassification {
    LocationClassification {
        ordered_locations: fields.ordered_candidates(),
        fields,
        resolved_by,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{fields, MockKnowledgeBase};

    fn resolver(kb: MockKnowledgeBase) -> LocationResolver {
        LocationResolver::new(
            Arc::new(kb),
            Arc::new(Gazetteer::bundled().unwrap()),
            Duration::from_secs(30),
        )
    }

    #[tokio::test]
    async fn knowledge_base_answer_wins() {
        let kb = MockKnowledgeBase::new()
            .on("Klang", fields(Some("Klang"), None, Some("Selangor")));
        let resolved = resolver(kb).resolve("Klang").await;
        assert_eq!(resolved.resolved_by, ResolutionSource::KnowledgeBase);
        assert_eq!(resolved.ordered_locations.as_slice(), &["Klang", "Selangor"]);
    }

    #[tokio::test(start_paused = true)]
    async fn stalled_knowledge_base_falls_back_to_corpus() {
        let resolved = resolver(MockKnowledgeBase::hanging()).resolve("Shah Alam").await;
        assert_eq!(resolved.resolved_by, ResolutionSource::ReferenceCorpus);
        assert_eq!(resolved.ordered_locations.most_specific(), Some("Shah Alam"));
    }

    #[tokio::test]
    async fn blank_text_skips_both_references() {
        let kb = MockKnowledgeBase::new();
        let resolved = resolver(kb).resolve("  ").await;
        assert_eq!(resolved, LocationClassification::default());
    }
}
