use std::sync::Arc;

use anyhow::{bail, Result};
use async_trait::async_trait;

use floodwatch_common::{EvidencePayload, EvidenceSource, LocationCandidateSet, SocialEvidence};

use super::EvidenceCollector;
use crate::traits::SocialSearch;

const KEYWORDS: &str = r#"(banjir OR flood OR 水灾 OR "natural disaster")"#;
const COUNTRY: &str = "Malaysia";

/// Recent-search query for the most specific candidate. Retweets excluded.
pub fn build_query(candidates: &LocationCandidateSet) -> Option<String> {
    let place = candidates.most_specific()?.trim();
    if place.is_empty() {
        return None;
    }
    let place = if place.contains(char::is_whitespace) {
        format!("\"{}\"", place.replace('"', ""))
    } else {
        place.to_string()
    };
    Some(format!("{KEYWORDS} ({place} OR {COUNTRY}) -is:retweet"))
}

pub struct SocialCollector {
    search: Arc<dyn SocialSearch>,
}

impl SocialCollector {
    pub fn new(search: Arc<dyn SocialSearch>) -> Self {
        Self { search }
    }
}

#[async_trait]
impl EvidenceCollector for SocialCollector {
    fn source(&self) -> EvidenceSource {
        EvidenceSource::Social
    }

    async fn collect(&self, candidates: &LocationCandidateSet) -> Result<EvidencePayload> {
        let Some(query) = build_query(candidates) else {
            bail!("no candidate location to search for");
        };
        let page = self.search.search(&query).await?;
        Ok(EvidencePayload::Social(SocialEvidence {
            query,
            result_count: page.result_count,
            posts: page.posts,
        }))
    }
}
