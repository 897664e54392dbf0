use anyhow::Result;
use async_trait::async_trait;

use xsearch_client::XSearchClient;

use crate::traits::{SocialPage, SocialSearch};

/// X recent search, one page per query.
pub struct XSocialSearch {
    client: XSearchClient,
    max_results: u32,
}

impl XSocialSearch {
    pub fn new(client: XSearchClient, max_results: u32) -> Self {
        Self {
            client,
            max_results,
        }
    }
}

#[async_trait]
impl SocialSearch for XSocialSearch {
    async fn search(&self, query: &str) -> Result<SocialPage> {
        let response = self.client.search_recent(query, self.max_results).await?;
        let posts = response
            .data
            .iter()
            .map(serde_json::to_value)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(SocialPage {
            result_count: response.meta.result_count,
            posts,
        })
    }
}
