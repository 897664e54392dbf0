pub mod error;
pub mod types;

pub use error::{Result, XSearchError};
pub use types::{SearchMeta, SearchResponse, Tweet};

const BASE_URL: &str = "https://api.x.com/2";

const TWEET_FIELDS: &str = "author_id,created_at,geo,lang";
const PLACE_FIELDS: &str = "full_name,country,country_code,geo,place_type";

/// Recent search accepts 10..=100 results per page.
pub const MIN_RESULTS: u32 = 10;
pub const MAX_RESULTS: u32 = 100;

/// Maximum query length for standard recent search access.
const MAX_QUERY_LEN: usize = 512;

#[derive(Clone)]
pub struct XSearchClient {
    client: reqwest::Client,
    bearer_token: String,
    base_url: String,
}

impl XSearchClient {
    pub fn new(bearer_token: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            bearer_token,
            base_url: BASE_URL.to_string(),
        }
    }

    pub fn with_http_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Run one page of recent search. `max_results` is clamped to the API's range.
    pub async fn search_recent(&self, query: &str, max_results: u32) -> Result<SearchResponse> {
        if query.trim().is_empty() {
            return Err(XSearchError::InvalidQuery("query is empty".into()));
        }
        if query.chars().count() > MAX_QUERY_LEN {
            return Err(XSearchError::InvalidQuery(format!(
                "query exceeds {MAX_QUERY_LEN} characters"
            )));
        }

        let max_results = max_results.clamp(MIN_RESULTS, MAX_RESULTS).to_string();
        let url = format!("{}/tweets/search/recent", self.base_url);

        tracing::debug!(query, "X recent search");

        let resp = self
            .client
            .get(&url)
            .bearer_auth(&self.bearer_token)
            .query(&[
                ("query", query),
                ("max_results", max_results.as_str()),
                ("tweet.fields", TWEET_FIELDS),
                ("expansions", "geo.place_id"),
                ("place.fields", PLACE_FIELDS),
            ])
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(XSearchError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        let body = resp.text().await?;
        let parsed: SearchResponse = serde_json::from_str(&body)?;
        tracing::debug!(result_count = parsed.meta.result_count, "X recent search complete");
        Ok(parsed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn empty_query_is_rejected_without_network() {
        let client = XSearchClient::new("token".into()).with_base_url("http://127.0.0.1:9");
        let err = client.search_recent("   ", 10).await.unwrap_err();
        assert!(matches!(err, XSearchError::InvalidQuery(_)));
    }

    #[tokio::test]
    async fn overlong_query_is_rejected_without_network() {
        let client = XSearchClient::new("token".into()).with_base_url("http://127.0.0.1:9");
        let query = "banjir ".repeat(100);
        let err = client.search_recent(&query, 10).await.unwrap_err();
        assert!(matches!(err, XSearchError::InvalidQuery(_)));
    }
}
