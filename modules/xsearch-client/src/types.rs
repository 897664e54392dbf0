use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A post returned by recent search with the requested `tweet.fields`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tweet {
    pub id: String,
    pub text: String,
    #[serde(default)]
    pub author_id: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub lang: Option<String>,
    #[serde(default)]
    pub geo: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchMeta {
    #[serde(default)]
    pub result_count: u32,
    #[serde(default)]
    pub newest_id: Option<String>,
    #[serde(default)]
    pub oldest_id: Option<String>,
    #[serde(default)]
    pub next_token: Option<String>,
}

/// Recent search response. `data` is absent (not empty) when nothing matched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub data: Vec<Tweet>,
    #[serde(default)]
    pub meta: SearchMeta,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub includes: Option<serde_json::Value>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_result_has_no_data_key() {
        let resp: SearchResponse =
            serde_json::from_value(serde_json::json!({"meta": {"result_count": 0}})).unwrap();
        assert!(resp.data.is_empty());
        assert_eq!(resp.meta.result_count, 0);
    }

    #[test]
    fn parses_tweets_and_meta() {
        let resp: SearchResponse = serde_json::from_value(serde_json::json!({
            "data": [
                {"id": "1", "text": "Banjir di Klang", "lang": "in",
                 "created_at": "2025-01-03T02:10:00.000Z"},
                {"id": "2", "text": "Flood near Jalan Meru"}
            ],
            "meta": {"result_count": 2, "newest_id": "2", "oldest_id": "1"}
        }))
        .unwrap();
        assert_eq!(resp.data.len(), 2);
        assert_eq!(resp.meta.result_count, 2);
        assert!(resp.data[0].created_at.is_some());
    }
}
