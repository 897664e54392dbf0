use thiserror::Error;

pub type Result<T> = std::result::Result<T, XSearchError>;

#[derive(Debug, Error)]
pub enum XSearchError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Invalid query: {0}")]
    InvalidQuery(String),
}

impl From<reqwest::Error> for XSearchError {
    fn from(err: reqwest::Error) -> Self {
        XSearchError::Network(err.to_string())
    }
}

impl From<serde_json::Error> for XSearchError {
    fn from(err: serde_json::Error) -> Self {
        XSearchError::Parse(err.to_string())
    }
}
