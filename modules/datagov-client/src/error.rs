use thiserror::Error;

pub type Result<T> = std::result::Result<T, DataGovError>;

#[derive(Debug, Error)]
pub enum DataGovError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Parse error: {0}")]
    Parse(String),
}

impl From<reqwest::Error> for DataGovError {
    fn from(err: reqwest::Error) -> Self {
        DataGovError::Network(err.to_string())
    }
}

impl From<serde_json::Error> for DataGovError {
    fn from(err: serde_json::Error) -> Self {
        DataGovError::Parse(err.to_string())
    }
}
