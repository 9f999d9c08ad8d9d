use thiserror::Error;

pub type Result<T = ()> = std::result::Result<T, ReportError>;

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("invalid ISO 8601 timestamp '{value}': {source}")]
    InvalidTimestamp {
        value: String,
        #[source]
        source: chrono::ParseError,
    },
    #[error("report start ({start}) is later than report end ({end})")]
    InvertedWindow { start: String, end: String },
    #[error("transaction {hash} has an out-of-range time: {seconds}")]
    InvalidTransactionTime { hash: String, seconds: i64 },
    #[error("hosts configuration error: {0}")]
    HostsConfig(String),
    #[error("explorer request failed: {0}")]
    Explorer(#[from] reqwest::Error),
    #[error("invalid explorer url: {0}")]
    Url(#[from] url::ParseError),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl ReportError {
    /// Upstream HTTP status, when the failure came from the explorer
    pub fn status(&self) -> Option<reqwest::StatusCode> {
        match self {
            Self::Explorer(err) => err.status(),
            _ => None,
        }
    }
}
