use serde::Serialize;

/// Every failure the engine reports.
///
/// A failed iteration inside a benchmark is never surfaced through this type;
/// it is counted in its [`Stat`](crate::engine::Stat) instead.
#[derive(Debug, thiserror::Error)]
pub enum FtabError {
    /// Building the HTTP client failed.
    #[error("http client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Serde(#[from] serde_json::Error),

    /// The http file (or another named input) could not be opened.
    #[error("open {path} failed: {source}")]
    Open {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Transport-level failure of one case's round trip.
    #[error("request {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The server answered, but not with the expected success code.
    #[error("request {method} {url} returned status {status}, expected {expected}")]
    UnexpectedStatus {
        method: String,
        url: String,
        status: u16,
        expected: u16,
    },

    #[error("invalid configuration: {0}")]
    Validation(String),

    #[error("engine error: {0}")]
    Engine(String),
}

/// Errors cross serialization boundaries as their display string.
impl Serialize for FtabError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}
