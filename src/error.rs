// Error types for small-talk.
// Covers upstream fetch failures, secret store failures, configuration and parsing errors.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SmallTalkError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{service} returned HTTP {status}")]
    Upstream { service: &'static str, status: u16 },

    #[error("Secret store error: {0}")]
    SecretStore(String),

    #[error("Invalid cache credential: {0}")]
    Credential(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("No coordinates found for {0}")]
    NoCoordinates(String),

    #[error("Invalid event: {0}")]
    InvalidEvent(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

impl SmallTalkError {
    /// Whether this error came from talking to an upstream data source
    /// (transport failure or a non-success status).
    pub fn is_upstream(&self) -> bool {
        matches!(self, SmallTalkError::Http(_) | SmallTalkError::Upstream { .. })
    }
}

pub type Result<T> = std::result::Result<T, SmallTalkError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upstream_classification() {
        let upstream = SmallTalkError::Upstream {
            service: "Hacker News",
            status: 503,
        };
        assert!(upstream.is_upstream());
        assert_eq!(upstream.to_string(), "Hacker News returned HTTP 503");

        assert!(!SmallTalkError::Parse("bad row".into()).is_upstream());
        assert!(!SmallTalkError::NoCoordinates("Atlantis".into()).is_upstream());
    }
}
