//! Error type shared by the API adapters and the orchestrator.
//!
//! Configuration problems never surface here: the loaders in [`crate::config`]
//! fall back to defaults instead. Everything below is an upstream or wiring
//! failure that the caller logs and degrades around.

use crate::utils::truncate_for_log;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BotError {
    /// Transport-level failure (DNS, TLS, timeout, body decoding).
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid url: {0}")]
    Url(#[from] url::ParseError),

    /// The remote answered with a non-success status.
    #[error("api returned {status}: {body}")]
    Api { status: u16, body: String },

    #[error("not found: {0}")]
    NotFound(String),

    #[error("not authenticated")]
    NotAuthenticated,

    /// A component is missing because its credentials were absent or rejected.
    #[error("not configured: {0}")]
    NotConfigured(String),
}

impl BotError {
    /// Turn a non-success response into [`BotError::Api`], keeping the start of the body for the log.
    pub async fn from_response(response: reqwest::Response) -> Self {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        BotError::Api {
            status,
            body: truncate_for_log(&body, 500),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_display() {
        let e = BotError::Api {
            status: 403,
            body: "quotaExceeded".to_string(),
        };
        assert_eq!(e.to_string(), "api returned 403: quotaExceeded");
    }

    #[test]
    fn test_url_error_converts() {
        let parsed: Result<url::Url, BotError> = url::Url::parse("not a url").map_err(Into::into);
        assert!(matches!(parsed, Err(BotError::Url(_))));
    }
}
