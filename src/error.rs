//! Error types for image generation and color extraction.

use std::time::Duration;

/// Longest error body kept from an API response.
const MAX_ERROR_MESSAGE_LEN: usize = 500;

/// Errors that can occur while generating or decoding images.
#[derive(Debug, thiserror::Error)]
pub enum VibranceError {
    /// API key missing or rejected.
    #[error("authentication failed: {0}")]
    Auth(String),

    /// API returned an error response.
    #[error("API error: {status} - {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Sanitized response body.
        message: String,
    },

    /// Rate limit exceeded.
    #[error("rate limited, retry after {retry_after:?}")]
    RateLimited {
        /// Delay suggested by the server.
        retry_after: Option<Duration>,
    },

    /// Operation timed out.
    #[error("operation timed out after {0:?}")]
    Timeout(Duration),

    /// Invalid request parameters.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Network or HTTP error.
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Data could not be interpreted (unknown format, bad payload).
    #[error("failed to decode: {0}")]
    Decode(String),

    /// Image decoding or resampling failed.
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    /// I/O error (e.g., saving or reading a file).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl VibranceError {
    /// Returns true if this error is likely transient and worth retrying.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::RateLimited { .. } | Self::Timeout(_) | Self::Network(_)
        )
    }

    /// Returns the suggested retry delay, if available.
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            Self::RateLimited { retry_after } => *retry_after,
            Self::Timeout(_) => Some(Duration::from_secs(1)),
            Self::Network(_) => Some(Duration::from_secs(2)),
            _ => None,
        }
    }
}

/// Result type alias for this crate.
pub type Result<T> = std::result::Result<T, VibranceError>;

/// Reads a `Retry-After` header expressed in whole seconds.
pub(crate) fn parse_retry_after(headers: &reqwest::header::HeaderMap) -> Option<u64> {
    headers
        .get(reqwest::header::RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse()
        .ok()
}

/// Collapses whitespace and truncates an API error body for display.
pub(crate) fn sanitize_error_message(text: &str) -> String {
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.is_empty() {
        return "empty response body".into();
    }
    if collapsed.chars().count() <= MAX_ERROR_MESSAGE_LEN {
        return collapsed;
    }
    let mut truncated: String = collapsed.chars().take(MAX_ERROR_MESSAGE_LEN).collect();
    truncated.push('…');
    truncated
}
