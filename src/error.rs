//! Error taxonomy for content resolution.
//!
//! Classification and fetch errors abort the whole resolution — no partial
//! descriptors are ever returned. Per-item failures (a single caption track,
//! the tag fetch) are degraded at the call site instead of surfacing here.

use thiserror::Error;

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, ResolveError>;

/// All failure modes of the resolution engine.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// Non-success platform response code, original message preserved verbatim.
    #[error("upstream error {code}: {message}")]
    Upstream { code: i64, message: String },

    /// Content blocked for the caller's region (detected from the upstream message).
    #[error("geographic restriction: {0}")]
    GeographicRestriction(String),

    /// Gated content: empty or explicitly paid manifest.
    #[error("paid content: {0}")]
    PaidContent(String),

    /// Live room exists but the broadcast has not started.
    #[error("live not started: {0}")]
    NotStarted(String),

    /// Requested episode or part is absent from the fetched listing.
    #[error("not found: {0}")]
    NotFound(String),

    /// Pagination cursor URL is missing its page parameter or it is non-numeric.
    #[error("malformed cursor: {0}")]
    MalformedCursor(String),

    /// Raw timed-caption payload could not be parsed or serialized.
    #[error("subtitle format: {0}")]
    SubtitleFormat(String),

    /// Upstream payload did not decode into the expected shape.
    #[error("parse error: {0}")]
    Parse(String),

    /// Transport failure propagated from the fetch collaborator.
    #[error("transport error: {0}")]
    Transport(String),

    /// Content exists but no playable representation is available.
    #[error("content unavailable: {0}")]
    Unavailable(String),
}

impl From<serde_json::Error> for ResolveError {
    fn from(e: serde_json::Error) -> Self {
        ResolveError::Parse(e.to_string())
    }
}

impl From<reqwest::Error> for ResolveError {
    fn from(e: reqwest::Error) -> Self {
        ResolveError::Transport(e.to_string())
    }
}

/// Map a non-success platform response onto the taxonomy.
///
/// Geographic restriction and payment gating are only distinguishable by
/// substring inspection of the platform's own message, so the raw message is
/// kept verbatim in every branch.
pub fn upstream_error(code: i64, message: String) -> ResolveError {
    if message.contains("地区") {
        ResolveError::GeographicRestriction(message)
    } else if message.contains("付费") || message.contains("大会员") {
        ResolveError::PaidContent(message)
    } else {
        ResolveError::Upstream { code, message }
    }
}
