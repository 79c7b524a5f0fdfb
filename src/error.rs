//! Error taxonomy for both acquisition modes.
//!
//! Per-attempt failures ([`FetchError`], [`StallReason`]) are recovered
//! inside the engine.  Only a [`FeedError`] ever reaches the user.

use thiserror::Error;

/// Why a single image-mode attempt failed.  Every variant is retryable.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("request timed out")]
    Timeout,

    #[error("transport error: {0}")]
    Transport(String),

    #[error("upstream returned HTTP {0}")]
    Upstream(u16),

    #[error("rate limited by upstream (HTTP 429)")]
    RateLimited,

    #[error("service unavailable (HTTP 503)")]
    ServiceUnavailable,

    #[error("upstream returned no images")]
    EmptyResult,

    #[error("malformed payload: {0}")]
    Malformed(String),
}

impl FetchError {
    /// Classify a non-2xx HTTP status.
    pub fn from_status(status: u16) -> Self {
        match status {
            503 => FetchError::ServiceUnavailable,
            429 => FetchError::RateLimited,
            other => FetchError::Upstream(other),
        }
    }
}

/// Why the stream sequencer gave up on the current source.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StallReason {
    #[error("player error (code {0})")]
    PlayerError(i32),

    #[error("stream ended")]
    Ended,

    #[error("stream did not start")]
    Unstarted,

    #[error("no playback for {0} s")]
    Stalled(u64),

    #[error("no streams configured")]
    NoSources,
}

/// Terminal failure surfaced to the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FeedError {
    #[error("could not load the Earth image: {0}")]
    AcquisitionExhausted(FetchError),

    #[error("{reason}; all fallback streams were tried")]
    SourceExhausted { reason: StallReason },
}
