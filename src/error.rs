//! Feed error taxonomy
//!
//! Every variant is recoverable. The frame loop never sees these: `step`
//! degrades to a no-op instead of failing.

use thiserror::Error;

/// Errors surfaced to collaborators driving the feed
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FeedError {
    /// `reinitialize` was handed zero items; the engine is left not ready.
    #[error("cannot initialize feed from an empty sequence")]
    EmptySequence,

    /// A query or mutation arrived before a successful `reinitialize`.
    #[error("feed is not initialized")]
    NotInitialized,

    /// Tuning could not be read or parsed.
    #[error("config error: {0}")]
    Config(String),
}

pub type FeedResult<T> = Result<T, FeedError>;
