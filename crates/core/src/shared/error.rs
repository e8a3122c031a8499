use std::time::Duration;

use thiserror::Error;

/// Every way a query can fail to become a clip.
///
/// Each kind maps to exactly one reported outcome; see
/// [`ErrorStatus`](crate::pipeline::clip_request::ErrorStatus).
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AlignError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("no keywords could be extracted from query {query:?}")]
    NoKeywordsExtracted { query: String },

    #[error("transcript for {video_id} has no tokens and no known duration")]
    EmptyTranscript { video_id: String },

    #[error("upstream collaborator unavailable for {video_id}: {reason}")]
    UpstreamUnavailable { video_id: String, reason: String },

    #[error("none of the keywords [{}] occur in the transcript", keywords.join(", "))]
    KeywordNotFound { keywords: Vec<String> },

    #[error(
        "clip from {:.2}s is only {:.2}s long (minimum {:.2}s)",
        offset.as_secs_f64(),
        length.as_secs_f64(),
        minimum.as_secs_f64()
    )]
    ClipTooShort {
        offset: Duration,
        length: Duration,
        minimum: Duration,
    },

    #[error("segment extraction failed for {video_id}: {reason}")]
    SegmentExtractionFailed { video_id: String, reason: String },
}

/// Boxed error returned across collaborator seams.
pub type CollaboratorError = Box<dyn std::error::Error + Send + Sync>;
