use std::path::PathBuf;
use std::time::Duration;

use crate::alignment::domain::clip_boundaries::ClipBoundaries;
use crate::alignment::domain::match_result::MatchResult;
use crate::shared::error::AlignError;

/// A query against one video.
#[derive(Clone, Debug, PartialEq)]
pub struct ClipRequest {
    pub query: String,
    pub video_id: String,
    /// Overrides the configured clip length for this request.
    pub target_length: Option<Duration>,
}

impl ClipRequest {
    pub fn new(query: impl Into<String>, video_id: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            video_id: video_id.into(),
            target_length: None,
        }
    }

    pub fn with_target_length(mut self, target_length: Duration) -> Self {
        self.target_length = Some(target_length);
        self
    }
}

/// Where a query landed and the clip cut for it.
#[derive(Clone, Debug, PartialEq)]
pub struct ClipResponse {
    pub clip: PathBuf,
    pub boundaries: ClipBoundaries,
    pub matched: MatchResult,
}

/// Outcome class reported at the service boundary.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorStatus {
    BadInput,
    NotFound,
    UpstreamFailure,
}

impl ErrorStatus {
    pub fn http_code(self) -> u16 {
        match self {
            ErrorStatus::BadInput => 400,
            ErrorStatus::NotFound => 404,
            ErrorStatus::UpstreamFailure => 502,
        }
    }
}

impl From<&AlignError> for ErrorStatus {
    fn from(err: &AlignError) -> Self {
        match err {
            AlignError::InvalidInput(_) => ErrorStatus::BadInput,
            AlignError::NoKeywordsExtracted { .. }
            | AlignError::EmptyTranscript { .. }
            | AlignError::KeywordNotFound { .. }
            | AlignError::ClipTooShort { .. } => ErrorStatus::NotFound,
            AlignError::UpstreamUnavailable { .. } | AlignError::SegmentExtractionFailed { .. } => {
                ErrorStatus::UpstreamFailure
            }
        }
    }
}
