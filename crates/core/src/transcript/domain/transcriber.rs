use std::time::Duration;

use super::transcript_token::TranscriptToken;
use crate::shared::error::CollaboratorError;

/// What a transcription service hands back for one video.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Transcription {
    pub tokens: Vec<TranscriptToken>,
    /// Length of the media, when the service knows it.
    pub video_duration: Option<Duration>,
}

/// Domain interface for speech-to-text transcription of a whole video.
///
/// Implementations may block on network or inference; callers go through
/// the transcript cache so each video is transcribed at most once at a time.
pub trait Transcriber: Send + Sync {
    fn transcribe(&self, video_id: &str) -> Result<Transcription, CollaboratorError>;
}
