use std::path::Path;

use super::audio_segment::AudioSegment;
use crate::shared::error::CollaboratorError;

/// Domain interface for decoding the audio track of a video file.
pub trait AudioReader: Send + Sync {
    /// Decode the audio track to mono PCM at the given sample rate.
    /// Returns None if the video has no audio track.
    fn read_audio(
        &self,
        path: &Path,
        target_sample_rate: u32,
    ) -> Result<Option<AudioSegment>, CollaboratorError>;
}
