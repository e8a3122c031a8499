use std::time::Duration;

use super::clip_boundaries::ClipBoundaries;
use crate::shared::constants::DEFAULT_MIN_CLIP_LENGTH;
use crate::shared::error::AlignError;

/// Turns a matched offset into clip boundaries.
///
/// The clip always starts at the offset (clamped into the video) and runs
/// forward for up to `target_length`. When the video ends first the clip is
/// cut short rather than shifted backwards.
#[derive(Clone, Debug, PartialEq)]
pub struct ClipBoundaryResolver {
    min_clip_length: Duration,
}

impl ClipBoundaryResolver {
    pub fn new(min_clip_length: Duration) -> Self {
        Self { min_clip_length }
    }

    pub fn min_clip_length(&self) -> Duration {
        self.min_clip_length
    }

    pub fn resolve(
        &self,
        offset: Duration,
        video_duration: Duration,
        target_length: Duration,
    ) -> Result<ClipBoundaries, AlignError> {
        let start = offset.min(video_duration);
        let end = start.saturating_add(target_length).min(video_duration);
        let length = end - start;

        let too_short = AlignError::ClipTooShort {
            offset,
            length,
            minimum: self.min_clip_length,
        };
        if length < self.min_clip_length {
            return Err(too_short);
        }
        ClipBoundaries::new(start, end, video_duration).ok_or(too_short)
    }
}

impl Default for ClipBoundaryResolver {
    fn default() -> Self {
        Self::new(DEFAULT_MIN_CLIP_LENGTH)
    }
}
