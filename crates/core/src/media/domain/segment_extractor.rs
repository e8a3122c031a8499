use std::path::PathBuf;

use crate::alignment::domain::clip_boundaries::ClipBoundaries;
use crate::shared::error::CollaboratorError;

/// Domain interface for cutting `[start, end)` out of a video.
///
/// Only ever called with boundaries that already passed resolution, so a
/// failure here is an I/O or codec problem, never an alignment one.
pub trait SegmentExtractor: Send + Sync {
    /// Returns the location of the produced clip.
    fn extract_segment(
        &self,
        video_id: &str,
        boundaries: &ClipBoundaries,
    ) -> Result<PathBuf, CollaboratorError>;
}
