use std::time::Duration;

/// A non-empty `[start, end)` interval inside a video.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ClipBoundaries {
    start: Duration,
    end: Duration,
}

impl ClipBoundaries {
    /// Returns `None` unless `start < end <= video_duration`.
    pub fn new(start: Duration, end: Duration, video_duration: Duration) -> Option<Self> {
        (start < end && end <= video_duration).then_some(Self { start, end })
    }

    pub fn start(&self) -> Duration {
        self.start
    }

    pub fn end(&self) -> Duration {
        self.end
    }

    pub fn length(&self) -> Duration {
        self.end - self.start
    }
}
