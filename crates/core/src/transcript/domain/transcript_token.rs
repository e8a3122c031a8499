use std::time::Duration;

/// One recognized word or phrase and when it was spoken.
#[derive(Clone, Debug, PartialEq)]
pub struct TranscriptToken {
    pub text: String,
    pub start: Duration,
    pub end: Duration,
}

impl TranscriptToken {
    pub fn new(text: impl Into<String>, start: Duration, end: Duration) -> Self {
        Self {
            text: text.into(),
            start,
            end,
        }
    }

    /// Convenience constructor for second-based timings (transcribers and JSON files).
    ///
    /// Negative or NaN seconds are treated as zero; values too large for a
    /// `Duration` saturate to `Duration::MAX`.
    pub fn from_secs(text: impl Into<String>, start: f64, end: f64) -> Self {
        Self::new(text, secs(start), secs(end))
    }

    pub fn duration(&self) -> Duration {
        self.end.saturating_sub(self.start)
    }
}

fn secs(value: f64) -> Duration {
    if value.is_nan() || value <= 0.0 {
        Duration::ZERO
    } else {
        Duration::try_from_secs_f64(value).unwrap_or(Duration::MAX)
    }
}
