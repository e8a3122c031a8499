use std::time::Duration;

use super::constants::{DEFAULT_CACHE_CAPACITY, DEFAULT_MIN_CLIP_LENGTH, DEFAULT_TARGET_LENGTH};

/// Tunables for a [`FindClipUseCase`](crate::pipeline::find_clip_use_case::FindClipUseCase).
#[derive(Clone, Debug, PartialEq)]
pub struct AlignmentConfig {
    pub target_length: Duration,
    pub min_clip_length: Duration,
    pub cache_capacity: usize,
    /// Entries older than this are rebuilt on next access. `None` keeps them until evicted.
    pub cache_ttl: Option<Duration>,
}

impl AlignmentConfig {
    pub fn with_target_length(mut self, target_length: Duration) -> Self {
        self.target_length = target_length;
        self
    }

    pub fn with_min_clip_length(mut self, min_clip_length: Duration) -> Self {
        self.min_clip_length = min_clip_length;
        self
    }

    pub fn with_cache_capacity(mut self, capacity: usize) -> Self {
        self.cache_capacity = capacity;
        self
    }

    pub fn with_cache_ttl(mut self, ttl: Option<Duration>) -> Self {
        self.cache_ttl = ttl;
        self
    }
}

impl Default for AlignmentConfig {
    fn default() -> Self {
        Self {
            target_length: DEFAULT_TARGET_LENGTH,
            min_clip_length: DEFAULT_MIN_CLIP_LENGTH,
            cache_capacity: DEFAULT_CACHE_CAPACITY,
            cache_ttl: None,
        }
    }
}
