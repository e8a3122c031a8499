use std::collections::HashMap;
use std::num::NonZeroUsize;
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use lru::LruCache;

use crate::shared::error::AlignError;
use crate::transcript::domain::transcript_index::TranscriptIndex;

type BuildResult = Result<Arc<TranscriptIndex>, AlignError>;

/// Memoizes one [`TranscriptIndex`] per video so repeated queries against the
/// same video transcribe it once.
///
/// Entries move `Absent -> Building -> Ready`, and `Ready` entries leave
/// through LRU eviction or TTL expiry. While a video is `Building`, every
/// other caller for that video blocks on the same build instead of starting
/// its own. A failed build is handed to the callers already waiting on it
/// and then forgotten, so the next call builds again.
pub struct TranscriptCache {
    state: Mutex<CacheState>,
    ttl: Option<Duration>,
}

struct CacheState {
    ready: LruCache<String, CacheEntry>,
    building: HashMap<String, Arc<BuildSlot>>,
}

struct CacheEntry {
    index: Arc<TranscriptIndex>,
    created_at: Instant,
}

/// Rendezvous point for callers waiting on an in-flight build.
struct BuildSlot {
    result: Mutex<Option<BuildResult>>,
    ready: Condvar,
}

enum Role {
    Builder(Arc<BuildSlot>),
    Waiter(Arc<BuildSlot>),
}

impl TranscriptCache {
    /// A capacity of zero is treated as one.
    pub fn new(capacity: usize, ttl: Option<Duration>) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            state: Mutex::new(CacheState {
                ready: LruCache::new(capacity),
                building: HashMap::new(),
            }),
            ttl,
        }
    }

    /// Returns the cached index for `video_id`, building it with `build` if absent.
    ///
    /// `build` runs without the cache lock held and at most once concurrently
    /// per video.
    pub fn get_or_build<F>(&self, video_id: &str, build: F) -> BuildResult
    where
        F: FnOnce() -> Result<TranscriptIndex, AlignError>,
    {
        let role = {
            let mut state = self.lock_state();

            let expired = match state.ready.get(video_id) {
                Some(entry) if !self.is_expired(entry) => {
                    log::debug!("Transcript cache hit for {video_id}");
                    return Ok(Arc::clone(&entry.index));
                }
                Some(_) => true,
                None => false,
            };
            if expired {
                log::debug!("Transcript cache entry for {video_id} expired");
                state.ready.pop(video_id);
            }

            match state.building.get(video_id) {
                Some(slot) => Role::Waiter(Arc::clone(slot)),
                None => {
                    let slot = Arc::new(BuildSlot::new());
                    state
                        .building
                        .insert(video_id.to_string(), Arc::clone(&slot));
                    Role::Builder(slot)
                }
            }
        };

        match role {
            Role::Waiter(slot) => {
                log::debug!("Waiting on in-flight transcript build for {video_id}");
                slot.wait()
            }
            Role::Builder(slot) => {
                log::debug!("Transcript cache miss for {video_id}; building");
                let mut guard = BuildGuard {
                    cache: self,
                    video_id,
                    slot,
                    finished: false,
                };
                let result = build().map(Arc::new);
                guard.finish(result.clone());
                result
            }
        }
    }

    /// Number of `Ready` entries, including expired ones not yet swept.
    pub fn len(&self) -> usize {
        self.lock_state().ready.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, video_id: &str) -> bool {
        let state = self.lock_state();
        state
            .ready
            .peek(video_id)
            .is_some_and(|entry| !self.is_expired(entry))
    }

    pub fn is_building(&self, video_id: &str) -> bool {
        self.lock_state().building.contains_key(video_id)
    }

    /// Drops the `Ready` entry for `video_id`. In-flight builds are unaffected.
    pub fn invalidate(&self, video_id: &str) -> bool {
        self.lock_state().ready.pop(video_id).is_some()
    }

    pub fn clear(&self) {
        self.lock_state().ready.clear();
    }

    fn is_expired(&self, entry: &CacheEntry) -> bool {
        self.ttl
            .is_some_and(|ttl| entry.created_at.elapsed() >= ttl)
    }

    fn lock_state(&self) -> MutexGuard<'_, CacheState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn publish(&self, video_id: &str, slot: &BuildSlot, result: BuildResult) {
        {
            let mut state = self.lock_state();
            state.building.remove(video_id);
            match &result {
                Ok(index) => {
                    let entry = CacheEntry {
                        index: Arc::clone(index),
                        created_at: Instant::now(),
                    };
                    if let Some((evicted, _)) = state.ready.push(video_id.to_string(), entry) {
                        if evicted != video_id {
                            log::debug!("Evicted transcript for {evicted}");
                        }
                    }
                }
                Err(e) => log::warn!("Transcript build for {video_id} failed: {e}"),
            }
        }
        slot.complete(result);
    }
}

impl Default for TranscriptCache {
    fn default() -> Self {
        Self::new(crate::shared::constants::DEFAULT_CACHE_CAPACITY, None)
    }
}

impl BuildSlot {
    fn new() -> Self {
        Self {
            result: Mutex::new(None),
            ready: Condvar::new(),
        }
    }

    fn complete(&self, result: BuildResult) {
        *self.result.lock().unwrap_or_else(PoisonError::into_inner) = Some(result);
        self.ready.notify_all();
    }

    fn wait(&self) -> BuildResult {
        let mut guard = self.result.lock().unwrap_or_else(PoisonError::into_inner);
        loop {
            if let Some(ref result) = *guard {
                return result.clone();
            }
            guard = self
                .ready
                .wait(guard)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }
}

/// Releases waiters even if the build closure panics.
struct BuildGuard<'a> {
    cache: &'a TranscriptCache,
    video_id: &'a str,
    slot: Arc<BuildSlot>,
    finished: bool,
}

impl BuildGuard<'_> {
    fn finish(&mut self, result: BuildResult) {
        self.finished = true;
        self.cache.publish(self.video_id, &self.slot, result);
    }
}

impl Drop for BuildGuard<'_> {
    fn drop(&mut self) {
        if !self.finished {
            self.cache.publish(
                self.video_id,
                &self.slot,
                Err(AlignError::UpstreamUnavailable {
                    video_id: self.video_id.to_string(),
                    reason: "transcript build aborted".to_string(),
                }),
            );
        }
    }
}
