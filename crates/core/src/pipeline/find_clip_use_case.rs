use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use crate::alignment::domain::clip_boundaries::ClipBoundaries;
use crate::alignment::domain::clip_boundary_resolver::ClipBoundaryResolver;
use crate::alignment::domain::keyword::Keyword;
use crate::alignment::domain::keyword_extractor::KeywordExtractor;
use crate::alignment::domain::keyword_locator::KeywordLocator;
use crate::alignment::domain::match_result::MatchResult;
use crate::media::domain::segment_extractor::SegmentExtractor;
use crate::shared::config::AlignmentConfig;
use crate::shared::error::AlignError;
use crate::transcript::domain::transcriber::Transcriber;
use crate::transcript::domain::transcript_index::TranscriptIndex;
use crate::transcript::infrastructure::transcript_cache::TranscriptCache;

use super::clip_request::{ClipRequest, ClipResponse};
use super::pipeline_logger::{NullPipelineLogger, PipelineLogger};

/// Turns a query against a video into a cut clip.
///
/// Keywords come from the extractor, the transcript index from the shared
/// cache (built through the transcriber on a miss), and the clip from the
/// segment extractor once the boundaries are known. Every failure surfaces
/// as one [`AlignError`] kind; nothing is retried here.
///
/// `execute` takes `&self`, so one instance can serve concurrent requests.
pub struct FindClipUseCase {
    extractor: Box<dyn KeywordExtractor>,
    transcriber: Box<dyn Transcriber>,
    segments: Box<dyn SegmentExtractor>,
    cache: Arc<TranscriptCache>,
    resolver: ClipBoundaryResolver,
    target_length: Duration,
    logger: Mutex<Box<dyn PipelineLogger>>,
}

impl FindClipUseCase {
    pub fn new(
        extractor: Box<dyn KeywordExtractor>,
        transcriber: Box<dyn Transcriber>,
        segments: Box<dyn SegmentExtractor>,
        config: &AlignmentConfig,
    ) -> Self {
        Self {
            extractor,
            transcriber,
            segments,
            cache: Arc::new(TranscriptCache::new(
                config.cache_capacity,
                config.cache_ttl,
            )),
            resolver: ClipBoundaryResolver::new(config.min_clip_length),
            target_length: config.target_length,
            logger: Mutex::new(Box::new(NullPipelineLogger)),
        }
    }

    /// Shares an existing cache, e.g. between use cases with different extractors.
    pub fn with_cache(mut self, cache: Arc<TranscriptCache>) -> Self {
        self.cache = cache;
        self
    }

    pub fn with_logger(mut self, logger: Box<dyn PipelineLogger>) -> Self {
        self.logger = Mutex::new(logger);
        self
    }

    pub fn cache(&self) -> &Arc<TranscriptCache> {
        &self.cache
    }

    /// Runs every step up to the boundaries without cutting the clip.
    pub fn align(&self, request: &ClipRequest) -> Result<(ClipBoundaries, MatchResult), AlignError> {
        let target_length = self.validate(request)?;
        let video_id = request.video_id.as_str();

        let keywords = self.extract_keywords(request)?;
        let index = self.transcript_index(video_id)?;
        self.metric("token_count", index.len() as f64);

        let matched = self
            .timed("locate", || KeywordLocator::locate(&index, &keywords))
            .ok_or_else(|| AlignError::KeywordNotFound {
                keywords: keywords.iter().map(|k| k.text().to_string()).collect(),
            })?;

        let boundaries = self.timed("resolve", || {
            self.resolver
                .resolve(matched.offset, index.duration(), target_length)
        })?;
        log::info!(
            "Query {:?} on {video_id} -> {:.2}s..{:.2}s (keyword {:?})",
            request.query,
            boundaries.start().as_secs_f64(),
            boundaries.end().as_secs_f64(),
            matched.keyword.text()
        );

        Ok((boundaries, matched))
    }

    pub fn execute(&self, request: &ClipRequest) -> Result<ClipResponse, AlignError> {
        let (boundaries, matched) = self.align(request)?;

        let clip = self
            .timed("extract_segment", || {
                self.segments.extract_segment(&request.video_id, &boundaries)
            })
            .map_err(|e| AlignError::SegmentExtractionFailed {
                video_id: request.video_id.clone(),
                reason: e.to_string(),
            })?;

        self.info(&format!("Clip written to {}", clip.display()));
        Ok(ClipResponse {
            clip,
            boundaries,
            matched,
        })
    }

    pub fn summary(&self) {
        self.lock_logger().summary();
    }

    fn validate(&self, request: &ClipRequest) -> Result<Duration, AlignError> {
        if request.query.trim().is_empty() {
            return Err(AlignError::InvalidInput("query is empty".into()));
        }
        if request.video_id.trim().is_empty() {
            return Err(AlignError::InvalidInput("video reference is empty".into()));
        }
        let target_length = request.target_length.unwrap_or(self.target_length);
        if target_length.is_zero() {
            return Err(AlignError::InvalidInput(
                "target length must be positive".into(),
            ));
        }
        Ok(target_length)
    }

    fn extract_keywords(&self, request: &ClipRequest) -> Result<Vec<Keyword>, AlignError> {
        let keywords: Vec<Keyword> = self
            .timed("extract_keywords", || self.extractor.extract(&request.query))
            .map_err(|e| AlignError::UpstreamUnavailable {
                video_id: request.video_id.clone(),
                reason: format!("keyword extraction failed: {e}"),
            })?
            .into_iter()
            .filter(|k| !k.is_empty())
            .collect();

        self.metric("keyword_count", keywords.len() as f64);
        if keywords.is_empty() {
            return Err(AlignError::NoKeywordsExtracted {
                query: request.query.clone(),
            });
        }
        log::debug!(
            "Keywords for {:?}: {:?}",
            request.query,
            keywords.iter().map(Keyword::text).collect::<Vec<_>>()
        );
        Ok(keywords)
    }

    fn transcript_index(&self, video_id: &str) -> Result<Arc<TranscriptIndex>, AlignError> {
        self.cache.get_or_build(video_id, || {
            let transcription = self
                .timed("transcribe", || self.transcriber.transcribe(video_id))
                .map_err(|e| AlignError::UpstreamUnavailable {
                    video_id: video_id.to_string(),
                    reason: e.to_string(),
                })?;
            TranscriptIndex::build(
                video_id,
                &transcription.tokens,
                transcription.video_duration,
            )
        })
    }

    fn timed<T>(&self, stage: &str, f: impl FnOnce() -> T) -> T {
        let start = Instant::now();
        let result = f();
        let elapsed_ms = start.elapsed().as_secs_f64() * 1000.0;
        self.lock_logger().timing(stage, elapsed_ms);
        result
    }

    fn metric(&self, name: &str, value: f64) {
        self.lock_logger().metric(name, value);
    }

    fn info(&self, message: &str) {
        self.lock_logger().info(message);
    }

    fn lock_logger(&self) -> std::sync::MutexGuard<'_, Box<dyn PipelineLogger>> {
        self.logger.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::clip_request::ErrorStatus;
    use crate::shared::error::CollaboratorError;
    use crate::transcript::domain::transcriber::Transcription;
    use crate::transcript::domain::transcript_token::TranscriptToken;
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Barrier;
    use std::thread;

    // ─── Stubs ───

    struct StubExtractor {
        keywords: Vec<Keyword>,
        calls: Arc<AtomicUsize>,
    }

    impl KeywordExtractor for StubExtractor {
        fn extract(&self, _: &str) -> Result<Vec<Keyword>, CollaboratorError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.keywords.clone())
        }
    }

    struct FailingExtractor;

    impl KeywordExtractor for FailingExtractor {
        fn extract(&self, _: &str) -> Result<Vec<Keyword>, CollaboratorError> {
            Err("quota exceeded".into())
        }
    }

    struct StubTranscriber {
        tokens: Vec<TranscriptToken>,
        duration: Option<Duration>,
        calls: Arc<AtomicUsize>,
        fail_next: Arc<AtomicBool>,
        delay: Duration,
    }

    impl Transcriber for StubTranscriber {
        fn transcribe(&self, _: &str) -> Result<Transcription, CollaboratorError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            thread::sleep(self.delay);
            if self.fail_next.swap(false, Ordering::SeqCst) {
                return Err("speech service unavailable".into());
            }
            Ok(Transcription {
                tokens: self.tokens.clone(),
                video_duration: self.duration,
            })
        }
    }

    struct StubSegments {
        calls: Arc<Mutex<Vec<ClipBoundaries>>>,
        fail: bool,
    }

    impl SegmentExtractor for StubSegments {
        fn extract_segment(
            &self,
            video_id: &str,
            boundaries: &ClipBoundaries,
        ) -> Result<PathBuf, CollaboratorError> {
            if self.fail {
                return Err("codec not supported".into());
            }
            self.calls.lock().unwrap().push(*boundaries);
            Ok(PathBuf::from(format!(
                "/clips/{video_id}_{}.mp4",
                boundaries.start().as_secs()
            )))
        }
    }

    struct RecordingLogger {
        stages: Arc<Mutex<Vec<String>>>,
        metrics: Arc<Mutex<Vec<(String, f64)>>>,
    }

    impl PipelineLogger for RecordingLogger {
        fn timing(&mut self, stage: &str, _: f64) {
            self.stages.lock().unwrap().push(stage.to_string());
        }
        fn metric(&mut self, name: &str, value: f64) {
            self.metrics.lock().unwrap().push((name.to_string(), value));
        }
        fn info(&mut self, _: &str) {}
    }

    // ─── Harness ───

    struct Harness {
        extract_calls: Arc<AtomicUsize>,
        transcribe_calls: Arc<AtomicUsize>,
        fail_transcribe: Arc<AtomicBool>,
        segment_calls: Arc<Mutex<Vec<ClipBoundaries>>>,
    }

    fn scenario_tokens() -> Vec<TranscriptToken> {
        vec![
            TranscriptToken::from_secs("elon", 0.0, 1.0),
            TranscriptToken::from_secs("musk", 1.0, 2.0),
            TranscriptToken::from_secs("grit", 10.0, 11.0),
        ]
    }

    fn build(
        keywords: &[&str],
        tokens: Vec<TranscriptToken>,
        duration: Option<Duration>,
        config: AlignmentConfig,
    ) -> (FindClipUseCase, Harness) {
        build_with(keywords, tokens, duration, config, Duration::ZERO, false)
    }

    fn build_with(
        keywords: &[&str],
        tokens: Vec<TranscriptToken>,
        duration: Option<Duration>,
        config: AlignmentConfig,
        delay: Duration,
        segment_fail: bool,
    ) -> (FindClipUseCase, Harness) {
        let harness = Harness {
            extract_calls: Arc::new(AtomicUsize::new(0)),
            transcribe_calls: Arc::new(AtomicUsize::new(0)),
            fail_transcribe: Arc::new(AtomicBool::new(false)),
            segment_calls: Arc::new(Mutex::new(Vec::new())),
        };
        let use_case = FindClipUseCase::new(
            Box::new(StubExtractor {
                keywords: Keyword::ranked(keywords.iter().copied()),
                calls: harness.extract_calls.clone(),
            }),
            Box::new(StubTranscriber {
                tokens,
                duration,
                calls: harness.transcribe_calls.clone(),
                fail_next: harness.fail_transcribe.clone(),
                delay,
            }),
            Box::new(StubSegments {
                calls: harness.segment_calls.clone(),
                fail: segment_fail,
            }),
            &config,
        );
        (use_case, harness)
    }

    fn scenario(keywords: &[&str]) -> (FindClipUseCase, Harness) {
        build(
            keywords,
            scenario_tokens(),
            Some(Duration::from_secs(120)),
            AlignmentConfig::default(),
        )
    }

    fn secs(s: u64) -> Duration {
        Duration::from_secs(s)
    }

    // ─── Scenarios ───

    #[test]
    fn test_scenario_a_clip_starts_at_first_keyword_occurrence() {
        let (use_case, harness) = scenario(&["grit"]);

        let response = use_case
            .execute(&ClipRequest::new("show me grit", "talk.mp4"))
            .unwrap();

        assert_eq!(response.matched.offset, secs(10));
        assert_eq!(response.boundaries.start(), secs(10));
        assert_eq!(response.boundaries.end(), secs(70));
        assert_eq!(response.clip, PathBuf::from("/clips/talk.mp4_10.mp4"));
        assert_eq!(*harness.segment_calls.lock().unwrap(), vec![response.boundaries]);
    }

    #[test]
    fn test_scenario_b_unknown_keyword_is_not_found() {
        let (use_case, harness) = scenario(&["unrelatedword"]);

        let err = use_case
            .execute(&ClipRequest::new("unrelatedword", "talk.mp4"))
            .unwrap_err();

        assert_eq!(
            err,
            AlignError::KeywordNotFound {
                keywords: vec!["unrelatedword".into()]
            }
        );
        assert_eq!(ErrorStatus::from(&err), ErrorStatus::NotFound);
        assert!(harness.segment_calls.lock().unwrap().is_empty());
    }

    #[test]
    fn test_scenario_c_clip_near_end_too_short_for_minimum() {
        let config = AlignmentConfig::default().with_min_clip_length(secs(5));
        let (use_case, harness) = build(
            &["end"],
            vec![TranscriptToken::from_secs("end", 118.0, 119.0)],
            Some(secs(120)),
            config,
        );

        let err = use_case
            .execute(&ClipRequest::new("the end", "talk.mp4"))
            .unwrap_err();

        assert_eq!(
            err,
            AlignError::ClipTooShort {
                offset: secs(118),
                length: secs(2),
                minimum: secs(5),
            }
        );
        assert!(harness.segment_calls.lock().unwrap().is_empty());
    }

    #[test]
    fn test_scenario_c_clip_near_end_accepted_with_default_minimum() {
        let (use_case, _) = build(
            &["end"],
            vec![TranscriptToken::from_secs("end", 118.0, 119.0)],
            Some(secs(120)),
            AlignmentConfig::default(),
        );

        let response = use_case
            .execute(&ClipRequest::new("the end", "talk.mp4"))
            .unwrap();

        assert_eq!(response.boundaries.start(), secs(118));
        assert_eq!(response.boundaries.end(), secs(120));
    }

    #[test]
    fn test_scenario_d_no_keywords_never_transcribes() {
        let (use_case, harness) = scenario(&[]);

        let err = use_case
            .execute(&ClipRequest::new("the of and", "talk.mp4"))
            .unwrap_err();

        assert_eq!(
            err,
            AlignError::NoKeywordsExtracted {
                query: "the of and".into()
            }
        );
        assert_eq!(ErrorStatus::from(&err), ErrorStatus::NotFound);
        assert_eq!(harness.transcribe_calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_blank_keywords_count_as_none() {
        let (use_case, harness) = scenario(&["  ", "..."]);

        let err = use_case
            .execute(&ClipRequest::new("...", "talk.mp4"))
            .unwrap_err();

        assert!(matches!(err, AlignError::NoKeywordsExtracted { .. }));
        assert_eq!(harness.transcribe_calls.load(Ordering::SeqCst), 0);
    }

    // ─── Validation ───

    #[test]
    fn test_blank_query_rejected_before_any_collaborator() {
        let (use_case, harness) = scenario(&["grit"]);

        let err = use_case
            .execute(&ClipRequest::new("   ", "talk.mp4"))
            .unwrap_err();

        assert!(matches!(err, AlignError::InvalidInput(_)));
        assert_eq!(ErrorStatus::from(&err), ErrorStatus::BadInput);
        assert_eq!(harness.extract_calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_blank_video_rejected() {
        let (use_case, harness) = scenario(&["grit"]);

        let err = use_case.execute(&ClipRequest::new("grit", "")).unwrap_err();

        assert!(matches!(err, AlignError::InvalidInput(_)));
        assert_eq!(harness.extract_calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_zero_target_length_rejected() {
        let (use_case, _) = scenario(&["grit"]);

        let request = ClipRequest::new("grit", "talk.mp4").with_target_length(Duration::ZERO);
        let err = use_case.execute(&request).unwrap_err();

        assert!(matches!(err, AlignError::InvalidInput(_)));
    }

    #[test]
    fn test_request_target_length_overrides_config() {
        let (use_case, _) = scenario(&["grit"]);

        let request = ClipRequest::new("grit", "talk.mp4").with_target_length(secs(15));
        let (boundaries, _) = use_case.align(&request).unwrap();

        assert_eq!(boundaries.start(), secs(10));
        assert_eq!(boundaries.end(), secs(25));
    }

    // ─── Collaborator failures ───

    #[test]
    fn test_extractor_failure_is_upstream_failure() {
        let use_case = FindClipUseCase::new(
            Box::new(FailingExtractor),
            Box::new(StubTranscriber {
                tokens: scenario_tokens(),
                duration: None,
                calls: Arc::new(AtomicUsize::new(0)),
                fail_next: Arc::new(AtomicBool::new(false)),
                delay: Duration::ZERO,
            }),
            Box::new(StubSegments {
                calls: Arc::new(Mutex::new(Vec::new())),
                fail: false,
            }),
            &AlignmentConfig::default(),
        );

        let err = use_case
            .execute(&ClipRequest::new("grit", "talk.mp4"))
            .unwrap_err();

        assert_eq!(ErrorStatus::from(&err), ErrorStatus::UpstreamFailure);
        assert!(err.to_string().contains("quota exceeded"), "got: {err}");
    }

    #[test]
    fn test_transcription_failure_is_not_cached() {
        let (use_case, harness) = scenario(&["grit"]);
        harness.fail_transcribe.store(true, Ordering::SeqCst);
        let request = ClipRequest::new("grit", "talk.mp4");

        let err = use_case.execute(&request).unwrap_err();
        assert!(matches!(err, AlignError::UpstreamUnavailable { .. }));
        assert_eq!(ErrorStatus::from(&err), ErrorStatus::UpstreamFailure);
        assert!(!use_case.cache().contains("talk.mp4"));

        let response = use_case.execute(&request).unwrap();
        assert_eq!(response.matched.offset, secs(10));
        assert_eq!(harness.transcribe_calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_segment_failure_is_distinct_from_alignment() {
        let (use_case, _) = build_with(
            &["grit"],
            scenario_tokens(),
            Some(secs(120)),
            AlignmentConfig::default(),
            Duration::ZERO,
            true,
        );

        let err = use_case
            .execute(&ClipRequest::new("grit", "talk.mp4"))
            .unwrap_err();

        assert_eq!(
            err,
            AlignError::SegmentExtractionFailed {
                video_id: "talk.mp4".into(),
                reason: "codec not supported".into(),
            }
        );
        // Alignment itself succeeded and is still available without cutting.
        assert!(use_case.align(&ClipRequest::new("grit", "talk.mp4")).is_ok());
    }

    #[test]
    fn test_empty_transcript_without_duration() {
        let (use_case, _) = build(&["grit"], Vec::new(), None, AlignmentConfig::default());

        let err = use_case
            .execute(&ClipRequest::new("grit", "silent.mp4"))
            .unwrap_err();

        assert_eq!(
            err,
            AlignError::EmptyTranscript {
                video_id: "silent.mp4".into()
            }
        );
    }

    #[test]
    fn test_empty_transcript_with_duration_is_keyword_not_found() {
        let (use_case, _) = build(&["grit"], Vec::new(), Some(secs(30)), AlignmentConfig::default());

        let err = use_case
            .execute(&ClipRequest::new("grit", "silent.mp4"))
            .unwrap_err();

        assert!(matches!(err, AlignError::KeywordNotFound { .. }));
    }

    // ─── Cache ───

    #[test]
    fn test_repeated_queries_transcribe_once() {
        let (use_case, harness) = scenario(&["grit", "musk"]);

        for query in ["grit", "musk", "elon grit"] {
            use_case
                .execute(&ClipRequest::new(query, "talk.mp4"))
                .unwrap();
        }

        assert_eq!(harness.transcribe_calls.load(Ordering::SeqCst), 1);
        assert!(use_case.cache().contains("talk.mp4"));
    }

    #[test]
    fn test_concurrent_requests_share_one_transcription() {
        let (use_case, harness) = build_with(
            &["grit"],
            scenario_tokens(),
            Some(secs(120)),
            AlignmentConfig::default(),
            Duration::from_millis(50),
            false,
        );
        let threads = 8;
        let barrier = Barrier::new(threads);

        let results: Vec<_> = thread::scope(|s| {
            let handles: Vec<_> = (0..threads)
                .map(|_| {
                    s.spawn(|| {
                        barrier.wait();
                        use_case.execute(&ClipRequest::new("grit", "talk.mp4"))
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        assert_eq!(harness.transcribe_calls.load(Ordering::SeqCst), 1);
        for result in results {
            assert_eq!(result.unwrap().boundaries.start(), secs(10));
        }
    }

    #[test]
    fn test_shared_cache_across_use_cases() {
        let (first, first_harness) = scenario(&["grit"]);
        let (second, second_harness) = scenario(&["musk"]);
        let second = second.with_cache(Arc::clone(first.cache()));

        first.execute(&ClipRequest::new("grit", "talk.mp4")).unwrap();
        let response = second.execute(&ClipRequest::new("musk", "talk.mp4")).unwrap();

        assert_eq!(response.matched.offset, secs(1));
        assert_eq!(first_harness.transcribe_calls.load(Ordering::SeqCst), 1);
        assert_eq!(second_harness.transcribe_calls.load(Ordering::SeqCst), 0);
    }

    // ─── Logging ───

    #[test]
    fn test_logger_receives_stage_timings_and_metrics() {
        let stages = Arc::new(Mutex::new(Vec::new()));
        let metrics = Arc::new(Mutex::new(Vec::new()));
        let (use_case, _) = scenario(&["grit", "musk"]);
        let use_case = use_case.with_logger(Box::new(RecordingLogger {
            stages: stages.clone(),
            metrics: metrics.clone(),
        }));

        use_case
            .execute(&ClipRequest::new("grit musk", "talk.mp4"))
            .unwrap();

        assert_eq!(
            *stages.lock().unwrap(),
            vec!["extract_keywords", "transcribe", "locate", "resolve", "extract_segment"]
        );
        assert_eq!(
            *metrics.lock().unwrap(),
            vec![("keyword_count".to_string(), 2.0), ("token_count".to_string(), 3.0)]
        );
    }

    #[test]
    fn test_cache_hit_skips_transcribe_timing() {
        let stages = Arc::new(Mutex::new(Vec::new()));
        let (use_case, _) = scenario(&["grit"]);
        let use_case = use_case.with_logger(Box::new(RecordingLogger {
            stages: stages.clone(),
            metrics: Arc::new(Mutex::new(Vec::new())),
        }));
        let request = ClipRequest::new("grit", "talk.mp4");

        use_case.align(&request).unwrap();
        stages.lock().unwrap().clear();
        use_case.align(&request).unwrap();

        assert_eq!(
            *stages.lock().unwrap(),
            vec!["extract_keywords", "locate", "resolve"]
        );
    }
}
