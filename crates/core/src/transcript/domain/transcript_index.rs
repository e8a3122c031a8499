use std::time::Duration;

use super::transcript_token::TranscriptToken;
use crate::alignment::domain::keyword::normalize;
use crate::shared::error::AlignError;

/// Time-ordered, immutable view of one video's transcript.
///
/// Built once per video (usually through the
/// [`TranscriptCache`](crate::transcript::infrastructure::transcript_cache::TranscriptCache))
/// and shared read-only between queries.
#[derive(Clone, Debug, PartialEq)]
pub struct TranscriptIndex {
    tokens: Vec<TranscriptToken>,
    /// `normalize`d token texts, parallel to `tokens`.
    normalized: Vec<String>,
    duration: Duration,
}

impl TranscriptIndex {
    /// Builds an index from tokens in any order.
    ///
    /// Tokens are sorted by `start` (stable, so equal starts keep their
    /// recognizer order) and any token whose `end` precedes its `start` is
    /// collapsed to zero length. The total duration is the larger of the
    /// latest token end and `video_duration`.
    pub fn build(
        video_id: &str,
        tokens: &[TranscriptToken],
        video_duration: Option<Duration>,
    ) -> Result<Self, AlignError> {
        let mut tokens: Vec<TranscriptToken> = tokens
            .iter()
            .map(|t| TranscriptToken {
                text: t.text.clone(),
                start: t.start,
                end: t.end.max(t.start),
            })
            .collect();

        if !tokens.windows(2).all(|w| w[0].start <= w[1].start) {
            log::debug!("Transcript for {video_id} arrived out of order; sorting by start");
            tokens.sort_by_key(|t| t.start);
        }

        let tokens_end = tokens.iter().map(|t| t.end).max();
        let duration = match (tokens_end, video_duration) {
            (Some(end), Some(supplied)) => end.max(supplied),
            (Some(end), None) => end,
            (None, Some(supplied)) if !supplied.is_zero() => supplied,
            _ => {
                return Err(AlignError::EmptyTranscript {
                    video_id: video_id.to_string(),
                })
            }
        };

        let normalized = tokens.iter().map(|t| normalize(&t.text)).collect();
        Ok(Self {
            tokens,
            normalized,
            duration,
        })
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    pub fn tokens(&self) -> &[TranscriptToken] {
        &self.tokens
    }

    /// Case-folded token texts in the same order as [`tokens`](Self::tokens).
    pub fn normalized_texts(&self) -> &[String] {
        &self.normalized
    }

    pub fn token_at(&self, index: usize) -> Option<&TranscriptToken> {
        self.tokens.get(index)
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// The token being spoken at `t`, if any.
    pub fn token_covering(&self, t: Duration) -> Option<&TranscriptToken> {
        let after = self.tokens.partition_point(|tok| tok.start <= t);
        let candidate = self.tokens[..after].last()?;
        (t < candidate.end).then_some(candidate)
    }
}
