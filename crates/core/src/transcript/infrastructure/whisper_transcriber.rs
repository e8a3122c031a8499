use std::path::{Path, PathBuf};

use whisper_rs::{FullParams, SamplingStrategy, WhisperContext, WhisperContextParameters};

use crate::media::domain::audio_reader::AudioReader;
use crate::media::domain::audio_segment::AudioSegment;
use crate::shared::constants::WHISPER_SAMPLE_RATE;
use crate::shared::error::CollaboratorError;
use crate::transcript::domain::transcriber::{Transcriber, Transcription};
use crate::transcript::domain::transcript_token::TranscriptToken;

/// Transcribes a video file with whisper.cpp via whisper-rs.
///
/// `video_id` is the path of the video; its audio track is decoded by the
/// injected [`AudioReader`] and recognized with token-level timestamps.
pub struct WhisperTranscriber {
    model_path: PathBuf,
    audio_reader: Box<dyn AudioReader>,
    language: Option<String>,
}

impl WhisperTranscriber {
    pub fn new(
        model_path: &Path,
        audio_reader: Box<dyn AudioReader>,
    ) -> Result<Self, CollaboratorError> {
        if !model_path.exists() {
            return Err(format!("Whisper model not found at: {}", model_path.display()).into());
        }
        Ok(Self {
            model_path: model_path.to_path_buf(),
            audio_reader,
            language: Some("en".to_string()),
        })
    }

    /// Spoken language hint; `None` lets Whisper auto-detect.
    pub fn with_language(mut self, language: Option<String>) -> Self {
        self.language = language;
        self
    }

    pub fn model_path(&self) -> &Path {
        &self.model_path
    }

    fn recognize(&self, audio: &AudioSegment) -> Result<Vec<TranscriptToken>, CollaboratorError> {
        let ctx = WhisperContext::new_with_params(
            self.model_path.to_str().ok_or("Invalid model path")?,
            WhisperContextParameters::default(),
        )
        .map_err(|e| format!("Failed to load Whisper model: {e}"))?;

        let mut state = ctx
            .create_state()
            .map_err(|e| format!("Failed to create Whisper state: {e}"))?;

        let mut params = FullParams::new(SamplingStrategy::Greedy { best_of: 0 });
        params.set_language(self.language.as_deref());
        params.set_translate(false);
        params.set_token_timestamps(true);
        params.set_print_special(false);
        params.set_print_progress(false);
        params.set_print_realtime(false);
        params.set_print_timestamps(false);
        params.set_n_threads(num_cpus().min(4) as i32);

        state
            .full(params, audio.samples())
            .map_err(|e| format!("Whisper inference failed: {e}"))?;

        let mut tokens = Vec::new();
        for seg_idx in 0..state.full_n_segments() {
            let Some(segment) = state.get_segment(seg_idx) else {
                continue;
            };
            let mut pieces = Vec::new();
            for tok_idx in 0..segment.n_tokens() {
                let Some(token) = segment.get_token(tok_idx) else {
                    continue;
                };
                let Ok(text) = token.to_str() else {
                    continue;
                };
                // Token timestamps are in centiseconds.
                let data = token.token_data();
                pieces.push(WordPiece {
                    text: text.to_string(),
                    start: data.t0 as f64 / 100.0,
                    end: data.t1 as f64 / 100.0,
                });
            }
            tokens.extend(join_word_pieces(&pieces));
        }
        Ok(tokens)
    }
}

/// A sub-word token as Whisper emits it, leading space included.
struct WordPiece {
    text: String,
    start: f64,
    end: f64,
}

/// Glues sub-word pieces back into words.
///
/// A piece that starts with whitespace opens a new word; any other piece
/// continues the current one. Special tokens (`[_BEG_]`, `<|en|>`, ...)
/// close the current word and are dropped. A word spans from the start of
/// its first piece to the end of its last.
fn join_word_pieces(pieces: &[WordPiece]) -> Vec<TranscriptToken> {
    let mut words = Vec::new();
    let mut current: Option<(String, f64, f64)> = None;

    for piece in pieces {
        let trimmed = piece.text.trim();
        if trimmed.is_empty() || is_special(trimmed) {
            words.extend(current.take());
            continue;
        }
        let starts_word = piece.text.starts_with(char::is_whitespace);
        if !starts_word {
            if let Some((text, _, end)) = current.as_mut() {
                text.push_str(trimmed);
                *end = piece.end;
                continue;
            }
        }
        words.extend(current.take());
        current = Some((trimmed.to_string(), piece.start, piece.end));
    }
    words.extend(current);

    words
        .into_iter()
        .map(|(text, start, end)| TranscriptToken::from_secs(text, start, end))
        .collect()
}

fn is_special(text: &str) -> bool {
    text.starts_with('[') || text.starts_with('<')
}

impl Transcriber for WhisperTranscriber {
    fn transcribe(&self, video_id: &str) -> Result<Transcription, CollaboratorError> {
        let audio = self
            .audio_reader
            .read_audio(Path::new(video_id), WHISPER_SAMPLE_RATE)?
            .ok_or_else(|| format!("{video_id} has no audio track"))?;
        log::info!(
            "Transcribing {video_id} ({:.1}s of audio)",
            audio.duration().as_secs_f64()
        );

        let tokens = self.recognize(&audio)?;
        log::info!("Recognized {} tokens in {video_id}", tokens.len());

        Ok(Transcription {
            tokens,
            video_duration: Some(audio.duration()),
        })
    }
}

fn num_cpus() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}
