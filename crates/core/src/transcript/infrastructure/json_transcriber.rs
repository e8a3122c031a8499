use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::shared::error::CollaboratorError;
use crate::transcript::domain::transcriber::{Transcriber, Transcription};
use crate::transcript::domain::transcript_token::TranscriptToken;

#[derive(Debug, Deserialize)]
struct TranscriptFile {
    #[serde(default)]
    duration: Option<f64>,
    #[serde(default)]
    tokens: Vec<TokenRecord>,
}

#[derive(Debug, Deserialize)]
struct TokenRecord {
    text: String,
    start: f64,
    end: f64,
}

/// Reads pre-computed transcripts from `<dir>/<video_id>.json`.
///
/// The file holds timings in seconds:
///
/// ```json
/// { "duration": 120.0, "tokens": [{ "text": "grit", "start": 10.0, "end": 11.0 }] }
/// ```
#[derive(Debug, Clone)]
pub struct JsonTranscriber {
    dir: PathBuf,
}

impl JsonTranscriber {
    pub fn new(dir: &Path) -> Self {
        Self {
            dir: dir.to_path_buf(),
        }
    }

    /// Location of the transcript for `video_id`. Only the file stem of
    /// `video_id` is used, so a full video path maps to `<dir>/<stem>.json`.
    pub fn transcript_path(&self, video_id: &str) -> PathBuf {
        let stem = Path::new(video_id)
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| video_id.to_string());
        self.dir.join(format!("{stem}.json"))
    }

    pub fn parse(content: &str) -> Result<Transcription, CollaboratorError> {
        let file: TranscriptFile = serde_json::from_str(content)?;
        let video_duration = file
            .duration
            .map(|secs| seconds("duration", secs))
            .transpose()?;
        let tokens = file
            .tokens
            .into_iter()
            .map(|t| {
                let start = seconds("token start", t.start)?;
                let end = seconds("token end", t.end)?;
                Ok(TranscriptToken::new(t.text, start, end))
            })
            .collect::<Result<Vec<_>, CollaboratorError>>()?;
        Ok(Transcription {
            tokens,
            video_duration,
        })
    }
}

/// Rejects negative, NaN and out-of-range seconds.
fn seconds(field: &str, value: f64) -> Result<Duration, CollaboratorError> {
    Duration::try_from_secs_f64(value)
        .map_err(|e| format!("invalid transcript {field} {value}: {e}").into())
}

impl Transcriber for JsonTranscriber {
    fn transcribe(&self, video_id: &str) -> Result<Transcription, CollaboratorError> {
        let path = self.transcript_path(video_id);
        let content = fs::read_to_string(&path)
            .map_err(|e| format!("failed to read transcript {}: {e}", path.display()))?;
        let transcription = Self::parse(&content)?;
        log::debug!(
            "Loaded {} tokens for {video_id} from {}",
            transcription.tokens.len(),
            path.display()
        );
        Ok(transcription)
    }
}
