use std::time::Duration;

pub const WHISPER_MODEL_NAME: &str = "ggml-base.en.bin";
pub const WHISPER_MODEL_URL: &str =
    "https://huggingface.co/ggerganov/whisper.cpp/resolve/main/ggml-base.en.bin";
pub const WHISPER_SAMPLE_RATE: u32 = 16000;

/// Clip length used when the caller does not ask for one.
pub const DEFAULT_TARGET_LENGTH: Duration = Duration::from_secs(60);

/// Shortest clip worth handing to the media extractor.
pub const DEFAULT_MIN_CLIP_LENGTH: Duration = Duration::from_secs(1);

pub const DEFAULT_CACHE_CAPACITY: usize = 32;

pub const VIDEO_EXTENSIONS: &[&str] = &["mp4", "mkv", "mov", "webm", "avi", "m4v"];
