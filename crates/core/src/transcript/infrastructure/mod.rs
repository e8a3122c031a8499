pub mod json_transcriber;
pub mod transcript_cache;
pub mod whisper_transcriber;
