pub mod transcriber;
pub mod transcript_index;
pub mod transcript_token;
