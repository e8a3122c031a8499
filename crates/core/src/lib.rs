pub mod alignment;
pub mod media;
pub mod pipeline;
pub mod shared;
pub mod transcript;
