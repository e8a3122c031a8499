pub mod clip_request;
pub mod find_clip_use_case;
pub mod pipeline_logger;
