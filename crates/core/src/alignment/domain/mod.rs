pub mod clip_boundaries;
pub mod clip_boundary_resolver;
pub mod keyword;
pub mod keyword_extractor;
pub mod keyword_locator;
pub mod match_result;
