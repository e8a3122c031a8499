use super::keyword::Keyword;
use crate::shared::error::CollaboratorError;

/// Domain interface for turning a free-text query into ranked keywords.
///
/// Returning an empty list is a valid answer, not an error.
pub trait KeywordExtractor: Send + Sync {
    fn extract(&self, query: &str) -> Result<Vec<Keyword>, CollaboratorError>;
}
