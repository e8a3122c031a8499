use std::time::Duration;

use super::keyword::Keyword;

/// Which comparison produced a match.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MatchPass {
    Exact,
    Substring,
}

/// The transcript occurrence a query resolved to.
#[derive(Clone, Debug, PartialEq)]
pub struct MatchResult {
    pub token_index: usize,
    pub keyword: Keyword,
    /// Start time of the matched token.
    pub offset: Duration,
    pub pass: MatchPass,
}
