use super::keyword::Keyword;
use super::match_result::{MatchPass, MatchResult};
use crate::transcript::domain::transcript_index::TranscriptIndex;

/// Finds where in a transcript the highest-priority keyword is first spoken.
///
/// Two passes run in order: exact token-text equality for every keyword,
/// then substring containment in either direction for every keyword. Within
/// a pass keywords are tried by rank and tokens in transcript order, so the
/// earliest occurrence of the best-ranked keyword wins.
pub struct KeywordLocator;

impl KeywordLocator {
    /// Returns `None` when no keyword matches under either pass, or when
    /// `keywords` holds nothing but empty terms.
    pub fn locate(index: &TranscriptIndex, keywords: &[Keyword]) -> Option<MatchResult> {
        let mut ordered: Vec<&Keyword> = keywords.iter().filter(|k| !k.is_empty()).collect();
        if ordered.is_empty() || index.is_empty() {
            return None;
        }
        ordered.sort_by_key(|k| k.rank());

        let token_texts = index.normalized_texts();

        let exact = |keyword: &str, token: &str| token == keyword;
        let contains = |keyword: &str, token: &str| {
            !token.is_empty() && (token.contains(keyword) || keyword.contains(token))
        };

        let found = Self::scan(&ordered, token_texts, exact)
            .map(|hit| (hit, MatchPass::Exact))
            .or_else(|| {
                Self::scan(&ordered, token_texts, contains).map(|hit| (hit, MatchPass::Substring))
            });

        let ((keyword, token_index), pass) = found?;
        let token = index.token_at(token_index)?;
        log::debug!(
            "Keyword {:?} matched token {:?} at {:.2}s ({pass:?})",
            keyword.text(),
            token.text,
            token.start.as_secs_f64()
        );
        Some(MatchResult {
            token_index,
            keyword: keyword.clone(),
            offset: token.start,
            pass,
        })
    }

    fn scan<'k, F>(
        keywords: &[&'k Keyword],
        token_texts: &[String],
        matches: F,
    ) -> Option<(&'k Keyword, usize)>
    where
        F: Fn(&str, &str) -> bool,
    {
        keywords.iter().find_map(|keyword| {
            token_texts
                .iter()
                .position(|token| matches(keyword.text(), token))
                .map(|i| (*keyword, i))
        })
    }
}
