use std::collections::HashSet;

use crate::alignment::domain::keyword::Keyword;
use crate::alignment::domain::keyword_extractor::KeywordExtractor;
use crate::shared::error::CollaboratorError;

const STOPWORDS: &[&str] = &[
    "a", "about", "after", "all", "also", "am", "an", "and", "any", "are", "as", "at", "be",
    "because", "been", "before", "being", "between", "both", "but", "by", "can", "could", "did",
    "do", "does", "doing", "during", "each", "find", "for", "from", "get", "had", "has", "have",
    "having", "he", "her", "here", "him", "his", "how", "i", "if", "in", "into", "is", "it",
    "its", "just", "me", "more", "most", "my", "no", "not", "now", "of", "on", "only", "or",
    "other", "our", "out", "over", "part", "say", "says", "said", "she", "should", "show", "so",
    "some", "talk", "talks", "than", "that", "the", "their", "them", "then", "there", "these",
    "they", "this", "those", "through", "to", "too", "under", "until", "up", "very", "was", "we",
    "were", "what", "when", "where", "which", "while", "who", "whom", "why", "will", "with",
    "would", "you", "your",
];

/// Local keyword extraction: drops stopwords and ranks likely entities first.
///
/// Words that start with an uppercase letter are ranked ahead of the rest;
/// each group keeps query order. Duplicates keep their first occurrence.
pub struct StopwordKeywordExtractor {
    stopwords: HashSet<&'static str>,
}

impl StopwordKeywordExtractor {
    pub fn new() -> Self {
        Self {
            stopwords: STOPWORDS.iter().copied().collect(),
        }
    }

    pub fn keywords(&self, query: &str) -> Vec<Keyword> {
        let mut seen = HashSet::new();
        let mut entities = Vec::new();
        let mut others = Vec::new();

        for word in query.split(|c: char| !(c.is_alphanumeric() || c == '\'')) {
            let word = word.trim_matches('\'');
            let folded = word.to_lowercase();
            if folded.chars().count() < 2 || self.stopwords.contains(folded.as_str()) {
                continue;
            }
            if !seen.insert(folded) {
                continue;
            }
            if word.chars().next().is_some_and(char::is_uppercase) {
                entities.push(word);
            } else {
                others.push(word);
            }
        }

        Keyword::ranked(entities.into_iter().chain(others))
    }
}

impl Default for StopwordKeywordExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl KeywordExtractor for StopwordKeywordExtractor {
    fn extract(&self, query: &str) -> Result<Vec<Keyword>, CollaboratorError> {
        Ok(self.keywords(query))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(keywords: &[Keyword]) -> Vec<&str> {
        keywords.iter().map(Keyword::text).collect()
    }

    #[test]
    fn test_drops_stopwords_and_punctuation() {
        let ks = StopwordKeywordExtractor::new().keywords("what does he say about grit?");
        assert_eq!(texts(&ks), vec!["grit"]);
    }

    #[test]
    fn test_capitalised_words_ranked_first() {
        let ks = StopwordKeywordExtractor::new().keywords("the part about rockets with Elon Musk");
        assert_eq!(texts(&ks), vec!["elon", "musk", "rockets"]);
        assert_eq!(ks[0].rank(), 0);
        assert_eq!(ks[2].rank(), 2);
    }

    #[test]
    fn test_deduplicates_case_insensitively() {
        let ks = StopwordKeywordExtractor::new().keywords("Grit grit GRIT");
        assert_eq!(texts(&ks), vec!["grit"]);
    }

    #[test]
    fn test_drops_single_characters() {
        let ks = StopwordKeywordExtractor::new().keywords("x y z mars");
        assert_eq!(texts(&ks), vec!["mars"]);
    }

    #[test]
    fn test_keeps_apostrophes_inside_words() {
        let ks = StopwordKeywordExtractor::new().keywords("'Moore's law'");
        assert_eq!(texts(&ks), vec!["moore's", "law"]);
    }

    #[test]
    fn test_only_stopwords_yields_empty() {
        let ks = StopwordKeywordExtractor::new().extract("what is the").unwrap();
        assert!(ks.is_empty());
    }
}
