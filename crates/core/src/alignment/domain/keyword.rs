/// A case-folded search term with its priority (`0` is highest).
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Keyword {
    text: String,
    rank: u32,
}

impl Keyword {
    pub fn new(text: &str, rank: u32) -> Self {
        Self {
            text: normalize(text),
            rank,
        }
    }

    /// Ranks keywords by position: the first gets rank 0.
    pub fn ranked<I, S>(texts: I) -> Vec<Keyword>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        texts
            .into_iter()
            .enumerate()
            .map(|(i, t)| Keyword::new(t.as_ref(), i as u32))
            .collect()
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn rank(&self) -> u32 {
        self.rank
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

/// Lowercases and strips surrounding whitespace and punctuation, so
/// `"Musk,"` and `" musk"` compare equal. Inner punctuation is kept.
pub fn normalize(text: &str) -> String {
    text.trim_matches(|c: char| !c.is_alphanumeric())
        .to_lowercase()
}
