use regex::Regex;

/// Strategy for grouping descriptions that likely refer to the same
/// procurement. Behind a trait so the keyword heuristic can be swapped
/// for something stronger (n-gram Jaccard, embeddings) without touching
/// the rule engine.
pub trait SimilarityDetector {
    /// Grouping key for a description, or `None` when the description
    /// carries too little signal to group on.
    fn group_key(&self, description: &str) -> Option<String>;
}

const STOPWORDS: &[&str] = &[
    "supply", "provision", "procurement", "purchase", "delivery", "supplies",
    "services", "service", "works", "contract", "tender", "various", "assorted",
    "national", "regional", "ghana",
];

/// Naive keyword grouping: lower-case, tokenize, drop stopwords and
/// short tokens, key on the first three remaining tokens. No stemming
/// and no synonym handling; paraphrased titles will slip through, which
/// is accepted for this heuristic.
pub struct KeywordSimilarity {
    word: Regex,
}

impl KeywordSimilarity {
    pub fn new() -> Self {
        KeywordSimilarity {
            word: Regex::new(r"[a-z0-9]+").unwrap(),
        }
    }
}

impl Default for KeywordSimilarity {
    fn default() -> Self {
        Self::new()
    }
}

impl SimilarityDetector for KeywordSimilarity {
    fn group_key(&self, description: &str) -> Option<String> {
        let lower = description.to_lowercase();
        let tokens: Vec<&str> = self
            .word
            .find_iter(&lower)
            .map(|m| m.as_str())
            .filter(|t| t.len() > 3 && !STOPWORDS.contains(t))
            .take(3)
            .collect();
        if tokens.is_empty() {
            return None;
        }
        Some(tokens.join(" "))
    }
}
