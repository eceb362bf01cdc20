//! Title normalization: case folding, word splitting, stop-word removal and
//! n-gram expansion.

use std::collections::HashSet;

/// English stop words removed from titles before n-grams are formed.
pub const ENGLISH_STOP_WORDS: &[&str] = &[
    "a", "about", "above", "across", "after", "afterwards", "again", "against", "all", "almost",
    "alone", "along", "already", "also", "although", "always", "am", "among", "amongst", "an",
    "and", "another", "any", "anyhow", "anyone", "anything", "anyway", "anywhere", "are",
    "around", "as", "at", "be", "became", "because", "become", "becomes", "becoming", "been",
    "before", "beforehand", "behind", "being", "below", "beside", "besides", "between", "beyond",
    "both", "but", "by", "can", "cannot", "could", "did", "do", "does", "doing", "done", "down",
    "due", "during", "each", "eg", "either", "else", "elsewhere", "enough", "etc", "even", "ever",
    "every", "everyone", "everything", "everywhere", "except", "few", "for", "former",
    "formerly", "from", "further", "had", "has", "have", "having", "he", "hence", "her", "here",
    "hereafter", "hereby", "herein", "hers", "herself", "him", "himself", "his", "how",
    "however", "ie", "if", "in", "indeed", "into", "is", "it", "its", "itself", "just", "last",
    "latter", "least", "less", "many", "may", "me", "meanwhile", "might", "more", "moreover",
    "most", "mostly", "much", "must", "my", "myself", "namely", "neither", "never",
    "nevertheless", "next", "no", "nobody", "none", "nor", "not", "nothing", "now", "nowhere",
    "of", "off", "often", "on", "once", "one", "only", "onto", "or", "other", "others",
    "otherwise", "our", "ours", "ourselves", "out", "over", "own", "per", "perhaps", "rather",
    "re", "same", "several", "she", "should", "since", "so", "some", "somehow", "someone",
    "something", "sometime", "sometimes", "somewhere", "still", "such", "than", "that", "the",
    "their", "theirs", "them", "themselves", "then", "thence", "there", "thereafter", "thereby",
    "therefore", "therein", "these", "they", "this", "those", "though", "through", "throughout",
    "thru", "thus", "to", "together", "too", "toward", "towards", "under", "until", "up", "upon",
    "us", "very", "via", "was", "we", "well", "were", "what", "whatever", "when", "whence",
    "whenever", "where", "whereas", "whereby", "wherein", "whether", "which", "while", "who",
    "whoever", "whole", "whom", "whose", "why", "will", "with", "within", "without", "would",
    "yet", "you", "your", "yours", "yourself", "yourselves",
];

/// Splits titles into weighted-vocabulary terms.
#[derive(Debug, Clone)]
pub struct Analyzer {
    stop_words: HashSet<String>,
    max_ngram: usize,
}

impl Analyzer {
    /// English stop words, unigrams and bigrams.
    pub fn new() -> Self {
        Self {
            stop_words: ENGLISH_STOP_WORDS.iter().map(|w| (*w).to_string()).collect(),
            max_ngram: 2,
        }
    }

    /// Add stop words (case-folded).
    pub fn with_extra_stop_words<I, S>(mut self, words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.stop_words
            .extend(words.into_iter().map(|w| w.as_ref().to_lowercase()));
        self
    }

    /// Longest n-gram emitted (at least 1).
    pub fn with_max_ngram(mut self, n: usize) -> Self {
        self.max_ngram = n.max(1);
        self
    }

    /// Lowercased words of two or more word characters, stop words removed.
    pub fn tokens(&self, text: &str) -> Vec<String> {
        text.to_lowercase()
            .split(|c: char| !(c.is_alphanumeric() || c == '_'))
            .filter(|w| w.chars().count() >= 2)
            .filter(|w| !self.stop_words.contains(*w))
            .map(str::to_string)
            .collect()
    }

    /// Unigrams through `max_ngram`-grams over the filtered tokens.
    pub fn terms(&self, text: &str) -> Vec<String> {
        let tokens = self.tokens(text);
        let mut terms = tokens.clone();
        for n in 2..=self.max_ngram {
            if tokens.len() < n {
                break;
            }
            terms.extend(tokens.windows(n).map(|w| w.join(" ")));
        }
        terms
    }
}

impl Default for Analyzer {
    fn default() -> Self {
        Self::new()
    }
}
