//! String similarity measures used to compare node values.
//!
//! Every measure returns a score in `[0.0, 1.0]`. Identical non-empty strings
//! score 1.0; comparing against an empty string scores 0.0.

use rapidhash::{RapidHashMap as HashMap, RapidHashSet as HashSet};

/// A similarity measure over two strings.
pub trait StringSimilarity {
    /// Score the similarity of `a` and `b` in `[0.0, 1.0]`.
    fn similarity(&self, a: &str, b: &str) -> f64;
}

/// Normalized Levenshtein similarity.
///
/// `(worst - distance) / worst`, where `worst` is the length of the longer
/// string in chars.
#[derive(Debug, Clone, Copy, Default)]
pub struct Levenshtein;

impl Levenshtein {
    /// Edit distance in chars (insert, delete and substitute all cost 1).
    pub fn distance(a: &str, b: &str) -> usize {
        let a: Vec<char> = a.chars().collect();
        let b: Vec<char> = b.chars().collect();
        if a.is_empty() {
            return b.len();
        }
        if b.is_empty() {
            return a.len();
        }

        let mut prev: Vec<usize> = (0..=b.len()).collect();
        let mut curr = vec![0; b.len() + 1];
        for (i, ca) in a.iter().enumerate() {
            curr[0] = i + 1;
            for (j, cb) in b.iter().enumerate() {
                let substitution = prev[j] + usize::from(ca != cb);
                curr[j + 1] = substitution.min(prev[j + 1] + 1).min(curr[j] + 1);
            }
            core::mem::swap(&mut prev, &mut curr);
        }
        prev[b.len()]
    }
}

impl StringSimilarity for Levenshtein {
    fn similarity(&self, a: &str, b: &str) -> f64 {
        let worst = a.chars().count().max(b.chars().count());
        if worst == 0 {
            return 0.0;
        }
        let distance = Self::distance(a, b);
        (worst - distance) as f64 / worst as f64
    }
}

/// Dice coefficient over the multisets of overlapping character n-grams.
#[derive(Debug, Clone, Copy)]
pub struct NGrams {
    /// Width of each gram
    pub n: usize,
}

impl Default for NGrams {
    fn default() -> Self {
        Self { n: 2 }
    }
}

impl NGrams {
    /// N-gram counts of `s`. A string shorter than `n` chars is one gram.
    fn grams<'s>(&self, s: &'s str) -> HashMap<&'s str, usize> {
        let n = self.n.max(1);
        let bounds: Vec<usize> = s
            .char_indices()
            .map(|(i, _)| i)
            .chain(core::iter::once(s.len()))
            .collect();
        let chars = bounds.len() - 1;

        let mut grams: HashMap<&str, usize> = HashMap::default();
        if chars == 0 {
            return grams;
        }
        if chars < n {
            grams.insert(s, 1);
            return grams;
        }
        for window in bounds.windows(n + 1) {
            *grams.entry(&s[window[0]..window[n]]).or_default() += 1;
        }
        grams
    }
}

impl StringSimilarity for NGrams {
    fn similarity(&self, a: &str, b: &str) -> f64 {
        let grams_a = self.grams(a);
        let grams_b = self.grams(b);
        let total: usize = grams_a.values().sum::<usize>() + grams_b.values().sum::<usize>();
        if total == 0 {
            return 0.0;
        }
        let common: usize = grams_a
            .iter()
            .filter_map(|(gram, &count)| grams_b.get(gram).map(|&other| count.min(other)))
            .sum();
        (2 * common) as f64 / total as f64
    }
}

/// Dice coefficient over the sets of identifier-like tokens.
///
/// Tokens are maximal runs of alphanumerics and `_`, so punctuation and
/// comment markers (`//`, `/*`, `*/`) never count. Word order is irrelevant.
#[derive(Debug, Clone, Copy, Default)]
pub struct Tokens;

impl Tokens {
    fn tokens(s: &str) -> HashSet<&str> {
        s.split(|c: char| !(c.is_alphanumeric() || c == '_'))
            .filter(|token| !token.is_empty())
            .collect()
    }
}

impl StringSimilarity for Tokens {
    fn similarity(&self, a: &str, b: &str) -> f64 {
        let tokens_a = Self::tokens(a);
        let tokens_b = Self::tokens(b);
        let total = tokens_a.len() + tokens_b.len();
        if total == 0 {
            return 0.0;
        }
        let common = tokens_a.intersection(&tokens_b).count();
        (2 * common) as f64 / total as f64
    }
}

/// Selects one of the built-in measures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimilarityMeasure {
    /// [`Levenshtein`]
    Levenshtein,
    /// [`NGrams`] of the given width
    NGrams(usize),
    /// [`Tokens`]
    Tokens,
}

impl Default for SimilarityMeasure {
    fn default() -> Self {
        SimilarityMeasure::NGrams(2)
    }
}

impl StringSimilarity for SimilarityMeasure {
    fn similarity(&self, a: &str, b: &str) -> f64 {
        match *self {
            SimilarityMeasure::Levenshtein => Levenshtein.similarity(a, b),
            SimilarityMeasure::NGrams(n) => NGrams { n }.similarity(a, b),
            SimilarityMeasure::Tokens => Tokens.similarity(a, b),
        }
    }
}
