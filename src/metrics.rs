//! Text-similarity metrics used to score generated completions.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Highest character n-gram order considered by [`chrf`].
const CHRF_MAX_ORDER: usize = 6;
/// Recall weight used in the chrF F-beta computation.
const CHRF_BETA: f64 = 2.0;
/// Highest token n-gram order considered by [`ngram_precision_score`].
const NGRAM_MAX_ORDER: usize = 4;

/// Per-example scores comparing a generated completion against the true middle.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExampleMetrics {
    /// Trimmed string equality of generated and reference text.
    pub exact_match: bool,
    /// Character n-gram F-score, scaled to 0..=100.
    pub chrf: f64,
    /// Character-level edit distance between generated and reference text.
    pub levenshtein_distance: usize,
    /// Cosine similarity of mean-pooled hidden-state embeddings.
    pub cosine_similarity: f32,
    /// Approximate n-gram-precision score, scaled to 0..=100.
    ///
    /// This is a placeholder for CodeBLEU that scores token n-gram precision
    /// only; it carries none of the syntactic or dataflow matching of the
    /// literature-standard metric and must not be compared against it.
    pub codebleu: f64,
}

/// Trimmed equality of generated and reference text.
#[must_use]
pub fn exact_match(candidate: &str, reference: &str) -> bool {
    candidate.trim() == reference.trim()
}

/// Character-level Levenshtein edit distance.
#[must_use]
pub fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut previous: Vec<usize> = (0..=b.len()).collect();
    let mut current = vec![0usize; b.len() + 1];
    for (i, &ca) in a.iter().enumerate() {
        current[0] = i + 1;
        for (j, &cb) in b.iter().enumerate() {
            let substitution = previous[j] + usize::from(ca != cb);
            current[j + 1] = substitution.min(previous[j + 1] + 1).min(current[j] + 1);
        }
        std::mem::swap(&mut previous, &mut current);
    }
    previous[b.len()]
}

/// Cosine similarity for two equal-length vectors.
///
/// Returns `0.0` when the lengths differ or either vector has zero norm.
#[must_use]
pub fn cosine_similarity(lhs: &[f32], rhs: &[f32]) -> f32 {
    if lhs.len() != rhs.len() || lhs.is_empty() {
        return 0.0;
    }
    let (mut dot, mut norm_l, mut norm_r) = (0.0f32, 0.0f32, 0.0f32);
    for (&l, &r) in lhs.iter().zip(rhs) {
        dot += l * r;
        norm_l += l * l;
        norm_r += r * r;
    }
    if norm_l == 0.0 || norm_r == 0.0 {
        return 0.0;
    }
    dot / norm_l.sqrt() / norm_r.sqrt()
}

/// Mean-pools a hidden-state sequence into a single embedding vector.
#[must_use]
pub fn mean_pool(hidden_states: &[Vec<f32>]) -> Vec<f32> {
    let Some(first) = hidden_states.first() else {
        return Vec::new();
    };
    let mut pooled = vec![0.0f32; first.len()];
    for state in hidden_states {
        for (slot, &value) in pooled.iter_mut().zip(state) {
            *slot += value;
        }
    }
    let count = hidden_states.len() as f32;
    for slot in &mut pooled {
        *slot /= count;
    }
    pooled
}

fn ngram_counts<'a, T: std::hash::Hash + Eq>(items: &'a [T], n: usize) -> HashMap<&'a [T], usize> {
    let mut counts = HashMap::new();
    if items.len() >= n && n > 0 {
        for window in items.windows(n) {
            *counts.entry(window).or_insert(0) += 1;
        }
    }
    counts
}

fn clipped_overlap<'a, T: std::hash::Hash + Eq>(
    candidate: &HashMap<&'a [T], usize>,
    reference: &HashMap<&'a [T], usize>,
) -> usize {
    candidate
        .iter()
        .map(|(gram, &count)| count.min(reference.get(gram).copied().unwrap_or(0)))
        .sum()
}

/// Character n-gram F-score (chrF), scaled to 0..=100.
///
/// Whitespace is removed before counting, n-gram orders 1..=6 are
/// macro-averaged, and recall is weighted with beta = 2.
#[must_use]
pub fn chrf(candidate: &str, reference: &str) -> f64 {
    let cand: Vec<char> = candidate.chars().filter(|c| !c.is_whitespace()).collect();
    let refr: Vec<char> = reference.chars().filter(|c| !c.is_whitespace()).collect();

    let mut precision_sum = 0.0;
    let mut recall_sum = 0.0;
    let mut orders = 0usize;
    for n in 1..=CHRF_MAX_ORDER {
        let cand_counts = ngram_counts(&cand, n);
        let ref_counts = ngram_counts(&refr, n);
        let cand_total: usize = cand_counts.values().sum();
        let ref_total: usize = ref_counts.values().sum();
        if cand_total == 0 && ref_total == 0 {
            continue;
        }
        let overlap = clipped_overlap(&cand_counts, &ref_counts) as f64;
        precision_sum += if cand_total > 0 {
            overlap / cand_total as f64
        } else {
            0.0
        };
        recall_sum += if ref_total > 0 {
            overlap / ref_total as f64
        } else {
            0.0
        };
        orders += 1;
    }
    if orders == 0 {
        return 0.0;
    }

    let precision = precision_sum / orders as f64;
    let recall = recall_sum / orders as f64;
    let beta_sq = CHRF_BETA * CHRF_BETA;
    let denominator = beta_sq * precision + recall;
    if denominator == 0.0 {
        return 0.0;
    }
    100.0 * (1.0 + beta_sq) * precision * recall / denominator
}

/// Approximate n-gram-precision score standing in for CodeBLEU, scaled to 0..=100.
///
/// Whitespace-token n-grams for n = 1..=4; each order's precision is the
/// reference-clipped candidate n-gram count over the total candidate n-gram
/// count, and orders the candidate is too short for are excluded from the
/// average.  A candidate with no tokens scores 0.  Deliberately omits the
/// syntax and dataflow components of full CodeBLEU.
#[must_use]
pub fn ngram_precision_score(candidate: &str, reference: &str) -> f64 {
    let cand_tokens: Vec<&str> = candidate.split_whitespace().collect();
    let ref_tokens: Vec<&str> = reference.split_whitespace().collect();

    let mut precision_sum = 0.0;
    let mut orders = 0usize;
    for n in 1..=NGRAM_MAX_ORDER {
        if cand_tokens.len() < n {
            continue;
        }
        let cand_counts = ngram_counts(&cand_tokens, n);
        let ref_counts = ngram_counts(&ref_tokens, n);
        let cand_total: usize = cand_counts.values().sum();
        precision_sum += clipped_overlap(&cand_counts, &ref_counts) as f64 / cand_total as f64;
        orders += 1;
    }
    if orders == 0 {
        return 0.0;
    }
    100.0 * precision_sum / orders as f64
}
