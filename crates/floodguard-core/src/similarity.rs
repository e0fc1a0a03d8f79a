//! Token-set string similarity on a 0-100 scale.
//!
//! Strings are split on whitespace into token sets. Identical token sets, or
//! a shared core where one side adds nothing, score 100. Otherwise the score
//! is the best normalized Indel similarity among the sorted leftovers and the
//! shared core extended by either side's leftovers. Comparison is
//! case-sensitive and punctuation is kept.

use std::collections::BTreeSet;

pub fn token_set_ratio(a: &str, b: &str) -> f64 {
    let tokens_a: BTreeSet<&str> = a.split_whitespace().collect();
    let tokens_b: BTreeSet<&str> = b.split_whitespace().collect();
    if tokens_a.is_empty() || tokens_b.is_empty() {
        return 0.0;
    }

    let intersection: Vec<&str> = tokens_a.intersection(&tokens_b).copied().collect();
    let diff_ab: Vec<&str> = tokens_a.difference(&tokens_b).copied().collect();
    let diff_ba: Vec<&str> = tokens_b.difference(&tokens_a).copied().collect();

    if !intersection.is_empty() && (diff_ab.is_empty() || diff_ba.is_empty()) {
        return 100.0;
    }

    let diff_ab_joined = diff_ab.join(" ");
    let diff_ba_joined = diff_ba.join(" ");
    let ab_len = diff_ab_joined.chars().count();
    let ba_len = diff_ba_joined.chars().count();
    let sect_len = intersection.join(" ").chars().count();

    // Length of "<sect> <diff>"; the separator only exists when sect is non-empty.
    let sep = usize::from(sect_len != 0);
    let sect_ab_len = sect_len + sep + ab_len;
    let sect_ba_len = sect_len + sep + ba_len;

    let dist = indel_distance(&diff_ab_joined, &diff_ba_joined);
    let mut best = normalized_similarity(dist, sect_ab_len + sect_ba_len);
    if sect_len == 0 {
        return best;
    }

    // Against the bare intersection, "<sect> <diff>" differs by exactly the
    // separator plus the leftovers.
    let sect_ab_ratio = normalized_similarity(sep + ab_len, sect_len + sect_ab_len);
    let sect_ba_ratio = normalized_similarity(sep + ba_len, sect_len + sect_ba_len);
    best = best.max(sect_ab_ratio).max(sect_ba_ratio);
    best
}

fn normalized_similarity(distance: usize, total_len: usize) -> f64 {
    if total_len == 0 {
        return 100.0;
    }
    100.0 - 100.0 * distance as f64 / total_len as f64
}

/// Insertions plus deletions needed to turn `a` into `b`.
pub fn indel_distance(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    a.len() + b.len() - 2 * lcs_len(&a, &b)
}

fn lcs_len(a: &[char], b: &[char]) -> usize {
    if a.is_empty() || b.is_empty() {
        return 0;
    }
    let mut prev = vec![0usize; b.len() + 1];
    let mut row = vec![0usize; b.len() + 1];
    for &ca in a {
        for (j, &cb) in b.iter().enumerate() {
            row[j + 1] = if ca == cb {
                prev[j] + 1
            } else {
                row[j].max(prev[j + 1])
            };
        }
        std::mem::swap(&mut prev, &mut row);
    }
    prev[b.len()]
}
