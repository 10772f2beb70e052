//! Composite fuzzy similarity between two normalized names, scored 0-100.
//!
//! The score is a weighted ratio: plain whole-string similarity, the best
//! substring alignment of the shorter name inside the longer one, and
//! token-level comparisons that ignore word order and tolerate extra words.
//! Which of these are allowed to contribute, and how much they are
//! discounted, depends on how different the two lengths are.

use std::collections::BTreeSet;

/// Discount applied to token-level scores.
const TOKEN_SCALE: f64 = 0.95;

/// Whole-string similarity, 0-100: `2 * LCS / (|a| + |b|)` over chars, i.e.
/// the normalized insert/delete (Indel) distance. Substitutions count as a
/// delete plus an insert.
pub fn ratio(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let total = a.len() + b.len();
    if total == 0 {
        return 100.0;
    }
    200.0 * lcs_len(&a, &b) as f64 / total as f64
}

/// Length of the longest common subsequence, one DP row at a time.
fn lcs_len(a: &[char], b: &[char]) -> usize {
    let mut prev = vec![0usize; b.len() + 1];
    let mut cur = vec![0usize; b.len() + 1];
    for &ca in a {
        for (j, &cb) in b.iter().enumerate() {
            cur[j + 1] = if ca == cb {
                prev[j] + 1
            } else {
                prev[j + 1].max(cur[j])
            };
        }
        std::mem::swap(&mut prev, &mut cur);
    }
    prev[b.len()]
}

/// Best similarity of the shorter string against every equally long window
/// of the longer one.
pub fn partial_ratio(a: &str, b: &str) -> f64 {
    let (short, long) = if a.chars().count() <= b.chars().count() {
        (a, b)
    } else {
        (b, a)
    };
    let short_len = short.chars().count();
    if short_len == 0 {
        return if long.is_empty() { 100.0 } else { 0.0 };
    }

    let long_chars: Vec<char> = long.chars().collect();
    if long_chars.len() == short_len {
        return ratio(short, long);
    }

    let mut best = 0.0_f64;
    for window in long_chars.windows(short_len) {
        let candidate: String = window.iter().collect();
        let score = ratio(short, &candidate);
        if score > best {
            best = score;
            if best >= 100.0 {
                break;
            }
        }
    }
    best
}

fn tokens(s: &str) -> BTreeSet<&str> {
    s.split_whitespace().collect()
}

fn sorted_tokens(s: &str) -> String {
    let mut words: Vec<&str> = s.split_whitespace().collect();
    words.sort_unstable();
    words.join(" ")
}

fn join_set(set: &BTreeSet<&str>) -> String {
    set.iter().copied().collect::<Vec<_>>().join(" ")
}

/// Ratio after sorting the words of both strings.
pub fn token_sort_ratio(a: &str, b: &str) -> f64 {
    ratio(&sorted_tokens(a), &sorted_tokens(b))
}

/// Compares the shared words against each side's leftovers. A name whose
/// words are all contained in the other scores 100.
pub fn token_set_ratio(a: &str, b: &str) -> f64 {
    let ta = tokens(a);
    let tb = tokens(b);
    if ta.is_empty() || tb.is_empty() {
        return 0.0;
    }

    let common: BTreeSet<&str> = ta.intersection(&tb).copied().collect();
    let only_a: BTreeSet<&str> = ta.difference(&tb).copied().collect();
    let only_b: BTreeSet<&str> = tb.difference(&ta).copied().collect();

    if !common.is_empty() && (only_a.is_empty() || only_b.is_empty()) {
        return 100.0;
    }

    let sect = join_set(&common);
    let combined = |rest: &BTreeSet<&str>| -> String {
        let rest = join_set(rest);
        if sect.is_empty() {
            rest
        } else {
            format!("{sect} {rest}")
        }
    };
    let with_a = combined(&only_a);
    let with_b = combined(&only_b);

    let mut best = ratio(&with_a, &with_b);
    if !sect.is_empty() {
        best = best.max(ratio(&sect, &with_a)).max(ratio(&sect, &with_b));
    }
    best
}

/// Partial alignment over word-sorted strings. Any shared word scores 100.
pub fn partial_token_ratio(a: &str, b: &str) -> f64 {
    let ta = tokens(a);
    let tb = tokens(b);
    if ta.is_empty() || tb.is_empty() {
        return 0.0;
    }
    if ta.intersection(&tb).next().is_some() {
        return 100.0;
    }
    partial_ratio(&sorted_tokens(a), &sorted_tokens(b))
}

/// Composite score in [0, 100] used by the matcher.
pub fn weighted_ratio(a: &str, b: &str) -> f64 {
    let len_a = a.chars().count();
    let len_b = b.chars().count();
    if len_a == 0 || len_b == 0 {
        return 0.0;
    }

    let len_ratio = len_a.max(len_b) as f64 / len_a.min(len_b) as f64;
    let whole = ratio(a, b);

    if len_ratio < 1.5 {
        let token = token_sort_ratio(a, b).max(token_set_ratio(a, b));
        return whole.max(token * TOKEN_SCALE).min(100.0);
    }

    let partial_scale = if len_ratio < 8.0 { 0.9 } else { 0.6 };
    let partial = partial_ratio(a, b) * partial_scale;
    let partial_token = partial_token_ratio(a, b) * TOKEN_SCALE * partial_scale;
    whole.max(partial).max(partial_token).min(100.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn ratio_identical_and_disjoint() {
        assert!(close(ratio("iphone", "iphone"), 100.0));
        assert!(close(ratio("abc", "xyz"), 0.0));
        assert!(close(ratio("", ""), 100.0));
    }

    #[test]
    fn ratio_counts_insertions_and_deletions() {
        // 2 * 14 / (14 + 15)
        let score = ratio("this is a test", "this is a test!");
        assert!((score - 96.551_724).abs() < 1e-4, "score {score}");
        // One substitution is a delete plus an insert: 2 * 2 / 6.
        assert!((ratio("abc", "abd") - 200.0 / 3.0).abs() < 1e-9);
        assert!(close(ratio("iphone", ""), 0.0));
    }

    #[test]
    fn ratio_is_symmetric() {
        for (a, b) in [("galaxy s24", "galaxy s24 ultra"), ("ёж", "еж"), ("kitten", "sitting")] {
            assert!(close(ratio(a, b), ratio(b, a)));
        }
    }

    #[test]
    fn partial_finds_substring() {
        assert!(close(partial_ratio("iphone", "apple iphone 15"), 100.0));
        assert!(partial_ratio("iphone", "galaxy s24") < 60.0);
    }

    #[test]
    fn token_sort_ignores_order() {
        assert!(close(
            token_sort_ratio("apple iphone 15", "iphone 15 apple"),
            100.0
        ));
    }

    #[test]
    fn token_set_subset_is_full_score() {
        assert!(close(token_set_ratio("iphone 15", "apple iphone 15 black"), 100.0));
        assert!(close(token_set_ratio("", "iphone"), 0.0));
    }

    #[test]
    fn weighted_handles_reordering() {
        let score = weighted_ratio("apple iphone 15 128gb", "iphone 15 apple 128 gb");
        assert!(score >= 85.0, "score {score}");
    }

    #[test]
    fn weighted_unrelated_is_low() {
        let score = weighted_ratio("samsung galaxy s24", "dyson v15 vacuum");
        assert!(score < 50.0, "score {score}");
    }

    #[test]
    fn weighted_is_bounded() {
        for (a, b) in [
            ("a", "a"),
            ("apple", "apple iphone 15 pro max 1tb titanium"),
            ("x", "y"),
            ("", "iphone"),
        ] {
            let s = weighted_ratio(a, b);
            assert!((0.0..=100.0).contains(&s), "{a:?} vs {b:?} = {s}");
        }
    }

    #[test]
    fn weighted_empty_is_zero() {
        assert!(close(weighted_ratio("", "iphone"), 0.0));
        assert!(close(weighted_ratio("", ""), 0.0));
    }
}
