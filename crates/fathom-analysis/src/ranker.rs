//! Candidate ranking
//!
//! Completion candidates are scored against the typed prefix with
//! case-insensitive Jaro–Winkler similarity. An empty prefix matches
//! everything at full score so a bare trigger lists the whole scope.

/// Candidates scoring below this against a non-empty prefix are dropped
pub const SIMILARITY_THRESHOLD: f64 = 0.5;

const WINKLER_BOOST_FLOOR: f64 = 0.7;
const WINKLER_PREFIX_CAP: usize = 4;
const WINKLER_SCALING: f64 = 0.1;

/// Case-insensitive Jaro–Winkler similarity in `[0, 1]`
pub fn similarity(candidate: &str, prefix: &str) -> f64 {
    let a: Vec<char> = candidate.chars().flat_map(char::to_lowercase).collect();
    let b: Vec<char> = prefix.chars().flat_map(char::to_lowercase).collect();
    let jaro = jaro(&a, &b);
    if jaro <= WINKLER_BOOST_FLOOR {
        return jaro;
    }
    let common_prefix = a
        .iter()
        .zip(b.iter())
        .take(WINKLER_PREFIX_CAP)
        .take_while(|(x, y)| x == y)
        .count();
    jaro + common_prefix as f64 * WINKLER_SCALING * (1.0 - jaro)
}

/// The candidate's score if it survives the threshold
///
/// An empty prefix bypasses the threshold entirely and scores `1.0`.
pub fn score_against(candidate: &str, prefix: &str) -> Option<f64> {
    if prefix.is_empty() {
        return Some(1.0);
    }
    let score = similarity(candidate, prefix);
    (score >= SIMILARITY_THRESHOLD).then_some(score)
}

/// Order scored labels for presentation: score descending, then label
/// ascending for a stable tie-break
pub fn compare_ranked(a: (&str, f64), b: (&str, f64)) -> std::cmp::Ordering {
    b.1.partial_cmp(&a.1)
        .unwrap_or(std::cmp::Ordering::Equal)
        .then_with(|| a.0.cmp(b.0))
}

fn jaro(a: &[char], b: &[char]) -> f64 {
    if a.is_empty() && b.is_empty() {
        return 1.0;
    }
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    let window = (a.len().max(b.len()) / 2).saturating_sub(1);

    let mut a_matched = vec![false; a.len()];
    let mut b_matched = vec![false; b.len()];
    let mut matches = 0usize;
    for (i, ch) in a.iter().enumerate() {
        let lo = i.saturating_sub(window);
        let hi = (i + window + 1).min(b.len());
        for j in lo..hi {
            if !b_matched[j] && b[j] == *ch {
                a_matched[i] = true;
                b_matched[j] = true;
                matches += 1;
                break;
            }
        }
    }
    if matches == 0 {
        return 0.0;
    }

    // half-transpositions: matched characters out of order
    let mut transpositions = 0usize;
    let mut j = 0usize;
    for (i, matched) in a_matched.iter().enumerate() {
        if !matched {
            continue;
        }
        while !b_matched[j] {
            j += 1;
        }
        if a[i] != b[j] {
            transpositions += 1;
        }
        j += 1;
    }
    let transpositions = transpositions as f64 / 2.0;

    let m = matches as f64;
    (m / a.len() as f64 + m / b.len() as f64 + (m - transpositions) / m) / 3.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identical_strings_score_one() {
        assert_eq!(similarity("record", "record"), 1.0);
        assert_eq!(similarity("", ""), 1.0);
    }

    #[test]
    fn test_case_is_ignored() {
        assert_eq!(similarity("Record", "record"), 1.0);
        assert_eq!(similarity("TEXT", "text"), similarity("text", "TEXT"));
    }

    #[test]
    fn test_disjoint_strings_score_zero() {
        assert_eq!(similarity("abc", "xyz"), 0.0);
        assert_eq!(similarity("abc", ""), 0.0);
    }

    #[test]
    fn test_prefix_boost_favors_shared_start() {
        // same edit distance from "martha", but the shared prefix wins
        let close = similarity("martha", "marhta");
        let far = similarity("martha", "tmarha");
        assert!(close > far);
        assert!((close - 0.9611).abs() < 0.001);
    }

    #[test]
    fn test_boost_applies_above_floor() {
        // jaro("dixon", "dicksonx") = 0.7667, boosted by the "di" prefix
        assert!((similarity("dixon", "dicksonx") - 0.8133).abs() < 0.001);
    }

    #[test]
    fn test_no_boost_at_or_below_floor() {
        // jaro("abcdef", "abzzzz") = 0.5556; the shared "ab" prefix must
        // not lift it
        assert!((similarity("abcdef", "abzzzz") - 0.5556).abs() < 0.001);
    }

    #[test]
    fn test_empty_prefix_bypasses_threshold() {
        assert_eq!(score_against("anything", ""), Some(1.0));
    }

    #[test]
    fn test_threshold_drops_weak_candidates() {
        assert!(score_against("alpha", "alp").is_some());
        assert_eq!(score_against("omega", "alp"), None);
    }

    #[test]
    fn test_ordering_breaks_ties_by_label() {
        use std::cmp::Ordering;
        assert_eq!(compare_ranked(("b", 0.9), ("a", 0.5)), Ordering::Less);
        assert_eq!(compare_ranked(("b", 0.5), ("a", 0.5)), Ordering::Greater);
    }
}
