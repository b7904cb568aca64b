//! Text helpers for collapsing near-identical alert messages.
//!
//! When many hosts fire the same rule, their summaries differ only in a
//! numeric value or host suffix. `merge_similar` keeps one representative
//! phrasing per cluster so the rendered message stays compact.

use std::collections::HashSet;

/// Edit-distance threshold under which two summaries count as the same
/// message.
pub const DEFAULT_MERGE_THRESHOLD: usize = 3;

/// Levenshtein distance between `a` and `b`, counted in Unicode code points.
///
/// Two rolling rows sized by the shorter input keep the working memory at
/// O(min(|a|,|b|)).
pub fn distance(a: &str, b: &str) -> usize {
    let mut short: Vec<char> = a.chars().collect();
    let mut long: Vec<char> = b.chars().collect();
    if short.len() > long.len() {
        std::mem::swap(&mut short, &mut long);
    }
    if short.is_empty() {
        return long.len();
    }
    if short == long {
        return 0;
    }

    let mut previous: Vec<usize> = (0..=short.len()).collect();
    let mut current: Vec<usize> = vec![0; short.len() + 1];

    for (i, lc) in long.iter().enumerate() {
        current[0] = i + 1;
        for (j, sc) in short.iter().enumerate() {
            let substitution = previous[j] + usize::from(sc != lc);
            current[j + 1] = substitution
                .min(previous[j + 1] + 1)
                .min(current[j] + 1);
        }
        std::mem::swap(&mut previous, &mut current);
    }

    previous[short.len()]
}

/// Collapses near-duplicate strings, keeping representatives in first-seen
/// order.
///
/// A candidate is admitted only when it differs from every representative
/// accepted so far by strictly more than `threshold` edits. Anything closer
/// to an accepted representative is dropped, even when it is far from the
/// others. Exact repeats are removed in a final pass.
pub fn merge_similar(values: &[String], threshold: usize) -> Vec<String> {
    let mut representatives: Vec<String> = Vec::new();
    for candidate in values {
        if representatives
            .iter()
            .all(|rep| distance(rep, candidate) > threshold)
        {
            representatives.push(candidate.clone());
        }
    }
    uniq(representatives)
}

/// Exact-match dedup preserving first-seen order.
pub fn uniq(values: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    values
        .into_iter()
        .filter(|value| seen.insert(value.clone()))
        .collect()
}

/// Hard cut after `max` code points. Not word-boundary aware; only the last
/// partial line of a merged summary is affected.
pub fn truncate_chars(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        text.to_string()
    } else {
        text.chars().take(max).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distance_of_identical_strings_is_zero() {
        assert_eq!(distance("", ""), 0);
        assert_eq!(distance("disk full", "disk full"), 0);
        assert_eq!(distance("давление", "давление"), 0);
    }

    #[test]
    fn distance_from_empty_is_code_point_count() {
        assert_eq!(distance("", "abc"), 3);
        assert_eq!(distance("abc", ""), 3);
        assert_eq!(distance("", "héllo"), 5);
    }

    #[test]
    fn distance_is_symmetric() {
        let pairs = [("kitten", "sitting"), ("flaw", "lawn"), ("a", "xyz")];
        for (a, b) in pairs {
            assert_eq!(distance(a, b), distance(b, a));
        }
    }

    #[test]
    fn distance_counts_single_edits() {
        assert_eq!(distance("kitten", "sitting"), 3);
        assert_eq!(distance("node1", "node2"), 1);
        assert_eq!(distance("héllo", "hello"), 1);
    }

    #[test]
    fn merge_empty_input_is_empty() {
        assert_eq!(merge_similar(&[], 3), Vec::<String>::new());
    }

    #[test]
    fn merge_single_element_is_unchanged() {
        let input = vec!["disk full".to_string()];
        assert_eq!(merge_similar(&input, 3), input);
    }

    #[test]
    fn merge_collapses_cluster_to_first_element() {
        let input = vec![
            "disk full on node1".to_string(),
            "disk full on node2".to_string(),
            "disk full on node3".to_string(),
        ];
        assert_eq!(
            merge_similar(&input, 3),
            vec!["disk full on node1".to_string()]
        );
    }

    #[test]
    fn merge_keeps_distant_messages() {
        let input = vec![
            "disk full on node1".to_string(),
            "disk full on node2".to_string(),
            "cpu spike".to_string(),
        ];
        assert_eq!(
            merge_similar(&input, 3),
            vec!["disk full on node1".to_string(), "cpu spike".to_string()]
        );
    }

    #[test]
    fn merge_drops_exact_repeats() {
        let input = vec![
            "cpu spike".to_string(),
            "out of memory".to_string(),
            "cpu spike".to_string(),
        ];
        assert_eq!(
            merge_similar(&input, 3),
            vec!["cpu spike".to_string(), "out of memory".to_string()]
        );
    }

    #[test]
    fn uniq_preserves_first_seen_order() {
        let input = vec![
            "b".to_string(),
            "a".to_string(),
            "b".to_string(),
            "c".to_string(),
            "a".to_string(),
        ];
        assert_eq!(
            uniq(input),
            vec!["b".to_string(), "a".to_string(), "c".to_string()]
        );
    }

    #[test]
    fn truncate_leaves_short_text_alone() {
        assert_eq!(truncate_chars("short", 500), "short");
        assert_eq!(truncate_chars("exact", 5), "exact");
    }

    #[test]
    fn truncate_cuts_at_code_points() {
        let long = "é".repeat(600);
        let cut = truncate_chars(&long, 500);
        assert_eq!(cut.chars().count(), 500);
        assert_eq!(cut, "é".repeat(500));
    }
}
