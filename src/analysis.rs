//! Comparison of typed text against the target passage.
//!
//! Character comparison is positional and clamped to the shorter of the two
//! strings. Word comparison splits on whitespace and compares index by index up
//! to the shorter word sequence, so a missing or extra word shifts every later
//! word out of alignment and flags it. That approximation is kept on purpose.

use std::collections::HashSet;

/// Mismatches found between a typed buffer and its target text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorAnalysis {
    /// Target characters the user failed to type at their position.
    pub error_chars: HashSet<char>,
    /// Target words whose typed counterpart differed.
    pub problem_words: HashSet<String>,
}

impl ErrorAnalysis {
    pub fn is_empty(&self) -> bool {
        self.error_chars.is_empty() && self.problem_words.is_empty()
    }
}

/// Compare `typed` against `target`, reporting the target side of every mismatch.
pub fn analyze(typed: &str, target: &str) -> ErrorAnalysis {
    let error_chars = typed
        .chars()
        .zip(target.chars())
        .filter(|(typed_char, target_char)| typed_char != target_char)
        .map(|(_, target_char)| target_char)
        .collect();

    let problem_words = typed
        .split_whitespace()
        .zip(target.split_whitespace())
        .filter(|(typed_word, target_word)| typed_word != target_word)
        .map(|(_, target_word)| target_word.to_string())
        .collect();

    ErrorAnalysis {
        error_chars,
        problem_words,
    }
}

/// Number of positions where `typed` and `target` differ, clamped to the shorter length.
pub fn char_mismatch_count(typed: &str, target: &str) -> usize {
    typed
        .chars()
        .zip(target.chars())
        .filter(|(a, b)| a != b)
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chars(list: &[char]) -> HashSet<char> {
        list.iter().copied().collect()
    }

    fn words(list: &[&str]) -> HashSet<String> {
        list.iter().map(|w| w.to_string()).collect()
    }

    #[test]
    fn identical_text_has_no_errors() {
        let result = analyze("hello world", "hello world");
        assert!(result.is_empty());
    }

    #[test]
    fn single_substitution_reports_target_char_and_word() {
        let result = analyze("hallo world", "hello world");
        assert_eq!(result.error_chars, chars(&['e']));
        assert_eq!(result.problem_words, words(&["hello"]));
    }

    #[test]
    fn empty_inputs_yield_empty_results() {
        assert!(analyze("", "").is_empty());
        assert!(analyze("", "hello").is_empty());
        assert!(analyze("hello", "").is_empty());
    }

    #[test]
    fn truncated_typed_text_only_compares_overlap() {
        let result = analyze("hel", "hello world");
        assert!(result.error_chars.is_empty());
        // "hel" vs "hello" is the only aligned word pair
        assert_eq!(result.problem_words, words(&["hello"]));
    }

    #[test]
    fn missing_word_misaligns_following_words() {
        // Known approximation: dropping "quick" shifts every later word.
        let result = analyze("the brown fox", "the quick brown fox");
        assert_eq!(result.problem_words, words(&["quick", "brown"]));
    }

    #[test]
    fn repeated_mistakes_collapse_into_sets() {
        let result = analyze("xxxx", "aaaa");
        assert_eq!(result.error_chars, chars(&['a']));
        assert_eq!(result.problem_words, words(&["aaaa"]));
    }

    #[test]
    fn mismatch_count_matches_overlap_minus_equal_pairs() {
        let cases = [
            ("hello", "hello"),
            ("hallo", "hello"),
            ("abc", "xyz123"),
            ("longer typed text", "short"),
            ("", "abc"),
        ];
        for (typed, target) in cases {
            let overlap = typed.chars().count().min(target.chars().count());
            let equal = typed
                .chars()
                .zip(target.chars())
                .filter(|(a, b)| a == b)
                .count();
            assert_eq!(char_mismatch_count(typed, target), overlap - equal);
        }
    }

    #[test]
    fn works_on_multibyte_characters() {
        let result = analyze("naive cafe", "naïve café");
        assert_eq!(result.error_chars, chars(&['ï', 'é']));
        assert_eq!(result.problem_words, words(&["naïve", "café"]));
    }
}
