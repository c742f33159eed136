//! Fuzzy name matching
//!
//! Partial token-set similarity on a 0-100 scale. Tolerates word reordering,
//! extra words and partial words, so "stone brew" matches "Stone Brewing Co".

use fuzzywuzzy::fuzz;

/// Minimum score for a name to count as a match
pub const DEFAULT_MATCH_THRESHOLD: u8 = 70;

/// Partial token-set score of `query` against `name`.
///
/// Both sides are lowercased and stripped to words first. A side with no
/// words scores 0.
pub fn partial_token_set_ratio(query: &str, name: &str) -> u8 {
    if !has_words(query) || !has_words(name) {
        return 0;
    }
    fuzz::partial_token_set_ratio(query, name, false, true)
}

fn has_words(s: &str) -> bool {
    s.chars().any(char::is_alphanumeric)
}

/// Whether `name` matches the search `query` at `threshold` or better
pub fn name_matches(query: &str, name: &str, threshold: u8) -> bool {
    partial_token_set_ratio(query, name) >= threshold
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shared_word_is_full_match() {
        assert_eq!(partial_token_set_ratio("stone", "Stone Brewing Co"), 100);
        assert_eq!(partial_token_set_ratio("brewing stone", "Stone Brewing"), 100);
    }

    #[test]
    fn word_order_and_case_ignored() {
        assert_eq!(
            partial_token_set_ratio("Sierra Nevada", "nevada SIERRA"),
            100
        );
    }

    #[test]
    fn misspelling_still_matches() {
        let score = partial_token_set_ratio("guiness", "Guinness Storehouse");
        assert!(score >= DEFAULT_MATCH_THRESHOLD, "score {}", score);
    }

    #[test]
    fn unrelated_names_do_not_match() {
        assert!(!name_matches("lagunitas", "Dogfish Head", DEFAULT_MATCH_THRESHOLD));
        assert_eq!(partial_token_set_ratio("", "Dogfish Head"), 0);
        assert_eq!(partial_token_set_ratio("!!!", "Dogfish Head"), 0);
    }
}
