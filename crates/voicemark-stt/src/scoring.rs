//! Token-set similarity scoring.
//!
//! Transcripts are compared to the expected command description with the
//! Sørensen–Dice coefficient over word sets:
//! `score = 200 * |A ∩ B| / (|A| + |B|)`, an integer in 0..=100.
//! Tokens are lowercased, stripped of punctuation, and deduplicated, so
//! word order and repetition do not affect the score.

use std::collections::HashSet;

/// Split text into a normalized token set.
///
/// Non-alphanumeric characters are dropped inside words, which handles
/// both ASCII punctuation and attached quotes around Cyrillic words.
pub fn tokens(text: &str) -> HashSet<String> {
    text.to_lowercase()
        .split_whitespace()
        .map(|word| word.chars().filter(|c| c.is_alphanumeric()).collect::<String>())
        .filter(|word| !word.is_empty())
        .collect()
}

/// Sørensen–Dice similarity between two texts, 0..=100.
///
/// Defined as 0 when both token sets are empty. Integer floor division
/// keeps the result bounded and deterministic; identical non-empty sets
/// divide exactly to 100.
pub fn dice_score(recognized: &str, expected: &str) -> u8 {
    let a = tokens(recognized);
    let b = tokens(expected);

    let total = a.len() + b.len();
    if total == 0 {
        return 0;
    }

    let intersection = a.intersection(&b).count();
    (200 * intersection / total) as u8
}
