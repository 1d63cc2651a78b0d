//! Text normalization shared by the matcher, the parser and the cache keys

use unicode_normalization::UnicodeNormalization;
use unicode_segmentation::UnicodeSegmentation;

/// Split text into normalized tokens
///
/// - Unicode NFKC normalization followed by lower-casing
/// - Word segmentation per UAX #29, punctuation dropped
/// - Words are split where digits meet letters, so `3BHK` yields `3` and `bhk`
pub fn tokenize(text: &str) -> Vec<String> {
    let folded = text.nfkc().collect::<String>().to_lowercase();
    let mut tokens = Vec::new();

    for word in folded.unicode_words() {
        let mut current = String::new();
        let mut current_is_digit: Option<bool> = None;

        for ch in word.chars().filter(|c| c.is_alphanumeric()) {
            let is_digit = ch.is_numeric();
            if current_is_digit.is_some_and(|d| d != is_digit) {
                tokens.push(std::mem::take(&mut current));
            }
            current_is_digit = Some(is_digit);
            current.push(ch);
        }

        if !current.is_empty() {
            tokens.push(current);
        }
    }

    tokens
}

/// Canonical form of a text: its tokens joined by a single space
pub fn normalize_text(text: &str) -> String {
    tokenize(text).join(" ")
}

/// True when a token consists only of digits
pub fn is_numeric_token(token: &str) -> bool {
    !token.is_empty() && token.chars().all(char::is_numeric)
}
