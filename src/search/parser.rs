//! Query Parser & Preprocessor
//!
//! Parses and tokenizes search queries, extracts quoted text,
//! and filters stop words.

use super::text::{normalize_text, tokenize};

/// Stop words that carry no weight as individual search terms
const STOP_WORDS: &[&str] = &[
    "a", "an", "and", "are", "as", "at", "be", "by", "for", "from", "has", "in", "is", "it",
    "its", "of", "on", "or", "that", "the", "to", "was", "will", "with", "near",
];

/// Parsed and processed search query
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedQuery {
    /// Original unmodified query
    pub original: String,
    /// Whole query in normalized form
    pub normalized: String,
    /// Search terms (stop words removed unless nothing else is left)
    pub terms: Vec<String>,
    /// Normalized phrases; fields containing them verbatim score higher
    pub quoted_phrases: Vec<String>,
}

impl ParsedQuery {
    /// A query with no usable terms matches nothing
    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }
}

/// Query parser and preprocessor
pub struct QueryParser;

impl QueryParser {
    /// Parse a search query into its components
    pub fn parse(query: &str) -> ParsedQuery {
        let (phrases, query_without_quotes) = Self::extract_quoted_phrases(query);

        let quoted_phrases: Vec<String> = phrases
            .iter()
            .map(|p| normalize_text(p))
            .filter(|p| !p.is_empty())
            .collect();

        let mut tokens = tokenize(&query_without_quotes);
        for phrase in &quoted_phrases {
            tokens.extend(phrase.split(' ').map(str::to_string));
        }

        ParsedQuery {
            original: query.to_string(),
            normalized: normalize_text(query),
            terms: Self::filter_stop_words(tokens),
            quoted_phrases,
        }
    }

    /// Extract quoted phrases (both single and double quotes)
    /// Returns (quoted_phrases, query_with_quotes_removed)
    fn extract_quoted_phrases(query: &str) -> (Vec<String>, String) {
        let mut phrases = Vec::new();
        let mut remaining = String::new();
        let mut chars = query.chars().peekable();
        let mut prev: Option<char> = None;

        while let Some(&ch) = chars.peek() {
            // An apostrophe inside a word ("queen's") is not a quote
            let opens_quote =
                ch == '"' || (ch == '\'' && prev.map_or(true, |p| p.is_whitespace()));

            if opens_quote {
                let quote_char = ch;
                chars.next();

                let mut phrase = String::new();
                let mut found_closing = false;

                while let Some(&ch) = chars.peek() {
                    if ch == quote_char {
                        chars.next();
                        found_closing = true;
                        break;
                    } else if ch == '\\' {
                        chars.next();
                        if let Some(&next_ch) = chars.peek() {
                            phrase.push(next_ch);
                            chars.next();
                        }
                    } else {
                        phrase.push(ch);
                        chars.next();
                    }
                }

                if found_closing && !phrase.is_empty() {
                    phrases.push(phrase);
                    remaining.push(' ');
                } else if !found_closing {
                    // Unclosed quote - treat the quote literally
                    remaining.push(quote_char);
                    remaining.push_str(&phrase);
                }
                prev = Some(quote_char);
            } else {
                remaining.push(ch);
                prev = Some(ch);
                chars.next();
            }
        }

        (phrases, remaining)
    }

    fn filter_stop_words(tokens: Vec<String>) -> Vec<String> {
        let filtered: Vec<String> = tokens
            .iter()
            .filter(|t| !is_stop_word(t))
            .cloned()
            .collect();

        if filtered.is_empty() {
            tokens
        } else {
            filtered
        }
    }
}

/// Check if a word is a stop word
pub fn is_stop_word(word: &str) -> bool {
    STOP_WORDS.contains(&word)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_parsing() {
        let parsed = QueryParser::parse("3 BHK Mumbai");
        assert_eq!(parsed.original, "3 BHK Mumbai");
        assert_eq!(parsed.normalized, "3 bhk mumbai");
        assert_eq!(parsed.terms, vec!["3", "bhk", "mumbai"]);
        assert!(parsed.quoted_phrases.is_empty());
    }

    #[test]
    fn test_quoted_phrases() {
        let parsed = QueryParser::parse(r#"villa "Marine Drive" sea"#);
        assert_eq!(parsed.quoted_phrases, vec!["marine drive"]);
        assert_eq!(parsed.terms, vec!["villa", "sea", "marine", "drive"]);
    }

    #[test]
    fn test_single_quotes() {
        let parsed = QueryParser::parse("flat 'bandra west'");
        assert_eq!(parsed.quoted_phrases, vec!["bandra west"]);
    }

    #[test]
    fn test_apostrophe_is_not_a_quote() {
        let parsed = QueryParser::parse("queen's road flat");
        assert!(parsed.quoted_phrases.is_empty());
        assert_eq!(parsed.terms, vec!["queens", "road", "flat"]);
    }

    #[test]
    fn test_stop_words_filtering() {
        let parsed = QueryParser::parse("flat in the city");
        assert_eq!(parsed.terms, vec!["flat", "city"]);
    }

    #[test]
    fn test_only_stop_words_kept() {
        let parsed = QueryParser::parse("the and or");
        assert_eq!(parsed.terms, vec!["the", "and", "or"]);
    }

    #[test]
    fn test_escaped_quotes() {
        let parsed = QueryParser::parse(r#""quote with \" inside""#);
        assert_eq!(parsed.quoted_phrases, vec!["quote with inside"]);
    }

    #[test]
    fn test_unclosed_quote() {
        let parsed = QueryParser::parse(r#"pune "unclosed villa"#);
        assert!(parsed.quoted_phrases.is_empty());
        assert_eq!(parsed.terms, vec!["pune", "unclosed", "villa"]);
    }

    #[test]
    fn test_empty_and_punctuation_queries() {
        assert!(QueryParser::parse("").is_empty());
        assert!(QueryParser::parse("   ").is_empty());
        assert!(QueryParser::parse("?!; --").is_empty());
    }
}
