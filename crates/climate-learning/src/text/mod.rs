//! Text normalisation and feature extraction for the sentiment pipeline.
//!
//! - [`clean_text`]: lowercase, strip digits and punctuation, trim
//! - [`tokenize`] / [`ngrams`]: word tokens without stop words, joined into
//!   unigrams and bigrams
//! - [`TfidfVectorizer`]: sparse TF-IDF rows for [`LogisticRegression`]
//!
//! [`LogisticRegression`]: crate::estimators::LogisticRegression

mod stop_words;
mod tfidf;

pub use stop_words::is_stop_word;
pub use tfidf::TfidfVectorizer;

use once_cell::sync::Lazy;
use regex::Regex;

static DIGITS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d+").expect("Invalid regex: digits"));

static PUNCTUATION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r##"[!"#$%&'()*+,\-./:;<=>?@\[\\\]^_`{|}~]"##).expect("Invalid regex: punctuation")
});

static TOKEN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b\w\w+\b").expect("Invalid regex: token"));

/// Normalise raw text: lowercase, remove digits, remove ASCII punctuation and
/// trim surrounding whitespace.
///
/// Applying it twice gives the same result as applying it once.
pub fn clean_text(text: &str) -> String {
    let lowered = text.to_lowercase();
    let without_digits = DIGITS.replace_all(&lowered, "");
    let without_punctuation = PUNCTUATION.replace_all(&without_digits, "");
    without_punctuation.trim().to_string()
}

/// Split `text` into lowercase word tokens of two or more characters,
/// dropping English stop words.
pub fn tokenize(text: &str) -> Vec<String> {
    let lowered = text.to_lowercase();
    TOKEN
        .find_iter(&lowered)
        .map(|m| m.as_str())
        .filter(|token| !is_stop_word(token))
        .map(str::to_string)
        .collect()
}

/// Unigrams followed by space-joined bigrams of `tokens`.
pub fn ngrams(tokens: &[String]) -> Vec<String> {
    let mut grams = tokens.to_vec();
    grams.extend(tokens.windows(2).map(|pair| pair.join(" ")));
    grams
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_text() {
        assert_eq!(clean_text("  Great, CLEAN energy!!  "), "great clean energy");
        assert_eq!(clean_text("CO2 levels rose 15% in 2023."), "co levels rose  in");
        assert_eq!(clean_text("it's [very] {bad}"), "its very bad");
        assert_eq!(clean_text("123 ..."), "");
    }

    #[test]
    fn test_clean_text_is_idempotent() {
        for text in [
            "Hello, World! 42",
            "  spaced   out  ",
            "émissions: ÉLEVÉES 3x",
            "a-b_c/d\\e",
            "",
            "5 . 5",
        ] {
            let once = clean_text(text);
            assert_eq!(clean_text(&once), once, "input: {text:?}");
        }
    }

    #[test]
    fn test_tokenize_drops_stop_words_and_short_tokens() {
        let tokens = tokenize("the sea is a very warm place x");
        assert_eq!(tokens, vec!["sea", "warm", "place"]);
    }

    #[test]
    fn test_ngrams() {
        let tokens = tokenize("great clean energy");
        assert_eq!(
            ngrams(&tokens),
            vec![
                "great",
                "clean",
                "energy",
                "great clean",
                "clean energy"
            ]
        );
        assert!(ngrams(&[]).is_empty());
    }
}
