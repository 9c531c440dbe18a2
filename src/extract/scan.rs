// src/extract/scan.rs

//! Text scanning and word filtering.
//!
//! Splits a byte stream into lowercase alphanumeric words, dropping stop
//! words and bare integers. The same scanner feeds both document indexing
//! and query tokenization, so the two sides agree on what a term is.

use std::collections::HashSet;
use std::io::Read;
use std::sync::OnceLock;

use crate::error::Result;

/// Embedded stop-word list, one word per line.
static STOP_WORDS_DATA: &str = include_str!("stop_words.txt");

static STOP_WORDS: OnceLock<HashSet<&'static str>> = OnceLock::new();

fn stop_words() -> &'static HashSet<&'static str> {
    STOP_WORDS.get_or_init(|| {
        STOP_WORDS_DATA
            .lines()
            .map(str::trim)
            .filter(|w| !w.is_empty())
            .collect()
    })
}

/// Iterator over the lowercase alphanumeric words of a string.
///
/// A word is the longest run of Unicode letters or digits; every other
/// character is a separator. No filtering is applied here.
pub struct Words<'a> {
    rest: &'a str,
}

impl<'a> Words<'a> {
    pub fn new(text: &'a str) -> Self {
        Self { rest: text }
    }
}

impl Iterator for Words<'_> {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        let start = self.rest.find(|c: char| c.is_alphanumeric())?;
        let tail = &self.rest[start..];
        let end = tail
            .find(|c: char| !c.is_alphanumeric())
            .unwrap_or(tail.len());
        self.rest = &tail[end..];
        Some(tail[..end].to_lowercase())
    }
}

/// True if the word parses as a base-10 integer.
fn is_integer_word(word: &str) -> bool {
    word.parse::<i64>().is_ok()
}

/// Scan a string into filtered, lowercase words.
///
/// Stop words and integers are removed after lowercasing.
pub fn scan_str(text: &str) -> Vec<String> {
    Words::new(text)
        .filter(|w| !stop_words().contains(w.as_str()) && !is_integer_word(w))
        .collect()
}

/// Scan a byte reader into filtered, lowercase words.
///
/// Invalid UTF-8 sequences are replaced rather than rejected. Fails only
/// if the underlying reader errors.
pub fn scan<R: Read>(mut reader: R) -> Result<Vec<String>> {
    let mut buf = Vec::with_capacity(4096);
    reader.read_to_end(&mut buf)?;
    Ok(scan_str(&String::from_utf8_lossy(&buf)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_case_insensitive() {
        assert_eq!(
            scan_str("Hello, HELLO hello"),
            vec!["hello", "hello", "hello"]
        );
    }

    #[test]
    fn test_drops_integers_and_stop_words() {
        assert_eq!(scan_str("the 42 crawlers"), vec!["crawlers"]);
        assert_eq!(scan_str("42"), Vec::<String>::new());
    }

    #[test]
    fn test_punctuation_separates_words() {
        assert_eq!(
            scan_str("rust-lang.org: systems programming"),
            vec!["rust", "lang", "org", "systems", "programming"]
        );
    }

    #[test]
    fn test_mixed_alphanumeric_is_kept() {
        // "bm25" contains digits but is not a bare integer
        assert_eq!(scan_str("BM25 ranking"), vec!["bm25", "ranking"]);
    }

    #[test]
    fn test_stop_word_filter_applies_after_lowercasing() {
        assert_eq!(scan_str("The THE the word"), vec!["word"]);
    }

    #[test]
    fn test_empty_and_separator_only_input() {
        assert_eq!(scan_str(""), Vec::<String>::new());
        assert_eq!(scan_str("... !!! \t\n"), Vec::<String>::new());
    }

    #[test]
    fn test_scan_reader_matches_scan_str() {
        let text = "Hello world";
        let from_reader = scan(text.as_bytes()).unwrap();
        assert_eq!(from_reader, scan_str(text));
    }

    #[test]
    fn test_unicode_words() {
        assert_eq!(scan_str("caf\u{e9} au lait"), vec!["caf\u{e9}", "au", "lait"]);
    }
}
