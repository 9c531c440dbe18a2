// src/extract/html.rs

//! HTML parsing and content extraction.
//!
//! Parses a fetched page, gates on the document language, then walks the
//! DOM depth-first collecting outbound links and the visible text terms
//! that feed the inverted index.

use std::collections::HashMap;

use scraper::{Html, Node};
use sha2::{Digest, Sha256};

use crate::error::{AppError, Result};
use crate::extract::language::Language;
use crate::extract::scan::scan_str;

/// Element names whose text content is never visible to a reader.
const HIDDEN_PARENTS: [&str; 4] = ["script", "style", "head", "noscript"];

/// Snippets stop growing past this many bytes.
const SNIPPET_MAX: usize = 240;

/// Content extracted from a single HTML document.
#[derive(Debug, Clone)]
pub struct Extracted {
    /// `href` values of every `<a>` element, in document order
    pub links: Vec<String>,
    /// Term to raw frequency map over the filtered token stream
    pub term_freqs: HashMap<String, i32>,
    /// Hex SHA-256 over the filtered tokens in document order
    pub hash: String,
    /// Total token count, including repeats
    pub len: i32,
    /// Text of the first `<title>` element, if any
    pub title: Option<String>,
    /// Leading visible body text, truncated to a display-friendly length
    pub snippet: Option<String>,
}

/// Parses HTML documents and validates language support.
pub struct HtmlParser {
    langs: Vec<Language>,
}

impl HtmlParser {
    pub fn new(langs: Vec<Language>) -> Self {
        Self { langs }
    }

    /// Parse an HTML document and check its declared language.
    ///
    /// A length-2 `lang` value is read as ISO 639-1, a length-3 value as
    /// ISO 639-3; anything else is rejected. Documents without a `lang`
    /// attribute are accepted, since nothing contradicts the supported
    /// set. A later NLP detector could tighten this.
    pub fn parse(&self, html: &str) -> Result<Html> {
        let doc = Html::parse_document(html);
        self.check_language(&doc)?;
        Ok(doc)
    }

    fn check_language(&self, doc: &Html) -> Result<()> {
        let root = doc.root_element();
        let Some(value) = root.value().attr("lang") else {
            return Ok(());
        };

        match Language::from_iso_code(value) {
            Some(lang) if self.langs.contains(&lang) => Ok(()),
            _ => Err(AppError::UnsupportedLanguage(value.to_string())),
        }
    }
}

/// Extract links, terms, and the content hash from a parsed document.
///
/// The traversal is depth-first in document order. The hash covers the
/// filtered token stream, so two pages differing only in stop words or
/// markup collapse to the same hash.
pub fn extract(doc: &Html) -> Extracted {
    let mut links = Vec::new();
    let mut term_freqs: HashMap<String, i32> = HashMap::new();
    let mut hasher = Sha256::new();
    let mut len = 0;
    let mut title: Option<String> = None;
    let mut snippet = String::new();

    for node in doc.root_element().descendants() {
        match node.value() {
            Node::Element(el) if el.name() == "a" => {
                if let Some(href) = el.attr("href") {
                    links.push(href.to_string());
                }
            }
            Node::Text(text) => {
                let content: &str = &text.text;
                let parent = node
                    .parent()
                    .and_then(|p| p.value().as_element().map(|el| el.name()));
                // Visible text only: parent must not be a hidden element
                // and the trimmed content must be non-empty.
                if parent.is_some_and(|name| HIDDEN_PARENTS.contains(&name)) {
                    continue;
                }
                let trimmed = content.trim();
                if trimmed.is_empty() {
                    continue;
                }

                if parent == Some("title") {
                    if title.is_none() {
                        title = Some(trimmed.to_string());
                    }
                } else if snippet.len() < SNIPPET_MAX {
                    if !snippet.is_empty() {
                        snippet.push(' ');
                    }
                    snippet.push_str(trimmed);
                }

                for word in scan_str(content) {
                    hasher.update(word.as_bytes());
                    *term_freqs.entry(word).or_insert(0) += 1;
                    len += 1;
                }
            }
            _ => {}
        }
    }

    Extracted {
        links,
        term_freqs,
        hash: format!("{:x}", hasher.finalize()),
        len,
        title,
        snippet: truncate_snippet(snippet),
    }
}

/// Cap the snippet at `SNIPPET_MAX` bytes on a character boundary.
fn truncate_snippet(mut snippet: String) -> Option<String> {
    if snippet.is_empty() {
        return None;
    }
    if snippet.len() > SNIPPET_MAX {
        let mut end = SNIPPET_MAX;
        while !snippet.is_char_boundary(end) {
            end -= 1;
        }
        snippet.truncate(end);
    }
    Some(snippet)
}
