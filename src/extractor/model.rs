use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use url::Url;

static SPACE_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[ \t]+").unwrap());
static NEWLINE_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n\s*\n+").unwrap());

/// Canonical article produced by extraction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadableDocument {
    pub url: Url,
    pub title: Option<String>,
    pub site_name: Option<String>,
    pub text: String,
    pub content_html: String,
}

impl ReadableDocument {
    /// HTML stored as the entry's readable content.
    pub fn render(&self) -> String {
        self.content_html.trim().to_string()
    }
}

#[derive(Debug)]
pub struct ReadabilityResult {
    pub text: String,
    pub html: String,
}

/// Title and site name read from the page head before sanitizing drops it.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PageMetadata {
    pub title: Option<String>,
    pub site_name: Option<String>,
}

pub fn normalize_whitespace(text: &str) -> String {
    let spaced = SPACE_REGEX.replace_all(text.trim(), " ");
    NEWLINE_REGEX.replace_all(&spaced, "\n\n").to_string()
}
