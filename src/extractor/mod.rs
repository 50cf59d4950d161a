pub mod model;
pub mod reader;
pub mod sanitizer;

#[cfg(test)]
mod tests;

pub use model::ReadableDocument;
pub use sanitizer::ContentSanitizer;

use thiserror::Error;
use url::Url;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExtractError {
    #[error("no readable content found at {0}")]
    NoReadableContent(Url),
}

/// Turn a fetched page into a sanitized article document.
///
/// The page is sanitized before scoring, so scripts and event handlers never
/// reach the extractor, and sanitized again afterwards with `base_url` so
/// relative links in the result are absolute. Blank output is an error.
pub fn extract_readable(raw_html: &str, base_url: &Url) -> Result<ReadableDocument, ExtractError> {
    let sanitizer = ContentSanitizer::new();

    // Head metadata is read first; the sanitizer drops <title> and <meta>.
    let metadata = reader::metadata(raw_html);
    let clean_page = sanitizer.sanitize(raw_html);

    let result = reader::extract(&clean_page, base_url)
        .ok_or_else(|| ExtractError::NoReadableContent(base_url.clone()))?;

    let content_html = sanitizer.sanitize_with_base(&result.html, base_url);
    let text = model::normalize_whitespace(&result.text);

    if text.is_empty() || content_html.trim().is_empty() {
        return Err(ExtractError::NoReadableContent(base_url.clone()));
    }

    Ok(ReadableDocument {
        url: base_url.clone(),
        title: metadata.title,
        site_name: metadata.site_name,
        text,
        content_html,
    })
}
