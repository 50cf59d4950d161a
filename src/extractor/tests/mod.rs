use std::fs;
use url::Url;

use crate::extractor::{ExtractError, extract_readable};

fn fixture(name: &str) -> String {
    fs::read_to_string(format!("src/extractor/tests/fixtures/{}", name))
        .expect("Failed to read test fixture")
}

#[test]
fn test_extract_article() {
    let url = Url::parse("https://example.com/article").unwrap();
    let doc = extract_readable(&fixture("article.html"), &url).unwrap();

    assert!(doc.title.as_deref().unwrap().contains("Sample Article"));
    assert_eq!(doc.site_name, Some("News Site".to_string()));
    assert!(doc.text.contains("first paragraph"));
    assert!(doc.text.contains("second paragraph"));

    let html = doc.render();
    assert!(!html.contains("<script"));
    assert!(!html.contains("<style"));
    assert!(!html.contains("onclick"));
    assert!(!html.contains("Buy now"));

    // Relative references resolve against the entry URL
    assert!(html.contains("https://example.com/related"));
    assert!(html.contains("https://example.com/images/sample.jpg"));
}

#[test]
fn test_extract_blog_post() {
    let url = Url::parse("https://blog.example.com/posts/better-software").unwrap();
    let doc = extract_readable(&fixture("blog.html"), &url).unwrap();

    assert_eq!(doc.title.as_deref(), Some("How to Build Better Software"));
    assert_eq!(doc.site_name, Some("Tech Blog".to_string()));
    assert!(doc.text.contains("Building better software"));
    assert!(doc.text.contains("Key Principles"));
    assert!(
        doc.render()
            .contains("https://blog.example.com/posts/guides/testing.html")
    );
}

#[test]
fn test_reject_script_only_page() {
    let url = Url::parse("https://example.com/app").unwrap();
    let result = extract_readable(&fixture("empty.html"), &url);

    assert_eq!(result, Err(ExtractError::NoReadableContent(url)));
}

#[test]
fn test_reject_blank_input() {
    let url = Url::parse("https://example.com/").unwrap();
    assert!(extract_readable("", &url).is_err());
    assert!(extract_readable("<html><body>  \n </body></html>", &url).is_err());
}

#[test]
fn test_minimal_valid_content() {
    let html = format!(
        r#"<!DOCTYPE html><html><head><title>Valid Article</title></head><body><article><p>{}</p></article></body></html>"#,
        "This is a valid article with enough content to pass extraction. ".repeat(20)
    );
    let url = Url::parse("https://example.com/valid").unwrap();

    let doc = extract_readable(&html, &url).unwrap();
    assert_eq!(doc.title.as_deref(), Some("Valid Article"));
    assert!(doc.text.len() > 250);
    assert_eq!(doc.url, url);
}

#[test]
fn test_malformed_html() {
    let html = "<html><head><title>Broken</title><body><p>Unclosed tags<div>More content";
    let url = Url::parse("https://example.com/broken").unwrap();

    // Malformed markup is handled without panicking
    if let Ok(doc) = extract_readable(html, &url) {
        assert_eq!(doc.title.as_deref(), Some("Broken"));
        assert!(doc.text.contains("Unclosed tags"));
    }
}

#[cfg(feature = "fuzz")]
mod fuzz {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn test_extract_never_panics(
            html in ".*",
            url in "https://[a-z]+\\.com/[a-z]*"
        ) {
            let url = Url::parse(&url).unwrap();
            let _ = extract_readable(&html, &url);
        }

        #[test]
        fn test_extract_output_has_no_script(html in ".*") {
            let url = Url::parse("https://example.com").unwrap();
            if let Ok(doc) = extract_readable(&html, &url) {
                prop_assert!(!doc.content_html.contains("<script"));
                prop_assert!(!doc.text.is_empty());
            }
        }
    }
}
