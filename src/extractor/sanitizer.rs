use std::collections::HashSet;

use ammonia::{Builder, UrlRelative};
use url::Url;

/// Structural elements kept in addition to ammonia's defaults.
const STRUCTURAL_TAGS: &[&str] = &[
    "article",
    "section",
    "header",
    "footer",
    "nav",
    "aside",
    "main",
    "figure",
    "figcaption",
];

/// Attributes allowed on every element.
const SAFE_ATTRIBUTES: &[&str] = &["id", "class", "lang", "dir"];

/// Elements removed together with everything inside them.
const DROPPED_WITH_CONTENT: &[&str] = &[
    "script", "style", "title", "noscript", "template", "iframe", "object",
];

/// Strips scripts, embeds, and event/style attributes from page HTML while
/// keeping the semantic structure readability scoring relies on.
#[derive(Debug, Default, Clone, Copy)]
pub struct ContentSanitizer;

impl ContentSanitizer {
    pub fn new() -> Self {
        Self
    }

    fn policy(&self) -> Builder<'static> {
        let mut builder = Builder::default();
        builder
            .add_tags(STRUCTURAL_TAGS.iter().copied())
            .add_generic_attributes(SAFE_ATTRIBUTES.iter().copied())
            .clean_content_tags(DROPPED_WITH_CONTENT.iter().copied().collect::<HashSet<_>>());
        builder
    }

    /// Clean a full page before extraction.
    pub fn sanitize(&self, html: &str) -> String {
        self.policy().clean(html).to_string()
    }

    /// Clean extracted content and rewrite relative `href`/`src` against `base_url`.
    pub fn sanitize_with_base(&self, html: &str, base_url: &Url) -> String {
        let mut builder = self.policy();
        builder.url_relative(UrlRelative::RewriteWithBase(base_url.clone()));
        builder.clean(html).to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_removes_script_and_keeps_article() {
        let html = "<article><script>evil()</script><p>Hello</p></article>";
        let clean = ContentSanitizer::new().sanitize(html);

        assert!(clean.contains("<article>"));
        assert!(clean.contains("<p>Hello</p>"));
        assert!(!clean.contains("<script"));
        assert!(!clean.contains("evil()"));
    }

    #[test]
    fn test_sanitize_removes_dangerous_elements() {
        let html = r#"<p>Hello world</p><script>alert('xss')</script><style>body{color:red}</style><iframe src="https://ads.example.com"></iframe>"#;
        let clean = ContentSanitizer::new().sanitize(html);

        assert!(!clean.contains("<script"));
        assert!(!clean.contains("<style"));
        assert!(!clean.contains("<iframe"));
        assert!(clean.contains("<p>Hello world</p>"));
    }

    #[test]
    fn test_sanitize_keeps_structure_and_safe_attributes() {
        let html = r#"<main id="content" class="post" lang="en" dir="ltr" onclick="steal()" style="color:red"><section><header>Head</header><figure><figcaption>Cap</figcaption></figure><aside>Side</aside><nav>Nav</nav><footer>Foot</footer></section></main>"#;
        let clean = ContentSanitizer::new().sanitize(html);

        for tag in STRUCTURAL_TAGS {
            assert!(clean.contains(&format!("<{}", tag)), "missing <{}>", tag);
        }
        assert!(clean.contains(r#"id="content""#));
        assert!(clean.contains(r#"class="post""#));
        assert!(clean.contains(r#"lang="en""#));
        assert!(clean.contains(r#"dir="ltr""#));
        assert!(!clean.contains("onclick"));
        assert!(!clean.contains("style="));
    }

    #[test]
    fn test_sanitize_drops_title_text() {
        let html = "<html><head><title>Page Title</title></head><body><p>Body</p></body></html>";
        let clean = ContentSanitizer::new().sanitize(html);

        assert!(!clean.contains("Page Title"));
        assert!(clean.contains("<p>Body</p>"));
    }

    #[test]
    fn test_resolve_relative_links() {
        let html = r#"<p><a href="/page">Click here</a></p><img src="image.jpg" alt="test">"#;
        let base_url = Url::parse("https://example.com/article/").unwrap();
        let clean = ContentSanitizer::new().sanitize_with_base(html, &base_url);

        assert!(clean.contains("https://example.com/page"));
        assert!(clean.contains("https://example.com/article/image.jpg"));
    }

    #[test]
    fn test_javascript_urls_are_removed() {
        let html = r#"<a href="javascript:alert(1)">x</a>"#;
        let clean = ContentSanitizer::new().sanitize(html);

        assert!(!clean.contains("javascript:"));
    }
}
