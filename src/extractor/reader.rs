use std::sync::LazyLock;

use readability::extractor;
use scraper::{Html, Selector};
use tracing::debug;
use url::Url;

use crate::extractor::model::{PageMetadata, ReadabilityResult};

/// Minimum text for a fallback container to count as the article.
const FALLBACK_MIN_TEXT: usize = 100;

const CONTENT_SELECTORS: &[&str] = &[
    "article",
    "main",
    "[role='main']",
    ".content",
    ".post",
    ".article",
    "#content",
    "#main",
    ".entry-content",
];

static OG_SITE_NAME: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("meta[property='og:site_name']").unwrap());
static OG_TITLE: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("meta[property='og:title']").unwrap());
static TITLE: LazyLock<Selector> = LazyLock::new(|| Selector::parse("title").unwrap());
static H1: LazyLock<Selector> = LazyLock::new(|| Selector::parse("h1").unwrap());
static BODY: LazyLock<Selector> = LazyLock::new(|| Selector::parse("body").unwrap());

pub fn extract(html: &str, url: &Url) -> Option<ReadabilityResult> {
    match extractor::extract(&mut html.as_bytes(), url) {
        Ok(article) => Some(ReadabilityResult {
            text: article.text,
            html: article.content,
        }),
        Err(_) => {
            debug!("readability failed, using fallback");
            fallback_extract(html)
        }
    }
}

pub fn metadata(html: &str) -> PageMetadata {
    let document = Html::parse_document(html);
    let page_title = first_text(&document, &TITLE);

    PageMetadata {
        title: first_content(&document, &OG_TITLE)
            .or_else(|| page_title.clone())
            .or_else(|| first_text(&document, &H1)),
        site_name: first_content(&document, &OG_SITE_NAME)
            .or_else(|| page_title.as_deref().and_then(site_from_title)),
    }
}

fn first_content(document: &Html, selector: &Selector) -> Option<String> {
    document
        .select(selector)
        .filter_map(|element| element.value().attr("content"))
        .map(str::trim)
        .find(|content| !content.is_empty())
        .map(str::to_string)
}

fn first_text(document: &Html, selector: &Selector) -> Option<String> {
    document
        .select(selector)
        .map(|element| element.text().collect::<String>().trim().to_string())
        .find(|text| !text.is_empty())
}

/// "Article Title - Site Name" or "Article Title | Site Name".
fn site_from_title(title: &str) -> Option<String> {
    [" - ", " | "]
        .iter()
        .find_map(|sep| title.rfind(sep).map(|pos| title[pos + sep.len()..].trim().to_string()))
        .filter(|site| !site.is_empty())
}

fn fallback_extract(html: &str) -> Option<ReadabilityResult> {
    let document = Html::parse_document(html);

    for selector_str in CONTENT_SELECTORS {
        let Ok(selector) = Selector::parse(selector_str) else {
            continue;
        };
        if let Some(element) = document
            .select(&selector)
            .find(|element| element.text().collect::<String>().trim().len() > FALLBACK_MIN_TEXT)
        {
            return Some(ReadabilityResult {
                text: element.text().collect(),
                html: element.html(),
            });
        }
    }

    let body = document.select(&BODY).next()?;
    let text: String = body.text().collect();
    if text.trim().is_empty() {
        return None;
    }
    Some(ReadabilityResult {
        text,
        html: body.inner_html(),
    })
}
