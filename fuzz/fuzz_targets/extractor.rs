#![no_main]

use libfuzzer_sys::fuzz_target;
use url::Url;

use gist::extractor::extract_readable;

fuzz_target!(|data: &[u8]| {
    let html = String::from_utf8_lossy(data);
    let base = Url::parse("https://example.com/article").unwrap();

    // Sanitize and extract must never panic, and never emit a script element
    if let Ok(doc) = extract_readable(&html, &base) {
        assert!(!doc.content_html.contains("<script"));
    }
});
