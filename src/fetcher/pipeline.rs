use crate::fetcher::{
    errors::FetchError,
    types::{Charset, PageResponse, ResponseCookie},
};
use bytes::Bytes;
use chrono::Utc;
use encoding_rs::Encoding;
use regex::Regex;
use reqwest::{StatusCode, header::HeaderMap};
use std::sync::LazyLock;
use tracing::warn;
use url::Url;

/// How far into the body `<meta>` charset declarations are searched.
const META_SNIFF_BYTES: usize = 4096;

static CHARSET_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)charset\s*=\s*["']?([^"'\s;]+)"#).unwrap());

static META_CHARSET_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)<meta\s+[^>]*?charset\s*=\s*["']?([^"'\s/>]+)"#).unwrap());

static META_HTTP_EQUIV_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)<meta\s+[^>]*?http-equiv\s*=\s*["']?content-type["']?[^>]*?content\s*=\s*["']?[^"'>]*?charset\s*=\s*([^"'\s;/>]+)"#).unwrap()
});

/// Raw pieces of a successful response, before decoding.
pub struct RawResponse {
    pub url_final: Url,
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub cookies: Vec<ResponseCookie>,
    pub body: Bytes,
    pub content_type: String,
}

pub fn process_response(raw: RawResponse) -> Result<PageResponse, FetchError> {
    let charset = detect_charset(&raw.content_type, &raw.body);
    let body_utf8 = decode_to_utf8(&raw.body, &charset);

    Ok(PageResponse {
        url_final: raw.url_final,
        status: raw.status,
        headers: raw.headers,
        cookies: raw.cookies,
        body_raw: raw.body,
        body_utf8,
        charset,
        fetched_at: Utc::now(),
    })
}

fn encoding_from_match(regex: &Regex, haystack: &str) -> Option<&'static Encoding> {
    let label = regex.captures(haystack)?.get(1)?.as_str().to_lowercase();
    Encoding::for_label(label.as_bytes())
}

fn detect_charset(content_type: &str, body_bytes: &[u8]) -> Charset {
    // 1. Content-Type header
    if let Some(encoding) = encoding_from_match(&CHARSET_REGEX, content_type) {
        return Charset::from_encoding(encoding);
    }

    // 2. <meta charset> or <meta http-equiv> near the top of the document
    let search_bytes = &body_bytes[..body_bytes.len().min(META_SNIFF_BYTES)];
    let search_str = String::from_utf8_lossy(search_bytes);
    if let Some(encoding) = encoding_from_match(&META_CHARSET_REGEX, &search_str)
        .or_else(|| encoding_from_match(&META_HTTP_EQUIV_REGEX, &search_str))
    {
        return Charset::from_encoding(encoding);
    }

    // 3. Heuristic detection
    let mut detector = chardetng::EncodingDetector::new();
    detector.feed(search_bytes, false);
    Charset::from_encoding(detector.guess(None, true))
}

/// Decode leniently: malformed sequences become U+FFFD rather than failing the page.
fn decode_to_utf8(body_bytes: &[u8], charset: &Charset) -> String {
    let encoding = match charset {
        Charset::Utf8 => encoding_rs::UTF_8,
        Charset::Latin1 | Charset::Iso88591 => encoding_rs::WINDOWS_1252,
        Charset::Windows1252 => encoding_rs::WINDOWS_1252,
        Charset::ShiftJis => encoding_rs::SHIFT_JIS,
        Charset::Gb2312 => encoding_rs::GBK,
        Charset::Big5 => encoding_rs::BIG5,
        Charset::Other(name) => Encoding::for_label(name.as_bytes()).unwrap_or(encoding_rs::UTF_8),
    };

    let (decoded, _encoding, had_errors) = encoding.decode(body_bytes);

    if had_errors {
        warn!(
            encoding = encoding.name(),
            "body contains malformed sequences, replaced with U+FFFD"
        );
    }

    decoded.into_owned()
}
