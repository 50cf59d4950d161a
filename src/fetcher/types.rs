use bytes::Bytes;
use chrono::{DateTime, Utc};
use reqwest::{StatusCode, header::HeaderMap};
use serde::{Deserialize, Serialize};
use std::time::{Duration, SystemTime};
use url::Url;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Charset {
    Utf8,
    Latin1,
    Windows1252,
    Iso88591,
    ShiftJis,
    Gb2312,
    Big5,
    Other(String),
}

impl Charset {
    pub fn from_encoding(encoding: &'static encoding_rs::Encoding) -> Self {
        use std::ptr;

        if ptr::eq(encoding, encoding_rs::UTF_8) {
            Self::Utf8
        } else if ptr::eq(encoding, encoding_rs::WINDOWS_1252) {
            Self::Windows1252
        } else if ptr::eq(encoding, encoding_rs::SHIFT_JIS) {
            Self::ShiftJis
        } else if ptr::eq(encoding, encoding_rs::GBK) || ptr::eq(encoding, encoding_rs::GB18030) {
            Self::Gb2312
        } else if ptr::eq(encoding, encoding_rs::BIG5) {
            Self::Big5
        } else {
            Self::Other(encoding.name().to_string())
        }
    }
}

/// A cookie set by the origin on a response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseCookie {
    pub name: String,
    pub value: String,
    pub max_age: Option<Duration>,
    pub expires: Option<SystemTime>,
}

impl ResponseCookie {
    pub fn from_reqwest(cookie: &reqwest::cookie::Cookie<'_>) -> Self {
        Self {
            name: cookie.name().to_string(),
            value: cookie.value().to_string(),
            max_age: cookie.max_age(),
            expires: cookie.expires(),
        }
    }

    /// `name=value` as sent back in a `Cookie` header.
    pub fn pair(&self) -> String {
        format!("{}={}", self.name, self.value)
    }

    /// Lifetime granted by the server. `Max-Age` wins over `Expires`.
    pub fn ttl(&self) -> Option<Duration> {
        if let Some(max_age) = self.max_age {
            return Some(max_age);
        }
        self.expires
            .and_then(|expires| expires.duration_since(SystemTime::now()).ok())
    }
}

/// Join cookies into a single `Cookie` header value.
pub fn cookie_header(cookies: &[ResponseCookie]) -> String {
    cookies
        .iter()
        .map(ResponseCookie::pair)
        .collect::<Vec<_>>()
        .join("; ")
}

#[derive(Debug)]
pub struct PageResponse {
    pub url_final: Url,
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub cookies: Vec<ResponseCookie>,
    pub body_raw: Bytes,
    pub body_utf8: String,
    pub charset: Charset,
    pub fetched_at: DateTime<Utc>,
}
