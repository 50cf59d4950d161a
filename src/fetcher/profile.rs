//! Fixed desktop browser profile used for outbound page requests.
//!
//! The profile is Chrome 135 on Windows 10 x64. Header names are lowercase and
//! are inserted in the order Chrome sends them on a top-level navigation, so
//! the resulting HTTP/2 HEADERS frame matches the browser's ordering. The TLS
//! side is configured on the client: TLS 1.2 minimum, ALPN offering h2 and
//! http/1.1, and gzip/brotli/deflate accepted.

use reqwest::{ClientBuilder, RequestBuilder, tls};

pub const CHROME_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/135.0.0.0 Safari/537.36";

const NAVIGATION_HEADERS: &[(&str, &str)] = &[
    (
        "accept",
        "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,image/apng,*/*;q=0.8,application/signed-exchange;v=b3;q=0.7",
    ),
    ("accept-language", "en-US,en;q=0.9"),
    ("cache-control", "max-age=0"),
    ("priority", "u=0, i"),
    (
        "sec-ch-ua",
        r#""Google Chrome";v="135", "Chromium";v="135", "Not-A.Brand";v="8""#,
    ),
    ("sec-ch-ua-arch", r#""x86""#),
    ("sec-ch-ua-mobile", "?0"),
    ("sec-ch-ua-model", r#""""#),
    ("sec-ch-ua-platform", r#""Windows""#),
    ("sec-ch-ua-platform-version", r#""19.0.0""#),
    ("sec-fetch-dest", "document"),
    ("sec-fetch-mode", "navigate"),
    ("sec-fetch-site", "none"),
    ("sec-fetch-user", "?1"),
    ("upgrade-insecure-requests", "1"),
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrowserProfile {
    pub name: &'static str,
    pub user_agent: String,
}

impl BrowserProfile {
    pub fn chrome() -> Self {
        Self {
            name: "chrome-135-windows",
            user_agent: CHROME_USER_AGENT.to_string(),
        }
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// The full header list in wire order, user agent last.
    pub fn ordered_headers(&self) -> Vec<(&'static str, &str)> {
        let mut headers: Vec<(&'static str, &str)> = NAVIGATION_HEADERS.to_vec();
        headers.push(("user-agent", self.user_agent.as_str()));
        headers
    }

    /// Attach the profile headers, then the cookie if any, to a request.
    pub fn apply(&self, mut request: RequestBuilder, cookie: Option<&str>) -> RequestBuilder {
        for (name, value) in self.ordered_headers() {
            request = request.header(name, value);
        }
        if let Some(cookie) = cookie {
            request = request.header(reqwest::header::COOKIE, cookie);
        }
        request
    }

    /// TLS and transport settings matching the browser.
    pub fn configure(&self, builder: ClientBuilder) -> ClientBuilder {
        builder
            .min_tls_version(tls::Version::TLS_1_2)
            .gzip(true)
            .brotli(true)
            .deflate(true)
    }
}

impl Default for BrowserProfile {
    fn default() -> Self {
        Self::chrome()
    }
}
