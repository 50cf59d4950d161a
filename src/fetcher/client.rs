use std::sync::Arc;
use std::time::Duration;

use bytes::BytesMut;
use reqwest::{Client, ClientBuilder, StatusCode, redirect};
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument};
use url::Url;

use crate::fetcher::{
    cookie_cache::{HostChallengeCache, host_key},
    errors::FetchError,
    pipeline::{RawResponse, process_response},
    profile::BrowserProfile,
    types::{PageResponse, ResponseCookie},
};

const MAX_BODY_SIZE: u64 = 5 * 1024 * 1024; // 5MB

#[derive(Debug, Clone)]
pub struct FetchConfig {
    pub profile: BrowserProfile,
    pub request_timeout: Duration,
    pub connect_timeout: Duration,
    pub max_redirects: usize,
    pub max_body_size: u64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            profile: BrowserProfile::chrome(),
            request_timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
            max_redirects: 10,
            max_body_size: MAX_BODY_SIZE,
        }
    }
}

/// Status and cookies of a request whose redirect was not followed.
#[derive(Debug)]
pub struct HandshakeResponse {
    pub status: StatusCode,
    pub cookies: Vec<ResponseCookie>,
}

/// Long-lived outbound HTTP session presenting a fixed browser fingerprint.
///
/// Both inner clients share connection pools across clones of the `Arc` that
/// owns this value; they are released when the last owner drops it.
pub struct FingerprintedFetcher {
    client: Client,
    handshake_client: Client,
    profile: BrowserProfile,
    cache: Arc<HostChallengeCache>,
    max_body_size: u64,
}

impl FingerprintedFetcher {
    pub fn new(config: FetchConfig, cache: Arc<HostChallengeCache>) -> Result<Self, FetchError> {
        let base = |policy: redirect::Policy| -> ClientBuilder {
            config
                .profile
                .configure(ClientBuilder::new())
                .connect_timeout(config.connect_timeout)
                .timeout(config.request_timeout)
                .redirect(policy)
        };

        let client = base(redirect::Policy::limited(config.max_redirects))
            .build()
            .map_err(FetchError::from_reqwest_error)?;
        let handshake_client = base(redirect::Policy::none())
            .build()
            .map_err(FetchError::from_reqwest_error)?;

        Ok(Self {
            client,
            handshake_client,
            profile: config.profile,
            cache,
            max_body_size: config.max_body_size,
        })
    }

    pub fn cache(&self) -> &Arc<HostChallengeCache> {
        &self.cache
    }

    pub fn profile(&self) -> &BrowserProfile {
        &self.profile
    }

    /// GET `url` as the browser profile.
    ///
    /// Cookie precedence is `override_cookie`, then the cached access cookie
    /// for the URL's host, then none. Anything other than `200 OK` is an error.
    #[instrument(skip_all, fields(url = %url))]
    pub async fn fetch(
        &self,
        url: &str,
        override_cookie: Option<&str>,
        cancel: &CancellationToken,
    ) -> Result<PageResponse, FetchError> {
        let parsed_url = validate_url(url)?;

        let cookie = match override_cookie {
            Some(cookie) => Some(cookie.to_string()),
            None => host_key(&parsed_url).and_then(|host| self.cache.get(&host)),
        };
        debug!(
            has_cookie = cookie.is_some(),
            overridden = override_cookie.is_some(),
            "sending request"
        );

        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(FetchError::Cancelled),
            result = self.fetch_page(parsed_url, cookie.as_deref()) => result,
        }
    }

    /// GET `url` without following redirects, returning only status and cookies.
    pub async fn handshake(
        &self,
        url: Url,
        cookie: Option<&str>,
        cancel: &CancellationToken,
    ) -> Result<HandshakeResponse, FetchError> {
        let request = self.profile.apply(self.handshake_client.get(url), cookie);

        let send = async {
            let response = request
                .send()
                .await
                .map_err(FetchError::from_reqwest_error)?;
            Ok::<_, FetchError>(HandshakeResponse {
                status: response.status(),
                cookies: response
                    .cookies()
                    .map(|c| ResponseCookie::from_reqwest(&c))
                    .collect(),
            })
        };

        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(FetchError::Cancelled),
            result = send => result,
        }
    }

    async fn fetch_page(&self, url: Url, cookie: Option<&str>) -> Result<PageResponse, FetchError> {
        let mut response = self
            .profile
            .apply(self.client.get(url), cookie)
            .send()
            .await
            .map_err(FetchError::from_reqwest_error)?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(FetchError::Http {
                status,
                retriable: status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS,
            });
        }

        // Check content length before downloading
        if let Some(content_length) = response.content_length()
            && content_length > self.max_body_size
        {
            return Err(FetchError::BodyTooLarge(content_length));
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|ct| ct.to_str().ok())
            .unwrap_or("text/html")
            .to_string();
        if !content_type.contains("text/html") && !content_type.contains("application/xhtml") {
            return Err(FetchError::UnsupportedContentType(content_type));
        }

        let url_final = response.url().clone();
        let headers = response.headers().clone();
        let cookies: Vec<ResponseCookie> = response
            .cookies()
            .map(|c| ResponseCookie::from_reqwest(&c))
            .collect();

        // Stream so a missing Content-Length cannot blow the size limit
        let mut body = BytesMut::new();
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(FetchError::from_reqwest_error)?
        {
            if (body.len() + chunk.len()) as u64 > self.max_body_size {
                return Err(FetchError::BodyTooLarge((body.len() + chunk.len()) as u64));
            }
            body.extend_from_slice(&chunk);
        }

        process_response(RawResponse {
            url_final,
            status,
            headers,
            cookies,
            body: body.freeze(),
            content_type,
        })
    }
}

/// Parse `url` and require an http(s) scheme.
pub fn validate_url(url: &str) -> Result<Url, FetchError> {
    let parsed = Url::parse(url.trim())?;
    match parsed.scheme() {
        "http" | "https" => Ok(parsed),
        other => Err(FetchError::UnsupportedScheme(other.to_string())),
    }
}
