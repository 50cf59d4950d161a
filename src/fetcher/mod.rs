pub mod client;
pub mod cookie_cache;
pub mod errors;
pub mod pipeline;
pub mod profile;
pub mod types;

pub use client::{FetchConfig, FingerprintedFetcher, HandshakeResponse, validate_url};
pub use cookie_cache::{DEFAULT_COOKIE_TTL, HostChallengeCache, host_key};
pub use errors::FetchError;
pub use profile::BrowserProfile;
pub use types::{Charset, PageResponse, ResponseCookie, cookie_header};
