use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{info, instrument, warn};

use crate::challenge::{
    errors::ChallengeError,
    pow::{self, Solution},
    scheme::{AnubisScheme, Challenge, ChallengeScheme},
};
use crate::fetcher::{
    DEFAULT_COOKIE_TTL, FetchError, FingerprintedFetcher, ResponseCookie, cookie_header,
    host_key, validate_url,
};

#[derive(Debug, Clone)]
pub struct SolverConfig {
    /// Upper bound on counters tried before giving up.
    pub max_attempts: u64,
    /// Lifetime for access cookies that carry no expiry of their own.
    pub default_cookie_ttl: Duration,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            // Roughly 760x the expected work at difficulty 4, ~3x at difficulty 6.
            max_attempts: 50_000_000,
            default_cookie_ttl: DEFAULT_COOKIE_TTL,
        }
    }
}

/// Detects challenge pages and trades a proof-of-work answer for an access
/// cookie, which is then shared through the fetcher's host cache.
pub struct ChallengeSolver {
    fetcher: Arc<FingerprintedFetcher>,
    scheme: Arc<dyn ChallengeScheme>,
    config: SolverConfig,
}

impl ChallengeSolver {
    pub fn new(fetcher: Arc<FingerprintedFetcher>, config: SolverConfig) -> Self {
        Self::with_scheme(fetcher, Arc::new(AnubisScheme::new()), config)
    }

    pub fn with_scheme(
        fetcher: Arc<FingerprintedFetcher>,
        scheme: Arc<dyn ChallengeScheme>,
        config: SolverConfig,
    ) -> Self {
        Self {
            fetcher,
            scheme,
            config,
        }
    }

    pub fn is_challenge(&self, body: &str) -> bool {
        self.scheme.detect(body)
    }

    /// Solve the challenge in `body`, served for `url`, and return the access
    /// cookie as a `name=value` pair.
    ///
    /// `seed_cookies` are the cookies the challenge response set; they are
    /// replayed to the verification endpoint.
    #[instrument(skip_all, fields(url = %url, scheme = self.scheme.version()))]
    pub async fn solve_from_body(
        &self,
        cancel: &CancellationToken,
        body: &str,
        url: &str,
        seed_cookies: &[ResponseCookie],
    ) -> Result<String, ChallengeError> {
        let page_url = validate_url(url)?;
        let host = host_key(&page_url)
            .ok_or_else(|| ChallengeError::Parse(format!("no host in {}", page_url)))?;

        let challenge = self.scheme.parse(body)?;
        info!(
            difficulty = challenge.difficulty,
            algorithm = %challenge.algorithm,
            "solving challenge"
        );

        let solution = self.search(&challenge, cancel).await?;
        info!(
            nonce = solution.nonce,
            elapsed_ms = solution.elapsed.as_millis() as u64,
            "found proof-of-work"
        );

        let verify_url = self
            .scheme
            .verification_url(&page_url, &challenge, &solution)?;
        let seed = cookie_header(seed_cookies);
        let seed = (!seed.is_empty()).then_some(seed);

        let response = self
            .fetcher
            .handshake(verify_url, seed.as_deref(), cancel)
            .await
            .map_err(|e| match e {
                FetchError::Cancelled => ChallengeError::Cancelled,
                other => ChallengeError::Network(other),
            })?;

        if response.status.is_client_error() || response.status.is_server_error() {
            warn!(status = %response.status, "verification rejected");
            return Err(ChallengeError::Rejected {
                status: response.status,
            });
        }

        let access = response
            .cookies
            .iter()
            .find(|c| self.scheme.is_access_cookie(&c.name) && !c.value.is_empty())
            .ok_or(ChallengeError::MissingAccessCookie {
                status: response.status,
            })?;

        let ttl = access
            .ttl()
            .filter(|ttl| !ttl.is_zero())
            .unwrap_or(self.config.default_cookie_ttl);
        let cookie = access.pair();
        self.fetcher.cache().set(&host, cookie.clone(), ttl);
        info!(host = %host, ttl_secs = ttl.as_secs(), "access cookie stored");

        Ok(cookie)
    }

    /// Run the search on the blocking pool; it polls `cancel` itself.
    async fn search(
        &self,
        challenge: &Challenge,
        cancel: &CancellationToken,
    ) -> Result<Solution, ChallengeError> {
        let seed = challenge.seed.clone();
        let difficulty = challenge.difficulty;
        let max_attempts = self.config.max_attempts;
        let cancel = cancel.clone();

        tokio::task::spawn_blocking(move || pow::search(&seed, difficulty, max_attempts, &cancel))
            .await
            .map_err(|e| ChallengeError::Worker(e.to_string()))?
    }
}
