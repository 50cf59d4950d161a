//! Challenge page contracts.
//!
//! Each anti-automation platform embeds its proof-of-work parameters and its
//! verification endpoint differently. A [`ChallengeScheme`] captures one
//! platform version: how to recognise its page, how to read the seed and
//! difficulty, and where to submit the answer.

use std::sync::LazyLock;

use scraper::{Html, Selector};
use serde::Deserialize;
use url::Url;

use crate::challenge::{
    errors::ChallengeError,
    pow::{MAX_DIFFICULTY, Solution},
};

/// Parameters read from a challenge page. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Challenge {
    /// Server-side challenge id, sent back on verification when present.
    pub id: Option<String>,
    pub seed: String,
    pub difficulty: u32,
    pub algorithm: String,
    /// Path prefix the platform is mounted under, usually empty.
    pub base_prefix: String,
}

pub trait ChallengeScheme: Send + Sync {
    /// Identifier of the contract version, used in logs.
    fn version(&self) -> &'static str;

    /// Cheap signature check on a response body. No parsing, no I/O.
    fn detect(&self, body: &str) -> bool;

    fn parse(&self, body: &str) -> Result<Challenge, ChallengeError>;

    /// Endpoint that exchanges a solution for an access cookie.
    fn verification_url(
        &self,
        page_url: &Url,
        challenge: &Challenge,
        solution: &Solution,
    ) -> Result<Url, ChallengeError>;

    /// Whether a `Set-Cookie` name is the access cookie this scheme issues.
    fn is_access_cookie(&self, name: &str) -> bool;
}

const ANUBIS_SIGNATURE: &str = r#"id="anubis_challenge""#;
const ANUBIS_PASS_PATH: &str = "/.within.website/x/cmd/anubis/api/pass-challenge";

static ANUBIS_CHALLENGE_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("script#anubis_challenge").unwrap());

static ANUBIS_PREFIX_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("script#anubis_base_prefix").unwrap());

#[derive(Deserialize)]
struct AnubisDocument {
    challenge: AnubisSeed,
    rules: AnubisRules,
}

/// Older releases embed the seed as a bare string; newer ones as a record
/// carrying an id.
#[derive(Deserialize)]
#[serde(untagged)]
enum AnubisSeed {
    Plain(String),
    Record {
        id: String,
        #[serde(rename = "randomData")]
        random_data: String,
    },
}

#[derive(Deserialize)]
struct AnubisRules {
    algorithm: String,
    difficulty: u32,
}

/// Anubis proof-of-work challenge, `fast` and `slow` algorithms.
///
/// Both algorithms share the same answer: leading zero hex digits of
/// SHA-256(seed || decimal counter). They only differ in how the browser
/// script paces the search.
#[derive(Debug, Default, Clone, Copy)]
pub struct AnubisScheme;

impl AnubisScheme {
    pub fn new() -> Self {
        Self
    }
}

impl ChallengeScheme for AnubisScheme {
    fn version(&self) -> &'static str {
        "anubis-pow-v1"
    }

    fn detect(&self, body: &str) -> bool {
        body.contains(ANUBIS_SIGNATURE)
    }

    fn parse(&self, body: &str) -> Result<Challenge, ChallengeError> {
        let document = Html::parse_document(body);

        let raw = document
            .select(&ANUBIS_CHALLENGE_SELECTOR)
            .next()
            .map(|script| script.text().collect::<String>())
            .ok_or_else(|| ChallengeError::Parse("challenge script not found".to_string()))?;

        let parsed: AnubisDocument = serde_json::from_str(raw.trim())
            .map_err(|e| ChallengeError::Parse(format!("challenge json: {}", e)))?;

        let algorithm = parsed.rules.algorithm;
        if algorithm != "fast" && algorithm != "slow" {
            return Err(ChallengeError::Parse(format!(
                "unsupported algorithm '{}'",
                algorithm
            )));
        }
        if parsed.rules.difficulty > MAX_DIFFICULTY {
            return Err(ChallengeError::Parse(format!(
                "difficulty {} out of range",
                parsed.rules.difficulty
            )));
        }

        let (id, seed) = match parsed.challenge {
            AnubisSeed::Plain(seed) => (None, seed),
            AnubisSeed::Record { id, random_data } => (Some(id), random_data),
        };
        if seed.is_empty() {
            return Err(ChallengeError::Parse("empty challenge seed".to_string()));
        }

        // The prefix script holds a JSON string; absent means mounted at root.
        let base_prefix = document
            .select(&ANUBIS_PREFIX_SELECTOR)
            .next()
            .map(|script| script.text().collect::<String>())
            .and_then(|raw| serde_json::from_str::<String>(raw.trim()).ok())
            .unwrap_or_default();

        Ok(Challenge {
            id,
            seed,
            difficulty: parsed.rules.difficulty,
            algorithm,
            base_prefix,
        })
    }

    fn verification_url(
        &self,
        page_url: &Url,
        challenge: &Challenge,
        solution: &Solution,
    ) -> Result<Url, ChallengeError> {
        let path = format!(
            "{}{}",
            challenge.base_prefix.trim_end_matches('/'),
            ANUBIS_PASS_PATH
        );
        let mut url = page_url
            .join(&path)
            .map_err(|e| ChallengeError::Parse(format!("verification url: {}", e)))?;

        {
            let mut query = url.query_pairs_mut();
            query.clear();
            if let Some(id) = &challenge.id {
                query.append_pair("id", id);
            }
            query
                .append_pair("response", &solution.hash)
                .append_pair("nonce", &solution.nonce.to_string())
                .append_pair("redir", page_url.as_str())
                .append_pair("elapsedTime", &solution.elapsed.as_millis().to_string());
        }

        Ok(url)
    }

    fn is_access_cookie(&self, name: &str) -> bool {
        name.ends_with("anubis-auth")
    }
}
