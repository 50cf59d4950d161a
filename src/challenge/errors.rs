use reqwest::StatusCode;
use thiserror::Error;

use crate::fetcher::FetchError;

#[derive(Error, Debug)]
pub enum ChallengeError {
    #[error("malformed challenge: {0}")]
    Parse(String),

    #[error("verification rejected with status {status}")]
    Rejected { status: StatusCode },

    #[error("verification returned no access cookie (status {status})")]
    MissingAccessCookie { status: StatusCode },

    #[error("gave up after {attempts} attempts at difficulty {difficulty}")]
    GivingUp { attempts: u64, difficulty: u32 },

    #[error("challenge solving cancelled")]
    Cancelled,

    #[error("proof-of-work worker failed: {0}")]
    Worker(String),

    #[error(transparent)]
    Network(#[from] FetchError),
}

impl ChallengeError {
    /// Whether the challenge itself could not be understood.
    pub fn is_malformed(&self) -> bool {
        matches!(self, Self::Parse(_))
    }
}
