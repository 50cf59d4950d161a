use thiserror::Error;

use crate::challenge::ChallengeError;
use crate::extractor::ExtractError;
use crate::fetcher::FetchError;
use crate::repositories::RepositoryError;

/// Coarse classification callers branch on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    InvalidInput,
    TransientNetwork,
    ChallengeUnsolvable,
    Cancelled,
    Storage,
}

#[derive(Error, Debug)]
pub enum AcquisitionError {
    #[error("entry {0} not found")]
    NotFound(i64),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("network error: {0}")]
    Network(FetchError),

    #[error("challenge unsolvable: {0}")]
    ChallengeUnsolvable(String),

    #[error("acquisition cancelled")]
    Cancelled,

    #[error("storage error: {0}")]
    Storage(RepositoryError),
}

impl AcquisitionError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::InvalidInput(_) => ErrorKind::InvalidInput,
            Self::Network(_) => ErrorKind::TransientNetwork,
            Self::ChallengeUnsolvable(_) => ErrorKind::ChallengeUnsolvable,
            Self::Cancelled => ErrorKind::Cancelled,
            Self::Storage(_) => ErrorKind::Storage,
        }
    }
}

impl From<FetchError> for AcquisitionError {
    fn from(err: FetchError) -> Self {
        match err {
            FetchError::Cancelled => Self::Cancelled,
            // Fatal responses (4xx, oversized, non-HTML) will not change on retry.
            err if err.is_invalid_input() || !err.should_retry() => {
                Self::InvalidInput(err.to_string())
            }
            err => Self::Network(err),
        }
    }
}

impl From<ChallengeError> for AcquisitionError {
    fn from(err: ChallengeError) -> Self {
        match err {
            ChallengeError::Cancelled => Self::Cancelled,
            ChallengeError::Network(fetch) => fetch.into(),
            err if err.is_malformed() => Self::InvalidInput(err.to_string()),
            err => Self::ChallengeUnsolvable(err.to_string()),
        }
    }
}

impl From<ExtractError> for AcquisitionError {
    fn from(err: ExtractError) -> Self {
        Self::InvalidInput(err.to_string())
    }
}

impl From<RepositoryError> for AcquisitionError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound(id) => Self::NotFound(id),
            err => Self::Storage(err),
        }
    }
}
