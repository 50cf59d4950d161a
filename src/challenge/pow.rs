//! SHA-256 proof-of-work search.
//!
//! A solution is the smallest counter `n` such that the hex form of
//! `SHA-256(seed || decimal(n))` starts with `difficulty` zero digits.

use std::time::{Duration, Instant};

use sha2::{Digest, Sha256};
use tokio_util::sync::CancellationToken;

use crate::challenge::errors::ChallengeError;

/// Iterations between cancellation checks.
const CANCEL_POLL_INTERVAL: u64 = 1024;

/// Difficulty can never exceed the number of hex digits in a SHA-256 digest.
pub const MAX_DIFFICULTY: u32 = 64;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Solution {
    pub nonce: u64,
    /// Lowercase hex digest of the winning input.
    pub hash: String,
    pub elapsed: Duration,
}

/// Number of leading zero hex digits in `digest`.
pub fn leading_zero_nibbles(digest: &[u8]) -> u32 {
    let mut count = 0;
    for byte in digest {
        if *byte == 0 {
            count += 2;
            continue;
        }
        if byte >> 4 == 0 {
            count += 1;
        }
        break;
    }
    count
}

pub fn digest(seed: &str, nonce: u64) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(seed.as_bytes());
    hasher.update(nonce.to_string().as_bytes());
    hasher.finalize().into()
}

/// Brute-force a counter for `seed`, starting at zero.
///
/// Polls `cancel` every [`CANCEL_POLL_INTERVAL`] iterations and stops after
/// `max_attempts` counters. Blocking; run it off the async executor.
pub fn search(
    seed: &str,
    difficulty: u32,
    max_attempts: u64,
    cancel: &CancellationToken,
) -> Result<Solution, ChallengeError> {
    if difficulty > MAX_DIFFICULTY {
        return Err(ChallengeError::Parse(format!(
            "difficulty {} exceeds {}",
            difficulty, MAX_DIFFICULTY
        )));
    }

    let started = Instant::now();
    let mut prefix = Sha256::new();
    prefix.update(seed.as_bytes());

    for nonce in 0..max_attempts {
        if nonce % CANCEL_POLL_INTERVAL == 0 && cancel.is_cancelled() {
            return Err(ChallengeError::Cancelled);
        }

        let mut hasher = prefix.clone();
        hasher.update(nonce.to_string().as_bytes());
        let digest: [u8; 32] = hasher.finalize().into();

        if leading_zero_nibbles(&digest) >= difficulty {
            return Ok(Solution {
                nonce,
                hash: hex::encode(digest),
                elapsed: started.elapsed(),
            });
        }
    }

    Err(ChallengeError::GivingUp {
        attempts: max_attempts,
        difficulty,
    })
}
