//! # Proof of Work
//!
//! The nonce-search step every fabricated message goes through before
//! validation. Real nodes burn real cycles here; the test engine runs
//! at a difficulty floor of one leading zero bit, which a couple of
//! nonce increments satisfy.
//!
//! The engine is a trait so a harness can substitute its own — a no-op
//! engine for benchmarking the rest of the pipeline, or a deliberately
//! exhausted one for failure-path tests.

use thiserror::Error;
use tracing::debug;

use crate::config::MAX_POW_ATTEMPTS;
use crate::ledger::codec::Message;

/// Errors from the nonce search.
#[derive(Debug, Error)]
pub enum PowError {
    /// The attempt budget ran out before a qualifying nonce appeared.
    /// Fatal to the build; nothing in this engine retries.
    #[error("proof-of-work exhausted after {attempts} attempts (difficulty {difficulty})")]
    Exhausted {
        /// Nonces tried before giving up.
        attempts: u64,
        /// The difficulty that was being searched for.
        difficulty: u32,
    },
}

/// A proof-of-work search routine.
///
/// `solve` mutates the message in place, leaving it with a nonce whose
/// content-hash score meets `min_difficulty`.
pub trait PowEngine {
    /// Finds and installs a qualifying nonce.
    fn solve(&self, message: &mut Message, min_difficulty: u32) -> Result<(), PowError>;
}

/// The reference engine: sequential nonce search over the message's
/// BLAKE3 content hash, starting from zero.
///
/// Starting at zero (rather than a random offset) keeps fabricated
/// messages bit-for-bit reproducible across runs, which the determinism
/// tests rely on.
pub struct HashPow {
    max_attempts: u64,
}

impl HashPow {
    /// An engine with an explicit attempt budget.
    pub fn with_max_attempts(max_attempts: u64) -> Self {
        Self { max_attempts }
    }
}

impl Default for HashPow {
    fn default() -> Self {
        Self {
            max_attempts: MAX_POW_ATTEMPTS,
        }
    }
}

impl PowEngine for HashPow {
    fn solve(&self, message: &mut Message, min_difficulty: u32) -> Result<(), PowError> {
        for nonce in 0..self.max_attempts {
            message.set_nonce(nonce);
            let score = message.pow_score();
            if score >= min_difficulty {
                debug!(nonce, score, min_difficulty, "proof of work solved");
                return Ok(());
            }
        }
        Err(PowError::Exhausted {
            attempts: self.max_attempts,
            difficulty: min_difficulty,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MIN_POW_DIFFICULTY;
    use crate::ledger::codec::{build_tag_message, TagPayload};
    use crate::ledger::types::MessageId;

    fn unsolved() -> Message {
        build_tag_message(
            &[MessageId::from_bytes([1u8; 32])],
            TagPayload::new("pow-test"),
        )
        .unwrap()
    }

    #[test]
    fn solve_meets_difficulty_floor() {
        let mut msg = unsolved();
        HashPow::default().solve(&mut msg, MIN_POW_DIFFICULTY).unwrap();
        assert!(msg.pow_score() >= MIN_POW_DIFFICULTY);
    }

    #[test]
    fn solve_is_deterministic() {
        let mut a = unsolved();
        let mut b = unsolved();
        HashPow::default().solve(&mut a, 4).unwrap();
        HashPow::default().solve(&mut b, 4).unwrap();
        assert_eq!(a.nonce(), b.nonce());
        assert_eq!(a.content_hash(), b.content_hash());
    }

    #[test]
    fn exhausted_budget_fails() {
        let mut msg = unsolved();
        // One attempt against 256 required zero bits cannot succeed.
        let err = HashPow::with_max_attempts(1).solve(&mut msg, 256).unwrap_err();
        assert!(matches!(
            err,
            PowError::Exhausted {
                attempts: 1,
                difficulty: 256,
            }
        ));
    }

    #[test]
    fn higher_difficulty_still_solvable() {
        // 12 zero bits needs ~4096 attempts on average; well inside the
        // default budget and still fast.
        let mut msg = unsolved();
        HashPow::default().solve(&mut msg, 12).unwrap();
        assert!(msg.pow_score() >= 12);
    }
}
