//! # Addresses
//!
//! A Weave address is the BLAKE3 hash of an Ed25519 public key, rendered
//! as Bech32 with the `weave` prefix:
//!
//! ```text
//! public_key (32 bytes) -> BLAKE3 -> 32 bytes -> Bech32("weave", hash)
//! ```
//!
//! The hash layer gives a stable 32-byte on-ledger identity regardless
//! of future key schemes; Bech32 gives copy-paste error detection for
//! the humans reading test logs.

use bech32::{Bech32, Hrp};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::config::{ADDRESS_HRP, ADDRESS_LENGTH};
use crate::crypto::hash::blake3_hash;
use crate::crypto::keys::WeavePublicKey;

/// Errors from parsing an address string.
#[derive(Debug, Error)]
pub enum AddressError {
    /// The Bech32 string could not be decoded at all.
    #[error("bech32 decode error: {0}")]
    Bech32Decode(String),

    /// The decoded string carried a foreign human-readable prefix.
    #[error("invalid HRP: expected '{expected}', got '{got}'")]
    InvalidHrp {
        /// The prefix this network uses.
        expected: String,
        /// The prefix that was found.
        got: String,
    },

    /// The decoded payload was not exactly [`ADDRESS_LENGTH`] bytes.
    #[error("invalid address payload: expected {expected} bytes, got {got}")]
    InvalidLength {
        /// Expected payload length.
        expected: usize,
        /// Actual payload length.
        got: usize,
    },
}

/// A ledger address — who owns an output, who a payment goes to.
///
/// `Copy`-friendly 32-byte value type. Ordering and hashing are over the
/// raw digest bytes, so addresses sort deterministically.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Address {
    digest: [u8; ADDRESS_LENGTH],
}

impl Address {
    /// Derives the address owned by a public key.
    pub fn from_public_key(public_key: &WeavePublicKey) -> Self {
        Self {
            digest: blake3_hash(public_key.as_bytes()),
        }
    }

    /// Wraps a raw 32-byte digest. Used by tests that need addresses
    /// without key material behind them.
    pub fn from_bytes(digest: [u8; ADDRESS_LENGTH]) -> Self {
        Self { digest }
    }

    /// Raw digest bytes.
    pub fn as_bytes(&self) -> &[u8; ADDRESS_LENGTH] {
        &self.digest
    }

    /// Encodes as a Bech32 string, e.g. `weave1q3k...`.
    pub fn to_bech32(&self) -> String {
        let hrp = Hrp::parse(ADDRESS_HRP).expect("static HRP is valid");
        bech32::encode::<Bech32>(hrp, &self.digest)
            .expect("encoding a 32-byte payload never fails")
    }

    /// Parses a Bech32-encoded address, validating prefix, checksum,
    /// and payload length.
    pub fn from_bech32(s: &str) -> Result<Self, AddressError> {
        let (hrp, data) =
            bech32::decode(s).map_err(|e| AddressError::Bech32Decode(e.to_string()))?;

        let expected_hrp = Hrp::parse(ADDRESS_HRP).expect("static HRP is valid");
        if hrp != expected_hrp {
            return Err(AddressError::InvalidHrp {
                expected: ADDRESS_HRP.to_string(),
                got: hrp.to_string(),
            });
        }

        if data.len() != ADDRESS_LENGTH {
            return Err(AddressError::InvalidLength {
                expected: ADDRESS_LENGTH,
                got: data.len(),
            });
        }

        let mut digest = [0u8; ADDRESS_LENGTH];
        digest.copy_from_slice(&data);
        Ok(Self { digest })
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_bech32())
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Prefix only — enough to tell two addresses apart in a test
        // failure without drowning the output.
        let full = self.to_bech32();
        write!(f, "Address({})", &full[..full.len().min(16)])
    }
}
