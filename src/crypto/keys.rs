//! # Keypairs
//!
//! Ed25519 key material for simulated wallets. Every wallet the harness
//! spins up owns exactly one of these; every signature on a fabricated
//! transaction traces back to one.
//!
//! Two construction paths matter here:
//!
//! - [`WeaveKeypair::generate`] pulls from the OS RNG, for tests that
//!   don't care which identity they get.
//! - [`WeaveKeypair::from_seed`] is fully deterministic, for tests that
//!   assert on exact message ids and must get the same keys every run.
//!
//! Secret key bytes are never logged and never appear in `Debug` output.

use ed25519_dalek::{
    Signature as DalekSignature, Signer, SigningKey, Verifier, VerifyingKey,
};
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};
use std::fmt;

/// An Ed25519 keypair backing a simulated wallet identity.
///
/// Deliberately does not implement `Serialize`: persisting secret key
/// material should be an explicit act, not a side effect of dumping a
/// wallet to JSON. Use [`secret_key_bytes`](Self::secret_key_bytes) if
/// you really mean it.
pub struct WeaveKeypair {
    signing_key: SigningKey,
}

/// The public half of a keypair. Safe to share, compare, and hash.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WeavePublicKey {
    bytes: [u8; 32],
}

/// An Ed25519 signature. 64 bytes, deterministic for a given key and
/// message — rebuilding the same transaction twice yields byte-identical
/// unlock blocks, which is exactly what a deterministic test engine wants.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeaveSignature {
    bytes: Vec<u8>,
}

impl WeaveKeypair {
    /// Generates a fresh keypair from the OS cryptographic RNG.
    pub fn generate() -> Self {
        Self {
            signing_key: SigningKey::generate(&mut OsRng),
        }
    }

    /// Derives a keypair deterministically from a 32-byte seed.
    ///
    /// In Ed25519 the seed *is* the secret key, so the same seed always
    /// yields the same identity. This is the constructor the scenario
    /// tests use.
    pub fn from_seed(seed: &[u8; 32]) -> Self {
        Self {
            signing_key: SigningKey::from_bytes(seed),
        }
    }

    /// Returns the public half of this keypair.
    pub fn public_key(&self) -> WeavePublicKey {
        WeavePublicKey {
            bytes: self.signing_key.verifying_key().to_bytes(),
        }
    }

    /// Raw public key bytes (32 bytes).
    pub fn public_key_bytes(&self) -> [u8; 32] {
        self.signing_key.verifying_key().to_bytes()
    }

    /// Signs a message. Ed25519 needs no randomness at signing time, so
    /// the output is a pure function of (key, message).
    pub fn sign(&self, message: &[u8]) -> WeaveSignature {
        let sig = self.signing_key.sign(message);
        WeaveSignature {
            bytes: sig.to_bytes().to_vec(),
        }
    }

    /// Verifies a signature against this keypair's public key.
    pub fn verify(&self, message: &[u8], signature: &WeaveSignature) -> bool {
        self.public_key().verify(message, signature)
    }

    /// Exports the raw 32-byte secret key. Handle with care.
    pub fn secret_key_bytes(&self) -> [u8; 32] {
        self.signing_key.to_bytes()
    }
}

impl Clone for WeaveKeypair {
    fn clone(&self) -> Self {
        Self {
            signing_key: SigningKey::from_bytes(&self.signing_key.to_bytes()),
        }
    }
}

impl fmt::Debug for WeaveKeypair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Secret material stays out of debug output, full stop.
        write!(f, "WeaveKeypair(pub={})", self.public_key().to_hex())
    }
}

impl PartialEq for WeaveKeypair {
    /// Keypairs compare by public key — for identity purposes that is
    /// what matters, and it avoids non-constant-time comparison of
    /// secret material.
    fn eq(&self, other: &Self) -> bool {
        self.public_key_bytes() == other.public_key_bytes()
    }
}

impl Eq for WeaveKeypair {}

// ---------------------------------------------------------------------------
// WeavePublicKey
// ---------------------------------------------------------------------------

impl WeavePublicKey {
    /// Wraps raw public key bytes without validation. Intended for
    /// reconstructing keys that were produced by this module.
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self { bytes }
    }

    /// Raw key bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.bytes
    }

    /// Verifies a signature. Returns a plain boolean — callers on the
    /// validation path only ever branch on yes/no, and a malformed key
    /// or signature is simply an invalid one.
    pub fn verify(&self, message: &[u8], signature: &WeaveSignature) -> bool {
        let Ok(verifying_key) = VerifyingKey::from_bytes(&self.bytes) else {
            return false;
        };
        let sig_bytes: [u8; 64] = match signature.bytes.as_slice().try_into() {
            Ok(b) => b,
            Err(_) => return false,
        };
        verifying_key
            .verify(message, &DalekSignature::from_bytes(&sig_bytes))
            .is_ok()
    }

    /// Hex-encoded key, 64 characters.
    pub fn to_hex(&self) -> String {
        hex::encode(self.bytes)
    }
}

impl fmt::Display for WeavePublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl fmt::Debug for WeavePublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "WeavePublicKey({})", &self.to_hex()[..16])
    }
}

// ---------------------------------------------------------------------------
// WeaveSignature
// ---------------------------------------------------------------------------

impl WeaveSignature {
    /// Wraps a raw 64-byte signature.
    pub fn from_bytes(bytes: [u8; 64]) -> Self {
        Self {
            bytes: bytes.to_vec(),
        }
    }

    /// Raw signature bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Hex-encoded signature, 128 characters for a valid one.
    pub fn to_hex(&self) -> String {
        hex::encode(&self.bytes)
    }
}

impl fmt::Debug for WeaveSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let hex_str = self.to_hex();
        if hex_str.len() >= 128 {
            write!(f, "WeaveSignature({}...{})", &hex_str[..8], &hex_str[120..])
        } else {
            write!(f, "WeaveSignature({})", hex_str)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sign_verify_roundtrip() {
        let kp = WeaveKeypair::generate();
        let sig = kp.sign(b"transfer 60 to wallet B");
        assert!(kp.verify(b"transfer 60 to wallet B", &sig));
    }

    #[test]
    fn wrong_message_fails_verification() {
        let kp = WeaveKeypair::generate();
        let sig = kp.sign(b"original");
        assert!(!kp.verify(b"tampered", &sig));
    }

    #[test]
    fn wrong_key_fails_verification() {
        let kp1 = WeaveKeypair::generate();
        let kp2 = WeaveKeypair::generate();
        let sig = kp1.sign(b"message");
        assert!(!kp2.verify(b"message", &sig));
    }

    #[test]
    fn seed_derivation_is_deterministic() {
        let seed = [7u8; 32];
        let kp1 = WeaveKeypair::from_seed(&seed);
        let kp2 = WeaveKeypair::from_seed(&seed);
        assert_eq!(kp1.public_key(), kp2.public_key());
    }

    #[test]
    fn signatures_are_deterministic() {
        let kp = WeaveKeypair::from_seed(&[3u8; 32]);
        let sig1 = kp.sign(b"same essence");
        let sig2 = kp.sign(b"same essence");
        assert_eq!(sig1, sig2);
    }

    #[test]
    fn generated_keypairs_differ() {
        let kp1 = WeaveKeypair::generate();
        let kp2 = WeaveKeypair::generate();
        assert_ne!(kp1.public_key_bytes(), kp2.public_key_bytes());
    }

    #[test]
    fn secret_key_roundtrip() {
        let kp = WeaveKeypair::generate();
        let restored = WeaveKeypair::from_seed(&kp.secret_key_bytes());
        assert_eq!(kp.public_key(), restored.public_key());
    }

    #[test]
    fn debug_does_not_leak_secret() {
        let kp = WeaveKeypair::generate();
        let debug_str = format!("{:?}", kp);
        assert!(debug_str.starts_with("WeaveKeypair(pub="));
        assert!(!debug_str.contains(&hex::encode(kp.secret_key_bytes())));
    }

    #[test]
    fn signature_is_64_bytes() {
        let kp = WeaveKeypair::generate();
        let sig = kp.sign(b"x");
        assert_eq!(sig.as_bytes().len(), 64);
        assert_eq!(sig.to_hex().len(), 128);
    }
}
