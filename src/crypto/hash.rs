//! # Hashing
//!
//! The fabrication engine uses BLAKE3 everywhere a content address is
//! needed: message ids, address derivation, and proof-of-work scoring.
//! SHA-256 is kept alongside for cross-checking fixtures against
//! external tooling that still speaks the 2009 dialect.

use sha2::{Digest, Sha256};

/// BLAKE3 digest of the input, as a fixed 32-byte array.
///
/// This is the workhorse: message ids and addresses are both defined as
/// `blake3(canonical bytes)`.
pub fn blake3_hash(data: &[u8]) -> [u8; 32] {
    *blake3::hash(data).as_bytes()
}

/// SHA-256 digest of the input, as a fixed 32-byte array.
pub fn sha256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(data);
    let digest = hasher.finalize();
    let mut out = [0u8; 32];
    out.copy_from_slice(&digest);
    out
}

/// Counts the leading zero bits of a digest.
///
/// Proof-of-work difficulty is expressed in these units: a message with
/// score `n` has `n` leading zero bits in its content hash.
pub fn leading_zero_bits(digest: &[u8]) -> u32 {
    let mut count = 0;
    for byte in digest {
        if *byte == 0 {
            count += 8;
        } else {
            count += byte.leading_zeros();
            break;
        }
    }
    count
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blake3_is_deterministic() {
        assert_eq!(blake3_hash(b"weave"), blake3_hash(b"weave"));
        assert_ne!(blake3_hash(b"weave"), blake3_hash(b"waeve"));
    }

    #[test]
    fn sha256_known_vector() {
        // SHA-256 of the empty string, straight from FIPS 180-4.
        assert_eq!(
            hex::encode(sha256(b"")),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn leading_zeros_counts_across_bytes() {
        assert_eq!(leading_zero_bits(&[0x80]), 0);
        assert_eq!(leading_zero_bits(&[0x01]), 7);
        assert_eq!(leading_zero_bits(&[0x00, 0xFF]), 8);
        assert_eq!(leading_zero_bits(&[0x00, 0x0F]), 12);
        assert_eq!(leading_zero_bits(&[0x00, 0x00]), 16);
    }
}
