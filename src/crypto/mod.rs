//! # Cryptographic Primitives
//!
//! Keypairs and hash functions underpinning the fabrication engine.
//! Nothing here is novel — Ed25519 via `ed25519-dalek`, content
//! addressing via BLAKE3 — and nothing here should ever become novel.

pub mod hash;
pub mod keys;

pub use hash::{blake3_hash, leading_zero_bits, sha256};
pub use keys::{WeaveKeypair, WeavePublicKey, WeaveSignature};
