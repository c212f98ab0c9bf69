//! # Protocol Constants
//!
//! Every magic number the fabrication engine relies on lives here. The
//! values mirror the Weave node's own validation rules — if the node
//! tightens a bound, this file is the only place the harness needs to
//! follow it.

// ---------------------------------------------------------------------------
// Addresses
// ---------------------------------------------------------------------------

/// Human-readable Bech32 prefix for all Weave addresses.
pub const ADDRESS_HRP: &str = "weave";

/// Length of the address payload in bytes (BLAKE3 digest of the public key).
pub const ADDRESS_LENGTH: usize = 32;

// ---------------------------------------------------------------------------
// Cryptographic Parameters
// ---------------------------------------------------------------------------

/// Ed25519 secret key length. 32 bytes, always.
pub const SIGNING_KEY_LENGTH: usize = 32;

/// Ed25519 public (verifying) key length.
pub const VERIFYING_KEY_LENGTH: usize = 32;

/// Ed25519 signature length. 64 bytes. If yours isn't, something has
/// gone terribly wrong.
pub const SIGNATURE_LENGTH: usize = 64;

// ---------------------------------------------------------------------------
// Message Structure
// ---------------------------------------------------------------------------

/// Minimum number of parent references a message must carry.
pub const MIN_PARENTS: usize = 1;

/// Maximum number of parent references a message may carry.
pub const MAX_PARENTS: usize = 8;

/// Maximum byte length of a tag index. Anything longer is an
/// application bug, not a label.
pub const MAX_TAG_LENGTH: usize = 64;

/// Maximum number of inputs a single transaction may consume.
pub const MAX_INPUT_COUNT: usize = 127;

/// Maximum number of outputs a single transaction may declare.
pub const MAX_OUTPUT_COUNT: usize = 127;

// ---------------------------------------------------------------------------
// Ledger Rules
// ---------------------------------------------------------------------------

/// Minimum amount a dust-allowance output must carry. Outputs of this
/// kind exist to lift the dust restriction on an address, so they must
/// themselves be substantial.
pub const DUST_ALLOWANCE_MINIMUM: u64 = 1_000_000;

// ---------------------------------------------------------------------------
// Proof of Work
// ---------------------------------------------------------------------------

/// The difficulty floor used for fabricated messages. Test messages only
/// need to be *structurally* honest about carrying proof-of-work; a
/// single leading zero bit keeps builds effectively instant.
pub const MIN_POW_DIFFICULTY: u32 = 1;

/// Nonce-search budget before the engine gives up. At the test-floor
/// difficulty this bound is never approached; it exists so a
/// misconfigured difficulty fails loudly instead of spinning forever.
pub const MAX_POW_ATTEMPTS: u64 = 1 << 24;
