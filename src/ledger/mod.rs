//! # Ledger Model
//!
//! Everything the fabrication engine knows about the Weave ledger's
//! on-wire shapes: addresses, identifiers, unspent outputs, and the
//! codec that assembles, signs, and validates messages.
//!
//! ```text
//! address.rs — Bech32 addresses derived from Ed25519 public keys
//! types.rs   — MessageId, OutputId, OutputKind, UnspentOutput
//! codec.rs   — payloads, transactions, messages, validation
//! signer.rs  — the address-keyed in-memory signer
//! ```

pub mod address;
pub mod codec;
pub mod signer;
pub mod types;

pub use address::{Address, AddressError};
pub use codec::{
    build_tag_message, build_transaction, build_value_message, validate, CodecError, Message,
    OutputRole, Payload, TagPayload, Transaction, TransactionEssence, TransactionInput,
    TransactionOutput, UnlockBlock, ValidatedMessage,
};
pub use signer::{InMemorySigner, SignerError};
pub use types::{MessageId, OutputId, OutputKind, UnspentOutput};
