//! # Ledger Identifiers & Outputs
//!
//! The value types the rest of the engine is built from: content-derived
//! message ids, output ids, and the [`UnspentOutput`] record that wallet
//! bookkeeping revolves around.
//!
//! All identifiers order deterministically over their raw bytes. Wallets
//! key their unspent sets by [`OutputId`], so input selection walks
//! outputs in a fixed, reproducible order — a property the scenario
//! tests assert on directly.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::address::Address;

// ---------------------------------------------------------------------------
// MessageId
// ---------------------------------------------------------------------------

/// Content address of a message: `BLAKE3(canonical message bytes)`.
///
/// The all-zero id is reserved as the *null* id. It never addresses a
/// real message; it marks the origin of synthetic outputs minted by the
/// fake-input path.
#[derive(
    Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct MessageId {
    bytes: [u8; 32],
}

impl MessageId {
    /// The reserved null id (all zeroes).
    pub const NULL: MessageId = MessageId { bytes: [0u8; 32] };

    /// Wraps raw id bytes.
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self { bytes }
    }

    /// Raw id bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.bytes
    }

    /// True for the reserved null id.
    pub fn is_null(&self) -> bool {
        self.bytes == [0u8; 32]
    }

    /// Hex-encoded id, 64 characters.
    pub fn to_hex(&self) -> String {
        hex::encode(self.bytes)
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl fmt::Debug for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MessageId({})", &self.to_hex()[..12])
    }
}

// ---------------------------------------------------------------------------
// OutputId
// ---------------------------------------------------------------------------

/// Identifies one output of one transaction: origin message id plus the
/// output's index within the transaction.
///
/// The derived ordering (message id bytes, then index) is the iteration
/// order of every wallet's unspent set.
#[derive(
    Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct OutputId {
    message_id: MessageId,
    index: u16,
}

impl OutputId {
    /// Builds an output id from its origin message and output index.
    pub fn new(message_id: MessageId, index: u16) -> Self {
        Self { message_id, index }
    }

    /// The null output id: null origin, index 0. Origin of synthetic
    /// outputs.
    pub const NULL: OutputId = OutputId {
        message_id: MessageId::NULL,
        index: 0,
    };

    /// The message this output was created by.
    pub fn message_id(&self) -> MessageId {
        self.message_id
    }

    /// The output's index within its transaction.
    pub fn index(&self) -> u16 {
        self.index
    }
}

impl fmt::Display for OutputId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.message_id.to_hex(), self.index)
    }
}

impl fmt::Debug for OutputId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "OutputId({}:{})", &self.message_id.to_hex()[..12], self.index)
    }
}

// ---------------------------------------------------------------------------
// OutputKind
// ---------------------------------------------------------------------------

/// The on-ledger type tag of an output.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OutputKind {
    /// A standard sig-locked single-beneficiary output.
    Payment,
    /// A dust-allowance output: exempts its address from minimum-balance
    /// restrictions and must itself carry at least the allowance minimum.
    DustAllowance,
}

impl fmt::Display for OutputKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Payment => write!(f, "payment"),
            Self::DustAllowance => write!(f, "dust-allowance"),
        }
    }
}

// ---------------------------------------------------------------------------
// UnspentOutput
// ---------------------------------------------------------------------------

/// A spendable ledger output as a wallet sees it.
///
/// Immutable once created. Exactly one wallet considers any given output
/// unspent at a time; booking a transaction moves these records between
/// wallets, it never edits them.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnspentOutput {
    output_id: OutputId,
    address: Address,
    amount: u64,
    kind: OutputKind,
}

impl UnspentOutput {
    /// Creates an output record.
    pub fn new(output_id: OutputId, address: Address, amount: u64, kind: OutputKind) -> Self {
        Self {
            output_id,
            address,
            amount,
            kind,
        }
    }

    /// Mints a synthetic output: null origin, standard kind, exactly the
    /// given amount. The fake-input build path uses these to assemble
    /// economically valid transactions without funded wallet state.
    pub fn synthetic(address: Address, amount: u64) -> Self {
        Self {
            output_id: OutputId::NULL,
            address,
            amount,
            kind: OutputKind::Payment,
        }
    }

    /// The output's identifier.
    pub fn output_id(&self) -> OutputId {
        self.output_id
    }

    /// The owning address.
    pub fn address(&self) -> Address {
        self.address
    }

    /// The amount in the ledger's smallest unit.
    pub fn amount(&self) -> u64 {
        self.amount
    }

    /// The output's type tag.
    pub fn kind(&self) -> OutputKind {
        self.kind
    }

    /// True when this output was minted by the fake-input path rather
    /// than produced by a real message. Synthetic outputs are excluded
    /// from spend-booking — they were never a member of any wallet.
    pub fn is_synthetic(&self) -> bool {
        self.output_id.message_id().is_null()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(byte: u8) -> Address {
        Address::from_bytes([byte; 32])
    }

    #[test]
    fn null_message_id_is_null() {
        assert!(MessageId::NULL.is_null());
        assert!(!MessageId::from_bytes([1u8; 32]).is_null());
    }

    #[test]
    fn output_ids_order_by_message_then_index() {
        let low = OutputId::new(MessageId::from_bytes([1u8; 32]), 5);
        let high = OutputId::new(MessageId::from_bytes([2u8; 32]), 0);
        assert!(low < high);

        let first = OutputId::new(MessageId::from_bytes([1u8; 32]), 0);
        assert!(first < low);
    }

    #[test]
    fn synthetic_outputs_are_flagged() {
        let real = UnspentOutput::new(
            OutputId::new(MessageId::from_bytes([9u8; 32]), 0),
            addr(1),
            100,
            OutputKind::Payment,
        );
        let fake = UnspentOutput::synthetic(addr(1), 100);

        assert!(!real.is_synthetic());
        assert!(fake.is_synthetic());
        assert_eq!(fake.kind(), OutputKind::Payment);
        assert_eq!(fake.amount(), 100);
    }

    #[test]
    fn display_formats() {
        let id = OutputId::new(MessageId::from_bytes([0xAB; 32]), 3);
        let shown = id.to_string();
        assert!(shown.starts_with("abab"));
        assert!(shown.ends_with(":3"));
    }

    #[test]
    fn unspent_output_serde_roundtrip() {
        let out = UnspentOutput::new(
            OutputId::new(MessageId::from_bytes([4u8; 32]), 1),
            addr(7),
            42,
            OutputKind::DustAllowance,
        );
        let json = serde_json::to_string(&out).unwrap();
        let back: UnspentOutput = serde_json::from_str(&json).unwrap();
        assert_eq!(out, back);
    }
}
