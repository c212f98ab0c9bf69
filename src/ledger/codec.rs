//! # Ledger Codec
//!
//! Message and transaction assembly for the Weave DAG ledger, plus the
//! validation pass every fabricated message must survive before a test
//! is allowed to touch it.
//!
//! ## Canonical encoding
//!
//! Hashing and signing operate on hand-rolled canonical bytes: fixed
//! field order, little-endian integers, length prefixes. Serde formats
//! make no ordering promises, so they are never used for anything a
//! hash or signature depends on.
//!
//! ```text
//! essence bytes     — what the wallet keypair signs
//! transaction bytes — essence + unlock blocks
//! message bytes     — parents + payload + nonce; BLAKE3 of this is the
//!                     message id AND the proof-of-work scoring preimage
//! ```
//!
//! ## Output roles
//!
//! Every transaction output declares its role — payment or remainder —
//! at construction time. Downstream bookkeeping reads the role instead
//! of reverse-matching outputs by address and amount, so a transfer
//! where source and destination addresses coincide still classifies
//! unambiguously.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use thiserror::Error;

use crate::config::{
    DUST_ALLOWANCE_MINIMUM, MAX_INPUT_COUNT, MAX_OUTPUT_COUNT, MAX_PARENTS, MAX_TAG_LENGTH,
    MIN_PARENTS, MIN_POW_DIFFICULTY,
};
use crate::crypto::hash::{blake3_hash, leading_zero_bits};
use crate::crypto::keys::{WeavePublicKey, WeaveSignature};
use crate::ledger::address::Address;
use crate::ledger::signer::{InMemorySigner, SignerError};
use crate::ledger::types::{MessageId, OutputId, OutputKind};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors from message/transaction assembly and validation.
#[derive(Debug, Error)]
pub enum CodecError {
    /// The tag index is empty.
    #[error("tag index must not be empty")]
    EmptyTag,

    /// The tag index exceeds the protocol maximum.
    #[error("tag index too long: {len} bytes (max {MAX_TAG_LENGTH})")]
    TagTooLong {
        /// Actual tag length in bytes.
        len: usize,
    },

    /// The message carries no parent references.
    #[error("message must reference at least {MIN_PARENTS} parent")]
    NoParents,

    /// The message carries more parents than the protocol allows.
    #[error("too many parents: {count} (max {MAX_PARENTS})")]
    TooManyParents {
        /// Actual parent count.
        count: usize,
    },

    /// A parent slot holds the reserved null id.
    #[error("parent reference must not be the null message id")]
    NullParent,

    /// The same parent appears more than once.
    #[error("duplicate parent reference")]
    DuplicateParent,

    /// The transaction consumes no inputs.
    #[error("transaction must consume at least one input")]
    EmptyInputs,

    /// The transaction consumes more inputs than the protocol allows.
    #[error("too many inputs: {count} (max {MAX_INPUT_COUNT})")]
    TooManyInputs {
        /// Actual input count.
        count: usize,
    },

    /// The transaction declares no outputs.
    #[error("transaction must declare at least one output")]
    EmptyOutputs,

    /// The transaction declares more outputs than the protocol allows.
    #[error("too many outputs: {count} (max {MAX_OUTPUT_COUNT})")]
    TooManyOutputs {
        /// Actual output count.
        count: usize,
    },

    /// The transaction must declare exactly one payment-role output.
    #[error("transaction must declare exactly one payment output, found {count}")]
    PaymentOutputCount {
        /// Number of payment-role outputs found.
        count: usize,
    },

    /// The transaction declares more than one remainder-role output.
    #[error("transaction declares more than one remainder output")]
    MultipleRemainders,

    /// An output carries a zero amount.
    #[error("output amount must be positive")]
    ZeroOutputAmount,

    /// A dust-allowance output falls below the allowance minimum.
    #[error("dust-allowance output of {amount} below minimum {DUST_ALLOWANCE_MINIMUM}")]
    DustAllowanceBelowMinimum {
        /// The offending amount.
        amount: u64,
    },

    /// Consumed and produced totals do not match.
    #[error("unbalanced transaction: inputs total {input_total}, outputs total {output_total}")]
    UnbalancedTransaction {
        /// Sum of consumed input amounts.
        input_total: u64,
        /// Sum of declared output amounts.
        output_total: u64,
    },

    /// The number of unlock blocks does not match the number of inputs.
    #[error("unlock count {unlocks} does not match input count {inputs}")]
    UnlockCountMismatch {
        /// Input count.
        inputs: usize,
        /// Unlock block count.
        unlocks: usize,
    },

    /// An unlock block's public key does not hash to its input's address.
    #[error("unlock block {index} does not belong to its input's address")]
    UnlockAddressMismatch {
        /// Index of the offending input/unlock pair.
        index: usize,
    },

    /// An unlock block's signature fails verification.
    #[error("invalid signature in unlock block {index}")]
    SignatureInvalid {
        /// Index of the offending unlock block.
        index: usize,
    },

    /// The message's proof-of-work score is below the required floor.
    #[error("insufficient proof of work: score {score}, required {required}")]
    InsufficientPow {
        /// Leading-zero-bit score of the message hash.
        score: u32,
        /// Required minimum.
        required: u32,
    },

    /// The signer could not produce an unlock block.
    #[error("signing failed: {0}")]
    Signer(#[from] SignerError),
}

// ---------------------------------------------------------------------------
// Payloads
// ---------------------------------------------------------------------------

/// An application-level label with no value-transfer semantics.
///
/// Rides alone in a tag-only message, or inside a transaction essence
/// alongside a value transfer (both at once — a combined payload).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagPayload {
    index: String,
    data: Vec<u8>,
}

impl TagPayload {
    /// A tag with an index and no attached data.
    pub fn new(index: impl Into<String>) -> Self {
        Self {
            index: index.into(),
            data: Vec::new(),
        }
    }

    /// A tag with an index and attached data bytes.
    pub fn with_data(index: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            index: index.into(),
            data,
        }
    }

    /// The tag index string.
    pub fn index(&self) -> &str {
        &self.index
    }

    /// The attached data bytes.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    fn canonical_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(1 + self.index.len() + 4 + self.data.len());
        buf.push(self.index.len() as u8);
        buf.extend_from_slice(self.index.as_bytes());
        buf.extend_from_slice(&(self.data.len() as u32).to_le_bytes());
        buf.extend_from_slice(&self.data);
        buf
    }
}

/// A to-be-consumed UTXO reference inside a transaction essence.
///
/// Carries the owning address so validators know which unlock block must
/// answer for it. The amount is deliberately absent — amounts live in
/// ledger state, not on the wire.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionInput {
    output_id: OutputId,
    address: Address,
}

impl TransactionInput {
    /// References an output for consumption.
    pub fn new(output_id: OutputId, address: Address) -> Self {
        Self { output_id, address }
    }

    /// The consumed output's id.
    pub fn output_id(&self) -> OutputId {
        self.output_id
    }

    /// The address that must unlock this input.
    pub fn address(&self) -> Address {
        self.address
    }
}

/// The role an output plays within its transaction, declared at
/// construction time.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutputRole {
    /// The payment to the destination address.
    Payment,
    /// Change returned to the source address.
    Remainder,
}

impl fmt::Display for OutputRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Payment => write!(f, "payment"),
            Self::Remainder => write!(f, "remainder"),
        }
    }
}

/// A declared transaction output.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionOutput {
    address: Address,
    amount: u64,
    kind: OutputKind,
    role: OutputRole,
}

impl TransactionOutput {
    /// Declares an output.
    pub fn new(address: Address, amount: u64, kind: OutputKind, role: OutputRole) -> Self {
        Self {
            address,
            amount,
            kind,
            role,
        }
    }

    /// The beneficiary address.
    pub fn address(&self) -> Address {
        self.address
    }

    /// The amount in the ledger's smallest unit.
    pub fn amount(&self) -> u64 {
        self.amount
    }

    /// The on-ledger output type.
    pub fn kind(&self) -> OutputKind {
        self.kind
    }

    /// The declared role.
    pub fn role(&self) -> OutputRole {
        self.role
    }
}

/// The signed portion of a transaction: inputs, outputs, and the tag
/// payload that rides along with the transfer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionEssence {
    inputs: Vec<TransactionInput>,
    outputs: Vec<TransactionOutput>,
    tag: TagPayload,
}

impl TransactionEssence {
    /// The consumed input references.
    pub fn inputs(&self) -> &[TransactionInput] {
        &self.inputs
    }

    /// The declared outputs, in declaration order.
    pub fn outputs(&self) -> &[TransactionOutput] {
        &self.outputs
    }

    /// The embedded tag payload.
    pub fn tag(&self) -> &TagPayload {
        &self.tag
    }

    /// Canonical signing bytes: fixed field order, little-endian
    /// integers. Unlock blocks are excluded — signatures cannot cover
    /// themselves.
    pub fn canonical_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(256);

        buf.extend_from_slice(&(self.inputs.len() as u16).to_le_bytes());
        for input in &self.inputs {
            buf.extend_from_slice(input.output_id.message_id().as_bytes());
            buf.extend_from_slice(&input.output_id.index().to_le_bytes());
            buf.extend_from_slice(input.address.as_bytes());
        }

        buf.extend_from_slice(&(self.outputs.len() as u16).to_le_bytes());
        for output in &self.outputs {
            buf.extend_from_slice(output.address.as_bytes());
            buf.extend_from_slice(&output.amount.to_le_bytes());
            buf.push(match output.kind {
                OutputKind::Payment => 0x00,
                OutputKind::DustAllowance => 0x01,
            });
            buf.push(match output.role {
                OutputRole::Payment => 0x00,
                OutputRole::Remainder => 0x01,
            });
        }

        buf.extend_from_slice(&self.tag.canonical_bytes());
        buf
    }
}

/// Proof of authorization for one input: the signing public key and its
/// signature over the essence bytes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnlockBlock {
    public_key: WeavePublicKey,
    signature: WeaveSignature,
}

impl UnlockBlock {
    /// Assembles an unlock block. Only the signer should be doing this.
    pub fn new(public_key: WeavePublicKey, signature: WeaveSignature) -> Self {
        Self {
            public_key,
            signature,
        }
    }

    /// The signing public key.
    pub fn public_key(&self) -> &WeavePublicKey {
        &self.public_key
    }

    /// The signature over the essence bytes.
    pub fn signature(&self) -> &WeaveSignature {
        &self.signature
    }
}

/// A signed value transaction: essence plus one unlock block per input.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    essence: TransactionEssence,
    unlocks: Vec<UnlockBlock>,
}

impl Transaction {
    /// The signed essence.
    pub fn essence(&self) -> &TransactionEssence {
        &self.essence
    }

    /// The unlock blocks, parallel to the essence's inputs.
    pub fn unlocks(&self) -> &[UnlockBlock] {
        &self.unlocks
    }

    fn canonical_bytes(&self) -> Vec<u8> {
        let mut buf = self.essence.canonical_bytes();
        buf.extend_from_slice(&(self.unlocks.len() as u16).to_le_bytes());
        for unlock in &self.unlocks {
            buf.extend_from_slice(unlock.public_key.as_bytes());
            buf.extend_from_slice(unlock.signature.as_bytes());
        }
        buf
    }
}

/// What a message carries.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Payload {
    /// A bare tag — no value transfer.
    Tag(TagPayload),
    /// A signed value transaction (which itself embeds a tag).
    Transaction(Box<Transaction>),
}

// ---------------------------------------------------------------------------
// Message
// ---------------------------------------------------------------------------

/// A DAG message: parent references, a payload, and a proof-of-work
/// nonce.
///
/// The message id is `BLAKE3(canonical bytes)` — nonce included, so
/// solving proof-of-work fixes the final id.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    parents: Vec<MessageId>,
    payload: Payload,
    nonce: u64,
}

impl Message {
    /// The referenced parent messages, in the order they were supplied.
    pub fn parents(&self) -> &[MessageId] {
        &self.parents
    }

    /// The carried payload.
    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    /// The current proof-of-work nonce.
    pub fn nonce(&self) -> u64 {
        self.nonce
    }

    /// Overwrites the nonce. Proof-of-work engines call this while
    /// searching; nobody else should.
    pub fn set_nonce(&mut self, nonce: u64) {
        self.nonce = nonce;
    }

    /// Canonical bytes: parents, payload, nonce.
    pub fn canonical_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(128);
        buf.push(self.parents.len() as u8);
        for parent in &self.parents {
            buf.extend_from_slice(parent.as_bytes());
        }
        match &self.payload {
            Payload::Transaction(tx) => {
                buf.push(0x00);
                buf.extend_from_slice(&tx.canonical_bytes());
            }
            Payload::Tag(tag) => {
                buf.push(0x02);
                buf.extend_from_slice(&tag.canonical_bytes());
            }
        }
        buf.extend_from_slice(&self.nonce.to_le_bytes());
        buf
    }

    /// BLAKE3 of the canonical bytes. Doubles as the id preimage and
    /// the proof-of-work scoring target.
    pub fn content_hash(&self) -> [u8; 32] {
        blake3_hash(&self.canonical_bytes())
    }

    /// Proof-of-work score: leading zero bits of the content hash.
    pub fn pow_score(&self) -> u32 {
        leading_zero_bits(&self.content_hash())
    }
}

/// A message that has passed [`validate`], paired with its content id.
///
/// The only way to obtain one is through the validation pass, so holding
/// a `ValidatedMessage` is proof the message survived it.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ValidatedMessage {
    message: Message,
    id: MessageId,
}

impl ValidatedMessage {
    /// The validated message.
    pub fn message(&self) -> &Message {
        &self.message
    }

    /// The content-derived message id.
    pub fn id(&self) -> MessageId {
        self.id
    }

    /// The carried transaction, if this is a value message.
    pub fn transaction(&self) -> Option<&Transaction> {
        match self.message.payload() {
            Payload::Transaction(tx) => Some(tx),
            Payload::Tag(_) => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Assembly
// ---------------------------------------------------------------------------

/// Builds an unsolved tag-only message.
///
/// Parent and tag bounds are checked here; proof-of-work and the full
/// validation pass are the caller's next two steps.
pub fn build_tag_message(parents: &[MessageId], tag: TagPayload) -> Result<Message, CodecError> {
    check_parents(parents)?;
    check_tag(&tag)?;
    Ok(Message {
        parents: parents.to_vec(),
        payload: Payload::Tag(tag),
        nonce: 0,
    })
}

/// Wraps a signed transaction into an unsolved message.
pub fn build_value_message(
    parents: &[MessageId],
    transaction: Transaction,
) -> Result<Message, CodecError> {
    check_parents(parents)?;
    Ok(Message {
        parents: parents.to_vec(),
        payload: Payload::Transaction(Box::new(transaction)),
        nonce: 0,
    })
}

/// Assembles and signs a value transaction.
///
/// `input_total` is the sum of the consumed outputs' amounts — inputs
/// carry no amount on the wire, so balance enforcement needs it supplied
/// by whoever selected the inputs. Every input is signed with the key
/// the signer holds for that input's address.
pub fn build_transaction(
    inputs: &[TransactionInput],
    input_total: u64,
    outputs: &[TransactionOutput],
    tag: TagPayload,
    signer: &InMemorySigner,
) -> Result<Transaction, CodecError> {
    let essence = TransactionEssence {
        inputs: inputs.to_vec(),
        outputs: outputs.to_vec(),
        tag,
    };
    check_essence(&essence)?;

    let output_total: u64 = essence.outputs.iter().map(|o| o.amount).sum();
    if input_total != output_total {
        return Err(CodecError::UnbalancedTransaction {
            input_total,
            output_total,
        });
    }

    let essence_bytes = essence.canonical_bytes();
    let mut unlocks = Vec::with_capacity(essence.inputs.len());
    for input in &essence.inputs {
        unlocks.push(signer.unlock(&input.address(), &essence_bytes)?);
    }

    Ok(Transaction { essence, unlocks })
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Validates a raw message and stamps it with its content id.
///
/// Structural checks always run: parent bounds, tag bounds, essence
/// shape, unlock count. With `strict` set, the pass additionally
/// verifies every unlock block (key hashes to the input's address,
/// signature covers the essence), enforces the dust-allowance minimum,
/// and requires the proof-of-work score to meet the protocol floor.
pub fn validate(message: &Message, strict: bool) -> Result<ValidatedMessage, CodecError> {
    check_parents(&message.parents)?;

    match &message.payload {
        Payload::Tag(tag) => check_tag(tag)?,
        Payload::Transaction(tx) => {
            check_essence(&tx.essence)?;

            if tx.unlocks.len() != tx.essence.inputs.len() {
                return Err(CodecError::UnlockCountMismatch {
                    inputs: tx.essence.inputs.len(),
                    unlocks: tx.unlocks.len(),
                });
            }

            if strict {
                check_unlocks(tx)?;
                for output in &tx.essence.outputs {
                    if output.kind == OutputKind::DustAllowance
                        && output.amount < DUST_ALLOWANCE_MINIMUM
                    {
                        return Err(CodecError::DustAllowanceBelowMinimum {
                            amount: output.amount,
                        });
                    }
                }
            }
        }
    }

    if strict {
        let score = message.pow_score();
        if score < MIN_POW_DIFFICULTY {
            return Err(CodecError::InsufficientPow {
                score,
                required: MIN_POW_DIFFICULTY,
            });
        }
    }

    Ok(ValidatedMessage {
        message: message.clone(),
        id: MessageId::from_bytes(message.content_hash()),
    })
}

fn check_parents(parents: &[MessageId]) -> Result<(), CodecError> {
    if parents.len() < MIN_PARENTS {
        return Err(CodecError::NoParents);
    }
    if parents.len() > MAX_PARENTS {
        return Err(CodecError::TooManyParents {
            count: parents.len(),
        });
    }
    let mut seen = HashSet::with_capacity(parents.len());
    for parent in parents {
        if parent.is_null() {
            return Err(CodecError::NullParent);
        }
        if !seen.insert(parent) {
            return Err(CodecError::DuplicateParent);
        }
    }
    Ok(())
}

fn check_tag(tag: &TagPayload) -> Result<(), CodecError> {
    if tag.index.is_empty() {
        return Err(CodecError::EmptyTag);
    }
    if tag.index.len() > MAX_TAG_LENGTH {
        return Err(CodecError::TagTooLong {
            len: tag.index.len(),
        });
    }
    Ok(())
}

fn check_essence(essence: &TransactionEssence) -> Result<(), CodecError> {
    if essence.inputs.is_empty() {
        return Err(CodecError::EmptyInputs);
    }
    if essence.inputs.len() > MAX_INPUT_COUNT {
        return Err(CodecError::TooManyInputs {
            count: essence.inputs.len(),
        });
    }
    if essence.outputs.is_empty() {
        return Err(CodecError::EmptyOutputs);
    }
    if essence.outputs.len() > MAX_OUTPUT_COUNT {
        return Err(CodecError::TooManyOutputs {
            count: essence.outputs.len(),
        });
    }

    let payments = essence
        .outputs
        .iter()
        .filter(|o| o.role == OutputRole::Payment)
        .count();
    if payments != 1 {
        return Err(CodecError::PaymentOutputCount { count: payments });
    }
    let remainders = essence
        .outputs
        .iter()
        .filter(|o| o.role == OutputRole::Remainder)
        .count();
    if remainders > 1 {
        return Err(CodecError::MultipleRemainders);
    }

    if essence.outputs.iter().any(|o| o.amount == 0) {
        return Err(CodecError::ZeroOutputAmount);
    }

    check_tag(&essence.tag)
}

fn check_unlocks(tx: &Transaction) -> Result<(), CodecError> {
    let essence_bytes = tx.essence.canonical_bytes();
    for (index, (input, unlock)) in tx.essence.inputs.iter().zip(&tx.unlocks).enumerate() {
        if Address::from_public_key(&unlock.public_key) != input.address() {
            return Err(CodecError::UnlockAddressMismatch { index });
        }
        if !unlock.public_key.verify(&essence_bytes, &unlock.signature) {
            return Err(CodecError::SignatureInvalid { index });
        }
    }
    Ok(())
}
