//! # Fabrication Engine
//!
//! The test-facing core: a fluent [`TransactionBuilder`] that
//! synthesizes signed, proof-of-work-sealed messages against simulated
//! wallets, and the [`FabricatedMessage`] it produces, whose one-shot
//! `store`/`book_on_wallets` lifecycle advances the message store and
//! the wallets' unspent sets in lock-step.
//!
//! ```text
//! builder.rs — input selection, output construction, build terminals
//! message.rs — FabricatedMessage lifecycle and accessors
//! ```
//!
//! Every failure here is terminal for the current test step. Nothing is
//! caught, retried, or partially applied: a build either returns a fully
//! self-consistent [`FabricatedMessage`] or an error before any wallet
//! was touched.

use thiserror::Error;

use crate::config::MIN_POW_DIFFICULTY;
use crate::ledger::codec::CodecError;
use crate::ledger::types::MessageId;
use crate::pow::{HashPow, PowEngine, PowError};
use crate::store::{MemoryMessageStore, MessageStore, StoreError};
use crate::wallet::WalletError;

pub mod builder;
pub mod message;

pub use builder::TransactionBuilder;
pub use message::FabricatedMessage;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors from fabricating, storing, or booking a message.
///
/// The variants group into the taxonomy the harness cares about:
/// builder preconditions (test-setup bugs), insufficient funds,
/// codec/signing rejections, proof-of-work failure, wallet bookkeeping
/// rejections, and lifecycle reuse.
#[derive(Debug, Error)]
pub enum FabricationError {
    /// The builder was given no tag, or an empty one.
    #[error("tag must not be empty")]
    EmptyTag,

    /// The builder was never given parent references.
    #[error("parents must be set before building")]
    MissingParents,

    /// A supplied parent slot holds the null message id.
    #[error("parent reference must not be the null message id")]
    NullParent,

    /// A transfer build needs a source wallet.
    #[error("source wallet must be set before building a transfer")]
    MissingSourceWallet,

    /// A transfer build needs a destination wallet.
    #[error("destination wallet must be set before building a transfer")]
    MissingDestinationWallet,

    /// A transfer build needs a positive amount.
    #[error("transfer amount must be positive")]
    ZeroAmount,

    /// Input selection found nothing to spend.
    #[error("no spendable outputs in wallet '{wallet}' (requested {requested})")]
    NoSpendableOutputs {
        /// The source wallet's name.
        wallet: String,
        /// The amount that was requested.
        requested: u64,
    },

    /// Message or transaction assembly was rejected.
    #[error(transparent)]
    Codec(#[from] CodecError),

    /// The proof-of-work search failed.
    #[error(transparent)]
    Pow(#[from] PowError),

    /// The message store rejected the append.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Wallet bookkeeping rejected the spend.
    #[error(transparent)]
    Wallet(#[from] WalletError),

    /// `store` was called a second time.
    #[error("message already stored as {0}")]
    AlreadyStored(MessageId),

    /// `book_on_wallets` was called a second time.
    #[error("message already booked on wallets")]
    AlreadyBooked,

    /// `stored_id` was read before `store`.
    #[error("message has not been stored")]
    NotStored,

    /// `sent_output` was read on a build that produced no payment
    /// output (a tag-only message).
    #[error("build produced no payment output")]
    NoSentOutput,

    /// `book_on_wallets` was called on a tag-only message.
    #[error("tag-only messages carry no wallet effects to book")]
    Unbookable,
}

// ---------------------------------------------------------------------------
// Fabricator
// ---------------------------------------------------------------------------

/// The harness context: owns the proof-of-work engine and the message
/// store, and hands out builders.
///
/// # Examples
///
/// ```
/// use weave_fabric::fabricate::Fabricator;
/// use weave_fabric::ledger::MessageId;
/// use weave_fabric::wallet::Wallet;
///
/// let fabricator = Fabricator::new();
/// let alice = Wallet::from_seed("alice", &[1u8; 32]).into_handle();
/// let bob = Wallet::from_seed("bob", &[2u8; 32]).into_handle();
///
/// let message = fabricator
///     .message("integration-test")
///     .parents(vec![MessageId::from_bytes([7u8; 32])])
///     .from_wallet(&alice)
///     .to_wallet(&bob)
///     .amount(50)
///     .fake_inputs()
///     .build_transfer()
///     .unwrap();
/// assert_eq!(message.sent_output().unwrap().amount(), 50);
/// ```
pub struct Fabricator {
    pow: Box<dyn PowEngine>,
    store: Box<dyn MessageStore>,
    min_pow_difficulty: u32,
}

impl Fabricator {
    /// A fabricator with the reference collaborators: [`HashPow`] and an
    /// unbounded [`MemoryMessageStore`].
    pub fn new() -> Self {
        Self::with_collaborators(
            Box::new(HashPow::default()),
            Box::new(MemoryMessageStore::new()),
        )
    }

    /// A fabricator with custom collaborators — a different
    /// proof-of-work engine or store implementation.
    pub fn with_collaborators(pow: Box<dyn PowEngine>, store: Box<dyn MessageStore>) -> Self {
        Self {
            pow,
            store,
            min_pow_difficulty: MIN_POW_DIFFICULTY,
        }
    }

    /// Starts a builder for a message carrying the given tag.
    pub fn message(&self, tag: impl Into<String>) -> TransactionBuilder<'_> {
        TransactionBuilder::new(self, tag.into())
    }

    /// The message store fabricated messages are appended to.
    pub fn store(&self) -> &dyn MessageStore {
        self.store.as_ref()
    }

    /// The difficulty floor applied to every build.
    pub fn min_pow_difficulty(&self) -> u32 {
        self.min_pow_difficulty
    }

    pub(crate) fn pow(&self) -> &dyn PowEngine {
        self.pow.as_ref()
    }
}

impl Default for Fabricator {
    fn default() -> Self {
        Self::new()
    }
}
