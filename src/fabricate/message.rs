//! # Fabricated Messages
//!
//! The product of a terminal build: a strictly-validated message plus
//! its UTXO side effects, with a one-shot lifecycle for pushing the
//! message into the store and applying the side effects to the wallets.
//!
//! `store` and `book_on_wallets` are independent transitions — a test
//! may do either, both in either order, or neither — but each may fire
//! exactly once. The second attempt fails without touching anything,
//! which is how the harness catches accidental double-application.

use tracing::{debug, info};

use crate::ledger::codec::ValidatedMessage;
use crate::ledger::types::{MessageId, UnspentOutput};
use crate::store::MessageStore;
use crate::wallet::WalletHandle;

use super::{FabricationError, Fabricator};

/// A built message and its bookkeeping payload.
///
/// Holds the consumed inputs and the produced payment/remainder outputs
/// exactly as the build classified them, so booking is a mechanical
/// replay: spend the consumed, credit the produced.
pub struct FabricatedMessage<'a> {
    fabricator: &'a Fabricator,
    from: Option<WalletHandle>,
    to: Option<WalletHandle>,
    message: ValidatedMessage,
    consumed: Vec<UnspentOutput>,
    sent: Option<UnspentOutput>,
    remainder: Option<UnspentOutput>,
    stored: Option<MessageId>,
    booked: bool,
}

impl<'a> FabricatedMessage<'a> {
    pub(crate) fn tag_only(fabricator: &'a Fabricator, message: ValidatedMessage) -> Self {
        Self {
            fabricator,
            from: None,
            to: None,
            message,
            consumed: Vec::new(),
            sent: None,
            remainder: None,
            stored: None,
            booked: false,
        }
    }

    pub(crate) fn transfer(
        fabricator: &'a Fabricator,
        from: WalletHandle,
        to: WalletHandle,
        message: ValidatedMessage,
        consumed: Vec<UnspentOutput>,
        sent: Option<UnspentOutput>,
        remainder: Option<UnspentOutput>,
    ) -> Self {
        Self {
            fabricator,
            from: Some(from),
            to: Some(to),
            message,
            consumed,
            sent,
            remainder,
            stored: None,
            booked: false,
        }
    }

    // -----------------------------------------------------------------------
    // Lifecycle
    // -----------------------------------------------------------------------

    /// Appends the message to the fabricator's store and records the
    /// stored identifier. One-shot: a second call fails with
    /// [`FabricationError::AlreadyStored`].
    pub fn store(&mut self) -> Result<MessageId, FabricationError> {
        if let Some(id) = self.stored {
            return Err(FabricationError::AlreadyStored(id));
        }
        let handle = self.fabricator.store().append(&self.message)?;
        let id = handle.message_id();
        self.stored = Some(id);
        debug!(message_id = %id, "fabricated message stored");
        Ok(id)
    }

    /// Applies the message's UTXO effects to the wallets: removes every
    /// real consumed input from the source wallet, credits the sent
    /// output to the destination, credits the remainder (if any) back to
    /// the source.
    ///
    /// One-shot: a second call fails with
    /// [`FabricationError::AlreadyBooked`] and mutates nothing. If any
    /// real consumed input is missing from the source wallet the spend
    /// is rejected as a whole and no credit is applied either.
    ///
    /// Synthetic inputs (fake-input builds) are skipped: they were never
    /// members of the source wallet's set, so there is nothing to
    /// remove. The credits still apply.
    pub fn book_on_wallets(&mut self) -> Result<(), FabricationError> {
        if self.booked {
            return Err(FabricationError::AlreadyBooked);
        }
        let (Some(from), Some(to)) = (&self.from, &self.to) else {
            return Err(FabricationError::Unbookable);
        };

        let real_consumed: Vec<UnspentOutput> = self
            .consumed
            .iter()
            .filter(|output| !output.is_synthetic())
            .cloned()
            .collect();

        // Spend first — it is the only step that can fail. Locks are
        // taken one wallet at a time so booking a self-transfer (same
        // wallet on both sides) cannot deadlock.
        {
            let mut source = from.write();
            source.book_spent(&real_consumed)?;
            if let Some(remainder) = &self.remainder {
                source.book_credit(remainder.clone());
            }
        }
        {
            let mut destination = to.write();
            if let Some(sent) = &self.sent {
                destination.book_credit(sent.clone());
            }
        }

        self.booked = true;
        info!(
            message_id = %self.message.id(),
            spent = real_consumed.len(),
            skipped_synthetic = self.consumed.len() - real_consumed.len(),
            credited_sent = self.sent.is_some(),
            credited_remainder = self.remainder.is_some(),
            "booked message on wallets"
        );
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    /// The validated message.
    pub fn message(&self) -> &ValidatedMessage {
        &self.message
    }

    /// The message's content id (available whether or not it was
    /// stored).
    pub fn message_id(&self) -> MessageId {
        self.message.id()
    }

    /// The inputs the build consumed, in consumption order.
    pub fn consumed_outputs(&self) -> &[UnspentOutput] {
        &self.consumed
    }

    /// The payment output produced for the destination. Errs on
    /// tag-only builds, which produce none.
    pub fn sent_output(&self) -> Result<&UnspentOutput, FabricationError> {
        self.sent.as_ref().ok_or(FabricationError::NoSentOutput)
    }

    /// The remainder output returned to the source, when the consumed
    /// total exceeded the transfer amount.
    pub fn remainder_output(&self) -> Option<&UnspentOutput> {
        self.remainder.as_ref()
    }

    /// The identifier the message was stored under. Errs before
    /// [`store`](Self::store) has run.
    pub fn stored_id(&self) -> Result<MessageId, FabricationError> {
        self.stored.ok_or(FabricationError::NotStored)
    }

    /// Whether the message has been stored.
    pub fn is_stored(&self) -> bool {
        self.stored.is_some()
    }

    /// Whether the message has been booked on the wallets.
    pub fn is_booked(&self) -> bool {
        self.booked
    }
}
