//! # Transaction Builder
//!
//! The fluent configuration surface a test step drives. Setters take
//! and return the builder by value (the ownership-transferring builder
//! idiom); the two terminal builds borrow it, so a configured builder
//! can produce more than one message.
//!
//! Input selection is deliberately naive: first-fit over the candidate
//! list in its given order, stopping at the first running sum that
//! covers the target. No coin selection, no change minimization. The
//! ordering is part of the contract — scenario tests assert on exactly
//! which outputs get consumed.

use tracing::info;

use crate::ledger::codec::{
    self, OutputRole, TagPayload, TransactionInput, TransactionOutput,
};
use crate::ledger::signer::InMemorySigner;
use crate::ledger::types::{MessageId, OutputId, OutputKind, UnspentOutput};
use crate::pow::PowEngine;
use crate::wallet::WalletHandle;

use super::message::FabricatedMessage;
use super::{FabricationError, Fabricator};

/// Fluent builder for fabricated messages.
///
/// Obtained from [`Fabricator::message`]. Configure with the setters,
/// then finish with [`build_tagged`](Self::build_tagged) (no value
/// transfer) or [`build_transfer`](Self::build_transfer) (signed UTXO
/// transaction, tag riding along).
pub struct TransactionBuilder<'a> {
    fabricator: &'a Fabricator,
    tag: String,
    parents: Vec<MessageId>,
    from: Option<WalletHandle>,
    to: Option<WalletHandle>,
    amount: u64,
    fake_inputs: bool,
    dust_allowance: bool,
    output_to_use: Option<UnspentOutput>,
}

impl<'a> TransactionBuilder<'a> {
    pub(crate) fn new(fabricator: &'a Fabricator, tag: String) -> Self {
        Self {
            fabricator,
            tag,
            parents: Vec::new(),
            from: None,
            to: None,
            amount: 0,
            fake_inputs: false,
            dust_allowance: false,
            output_to_use: None,
        }
    }

    /// Sets the parent message references, taken verbatim into the
    /// built message.
    pub fn parents(mut self, parents: Vec<MessageId>) -> Self {
        self.parents = parents;
        self
    }

    /// Sets the source wallet — inputs are selected from and signed by
    /// this wallet.
    pub fn from_wallet(mut self, wallet: &WalletHandle) -> Self {
        self.from = Some(wallet.clone());
        self
    }

    /// Sets the destination wallet — the payment output goes to its
    /// address.
    pub fn to_wallet(mut self, wallet: &WalletHandle) -> Self {
        self.to = Some(wallet.clone());
        self
    }

    /// Sets the transfer amount in the ledger's smallest unit.
    pub fn amount(mut self, amount: u64) -> Self {
        self.amount = amount;
        self
    }

    /// Makes the payment output a dust-allowance output.
    pub fn dust_allowance(mut self) -> Self {
        self.dust_allowance = true;
        self
    }

    /// Bypasses wallet state: the build consumes a single synthetic
    /// input of exactly the target amount with a null origin. For
    /// constructing economically valid transactions without a funded
    /// wallet — negative tests, mostly.
    pub fn fake_inputs(mut self) -> Self {
        self.fake_inputs = true;
        self
    }

    /// Restricts input selection to exactly this output, ignoring the
    /// wallet's unspent set.
    pub fn using_output(mut self, output: &UnspentOutput) -> Self {
        self.output_to_use = Some(output.clone());
        self
    }

    // -----------------------------------------------------------------------
    // Terminal builds
    // -----------------------------------------------------------------------

    /// Builds a tag-only message: no value transfer, no wallet
    /// interaction. The message is assembled, sealed with proof-of-work,
    /// and strictly validated.
    pub fn build_tagged(&self) -> Result<FabricatedMessage<'a>, FabricationError> {
        self.check_tag_and_parents()?;

        let mut message = codec::build_tag_message(&self.parents, TagPayload::new(&self.tag))?;
        self.fabricator
            .pow()
            .solve(&mut message, self.fabricator.min_pow_difficulty())?;
        let validated = codec::validate(&message, true)?;

        info!(message_id = %validated.id(), tag = %self.tag, "fabricated tag-only message");

        Ok(FabricatedMessage::tag_only(self.fabricator, validated))
    }

    /// Builds a signed value-transfer message.
    ///
    /// Selects inputs from the source wallet (or the override / a
    /// synthetic input), constructs exactly one payment output and at
    /// most one remainder output, signs every input with the source
    /// keypair, seals with proof-of-work, and strictly validates.
    ///
    /// The returned [`FabricatedMessage`] carries the consumed inputs
    /// and the produced outputs so the harness can store and book it.
    pub fn build_transfer(&self) -> Result<FabricatedMessage<'a>, FabricationError> {
        self.check_tag_and_parents()?;
        if self.amount == 0 {
            return Err(FabricationError::ZeroAmount);
        }
        let from = self
            .from
            .clone()
            .ok_or(FabricationError::MissingSourceWallet)?;
        let to = self
            .to
            .clone()
            .ok_or(FabricationError::MissingDestinationWallet)?;

        let (from_address, from_keypair, from_name) = {
            let wallet = from.read();
            (
                wallet.address(),
                wallet.keypair().clone(),
                wallet.name().to_string(),
            )
        };
        let to_address = to.read().address();

        // Candidate priority: explicit override, synthetic fake input,
        // then the wallet's unspent set in id order.
        let candidates: Vec<UnspentOutput> = if let Some(output) = &self.output_to_use {
            vec![output.clone()]
        } else if self.fake_inputs {
            vec![UnspentOutput::synthetic(from_address, self.amount)]
        } else {
            from.read().unspent_outputs()
        };

        if candidates.is_empty() {
            return Err(FabricationError::NoSpendableOutputs {
                wallet: from_name,
                requested: self.amount,
            });
        }

        // First-fit accumulation in candidate order.
        let mut consumed: Vec<UnspentOutput> = Vec::new();
        let mut consumed_total: u64 = 0;
        for output in candidates {
            consumed_total += output.amount();
            consumed.push(output);
            if consumed_total >= self.amount {
                break;
            }
        }

        let inputs: Vec<TransactionInput> = consumed
            .iter()
            .map(|output| TransactionInput::new(output.output_id(), from_address))
            .collect();

        let payment_kind = if self.dust_allowance {
            OutputKind::DustAllowance
        } else {
            OutputKind::Payment
        };
        let mut outputs = vec![TransactionOutput::new(
            to_address,
            self.amount,
            payment_kind,
            OutputRole::Payment,
        )];

        let remainder_amount = consumed_total.saturating_sub(self.amount);
        if remainder_amount > 0 {
            outputs.push(TransactionOutput::new(
                from_address,
                remainder_amount,
                OutputKind::Payment,
                OutputRole::Remainder,
            ));
        }

        // A single signer covers every input: they all originate from
        // the source address. If the candidates could not cover the
        // target, the codec rejects the unbalanced essence here.
        let signer = InMemorySigner::with_key(from_keypair);
        let transaction = codec::build_transaction(
            &inputs,
            consumed_total,
            &outputs,
            TagPayload::new(&self.tag),
            &signer,
        )?;

        let mut message = codec::build_value_message(&self.parents, transaction)?;
        self.fabricator
            .pow()
            .solve(&mut message, self.fabricator.min_pow_difficulty())?;
        let validated = codec::validate(&message, true)?;

        let (sent, remainder) = classify_outputs(&validated, validated.id());

        info!(
            message_id = %validated.id(),
            amount = self.amount,
            kind = %payment_kind,
            from = %from_address,
            to = %to_address,
            remainder = remainder_amount,
            consumed = consumed.len(),
            override_output = ?self.output_to_use.as_ref().map(|o| o.output_id()),
            "fabricated value transfer"
        );

        Ok(FabricatedMessage::transfer(
            self.fabricator,
            from,
            to,
            validated,
            consumed,
            sent,
            remainder,
        ))
    }

    fn check_tag_and_parents(&self) -> Result<(), FabricationError> {
        if self.tag.is_empty() {
            return Err(FabricationError::EmptyTag);
        }
        if self.parents.is_empty() {
            return Err(FabricationError::MissingParents);
        }
        if self.parents.iter().any(MessageId::is_null) {
            return Err(FabricationError::NullParent);
        }
        Ok(())
    }
}

/// Materializes the built transaction's outputs as [`UnspentOutput`]s of
/// the validated message and picks them apart by declared role. Roles
/// are assigned at construction, so this never guesses by address or
/// amount.
fn classify_outputs(
    validated: &codec::ValidatedMessage,
    message_id: MessageId,
) -> (Option<UnspentOutput>, Option<UnspentOutput>) {
    let mut sent = None;
    let mut remainder = None;

    if let Some(transaction) = validated.transaction() {
        for (index, output) in transaction.essence().outputs().iter().enumerate() {
            let unspent = UnspentOutput::new(
                OutputId::new(message_id, index as u16),
                output.address(),
                output.amount(),
                output.kind(),
            );
            match output.role() {
                OutputRole::Payment => sent = Some(unspent),
                OutputRole::Remainder => remainder = Some(unspent),
            }
        }
    }

    (sent, remainder)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::codec::CodecError;
    use crate::ledger::types::OutputKind;
    use crate::wallet::Wallet;

    fn parent(byte: u8) -> MessageId {
        MessageId::from_bytes([byte; 32])
    }

    fn funded_wallet(seed: u8, amounts: &[u64]) -> WalletHandle {
        let handle = Wallet::from_seed(format!("wallet-{seed}"), &[seed; 32]).into_handle();
        {
            let mut wallet = handle.write();
            let address = wallet.address();
            for (i, amount) in amounts.iter().enumerate() {
                wallet.book_credit(UnspentOutput::new(
                    OutputId::new(MessageId::from_bytes([i as u8 + 1; 32]), 0),
                    address,
                    *amount,
                    OutputKind::Payment,
                ));
            }
        }
        handle
    }

    #[test]
    fn empty_tag_is_a_precondition_violation() {
        let fab = Fabricator::new();
        let err = fab
            .message("")
            .parents(vec![parent(1)])
            .build_tagged()
            .unwrap_err();
        assert!(matches!(err, FabricationError::EmptyTag));
    }

    #[test]
    fn missing_parents_rejected() {
        let fab = Fabricator::new();
        let err = fab.message("t").build_tagged().unwrap_err();
        assert!(matches!(err, FabricationError::MissingParents));
    }

    #[test]
    fn null_parent_rejected() {
        let fab = Fabricator::new();
        let err = fab
            .message("t")
            .parents(vec![parent(1), MessageId::NULL])
            .build_tagged()
            .unwrap_err();
        assert!(matches!(err, FabricationError::NullParent));
    }

    #[test]
    fn zero_amount_rejected() {
        let fab = Fabricator::new();
        let a = funded_wallet(1, &[100]);
        let b = funded_wallet(2, &[]);
        let err = fab
            .message("t")
            .parents(vec![parent(1)])
            .from_wallet(&a)
            .to_wallet(&b)
            .build_transfer()
            .unwrap_err();
        assert!(matches!(err, FabricationError::ZeroAmount));
    }

    #[test]
    fn missing_wallets_rejected() {
        let fab = Fabricator::new();
        let a = funded_wallet(1, &[100]);

        let err = fab
            .message("t")
            .parents(vec![parent(1)])
            .amount(10)
            .build_transfer()
            .unwrap_err();
        assert!(matches!(err, FabricationError::MissingSourceWallet));

        let err = fab
            .message("t")
            .parents(vec![parent(1)])
            .amount(10)
            .from_wallet(&a)
            .build_transfer()
            .unwrap_err();
        assert!(matches!(err, FabricationError::MissingDestinationWallet));
    }

    #[test]
    fn empty_wallet_has_nothing_to_spend() {
        let fab = Fabricator::new();
        let a = funded_wallet(1, &[]);
        let b = funded_wallet(2, &[]);
        let err = fab
            .message("t")
            .parents(vec![parent(1)])
            .from_wallet(&a)
            .to_wallet(&b)
            .amount(10)
            .build_transfer()
            .unwrap_err();
        assert!(matches!(
            err,
            FabricationError::NoSpendableOutputs { requested: 10, .. }
        ));
    }

    #[test]
    fn exhausted_candidates_fail_as_unbalanced() {
        let fab = Fabricator::new();
        let a = funded_wallet(1, &[10, 20]);
        let b = funded_wallet(2, &[]);
        let err = fab
            .message("t")
            .parents(vec![parent(1)])
            .from_wallet(&a)
            .to_wallet(&b)
            .amount(100)
            .build_transfer()
            .unwrap_err();
        assert!(matches!(
            err,
            FabricationError::Codec(CodecError::UnbalancedTransaction {
                input_total: 30,
                output_total: 100,
            })
        ));
    }

    #[test]
    fn first_fit_selection_in_id_order() {
        let fab = Fabricator::new();
        // Ids order the outputs 10, 50, 40; 10 + 50 covers 55.
        let a = funded_wallet(1, &[10, 50, 40]);
        let b = funded_wallet(2, &[]);
        let msg = fab
            .message("t")
            .parents(vec![parent(1)])
            .from_wallet(&a)
            .to_wallet(&b)
            .amount(55)
            .build_transfer()
            .unwrap();

        let amounts: Vec<u64> = msg.consumed_outputs().iter().map(|o| o.amount()).collect();
        assert_eq!(amounts, vec![10, 50]);
        assert_eq!(msg.remainder_output().unwrap().amount(), 5);
    }

    #[test]
    fn fake_inputs_bypass_wallet_state() {
        let fab = Fabricator::new();
        let a = funded_wallet(1, &[]);
        let b = funded_wallet(2, &[]);
        let msg = fab
            .message("t")
            .parents(vec![parent(1)])
            .from_wallet(&a)
            .to_wallet(&b)
            .amount(50)
            .fake_inputs()
            .build_transfer()
            .unwrap();

        assert_eq!(msg.consumed_outputs().len(), 1);
        assert!(msg.consumed_outputs()[0].is_synthetic());
        assert_eq!(msg.consumed_outputs()[0].amount(), 50);
        assert!(msg.remainder_output().is_none());
    }

    #[test]
    fn explicit_output_override_is_used_alone() {
        let fab = Fabricator::new();
        let a = funded_wallet(1, &[100, 200]);
        let b = funded_wallet(2, &[]);
        let second = a.read().unspent_outputs()[1].clone();

        let msg = fab
            .message("t")
            .parents(vec![parent(1)])
            .from_wallet(&a)
            .to_wallet(&b)
            .amount(150)
            .using_output(&second)
            .build_transfer()
            .unwrap();

        assert_eq!(msg.consumed_outputs(), &[second]);
        assert_eq!(msg.remainder_output().unwrap().amount(), 50);
    }

    #[test]
    fn dust_allowance_flag_sets_payment_kind() {
        let fab = Fabricator::new();
        let a = funded_wallet(1, &[2_000_000]);
        let b = funded_wallet(2, &[]);
        let msg = fab
            .message("t")
            .parents(vec![parent(1)])
            .from_wallet(&a)
            .to_wallet(&b)
            .amount(1_500_000)
            .dust_allowance()
            .build_transfer()
            .unwrap();

        let sent = msg.sent_output().unwrap();
        assert_eq!(sent.kind(), OutputKind::DustAllowance);
        // The remainder is always a standard output.
        assert_eq!(msg.remainder_output().unwrap().kind(), OutputKind::Payment);
    }

    #[test]
    fn builder_is_reusable_after_a_build() {
        let fab = Fabricator::new();
        let a = funded_wallet(1, &[100]);
        let b = funded_wallet(2, &[]);
        let builder = fab
            .message("t")
            .parents(vec![parent(1)])
            .from_wallet(&a)
            .to_wallet(&b)
            .amount(60);

        let first = builder.build_transfer().unwrap();
        let second = builder.build_transfer().unwrap();
        // Identical configuration, identical message.
        assert_eq!(first.message_id(), second.message_id());
    }
}
