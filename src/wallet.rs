//! # Simulated Wallet
//!
//! A wallet is a keypair, its derived address, and the set of outputs it
//! currently considers spendable. That set is the single source of truth
//! the transaction builder consults for input selection, and the only
//! state that booking a fabricated message mutates.
//!
//! ## Output set
//!
//! Outputs are keyed by [`OutputId`] in a `BTreeMap`, so iteration order
//! is the ids' total order — fixed and reproducible, which makes the
//! builder's first-fit input selection deterministic. Keying by id also
//! makes spend-booking an exact removal: either every consumed output is
//! present and the whole spend applies, or none of it does.
//!
//! ## Sharing
//!
//! The harness, the builder, and fabricated messages all need a handle
//! to the same wallet, so wallets travel as
//! [`WalletHandle`] (`Arc<RwLock<Wallet>>`). Usage stays single-threaded
//! per test step; the lock is ownership plumbing, not a concurrency
//! invitation.

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

use crate::crypto::keys::WeaveKeypair;
use crate::ledger::address::Address;
use crate::ledger::types::{OutputId, UnspentOutput};

/// Shared handle to a wallet.
pub type WalletHandle = Arc<RwLock<Wallet>>;

/// Errors from wallet bookkeeping.
#[derive(Debug, Error)]
pub enum WalletError {
    /// A spend named an output this wallet does not hold. The spend is
    /// rejected as a whole; the output set is untouched.
    #[error("wallet '{wallet}' does not hold output {output_id}")]
    UnknownOutput {
        /// The wallet's display name.
        wallet: String,
        /// The output the spend referenced.
        output_id: OutputId,
    },
}

/// A simulated wallet: keypair, address, and unspent-output set.
pub struct Wallet {
    name: String,
    keypair: WeaveKeypair,
    address: Address,
    outputs: BTreeMap<OutputId, UnspentOutput>,
    created_at: DateTime<Utc>,
}

impl Wallet {
    /// Creates a wallet with a fresh OS-RNG keypair.
    pub fn generate(name: impl Into<String>) -> Self {
        Self::with_keypair(name, WeaveKeypair::generate())
    }

    /// Creates a wallet deterministically from a seed. The constructor
    /// scenario tests use, so message ids stay stable across runs.
    pub fn from_seed(name: impl Into<String>, seed: &[u8; 32]) -> Self {
        Self::with_keypair(name, WeaveKeypair::from_seed(seed))
    }

    /// Creates a wallet around an existing keypair.
    pub fn with_keypair(name: impl Into<String>, keypair: WeaveKeypair) -> Self {
        let address = Address::from_public_key(&keypair.public_key());
        Self {
            name: name.into(),
            keypair,
            address,
            outputs: BTreeMap::new(),
            created_at: Utc::now(),
        }
    }

    /// Wraps this wallet into a shared handle.
    pub fn into_handle(self) -> WalletHandle {
        Arc::new(RwLock::new(self))
    }

    /// The wallet's display name, carried into log events.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The wallet's address.
    pub fn address(&self) -> Address {
        self.address
    }

    /// The wallet's keypair.
    pub fn keypair(&self) -> &WeaveKeypair {
        &self.keypair
    }

    /// When the wallet was created.
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// The unspent outputs in id order — the exact candidate order the
    /// builder's input selection walks.
    pub fn unspent_outputs(&self) -> Vec<UnspentOutput> {
        self.outputs.values().cloned().collect()
    }

    /// Whether the wallet holds the given output.
    pub fn holds(&self, output_id: &OutputId) -> bool {
        self.outputs.contains_key(output_id)
    }

    /// Number of unspent outputs held.
    pub fn output_count(&self) -> usize {
        self.outputs.len()
    }

    /// Total spendable balance.
    pub fn balance(&self) -> u64 {
        self.outputs.values().map(UnspentOutput::amount).sum()
    }

    /// Removes consumed outputs from the unspent set.
    ///
    /// All-or-nothing: the outputs are checked for membership first, and
    /// if any is missing the whole spend is rejected without touching
    /// the set. A missing output means the harness double-spent — a test
    /// bug this error exists to surface.
    pub fn book_spent(&mut self, consumed: &[UnspentOutput]) -> Result<(), WalletError> {
        for output in consumed {
            if !self.outputs.contains_key(&output.output_id()) {
                return Err(WalletError::UnknownOutput {
                    wallet: self.name.clone(),
                    output_id: output.output_id(),
                });
            }
        }
        for output in consumed {
            self.outputs.remove(&output.output_id());
        }
        debug!(
            wallet = %self.name,
            spent = consumed.len(),
            balance = self.balance(),
            "booked spends"
        );
        Ok(())
    }

    /// Credits an output to the unspent set.
    pub fn book_credit(&mut self, output: UnspentOutput) {
        debug!(
            wallet = %self.name,
            output_id = %output.output_id(),
            amount = output.amount(),
            "booked credit"
        );
        self.outputs.insert(output.output_id(), output);
    }
}
