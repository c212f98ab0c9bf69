//! # In-Memory Address Signer
//!
//! Maps addresses to the keypairs that control them. Transaction
//! assembly asks the signer for one unlock block per input; because
//! every input of a fabricated transaction originates from the same
//! source wallet, a signer holding a single key covers them all.

use std::collections::HashMap;
use thiserror::Error;

use crate::crypto::keys::WeaveKeypair;
use crate::ledger::address::Address;
use crate::ledger::codec::UnlockBlock;

/// Errors from signing requests.
#[derive(Debug, Error)]
pub enum SignerError {
    /// The signer holds no key for the requested address.
    #[error("no key held for address {address}")]
    UnknownAddress {
        /// The address the codec asked to unlock.
        address: Address,
    },
}

/// An address-keyed signer holding keys in memory.
#[derive(Default)]
pub struct InMemorySigner {
    keys: HashMap<Address, WeaveKeypair>,
}

impl InMemorySigner {
    /// An empty signer. Mostly useful for asserting that signing fails.
    pub fn new() -> Self {
        Self::default()
    }

    /// A signer holding a single key, registered under the address the
    /// key derives to. The common case for fabricated transactions.
    pub fn with_key(keypair: WeaveKeypair) -> Self {
        let mut signer = Self::new();
        signer.insert(keypair);
        signer
    }

    /// Registers a keypair under its derived address.
    pub fn insert(&mut self, keypair: WeaveKeypair) {
        let address = Address::from_public_key(&keypair.public_key());
        self.keys.insert(address, keypair);
    }

    /// Produces an unlock block for `address` over the given essence
    /// bytes.
    pub fn unlock(&self, address: &Address, essence_bytes: &[u8]) -> Result<UnlockBlock, SignerError> {
        let keypair = self
            .keys
            .get(address)
            .ok_or(SignerError::UnknownAddress { address: *address })?;
        Ok(UnlockBlock::new(
            keypair.public_key(),
            keypair.sign(essence_bytes),
        ))
    }
}
