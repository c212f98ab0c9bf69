// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # Weave Fabric — Test-Transaction Fabrication for the Weave Ledger
//!
//! Integration tests of a DAG ledger node need realistic traffic:
//! signed value transfers, tag-only messages, proof-of-work attached,
//! wallets whose balances actually move. This crate fabricates that
//! traffic deterministically and keeps the bookkeeping honest.
//!
//! The shape of a test step:
//!
//! 1. Configure a [`fabricate::TransactionBuilder`] (tag, parents,
//!    wallets, amount, flags).
//! 2. Call a terminal build — tag-only or value transfer — and get a
//!    [`fabricate::FabricatedMessage`] that already passed strict
//!    validation.
//! 3. Optionally `store()` it (append to the message store) and
//!    `book_on_wallets()` it (spend the consumed inputs, credit the
//!    produced outputs). Each is one-shot.
//!
//! Everything the builds rely on preserves the real protocol
//! invariants: inputs cover the target amount, exactly one payment
//! output, at most one remainder output, every input signed, and
//! double-spends surface as booking failures instead of silently
//! corrupting wallet state.
//!
//! ## Modules
//!
//! - **config** — Protocol constants the node's rules are mirrored from.
//! - **crypto** — Ed25519 keypairs and BLAKE3/SHA-256 hashing.
//! - **ledger** — Addresses, identifiers, outputs, and the message codec.
//! - **pow** — Proof-of-work engine trait and the reference nonce search.
//! - **store** — Message store trait and the in-memory reference store.
//! - **wallet** — The simulated wallet and its unspent-output set.
//! - **fabricate** — The builder, the fabricated message, and their
//!   lifecycle.
//!
//! ## Determinism
//!
//! Seeded wallets, a nonce search that starts at zero, and id-ordered
//! input selection make every build a pure function of its
//! configuration. Run a scenario twice and you get byte-identical
//! messages — which is what lets tests assert on message ids at all.

pub mod config;
pub mod crypto;
pub mod fabricate;
pub mod ledger;
pub mod pow;
pub mod store;
pub mod wallet;

pub use fabricate::{FabricatedMessage, FabricationError, Fabricator, TransactionBuilder};
pub use wallet::{Wallet, WalletHandle};
