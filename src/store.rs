//! # Message Store
//!
//! The append-only store fabricated messages land in. The trait is the
//! narrow surface the engine consumes; [`MemoryMessageStore`] is the
//! in-memory reference used by the test harness, keeping messages in
//! insertion order so scenarios can assert on arrival sequence.

use parking_lot::RwLock;
use std::collections::HashMap;
use thiserror::Error;
use tracing::debug;

use crate::ledger::codec::ValidatedMessage;
use crate::ledger::types::MessageId;

/// Errors from appending to a store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The store's capacity limit was reached.
    #[error("message store full: capacity {capacity}")]
    Full {
        /// The configured capacity.
        capacity: usize,
    },
}

/// Receipt for an appended message, exposing its stored identifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StoredHandle {
    message_id: MessageId,
}

impl StoredHandle {
    /// The identifier the message was stored under.
    pub fn message_id(&self) -> MessageId {
        self.message_id
    }
}

/// An append-only store of validated messages.
pub trait MessageStore {
    /// Durably appends a validated message, returning its handle.
    /// Appending a message that is already present is idempotent.
    fn append(&self, message: &ValidatedMessage) -> Result<StoredHandle, StoreError>;

    /// Fetches a stored message by id.
    fn get(&self, id: &MessageId) -> Option<ValidatedMessage>;

    /// Whether a message id is present.
    fn contains(&self, id: &MessageId) -> bool;

    /// Number of stored messages.
    fn len(&self) -> usize;

    /// Whether the store holds nothing.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Stored message ids in arrival order.
    fn message_ids(&self) -> Vec<MessageId>;
}

#[derive(Default)]
struct StoreInner {
    order: Vec<MessageId>,
    by_id: HashMap<MessageId, ValidatedMessage>,
}

/// In-memory reference store.
///
/// Interior mutability via `RwLock` lets the engine hold the store
/// behind a shared reference; usage is still single-threaded per test
/// step, the lock is ownership plumbing rather than a concurrency
/// feature.
pub struct MemoryMessageStore {
    inner: RwLock<StoreInner>,
    capacity: Option<usize>,
}

impl MemoryMessageStore {
    /// An unbounded store.
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(StoreInner::default()),
            capacity: None,
        }
    }

    /// A store that rejects appends past `capacity` distinct messages.
    /// Used to exercise the store-failure path.
    pub fn with_capacity_limit(capacity: usize) -> Self {
        Self {
            inner: RwLock::new(StoreInner::default()),
            capacity: Some(capacity),
        }
    }
}

impl Default for MemoryMessageStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MessageStore for MemoryMessageStore {
    fn append(&self, message: &ValidatedMessage) -> Result<StoredHandle, StoreError> {
        let id = message.id();
        let mut inner = self.inner.write();

        if inner.by_id.contains_key(&id) {
            return Ok(StoredHandle { message_id: id });
        }

        if let Some(capacity) = self.capacity {
            if inner.by_id.len() >= capacity {
                return Err(StoreError::Full { capacity });
            }
        }

        inner.order.push(id);
        inner.by_id.insert(id, message.clone());
        debug!(message_id = %id, total = inner.order.len(), "message appended");
        Ok(StoredHandle { message_id: id })
    }

    fn get(&self, id: &MessageId) -> Option<ValidatedMessage> {
        self.inner.read().by_id.get(id).cloned()
    }

    fn contains(&self, id: &MessageId) -> bool {
        self.inner.read().by_id.contains_key(id)
    }

    fn len(&self) -> usize {
        self.inner.read().order.len()
    }

    fn message_ids(&self) -> Vec<MessageId> {
        self.inner.read().order.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::codec::{build_tag_message, validate, TagPayload};

    fn validated(tag: &str) -> ValidatedMessage {
        let msg = build_tag_message(
            &[MessageId::from_bytes([1u8; 32])],
            TagPayload::new(tag),
        )
        .unwrap();
        validate(&msg, false).unwrap()
    }

    #[test]
    fn append_and_get() {
        let store = MemoryMessageStore::new();
        let msg = validated("a");
        let handle = store.append(&msg).unwrap();

        assert_eq!(handle.message_id(), msg.id());
        assert!(store.contains(&msg.id()));
        assert_eq!(store.get(&msg.id()).unwrap(), msg);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn duplicate_append_is_idempotent() {
        let store = MemoryMessageStore::new();
        let msg = validated("a");
        let h1 = store.append(&msg).unwrap();
        let h2 = store.append(&msg).unwrap();

        assert_eq!(h1, h2);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn arrival_order_is_preserved() {
        let store = MemoryMessageStore::new();
        let first = validated("first");
        let second = validated("second");
        store.append(&first).unwrap();
        store.append(&second).unwrap();

        assert_eq!(store.message_ids(), vec![first.id(), second.id()]);
    }

    #[test]
    fn capacity_limit_rejects_overflow() {
        let store = MemoryMessageStore::with_capacity_limit(1);
        store.append(&validated("fits")).unwrap();
        let err = store.append(&validated("overflows")).unwrap_err();
        assert!(matches!(err, StoreError::Full { capacity: 1 }));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn missing_message_is_absent() {
        let store = MemoryMessageStore::new();
        assert!(store.is_empty());
        assert!(!store.contains(&MessageId::from_bytes([9u8; 32])));
        assert!(store.get(&MessageId::from_bytes([9u8; 32])).is_none());
    }
}
