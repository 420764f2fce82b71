//! # Driven Ports (SPI - Outbound)
//!
//! Interfaces the chaincode depends on. The hosting ledger supplies the
//! key-value state; adapters in this crate provide in-memory and file-backed
//! versions for tests and the standalone runtime.

use crate::errors::StoreError;
use chrono::{DateTime, Utc};
use std::sync::Arc;

// =============================================================================
// STATE ACCESSOR
// =============================================================================

/// Key-value state exposed by the hosting ledger.
///
/// ## Guarantees
///
/// - `put_state` is an unconditional single-key overwrite, durable on return.
/// - There is NO multi-key atomicity and NO compare-and-swap. Callers that
///   read-modify-write one key rely on the host serializing writes to it.
pub trait StateAccessor: Send + Sync {
    /// Read the bytes stored under `key`. `None` when the key was never written.
    fn get_state(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError>;

    /// Overwrite `key` with `value`.
    fn put_state(&self, key: &str, value: &[u8]) -> Result<(), StoreError>;
}

impl<S: StateAccessor + ?Sized> StateAccessor for Arc<S> {
    fn get_state(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        (**self).get_state(key)
    }

    fn put_state(&self, key: &str, value: &[u8]) -> Result<(), StoreError> {
        (**self).put_state(key, value)
    }
}

// =============================================================================
// TIME SOURCE
// =============================================================================

/// Wall clock, injectable for tests.
pub trait TimeSource: Send + Sync {
    /// Current time in UTC.
    fn now(&self) -> DateTime<Utc>;
}
