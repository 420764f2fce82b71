//! # Index Store
//!
//! Ordered sequences of strings kept as a JSON array under one key. Backs the
//! master index, the per-agreement audit ledger and the per-agreement invoice
//! index.
//!
//! Appending is read, push, write back. Two appends to the same key that
//! interleave lose one entry; the host must serialize writes per key.

use crate::domain::value_objects::keys;
use crate::errors::UfaError;
use crate::ports::StateAccessor;
use tracing::debug;

/// What reading an index key that was never written means.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MissingIndex {
    /// Treat as an empty sequence.
    Empty,
    /// The one-time setup should have written it; fail.
    Uninitialized,
}

/// Handle on one index key.
pub struct IndexStore<'a, S: ?Sized> {
    state: &'a S,
    key: String,
    missing: MissingIndex,
}

impl<'a, S: StateAccessor + ?Sized> IndexStore<'a, S> {
    /// Index at an arbitrary key.
    pub fn new(state: &'a S, key: String, missing: MissingIndex) -> Self {
        Self {
            state,
            key,
            missing,
        }
    }

    /// Master list of all agreement numbers.
    pub fn master(state: &'a S) -> Self {
        Self::new(
            state,
            keys::MASTER_INDEX.to_string(),
            MissingIndex::Uninitialized,
        )
    }

    /// Raw payload history of agreement `number`.
    pub fn audit_ledger(state: &'a S, number: &str) -> Self {
        Self::new(state, keys::audit_ledger(number), MissingIndex::Empty)
    }

    /// Invoice identifiers recorded against agreement `number`.
    pub fn invoice_index(state: &'a S, number: &str) -> Self {
        Self::new(state, keys::invoice_index(number), MissingIndex::Empty)
    }

    /// Storage key of this index.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// True when the key has been written.
    pub fn exists(&self) -> Result<bool, UfaError> {
        Ok(self.state.get_state(&self.key)?.is_some())
    }

    /// Read the full sequence.
    pub fn read(&self) -> Result<Vec<String>, UfaError> {
        match self.state.get_state(&self.key)? {
            Some(bytes) => serde_json::from_slice(&bytes).map_err(|e| UfaError::CorruptRecord {
                key: self.key.clone(),
                message: e.to_string(),
            }),
            None => match self.missing {
                MissingIndex::Empty => Ok(Vec::new()),
                MissingIndex::Uninitialized => Err(UfaError::IndexNotInitialized {
                    key: self.key.clone(),
                }),
            },
        }
    }

    /// Overwrite the full sequence.
    pub fn write(&self, entries: &[String]) -> Result<(), UfaError> {
        let bytes =
            serde_json::to_vec(entries).map_err(|e| UfaError::Serialization(e.to_string()))?;
        self.state.put_state(&self.key, &bytes)?;
        debug!(key = %self.key, len = entries.len(), "Index written");
        Ok(())
    }

    /// Append one entry.
    pub fn append(&self, entry: &str) -> Result<(), UfaError> {
        let mut entries = self.read()?;
        entries.push(entry.to_string());
        self.write(&entries)
    }

    /// Reset to an empty sequence.
    pub fn initialize(&self) -> Result<(), UfaError> {
        self.write(&[])
    }
}
