//! # Error Types
//!
//! All error types for the UFA chaincode.

use thiserror::Error;

// =============================================================================
// STORE ERRORS
// =============================================================================

/// Errors raised by a [`StateAccessor`](crate::ports::StateAccessor) implementation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Underlying I/O failed.
    #[error("state store I/O error: {message}")]
    Io {
        /// Underlying error text.
        message: String,
    },

    /// A lock guarding the store was poisoned by a panicking writer.
    #[error("state store lock poisoned")]
    LockPoisoned,

    /// Persisted store contents could not be loaded.
    #[error("state store corrupted: {message}")]
    Corrupted {
        /// What failed to load.
        message: String,
    },
}

// =============================================================================
// CHAINCODE ERRORS
// =============================================================================

/// Errors surfaced by the agreement and invoice operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum UfaError {
    /// A business rule rejected the request. Carries the validation message.
    #[error("Validation failure: {0}")]
    Validation(String),

    /// No agreement is stored under this number.
    #[error("UFA not found: {number}")]
    NotFound {
        /// Agreement number.
        number: String,
    },

    /// An agreement is already stored under this number.
    #[error("UFA already exists: {number}")]
    AlreadyExists {
        /// Agreement number.
        number: String,
    },

    /// Stored bytes under `key` did not decode.
    #[error("corrupt record under key {key}: {message}")]
    CorruptRecord {
        /// Storage key.
        key: String,
        /// Decoder error text.
        message: String,
    },

    /// The index key was never initialized by the one-time setup.
    #[error("index not initialized: {key}")]
    IndexNotInitialized {
        /// Index key.
        key: String,
    },

    /// Caller supplied a payload that could not be decoded.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Payload exceeds the configured limit.
    #[error("payload too large: {size} > {max} bytes")]
    PayloadTooLarge {
        /// Payload size in bytes.
        size: usize,
        /// Configured limit in bytes.
        max: usize,
    },

    /// An invoice submitted for recording has no identifier.
    #[error("invoice at position {position} has no invoiceNumber")]
    MissingInvoiceNumber {
        /// Index of the invoice in the payload.
        position: usize,
    },

    /// An invoice number names a key that is already written.
    #[error("key already in use: {invoice_number}")]
    InvoiceKeyTaken {
        /// Invoice number.
        invoice_number: String,
    },

    /// The same invoice number appears twice in one payload.
    #[error("invoice number {invoice_number} repeated in payload")]
    DuplicateInvoiceNumber {
        /// Invoice number.
        invoice_number: String,
    },

    /// A caller-chosen identifier falls in the chaincode's own key space.
    #[error("reserved key: {key}")]
    ReservedKey {
        /// Offending identifier.
        key: String,
    },

    /// Recorded invoice amounts must be positive decimals.
    #[error("invalid invoice amount: {amount:?}")]
    InvalidInvoiceAmount {
        /// Amount as submitted.
        amount: String,
    },

    /// The state store failed.
    #[error("state error: {0}")]
    Store(#[from] StoreError),
}

impl UfaError {
    /// Returns true if the request was rejected by a business rule rather
    /// than by a storage or decoding problem.
    #[must_use]
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}

// =============================================================================
// DISPATCH ERRORS
// =============================================================================

/// Errors from routing a `(function, args)` invocation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DispatchError {
    /// The function name is not part of the command surface.
    #[error("unknown function: {function}")]
    UnknownFunction {
        /// Requested function name.
        function: String,
    },

    /// Too few arguments for the function.
    #[error("{function} expects {expected} argument(s), got {actual}")]
    InvalidArguments {
        /// Function name.
        function: &'static str,
        /// Minimum argument count.
        expected: usize,
        /// Arguments supplied.
        actual: usize,
    },

    /// The underlying operation failed.
    #[error(transparent)]
    Ufa(#[from] UfaError),

    /// A response could not be encoded.
    #[error("response encoding failed: {0}")]
    Encoding(String),
}

// =============================================================================
// TESTS
// =============================================================================
