//! # UFA Chaincode - Upfront Agreement Ledger Logic
//!
//! Business logic for Upfront Agreements (UFAs) between a seller and a buyer,
//! kept on a shared key-value ledger.
//!
//! ## Purpose
//!
//! - Validate and store agreements, with an append-only audit ledger per
//!   agreement and a master index of every agreement number.
//! - Merge partial updates into stored agreements.
//! - Reconcile invoice pairs (one per counterparty) against an agreement's
//!   net charge, tolerance and already-invoiced total, and record accepted pairs.
//!
//! ## Storage Layout
//!
//! | Key | Value |
//! |-----|-------|
//! | `ALL_RECS` | JSON array of every agreement number, in creation order |
//! | `{number}` | Agreement record (JSON object of strings) |
//! | `UFA_TRXN_HISTORY_{number}` | JSON array of raw payloads applied to the agreement |
//! | `UFA_INVOICE_PREFIX_{number}` | JSON array of invoice numbers recorded against it |
//! | `{invoiceNumber}` | Invoice record |
//!
//! ## Domain Rules
//!
//! | Rule | Enforcement Location |
//! |------|---------------------|
//! | Role must be `SELLER` or `BUYER` | `domain/validation.rs` - `validate_new_agreement()` |
//! | `netCharge` > 0 | `domain/validation.rs` - `validate_terms()` |
//! | 0 < `chargeTolerance` <= 10 | `domain/validation.rs` - `validate_terms()` |
//! | One invoice pair per billing period | `service/invoices.rs` - `billing_period_invoiced()` |
//! | Counterparty amounts agree | `domain/reconciliation.rs` - `check_invoice_pair()` |
//! | Cumulative total within tolerance cap | `domain/reconciliation.rs` - `check_invoice_pair()` |
//! | Rejected mutations write nothing | `service/agreements.rs`, `service/invoices.rs` |
//!
//! ## Outbound Dependencies
//!
//! | Trait | Purpose |
//! |-------|---------|
//! | `StateAccessor` | Ledger key-value state |
//! | `TimeSource` | Probe timestamps |
//!
//! ## Usage Example
//!
//! ```ignore
//! use ufa_chaincode::prelude::*;
//!
//! let service = UfaChaincodeService::in_memory(ServiceConfig::default())?;
//! let dispatcher = CommandDispatcher::new(service);
//!
//! dispatcher.invoke("createUFA", &[
//!     "UFA-1".into(),
//!     "SELLER".into(),
//!     r#"{"netCharge":"1000","chargeTolerance":"5"}"#.into(),
//! ])?;
//! let body = dispatcher.query("getUFADetails", &["UFA-1".into()])?;
//! ```

// Crate-level lints
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]

// =============================================================================
// MODULES
// =============================================================================

pub mod adapters;
pub mod domain;
pub mod errors;
pub mod ports;
pub mod service;

// =============================================================================
// PRELUDE
// =============================================================================

/// Convenient re-exports for common usage.
pub mod prelude {
    // Domain
    pub use crate::domain::entities::{AgreementRecord, Invoice};
    pub use crate::domain::reconciliation::{AgreementTerms, InvoiceViolation};
    pub use crate::domain::validation::{AgreementViolation, ValidationReport};
    pub use crate::domain::value_objects::Role;

    // Errors
    pub use crate::errors::{DispatchError, StoreError, UfaError};

    // Ports
    pub use crate::ports::inbound::{ProbeStatus, UfaChaincodeApi, ValidationResponse};
    pub use crate::ports::outbound::{StateAccessor, TimeSource};

    // Adapters
    pub use crate::adapters::{
        CommandDispatcher, FileBackedStateStore, FixedClock, InMemoryStateStore, SystemClock,
    };

    // Service
    pub use crate::service::{ServiceConfig, ServiceStats, UfaChaincodeService};
}

// =============================================================================
// CONSTANTS
// =============================================================================

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
