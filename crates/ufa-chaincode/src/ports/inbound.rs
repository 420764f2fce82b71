//! # Driving Ports (API - Inbound)
//!
//! The command surface exposed to the ledger's dispatch layer.
//!
//! | Function | Kind | Method |
//! |----------|------|--------|
//! | `createUFA` | invoke | [`UfaChaincodeApi::create_ufa`] |
//! | `updateUFA` | invoke | [`UfaChaincodeApi::update_ufa`] |
//! | `recordInvoices` | invoke | [`UfaChaincodeApi::record_invoices`] |
//! | `getAllUFA` | query | [`UfaChaincodeApi::get_all_ufa`] |
//! | `getUFADetails` | query | [`UfaChaincodeApi::get_ufa_details`] |
//! | `getUFAHistory` | query | [`UfaChaincodeApi::get_ufa_history`] |
//! | `probe` | query | [`UfaChaincodeApi::probe`] |
//! | `validateNewUFA` | query | [`UfaChaincodeApi::validate_new_ufa`] |
//! | `validateInvoiceDetails` | query | [`UfaChaincodeApi::validate_invoice_details`] |

use crate::domain::entities::AgreementRecord;
use crate::domain::reconciliation::InvoiceViolation;
use crate::domain::validation::ValidationReport;
use crate::errors::UfaError;
use serde::{Deserialize, Serialize};

/// Liveness response.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbeStatus {
    /// Always `Success` when the chaincode answers.
    pub status: String,
    /// Unix-date formatted timestamp.
    pub ts: String,
}

/// Outcome label of a dry-run validation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValidationStatus {
    /// No rule violated.
    Success,
    /// At least one rule violated.
    Failure,
}

/// Response body of `validateNewUFA`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResponse {
    /// Overall outcome.
    pub validation: ValidationStatus,
    /// Concatenated violation lines; empty on success.
    pub msg: String,
}

impl From<&ValidationReport> for ValidationResponse {
    fn from(report: &ValidationReport) -> Self {
        Self {
            validation: if report.is_valid() {
                ValidationStatus::Success
            } else {
                ValidationStatus::Failure
            },
            msg: report.message(),
        }
    }
}

/// Primary API of the UFA chaincode.
pub trait UfaChaincodeApi: Send + Sync {
    /// One-time setup: write an empty master index.
    fn init(&self) -> Result<(), UfaError>;

    /// Validate and create a new agreement.
    fn create_ufa(&self, number: &str, role: &str, payload: &str) -> Result<(), UfaError>;

    /// Merge changed fields into an existing agreement. Returns the merged record.
    fn update_ufa(&self, number: &str, role: &str, payload: &str)
        -> Result<AgreementRecord, UfaError>;

    /// Reconcile and record an invoice pair.
    fn record_invoices(&self, role: &str, payload: &str) -> Result<(), UfaError>;

    /// Every agreement in master-index order.
    fn get_all_ufa(&self, role: &str) -> Result<Vec<AgreementRecord>, UfaError>;

    /// One agreement; empty when absent.
    fn get_ufa_details(&self, number: &str) -> Result<AgreementRecord, UfaError>;

    /// Raw payloads appended to the agreement's audit ledger.
    fn get_ufa_history(&self, number: &str) -> Result<Vec<String>, UfaError>;

    /// Liveness check.
    fn probe(&self) -> ProbeStatus;

    /// Dry-run agreement validation.
    fn validate_new_ufa(&self, role: &str, payload: &str) -> Result<ValidationReport, UfaError>;

    /// Dry-run invoice reconciliation. `None` means the pair is acceptable.
    fn validate_invoice_details(
        &self,
        role: &str,
        payload: &str,
    ) -> Result<Option<InvoiceViolation>, UfaError>;
}
