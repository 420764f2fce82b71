//! # Invoice Reconciliation
//!
//! Cross-checks an invoice pair against an agreement's terms.
//!
//! Checks run in a fixed order and stop at the first failure:
//!
//! | Order | Check | Message |
//! |-------|-------|---------|
//! | 1 | at least two invoices | `Invoice is missing for Customer or Vendor` |
//! | 2 | agreement readable | `Invalid UFA provided` |
//! | 3 | billing period unused | `Invoice all already raised for {period}` |
//! | 4 | amounts equal | `Customer and Vendor Invoice Amounts are not same` |
//! | 5 | cumulative cap | `Total invoice amount exceded` |
//!
//! Checks 1 and 2 and the history lookup behind check 3 need storage and are
//! driven by the service; [`check_invoice_pair`] covers 3 to 5.

use crate::domain::entities::{AgreementRecord, Invoice};
use crate::domain::value_objects::parse_decimal;
use std::fmt;

/// First failed reconciliation check.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InvoiceViolation {
    /// Fewer than two invoices supplied.
    MissingCounterparty,
    /// Referenced agreement is absent or unreadable.
    InvalidAgreement,
    /// An invoice for this billing period was already recorded.
    PeriodAlreadyInvoiced {
        /// Billing period of the first invoice.
        period: String,
    },
    /// The two counterparties disagree on the amount.
    AmountMismatch,
    /// Accepting the pair would exceed the tolerance-bounded cap.
    TotalExceeded,
}

impl InvoiceViolation {
    /// Wire message, newline-prefixed.
    #[must_use]
    pub fn message(&self) -> String {
        format!("\n{self}")
    }
}

impl fmt::Display for InvoiceViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingCounterparty => f.write_str("Invoice is missing for Customer or Vendor"),
            Self::InvalidAgreement => f.write_str("Invalid UFA provided"),
            Self::PeriodAlreadyInvoiced { period } => {
                write!(f, "Invoice all already raised for {period}")
            }
            Self::AmountMismatch => f.write_str("Customer and Vendor Invoice Amounts are not same"),
            Self::TotalExceeded => f.write_str("Total invoice amount exceded"),
        }
    }
}

/// Numeric terms of an agreement, as read by reconciliation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AgreementTerms {
    /// Net charge (sentinel -1 when malformed).
    pub net_charge: f64,
    /// Tolerance percent (sentinel -1 when malformed).
    pub tolerance: f64,
    /// Amount already invoiced.
    pub raised_inv_total: f64,
}

impl AgreementTerms {
    /// Extract terms from a stored record.
    ///
    /// Returns `None` when `raisedInvTotal` is present but not a decimal.
    /// An absent or empty total counts as zero.
    #[must_use]
    pub fn from_record(record: &AgreementRecord) -> Option<Self> {
        let raised_inv_total = match record.raised_inv_total.as_deref() {
            None | Some("") => 0.0,
            Some(raw) => {
                let value = raw.parse::<f64>().ok()?;
                if !value.is_finite() {
                    return None;
                }
                value
            }
        };

        Some(Self {
            net_charge: parse_decimal(record.net_charge.as_deref().unwrap_or_default()),
            tolerance: parse_decimal(record.tolerance().unwrap_or_default()),
            raised_inv_total,
        })
    }

    /// `netCharge + netCharge * tolerance / 100`.
    #[must_use]
    pub fn max_charge(&self) -> f64 {
        self.net_charge + self.net_charge * self.tolerance / 100.0
    }
}

/// Run the period, amount and cap checks on the first two invoices.
///
/// `period_already_invoiced` is the result of scanning the agreement's
/// invoice index for `first.billing_period`.
#[must_use]
pub fn check_invoice_pair(
    first: &Invoice,
    second: &Invoice,
    terms: &AgreementTerms,
    period_already_invoiced: bool,
) -> Option<InvoiceViolation> {
    let first_amount = parse_decimal(&first.invoice_amt);
    let second_amount = parse_decimal(&second.invoice_amt);

    if period_already_invoiced {
        Some(InvoiceViolation::PeriodAlreadyInvoiced {
            period: first.billing_period.clone(),
        })
    } else if first_amount != second_amount {
        Some(InvoiceViolation::AmountMismatch)
    } else if terms.max_charge() < first_amount + terms.raised_inv_total {
        Some(InvoiceViolation::TotalExceeded)
    } else {
        None
    }
}
