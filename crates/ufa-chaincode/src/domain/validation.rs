//! # Agreement Validation
//!
//! Pure checks run before an agreement is created. Every violated rule adds
//! one line to the report; the engine never touches storage.

use crate::domain::entities::AgreementRecord;
use crate::domain::value_objects::{parse_decimal, Role};
use crate::errors::UfaError;
use std::fmt;

/// Upper bound on `chargeTolerance`, in percent (inclusive).
pub const MAX_TOLERANCE_PERCENT: f64 = 10.0;

/// A rule violated by a proposed agreement.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AgreementViolation {
    /// Caller role is neither SELLER nor BUYER.
    UnauthorizedRole,
    /// `netCharge` is not a positive decimal.
    InvalidNetCharge,
    /// `chargeTolerance` is not in (0, 10].
    ToleranceOutOfRange,
}

impl fmt::Display for AgreementViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnauthorizedRole => f.write_str("User is not authorized to create a UFA"),
            Self::InvalidNetCharge => f.write_str("Invalid net charge"),
            Self::ToleranceOutOfRange => {
                f.write_str("Tolerence is out of range. Should be between 0 and 10")
            }
        }
    }
}

/// Outcome of validating an agreement.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ValidationReport {
    /// Violations in the order they were detected.
    pub violations: Vec<AgreementViolation>,
}

impl ValidationReport {
    /// True when no rule was violated.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.violations.is_empty()
    }

    /// Wire message: each violation on its own newline-prefixed line,
    /// empty when valid.
    #[must_use]
    pub fn message(&self) -> String {
        self.violations.iter().map(|v| format!("\n{v}")).collect()
    }
}

/// Validate a create request from its raw payload.
///
/// The role is checked first; an unauthorized caller is rejected without
/// decoding the payload. A payload that does not decode is an error, not a
/// violation.
pub fn validate_new_agreement(role: &str, payload: &str) -> Result<ValidationReport, UfaError> {
    if Role::parse(role).is_none() {
        return Ok(ValidationReport {
            violations: vec![AgreementViolation::UnauthorizedRole],
        });
    }
    let record = AgreementRecord::from_json(payload)?;
    Ok(validate_terms(&record))
}

/// Validate an already decoded record for `role`.
#[must_use]
pub fn validate_agreement(role: &str, record: &AgreementRecord) -> ValidationReport {
    if Role::parse(role).is_none() {
        return ValidationReport {
            violations: vec![AgreementViolation::UnauthorizedRole],
        };
    }
    validate_terms(record)
}

/// Check the financial terms of a record.
#[must_use]
pub fn validate_terms(record: &AgreementRecord) -> ValidationReport {
    let mut violations = Vec::new();

    let net_charge = parse_decimal(record.net_charge.as_deref().unwrap_or_default());
    if net_charge <= 0.0 {
        violations.push(AgreementViolation::InvalidNetCharge);
    }

    let tolerance = parse_decimal(record.tolerance().unwrap_or_default());
    if tolerance <= 0.0 || tolerance > MAX_TOLERANCE_PERCENT {
        violations.push(AgreementViolation::ToleranceOutOfRange);
    }

    ValidationReport { violations }
}
