//! # Value Objects
//!
//! Roles, storage keys and decimal parsing shared by the engines.

use std::fmt;

// =============================================================================
// ROLES
// =============================================================================

/// Counterparty role a caller claims when invoking the chaincode.
///
/// The role string is trusted as given; no identity verification happens here.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Role {
    /// Selling counterparty.
    Seller,
    /// Buying counterparty.
    Buyer,
}

impl Role {
    /// Parse the wire form. Matching is exact and case-sensitive.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "SELLER" => Some(Self::Seller),
            "BUYER" => Some(Self::Buyer),
            _ => None,
        }
    }

    /// Wire form of the role.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Seller => "SELLER",
            Self::Buyer => "BUYER",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// STORAGE KEYS
// =============================================================================

/// Key layout in the ledger's key-value store.
///
/// These names are shared with existing deployments and must not change.
pub mod keys {
    /// Master list of every agreement number.
    pub const MASTER_INDEX: &str = "ALL_RECS";

    /// Prefix of the per-agreement audit ledger.
    pub const AUDIT_LEDGER_PREFIX: &str = "UFA_TRXN_HISTORY_";

    /// Prefix of the per-agreement invoice index.
    pub const INVOICE_INDEX_PREFIX: &str = "UFA_INVOICE_PREFIX_";

    /// Audit ledger key for agreement `number`.
    #[must_use]
    pub fn audit_ledger(number: &str) -> String {
        format!("{AUDIT_LEDGER_PREFIX}{number}")
    }

    /// Invoice index key for agreement `number`.
    #[must_use]
    pub fn invoice_index(number: &str) -> String {
        format!("{INVOICE_INDEX_PREFIX}{number}")
    }

    /// True for keys owned by the index layer, which callers may never
    /// choose as agreement or invoice identifiers.
    #[must_use]
    pub fn is_reserved(key: &str) -> bool {
        key == MASTER_INDEX
            || key.starts_with(AUDIT_LEDGER_PREFIX)
            || key.starts_with(INVOICE_INDEX_PREFIX)
    }
}

// =============================================================================
// DECIMALS
// =============================================================================

/// Value substituted for any numeric field that fails to parse.
///
/// Every positivity and range check rejects it, so malformed input is
/// indistinguishable from absent input and always fails closed.
pub const UNPARSEABLE: f64 = -1.0;

/// Parse a decimal field, returning [`UNPARSEABLE`] on failure.
///
/// No trimming is applied. `NaN` and infinities count as failures.
#[must_use]
pub fn parse_decimal(raw: &str) -> f64 {
    match raw.parse::<f64>() {
        Ok(value) if value.is_finite() => value,
        _ => UNPARSEABLE,
    }
}

/// Fractional digits kept when a computed decimal is stored.
pub const STORED_DECIMAL_PLACES: i32 = 6;

/// Render a decimal for storage in a string-valued record.
///
/// Rounded to [`STORED_DECIMAL_PLACES`] so accumulated binary error never
/// reaches the ledger; trailing zeros are dropped.
#[must_use]
pub fn format_decimal(value: f64) -> String {
    let scale = 10f64.powi(STORED_DECIMAL_PLACES);
    let rounded = (value * scale).round() / scale;
    // Avoid "-0".
    let rounded = if rounded == 0.0 { 0.0 } else { rounded };
    format!("{rounded}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_parse_is_exact() {
        assert_eq!(Role::parse("SELLER"), Some(Role::Seller));
        assert_eq!(Role::parse("BUYER"), Some(Role::Buyer));
        assert_eq!(Role::parse("seller"), None);
        assert_eq!(Role::parse(" BUYER"), None);
        assert_eq!(Role::parse("AUDITOR"), None);
    }

    #[test]
    fn test_derived_keys() {
        assert_eq!(keys::audit_ledger("UFA-1"), "UFA_TRXN_HISTORY_UFA-1");
        assert_eq!(keys::invoice_index("UFA-1"), "UFA_INVOICE_PREFIX_UFA-1");
    }

    #[test]
    fn test_parse_decimal_sentinel() {
        assert_eq!(parse_decimal("1000"), 1000.0);
        assert_eq!(parse_decimal("5.25"), 5.25);
        assert_eq!(parse_decimal(""), UNPARSEABLE);
        assert_eq!(parse_decimal("ten"), UNPARSEABLE);
        assert_eq!(parse_decimal(" 10"), UNPARSEABLE);
        assert_eq!(parse_decimal("NaN"), UNPARSEABLE);
        assert_eq!(parse_decimal("inf"), UNPARSEABLE);
    }

    #[test]
    fn test_format_decimal_drops_integral_fraction() {
        assert_eq!(format_decimal(1040.0), "1040");
        assert_eq!(format_decimal(12.5), "12.5");
    }

    #[test]
    fn test_format_decimal_rounds_accumulated_error() {
        assert_eq!(format_decimal(0.1 + 0.2), "0.3");
        assert_eq!(format_decimal(1040.1 + 9.9), "1050");
        assert_eq!(format_decimal(2.000_000_4), "2");
        assert_eq!(format_decimal(-0.000_000_1), "0");
    }

    #[test]
    fn test_reserved_keys() {
        assert!(keys::is_reserved("ALL_RECS"));
        assert!(keys::is_reserved("UFA_TRXN_HISTORY_UFA-1"));
        assert!(keys::is_reserved("UFA_INVOICE_PREFIX_"));
        assert!(!keys::is_reserved("INV-1"));
        assert!(!keys::is_reserved("ALL_RECS_2"));
    }
}
