//! # Domain Entities
//!
//! Agreement and invoice records. Both are string-valued JSON objects on the
//! wire; the fields the engines read are typed, everything else rides along
//! in an ordered attribute bag so unknown keys round-trip unchanged.

use crate::errors::UfaError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Spelling of the tolerance key used by earlier deployments.
pub const LEGACY_TOLERANCE_FIELD: &str = "chargTolrence";

// =============================================================================
// AGREEMENT
// =============================================================================

/// Stored document of one Upfront Agreement.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgreementRecord {
    /// Net charge of the agreement (positive decimal).
    #[serde(rename = "netCharge", default, skip_serializing_if = "Option::is_none")]
    pub net_charge: Option<String>,

    /// Tolerance percentage in (0, 10].
    #[serde(
        rename = "chargeTolerance",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub charge_tolerance: Option<String>,

    /// Cumulative amount already invoiced.
    #[serde(
        rename = "raisedInvTotal",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub raised_inv_total: Option<String>,

    /// Every other field, preserved opaquely.
    #[serde(flatten)]
    pub attributes: BTreeMap<String, String>,
}

impl AgreementRecord {
    /// Decode a caller-supplied payload.
    pub fn from_json(payload: &str) -> Result<Self, UfaError> {
        serde_json::from_str(payload).map_err(|e| UfaError::Serialization(e.to_string()))
    }

    /// Decode bytes read back from the store under `key`.
    pub fn from_stored(key: &str, bytes: &[u8]) -> Result<Self, UfaError> {
        serde_json::from_slice(bytes).map_err(|e| UfaError::CorruptRecord {
            key: key.to_string(),
            message: e.to_string(),
        })
    }

    /// Encode for storage.
    pub fn to_json_bytes(&self) -> Result<Vec<u8>, UfaError> {
        serde_json::to_vec(self).map_err(|e| UfaError::Serialization(e.to_string()))
    }

    /// True when the record carries no fields at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.net_charge.is_none()
            && self.charge_tolerance.is_none()
            && self.raised_inv_total.is_none()
            && self.attributes.is_empty()
    }

    /// Tolerance field, falling back to the legacy spelling.
    #[must_use]
    pub fn tolerance(&self) -> Option<&str> {
        self.charge_tolerance
            .as_deref()
            .or_else(|| self.attributes.get(LEGACY_TOLERANCE_FIELD).map(String::as_str))
    }

    /// Look up any field by its wire name.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&str> {
        match name {
            "netCharge" => self.net_charge.as_deref(),
            "chargeTolerance" => self.charge_tolerance.as_deref(),
            "raisedInvTotal" => self.raised_inv_total.as_deref(),
            other => self.attributes.get(other).map(String::as_str),
        }
    }

    /// Overlay `changes` onto this record.
    ///
    /// Fields absent from `changes` are kept; present ones overwrite.
    pub fn merge(&mut self, changes: &AgreementRecord) {
        if let Some(value) = &changes.net_charge {
            self.net_charge = Some(value.clone());
        }
        if let Some(value) = &changes.charge_tolerance {
            self.charge_tolerance = Some(value.clone());
        }
        if let Some(value) = &changes.raised_inv_total {
            self.raised_inv_total = Some(value.clone());
        }
        for (key, value) in &changes.attributes {
            self.attributes.insert(key.clone(), value.clone());
        }
    }
}

// =============================================================================
// INVOICE
// =============================================================================

/// One counterparty's invoice against an agreement.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invoice {
    /// Agreement the invoice is raised against.
    #[serde(rename = "ufanumber", default, skip_serializing_if = "String::is_empty")]
    pub ufa_number: String,

    /// Invoice identifier; also its storage key once recorded.
    #[serde(
        rename = "invoiceNumber",
        default,
        skip_serializing_if = "String::is_empty"
    )]
    pub invoice_number: String,

    /// Invoiced amount (decimal).
    #[serde(rename = "invoiceAmt", default, skip_serializing_if = "String::is_empty")]
    pub invoice_amt: String,

    /// Opaque billing-cycle token.
    #[serde(
        rename = "billingPeriod",
        default,
        skip_serializing_if = "String::is_empty"
    )]
    pub billing_period: String,

    /// Role marker and any other fields.
    #[serde(flatten)]
    pub attributes: BTreeMap<String, String>,
}

impl Invoice {
    /// Decode a caller-supplied array of invoices.
    pub fn list_from_json(payload: &str) -> Result<Vec<Self>, UfaError> {
        serde_json::from_str(payload).map_err(|e| UfaError::Serialization(e.to_string()))
    }

    /// Encode for storage.
    pub fn to_json_bytes(&self) -> Result<Vec<u8>, UfaError> {
        serde_json::to_vec(self).map_err(|e| UfaError::Serialization(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_fields_round_trip() {
        let payload = r#"{"netCharge":"1000","chargeTolerance":"5","buyer":"ACME","zone":"EU"}"#;
        let record = AgreementRecord::from_json(payload).unwrap();

        assert_eq!(record.net_charge.as_deref(), Some("1000"));
        assert_eq!(record.field("buyer"), Some("ACME"));

        let encoded = record.to_json_bytes().unwrap();
        let decoded = AgreementRecord::from_stored("UFA-1", &encoded).unwrap();
        assert_eq!(decoded, record);
    }

    #[test]
    fn test_non_string_values_are_rejected() {
        let err = AgreementRecord::from_json(r#"{"netCharge":1000}"#).unwrap_err();
        assert!(matches!(err, UfaError::Serialization(_)));
    }

    #[test]
    fn test_corrupt_stored_bytes_name_the_key() {
        let err = AgreementRecord::from_stored("UFA-7", b"not json").unwrap_err();
        assert!(matches!(err, UfaError::CorruptRecord { ref key, .. } if key == "UFA-7"));
    }

    #[test]
    fn test_legacy_tolerance_fallback() {
        let record = AgreementRecord::from_json(r#"{"chargTolrence":"4"}"#).unwrap();
        assert_eq!(record.charge_tolerance, None);
        assert_eq!(record.tolerance(), Some("4"));

        let record =
            AgreementRecord::from_json(r#"{"chargTolrence":"4","chargeTolerance":"6"}"#).unwrap();
        assert_eq!(record.tolerance(), Some("6"));
    }

    #[test]
    fn test_merge_overwrites_and_adds() {
        let mut record =
            AgreementRecord::from_json(r#"{"netCharge":"1000","chargeTolerance":"5","a":"1"}"#)
                .unwrap();
        let changes = AgreementRecord::from_json(r#"{"chargeTolerance":"7","b":"2"}"#).unwrap();

        record.merge(&changes);

        assert_eq!(record.field("netCharge"), Some("1000"));
        assert_eq!(record.field("chargeTolerance"), Some("7"));
        assert_eq!(record.field("a"), Some("1"));
        assert_eq!(record.field("b"), Some("2"));
    }

    #[test]
    fn test_empty_record() {
        let record = AgreementRecord::from_json("{}").unwrap();
        assert!(record.is_empty());
        assert_eq!(record.to_json_bytes().unwrap(), b"{}");
    }

    #[test]
    fn test_invoice_list_decoding() {
        let payload = r#"[
            {"ufanumber":"UFA-1","invoiceNumber":"INV-1","invoiceAmt":"10","billingPeriod":"2024-01","raisedBy":"SELLER"},
            {"ufanumber":"UFA-1","invoiceAmt":"10"}
        ]"#;
        let invoices = Invoice::list_from_json(payload).unwrap();

        assert_eq!(invoices.len(), 2);
        assert_eq!(invoices[0].billing_period, "2024-01");
        assert_eq!(invoices[0].attributes.get("raisedBy").map(String::as_str), Some("SELLER"));
        assert!(invoices[1].invoice_number.is_empty());

        assert!(Invoice::list_from_json(r#"{"ufanumber":"UFA-1"}"#).is_err());
    }
}
