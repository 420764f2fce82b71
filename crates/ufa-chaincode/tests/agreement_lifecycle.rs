//! # Agreement Lifecycle Tests
//!
//! Drive the chaincode end to end through the dispatcher, the way the
//! hosting ledger does.
//!
//! ## Test Categories
//!
//! 1. **Dispatch** - function routing, argument checks, response bodies
//! 2. **Lifecycle** - create, update, invoice, query
//! 3. **Persistence** - file-backed state survives a restart

use std::sync::Arc;

use chrono::{TimeZone, Utc};
use serde_json::Value;
use ufa_chaincode::prelude::*;

// =============================================================================
// TEST HELPERS
// =============================================================================

const AGREEMENT: &str = r#"{"netCharge":"1000","chargeTolerance":"5","seller":"Globex","buyer":"ACME"}"#;

type Dispatcher<S> = CommandDispatcher<UfaChaincodeService<S, FixedClock>>;

fn clock() -> FixedClock {
    FixedClock(Utc.with_ymd_and_hms(2024, 1, 2, 15, 4, 5).unwrap())
}

fn make_dispatcher() -> Dispatcher<Arc<InMemoryStateStore>> {
    let service = UfaChaincodeService::new(
        Arc::new(InMemoryStateStore::new()),
        clock(),
        ServiceConfig::default(),
    );
    let dispatcher = CommandDispatcher::new(service);
    dispatcher.init().unwrap();
    dispatcher
}

fn args(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| (*v).to_string()).collect()
}

fn query_json<S: StateAccessor>(dispatcher: &Dispatcher<S>, function: &str, values: &[&str]) -> Value {
    let body = dispatcher.query(function, &args(values)).unwrap();
    serde_json::from_slice(&body).unwrap()
}

fn invoices(number: &str, ids: [&str; 2], amount: &str, period: &str) -> String {
    serde_json::json!([
        {
            "ufanumber": number,
            "invoiceNumber": ids[0],
            "invoiceAmt": amount,
            "billingPeriod": period,
            "raisedBy": "SELLER",
        },
        {
            "ufanumber": number,
            "invoiceNumber": ids[1],
            "invoiceAmt": amount,
            "billingPeriod": period,
            "raisedBy": "BUYER",
        }
    ])
    .to_string()
}

// =============================================================================
// DISPATCH
// =============================================================================

#[test]
fn test_unknown_function_is_rejected() {
    let dispatcher = make_dispatcher();

    assert_eq!(
        dispatcher.invoke("deleteUFA", &args(&["UFA-1"])).unwrap_err(),
        DispatchError::UnknownFunction {
            function: "deleteUFA".to_string()
        }
    );
    // Read-only functions are not routed through invoke.
    assert!(matches!(
        dispatcher.invoke("probe", &[]),
        Err(DispatchError::UnknownFunction { .. })
    ));
    assert!(matches!(
        dispatcher.query("createUFA", &args(&["UFA-1", "SELLER", AGREEMENT])),
        Err(DispatchError::UnknownFunction { .. })
    ));
}

#[test]
fn test_missing_arguments_are_rejected() {
    let dispatcher = make_dispatcher();

    let err = dispatcher
        .invoke("createUFA", &args(&["UFA-1", "SELLER"]))
        .unwrap_err();

    assert_eq!(err.to_string(), "createUFA expects 3 argument(s), got 2");
}

#[test]
fn test_probe_response() {
    let dispatcher = make_dispatcher();

    let probe = query_json(&dispatcher, "probe", &[]);

    assert_eq!(probe["status"], "Success");
    assert_eq!(probe["ts"], "Tue Jan  2 15:04:05 UTC 2024");
}

#[test]
fn test_validate_new_ufa_response() {
    let dispatcher = make_dispatcher();

    let ok = query_json(&dispatcher, "validateNewUFA", &["BUYER", AGREEMENT]);
    assert_eq!(ok, serde_json::json!({"validation": "Success", "msg": ""}));

    let bad = query_json(
        &dispatcher,
        "validateNewUFA",
        &["SELLER", r#"{"netCharge":"abc","chargeTolerance":"11"}"#],
    );
    assert_eq!(bad["validation"], "Failure");
    assert_eq!(
        bad["msg"],
        "\nInvalid net charge\nTolerence is out of range. Should be between 0 and 10"
    );
}

#[test]
fn test_validation_failure_surfaces_through_invoke() {
    let dispatcher = make_dispatcher();

    let err = dispatcher
        .invoke("createUFA", &args(&["UFA-1", "CLERK", AGREEMENT]))
        .unwrap_err();

    assert_eq!(
        err.to_string(),
        "Validation failure: \nUser is not authorized to create a UFA"
    );
    assert_eq!(query_json(&dispatcher, "getAllUFA", &["SELLER"]), serde_json::json!([]));
}

// =============================================================================
// LIFECYCLE
// =============================================================================

#[test]
fn test_full_agreement_lifecycle() {
    let dispatcher = make_dispatcher();

    let created = dispatcher
        .invoke("createUFA", &args(&["UFA-1", "SELLER", AGREEMENT]))
        .unwrap();
    assert!(created.is_empty());

    let details = query_json(&dispatcher, "getUFADetails", &["UFA-1"]);
    assert_eq!(details["netCharge"], "1000");
    assert_eq!(details["seller"], "Globex");

    dispatcher
        .invoke(
            "updateUFA",
            &args(&["UFA-1", "BUYER", r#"{"chargeTolerance":"6"}"#]),
        )
        .unwrap();
    assert_eq!(
        query_json(&dispatcher, "getUFADetails", &["UFA-1"])["chargeTolerance"],
        "6"
    );

    // Cap is now 1060.
    let pair = invoices("UFA-1", ["INV-100", "INV-200"], "1060", "2024-Q1");
    let check = dispatcher
        .query("validateInvoiceDetails", &args(&["SELLER", &pair]))
        .unwrap();
    assert!(check.is_empty());

    dispatcher
        .invoke("recordInvoices", &args(&["SELLER", &pair]))
        .unwrap();

    let details = query_json(&dispatcher, "getUFADetails", &["UFA-1"]);
    assert_eq!(details["raisedInvTotal"], "1060");

    let repeat = invoices("UFA-1", ["INV-101", "INV-201"], "1", "2024-Q1");
    let check = dispatcher
        .query("validateInvoiceDetails", &args(&["SELLER", &repeat]))
        .unwrap();
    assert_eq!(
        String::from_utf8(check).unwrap(),
        "\nInvoice all already raised for 2024-Q1"
    );

    let next = invoices("UFA-1", ["INV-102", "INV-202"], "1", "2024-Q2");
    let check = dispatcher
        .query("validateInvoiceDetails", &args(&["SELLER", &next]))
        .unwrap();
    assert_eq!(String::from_utf8(check).unwrap(), "\nTotal invoice amount exceded");

    let history = query_json(&dispatcher, "getUFAHistory", &["UFA-1"]);
    let history = history.as_array().unwrap();
    assert_eq!(history.len(), 3);
    assert_eq!(history[0], AGREEMENT);
    assert_eq!(history[1], r#"{"chargeTolerance":"6"}"#);
    assert_eq!(history[2], pair.as_str());

    let stats = dispatcher.api().stats();
    assert_eq!(stats.agreements_created, 1);
    assert_eq!(stats.agreements_updated, 1);
    assert_eq!(stats.invoice_pairs_recorded, 1);
}

#[test]
fn test_get_all_returns_creation_order() {
    let dispatcher = make_dispatcher();

    for (number, charge) in [("UFA-9", "900"), ("UFA-3", "300")] {
        let payload = format!(r#"{{"netCharge":"{charge}","chargeTolerance":"2"}}"#);
        dispatcher
            .invoke("createUFA", &args(&[number, "BUYER", &payload]))
            .unwrap();
    }

    let all = query_json(&dispatcher, "getAllUFA", &["SELLER"]);
    let charges: Vec<&str> = all
        .as_array()
        .unwrap()
        .iter()
        .map(|record| record["netCharge"].as_str().unwrap())
        .collect();
    assert_eq!(charges, vec!["900", "300"]);
}

#[test]
fn test_unknown_agreement_reads_as_empty_object() {
    let dispatcher = make_dispatcher();

    let body = dispatcher
        .query("getUFADetails", &args(&["UFA-404"]))
        .unwrap();

    assert_eq!(body, b"{}");
}

#[test]
fn test_invoice_cannot_overwrite_other_keys() {
    let dispatcher = make_dispatcher();
    dispatcher
        .invoke("createUFA", &args(&["UFA-1", "SELLER", AGREEMENT]))
        .unwrap();
    dispatcher
        .invoke("createUFA", &args(&["UFA-2", "SELLER", AGREEMENT]))
        .unwrap();

    for ids in [["ALL_RECS", "B-1"], ["UFA-2", "B-1"], ["A-1", "A-1"]] {
        let pair = invoices("UFA-1", ids, "100", "2024-01");
        assert!(dispatcher
            .invoke("recordInvoices", &args(&["SELLER", &pair]))
            .is_err());
    }

    let all = query_json(&dispatcher, "getAllUFA", &["SELLER"]);
    assert_eq!(all.as_array().unwrap().len(), 2);
    assert_eq!(query_json(&dispatcher, "getUFADetails", &["UFA-2"])["buyer"], "ACME");
    assert_eq!(dispatcher.api().stats().invoice_pairs_recorded, 0);
}

// =============================================================================
// PERSISTENCE
// =============================================================================

#[test]
fn test_file_backed_state_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ufa-state.bin");

    {
        let store = FileBackedStateStore::open(&path).unwrap();
        let service = UfaChaincodeService::new(store, clock(), ServiceConfig::default());
        assert!(!service.is_initialized().unwrap());
        service.initialize().unwrap();
        service.create_ufa("UFA-1", "SELLER", AGREEMENT).unwrap();
        service
            .record_invoices("BUYER", &invoices("UFA-1", ["A-1", "B-1"], "500", "2024-01"))
            .unwrap();
    }

    let store = FileBackedStateStore::open(&path).unwrap();
    let service = UfaChaincodeService::new(store, clock(), ServiceConfig::default());
    assert!(service.is_initialized().unwrap());

    let record = service.get_ufa_details("UFA-1").unwrap();
    assert_eq!(record.field("raisedInvTotal"), Some("500"));
    assert_eq!(service.get_all_ufa("SELLER").unwrap().len(), 1);
    assert_eq!(
        service
            .validate_invoice_details("SELLER", &invoices("UFA-1", ["A-2", "B-2"], "1", "2024-01"))
            .unwrap(),
        Some(InvoiceViolation::PeriodAlreadyInvoiced {
            period: "2024-01".to_string()
        })
    );
}
