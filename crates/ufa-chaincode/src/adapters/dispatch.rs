//! # Command Dispatcher
//!
//! Adapter between the ledger's `(function, args)` calling convention and
//! [`UfaChaincodeApi`]. Mutating functions go through [`CommandDispatcher::invoke`],
//! read-only ones through [`CommandDispatcher::query`].
//!
//! Arguments are positional strings. Extra trailing arguments are ignored;
//! missing ones are rejected with [`DispatchError::InvalidArguments`].

use crate::errors::DispatchError;
use crate::ports::inbound::{UfaChaincodeApi, ValidationResponse};
use serde::Serialize;
use tracing::debug;

/// Function names accepted by the dispatcher.
pub mod functions {
    /// Create an agreement: `[number, role, payload]`.
    pub const CREATE_UFA: &str = "createUFA";
    /// Merge fields into an agreement: `[number, role, payload]`.
    pub const UPDATE_UFA: &str = "updateUFA";
    /// Reconcile and record an invoice pair: `[role, payload]`.
    pub const RECORD_INVOICES: &str = "recordInvoices";
    /// Every agreement: `[role]`.
    pub const GET_ALL_UFA: &str = "getAllUFA";
    /// One agreement: `[number]`.
    pub const GET_UFA_DETAILS: &str = "getUFADetails";
    /// Audit ledger of one agreement: `[number]`.
    pub const GET_UFA_HISTORY: &str = "getUFAHistory";
    /// Liveness check: no arguments.
    pub const PROBE: &str = "probe";
    /// Dry-run agreement validation: `[role, payload]`.
    pub const VALIDATE_NEW_UFA: &str = "validateNewUFA";
    /// Dry-run invoice reconciliation: `[role, payload]`.
    pub const VALIDATE_INVOICE_DETAILS: &str = "validateInvoiceDetails";
}

/// Routes named invocations onto the chaincode API.
pub struct CommandDispatcher<A> {
    api: A,
}

impl<A: UfaChaincodeApi> CommandDispatcher<A> {
    /// Wrap an API implementation.
    pub fn new(api: A) -> Self {
        Self { api }
    }

    /// Access the wrapped API.
    pub fn api(&self) -> &A {
        &self.api
    }

    /// One-time setup entry point.
    pub fn init(&self) -> Result<Vec<u8>, DispatchError> {
        self.api.init()?;
        Ok(Vec::new())
    }

    /// Mutating entry point. Successful invocations return an empty body.
    pub fn invoke(&self, function: &str, args: &[String]) -> Result<Vec<u8>, DispatchError> {
        debug!(function, args = args.len(), "Invoke");
        match function {
            functions::CREATE_UFA => {
                let [number, role, payload] = take_args::<3>(functions::CREATE_UFA, args)?;
                self.api.create_ufa(number, role, payload)?;
            }
            functions::UPDATE_UFA => {
                let [number, role, payload] = take_args::<3>(functions::UPDATE_UFA, args)?;
                self.api.update_ufa(number, role, payload)?;
            }
            functions::RECORD_INVOICES => {
                let [role, payload] = take_args::<2>(functions::RECORD_INVOICES, args)?;
                self.api.record_invoices(role, payload)?;
            }
            other => {
                return Err(DispatchError::UnknownFunction {
                    function: other.to_string(),
                })
            }
        }
        Ok(Vec::new())
    }

    /// Read-only entry point.
    pub fn query(&self, function: &str, args: &[String]) -> Result<Vec<u8>, DispatchError> {
        debug!(function, args = args.len(), "Query");
        match function {
            functions::GET_ALL_UFA => {
                let [role] = take_args::<1>(functions::GET_ALL_UFA, args)?;
                encode(&self.api.get_all_ufa(role)?)
            }
            functions::GET_UFA_DETAILS => {
                let [number] = take_args::<1>(functions::GET_UFA_DETAILS, args)?;
                encode(&self.api.get_ufa_details(number)?)
            }
            functions::GET_UFA_HISTORY => {
                let [number] = take_args::<1>(functions::GET_UFA_HISTORY, args)?;
                encode(&self.api.get_ufa_history(number)?)
            }
            functions::PROBE => encode(&self.api.probe()),
            functions::VALIDATE_NEW_UFA => {
                let [role, payload] = take_args::<2>(functions::VALIDATE_NEW_UFA, args)?;
                let report = self.api.validate_new_ufa(role, payload)?;
                encode(&ValidationResponse::from(&report))
            }
            functions::VALIDATE_INVOICE_DETAILS => {
                let [role, payload] = take_args::<2>(functions::VALIDATE_INVOICE_DETAILS, args)?;
                let violation = self.api.validate_invoice_details(role, payload)?;
                Ok(violation.map(|v| v.message()).unwrap_or_default().into_bytes())
            }
            other => Err(DispatchError::UnknownFunction {
                function: other.to_string(),
            }),
        }
    }
}

fn take_args<'a, const N: usize>(
    function: &'static str,
    args: &'a [String],
) -> Result<[&'a str; N], DispatchError> {
    if args.len() < N {
        return Err(DispatchError::InvalidArguments {
            function,
            expected: N,
            actual: args.len(),
        });
    }
    Ok(std::array::from_fn(|i| args[i].as_str()))
}

fn encode<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>, DispatchError> {
    serde_json::to_vec(value).map_err(|e| DispatchError::Encoding(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| (*v).to_string()).collect()
    }

    #[test]
    fn test_take_args_rejects_short_lists() {
        let args = strings(&["UFA-1"]);
        let err = take_args::<3>(functions::CREATE_UFA, &args).unwrap_err();
        assert_eq!(
            err,
            DispatchError::InvalidArguments {
                function: "createUFA",
                expected: 3,
                actual: 1,
            }
        );
    }

    #[test]
    fn test_take_args_ignores_trailing_arguments() {
        let args = strings(&["UFA-1", "SELLER"]);
        let [number] = take_args::<1>(functions::GET_UFA_DETAILS, &args).unwrap();
        assert_eq!(number, "UFA-1");
    }
}
