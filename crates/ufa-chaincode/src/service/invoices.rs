//! Invoice reconciliation and recording.

use super::{IndexStore, UfaChaincodeService};
use crate::domain::entities::{AgreementRecord, Invoice};
use crate::domain::reconciliation::{check_invoice_pair, AgreementTerms, InvoiceViolation};
use crate::domain::value_objects::{format_decimal, keys, parse_decimal};
use crate::errors::UfaError;
use crate::ports::outbound::{StateAccessor, TimeSource};
use std::collections::HashSet;
use tracing::{debug, info, instrument, warn};

impl<S: StateAccessor, T: TimeSource> UfaChaincodeService<S, T> {
    /// Dry-run reconciliation of an invoice payload. `None` means acceptable.
    #[instrument(skip(self, payload), fields(payload_len = payload.len()))]
    pub fn reconcile_invoices(&self, payload: &str) -> Result<Option<InvoiceViolation>, UfaError> {
        self.check_payload(payload)?;
        let invoices = Invoice::list_from_json(payload)?;
        let outcome = self.reconcile(&invoices)?;
        debug!(violation = ?outcome, "Invoice validation finished");
        Ok(outcome)
    }

    /// Reconcile an invoice pair and, if accepted, record it.
    ///
    /// Each invoice is stored under its `invoiceNumber` and appended to the
    /// agreement's invoice index; the first invoice's amount is added to the
    /// agreement's `raisedInvTotal`; the payload goes to the audit ledger.
    ///
    /// Beyond reconciliation, recording requires a positive amount and
    /// invoice numbers that are unique, unreserved and not yet written, so
    /// a recorded invoice is never overwritten.
    #[instrument(skip(self, payload), fields(payload_len = payload.len()))]
    pub fn record_invoice_pair(&self, role: &str, payload: &str) -> Result<(), UfaError> {
        self.check_payload(payload)?;
        let invoices = Invoice::list_from_json(payload)?;

        let _guard = self.write_lock.lock();

        if let Some(violation) = self.reconcile(&invoices)? {
            warn!(%violation, "Invoice pair rejected");
            return Err(self.reject(violation.message()));
        }
        if let Some(position) = invoices.iter().position(|i| i.invoice_number.is_empty()) {
            return Err(UfaError::MissingInvoiceNumber { position });
        }

        // reconcile() guarantees at least two invoices and a readable agreement.
        let first = &invoices[0];
        let amount = parse_decimal(&first.invoice_amt);
        if amount <= 0.0 {
            warn!(amount = %first.invoice_amt, "Invoice pair rejected: amount not positive");
            return Err(UfaError::InvalidInvoiceAmount {
                amount: first.invoice_amt.clone(),
            });
        }
        self.check_invoice_keys(&invoices)?;

        let number = first.ufa_number.as_str();
        let stored = self
            .state
            .get_state(number)?
            .ok_or_else(|| UfaError::NotFound {
                number: number.to_string(),
            })?;
        let mut agreement = AgreementRecord::from_stored(number, &stored)?;
        let terms = AgreementTerms::from_record(&agreement).ok_or_else(|| {
            UfaError::CorruptRecord {
                key: number.to_string(),
                message: "raisedInvTotal is not a decimal".to_string(),
            }
        })?;

        let index = IndexStore::invoice_index(&self.state, number);
        let ledger = IndexStore::audit_ledger(&self.state, number);
        let mut invoice_numbers = index.read()?;
        let mut history = ledger.read()?;

        for invoice in &invoices {
            self.state
                .put_state(&invoice.invoice_number, &invoice.to_json_bytes()?)?;
            invoice_numbers.push(invoice.invoice_number.clone());
        }
        index.write(&invoice_numbers)?;

        let raised = terms.raised_inv_total + amount;
        agreement.raised_inv_total = Some(format_decimal(raised));
        self.state.put_state(number, &agreement.to_json_bytes()?)?;

        history.push(payload.to_string());
        ledger.write(&history)?;

        self.stats.lock().invoice_pairs_recorded += 1;
        info!(
            number,
            role,
            period = %first.billing_period,
            raised_inv_total = raised,
            "Recorded invoice pair"
        );
        Ok(())
    }

    /// Every invoice number must be a fresh key: not reserved, not repeated
    /// within the payload and not already written.
    fn check_invoice_keys(&self, invoices: &[Invoice]) -> Result<(), UfaError> {
        let mut seen = HashSet::with_capacity(invoices.len());

        for invoice in invoices {
            let id = invoice.invoice_number.as_str();
            if keys::is_reserved(id) {
                return Err(UfaError::ReservedKey { key: id.to_string() });
            }
            if !seen.insert(id) {
                return Err(UfaError::DuplicateInvoiceNumber {
                    invoice_number: id.to_string(),
                });
            }
            if self.state.get_state(id)?.is_some() {
                return Err(UfaError::InvoiceKeyTaken {
                    invoice_number: id.to_string(),
                });
            }
        }
        Ok(())
    }

    fn reconcile(&self, invoices: &[Invoice]) -> Result<Option<InvoiceViolation>, UfaError> {
        let [first, second, ..] = invoices else {
            return Ok(Some(InvoiceViolation::MissingCounterparty));
        };

        let number = first.ufa_number.as_str();
        let Some(terms) = self.agreement_terms(number)? else {
            return Ok(Some(InvoiceViolation::InvalidAgreement));
        };

        let already_invoiced = self.billing_period_invoiced(number, &first.billing_period)?;
        Ok(check_invoice_pair(first, second, &terms, already_invoiced))
    }

    /// Terms of agreement `number`, or `None` when it is absent or unreadable.
    fn agreement_terms(&self, number: &str) -> Result<Option<AgreementTerms>, UfaError> {
        let Some(bytes) = self.state.get_state(number)? else {
            debug!(number, "Invoice references an unknown UFA");
            return Ok(None);
        };
        match AgreementRecord::from_stored(number, &bytes) {
            Ok(record) => Ok(AgreementTerms::from_record(&record)),
            Err(e) => {
                warn!(number, error = %e, "Invoice references an undecodable UFA");
                Ok(None)
            }
        }
    }

    /// True if any invoice recorded for `number` carries `period`.
    ///
    /// Index entries whose invoice record is missing or does not decode are
    /// skipped.
    fn billing_period_invoiced(&self, number: &str, period: &str) -> Result<bool, UfaError> {
        let invoice_numbers = IndexStore::invoice_index(&self.state, number).read()?;

        for invoice_number in &invoice_numbers {
            let Some(bytes) = self.state.get_state(invoice_number)? else {
                warn!(number, invoice_number = %invoice_number, "Indexed invoice has no record");
                continue;
            };
            match serde_json::from_slice::<Invoice>(&bytes) {
                Ok(invoice) if invoice.billing_period == period => return Ok(true),
                Ok(_) => {}
                Err(e) => {
                    warn!(invoice_number = %invoice_number, error = %e, "Skipping undecodable invoice");
                }
            }
        }
        Ok(false)
    }
}
