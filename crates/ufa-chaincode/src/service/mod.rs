//! # UFA Chaincode Service
//!
//! Application service implementing [`UfaChaincodeApi`] on top of a
//! [`StateAccessor`].
//!
//! ## Write ordering
//!
//! The store has no multi-key transactions. Every mutating operation first
//! reads and validates everything it needs (target record, indexes), then
//! performs its writes in a fixed order: primary record, indexes, audit ledger.
//! A rejected request therefore writes nothing. A store failure part-way
//! through the write phase can still leave a partial update, which the error
//! reports.
//!
//! ## Concurrency
//!
//! Mutating operations hold an in-process write lock, so callers sharing one
//! service never interleave read-modify-write cycles. Writers in other
//! processes are NOT covered; the hosting ledger must serialize writes per key.

mod agreements;
mod indexes;
mod invoices;

pub use indexes::{IndexStore, MissingIndex};

use crate::adapters::clock::{unix_date, SystemClock};
use crate::adapters::InMemoryStateStore;
use crate::domain::entities::AgreementRecord;
use crate::domain::reconciliation::InvoiceViolation;
use crate::domain::validation::{self, ValidationReport};
use crate::errors::UfaError;
use crate::ports::inbound::{ProbeStatus, UfaChaincodeApi};
use crate::ports::outbound::{StateAccessor, TimeSource};
use parking_lot::Mutex;
use tracing::{info, instrument};

/// Service configuration.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Re-run agreement validation over the merged record on update.
    ///
    /// Off by default: updates have never been validated and turning this on
    /// changes which updates are accepted.
    pub revalidate_updates: bool,
    /// Largest payload accepted, in bytes.
    pub max_payload_bytes: usize,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            revalidate_updates: false,
            max_payload_bytes: 64 * 1024,
        }
    }
}

/// Counters for the service.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ServiceStats {
    /// Agreements created.
    pub agreements_created: u64,
    /// Agreement updates applied.
    pub agreements_updated: u64,
    /// Invoice pairs recorded.
    pub invoice_pairs_recorded: u64,
    /// Mutations rejected by a business rule.
    pub validation_rejections: u64,
}

/// The UFA chaincode service.
pub struct UfaChaincodeService<S: StateAccessor, T: TimeSource> {
    /// Ledger state.
    pub(crate) state: S,
    /// Clock for `probe`.
    pub(crate) clock: T,
    /// Service configuration.
    pub(crate) config: ServiceConfig,
    /// Serializes mutating operations within this instance.
    pub(crate) write_lock: Mutex<()>,
    /// Service statistics.
    pub(crate) stats: Mutex<ServiceStats>,
}

impl<S: StateAccessor, T: TimeSource> UfaChaincodeService<S, T> {
    /// Create a new service over `state`.
    pub fn new(state: S, clock: T, config: ServiceConfig) -> Self {
        Self {
            state,
            clock,
            config,
            write_lock: Mutex::new(()),
            stats: Mutex::new(ServiceStats::default()),
        }
    }

    /// Underlying state accessor.
    pub fn state(&self) -> &S {
        &self.state
    }

    /// Active configuration.
    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    /// Snapshot of the counters.
    pub fn stats(&self) -> ServiceStats {
        self.stats.lock().clone()
    }

    /// One-time setup: (re)write the master index as an empty list.
    ///
    /// Running this on a populated ledger orphans every existing agreement
    /// from enumeration; use [`Self::is_initialized`] to guard restarts.
    #[instrument(skip(self))]
    pub fn initialize(&self) -> Result<(), UfaError> {
        let _guard = self.write_lock.lock();
        IndexStore::master(&self.state).initialize()?;
        info!("Master index initialized");
        Ok(())
    }

    /// True once the master index exists.
    pub fn is_initialized(&self) -> Result<bool, UfaError> {
        IndexStore::master(&self.state).exists()
    }

    /// Liveness response stamped with the current time.
    pub fn probe_status(&self) -> ProbeStatus {
        ProbeStatus {
            status: "Success".to_string(),
            ts: unix_date(self.clock.now()),
        }
    }

    pub(crate) fn check_payload(&self, payload: &str) -> Result<(), UfaError> {
        if payload.len() > self.config.max_payload_bytes {
            return Err(UfaError::PayloadTooLarge {
                size: payload.len(),
                max: self.config.max_payload_bytes,
            });
        }
        Ok(())
    }

    pub(crate) fn reject(&self, message: String) -> UfaError {
        self.stats.lock().validation_rejections += 1;
        UfaError::Validation(message)
    }
}

impl UfaChaincodeService<InMemoryStateStore, SystemClock> {
    /// Service over a fresh in-memory store with the master index initialized.
    pub fn in_memory(config: ServiceConfig) -> Result<Self, UfaError> {
        let service = Self::new(InMemoryStateStore::new(), SystemClock, config);
        service.initialize()?;
        Ok(service)
    }
}

impl<S: StateAccessor, T: TimeSource> UfaChaincodeApi for UfaChaincodeService<S, T> {
    fn init(&self) -> Result<(), UfaError> {
        self.initialize()
    }

    fn create_ufa(&self, number: &str, role: &str, payload: &str) -> Result<(), UfaError> {
        self.create_agreement(number, role, payload)
    }

    fn update_ufa(
        &self,
        number: &str,
        role: &str,
        payload: &str,
    ) -> Result<AgreementRecord, UfaError> {
        self.update_agreement(number, role, payload)
    }

    fn record_invoices(&self, role: &str, payload: &str) -> Result<(), UfaError> {
        self.record_invoice_pair(role, payload)
    }

    fn get_all_ufa(&self, role: &str) -> Result<Vec<AgreementRecord>, UfaError> {
        self.all_agreements(role)
    }

    fn get_ufa_details(&self, number: &str) -> Result<AgreementRecord, UfaError> {
        self.agreement(number)
    }

    fn get_ufa_history(&self, number: &str) -> Result<Vec<String>, UfaError> {
        self.history(number)
    }

    fn probe(&self) -> ProbeStatus {
        self.probe_status()
    }

    fn validate_new_ufa(&self, role: &str, payload: &str) -> Result<ValidationReport, UfaError> {
        self.check_payload(payload)?;
        validation::validate_new_agreement(role, payload)
    }

    fn validate_invoice_details(
        &self,
        _role: &str,
        payload: &str,
    ) -> Result<Option<InvoiceViolation>, UfaError> {
        self.reconcile_invoices(payload)
    }
}
