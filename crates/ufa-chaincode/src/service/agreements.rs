//! Agreement record management: create, update, read, enumerate.

use super::{IndexStore, UfaChaincodeService};
use crate::domain::entities::AgreementRecord;
use crate::domain::validation;
use crate::domain::value_objects::keys;
use crate::errors::UfaError;
use crate::ports::outbound::{StateAccessor, TimeSource};
use tracing::{debug, info, instrument, warn};

impl<S: StateAccessor, T: TimeSource> UfaChaincodeService<S, T> {
    /// Validate and store a new agreement.
    ///
    /// Writes the payload verbatim under `number`, appends `number` to the
    /// master index and the payload to the agreement's audit ledger. Nothing
    /// is written unless validation passes, the number is unused and both
    /// indexes are readable.
    #[instrument(skip(self, payload), fields(payload_len = payload.len()))]
    pub fn create_agreement(&self, number: &str, role: &str, payload: &str) -> Result<(), UfaError> {
        self.check_payload(payload)?;
        if keys::is_reserved(number) {
            return Err(UfaError::ReservedKey {
                key: number.to_string(),
            });
        }

        let report = validation::validate_new_agreement(role, payload)?;
        if !report.is_valid() {
            warn!(message = %report.message().trim_start(), "UFA rejected by validation");
            return Err(self.reject(report.message()));
        }

        let _guard = self.write_lock.lock();

        if self.state.get_state(number)?.is_some() {
            return Err(UfaError::AlreadyExists {
                number: number.to_string(),
            });
        }

        let master = IndexStore::master(&self.state);
        let ledger = IndexStore::audit_ledger(&self.state, number);
        let mut numbers = master.read()?;
        let mut history = ledger.read()?;

        self.state.put_state(number, payload.as_bytes())?;
        numbers.push(number.to_string());
        master.write(&numbers)?;
        history.push(payload.to_string());
        ledger.write(&history)?;

        self.stats.lock().agreements_created += 1;
        info!("Created the UFA after successful validation");
        Ok(())
    }

    /// Merge changed fields into an existing agreement.
    ///
    /// The audit ledger receives the update payload, not the merged record.
    /// The merged record is only re-validated when
    /// [`ServiceConfig::revalidate_updates`](super::ServiceConfig) is set.
    #[instrument(skip(self, payload), fields(payload_len = payload.len()))]
    pub fn update_agreement(
        &self,
        number: &str,
        role: &str,
        payload: &str,
    ) -> Result<AgreementRecord, UfaError> {
        self.check_payload(payload)?;
        let changes = AgreementRecord::from_json(payload)?;

        let _guard = self.write_lock.lock();

        let mut record = match self.state.get_state(number)? {
            Some(bytes) => AgreementRecord::from_stored(number, &bytes)?,
            None => {
                return Err(UfaError::NotFound {
                    number: number.to_string(),
                })
            }
        };
        record.merge(&changes);

        if self.config.revalidate_updates {
            let report = validation::validate_agreement(role, &record);
            if !report.is_valid() {
                warn!(message = %report.message().trim_start(), "UFA update rejected by validation");
                return Err(self.reject(report.message()));
            }
        }

        let ledger = IndexStore::audit_ledger(&self.state, number);
        let mut history = ledger.read()?;
        let bytes = record.to_json_bytes()?;

        self.state.put_state(number, &bytes)?;
        history.push(payload.to_string());
        ledger.write(&history)?;

        self.stats.lock().agreements_updated += 1;
        info!(fields = changes.attributes.len(), "Updated the UFA");
        Ok(record)
    }

    /// Read one agreement. An unset key yields an empty record.
    pub fn agreement(&self, number: &str) -> Result<AgreementRecord, UfaError> {
        match self.state.get_state(number)? {
            Some(bytes) => AgreementRecord::from_stored(number, &bytes),
            None => Ok(AgreementRecord::default()),
        }
    }

    /// Enumerate every agreement in master-index order.
    ///
    /// Best effort: a listed number whose record is missing or does not decode
    /// contributes an empty record instead of failing the enumeration.
    #[instrument(skip(self))]
    pub fn all_agreements(&self, role: &str) -> Result<Vec<AgreementRecord>, UfaError> {
        let numbers = IndexStore::master(&self.state).read()?;
        let mut records = Vec::with_capacity(numbers.len());

        for number in &numbers {
            let record = match self.state.get_state(number)? {
                Some(bytes) => AgreementRecord::from_stored(number, &bytes).unwrap_or_else(|e| {
                    warn!(number = %number, error = %e, "Skipping undecodable UFA");
                    AgreementRecord::default()
                }),
                None => {
                    warn!(number = %number, "Master index lists a UFA with no record");
                    AgreementRecord::default()
                }
            };
            records.push(record);
        }

        debug!(count = records.len(), "Returning all UFA records");
        Ok(records)
    }

    /// Raw payloads appended for `number`, oldest first.
    pub fn history(&self, number: &str) -> Result<Vec<String>, UfaError> {
        IndexStore::audit_ledger(&self.state, number).read()
    }
}
