//! An in-memory `Store` reference implementation (§2 supplemented
//! features). The real backing store is an external collaborator per §1;
//! this exists so the rest of the engine has a contract to compile and be
//! tested against, mirroring how `crates/production` guards its shared maps
//! with `parking_lot::RwLock` rather than an async lock.

use crate::attestations::BatchAttestationRow;
use crate::entries::ConsensusEntry;
use crate::error::StoreError;
use certen_types::{BatchId, ValidatorId};
use parking_lot::RwLock;
use std::collections::HashMap;

/// The persisted-state contract (§6) the rest of the engine is written
/// against. A real deployment backs this with a relational store; that
/// backend is explicitly out of scope here (§1 "relational persistence").
pub trait Store: Send + Sync {
    /// Insert or update a `consensus_entries` row, keyed by `batch_id`.
    fn upsert_entry(&self, entry: ConsensusEntry);

    /// Fetch a `consensus_entries` row by `batch_id`.
    fn get_entry(&self, batch_id: &BatchId) -> Result<ConsensusEntry, StoreError>;

    /// Insert or update a `batch_attestations` row, keyed by `(batch_id, validator_id)`.
    fn upsert_attestation(&self, row: BatchAttestationRow);

    /// Fetch a `batch_attestations` row by its composite key.
    fn get_attestation(
        &self,
        batch_id: &BatchId,
        validator_id: &ValidatorId,
    ) -> Result<BatchAttestationRow, StoreError>;

    /// All attestation rows recorded so far for a batch, in no particular order.
    fn list_attestations(&self, batch_id: &BatchId) -> Vec<BatchAttestationRow>;
}

/// A `parking_lot`-guarded in-memory `Store`.
#[derive(Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<BatchId, ConsensusEntry>>,
    attestations: RwLock<HashMap<(BatchId, ValidatorId), BatchAttestationRow>>,
}

impl MemoryStore {
    /// An empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl Store for MemoryStore {
    #[tracing::instrument(skip(self, entry), fields(batch_id = %entry.batch_id))]
    fn upsert_entry(&self, entry: ConsensusEntry) {
        self.entries.write().insert(entry.batch_id.clone(), entry);
    }

    fn get_entry(&self, batch_id: &BatchId) -> Result<ConsensusEntry, StoreError> {
        self.entries
            .read()
            .get(batch_id)
            .cloned()
            .ok_or_else(|| StoreError::EntryNotFound(batch_id.clone()))
    }

    #[tracing::instrument(skip(self, row), fields(batch_id = %row.batch_id, validator_id = %row.validator_id))]
    fn upsert_attestation(&self, row: BatchAttestationRow) {
        self.attestations
            .write()
            .insert((row.batch_id.clone(), row.validator_id.clone()), row);
    }

    fn get_attestation(
        &self,
        batch_id: &BatchId,
        validator_id: &ValidatorId,
    ) -> Result<BatchAttestationRow, StoreError> {
        self.attestations
            .read()
            .get(&(batch_id.clone(), validator_id.clone()))
            .cloned()
            .ok_or_else(|| StoreError::AttestationNotFound(batch_id.clone(), validator_id.clone()))
    }

    fn list_attestations(&self, batch_id: &BatchId) -> Vec<BatchAttestationRow> {
        self.attestations
            .read()
            .values()
            .filter(|row| &row.batch_id == batch_id)
            .cloned()
            .collect()
    }
}
