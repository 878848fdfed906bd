use certen_types::BatchId;
use certen_types::ValidatorId;

/// Failures from the §6 persisted-state collaborator.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// No `consensus_entries` row exists for the given batch.
    #[error("no consensus entry for batch {0}")]
    EntryNotFound(BatchId),

    /// No `batch_attestations` row exists for the given `(batch_id, validator_id)`.
    #[error("no attestation row for batch {0} validator {1}")]
    AttestationNotFound(BatchId, ValidatorId),

    /// The `result_json` column failed to (de)serialize.
    #[error("result_json (de)serialization failed: {0}")]
    ResultJson(#[from] serde_json::Error),
}
