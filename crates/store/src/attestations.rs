//! The `batch_attestations` table shape (§6): one row per
//! `(batch_id, validator_id)`, upserted on that composite key.

use certen_types::{BatchId, BlsPublicKey, BlsSignature, Hash, ValidatorId};

/// A `batch_attestations` row.
#[derive(Debug, Clone)]
pub struct BatchAttestationRow {
    /// Part of the composite primary key.
    pub batch_id: BatchId,
    /// Part of the composite primary key.
    pub validator_id: ValidatorId,
    /// Batch Merkle root this row attests to.
    pub merkle_root: Hash,
    /// The validator's BLS signature over the attested message.
    pub bls_signature: BlsSignature,
    /// The validator's BLS public key.
    pub bls_public_key: BlsPublicKey,
    /// Number of transactions in the attested batch.
    pub tx_count: u64,
    /// Block height the validator observed at attestation time.
    pub block_height: u64,
    /// When the validator produced this attestation.
    pub attestation_time: chrono::DateTime<chrono::Utc>,
    /// Whether the signature has been re-verified by this node.
    pub signature_valid: bool,
    /// When `signature_valid` was last (re-)checked.
    pub verified_at: Option<chrono::DateTime<chrono::Utc>>,
    /// When this row was first inserted.
    pub created_at: chrono::DateTime<chrono::Utc>,
}
