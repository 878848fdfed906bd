//! The `consensus_entries` table shape (§6): one row per batch, upserted on
//! `batch_id` as its attestation bundle progresses toward quorum.

use certen_anchor::BatchState;
use certen_types::{BatchId, BlsPublicKey, BlsSignature, Hash};

/// A `consensus_entries` row.
#[derive(Debug, Clone)]
pub struct ConsensusEntry {
    /// Primary key.
    pub batch_id: BatchId,
    /// Batch Merkle root.
    pub merkle_root: Hash,
    /// Anchor transaction hash, once the batch has been submitted.
    pub anchor_tx_hash: Option<Hash>,
    /// Target-chain block the anchor transaction landed in.
    pub block_number: Option<u64>,
    /// Number of transactions folded into this batch.
    pub tx_count: u64,
    /// Current batch lifecycle state.
    pub state: BatchState,
    /// Attestations collected so far.
    pub attestation_count: u64,
    /// Attestations required to reach quorum (`2f+1`).
    pub required_count: u64,
    /// `required_count / validator_count`, recorded for audit.
    pub quorum_fraction: f64,
    /// BLS aggregate signature, once quorum is met.
    pub aggregate_signature: Option<BlsSignature>,
    /// BLS aggregate public key, once quorum is met.
    pub aggregate_pubkey: Option<BlsPublicKey>,
    /// When attestation collection for this batch began.
    pub start_time: chrono::DateTime<chrono::Utc>,
    /// Last time this row was updated.
    pub last_update: chrono::DateTime<chrono::Utc>,
    /// When the batch reached a terminal state, if it has.
    pub completed_at: Option<chrono::DateTime<chrono::Utc>>,
    /// Serialized terminal result payload (e.g. the `CompletedAttestation`), if any.
    pub result_json: Option<String>,
    /// When this row was first inserted.
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl ConsensusEntry {
    /// A fresh row for a batch that has just started collecting attestations.
    pub fn new(
        batch_id: BatchId,
        merkle_root: Hash,
        tx_count: u64,
        required_count: u64,
        validator_count: u64,
        now: chrono::DateTime<chrono::Utc>,
    ) -> Self {
        let quorum_fraction = if validator_count == 0 {
            0.0
        } else {
            required_count as f64 / validator_count as f64
        };
        Self {
            batch_id,
            merkle_root,
            anchor_tx_hash: None,
            block_number: None,
            tx_count,
            state: BatchState::Pending,
            attestation_count: 0,
            required_count,
            quorum_fraction,
            aggregate_signature: None,
            aggregate_pubkey: None,
            start_time: now,
            last_update: now,
            completed_at: None,
            result_json: None,
            created_at: now,
        }
    }
}
