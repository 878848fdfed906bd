//! Batch lifecycle and batching policy (§4.E).

use crate::error::AnchorError;
use certen_types::{BatchId, Hash, Platform};
use std::time::Duration;

/// A batch's pricing/scheduling class (§4.E).
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum BatchClass {
    /// Fixed interval, low price, accepts best-effort delay up to `interval + grace`.
    OnCadence,
    /// Immediate anchoring, higher price, only tolerates delay during
    /// on-chain confirmation phases.
    OnDemand,
}

/// A batch's lifecycle state (§3 "Lifecycles").
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum BatchState {
    /// Accepting transactions.
    Pending,
    /// No longer accepting transactions; Merkle root not yet built.
    Closed,
    /// Anchor transaction submitted to the target chain, awaiting confirmations.
    Anchoring,
    /// Anchor transaction observed with sufficient confirmations.
    Anchored,
    /// Terminal: fully confirmed and available to attestation.
    Confirmed,
    /// Terminal sink: batching or anchoring failed irrecoverably.
    Failed,
}

/// Tunables for batch scheduling and staleness detection (§4.E).
#[derive(Debug, Clone, Copy)]
pub struct BatchPolicy {
    /// On-cadence fixed flush interval. Default 15 minutes.
    pub cadence_interval: Duration,
    /// On-cadence best-effort grace beyond the interval. Default 5 minutes.
    pub cadence_grace: Duration,
    /// Maximum time an on-demand batch may sit `Pending`. Default 2 minutes.
    pub on_demand_pending_budget: Duration,
    /// Maximum time an on-demand batch may sit `Anchoring`. Default 5 minutes.
    pub on_demand_anchoring_budget: Duration,
}

impl Default for BatchPolicy {
    fn default() -> Self {
        Self {
            cadence_interval: Duration::from_secs(15 * 60),
            cadence_grace: Duration::from_secs(5 * 60),
            on_demand_pending_budget: Duration::from_secs(2 * 60),
            on_demand_anchoring_budget: Duration::from_secs(5 * 60),
        }
    }
}

/// A batch of finalised source-ledger transactions awaiting anchoring (§4.E).
#[derive(Debug, Clone)]
pub struct Batch {
    /// Batch identifier.
    pub id: BatchId,
    /// Pricing/scheduling class.
    pub class: BatchClass,
    /// Target chain platform.
    pub platform: Platform,
    /// Ordered transaction-hash leaves (insertion order; never reordered, §5).
    leaves: Vec<Hash>,
    /// Current lifecycle state.
    pub state: BatchState,
    /// When the batch was created.
    pub created_at: chrono::DateTime<chrono::Utc>,
    /// When `state` was last updated.
    pub last_update: chrono::DateTime<chrono::Utc>,
    /// Merkle root, set once the batch closes.
    pub merkle_root: Option<Hash>,
    /// Anchor transaction hash, set once submitted.
    pub anchor_tx_hash: Option<Hash>,
    /// Target-chain block number the anchor transaction landed in, set once observed.
    pub anchor_block_number: Option<u64>,
}

impl Batch {
    /// Start a new, empty, `Pending` batch.
    pub fn new(id: BatchId, class: BatchClass, platform: Platform, now: chrono::DateTime<chrono::Utc>) -> Self {
        Self {
            id,
            class,
            platform,
            leaves: Vec::new(),
            state: BatchState::Pending,
            created_at: now,
            last_update: now,
            merkle_root: None,
            anchor_tx_hash: None,
            anchor_block_number: None,
        }
    }

    /// Append a transaction hash to the batch. Insertion order is preserved
    /// and fully determines the eventual Merkle root (§5).
    pub fn push(&mut self, tx_hash: Hash) {
        self.leaves.push(tx_hash);
    }

    /// Number of transactions currently batched.
    pub fn len(&self) -> usize {
        self.leaves.len()
    }

    /// Whether the batch has no transactions.
    pub fn is_empty(&self) -> bool {
        self.leaves.is_empty()
    }

    /// The ordered leaves as batched so far.
    pub fn leaves(&self) -> &[Hash] {
        &self.leaves
    }

    /// Close the batch and compute its Merkle root (§4.E "Merkle anchoring").
    pub fn close(&mut self, now: chrono::DateTime<chrono::Utc>) -> Result<Hash, AnchorError> {
        if self.leaves.is_empty() {
            return Err(AnchorError::EmptyBatch);
        }
        let root = certen_types::merkle_root(&self.leaves)?;
        self.merkle_root = Some(root);
        self.transition(BatchState::Closed, now);
        Ok(root)
    }

    /// Record that the anchor transaction was submitted.
    pub fn mark_anchoring(&mut self, anchor_tx_hash: Hash, now: chrono::DateTime<chrono::Utc>) {
        self.anchor_tx_hash = Some(anchor_tx_hash);
        self.transition(BatchState::Anchoring, now);
    }

    /// Record that the anchor transaction reached sufficient confirmations.
    pub fn mark_anchored(&mut self, block_number: u64, now: chrono::DateTime<chrono::Utc>) {
        self.anchor_block_number = Some(block_number);
        self.transition(BatchState::Anchored, now);
    }

    /// Record that the batch is fully confirmed (terminal).
    pub fn mark_confirmed(&mut self, now: chrono::DateTime<chrono::Utc>) {
        self.transition(BatchState::Confirmed, now);
    }

    /// Record irrecoverable failure (terminal).
    pub fn mark_failed(&mut self, now: chrono::DateTime<chrono::Utc>) {
        self.transition(BatchState::Failed, now);
    }

    fn transition(&mut self, state: BatchState, now: chrono::DateTime<chrono::Utc>) {
        self.state = state;
        self.last_update = now;
    }

    /// Whether this batch has exceeded its class-specific age budget (§4.E
    /// "stalled" definition) given the current time.
    pub fn is_stalled(&self, now: chrono::DateTime<chrono::Utc>, policy: &BatchPolicy) -> bool {
        let age = (now - self.last_update).to_std().unwrap_or(Duration::ZERO);
        match (self.class, self.state) {
            (BatchClass::OnCadence, BatchState::Pending | BatchState::Closed) => {
                age > policy.cadence_interval + policy.cadence_grace
            }
            (BatchClass::OnDemand, BatchState::Pending) => age > policy.on_demand_pending_budget,
            (BatchClass::OnDemand, BatchState::Anchoring) => age > policy.on_demand_anchoring_budget,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(offset_secs: i64) -> chrono::DateTime<chrono::Utc> {
        chrono::DateTime::UNIX_EPOCH + chrono::Duration::seconds(offset_secs)
    }

    #[test]
    fn closing_computes_deterministic_root() {
        let mut batch = Batch::new(BatchId("b1".into()), BatchClass::OnCadence, Platform::Evm, t(0));
        batch.push(Hash::from_bytes(b"tx1"));
        batch.push(Hash::from_bytes(b"tx2"));
        let root = batch.close(t(1)).unwrap();
        assert_eq!(batch.state, BatchState::Closed);
        assert_eq!(batch.merkle_root, Some(root));
    }

    #[test]
    fn closing_empty_batch_errors() {
        let mut batch = Batch::new(BatchId("b1".into()), BatchClass::OnDemand, Platform::Solana, t(0));
        assert!(matches!(batch.close(t(1)), Err(AnchorError::EmptyBatch)));
    }

    #[test]
    fn on_cadence_stalls_after_interval_plus_grace() {
        let policy = BatchPolicy::default();
        let mut batch = Batch::new(BatchId("b1".into()), BatchClass::OnCadence, Platform::Evm, t(0));
        batch.push(Hash::from_bytes(b"tx"));
        assert!(!batch.is_stalled(t(60), &policy));
        let stalled_at = (policy.cadence_interval + policy.cadence_grace).as_secs() as i64 + 1;
        assert!(batch.is_stalled(t(stalled_at), &policy));
    }

    #[test]
    fn on_demand_pending_stalls_after_two_minutes() {
        let policy = BatchPolicy::default();
        let mut batch = Batch::new(BatchId("b1".into()), BatchClass::OnDemand, Platform::Near, t(0));
        batch.push(Hash::from_bytes(b"tx"));
        assert!(!batch.is_stalled(t(119), &policy));
        assert!(batch.is_stalled(t(121), &policy));
    }

    #[test]
    fn confirmed_batch_never_stalls() {
        let policy = BatchPolicy::default();
        let mut batch = Batch::new(BatchId("b1".into()), BatchClass::OnDemand, Platform::Ton, t(0));
        batch.push(Hash::from_bytes(b"tx"));
        batch.close(t(1)).unwrap();
        batch.mark_anchoring(Hash::from_bytes(b"anchor-tx"), t(2));
        batch.mark_anchored(100, t(3));
        batch.mark_confirmed(t(4));
        assert!(!batch.is_stalled(t(100_000), &policy));
    }
}
