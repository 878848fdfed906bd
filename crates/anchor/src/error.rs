//! Errors the anchor/batch engine can return (§4.E).

use certen_types::Platform;

/// Failure modes for batching, anchoring, and observing finality.
#[derive(Debug, Clone, thiserror::Error)]
pub enum AnchorError {
    /// A batch was closed with zero transactions.
    #[error("cannot close an empty batch")]
    EmptyBatch,

    /// A platform strategy was registered twice.
    #[error("strategy already registered for platform {0}")]
    DuplicateStrategy(Platform),

    /// No strategy is registered for the requested platform.
    #[error("no strategy registered for platform {0}")]
    UnknownStrategy(Platform),

    /// Submitting the anchor transaction to the target chain failed.
    #[error("anchor submission to {platform} failed: {reason}")]
    SubmissionFailed {
        /// Target platform.
        platform: Platform,
        /// Reason reported by the strategy.
        reason: String,
    },

    /// Observation exceeded its deadline before reaching required confirmations.
    #[error("timeout waiting for confirmations on {platform} after {elapsed_secs}s")]
    ObservationTimeout {
        /// Target platform.
        platform: Platform,
        /// Elapsed seconds before giving up.
        elapsed_secs: u64,
    },

    /// The target chain's receipt for the anchor transaction could not be found.
    #[error("receipt not found for anchor tx {tx_hash} on {platform}")]
    ReceiptNotFound {
        /// Target platform.
        platform: Platform,
        /// Hash of the submitted anchor transaction.
        tx_hash: certen_types::Hash,
    },

    /// Building the Merkle tree over batched leaves failed.
    #[error(transparent)]
    Merkle(#[from] certen_types::MerkleError),
}
