//! Errors the validator block machine and unified verifier can return (§4.G).

use certen_types::{BundleId, Hash};

/// Failure modes for validator block construction, delivery, and commit.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ConsensusError {
    /// `cross_chain_proof.operation_id` did not match `operation_commitment`.
    #[error("cross-chain proof operation_id does not match operation commitment")]
    OperationIdMismatch,

    /// A result attestation's `operation_id` did not match `operation_commitment`.
    #[error("result attestation operation_id does not match operation commitment")]
    AttestationOperationIdMismatch,

    /// Recomputing the governance Merkle root from `authorization_leaves` did
    /// not match the stored `governance_proof.merkle_root`.
    #[error("governance merkle root mismatch")]
    GovernanceRootMismatch,

    /// The cross-chain legs did not share one `expiry`, or a leg carried an
    /// empty commitment.
    #[error("cross-chain legs must share one expiry and carry non-empty commitments")]
    CrossChainLegInvalid,

    /// A pre-execution block lacked validator signatures, or carried
    /// non-empty external results; or a post-execution block carried none.
    #[error("execution stage invariant violated: {0}")]
    StageInvariantViolated(&'static str),

    /// `bundle_id` did not match `H(governance_merkle_root, cross_chain_commitment)`.
    #[error("bundle_id mismatch")]
    BundleIdMismatch,

    /// A block was delivered at a height not greater than `latest_height`.
    #[error("non-monotonic height: latest is {latest}, delivered {delivered}")]
    NonMonotonicHeight {
        /// Current machine height.
        latest: u64,
        /// Height the block claimed.
        delivered: u64,
    },

    /// A bundle with this id was already cached (duplicate delivery).
    #[error("duplicate bundle {0}")]
    DuplicateBundle(BundleId),

    /// No cached block exists for the requested `bundle_id`.
    #[error("no validator block cached for bundle {0}")]
    BundleNotFound(BundleId),

    /// Building the governance Merkle tree failed.
    #[error(transparent)]
    Merkle(#[from] certen_types::MerkleError),
}

/// Formats a hash mismatch for the unified verifier's free-form error list.
pub fn mismatch(what: &str, expected: Hash, found: Hash) -> String {
    format!("{what}: expected {expected}, found {found}")
}
