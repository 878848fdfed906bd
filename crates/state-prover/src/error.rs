//! Errors the four-layer state prover can return (§4.C).

use certen_types::Hash;

/// Failure modes for building or checking an [`crate::AnchoringProof`].
#[derive(Debug, Clone, thiserror::Error)]
pub enum StateProverError {
    /// A receipt's folded chain did not reach its claimed anchor.
    #[error("receipt mismatch at {stage}: folded hash does not equal claimed anchor")]
    ReceiptMismatch {
        /// Which stage produced the bad receipt (`L1`, `L2`, ...).
        stage: &'static str,
    },

    /// Two adjacent receipts did not stitch byte-exactly.
    #[error("stitch failure: expected {expected} but found {found}")]
    StitchFailure {
        /// The anchor the previous layer produced.
        expected: Hash,
        /// The start the next layer actually carried.
        found: Hash,
    },

    /// The recomputed validator-set hash did not match the header's claim.
    #[error("validator set mismatch: header claims {expected}, computed {computed}")]
    ValidatorSetMismatch {
        /// Hash the header claims.
        expected: Hash,
        /// Hash recomputed from the fetched validator set.
        computed: Hash,
    },

    /// Verified voting power fell short of the `⌊total·2/3⌋ + 1` threshold.
    #[error("insufficient voting power: {signed}/{total} signed, {required} required")]
    InsufficientVotingPower {
        /// Verified signed voting power.
        signed: u64,
        /// Total voting power in the set.
        total: u64,
        /// Minimum required signed power.
        required: u64,
    },

    /// The committed `app_hash` did not bind to the expected anchor.
    #[error("root binding failure: expected {expected}, header carries {found}")]
    RootBindingFailure {
        /// Anchor the prover expected to see bound.
        expected: Hash,
        /// `app_hash` actually found in the header.
        found: Hash,
    },

    /// The consensus height did not satisfy `H = local_block + 1`.
    #[error("height mismatch: expected {expected}, remote commit reports {found}")]
    HeightMismatch {
        /// Height computed from `local_block + 1`.
        expected: u64,
        /// Height the remote commit actually carries.
        found: u64,
    },

    /// The DN anchor search exhausted its bounded walk-back without a stitch.
    #[error("dn anchor search exhausted after {attempts} attempts")]
    AnchorNotFound {
        /// Number of blocks walked back before giving up.
        attempts: u32,
    },

    /// A remote-node call failed.
    #[error(transparent)]
    Rpc(#[from] certen_rpc::RpcError),
}
