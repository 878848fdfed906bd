//! Errors the attestation coordinator can return (§4.F).

use certen_types::{BatchId, ValidatorId};

/// Failure modes for attestation collection and bundle assembly.
#[derive(Debug, Clone, thiserror::Error)]
pub enum AttestationError {
    /// A validator submitted a second attestation for a batch it already attested.
    #[error("validator {validator} already attested batch {batch_id}")]
    DuplicateValidator {
        /// The offending batch.
        batch_id: BatchId,
        /// The offending validator.
        validator: ValidatorId,
    },

    /// Two attestations for the same batch carried the same public key under
    /// different validator identities.
    #[error("public key already used to attest batch {0}")]
    DuplicatePublicKey(BatchId),

    /// A submitted attestation's signature did not verify.
    #[error("signature verification failed for validator {0}")]
    InvalidSignature(ValidatorId),

    /// The bundle's scheme did not match the attestation's signature encoding.
    #[error("attestation scheme mismatch: expected {expected:?}, got {actual:?}")]
    SchemeMismatch {
        /// Scheme the bundle was constructed with.
        expected: crate::attestation::AttestationSchemeTag,
        /// Scheme the attestation actually used.
        actual: crate::attestation::AttestationSchemeTag,
    },

    /// BLS aggregation over the collected signatures failed.
    #[error(transparent)]
    Signature(#[from] certen_types::SignatureError),

    /// A peer failed to respond before the fan-out deadline.
    #[error("peer {0} timed out")]
    PeerTimeout(ValidatorId),

    /// A peer's RPC call failed.
    #[error("peer {validator} request failed: {reason}")]
    PeerRequestFailed {
        /// The peer that failed.
        validator: ValidatorId,
        /// Underlying failure reason.
        reason: String,
    },

    /// Quorum was not reached before the coordinator's own deadline elapsed.
    #[error("quorum not met for batch {batch_id}: have {collected}, need {required}")]
    QuorumNotMet {
        /// The batch being attested.
        batch_id: BatchId,
        /// Attestations collected so far.
        collected: usize,
        /// Attestations required for quorum.
        required: usize,
    },
}
