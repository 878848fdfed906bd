//! Errors the governance prover can return (§4.D).

use certen_types::Hash;

/// Failure modes across the G0 → G1 → G2 pipeline.
#[derive(Debug, Clone, thiserror::Error)]
pub enum GovernanceError {
    /// The chain entry's hash did not equal the expected transaction hash,
    /// or its receipt did not stitch to the partition anchor.
    #[error("inclusion failure: {0}")]
    InclusionFailure(String),

    /// A key-page mutation could not be applied in order (a version was
    /// skipped, or a mutation claimed a version inconsistent with its
    /// predecessor).
    #[error("authority mutation gap: expected version {expected}, found {found}")]
    AuthorityMutationGap {
        /// Version the replay expected next.
        expected: u64,
        /// Version the mutation actually claimed.
        found: u64,
    },

    /// Fewer distinct valid signer key hashes than the authority's threshold.
    #[error("threshold not met: {valid} valid signers, {threshold} required")]
    ThresholdNotMet {
        /// Distinct valid signer count.
        valid: usize,
        /// Required threshold.
        threshold: u64,
    },

    /// A signature was committed after the transaction it claims to authorise.
    #[error("signature timing invalid: signature committed at block {signature_block}, exec_mbi is {exec_mbi}")]
    SignatureTimingInvalid {
        /// Block the signature was committed at.
        signature_block: u64,
        /// The transaction's execution major block index.
        exec_mbi: u64,
    },

    /// A signature's `transaction_hash` did not match the expected `tx_hash`.
    #[error("tx hash mismatch: signature claims {claimed}, expected {expected}")]
    TxHashMismatch {
        /// Hash the signature claims to authorise.
        claimed: Hash,
        /// The transaction hash actually being proven.
        expected: Hash,
    },

    /// A signature's cryptographic verification failed.
    #[error("crypto failure verifying signature from signer {signer}")]
    CryptoFailure {
        /// The signer account URL.
        signer: String,
    },

    /// G2's payload or effect predicate failed.
    #[error("payload mismatch: {0}")]
    PayloadMismatch(String),

    /// A remote-node call failed.
    #[error(transparent)]
    Rpc(#[from] certen_rpc::RpcError),
}
