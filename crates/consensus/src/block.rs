//! The canonical validator block and its §3 invariants (§4.G).

use crate::error::ConsensusError;
use certen_anchor::BatchClass;
use certen_types::{merkle_root, BlsPublicKey, BlsSignature, BundleId, ChainName, Hash, ValidatorId};
use std::collections::BTreeMap;

/// Which execution phase a block represents (§3: "pre-execution"/"post-execution").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionStage {
    /// Proposal/validator-signature phase: no external results yet.
    PreExecution,
    /// Settlement phase: carries at least one external result.
    PostExecution,
}

/// The governance proof embedded in a block: a Merkle root over
/// authorisation leaves plus a BLS aggregate signature over it (§3).
#[derive(Debug, Clone)]
pub struct EmbeddedGovernanceProof {
    /// Leaves the Merkle root is built from (authorised signer key hashes).
    pub authorization_leaves: Vec<Hash>,
    /// Merkle root over `authorization_leaves`.
    pub merkle_root: Hash,
    /// BLS aggregate signature over `merkle_root`.
    pub aggregate_signature: BlsSignature,
    /// BLS aggregate public key corresponding to `aggregate_signature`.
    pub aggregate_pubkey: BlsPublicKey,
}

impl EmbeddedGovernanceProof {
    /// Build a proof, computing the Merkle root from the given leaves.
    pub fn new(
        authorization_leaves: Vec<Hash>,
        aggregate_signature: BlsSignature,
        aggregate_pubkey: BlsPublicKey,
    ) -> Result<Self, ConsensusError> {
        let root = merkle_root(&authorization_leaves)?;
        Ok(Self {
            authorization_leaves,
            merkle_root: root,
            aggregate_signature,
            aggregate_pubkey,
        })
    }
}

/// One target chain's commitment leg within the cross-chain proof (§3).
#[derive(Debug, Clone)]
pub struct ChainLeg {
    /// The leg's commitment hash.
    pub commitment: Hash,
}

/// The cross-chain proof: per-leg commitments keyed by chain id, all sharing
/// one expiry (§3).
#[derive(Debug, Clone)]
pub struct CrossChainProof {
    /// The operation this proof commits to; must equal the block's
    /// `operation_commitment`.
    pub operation_id: Hash,
    /// Per-chain commitment legs.
    pub legs: BTreeMap<ChainName, ChainLeg>,
    /// Shared expiry across every leg.
    pub expiry: chrono::DateTime<chrono::Utc>,
}

impl CrossChainProof {
    /// `H(sorted (chain_id, commitment) pairs)` (§3 `cross_chain_commitment`
    /// — the spec names the field but not its fold; folding over the
    /// `BTreeMap`'s already-sorted chain-id order keeps it deterministic
    /// across validators without a separate sort step).
    pub fn commitment(&self) -> Hash {
        let mut parts: Vec<&[u8]> = Vec::with_capacity(self.legs.len() * 2);
        let chain_bytes: Vec<Vec<u8>> = self.legs.keys().map(|c| c.0.as_bytes().to_vec()).collect();
        for (chain_bytes, leg) in chain_bytes.iter().zip(self.legs.values()) {
            parts.push(chain_bytes.as_slice());
            parts.push(leg.commitment.as_bytes());
        }
        Hash::from_parts(&parts)
    }
}

/// A result attestation embedded in a post-execution block (§3).
#[derive(Debug, Clone)]
pub struct ResultAttestation {
    /// Must equal the block's `operation_commitment`.
    pub operation_id: Hash,
    /// The attesting validator.
    pub validator_id: ValidatorId,
    /// Hash of the external result being attested.
    pub result_hash: Hash,
}

/// `bundle_id = H(governance_merkle_root, cross_chain_commitment)` (§3).
pub fn compute_bundle_id(governance_merkle_root: Hash, cross_chain_commitment: Hash) -> BundleId {
    BundleId(Hash::from_parts(&[
        governance_merkle_root.as_bytes(),
        cross_chain_commitment.as_bytes(),
    ]))
}

/// The canonical, deterministically-serialisable unit of BFT commitment (§3, §4.G).
#[derive(Debug, Clone)]
pub struct ValidatorBlock {
    /// Height, overridden by the replicated state machine on commit.
    pub block_height: u64,
    /// RFC 3339 UTC block time, overridden on commit.
    pub timestamp: chrono::DateTime<chrono::Utc>,
    /// Proposing validator, overridden on commit.
    pub validator_id: ValidatorId,
    /// `H(governance_merkle_root, cross_chain_commitment)`.
    pub bundle_id: BundleId,
    /// The operation this block commits.
    pub operation_commitment: Hash,
    /// Governance proof (Merkle root of authorisation leaves + BLS aggregate).
    pub governance_proof: EmbeddedGovernanceProof,
    /// Cross-chain proof (per-leg commitments).
    pub cross_chain_proof: CrossChainProof,
    /// Which execution phase this block represents.
    pub execution_stage: ExecutionStage,
    /// Synthetic transactions produced by this block.
    pub synthetic_transactions: Vec<Hash>,
    /// Result attestations (non-empty only for post-execution blocks).
    pub result_attestations: Vec<ResultAttestation>,
    /// Optional embedded lite-client proof (the L1-L4 bundle).
    pub lite_client_proof: Option<certen_state_prover::AnchoringProof>,
    /// Batching/pricing class, when present.
    pub proof_class: Option<BatchClass>,
}

impl ValidatorBlock {
    /// Construct a block and check every §3 invariant, returning the first
    /// violation if any.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        block_height: u64,
        timestamp: chrono::DateTime<chrono::Utc>,
        validator_id: ValidatorId,
        operation_commitment: Hash,
        governance_proof: EmbeddedGovernanceProof,
        cross_chain_proof: CrossChainProof,
        execution_stage: ExecutionStage,
        synthetic_transactions: Vec<Hash>,
        result_attestations: Vec<ResultAttestation>,
        lite_client_proof: Option<certen_state_prover::AnchoringProof>,
        proof_class: Option<BatchClass>,
    ) -> Result<Self, ConsensusError> {
        let cross_chain_commitment = cross_chain_proof.commitment();
        let bundle_id = compute_bundle_id(governance_proof.merkle_root, cross_chain_commitment);

        let block = Self {
            block_height,
            timestamp,
            validator_id,
            bundle_id,
            operation_commitment,
            governance_proof,
            cross_chain_proof,
            execution_stage,
            synthetic_transactions,
            result_attestations,
            lite_client_proof,
            proof_class,
        };
        block.check_invariants()?;
        Ok(block)
    }

    fn check_invariants(&self) -> Result<(), ConsensusError> {
        if self.cross_chain_proof.operation_id != self.operation_commitment {
            return Err(ConsensusError::OperationIdMismatch);
        }
        for attestation in &self.result_attestations {
            if attestation.operation_id != self.operation_commitment {
                return Err(ConsensusError::AttestationOperationIdMismatch);
            }
        }
        let recomputed = merkle_root(&self.governance_proof.authorization_leaves)?;
        if recomputed != self.governance_proof.merkle_root {
            return Err(ConsensusError::GovernanceRootMismatch);
        }
        if self.cross_chain_proof.legs.values().any(|leg| leg.commitment == Hash::ZERO) {
            return Err(ConsensusError::CrossChainLegInvalid);
        }
        match self.execution_stage {
            ExecutionStage::PreExecution => {
                if !self.result_attestations.is_empty() {
                    return Err(ConsensusError::StageInvariantViolated(
                        "pre-execution block must carry no external results",
                    ));
                }
            }
            ExecutionStage::PostExecution => {
                if self.result_attestations.is_empty() {
                    return Err(ConsensusError::StageInvariantViolated(
                        "post-execution block must carry at least one external result",
                    ));
                }
            }
        }
        let expected_bundle_id =
            compute_bundle_id(self.governance_proof.merkle_root, self.cross_chain_proof.commitment());
        if expected_bundle_id != self.bundle_id {
            return Err(ConsensusError::BundleIdMismatch);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use certen_types::{BlsKeyPair, DomainTag};

    fn sample_governance() -> EmbeddedGovernanceProof {
        let leaves = vec![Hash::from_bytes(b"signer1"), Hash::from_bytes(b"signer2")];
        let root = merkle_root(&leaves).unwrap();
        let kp = BlsKeyPair::from_seed(&[9u8; 32]);
        let sig = kp.sign_with_domain(root.as_bytes(), DomainTag::ValidatorUpdate);
        EmbeddedGovernanceProof::new(leaves, sig, kp.public_key()).unwrap()
    }

    fn sample_cross_chain(operation_id: Hash) -> CrossChainProof {
        let mut legs = BTreeMap::new();
        legs.insert(ChainName("evm-1".into()), ChainLeg { commitment: Hash::from_bytes(b"leg1") });
        legs.insert(ChainName("solana-1".into()), ChainLeg { commitment: Hash::from_bytes(b"leg2") });
        CrossChainProof { operation_id, legs, expiry: chrono::Utc::now() }
    }

    #[test]
    fn well_formed_pre_execution_block_passes_invariants() {
        let operation_id = Hash::from_bytes(b"op");
        let block = ValidatorBlock::new(
            1,
            chrono::Utc::now(),
            ValidatorId("v1".into()),
            operation_id,
            sample_governance(),
            sample_cross_chain(operation_id),
            ExecutionStage::PreExecution,
            vec![],
            vec![],
            None,
            None,
        )
        .unwrap();
        assert_eq!(block.bundle_id, compute_bundle_id(block.governance_proof.merkle_root, block.cross_chain_proof.commitment()));
    }

    #[test]
    fn pre_execution_with_results_is_rejected() {
        let operation_id = Hash::from_bytes(b"op");
        let err = ValidatorBlock::new(
            1,
            chrono::Utc::now(),
            ValidatorId("v1".into()),
            operation_id,
            sample_governance(),
            sample_cross_chain(operation_id),
            ExecutionStage::PreExecution,
            vec![],
            vec![ResultAttestation { operation_id, validator_id: ValidatorId("v1".into()), result_hash: Hash::ZERO }],
            None,
            None,
        )
        .unwrap_err();
        assert!(matches!(err, ConsensusError::StageInvariantViolated(_)));
    }

    #[test]
    fn mismatched_operation_id_is_rejected() {
        let operation_id = Hash::from_bytes(b"op");
        let other_id = Hash::from_bytes(b"other");
        let err = ValidatorBlock::new(
            1,
            chrono::Utc::now(),
            ValidatorId("v1".into()),
            operation_id,
            sample_governance(),
            sample_cross_chain(other_id),
            ExecutionStage::PreExecution,
            vec![],
            vec![],
            None,
            None,
        )
        .unwrap_err();
        assert!(matches!(err, ConsensusError::OperationIdMismatch));
    }

    #[test]
    fn post_execution_without_results_is_rejected() {
        let operation_id = Hash::from_bytes(b"op");
        let err = ValidatorBlock::new(
            1,
            chrono::Utc::now(),
            ValidatorId("v1".into()),
            operation_id,
            sample_governance(),
            sample_cross_chain(operation_id),
            ExecutionStage::PostExecution,
            vec![],
            vec![],
            None,
            None,
        )
        .unwrap_err();
        assert!(matches!(err, ConsensusError::StageInvariantViolated(_)));
    }
}
