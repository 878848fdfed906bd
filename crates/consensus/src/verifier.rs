//! Unified verifier: a read-only pass that reconstructs every cryptographic
//! check in the proof cycle independently, from first principles (§4.G).

use crate::block::ValidatorBlock;
use certen_anchor::{KeccakMerkleProof, KeccakPosition};
use certen_state_prover::StateInclusionBundle;
use certen_types::{Ed25519PublicKey, Ed25519Signature, Hash, KeccakHash};
use std::time::{Duration, Instant};

/// One governance signer's raw record, re-verified from scratch (§4.G step 2).
#[derive(Debug, Clone)]
pub struct RawSignatureRecord {
    /// The signer's public key.
    pub pubkey: Ed25519PublicKey,
    /// The claimed `H(pubkey)` the signer record carries.
    pub pubkey_hash: Hash,
    /// The 32-byte digest that was signed.
    pub signed_hash: Hash,
    /// The signature over `signed_hash`.
    pub signature: Ed25519Signature,
    /// This signer's voting weight.
    pub weight: u64,
}

/// The anchor-binding record re-verified at step 3.
#[derive(Debug, Clone)]
pub struct AnchorBindingRecord {
    /// Batch Merkle root.
    pub merkle_root: Hash,
    /// Anchor transaction hash.
    pub anchor_tx_hash: Hash,
    /// Target-chain block number the anchor landed in.
    pub block_num: u64,
    /// The claimed binding hash.
    pub binding_hash: Hash,
    /// Coordinator's public key.
    pub coordinator_pubkey: Ed25519PublicKey,
    /// Coordinator's signature over `binding_hash`.
    pub coordinator_signature: Ed25519Signature,
}

impl AnchorBindingRecord {
    /// `SHA256(merkle_root ‖ anchor_tx_hash ‖ block_num_be64)` (§4.G step 3).
    pub fn expected_binding_hash(&self) -> Hash {
        Hash::from_parts(&[
            self.merkle_root.as_bytes(),
            self.anchor_tx_hash.as_bytes(),
            &self.block_num.to_be_bytes(),
        ])
    }
}

/// The execution proof record re-verified at step 4.
#[derive(Debug, Clone)]
pub struct ExecutionProofRecord {
    /// The full result tuple that was hashed to produce `result_hash`.
    pub result_tuple_bytes: Vec<u8>,
    /// The claimed result hash.
    pub result_hash: Hash,
    /// Keccak-256 leaf for this execution's entry in the block's transactions tree.
    pub leaf: KeccakHash,
    /// Inclusion proof of `leaf` within the block's transactions tree.
    pub inclusion_proof: KeccakMerkleProof,
    /// The block's transactions-tree root the proof is checked against.
    pub block_root: KeccakHash,
}

impl ExecutionProofRecord {
    fn expected_result_hash(&self) -> Hash {
        Hash::from_bytes(&self.result_tuple_bytes)
    }
}

/// Cross-level binding checks at step 5.
#[derive(Debug, Clone)]
pub struct CrossLevelBindings {
    /// `L3.authority_proof.key_page_hash`.
    pub l3_key_page_hash: Hash,
    /// `L2.key_page_hash`.
    pub l2_key_page_hash: Hash,
    /// `L4.result.anchor_proof_hash`.
    pub l4_anchor_proof_hash: Hash,
    /// `L3.proof_hash`.
    pub l3_proof_hash: Hash,
    /// Optional `(L4.attestation.snapshot_id, validator_snapshot.snapshot_id)` pair.
    pub snapshot_ids: Option<(Hash, Hash)>,
}

/// Everything the unified verifier needs to re-derive from scratch (§4.G).
pub struct VerificationInput<'a> {
    /// §4.G step 1: the L1-L4 state-inclusion bundle.
    pub state_bundle: &'a StateInclusionBundle,
    /// The bundle's stored `proof_hash`, as recorded at proving time.
    pub stored_proof_hash: Hash,
    /// §4.G step 2: every governance signer's raw record.
    pub governance_signatures: &'a [RawSignatureRecord],
    /// §4.G step 2: the signature threshold that must be met.
    pub governance_threshold: u64,
    /// §4.G step 3.
    pub anchor_binding: &'a AnchorBindingRecord,
    /// §4.G step 4.
    pub execution_proof: &'a ExecutionProofRecord,
    /// §4.G step 5.
    pub cross_level: &'a CrossLevelBindings,
    /// §4.G step 6: the block whose `bundle_id` is re-derived and compared.
    pub block: &'a ValidatorBlock,
}

/// The unified verifier's structured output (§4.G: "per-level validity
/// booleans, an error list, a warning list, and the elapsed duration").
#[derive(Debug, Clone)]
pub struct VerificationResult {
    /// Step 1: L1-L4 receipt folding and `proof_hash`.
    pub state_inclusion_valid: bool,
    /// Step 2: governance signatures and threshold.
    pub governance_valid: bool,
    /// Step 3: anchor-binding hash and signature.
    pub anchor_binding_valid: bool,
    /// Step 4: execution result hash and Merkle inclusion.
    pub execution_proof_valid: bool,
    /// Step 5: cross-level bindings.
    pub cross_level_valid: bool,
    /// Step 6: bundle integrity.
    pub bundle_valid: bool,
    /// Accumulated failure descriptions.
    pub errors: Vec<String>,
    /// Non-fatal observations (e.g. missing optional snapshot binding).
    pub warnings: Vec<String>,
    /// Wall-clock time the verification pass took.
    pub elapsed: Duration,
}

impl VerificationResult {
    /// Whether every level passed.
    pub fn all_valid(&self) -> bool {
        self.state_inclusion_valid
            && self.governance_valid
            && self.anchor_binding_valid
            && self.execution_proof_valid
            && self.cross_level_valid
            && self.bundle_valid
    }
}

/// A stateless, read-only re-verification pass over an assembled proof cycle (§4.G).
pub struct UnifiedVerifier;

impl UnifiedVerifier {
    /// Re-derive every cryptographic check in `input` from scratch.
    #[tracing::instrument(skip(input))]
    pub fn verify(input: &VerificationInput<'_>) -> VerificationResult {
        let started = Instant::now();
        let mut errors = Vec::new();
        let mut warnings = Vec::new();

        let state_inclusion_valid = Self::verify_state_inclusion(input, &mut errors);
        let governance_valid = Self::verify_governance(input, &mut errors);
        let anchor_binding_valid = Self::verify_anchor_binding(input, &mut errors);
        let execution_proof_valid = Self::verify_execution_proof(input, &mut errors);
        let cross_level_valid = Self::verify_cross_level(input, &mut errors, &mut warnings);
        let bundle_valid = Self::verify_bundle_integrity(input, &mut errors);

        VerificationResult {
            state_inclusion_valid,
            governance_valid,
            anchor_binding_valid,
            execution_proof_valid,
            cross_level_valid,
            bundle_valid,
            errors,
            warnings,
            elapsed: started.elapsed(),
        }
    }

    fn verify_state_inclusion(input: &VerificationInput<'_>, errors: &mut Vec<String>) -> bool {
        if let Err(e) = input.state_bundle.verify() {
            errors.push(format!("state inclusion: {e}"));
            return false;
        }
        if input.state_bundle.proof_hash() != input.stored_proof_hash {
            errors.push("state inclusion: recomputed proof_hash does not match stored proof_hash".to_string());
            return false;
        }
        true
    }

    fn verify_governance(input: &VerificationInput<'_>, errors: &mut Vec<String>) -> bool {
        let mut sum_weight = 0u64;
        let mut ok = true;
        for record in input.governance_signatures {
            if record.pubkey.hash() != record.pubkey_hash {
                errors.push("governance: H(pubkey) does not match claimed pubkey_hash".to_string());
                ok = false;
                continue;
            }
            if !record.pubkey.verify(record.signed_hash.as_bytes(), &record.signature) {
                errors.push("governance: ed25519 signature failed to verify".to_string());
                ok = false;
                continue;
            }
            sum_weight += record.weight;
        }
        if sum_weight < input.governance_threshold {
            errors.push(format!(
                "governance: sum of weights {sum_weight} below threshold {}",
                input.governance_threshold
            ));
            ok = false;
        }
        ok
    }

    fn verify_anchor_binding(input: &VerificationInput<'_>, errors: &mut Vec<String>) -> bool {
        let record = input.anchor_binding;
        if record.expected_binding_hash() != record.binding_hash {
            errors.push("anchor binding: recomputed binding_hash mismatch".to_string());
            return false;
        }
        if !record.coordinator_pubkey.verify(record.binding_hash.as_bytes(), &record.coordinator_signature) {
            errors.push("anchor binding: coordinator signature failed to verify".to_string());
            return false;
        }
        true
    }

    fn verify_execution_proof(input: &VerificationInput<'_>, errors: &mut Vec<String>) -> bool {
        let record = input.execution_proof;
        if record.expected_result_hash() != record.result_hash {
            errors.push("execution proof: recomputed result_hash mismatch".to_string());
            return false;
        }
        if !record.inclusion_proof.verify(&record.leaf, &record.block_root) {
            errors.push("execution proof: keccak inclusion proof failed against block root".to_string());
            return false;
        }
        true
    }

    fn verify_cross_level(
        input: &VerificationInput<'_>,
        errors: &mut Vec<String>,
        warnings: &mut Vec<String>,
    ) -> bool {
        let cl = input.cross_level;
        let mut ok = true;
        if cl.l3_key_page_hash != cl.l2_key_page_hash {
            errors.push("cross-level: L3 key_page_hash does not match L2 key_page_hash".to_string());
            ok = false;
        }
        if cl.l4_anchor_proof_hash != cl.l3_proof_hash {
            errors.push("cross-level: L4 anchor_proof_hash does not match L3 proof_hash".to_string());
            ok = false;
        }
        match cl.snapshot_ids {
            Some((attestation_snapshot_id, validator_snapshot_id)) => {
                if attestation_snapshot_id != validator_snapshot_id {
                    errors.push("cross-level: attestation snapshot_id does not match validator snapshot_id".to_string());
                    ok = false;
                }
            }
            None => warnings.push("cross-level: no snapshot binding present to check (optional)".to_string()),
        }
        ok
    }

    fn verify_bundle_integrity(input: &VerificationInput<'_>, errors: &mut Vec<String>) -> bool {
        let expected = crate::block::compute_bundle_id(
            input.block.governance_proof.merkle_root,
            input.block.cross_chain_proof.commitment(),
        );
        if expected != input.block.bundle_id {
            errors.push("bundle integrity: recomputed bundle hash does not equal bundle_id".to_string());
            return false;
        }
        true
    }
}
