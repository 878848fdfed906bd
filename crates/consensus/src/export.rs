//! Portable proof export format (§6): hex-encoded JSON with RFC 3339
//! timestamps, for consumers that cannot link against this workspace
//! directly (contract-side verifiers, audit tooling, cross-language SDKs).

use certen_attestation::{Attestation, AttestationPubKey, AttestationSignature};
use certen_state_prover::StateInclusionBundle;
use certen_types::{BundleId, Hash};

/// The export format's version tag (§6).
pub const EXPORT_VERSION: &str = "certen_anchor_proof";

/// The L1-L4 state-inclusion component, with its validity derived at export
/// time rather than left for the consumer to recompute.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct StateInclusionExport {
    /// Hex-encoded account hash.
    pub account_hash: String,
    /// Hex-encoded BPT root.
    pub bpt_root: String,
    /// Hex-encoded partition anchor root.
    pub partition_root: String,
    /// Hex-encoded network (DN) anchor root.
    pub network_root: String,
    /// Block index the bundle was assembled for.
    pub block: u64,
    /// Hex-encoded `proof_hash` (§3).
    pub proof_hash: String,
    /// Whether re-folding every receipt and the stitch points succeeded.
    pub valid: bool,
}

impl StateInclusionExport {
    fn from_bundle(bundle: &StateInclusionBundle) -> Self {
        Self {
            account_hash: bundle.account_hash.to_hex(),
            bpt_root: bundle.bpt_root.to_hex(),
            partition_root: bundle.partition_root.to_hex(),
            network_root: bundle.network_root.to_hex(),
            block: bundle.block,
            proof_hash: bundle.proof_hash().to_hex(),
            valid: bundle.verify().is_ok(),
        }
    }
}

/// The governance (G0-G2) component.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct GovernanceExport {
    /// Hex-encoded Merkle root over authorisation leaves.
    pub merkle_root: String,
    /// The threshold that had to be met.
    pub threshold: u64,
    /// Count of distinct valid signer key hashes.
    pub valid_signer_count: u64,
    /// Whether `valid_signer_count >= threshold` (§4.D step 4, §8 property 7).
    pub threshold_met: bool,
}

/// The anchor-binding component re-derived by the unified verifier (§4.G step 3).
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct AnchorExport {
    /// Hex-encoded batch Merkle root.
    pub merkle_root: String,
    /// Hex-encoded anchor transaction hash.
    pub anchor_tx_hash: String,
    /// Target-chain block number the anchor landed in.
    pub block_num: u64,
    /// Hex-encoded `binding_hash` (§8 property 6).
    pub binding_hash: String,
    /// Whether the binding hash and coordinator signature both verify.
    pub valid: bool,
}

/// The execution-proof component (§4.G step 4).
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ExecutionExport {
    /// Hex-encoded result hash.
    pub result_hash: String,
    /// Whether the result hash and its Merkle inclusion proof both verify.
    pub valid: bool,
}

/// One attestation in the portable export's attestation list.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct AttestationExport {
    /// The attesting validator's id.
    pub validator_id: String,
    /// Hex-encoded public key, whichever scheme the attestation used.
    pub pubkey: String,
    /// Hex-encoded signature, whichever scheme the attestation used.
    pub signature: String,
    /// `"bls"` or `"ed25519"`.
    pub scheme: String,
}

impl From<&Attestation> for AttestationExport {
    fn from(a: &Attestation) -> Self {
        let (pubkey, scheme_pk) = match &a.pubkey {
            AttestationPubKey::Bls(k) => (hex::encode(k.as_bytes()), "bls"),
            AttestationPubKey::Ed25519(k) => (hex::encode(k.as_bytes()), "ed25519"),
        };
        let signature = match &a.signature {
            AttestationSignature::Bls(s) => hex::encode(s.as_bytes()),
            AttestationSignature::Ed25519(s) => hex::encode(s.as_bytes()),
        };
        Self {
            validator_id: a.validator_id.0.clone(),
            pubkey,
            signature,
            scheme: scheme_pk.to_string(),
        }
    }
}

/// The full portable proof export (§6): every derived validity boolean
/// included so a consumer doesn't have to re-run the unified verifier just
/// to render a status page.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ProofExportV1 {
    /// Format tag, always [`EXPORT_VERSION`].
    pub version: String,
    /// Hex-encoded `bundle_id` (§3).
    pub bundle_id: String,
    /// RFC 3339 export timestamp.
    pub generated_at: chrono::DateTime<chrono::Utc>,
    /// L1-L4 state inclusion.
    pub state_inclusion: StateInclusionExport,
    /// G0-G2 governance proof.
    pub governance: GovernanceExport,
    /// Anchor/batch binding.
    pub anchor: AnchorExport,
    /// Execution-result proof.
    pub execution: ExecutionExport,
    /// Collected attestations over the anchor Merkle root.
    pub attestations: Vec<AttestationExport>,
}

/// Inputs the exporter needs beyond what a [`StateInclusionBundle`] and a
/// [`BundleId`] already carry; these are derived elsewhere in the proof
/// cycle (the governance prover, the anchor engine, the unified verifier)
/// and handed to the exporter rather than recomputed here.
pub struct ExportInputs<'a> {
    /// The state-inclusion bundle to export.
    pub state_bundle: &'a StateInclusionBundle,
    /// The block's `bundle_id`.
    pub bundle_id: BundleId,
    /// Governance Merkle root.
    pub governance_merkle_root: Hash,
    /// Governance threshold.
    pub governance_threshold: u64,
    /// Count of distinct valid signer key hashes.
    pub governance_valid_signer_count: u64,
    /// Anchor batch Merkle root.
    pub anchor_merkle_root: Hash,
    /// Anchor transaction hash.
    pub anchor_tx_hash: Hash,
    /// Target-chain block number.
    pub anchor_block_num: u64,
    /// Anchor binding hash.
    pub anchor_binding_hash: Hash,
    /// Whether the anchor-binding hash and coordinator signature verified.
    pub anchor_valid: bool,
    /// Execution result hash.
    pub execution_result_hash: Hash,
    /// Whether the execution result hash and Merkle inclusion verified.
    pub execution_valid: bool,
    /// Attestations collected over the anchor Merkle root.
    pub attestations: &'a [Attestation],
}

impl ProofExportV1 {
    /// Assemble the portable export from already-derived validity booleans
    /// and the underlying proof components.
    pub fn build(inputs: &ExportInputs<'_>) -> Self {
        let threshold_met = inputs.governance_valid_signer_count >= inputs.governance_threshold;
        Self {
            version: EXPORT_VERSION.to_string(),
            bundle_id: inputs.bundle_id.0.to_hex(),
            generated_at: chrono::Utc::now(),
            state_inclusion: StateInclusionExport::from_bundle(inputs.state_bundle),
            governance: GovernanceExport {
                merkle_root: inputs.governance_merkle_root.to_hex(),
                threshold: inputs.governance_threshold,
                valid_signer_count: inputs.governance_valid_signer_count,
                threshold_met,
            },
            anchor: AnchorExport {
                merkle_root: inputs.anchor_merkle_root.to_hex(),
                anchor_tx_hash: inputs.anchor_tx_hash.to_hex(),
                block_num: inputs.anchor_block_num,
                binding_hash: inputs.anchor_binding_hash.to_hex(),
                valid: inputs.anchor_valid,
            },
            execution: ExecutionExport {
                result_hash: inputs.execution_result_hash.to_hex(),
                valid: inputs.execution_valid,
            },
            attestations: inputs.attestations.iter().map(AttestationExport::from).collect(),
        }
    }

    /// Serialize to the portable JSON wire form.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Parse from the portable JSON wire form.
    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }

    /// Drop every derived validity boolean and the generation timestamp,
    /// keeping only the raw hex fields a bandwidth-sensitive consumer needs
    /// to re-run its own verification (§6 "omits derived fields").
    pub fn to_compact(&self) -> CompactProof {
        CompactProof {
            version: self.version.clone(),
            bundle_id: self.bundle_id.clone(),
            account_hash: self.state_inclusion.account_hash.clone(),
            bpt_root: self.state_inclusion.bpt_root.clone(),
            partition_root: self.state_inclusion.partition_root.clone(),
            network_root: self.state_inclusion.network_root.clone(),
            block: self.state_inclusion.block,
            governance_merkle_root: self.governance.merkle_root.clone(),
            anchor_merkle_root: self.anchor.merkle_root.clone(),
            anchor_tx_hash: self.anchor.anchor_tx_hash.clone(),
            anchor_block_num: self.anchor.block_num,
            execution_result_hash: self.execution.result_hash.clone(),
            attestations: self.attestations.clone(),
        }
    }
}

/// Bandwidth-sensitive variant of [`ProofExportV1`]: raw hex fields only, no
/// derived validity booleans and no generation timestamp (§6).
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct CompactProof {
    /// Format tag, always [`EXPORT_VERSION`].
    pub version: String,
    /// Hex-encoded `bundle_id`.
    pub bundle_id: String,
    /// Hex-encoded account hash.
    pub account_hash: String,
    /// Hex-encoded BPT root.
    pub bpt_root: String,
    /// Hex-encoded partition anchor root.
    pub partition_root: String,
    /// Hex-encoded network anchor root.
    pub network_root: String,
    /// Block index the bundle was assembled for.
    pub block: u64,
    /// Hex-encoded governance Merkle root.
    pub governance_merkle_root: String,
    /// Hex-encoded anchor batch Merkle root.
    pub anchor_merkle_root: String,
    /// Hex-encoded anchor transaction hash.
    pub anchor_tx_hash: String,
    /// Target-chain block number.
    pub anchor_block_num: u64,
    /// Hex-encoded execution result hash.
    pub execution_result_hash: String,
    /// Collected attestations.
    pub attestations: Vec<AttestationExport>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use certen_attestation::{AttestationPubKey as PK, AttestationSignature as Sig};
    use certen_types::{canonical_attestation_message, BatchId, BlsKeyPair, DomainTag, Receipt, ReceiptEntry, ValidatorId};

    fn sample_bundle() -> StateInclusionBundle {
        let account_hash = Hash::from_bytes(b"account");
        let sib = Hash::from_bytes(b"sib");
        let partition_root = Hash::hash_pair(&account_hash, &sib);
        let r2 = Receipt {
            start: account_hash,
            anchor: partition_root,
            entries: vec![ReceiptEntry { hash: sib, right: true }],
            local_block: 10,
        };
        let sib2 = Hash::from_bytes(b"sib2");
        let network_root = Hash::hash_pair(&partition_root, &sib2);
        let r3 = Receipt {
            start: partition_root,
            anchor: network_root,
            entries: vec![ReceiptEntry { hash: sib2, right: true }],
            local_block: 20,
        };
        StateInclusionBundle::from_receipts(account_hash, r2, r3)
    }

    fn sample_attestation() -> Attestation {
        let kp = BlsKeyPair::from_seed(&[3u8; 32]);
        let root = Hash::from_bytes(b"root");
        let tx = Hash::from_bytes(b"tx");
        let msg = canonical_attestation_message(&root, &tx);
        let sig = kp.sign_with_domain(msg.as_bytes(), DomainTag::Attestation);
        Attestation {
            batch_id: BatchId("b1".into()),
            validator_id: ValidatorId("v1".into()),
            pubkey: PK::Bls(kp.public_key()),
            signature: Sig::Bls(sig),
        }
    }

    fn sample_export() -> ProofExportV1 {
        let bundle = sample_bundle();
        let attestation = sample_attestation();
        let inputs = ExportInputs {
            state_bundle: &bundle,
            bundle_id: BundleId(Hash::from_bytes(b"bundle")),
            governance_merkle_root: Hash::from_bytes(b"gov root"),
            governance_threshold: 2,
            governance_valid_signer_count: 3,
            anchor_merkle_root: Hash::from_bytes(b"anchor root"),
            anchor_tx_hash: Hash::from_bytes(b"anchor tx"),
            anchor_block_num: 42,
            anchor_binding_hash: Hash::from_bytes(b"binding"),
            anchor_valid: true,
            execution_result_hash: Hash::from_bytes(b"result"),
            execution_valid: true,
            attestations: std::slice::from_ref(&attestation),
        };
        ProofExportV1::build(&inputs)
    }

    #[test]
    fn export_version_tag_is_certen_anchor_proof() {
        assert_eq!(sample_export().version, EXPORT_VERSION);
    }

    #[test]
    fn state_inclusion_validity_is_derived_at_export_time() {
        let export = sample_export();
        assert!(export.state_inclusion.valid);
    }

    #[test]
    fn threshold_met_reflects_signer_count_vs_threshold() {
        let export = sample_export();
        assert!(export.governance.threshold_met);
    }

    #[test]
    fn json_round_trip_preserves_every_field_s8_property_9() {
        let export = sample_export();
        let json = export.to_json().unwrap();
        let parsed = ProofExportV1::from_json(&json).unwrap();
        assert_eq!(export, parsed);
    }

    #[test]
    fn compact_variant_omits_derived_fields_but_keeps_raw_hex() {
        let export = sample_export();
        let compact = export.to_compact();
        assert_eq!(compact.bundle_id, export.bundle_id);
        assert_eq!(compact.anchor_tx_hash, export.anchor.anchor_tx_hash);
        assert_eq!(compact.attestations.len(), 1);
    }

    #[test]
    fn compact_json_is_smaller_than_full_export() {
        let export = sample_export();
        let full = export.to_json().unwrap();
        let compact = serde_json::to_string(&export.to_compact()).unwrap();
        assert!(compact.len() < full.len());
    }
}
