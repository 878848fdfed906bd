//! Attestation bundle: quorum tracking and lifecycle for one batch's
//! collected attestations (§4.F).

use crate::attestation::{Attestation, AttestationSchemeTag};
use crate::error::AttestationError;
use certen_types::{BatchId, BlsPublicKey, BlsSignature, Hash, ValidatorId};
use std::collections::{HashMap, HashSet};

/// A bundle's lifecycle state (§4.F).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BundleState {
    /// Just created, no attestations collected yet.
    Initiated,
    /// Below quorum, still collecting.
    Collecting,
    /// Quorum reached; may still accept late attestations until `completed`.
    QuorumMet,
    /// Terminal: finalised (e.g. aggregated and ready for export).
    Completed,
    /// Terminal: failed irrecoverably (e.g. a validator's signature didn't verify).
    Failed,
    /// Terminal: the fan-out deadline elapsed before quorum was reached.
    Timeout,
}

/// Given `validator_count`, the BFT quorum threshold `2f+1` for `f = ⌊(n-1)/3⌋` (§4.F).
pub fn quorum_threshold(validator_count: usize) -> usize {
    let f = (validator_count.saturating_sub(1)) / 3;
    2 * f + 1
}

/// Accumulates attestations for one batch and tracks quorum (§4.F).
pub struct AttestationBundle {
    /// The batch being attested.
    pub batch_id: BatchId,
    /// Canonical message every attestation must sign over.
    pub message: Hash,
    /// Required scheme for this bundle.
    pub scheme: AttestationSchemeTag,
    /// Total validator set size, used to compute quorum.
    pub validator_count: usize,
    /// Current lifecycle state.
    pub state: BundleState,
    by_validator: HashMap<ValidatorId, Attestation>,
    seen_pubkeys: HashSet<Vec<u8>>,
}

impl AttestationBundle {
    /// Start a new, empty bundle in `Initiated`.
    pub fn new(batch_id: BatchId, message: Hash, scheme: AttestationSchemeTag, validator_count: usize) -> Self {
        Self {
            batch_id,
            message,
            scheme,
            validator_count,
            state: BundleState::Initiated,
            by_validator: HashMap::new(),
            seen_pubkeys: HashSet::new(),
        }
    }

    /// The quorum size for this bundle's validator set.
    pub fn quorum(&self) -> usize {
        quorum_threshold(self.validator_count)
    }

    /// Number of attestations collected so far.
    pub fn collected(&self) -> usize {
        self.by_validator.len()
    }

    /// Whether quorum has been reached.
    pub fn has_quorum(&self) -> bool {
        self.collected() >= self.quorum()
    }

    /// Add a verified attestation. Enforces `(batch_id, validator_id)` and
    /// `(batch_id, pubkey)` uniqueness (§4.F), and that the attestation's
    /// scheme matches the bundle's and its signature verifies.
    pub fn add(&mut self, attestation: Attestation) -> Result<(), AttestationError> {
        if attestation.batch_id != self.batch_id {
            return Err(AttestationError::PeerRequestFailed {
                validator: attestation.validator_id,
                reason: "attestation batch_id does not match bundle".to_string(),
            });
        }
        if attestation.pubkey.scheme() != self.scheme {
            return Err(AttestationError::SchemeMismatch {
                expected: self.scheme,
                actual: attestation.pubkey.scheme(),
            });
        }
        if self.by_validator.contains_key(&attestation.validator_id) {
            return Err(AttestationError::DuplicateValidator {
                batch_id: self.batch_id.clone(),
                validator: attestation.validator_id,
            });
        }
        let pubkey_bytes = attestation.pubkey.as_bytes();
        if self.seen_pubkeys.contains(&pubkey_bytes) {
            return Err(AttestationError::DuplicatePublicKey(self.batch_id.clone()));
        }
        if !attestation.verify(&self.message) {
            self.state = BundleState::Failed;
            return Err(AttestationError::InvalidSignature(attestation.validator_id));
        }

        self.seen_pubkeys.insert(pubkey_bytes);
        self.by_validator.insert(attestation.validator_id.clone(), attestation);

        if self.state != BundleState::Completed {
            self.state = if self.has_quorum() { BundleState::QuorumMet } else { BundleState::Collecting };
        }
        Ok(())
    }

    /// Mark the bundle as timed out (terminal, only valid before quorum).
    pub fn mark_timeout(&mut self) {
        if !self.has_quorum() {
            self.state = BundleState::Timeout;
        }
    }

    /// Finalise the bundle: aggregate BLS signatures if applicable, or
    /// simply freeze the Ed25519 set, then transition to `Completed`.
    pub fn complete(&mut self) -> Result<CompletedAttestation, AttestationError> {
        if !self.has_quorum() {
            return Err(AttestationError::QuorumNotMet {
                batch_id: self.batch_id.clone(),
                collected: self.collected(),
                required: self.quorum(),
            });
        }
        let attestations: Vec<Attestation> = self.by_validator.values().cloned().collect();
        let result = match self.scheme {
            AttestationSchemeTag::Bls => {
                let sigs: Vec<BlsSignature> = attestations
                    .iter()
                    .map(|a| match &a.signature {
                        crate::attestation::AttestationSignature::Bls(s) => s.clone(),
                        _ => unreachable!("scheme checked at add() time"),
                    })
                    .collect();
                let pubkeys: Vec<BlsPublicKey> = attestations
                    .iter()
                    .map(|a| match &a.pubkey {
                        crate::attestation::AttestationPubKey::Bls(k) => k.clone(),
                        _ => unreachable!("scheme checked at add() time"),
                    })
                    .collect();
                CompletedAttestation {
                    batch_id: self.batch_id.clone(),
                    validator_ids: attestations.iter().map(|a| a.validator_id.clone()).collect(),
                    aggregate_signature: Some(BlsSignature::aggregate(&sigs)?),
                    aggregate_pubkey: Some(BlsPublicKey::aggregate(&pubkeys)?),
                }
            }
            AttestationSchemeTag::Ed25519 => CompletedAttestation {
                batch_id: self.batch_id.clone(),
                validator_ids: attestations.iter().map(|a| a.validator_id.clone()).collect(),
                aggregate_signature: None,
                aggregate_pubkey: None,
            },
        };
        self.state = BundleState::Completed;
        Ok(result)
    }
}

/// A finalised bundle's output (§4.F): either a BLS aggregate or a plain
/// roster of individually-verified Ed25519 signers.
#[derive(Debug, Clone)]
pub struct CompletedAttestation {
    /// The attested batch.
    pub batch_id: BatchId,
    /// Validators that contributed an attestation.
    pub validator_ids: Vec<ValidatorId>,
    /// Aggregate BLS signature, present only for `Bls`-scheme bundles.
    pub aggregate_signature: Option<BlsSignature>,
    /// Aggregate BLS public key, present only for `Bls`-scheme bundles.
    pub aggregate_pubkey: Option<BlsPublicKey>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attestation::{AttestationPubKey, AttestationSignature};
    use certen_types::{canonical_attestation_message, BlsKeyPair, DomainTag};

    fn make_attestation(batch_id: &BatchId, msg: &Hash, seed: u8) -> Attestation {
        let kp = BlsKeyPair::from_seed(&[seed; 32]);
        let sig = kp.sign_with_domain(msg.as_bytes(), DomainTag::Attestation);
        Attestation {
            batch_id: batch_id.clone(),
            validator_id: ValidatorId(format!("v{seed}")),
            pubkey: AttestationPubKey::Bls(kp.public_key()),
            signature: AttestationSignature::Bls(sig),
        }
    }

    #[test]
    fn quorum_is_two_f_plus_one() {
        assert_eq!(quorum_threshold(4), 3);
        assert_eq!(quorum_threshold(7), 5);
        assert_eq!(quorum_threshold(1), 1);
    }

    #[test]
    fn bundle_reaches_quorum_and_aggregates() {
        let batch_id = BatchId("b1".into());
        let msg = canonical_attestation_message(&Hash::from_bytes(b"root"), &Hash::from_bytes(b"tx"));
        let mut bundle = AttestationBundle::new(batch_id.clone(), msg, AttestationSchemeTag::Bls, 4);

        bundle.add(make_attestation(&batch_id, &msg, 1)).unwrap();
        assert_eq!(bundle.state, BundleState::Collecting);
        bundle.add(make_attestation(&batch_id, &msg, 2)).unwrap();
        bundle.add(make_attestation(&batch_id, &msg, 3)).unwrap();
        assert!(bundle.has_quorum());
        assert_eq!(bundle.state, BundleState::QuorumMet);

        let completed = bundle.complete().unwrap();
        assert_eq!(completed.validator_ids.len(), 3);
        assert!(completed.aggregate_signature.is_some());
    }

    #[test]
    fn duplicate_validator_rejected() {
        let batch_id = BatchId("b1".into());
        let msg = canonical_attestation_message(&Hash::from_bytes(b"root"), &Hash::from_bytes(b"tx"));
        let mut bundle = AttestationBundle::new(batch_id.clone(), msg, AttestationSchemeTag::Bls, 4);
        bundle.add(make_attestation(&batch_id, &msg, 1)).unwrap();
        let err = bundle.add(make_attestation(&batch_id, &msg, 1)).unwrap_err();
        assert!(matches!(err, AttestationError::DuplicateValidator { .. }));
    }

    #[test]
    fn complete_before_quorum_errors() {
        let batch_id = BatchId("b1".into());
        let msg = canonical_attestation_message(&Hash::from_bytes(b"root"), &Hash::from_bytes(b"tx"));
        let mut bundle = AttestationBundle::new(batch_id.clone(), msg, AttestationSchemeTag::Bls, 4);
        bundle.add(make_attestation(&batch_id, &msg, 1)).unwrap();
        assert!(matches!(bundle.complete(), Err(AttestationError::QuorumNotMet { .. })));
    }
}
