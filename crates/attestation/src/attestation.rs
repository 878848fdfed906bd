//! A single validator's attestation over a batch's anchor binding (§4.F).

use certen_types::{
    bls_verify, BatchId, BlsPublicKey, BlsSignature, DomainTag, Ed25519PublicKey, Ed25519Signature, Hash,
    ValidatorId,
};

/// Which signature scheme an attestation carries — the same per-platform
/// choice the anchor engine makes when selecting a `ChainStrategy` (§4.E, §4.F).
pub use certen_anchor::AttestationScheme as AttestationSchemeTag;

/// A signer's public key, tagged by scheme.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttestationPubKey {
    /// BLS12-381 public key.
    Bls(BlsPublicKey),
    /// Ed25519 public key.
    Ed25519(Ed25519PublicKey),
}

impl AttestationPubKey {
    /// The scheme this key belongs to.
    pub fn scheme(&self) -> AttestationSchemeTag {
        match self {
            AttestationPubKey::Bls(_) => AttestationSchemeTag::Bls,
            AttestationPubKey::Ed25519(_) => AttestationSchemeTag::Ed25519,
        }
    }

    /// Raw bytes, used as the `(batch_id, pubkey)` uniqueness key (§4.F).
    pub fn as_bytes(&self) -> Vec<u8> {
        match self {
            AttestationPubKey::Bls(k) => k.as_bytes().to_vec(),
            AttestationPubKey::Ed25519(k) => k.as_bytes().to_vec(),
        }
    }
}

/// A signer's signature, tagged by scheme.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttestationSignature {
    /// BLS12-381 signature.
    Bls(BlsSignature),
    /// Ed25519 signature.
    Ed25519(Ed25519Signature),
}

/// One validator's vote that it has independently verified a batch's anchor
/// binding (§4.F). The message signed is always
/// `canonical_attestation_message(merkle_root, anchor_tx_hash)` (§4.B).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attestation {
    /// The batch this attestation is over.
    pub batch_id: BatchId,
    /// The attesting validator.
    pub validator_id: ValidatorId,
    /// The validator's public key.
    pub pubkey: AttestationPubKey,
    /// The validator's signature over the canonical attestation message.
    pub signature: AttestationSignature,
}

impl Attestation {
    /// Verify this attestation's signature over `message` from first
    /// principles, under the attestation domain tag (§4.B).
    pub fn verify(&self, message: &Hash) -> bool {
        match (&self.pubkey, &self.signature) {
            (AttestationPubKey::Bls(pk), AttestationSignature::Bls(sig)) => {
                bls_verify(pk, message.as_bytes(), sig, DomainTag::Attestation)
            }
            (AttestationPubKey::Ed25519(pk), AttestationSignature::Ed25519(sig)) => {
                pk.verify(message.as_bytes(), sig)
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use certen_types::{canonical_attestation_message, BlsKeyPair, Ed25519KeyPair};

    #[test]
    fn bls_attestation_verifies() {
        let kp = BlsKeyPair::from_seed(&[1u8; 32]);
        let merkle_root = Hash::from_bytes(b"root");
        let anchor_tx_hash = Hash::from_bytes(b"tx");
        let msg = canonical_attestation_message(&merkle_root, &anchor_tx_hash);
        let sig = kp.sign_with_domain(msg.as_bytes(), DomainTag::Attestation);

        let att = Attestation {
            batch_id: BatchId("b1".into()),
            validator_id: ValidatorId("v1".into()),
            pubkey: AttestationPubKey::Bls(kp.public_key()),
            signature: AttestationSignature::Bls(sig),
        };
        assert!(att.verify(&msg));
    }

    #[test]
    fn ed25519_attestation_rejects_wrong_message() {
        let kp = Ed25519KeyPair::from_seed(&[2u8; 32]);
        let msg = Hash::from_bytes(b"correct");
        let sig = kp.sign(msg.as_bytes());
        let att = Attestation {
            batch_id: BatchId("b1".into()),
            validator_id: ValidatorId("v1".into()),
            pubkey: AttestationPubKey::Ed25519(kp.public_key()),
            signature: AttestationSignature::Ed25519(sig),
        };
        assert!(!att.verify(&Hash::from_bytes(b"wrong")));
    }
}
