//! Signature primitives (§4.B): Ed25519 and BLS12-381 with domain separation.

use crate::Hash;
use std::fmt;

/// Errors from signature construction or verification.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SignatureError {
    /// An Ed25519 public key was not exactly 32 bytes.
    #[error("ed25519 public key must be 32 bytes, got {0}")]
    InvalidPublicKeyLength(usize),
    /// An Ed25519 signature was not exactly 64 bytes.
    #[error("ed25519 signature must be 64 bytes, got {0}")]
    InvalidSignatureLength(usize),
    /// The underlying curve rejected the key or signature encoding.
    #[error("malformed key or signature encoding")]
    MalformedEncoding,
    /// BLS aggregation was attempted on an empty list.
    #[error("cannot aggregate an empty list of signatures or keys")]
    EmptyAggregate,
    /// BLS aggregation failed at the curve library level.
    #[error("bls aggregation failed")]
    AggregationFailed,
}

/// Strict Ed25519 public key (32 bytes).
#[derive(Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct Ed25519PublicKey([u8; 32]);

impl Ed25519PublicKey {
    /// Wrap a 32-byte public key.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, SignatureError> {
        if bytes.len() != 32 {
            return Err(SignatureError::InvalidPublicKeyLength(bytes.len()));
        }
        let mut arr = [0u8; 32];
        arr.copy_from_slice(bytes);
        Ok(Self(arr))
    }

    /// Borrow the raw bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// SHA-256 hash of the public key bytes, used throughout governance
    /// proving to identify signer key hashes (§4.D).
    pub fn hash(&self) -> Hash {
        Hash::from_bytes(&self.0)
    }

    /// Verify a signature over `message` (expected to already be a 32-byte
    /// digest per §4.B: "All hash-to-sign operations use a 32-byte message
    /// digest").
    pub fn verify(&self, message: &[u8], signature: &Ed25519Signature) -> bool {
        use ed25519_dalek::Verifier;
        let Ok(key) = ed25519_dalek::VerifyingKey::from_bytes(&self.0) else {
            return false;
        };
        let sig = ed25519_dalek::Signature::from_bytes(&signature.0);
        key.verify(message, &sig).is_ok()
    }
}

impl fmt::Debug for Ed25519PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Ed25519PublicKey({})", hex::encode(self.0))
    }
}

/// Strict Ed25519 signature (64 bytes).
#[derive(Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Ed25519Signature([u8; 64]);

impl Ed25519Signature {
    /// Wrap a 64-byte signature.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, SignatureError> {
        if bytes.len() != 64 {
            return Err(SignatureError::InvalidSignatureLength(bytes.len()));
        }
        let mut arr = [0u8; 64];
        arr.copy_from_slice(bytes);
        Ok(Self(arr))
    }

    /// Borrow the raw bytes.
    pub fn as_bytes(&self) -> &[u8; 64] {
        &self.0
    }
}

impl fmt::Debug for Ed25519Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Ed25519Signature({}..)", &hex::encode(self.0)[..16])
    }
}

/// An Ed25519 signing key pair.
pub struct Ed25519KeyPair(ed25519_dalek::SigningKey);

impl Ed25519KeyPair {
    /// Generate a random key pair.
    pub fn generate() -> Self {
        Self(ed25519_dalek::SigningKey::generate(&mut rand::rngs::OsRng))
    }

    /// Derive a deterministic key pair from a 32-byte seed (testing/simulation).
    pub fn from_seed(seed: &[u8; 32]) -> Self {
        Self(ed25519_dalek::SigningKey::from_bytes(seed))
    }

    /// Sign a 32-byte message digest.
    pub fn sign(&self, message: &[u8]) -> Ed25519Signature {
        use ed25519_dalek::Signer;
        Ed25519Signature(self.0.sign(message).to_bytes())
    }

    /// The corresponding public key.
    pub fn public_key(&self) -> Ed25519PublicKey {
        Ed25519PublicKey(self.0.verifying_key().to_bytes())
    }
}

/// Domain separation tags for BLS signatures (§4.B).
///
/// Every BLS sign/verify call names one of these so that a signature over an
/// attestation can never be replayed as, say, an anchor-binding signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DomainTag {
    /// Attestation signatures (§4.F).
    Attestation,
    /// Anchor-binding signatures (§4.G unified verifier step 3).
    AnchorBinding,
    /// Validator-set update signatures.
    ValidatorUpdate,
}

impl DomainTag {
    fn as_bytes(self) -> &'static [u8] {
        match self {
            DomainTag::Attestation => b"CERTEN_DOMAIN_ATTESTATION_V1",
            DomainTag::AnchorBinding => b"CERTEN_DOMAIN_ANCHOR_BINDING_V1",
            DomainTag::ValidatorUpdate => b"CERTEN_DOMAIN_VALIDATOR_UPDATE_V1",
        }
    }
}

/// BLS12-381 public key (compressed, 48 bytes).
#[derive(Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct BlsPublicKey(Vec<u8>);

impl BlsPublicKey {
    /// Wrap raw compressed public key bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, SignatureError> {
        blst::min_pk::PublicKey::from_bytes(bytes)
            .map_err(|_| SignatureError::MalformedEncoding)?;
        Ok(Self(bytes.to_vec()))
    }

    /// Borrow the raw bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    fn inner(&self) -> blst::min_pk::PublicKey {
        blst::min_pk::PublicKey::from_bytes(&self.0).expect("validated at construction")
    }

    /// Aggregate a set of public keys into one (linear aggregation).
    pub fn aggregate(keys: &[BlsPublicKey]) -> Result<Self, SignatureError> {
        if keys.is_empty() {
            return Err(SignatureError::EmptyAggregate);
        }
        let inner: Vec<_> = keys.iter().map(|k| k.inner()).collect();
        let refs: Vec<&blst::min_pk::PublicKey> = inner.iter().collect();
        let agg = blst::min_pk::AggregatePublicKey::aggregate(&refs, false)
            .map_err(|_| SignatureError::AggregationFailed)?;
        Ok(Self(agg.to_public_key().to_bytes().to_vec()))
    }
}

impl fmt::Debug for BlsPublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let hex = hex::encode(&self.0);
        write!(f, "BlsPublicKey({}..)", &hex[..16.min(hex.len())])
    }
}

/// BLS12-381 signature (compressed, 96 bytes).
#[derive(Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct BlsSignature(Vec<u8>);

impl BlsSignature {
    /// Wrap raw compressed signature bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, SignatureError> {
        blst::min_pk::Signature::from_bytes(bytes).map_err(|_| SignatureError::MalformedEncoding)?;
        Ok(Self(bytes.to_vec()))
    }

    /// Borrow the raw bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    fn inner(&self) -> blst::min_pk::Signature {
        blst::min_pk::Signature::from_bytes(&self.0).expect("validated at construction")
    }

    /// Aggregate a set of signatures (all must be over the same domain and
    /// message for `verify_aggregate` to later succeed).
    pub fn aggregate(sigs: &[BlsSignature]) -> Result<Self, SignatureError> {
        if sigs.is_empty() {
            return Err(SignatureError::EmptyAggregate);
        }
        let inner: Vec<_> = sigs.iter().map(|s| s.inner()).collect();
        let refs: Vec<&blst::min_pk::Signature> = inner.iter().collect();
        let agg = blst::min_pk::AggregateSignature::aggregate(&refs, true)
            .map_err(|_| SignatureError::AggregationFailed)?;
        Ok(Self(agg.to_signature().to_bytes().to_vec()))
    }
}

impl fmt::Debug for BlsSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let hex = hex::encode(&self.0);
        write!(f, "BlsSignature({}..)", &hex[..16.min(hex.len())])
    }
}

/// A BLS12-381 signing key pair.
pub struct BlsKeyPair(blst::min_pk::SecretKey);

impl BlsKeyPair {
    /// Generate a random key pair.
    pub fn generate() -> Self {
        let mut ikm = [0u8; 32];
        rand::RngCore::fill_bytes(&mut rand::rngs::OsRng, &mut ikm);
        Self(blst::min_pk::SecretKey::key_gen(&ikm, &[]).expect("32-byte ikm is always valid"))
    }

    /// Derive a deterministic key pair from a 32-byte seed.
    pub fn from_seed(seed: &[u8; 32]) -> Self {
        Self(blst::min_pk::SecretKey::key_gen(seed, &[]).expect("32-byte ikm is always valid"))
    }

    /// Sign `message` under the given domain separation tag.
    pub fn sign_with_domain(&self, message: &[u8], domain: DomainTag) -> BlsSignature {
        let sig = self.0.sign(message, domain.as_bytes(), &[]);
        BlsSignature(sig.to_bytes().to_vec())
    }

    /// The corresponding public key.
    pub fn public_key(&self) -> BlsPublicKey {
        BlsPublicKey(self.0.sk_to_pk().to_bytes().to_vec())
    }
}

/// Verify a single BLS signature under a domain tag.
pub fn bls_verify(pubkey: &BlsPublicKey, message: &[u8], sig: &BlsSignature, domain: DomainTag) -> bool {
    sig.inner().verify(true, message, domain.as_bytes(), &[], &pubkey.inner(), true)
        == blst::BLST_ERROR::BLST_SUCCESS
}

/// Verify an aggregate BLS signature: all signers signed the *same* message
/// under the same domain (§4.F aggregation).
pub fn bls_verify_aggregate(
    message: &[u8],
    pubkeys: &[BlsPublicKey],
    sig: &BlsSignature,
    domain: DomainTag,
) -> bool {
    if pubkeys.is_empty() {
        return false;
    }
    let Ok(agg_pk) = BlsPublicKey::aggregate(pubkeys) else {
        return false;
    };
    bls_verify(&agg_pk, message, sig, domain)
}

/// A process-wide BLS initialiser.
///
/// `blst` requires no explicit global setup (unlike some pairing libraries),
/// but the spec (§4.B) calls for an idempotent process-wide initialiser so
/// that call sites don't need to know this; subsequent calls are reentrant
/// no-ops.
pub fn init_bls() {
    // blst::min_pk performs lazy, thread-safe initialisation internally;
    // this function exists to give call sites a single, explicit place to
    // call before spawning verification workers.
}

/// The canonical message signers sign for an attestation (§4.B):
/// `SHA256("CERTEN_ATTESTATION_V1" ‖ merkle_root ‖ anchor_tx_hash)`.
pub fn canonical_attestation_message(merkle_root: &Hash, anchor_tx_hash: &Hash) -> Hash {
    Hash::from_parts(&[
        b"CERTEN_ATTESTATION_V1",
        merkle_root.as_bytes(),
        anchor_tx_hash.as_bytes(),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ed25519_sign_verify_round_trip() {
        let kp = Ed25519KeyPair::generate();
        let msg = Hash::from_bytes(b"test message");
        let sig = kp.sign(msg.as_bytes());
        assert!(kp.public_key().verify(msg.as_bytes(), &sig));
    }

    #[test]
    fn ed25519_rejects_wrong_message() {
        let kp = Ed25519KeyPair::generate();
        let sig = kp.sign(Hash::from_bytes(b"a").as_bytes());
        assert!(!kp.public_key().verify(Hash::from_bytes(b"b").as_bytes(), &sig));
    }

    #[test]
    fn ed25519_from_seed_deterministic() {
        let seed = [7u8; 32];
        let kp1 = Ed25519KeyPair::from_seed(&seed);
        let kp2 = Ed25519KeyPair::from_seed(&seed);
        let msg = b"deterministic";
        assert_eq!(kp1.sign(msg).as_bytes(), kp2.sign(msg).as_bytes());
        assert!(kp1.public_key() == kp2.public_key());
    }

    #[test]
    fn bls_sign_verify_with_domain() {
        let kp = BlsKeyPair::generate();
        let msg = b"block hash";
        let sig = kp.sign_with_domain(msg, DomainTag::Attestation);
        assert!(bls_verify(&kp.public_key(), msg, &sig, DomainTag::Attestation));
        // Wrong domain must fail even with the right key and message.
        assert!(!bls_verify(&kp.public_key(), msg, &sig, DomainTag::AnchorBinding));
    }

    #[test]
    fn bls_aggregate_verify() {
        let kps: Vec<_> = (0..3).map(|_| BlsKeyPair::generate()).collect();
        let msg = b"batch root";
        let sigs: Vec<_> = kps
            .iter()
            .map(|kp| kp.sign_with_domain(msg, DomainTag::Attestation))
            .collect();
        let agg_sig = BlsSignature::aggregate(&sigs).unwrap();
        let pubkeys: Vec<_> = kps.iter().map(|kp| kp.public_key()).collect();
        assert!(bls_verify_aggregate(msg, &pubkeys, &agg_sig, DomainTag::Attestation));
    }

    #[test]
    fn canonical_attestation_message_is_deterministic() {
        let root = Hash::from_bytes(b"root");
        let tx = Hash::from_bytes(b"tx");
        assert_eq!(
            canonical_attestation_message(&root, &tx),
            canonical_attestation_message(&root, &tx)
        );
    }

    #[test]
    fn attestation_e2e_matches_s_invariant_4() {
        let kp = Ed25519KeyPair::generate();
        let root = Hash::from_bytes(b"merkle root");
        let tx = Hash::from_bytes(b"anchor tx hash");
        let digest = canonical_attestation_message(&root, &tx);
        let sig = kp.sign(digest.as_bytes());
        assert!(kp.public_key().verify(digest.as_bytes(), &sig));
    }
}
