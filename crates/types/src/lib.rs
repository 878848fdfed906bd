//! Core data model, hashing, and signature primitives for the certen
//! proof-cycle engine.
//!
//! This crate has no async, no I/O, and no dependency on any other crate in
//! the workspace — it is the leaf of the dependency graph, exactly as the
//! teacher's `hyperscale-types` crate is.

mod crypto;
mod error;
mod hash;
mod identifiers;
pub mod merkle;

pub use crypto::{
    bls_verify, bls_verify_aggregate, canonical_attestation_message, init_bls, BlsKeyPair,
    BlsPublicKey, BlsSignature, DomainTag, Ed25519KeyPair, Ed25519PublicKey, Ed25519Signature,
    SignatureError,
};
pub use error::{ErrorCode, ErrorContext, RetryPolicy};
pub use hash::{Hash, HashError, KeccakHash};
pub use identifiers::{
    AccountUrl, BatchId, BundleId, ChainName, MajorBlockIndex, Platform, ProofId, ValidatorId,
};
pub use merkle::{merkle_root, MerkleError, MerkleProof, MerkleTree, Position, ProofStep, Receipt, ReceiptEntry};
