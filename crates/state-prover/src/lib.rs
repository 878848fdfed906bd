//! Four-layer state-inclusion prover (§4.C): proves an account event up to
//! a network-signed block root, optionally re-verifying BFT consensus
//! finality of each hop.

mod bundle;
mod consensus;
mod error;
mod prover;

pub use bundle::StateInclusionBundle;
pub use consensus::{canonical_vote_payload, validator_set_hash, verify_finality, ConsensusFinalityProof};
pub use error::StateProverError;
pub use prover::{AnchoringProof, ProofMode, StateProver, StateProverConfig};
