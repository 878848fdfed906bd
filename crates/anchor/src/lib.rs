//! Batched anchor engine: transaction batching, Merkle root construction,
//! per-platform anchoring, and finality observation (§4.E).

mod batch;
mod error;
mod keccak_merkle;
mod observer;
mod strategy;

pub use batch::{Batch, BatchClass, BatchPolicy, BatchState};
pub use error::AnchorError;
pub use keccak_merkle::{KeccakMerkleProof, KeccakMerkleTree, KeccakPosition, KeccakProofStep};
pub use observer::{FinalityObserver, ObservationResult, ObserverConfig};
pub use strategy::{
    default_attestation_scheme, AnchorReceipt, AttestationScheme, ChainStrategy, StrategyRegistry,
    ANCHOR_BINDING_DOMAIN,
};
