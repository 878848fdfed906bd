//! BFT validator block machine and unified verifier (§4.G).

mod abci;
mod block;
mod error;
mod export;
mod state_machine;
mod verifier;

pub use abci::{CheckOutcome, ConsensusCallbacks, FinalizeBlockResponse, InfoResponse};
pub use block::{
    compute_bundle_id, ChainLeg, CrossChainProof, EmbeddedGovernanceProof, ExecutionStage, ResultAttestation,
    ValidatorBlock,
};
pub use error::ConsensusError;
pub use export::{
    AnchorExport, AttestationExport, CompactProof, ExecutionExport, ExportInputs, GovernanceExport, ProofExportV1,
    StateInclusionExport, EXPORT_VERSION,
};
pub use state_machine::{CacheConfig, ValidatorBlockMachine};
pub use verifier::{
    AnchorBindingRecord, CrossLevelBindings, ExecutionProofRecord, RawSignatureRecord, UnifiedVerifier,
    VerificationInput, VerificationResult,
};
