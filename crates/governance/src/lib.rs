//! Three-stage governance prover: G0 (inclusion & finality) → G1 (authority
//! validated) → G2 (outcome binding) (§4.D).

mod authority;
mod error;
mod inclusion;
mod outcome;
mod prover;
mod signatures;

pub use authority::{AuthorityHistory, AuthorityState};
pub use error::GovernanceError;
pub use inclusion::G0Result;
pub use outcome::{verify_outcome, G2Result, OutcomeEvidence};
pub use prover::{G1Result, GovernanceProof, GovernanceProver, GovernanceProverConfig};
pub use signatures::{enumerate_and_validate, SignatureOutcome, SIGNATURE_WORKER_POOL_SIZE};
