//! Attestation coordinator: per-validator attestation collection to quorum,
//! BLS aggregation, bounded-timeout peer fan-out (§4.F).

mod attestation;
mod bundle;
mod coordinator;
mod error;
mod peer;

pub use attestation::{Attestation, AttestationPubKey, AttestationSchemeTag, AttestationSignature};
pub use bundle::{quorum_threshold, AttestationBundle, BundleState, CompletedAttestation};
pub use coordinator::{AttestationCoordinator, CoordinatorConfig, LocalSigner};
pub use error::AttestationError;
pub use peer::AttestationPeer;
