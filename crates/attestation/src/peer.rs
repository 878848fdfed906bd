//! Peer validator transport abstraction (§4.F "bounded-timeout peer fan-out").

use crate::attestation::Attestation;
use crate::error::AttestationError;
use async_trait::async_trait;
use certen_types::{BatchId, Hash, ValidatorId};
use std::time::Duration;

/// Asks a single remote validator to attest a batch and returns its signed
/// [`Attestation`]. Mirrors [`certen_rpc::RemoteNode`]'s one-trait-per-remote
/// shape, scoped to the one call the coordinator needs.
#[async_trait]
pub trait AttestationPeer: Send + Sync {
    /// The peer's validator identity.
    fn validator_id(&self) -> ValidatorId;

    /// Request an attestation over `message` for `batch_id`.
    async fn request_attestation(
        &self,
        batch_id: BatchId,
        message: Hash,
        deadline: Duration,
    ) -> Result<Attestation, AttestationError>;
}
