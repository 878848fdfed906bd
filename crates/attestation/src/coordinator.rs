//! Attestation coordinator: self-sign first, then bounded-timeout peer
//! fan-out to quorum (§4.F).

use crate::attestation::{Attestation, AttestationPubKey, AttestationSchemeTag, AttestationSignature};
use crate::bundle::{AttestationBundle, CompletedAttestation};
use crate::error::AttestationError;
use crate::peer::AttestationPeer;
use certen_types::{canonical_attestation_message, BatchId, BlsKeyPair, DomainTag, Ed25519KeyPair, Hash, ValidatorId};
use futures::stream::{FuturesUnordered, StreamExt};
use std::sync::Arc;
use std::time::Duration;

/// Tunables for fan-out timing (§4.F: "bounded-timeout peer fan-out, default 30s").
#[derive(Debug, Clone, Copy)]
pub struct CoordinatorConfig {
    /// Total time budget for collecting peer attestations after self-signing.
    pub fanout_timeout: Duration,
    /// Per-peer RPC deadline.
    pub peer_deadline: Duration,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            fanout_timeout: Duration::from_secs(30),
            peer_deadline: Duration::from_secs(5),
        }
    }
}

/// This node's own signing identity, used to self-attest before fanning out.
pub enum LocalSigner {
    /// BLS12-381 identity.
    Bls(Box<BlsKeyPair>),
    /// Ed25519 identity.
    Ed25519(Box<Ed25519KeyPair>),
}

impl LocalSigner {
    fn scheme(&self) -> AttestationSchemeTag {
        match self {
            LocalSigner::Bls(_) => AttestationSchemeTag::Bls,
            LocalSigner::Ed25519(_) => AttestationSchemeTag::Ed25519,
        }
    }

    fn sign(&self, message: &Hash) -> (AttestationPubKey, AttestationSignature) {
        match self {
            LocalSigner::Bls(kp) => {
                let sig = kp.sign_with_domain(message.as_bytes(), DomainTag::Attestation);
                (AttestationPubKey::Bls(kp.public_key()), AttestationSignature::Bls(sig))
            }
            LocalSigner::Ed25519(kp) => {
                let sig = kp.sign(message.as_bytes());
                (AttestationPubKey::Ed25519(kp.public_key()), AttestationSignature::Ed25519(sig))
            }
        }
    }
}

/// Drives one batch's attestation collection to quorum or timeout (§4.F).
pub struct AttestationCoordinator {
    config: CoordinatorConfig,
}

impl AttestationCoordinator {
    /// Build a coordinator with the given config.
    pub fn new(config: CoordinatorConfig) -> Self {
        Self { config }
    }

    /// Self-sign, then fan out to `peers` concurrently until quorum or the
    /// fan-out deadline elapses (§4.F).
    #[tracing::instrument(skip(self, local_signer, peers), fields(batch_id = %batch_id))]
    pub async fn collect(
        &self,
        batch_id: BatchId,
        local_validator_id: ValidatorId,
        local_signer: LocalSigner,
        merkle_root: Hash,
        anchor_tx_hash: Hash,
        peers: Vec<Arc<dyn AttestationPeer>>,
        validator_count: usize,
    ) -> Result<CompletedAttestation, AttestationError> {
        let message = canonical_attestation_message(&merkle_root, &anchor_tx_hash);
        let mut bundle = AttestationBundle::new(batch_id.clone(), message, local_signer.scheme(), validator_count);

        let (pubkey, signature) = local_signer.sign(&message);
        bundle.add(Attestation {
            batch_id: batch_id.clone(),
            validator_id: local_validator_id,
            pubkey,
            signature,
        })?;

        if !bundle.has_quorum() {
            self.fan_out(&mut bundle, &batch_id, message, peers).await;
        }

        if bundle.has_quorum() {
            bundle.complete()
        } else {
            bundle.mark_timeout();
            Err(AttestationError::QuorumNotMet {
                batch_id,
                collected: bundle.collected(),
                required: bundle.quorum(),
            })
        }
    }

    async fn fan_out(
        &self,
        bundle: &mut AttestationBundle,
        batch_id: &BatchId,
        message: Hash,
        peers: Vec<Arc<dyn AttestationPeer>>,
    ) {
        let peer_deadline = self.config.peer_deadline;
        let mut requests: FuturesUnordered<_> = peers
            .into_iter()
            .map(|peer| {
                let batch_id = batch_id.clone();
                async move {
                    let validator_id = peer.validator_id();
                    peer.request_attestation(batch_id, message, peer_deadline)
                        .await
                        .map_err(|_| validator_id)
                }
            })
            .collect();

        let collect_all = async {
            while let Some(result) = requests.next().await {
                if let Ok(attestation) = result {
                    let _ = bundle.add(attestation);
                    if bundle.has_quorum() {
                        break;
                    }
                }
            }
        };

        let _ = tokio::time::timeout(self.config.fanout_timeout, collect_all).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    struct FixedPeer {
        id: ValidatorId,
        kp: BlsKeyPair,
    }

    #[async_trait]
    impl AttestationPeer for FixedPeer {
        fn validator_id(&self) -> ValidatorId {
            self.id.clone()
        }
        async fn request_attestation(
            &self,
            batch_id: BatchId,
            message: Hash,
            _deadline: Duration,
        ) -> Result<Attestation, AttestationError> {
            let sig = self.kp.sign_with_domain(message.as_bytes(), DomainTag::Attestation);
            Ok(Attestation {
                batch_id,
                validator_id: self.id.clone(),
                pubkey: AttestationPubKey::Bls(self.kp.public_key()),
                signature: AttestationSignature::Bls(sig),
            })
        }
    }

    #[tokio::test]
    async fn self_sign_then_fanout_reaches_quorum() {
        let coordinator = AttestationCoordinator::new(CoordinatorConfig {
            fanout_timeout: Duration::from_secs(2),
            peer_deadline: Duration::from_secs(1),
        });

        let peers: Vec<Arc<dyn AttestationPeer>> = (1..4)
            .map(|i| {
                Arc::new(FixedPeer {
                    id: ValidatorId(format!("v{i}")),
                    kp: BlsKeyPair::from_seed(&[i as u8; 32]),
                }) as Arc<dyn AttestationPeer>
            })
            .collect();

        let result = coordinator
            .collect(
                BatchId("b1".into()),
                ValidatorId("v0".into()),
                LocalSigner::Bls(Box::new(BlsKeyPair::from_seed(&[0u8; 32]))),
                Hash::from_bytes(b"root"),
                Hash::from_bytes(b"tx"),
                peers,
                4,
            )
            .await
            .unwrap();

        assert_eq!(result.validator_ids.len(), 3);
        assert!(result.aggregate_signature.is_some());
    }

    #[tokio::test]
    async fn insufficient_peers_times_out() {
        let coordinator = AttestationCoordinator::new(CoordinatorConfig {
            fanout_timeout: Duration::from_millis(100),
            peer_deadline: Duration::from_millis(50),
        });

        let peers: Vec<Arc<dyn AttestationPeer>> = vec![Arc::new(FixedPeer {
            id: ValidatorId("v1".into()),
            kp: BlsKeyPair::from_seed(&[1u8; 32]),
        })];

        let err = coordinator
            .collect(
                BatchId("b1".into()),
                ValidatorId("v0".into()),
                LocalSigner::Bls(Box::new(BlsKeyPair::from_seed(&[0u8; 32]))),
                Hash::from_bytes(b"root"),
                Hash::from_bytes(b"tx"),
                peers,
                7,
            )
            .await
            .unwrap_err();

        assert!(matches!(err, AttestationError::QuorumNotMet { .. }));
    }

    #[tracing_test::traced_test]
    #[tokio::test]
    async fn collect_emits_a_span_tagged_with_batch_id() {
        let coordinator = AttestationCoordinator::new(CoordinatorConfig {
            fanout_timeout: Duration::from_secs(2),
            peer_deadline: Duration::from_secs(1),
        });
        let peers: Vec<Arc<dyn AttestationPeer>> = vec![Arc::new(FixedPeer {
            id: ValidatorId("v1".into()),
            kp: BlsKeyPair::from_seed(&[1u8; 32]),
        })];

        coordinator
            .collect(
                BatchId("traced-batch".into()),
                ValidatorId("v0".into()),
                LocalSigner::Bls(Box::new(BlsKeyPair::from_seed(&[0u8; 32]))),
                Hash::from_bytes(b"root"),
                Hash::from_bytes(b"tx"),
                peers,
                2,
            )
            .await
            .unwrap();

        assert!(logs_contain("traced-batch"));
    }
}
