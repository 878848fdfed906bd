//! The four-layer state prover itself (§4.C).

use crate::bundle::StateInclusionBundle;
use crate::consensus::{verify_finality, ConsensusFinalityProof};
use crate::error::StateProverError;
use certen_rpc::RemoteNode;
use certen_types::{Hash, Receipt};
use std::sync::Arc;
use std::time::Duration;

/// Proof-grade requires both consensus-finality layers; anchored-only omits
/// them and trusts the receipt stitch alone (§4.C step 4).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProofMode {
    /// Only receipt stitching is checked.
    AnchoredOnly,
    /// Receipt stitching plus both consensus-finality checks.
    ProofGrade,
}

/// The assembled output of the state prover (§4.C step 4).
#[derive(Debug, Clone)]
pub struct AnchoringProof {
    /// Format version.
    pub version: u32,
    /// When this proof was assembled.
    pub timestamp: chrono::DateTime<chrono::Utc>,
    /// Which mode produced this proof.
    pub mode: ProofMode,
    /// L1: account entry receipt, stitched to the partition anchor.
    pub l1: Receipt,
    /// L1C: consensus finality of the partition anchor (proof-grade only).
    pub l1c: Option<ConsensusFinalityProof>,
    /// L2: partition anchor receipt, stitched to the network (DN) anchor.
    pub l2: Receipt,
    /// L2C: consensus finality of the network anchor (proof-grade only).
    pub l2c: Option<ConsensusFinalityProof>,
}

impl AnchoringProof {
    /// Assemble the §3 four-anchor bundle this proof attests to.
    pub fn to_state_inclusion_bundle(&self, account_hash: Hash) -> StateInclusionBundle {
        StateInclusionBundle::from_receipts(account_hash, self.l1.clone(), self.l2.clone())
    }

    /// Re-check the receipt stitch (and, if present, both consensus-finality
    /// results) from first principles.
    pub fn verify(&self, account_hash: Hash) -> Result<(), StateProverError> {
        self.to_state_inclusion_bundle(account_hash).verify()
    }
}

/// Tunables for the state prover (mirrors the spec's named constants as a
/// `Default`-implementing config struct, per the ambient-config convention).
#[derive(Debug, Clone, Copy)]
pub struct StateProverConfig {
    /// Maximum DN blocks to walk back before giving up on L2's stitch search.
    pub max_dn_walkback_attempts: u32,
    /// Default per-call RPC deadline.
    pub default_deadline: Duration,
}

impl Default for StateProverConfig {
    fn default() -> Self {
        Self {
            max_dn_walkback_attempts: 16,
            default_deadline: Duration::from_secs(10),
        }
    }
}

/// Builds [`AnchoringProof`]s by querying a [`RemoteNode`] (§4.C).
pub struct StateProver {
    node: Arc<dyn RemoteNode>,
    config: StateProverConfig,
}

impl StateProver {
    /// Build a prover over `node` with the given config.
    pub fn new(node: Arc<dyn RemoteNode>, config: StateProverConfig) -> Self {
        Self { node, config }
    }

    /// Run the full L1 → L2 → (L1C/L2C) → assembly algorithm.
    #[tracing::instrument(skip(self), fields(account, chain, entry_index))]
    pub async fn prove(
        &self,
        account: &str,
        chain: &str,
        entry_index: u64,
        mode: ProofMode,
    ) -> Result<AnchoringProof, StateProverError> {
        let deadline = self.config.default_deadline;

        // L1: chain entry + receipt, validated against the entry hash.
        let entry = self.node.query_chain_entry(account, chain, entry_index, deadline).await?;
        let l1 = entry.receipt.clone().into_receipt();
        if l1.start != entry.entry_hash {
            return Err(StateProverError::ReceiptMismatch { stage: "L1" });
        }
        if l1.local_block == 0 {
            return Err(StateProverError::ReceiptMismatch { stage: "L1 (local_block must be > 0)" });
        }
        if !l1.is_valid() {
            return Err(StateProverError::ReceiptMismatch { stage: "L1" });
        }

        // L2: search for a DN anchor record whose receipt starts at L1's anchor.
        let dn_record = self
            .node
            .search_dn_anchor(l1.anchor, self.config.max_dn_walkback_attempts, deadline)
            .await?
            .ok_or(StateProverError::AnchorNotFound {
                attempts: self.config.max_dn_walkback_attempts,
            })?;
        let l2 = dn_record.receipt.into_receipt();
        if l2.start != l1.anchor {
            return Err(StateProverError::StitchFailure {
                expected: l1.anchor,
                found: l2.start,
            });
        }
        if !l2.is_valid() {
            return Err(StateProverError::ReceiptMismatch { stage: "L2" });
        }

        let (l1c, l2c) = match mode {
            ProofMode::AnchoredOnly => (None, None),
            ProofMode::ProofGrade => {
                let (l1c, l2c) = tokio::try_join!(
                    self.verify_consensus_finality(l1.local_block, l1.anchor, deadline),
                    self.verify_consensus_finality(l2.local_block, l2.anchor, deadline),
                )?;
                (Some(l1c), Some(l2c))
            }
        };

        Ok(AnchoringProof {
            version: 1,
            timestamp: chrono::Utc::now(),
            mode,
            l1,
            l1c,
            l2,
            l2c,
        })
    }

    async fn verify_consensus_finality(
        &self,
        local_block: u64,
        expected_anchor: Hash,
        deadline: Duration,
    ) -> Result<ConsensusFinalityProof, StateProverError> {
        let height = local_block + 1;
        let (commit, validators) = tokio::try_join!(
            self.node.consensus_commit(height, deadline),
            self.node.validator_set(height, deadline),
        )?;
        verify_finality(local_block, &commit, &validators, &expected_anchor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use certen_rpc::{
        ChainEntryResult, CommitRecord, DnAnchorRecord, KeyPageGenesisRecord, KeyPageMutationRecord,
        ReceiptJson, RpcError, SignatureChainCountResult, SignatureEntryResult, ValidatorRecord,
        VoteRecord,
    };
    use async_trait::async_trait;

    fn leaf(s: &[u8]) -> Hash {
        Hash::from_bytes(s)
    }

    #[tokio::test]
    async fn anchored_only_proof_assembles_and_verifies() {
        let entry_hash = leaf(b"entry");
        let sib = leaf(b"sib");
        let anchor = Hash::hash_pair(&entry_hash, &sib);
        let sib2 = leaf(b"sib2");
        let net_anchor = Hash::hash_pair(&anchor, &sib2);

        let node: Arc<dyn RemoteNode> = Arc::new(FixedNode {
            entry_hash,
            l1_sibling: sib,
            l1_anchor: anchor,
            l1_local_block: 10,
            l2_sibling: sib2,
            l2_anchor: net_anchor,
            l2_local_block: 20,
        });

        let prover = StateProver::new(node, StateProverConfig::default());
        let proof = prover
            .prove("acc://test.acme/tokens", "main", 0, ProofMode::AnchoredOnly)
            .await
            .unwrap();

        assert_eq!(proof.l1.anchor, anchor);
        assert_eq!(proof.l2.anchor, net_anchor);
        assert!(proof.l1c.is_none());
        assert!(proof.l2c.is_none());
        assert!(proof.verify(entry_hash).is_ok());
    }

    struct FixedNode {
        entry_hash: Hash,
        l1_sibling: Hash,
        l1_anchor: Hash,
        l1_local_block: u64,
        l2_sibling: Hash,
        l2_anchor: Hash,
        l2_local_block: u64,
    }

    #[async_trait]
    impl RemoteNode for FixedNode {
        async fn query_chain_entry(
            &self,
            _account: &str,
            _chain: &str,
            _entry_index: u64,
            _deadline: Duration,
        ) -> Result<ChainEntryResult, RpcError> {
            Ok(ChainEntryResult {
                entry_hash: self.entry_hash,
                receipt: ReceiptJson {
                    start: self.entry_hash,
                    anchor: self.l1_anchor,
                    local_block: self.l1_local_block,
                    entries: vec![(self.l1_sibling, true)],
                },
                message_id: "tx-1".to_string(),
                message_type: "transaction".to_string(),
            })
        }

        async fn query_signature_chain_count(
            &self,
            _account: &str,
            _deadline: Duration,
        ) -> Result<SignatureChainCountResult, RpcError> {
            unimplemented!()
        }

        async fn query_signature_entry(
            &self,
            _account: &str,
            _index: u64,
            _deadline: Duration,
        ) -> Result<SignatureEntryResult, RpcError> {
            unimplemented!()
        }

        async fn search_dn_anchor(
            &self,
            l1_anchor: Hash,
            _max_attempts: u32,
            _deadline: Duration,
        ) -> Result<Option<DnAnchorRecord>, RpcError> {
            assert_eq!(l1_anchor, self.l1_anchor);
            Ok(Some(DnAnchorRecord {
                block: self.l2_local_block,
                receipt: ReceiptJson {
                    start: self.l1_anchor,
                    anchor: self.l2_anchor,
                    local_block: self.l2_local_block,
                    entries: vec![(self.l2_sibling, true)],
                },
            }))
        }

        async fn consensus_commit(&self, _height: u64, _deadline: Duration) -> Result<CommitRecord, RpcError> {
            unimplemented!()
        }

        async fn validator_set(&self, _height: u64, _deadline: Duration) -> Result<Vec<ValidatorRecord>, RpcError> {
            unimplemented!()
        }

        async fn key_page_genesis(
            &self,
            _key_page_url: &str,
            _deadline: Duration,
        ) -> Result<KeyPageGenesisRecord, RpcError> {
            unimplemented!()
        }

        async fn key_page_mutations(
            &self,
            _key_page_url: &str,
            _up_to_mbi: u64,
            _deadline: Duration,
        ) -> Result<Vec<KeyPageMutationRecord>, RpcError> {
            unimplemented!()
        }
    }

    #[tokio::test]
    async fn missing_dn_anchor_surfaces_not_found() {
        struct NeverFindsNode;
        #[async_trait]
        impl RemoteNode for NeverFindsNode {
            async fn query_chain_entry(
                &self,
                _a: &str,
                _c: &str,
                _i: u64,
                _d: Duration,
            ) -> Result<ChainEntryResult, RpcError> {
                let entry_hash = Hash::from_bytes(b"e");
                let sib = Hash::from_bytes(b"s");
                let anchor = Hash::hash_pair(&entry_hash, &sib);
                Ok(ChainEntryResult {
                    entry_hash,
                    receipt: ReceiptJson {
                        start: entry_hash,
                        anchor,
                        local_block: 5,
                        entries: vec![(sib, true)],
                    },
                    message_id: "tx".into(),
                    message_type: "transaction".into(),
                })
            }
            async fn query_signature_chain_count(
                &self,
                _a: &str,
                _d: Duration,
            ) -> Result<SignatureChainCountResult, RpcError> {
                unimplemented!()
            }
            async fn query_signature_entry(
                &self,
                _a: &str,
                _i: u64,
                _d: Duration,
            ) -> Result<SignatureEntryResult, RpcError> {
                unimplemented!()
            }
            async fn search_dn_anchor(
                &self,
                _l1_anchor: Hash,
                _max_attempts: u32,
                _d: Duration,
            ) -> Result<Option<DnAnchorRecord>, RpcError> {
                Ok(None)
            }
            async fn consensus_commit(&self, _h: u64, _d: Duration) -> Result<CommitRecord, RpcError> {
                unimplemented!()
            }
            async fn validator_set(&self, _h: u64, _d: Duration) -> Result<Vec<ValidatorRecord>, RpcError> {
                unimplemented!()
            }
            async fn key_page_genesis(&self, _k: &str, _d: Duration) -> Result<KeyPageGenesisRecord, RpcError> {
                unimplemented!()
            }
            async fn key_page_mutations(
                &self,
                _k: &str,
                _u: u64,
                _d: Duration,
            ) -> Result<Vec<KeyPageMutationRecord>, RpcError> {
                unimplemented!()
            }
        }

        let prover = StateProver::new(Arc::new(NeverFindsNode), StateProverConfig::default());
        let err = prover.prove("acc://x", "main", 0, ProofMode::AnchoredOnly).await.unwrap_err();
        assert!(matches!(err, StateProverError::AnchorNotFound { .. }));
    }
}
