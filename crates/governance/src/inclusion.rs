//! G0 — inclusion & finality (§4.D).

use crate::error::GovernanceError;
use certen_rpc::RemoteNode;
use certen_types::Hash;
use std::sync::Arc;
use std::time::Duration;

/// Output of the G0 stage: the transaction's execution inclusion proof.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct G0Result {
    /// Message id as reported by the chain entry.
    pub tx_id: String,
    /// Hash of the transaction.
    pub tx_hash: Hash,
    /// Major block index the transaction's partition anchor was witnessed at
    /// (`EXEC_MBI`, equal to `receipt.local_block`).
    pub exec_mbi: u64,
    /// The partition anchor hash (`EXEC_WITNESS`).
    pub exec_witness: Hash,
    /// The account the transaction was executed against.
    pub principal: String,
}

/// Resolve the execution inclusion proof for `tx_hash` on `account`'s `chain`
/// at `entry_index` (§4.D G0).
pub async fn resolve_inclusion(
    node: &Arc<dyn RemoteNode>,
    account: &str,
    chain: &str,
    entry_index: u64,
    tx_hash: Hash,
    deadline: Duration,
) -> Result<G0Result, GovernanceError> {
    let entry = node.query_chain_entry(account, chain, entry_index, deadline).await?;

    if entry.entry_hash != tx_hash {
        return Err(GovernanceError::InclusionFailure(format!(
            "chain entry hash {} does not equal expected tx hash {}",
            entry.entry_hash, tx_hash
        )));
    }

    let receipt = entry.receipt.clone().into_receipt();
    if !receipt.is_valid() {
        return Err(GovernanceError::InclusionFailure(
            "receipt does not fold to its claimed partition anchor".to_string(),
        ));
    }

    Ok(G0Result {
        tx_id: entry.message_id,
        tx_hash,
        exec_mbi: receipt.local_block,
        exec_witness: receipt.anchor,
        principal: account.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use certen_rpc::{
        ChainEntryResult, CommitRecord, DnAnchorRecord, KeyPageGenesisRecord, KeyPageMutationRecord,
        ReceiptJson, RpcError, SignatureChainCountResult, SignatureEntryResult, ValidatorRecord,
    };
    use async_trait::async_trait;

    struct FakeNode {
        entry_hash: Hash,
        anchor: Hash,
        local_block: u64,
    }

    #[async_trait]
    impl RemoteNode for FakeNode {
        async fn query_chain_entry(&self, _a: &str, _c: &str, _i: u64, _d: Duration) -> Result<ChainEntryResult, RpcError> {
            Ok(ChainEntryResult {
                entry_hash: self.entry_hash,
                receipt: ReceiptJson {
                    start: self.entry_hash,
                    anchor: self.anchor,
                    local_block: self.local_block,
                    entries: vec![],
                },
                message_id: "tx-1".to_string(),
                message_type: "transaction".to_string(),
            })
        }
        async fn query_signature_chain_count(&self, _a: &str, _d: Duration) -> Result<SignatureChainCountResult, RpcError> {
            unimplemented!()
        }
        async fn query_signature_entry(&self, _a: &str, _i: u64, _d: Duration) -> Result<SignatureEntryResult, RpcError> {
            unimplemented!()
        }
        async fn search_dn_anchor(&self, _l: Hash, _m: u32, _d: Duration) -> Result<Option<DnAnchorRecord>, RpcError> {
            unimplemented!()
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
        async fn key_page_mutations(&self, _k: &str, _u: u64, _d: Duration) -> Result<Vec<KeyPageMutationRecord>, RpcError> {
            unimplemented!()
        }
    }

    #[tokio::test]
    async fn inclusion_resolves_with_empty_receipt_path() {
        let entry_hash = Hash::from_bytes(b"entry");
        let node: Arc<dyn RemoteNode> = Arc::new(FakeNode {
            entry_hash,
            anchor: entry_hash,
            local_block: 42,
        });
        let result = resolve_inclusion(&node, "acc://p", "main", 0, entry_hash, Duration::from_secs(1))
            .await
            .unwrap();
        assert_eq!(result.exec_mbi, 42);
        assert_eq!(result.exec_witness, entry_hash);
    }

    #[tokio::test]
    async fn mismatched_tx_hash_is_inclusion_failure() {
        let entry_hash = Hash::from_bytes(b"entry");
        let node: Arc<dyn RemoteNode> = Arc::new(FakeNode {
            entry_hash,
            anchor: entry_hash,
            local_block: 1,
        });
        let wrong = Hash::from_bytes(b"other");
        let err = resolve_inclusion(&node, "acc://p", "main", 0, wrong, Duration::from_secs(1))
            .await
            .unwrap_err();
        assert!(matches!(err, GovernanceError::InclusionFailure(_)));
    }
}
