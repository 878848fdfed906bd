//! Remote source-ledger node client (§6: consumed JSON-RPC 2.0 surface).

use crate::error::RpcError;
use crate::records::{ChainEntryResult, SignatureChainCountResult, SignatureEntryResult};
use async_trait::async_trait;
use certen_types::Hash;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// A validator entry in a consensus validator set, as needed for §4.C's
/// L1C/L2C consensus-finality check.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ValidatorRecord {
    /// The validator's consensus address (signer identity for votes).
    pub address: String,
    /// Ed25519 public key bytes.
    pub public_key: Vec<u8>,
    /// Voting power.
    pub voting_power: u64,
}

/// A single vote within a consensus commit.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct VoteRecord {
    /// Address of the validator that cast this vote.
    pub validator_address: String,
    /// Whether the vote is flagged as a commit (precommit for the block).
    pub is_commit: bool,
    /// Ed25519 signature over the canonical vote payload.
    pub signature: Vec<u8>,
    /// Millisecond timestamp recorded in the vote.
    pub timestamp: u64,
}

/// A consensus commit record for a given height (§4.C step 3).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct CommitRecord {
    /// Height this commit is for.
    pub height: u64,
    /// Round the commit was reached in.
    pub round: u64,
    /// Hash of the block id being committed.
    pub block_id_hash: Hash,
    /// Hash of the block header, independently computable by the caller.
    pub header_hash: Hash,
    /// Hash of the validator set that produced this commit.
    pub validators_hash: Hash,
    /// The application-level state root committed in this block's header.
    pub app_hash: Hash,
    /// Votes cast for this commit.
    pub votes: Vec<VoteRecord>,
}

/// A DN (directory network) anchor record, as searched over by L2 (§4.C
/// step 2).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct DnAnchorRecord {
    /// Block index this anchor record belongs to.
    pub block: u64,
    /// The receipt whose `start` may match an L1 anchor.
    pub receipt: crate::records::ReceiptJson,
}

/// A key page mutation applied between genesis and an executing major block
/// index (§4.D step 1, KPSW-EXEC).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct KeyPageMutationRecord {
    /// Major block index the mutation was applied at.
    pub applied_at_mbi: u64,
    /// New version of the key page after this mutation.
    pub version: u64,
    /// New signature threshold after this mutation.
    pub threshold: u64,
    /// Full ordered key-hash set after this mutation.
    pub key_hashes: Vec<Hash>,
}

/// The genesis state of a key page, before any mutation is applied.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct KeyPageGenesisRecord {
    /// Genesis version (typically 1).
    pub version: u64,
    /// Genesis threshold.
    pub threshold: u64,
    /// Genesis key-hash set.
    pub key_hashes: Vec<Hash>,
    /// The block at which this genesis snapshot was witnessed.
    pub witness_block: u64,
}

/// The remote source-ledger node, treated as an opaque oracle (§1, §6).
///
/// Every method may suspend and must honour the caller's deadline (§5): a
/// call that does not complete before `deadline` elapses resolves to
/// [`RpcError::Timeout`], never partially.
#[async_trait]
pub trait RemoteNode: Send + Sync {
    /// `query-chain-entry`.
    async fn query_chain_entry(
        &self,
        account: &str,
        chain: &str,
        entry_index: u64,
        deadline: Duration,
    ) -> Result<ChainEntryResult, RpcError>;

    /// `query-signature-chain-count`.
    async fn query_signature_chain_count(
        &self,
        account: &str,
        deadline: Duration,
    ) -> Result<SignatureChainCountResult, RpcError>;

    /// `query-signature-entry`.
    async fn query_signature_entry(
        &self,
        account: &str,
        index: u64,
        deadline: Duration,
    ) -> Result<SignatureEntryResult, RpcError>;

    /// Search recent DN anchor records for one whose receipt `start` equals
    /// `l1_anchor`, walking back at most `max_attempts` blocks from the
    /// current DN head (§4.C step 2 fallback strategy).
    async fn search_dn_anchor(
        &self,
        l1_anchor: Hash,
        max_attempts: u32,
        deadline: Duration,
    ) -> Result<Option<DnAnchorRecord>, RpcError>;

    /// Fetch the consensus commit at height `height` (§4.C step 3).
    async fn consensus_commit(
        &self,
        height: u64,
        deadline: Duration,
    ) -> Result<CommitRecord, RpcError>;

    /// Fetch the full validator set active at `height`, transparently
    /// paginating (§4.C step 3: "fetch the full validator set with
    /// pagination").
    async fn validator_set(
        &self,
        height: u64,
        deadline: Duration,
    ) -> Result<Vec<ValidatorRecord>, RpcError>;

    /// Fetch a key page's genesis snapshot (§4.D KPSW-EXEC step 1).
    async fn key_page_genesis(
        &self,
        key_page_url: &str,
        deadline: Duration,
    ) -> Result<KeyPageGenesisRecord, RpcError>;

    /// Fetch every key-page mutation between genesis and `up_to_mbi`,
    /// ordered ascending by `applied_at_mbi` (§4.D KPSW-EXEC step 1).
    async fn key_page_mutations(
        &self,
        key_page_url: &str,
        up_to_mbi: u64,
        deadline: Duration,
    ) -> Result<Vec<KeyPageMutationRecord>, RpcError>;
}

/// A JSON-RPC 2.0 client over HTTP for [`RemoteNode`].
pub struct JsonRpcClient {
    http: reqwest::Client,
    base_url: String,
}

impl JsonRpcClient {
    /// Build a client pointed at `base_url`.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }

    async fn call(
        &self,
        method: &str,
        params: serde_json::Value,
        deadline: Duration,
    ) -> Result<serde_json::Value, RpcError> {
        let body = serde_json::json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": method,
            "params": params,
        });

        let fut = self.http.post(&self.base_url).json(&body).send();
        let response = tokio::time::timeout(deadline, fut)
            .await
            .map_err(|_| RpcError::Timeout {
                method: method.to_string(),
                elapsed_ms: deadline.as_millis() as u64,
            })?
            .map_err(|e| RpcError::Transport {
                method: method.to_string(),
                source: e.to_string(),
            })?;

        let value: serde_json::Value = response.json().await.map_err(|e| RpcError::Transport {
            method: method.to_string(),
            source: e.to_string(),
        })?;

        if let Some(error) = value.get("error").or_else(|| value.get("Error")) {
            return Err(RpcError::NodeError {
                method: method.to_string(),
                code: error.get("code").and_then(|c| c.as_i64()).unwrap_or(-1),
                message: error
                    .get("message")
                    .and_then(|m| m.as_str())
                    .unwrap_or("unknown node error")
                    .to_string(),
            });
        }

        Ok(value.get("result").or_else(|| value.get("Result")).cloned().unwrap_or(value))
    }
}

#[async_trait]
impl RemoteNode for JsonRpcClient {
    async fn query_chain_entry(
        &self,
        account: &str,
        chain: &str,
        entry_index: u64,
        deadline: Duration,
    ) -> Result<ChainEntryResult, RpcError> {
        let result = self
            .call(
                "query-chain-entry",
                serde_json::json!({ "account": account, "chain": chain, "index": entry_index }),
                deadline,
            )
            .await?;
        ChainEntryResult::from_json(&result)
    }

    async fn query_signature_chain_count(
        &self,
        account: &str,
        deadline: Duration,
    ) -> Result<SignatureChainCountResult, RpcError> {
        let result = self
            .call(
                "query-signature-chain-count",
                serde_json::json!({ "account": account }),
                deadline,
            )
            .await?;
        SignatureChainCountResult::from_json(&result)
    }

    async fn query_signature_entry(
        &self,
        account: &str,
        index: u64,
        deadline: Duration,
    ) -> Result<SignatureEntryResult, RpcError> {
        let result = self
            .call(
                "query-signature-entry",
                serde_json::json!({ "account": account, "index": index }),
                deadline,
            )
            .await?;
        SignatureEntryResult::from_json(&result)
    }

    async fn search_dn_anchor(
        &self,
        l1_anchor: Hash,
        max_attempts: u32,
        deadline: Duration,
    ) -> Result<Option<DnAnchorRecord>, RpcError> {
        let result = self
            .call(
                "search-dn-anchor",
                serde_json::json!({ "start": l1_anchor.to_hex(), "maxAttempts": max_attempts }),
                deadline,
            )
            .await?;
        if result.is_null() {
            return Ok(None);
        }
        serde_json::from_value(result)
            .map(Some)
            .map_err(|_| RpcError::InvalidResponse {
                method: "search-dn-anchor".to_string(),
                field: "<body>".to_string(),
            })
    }

    async fn consensus_commit(
        &self,
        height: u64,
        deadline: Duration,
    ) -> Result<CommitRecord, RpcError> {
        let result = self
            .call("consensus-commit", serde_json::json!({ "height": height }), deadline)
            .await?;
        serde_json::from_value(result).map_err(|_| RpcError::InvalidResponse {
            method: "consensus-commit".to_string(),
            field: "<body>".to_string(),
        })
    }

    async fn validator_set(
        &self,
        height: u64,
        deadline: Duration,
    ) -> Result<Vec<ValidatorRecord>, RpcError> {
        let mut validators = Vec::new();
        let mut page = 0u64;
        loop {
            let result = self
                .call(
                    "validator-set",
                    serde_json::json!({ "height": height, "page": page }),
                    deadline,
                )
                .await?;
            let page_records: Vec<ValidatorRecord> =
                serde_json::from_value(result.get("validators").cloned().unwrap_or(result.clone()))
                    .map_err(|_| RpcError::InvalidResponse {
                        method: "validator-set".to_string(),
                        field: "validators".to_string(),
                    })?;
            let has_more = result.get("hasMore").and_then(|v| v.as_bool()).unwrap_or(false);
            validators.extend(page_records);
            if !has_more {
                break;
            }
            page += 1;
        }
        Ok(validators)
    }

    async fn key_page_genesis(
        &self,
        key_page_url: &str,
        deadline: Duration,
    ) -> Result<KeyPageGenesisRecord, RpcError> {
        let result = self
            .call(
                "key-page-genesis",
                serde_json::json!({ "keyPage": key_page_url }),
                deadline,
            )
            .await?;
        serde_json::from_value(result).map_err(|_| RpcError::InvalidResponse {
            method: "key-page-genesis".to_string(),
            field: "<body>".to_string(),
        })
    }

    async fn key_page_mutations(
        &self,
        key_page_url: &str,
        up_to_mbi: u64,
        deadline: Duration,
    ) -> Result<Vec<KeyPageMutationRecord>, RpcError> {
        let result = self
            .call(
                "key-page-mutations",
                serde_json::json!({ "keyPage": key_page_url, "upToMbi": up_to_mbi }),
                deadline,
            )
            .await?;
        serde_json::from_value(result).map_err(|_| RpcError::InvalidResponse {
            method: "key-page-mutations".to_string(),
            field: "<body>".to_string(),
        })
    }
}
