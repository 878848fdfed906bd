//! Finality observation: poll a target chain for the anchor transaction's
//! receipt, wait for sufficient confirmations, and build its inclusion proof
//! (§4.E point 2).

use crate::error::AnchorError;
use crate::keccak_merkle::{self, KeccakMerkleProof, KeccakMerkleTree};
use crate::strategy::ChainStrategy;
use certen_types::{Hash, KeccakHash, Platform};
use std::sync::Arc;
use std::time::Duration;

/// Tunables for the observer's polling loop.
#[derive(Debug, Clone, Copy)]
pub struct ObserverConfig {
    /// Delay between receipt polls.
    pub poll_interval: Duration,
    /// Total time budget before giving up with [`AnchorError::ObservationTimeout`].
    pub timeout: Duration,
    /// Per-RPC-call deadline passed to the strategy.
    pub call_deadline: Duration,
}

impl Default for ObserverConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(5),
            timeout: Duration::from_secs(20 * 60),
            call_deadline: Duration::from_secs(10),
        }
    }
}

/// The result of successfully observing an anchor transaction reach finality.
#[derive(Debug, Clone)]
pub struct ObservationResult {
    /// Target platform.
    pub platform: Platform,
    /// Hash of the observed anchor transaction.
    pub tx_hash: Hash,
    /// Block the transaction landed in.
    pub block_number: u64,
    /// Confirmations observed at the time finality was declared.
    pub confirmations: u64,
    /// Chain-conformant Keccak trie root over the block's ordered transactions.
    pub transactions_root: KeccakHash,
    /// Inclusion proof of the anchor transaction within that tree.
    pub inclusion_proof: KeccakMerkleProof,
    /// Deterministic digest binding all of the above (§4.E "result hash").
    pub result_hash: Hash,
}

impl ObservationResult {
    fn compute_result_hash(
        platform: Platform,
        tx_hash: Hash,
        block_number: u64,
        transactions_root: KeccakHash,
    ) -> Hash {
        Hash::from_parts(&[
            platform.to_string().as_bytes(),
            tx_hash.as_bytes(),
            &block_number.to_be_bytes(),
            transactions_root.as_bytes(),
        ])
    }

    /// Re-derive the result hash and re-verify the inclusion proof from
    /// scratch, as the unified verifier does (§4.G step 4).
    pub fn verify(&self, anchor_tx_rlp: &[u8]) -> bool {
        let leaf = KeccakHash::from_bytes(anchor_tx_rlp);
        if !self.inclusion_proof.verify(&leaf, &self.transactions_root) {
            return false;
        }
        let expected =
            Self::compute_result_hash(self.platform, self.tx_hash, self.block_number, self.transactions_root);
        expected == self.result_hash
    }
}

/// Observes target-chain finality for submitted anchor transactions (§4.E).
pub struct FinalityObserver {
    config: ObserverConfig,
}

impl FinalityObserver {
    /// Build an observer with the given config.
    pub fn new(config: ObserverConfig) -> Self {
        Self { config }
    }

    /// Poll `strategy` for `tx_hash`'s receipt until it has accumulated
    /// `strategy.required_confirmations()`, then build its inclusion proof.
    #[tracing::instrument(skip(self, strategy), fields(platform = ?strategy.platform()))]
    pub async fn observe(&self, strategy: &dyn ChainStrategy, tx_hash: Hash) -> Result<ObservationResult, AnchorError> {
        let platform = strategy.platform();
        let required = strategy.required_confirmations();
        let deadline = self.config.call_deadline;
        let started = tokio::time::Instant::now();

        let block_number = loop {
            if started.elapsed() > self.config.timeout {
                return Err(AnchorError::ObservationTimeout {
                    platform,
                    elapsed_secs: started.elapsed().as_secs(),
                });
            }
            match strategy.poll_receipt(tx_hash, deadline).await? {
                Some(receipt) => {
                    if let Some(block_number) = receipt.block_number {
                        break block_number;
                    }
                }
                None => {}
            }
            tokio::time::sleep(self.config.poll_interval).await;
        };

        let confirmations = loop {
            if started.elapsed() > self.config.timeout {
                return Err(AnchorError::ObservationTimeout {
                    platform,
                    elapsed_secs: started.elapsed().as_secs(),
                });
            }
            let head = strategy.current_block(deadline).await?;
            let confirmations = head.saturating_sub(block_number);
            if confirmations >= required {
                break confirmations;
            }
            tokio::time::sleep(self.config.poll_interval).await;
        };

        let block_txs = strategy.block_transactions(block_number, deadline).await?;
        let transactions_root = keccak_merkle::ordered_trie_root(&block_txs);

        let leaves: Vec<KeccakHash> = block_txs.iter().map(|rlp| KeccakHash::from_bytes(rlp)).collect();

        let tx_index = block_txs
            .iter()
            .position(|rlp| Hash::from_bytes(rlp) == tx_hash)
            .ok_or(AnchorError::ReceiptNotFound { platform, tx_hash })?;

        let tree = KeccakMerkleTree::build(&leaves).ok_or(AnchorError::ReceiptNotFound { platform, tx_hash })?;
        let inclusion_proof = tree
            .prove(tx_index)
            .ok_or(AnchorError::ReceiptNotFound { platform, tx_hash })?;

        let result_hash = ObservationResult::compute_result_hash(platform, tx_hash, block_number, transactions_root);

        Ok(ObservationResult {
            platform,
            tx_hash,
            block_number,
            confirmations,
            transactions_root,
            inclusion_proof,
            result_hash,
        })
    }

    /// Fan out [`Self::observe`] over several `(strategy, tx_hash)` pairs
    /// concurrently, joining all of them and surfacing the first error.
    pub async fn observe_multiple(
        &self,
        targets: Vec<(Arc<dyn ChainStrategy>, Hash)>,
    ) -> Result<Vec<ObservationResult>, AnchorError> {
        let futures = targets
            .into_iter()
            .map(|(strategy, tx_hash)| async move { self.observe(strategy.as_ref(), tx_hash).await });
        futures::future::try_join_all(futures).await
    }
}
