//! The replicated validator block state machine (§4.G "Per-block side
//! effects", "Recovery"). Synchronous and deterministic, in the teacher's
//! `StateMachine` style: every method mutates `self` directly and performs
//! no I/O or suspension.

use crate::abci::{CheckOutcome, ConsensusCallbacks, FinalizeBlockResponse, InfoResponse};
use crate::block::ValidatorBlock;
use crate::error::ConsensusError;
use certen_types::{BundleId, Hash, ValidatorId};
use std::collections::HashMap;

/// Tunables for the validator block cache (§4.G).
#[derive(Debug, Clone, Copy)]
pub struct CacheConfig {
    /// Maximum cached entries before height-based eviction kicks in.
    pub capacity: usize,
    /// Blocks retained behind `latest_height` before eviction.
    pub eviction_margin: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self { capacity: 1000, eviction_margin: 100 }
    }
}

struct CachedBlock {
    block: ValidatorBlock,
    height: u64,
}

/// Replicated state machine over validator blocks: caches them by
/// `bundle_id`, enforces monotonic height, and folds a deterministic
/// `app_hash` on commit (§4.G).
///
/// This type is plain (no internal locking): the engine wraps one instance
/// in `Arc<parking_lot::RwLock<ValidatorBlockMachine>>` and takes the write
/// lock once per `finalize_block`/`commit` call. No method here may call
/// back into another method of the same lock-holder (§5 re-entrancy hazard).
pub struct ValidatorBlockMachine {
    cache: HashMap<BundleId, CachedBlock>,
    cache_config: CacheConfig,
    latest_height: u64,
    app_hash: Hash,
    pending_bundle_ids: Vec<BundleId>,
}

impl ValidatorBlockMachine {
    /// A fresh machine at genesis (height 0, zero app hash).
    pub fn new(cache_config: CacheConfig) -> Self {
        Self {
            cache: HashMap::new(),
            cache_config,
            latest_height: 0,
            app_hash: Hash::ZERO,
            pending_bundle_ids: Vec::new(),
        }
    }

    /// Rebuild a machine from persisted `{last_height, last_app_hash}` on
    /// startup (§4.G "Recovery") — the cache starts empty since cached
    /// blocks are a throughput optimisation, not committed state.
    pub fn recover(last_height: u64, last_app_hash: Hash, cache_config: CacheConfig) -> Self {
        Self {
            cache: HashMap::new(),
            cache_config,
            latest_height: last_height,
            app_hash: last_app_hash,
            pending_bundle_ids: Vec::new(),
        }
    }

    fn insert_cache(&mut self, block: ValidatorBlock, height: u64) {
        self.cache.insert(block.bundle_id, CachedBlock { block, height });
        if self.cache.len() > self.cache_config.capacity {
            self.evict_stale();
        }
    }

    fn evict_stale(&mut self) {
        let floor = self.latest_height.saturating_sub(self.cache_config.eviction_margin);
        self.cache.retain(|_, entry| entry.height >= floor);

        if self.cache.len() > self.cache_config.capacity {
            let mut heights: Vec<(BundleId, u64)> =
                self.cache.iter().map(|(id, entry)| (*id, entry.height)).collect();
            heights.sort_by_key(|(_, h)| *h);
            let overflow = self.cache.len() - self.cache_config.capacity;
            for (id, _) in heights.into_iter().take(overflow) {
                self.cache.remove(&id);
            }
        }
    }
}

impl ConsensusCallbacks for ValidatorBlockMachine {
    fn info(&self) -> InfoResponse {
        InfoResponse { last_height: self.latest_height, last_app_hash: self.app_hash }
    }

    fn init_chain(&mut self, initial_height: u64) {
        self.latest_height = initial_height;
        self.app_hash = Hash::ZERO;
    }

    fn check_tx(&self, block: &ValidatorBlock) -> CheckOutcome {
        if self.cache.contains_key(&block.bundle_id) {
            return CheckOutcome::Reject(format!("duplicate bundle {}", block.bundle_id));
        }
        CheckOutcome::Accept
    }

    fn finalize_block(
        &mut self,
        mut block: ValidatorBlock,
        proposer: ValidatorId,
        now: chrono::DateTime<chrono::Utc>,
    ) -> Result<FinalizeBlockResponse, ConsensusError> {
        // Authority of metadata on commit (§4.G): callers cannot forge these.
        block.block_height = self.latest_height + 1;
        block.timestamp = now;
        block.validator_id = proposer;

        if block.block_height <= self.latest_height {
            return Err(ConsensusError::NonMonotonicHeight {
                latest: self.latest_height,
                delivered: block.block_height,
            });
        }
        if self.cache.contains_key(&block.bundle_id) {
            return Err(ConsensusError::DuplicateBundle(block.bundle_id));
        }

        let response = FinalizeBlockResponse { height: block.block_height, bundle_id: block.bundle_id };
        self.pending_bundle_ids.push(block.bundle_id);
        self.insert_cache(block, response.height);
        tracing::info!(bundle_id = %response.bundle_id, height = response.height, "finalized validator block");
        Ok(response)
    }

    #[tracing::instrument(skip(self))]
    fn commit(&mut self) -> InfoResponse {
        self.latest_height += 1;

        let mut sorted = self.pending_bundle_ids.clone();
        sorted.sort();
        let mut folded = [0u8; 32];
        for bundle_id in &sorted {
            for (acc, b) in folded.iter_mut().zip(bundle_id.0.as_bytes()) {
                *acc ^= b;
            }
        }
        self.app_hash = Hash::from_parts(&[self.app_hash.as_bytes(), &folded]);
        self.pending_bundle_ids.clear();
        self.evict_stale();

        tracing::info!(latest_height = self.latest_height, app_hash = %self.app_hash, "committed");
        InfoResponse { last_height: self.latest_height, last_app_hash: self.app_hash }
    }

    fn query(&self, bundle_id: &BundleId) -> Option<ValidatorBlock> {
        self.cache.get(bundle_id).map(|entry| entry.block.clone())
    }
}
