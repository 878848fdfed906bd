//! Per-platform execution strategies and the strategy registry (§4.E, §9).
//!
//! §9 "Global registry → dependency-injected capability": the registry is an
//! owned [`StrategyRegistry`] passed down the call tree rather than a
//! process-wide singleton. Reads dominate (a lookup on every batch
//! submission) so it is guarded by a [`parking_lot::RwLock`], matching the
//! shared-resource policy in §5.

use crate::error::AnchorError;
use async_trait::async_trait;
use certen_types::{DomainTag, Hash, Platform};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

/// The signature scheme a platform's attestation bundle uses by default
/// (§4.E: "BLS12-381 for EVM, Ed25519 for all others, since only EVM
/// benefits from on-chain aggregation under the zk-friendly curve").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttestationScheme {
    /// BLS12-381 aggregate signatures.
    Bls,
    /// Individual Ed25519 signatures.
    Ed25519,
}

/// Default attestation scheme for a platform.
pub fn default_attestation_scheme(platform: Platform) -> AttestationScheme {
    match platform {
        Platform::Evm => AttestationScheme::Bls,
        Platform::CosmWasm | Platform::Solana | Platform::Move | Platform::Near | Platform::Ton => {
            AttestationScheme::Ed25519
        }
    }
}

/// Receipt for a submitted anchor transaction, as reported by a target-chain
/// execution strategy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnchorReceipt {
    /// Hash of the submitted anchor transaction.
    pub tx_hash: Hash,
    /// Block number the transaction landed in, if already included.
    pub block_number: Option<u64>,
}

/// Wire format, gas estimation, confirmation depth, and receipt polling for
/// one target-chain platform (§4.E "per-chain strategy object").
#[async_trait]
pub trait ChainStrategy: Send + Sync {
    /// Which platform this strategy submits to.
    fn platform(&self) -> Platform;

    /// Number of target-chain confirmations required before an anchor is
    /// considered final. EVM defaults to 12 (§4.E).
    fn required_confirmations(&self) -> u64;

    /// Submit `merkle_root` as an anchor transaction, returning its hash.
    async fn submit_anchor(&self, merkle_root: Hash, deadline: Duration) -> Result<Hash, AnchorError>;

    /// Poll for the receipt of a previously submitted anchor transaction.
    async fn poll_receipt(&self, tx_hash: Hash, deadline: Duration) -> Result<Option<AnchorReceipt>, AnchorError>;

    /// The current head block number on the target chain.
    async fn current_block(&self, deadline: Duration) -> Result<u64, AnchorError>;

    /// Ordered RLP-encoded transaction payloads for `block_number`, used to
    /// rebuild the block's transactions-trie root and inclusion proof (§4.E
    /// observer). Order must match the chain's own canonical tx ordering.
    async fn block_transactions(&self, block_number: u64, deadline: Duration) -> Result<Vec<Vec<u8>>, AnchorError>;
}

/// Maps platform tags to their execution strategy (§4.E).
///
/// Strategies are registered once; a duplicate registration for the same
/// platform is an error.
#[derive(Clone)]
pub struct StrategyRegistry {
    inner: Arc<RwLock<HashMap<Platform, Arc<dyn ChainStrategy>>>>,
}

impl StrategyRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Register `strategy` for its platform.
    pub fn register(&self, strategy: Arc<dyn ChainStrategy>) -> Result<(), AnchorError> {
        let platform = strategy.platform();
        let mut guard = self.inner.write();
        if guard.contains_key(&platform) {
            return Err(AnchorError::DuplicateStrategy(platform));
        }
        guard.insert(platform, strategy);
        Ok(())
    }

    /// Look up the strategy registered for `platform`.
    pub fn get(&self, platform: Platform) -> Result<Arc<dyn ChainStrategy>, AnchorError> {
        self.inner
            .read()
            .get(&platform)
            .cloned()
            .ok_or(AnchorError::UnknownStrategy(platform))
    }
}

impl Default for StrategyRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// The domain tag anchor-binding signatures use (§4.B, §4.G unified verifier
/// step 3) — re-exported at this layer since it's the one call site outside
/// `certen-types` that names it for anchoring purposes.
pub const ANCHOR_BINDING_DOMAIN: DomainTag = DomainTag::AnchorBinding;
