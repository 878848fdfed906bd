//! ABCI-style consensus engine callback surface (§6 "Consensus engine
//! callbacks (consumed)"). Synchronous, matching the teacher's
//! [`StateMachine`]-shaped replicated state machine: no suspension points,
//! deterministic given the same inputs.

use crate::block::ValidatorBlock;
use crate::error::ConsensusError;
use certen_types::{BundleId, Hash, ValidatorId};

/// Response to the `Info` callback: resync state for the consensus engine (§4.G "Recovery").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InfoResponse {
    /// Last committed height.
    pub last_height: u64,
    /// Last committed app hash.
    pub last_app_hash: Hash,
}

/// Outcome of a `CheckTx`/`ProcessProposal`-style pre-commit check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckOutcome {
    /// The candidate block passed every invariant.
    Accept,
    /// The candidate block failed an invariant; rejected with its error.
    Reject(String),
}

/// Result of delivering one block (before `commit` persists the height/app hash).
#[derive(Debug, Clone)]
pub struct FinalizeBlockResponse {
    /// Height the block was assigned.
    pub height: u64,
    /// The delivered block's bundle id.
    pub bundle_id: BundleId,
}

/// ABCI-style callback surface the consensus engine drives the state
/// machine through (§6). Vote-extension and snapshot callbacks are
/// deliberately absent: the spec calls them "no-op by default" and this
/// trait omits rather than stubs them, since nothing in this crate consumes
/// their output.
pub trait ConsensusCallbacks {
    /// Report resync state on startup.
    fn info(&self) -> InfoResponse;

    /// One-time genesis initialisation. No-op beyond recording the height.
    fn init_chain(&mut self, initial_height: u64);

    /// Stateless mempool admission check: only the invariant checks that
    /// don't require the machine's mutable state.
    fn check_tx(&self, block: &ValidatorBlock) -> CheckOutcome;

    /// Proposer-side candidate check (read-only; does not mutate state).
    fn prepare_proposal(&self, block: &ValidatorBlock) -> CheckOutcome {
        self.check_tx(block)
    }

    /// Validator-side candidate check (read-only; does not mutate state).
    fn process_proposal(&self, block: &ValidatorBlock) -> CheckOutcome {
        self.check_tx(block)
    }

    /// Deliver and commit a block: overrides metadata, checks invariants,
    /// applies per-block side effects, and folds the block into `app_hash`.
    ///
    /// Re-entrancy hazard (§5): this runs under the state machine's write
    /// lock; it must never call back into a method that re-takes that lock.
    fn finalize_block(
        &mut self,
        block: ValidatorBlock,
        proposer: ValidatorId,
        now: chrono::DateTime<chrono::Utc>,
    ) -> Result<FinalizeBlockResponse, ConsensusError>;

    /// Persist `{last_height, last_app_hash}` so the engine can resume after
    /// restart. Called once per height, after every `finalize_block` for
    /// that height.
    fn commit(&mut self) -> InfoResponse;

    /// Read-only lookup of a cached validator block by its bundle id.
    fn query(&self, bundle_id: &BundleId) -> Option<ValidatorBlock>;
}
