//! G2 — outcome binding (§4.D).
//!
//! The source material implements this stage unevenly — payload and effect
//! verification exist, but the path that decides "execution success" from
//! deep RPC traversal is left underspecified, with re-implementers told to
//! "surface a clearly documented predicate, not guess." This is that
//! predicate: payload authenticity is "the caller-supplied payload hashes to
//! the transaction hash G0 already proved inclusion for," and effect binding
//! is "the caller-supplied declared intent hash equals the caller-supplied
//! recorded effect hash" — both comparisons the caller must source from the
//! same trusted witnesses G0/G1 already used, not re-derived here.

use certen_types::Hash;

/// Evidence needed to decide outcome binding, sourced by the caller from
/// wherever it observed the transaction's payload and recorded effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutcomeEvidence {
    /// `SHA256` of the raw transaction payload bytes.
    pub payload_hash: Hash,
    /// Hash of what the transaction declared it would do.
    pub declared_intent_hash: Hash,
    /// Hash of the state change actually recorded on the source ledger for
    /// this transaction.
    pub recorded_effect_hash: Hash,
}

/// Result of the G2 stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct G2Result {
    /// Whether `payload_hash == tx_hash` (the payload is authentically what
    /// G0 proved inclusion for).
    pub payload_verified: bool,
    /// Whether `declared_intent_hash == recorded_effect_hash`.
    pub effect_verified: bool,
    /// The partition anchor hash this outcome is bound to (`G0::exec_witness`,
    /// carried through for the unified verifier's cross-level binding check).
    pub receipt_binding: Hash,
}

/// Verify outcome binding for a transaction already proven by G0/G1.
pub fn verify_outcome(tx_hash: Hash, exec_witness: Hash, evidence: &OutcomeEvidence) -> G2Result {
    G2Result {
        payload_verified: evidence.payload_hash == tx_hash,
        effect_verified: evidence.declared_intent_hash == evidence.recorded_effect_hash,
        receipt_binding: exec_witness,
    }
}
