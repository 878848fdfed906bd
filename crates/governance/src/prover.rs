//! G0 → G1 → G2 pipeline orchestration (§4.D).

use crate::authority::AuthorityHistory;
use crate::error::GovernanceError;
use crate::inclusion::{resolve_inclusion, G0Result};
use crate::outcome::{verify_outcome, G2Result, OutcomeEvidence};
use crate::signatures::{enumerate_and_validate, SignatureOutcome};
use certen_rpc::RemoteNode;
use certen_types::Hash;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

/// Output of the G1 stage: authority validated.
#[derive(Debug, Clone)]
pub struct G1Result {
    /// The final replayed key-page version as of `EXEC_MBI`.
    pub final_version: u64,
    /// The signature threshold at the final version.
    pub threshold: u64,
    /// Distinct valid signer key hashes.
    pub valid_signers: HashSet<Hash>,
    /// Every per-signature outcome, valid and invalid alike, for audit.
    pub signature_outcomes: Vec<SignatureOutcome>,
}

/// The fully assembled governance proof.
#[derive(Debug, Clone)]
pub struct GovernanceProof {
    /// G0 — inclusion & finality.
    pub g0: G0Result,
    /// G1 — authority validated.
    pub g1: G1Result,
    /// G2 — outcome binding.
    pub g2: G2Result,
}

/// Tunables for the governance prover.
#[derive(Debug, Clone, Copy)]
pub struct GovernanceProverConfig {
    /// Default per-call RPC deadline.
    pub default_deadline: Duration,
}

impl Default for GovernanceProverConfig {
    fn default() -> Self {
        Self {
            default_deadline: Duration::from_secs(10),
        }
    }
}

/// Drives the three-stage governance pipeline against a [`RemoteNode`].
pub struct GovernanceProver {
    node: Arc<dyn RemoteNode>,
    config: GovernanceProverConfig,
}

impl GovernanceProver {
    /// Build a prover over `node`.
    pub fn new(node: Arc<dyn RemoteNode>, config: GovernanceProverConfig) -> Self {
        Self { node, config }
    }

    /// Run G0, then G1 (authority snapshot and signature enumeration run
    /// concurrently, per §5), then G2.
    #[tracing::instrument(skip(self, outcome_evidence), fields(account, key_page_url))]
    pub async fn prove(
        &self,
        account: &str,
        chain: &str,
        entry_index: u64,
        tx_hash: Hash,
        key_page_url: &str,
        outcome_evidence: OutcomeEvidence,
    ) -> Result<GovernanceProof, GovernanceError> {
        let deadline = self.config.default_deadline;

        let g0 = resolve_inclusion(&self.node, account, chain, entry_index, tx_hash, deadline).await?;

        let (genesis, mutations) = tokio::try_join!(
            self.node.key_page_genesis(key_page_url, deadline),
            self.node.key_page_mutations(key_page_url, g0.exec_mbi, deadline),
        )?;
        let authority = AuthorityHistory::replay(genesis, mutations)?;

        let signature_outcomes =
            enumerate_and_validate(&self.node, account, tx_hash, g0.exec_mbi, &authority, deadline).await?;

        let valid_signers: HashSet<Hash> = signature_outcomes
            .iter()
            .filter(|o| o.valid)
            .map(|o| o.key_hash)
            .collect();

        let threshold = authority.final_state().threshold;
        if (valid_signers.len() as u64) < threshold {
            return Err(GovernanceError::ThresholdNotMet {
                valid: valid_signers.len(),
                threshold,
            });
        }

        let g1 = G1Result {
            final_version: authority.final_version,
            threshold,
            valid_signers,
            signature_outcomes,
        };

        let g2 = verify_outcome(tx_hash, g0.exec_witness, &outcome_evidence);
        if !g2.payload_verified || !g2.effect_verified {
            return Err(GovernanceError::PayloadMismatch(format!(
                "payload_verified={} effect_verified={}",
                g2.payload_verified, g2.effect_verified
            )));
        }

        Ok(GovernanceProof { g0, g1, g2 })
    }
}
