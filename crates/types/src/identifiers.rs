//! Domain-specific identifier types shared across the proof cycle.

use std::fmt;

/// Validator identifier within the BFT validator set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
pub struct ValidatorId(pub String);

impl fmt::Display for ValidatorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "validator:{}", self.0)
    }
}

/// Identifier for a single proof-cycle run (spans L1-L4, G0-G2, and the
/// resulting attestation bundle).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
pub struct ProofId(pub String);

impl fmt::Display for ProofId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "proof:{}", self.0)
    }
}

/// Identifier for an anchor batch (§4.E).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
pub struct BatchId(pub String);

impl fmt::Display for BatchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "batch:{}", self.0)
    }
}

/// Identifier for a validator-block bundle (§3, §4.G).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
pub struct BundleId(pub crate::Hash);

impl fmt::Display for BundleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "bundle:{}", self.0)
    }
}

/// Source-ledger account URL (opaque beyond its string form — this crate
/// never parses Accumulate URL syntax, it only hashes and compares it).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
pub struct AccountUrl(pub String);

impl fmt::Display for AccountUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Source-ledger chain name within an account (e.g. `main`, `signature`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
pub struct ChainName(pub String);

impl fmt::Display for ChainName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Major block index — the height at which a source-ledger partition
/// committed an anchor (§ glossary: EXEC_MBI).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize)]
pub struct MajorBlockIndex(pub u64);

impl MajorBlockIndex {
    /// The consensus height that commits this major block index: `H = local_block + 1`.
    ///
    /// §4.C: "Height mapping is normative: consensus height `H = local_block + 1`."
    pub fn consensus_height(self) -> u64 {
        self.0 + 1
    }
}

impl fmt::Display for MajorBlockIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "mbi:{}", self.0)
    }
}

/// Target-chain platform tag (§4.E).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
pub enum Platform {
    /// EVM-compatible chains.
    Evm,
    /// CosmWasm chains.
    CosmWasm,
    /// Solana.
    Solana,
    /// Move-based chains (Aptos/Sui family).
    Move,
    /// NEAR Protocol.
    Near,
    /// The Open Network.
    Ton,
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Platform::Evm => "evm",
            Platform::CosmWasm => "cosmwasm",
            Platform::Solana => "solana",
            Platform::Move => "move",
            Platform::Near => "near",
            Platform::Ton => "ton",
        };
        write!(f, "{s}")
    }
}
