//! JSON-RPC client for the source-ledger remote node.
//!
//! §1 names remote node RPC an external collaborator "treated as an opaque
//! oracle returning signed JSON with receipts" — this crate is that
//! boundary: a trait the proving crates consume, plus one HTTP-backed
//! implementation and tolerant, tagged-record parsing (§9).

mod client;
mod error;
mod records;

pub use client::{
    CommitRecord, DnAnchorRecord, JsonRpcClient, KeyPageGenesisRecord, KeyPageMutationRecord,
    RemoteNode, ValidatorRecord, VoteRecord,
};
pub use error::RpcError;
pub use records::{ChainEntryResult, ReceiptJson, SignatureChainCountResult, SignatureEntryResult, SignatureJson};
