//! Persisted consensus/attestation state (§6). Treated throughout the rest
//! of this workspace as an external collaborator; this crate only supplies
//! the row shapes and an in-memory reference implementation to compile and
//! test against (§2).

mod attestations;
mod entries;
mod error;
mod memory;

pub use attestations::BatchAttestationRow;
pub use entries::ConsensusEntry;
pub use error::StoreError;
pub use memory::{MemoryStore, Store};
