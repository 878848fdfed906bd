//! Authority snapshot replay (§4.D G1 step 1, KPSW-EXEC).

use crate::error::GovernanceError;
use certen_rpc::{KeyPageGenesisRecord, KeyPageMutationRecord};
use certen_types::Hash;
use std::collections::{BTreeMap, HashSet};

/// A key page's state at one version: its threshold and key-hash set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorityState {
    /// Signature threshold at this version.
    pub threshold: u64,
    /// The set of key hashes authorised to sign at this version.
    pub key_hashes: HashSet<Hash>,
}

/// The full version history of a key page, replayed from genesis up to
/// `exec_mbi` (§4.D: "apply them in order; verify the derived final state
/// has version, threshold, and key-hash set consistent with the page
/// definition at EXEC_MBI").
#[derive(Debug, Clone)]
pub struct AuthorityHistory {
    /// State indexed by version, including genesis (version from the
    /// genesis record) and every subsequent mutation.
    by_version: BTreeMap<u64, AuthorityState>,
    /// The highest version reached by `exec_mbi`.
    pub final_version: u64,
}

impl AuthorityHistory {
    /// Replay `genesis` plus `mutations` (already filtered to
    /// `applied_at_mbi <= exec_mbi` and sorted ascending by `applied_at_mbi`
    /// by the caller's RPC query) into a version history.
    pub fn replay(genesis: KeyPageGenesisRecord, mutations: Vec<KeyPageMutationRecord>) -> Result<Self, GovernanceError> {
        let mut by_version = BTreeMap::new();
        let mut current_version = genesis.version;
        by_version.insert(
            genesis.version,
            AuthorityState {
                threshold: genesis.threshold,
                key_hashes: genesis.key_hashes.into_iter().collect(),
            },
        );

        for mutation in mutations {
            if mutation.version != current_version + 1 {
                return Err(GovernanceError::AuthorityMutationGap {
                    expected: current_version + 1,
                    found: mutation.version,
                });
            }
            current_version = mutation.version;
            by_version.insert(
                mutation.version,
                AuthorityState {
                    threshold: mutation.threshold,
                    key_hashes: mutation.key_hashes.into_iter().collect(),
                },
            );
        }

        Ok(Self {
            by_version,
            final_version: current_version,
        })
    }

    /// The authority state as of the final replayed version.
    pub fn final_state(&self) -> &AuthorityState {
        self.by_version.get(&self.final_version).expect("final_version always inserted")
    }

    /// Whether `key_hash` was authorised at exactly `version`.
    pub fn authorised_at(&self, version: u64, key_hash: &Hash) -> bool {
        self.by_version.get(&version).is_some_and(|state| state.key_hashes.contains(key_hash))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn h(s: &[u8]) -> Hash {
        Hash::from_bytes(s)
    }

    #[test]
    fn replay_applies_mutations_in_order() {
        let genesis = KeyPageGenesisRecord {
            version: 1,
            threshold: 1,
            key_hashes: vec![h(b"k1")],
            witness_block: 1,
        };
        let mutations = vec![KeyPageMutationRecord {
            applied_at_mbi: 50,
            version: 2,
            threshold: 2,
            key_hashes: vec![h(b"k1"), h(b"k2")],
        }];
        let history = AuthorityHistory::replay(genesis, mutations).unwrap();
        assert_eq!(history.final_version, 2);
        assert_eq!(history.final_state().threshold, 2);
        assert!(history.authorised_at(1, &h(b"k1")));
        assert!(!history.authorised_at(1, &h(b"k2")));
        assert!(history.authorised_at(2, &h(b"k2")));
    }

    #[test]
    fn gap_in_version_sequence_errors() {
        let genesis = KeyPageGenesisRecord {
            version: 1,
            threshold: 1,
            key_hashes: vec![h(b"k1")],
            witness_block: 1,
        };
        let mutations = vec![KeyPageMutationRecord {
            applied_at_mbi: 50,
            version: 3,
            threshold: 2,
            key_hashes: vec![h(b"k1")],
        }];
        let err = AuthorityHistory::replay(genesis, mutations).unwrap_err();
        assert!(matches!(
            err,
            GovernanceError::AuthorityMutationGap { expected: 2, found: 3 }
        ));
    }
}
