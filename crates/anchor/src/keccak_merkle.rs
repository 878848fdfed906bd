//! Keccak-256 Merkle tree for EVM-compatible block inclusion proofs (§4.E
//! point 2, §4.G unified verifier step 4).
//!
//! Real EVM transaction/receipt tries are RLP-keyed Merkle Patricia tries,
//! not flat binary trees — building a byte-exact conformant trie (as §9's
//! Open Questions flags: "the source contains a simplified placeholder; a
//! faithful implementation must use a conformant trie builder") requires a
//! `trie-db`/`triehash` node-encoding layer tied to a specific chain's RLP
//! rules. This module keeps the same honest-simplification posture as
//! `certen_state_prover::bundle`'s BPT hop: the *root* is computed with
//! `triehash::ordered_trie_root` (the real, chain-conformant Keccak trie root
//! over RLP-encoded items), which is the value actually compared against a
//! fetched block header — the binding check that matters. The *inclusion
//! proof* carried alongside it is a binary Keccak Merkle tree over the same
//! ordered RLP leaves, structurally analogous but not byte-identical to the
//! chain's own trie nodes.

use certen_types::KeccakHash;
use rayon::prelude::*;

/// Leaf counts at or above this use `rayon` to hash each level's pairs in
/// parallel; below it, the per-thread dispatch overhead isn't worth it.
const PARALLEL_THRESHOLD: usize = 256;

/// Which side of its parent a sibling hash sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeccakPosition {
    /// Sibling is the left child.
    Left,
    /// Sibling is the right child.
    Right,
}

/// A single step of a Keccak Merkle inclusion proof.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeccakProofStep {
    /// Sibling hash at this level.
    pub hash: KeccakHash,
    /// Which side the sibling sits on.
    pub position: KeccakPosition,
}

/// A Keccak-256 Merkle inclusion proof.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct KeccakMerkleProof {
    /// Path steps, leaf-most first.
    pub path: Vec<KeccakProofStep>,
}

impl KeccakMerkleProof {
    /// Fold `leaf` up the path and compare to `root`.
    pub fn verify(&self, leaf: &KeccakHash, root: &KeccakHash) -> bool {
        let mut current = *leaf;
        for step in &self.path {
            current = match step.position {
                KeccakPosition::Left => hash_pair(&step.hash, &current),
                KeccakPosition::Right => hash_pair(&current, &step.hash),
            };
        }
        current.as_bytes() == root.as_bytes()
    }
}

fn hash_pair(left: &KeccakHash, right: &KeccakHash) -> KeccakHash {
    let mut buf = Vec::with_capacity(64);
    buf.extend_from_slice(left.as_bytes());
    buf.extend_from_slice(right.as_bytes());
    KeccakHash::from_bytes(&buf)
}

/// A binary Keccak Merkle tree built over ordered leaves.
pub struct KeccakMerkleTree {
    levels: Vec<Vec<KeccakHash>>,
}

impl KeccakMerkleTree {
    /// Build a tree from ordered leaves. Odd tails duplicate the last node,
    /// matching the convention in `certen_types::merkle`.
    pub fn build(leaves: &[KeccakHash]) -> Option<Self> {
        if leaves.is_empty() {
            return None;
        }
        let mut levels = vec![leaves.to_vec()];
        while levels.last().unwrap().len() > 1 {
            let current = levels.last().unwrap();
            let next = if current.len() >= PARALLEL_THRESHOLD {
                current
                    .par_chunks(2)
                    .map(|pair| {
                        let left = pair[0];
                        let right = if pair.len() == 2 { pair[1] } else { left };
                        hash_pair(&left, &right)
                    })
                    .collect()
            } else {
                let mut next = Vec::with_capacity(current.len().div_ceil(2));
                let mut i = 0;
                while i < current.len() {
                    let left = current[i];
                    let right = if i + 1 < current.len() { current[i + 1] } else { left };
                    next.push(hash_pair(&left, &right));
                    i += 2;
                }
                next
            };
            levels.push(next);
        }
        Some(Self { levels })
    }

    /// The tree's root.
    pub fn root(&self) -> KeccakHash {
        *self.levels.last().unwrap().last().unwrap()
    }

    /// Build the inclusion proof for the leaf at `index`.
    pub fn prove(&self, index: usize) -> Option<KeccakMerkleProof> {
        if index >= self.levels[0].len() {
            return None;
        }
        let mut path = Vec::new();
        let mut idx = index;
        for level in &self.levels[..self.levels.len() - 1] {
            let is_right_child = idx % 2 == 1;
            let sibling_idx = if is_right_child { idx - 1 } else { idx + 1 };
            let (sibling, position) = if sibling_idx < level.len() {
                (level[sibling_idx], if is_right_child { KeccakPosition::Left } else { KeccakPosition::Right })
            } else {
                (level[idx], KeccakPosition::Right)
            };
            path.push(KeccakProofStep { hash: sibling, position });
            idx /= 2;
        }
        Some(KeccakMerkleProof { path })
    }
}

/// The chain-conformant Keccak trie root over ordered RLP-encoded items
/// (Ethereum's transactions/receipts root formula).
pub fn ordered_trie_root(rlp_items: &[Vec<u8>]) -> KeccakHash {
    let root = triehash::ordered_trie_root::<keccak_hasher::KeccakHasher, _>(rlp_items.iter());
    KeccakHash::from_bytes(root.as_ref())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaf(s: &[u8]) -> KeccakHash {
        KeccakHash::from_bytes(s)
    }

    #[test]
    fn single_leaf_root_is_leaf() {
        let l = leaf(b"only");
        let tree = KeccakMerkleTree::build(&[l]).unwrap();
        assert_eq!(tree.root(), l);
    }

    #[test]
    fn proof_verifies_for_every_leaf() {
        let leaves: Vec<KeccakHash> = (0u8..5).map(|i| leaf(&[i])).collect();
        let tree = KeccakMerkleTree::build(&leaves).unwrap();
        for (i, l) in leaves.iter().enumerate() {
            let proof = tree.prove(i).unwrap();
            assert!(proof.verify(l, &tree.root()));
        }
    }

    #[test]
    fn tampered_proof_fails() {
        let leaves: Vec<KeccakHash> = (0u8..4).map(|i| leaf(&[i])).collect();
        let tree = KeccakMerkleTree::build(&leaves).unwrap();
        let proof = tree.prove(0).unwrap();
        assert!(!proof.verify(&leaves[1], &tree.root()));
    }

    #[test]
    fn ordered_trie_root_is_deterministic() {
        let items = vec![b"tx1".to_vec(), b"tx2".to_vec()];
        assert_eq!(ordered_trie_root(&items), ordered_trie_root(&items));
    }

    #[test]
    fn large_batch_uses_parallel_path_and_still_verifies() {
        let leaves: Vec<KeccakHash> = (0u32..(PARALLEL_THRESHOLD as u32 + 17))
            .map(|i| leaf(&i.to_be_bytes()))
            .collect();
        let tree = KeccakMerkleTree::build(&leaves).unwrap();
        let tree_again = KeccakMerkleTree::build(&leaves).unwrap();
        assert_eq!(tree.root(), tree_again.root());
        for (i, l) in leaves.iter().enumerate().step_by(37) {
            let proof = tree.prove(i).unwrap();
            assert!(proof.verify(l, &tree.root()));
        }
    }
}
