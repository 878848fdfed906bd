//! Binary Merkle tree construction, inclusion proofs, and receipt folding (§4.A).
//!
//! This is the leaf-most component of the proof cycle: every higher-level
//! receipt (state-inclusion, governance, anchor binding) is ultimately
//! verified by folding a chain of sibling hashes with [`Receipt::fold`] or a
//! tree path with [`MerkleProof::verify`].

use crate::Hash;

/// Which side of its parent a sibling hash sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Position {
    /// The sibling is the left child; fold as `H(sibling‖current)`.
    Left,
    /// The sibling is the right child; fold as `H(current‖sibling)`.
    Right,
}

/// A single step of a Merkle inclusion proof.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ProofStep {
    /// The sibling hash at this level.
    pub hash: Hash,
    /// Which side the sibling sits on.
    pub position: Position,
}

/// A Merkle inclusion proof: the ordered sibling path from a leaf to the root.
#[derive(Debug, Clone, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
pub struct MerkleProof {
    /// Path steps, leaf-most first.
    pub path: Vec<ProofStep>,
}

impl MerkleProof {
    /// Fold `leaf` up the recorded path and compare the result to `root` in
    /// constant time.
    ///
    /// A single-leaf tree has an empty path and verifies iff `leaf == root`.
    pub fn verify(&self, leaf: &Hash, root: &Hash) -> bool {
        let mut current = *leaf;
        for step in &self.path {
            current = match step.position {
                Position::Left => Hash::hash_pair(&step.hash, &current),
                Position::Right => Hash::hash_pair(&current, &step.hash),
            };
        }
        current.ct_eq(root)
    }

    /// Number of levels in this proof.
    pub fn depth(&self) -> usize {
        self.path.len()
    }
}

/// Errors arising from Merkle tree construction or verification.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MerkleError {
    /// Attempted to build a tree from zero leaves.
    #[error("cannot build a merkle tree with no leaves")]
    EmptyTree,
    /// A supplied leaf hash was not the expected 32 bytes.
    #[error("leaf hash at index {0} is not a valid 32-byte hash")]
    InvalidLeafHash(usize),
    /// Proof path was malformed for the tree it claims to belong to.
    #[error("malformed merkle proof: {0}")]
    InvalidProof(String),
    /// Requested leaf index does not exist in the tree.
    #[error("leaf index {0} not found (tree has {1} leaves)")]
    LeafNotFound(usize, usize),
}

/// A binary Merkle tree over an ordered list of 32-byte leaves.
///
/// Levels with an odd node count duplicate the last node and hash it against
/// itself (spec §4.A), rather than padding with a zero leaf — this keeps the
/// root stable under append-only growth in the common "one more transaction"
/// case used by the batch engine (§4.E).
#[derive(Debug, Clone)]
pub struct MerkleTree {
    /// Levels from leaves (index 0) to root (last index), inclusive.
    levels: Vec<Vec<Hash>>,
}

impl MerkleTree {
    /// Build a tree from ordered leaves.
    pub fn build(leaves: &[Hash]) -> Result<Self, MerkleError> {
        if leaves.is_empty() {
            return Err(MerkleError::EmptyTree);
        }

        let mut levels = vec![leaves.to_vec()];
        while levels.last().unwrap().len() > 1 {
            let current = levels.last().unwrap();
            let mut next = Vec::with_capacity(current.len().div_ceil(2));
            let mut i = 0;
            while i < current.len() {
                let left = current[i];
                let right = if i + 1 < current.len() {
                    current[i + 1]
                } else {
                    // Odd tail: duplicate the last node against itself.
                    left
                };
                next.push(Hash::hash_pair(&left, &right));
                i += 2;
            }
            levels.push(next);
        }

        Ok(Self { levels })
    }

    /// The tree's root hash. Equal to the sole leaf for a single-leaf tree.
    pub fn root(&self) -> Hash {
        *self.levels.last().unwrap().last().unwrap()
    }

    /// Number of leaves this tree was built from.
    pub fn leaf_count(&self) -> usize {
        self.levels[0].len()
    }

    /// Build the inclusion proof for the leaf at `index`.
    pub fn prove(&self, index: usize) -> Result<MerkleProof, MerkleError> {
        if index >= self.leaf_count() {
            return Err(MerkleError::LeafNotFound(index, self.leaf_count()));
        }

        let mut path = Vec::new();
        let mut idx = index;

        for level in &self.levels[..self.levels.len() - 1] {
            let is_right_child = idx % 2 == 1;
            let sibling_idx = if is_right_child { idx - 1 } else { idx + 1 };

            let (sibling, position) = if sibling_idx < level.len() {
                let position = if is_right_child {
                    Position::Left
                } else {
                    Position::Right
                };
                (level[sibling_idx], position)
            } else {
                // Odd tail: the node was hashed against itself, so the
                // "sibling" is the node itself, recorded on the right as the
                // spec's fallback rule requires.
                (level[idx], Position::Right)
            };

            path.push(ProofStep {
                hash: sibling,
                position,
            });
            idx /= 2;
        }

        Ok(MerkleProof { path })
    }
}

/// Build a tree and return its root directly (convenience for callers that do
/// not need individual proofs).
pub fn merkle_root(leaves: &[Hash]) -> Result<Hash, MerkleError> {
    Ok(MerkleTree::build(leaves)?.root())
}

/// A single entry in a [`Receipt`]'s fold chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ReceiptEntry {
    /// Sibling hash to fold in at this step.
    pub hash: Hash,
    /// If true, fold as `H(current‖hash)`; otherwise `H(hash‖current)`.
    pub right: bool,
}

/// A linear Merkle receipt chaining a `start` leaf hash to an `anchor` root
/// through an ordered list of sibling entries (§3).
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Receipt {
    /// The leaf hash this receipt starts from.
    pub start: Hash,
    /// The root this receipt claims to reach.
    pub anchor: Hash,
    /// Ordered fold entries from `start` to `anchor`.
    pub entries: Vec<ReceiptEntry>,
    /// Block index at which `anchor` was committed.
    pub local_block: u64,
}

impl Receipt {
    /// Fold `entries` from `start` and return the resulting hash.
    pub fn fold(&self) -> Hash {
        let mut current = self.start;
        for entry in &self.entries {
            current = if entry.right {
                Hash::hash_pair(&current, &entry.hash)
            } else {
                Hash::hash_pair(&entry.hash, &current)
            };
        }
        current
    }

    /// Whether folding `entries` from `start` yields `anchor` (§8 property 1).
    pub fn is_valid(&self) -> bool {
        self.fold().ct_eq(&self.anchor)
    }
}
