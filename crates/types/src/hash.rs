//! Cryptographic hash type using SHA-256.

use std::fmt;
use subtle::ConstantTimeEq;

/// A 32-byte SHA-256 hash value.
///
/// External-chain Merkle proofs (§4.E) use Keccak-256 instead; that digest is
/// represented separately by [`KeccakHash`] so the two are never confused at
/// the type level.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
pub struct Hash([u8; 32]);

impl Hash {
    /// Size of a hash in bytes.
    pub const BYTES: usize = 32;

    /// Zero hash (all bytes are 0x00).
    pub const ZERO: Self = Self([0u8; 32]);

    /// Hash an arbitrary byte slice with SHA-256.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        use sha2::Digest;
        let digest = sha2::Sha256::digest(bytes);
        Self(digest.into())
    }

    /// Hash the concatenation of several byte slices, without an intermediate
    /// allocation of the full buffer where avoidable.
    pub fn from_parts(parts: &[&[u8]]) -> Self {
        use sha2::Digest;
        let mut hasher = sha2::Sha256::new();
        for part in parts {
            hasher.update(part);
        }
        Self(hasher.finalize().into())
    }

    /// Wrap raw hash bytes (already hashed elsewhere) without re-hashing.
    ///
    /// # Errors
    ///
    /// Returns [`HashError::InvalidLength`] if `bytes` is not exactly 32 bytes.
    pub fn from_raw(bytes: &[u8]) -> Result<Self, HashError> {
        if bytes.len() != Self::BYTES {
            return Err(HashError::InvalidLength {
                expected: Self::BYTES,
                actual: bytes.len(),
            });
        }
        let mut arr = [0u8; 32];
        arr.copy_from_slice(bytes);
        Ok(Self(arr))
    }

    /// Parse a hash from a 64-character hex string.
    pub fn from_hex(hex_str: &str) -> Result<Self, HashError> {
        if hex_str.len() != 64 {
            return Err(HashError::InvalidLength {
                expected: 64,
                actual: hex_str.len(),
            });
        }
        let mut bytes = [0u8; 32];
        hex::decode_to_slice(hex_str, &mut bytes).map_err(|_| HashError::InvalidHex)?;
        Ok(Self(bytes))
    }

    /// Render as a lowercase hex string.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Borrow the underlying bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Consume into the underlying bytes.
    pub fn to_bytes(self) -> [u8; 32] {
        self.0
    }

    /// Constant-time equality check.
    ///
    /// §4.A requires inclusion-proof verification to compare folded hashes to
    /// the expected root in constant time; this is the primitive that backs
    /// every such comparison in this crate.
    pub fn ct_eq(&self, other: &Hash) -> bool {
        self.0.ct_eq(&other.0).into()
    }

    /// Fold two children into a parent hash: `SHA256(left‖right)`.
    pub fn hash_pair(left: &Hash, right: &Hash) -> Hash {
        Hash::from_parts(&[&left.0, &other_bytes(right)])
    }
}

fn other_bytes(h: &Hash) -> [u8; 32] {
    h.0
}

impl fmt::Debug for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let hex = self.to_hex();
        write!(f, "Hash({}..{})", &hex[..8], &hex[56..])
    }
}

impl fmt::Display for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

/// A 32-byte Keccak-256 hash, used exclusively for EVM-compatible trie proofs
/// (§4.E observer, §4.G unified verifier step 4).
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
pub struct KeccakHash([u8; 32]);

impl KeccakHash {
    /// Zero hash.
    pub const ZERO: Self = Self([0u8; 32]);

    /// Hash a byte slice with Keccak-256.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        use sha3::Digest;
        let digest = sha3::Keccak256::digest(bytes);
        Self(digest.into())
    }

    /// Borrow the underlying bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Render as a lowercase hex string.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Debug for KeccakHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "KeccakHash({}..)", &self.to_hex()[..8])
    }
}

/// Errors parsing or constructing a [`Hash`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HashError {
    /// Input was not exactly 32 bytes (or 64 hex characters).
    #[error("invalid hash length: expected {expected}, got {actual}")]
    InvalidLength {
        /// Expected length.
        expected: usize,
        /// Actual length.
        actual: usize,
    },

    /// Input contained non-hex characters.
    #[error("invalid hex string")]
    InvalidHex,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deterministic() {
        let a = Hash::from_bytes(b"hello world");
        let b = Hash::from_bytes(b"hello world");
        assert_eq!(a, b);
    }

    #[test]
    fn distinguishes_inputs() {
        assert_ne!(Hash::from_bytes(b"a"), Hash::from_bytes(b"b"));
    }

    #[test]
    fn hex_round_trip() {
        let h = Hash::from_bytes(b"round trip");
        let hex = h.to_hex();
        assert_eq!(hex.len(), 64);
        assert_eq!(Hash::from_hex(&hex).unwrap(), h);
    }

    #[test]
    fn rejects_wrong_length() {
        assert!(matches!(
            Hash::from_raw(&[0u8; 31]),
            Err(HashError::InvalidLength { expected: 32, actual: 31 })
        ));
    }

    #[test]
    fn hash_pair_matches_concatenation() {
        let l = Hash::from_bytes(b"left");
        let r = Hash::from_bytes(b"right");
        let expected = Hash::from_parts(&[l.as_bytes(), r.as_bytes()]);
        assert_eq!(Hash::hash_pair(&l, &r), expected);
    }

    #[test]
    fn ct_eq_matches_partial_eq() {
        let a = Hash::from_bytes(b"x");
        let b = Hash::from_bytes(b"x");
        let c = Hash::from_bytes(b"y");
        assert!(a.ct_eq(&b));
        assert!(!a.ct_eq(&c));
    }

    #[test]
    fn keccak_differs_from_sha256() {
        let sha = Hash::from_bytes(b"same input");
        let keccak = KeccakHash::from_bytes(b"same input");
        assert_ne!(sha.to_hex(), keccak.to_hex());
    }
}
