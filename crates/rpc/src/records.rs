//! Tolerant, tagged records over the remote node's JSON-RPC responses.
//!
//! §9 "Duck-typed JSON handling → tagged records": the source walks RPC
//! responses by string field name, case-insensitively. Rather than carry
//! that over, each query kind gets an explicit Rust record with a
//! `from_json` constructor that looks fields up case-insensitively, ignores
//! unknown fields, and turns a missing required field into
//! [`RpcError::InvalidResponse`].

use crate::error::RpcError;
use certen_types::Hash;
use serde_json::Value;

/// Look up a field on a JSON object case-insensitively (`result`/`Result`
/// both acceptable, per §6).
fn field<'a>(value: &'a Value, name: &str) -> Option<&'a Value> {
    let obj = value.as_object()?;
    if let Some(v) = obj.get(name) {
        return Some(v);
    }
    obj.iter()
        .find(|(k, _)| k.eq_ignore_ascii_case(name))
        .map(|(_, v)| v)
}

fn required<'a>(value: &'a Value, method: &str, name: &str) -> Result<&'a Value, RpcError> {
    field(value, name).ok_or_else(|| RpcError::InvalidResponse {
        method: method.to_string(),
        field: name.to_string(),
    })
}

fn as_hash(value: &Value, method: &str, name: &str) -> Result<Hash, RpcError> {
    let s = value.as_str().ok_or_else(|| RpcError::InvalidResponse {
        method: method.to_string(),
        field: name.to_string(),
    })?;
    Hash::from_hex(s).map_err(|_| RpcError::InvalidResponse {
        method: method.to_string(),
        field: name.to_string(),
    })
}

fn as_u64(value: &Value, method: &str, name: &str) -> Result<u64, RpcError> {
    value.as_u64().ok_or_else(|| RpcError::InvalidResponse {
        method: method.to_string(),
        field: name.to_string(),
    })
}

fn as_str(value: &Value, method: &str, name: &str) -> Result<String, RpcError> {
    value
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| RpcError::InvalidResponse {
            method: method.to_string(),
            field: name.to_string(),
        })
}

/// A chain-entry Merkle receipt as returned by the node, before it is
/// converted into a [`certen_types::Receipt`] by the state prover (which also
/// needs the per-step sibling positions the node encodes as a `right`
/// boolean, matching §3's receipt entry shape exactly).
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ReceiptJson {
    /// Leaf hash the receipt starts from.
    pub start: Hash,
    /// Root the receipt claims to reach.
    pub anchor: Hash,
    /// Block index at which `anchor` was committed.
    pub local_block: u64,
    /// Ordered fold entries (hash, right-flag).
    pub entries: Vec<(Hash, bool)>,
}

impl ReceiptJson {
    fn from_json(value: &Value, method: &str) -> Result<Self, RpcError> {
        let receipt = required(value, method, "receipt")?;
        let start = as_hash(required(receipt, method, "start")?, method, "start")?;
        let anchor = as_hash(required(receipt, method, "anchor")?, method, "anchor")?;
        let local_block = as_u64(
            required(receipt, method, "localBlock")?,
            method,
            "localBlock",
        )?;

        let entries = match field(receipt, "entries") {
            None => Vec::new(),
            Some(Value::Array(items)) => items
                .iter()
                .map(|entry| {
                    let hash = as_hash(required(entry, method, "hash")?, method, "hash")?;
                    let right = required(entry, method, "right")?
                        .as_bool()
                        .ok_or_else(|| RpcError::InvalidResponse {
                            method: method.to_string(),
                            field: "right".to_string(),
                        })?;
                    Ok((hash, right))
                })
                .collect::<Result<Vec<_>, RpcError>>()?,
            Some(_) => {
                return Err(RpcError::InvalidResponse {
                    method: method.to_string(),
                    field: "entries".to_string(),
                })
            }
        };

        Ok(Self {
            start,
            anchor,
            local_block,
            entries,
        })
    }

    /// Convert into the crate-agnostic [`certen_types::Receipt`].
    pub fn into_receipt(self) -> certen_types::Receipt {
        certen_types::Receipt {
            start: self.start,
            anchor: self.anchor,
            local_block: self.local_block,
            entries: self
                .entries
                .into_iter()
                .map(|(hash, right)| certen_types::ReceiptEntry { hash, right })
                .collect(),
        }
    }
}

/// Response shape for `query-chain-entry`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainEntryResult {
    /// Hash of the chain entry itself.
    pub entry_hash: Hash,
    /// Receipt binding the entry to a partition/network anchor.
    pub receipt: ReceiptJson,
    /// Opaque message id (e.g. the transaction hash).
    pub message_id: String,
    /// Message type tag.
    pub message_type: String,
}

impl ChainEntryResult {
    /// Parse from a node response for `query-chain-entry`.
    pub fn from_json(value: &Value) -> Result<Self, RpcError> {
        const METHOD: &str = "query-chain-entry";
        let entry_hash = as_hash(
            required(required(value, METHOD, "chainEntry")?, METHOD, "entry")?,
            METHOD,
            "entry",
        )?;
        let receipt = ReceiptJson::from_json(value, METHOD)?;
        let message = required(value, METHOD, "message")?;
        let message_id = as_str(required(message, METHOD, "id")?, METHOD, "id")?;
        let message_type = as_str(required(message, METHOD, "type")?, METHOD, "type")?;

        Ok(Self {
            entry_hash,
            receipt,
            message_id,
            message_type,
        })
    }
}

/// Response shape for `query-signature-chain-count`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SignatureChainCountResult {
    /// Number of entries on the signature chain.
    pub count: u64,
}

impl SignatureChainCountResult {
    /// Parse from a node response for `query-signature-chain-count`.
    pub fn from_json(value: &Value) -> Result<Self, RpcError> {
        const METHOD: &str = "query-signature-chain-count";
        let count = as_u64(required(value, METHOD, "count")?, METHOD, "count")?;
        Ok(Self { count })
    }
}

/// The signature payload embedded in a `query-signature-entry` response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureJson {
    /// Must be `"ed25519"` — other signature types are rejected upstream.
    pub signature_type: String,
    /// Raw public key bytes.
    pub public_key: Vec<u8>,
    /// Raw signature bytes.
    pub signature: Vec<u8>,
    /// Signer account URL.
    pub signer: String,
    /// Version of the key page the signer's key was valid at.
    pub signer_version: u64,
    /// Unix millisecond timestamp the signature carries.
    pub timestamp: u64,
    /// Transaction hash this signature claims to authorise.
    pub transaction_hash: Hash,
}

/// Response shape for `query-signature-entry`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureEntryResult {
    /// Receipt binding the signature entry to a partition anchor.
    pub receipt: ReceiptJson,
    /// The embedded signature payload.
    pub signature: SignatureJson,
}

impl SignatureEntryResult {
    /// Parse from a node response for `query-signature-entry`.
    pub fn from_json(value: &Value) -> Result<Self, RpcError> {
        const METHOD: &str = "query-signature-entry";
        let receipt = ReceiptJson::from_json(value, METHOD)?;
        let message = required(value, METHOD, "message")?;
        let sig = required(message, METHOD, "signature")?;

        let signature_type = as_str(required(sig, METHOD, "type")?, METHOD, "type")?;
        let public_key = hex_field(sig, METHOD, "publicKey")?;
        let signature = hex_field(sig, METHOD, "signature")?;
        let signer = as_str(required(sig, METHOD, "signer")?, METHOD, "signer")?;
        let signer_version = as_u64(
            required(sig, METHOD, "signerVersion")?,
            METHOD,
            "signerVersion",
        )?;
        let timestamp = as_u64(required(sig, METHOD, "timestamp")?, METHOD, "timestamp")?;
        let transaction_hash = as_hash(
            required(sig, METHOD, "transactionHash")?,
            METHOD,
            "transactionHash",
        )?;

        Ok(Self {
            receipt,
            signature: SignatureJson {
                signature_type,
                public_key,
                signature,
                signer,
                signer_version,
                timestamp,
                transaction_hash,
            },
        })
    }
}

fn hex_field(value: &Value, method: &str, name: &str) -> Result<Vec<u8>, RpcError> {
    let s = as_str(required(value, method, name)?, method, name)?;
    hex::decode(s.trim_start_matches("0x")).map_err(|_| RpcError::InvalidResponse {
        method: method.to_string(),
        field: name.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn chain_entry_tolerates_case_variation() {
        let entry_hash = Hash::from_bytes(b"entry");
        let start = Hash::from_bytes(b"start");
        let anchor = Hash::from_bytes(b"anchor");
        let body = json!({
            "chainEntry": { "entry": entry_hash.to_hex() },
            "Receipt": {
                "start": start.to_hex(),
                "anchor": anchor.to_hex(),
                "localBlock": 42,
                "entries": [],
            },
            "message": { "id": "tx-1", "type": "transaction" },
        });

        let parsed = ChainEntryResult::from_json(&body).unwrap();
        assert_eq!(parsed.entry_hash, entry_hash);
        assert_eq!(parsed.receipt.local_block, 42);
        assert_eq!(parsed.message_id, "tx-1");
    }

    #[test]
    fn missing_required_field_is_invalid_response() {
        let body = json!({ "chainEntry": {} });
        let err = ChainEntryResult::from_json(&body).unwrap_err();
        assert!(matches!(err, RpcError::InvalidResponse { .. }));
    }

    #[test]
    fn unknown_fields_are_ignored() {
        let body = json!({
            "count": 7,
            "somethingTheNodeAddedLater": { "nested": true },
        });
        let parsed = SignatureChainCountResult::from_json(&body).unwrap();
        assert_eq!(parsed.count, 7);
    }
}
