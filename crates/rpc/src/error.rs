//! Errors from talking to the remote source-ledger node.

/// Failure modes for a remote-node query.
#[derive(Debug, Clone, thiserror::Error)]
pub enum RpcError {
    /// The call did not complete before its deadline.
    #[error("rpc call to {method} timed out after {elapsed_ms}ms")]
    Timeout {
        /// JSON-RPC method name.
        method: String,
        /// Elapsed time before the deadline fired.
        elapsed_ms: u64,
    },

    /// The transport failed (connection refused, DNS failure, TLS error, ...).
    #[error("rpc transport error calling {method}: {source}")]
    Transport {
        /// JSON-RPC method name.
        method: String,
        /// Underlying transport error rendered as a string (kept `Send` and
        /// `'static` without pinning to `reqwest`'s error type in the public
        /// surface).
        source: String,
    },

    /// The node responded, but the response was JSON-RPC-shaped but carried
    /// an `error` field.
    #[error("rpc error from node calling {method}: code={code} message={message}")]
    NodeError {
        /// JSON-RPC method name.
        method: String,
        /// Node-reported error code.
        code: i64,
        /// Node-reported error message.
        message: String,
    },

    /// The response was valid JSON but did not contain a field this query
    /// kind requires, or a field had the wrong shape.
    #[error("invalid response from {method}: missing or malformed field `{field}`")]
    InvalidResponse {
        /// JSON-RPC method name.
        method: String,
        /// Name of the offending field.
        field: String,
    },
}

impl RpcError {
    /// Availability failures (timeouts, transport errors) are retryable per
    /// §7; node-level and shape errors are not.
    pub fn is_retryable(&self) -> bool {
        matches!(self, RpcError::Timeout { .. } | RpcError::Transport { .. })
    }
}
