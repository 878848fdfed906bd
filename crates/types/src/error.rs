//! Shared error taxonomy (§7) and wrapped-error shape (§9).

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Broad error taxonomy a caller can match on without inspecting the message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum ErrorCode {
    /// Malformed input: bad URL, wrong-length hex, off-size key/signature.
    InputValidation,
    /// Hash mismatch, receipt stitch failure, signature verification failure,
    /// threshold unmet.
    CryptographicFailure,
    /// Signature timing violation, height mismatch, voting power below ⅔.
    TemporalOrConsensus,
    /// RPC timeout, peer unreachable, target-chain connection failure.
    Availability,
    /// An invariant that should be impossible was violated.
    Internal,
    /// Deprecated endpoint, quota/rate exceeded, not implemented.
    Policy,
}

/// A wrapped error carrying a code, message, optional detail, a context map,
/// an optional cause, and a timestamp (§9: "Error chains → sum-type with
/// optional cause").
///
/// Stack capture is deliberately not modeled here: §9 calls it "optional,
/// policy-driven, never on hot paths" and no component in this spec needs it
/// for correctness, so it is left to whatever ambient logging layer a
/// deployment wires in via `tracing`.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ErrorContext {
    /// Broad taxonomy code.
    pub code: ErrorCode,
    /// Short, stable message safe to render to any audience.
    pub message: String,
    /// Optional one-line detail with more specifics.
    pub details: Option<String>,
    /// Arbitrary structured context (e.g. `batch_id`, `validator_id`).
    pub context: BTreeMap<String, String>,
    /// Whether this failure is safe to retry per §7's retry policy.
    pub retryable: bool,
    /// RFC 3339 timestamp of when the error was constructed.
    pub timestamp: chrono::DateTime<chrono::Utc>,
    /// The underlying cause, if this error wraps another.
    #[serde(skip)]
    pub cause: Option<Arc<ErrorContext>>,
}

impl ErrorContext {
    /// Start building a new error context.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
            context: BTreeMap::new(),
            retryable: false,
            timestamp: chrono::Utc::now(),
            cause: None,
        }
    }

    /// Attach a one-line detail.
    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.details = Some(detail.into());
        self
    }

    /// Attach a context key/value pair.
    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }

    /// Mark this error as retryable per §7's availability-failure policy.
    pub fn retryable(mut self) -> Self {
        self.retryable = true;
        self
    }

    /// Chain a cause underneath this error.
    pub fn caused_by(mut self, cause: ErrorContext) -> Self {
        self.cause = Some(Arc::new(cause));
        self
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}: {}", self.code, self.message)?;
        if let Some(detail) = &self.details {
            write!(f, " ({detail})")?;
        }
        Ok(())
    }
}

impl std::error::Error for ErrorContext {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.cause.as_deref().map(|c| c as &(dyn std::error::Error + 'static))
    }
}

/// Exponential backoff retry policy (§7): `factor·2^attempt`, default
/// `factor = 1s`, default 3 attempts, only on whitelisted error kinds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    /// Base backoff factor.
    pub factor: std::time::Duration,
    /// Maximum number of attempts (including the first).
    pub max_attempts: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            factor: std::time::Duration::from_secs(1),
            max_attempts: 3,
        }
    }
}

impl RetryPolicy {
    /// Backoff delay before the given attempt number (0-indexed: the retry
    /// following the first failure is attempt 0).
    pub fn backoff(&self, attempt: u32) -> std::time::Duration {
        self.factor * 2u32.saturating_pow(attempt)
    }

    /// Whether a given error kind is on the retry whitelist: timeouts and
    /// network disconnects (availability failures), never cryptographic or
    /// invariant failures.
    pub fn should_retry(&self, code: ErrorCode, attempt: u32) -> bool {
        attempt + 1 < self.max_attempts && code == ErrorCode::Availability
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_grows_exponentially() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.backoff(0), std::time::Duration::from_secs(1));
        assert_eq!(policy.backoff(1), std::time::Duration::from_secs(2));
        assert_eq!(policy.backoff(2), std::time::Duration::from_secs(4));
    }

    #[test]
    fn only_availability_failures_are_retryable() {
        let policy = RetryPolicy::default();
        assert!(policy.should_retry(ErrorCode::Availability, 0));
        assert!(!policy.should_retry(ErrorCode::CryptographicFailure, 0));
        assert!(!policy.should_retry(ErrorCode::Availability, 2));
    }

    #[test]
    fn cause_chain_is_preserved() {
        let root = ErrorContext::new(ErrorCode::Availability, "rpc timeout").retryable();
        let wrapped = ErrorContext::new(ErrorCode::Internal, "state prover failed")
            .caused_by(root.clone());
        assert_eq!(wrapped.cause.unwrap().message, root.message);
    }
}
