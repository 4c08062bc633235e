use std::time::Duration;
use thiserror::Error;

/// Failures surfaced by the query engine and the client facade
///
/// Per-region AWS errors only appear here under
/// [`FailurePolicy::FailFast`](super::FailurePolicy::FailFast); under
/// `WaitForDeadline` they are logged and the call ends in
/// [`QueryError::DeadlineExceeded`].
#[derive(Debug, Error)]
pub enum QueryError {
    #[error("service not supported: {service}")]
    UnsupportedService { service: String },

    #[error("resource '{resource}' not supported in {service} service")]
    UnsupportedResource { service: String, resource: String },

    #[error(
        "{service}/{resource}: deadline exceeded after {timeout:?} with {pending} region(s) not reported"
    )]
    DeadlineExceeded {
        service: String,
        resource: String,
        timeout: Duration,
        pending: usize,
    },

    #[error("{service}/{resource}: query failed in region {region}")]
    RegionFailed {
        service: String,
        resource: String,
        region: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("client was built for service '{expected}', not '{requested}'")]
    ServiceMismatch { expected: String, requested: String },

    #[error("failed to serialize results: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl QueryError {
    /// True when the call ran out of time rather than failing outright
    pub fn is_deadline(&self) -> bool {
        matches!(self, QueryError::DeadlineExceeded { .. })
    }
}
