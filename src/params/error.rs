use thiserror::Error;

#[derive(Debug, Error)]
pub enum CallError {
    /// Dependency unreachable, or the endpoint's breaker is open.
    #[error("connectivity error: {0}")]
    Connectivity(String),

    /// 5xx response — counted by the circuit breaker.
    #[error("upstream server error: status {status}")]
    UpstreamServer { status: u16 },

    /// Non-success, non-5xx response — returned to the caller but never
    /// counted by the circuit breaker.
    #[error("upstream client error: status {status}")]
    UpstreamClient { status: u16 },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("invalid HTTP method: {0}")]
    InvalidMethod(String),
}

impl CallError {
    pub fn is_connectivity(&self) -> bool {
        matches!(self, CallError::Connectivity(_))
    }
}
