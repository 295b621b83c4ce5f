use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum BridgeError {
    /// Network-level failure (connection, DNS, timeout).  Retryable against
    /// a freshly picked endpoint.
    #[error("transport error: {0}")]
    Transport(String),

    /// The server answered but refused the request.  Not retryable; the
    /// server's message is passed through.
    #[error("remote rejected the request: {0}")]
    RemoteRejected(String),

    /// The server answered with a body this client cannot interpret.
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// An endpoint pool was constructed from an empty list.
    #[error("endpoint pool cannot be empty")]
    NoEndpoints,
}

impl BridgeError {
    /// True for failures that are worth retrying against another endpoint.
    pub fn is_retryable(&self) -> bool {
        matches!(self, BridgeError::Transport(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_transport_failures_are_retryable() {
        assert!(BridgeError::Transport("timeout".into()).is_retryable());
        assert!(!BridgeError::RemoteRejected("bad signature".into()).is_retryable());
        assert!(!BridgeError::InvalidResponse("truncated body".into()).is_retryable());
        assert!(!BridgeError::NoEndpoints.is_retryable());
    }
}
