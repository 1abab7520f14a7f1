use thiserror::Error;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("upstream returned status {status}")]
    Status { status: u16 },

    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

impl FetchError {
    /// Whether a retry may succeed: transient server statuses and
    /// connection-level transport failures. Everything else propagates
    /// immediately.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Status { status } => matches!(*status, 429 | 500 | 502 | 503 | 504),
            Self::Network(err) => err.is_timeout() || err.is_connect() || err.is_body(),
            Self::InvalidResponse(_) => false,
        }
    }
}

#[derive(Debug, Error)]
pub enum LookupError {
    #[error("display name must not be empty")]
    EmptyDisplayName,

    #[error("timeout must be between {min} and {max} seconds, got {got}")]
    TimeoutOutOfRange { min: u64, max: u64, got: u64 },
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(429, true)]
    #[case(500, true)]
    #[case(502, true)]
    #[case(503, true)]
    #[case(504, true)]
    #[case(400, false)]
    #[case(401, false)]
    #[case(404, false)]
    #[case(501, false)]
    fn status_retryability_matches_policy(#[case] status: u16, #[case] expected: bool) {
        assert_eq!(FetchError::Status { status }.is_retryable(), expected);
    }

    #[test]
    fn invalid_response_is_never_retried() {
        assert!(!FetchError::InvalidResponse("bad json".into()).is_retryable());
    }

    #[tokio::test]
    async fn connection_refused_is_retryable() {
        // Grab a free port and release it so nothing is listening there
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let err = reqwest::Client::new()
            .get(format!("http://{addr}/"))
            .send()
            .await
            .unwrap_err();

        assert!(err.is_connect());
        assert!(FetchError::Network(err).is_retryable());
    }

    #[tokio::test]
    async fn malformed_request_errors_are_not_retryable() {
        let err = reqwest::Client::new()
            .get("http://[invalid")
            .send()
            .await
            .unwrap_err();

        assert!(!err.is_connect());
        assert!(!FetchError::Network(err).is_retryable());
    }
}
