use thiserror::Error;

#[derive(Debug, Error)]
pub enum CloudError {
    #[error("request timed out: {0}")]
    Timeout(String),

    #[error("connection reset: {0}")]
    ConnectionReset(String),

    #[error("request failed: {status}, {body}")]
    Api { status: u16, body: String },

    #[error("failed to decode response: {0}")]
    Decode(String),

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("push to {channel} failed: {reason}")]
    Push { channel: String, reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl CloudError {
    /// Connection-level failures leave the remote session unusable for every
    /// account that follows, so the batch must stop.
    pub fn is_fatal(&self) -> bool {
        matches!(self, CloudError::Timeout(_) | CloudError::ConnectionReset(_))
    }
}

impl From<reqwest::Error> for CloudError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            return CloudError::Timeout(e.to_string());
        }
        match io_kind(&e) {
            Some(std::io::ErrorKind::TimedOut) => CloudError::Timeout(e.to_string()),
            Some(std::io::ErrorKind::ConnectionReset | std::io::ErrorKind::ConnectionAborted) => {
                CloudError::ConnectionReset(e.to_string())
            }
            _ if e.is_decode() => CloudError::Decode(e.to_string()),
            _ => CloudError::Http(e.to_string()),
        }
    }
}

/// Walk the source chain looking for the underlying socket error.
fn io_kind(e: &(dyn std::error::Error + 'static)) -> Option<std::io::ErrorKind> {
    let mut current = Some(e);
    while let Some(err) = current {
        if let Some(io) = err.downcast_ref::<std::io::Error>() {
            return Some(io.kind());
        }
        current = err.source();
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_connection_errors_are_fatal() {
        assert!(CloudError::Timeout("t".into()).is_fatal());
        assert!(CloudError::ConnectionReset("r".into()).is_fatal());
        assert!(!CloudError::Api {
            status: 500,
            body: "boom".into()
        }
        .is_fatal());
        assert!(!CloudError::Http("dns".into()).is_fatal());
    }

    #[test]
    fn io_kind_finds_nested_io_error() {
        #[derive(Debug)]
        struct Wrapper(std::io::Error);
        impl std::fmt::Display for Wrapper {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "wrapped")
            }
        }
        impl std::error::Error for Wrapper {
            fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
                Some(&self.0)
            }
        }

        let err = Wrapper(std::io::Error::from(std::io::ErrorKind::ConnectionReset));
        assert_eq!(io_kind(&err), Some(std::io::ErrorKind::ConnectionReset));
    }

    #[test]
    fn api_error_display_matches_log_format() {
        let err = CloudError::Api {
            status: 403,
            body: "denied".into(),
        };
        assert_eq!(err.to_string(), "request failed: 403, denied");
    }
}
