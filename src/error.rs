use thiserror::Error;

/// Uniform error definition for every query operation.
#[derive(Error, Debug)]
pub enum StatErr {
    /// No terminal response arrived within the configured window.
    #[error("server query timed out for server {host}")]
    Timeout { host: String },
    /// Socket or connection failure at any stage, including send failures.
    #[error("{0}")]
    IoErr(#[from] std::io::Error),
    /// Wire-level violations: malformed VarInts, unusable challenge tokens, bad frames.
    #[error("{0}")]
    ProtocolErr(String),
    /// The server answered, but the payload could not be decoded.
    #[error("{0}")]
    DecodeErr(String),
    /// The status was answered by a masking reverse proxy and is unreliable.
    #[error("server is running behind {0}")]
    ProxyDetected(String),
    /// Invalid caller supplied data, such as a malformed address.
    #[error("{0}")]
    DataErr(String),
}

impl StatErr {
    pub(crate) fn timeout(host: &str) -> Self {
        Self::Timeout { host: host.into() }
    }

    /// Whether the error came from the deadline expiring.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_names_host() {
        let err = StatErr::timeout("mc.example.com");

        assert!(err.is_timeout());
        assert!(err.to_string().contains("mc.example.com"));
    }

    #[test]
    fn test_io_error_converts() {
        let err: StatErr =
            std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused").into();

        assert!(matches!(err, StatErr::IoErr(_)));
        assert!(!err.is_timeout());
    }

    #[test]
    fn test_proxy_display() {
        let err = StatErr::ProxyDetected("TCPShield.com".into());

        assert_eq!(err.to_string(), "server is running behind TCPShield.com");
    }
}
