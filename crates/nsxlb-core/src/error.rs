//! Error types for nsxlb

use thiserror::Error;

/// Main error type for nsxlb
#[derive(Error, Debug)]
pub enum NsxlbError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Load balancer size not present in the size table
    #[error("invalid load balancer size {0}")]
    InvalidSize(String),

    /// Two classes registered under the same name
    #[error("duplicate LoadBalancerClass {0}")]
    DuplicateClass(String),

    /// A class could not be registered
    #[error("invalid LoadBalancerClass {class}: {source}")]
    InvalidClass {
        class: String,
        #[source]
        source: Box<NsxlbError>,
    },

    /// An externally provisioned load balancer service is missing
    #[error("no more virtual servers for load balancer service")]
    NoVirtualServerCapacity,

    /// IP pool lookup by name failed
    #[error("IP pool not found: {0}")]
    IpPoolNotFound(String),

    /// Load balancer service not found
    #[error("Load balancer service not found: {0}")]
    LbServiceNotFound(String),

    /// Error reported by the load balancer backend
    #[error("Backend error: {0}")]
    Backend(String),

    /// Malformed `namespace/name` identifier
    #[error("invalid object name {0:?}: expected namespace/name")]
    InvalidObjectName(String),

    /// Service port that cannot be expressed as a mapping
    #[error("invalid service port: {0}")]
    InvalidServicePort(String),

    /// Unknown port protocol
    #[error("invalid protocol {0}")]
    InvalidProtocol(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl NsxlbError {
    /// Whether a reconciliation that hit this error should be requeued.
    ///
    /// Capacity and backend failures may resolve on their own; configuration
    /// and input errors will not, including a class whose IP pool lookup
    /// failed during setup.
    pub fn is_retryable(&self) -> bool {
        match self {
            NsxlbError::NoVirtualServerCapacity
            | NsxlbError::IpPoolNotFound(_)
            | NsxlbError::LbServiceNotFound(_)
            | NsxlbError::Backend(_)
            | NsxlbError::Io(_) => true,
            _ => false,
        }
    }
}

/// Result type for nsxlb operations
pub type NsxlbResult<T> = Result<T, NsxlbError>;

impl From<serde_json::Error> for NsxlbError {
    fn from(err: serde_json::Error) -> Self {
        NsxlbError::Serialization(err.to_string())
    }
}

impl From<toml::de::Error> for NsxlbError {
    fn from(err: toml::de::Error) -> Self {
        NsxlbError::Config(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = NsxlbError::InvalidSize("HUGE".to_string());
        assert_eq!(err.to_string(), "invalid load balancer size HUGE");

        let err = NsxlbError::NoVirtualServerCapacity;
        assert_eq!(
            err.to_string(),
            "no more virtual servers for load balancer service"
        );
    }

    #[test]
    fn test_invalid_class_names_class_and_cause() {
        let err = NsxlbError::InvalidClass {
            class: "public".to_string(),
            source: Box::new(NsxlbError::IpPoolNotFound("pool-x".to_string())),
        };
        assert_eq!(
            err.to_string(),
            "invalid LoadBalancerClass public: IP pool not found: pool-x"
        );
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_retryable_classification() {
        assert!(NsxlbError::NoVirtualServerCapacity.is_retryable());
        assert!(NsxlbError::Backend("timeout".to_string()).is_retryable());
        assert!(!NsxlbError::DuplicateClass("a".to_string()).is_retryable());
        assert!(!NsxlbError::InvalidSize("x".to_string()).is_retryable());

        let err = NsxlbError::InvalidClass {
            class: "typo".to_string(),
            source: Box::new(NsxlbError::IpPoolNotFound("pool-tyop".to_string())),
        };
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: NsxlbError = io_err.into();
        assert!(matches!(err, NsxlbError::Io(_)));
    }
}
