//! Tag and load balancer backend record definitions

use serde::{Deserialize, Serialize};

/// Scope of the tag identifying the owning controller instance
pub const SCOPE_OWNER: &str = "owner";
/// Scope of the tag identifying the Kubernetes cluster
pub const SCOPE_CLUSTER: &str = "cluster";
/// Scope of the tag identifying the Service as `namespace/name`
pub const SCOPE_SERVICE: &str = "service";
/// Scope of the tag identifying the Service port as `protocol/port`
pub const SCOPE_PORT: &str = "port";
/// Scope of the tag identifying the IP pool
pub const SCOPE_IP_POOL_ID: &str = "ippoolid";
/// Scope of the tag identifying the load balancer class
pub const SCOPE_LB_CLASS: &str = "lbclass";

/// A scope/value metadata pair attached to a backend object
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Tag {
    /// Correlation dimension
    pub scope: String,
    /// Identifier within that dimension
    #[serde(rename = "tag")]
    pub value: String,
}

impl Tag {
    /// Create a new tag
    pub fn new(scope: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            scope: scope.into(),
            value: value.into(),
        }
    }
}

impl std::fmt::Display for Tag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}={}", self.scope, self.value)
    }
}

/// Virtual server listening on one port/protocol
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VirtualServer {
    pub id: String,
    pub display_name: String,
    /// Listener port as a decimal string
    pub port: String,
    /// IP protocol (TCP, UDP)
    pub ip_protocol: String,
    /// Port of the pool members traffic is forwarded to
    pub default_pool_member_port: String,
    pub pool_id: Option<String>,
    pub ip_address: Option<String>,
    pub tags: Vec<Tag>,
}

/// Backend server pool
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pool {
    pub id: String,
    pub display_name: String,
    /// Member IP addresses
    pub members: Vec<String>,
    pub tags: Vec<Tag>,
}

/// Active TCP health monitor
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TcpMonitor {
    pub id: String,
    pub display_name: String,
    pub monitor_port: Option<String>,
    pub tags: Vec<Tag>,
}

/// Load balancer service aggregating virtual servers
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LbService {
    pub id: String,
    pub display_name: String,
    pub size: String,
    /// Attached virtual server ids, in attach order
    pub virtual_server_ids: Vec<String>,
    pub tags: Vec<Tag>,
}

impl LbService {
    /// Whether no virtual server is attached
    pub fn is_empty(&self) -> bool {
        self.virtual_server_ids.is_empty()
    }

    /// Whether the given virtual server is attached
    pub fn contains(&self, virtual_server_id: &str) -> bool {
        self.virtual_server_ids.iter().any(|id| id == virtual_server_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_display() {
        let tag = Tag::new(SCOPE_CLUSTER, "prod");
        assert_eq!(tag.to_string(), "cluster=prod");
    }

    #[test]
    fn test_tag_serialization_uses_backend_field_names() {
        let tag = Tag::new(SCOPE_PORT, "TCP/80");
        let json = serde_json::to_value(&tag).unwrap();
        assert_eq!(json, serde_json::json!({"scope": "port", "tag": "TCP/80"}));
    }

    #[test]
    fn test_lb_service_membership() {
        let svc = LbService {
            id: "lbs-1".to_string(),
            virtual_server_ids: vec!["vs-1".to_string(), "vs-2".to_string()],
            ..Default::default()
        };
        assert!(svc.contains("vs-2"));
        assert!(!svc.contains("vs-3"));
        assert!(!svc.is_empty());
        assert!(LbService::default().is_empty());
    }
}
