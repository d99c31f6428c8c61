//! Service identity and node address helpers

use k8s_openapi::api::core::v1::{Node, Service};
use nsxlb_core::NsxlbError;
use std::collections::HashMap;
use std::str::FromStr;

const NODE_INTERNAL_IP: &str = "InternalIP";

/// Namespace/name pair identifying a Service
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectName {
    pub namespace: String,
    pub name: String,
}

impl ObjectName {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
        }
    }

    /// Identity of a Service object
    pub fn from_service(service: &Service) -> Self {
        Self {
            namespace: service.metadata.namespace.clone().unwrap_or_default(),
            name: service.metadata.name.clone().unwrap_or_default(),
        }
    }
}

impl std::fmt::Display for ObjectName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}

impl FromStr for ObjectName {
    type Err = NsxlbError;

    /// Parse `namespace/name`; anything but exactly one `/` is rejected
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once('/') {
            Some((namespace, name)) if !name.contains('/') => Ok(Self::new(namespace, name)),
            _ => Err(NsxlbError::InvalidObjectName(s.to_string())),
        }
    }
}

/// Map of node internal IP address to node name.
///
/// Only the first internal address of each node is taken.
pub fn collect_node_internal_addresses(nodes: &[Node]) -> HashMap<String, String> {
    let mut set = HashMap::new();
    for node in nodes {
        let name = node.metadata.name.clone().unwrap_or_default();
        let addresses = node
            .status
            .as_ref()
            .and_then(|status| status.addresses.as_ref());
        if let Some(addr) = addresses
            .into_iter()
            .flatten()
            .find(|addr| addr.type_ == NODE_INTERNAL_IP)
        {
            set.insert(addr.address.clone(), name);
        }
    }
    set
}
