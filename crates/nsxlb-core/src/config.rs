//! Configuration types for nsxlb

use serde::{Deserialize, Serialize};

/// Name of the class every virtual server falls back to
pub const DEFAULT_LOAD_BALANCER_CLASS: &str = "default";

/// Load balancer sizes understood by the backend
pub const SIZE_SMALL: &str = "SMALL";
pub const SIZE_MEDIUM: &str = "MEDIUM";
pub const SIZE_LARGE: &str = "LARGE";
pub const SIZE_XLARGE: &str = "XLARGE";

const SIZE_TO_MAX_VIRTUAL_SERVERS: &[(&str, usize)] = &[
    (SIZE_SMALL, 10),
    (SIZE_MEDIUM, 100),
    (SIZE_LARGE, 1000),
    (SIZE_XLARGE, 3000),
];

/// Maximum number of virtual servers a load balancer service of the given
/// size can hold, or `None` for an unknown size
pub fn size_to_max_virtual_servers(size: &str) -> Option<usize> {
    SIZE_TO_MAX_VIRTUAL_SERVERS
        .iter()
        .find(|(name, _)| *name == size)
        .map(|(_, max)| *max)
}

/// Top-level load balancer configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LbConfig {
    /// Global load balancer settings
    #[serde(default)]
    pub load_balancer: LoadBalancerConfig,
    /// Named load balancer classes, in declaration order
    #[serde(default, rename = "load_balancer_class")]
    pub load_balancer_classes: Vec<LoadBalancerClassConfig>,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl LbConfig {
    /// Load configuration from a TOML file
    pub fn from_file(path: &std::path::Path) -> Result<Self, crate::NsxlbError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            crate::NsxlbError::Config(format!("Failed to read config file: {}", e))
        })?;
        Self::from_toml(&content)
    }

    /// Parse configuration from a TOML document
    pub fn from_toml(content: &str) -> Result<Self, crate::NsxlbError> {
        toml::from_str(content)
            .map_err(|e| crate::NsxlbError::Config(format!("Failed to parse config: {}", e)))
    }

    /// Look up a configured class by name
    pub fn class(&self, name: &str) -> Option<&LoadBalancerClassConfig> {
        self.load_balancer_classes.iter().find(|c| c.name == name)
    }
}

/// Global load balancer settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoadBalancerConfig {
    /// Load balancer service size (SMALL, MEDIUM, LARGE, XLARGE)
    #[serde(default = "default_size")]
    pub size: String,
    /// IP pool name used by the default class
    #[serde(default)]
    pub ip_pool_name: Option<String>,
    /// IP pool id used by the default class
    #[serde(default)]
    pub ip_pool_id: Option<String>,
    /// Id of an externally provisioned load balancer service
    #[serde(default)]
    pub lb_service_id: Option<String>,
}

fn default_size() -> String {
    SIZE_SMALL.to_string()
}

impl Default for LoadBalancerConfig {
    fn default() -> Self {
        Self {
            size: default_size(),
            ip_pool_name: None,
            ip_pool_id: None,
            lb_service_id: None,
        }
    }
}

impl LoadBalancerConfig {
    /// The configured load balancer service id, ignoring empty values
    pub fn lb_service_id(&self) -> Option<&str> {
        non_empty(&self.lb_service_id)
    }
}

/// A named load balancer class
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadBalancerClassConfig {
    /// Class name
    #[serde(default)]
    pub name: String,
    /// IP pool name to allocate virtual server addresses from
    #[serde(default)]
    pub ip_pool_name: Option<String>,
    /// IP pool id, takes precedence over the name
    #[serde(default)]
    pub ip_pool_id: Option<String>,
}

impl LoadBalancerClassConfig {
    /// IP pool name, ignoring empty values
    pub fn pool_name(&self) -> Option<&str> {
        non_empty(&self.ip_pool_name)
    }

    /// IP pool id, ignoring empty values
    pub fn pool_id(&self) -> Option<&str> {
        non_empty(&self.ip_pool_id)
    }

    /// Whether the class references any IP pool
    pub fn has_pool(&self) -> bool {
        self.pool_name().is_some() || self.pool_id().is_some()
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}
