//! Load balancer classes
//!
//! A class binds virtual servers to the IP pool their addresses are allocated
//! from. Classes are resolved once at startup; any invalid entry aborts the
//! whole setup.

use nsxlb_core::{
    size_to_max_virtual_servers, LbConfig, LoadBalancerClassConfig, NsxlbError, NsxlbResult, Tag,
    DEFAULT_LOAD_BALANCER_CLASS,
};
use std::collections::HashMap;
use tracing::{debug, info};

use crate::access::Access;
use crate::helpers::ObjectName;
use crate::mapping::Mapping;
use crate::tags::{class_tag, cluster_tag, ip_pool_tag, port_tag, service_tag, TagSet};

/// A resolved load balancer class
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadBalancerClass {
    class_name: String,
    ip_pool_name: Option<String>,
    ip_pool_id: String,
    tags: Vec<Tag>,
}

impl LoadBalancerClass {
    fn new(class_name: &str, ip_pool_id: String, ip_pool_name: Option<String>) -> Self {
        let tags = TagSet::new()
            .add([ip_pool_tag(&ip_pool_id), class_tag(class_name)])
            .normalize();
        Self {
            class_name: class_name.to_string(),
            ip_pool_name,
            ip_pool_id,
            tags,
        }
    }

    pub fn name(&self) -> &str {
        &self.class_name
    }

    pub fn ip_pool_id(&self) -> &str {
        &self.ip_pool_id
    }

    pub fn ip_pool_name(&self) -> Option<&str> {
        self.ip_pool_name.as_deref()
    }

    /// Tags attached to every virtual server of this class
    pub fn tags(&self) -> &[Tag] {
        &self.tags
    }

    /// Full tag set of a virtual server serving `mapping` of a Service
    pub fn virtual_server_tags(
        &self,
        cluster_name: &str,
        object_name: &ObjectName,
        mapping: &Mapping,
    ) -> TagSet {
        TagSet::new()
            .add([
                cluster_tag(cluster_name),
                service_tag(object_name),
                port_tag(mapping),
            ])
            .add(self.tags.iter().cloned())
    }
}

/// Registry of load balancer classes
#[derive(Debug)]
pub struct LoadBalancerClasses {
    /// Load balancer service size
    size: String,
    /// Virtual servers a load balancer service of that size can hold
    max_virtual_servers: usize,
    /// Classes indexed by name
    classes: HashMap<String, LoadBalancerClass>,
}

impl LoadBalancerClasses {
    /// Resolve all configured classes.
    ///
    /// The default class is always present. When the configuration does not
    /// define it, it is built from the top-level IP pool settings. Classes
    /// without an IP pool inherit the default class pool.
    pub async fn setup(access: &dyn Access, config: &LbConfig) -> NsxlbResult<Self> {
        let size = &config.load_balancer.size;
        let max_virtual_servers =
            size_to_max_virtual_servers(size).ok_or_else(|| NsxlbError::InvalidSize(size.clone()))?;

        let mut lb_classes = Self {
            size: size.clone(),
            max_virtual_servers,
            classes: HashMap::new(),
        };

        let mut default_config = LoadBalancerClassConfig {
            name: DEFAULT_LOAD_BALANCER_CLASS.to_string(),
            ip_pool_name: config.load_balancer.ip_pool_name.clone(),
            ip_pool_id: config.load_balancer.ip_pool_id.clone(),
        };
        match config.class(DEFAULT_LOAD_BALANCER_CLASS) {
            Some(explicit) => {
                if explicit.has_pool() {
                    default_config = explicit.clone();
                }
            }
            None => {
                lb_classes
                    .add(access, DEFAULT_LOAD_BALANCER_CLASS, &default_config, &default_config)
                    .await?;
            }
        }

        for class_config in &config.load_balancer_classes {
            if class_config.name.is_empty() {
                return Err(NsxlbError::Config(
                    "LoadBalancerClass without name".to_string(),
                ));
            }
            if lb_classes.classes.contains_key(&class_config.name) {
                return Err(NsxlbError::DuplicateClass(class_config.name.clone()));
            }
            lb_classes
                .add(access, &class_config.name, class_config, &default_config)
                .await?;
        }

        info!(
            size = %lb_classes.size,
            max_virtual_servers = lb_classes.max_virtual_servers,
            classes = lb_classes.classes.len(),
            "Load balancer classes set up"
        );

        Ok(lb_classes)
    }

    async fn add(
        &mut self,
        access: &dyn Access,
        name: &str,
        class_config: &LoadBalancerClassConfig,
        default_config: &LoadBalancerClassConfig,
    ) -> NsxlbResult<()> {
        if !class_config.has_pool() {
            if let Some(default) = self.classes.get(DEFAULT_LOAD_BALANCER_CLASS) {
                let ip_pool_id = default.ip_pool_id.clone();
                let ip_pool_name = default.ip_pool_name.clone();
                debug!(
                    class = %name,
                    ip_pool_id = %ip_pool_id,
                    "Registered load balancer class with default pool"
                );
                self.classes.insert(
                    name.to_string(),
                    LoadBalancerClass::new(name, ip_pool_id, ip_pool_name),
                );
                return Ok(());
            }
        }

        let source = if class_config.has_pool() {
            class_config
        } else {
            default_config
        };
        let ip_pool_name = source.pool_name().map(str::to_string);
        let ip_pool_id = match (source.pool_id(), source.pool_name()) {
            (Some(id), _) => id.to_string(),
            (None, Some(pool_name)) => access
                .find_ip_pool_by_name(pool_name)
                .await
                .map_err(|e| invalid_class(name, e))?,
            (None, None) => {
                return Err(invalid_class(
                    name,
                    NsxlbError::Config("no IP pool configured".to_string()),
                ))
            }
        };

        debug!(class = %name, ip_pool_id = %ip_pool_id, "Registered load balancer class");

        self.classes.insert(
            name.to_string(),
            LoadBalancerClass::new(name, ip_pool_id, ip_pool_name),
        );
        Ok(())
    }

    /// Get a class by name
    pub fn get_class(&self, name: &str) -> Option<&LoadBalancerClass> {
        self.classes.get(name)
    }

    pub fn default_class(&self) -> Option<&LoadBalancerClass> {
        self.get_class(DEFAULT_LOAD_BALANCER_CLASS)
    }

    /// Names of all classes, sorted
    pub fn class_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.classes.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn size(&self) -> &str {
        &self.size
    }

    pub fn max_virtual_servers(&self) -> usize {
        self.max_virtual_servers
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}

fn invalid_class(name: &str, source: NsxlbError) -> NsxlbError {
    NsxlbError::InvalidClass {
        class: name.to_string(),
        source: Box::new(source),
    }
}
