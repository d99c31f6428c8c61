//! CLI commands implementation

use anyhow::{bail, Result};
use nsxlb_balancer::{LoadBalancerClass, LoadBalancerClasses, Mapping, MemoryAccess, ObjectName};
use nsxlb_core::{size_to_max_virtual_servers, LbConfig, Tag};
use serde::Serialize;

/// Class summary for output
#[derive(Debug, Serialize)]
pub struct ClassResponse {
    pub name: String,
    pub ip_pool_id: String,
    pub ip_pool_name: Option<String>,
    pub tags: Vec<Tag>,
}

impl From<&LoadBalancerClass> for ClassResponse {
    fn from(class: &LoadBalancerClass) -> Self {
        Self {
            name: class.name().to_string(),
            ip_pool_id: class.ip_pool_id().to_string(),
            ip_pool_name: class.ip_pool_name().map(str::to_string),
            tags: class.tags().to_vec(),
        }
    }
}

/// Registry summary for output
#[derive(Debug, Serialize)]
pub struct ClassesResponse {
    pub size: String,
    pub max_virtual_servers: usize,
    pub classes: Vec<ClassResponse>,
}

/// Build an in-memory backend holding the given IP pools
pub async fn offline_backend(config: &LbConfig, ip_pools: &[(String, String)]) -> MemoryAccess {
    let size = &config.load_balancer.size;
    let access = MemoryAccess::new(
        size.clone(),
        size_to_max_virtual_servers(size).unwrap_or_default(),
    );
    for (name, id) in ip_pools {
        access.add_ip_pool(name, id).await;
    }
    access
}

/// Show the resolved load balancer classes
pub async fn classes(access: &MemoryAccess, config: &LbConfig, json: bool) -> Result<()> {
    let registry = LoadBalancerClasses::setup(access, config).await?;

    let response = ClassesResponse {
        size: registry.size().to_string(),
        max_virtual_servers: registry.max_virtual_servers(),
        classes: registry
            .class_names()
            .into_iter()
            .filter_map(|name| registry.get_class(name))
            .map(ClassResponse::from)
            .collect(),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&response)?);
        return Ok(());
    }

    println!(
        "Size: {} (max {} virtual servers per load balancer service)",
        response.size, response.max_virtual_servers
    );
    println!();
    println!("{:<20} {:<38} {:<20}", "CLASS", "IP POOL ID", "IP POOL NAME");
    println!("{}", "-".repeat(78));
    for class in &response.classes {
        println!(
            "{:<20} {:<38} {:<20}",
            class.name,
            class.ip_pool_id,
            class.ip_pool_name.as_deref().unwrap_or("-")
        );
    }

    Ok(())
}

/// Show the tags of the virtual server for a Service port
pub async fn tags(
    access: &MemoryAccess,
    config: &LbConfig,
    cluster: &str,
    service: &ObjectName,
    mapping: &Mapping,
    class_name: &str,
    json: bool,
) -> Result<()> {
    let registry = LoadBalancerClasses::setup(access, config).await?;
    let Some(class) = registry.get_class(class_name) else {
        bail!("unknown LoadBalancerClass {}", class_name);
    };

    let tags = class
        .virtual_server_tags(cluster, service, mapping)
        .normalize();

    if json {
        println!("{}", serde_json::to_string_pretty(&tags)?);
        return Ok(());
    }

    println!("Virtual server {} for {}:", mapping, service);
    for tag in &tags {
        println!("  {:<10} {}", tag.scope, tag.value);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use nsxlb_balancer::Protocol;

    fn config() -> LbConfig {
        LbConfig::from_toml(
            r#"
[load_balancer]
size = "MEDIUM"
ip_pool_name = "pool-a"

[[load_balancer_class]]
name = "public"
ip_pool_id = "id-public"
"#,
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_offline_backend_resolves_pools() {
        let cfg = config();
        let access = offline_backend(&cfg, &[("pool-a".to_string(), "id-a".to_string())]).await;
        let registry = LoadBalancerClasses::setup(&access, &cfg).await.unwrap();

        assert_eq!(registry.max_virtual_servers(), 100);
        let response: Vec<ClassResponse> = registry
            .class_names()
            .into_iter()
            .filter_map(|name| registry.get_class(name))
            .map(ClassResponse::from)
            .collect();
        assert_eq!(response.len(), 2);
        assert_eq!(response[0].name, "default");
        assert_eq!(response[0].ip_pool_id, "id-a");
        assert_eq!(response[1].name, "public");
    }

    #[tokio::test]
    async fn test_classes_fails_without_pool() {
        let cfg = config();
        let access = offline_backend(&cfg, &[]).await;
        assert!(classes(&access, &cfg, false).await.is_err());
    }

    #[tokio::test]
    async fn test_tags_unknown_class() {
        let cfg = config();
        let access = offline_backend(&cfg, &[("pool-a".to_string(), "id-a".to_string())]).await;
        let mapping = Mapping {
            source_port: 80,
            node_port: 30080,
            protocol: Protocol::Tcp,
        };

        let result = tags(
            &access,
            &cfg,
            "prod",
            &ObjectName::new("default", "web"),
            &mapping,
            "missing",
            false,
        )
        .await;
        assert!(result.is_err());
    }
}
