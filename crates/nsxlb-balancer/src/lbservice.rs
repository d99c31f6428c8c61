//! Shared load balancer service management
//!
//! Virtual servers are attached to a load balancer service on the backend.
//! When nsxlb owns the load balancer service it is created on the first
//! attach and deleted once the last virtual server is detached.

use nsxlb_core::{NsxlbError, NsxlbResult};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::access::Access;

/// One load balancer service slot of a cluster
pub struct ManagedLbService {
    access: Arc<dyn Access>,
    /// Whether nsxlb creates and deletes the load balancer service
    managed: bool,
    /// Id of the backing load balancer service, if known.
    ///
    /// Held for the whole find, modify, persist sequence of attach and detach.
    lb_service_id: Mutex<Option<String>>,
}

impl ManagedLbService {
    /// Create a slot. Without a load balancer service id the slot is managed.
    pub fn new(access: Arc<dyn Access>, lb_service_id: Option<String>) -> Self {
        let lb_service_id = lb_service_id.filter(|id| !id.is_empty());
        Self {
            access,
            managed: lb_service_id.is_none(),
            lb_service_id: Mutex::new(lb_service_id),
        }
    }

    pub fn is_managed(&self) -> bool {
        self.managed
    }

    /// Id of the backing load balancer service known to this slot
    pub async fn lb_service_id(&self) -> Option<String> {
        self.lb_service_id.lock().await.clone()
    }

    /// Attach a virtual server, creating the load balancer service if managed
    pub async fn attach(&self, cluster_name: &str, virtual_server_id: &str) -> NsxlbResult<()> {
        let mut lb_service_id = self.lb_service_id.lock().await;

        let existing = self
            .access
            .find_load_balancer_service(cluster_name, lb_service_id.as_deref())
            .await?;
        let mut lb_service = match existing {
            Some(lb_service) => lb_service,
            None if self.managed => {
                let created = self
                    .access
                    .create_load_balancer_service(cluster_name)
                    .await?;
                info!(
                    cluster = %cluster_name,
                    lb_service_id = %created.id,
                    "Created load balancer service"
                );
                *lb_service_id = Some(created.id.clone());
                created
            }
            None => {
                warn!(
                    cluster = %cluster_name,
                    virtual_server_id = %virtual_server_id,
                    "Load balancer service not found"
                );
                return Err(NsxlbError::NoVirtualServerCapacity);
            }
        };

        lb_service
            .virtual_server_ids
            .push(virtual_server_id.to_string());
        self.access.update_load_balancer_service(&lb_service).await?;

        debug!(
            cluster = %cluster_name,
            lb_service_id = %lb_service.id,
            virtual_server_id = %virtual_server_id,
            virtual_servers = lb_service.virtual_server_ids.len(),
            "Attached virtual server"
        );

        Ok(())
    }

    /// Detach a virtual server, deleting the load balancer service if managed
    /// and no virtual server is left
    pub async fn detach(&self, cluster_name: &str, virtual_server_id: &str) -> NsxlbResult<()> {
        let mut lb_service_id = self.lb_service_id.lock().await;

        let Some(mut lb_service) = self
            .access
            .find_load_balancer_service_for_virtual_server(cluster_name, virtual_server_id)
            .await?
        else {
            debug!(
                cluster = %cluster_name,
                virtual_server_id = %virtual_server_id,
                "No load balancer service holds virtual server"
            );
            return Ok(());
        };

        if let Some(pos) = lb_service
            .virtual_server_ids
            .iter()
            .position(|id| id == virtual_server_id)
        {
            lb_service.virtual_server_ids.remove(pos);
        }

        if self.managed && lb_service.is_empty() {
            self.access
                .delete_load_balancer_service(&lb_service.id)
                .await?;
            if lb_service_id.as_deref() == Some(lb_service.id.as_str()) {
                *lb_service_id = None;
            }
            info!(
                cluster = %cluster_name,
                lb_service_id = %lb_service.id,
                "Deleted empty load balancer service"
            );
        } else {
            self.access.update_load_balancer_service(&lb_service).await?;
            debug!(
                cluster = %cluster_name,
                lb_service_id = %lb_service.id,
                virtual_server_id = %virtual_server_id,
                virtual_servers = lb_service.virtual_server_ids.len(),
                "Detached virtual server"
            );
        }

        Ok(())
    }
}
