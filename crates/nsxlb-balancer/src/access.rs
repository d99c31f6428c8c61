//! Backend access trait definitions

use async_trait::async_trait;
use nsxlb_core::{LbService, NsxlbResult};

/// Operations the balancer needs from the load balancer backend
#[async_trait]
pub trait Access: Send + Sync {
    /// Resolve an IP pool name to its id
    async fn find_ip_pool_by_name(&self, name: &str) -> NsxlbResult<String>;

    /// Find the load balancer service by id if known, else by cluster
    async fn find_load_balancer_service(
        &self,
        cluster_name: &str,
        lb_service_id: Option<&str>,
    ) -> NsxlbResult<Option<LbService>>;

    /// Create a new load balancer service for the cluster
    async fn create_load_balancer_service(&self, cluster_name: &str) -> NsxlbResult<LbService>;

    /// Persist the virtual server list of a load balancer service
    async fn update_load_balancer_service(&self, lb_service: &LbService) -> NsxlbResult<()>;

    /// Delete a load balancer service
    async fn delete_load_balancer_service(&self, id: &str) -> NsxlbResult<()>;

    /// Find the load balancer service a virtual server is attached to
    async fn find_load_balancer_service_for_virtual_server(
        &self,
        cluster_name: &str,
        virtual_server_id: &str,
    ) -> NsxlbResult<Option<LbService>>;
}
