//! In-memory backend implementation
//!
//! Keeps IP pools and load balancer services in process memory. Used for
//! offline evaluation of a configuration and as the backend in tests.

use async_trait::async_trait;
use nsxlb_core::{
    LbService, NsxlbError, NsxlbResult, SCOPE_CLUSTER, SIZE_SMALL,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use crate::access::Access;
use crate::tags::{cluster_tag, get_tag};

/// In-memory load balancer backend
pub struct MemoryAccess {
    /// Size given to created load balancer services
    size: String,
    /// Capacity of each load balancer service
    max_virtual_servers: usize,
    /// IP pool ids indexed by name
    ip_pools: RwLock<HashMap<String, String>>,
    /// Load balancer services indexed by id
    lb_services: RwLock<HashMap<String, LbService>>,
    /// Error returned by mutating calls, if set
    failure: RwLock<Option<String>>,
    ip_pool_lookups: AtomicUsize,
    creates: AtomicUsize,
    updates: AtomicUsize,
    deletes: AtomicUsize,
}

impl MemoryAccess {
    /// Create a backend whose load balancer services hold at most
    /// `max_virtual_servers` virtual servers
    pub fn new(size: impl Into<String>, max_virtual_servers: usize) -> Self {
        Self {
            size: size.into(),
            max_virtual_servers,
            ip_pools: RwLock::new(HashMap::new()),
            lb_services: RwLock::new(HashMap::new()),
            failure: RwLock::new(None),
            ip_pool_lookups: AtomicUsize::new(0),
            creates: AtomicUsize::new(0),
            updates: AtomicUsize::new(0),
            deletes: AtomicUsize::new(0),
        }
    }

    /// Register an IP pool
    pub async fn add_ip_pool(&self, name: &str, id: &str) {
        self.ip_pools
            .write()
            .await
            .insert(name.to_string(), id.to_string());
    }

    /// Store a load balancer service as if provisioned outside of nsxlb
    pub async fn insert_lb_service(&self, lb_service: LbService) {
        self.lb_services
            .write()
            .await
            .insert(lb_service.id.clone(), lb_service);
    }

    /// Get a load balancer service by id
    pub async fn lb_service(&self, id: &str) -> Option<LbService> {
        self.lb_services.read().await.get(id).cloned()
    }

    /// Number of stored load balancer services
    pub async fn lb_service_count(&self) -> usize {
        self.lb_services.read().await.len()
    }

    /// Make every create, update and delete call fail with a backend error
    pub async fn fail_mutations(&self, message: Option<&str>) {
        *self.failure.write().await = message.map(str::to_string);
    }

    /// Number of IP pool lookups served
    pub fn ip_pool_lookups(&self) -> usize {
        self.ip_pool_lookups.load(Ordering::SeqCst)
    }

    pub fn creates(&self) -> usize {
        self.creates.load(Ordering::SeqCst)
    }

    pub fn updates(&self) -> usize {
        self.updates.load(Ordering::SeqCst)
    }

    pub fn deletes(&self) -> usize {
        self.deletes.load(Ordering::SeqCst)
    }

    async fn check_failure(&self) -> NsxlbResult<()> {
        match &*self.failure.read().await {
            Some(message) => Err(NsxlbError::Backend(message.clone())),
            None => Ok(()),
        }
    }
}

impl Default for MemoryAccess {
    fn default() -> Self {
        Self::new(SIZE_SMALL, 10)
    }
}

#[async_trait]
impl Access for MemoryAccess {
    async fn find_ip_pool_by_name(&self, name: &str) -> NsxlbResult<String> {
        self.ip_pool_lookups.fetch_add(1, Ordering::SeqCst);
        self.ip_pools
            .read()
            .await
            .get(name)
            .cloned()
            .ok_or_else(|| NsxlbError::IpPoolNotFound(name.to_string()))
    }

    async fn find_load_balancer_service(
        &self,
        cluster_name: &str,
        lb_service_id: Option<&str>,
    ) -> NsxlbResult<Option<LbService>> {
        // Yield so concurrent callers interleave like remote round trips would
        tokio::task::yield_now().await;
        let services = self.lb_services.read().await;
        let found = match lb_service_id {
            Some(id) => services.get(id).cloned(),
            None => services
                .values()
                .find(|s| get_tag(&s.tags, SCOPE_CLUSTER) == Some(cluster_name))
                .cloned(),
        };
        Ok(found)
    }

    async fn create_load_balancer_service(&self, cluster_name: &str) -> NsxlbResult<LbService> {
        self.check_failure().await?;
        let lb_service = LbService {
            id: Uuid::new_v4().to_string(),
            display_name: format!("cluster:{}", cluster_name),
            size: self.size.clone(),
            virtual_server_ids: Vec::new(),
            tags: vec![cluster_tag(cluster_name)],
        };
        self.lb_services
            .write()
            .await
            .insert(lb_service.id.clone(), lb_service.clone());
        self.creates.fetch_add(1, Ordering::SeqCst);

        debug!(cluster = %cluster_name, lb_service_id = %lb_service.id, "Stored load balancer service");

        Ok(lb_service)
    }

    async fn update_load_balancer_service(&self, lb_service: &LbService) -> NsxlbResult<()> {
        self.check_failure().await?;
        tokio::task::yield_now().await;
        if lb_service.virtual_server_ids.len() > self.max_virtual_servers {
            return Err(NsxlbError::Backend(format!(
                "load balancer service {} of size {} supports at most {} virtual servers",
                lb_service.id, self.size, self.max_virtual_servers
            )));
        }
        let mut services = self.lb_services.write().await;
        let stored = services
            .get_mut(&lb_service.id)
            .ok_or_else(|| NsxlbError::LbServiceNotFound(lb_service.id.clone()))?;
        *stored = lb_service.clone();
        self.updates.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn delete_load_balancer_service(&self, id: &str) -> NsxlbResult<()> {
        self.check_failure().await?;
        self.lb_services
            .write()
            .await
            .remove(id)
            .ok_or_else(|| NsxlbError::LbServiceNotFound(id.to_string()))?;
        self.deletes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn find_load_balancer_service_for_virtual_server(
        &self,
        cluster_name: &str,
        virtual_server_id: &str,
    ) -> NsxlbResult<Option<LbService>> {
        tokio::task::yield_now().await;
        let services = self.lb_services.read().await;
        let found = services
            .values()
            .filter(|s| s.contains(virtual_server_id))
            .find(|s| match get_tag(&s.tags, SCOPE_CLUSTER) {
                Some(cluster) => cluster == cluster_name,
                None => true,
            })
            .cloned();
        Ok(found)
    }
}
