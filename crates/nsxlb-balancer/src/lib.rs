//! nsxlb-balancer: Load balancer correlation and lifecycle
//!
//! This crate provides the load balancer logic:
//! - Tag sets and correlation keys
//! - Service port mappings
//! - Load balancer class registry
//! - Shared load balancer service management
//! - Backend access trait and an in-memory backend

pub mod access;
pub mod class;
pub mod helpers;
pub mod lbservice;
pub mod mapping;
pub mod memory;
pub mod tags;

pub use access::Access;
pub use class::{LoadBalancerClass, LoadBalancerClasses};
pub use helpers::{collect_node_internal_addresses, ObjectName};
pub use lbservice::ManagedLbService;
pub use mapping::{mappings_for_service, Mapping, Protocol};
pub use memory::MemoryAccess;
pub use tags::{check_tags, get_tag, TagSet};
