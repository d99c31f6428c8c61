//! nsxlb-core: Core types for nsxlb
//!
//! This crate provides the fundamental types used throughout nsxlb:
//! - Tags and load balancer backend records
//! - Configuration types
//! - Error handling

pub mod config;
pub mod error;
pub mod model;

pub use config::*;
pub use error::*;
pub use model::*;
