//! Load balancing subsystem.
//!
//! # Data Flow
//! ```text
//! Route matched → logical service name identified
//!     → pool.rs (backends registered for the service)
//!     → Apply load balancing algorithm:
//!         - round_robin.rs (rotate through backends)
//!         - least_conn.rs (pick backend with fewest connections)
//!     → backend.rs (connection guard)
//!     → Return guard or none (503)
//! ```
//!
//! # Design Decisions
//! - Load balancer is stateless; backends track their own connections
//! - One strategy for every service, chosen in config
//! - Saturated backends excluded from selection

use std::sync::Arc;

pub mod backend;
pub mod least_conn;
pub mod pool;
pub mod round_robin;

pub use pool::BackendManager;

use backend::Backend;

/// Backend selection algorithm.
pub trait LoadBalancer: Send + Sync + std::fmt::Debug {
    fn next_server(&self, backends: &[Arc<Backend>]) -> Option<Arc<Backend>>;
}
