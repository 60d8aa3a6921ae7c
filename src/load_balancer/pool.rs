//! Backend pool management.
//!
//! # Responsibilities
//! - Manage collections of backends grouped by logical service name
//! - Apply load balancing algorithms to select backends
//! - Provide connection guards for tracking

use std::collections::HashMap;
use std::sync::Arc;

use crate::config::{BackendConfig, Strategy};
use crate::load_balancer::{
    backend::{Backend, BackendConnectionGuard},
    least_conn::LeastConnections,
    round_robin::RoundRobin,
    LoadBalancer,
};

#[derive(Debug)]
struct ServicePool {
    backends: Vec<Arc<Backend>>,
    balancer: Box<dyn LoadBalancer>,
}

/// Resolves logical service names to concrete backends.
#[derive(Debug, Default)]
pub struct BackendManager {
    services: HashMap<String, ServicePool>,
}

impl BackendManager {
    pub fn new(configs: &[BackendConfig], strategy: Strategy) -> Self {
        let mut grouped: HashMap<String, Vec<Arc<Backend>>> = HashMap::new();

        for config in configs {
            match config.address.parse() {
                Ok(addr) => {
                    let backend = Arc::new(Backend::new(addr, config.max_connections));
                    grouped.entry(config.service.clone()).or_default().push(backend);
                }
                Err(_) => tracing::warn!("Invalid backend address: {}", config.address),
            }
        }

        let services = grouped
            .into_iter()
            .map(|(name, backends)| {
                let balancer: Box<dyn LoadBalancer> = match strategy {
                    Strategy::RoundRobin => Box::new(RoundRobin::new()),
                    Strategy::LeastConnections => Box::new(LeastConnections::new()),
                };
                (name, ServicePool { backends, balancer })
            })
            .collect();

        Self { services }
    }

    /// Select a backend for the given service.
    /// Returns a guard that decrements the connection count on drop.
    pub fn get(&self, service: &str) -> Option<BackendConnectionGuard> {
        let Some(pool) = self.services.get(service) else {
            tracing::debug!(service = %service, "Service not found in BackendManager");
            return None;
        };
        pool.select().or_else(|| {
            tracing::debug!(
                service = %service,
                backend_count = pool.backends.len(),
                "No backend with spare capacity"
            );
            None
        })
    }
}

impl ServicePool {
    /// A backend can fill up between selection and guard creation when
    /// requests race, so selection is retried once per backend.
    fn select(&self) -> Option<BackendConnectionGuard> {
        for _ in 0..self.backends.len() {
            let backend = self.balancer.next_server(&self.backends)?;
            if let Some(guard) = backend.try_create_guard() {
                return Some(guard);
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Rotates without looking at capacity, like a selection that went stale.
    #[derive(Debug, Default)]
    struct Blind(AtomicUsize);

    impl LoadBalancer for Blind {
        fn next_server(&self, backends: &[Arc<Backend>]) -> Option<Arc<Backend>> {
            let i = self.0.fetch_add(1, Ordering::Relaxed);
            backends.get(i % backends.len().max(1)).cloned()
        }
    }

    fn backend(service: &str, address: &str, max: usize) -> BackendConfig {
        BackendConfig {
            service: service.into(),
            address: address.into(),
            max_connections: max,
        }
    }

    #[test]
    fn groups_backends_by_service() {
        let manager = BackendManager::new(
            &[
                backend("a", "127.0.0.1:1000", 10),
                backend("a", "127.0.0.1:1001", 10),
                backend("b", "127.0.0.1:2000", 10),
                backend("c", "bogus", 10),
            ],
            Strategy::RoundRobin,
        );

        let first = manager.get("a").unwrap().addr;
        let second = manager.get("a").unwrap().addr;
        assert_ne!(first, second);
        assert_eq!(manager.get("b").unwrap().addr.port(), 2000);
        assert!(manager.get("c").is_none());
        assert!(manager.get("missing").is_none());
    }

    #[test]
    fn exhausted_service_yields_none() {
        let manager = BackendManager::new(
            &[backend("a", "127.0.0.1:1000", 1)],
            Strategy::LeastConnections,
        );
        let held = manager.get("a").unwrap();
        assert!(manager.get("a").is_none());
        drop(held);
        assert!(manager.get("a").is_some());
    }

    #[test]
    fn stale_pick_falls_through_to_backend_with_capacity() {
        let full = Arc::new(Backend::new("127.0.0.1:1000".parse().unwrap(), 1));
        let free = Arc::new(Backend::new("127.0.0.1:1001".parse().unwrap(), 1));
        let _held = full.try_create_guard().unwrap();
        let pool = ServicePool {
            backends: vec![full, free.clone()],
            balancer: Box::new(Blind::default()),
        };

        let guard = pool.select().unwrap();
        assert_eq!(guard.addr, free.addr);
        assert_eq!(free.active_connections(), 1);

        // Both full now; every attempt fails and selection gives up.
        assert!(pool.select().is_none());
    }
}
