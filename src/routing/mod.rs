//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Forwarded request (inbound path)
//!     → router.rs (route lookup)
//!     → matcher.rs (segment-aware prefix test)
//!     → Return: matched RouteEntry (service name) or NoMatch
//!
//! Route Compilation (at startup and on reload):
//!     RouteConfig[]
//!     → Sort by prefix length
//!     → Freeze as immutable RouteTable
//! ```
//!
//! # Design Decisions
//! - Routes compiled once per config, immutable at runtime
//! - Resolution uses the inbound path: the service selector is gone from the rewritten one
//! - Deterministic: same input always matches same route

pub mod matcher;
pub mod router;

pub use router::{RouteEntry, RouteTable};
