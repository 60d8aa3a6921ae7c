//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request id, tracing, timeout)
//!     → request.rs (immutable request head)
//!     → chain.rs (authentication filter: rewrite path, enforce token, inject identity)
//!     → [routing resolves the service] → [load balancer picks a backend]
//!     → forward.rs (send to backend, stream response)
//!     → response.rs (empty-bodied gateway errors)
//! ```

pub mod chain;
pub mod forward;
pub mod request;
pub mod response;
pub mod server;

pub use chain::{FilterChain, Outcome, Rejection, RequestFilter};
pub use request::GatewayRequest;
pub use server::{GatewayRuntime, HttpServer};
