//! Explicit filter chain run on every request head.
//!
//! # Design Decisions
//! - Filters are plain trait objects owned by the runtime, composed in order
//! - First `Reject` ends the chain; nothing downstream runs
//! - Filters are synchronous and stateless across requests

use axum::http::StatusCode;
use thiserror::Error;

use crate::http::request::GatewayRequest;

/// Why a request was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Rejection {
    #[error("missing credential")]
    MissingCredential,
    #[error("invalid credential")]
    InvalidCredential,
    #[error("malformed path")]
    MalformedPath,
}

impl Rejection {
    /// Missing and invalid credentials share a status so clients cannot tell
    /// which check failed.
    pub fn status(&self) -> StatusCode {
        match self {
            Rejection::MissingCredential | Rejection::InvalidCredential => {
                StatusCode::UNAUTHORIZED
            }
            Rejection::MalformedPath => StatusCode::BAD_REQUEST,
        }
    }

    /// Metric label.
    pub fn as_str(&self) -> &'static str {
        match self {
            Rejection::MissingCredential => "missing_credential",
            Rejection::InvalidCredential => "invalid_credential",
            Rejection::MalformedPath => "malformed_path",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Forward(GatewayRequest),
    Reject(Rejection),
}

pub trait RequestFilter: Send + Sync + std::fmt::Debug {
    fn process(&self, request: GatewayRequest) -> Outcome;
}

#[derive(Debug, Default)]
pub struct FilterChain {
    filters: Vec<Box<dyn RequestFilter>>,
}

impl FilterChain {
    pub fn new(filters: Vec<Box<dyn RequestFilter>>) -> Self {
        Self { filters }
    }

    pub fn process(&self, request: GatewayRequest) -> Outcome {
        let mut current = request;
        for filter in &self.filters {
            match filter.process(current) {
                Outcome::Forward(next) => current = next,
                reject @ Outcome::Reject(_) => return reject,
            }
        }
        Outcome::Forward(current)
    }

    pub fn len(&self) -> usize {
        self.filters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{HeaderMap, HeaderName, HeaderValue, Method};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[derive(Debug)]
    struct Tag(&'static str);

    impl RequestFilter for Tag {
        fn process(&self, request: GatewayRequest) -> Outcome {
            Outcome::Forward(request.with_header(
                HeaderName::from_static("x-tag"),
                HeaderValue::from_static(self.0),
            ))
        }
    }

    #[derive(Debug)]
    struct Deny;

    impl RequestFilter for Deny {
        fn process(&self, _request: GatewayRequest) -> Outcome {
            Outcome::Reject(Rejection::MissingCredential)
        }
    }

    #[derive(Debug, Default)]
    struct Count(Arc<AtomicUsize>);

    impl RequestFilter for Count {
        fn process(&self, request: GatewayRequest) -> Outcome {
            self.0.fetch_add(1, Ordering::SeqCst);
            Outcome::Forward(request)
        }
    }

    fn request() -> GatewayRequest {
        GatewayRequest::new(Method::GET, &"/svc/x".parse().unwrap(), HeaderMap::new())
    }

    #[test]
    fn empty_chain_forwards_unchanged() {
        let chain = FilterChain::default();
        assert!(chain.is_empty());
        assert_eq!(chain.process(request()), Outcome::Forward(request()));
    }

    #[test]
    fn filters_run_in_order() {
        let chain = FilterChain::new(vec![Box::new(Tag("first")), Box::new(Tag("second"))]);
        match chain.process(request()) {
            Outcome::Forward(req) => assert_eq!(req.headers()["x-tag"], "second"),
            other => panic!("unexpected outcome {other:?}"),
        }
    }

    #[test]
    fn rejection_short_circuits() {
        let hits = Arc::new(AtomicUsize::new(0));
        let chain = FilterChain::new(vec![Box::new(Deny), Box::new(Count(hits.clone()))]);

        assert_eq!(
            chain.process(request()),
            Outcome::Reject(Rejection::MissingCredential)
        );
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn credential_failures_share_a_status() {
        assert_eq!(Rejection::MissingCredential.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(Rejection::InvalidCredential.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(Rejection::MalformedPath.status(), StatusCode::BAD_REQUEST);
    }
}
