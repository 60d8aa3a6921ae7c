//! Request head as seen by the filter chain.
//!
//! # Design Decisions
//! - Immutable value: every change produces a new `GatewayRequest`
//! - The inbound path is kept alongside the rewritten one for route resolution
//! - The body never enters the chain; the server streams it to the backend untouched

use axum::http::{request::Parts, HeaderMap, HeaderName, HeaderValue, Method, Uri};

#[derive(Debug, Clone, PartialEq)]
pub struct GatewayRequest {
    method: Method,
    inbound_path: String,
    path: String,
    query: Option<String>,
    headers: HeaderMap,
}

impl GatewayRequest {
    pub fn new(method: Method, uri: &Uri, headers: HeaderMap) -> Self {
        let path = uri.path().to_string();
        Self {
            method,
            inbound_path: path.clone(),
            path,
            query: uri.query().map(str::to_string),
            headers,
        }
    }

    pub fn from_parts(parts: &Parts) -> Self {
        Self::new(parts.method.clone(), &parts.uri, parts.headers.clone())
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Path as received from the client.
    pub fn inbound_path(&self) -> &str {
        &self.inbound_path
    }

    /// Path to deliver to the backend.
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn path_and_query(&self) -> String {
        match &self.query {
            Some(q) => format!("{}?{}", self.path, q),
            None => self.path.clone(),
        }
    }

    pub fn with_path(self, path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            ..self
        }
    }

    /// Set `name` to exactly `value`, dropping every earlier value.
    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub fn without_header(mut self, name: &HeaderName) -> Self {
        self.headers.remove(name);
        self
    }
}
