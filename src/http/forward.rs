//! Upstream forwarding.
//!
//! # Responsibilities
//! - Turn a forwarded `GatewayRequest` plus the untouched body into a backend request
//! - Strip hop-by-hop and `Host` headers (the client sets `Host` from the URI)
//! - Stream the backend response back, holding the backend's connection slot
//!   until the body is finished or dropped

use std::net::SocketAddr;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;

use axum::body::Body;
use axum::http::{header::HOST, Request, Uri};
use axum::response::Response;
use hyper::body::{Body as HttpBody, Frame, SizeHint};
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};
use thiserror::Error;

use crate::http::request::GatewayRequest;
use crate::load_balancer::backend::BackendConnectionGuard;

pub type HttpClient = Client<HttpConnector, Body>;

const HOP_BY_HOP: [&str; 8] = [
    "connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
];

#[derive(Debug, Error)]
pub enum ForwardError {
    #[error("invalid upstream uri: {0}")]
    Uri(#[from] axum::http::uri::InvalidUri),
    #[error("failed to build upstream request: {0}")]
    Build(#[from] axum::http::Error),
    #[error("upstream request failed: {0}")]
    Upstream(#[from] hyper_util::client::legacy::Error),
}

pub fn build_client(connect_timeout: Duration) -> HttpClient {
    let mut connector = HttpConnector::new();
    connector.set_connect_timeout(Some(connect_timeout));
    Client::builder(TokioExecutor::new()).build(connector)
}

pub fn upstream_request(
    addr: SocketAddr,
    request: GatewayRequest,
    body: Body,
) -> Result<Request<Body>, ForwardError> {
    let uri: Uri = format!("http://{}{}", addr, request.path_and_query()).parse()?;
    let mut builder = Request::builder().method(request.method().clone()).uri(uri);
    for (name, value) in request.headers() {
        if name == HOST || HOP_BY_HOP.contains(&name.as_str()) {
            continue;
        }
        builder = builder.header(name, value);
    }
    Ok(builder.body(body)?)
}

/// Response body that keeps a backend connection counted while it streams.
#[derive(Debug)]
pub struct GuardedBody<B> {
    inner: B,
    _guard: BackendConnectionGuard,
}

impl<B> GuardedBody<B> {
    pub fn new(inner: B, guard: BackendConnectionGuard) -> Self {
        Self {
            inner,
            _guard: guard,
        }
    }
}

impl<B> HttpBody for GuardedBody<B>
where
    B: HttpBody + Unpin,
{
    type Data = B::Data;
    type Error = B::Error;

    fn poll_frame(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
        Pin::new(&mut self.get_mut().inner).poll_frame(cx)
    }

    fn is_end_stream(&self) -> bool {
        self.inner.is_end_stream()
    }

    fn size_hint(&self) -> SizeHint {
        self.inner.size_hint()
    }
}

/// Forward `request` to the guarded backend. The guard moves into the
/// response body, or is released here if the upstream call fails.
pub async fn send(
    client: &HttpClient,
    backend: BackendConnectionGuard,
    request: GatewayRequest,
    body: Body,
) -> Result<Response, ForwardError> {
    let upstream = upstream_request(backend.addr, request, body)?;
    let response = client.request(upstream).await?;
    let (parts, body) = response.into_parts();
    Ok(Response::from_parts(
        parts,
        Body::new(GuardedBody::new(body, backend)),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::load_balancer::backend::Backend;
    use axum::http::{HeaderMap, HeaderValue, Method};
    use std::sync::Arc;

    #[test]
    fn builds_backend_request_from_rewritten_head() {
        let mut headers = HeaderMap::new();
        headers.insert("host", HeaderValue::from_static("gateway.local"));
        headers.insert("connection", HeaderValue::from_static("keep-alive"));
        headers.insert("id", HeaderValue::from_static("42"));
        headers.append("accept", HeaderValue::from_static("text/plain"));
        headers.append("accept", HeaderValue::from_static("application/json"));

        let request = GatewayRequest::new(
            Method::POST,
            &"/svc/private-api/items?x=1".parse().unwrap(),
            headers,
        )
        .with_path("/private-api/items");

        let upstream =
            upstream_request("127.0.0.1:3000".parse().unwrap(), request, Body::empty()).unwrap();

        assert_eq!(upstream.method(), Method::POST);
        assert_eq!(upstream.uri(), "http://127.0.0.1:3000/private-api/items?x=1");
        assert!(upstream.headers().get("host").is_none());
        assert!(upstream.headers().get("connection").is_none());
        assert_eq!(upstream.headers()["id"], "42");
        assert_eq!(upstream.headers().get_all("accept").iter().count(), 2);
    }

    #[tokio::test]
    async fn connection_stays_counted_until_body_is_consumed() {
        let backend = Arc::new(Backend::new("127.0.0.1:3000".parse().unwrap(), 1));
        let guard = backend.try_create_guard().unwrap();

        let body = Body::new(GuardedBody::new(Body::from("payload"), guard));
        assert_eq!(backend.active_connections(), 1);
        assert!(!backend.has_capacity());

        let bytes = axum::body::to_bytes(body, 1024).await.unwrap();
        assert_eq!(&bytes[..], b"payload");
        assert_eq!(backend.active_connections(), 0);
    }

    #[test]
    fn dropped_body_releases_connection() {
        let backend = Arc::new(Backend::new("127.0.0.1:3000".parse().unwrap(), 1));
        let body = GuardedBody::new(Body::empty(), backend.try_create_guard().unwrap());
        assert_eq!(backend.active_connections(), 1);
        drop(body);
        assert_eq!(backend.active_connections(), 0);
    }
}
