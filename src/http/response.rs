//! Response handling.
//!
//! # Design Decisions
//! - Gateway-generated errors carry a status and an empty body, nothing else
//! - Backend responses are streamed back untouched

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::http::chain::Rejection;

/// Empty-bodied response with the given status.
pub fn empty(status: StatusCode) -> Response {
    status.into_response()
}

impl IntoResponse for Rejection {
    fn into_response(self) -> Response {
        empty(self.status())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn rejection_has_empty_body() {
        for rejection in [Rejection::MissingCredential, Rejection::InvalidCredential] {
            let response = rejection.into_response();
            assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
            let body = axum::body::to_bytes(response.into_body(), 1024).await.unwrap();
            assert!(body.is_empty());
        }
    }
}
