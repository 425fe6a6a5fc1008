use axum::Json;
use axum::extract::rejection::BytesRejection;
use axum::extract::{FromRequest, Request, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use bytes::Bytes;
use serde_json::json;

use crate::core::proxy::ProxyRequest;
use crate::core::state::GatewayState;

/// Fallback for every path the gateway does not serve itself.
pub async fn forward(State(state): State<GatewayState>, request: Request) -> Response {
    let path = request.uri().path().to_owned();

    let Some(entry) = state.registry.lookup(&path) else {
        return not_found(request.method().as_str(), &path);
    };

    let method = request.method().clone();
    let headers = request.headers().clone();
    let path = request
        .uri()
        .path_and_query()
        .map(|pq| pq.as_str().to_owned())
        .unwrap_or(path);

    // buffered up to the router's DefaultBodyLimit
    let body = match Bytes::from_request(request, &state).await {
        Ok(body) => body,
        Err(rejection) => return body_rejected(rejection),
    };

    let request = ProxyRequest {
        method,
        path,
        headers,
        body,
    };

    state.forwarder.forward(entry, request).await.into_response()
}

fn not_found(method: &str, path: &str) -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(json!({
            "error": "Not Found",
            "message": format!("Route {method}:{path} not found"),
        })),
    )
        .into_response()
}

fn body_rejected(rejection: BytesRejection) -> Response {
    let status = rejection.status();
    tracing::debug!("rejected request body: {}", rejection.body_text());

    (
        status,
        Json(json!({
            "error": status.canonical_reason().unwrap_or("Bad Request"),
            "message": rejection.body_text(),
        })),
    )
        .into_response()
}
