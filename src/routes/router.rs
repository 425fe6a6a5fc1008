use axum::extract::{DefaultBodyLimit, MatchedPath, Request};
use axum::routing::{get, post, put};
use axum::{Router, middleware};
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{Span, info_span};

use crate::core::state::{AuthState, GatewayState};
use crate::routes::{auth, discovery, health, proxy};
use crate::utils;

pub fn gateway(state: GatewayState) -> Router {
    let body_limit = state.body_limit;

    Router::new()
        .route("/livez", get(health::gateway_livez))
        .route("/readyz", get(health::gateway_readyz))
        .route("/services", get(discovery::services))
        .fallback(proxy::forward)
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http().make_span_with(make_span))
                .layer(CorsLayer::very_permissive()),
        )
}

pub fn auth(state: AuthState) -> Router {
    // /auth/...
    let auth_router = Router::new()
        .route("/google", post(auth::google))
        .route("/refresh", post(auth::refresh))
        .route("/logout", post(auth::logout))
        .route("/me", get(auth::me))
        .route("/validate", get(auth::validate))
        .route("/users/{id}/roles", put(auth::update_roles));

    Router::new()
        .route("/livez", get(health::auth_livez))
        .route("/readyz", get(health::auth_readyz))
        .nest("/auth", auth_router)
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            utils::auth::authenticate,
        ))
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http().make_span_with(make_span))
                .layer(CorsLayer::very_permissive()),
        )
}

fn make_span(request: &Request) -> Span {
    let matched_path = request
        .extensions()
        .get::<MatchedPath>()
        .map(MatchedPath::as_str);

    info_span!(
        "request",
        method = ?request.method(),
        uri = %request.uri(),
        matched_path,
    )
}
