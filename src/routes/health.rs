use axum::Json;
use axum::extract::State;
use tracing::instrument;

use crate::core::error::Error;
use crate::core::state::{AuthState, GatewayState};
use crate::types::response::Health;

const GATEWAY: &str = "api-gateway";
const AUTH_SERVICE: &str = "auth-service";

pub async fn gateway_livez() -> Json<Health> {
    Json(Health::alive(GATEWAY))
}

#[instrument(skip_all)]
pub async fn gateway_readyz(State(state): State<GatewayState>) -> Result<Json<Health>, Error> {
    let database = state.ready().await?;

    Ok(Json(Health::ready(GATEWAY, database)))
}

pub async fn auth_livez() -> Json<Health> {
    Json(Health::alive(AUTH_SERVICE))
}

#[instrument(skip_all)]
pub async fn auth_readyz(State(state): State<AuthState>) -> Result<Json<Health>, Error> {
    state.user_controller.ready().await?;

    Ok(Json(Health::ready(AUTH_SERVICE, Some("connected"))))
}
