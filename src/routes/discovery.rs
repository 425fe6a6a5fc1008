use axum::Json;
use axum::extract::State;
use chrono::Utc;

use crate::core::state::GatewayState;
use crate::types::response::Discovery;

pub async fn services(State(state): State<GatewayState>) -> Json<Discovery> {
    Json(Discovery::new(
        &state.registry,
        &state.public_url,
        state.port,
        Utc::now(),
    ))
}
