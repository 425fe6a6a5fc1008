use axum::Json;
use axum::extract::{Extension, Path, State};
use tracing::instrument;
use uuid::Uuid;

use crate::core::error::Error;
use crate::core::state::AuthState;
use crate::types::request;
use crate::types::response::{AuthPayload, UserView};
use crate::types::user::UserSnapshot;
use crate::utils::auth::AuthContext;

#[instrument(skip_all)]
pub async fn google(
    State(state): State<AuthState>,
    Json(params): Json<request::GoogleAuthData>,
) -> Result<Json<AuthPayload>, Error> {
    let payload = state
        .user_controller
        .google_auth(&params.google_id_token)
        .await?;

    Ok(Json(payload))
}

#[instrument(skip_all)]
pub async fn refresh(
    State(state): State<AuthState>,
    Json(params): Json<request::RefreshData>,
) -> Result<Json<AuthPayload>, Error> {
    let payload = state.user_controller.refresh(&params.token).await?;

    Ok(Json(payload))
}

pub async fn logout() -> Json<bool> {
    Json(true)
}

/// Profile as captured in the caller's token.
#[instrument(skip_all)]
pub async fn me(Extension(context): Extension<AuthContext>) -> Result<Json<UserSnapshot>, Error> {
    context
        .user()
        .cloned()
        .map(Json)
        .ok_or(Error::Unauthenticated)
}

pub async fn validate(Extension(context): Extension<AuthContext>) -> Json<bool> {
    Json(context.is_authenticated())
}

#[instrument(skip(state, context, params))]
pub async fn update_roles(
    State(state): State<AuthState>,
    Extension(context): Extension<AuthContext>,
    Path(id): Path<Uuid>,
    Json(params): Json<request::UpdateRolesData>,
) -> Result<Json<UserView>, Error> {
    let user = state
        .user_controller
        .update_roles(&context, id, params.roles)
        .await?;

    Ok(Json(user))
}
