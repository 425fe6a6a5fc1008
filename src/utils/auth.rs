use axum::extract::{Request, State};
use axum::http::{HeaderMap, header};
use axum::middleware::Next;
use axum::response::Response;

use crate::core::state::AuthState;
use crate::types::user::UserSnapshot;
use crate::utils::token::{TokenClaims, TokenIssuer, Verification};

/// Request-scoped identity, rebuilt from the bearer token on every request.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum AuthContext {
    #[default]
    Anonymous,
    Authenticated {
        user_id: String,
        user: UserSnapshot,
    },
}

impl AuthContext {
    pub fn from_claims(claims: &TokenClaims) -> Self {
        AuthContext::Authenticated {
            user_id: claims.user_id.clone(),
            user: claims.snapshot(),
        }
    }

    pub fn user_id(&self) -> Option<&str> {
        match self {
            AuthContext::Authenticated { user_id, .. } => Some(user_id),
            AuthContext::Anonymous => None,
        }
    }

    pub fn user(&self) -> Option<&UserSnapshot> {
        match self {
            AuthContext::Authenticated { user, .. } => Some(user),
            AuthContext::Anonymous => None,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, AuthContext::Authenticated { .. })
    }

    pub fn has_role(&self, role: &str) -> bool {
        self.user().is_some_and(|user| user.has_role(role))
    }
}

/// Derives the context from the `Authorization` header alone. Never fails.
pub fn build_auth_context(headers: &HeaderMap, tokens: &TokenIssuer) -> AuthContext {
    let Some(token) = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
    else {
        return AuthContext::Anonymous;
    };

    match tokens.verify(token.trim()) {
        Verification::Verified(claims) => AuthContext::from_claims(&claims),
        Verification::Unverified => AuthContext::Anonymous,
    }
}

pub async fn authenticate(
    State(state): State<AuthState>,
    mut request: Request,
    next: Next,
) -> Response {
    let context = build_auth_context(request.headers(), state.user_controller.tokens());

    if let Some(user_id) = context.user_id() {
        tracing::debug!("authenticated request for user {}", user_id);
    }

    request.extensions_mut().insert(context);

    next.run(request).await
}
