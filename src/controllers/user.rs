use std::sync::Arc;

use tracing::instrument;
use uuid::Uuid;

use crate::core::error::Error;
use crate::store::UserStore;
use crate::types::response::{AuthPayload, UserView};
use crate::types::user::{ADMIN_ROLE, NewUser, User, normalize_roles};
use crate::utils::auth::AuthContext;
use crate::utils::identity::IdentityVerifier;
use crate::utils::token::{TokenIssuer, Verification};

#[derive(Clone)]
pub struct UserController {
    store: Arc<dyn UserStore>,
    tokens: TokenIssuer,
    identity: Arc<dyn IdentityVerifier>,
}

impl std::fmt::Debug for UserController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserController")
            .field("store", &self.store)
            .field("tokens", &self.tokens)
            .finish()
    }
}

impl UserController {
    pub fn new(
        store: Arc<dyn UserStore>,
        tokens: TokenIssuer,
        identity: Arc<dyn IdentityVerifier>,
    ) -> Self {
        Self {
            store,
            tokens,
            identity,
        }
    }

    pub fn tokens(&self) -> &TokenIssuer {
        &self.tokens
    }

    /// Exchanges a Google ID token for a token pair.
    #[instrument(skip_all)]
    pub async fn google_auth(&self, id_token: &str) -> Result<AuthPayload, Error> {
        self.sign_in(id_token).await.map_err(|e| match e {
            e @ Error::Authentication(_) => e,
            other => {
                tracing::warn!("google sign-in failed: {}", other);
                Error::Authentication(format!("Authentication failed: {other}"))
            }
        })
    }

    async fn sign_in(&self, id_token: &str) -> Result<AuthPayload, Error> {
        let identity = self.identity.verify(id_token).await?;
        let user = self.find_or_create(NewUser::from_identity(&identity)).await?;

        self.payload(&user)
    }

    /// Looks up by google id, then by email (linking the google id when the
    /// account has none yet), else creates.
    pub async fn find_or_create(&self, candidate: NewUser) -> Result<User, Error> {
        if let Some(google_id) = candidate.google_id.as_deref() {
            if let Some(user) = self.store.find_by_google_id(google_id).await? {
                return Ok(user);
            }

            if let Some(user) = self.store.find_by_email(&candidate.email).await? {
                // an account already bound to another subject is left untouched
                if user.google_id.is_some() {
                    return Ok(user);
                }

                tracing::info!("linking google account to existing user {}", user.id);
                return self
                    .store
                    .link_google_id(user.id, google_id, candidate.is_email_verified)
                    .await;
            }
        } else if let Some(user) = self.store.find_by_email(&candidate.email).await? {
            return Ok(user);
        }

        let user = self.store.create(candidate).await?;
        tracing::info!("created user {}", user.id);

        Ok(user)
    }

    /// Reissues both tokens from the account's current state.
    #[instrument(skip_all)]
    pub async fn refresh(&self, token: &str) -> Result<AuthPayload, Error> {
        let claims = match self.tokens.verify(token) {
            Verification::Verified(claims) => claims,
            Verification::Unverified => {
                return Err(Error::Authentication("Invalid refresh token".to_owned()));
            }
        };

        let id = Uuid::parse_str(&claims.user_id)
            .map_err(|_| Error::Authentication("Invalid refresh token".to_owned()))?;

        let user = self
            .store
            .get_by_id(id)
            .await
            .map_err(|e| Error::Authentication(format!("Token refresh failed: {e}")))?
            .ok_or_else(|| Error::Authentication("User not found".to_owned()))?;

        self.payload(&user)
    }

    #[instrument(skip(self, roles))]
    pub async fn update_roles(
        &self,
        caller: &AuthContext,
        id: Uuid,
        roles: Vec<String>,
    ) -> Result<UserView, Error> {
        if !caller.has_role(ADMIN_ROLE) {
            return Err(Error::Forbidden);
        }

        match self.store.update_roles(id, normalize_roles(roles)).await {
            Ok(user) => Ok(UserView::from(&user)),
            Err(Error::UserNotFound) => Err(Error::UserNotFound),
            Err(e) => {
                tracing::error!("failed to update roles for {}: {}", id, e);
                Err(Error::Internal)
            }
        }
    }

    pub async fn ready(&self) -> Result<(), Error> {
        self.store
            .ping()
            .await
            .map_err(|e| Error::NotReady(e.to_string()))
    }

    fn payload(&self, user: &User) -> Result<AuthPayload, Error> {
        let pair = self.tokens.issue(user)?;

        Ok(AuthPayload {
            user: UserView::from(user),
            access_token: pair.access_token,
            refresh_token: pair.refresh_token,
        })
    }
}
