use std::sync::Arc;

use sqlx::postgres::{PgPool, PgPoolOptions};

use crate::controllers::user::UserController;
use crate::core::config::GatewayArgs;
use crate::core::error::{ConfigError, Error};
use crate::core::proxy::Forwarder;
use crate::core::registry::ServiceRegistry;

#[derive(Clone, Debug)]
pub struct GatewayState {
    pub registry: Arc<ServiceRegistry>,
    pub forwarder: Forwarder,
    pub public_url: String,
    pub port: u16,
    pub pool: Option<PgPool>,
    pub body_limit: usize,
}

impl GatewayState {
    pub fn new(
        registry: ServiceRegistry,
        public_url: String,
        port: u16,
        pool: Option<PgPool>,
        body_limit: usize,
    ) -> Result<Self, ConfigError> {
        Ok(GatewayState {
            registry: Arc::new(registry),
            forwarder: Forwarder::new()?,
            public_url,
            port,
            pool,
            body_limit,
        })
    }

    pub fn from_args(args: &GatewayArgs) -> Result<Self, ConfigError> {
        let registry = ServiceRegistry::parse(&args.services, &args.upstream_host)?;

        let pool = match &args.database_url {
            Some(url) => Some(PgPoolOptions::new().max_connections(2).connect_lazy(url)?),
            None => None,
        };

        Self::new(
            registry,
            args.public_url(),
            args.port,
            pool,
            args.body_limit_bytes,
        )
    }

    /// Probes the database when one is configured.
    pub async fn ready(&self) -> Result<Option<&'static str>, Error> {
        let Some(pool) = &self.pool else {
            return Ok(None);
        };

        sqlx::query("SELECT 1")
            .execute(pool)
            .await
            .map_err(|e| Error::NotReady(e.to_string()))?;

        Ok(Some("connected"))
    }
}

#[derive(Clone, Debug)]
pub struct AuthState {
    pub user_controller: UserController,
}

impl AuthState {
    pub fn new(user_controller: UserController) -> Self {
        AuthState { user_controller }
    }
}
