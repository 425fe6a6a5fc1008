pub mod controllers;
pub mod core;
pub mod routes;
pub mod store;
pub mod types;
pub mod utils;

use std::sync::Arc;

use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::controllers::user::UserController;
use crate::core::config::{AuthArgs, DEVELOPMENT_SECRET, GatewayArgs};
use crate::core::error::ConfigError as Error;
use crate::core::state::{AuthState, GatewayState};
use crate::store::{HashMapUserStore, PgUserStore, UserStore};
use crate::utils::identity::GoogleTokenInfoVerifier;
use crate::utils::token::TokenIssuer;

pub async fn run_gateway() -> Result<(), Error> {
    let config = GatewayArgs::load()?;

    init_tracing(&config.log_level);

    let state = GatewayState::from_args(&config)?;

    for entry in state.registry.list() {
        tracing::info!(
            "registered {} -> {} ({})",
            entry.route_prefix,
            entry.target_url(),
            entry.display_name
        );
    }

    let app = routes::router::gateway(state);

    serve(app, &config.host, config.port).await
}

pub async fn run_auth_service() -> Result<(), Error> {
    let config = AuthArgs::load()?;

    init_tracing(&config.log_level);

    if config.jwt_secret == DEVELOPMENT_SECRET {
        tracing::warn!("using the development jwt secret, set NESTLY_JWT_SECRET");
    }

    let store: Arc<dyn UserStore> = match &config.database_url {
        Some(url) => {
            let pool = PgPoolOptions::new()
                .max_connections(5)
                .connect(url)
                .await
                .map_err(Error::Sql)?;

            sqlx::migrate!()
                .run(&pool)
                .await
                .map_err(Error::DatabaseMigration)?;

            Arc::new(PgUserStore::new(pool))
        }
        None => {
            tracing::warn!("no database configured, accounts are kept in memory");
            Arc::new(HashMapUserStore::new())
        }
    };

    let tokens = TokenIssuer::new(
        &config.jwt_secret,
        config.access_token_ttl_seconds,
        config.refresh_token_ttl_seconds,
    )?;

    let identity = Arc::new(GoogleTokenInfoVerifier::new(&config.google_client_id)?);

    let state = AuthState::new(UserController::new(store, tokens, identity));

    let app = routes::router::auth(state);

    serve(app, &config.host, config.port).await
}

fn init_tracing(log_level: &str) {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_new(log_level).unwrap_or_default())
        .with(tracing_subscriber::fmt::layer())
        .init();
}

async fn serve(app: axum::Router, host: &str, port: u16) -> Result<(), Error> {
    let listener = tokio::net::TcpListener::bind(format!("{host}:{port}"))
        .await
        .map_err(Error::IO)?;

    tracing::info!("listening on {}:{}", host, port);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(Error::IO)?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }

    tracing::info!("shutting down");
}
