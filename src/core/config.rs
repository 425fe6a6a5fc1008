use config::builder::DefaultState;
use config::{Config, ConfigBuilder, Environment, File};
use serde::Deserialize;

use crate::core::error::ConfigError;

pub const DEFAULT_SERVICES: &str = "property-service:5001:Property Service,\
auth-service:5002:Auth Service,\
booking-service:5003:Booking Service,\
payment-service:5004:Payment Service,\
review-service:5005:Review Service,\
notification-service:5006:Notification Service";

/// Largest request body the gateway buffers before forwarding.
pub const DEFAULT_BODY_LIMIT: usize = 1024 * 1024;

pub const DEVELOPMENT_SECRET: &str = "development-jwt-secret-change-me";

#[derive(Debug, Deserialize, Clone)]
pub struct GatewayArgs {
    pub host: String,
    pub port: u16,
    pub log_level: String,
    pub public_url: Option<String>,
    pub upstream_host: String,
    pub services: String,
    pub database_url: Option<String>,
    pub body_limit_bytes: usize,
}

impl GatewayArgs {
    pub fn load() -> Result<Self, ConfigError> {
        let config = sources()
            .set_default("host", "localhost")?
            .set_default("port", 5000_i64)?
            .set_default("log_level", "info")?
            .set_default("upstream_host", "localhost")?
            .set_default("services", DEFAULT_SERVICES)?
            .set_default("body_limit_bytes", DEFAULT_BODY_LIMIT as i64)?
            .build()?;

        Ok(config.try_deserialize::<GatewayArgs>()?)
    }

    /// Base URL advertised by the discovery document.
    pub fn public_url(&self) -> String {
        self.public_url
            .clone()
            .unwrap_or_else(|| format!("http://localhost:{}", self.port))
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct AuthArgs {
    pub host: String,
    pub port: u16,
    pub log_level: String,
    pub database_url: Option<String>,
    pub jwt_secret: String,
    pub access_token_ttl_seconds: i64,
    pub refresh_token_ttl_seconds: i64,
    pub google_client_id: String,
}

impl AuthArgs {
    pub fn load() -> Result<Self, ConfigError> {
        let config = sources()
            .set_default("host", "localhost")?
            .set_default("port", 5002_i64)?
            .set_default("log_level", "info")?
            .set_default("jwt_secret", DEVELOPMENT_SECRET)?
            .set_default("access_token_ttl_seconds", 3600_i64)?
            .set_default("refresh_token_ttl_seconds", 2_592_000_i64)?
            .set_default("google_client_id", "")?
            .build()?;

        let args = config.try_deserialize::<AuthArgs>()?;

        if args.access_token_ttl_seconds <= 0 {
            return Err(ConfigError::InvalidTokenLifetime("access token ttl must be positive"));
        }
        if args.refresh_token_ttl_seconds <= 0 {
            return Err(ConfigError::InvalidTokenLifetime("refresh token ttl must be positive"));
        }

        Ok(args)
    }
}

/// Optional TOML file layered under `NESTLY_*` environment variables.
fn sources() -> ConfigBuilder<DefaultState> {
    let path = std::env::var("NESTLY_CONFIG").unwrap_or_else(|_| "nestly".to_owned());

    Config::builder()
        .add_source(File::with_name(&path).required(false))
        .add_source(Environment::with_prefix("NESTLY"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn public_url_defaults_to_local_port() {
        let args = GatewayArgs {
            host: "0.0.0.0".into(),
            port: 5050,
            log_level: "info".into(),
            public_url: None,
            upstream_host: "localhost".into(),
            services: DEFAULT_SERVICES.into(),
            database_url: None,
            body_limit_bytes: DEFAULT_BODY_LIMIT,
        };

        assert_eq!(args.public_url(), "http://localhost:5050");

        let args = GatewayArgs {
            public_url: Some("https://api.nestly.dev".into()),
            ..args
        };
        assert_eq!(args.public_url(), "https://api.nestly.dev");
    }
}
