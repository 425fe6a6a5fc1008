use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::core::registry::ServiceRegistry;
use crate::types::user::{Roles, User};

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserView {
    pub id: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub avatar: Option<String>,
    pub phone: Option<String>,
    pub is_phone_verified: bool,
    pub roles: Roles,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&User> for UserView {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.to_string(),
            email: user.email.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            avatar: user.avatar.clone(),
            phone: user.phone.clone(),
            is_phone_verified: user.is_phone_verified,
            roles: user.roles.clone(),
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthPayload {
    pub user: UserView,
    pub access_token: String,
    pub refresh_token: String,
}

#[derive(Debug, Serialize)]
pub struct Health {
    pub status: &'static str,
    pub service: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database: Option<&'static str>,
    pub timestamp: DateTime<Utc>,
}

impl Health {
    pub fn alive(service: &'static str) -> Self {
        Self {
            status: "alive",
            service,
            database: None,
            timestamp: Utc::now(),
        }
    }

    pub fn ready(service: &'static str, database: Option<&'static str>) -> Self {
        Self {
            status: "ready",
            service,
            database,
            timestamp: Utc::now(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Discovery {
    pub gateway: GatewayInfo,
    pub services: Vec<ServiceInfo>,
    pub total_services: usize,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct GatewayInfo {
    pub name: &'static str,
    pub port: u16,
    pub graphql: String,
    pub health: String,
    pub services: &'static str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceInfo {
    pub name: String,
    pub path: String,
    pub endpoints: Endpoints,
    pub direct_port: u16,
}

#[derive(Debug, Serialize)]
pub struct Endpoints {
    pub graphql: String,
    pub health: String,
    pub readiness: String,
}

impl Discovery {
    /// Derives the listing from the registry; URLs are rooted at `public_url`.
    pub fn new(
        registry: &ServiceRegistry,
        public_url: &str,
        port: u16,
        timestamp: DateTime<Utc>,
    ) -> Self {
        let base = public_url.trim_end_matches('/');

        let services = registry
            .list()
            .iter()
            .map(|entry| ServiceInfo {
                name: entry.display_name.clone(),
                path: entry.route_prefix.clone(),
                endpoints: Endpoints {
                    graphql: format!("{base}{}/graphql", entry.route_prefix),
                    health: format!("{base}{}/livez", entry.route_prefix),
                    readiness: format!("{base}{}/readyz", entry.route_prefix),
                },
                direct_port: entry.target_port,
            })
            .collect::<Vec<_>>();

        Self {
            gateway: GatewayInfo {
                name: "API Gateway",
                port,
                graphql: format!("{base}/graphql"),
                health: format!("{base}/livez"),
                services: "/services",
            },
            total_services: services.len(),
            services,
            timestamp,
        }
    }
}
