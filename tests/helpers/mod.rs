#![allow(dead_code)]

use std::sync::Arc;

use async_trait::async_trait;
use axum::Router;
use reqwest::Client;
use tokio::net::TcpListener;
use tokio::spawn;

use nestly::controllers::user::UserController;
use nestly::core::config::DEFAULT_BODY_LIMIT;
use nestly::core::error::Error;
use nestly::core::registry::{ServiceEntry, ServiceRegistry};
use nestly::core::state::{AuthState, GatewayState};
use nestly::routes::router;
use nestly::store::HashMapUserStore;
use nestly::types::user::ExternalIdentity;
use nestly::utils::identity::IdentityVerifier;
use nestly::utils::token::TokenIssuer;

pub const TEST_SECRET: &str = "integration-test-secret";

/// Binds an ephemeral port and serves `app` on it in the background.
pub async fn spawn_app(app: Router) -> (String, u16) {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("failed binding to an ephemeral port");
    let port = listener.local_addr().unwrap().port();

    spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            eprintln!("Test server error: {}", e);
        }
    });

    (format!("http://127.0.0.1:{port}"), port)
}

/// A port nothing is listening on.
pub async fn closed_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    port
}

pub struct TestGateway {
    pub address: String,
    pub http_client: Client,
}

impl TestGateway {
    pub async fn new(entries: Vec<ServiceEntry>) -> Self {
        Self::with_body_limit(entries, DEFAULT_BODY_LIMIT).await
    }

    pub async fn with_body_limit(entries: Vec<ServiceEntry>, body_limit: usize) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed binding to an ephemeral port");
        let port = listener.local_addr().unwrap().port();
        let address = format!("http://127.0.0.1:{port}");

        let registry = ServiceRegistry::new(entries).unwrap();
        let state = GatewayState::new(registry, address.clone(), port, None, body_limit).unwrap();
        let app = router::gateway(state);

        spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                eprintln!("Test server error: {}", e);
            }
        });

        TestGateway {
            address,
            http_client: Client::new(),
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.address, path)
    }
}

#[derive(Debug)]
pub struct StubVerifier;

#[async_trait]
impl IdentityVerifier for StubVerifier {
    async fn verify(&self, id_token: &str) -> Result<ExternalIdentity, Error> {
        match id_token.strip_prefix("google:") {
            Some(name) => Ok(ExternalIdentity {
                subject: format!("google-{name}"),
                email: format!("{name}@example.com"),
                given_name: name.to_owned(),
                family_name: "Tester".to_owned(),
                picture: None,
                email_verified: true,
            }),
            None => Err(Error::Authentication("Invalid Google token".to_owned())),
        }
    }
}

pub struct TestAuthApp {
    pub address: String,
    pub http_client: Client,
    pub store: Arc<HashMapUserStore>,
    pub tokens: TokenIssuer,
}

impl TestAuthApp {
    pub async fn new() -> Self {
        let store = Arc::new(HashMapUserStore::new());
        let tokens = TokenIssuer::new(TEST_SECRET, 3600, 2_592_000).unwrap();
        let controller = UserController::new(store.clone(), tokens.clone(), Arc::new(StubVerifier));

        let (address, _) = spawn_app(router::auth(AuthState::new(controller))).await;

        TestAuthApp {
            address,
            http_client: Client::new(),
            store,
            tokens,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.address, path)
    }

    pub async fn sign_in(&self, name: &str) -> serde_json::Value {
        self.http_client
            .post(self.url("/auth/google"))
            .json(&serde_json::json!({ "googleIdToken": format!("google:{name}") }))
            .send()
            .await
            .expect("Failed to execute request.")
            .json()
            .await
            .unwrap()
    }
}
