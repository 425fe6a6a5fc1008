use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use tracing::instrument;

use crate::core::error::{ConfigError, Error};
use crate::types::user::ExternalIdentity;

const GOOGLE_TOKENINFO_URL: &str = "https://oauth2.googleapis.com/tokeninfo";

/// Validates a third-party sign-on assertion.
#[async_trait]
pub trait IdentityVerifier: Send + Sync + std::fmt::Debug {
    async fn verify(&self, id_token: &str) -> Result<ExternalIdentity, Error>;
}

#[derive(Deserialize)]
struct TokenInfo {
    sub: String,
    aud: String,
    email: String,
    #[serde(default)]
    given_name: Option<String>,
    #[serde(default)]
    family_name: Option<String>,
    #[serde(default)]
    picture: Option<String>,
    // google reports this as the string "true"
    #[serde(default)]
    email_verified: Option<Value>,
}

/// Checks Google ID tokens against the `tokeninfo` endpoint.
#[derive(Clone, Debug)]
pub struct GoogleTokenInfoVerifier {
    client: reqwest::Client,
    client_id: String,
    url: String,
}

impl GoogleTokenInfoVerifier {
    pub fn new(client_id: &str) -> Result<Self, ConfigError> {
        Self::with_url(client_id, GOOGLE_TOKENINFO_URL)
    }

    pub fn with_url(client_id: &str, url: &str) -> Result<Self, ConfigError> {
        let client = reqwest::ClientBuilder::new().build()?;

        Ok(Self {
            client,
            client_id: client_id.to_owned(),
            url: url.to_owned(),
        })
    }

    async fn fetch(&self, id_token: &str) -> Result<TokenInfo, Error> {
        let query = serde_urlencoded::to_string([("id_token", id_token)])?;

        Ok(self
            .client
            .get(format!("{}?{}", self.url, query))
            .send()
            .await?
            .error_for_status()?
            .json::<TokenInfo>()
            .await?)
    }
}

#[async_trait]
impl IdentityVerifier for GoogleTokenInfoVerifier {
    #[instrument(skip_all)]
    async fn verify(&self, id_token: &str) -> Result<ExternalIdentity, Error> {
        let info = self.fetch(id_token).await.map_err(|e| {
            Error::Authentication(format!("Google token verification failed: {e}"))
        })?;

        if info.aud != self.client_id {
            return Err(Error::Authentication(
                "Google token verification failed: audience mismatch".to_owned(),
            ));
        }

        let email_verified = match info.email_verified {
            Some(Value::Bool(verified)) => verified,
            Some(Value::String(verified)) => verified == "true",
            _ => false,
        };

        Ok(ExternalIdentity {
            subject: info.sub,
            email: info.email,
            given_name: info.given_name.unwrap_or_default(),
            family_name: info.family_name.unwrap_or_default(),
            picture: info.picture,
            email_verified,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::Query;
    use axum::http::StatusCode;
    use axum::routing::get;
    use axum::{Json, Router};
    use serde_json::json;
    use std::collections::HashMap;
    use tokio::net::TcpListener;

    async fn tokeninfo(Query(params): Query<HashMap<String, String>>) -> (StatusCode, Json<Value>) {
        match params.get("id_token").map(String::as_str) {
            Some("good-token") => (
                StatusCode::OK,
                Json(json!({
                    "sub": "1098",
                    "aud": "client-abc",
                    "email": "katherine@example.com",
                    "given_name": "Katherine",
                    "family_name": "Johnson",
                    "email_verified": "true",
                })),
            ),
            Some("other-audience") => (
                StatusCode::OK,
                Json(json!({ "sub": "1", "aud": "someone-else", "email": "x@example.com" })),
            ),
            _ => (StatusCode::BAD_REQUEST, Json(json!({ "error": "invalid_token" }))),
        }
    }

    async fn spawn_tokeninfo() -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let app = Router::new().route("/tokeninfo", get(tokeninfo));

        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        format!("http://127.0.0.1:{port}/tokeninfo")
    }

    #[tokio::test]
    async fn accepts_token_for_configured_audience() {
        let verifier = GoogleTokenInfoVerifier::with_url("client-abc", &spawn_tokeninfo().await).unwrap();

        let identity = verifier.verify("good-token").await.unwrap();

        assert_eq!(identity.subject, "1098");
        assert_eq!(identity.email, "katherine@example.com");
        assert_eq!(identity.family_name, "Johnson");
        assert!(identity.email_verified);
    }

    #[tokio::test]
    async fn rejects_foreign_audience_and_bad_tokens() {
        let verifier = GoogleTokenInfoVerifier::with_url("client-abc", &spawn_tokeninfo().await).unwrap();

        let foreign = verifier.verify("other-audience").await;
        assert!(matches!(foreign, Err(Error::Authentication(_))));

        let invalid = verifier.verify("garbage").await;
        assert!(matches!(invalid, Err(Error::Authentication(_))));
    }
}
