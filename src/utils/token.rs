use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::core::error::{ConfigError, Error};
use crate::types::user::{Roles, User, UserSnapshot, normalize_roles};

/// Payload carried by both access and refresh tokens.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenClaims {
    pub user_id: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    pub is_phone_verified: bool,
    pub roles: Roles,
    pub iat: i64,
    pub exp: i64,
}

impl TokenClaims {
    pub fn for_user(user: &User, issued_at: i64, ttl: Duration) -> Self {
        Self {
            user_id: user.id.to_string(),
            email: user.email.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            avatar: user.avatar.clone(),
            phone: user.phone.clone(),
            is_phone_verified: user.is_phone_verified,
            roles: normalize_roles(user.roles.iter().cloned()),
            iat: issued_at,
            exp: issued_at + ttl.num_seconds(),
        }
    }

    pub fn snapshot(&self) -> UserSnapshot {
        UserSnapshot {
            id: self.user_id.clone(),
            email: self.email.clone(),
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            avatar: self.avatar.clone(),
            phone: self.phone.clone(),
            is_phone_verified: self.is_phone_verified,
            roles: self.roles.clone(),
        }
    }
}

/// Outcome of checking a token; failures never carry a reason past this point.
#[derive(Clone, Debug, PartialEq)]
pub enum Verification {
    Verified(TokenClaims),
    Unverified,
}

#[derive(Clone, Debug, PartialEq)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// Signs and verifies HS256 tokens with a shared secret.
#[derive(Clone)]
pub struct TokenIssuer {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl std::fmt::Debug for TokenIssuer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenIssuer")
            .field("access_ttl", &self.access_ttl)
            .field("refresh_ttl", &self.refresh_ttl)
            .finish()
    }
}

impl TokenIssuer {
    pub fn new(
        secret: &str,
        access_ttl_seconds: i64,
        refresh_ttl_seconds: i64,
    ) -> Result<Self, ConfigError> {
        if access_ttl_seconds <= 0 || refresh_ttl_seconds <= 0 {
            return Err(ConfigError::InvalidTokenLifetime("token ttl must be positive"));
        }

        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            access_ttl: Duration::seconds(access_ttl_seconds),
            refresh_ttl: Duration::seconds(refresh_ttl_seconds),
        })
    }

    /// Signs an access and a refresh token from the same claim set.
    pub fn issue(&self, user: &User) -> Result<TokenPair, Error> {
        let now = Utc::now().timestamp();

        Ok(TokenPair {
            access_token: self.sign(&TokenClaims::for_user(user, now, self.access_ttl))?,
            refresh_token: self.sign(&TokenClaims::for_user(user, now, self.refresh_ttl))?,
        })
    }

    pub fn sign(&self, claims: &TokenClaims) -> Result<String, Error> {
        Ok(jsonwebtoken::encode(
            &Header::new(Algorithm::HS256),
            claims,
            &self.encoding_key,
        )?)
    }

    pub fn verify(&self, token: &str) -> Verification {
        match jsonwebtoken::decode::<TokenClaims>(token, &self.decoding_key, &self.validation) {
            Ok(data) => Verification::Verified(data.claims),
            Err(e) => {
                tracing::debug!("token rejected: {}", e);
                Verification::Unverified
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn issuer() -> TokenIssuer {
        TokenIssuer::new("test-secret", 3600, 30 * 24 * 3600).unwrap()
    }

    fn user() -> User {
        User {
            id: Uuid::new_v4(),
            email: "grace@example.com".into(),
            google_id: Some("g-1".into()),
            first_name: "Grace".into(),
            last_name: "Hopper".into(),
            avatar: None,
            phone: Some("+15550100".into()),
            roles: normalize_roles(["user"]),
            is_email_verified: true,
            is_phone_verified: false,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn claims(user_id: &str, iat: i64, exp: i64) -> TokenClaims {
        TokenClaims {
            user_id: user_id.into(),
            email: "u1@example.com".into(),
            first_name: "U".into(),
            last_name: "One".into(),
            avatar: None,
            phone: None,
            is_phone_verified: false,
            roles: normalize_roles(["user"]),
            iat,
            exp,
        }
    }

    #[test]
    fn issued_pair_verifies_with_distinct_expiries() {
        let issuer = issuer();
        let user = user();

        let pair = issuer.issue(&user).unwrap();
        assert_eq!(pair.access_token.split('.').count(), 3);

        let Verification::Verified(access) = issuer.verify(&pair.access_token) else {
            panic!("access token should verify");
        };
        let Verification::Verified(refresh) = issuer.verify(&pair.refresh_token) else {
            panic!("refresh token should verify");
        };

        assert_eq!(access.user_id, user.id.to_string());
        assert_eq!(access.exp - access.iat, 3600);
        assert_eq!(refresh.exp - refresh.iat, 30 * 24 * 3600);
        assert!(access.exp > access.iat);
        assert_eq!(access.phone.as_deref(), Some("+15550100"));
    }

    #[test]
    fn one_hour_token_verifies_immediately() {
        let issuer = issuer();
        let now = Utc::now().timestamp();

        let token = issuer.sign(&claims("u1", now, now + 3600)).unwrap();

        match issuer.verify(&token) {
            Verification::Verified(claims) => assert_eq!(claims.user_id, "u1"),
            Verification::Unverified => panic!("fresh token should verify"),
        }
    }

    #[test]
    fn expired_token_is_unverified() {
        let issuer = issuer();
        let now = Utc::now().timestamp();

        let token = issuer.sign(&claims("u1", now - 7200, now - 3600)).unwrap();

        assert_eq!(issuer.verify(&token), Verification::Unverified);
    }

    #[test]
    fn foreign_signature_is_unverified() {
        let other = TokenIssuer::new("another-secret", 3600, 7200).unwrap();
        let now = Utc::now().timestamp();

        let token = other.sign(&claims("u1", now, now + 3600)).unwrap();

        assert_eq!(issuer().verify(&token), Verification::Unverified);
    }

    #[test]
    fn garbage_is_unverified() {
        assert_eq!(issuer().verify("not-a-jwt"), Verification::Unverified);
        assert_eq!(issuer().verify(""), Verification::Unverified);
    }

    #[test]
    fn claims_never_carry_empty_roles() {
        let mut user = user();
        user.roles.clear();

        let claims = TokenClaims::for_user(&user, 0, Duration::seconds(60));

        assert_eq!(claims.roles, normalize_roles(["user"]));
    }

    #[test]
    fn rejects_non_positive_lifetimes() {
        assert!(TokenIssuer::new("s", 0, 60).is_err());
        assert!(TokenIssuer::new("s", 60, -1).is_err());
    }
}
