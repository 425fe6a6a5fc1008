use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const DEFAULT_ROLE: &str = "user";
pub const ADMIN_ROLE: &str = "admin";

pub type Roles = BTreeSet<String>;

/// Collects roles, falling back to the default role for an empty set.
pub fn normalize_roles<I, S>(roles: I) -> Roles
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let mut roles = roles
        .into_iter()
        .map(|role| Into::<String>::into(role).trim().to_owned())
        .filter(|role| !role.is_empty())
        .collect::<Roles>();

    if roles.is_empty() {
        roles.insert(DEFAULT_ROLE.to_owned());
    }

    roles
}

/// Persisted account row.
#[derive(Clone, Debug, PartialEq)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub google_id: Option<String>,
    pub first_name: String,
    pub last_name: String,
    pub avatar: Option<String>,
    pub phone: Option<String>,
    pub roles: Roles,
    pub is_email_verified: bool,
    pub is_phone_verified: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Clone, Debug)]
pub struct NewUser {
    pub email: String,
    pub google_id: Option<String>,
    pub first_name: String,
    pub last_name: String,
    pub avatar: Option<String>,
    pub is_email_verified: bool,
    pub roles: Roles,
}

impl NewUser {
    pub fn from_identity(identity: &ExternalIdentity) -> Self {
        Self {
            email: identity.email.clone(),
            google_id: Some(identity.subject.clone()),
            first_name: identity.given_name.clone(),
            last_name: identity.family_name.clone(),
            avatar: identity.picture.clone(),
            is_email_verified: identity.email_verified,
            roles: normalize_roles([DEFAULT_ROLE]),
        }
    }
}

/// Identity asserted by a third-party sign-on provider.
#[derive(Clone, Debug, PartialEq)]
pub struct ExternalIdentity {
    pub subject: String,
    pub email: String,
    pub given_name: String,
    pub family_name: String,
    pub picture: Option<String>,
    pub email_verified: bool,
}

/// Profile as captured in a token at issuance time.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSnapshot {
    pub id: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub avatar: Option<String>,
    pub phone: Option<String>,
    pub is_phone_verified: bool,
    pub roles: Roles,
}

impl UserSnapshot {
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.contains(role)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_roles_fall_back_to_default() {
        assert_eq!(normalize_roles(Vec::<String>::new()), normalize_roles(["user"]));
        assert_eq!(normalize_roles(["", "  "]), normalize_roles(["user"]));
    }

    #[test]
    fn roles_are_trimmed() {
        let roles = normalize_roles([" admin", "user "]);

        assert_eq!(roles, normalize_roles(["admin", "user"]));
        assert!(roles.contains(ADMIN_ROLE));
    }

    #[test]
    fn roles_are_deduplicated() {
        let roles = normalize_roles(["admin", "user", "admin"]);

        assert_eq!(roles.len(), 2);
        assert!(roles.contains("admin"));
    }

    #[test]
    fn new_user_from_identity_gets_default_role() {
        let identity = ExternalIdentity {
            subject: "google-123".into(),
            email: "ada@example.com".into(),
            given_name: "Ada".into(),
            family_name: "Lovelace".into(),
            picture: None,
            email_verified: true,
        };

        let user = NewUser::from_identity(&identity);

        assert_eq!(user.google_id.as_deref(), Some("google-123"));
        assert_eq!(user.roles, normalize_roles(["user"]));
        assert!(user.is_email_verified);
    }
}
