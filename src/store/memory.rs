use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::core::error::Error;
use crate::store::UserStore;
use crate::types::user::{NewUser, Roles, User, normalize_roles};

#[derive(Clone, Debug, Default)]
pub struct HashMapUserStore {
    users: Arc<RwLock<HashMap<Uuid, User>>>,
}

impl HashMapUserStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for HashMapUserStore {
    async fn find_by_google_id(&self, google_id: &str) -> Result<Option<User>, Error> {
        let users = self.users.read().await;

        Ok(users
            .values()
            .find(|user| user.google_id.as_deref() == Some(google_id))
            .cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, Error> {
        let users = self.users.read().await;

        Ok(users.values().find(|user| user.email == email).cloned())
    }

    async fn link_google_id(
        &self,
        id: Uuid,
        google_id: &str,
        email_verified: bool,
    ) -> Result<User, Error> {
        let mut users = self.users.write().await;

        let user = users.get_mut(&id).ok_or(Error::UserNotFound)?;
        user.google_id = Some(google_id.to_owned());
        user.is_email_verified = email_verified;
        user.updated_at = Utc::now();

        Ok(user.clone())
    }

    async fn create(&self, new_user: NewUser) -> Result<User, Error> {
        let mut users = self.users.write().await;

        let taken = users.values().any(|user| {
            user.email == new_user.email
                || (new_user.google_id.is_some() && user.google_id == new_user.google_id)
        });
        if taken {
            return Err(Error::UserAlreadyExists);
        }

        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            email: new_user.email,
            google_id: new_user.google_id,
            first_name: new_user.first_name,
            last_name: new_user.last_name,
            avatar: new_user.avatar,
            phone: None,
            roles: normalize_roles(new_user.roles),
            is_email_verified: new_user.is_email_verified,
            is_phone_verified: false,
            created_at: now,
            updated_at: now,
        };

        users.insert(user.id, user.clone());

        Ok(user)
    }

    async fn get_by_id(&self, id: Uuid) -> Result<Option<User>, Error> {
        Ok(self.users.read().await.get(&id).cloned())
    }

    async fn update_roles(&self, id: Uuid, roles: Roles) -> Result<User, Error> {
        let mut users = self.users.write().await;

        let user = users.get_mut(&id).ok_or(Error::UserNotFound)?;
        user.roles = normalize_roles(roles);
        user.updated_at = Utc::now();

        Ok(user.clone())
    }

    async fn ping(&self) -> Result<(), Error> {
        Ok(())
    }
}
