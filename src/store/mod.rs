pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use uuid::Uuid;

use crate::core::error::Error;
use crate::types::user::{NewUser, Roles, User};

pub use memory::HashMapUserStore;
pub use postgres::PgUserStore;

/// Account persistence consulted at sign-in, refresh and role changes.
/// Request authentication never touches it.
#[async_trait]
pub trait UserStore: Send + Sync + std::fmt::Debug {
    async fn find_by_google_id(&self, google_id: &str) -> Result<Option<User>, Error>;

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, Error>;

    /// Attaches an external subject to an account first created some other way.
    async fn link_google_id(
        &self,
        id: Uuid,
        google_id: &str,
        email_verified: bool,
    ) -> Result<User, Error>;

    async fn create(&self, user: NewUser) -> Result<User, Error>;

    async fn get_by_id(&self, id: Uuid) -> Result<Option<User>, Error>;

    async fn update_roles(&self, id: Uuid, roles: Roles) -> Result<User, Error>;

    async fn ping(&self) -> Result<(), Error>;
}
