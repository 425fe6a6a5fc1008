use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgRow};
use sqlx::types::Json;
use sqlx::Row;
use uuid::Uuid;

use crate::core::error::Error;
use crate::store::UserStore;
use crate::types::user::{NewUser, Roles, User, normalize_roles};

const USER_COLUMNS: &str = "id, email, google_id, first_name, last_name, avatar, phone, roles, \
is_email_verified, is_phone_verified, created_at, updated_at";

#[derive(Clone, Debug)]
pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn find_one(&self, column: &str, value: &str) -> Result<Option<User>, Error> {
        let query = format!("SELECT {USER_COLUMNS} FROM users WHERE {column} = $1 LIMIT 1;");

        Ok(sqlx::query(&query)
            .bind(value)
            .map(map_user)
            .fetch_optional(&self.pool)
            .await?)
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn find_by_google_id(&self, google_id: &str) -> Result<Option<User>, Error> {
        self.find_one("google_id", google_id).await
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, Error> {
        self.find_one("email", email).await
    }

    async fn link_google_id(
        &self,
        id: Uuid,
        google_id: &str,
        email_verified: bool,
    ) -> Result<User, Error> {
        let query = format!(
            "UPDATE users SET google_id = $2, is_email_verified = $3, updated_at = NOW() \
             WHERE id = $1 RETURNING {USER_COLUMNS};"
        );

        sqlx::query(&query)
            .bind(id)
            .bind(google_id)
            .bind(email_verified)
            .map(map_user)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(Error::UserNotFound)
    }

    async fn create(&self, user: NewUser) -> Result<User, Error> {
        let query = format!(
            "INSERT INTO users (email, google_id, first_name, last_name, avatar, is_email_verified, roles) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING {USER_COLUMNS};"
        );

        let roles = normalize_roles(user.roles).into_iter().collect::<Vec<_>>();

        match sqlx::query(&query)
            .bind(&user.email)
            .bind(&user.google_id)
            .bind(&user.first_name)
            .bind(&user.last_name)
            .bind(&user.avatar)
            .bind(user.is_email_verified)
            .bind(Json(roles))
            .map(map_user)
            .fetch_one(&self.pool)
            .await
        {
            Ok(user) => Ok(user),
            Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
                Err(Error::UserAlreadyExists)
            }
            Err(e) => Err(Error::Sql(e)),
        }
    }

    async fn get_by_id(&self, id: Uuid) -> Result<Option<User>, Error> {
        let query = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1;");

        Ok(sqlx::query(&query)
            .bind(id)
            .map(map_user)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn update_roles(&self, id: Uuid, roles: Roles) -> Result<User, Error> {
        let query = format!(
            "UPDATE users SET roles = $2, updated_at = NOW() WHERE id = $1 RETURNING {USER_COLUMNS};"
        );

        let roles = normalize_roles(roles).into_iter().collect::<Vec<_>>();

        sqlx::query(&query)
            .bind(id)
            .bind(Json(roles))
            .map(map_user)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(Error::UserNotFound)
    }

    async fn ping(&self) -> Result<(), Error> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

fn map_user(row: PgRow) -> User {
    let roles: Json<Vec<String>> = row.get("roles");

    User {
        id: row.get("id"),
        email: row.get("email"),
        google_id: row.get("google_id"),
        first_name: row.get("first_name"),
        last_name: row.get("last_name"),
        avatar: row.get("avatar"),
        phone: row.get("phone"),
        roles: normalize_roles(roles.0),
        is_email_verified: row.get("is_email_verified"),
        is_phone_verified: row.get("is_phone_verified"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}
