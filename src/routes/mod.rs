pub mod auth;
pub mod discovery;
pub mod health;
pub mod proxy;
pub mod router;
