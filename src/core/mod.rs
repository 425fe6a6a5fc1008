pub mod config;
pub mod error;
pub mod proxy;
pub mod registry;
pub mod state;
