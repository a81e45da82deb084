//! HTTP surface for the potability classifier

pub mod api;
pub mod config;

pub use api::{create_router, serve, ServingContext};
pub use config::ServerConfig;
