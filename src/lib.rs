pub mod auth;
pub mod budget;
pub mod chains;
pub mod config;
pub mod database;
pub mod engine;
pub mod error;
pub mod health;
pub mod jobs;
pub mod metrics;
pub mod routes;
pub mod server;
pub mod shutdown;
pub mod templates;
pub mod test_utils;

pub use config::Config;
pub use server::Server;
