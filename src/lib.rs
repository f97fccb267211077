pub mod config;
pub mod db;
pub mod errors;
pub mod logger;
pub mod maintenance;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod rules;
pub mod schema;
pub mod services;
pub mod validation;

// Re-export common types
pub use crate::config::AppConfig;
pub use crate::db::DbPool;
pub use crate::errors::ApiError;
pub use crate::models::UserAccount;
