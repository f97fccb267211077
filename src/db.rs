use actix_web::web;
use diesel::connection::SimpleConnection;
use diesel::pg::PgConnection;
use diesel::r2d2::{self, ConnectionManager};
use log::{error, info};
use std::time::Duration;

use crate::config::{AppConfig, DB_INIT_SQL};
use crate::errors::ApiError;

pub type DbPool = r2d2::Pool<ConnectionManager<PgConnection>>;

pub fn build_pool(config: &AppConfig) -> Result<DbPool, ApiError> {
    let manager = ConnectionManager::<PgConnection>::new(config.database_url.clone());
    r2d2::Pool::builder()
        .max_size(config.db_pool_size)
        .connection_timeout(Duration::from_secs(10))
        .build(manager)
        .map_err(|e| {
            error!("Failed to create database connection pool: {}", e);
            ApiError::DatabaseError(e.to_string())
        })
}

/// Creates tables, indexes and seeds reference data. Safe to run repeatedly.
pub fn init_schema(pool: &DbPool) -> Result<(), ApiError> {
    let mut conn = pool.get()?;
    conn.batch_execute(DB_INIT_SQL).map_err(|e| {
        error!("Failed to execute database initialization script: {}", e);
        ApiError::DatabaseError(e.to_string())
    })?;
    info!("Database initialization complete.");
    Ok(())
}

/// Runs `f` with a pooled connection on the blocking thread pool.
pub async fn run<F, T>(pool: &DbPool, f: F) -> Result<T, ApiError>
where
    F: FnOnce(&mut PgConnection) -> Result<T, ApiError> + Send + 'static,
    T: Send + 'static,
{
    let pool = pool.clone();
    web::block(move || {
        let mut conn = pool.get()?;
        f(&mut *conn)
    })
    .await?
}

/// Cheap connectivity check for the index route.
pub async fn ping(pool: &DbPool) -> bool {
    let result = run(pool, |conn| {
        conn.batch_execute("SELECT 1").map_err(ApiError::from)
    })
    .await;

    match result {
        Ok(_) => true,
        Err(e) => {
            error!("Database connectivity check failed: {}", e);
            false
        }
    }
}
