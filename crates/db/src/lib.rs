//! Persistence layer: `TrainRepository` / `PlanRepository` traits, a
//! Postgres-backed implementation, and an in-memory implementation used
//! by tests and the Simulator's scratch fleet.

pub mod error;
pub mod memory;
pub mod plan_repository;
pub mod postgres;
pub mod train_repository;

pub use error::DbError;
pub use plan_repository::PlanRepository;
pub use train_repository::TrainRepository;

use sqlx::postgres::PgPoolOptions;
use std::time::Duration;

pub type DbPool = sqlx::PgPool;

/// Open a connection pool against `database_url`.
pub async fn create_pool(database_url: &str) -> Result<DbPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .acquire_timeout(Duration::from_secs(5))
        .connect(database_url)
        .await
}

/// Run the bundled migrations against `pool`. Called once at startup.
pub async fn run_migrations(pool: &DbPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}
