//! Database migration runner
//!
//! Runs the SQL migrations in the workspace-level `migrations/` directory
//! using sqlx's embedded migrator. Migrations are applied at server startup
//! before the router is built.
//!
//! # Example
//!
//! ```no_run
//! use leadcrm_shared::db::migrations::run_migrations;
//! # use sqlx::PgPool;
//! # async fn example(pool: PgPool) -> Result<(), Box<dyn std::error::Error>> {
//! run_migrations(&pool).await?;
//! # Ok(())
//! # }
//! ```
use sqlx::postgres::PgPool;
use tracing::{info, warn};

/// Runs all pending database migrations
///
/// # Errors
///
/// Returns an error if a migration file is malformed or fails to execute.
pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    info!("Starting database migrations");

    let migrations = sqlx::migrate!("../migrations");

    match migrations.run(pool).await {
        Ok(()) => {
            info!("All database migrations completed successfully");
            Ok(())
        }
        Err(e) => {
            warn!("Migration failed: {}", e);
            Err(e)
        }
    }
}
