//! Database migration command.
//!
//! Runs the store migrations from `crates/store/migrations/`. The store
//! binary never migrates on startup; this command is the only migration
//! path.

use super::{CommandError, connect};

/// Run all pending store migrations.
///
/// # Errors
///
/// Returns `CommandError` if the database is unreachable or a migration fails.
pub async fn run() -> Result<(), CommandError> {
    let pool = connect().await?;

    tracing::info!("Running store migrations...");
    sqlx::migrate!("../store/migrations").run(&pool).await?;

    tracing::info!("Store migrations complete!");
    Ok(())
}
