//! Database fixtures for tests across the workspace.

use migration::Migrator;
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use sea_orm_migration::MigratorTrait;
use tempfile::TempDir;

/// Fresh migrated in-memory SQLite database.
///
/// Capped at one connection: every pooled connection to `sqlite::memory:`
/// would otherwise open its own empty database.
pub async fn setup_test_db() -> DatabaseConnection {
    let mut options = ConnectOptions::new("sqlite::memory:");
    options.max_connections(1);

    let db = Database::connect(options)
        .await
        .expect("Failed to connect to in-memory db");

    Migrator::up(&db, None)
        .await
        .expect("Failed to run migrations");

    db
}

/// Fresh migrated SQLite database in a temporary directory, with a normal
/// connection pool. Used where a test needs genuinely concurrent connections;
/// the returned guard deletes the directory on drop.
pub async fn setup_file_test_db() -> (DatabaseConnection, TempDir) {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let url = format!("sqlite://{}?mode=rwc", dir.path().join("test.db").display());

    let db = Database::connect(&url)
        .await
        .expect("Failed to connect to file-backed db");

    Migrator::up(&db, None)
        .await
        .expect("Failed to run migrations");

    (db, dir)
}
