use colored::Colorize;
use sea_orm::Database;
use sea_orm_migration::prelude::*;
use std::time::Instant;

/// Applies every registered migration in order, one progress line per step.
/// Exits the process on the first failure.
pub async fn apply_all(url: &str) {
    let db = Database::connect(url)
        .await
        .expect("DB connection failed");
    let manager = SchemaManager::new(&db);

    let steps = <migration::Migrator as MigratorTrait>::migrations();
    let total = steps.len();
    println!("Applying {total} migrations");

    for (i, step) in steps.into_iter().enumerate() {
        let label = format!("[{}/{}] {}", i + 1, total, step.name());
        let started = Instant::now();

        match step.up(&manager).await {
            Ok(()) => {
                let elapsed = format!("({:.2?})", started.elapsed());
                println!("{label} {} {}", "ok".green(), elapsed.dimmed());
            }
            Err(e) => {
                eprintln!("{label} {}: {e}", "failed".red());
                std::process::exit(1);
            }
        }
    }
}
