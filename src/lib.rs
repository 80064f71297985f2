pub mod clinic;
pub mod config;
pub mod db;
pub mod models;

use tracing_subscriber::EnvFilter;

use db::{Database, DatabaseError};

/// Composition root: set up logging, open the one database handle, seed
/// it on request and print a summary of what is stored.
pub fn run() -> Result<(), DatabaseError> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .init();

    tracing::info!("{} starting v{}", config::APP_NAME, config::APP_VERSION);

    let path = config::database_path();
    let database = Database::open(&path)?;

    if config::seed_requested() {
        let seeded = database.with_conn(db::seed::seed_demo_data)?;
        tracing::info!(seeded, "Seed requested");
    }

    let summary = database.with_conn(db::summarize)?;
    match serde_json::to_string_pretty(&summary) {
        Ok(json) => println!("{json}"),
        Err(e) => tracing::warn!(error = %e, "Failed to render storage summary"),
    }
    Ok(())
}
