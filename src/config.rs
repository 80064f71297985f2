use std::path::PathBuf;

/// Application-level constants
pub const APP_NAME: &str = "Medidesk";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Overrides the database file location.
pub const DB_PATH_ENV: &str = "MEDIDESK_DB";
/// Set to `1` or `true` to seed demo data into an empty database.
pub const SEED_ENV: &str = "MEDIDESK_SEED";

/// Get the application data directory
/// ~/Medidesk/ on all platforms; the working directory when no home exists.
pub fn app_data_dir() -> PathBuf {
    match dirs::home_dir() {
        Some(home) => home.join(APP_NAME),
        None => PathBuf::from("."),
    }
}

/// Database file: `$MEDIDESK_DB` if set, else `hospital.db` in the data dir.
pub fn database_path() -> PathBuf {
    match std::env::var_os(DB_PATH_ENV) {
        Some(path) if !path.is_empty() => PathBuf::from(path),
        _ => app_data_dir().join("hospital.db"),
    }
}

pub fn seed_requested() -> bool {
    std::env::var(SEED_ENV)
        .map(|v| is_truthy(&v))
        .unwrap_or(false)
}

fn is_truthy(value: &str) -> bool {
    matches!(value.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes")
}

/// Log filter used when `RUST_LOG` is not set.
pub fn default_log_filter() -> &'static str {
    "medidesk_lib=info,medidesk=info"
}
