//! Connection configuration.
//!
//! The backend is chosen by the URL scheme and must match an enabled cargo
//! feature (`sqlite` by default, `postgresql` or `mysql`).

use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr};
use std::time::Duration;

const DEFAULT_DATABASE_URL: &str = "sqlite::memory:";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub connect_timeout: Duration,
    pub sqlx_logging: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_DATABASE_URL.to_string(),
            // A second connection to `sqlite::memory:` would see an empty database
            max_connections: 1,
            min_connections: 1,
            connect_timeout: Duration::from_secs(30),
            sqlx_logging: false,
        }
    }
}

impl DatabaseConfig {
    /// Read `DATABASE_URL`, `DATABASE_MAX_CONNECTIONS` and `DATABASE_SQLX_LOGGING`,
    /// keeping the default for anything unset or unparsable.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(url) = lookup("DATABASE_URL") {
            config.url = url;
        }
        if let Some(raw) = lookup("DATABASE_MAX_CONNECTIONS") {
            match raw.parse::<u32>() {
                Ok(max) if max > 0 => {
                    config.max_connections = max;
                    config.min_connections = config.min_connections.min(max);
                }
                _ => tracing::warn!(value = %raw, "Ignoring invalid DATABASE_MAX_CONNECTIONS"),
            }
        }
        if let Some(raw) = lookup("DATABASE_SQLX_LOGGING") {
            config.sqlx_logging = matches!(raw.to_ascii_lowercase().as_str(), "1" | "true" | "yes");
        }
        config
    }

    #[must_use]
    pub fn connect_options(&self) -> ConnectOptions {
        let mut opt = ConnectOptions::new(self.url.clone());
        opt.max_connections(self.max_connections)
            .min_connections(self.min_connections)
            .connect_timeout(self.connect_timeout)
            .acquire_timeout(self.connect_timeout)
            .sqlx_logging(self.sqlx_logging);
        opt
    }

    /// Open a connection pool.
    ///
    /// # Errors
    ///
    /// Returns the store's `DbErr` if the URL is invalid or unreachable.
    pub async fn connect(&self) -> Result<DatabaseConnection, DbErr> {
        tracing::debug!(
            max_connections = self.max_connections,
            sqlx_logging = self.sqlx_logging,
            "Connecting to database"
        );
        Database::connect(self.connect_options()).await
    }
}
