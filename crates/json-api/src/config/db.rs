//! Database Config

use clap::{Args, ValueEnum};

/// Where carts, orders and checkout attempts are kept.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum StorageBackend {
    /// `PostgreSQL`, migrated on startup.
    Postgres,

    /// Process memory; everything is lost on restart.
    Memory,
}

/// Database settings.
#[derive(Debug, Args)]
pub struct DatabaseConfig {
    /// Storage backend (postgres, memory)
    #[arg(
        long,
        env = "STORAGE_BACKEND",
        value_enum,
        default_value_t = StorageBackend::Postgres
    )]
    pub storage_backend: StorageBackend,

    /// `PostgreSQL` connection string, required for the postgres backend
    #[arg(long, env = "DATABASE_URL", hide_env_values = true)]
    pub database_url: Option<String>,
}
