use alloy::primitives::Address;
use clap::Parser;
use serde::Deserialize;
use sqlx::SqlitePool;
use std::path::{Path, PathBuf};
use tracing::Level;

use crate::indexer::IndexerPolicy;
use crate::reducer::CounterFloor;

#[derive(Parser, Debug)]
pub struct Env {
    /// Path to TOML configuration file
    #[clap(long)]
    pub config: PathBuf,
    /// Newline-delimited JSON RPC logs to apply; reads stdin when absent
    #[clap(long)]
    pub logs: Option<PathBuf>,
}

/// Settings deserialized from the TOML configuration file.
#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct Config {
    database_url: String,
    log_level: Option<LogLevel>,
    indexer: Option<IndexerConfig>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct IndexerConfig {
    governor: Option<Address>,
    redelivery_guard: Option<bool>,
    proposal_counter_floor: Option<CounterFloor>,
}

/// Runtime context assembled from the configuration file.
#[derive(Debug, Clone)]
pub struct Ctx {
    pub(crate) database_url: String,
    pub log_level: LogLevel,
    pub policy: IndexerPolicy,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl From<LogLevel> for Level {
    fn from(log_level: LogLevel) -> Self {
        Self::from(&log_level)
    }
}

impl From<&LogLevel> for Level {
    fn from(log_level: &LogLevel) -> Self {
        match log_level {
            LogLevel::Trace => Self::TRACE,
            LogLevel::Debug => Self::DEBUG,
            LogLevel::Info => Self::INFO,
            LogLevel::Warn => Self::WARN,
            LogLevel::Error => Self::ERROR,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file")]
    Io(#[from] std::io::Error),
    #[error("failed to parse TOML")]
    Toml(#[from] toml::de::Error),
}

impl Ctx {
    pub fn load_file(config: &Path) -> Result<Self, ConfigError> {
        let config_str = std::fs::read_to_string(config)?;
        Self::from_toml(&config_str)
    }

    pub fn from_toml(config_toml: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(config_toml)?;

        let defaults = IndexerPolicy::default();
        let policy = config
            .indexer
            .map_or(defaults, |indexer| IndexerPolicy {
                governor: indexer.governor,
                redelivery_guard: indexer
                    .redelivery_guard
                    .unwrap_or(defaults.redelivery_guard),
                counter_floor: indexer
                    .proposal_counter_floor
                    .unwrap_or(defaults.counter_floor),
            });

        Ok(Self {
            database_url: config.database_url,
            log_level: config.log_level.unwrap_or(LogLevel::Debug),
            policy,
        })
    }

    pub async fn get_sqlite_pool(&self) -> Result<SqlitePool, sqlx::Error> {
        configure_sqlite_pool(&self.database_url).await
    }
}

pub(crate) async fn configure_sqlite_pool(database_url: &str) -> Result<SqlitePool, sqlx::Error> {
    let pool = SqlitePool::connect(database_url).await?;

    // WAL lets readers of the derived state query while the indexer
    // writes; there is still only ever one writer.
    sqlx::query("PRAGMA journal_mode = WAL")
        .execute(&pool)
        .await?;

    sqlx::query("PRAGMA busy_timeout = 10000")
        .execute(&pool)
        .await?;

    Ok(pool)
}

pub fn setup_tracing(log_level: &LogLevel) {
    let level: Level = log_level.into();
    let default_filter = format!("governance_indexer={level}");

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .init();
}
