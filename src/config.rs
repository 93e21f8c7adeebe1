use anyhow::{bail, Context, Result};
use std::path::PathBuf;

use crate::repository::HostedTableConfig;
use crate::scoring::{ScoringPolicy, WeightTable};

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 3000;

/// Which repository implementation backs the service
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageBackend {
    Memory,
    Postgres { database_url: String },
    Hosted(HostedTableConfig),
}

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub storage: StorageBackend,
    pub scoring_policy: ScoringPolicy,
    /// Overrides the policy table when set
    pub weights_file: Option<PathBuf>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from any key lookup; blank values count as unset
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let port = match var("PORT") {
            Some(port) => port
                .trim()
                .parse::<u16>()
                .with_context(|| format!("PORT must be a number, got {port:?}"))?,
            None => DEFAULT_PORT,
        };

        let storage = match var("SCOREBOARD_STORAGE")
            .map(|s| s.trim().to_ascii_lowercase())
            .as_deref()
        {
            None | Some("memory") => StorageBackend::Memory,
            Some("postgres") => StorageBackend::Postgres {
                database_url: var("DATABASE_URL")
                    .context("DATABASE_URL is required for postgres storage")?,
            },
            Some("hosted") => StorageBackend::Hosted(HostedTableConfig {
                base_url: var("HOSTED_TABLE_URL")
                    .context("HOSTED_TABLE_URL is required for hosted storage")?,
                api_key: var("HOSTED_TABLE_KEY")
                    .context("HOSTED_TABLE_KEY is required for hosted storage")?,
            }),
            Some(other) => bail!("Unknown SCOREBOARD_STORAGE value: {other}"),
        };

        let scoring_policy = match var("SCORING_POLICY") {
            Some(policy) => policy.parse::<ScoringPolicy>().context("Invalid SCORING_POLICY")?,
            None => ScoringPolicy::default(),
        };

        Ok(Self {
            host: var("HOST").unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port,
            storage,
            scoring_policy,
            weights_file: var("SCORING_WEIGHTS_FILE").map(PathBuf::from),
        })
    }

    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// The weights file when configured, otherwise the named policy
    pub fn load_weights(&self) -> Result<WeightTable> {
        match &self.weights_file {
            Some(path) => WeightTable::from_json_file(path)
                .with_context(|| format!("Failed to load weights from {}", path.display())),
            None => Ok(WeightTable::for_policy(self.scoring_policy)),
        }
    }
}
