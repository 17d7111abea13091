//! Request-layer configuration resolved from environment variables.
//!
//! # Invariants
//! - Blank environment values count as unset.
//! - Unknown strategy names and non-numeric retry bounds are rejected, not
//!   silently replaced by defaults.

use giftring_core::{AssignmentStrategy, DEFAULT_GREEDY_MAX_ATTEMPTS};
use std::path::PathBuf;

/// SQLite database file path.
pub const DB_PATH_ENV: &str = "GIFTRING_DB_PATH";
/// Draw strategy name: `cycle` or `greedy`.
pub const DRAW_STRATEGY_ENV: &str = "GIFTRING_DRAW_STRATEGY";
/// Retry bound for the `greedy` strategy.
pub const GREEDY_ATTEMPTS_ENV: &str = "GIFTRING_GREEDY_MAX_ATTEMPTS";

const DEFAULT_DB_FILE_NAME: &str = "giftring.sqlite3";

/// Settings needed to serve requests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiConfig {
    pub db_path: PathBuf,
    pub strategy: AssignmentStrategy,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            db_path: std::env::temp_dir().join(DEFAULT_DB_FILE_NAME),
            strategy: AssignmentStrategy::default(),
        }
    }
}

impl ApiConfig {
    /// Resolves configuration from the process environment.
    pub fn from_env() -> Result<Self, String> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Resolves configuration through `lookup`, falling back to defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, String> {
        let read = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let mut config = Self::default();
        if let Some(path) = read(DB_PATH_ENV) {
            config.db_path = PathBuf::from(path);
        }
        if let Some(name) = read(DRAW_STRATEGY_ENV) {
            config.strategy = parse_draw_strategy(&name, read(GREEDY_ATTEMPTS_ENV).as_deref())?;
        }
        Ok(config)
    }
}

/// Parses a strategy name plus optional greedy retry bound.
pub fn parse_draw_strategy(
    name: &str,
    max_attempts: Option<&str>,
) -> Result<AssignmentStrategy, String> {
    match name.trim().to_ascii_lowercase().as_str() {
        "cycle" => Ok(AssignmentStrategy::RandomCycle),
        "greedy" => {
            let max_attempts = match max_attempts {
                Some(raw) => raw.trim().parse::<u32>().map_err(|err| {
                    format!("invalid greedy max attempts `{raw}`: {err}")
                })?,
                None => DEFAULT_GREEDY_MAX_ATTEMPTS,
            };
            Ok(AssignmentStrategy::GreedyWithRetry { max_attempts })
        }
        other => Err(format!(
            "unsupported draw strategy `{other}`; expected cycle|greedy"
        )),
    }
}
