//! Configuration loading from environment.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use anyhow::Context;
use ledger_repo::PoolSettings;

/// Application configuration.
#[derive(Debug)]
pub struct Config {
    pub port: u16,
    pub database_url: String,
    pub pool: PoolSettings,
    /// Opens the demo accounts A, B and C on startup when they are missing.
    pub seed_demo_accounts: bool,
}

impl Config {
    /// Loads configuration from environment variables.
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let port = parse_or(&lookup, "PORT", 3000)?;

        let database_url = lookup("DATABASE_URL")
            .ok_or_else(|| anyhow::anyhow!("DATABASE_URL environment variable is required"))?;

        let pool = PoolSettings {
            max_connections: parse_or(&lookup, "DB_MAX_CONNECTIONS", 10)?,
            acquire_timeout: Duration::from_secs(parse_or(&lookup, "DB_ACQUIRE_TIMEOUT_SECS", 5)?),
            statement_timeout: Duration::from_millis(parse_or(
                &lookup,
                "DB_STATEMENT_TIMEOUT_MS",
                5000,
            )?),
        };

        let seed_demo_accounts = parse_or(&lookup, "SEED_DEMO_ACCOUNTS", false)?;

        Ok(Self {
            port,
            database_url,
            pool,
            seed_demo_accounts,
        })
    }
}

fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("invalid value for {}: {:?}", key, raw)),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config_from(vars: &[(&str, &str)]) -> anyhow::Result<Config> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[("DATABASE_URL", "sqlite::memory:")]).unwrap();

        assert_eq!(config.port, 3000);
        assert_eq!(config.pool.max_connections, 10);
        assert_eq!(config.pool.acquire_timeout, Duration::from_secs(5));
        assert_eq!(config.pool.statement_timeout, Duration::from_millis(5000));
        assert!(!config.seed_demo_accounts);
    }

    #[test]
    fn test_overrides() {
        let config = config_from(&[
            ("DATABASE_URL", "postgres://localhost/ledger"),
            ("PORT", "8080"),
            ("DB_MAX_CONNECTIONS", "32"),
            ("DB_STATEMENT_TIMEOUT_MS", "250"),
            ("SEED_DEMO_ACCOUNTS", "true"),
        ])
        .unwrap();

        assert_eq!(config.port, 8080);
        assert_eq!(config.pool.max_connections, 32);
        assert_eq!(config.pool.statement_timeout, Duration::from_millis(250));
        assert!(config.seed_demo_accounts);
    }

    #[test]
    fn test_database_url_required() {
        let err = config_from(&[]).unwrap_err();

        assert!(err.to_string().contains("DATABASE_URL"));
    }

    #[test]
    fn test_invalid_number_names_the_variable() {
        let err = config_from(&[("DATABASE_URL", "x"), ("PORT", "eighty")]).unwrap_err();

        assert!(err.to_string().contains("PORT"));
    }
}
