use anyhow::{Context, Result};
use serde::Deserialize;
use std::str::FromStr;

pub const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub general: General,
    pub normalizer: Normalizer,
    pub ranker: Ranker,
    pub api: Api,
    #[serde(default)]
    pub observability: Observability,
}

#[derive(Debug, Clone, Deserialize)]
pub struct General {
    pub log_level: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Normalizer {
    pub min_balance_usd: f64,
    pub liquidity_pool_module: String,
    pub round_digits: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Ranker {
    pub limit: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Api {
    pub positions_api_url: String,
    /// Name of the environment variable holding the positions API key.
    pub positions_api_key_env: String,
    pub yields_api_url: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Observability {
    pub prometheus_port: Option<u16>,
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from(DEFAULT_CONFIG_PATH)
    }

    pub fn load_from(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {path}"))?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(s: &str) -> Result<Self> {
        let config: Config = toml::from_str(s).context("failed to parse config")?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        anyhow::ensure!(
            self.normalizer.min_balance_usd >= 0.0,
            "normalizer.min_balance_usd must be >= 0"
        );
        anyhow::ensure!(
            self.normalizer.round_digits <= 12,
            "normalizer.round_digits must be <= 12"
        );
        anyhow::ensure!(self.ranker.limit > 0, "ranker.limit must be > 0");
        anyhow::ensure!(
            !self.api.positions_api_url.trim().is_empty(),
            "api.positions_api_url must be set"
        );
        anyhow::ensure!(
            !self.api.yields_api_url.trim().is_empty(),
            "api.yields_api_url must be set"
        );
        anyhow::ensure!(self.api.timeout_secs > 0, "api.timeout_secs must be > 0");
        Ok(())
    }

    /// Positions API key, read from the configured environment variable.
    pub fn positions_api_key(&self) -> Option<String> {
        std::env::var(&self.api.positions_api_key_env)
            .ok()
            .filter(|k| !k.trim().is_empty())
    }
}

impl FromStr for Config {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::from_toml_str(s)
    }
}
