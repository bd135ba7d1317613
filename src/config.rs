//! Configuration for the Launchflow engine
//!
//! Loads configuration from TOML files with environment variable substitution.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Root configuration structure
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub engine: EngineConfig,
    pub chain: ChainConfig,
    pub contracts: ContractsConfig,
    pub wallet: WalletConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EngineConfig {
    /// Default tolerated slippage in basis points (100 = 1%)
    pub slippage_bps: u32,
    /// Deadline horizon for bounded calls, anchored to chain time
    pub deadline_minutes: u32,
    /// Dwell window before a settled flow auto-resets to idle
    pub settle_dwell_secs: u64,
    /// Rounding slack tolerated when clamping a caller amount to the
    /// adapter-declared maximum (1 = 0.01%)
    pub amount_slack_bps: u32,
    /// Delay past a project's end time before unsold tokens are withdrawable
    pub withdraw_delay_secs: u64,
    /// Receipt polling interval
    pub receipt_poll_ms: u64,
    /// Timeout for a single raw transaction submission
    pub submit_timeout_secs: u64,
}

impl EngineConfig {
    pub fn settle_dwell(&self) -> Duration {
        Duration::from_secs(self.settle_dwell_secs)
    }

    pub fn receipt_poll(&self) -> Duration {
        Duration::from_millis(self.receipt_poll_ms)
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            slippage_bps: 100,
            deadline_minutes: 20,
            settle_dwell_secs: 10,
            amount_slack_bps: 1,
            withdraw_delay_secs: 86_400,
            receipt_poll_ms: 1_000,
            submit_timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChainConfig {
    pub chain_id: u64,
    pub rpc_urls: Vec<String>,
    pub gas_price_strategy: GasPriceStrategy,
    pub max_gas_price_gwei: u64,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum GasPriceStrategy {
    Legacy,
    Eip1559,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ContractsConfig {
    /// AMM router handling liquidity provision, removal and swaps
    pub router: String,
    /// Launchpad contract handling deposits and unsold-token withdrawal
    pub launchpad: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WalletConfig {
    pub private_key_env: Option<String>,
}

impl Settings {
    /// Load settings from configuration files
    pub fn load() -> Result<Self> {
        let config_path = env::var("LAUNCHFLOW_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("config/default.toml"));

        let config_str = std::fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read config file: {:?}", config_path))?;

        // Substitute environment variables
        let config_str = substitute_env_vars(&config_str);

        let settings: Settings =
            toml::from_str(&config_str).with_context(|| "Failed to parse configuration")?;

        settings.validate()?;

        Ok(settings)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.chain.rpc_urls.is_empty() {
            anyhow::bail!("At least one RPC URL must be configured");
        }
        if self.engine.deadline_minutes == 0 {
            anyhow::bail!("deadline_minutes must be positive");
        }
        if self.engine.slippage_bps > 10_000 {
            anyhow::bail!("slippage_bps cannot exceed 10000");
        }
        if self.contracts.router.is_empty() || self.contracts.launchpad.is_empty() {
            anyhow::bail!("Router and launchpad contract addresses must be configured");
        }
        Ok(())
    }
}

/// Substitute environment variables in the format ${VAR_NAME}
fn substitute_env_vars(input: &str) -> String {
    let mut result = input.to_string();
    let re = regex::Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}").unwrap();

    for cap in re.captures_iter(input) {
        let var_name = &cap[1];
        let var_value = env::var(var_name).unwrap_or_default();
        result = result.replace(&cap[0], &var_value);
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_var_substitution() {
        env::set_var("TEST_VAR", "test_value");
        let input = "url = \"https://rpc.example.com/${TEST_VAR}\"";
        let result = substitute_env_vars(input);
        assert_eq!(result, "url = \"https://rpc.example.com/test_value\"");
    }

    #[test]
    fn rejects_zero_deadline() {
        let settings = Settings {
            engine: EngineConfig {
                deadline_minutes: 0,
                ..EngineConfig::default()
            },
            chain: ChainConfig {
                chain_id: 1,
                rpc_urls: vec!["http://localhost:8545".into()],
                gas_price_strategy: GasPriceStrategy::Eip1559,
                max_gas_price_gwei: 200,
            },
            contracts: ContractsConfig {
                router: "0x0000000000000000000000000000000000000001".into(),
                launchpad: "0x0000000000000000000000000000000000000002".into(),
            },
            wallet: WalletConfig {
                private_key_env: None,
            },
        };
        assert!(settings.validate().is_err());
    }
}
