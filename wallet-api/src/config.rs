//! Server configuration

use serde::{Deserialize, Serialize};
use wallet_provider::HttpProviderConfig;

/// Wallet server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Listen address, e.g. `0.0.0.0:8080`
    pub listen_addr: String,

    /// Service name
    pub service_name: String,

    /// User IDs holding the admin capability
    pub admins: Vec<String>,

    /// Wallet store configuration
    pub ledger: wallet_ledger::Config,

    /// Payment provider client configuration
    pub provider: HttpProviderConfig,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:8080".to_string(),
            service_name: "wallet-api".to_string(),
            admins: Vec::new(),
            ledger: wallet_ledger::Config::default(),
            provider: HttpProviderConfig::default(),
        }
    }
}

impl ApiConfig {
    /// Load from a TOML file
    pub fn from_file(path: impl AsRef<std::path::Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: ApiConfig = toml::from_str(&content)?;
        Ok(config)
    }

    /// Load defaults with environment overrides
    pub fn from_env() -> anyhow::Result<Self> {
        let mut config = ApiConfig::default();

        if let Ok(addr) = std::env::var("WALLET_LISTEN_ADDR") {
            config.listen_addr = addr;
        }
        if let Ok(data_dir) = std::env::var("WALLET_DATA_DIR") {
            config.ledger.data_dir = data_dir.into();
        }
        if let Ok(url) = std::env::var("WALLET_PROVIDER_URL") {
            config.provider.base_url = url;
        }
        if let Ok(key) = std::env::var("WALLET_PROVIDER_API_KEY") {
            config.provider.api_key = key;
        }
        if let Ok(admins) = std::env::var("WALLET_ADMINS") {
            config.admins = admins
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }

        Ok(config)
    }
}
