// Configuration module
// Author: kelexine (https://github.com/kelexine)

mod models;

pub use models::*;

use crate::error::{GatewayError, Result};
use config::{Config, Environment, File};
use std::path::{Path, PathBuf};

impl AppConfig {
    /// Load configuration from multiple sources with precedence:
    /// 1. CLI arguments (highest, applied by the caller)
    /// 2. Environment variables
    /// 3. Config file
    /// 4. Defaults (lowest)
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let (file, required) = match path {
            Some(p) => (p.to_string_lossy().to_string(), true),
            None => (Self::default_config_path(), false),
        };

        let config = Config::builder()
            .add_source(Config::try_from(&Self::default())?)
            .add_source(File::with_name(&file).required(required))
            // DONGJU_GATEWAY_UPSTREAM__BASE_URL -> upstream.base_url
            .add_source(
                Environment::with_prefix("DONGJU_GATEWAY")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| GatewayError::Config(e.to_string()))?;

        let config: AppConfig = config
            .try_deserialize()
            .map_err(|e| GatewayError::Config(e.to_string()))?;

        // Validated by the caller once CLI overrides are applied
        Ok(config)
    }

    /// Reject settings the relay cannot run with.
    pub fn validate(&self) -> Result<()> {
        let base_url = self.upstream.base_url.trim();
        if base_url.is_empty() {
            return Err(GatewayError::Config("upstream.base_url must not be blank".to_string()));
        }

        let parsed = reqwest::Url::parse(base_url)
            .map_err(|e| GatewayError::Config(format!("upstream.base_url is invalid: {}", e)))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(GatewayError::Config(format!(
                "upstream.base_url must use http or https, got {}",
                parsed.scheme()
            )));
        }

        let upstream = &self.upstream;
        if upstream.connect_timeout_ms == 0 || upstream.read_timeout_ms == 0 || upstream.file_timeout_ms == 0 {
            return Err(GatewayError::Config("upstream timeouts must be greater than zero".to_string()));
        }

        Ok(())
    }

    fn default_config_path() -> String {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".dongju-gateway")
            .join("config.toml")
            .to_string_lossy()
            .to_string()
    }
}
