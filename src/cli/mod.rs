// CLI module for dongju-gateway
// Author: kelexine (https://github.com/kelexine)

use crate::config::AppConfig;
use clap::Parser;
use std::path::PathBuf;

/// dongju-gateway - Personal color & face shape analysis gateway
#[derive(Parser, Debug, Default)]
#[command(name = "dongju-gateway", version, about, long_about = None)]
pub struct Args {
    /// Path to a TOML config file (default: ~/.dongju-gateway/config.toml)
    #[arg(long, env = "DONGJU_GATEWAY_CONFIG")]
    pub config: Option<PathBuf>,

    /// Address to bind
    #[arg(long)]
    pub host: Option<String>,

    /// Port to listen on
    #[arg(long)]
    pub port: Option<u16>,

    /// Base URL of the analysis service
    #[arg(long)]
    pub upstream_url: Option<String>,
}

impl Args {
    /// Apply flags on top of the loaded configuration.
    pub fn apply(&self, config: &mut AppConfig) {
        if let Some(host) = &self.host {
            config.server.host = host.clone();
        }
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if let Some(url) = &self.upstream_url {
            config.upstream.base_url = url.clone();
        }
    }
}
