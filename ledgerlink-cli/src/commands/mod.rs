//! CLI command implementations

pub mod convert;
pub mod fetch;
pub mod link;
pub mod reconcile;
pub mod version;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;

use ledgerlink_core::adapters::FireflyClient;
use ledgerlink_core::ApiConfig;

/// Firefly III connection flags, shared by every command that talks to it
#[derive(Args)]
pub struct ApiArgs {
    /// URL of the Firefly III instance
    #[arg(short, long, global = true, env = "FIREFLY_URL")]
    pub endpoint: Option<String>,

    /// Personal access token (generate one at /profile)
    #[arg(short, long, global = true, env = "FIREFLY_ACCESS_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Read the access token from a file; takes precedence over --token
    #[arg(long, global = true)]
    pub token_file: Option<PathBuf>,
}

impl ApiArgs {
    /// Resolve flags, environment and token file into connection settings
    pub fn config(&self) -> Result<ApiConfig> {
        let endpoint = match &self.endpoint {
            Some(endpoint) => endpoint.clone(),
            None => std::env::var("FIREFLY_III_URL")
                .context("Firefly URL is required (--endpoint or FIREFLY_URL)")?,
        };
        let token = match (&self.token, &self.token_file) {
            (_, Some(path)) => std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read token file: {:?}", path))?,
            (Some(token), None) => token.clone(),
            (None, None) => {
                anyhow::bail!("Access token is required (--token, --token-file or FIREFLY_ACCESS_TOKEN)")
            }
        };
        Ok(ApiConfig::new(&endpoint, &token)?)
    }

    pub fn client(&self) -> Result<Arc<FireflyClient>> {
        Ok(Arc::new(FireflyClient::new(&self.config()?)?))
    }
}

/// Get the ledgerlink directory from environment or default
pub fn get_ledgerlink_dir() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var("LEDGERLINK_DIR") {
        return Ok(PathBuf::from(dir));
    }
    Ok(dirs::home_dir()
        .context("Could not find home directory")?
        .join(".ledgerlink"))
}
