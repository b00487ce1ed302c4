mod env;
mod types;

#[cfg(test)]
mod tests;

pub use types::*;

use std::path::Path;

use anyhow::Context;
use lectern_llm::Temperature;

use crate::vault::{Secret, VaultProvider};

impl Config {
    /// Load configuration from a TOML file with env var overrides.
    ///
    /// Falls back to defaults when the file does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path).context("failed to read config file")?;
            toml::from_str::<Self>(&content).context("failed to parse config file")?
        } else {
            tracing::debug!(path = %path.display(), "config file not found, using defaults");
            Self::default()
        };

        config.apply_env_overrides();
        Ok(config)
    }

    /// Check the `[llm]` section. Apply command-line overrides first.
    ///
    /// # Errors
    ///
    /// Returns an error naming the first invalid setting.
    pub fn validate_llm(&self) -> anyhow::Result<()> {
        Temperature::new(self.llm.temperature).context("invalid [llm] temperature")?;
        if self.llm.model.trim().is_empty() {
            anyhow::bail!("[llm] model must not be empty");
        }
        if self.llm.base_url.trim().is_empty() {
            anyhow::bail!("[llm] base_url must not be empty");
        }
        Ok(())
    }

    /// Check the `[documents]` section.
    ///
    /// # Errors
    ///
    /// Returns an error naming the first invalid setting.
    pub fn validate_documents(&self) -> anyhow::Result<()> {
        if self.documents.glob.trim().is_empty() {
            anyhow::bail!("[documents] glob must not be empty");
        }
        if self.documents.max_file_size == 0 {
            anyhow::bail!("[documents] max_file_size must be greater than zero");
        }
        Ok(())
    }

    /// Resolve sensitive configuration values through the vault.
    ///
    /// # Errors
    ///
    /// Returns an error if the vault backend fails.
    pub async fn resolve_secrets(&mut self, vault: &dyn VaultProvider) -> anyhow::Result<()> {
        if let Some(val) = vault.get_secret("OPENAI_API_KEY").await? {
            self.secrets.openai_api_key = Some(Secret::new(val));
        }
        Ok(())
    }
}
