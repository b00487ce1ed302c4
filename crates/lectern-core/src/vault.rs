use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::path::Path;
use std::pin::Pin;

use anyhow::Context;
use serde::Deserialize;

/// Wrapper for sensitive strings with redacted Debug/Display.
#[derive(Clone, Deserialize)]
#[serde(transparent)]
pub struct Secret(String);

impl Secret {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}

impl fmt::Display for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}

/// Pluggable secret retrieval backend.
pub trait VaultProvider: Send + Sync {
    fn get_secret(
        &self,
        key: &str,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<Option<String>>> + Send + '_>>;
}

/// Reads secrets from a `.env` file held in memory.
///
/// The file is parsed once and never copied into the process environment.
/// Keys absent from the file fall back to process environment variables
/// unless [`DotenvVaultProvider::without_env_fallback`] is used.
pub struct DotenvVaultProvider {
    entries: HashMap<String, String>,
    env_fallback: bool,
}

impl fmt::Debug for DotenvVaultProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DotenvVaultProvider")
            .field("entries", &format_args!("[{} secrets]", self.entries.len()))
            .field("env_fallback", &self.env_fallback)
            .finish()
    }
}

impl DotenvVaultProvider {
    /// Parse `path` as a dotenv file. A missing file yields an empty vault.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or contains a
    /// malformed line.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no env file, using process environment only");
            return Ok(Self::from_entries(HashMap::new()));
        }
        let iter = dotenv::from_path_iter(path)
            .with_context(|| format!("failed to open env file {}", path.display()))?;
        let mut entries = HashMap::new();
        for item in iter {
            let (key, value) =
                item.with_context(|| format!("failed to parse env file {}", path.display()))?;
            entries.insert(key, value);
        }
        tracing::debug!(path = %path.display(), count = entries.len(), "loaded env file");
        Ok(Self::from_entries(entries))
    }

    #[must_use]
    pub fn from_entries(entries: HashMap<String, String>) -> Self {
        Self {
            entries,
            env_fallback: true,
        }
    }

    #[must_use]
    pub fn without_env_fallback(mut self) -> Self {
        self.env_fallback = false;
        self
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl VaultProvider for DotenvVaultProvider {
    fn get_secret(
        &self,
        key: &str,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<Option<String>>> + Send + '_>> {
        let result = self
            .entries
            .get(key)
            .cloned()
            .or_else(|| {
                self.env_fallback
                    .then(|| std::env::var(key).ok())
                    .flatten()
            });
        Box::pin(async move { Ok(result) })
    }
}

/// Test helper with HashMap-based secret storage.
#[cfg(test)]
#[derive(Default)]
pub struct MockVaultProvider {
    secrets: HashMap<String, String>,
}

#[cfg(test)]
impl MockVaultProvider {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_secret(mut self, key: &str, value: &str) -> Self {
        self.secrets.insert(key.to_owned(), value.to_owned());
        self
    }
}

#[cfg(test)]
impl VaultProvider for MockVaultProvider {
    fn get_secret(
        &self,
        key: &str,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<Option<String>>> + Send + '_>> {
        let result = self.secrets.get(key).cloned();
        Box::pin(async move { Ok(result) })
    }
}
