use std::path::PathBuf;

use serde::Deserialize;

use crate::vault::Secret;

#[derive(Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub documents: DocumentsConfig,
    #[serde(default)]
    pub vault: VaultConfig,
    #[serde(skip)]
    pub secrets: ResolvedSecrets,
}

#[derive(Debug, Deserialize)]
pub struct LlmConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_temperature")]
    pub temperature: f64,
    #[serde(default)]
    pub max_tokens: Option<u32>,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            model: default_model(),
            temperature: default_temperature(),
            max_tokens: None,
        }
    }
}

fn default_base_url() -> String {
    lectern_llm::openai::DEFAULT_BASE_URL.into()
}

fn default_model() -> String {
    "gpt-4".into()
}

fn default_temperature() -> f64 {
    1.5
}

#[derive(Debug, Deserialize)]
#[allow(clippy::struct_excessive_bools)]
pub struct DocumentsConfig {
    #[serde(default = "default_directory")]
    pub directory: PathBuf,
    #[serde(default = "default_glob")]
    pub glob: String,
    #[serde(default = "default_file")]
    pub file: PathBuf,
    #[serde(default = "default_max_file_size")]
    pub max_file_size: u64,
    #[serde(default)]
    pub recursive: bool,
    #[serde(default)]
    pub load_hidden: bool,
    #[serde(default)]
    pub silent_errors: bool,
}

impl Default for DocumentsConfig {
    fn default() -> Self {
        Self {
            directory: default_directory(),
            glob: default_glob(),
            file: default_file(),
            max_file_size: default_max_file_size(),
            recursive: false,
            load_hidden: false,
            silent_errors: false,
        }
    }
}

fn default_directory() -> PathBuf {
    PathBuf::from("books")
}

fn default_glob() -> String {
    "*.pdf".into()
}

fn default_file() -> PathBuf {
    PathBuf::from("dl-curriculum.pdf")
}

fn default_max_file_size() -> u64 {
    50 * 1024 * 1024
}

#[derive(Debug, Deserialize)]
pub struct VaultConfig {
    #[serde(default = "default_env_file")]
    pub env_file: PathBuf,
}

impl Default for VaultConfig {
    fn default() -> Self {
        Self {
            env_file: default_env_file(),
        }
    }
}

fn default_env_file() -> PathBuf {
    PathBuf::from(".env")
}

#[derive(Debug, Default)]
pub struct ResolvedSecrets {
    pub openai_api_key: Option<Secret>,
}
