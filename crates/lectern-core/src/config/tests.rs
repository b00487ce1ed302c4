use std::io::Write;
use std::path::{Path, PathBuf};

use serial_test::serial;

use super::*;
use crate::vault::MockVaultProvider;

const ENV_KEYS: [&str; 10] = [
    "LECTERN_LLM_BASE_URL",
    "LECTERN_LLM_MODEL",
    "LECTERN_LLM_TEMPERATURE",
    "LECTERN_LLM_MAX_TOKENS",
    "LECTERN_DOCUMENTS_DIRECTORY",
    "LECTERN_DOCUMENTS_GLOB",
    "LECTERN_DOCUMENTS_FILE",
    "LECTERN_DOCUMENTS_MAX_FILE_SIZE",
    "LECTERN_ENV_FILE",
    "OPENAI_API_KEY",
];

fn clear_env() {
    for key in ENV_KEYS {
        unsafe { std::env::remove_var(key) };
    }
}

fn write_config(contents: &str) -> (tempfile::TempDir, PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    let mut f = std::fs::File::create(&path).unwrap();
    write!(f, "{contents}").unwrap();
    (dir, path)
}

#[test]
fn defaults_match_command_defaults() {
    let config = Config::default();
    assert_eq!(config.llm.base_url, "https://api.openai.com/v1");
    assert_eq!(config.llm.model, "gpt-4");
    assert!((config.llm.temperature - 1.5).abs() < f64::EPSILON);
    assert!(config.llm.max_tokens.is_none());
    assert_eq!(config.documents.directory, PathBuf::from("books"));
    assert_eq!(config.documents.glob, "*.pdf");
    assert_eq!(config.documents.file, PathBuf::from("dl-curriculum.pdf"));
    assert_eq!(config.documents.max_file_size, 52_428_800);
    assert!(!config.documents.recursive);
    assert!(!config.documents.load_hidden);
    assert!(!config.documents.silent_errors);
    assert_eq!(config.vault.env_file, PathBuf::from(".env"));
    assert!(config.secrets.openai_api_key.is_none());
    assert!(config.validate_llm().is_ok());
    assert!(config.validate_documents().is_ok());
}

#[test]
#[serial]
fn missing_file_yields_defaults() {
    clear_env();
    let config = Config::load(Path::new("/nonexistent/lectern.toml")).unwrap();
    assert_eq!(config.llm.model, "gpt-4");
    assert_eq!(config.documents.glob, "*.pdf");
}

#[test]
#[serial]
fn parse_valid_toml() {
    let (_dir, path) = write_config(
        r#"
[llm]
base_url = "http://localhost:8080/v1"
model = "gpt-4o-mini"
temperature = 0.0
max_tokens = 256

[documents]
directory = "papers"
glob = "**/*.pdf"
recursive = true
silent_errors = true

[vault]
env_file = "secrets.env"
"#,
    );
    clear_env();

    let config = Config::load(&path).unwrap();
    assert_eq!(config.llm.base_url, "http://localhost:8080/v1");
    assert_eq!(config.llm.model, "gpt-4o-mini");
    assert!(config.llm.temperature.abs() < f64::EPSILON);
    assert_eq!(config.llm.max_tokens, Some(256));
    assert_eq!(config.documents.directory, PathBuf::from("papers"));
    assert_eq!(config.documents.glob, "**/*.pdf");
    assert!(config.documents.recursive);
    assert!(config.documents.silent_errors);
    assert!(!config.documents.load_hidden);
    assert_eq!(config.documents.file, PathBuf::from("dl-curriculum.pdf"));
    assert_eq!(config.vault.env_file, PathBuf::from("secrets.env"));
}

#[test]
#[serial]
fn partial_sections_keep_defaults() {
    let (_dir, path) = write_config("[llm]\nmodel = \"gpt-3.5-turbo\"\n");
    clear_env();

    let config = Config::load(&path).unwrap();
    assert_eq!(config.llm.model, "gpt-3.5-turbo");
    assert_eq!(config.llm.base_url, "https://api.openai.com/v1");
    assert_eq!(config.documents.directory, PathBuf::from("books"));
}

#[test]
#[serial]
fn invalid_toml_is_error() {
    let (_dir, path) = write_config("[llm\nmodel = ");
    clear_env();

    let err = Config::load(&path).unwrap_err();
    assert!(format!("{err:#}").contains("failed to parse config file"));
}

#[test]
#[serial]
fn env_overrides_file_values() {
    let (_dir, path) = write_config("[llm]\nmodel = \"from-file\"\n");
    clear_env();
    unsafe {
        std::env::set_var("LECTERN_LLM_MODEL", "from-env");
        std::env::set_var("LECTERN_LLM_BASE_URL", "http://env:1234");
        std::env::set_var("LECTERN_LLM_TEMPERATURE", "0.25");
        std::env::set_var("LECTERN_LLM_MAX_TOKENS", "64");
        std::env::set_var("LECTERN_DOCUMENTS_DIRECTORY", "library");
        std::env::set_var("LECTERN_DOCUMENTS_GLOB", "*.txt");
        std::env::set_var("LECTERN_DOCUMENTS_FILE", "notes.pdf");
        std::env::set_var("LECTERN_DOCUMENTS_MAX_FILE_SIZE", "1024");
        std::env::set_var("LECTERN_ENV_FILE", "/tmp/lectern.env");
    }

    let config = Config::load(&path).unwrap();
    clear_env();

    assert_eq!(config.llm.model, "from-env");
    assert_eq!(config.llm.base_url, "http://env:1234");
    assert!((config.llm.temperature - 0.25).abs() < f64::EPSILON);
    assert_eq!(config.llm.max_tokens, Some(64));
    assert_eq!(config.documents.directory, PathBuf::from("library"));
    assert_eq!(config.documents.glob, "*.txt");
    assert_eq!(config.documents.file, PathBuf::from("notes.pdf"));
    assert_eq!(config.documents.max_file_size, 1024);
    assert_eq!(config.vault.env_file, PathBuf::from("/tmp/lectern.env"));
}

#[test]
#[serial]
fn unparsable_numeric_override_is_ignored() {
    clear_env();
    unsafe {
        std::env::set_var("LECTERN_LLM_TEMPERATURE", "warm");
        std::env::set_var("LECTERN_DOCUMENTS_MAX_FILE_SIZE", "-5");
    }

    let config = Config::load(Path::new("/nonexistent/lectern.toml")).unwrap();
    clear_env();

    assert!((config.llm.temperature - 1.5).abs() < f64::EPSILON);
    assert_eq!(config.documents.max_file_size, 52_428_800);
}

#[test]
fn validate_rejects_out_of_range_temperature() {
    let mut config = Config::default();
    config.llm.temperature = 3.0;
    let err = config.validate_llm().unwrap_err();
    assert!(format!("{err:#}").contains("temperature"));
}

#[test]
fn validate_rejects_empty_fields() {
    let mut config = Config::default();
    config.llm.model = "  ".into();
    assert!(config.validate_llm().is_err());

    let mut config = Config::default();
    config.documents.glob = String::new();
    assert!(config.validate_documents().is_err());

    let mut config = Config::default();
    config.documents.max_file_size = 0;
    assert!(config.validate_documents().is_err());
}

#[test]
fn sections_validate_independently() {
    let mut config = Config::default();
    config.llm.temperature = 3.0;
    assert!(config.validate_documents().is_ok());

    let mut config = Config::default();
    config.documents.max_file_size = 0;
    assert!(config.validate_llm().is_ok());
}

#[tokio::test]
async fn resolve_secrets_fills_openai_key() {
    let vault = MockVaultProvider::new().with_secret("OPENAI_API_KEY", "sk-from-vault");
    let mut config = Config::default();
    config.resolve_secrets(&vault).await.unwrap();
    assert_eq!(
        config.secrets.openai_api_key.as_ref().unwrap().expose(),
        "sk-from-vault"
    );
    assert!(!format!("{config:?}").contains("sk-from-vault"));
}

#[tokio::test]
async fn resolve_secrets_leaves_missing_key_unset() {
    let vault = MockVaultProvider::new();
    let mut config = Config::default();
    config.resolve_secrets(&vault).await.unwrap();
    assert!(config.secrets.openai_api_key.is_none());
}

#[test]
#[serial]
fn bundled_default_config_parses() {
    clear_env();
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../config/default.toml");
    let config = Config::load(&path).unwrap();
    assert_eq!(config.llm.model, "gpt-4");
    assert!((config.llm.temperature - 1.5).abs() < f64::EPSILON);
    assert_eq!(config.documents.directory, PathBuf::from("books"));
    assert!(config.validate_llm().is_ok());
    assert!(config.validate_documents().is_ok());
}
