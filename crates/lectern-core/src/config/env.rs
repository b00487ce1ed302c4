use std::path::PathBuf;

use super::Config;

impl Config {
    pub(crate) fn apply_env_overrides(&mut self) {
        self.apply_env_overrides_llm();
        self.apply_env_overrides_documents();
        if let Ok(v) = std::env::var("LECTERN_ENV_FILE") {
            self.vault.env_file = PathBuf::from(v);
        }
    }

    fn apply_env_overrides_llm(&mut self) {
        if let Ok(v) = std::env::var("LECTERN_LLM_BASE_URL") {
            self.llm.base_url = v;
        }
        if let Ok(v) = std::env::var("LECTERN_LLM_MODEL") {
            self.llm.model = v;
        }
        if let Ok(v) = std::env::var("LECTERN_LLM_TEMPERATURE") {
            if let Ok(t) = v.parse::<f64>() {
                self.llm.temperature = t;
            } else {
                tracing::warn!("ignoring invalid LECTERN_LLM_TEMPERATURE value: {v}");
            }
        }
        if let Ok(v) = std::env::var("LECTERN_LLM_MAX_TOKENS") {
            if let Ok(n) = v.parse::<u32>() {
                self.llm.max_tokens = Some(n);
            } else {
                tracing::warn!("ignoring invalid LECTERN_LLM_MAX_TOKENS value: {v}");
            }
        }
    }

    fn apply_env_overrides_documents(&mut self) {
        if let Ok(v) = std::env::var("LECTERN_DOCUMENTS_DIRECTORY") {
            self.documents.directory = PathBuf::from(v);
        }
        if let Ok(v) = std::env::var("LECTERN_DOCUMENTS_GLOB") {
            self.documents.glob = v;
        }
        if let Ok(v) = std::env::var("LECTERN_DOCUMENTS_FILE") {
            self.documents.file = PathBuf::from(v);
        }
        if let Ok(v) = std::env::var("LECTERN_DOCUMENTS_MAX_FILE_SIZE") {
            if let Ok(size) = v.parse::<u64>() {
                self.documents.max_file_size = size;
            } else {
                tracing::warn!("ignoring invalid LECTERN_DOCUMENTS_MAX_FILE_SIZE value: {v}");
            }
        }
    }
}
