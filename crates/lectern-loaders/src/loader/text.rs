use std::path::Path;

use crate::{DEFAULT_MAX_FILE_SIZE, Document, DocumentError, DocumentLoader, DocumentMetadata};

/// Loads a UTF-8 text file as a single [`Document`].
pub struct TextLoader {
    pub max_file_size: u64,
}

impl Default for TextLoader {
    fn default() -> Self {
        Self {
            max_file_size: DEFAULT_MAX_FILE_SIZE,
        }
    }
}

impl DocumentLoader for TextLoader {
    fn load(&self, path: &Path) -> Result<Vec<Document>, DocumentError> {
        let path = super::checked_source(path, self.max_file_size)?;

        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        let content_type = match ext {
            "md" | "markdown" => "text/markdown",
            "txt" => "text/plain",
            other => return Err(DocumentError::UnsupportedFormat(other.to_owned())),
        };

        let content = std::fs::read_to_string(&path)?;
        tracing::debug!(source = %path.display(), bytes = content.len(), "read text file");

        Ok(vec![Document {
            content,
            metadata: DocumentMetadata::new(path.display().to_string(), content_type),
        }])
    }

    fn supported_extensions(&self) -> &[&str] {
        &["txt", "md", "markdown"]
    }
}
