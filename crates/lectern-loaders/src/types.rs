use std::collections::BTreeMap;

use serde::Serialize;

/// Metadata attached to a loaded document.
///
/// Serializes to a flat JSON object: the well-known keys in declaration order
/// (`source`, `content_type`, `page`, `page_label`, `total_pages`), then the
/// entries of `extra` (PDF Info entries, for example) sorted by key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocumentMetadata {
    pub source: String,
    pub content_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<usize>,
    /// Printed label of the page, such as `iv` or `A-3`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_pages: Option<usize>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, String>,
}

impl DocumentMetadata {
    #[must_use]
    pub fn new(source: impl Into<String>, content_type: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            content_type: content_type.into(),
            page: None,
            page_label: None,
            total_pages: None,
            extra: BTreeMap::new(),
        }
    }

    /// Render as a single-line JSON object.
    #[must_use]
    pub fn to_json_line(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| format!("{{\"source\":{:?}}}", self.source))
    }
}

/// One unit of loaded text: a PDF page or a whole text file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Document {
    pub content: String,
    pub metadata: DocumentMetadata,
}

/// Fetch `docs[index]`, reporting an out-of-range error instead of panicking.
///
/// # Errors
///
/// Returns [`DocumentError::PageOutOfRange`](crate::DocumentError::PageOutOfRange)
/// when `index >= docs.len()`.
pub fn page(docs: &[Document], index: usize) -> Result<&Document, crate::DocumentError> {
    docs.get(index).ok_or(crate::DocumentError::PageOutOfRange {
        index,
        len: docs.len(),
    })
}
