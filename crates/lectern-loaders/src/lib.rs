//! Page-level document loaders: single PDFs, text files, and lazily walked directories.

pub mod directory;
pub mod error;
pub mod loader;
#[cfg(any(test, feature = "mock"))]
pub mod testing;
pub mod types;

pub use directory::{DirectoryLoader, LazyDocuments};
pub use error::DocumentError;
pub use loader::{PdfLoader, TextLoader};
pub use types::{Document, DocumentMetadata, page};

/// Default maximum file size: 50 MiB.
pub const DEFAULT_MAX_FILE_SIZE: u64 = 50 * 1024 * 1024;

/// Per-file parsing strategy: turns one file into zero or more documents.
pub trait DocumentLoader {
    /// Parse `path` eagerly.
    ///
    /// # Errors
    ///
    /// Returns an error if the file is missing, too large, or cannot be parsed.
    fn load(&self, path: &std::path::Path) -> Result<Vec<Document>, DocumentError>;

    fn supported_extensions(&self) -> &[&str];
}

impl<L: DocumentLoader + ?Sized> DocumentLoader for &L {
    fn load(&self, path: &std::path::Path) -> Result<Vec<Document>, DocumentError> {
        (**self).load(path)
    }

    fn supported_extensions(&self) -> &[&str] {
        (**self).supported_extensions()
    }
}

impl<L: DocumentLoader + ?Sized> DocumentLoader for Box<L> {
    fn load(&self, path: &std::path::Path) -> Result<Vec<Document>, DocumentError> {
        (**self).load(path)
    }

    fn supported_extensions(&self) -> &[&str] {
        (**self).supported_extensions()
    }
}
