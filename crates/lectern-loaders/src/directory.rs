use std::path::{Path, PathBuf};

use crate::{Document, DocumentError, DocumentLoader, PdfLoader};

/// Loads every file under a directory that matches a glob, one file at a time.
///
/// The glob is matched relative to `path`. Files are discovered and parsed
/// only as the sequence returned by [`DirectoryLoader::lazy_load`] is consumed.
pub struct DirectoryLoader<L = PdfLoader> {
    path: PathBuf,
    glob: String,
    loader: L,
    recursive: bool,
    load_hidden: bool,
    silent_errors: bool,
}

impl DirectoryLoader<PdfLoader> {
    /// Directory loader using the PDF strategy.
    #[must_use]
    pub fn pdf(path: impl Into<PathBuf>, glob: impl Into<String>) -> Self {
        Self::new(path, glob, PdfLoader::default())
    }
}

impl<L: DocumentLoader> DirectoryLoader<L> {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, glob: impl Into<String>, loader: L) -> Self {
        Self {
            path: path.into(),
            glob: glob.into(),
            loader,
            recursive: false,
            load_hidden: false,
            silent_errors: false,
        }
    }

    /// Match the glob in every subdirectory as well.
    #[must_use]
    pub fn recursive(mut self, recursive: bool) -> Self {
        self.recursive = recursive;
        self
    }

    /// Include files with a dot-prefixed component in their relative path.
    #[must_use]
    pub fn load_hidden(mut self, load_hidden: bool) -> Self {
        self.load_hidden = load_hidden;
        self
    }

    /// Log and skip files that fail to load instead of yielding the error.
    #[must_use]
    pub fn silent_errors(mut self, silent_errors: bool) -> Self {
        self.silent_errors = silent_errors;
        self
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[must_use]
    pub fn glob(&self) -> &str {
        &self.glob
    }

    /// Start a lazy walk over matching files.
    ///
    /// # Errors
    ///
    /// Fails up front if the directory does not exist, is not a directory,
    /// or the glob is invalid. Per-file failures surface as `Err` items.
    pub fn lazy_load(&self) -> Result<LazyDocuments<'_, L>, DocumentError> {
        let meta = std::fs::metadata(&self.path)?;
        if !meta.is_dir() {
            return Err(DocumentError::NotADirectory(self.path.clone()));
        }

        let pattern = if self.recursive && !self.glob.starts_with("**/") {
            format!("**/{}", self.glob)
        } else {
            self.glob.clone()
        };
        // Checked separately so the error refers to the user's pattern, not the joined path.
        glob::Pattern::new(&pattern)?;

        let root = glob::Pattern::escape(&self.path.to_string_lossy());
        let full = format!("{}/{pattern}", root.trim_end_matches('/'));
        let paths = glob::glob(&full)?;

        tracing::debug!(directory = %self.path.display(), pattern = %pattern, "walking directory");

        Ok(LazyDocuments {
            owner: self,
            paths,
            current: Vec::new().into_iter(),
        })
    }

    /// Load every matching file eagerly.
    ///
    /// # Errors
    ///
    /// Returns the first error encountered; see [`DirectoryLoader::lazy_load`].
    pub fn load(&self) -> Result<Vec<Document>, DocumentError> {
        self.lazy_load()?.collect()
    }

    fn is_hidden(&self, path: &Path) -> bool {
        path.strip_prefix(&self.path).unwrap_or(path).components().any(|c| {
            c.as_os_str()
                .to_str()
                .is_some_and(|s| s.starts_with('.') && s != "." && s != "..")
        })
    }
}

/// Lazy sequence of documents produced by [`DirectoryLoader::lazy_load`].
///
/// Holds at most one file's worth of documents at a time.
pub struct LazyDocuments<'a, L> {
    owner: &'a DirectoryLoader<L>,
    paths: glob::Paths,
    current: std::vec::IntoIter<Document>,
}

impl<L: DocumentLoader> Iterator for LazyDocuments<'_, L> {
    type Item = Result<Document, DocumentError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(doc) = self.current.next() {
                return Some(Ok(doc));
            }

            let path = match self.paths.next()? {
                Ok(path) => path,
                Err(e) if self.owner.silent_errors => {
                    tracing::warn!("skipping unreadable entry: {e}");
                    continue;
                }
                Err(e) => return Some(Err(e.into())),
            };

            if !path.is_file() {
                continue;
            }
            if !self.owner.load_hidden && self.owner.is_hidden(&path) {
                tracing::debug!(path = %path.display(), "skipping hidden file");
                continue;
            }

            match self.owner.loader.load(&path) {
                Ok(docs) => self.current = docs.into_iter(),
                Err(e) if self.owner.silent_errors => {
                    tracing::warn!(path = %path.display(), "skipping file: {e}");
                }
                Err(e) => return Some(Err(e)),
            }
        }
    }
}
