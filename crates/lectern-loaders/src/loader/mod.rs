mod pdf;
mod text;

pub use pdf::PdfLoader;
pub use text::TextLoader;

/// Canonicalize `path` and enforce the size limit shared by all loaders.
fn checked_source(
    path: &std::path::Path,
    max_size: u64,
) -> Result<std::path::PathBuf, crate::DocumentError> {
    let path = std::fs::canonicalize(path)?;
    let meta = std::fs::metadata(&path)?;
    if meta.len() > max_size {
        return Err(crate::DocumentError::FileTooLarge(meta.len()));
    }
    Ok(path)
}
