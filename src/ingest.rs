use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::Context;
use lectern_core::config::DocumentsConfig;
use lectern_loaders::{DirectoryLoader, DocumentLoader, PdfLoader, TextLoader, page};

/// Options for `lectern directory`; unset flags fall back to the config.
#[derive(Debug, Default)]
#[allow(clippy::struct_excessive_bools)]
pub struct DirectoryArgs {
    pub path: Option<PathBuf>,
    pub glob: Option<String>,
    pub recursive: bool,
    pub load_hidden: bool,
    pub silent_errors: bool,
    pub text: bool,
}

pub fn directory_loader(
    args: DirectoryArgs,
    config: &DocumentsConfig,
) -> DirectoryLoader<Box<dyn DocumentLoader>> {
    let strategy: Box<dyn DocumentLoader> = if args.text {
        Box::new(TextLoader {
            max_file_size: config.max_file_size,
        })
    } else {
        Box::new(PdfLoader {
            max_file_size: config.max_file_size,
        })
    };
    DirectoryLoader::new(
        args.path.unwrap_or_else(|| config.directory.clone()),
        args.glob.unwrap_or_else(|| config.glob.clone()),
        strategy,
    )
    .recursive(args.recursive || config.recursive)
    .load_hidden(args.load_hidden || config.load_hidden)
    .silent_errors(args.silent_errors || config.silent_errors)
}

/// Walk the directory lazily, printing each document's metadata as it is produced.
///
/// # Errors
///
/// Fails if the directory cannot be walked or a file fails to parse (unless
/// silent errors are enabled), or if writing to `out` fails.
pub fn print_directory<L: DocumentLoader>(
    loader: &DirectoryLoader<L>,
    out: &mut dyn Write,
) -> anyhow::Result<usize> {
    let documents = loader
        .lazy_load()
        .with_context(|| format!("failed to read directory {}", loader.path().display()))?;

    let mut count = 0;
    for document in documents {
        let document = document?;
        writeln!(out, "{}", document.metadata.to_json_line())?;
        count += 1;
    }
    tracing::info!(
        directory = %loader.path().display(),
        glob = loader.glob(),
        documents = count,
        "directory loaded"
    );
    Ok(count)
}

/// Load one PDF eagerly, then print its page count, the text of page 0, and
/// the metadata of page 1.
///
/// # Errors
///
/// Fails if the file cannot be parsed or has fewer than two pages.
pub fn print_pdf(path: &Path, max_file_size: u64, out: &mut dyn Write) -> anyhow::Result<()> {
    let documents = PdfLoader { max_file_size }
        .load(path)
        .with_context(|| format!("failed to load {}", path.display()))?;

    writeln!(out, "{}", documents.len())?;
    writeln!(out, "{}", page(&documents, 0)?.content)?;
    writeln!(out, "{}", page(&documents, 1)?.metadata.to_json_line())?;
    Ok(())
}
