mod chat;
mod ingest;
mod person;

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use lectern_core::Config;

use crate::ingest::DirectoryArgs;

#[derive(Parser, Debug)]
#[command(
    name = "lectern",
    version,
    about = "Load PDFs into page documents, call a chat model, and shape its output"
)]
struct Cli {
    /// Config file (default: $LECTERN_CONFIG or config/default.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Env file holding OPENAI_API_KEY (default: [vault] env_file)
    #[arg(long, global = true)]
    env_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Lazily load every matching file in a directory and print each page's metadata
    Directory {
        #[arg(long)]
        path: Option<PathBuf>,
        #[arg(long)]
        glob: Option<String>,
        /// Match the glob in every subdirectory
        #[arg(long)]
        recursive: bool,
        /// Include files under dot-directories and dotfiles
        #[arg(long)]
        load_hidden: bool,
        /// Log and skip files that fail to parse
        #[arg(long)]
        silent_errors: bool,
        /// Treat matches as UTF-8 text instead of PDF
        #[arg(long)]
        text: bool,
    },
    /// Load one PDF and print its page count, first page, and second page's metadata
    Pdf {
        #[arg(long)]
        path: Option<PathBuf>,
    },
    /// Send one prompt at the configured temperature and print the reply
    Temperature {
        #[arg(long, default_value = chat::DEFAULT_PROMPT)]
        prompt: String,
        /// Sampling temperature in [0.0, 2.0]
        #[arg(long, allow_negative_numbers = true)]
        temperature: Option<f64>,
        #[arg(long)]
        model: Option<String>,
    },
    /// Build the person record from its shape hint and as a typed value
    Person,
    /// Ask the model to extract a person record from free text
    Extract { text: String },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_subscriber();

    let cli = Cli::parse();
    let config_path = resolve_config_path(cli.config.as_deref());
    let mut config = Config::load(&config_path)?;
    if let Some(env_file) = cli.env_file {
        config.vault.env_file = env_file;
    }

    let mut stdout = std::io::stdout().lock();

    match cli.command {
        Command::Directory {
            path,
            glob,
            recursive,
            load_hidden,
            silent_errors,
            text,
        } => {
            let args = DirectoryArgs {
                path,
                glob,
                recursive,
                load_hidden,
                silent_errors,
                text,
            };
            config.validate_documents()?;
            let loader = ingest::directory_loader(args, &config.documents);
            ingest::print_directory(&loader, &mut stdout)?;
        }
        Command::Pdf { path } => {
            config.validate_documents()?;
            let path = path.unwrap_or_else(|| config.documents.file.clone());
            ingest::print_pdf(&path, config.documents.max_file_size, &mut stdout)?;
        }
        Command::Temperature {
            prompt,
            temperature,
            model,
        } => {
            let provider = chat::openai_from_config(&mut config, temperature, model).await?;
            chat::print_completion(&provider, &prompt, &mut stdout).await?;
        }
        Command::Person => person::print_person(&mut stdout)?,
        Command::Extract { text } => {
            let provider = chat::openai_from_config(&mut config, None, None).await?;
            chat::print_extraction(&provider, &text, &mut stdout).await?;
        }
    }

    Ok(())
}

fn resolve_config_path(flag: Option<&Path>) -> PathBuf {
    if let Some(path) = flag {
        return path.to_path_buf();
    }
    if let Ok(path) = std::env::var("LECTERN_CONFIG") {
        return PathBuf::from(path);
    }
    PathBuf::from("config/default.toml")
}

fn init_subscriber() {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let fmt_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .init();
}
