use std::io::Write;

use lectern_core::{Config, DotenvVaultProvider, Secret};
use lectern_llm::{Extractor, LlmProvider, OpenAiProvider};

use crate::person::Person;

pub const DEFAULT_PROMPT: &str = "Write a 5 line poem on cricket";

const EXTRACT_PREAMBLE: &str =
    "Extract the person described in the user's text. Reply with their name and age in years.";

/// Build the OpenAI client from config, applying command-line overrides.
///
/// The `[llm]` section is validated after overrides and before the credential
/// file is read, so an out-of-range value fails without touching secrets or
/// the network.
///
/// # Errors
///
/// Fails on invalid `[llm]` settings, an unreadable env file, or a missing API key.
pub async fn openai_from_config(
    config: &mut Config,
    temperature: Option<f64>,
    model: Option<String>,
) -> anyhow::Result<OpenAiProvider> {
    if let Some(temperature) = temperature {
        config.llm.temperature = temperature;
    }
    if let Some(model) = model {
        config.llm.model = model;
    }
    config.validate_llm()?;

    let vault = DotenvVaultProvider::load(&config.vault.env_file)?;
    config.resolve_secrets(&vault).await?;

    let provider = OpenAiProvider::configure(
        config.secrets.openai_api_key.as_ref().map(Secret::expose),
        config.llm.base_url.as_str(),
        config.llm.model.as_str(),
        config.llm.temperature,
    )?
    .with_max_tokens(config.llm.max_tokens);
    tracing::debug!(?provider, "configured chat model");
    Ok(provider)
}

/// Send one prompt and print the reply text.
///
/// # Errors
///
/// Propagates any provider failure; nothing is retried.
pub async fn print_completion<P: LlmProvider>(
    provider: &P,
    prompt: &str,
    out: &mut dyn Write,
) -> anyhow::Result<()> {
    let response = provider.invoke(prompt).await?;
    if let Some(usage) = response.usage {
        tracing::info!(
            provider = provider.name(),
            temperature = %provider.temperature(),
            total_tokens = usage.total_tokens,
            "completion received"
        );
    }
    writeln!(out, "{}", response.content)?;
    Ok(())
}

/// Ask the model for a [`Person`] described by `text` and print it as JSON.
///
/// # Errors
///
/// Fails if the provider fails or the reply is not a valid person record.
pub async fn print_extraction<P: LlmProvider>(
    provider: &P,
    text: &str,
    out: &mut dyn Write,
) -> anyhow::Result<Person> {
    let person: Person = Extractor::new(provider)
        .with_preamble(EXTRACT_PREAMBLE)
        .extract(text)
        .await?;
    writeln!(out, "{}", serde_json::to_string(&person)?)?;
    Ok(person)
}
