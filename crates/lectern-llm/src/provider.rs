use std::future::Future;

use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::LlmError;
use crate::temperature::Temperature;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    #[must_use]
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    #[must_use]
    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }
}

/// Token accounting reported by the remote service.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    #[serde(default)]
    pub prompt_tokens: u64,
    #[serde(default)]
    pub completion_tokens: u64,
    #[serde(default)]
    pub total_tokens: u64,
}

/// One completed chat response.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ModelResponse {
    pub content: String,
    pub model: Option<String>,
    pub finish_reason: Option<String>,
    pub usage: Option<Usage>,
}

impl ModelResponse {
    #[must_use]
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            model: None,
            finish_reason: None,
            usage: None,
        }
    }
}

pub trait LlmProvider: Send + Sync {
    /// Send messages to the model and return its reply.
    ///
    /// # Errors
    ///
    /// Returns an error if the provider fails to communicate or the response is invalid.
    fn chat(
        &self,
        messages: &[Message],
    ) -> impl Future<Output = Result<ModelResponse, LlmError>> + Send;

    /// Send a single user prompt.
    ///
    /// # Errors
    ///
    /// See [`LlmProvider::chat`].
    fn invoke(&self, prompt: &str) -> impl Future<Output = Result<ModelResponse, LlmError>> + Send {
        async move {
            let messages = [Message::user(prompt)];
            self.chat(&messages).await
        }
    }

    fn temperature(&self) -> Temperature;

    fn name(&self) -> &str;

    /// Ask for a reply shaped like `T` and decode it.
    ///
    /// The default appends `T`'s JSON schema as a system instruction and parses
    /// the reply text; providers with native schema support override this.
    ///
    /// # Errors
    ///
    /// Returns [`LlmError::StructuredParse`] if the reply does not decode into `T`.
    fn chat_typed<T>(
        &self,
        messages: &[Message],
    ) -> impl Future<Output = Result<T, LlmError>> + Send
    where
        T: DeserializeOwned + JsonSchema + 'static,
        Self: Sized,
    {
        async move {
            let schema = schema_value::<T>()?;
            let instruction = format!(
                "Respond with a single JSON value matching this JSON schema and nothing else:\n{schema}"
            );
            let mut augmented = messages.to_vec();
            augmented.push(Message::system(instruction));
            let response = self.chat(&augmented).await?;
            parse_structured::<T>(&response.content)
        }
    }
}

/// JSON schema of `T` as a `serde_json::Value`.
///
/// # Errors
///
/// Returns [`LlmError::StructuredParse`] if the schema cannot be serialized.
pub fn schema_value<T: JsonSchema>() -> Result<serde_json::Value, LlmError> {
    let schema = schemars::schema_for!(T);
    serde_json::to_value(&schema).map_err(|e| LlmError::StructuredParse(e.to_string()))
}

/// Keywords OpenAI's strict `json_schema` mode refuses.
const UNSUPPORTED_KEYWORDS: [&str; 8] = [
    "$schema",
    "format",
    "minimum",
    "maximum",
    "exclusiveMinimum",
    "exclusiveMaximum",
    "minLength",
    "maxLength",
];

/// JSON schema of `T` tightened for strict structured output.
///
/// Every object closes with `additionalProperties: false` and lists all of
/// its properties as required; keywords the strict mode refuses are removed.
///
/// # Errors
///
/// Returns [`LlmError::StructuredParse`] if the schema cannot be serialized.
pub fn strict_schema<T: JsonSchema>() -> Result<serde_json::Value, LlmError> {
    let mut schema = schema_value::<T>()?;
    tighten(&mut schema);
    Ok(schema)
}

fn tighten(node: &mut serde_json::Value) {
    use serde_json::Value;

    let map = match node {
        Value::Object(map) => map,
        Value::Array(items) => {
            items.iter_mut().for_each(tighten);
            return;
        }
        _ => return,
    };

    for keyword in UNSUPPORTED_KEYWORDS {
        map.remove(keyword);
    }

    let required = match map.get("properties") {
        Some(Value::Object(properties)) => {
            let mut required = match map.get("required") {
                Some(Value::Array(names)) => names.clone(),
                _ => Vec::new(),
            };
            for name in properties.keys() {
                if !required.iter().any(|r| r.as_str() == Some(name.as_str())) {
                    required.push(Value::String(name.clone()));
                }
            }
            Some(required)
        }
        _ => None,
    };
    if let Some(required) = required {
        map.insert("required".into(), Value::Array(required));
        map.insert("additionalProperties".into(), Value::Bool(false));
    }

    for (key, child) in map.iter_mut() {
        match key.as_str() {
            "properties" | "$defs" | "definitions" => {
                if let Value::Object(children) = child {
                    children.values_mut().for_each(tighten);
                }
            }
            "enum" | "const" | "default" | "examples" | "required" => {}
            _ => tighten(child),
        }
    }
}

/// Short type name used to label schemas sent to the model.
#[must_use]
pub fn type_label<T>() -> &'static str {
    std::any::type_name::<T>()
        .rsplit("::")
        .next()
        .unwrap_or("Output")
}

/// Decode model text into `T`, tolerating a fenced code block around the JSON.
///
/// # Errors
///
/// Returns [`LlmError::StructuredParse`] if the text is not valid JSON for `T`.
pub fn parse_structured<T: DeserializeOwned>(text: &str) -> Result<T, LlmError> {
    let trimmed = text.trim();
    let body = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .and_then(|rest| rest.strip_suffix("```"))
        .map_or(trimmed, str::trim);
    serde_json::from_str(body).map_err(|e| LlmError::StructuredParse(e.to_string()))
}
