use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::LlmError;
use crate::provider::{LlmProvider, Message, ModelResponse, Role, Usage};
use crate::temperature::Temperature;

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Chat-completion client for the OpenAI API and compatible endpoints.
///
/// One request per call: no streaming, no retry.
#[derive(Clone)]
pub struct OpenAiProvider {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
    temperature: Temperature,
    max_tokens: Option<u32>,
}

impl fmt::Debug for OpenAiProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenAiProvider")
            .field("client", &"<reqwest::Client>")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .finish()
    }
}

impl OpenAiProvider {
    #[must_use]
    pub fn new(
        api_key: String,
        mut base_url: String,
        model: String,
        temperature: Temperature,
    ) -> Self {
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Self {
            client: crate::http::default_client(),
            api_key,
            base_url,
            model,
            temperature,
            max_tokens: None,
        }
    }

    /// Validate raw settings and build a provider.
    ///
    /// The temperature is checked first, so an out-of-range value fails before
    /// credentials are even looked at and long before any request is sent.
    ///
    /// # Errors
    ///
    /// Returns [`LlmError::InvalidTemperature`] or [`LlmError::MissingCredential`].
    pub fn configure(
        api_key: Option<&str>,
        base_url: impl Into<String>,
        model: impl Into<String>,
        temperature: f64,
    ) -> Result<Self, LlmError> {
        let temperature = Temperature::new(temperature)?;
        let api_key = api_key
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| LlmError::MissingCredential("OPENAI_API_KEY".into()))?;
        Ok(Self::new(
            api_key.to_owned(),
            base_url.into(),
            model.into(),
            temperature,
        ))
    }

    #[must_use]
    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    #[must_use]
    pub fn with_max_tokens(mut self, max_tokens: Option<u32>) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn post_chat<B: Serialize + Sync>(&self, body: &B) -> Result<OpenAiChatResponse, LlmError> {
        tracing::debug!(model = %self.model, temperature = %self.temperature, "sending chat completion request");

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await.map_err(LlmError::Http)?;

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(LlmError::RateLimited);
        }

        if !status.is_success() {
            tracing::error!("OpenAI API error {status}: {text}");
            return Err(LlmError::Api {
                status: status.as_u16(),
                message: api_error_message(&text),
            });
        }

        Ok(serde_json::from_str(&text)?)
    }

    fn first_choice(resp: OpenAiChatResponse) -> Result<ModelResponse, LlmError> {
        let OpenAiChatResponse {
            choices,
            model,
            usage,
        } = resp;
        let choice = choices
            .into_iter()
            .next()
            .ok_or(LlmError::EmptyResponse {
                provider: "openai".into(),
            })?;
        let content = choice.message.content.ok_or(LlmError::EmptyResponse {
            provider: "openai".into(),
        })?;

        if let Some(ref usage) = usage {
            tracing::debug!(
                prompt_tokens = usage.prompt_tokens,
                completion_tokens = usage.completion_tokens,
                "OpenAI API usage"
            );
        }

        Ok(ModelResponse {
            content,
            model,
            finish_reason: choice.finish_reason,
            usage,
        })
    }
}

impl LlmProvider for OpenAiProvider {
    async fn chat(&self, messages: &[Message]) -> Result<ModelResponse, LlmError> {
        let api_messages = convert_messages(messages);
        let body = ChatRequest {
            model: &self.model,
            messages: &api_messages,
            temperature: self.temperature.value(),
            max_tokens: self.max_tokens,
            response_format: None,
        };
        let resp = self.post_chat(&body).await?;
        Self::first_choice(resp)
    }

    fn temperature(&self) -> Temperature {
        self.temperature
    }

    #[allow(clippy::unnecessary_literal_bound)]
    fn name(&self) -> &str {
        "openai"
    }

    async fn chat_typed<T>(&self, messages: &[Message]) -> Result<T, LlmError>
    where
        T: serde::de::DeserializeOwned + schemars::JsonSchema + 'static,
        Self: Sized,
    {
        let schema = crate::provider::strict_schema::<T>()?;
        let api_messages = convert_messages(messages);
        let body = ChatRequest {
            model: &self.model,
            messages: &api_messages,
            temperature: self.temperature.value(),
            max_tokens: self.max_tokens,
            response_format: Some(ResponseFormat {
                r#type: "json_schema",
                json_schema: JsonSchemaFormat {
                    name: crate::provider::type_label::<T>(),
                    schema,
                    strict: true,
                },
            }),
        };
        let resp = self.post_chat(&body).await?;
        let response = Self::first_choice(resp)?;
        crate::provider::parse_structured::<T>(&response.content)
    }
}

/// Pull `error.message` out of an OpenAI error body, falling back to the raw text.
fn api_error_message(body: &str) -> String {
    serde_json::from_str::<ApiErrorBody>(body)
        .map(|b| b.error.message)
        .unwrap_or_else(|_| body.chars().take(200).collect())
}

fn convert_messages(messages: &[Message]) -> Vec<ApiMessage<'_>> {
    messages
        .iter()
        .map(|msg| {
            let role = match msg.role {
                Role::System => "system",
                Role::User => "user",
                Role::Assistant => "assistant",
            };
            ApiMessage {
                role,
                content: &msg.content,
            }
        })
        .collect()
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ApiMessage<'a>],
    temperature: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat<'a>>,
}

#[derive(Serialize)]
struct ApiMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct ResponseFormat<'a> {
    r#type: &'a str,
    json_schema: JsonSchemaFormat<'a>,
}

#[derive(Serialize)]
struct JsonSchemaFormat<'a> {
    name: &'a str,
    schema: serde_json::Value,
    strict: bool,
}

#[derive(Deserialize)]
struct OpenAiChatResponse {
    choices: Vec<ChatChoice>,
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessage,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct ChatMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Deserialize)]
struct ApiErrorDetail {
    message: String,
}

#[cfg(test)]
mod tests {
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn test_provider() -> OpenAiProvider {
        OpenAiProvider::new(
            "sk-test-key".into(),
            DEFAULT_BASE_URL.into(),
            "gpt-4".into(),
            Temperature::new(1.5).unwrap(),
        )
    }

    fn provider_for(server: &MockServer, temperature: f64) -> OpenAiProvider {
        OpenAiProvider::configure(Some("sk-test-key"), server.uri(), "gpt-4", temperature).unwrap()
    }

    fn completion(content: &str) -> serde_json::Value {
        serde_json::json!({
            "model": "gpt-4-0613",
            "choices": [{
                "message": {"role": "assistant", "content": content},
                "finish_reason": "stop"
            }],
            "usage": {"prompt_tokens": 12, "completion_tokens": 30, "total_tokens": 42}
        })
    }

    #[test]
    fn new_stores_fields() {
        let p = test_provider();
        assert_eq!(p.api_key, "sk-test-key");
        assert_eq!(p.base_url, "https://api.openai.com/v1");
        assert_eq!(p.model, "gpt-4");
        assert!((p.temperature.value() - 1.5).abs() < f64::EPSILON);
        assert!(p.max_tokens.is_none());
    }

    #[test]
    fn debug_redacts_api_key() {
        let debug = format!("{:?}", test_provider());
        assert!(!debug.contains("sk-test-key"));
        assert!(debug.contains("<redacted>"));
        assert!(debug.contains("gpt-4"));
    }

    #[test]
    fn base_url_strips_trailing_slash() {
        let p = OpenAiProvider::new(
            "key".into(),
            "https://api.openai.com/v1/".into(),
            "m".into(),
            Temperature::default(),
        );
        assert_eq!(p.base_url(), "https://api.openai.com/v1");
    }

    #[test]
    fn configure_rejects_out_of_range_temperature() {
        let result = OpenAiProvider::configure(Some("key"), DEFAULT_BASE_URL, "gpt-4", 3.0);
        assert!(matches!(result, Err(LlmError::InvalidTemperature(_))));
    }

    #[test]
    fn configure_checks_temperature_before_credentials() {
        let result = OpenAiProvider::configure(None, DEFAULT_BASE_URL, "gpt-4", -1.0);
        assert!(matches!(result, Err(LlmError::InvalidTemperature(_))));
    }

    #[test]
    fn configure_requires_api_key() {
        let missing = OpenAiProvider::configure(None, DEFAULT_BASE_URL, "gpt-4", 1.5);
        assert!(matches!(missing, Err(LlmError::MissingCredential(_))));
        let blank = OpenAiProvider::configure(Some("  "), DEFAULT_BASE_URL, "gpt-4", 1.5);
        assert!(matches!(blank, Err(LlmError::MissingCredential(_))));
    }

    #[test]
    fn name_returns_openai() {
        assert_eq!(test_provider().name(), "openai");
    }

    #[test]
    fn chat_request_serialization() {
        let msgs = [ApiMessage {
            role: "user",
            content: "hello",
        }];
        let body = ChatRequest {
            model: "gpt-4",
            messages: &msgs,
            temperature: 1.5,
            max_tokens: None,
            response_format: None,
        };
        let json = serde_json::to_string(&body).unwrap();
        assert!(json.contains("\"model\":\"gpt-4\""));
        assert!(json.contains("\"temperature\":1.5"));
        assert!(json.contains("\"role\":\"user\""));
        assert!(!json.contains("max_tokens"));
        assert!(!json.contains("response_format"));
    }

    #[test]
    fn convert_messages_maps_roles() {
        let messages = vec![
            Message::system("system prompt"),
            Message::user("user msg"),
            Message::new(Role::Assistant, "assistant reply"),
        ];
        let api_msgs = convert_messages(&messages);
        assert_eq!(api_msgs.len(), 3);
        assert_eq!(api_msgs[0].role, "system");
        assert_eq!(api_msgs[0].content, "system prompt");
        assert_eq!(api_msgs[1].role, "user");
        assert_eq!(api_msgs[2].role, "assistant");
    }

    #[test]
    fn api_error_message_prefers_error_field() {
        let body = r#"{"error":{"message":"Incorrect API key provided","type":"invalid_request_error"}}"#;
        assert_eq!(api_error_message(body), "Incorrect API key provided");
        assert_eq!(api_error_message("gateway timeout"), "gateway timeout");
    }

    #[tokio::test]
    async fn invoke_sends_temperature_and_returns_content() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(header("authorization", "Bearer sk-test-key"))
            .and(body_partial_json(serde_json::json!({
                "model": "gpt-4",
                "temperature": 1.5,
                "messages": [{"role": "user", "content": "Write a 5 line poem on cricket"}]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion("Leather on willow...")))
            .expect(1)
            .mount(&server)
            .await;

        let provider = provider_for(&server, 1.5);
        let response = provider
            .invoke("Write a 5 line poem on cricket")
            .await
            .unwrap();

        assert_eq!(response.content, "Leather on willow...");
        assert_eq!(response.model.as_deref(), Some("gpt-4-0613"));
        assert_eq!(response.finish_reason.as_deref(), Some("stop"));
        assert_eq!(response.usage.unwrap().total_tokens, 42);
    }

    #[tokio::test]
    async fn max_tokens_is_forwarded_when_set() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_partial_json(serde_json::json!({"max_tokens": 64})))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion("ok")))
            .expect(1)
            .mount(&server)
            .await;

        let provider = provider_for(&server, 0.0).with_max_tokens(Some(64));
        assert_eq!(provider.invoke("hi").await.unwrap().content, "ok");
    }

    #[tokio::test]
    async fn rate_limit_is_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429))
            .expect(1)
            .mount(&server)
            .await;

        let result = provider_for(&server, 1.0).invoke("hi").await;
        assert!(matches!(result, Err(LlmError::RateLimited)));
    }

    #[tokio::test]
    async fn api_error_carries_status_and_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
                "error": {"message": "Incorrect API key provided"}
            })))
            .mount(&server)
            .await;

        let err = provider_for(&server, 1.0).invoke("hi").await.unwrap_err();
        match err {
            LlmError::Api { status, message } => {
                assert_eq!(status, 401);
                assert_eq!(message, "Incorrect API key provided");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn empty_choices_is_empty_response() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"choices": []})))
            .mount(&server)
            .await;

        let result = provider_for(&server, 1.0).invoke("hi").await;
        assert!(matches!(result, Err(LlmError::EmptyResponse { .. })));
    }

    #[tokio::test]
    async fn malformed_body_is_json_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let result = provider_for(&server, 1.0).invoke("hi").await;
        assert!(matches!(result, Err(LlmError::Json(_))));
    }

    #[tokio::test]
    async fn unreachable_endpoint_errors() {
        let p = OpenAiProvider::configure(Some("key"), "http://127.0.0.1:1", "model", 1.0).unwrap();
        assert!(matches!(p.invoke("test").await, Err(LlmError::Http(_))));
    }

    #[tokio::test]
    async fn chat_typed_sends_json_schema_format() {
        #[derive(Debug, Deserialize, schemars::JsonSchema, PartialEq)]
        struct Verdict {
            ok: bool,
        }

        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_partial_json(serde_json::json!({
                "response_format": {
                    "type": "json_schema",
                    "json_schema": {"name": "Verdict", "strict": true}
                }
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion(r#"{"ok": true}"#)))
            .expect(1)
            .mount(&server)
            .await;

        let provider = provider_for(&server, 0.0);
        let verdict: Verdict = provider
            .chat_typed(&[Message::user("is it ok?")])
            .await
            .unwrap();
        assert_eq!(verdict, Verdict { ok: true });
    }

    #[tokio::test]
    async fn chat_typed_posts_strict_compatible_schema() {
        #[derive(Debug, Deserialize, schemars::JsonSchema, PartialEq)]
        struct Reading {
            label: String,
            count: u32,
        }

        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(completion(r#"{"label": "rain", "count": 3}"#)),
            )
            .expect(1)
            .mount(&server)
            .await;

        let provider = provider_for(&server, 0.0);
        let reading: Reading = provider
            .chat_typed(&[Message::user("how much rain?")])
            .await
            .unwrap();
        assert_eq!(reading.count, 3);

        let requests = server.received_requests().await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
        let schema = &body["response_format"]["json_schema"]["schema"];
        assert_eq!(schema["additionalProperties"], false);
        assert!(schema.get("$schema").is_none());
        assert!(schema["properties"]["count"].get("format").is_none());
        assert!(schema["properties"]["count"].get("minimum").is_none());
        assert_eq!(schema["required"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    #[ignore = "requires OPENAI_API_KEY env var"]
    async fn integration_openai_invoke() {
        let api_key = std::env::var("OPENAI_API_KEY").expect("OPENAI_API_KEY must be set");
        let provider =
            OpenAiProvider::configure(Some(&api_key), DEFAULT_BASE_URL, "gpt-4", 0.0).unwrap();
        let response = provider.invoke("Reply with exactly: pong").await.unwrap();
        assert!(response.content.to_lowercase().contains("pong"));
    }
}
