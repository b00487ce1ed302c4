//! Test-only mock LLM provider.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::LlmError;
use crate::provider::{LlmProvider, Message, ModelResponse};
use crate::temperature::Temperature;

/// Offline stand-in for a chat-completion service.
///
/// Queued responses are returned first, in order. After that the reply is
/// picked from `variants`: at temperature `0.0` always the first variant, at
/// any higher temperature the variants are cycled so repeated calls differ.
#[derive(Debug, Clone)]
pub struct MockProvider {
    responses: Arc<Mutex<VecDeque<String>>>,
    variants: Vec<String>,
    temperature: Temperature,
    calls: Arc<AtomicUsize>,
    last_messages: Arc<Mutex<Vec<Message>>>,
    pub fail_chat: bool,
}

impl Default for MockProvider {
    fn default() -> Self {
        Self {
            responses: Arc::new(Mutex::new(VecDeque::new())),
            variants: vec!["mock response".into()],
            temperature: Temperature::default(),
            calls: Arc::new(AtomicUsize::new(0)),
            last_messages: Arc::new(Mutex::new(Vec::new())),
            fail_chat: false,
        }
    }
}

impl MockProvider {
    #[must_use]
    pub fn with_responses(responses: Vec<String>) -> Self {
        Self {
            responses: Arc::new(Mutex::new(responses.into())),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_variants(variants: &[&str]) -> Self {
        Self {
            variants: variants.iter().map(|v| (*v).to_owned()).collect(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn failing() -> Self {
        Self {
            fail_chat: true,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_temperature(mut self, temperature: Temperature) -> Self {
        self.temperature = temperature;
        self
    }

    /// Number of `chat` calls made so far.
    #[must_use]
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Messages passed to the most recent `chat` call.
    #[must_use]
    pub fn last_messages(&self) -> Vec<Message> {
        self.last_messages
            .lock()
            .map(|m| m.clone())
            .unwrap_or_default()
    }

    fn variant_for(&self, call: usize) -> String {
        if self.variants.is_empty() {
            return String::new();
        }
        let index = if self.temperature.is_deterministic() {
            0
        } else {
            call % self.variants.len()
        };
        self.variants[index].clone()
    }
}

impl LlmProvider for MockProvider {
    #[allow(clippy::unnecessary_literal_bound)]
    fn name(&self) -> &str {
        "mock"
    }

    fn temperature(&self) -> Temperature {
        self.temperature
    }

    async fn chat(&self, messages: &[Message]) -> Result<ModelResponse, LlmError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut last) = self.last_messages.lock() {
            *last = messages.to_vec();
        }
        if self.fail_chat {
            return Err(LlmError::Other("mock LLM error".into()));
        }
        let queued = self
            .responses
            .lock()
            .map_err(|_| LlmError::Other("mock response queue poisoned".into()))?
            .pop_front();
        let content = queued.unwrap_or_else(|| self.variant_for(call));
        Ok(ModelResponse {
            content,
            model: Some("mock".into()),
            finish_reason: Some("stop".into()),
            usage: None,
        })
    }
}
