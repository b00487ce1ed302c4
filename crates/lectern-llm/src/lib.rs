//! Chat-completion provider abstraction, temperature control, and typed
//! structured output.

pub mod error;
pub mod extractor;
pub mod http;
#[cfg(feature = "mock")]
pub mod mock;
pub mod openai;
pub mod provider;
pub mod shape;
pub mod temperature;

pub use error::LlmError;
pub use extractor::Extractor;
pub use openai::OpenAiProvider;
pub use provider::{LlmProvider, Message, ModelResponse, Role, Usage};
pub use shape::{FieldType, RecordShape, ShapeViolation, ShapedRecord};
pub use temperature::Temperature;
