use std::io::Write;

use lectern_llm::{FieldType, LlmError, RecordShape};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::json;

/// Typed person record. `age` only accepts whole numbers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Person {
    pub name: String,
    pub age: u32,
}

impl Person {
    /// Decode and validate an externally sourced value.
    ///
    /// # Errors
    ///
    /// Returns [`LlmError::StructuredParse`] if a field is missing or has the wrong type.
    pub fn decode(value: serde_json::Value) -> Result<Self, LlmError> {
        serde_json::from_value(value).map_err(|e| LlmError::StructuredParse(e.to_string()))
    }
}

/// Shape hint for [`Person`]: describes the fields without enforcing them.
pub fn person_shape() -> RecordShape {
    RecordShape::new("Person")
        .field("name", FieldType::String)
        .field("age", FieldType::Integer)
}

/// Print the hinted record (accepted as is) and the typed record.
///
/// # Errors
///
/// Fails only if writing to `out` fails.
pub fn print_person(out: &mut dyn Write) -> anyhow::Result<()> {
    let shape = person_shape();
    let hinted = shape.record([("name", json!("nitish")), ("age", json!("35"))]);
    for violation in shape.check(&hinted) {
        tracing::debug!(shape = shape.name(), %violation, "shape hint not enforced");
    }
    writeln!(out, "{hinted}")?;

    let typed = Person {
        name: "nitish".into(),
        age: 35,
    };
    writeln!(out, "{typed:?}")?;
    Ok(())
}
