//! Declarative record shapes.
//!
//! A [`RecordShape`] names fields and their expected JSON types. Building a
//! [`ShapedRecord`] against it never validates anything; mismatches only show
//! up when [`RecordShape::check`] is called explicitly. Use a typed struct with
//! `serde` when values must be enforced.

use std::fmt;

use serde_json::{Map, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    String,
    Integer,
    Number,
    Boolean,
}

impl FieldType {
    #[must_use]
    pub fn accepts(self, value: &Value) -> bool {
        match self {
            Self::String => value.is_string(),
            Self::Integer => value.is_i64() || value.is_u64(),
            Self::Number => value.is_number(),
            Self::Boolean => value.is_boolean(),
        }
    }

    #[must_use]
    pub fn json_type(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Integer => "integer",
            Self::Number => "number",
            Self::Boolean => "boolean",
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.json_type())
    }
}

fn json_type_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_f64() => "number",
        Value::Number(_) => "integer",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ShapeViolation {
    #[error("field `{field}` is missing")]
    Missing { field: String },

    #[error("field `{field}` should be {expected}, found {found}")]
    WrongType {
        field: String,
        expected: FieldType,
        found: &'static str,
    },

    #[error("field `{field}` is not part of the shape")]
    Unexpected { field: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordShape {
    name: String,
    fields: Vec<(String, FieldType)>,
}

impl RecordShape {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
        }
    }

    #[must_use]
    pub fn field(mut self, name: impl Into<String>, ty: FieldType) -> Self {
        self.fields.push((name.into(), ty));
        self
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, FieldType)> {
        self.fields.iter().map(|(n, t)| (n.as_str(), *t))
    }

    /// Build a record from field values. Nothing is checked here.
    pub fn record<K, V, I>(&self, values: I) -> ShapedRecord
    where
        K: Into<String>,
        V: Into<Value>,
        I: IntoIterator<Item = (K, V)>,
    {
        let mut arrived = Vec::new();
        let mut map = Map::new();
        for (key, value) in values {
            let key: String = key.into();
            if map.insert(key.clone(), value.into()).is_none() {
                arrived.push(key);
            }
        }

        let mut order: Vec<String> = self
            .fields
            .iter()
            .filter(|(name, _)| map.contains_key(name))
            .map(|(name, _)| name.clone())
            .collect();
        let extras: Vec<String> = arrived
            .into_iter()
            .filter(|key| !self.fields.iter().any(|(name, _)| name == key))
            .collect();
        order.extend(extras);

        ShapedRecord {
            shape: self.name.clone(),
            values: map,
            order,
        }
    }

    /// List every way `record` departs from this shape, in field declaration
    /// order followed by unexpected fields.
    #[must_use]
    pub fn check(&self, record: &ShapedRecord) -> Vec<ShapeViolation> {
        let mut violations = Vec::new();
        for (field, expected) in &self.fields {
            match record.values.get(field) {
                None => violations.push(ShapeViolation::Missing {
                    field: field.clone(),
                }),
                Some(value) if !expected.accepts(value) => {
                    violations.push(ShapeViolation::WrongType {
                        field: field.clone(),
                        expected: *expected,
                        found: json_type_of(value),
                    });
                }
                Some(_) => {}
            }
        }
        for key in record.values.keys() {
            if !self.fields.iter().any(|(name, _)| name == key) {
                violations.push(ShapeViolation::Unexpected { field: key.clone() });
            }
        }
        violations
    }
}

/// Field values built against a [`RecordShape`], not validated.
///
/// Displays as compact JSON with the shape's declared fields first, in
/// declaration order, followed by any extra fields in the order given.
#[derive(Debug, Clone, PartialEq)]
pub struct ShapedRecord {
    shape: String,
    values: Map<String, Value>,
    order: Vec<String>,
}

impl ShapedRecord {
    #[must_use]
    pub fn shape_name(&self) -> &str {
        &self.shape
    }

    #[must_use]
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.values.get(field)
    }

    #[must_use]
    pub fn values(&self) -> &Map<String, Value> {
        &self.values
    }

    #[must_use]
    pub fn into_value(self) -> Value {
        Value::Object(self.values)
    }
}

impl fmt::Display for ShapedRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (i, key) in self.order.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            let value = self.values.get(key).unwrap_or(&Value::Null);
            write!(f, "{}:{value}", Value::from(key.as_str()))?;
        }
        f.write_str("}")
    }
}
