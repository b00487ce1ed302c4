use std::fmt;

use serde::{Deserialize, Serialize};

use crate::LlmError;

/// Sampling temperature accepted by chat-completion models.
///
/// `0.0` asks for the most deterministic output; `2.0` for the most varied.
/// Construction validates the range, so a `Temperature` value is always
/// acceptable to the remote service.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct Temperature(f64);

impl Temperature {
    pub const MIN: f64 = 0.0;
    pub const MAX: f64 = 2.0;
    pub const DETERMINISTIC: Self = Self(Self::MIN);
    pub const MOST_CREATIVE: Self = Self(Self::MAX);

    /// # Errors
    ///
    /// Returns [`LlmError::InvalidTemperature`] for NaN, infinities, and values
    /// outside `[0.0, 2.0]`.
    pub fn new(value: f64) -> Result<Self, LlmError> {
        if (Self::MIN..=Self::MAX).contains(&value) {
            Ok(Self(value))
        } else {
            Err(LlmError::InvalidTemperature(value))
        }
    }

    #[must_use]
    pub fn value(self) -> f64 {
        self.0
    }

    #[must_use]
    pub fn is_deterministic(self) -> bool {
        self.0 <= Self::MIN
    }
}

impl Default for Temperature {
    fn default() -> Self {
        Self(1.0)
    }
}

impl TryFrom<f64> for Temperature {
    type Error = LlmError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Temperature> for f64 {
    fn from(t: Temperature) -> Self {
        t.0
    }
}

impl fmt::Display for Temperature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
