use std::any::Any;

use serde::{Deserialize, Serialize};

use crate::datum::Datum;
use crate::error::{BrokerResult, ValidationError};
use crate::value::{RawValue, Value};

use super::{recorded_under, Definition};

/// Boolean contract.
///
/// Accepts `bool` directly and the strings `true`/`false`/`1`/`0` in any
/// ASCII case. Anything else is a transform error.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BooleanDefinition {
    /// Initial value of the attribute.
    pub default: bool,
}

impl BooleanDefinition {
    /// Boolean starting at `default`.
    #[must_use]
    pub const fn new(default: bool) -> Self {
        Self { default }
    }

    /// Reads the datum as a bool recorded under this exact definition.
    pub fn extract(&self, datum: &Datum) -> BrokerResult<bool> {
        let value = recorded_under(self, datum)?;
        Ok(value.as_bool().unwrap_or(self.default))
    }
}

fn parse_bool(input: &str) -> Option<bool> {
    let input = input.trim();
    if input.eq_ignore_ascii_case("true") || input == "1" {
        Some(true)
    } else if input.eq_ignore_ascii_case("false") || input == "0" {
        Some(false)
    } else {
        None
    }
}

impl Definition for BooleanDefinition {
    fn kind(&self) -> &'static str {
        "boolean"
    }

    fn transform(&self, raw: RawValue) -> Result<Value, ValidationError> {
        match raw {
            RawValue::Bool(v) => Ok(Value::Bool(v)),
            RawValue::String(s) => parse_bool(&s)
                .map(Value::Bool)
                .ok_or(ValidationError::Unparseable {
                    definition: self.kind(),
                    input: s,
                }),
            other => Err(ValidationError::UnknownType {
                definition: self.kind(),
                actual: other.type_name(),
            }),
        }
    }

    fn default_value(&self) -> RawValue {
        RawValue::Bool(self.default)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
