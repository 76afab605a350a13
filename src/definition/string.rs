use std::any::Any;

use serde::{Deserialize, Serialize};

use crate::datum::Datum;
use crate::error::{BrokerResult, ValidationError};
use crate::value::{RawValue, Value};

use super::{recorded_under, Definition};

/// String contract. Only string input is accepted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StringDefinition {
    /// Initial value of the attribute.
    pub default: String,
}

impl StringDefinition {
    /// String starting at `default`.
    #[must_use]
    pub fn new(default: impl Into<String>) -> Self {
        Self {
            default: default.into(),
        }
    }

    /// Reads the datum as a string recorded under this exact definition.
    pub fn extract(&self, datum: &Datum) -> BrokerResult<String> {
        let value = recorded_under(self, datum)?;
        Ok(value
            .as_string()
            .map_or_else(|| self.default.clone(), str::to_string))
    }
}

impl Definition for StringDefinition {
    fn kind(&self) -> &'static str {
        "string"
    }

    fn transform(&self, raw: RawValue) -> Result<Value, ValidationError> {
        match raw {
            RawValue::String(s) => Ok(Value::String(s)),
            other => Err(ValidationError::UnknownType {
                definition: self.kind(),
                actual: other.type_name(),
            }),
        }
    }

    fn default_value(&self) -> RawValue {
        RawValue::String(self.default.clone())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_strings() {
        let def = StringDefinition::new("off");
        assert_eq!(def.transform("on".into()).unwrap(), Value::String("on".into()));
        assert_eq!(
            def.transform(def.default_value()).unwrap(),
            Value::String("off".into())
        );
    }

    #[test]
    fn test_rejects_non_strings() {
        let def = StringDefinition::default();
        assert!(def.transform(5.into()).is_err());
        assert!(def.transform(RawValue::Null).is_err());
    }
}
