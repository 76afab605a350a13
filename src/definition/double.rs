use std::any::Any;

use serde::{Deserialize, Serialize};

use crate::datum::Datum;
use crate::error::{BrokerResult, ValidationError};
use crate::value::{Number, RawValue, Value};

use super::{check_range, recorded_under, Definition};

/// 64-bit float contract.
///
/// Accepts every built-in integer and float width. Non-finite values are
/// rejected so that range checks and comparisons stay meaningful.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DoubleDefinition {
    /// Inclusive lower bound; `min == max == 0` means unbounded.
    pub min: f64,
    /// Inclusive upper bound.
    pub max: f64,
    /// Initial value of the attribute.
    pub default: f64,
}

impl DoubleDefinition {
    /// Unbounded float starting at `default`.
    #[must_use]
    pub const fn new(default: f64) -> Self {
        Self {
            min: 0.0,
            max: 0.0,
            default,
        }
    }

    /// Float restricted to `[min, max]`.
    #[must_use]
    pub const fn bounded(min: f64, max: f64, default: f64) -> Self {
        Self { min, max, default }
    }

    /// Reads the datum as a float recorded under this exact definition.
    pub fn extract(&self, datum: &Datum) -> BrokerResult<f64> {
        let value = recorded_under(self, datum)?;
        Ok(value.as_float().unwrap_or(self.default))
    }
}

impl Definition for DoubleDefinition {
    fn kind(&self) -> &'static str {
        "double"
    }

    #[allow(clippy::cast_precision_loss)]
    fn transform(&self, raw: RawValue) -> Result<Value, ValidationError> {
        let value = match raw.number() {
            Some(Number::Signed(v)) => v as f64,
            Some(Number::Unsigned(v)) => v as f64,
            Some(Number::Float(v)) => v,
            None => {
                return Err(ValidationError::UnknownType {
                    definition: self.kind(),
                    actual: raw.type_name(),
                })
            }
        };
        if !value.is_finite() {
            return Err(ValidationError::NotFinite { value });
        }

        check_range(value, self.min, self.max, Value::Float)?;
        Ok(Value::Float(value))
    }

    fn default_value(&self) -> RawValue {
        RawValue::F64(self.default)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
