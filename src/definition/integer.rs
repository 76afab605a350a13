use std::any::Any;

use serde::{Deserialize, Serialize};

use crate::datum::Datum;
use crate::error::{BrokerResult, ValidationError};
use crate::value::{Number, RawValue, Value};

use super::{check_range, recorded_under, Definition};

/// 64-bit integer contract.
///
/// Accepts every built-in integer width and both float widths. Floats are
/// truncated toward zero (saturating at the `i64` limits); non-finite floats
/// and unsigned values above `i64::MAX` are rejected.
///
/// # Examples
///
/// ```
/// use attrbus::{Definition, IntegerDefinition, Value};
///
/// let def = IntegerDefinition::bounded(0, 100, 20);
/// assert_eq!(def.transform(42u8.into()).unwrap(), Value::Int(42));
/// assert!(def.transform(101.into()).is_err());
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IntegerDefinition {
    /// Inclusive lower bound; `min == max == 0` means unbounded.
    pub min: i64,
    /// Inclusive upper bound.
    pub max: i64,
    /// Initial value of the attribute.
    pub default: i64,
}

impl IntegerDefinition {
    /// Unbounded integer starting at `default`.
    #[must_use]
    pub const fn new(default: i64) -> Self {
        Self {
            min: 0,
            max: 0,
            default,
        }
    }

    /// Integer restricted to `[min, max]`.
    #[must_use]
    pub const fn bounded(min: i64, max: i64, default: i64) -> Self {
        Self { min, max, default }
    }

    /// Reads the datum as an integer recorded under this exact definition.
    pub fn extract(&self, datum: &Datum) -> BrokerResult<i64> {
        let value = recorded_under(self, datum)?;
        Ok(value.as_int().unwrap_or(self.default))
    }
}

impl Definition for IntegerDefinition {
    fn kind(&self) -> &'static str {
        "integer"
    }

    #[allow(clippy::cast_possible_truncation)]
    fn transform(&self, raw: RawValue) -> Result<Value, ValidationError> {
        let value = match raw.number() {
            Some(Number::Signed(v)) => v,
            Some(Number::Unsigned(v)) => {
                i64::try_from(v).map_err(|_| ValidationError::IntegerOverflow { value: v })?
            }
            Some(Number::Float(v)) => {
                if !v.is_finite() {
                    return Err(ValidationError::NotFinite { value: v });
                }
                v as i64
            }
            None => {
                return Err(ValidationError::UnknownType {
                    definition: self.kind(),
                    actual: raw.type_name(),
                })
            }
        };

        check_range(value, self.min, self.max, Value::Int)?;
        Ok(Value::Int(value))
    }

    fn default_value(&self) -> RawValue {
        RawValue::I64(self.default)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_every_integer_width() {
        let def = IntegerDefinition::new(0);
        assert_eq!(def.transform(RawValue::I8(-8)).unwrap(), Value::Int(-8));
        assert_eq!(def.transform(RawValue::I16(16)).unwrap(), Value::Int(16));
        assert_eq!(def.transform(RawValue::I32(32)).unwrap(), Value::Int(32));
        assert_eq!(def.transform(RawValue::I64(64)).unwrap(), Value::Int(64));
        assert_eq!(def.transform(RawValue::U8(8)).unwrap(), Value::Int(8));
        assert_eq!(def.transform(RawValue::Usize(9)).unwrap(), Value::Int(9));
    }

    #[test]
    fn test_floats_truncate_toward_zero() {
        let def = IntegerDefinition::new(0);
        assert_eq!(def.transform(RawValue::F64(2.9)).unwrap(), Value::Int(2));
        assert_eq!(def.transform(RawValue::F32(-2.9)).unwrap(), Value::Int(-2));
    }

    #[test]
    fn test_rejects_non_finite_and_overflow() {
        let def = IntegerDefinition::new(0);
        assert!(matches!(
            def.transform(RawValue::F64(f64::NAN)),
            Err(ValidationError::NotFinite { .. })
        ));
        assert_eq!(
            def.transform(RawValue::U64(u64::MAX)),
            Err(ValidationError::IntegerOverflow { value: u64::MAX })
        );
    }

    #[test]
    fn test_rejects_unknown_type() {
        let def = IntegerDefinition::new(0);
        assert_eq!(
            def.transform("12".into()),
            Err(ValidationError::UnknownType {
                definition: "integer",
                actual: "string",
            })
        );
        assert!(def.transform(true.into()).is_err());
        assert!(def.transform(RawValue::Null).is_err());
    }

    #[test]
    fn test_range_is_enforced() {
        let def = IntegerDefinition::bounded(10, 20, 15);
        assert_eq!(def.transform(10.into()).unwrap(), Value::Int(10));
        assert_eq!(
            def.transform(9.into()),
            Err(ValidationError::BelowMinimum {
                value: Value::Int(9),
                min: Value::Int(10),
            })
        );
        assert_eq!(
            def.transform(21.into()),
            Err(ValidationError::AboveMaximum {
                value: Value::Int(21),
                max: Value::Int(20),
            })
        );
    }

    #[test]
    fn test_zero_bounds_mean_unbounded() {
        let def = IntegerDefinition::new(3);
        assert_eq!(def.transform(i64::MIN.into()).unwrap(), Value::Int(i64::MIN));
    }

    #[test]
    fn test_default_passes_own_transform() {
        let def = IntegerDefinition::bounded(1, 5, 3);
        assert_eq!(def.transform(def.default_value()).unwrap(), Value::Int(3));

        let broken = IntegerDefinition::bounded(1, 5, 9);
        assert!(broken.transform(broken.default_value()).is_err());
    }
}
