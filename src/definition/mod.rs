//! Value contracts attached to attributes.
//!
//! A [`Definition`] coerces an arbitrary [`RawValue`] into one canonical
//! [`Value`], rejects what it cannot coerce, and supplies the default an
//! attribute starts with. New variants are added as new types implementing
//! the trait.
//!
//! Numeric variants treat `min == 0 && max == 0` as "unbounded". Any other
//! pair is an inclusive `[min, max]` range.

mod boolean;
mod double;
mod integer;
mod string;

use std::any::Any;
use std::fmt;

use crate::datum::Datum;
use crate::error::{BrokerError, BrokerResult, ValidationError};
use crate::value::{RawValue, Value};

pub use boolean::BooleanDefinition;
pub use double::DoubleDefinition;
pub use integer::IntegerDefinition;
pub use string::StringDefinition;

/// Validation and coercion contract for an attribute's values.
///
/// `default_value()` must be accepted by `transform()`; the broker checks this
/// when the attribute is created and refuses the attribute otherwise.
pub trait Definition: Any + Send + Sync + fmt::Debug {
    /// Short name of the contract, e.g. `"integer"`.
    fn kind(&self) -> &'static str;

    /// Coerce and validate a raw value.
    fn transform(&self, raw: RawValue) -> Result<Value, ValidationError>;

    /// Value an attribute holds before anything is published to it.
    fn default_value(&self) -> RawValue;

    /// Side-effecting hook run on every accepted external publish, after
    /// `transform` and before the attribute's own accept callbacks.
    ///
    /// Returning an error vetoes the publish.
    fn accept(&self, value: &Value) -> Result<(), String> {
        let _ = value;
        Ok(())
    }

    /// Upcast used by typed extraction helpers.
    fn as_any(&self) -> &dyn Any;
}

/// Returns the datum's value if it was recorded under a definition equal to `expected`.
pub(crate) fn recorded_under<'a, D>(expected: &D, datum: &'a Datum) -> BrokerResult<&'a Value>
where
    D: Definition + PartialEq,
{
    let same = datum
        .definition()
        .and_then(|def| def.as_any().downcast_ref::<D>())
        .is_some_and(|def| def == expected);

    if same {
        Ok(datum.value())
    } else {
        Err(BrokerError::MismatchedDefinition {
            expected: expected.kind(),
            actual: datum
                .definition()
                .map_or_else(|| "undefined".to_string(), |def| format!("{def:?}")),
        })
    }
}

/// Inclusive range check honouring the all-zero-means-unbounded convention.
pub(crate) fn check_range<T>(value: T, min: T, max: T, wrap: fn(T) -> Value) -> Result<(), ValidationError>
where
    T: PartialOrd + Copy + Default,
{
    let zero = T::default();
    if min == zero && max == zero {
        return Ok(());
    }
    if value < min {
        return Err(ValidationError::BelowMinimum {
            value: wrap(value),
            min: wrap(min),
        });
    }
    if value > max {
        return Err(ValidationError::AboveMaximum {
            value: wrap(value),
            max: wrap(max),
        });
    }
    Ok(())
}
