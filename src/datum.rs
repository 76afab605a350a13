//! The last recorded value for an attribute name.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};

use crate::definition::Definition;
use crate::source::Source;
use crate::value::Value;

/// Most recent value recorded under an attribute name.
///
/// A datum outlives the attribute that produced it: canceling the attribute
/// leaves its last datum listable through [`Broker::list`](crate::Broker::list).
#[derive(Debug, Clone, Serialize)]
pub struct Datum {
    owner: String,
    name: String,
    #[serde(serialize_with = "serialize_definition")]
    definition: Option<Arc<dyn Definition>>,
    value: Value,
    source: Source,
    at: DateTime<Utc>,
}

fn serialize_definition<S>(def: &Option<Arc<dyn Definition>>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match def {
        Some(def) => serializer.serialize_some(def.kind()),
        None => serializer.serialize_none(),
    }
}

impl Datum {
    pub(crate) fn new(
        owner: impl Into<String>,
        name: impl Into<String>,
        definition: Option<Arc<dyn Definition>>,
        value: Value,
        source: Source,
    ) -> Self {
        Self {
            owner: owner.into(),
            name: name.into(),
            definition,
            value,
            source,
            at: Utc::now(),
        }
    }

    /// Name of the client that owns the attribute.
    #[must_use]
    pub fn owner(&self) -> &str {
        &self.owner
    }

    /// Fully qualified attribute name, `<owner>.<local>`.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Definition the value was validated against, if any.
    #[must_use]
    pub fn definition(&self) -> Option<&dyn Definition> {
        self.definition.as_deref()
    }

    /// The canonical value.
    #[must_use]
    pub const fn value(&self) -> &Value {
        &self.value
    }

    /// Who triggered this update.
    #[must_use]
    pub const fn source(&self) -> &Source {
        &self.source
    }

    /// When the value was recorded.
    #[must_use]
    pub const fn at(&self) -> DateTime<Utc> {
        self.at
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definition::IntegerDefinition;

    #[test]
    fn test_datum_accessors() {
        let def: Arc<dyn Definition> = Arc::new(IntegerDefinition::new(3));
        let datum = Datum::new(
            "owner1",
            "owner1.temp",
            Some(def),
            Value::Int(3),
            Source::client_named("owner1"),
        );
        assert_eq!(datum.owner(), "owner1");
        assert_eq!(datum.name(), "owner1.temp");
        assert_eq!(datum.value(), &Value::Int(3));
        assert_eq!(datum.definition().map(|d| d.kind()), Some("integer"));
        assert_eq!(datum.source().client(), "owner1");
        assert!(datum.at() <= Utc::now());
    }

    #[test]
    fn test_datum_serializes_definition_by_kind() {
        let datum = Datum::new(
            "porch",
            "porch.light",
            None,
            Value::Bool(true),
            Source::client_named("porch"),
        );
        let json = serde_json::to_value(&datum).unwrap();
        assert_eq!(json["name"], "porch.light");
        assert_eq!(json["definition"], serde_json::Value::Null);
        assert_eq!(json["value"], serde_json::json!({"type": "bool", "value": true}));
        assert_eq!(json["source"]["client"], "porch");
    }
}
