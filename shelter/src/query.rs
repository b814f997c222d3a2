//! Field-equality predicates understood by the record store.

use std::fmt;

use serde::Serialize;

use crate::{category::Category, Error, Map, Record, Value};

/// The field holding an animal's rescue category.
pub const RESCUE_TYPE_FIELD: &str = "rescueType";

/// A find-style query: every field listed must equal the given value. The
/// empty predicate matches every record.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Predicate(Map<String, Value>);

impl Predicate {
    /// The predicate that matches every record.
    pub fn all() -> Self {
        Self::default()
    }

    /// Convenience method for constructing a predicate one constraint at a
    /// time.
    pub fn with<K, V>(mut self, field: K, value: V) -> Self
    where
        K: Into<String>,
        V: Into<Value>,
    {
        self.0.insert(field.into(), value.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    /// An iterator visiting all field/value constraints in field order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    /// Checks that this predicate is something the store may execute: field
    /// names are non-empty and unquoted, values are scalars, and a rescue type
    /// constraint names one of the known categories.
    pub fn validate(&self) -> Result<(), Error> {
        for (field, value) in self.iter() {
            if field.is_empty() || field.contains('"') {
                return Err(Error::InvalidQuery(format!(
                    "invalid field name \"{}\"",
                    field
                )));
            }
            if !value.is_scalar() {
                return Err(Error::InvalidQuery(format!(
                    "field \"{}\" must be compared against a scalar, but got a {}",
                    field,
                    value.kind()
                )));
            }
        }
        if let Some(rescue_type) = self.get(RESCUE_TYPE_FIELD) {
            let known = rescue_type
                .as_str()
                .map(|s| Category::ALL.iter().any(|c| c.value() == s))
                .unwrap_or(false);
            if !known {
                return Err(Error::InvalidQuery(format!(
                    "invalid rescue type {}",
                    rescue_type
                )));
            }
        }
        Ok(())
    }

    /// Whether the given record satisfies every constraint. A missing field
    /// only matches a `null` constraint.
    pub fn matches(&self, record: &Record) -> bool {
        self.iter().all(|(field, expected)| match record.get(field) {
            Some(actual) => actual.loosely_eq(expected),
            None => expected.is_null(),
        })
    }
}

/// Loosely typed input (e.g. parsed from JSON) must be a map of field names to
/// scalar values to be usable as a predicate.
impl TryFrom<Value> for Predicate {
    type Error = Error;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Map(m) => {
                let predicate = Self(m);
                predicate.validate()?;
                Ok(predicate)
            }
            other => Err(Error::InvalidQuery(format!(
                "query must be a map of field names to values, but got a {}",
                other.kind()
            ))),
        }
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, (field, value)) in self.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}: {:?}", field, value.to_string())?;
        }
        write!(f, "}}")
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use serde_json::json;

    #[test]
    fn non_map_queries_are_rejected() {
        let err = Predicate::try_from(Value::from(json!(["rescueType", "Water Rescue"])));
        assert!(matches!(err, Err(Error::InvalidQuery(_))));
    }

    #[test]
    fn nested_values_are_rejected() {
        let err = Predicate::try_from(Value::from(json!({"breed": {"$ne": "Husky"}})));
        assert!(matches!(err, Err(Error::InvalidQuery(_))));
    }

    #[test]
    fn rescue_type_must_be_known() {
        let err = Predicate::try_from(Value::from(json!({"rescueType": "Cave Rescue"})));
        assert!(matches!(err, Err(Error::InvalidQuery(_))));
        let err = Predicate::try_from(Value::from(json!({"rescueType": 3})));
        assert!(matches!(err, Err(Error::InvalidQuery(_))));

        let ok = Predicate::try_from(Value::from(json!({"rescueType": "All"}))).unwrap();
        assert_eq!(ok.get(RESCUE_TYPE_FIELD), Some(&Value::from("All")));
    }

    #[test]
    fn matching() {
        let record = Value::from(json!({"breed": "Labrador", "age": 3}));
        let record = record.as_map().unwrap();
        assert!(Predicate::all().matches(record));
        assert!(Predicate::all().with("breed", "Labrador").matches(record));
        assert!(Predicate::all().with("age", 3_i64).matches(record));
        assert!(!Predicate::all().with("breed", "labrador").matches(record));
        assert!(!Predicate::all().with("name", "Rex").matches(record));
        assert!(Predicate::all().with("name", Value::Null).matches(record));
    }
}
