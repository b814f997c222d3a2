use std::{collections::BTreeMap, ffi::OsStr, fmt, fs, path::Path, str::FromStr};

use eyre::WrapErr;
use serde::{
    ser::{SerializeMap, SerializeSeq},
    Serialize,
};
use serde_json::{Map as JsonMap, Number as JsonNumber, Value as JsonValue};
use serde_yaml::{Number as YamlNumber, Value as YamlValue};
use toml::Value as TomlValue;

use crate::Error;

/// We use [`std::collections::BTreeMap`] as our default map structure.
pub type Map<K, V> = BTreeMap<K, V>;

/// A single animal as returned by the record store: a loosely shaped mapping
/// from field name to value. No field is guaranteed to be present.
pub type Record = Map<String, Value>;

/// The supported file formats from which we can load [`Value`] instances.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SupportedFormat {
    Json,
    Yaml,
    Toml,
}

impl SupportedFormat {
    /// Detect the format of a file from its extension.
    pub fn from_path(path: &Path) -> Result<Self, Error> {
        let ext = path
            .extension()
            .and_then(OsStr::to_str)
            .ok_or_else(|| Error::CannotDetermineFileType(path.to_path_buf()))?;
        Self::from_str(ext)
    }
}

impl FromStr for SupportedFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.to_lowercase();
        Ok(match lower.as_ref() {
            "json" => Self::Json,
            "yaml" | "yml" => Self::Yaml,
            "toml" => Self::Toml,
            _ => return Err(Error::UnsupportedFileType(s.to_string())),
        })
    }
}

/// An intermediate type for facilitating conversions between the formats
/// records and configuration can be loaded from.
#[derive(Debug, Clone, PartialEq, PartialOrd)]
pub enum Value {
    Null,
    Bool(bool),
    Signed(i64),
    Unsigned(u64),
    Float(f64),
    String(String),
    Array(Vec<Value>),
    Map(Map<String, Value>),
}

impl Value {
    /// Attempts to create a new value by parsing it from a string using the
    /// given format.
    pub fn load_as(fmt: SupportedFormat, content: &str) -> Result<Self, Error> {
        match fmt {
            SupportedFormat::Json => Ok(Self::from(serde_json::from_str::<JsonValue>(content)?)),
            SupportedFormat::Yaml => Self::try_from(serde_yaml::from_str::<YamlValue>(content)?),
            SupportedFormat::Toml => Self::try_from(toml::from_str::<TomlValue>(content)?),
        }
    }

    /// Attempts to create a new value by loading it from the given file.
    /// Automatically detects the file format and parses/converts it
    /// accordingly.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let path = path.as_ref();
        let fmt = SupportedFormat::from_path(path)?;
        let content = fs::read_to_string(path)
            .map_err(|e| Error::Io(format!("while trying to read from {}", path.display()), e))?;
        Self::load_as(fmt, &content)
    }

    /// A short name for the kind of value, used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Signed(_) | Self::Unsigned(_) => "integer",
            Self::Float(_) => "float",
            Self::String(_) => "string",
            Self::Array(_) => "array",
            Self::Map(_) => "map",
        }
    }

    /// Scalars are the only values a field-equality predicate may compare
    /// against.
    pub fn is_scalar(&self) -> bool {
        !matches!(self, Self::Array(_) | Self::Map(_))
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    pub fn as_signed(&self) -> Option<i64> {
        match self {
            Self::Signed(i) => Some(*i),
            Self::Unsigned(u) => i64::try_from(*u).ok(),
            _ => None,
        }
    }

    /// Numeric view of this value. Only finite numbers qualify.
    pub fn as_f64(&self) -> Option<f64> {
        let f = match self {
            Self::Signed(i) => *i as f64,
            Self::Unsigned(u) => *u as f64,
            Self::Float(f) => *f,
            _ => return None,
        };
        if f.is_finite() {
            Some(f)
        } else {
            None
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s.as_ref()),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&Map<String, Value>> {
        match self {
            Self::Map(m) => Some(m),
            _ => None,
        }
    }

    /// Equality as the record store understands it: integers compare by
    /// numeric value regardless of signedness, everything else structurally.
    pub fn loosely_eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Signed(_) | Self::Unsigned(_), Self::Signed(_) | Self::Unsigned(_)) => {
                match (self.as_signed(), other.as_signed()) {
                    (Some(a), Some(b)) => a == b,
                    _ => self == other,
                }
            }
            (Self::Float(f), Self::Signed(_) | Self::Unsigned(_))
            | (Self::Signed(_) | Self::Unsigned(_), Self::Float(f)) => {
                let int = if let Self::Float(_) = self { other } else { self };
                int.as_f64().map(|i| i == *f).unwrap_or(false)
            }
            _ => self == other,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => Ok(()),
            Self::Bool(b) => write!(f, "{}", b),
            Self::Signed(i) => write!(f, "{}", i),
            Self::Unsigned(u) => write!(f, "{}", u),
            Self::Float(x) => write!(f, "{}", x),
            Self::String(s) => write!(f, "{}", s),
            Self::Array(_) | Self::Map(_) => write!(f, "{}", JsonValue::from(self.clone())),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Self::Float(f)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Self::Signed(i)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl Serialize for Value {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        match self {
            Value::Null => serializer.serialize_none(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Signed(i) => serializer.serialize_i64(*i),
            Value::Unsigned(u) => serializer.serialize_u64(*u),
            Value::Float(f) => serializer.serialize_f64(*f),
            Value::String(s) => serializer.serialize_str(s),
            Value::Array(arr) => {
                let mut seq = serializer.serialize_seq(Some(arr.len()))?;
                for el in arr {
                    seq.serialize_element(el)?;
                }
                seq.end()
            }
            Value::Map(m) => {
                let mut sm = serializer.serialize_map(Some(m.len()))?;
                for (k, v) in m {
                    sm.serialize_entry(k, v)?;
                }
                sm.end()
            }
        }
    }
}

impl From<Value> for JsonValue {
    fn from(v: Value) -> Self {
        match v {
            Value::Null => Self::Null,
            Value::Bool(b) => JsonValue::Bool(b),
            Value::Signed(i) => i.into(),
            Value::Unsigned(u) => u.into(),
            // Non-finite floats have no JSON representation.
            Value::Float(f) => JsonNumber::from_f64(f)
                .map(JsonValue::Number)
                .unwrap_or(JsonValue::Null),
            Value::String(s) => JsonValue::String(s),
            Value::Array(arr) => JsonValue::Array(arr.into_iter().map(Into::into).collect()),
            Value::Map(m) => JsonValue::Object(JsonMap::from_iter(
                m.into_iter().map(|(k, v)| (k, v.into())),
            )),
        }
    }
}

impl From<JsonValue> for Value {
    fn from(value: JsonValue) -> Self {
        match value {
            JsonValue::Null => Self::Null,
            JsonValue::Bool(b) => Self::Bool(b),
            JsonValue::Number(n) => Self::from(n),
            JsonValue::String(s) => Self::String(s),
            JsonValue::Array(arr) => Self::Array(arr.into_iter().map(Into::into).collect()),
            JsonValue::Object(obj) => {
                Self::Map(Map::from_iter(obj.into_iter().map(|(k, v)| (k, v.into()))))
            }
        }
    }
}

impl From<JsonNumber> for Value {
    fn from(value: JsonNumber) -> Self {
        if let Some(i) = value.as_i64() {
            Self::Signed(i)
        } else if let Some(u) = value.as_u64() {
            Self::Unsigned(u)
        } else {
            Self::Float(value.as_f64().unwrap_or(f64::NAN))
        }
    }
}

impl TryFrom<YamlValue> for Value {
    type Error = Error;

    fn try_from(value: YamlValue) -> Result<Self, Self::Error> {
        Ok(match value {
            YamlValue::Null => Self::Null,
            YamlValue::Bool(b) => Self::Bool(b),
            YamlValue::Number(n) => Self::from(n),
            YamlValue::String(s) => Self::String(s),
            YamlValue::Sequence(seq) => Self::Array(
                seq.into_iter()
                    .map(TryInto::try_into)
                    .collect::<Result<Vec<Self>, Error>>()?,
            ),
            YamlValue::Mapping(m) => Self::Map(
                m.into_iter()
                    .map(|(k, v)| match k {
                        YamlValue::String(k) => Ok((k, v.try_into()?)),
                        _ => Err(Error::ObjectKeysMustBeStrings),
                    })
                    .collect::<Result<Map<String, Self>, Error>>()?,
            ),
        })
    }
}

impl From<YamlNumber> for Value {
    fn from(value: YamlNumber) -> Self {
        if let Some(i) = value.as_i64() {
            Self::Signed(i)
        } else if let Some(u) = value.as_u64() {
            Self::Unsigned(u)
        } else {
            Self::Float(value.as_f64().unwrap_or(f64::NAN))
        }
    }
}

impl TryFrom<TomlValue> for Value {
    type Error = Error;

    fn try_from(value: TomlValue) -> Result<Self, Self::Error> {
        Ok(match value {
            TomlValue::String(s) => Self::String(s),
            TomlValue::Integer(i) => Self::Signed(i),
            TomlValue::Float(f) => Self::Float(f),
            TomlValue::Boolean(b) => Self::Bool(b),
            TomlValue::Datetime(dt) => Self::String(dt.to_string()),
            TomlValue::Array(arr) => Self::Array(
                arr.into_iter()
                    .map(TryInto::try_into)
                    .collect::<Result<Vec<Self>, Error>>()?,
            ),
            TomlValue::Table(t) => Self::Map(
                t.into_iter()
                    .map(|(k, v)| Ok((k, Self::try_from(v)?)))
                    .collect::<Result<Map<String, Self>, Error>>()?,
            ),
        })
    }
}

/// Load one or more records from the given file. The file may hold either a
/// single object or an array of objects.
pub fn load_records<P: AsRef<Path>>(path: P) -> eyre::Result<Vec<Record>> {
    let path = path.as_ref();
    let value =
        Value::load_from_file(path).wrap_err_with(|| Error::FailedToLoadRecords(path.to_path_buf()))?;
    let records = into_records(value).wrap_err_with(|| Error::FailedToLoadRecords(path.to_path_buf()))?;
    Ok(records)
}

/// Split a loaded value into records, rejecting anything that isn't an object.
pub fn into_records(value: Value) -> Result<Vec<Record>, Error> {
    match value {
        Value::Map(m) => Ok(vec![m]),
        Value::Array(arr) => arr
            .into_iter()
            .map(|v| match v {
                Value::Map(m) => Ok(m),
                other => Err(Error::RecordMustBeObject(other.kind())),
            })
            .collect(),
        other => Err(Error::RecordMustBeObject(other.kind())),
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use serde_json::json;

    #[test]
    fn json_numbers_keep_their_kind() {
        let v = Value::from(json!({"lat": 30.75, "age": 3, "big": u64::MAX}));
        let m = v.as_map().unwrap();
        assert_eq!(m.get("lat"), Some(&Value::Float(30.75)));
        assert_eq!(m.get("age"), Some(&Value::Signed(3)));
        assert_eq!(m.get("big"), Some(&Value::Unsigned(u64::MAX)));
    }

    #[test]
    fn yaml_and_toml_records() {
        let yaml = "- breed: Labrador\n  rescueType: Water Rescue\n- breed: Husky\n";
        let records = into_records(Value::load_as(SupportedFormat::Yaml, yaml).unwrap()).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].get("breed").and_then(Value::as_str), Some("Husky"));

        let toml = "breed = \"Beagle\"\nlocation_lat = 30.5\n";
        let records = into_records(Value::load_as(SupportedFormat::Toml, toml).unwrap()).unwrap();
        assert_eq!(records[0].get("location_lat").and_then(Value::as_f64), Some(30.5));
    }

    #[test]
    fn non_object_records_are_rejected() {
        let v = Value::from(json!([{"breed": "Labrador"}, 42]));
        assert!(matches!(into_records(v), Err(Error::RecordMustBeObject("integer"))));
    }

    #[test]
    fn integers_compare_across_signedness() {
        assert!(Value::Signed(7).loosely_eq(&Value::Unsigned(7)));
        assert!(Value::Float(7.0).loosely_eq(&Value::Signed(7)));
        assert!(!Value::String("7".into()).loosely_eq(&Value::Signed(7)));
    }

    #[test]
    fn unsupported_extension() {
        assert!(matches!(
            SupportedFormat::from_path(Path::new("animals.csv")),
            Err(Error::UnsupportedFileType(_))
        ));
    }
}
