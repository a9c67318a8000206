//! Serde plumbing for configuration structs.
//!
//! Field discovery uses a deserializer that only answers `deserialize_struct`
//! and records the field list serde hands it. Assignment goes through
//! [`envy`], which parses primitives, comma separated lists and unit enums
//! out of the resolved strings.

use crate::error::ProcessError;
use serde::de::{self, DeserializeOwned, Deserializer, Visitor};
use serde::forward_to_deserialize_any;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

const REDACTED: &str = "[redacted]";

/// Returns the field names of `T`, honouring serde renames.
pub(crate) fn struct_fields<T: DeserializeOwned>() -> Result<&'static [&'static str], &'static str> {
    let mut probe = FieldProbe::default();
    // The probe always errors out; the field list is captured on the way.
    let outcome = T::deserialize(&mut probe);
    match (probe.fields, outcome) {
        (Some(fields), _) => Ok(fields),
        (None, Err(ProbeError::NotAStruct(kind))) => Err(kind),
        (None, _) => Err("an unsupported type"),
    }
}

/// Environment key a field is read from.
pub(crate) fn env_key(field: &str) -> String {
    field.to_uppercase()
}

/// Builds `T` from resolved `(key, value)` pairs.
///
/// `envy` quotes offending values in its errors. Values listed in `redact`
/// (typically the ones a mutator produced) are masked before the message
/// leaves this function.
pub(crate) fn from_values<T: DeserializeOwned>(
    values: BTreeMap<String, String>,
    redact: &BTreeSet<String>,
) -> Result<T, ProcessError> {
    envy::from_iter(values).map_err(|err| {
        let message = redact
            .iter()
            .filter(|value| !value.is_empty())
            .fold(err.to_string(), |message, value| {
                message.replace(value.as_str(), REDACTED)
            });
        ProcessError::Deserialize(message)
    })
}

#[derive(Default)]
struct FieldProbe {
    fields: Option<&'static [&'static str]>,
}

#[derive(Debug)]
enum ProbeError {
    Captured,
    NotAStruct(&'static str),
    Custom(String),
}

impl fmt::Display for ProbeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProbeError::Captured => write!(f, "field list captured"),
            ProbeError::NotAStruct(kind) => write!(f, "expected a struct, got {}", kind),
            ProbeError::Custom(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for ProbeError {}

impl de::Error for ProbeError {
    fn custom<M: fmt::Display>(msg: M) -> Self {
        ProbeError::Custom(msg.to_string())
    }
}

impl<'de> Deserializer<'de> for &mut FieldProbe {
    type Error = ProbeError;

    fn deserialize_any<V: Visitor<'de>>(self, _visitor: V) -> Result<V::Value, ProbeError> {
        Err(ProbeError::NotAStruct("a non-struct type"))
    }

    fn deserialize_map<V: Visitor<'de>>(self, _visitor: V) -> Result<V::Value, ProbeError> {
        Err(ProbeError::NotAStruct("a map (flattened or untyped fields)"))
    }

    fn deserialize_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        fields: &'static [&'static str],
        _visitor: V,
    ) -> Result<V::Value, ProbeError> {
        self.fields = Some(fields);
        Err(ProbeError::Captured)
    }

    forward_to_deserialize_any! {
        bool i8 i16 i32 i64 i128 u8 u16 u32 u64 u128 f32 f64 char str string
        bytes byte_buf option unit unit_struct newtype_struct seq tuple
        tuple_struct enum identifier ignored_any
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, PartialEq)]
    #[serde(rename_all = "lowercase")]
    enum Level {
        Debug,
        Info,
    }

    #[derive(Debug, Deserialize, PartialEq)]
    struct Typed {
        port: u16,
        debug: bool,
        ratio: f64,
        hosts: Vec<String>,
        level: Level,
        timeout: Option<u64>,
        #[serde(rename = "display_name", default)]
        name: String,
    }

    fn values(entries: &[(&str, &str)]) -> BTreeMap<String, String> {
        entries
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_struct_fields_follow_renames() {
        let fields = struct_fields::<Typed>().unwrap();
        assert_eq!(
            fields,
            &["port", "debug", "ratio", "hosts", "level", "timeout", "display_name"]
        );
    }

    #[test]
    fn test_struct_fields_rejects_non_structs() {
        assert!(struct_fields::<String>().is_err());
        assert!(struct_fields::<std::collections::HashMap<String, String>>().is_err());
    }

    #[test]
    fn test_env_key_is_uppercase_field() {
        assert_eq!(env_key("secret_my_var"), "SECRET_MY_VAR");
        assert_eq!(env_key("PORT"), "PORT");
    }

    #[test]
    fn test_from_values_coerces_primitives() {
        let typed: Typed = from_values(
            values(&[
                ("PORT", "8080"),
                ("DEBUG", "true"),
                ("RATIO", "0.5"),
                ("HOSTS", "a,b,c"),
                ("LEVEL", "info"),
            ]),
            &BTreeSet::new(),
        )
        .unwrap();

        assert_eq!(
            typed,
            Typed {
                port: 8080,
                debug: true,
                ratio: 0.5,
                hosts: vec!["a".to_string(), "b".to_string(), "c".to_string()],
                level: Level::Info,
                timeout: None,
                name: String::new(),
            }
        );
    }

    #[test]
    fn test_from_values_masks_redacted_values() {
        let redact = BTreeSet::from(["hunter2".to_string()]);
        let err = from_values::<Typed>(
            values(&[
                ("PORT", "hunter2"),
                ("DEBUG", "false"),
                ("RATIO", "1"),
                ("HOSTS", "a"),
                ("LEVEL", "debug"),
            ]),
            &redact,
        )
        .unwrap_err();

        let message = err.to_string();
        assert!(message.contains(REDACTED), "{}", message);
        assert!(!message.contains("hunter2"), "{}", message);
    }

    #[test]
    fn test_from_values_missing_required_field() {
        let err = from_values::<Typed>(values(&[("PORT", "1")]), &BTreeSet::new()).unwrap_err();
        assert!(matches!(err, ProcessError::Deserialize(_)));
        assert!(err.to_string().contains("debug"), "{}", err);
    }
}
