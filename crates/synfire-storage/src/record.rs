//! Self-describing object records
//!
//! Every stored object serializes to a JSON text record carrying a
//! `"type"` tag alongside its attributes. Deserialization dispatches on
//! the tag to a factory registered with the [`crate::store::ObjectStore`],
//! so the store never needs compile-time knowledge of the concrete types
//! it holds.

use std::any::Any;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::error::{Result, StorageError};
use crate::ids::ObjectId;

/// Field carrying the type tag in every record
pub const TYPE_FIELD: &str = "type";

/// A neural object that can round-trip through a self-describing record
pub trait Persistable: Send + Sync {
    /// Unique identifier of this object
    fn id(&self) -> ObjectId;

    /// Type tag written into the record's `"type"` field
    fn type_tag(&self) -> &'static str;

    /// Serialize to a JSON record containing the type tag
    fn to_record(&self) -> Result<String>;

    /// Downcast support for callers that know the concrete type
    fn as_any(&self) -> &dyn Any;
}

/// Factory that rebuilds an object from its record text
pub type FactoryFn = Arc<dyn Fn(&str) -> Result<Arc<dyn Persistable>> + Send + Sync>;

/// Serialize a value into record text, injecting the type tag
pub fn encode_record<T: Serialize>(value: &T, type_tag: &str) -> Result<String> {
    let mut json = serde_json::to_value(value)?;
    match json.as_object_mut() {
        Some(map) => {
            map.insert(TYPE_FIELD.to_string(), Value::String(type_tag.to_string()));
        }
        None => {
            return Err(StorageError::serialization(format!(
                "record for {} is not a JSON object",
                type_tag
            )));
        }
    }
    Ok(json.to_string())
}

/// Parse record text, validate its type tag, and rebuild the value
pub fn decode_record<T: DeserializeOwned>(record: &str, expected_tag: &str) -> Result<T> {
    let json: Value = serde_json::from_str(record)?;
    let tag = record_type_tag(&json)?;
    if tag != expected_tag {
        return Err(StorageError::malformed_record(format!(
            "expected type '{}', got '{}'",
            expected_tag, tag
        )));
    }
    Ok(serde_json::from_value(json)?)
}

/// Extract the type tag from a parsed record
pub fn record_type_tag(json: &Value) -> Result<&str> {
    json.get(TYPE_FIELD)
        .and_then(Value::as_str)
        .ok_or_else(|| StorageError::malformed_record("missing 'type' field"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Probe {
        id: ObjectId,
        label: String,
    }

    #[test]
    fn test_encode_injects_tag() {
        let probe = Probe {
            id: ObjectId::new(7),
            label: "x".into(),
        };
        let record = encode_record(&probe, "Probe").unwrap();
        let json: Value = serde_json::from_str(&record).unwrap();
        assert_eq!(json[TYPE_FIELD], "Probe");
        assert_eq!(json["label"], "x");
    }

    #[test]
    fn test_decode_checks_tag() {
        let probe = Probe {
            id: ObjectId::new(7),
            label: "x".into(),
        };
        let record = encode_record(&probe, "Probe").unwrap();

        let back: Probe = decode_record(&record, "Probe").unwrap();
        assert_eq!(back, probe);

        let err = decode_record::<Probe>(&record, "Other").unwrap_err();
        assert!(matches!(err, StorageError::MalformedRecord { .. }));
    }

    #[test]
    fn test_missing_tag_is_malformed() {
        let err = record_type_tag(&serde_json::json!({"id": 1})).unwrap_err();
        assert!(matches!(err, StorageError::MalformedRecord { .. }));
    }
}
