//! Just enough JSON-Cadence decoding for the script results this service
//! consumes. The access node returns values as `{"type": ..., "value": ...}`
//! pairs; composites carry a field list, dictionaries a key/value entry list.

use anyhow::{anyhow, Result};
use serde_json::Value;

fn kind(value: &Value) -> Result<&str> {
    value
        .get("type")
        .and_then(Value::as_str)
        .ok_or_else(|| anyhow!("cadence value missing type tag: {}", value))
}

fn payload(value: &Value) -> Result<&Value> {
    value
        .get("value")
        .ok_or_else(|| anyhow!("cadence value missing payload: {}", value))
}

/// Unwraps an `Optional`, mapping a nil payload to `None`. Non-optional
/// values pass through unchanged.
pub fn unwrap_optional(value: &Value) -> Result<Option<&Value>> {
    if kind(value)? != "Optional" {
        return Ok(Some(value));
    }
    let inner = payload(value)?;
    Ok(if inner.is_null() { None } else { Some(inner) })
}

pub fn as_str(value: &Value) -> Result<&str> {
    match kind(value)? {
        "String" | "Address" | "Character" => payload(value)?
            .as_str()
            .ok_or_else(|| anyhow!("non-string payload: {}", value)),
        other => Err(anyhow!("expected string-like cadence value, got {}", other)),
    }
}

/// Fixed-point values arrive as decimal strings.
pub fn as_f64(value: &Value) -> Result<f64> {
    match kind(value)? {
        "UFix64" | "Fix64" => Ok(payload(value)?
            .as_str()
            .ok_or_else(|| anyhow!("non-string fixed-point payload: {}", value))?
            .parse::<f64>()?),
        other => Err(anyhow!("expected fixed-point cadence value, got {}", other)),
    }
}

/// Integers also arrive as strings to survive 64-bit precision.
pub fn as_u64(value: &Value) -> Result<u64> {
    match kind(value)? {
        "UInt64" | "UInt32" | "UInt16" | "UInt8" | "UInt" | "Int" => Ok(payload(value)?
            .as_str()
            .ok_or_else(|| anyhow!("non-string integer payload: {}", value))?
            .parse::<u64>()?),
        other => Err(anyhow!("expected integer cadence value, got {}", other)),
    }
}

pub fn as_array(value: &Value) -> Result<&Vec<Value>> {
    if kind(value)? != "Array" {
        return Err(anyhow!("expected cadence array, got {}", kind(value)?));
    }
    payload(value)?
        .as_array()
        .ok_or_else(|| anyhow!("non-array payload: {}", value))
}

pub fn dictionary_entries(value: &Value) -> Result<Vec<(&Value, &Value)>> {
    if kind(value)? != "Dictionary" {
        return Err(anyhow!("expected cadence dictionary, got {}", kind(value)?));
    }
    let entries = payload(value)?
        .as_array()
        .ok_or_else(|| anyhow!("non-array dictionary payload: {}", value))?;

    entries
        .iter()
        .map(|entry| {
            let key = entry
                .get("key")
                .ok_or_else(|| anyhow!("dictionary entry missing key: {}", entry))?;
            let val = entry
                .get("value")
                .ok_or_else(|| anyhow!("dictionary entry missing value: {}", entry))?;
            Ok((key, val))
        })
        .collect()
}

/// Looks up a named field of a `Struct`/`Resource` composite.
pub fn composite_field<'a>(value: &'a Value, name: &str) -> Result<&'a Value> {
    let fields = payload(value)?
        .get("fields")
        .and_then(Value::as_array)
        .ok_or_else(|| anyhow!("cadence composite missing fields: {}", value))?;

    fields
        .iter()
        .find(|field| field.get("name").and_then(Value::as_str) == Some(name))
        .and_then(|field| field.get("value"))
        .ok_or_else(|| anyhow!("cadence composite has no field {}", name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decodes_scalars() {
        assert_eq!(
            as_str(&json!({"type": "String", "value": "EmeraldCity"})).unwrap(),
            "EmeraldCity"
        );
        assert_eq!(
            as_f64(&json!({"type": "UFix64", "value": "12.50000000"})).unwrap(),
            12.5
        );
        assert_eq!(as_u64(&json!({"type": "UInt64", "value": "7"})).unwrap(), 7);
    }

    #[test]
    fn optional_nil_is_none() {
        let nil = json!({"type": "Optional", "value": null});
        assert!(unwrap_optional(&nil).unwrap().is_none());

        let some = json!({"type": "Optional", "value": {"type": "UFix64", "value": "1.0"}});
        let inner = unwrap_optional(&some).unwrap().unwrap();
        assert_eq!(as_f64(inner).unwrap(), 1.0);
    }

    #[test]
    fn reads_dictionary_and_composite() {
        let dict = json!({
            "type": "Dictionary",
            "value": [
                {"key": {"type": "String", "value": "FLOW"},
                 "value": {"type": "UFix64", "value": "3.00000000"}}
            ]
        });
        let entries = dictionary_entries(&dict).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(as_str(entries[0].0).unwrap(), "FLOW");
        assert_eq!(as_f64(entries[0].1).unwrap(), 3.0);

        let composite = json!({
            "type": "Struct",
            "value": {
                "id": "A.577a3c409c5dcb5e.ToucansUtils.TrendingData",
                "fields": [
                    {"name": "numProposals", "value": {"type": "UInt64", "value": "2"}}
                ]
            }
        });
        let field = composite_field(&composite, "numProposals").unwrap();
        assert_eq!(as_u64(field).unwrap(), 2);
        assert!(composite_field(&composite, "missing").is_err());
    }

    #[test]
    fn rejects_mismatched_kinds() {
        assert!(as_f64(&json!({"type": "String", "value": "1.0"})).is_err());
        assert!(as_array(&json!({"type": "Dictionary", "value": []})).is_err());
    }
}
