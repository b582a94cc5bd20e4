//! Input validation for opaque JSON payloads
//!
//! Jobs carry caller-supplied `params` and `result` payloads. These are
//! bounded in serialized size, nesting depth, and key count before they reach
//! the store.

use crate::error::ValidationError;
use serde_json::Value;

/// Maximum allowed size for a serialized payload (256 KiB)
const MAX_PAYLOAD_SIZE_BYTES: usize = 256 * 1024;

/// Maximum nesting depth for payload objects/arrays
const MAX_PAYLOAD_DEPTH: usize = 10;

/// Maximum number of keys in a payload object
const MAX_PAYLOAD_KEYS: usize = 1000;

/// Validate a JSON payload against the size and shape bounds.
pub fn validate_payload(value: &Value) -> Result<(), ValidationError> {
    // Serialization of an in-memory Value cannot fail; the bound is on size.
    let size = serde_json::to_string(value).map(|s| s.len()).unwrap_or(0);
    if size > MAX_PAYLOAD_SIZE_BYTES {
        return Err(ValidationError::PayloadTooLarge {
            size,
            max: MAX_PAYLOAD_SIZE_BYTES,
        });
    }

    validate_depth(value, 0)
}

fn validate_depth(value: &Value, depth: usize) -> Result<(), ValidationError> {
    if depth > MAX_PAYLOAD_DEPTH {
        return Err(ValidationError::PayloadTooDeep {
            depth,
            max: MAX_PAYLOAD_DEPTH,
        });
    }

    match value {
        Value::Object(map) => {
            if map.len() > MAX_PAYLOAD_KEYS {
                return Err(ValidationError::PayloadTooManyKeys {
                    count: map.len(),
                    max: MAX_PAYLOAD_KEYS,
                });
            }
            for nested in map.values() {
                validate_depth(nested, depth + 1)?;
            }
            Ok(())
        }
        Value::Array(items) => {
            for item in items {
                validate_depth(item, depth + 1)?;
            }
            Ok(())
        }
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_reasonable_payloads_pass() {
        assert!(validate_payload(&json!({"branch": "main", "depth": 1})).is_ok());
        assert!(validate_payload(&json!(null)).is_ok());
        assert!(validate_payload(&json!([1, 2, 3])).is_ok());
    }

    #[test]
    fn test_overdeep_payload_is_rejected() {
        let mut value = json!("leaf");
        for _ in 0..(MAX_PAYLOAD_DEPTH + 2) {
            value = json!([value]);
        }
        let err = validate_payload(&value).unwrap_err();
        assert!(matches!(err, ValidationError::PayloadTooDeep { .. }));
    }

    #[test]
    fn test_oversized_payload_is_rejected() {
        let big = "x".repeat(MAX_PAYLOAD_SIZE_BYTES + 1);
        let err = validate_payload(&json!(big)).unwrap_err();
        assert!(matches!(err, ValidationError::PayloadTooLarge { .. }));
    }
}
