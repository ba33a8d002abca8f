//! Pre-flight content validation.
//!
//! Nothing here touches the network; every rejection happens before a
//! request is built.

use serde::Serialize;
use serde_json::Value;

use crate::pinning::cid;
use crate::pinning::types::{InvalidReason, PinError};

/// Checks content against the provider's limits.
#[derive(Debug, Clone)]
pub struct Validator {
    max_content_bytes: usize,
}

impl Validator {
    pub fn new(max_content_bytes: usize) -> Self {
        Self { max_content_bytes }
    }

    /// Serialize and check JSON content.
    ///
    /// Returns the serialized value and its encoded length so callers do
    /// not serialize twice.
    pub fn validate_json<T>(&self, content: &T) -> Result<(Value, usize), PinError>
    where
        T: Serialize + ?Sized,
    {
        let value = serde_json::to_value(content).map_err(|e| {
            PinError::invalid(
                InvalidReason::CircularReference,
                format!("content cannot be serialized: {}", e),
            )
        })?;

        if !(value.is_object() || value.is_array()) {
            return Err(PinError::invalid(
                InvalidReason::InvalidJson,
                "JSON content must be an object or array",
            ));
        }

        let size = serde_json::to_vec(&value)
            .map_err(|e| {
                PinError::invalid(
                    InvalidReason::CircularReference,
                    format!("content cannot be serialized: {}", e),
                )
            })?
            .len();
        self.check_size(size, "JSON content")?;

        Ok((value, size))
    }

    /// Check a file payload. An empty payload is allowed; a missing one is not.
    pub fn validate_file<'a>(&self, file: Option<&'a [u8]>) -> Result<&'a [u8], PinError> {
        let bytes = file.ok_or_else(|| {
            PinError::invalid(InvalidReason::InvalidFile, "file payload is required")
        })?;
        self.check_size(bytes.len(), "file")?;
        Ok(bytes)
    }

    pub fn validate_hash(&self, hash: &str) -> Result<(), PinError> {
        cid::validate_hash(hash)
    }

    fn check_size(&self, size: usize, what: &str) -> Result<(), PinError> {
        if size > self.max_content_bytes {
            return Err(PinError::invalid(
                InvalidReason::SizeLimitExceeded,
                format!(
                    "{} is {} bytes, limit is {} bytes",
                    what, size, self.max_content_bytes
                ),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::ser::{Error as _, Serializer};
    use serde_json::json;

    /// Stands in for a self-referencing structure: serde reports the cycle
    /// as a serialization error.
    struct Cyclic;

    impl Serialize for Cyclic {
        fn serialize<S: Serializer>(&self, _serializer: S) -> Result<S::Ok, S::Error> {
            Err(S::Error::custom("cycle detected"))
        }
    }

    #[test]
    fn test_accepts_objects_and_arrays() {
        let validator = Validator::new(1024);
        let (value, size) = validator.validate_json(&json!({"name": "t"})).unwrap();
        assert_eq!(value, json!({"name": "t"}));
        assert_eq!(size, br#"{"name":"t"}"#.len());
        assert!(validator.validate_json(&json!([1, 2, 3])).is_ok());
    }

    #[test]
    fn test_rejects_scalars() {
        let validator = Validator::new(1024);
        for scalar in [json!(null), json!(1), json!("text"), json!(true)] {
            let err = validator.validate_json(&scalar).unwrap_err();
            assert_eq!(err.invalid_reason(), Some(InvalidReason::InvalidJson));
        }
    }

    #[test]
    fn test_unserializable_content() {
        let err = Validator::new(1024).validate_json(&Cyclic).unwrap_err();
        assert_eq!(err.invalid_reason(), Some(InvalidReason::CircularReference));
    }

    #[test]
    fn test_json_size_ceiling() {
        let validator = Validator::new(16);
        assert!(validator.validate_json(&json!({"a": "b"})).is_ok());
        let err = validator
            .validate_json(&json!({"a": "x".repeat(32)}))
            .unwrap_err();
        assert_eq!(err.invalid_reason(), Some(InvalidReason::SizeLimitExceeded));
    }

    #[test]
    fn test_file_rules() {
        let validator = Validator::new(4);
        assert_eq!(
            validator.validate_file(None).unwrap_err().invalid_reason(),
            Some(InvalidReason::InvalidFile)
        );
        assert_eq!(validator.validate_file(Some(&[][..])).unwrap().len(), 0);
        assert!(validator.validate_file(Some(&[1u8, 2, 3, 4][..])).is_ok());
        assert_eq!(
            validator
                .validate_file(Some(&[0u8; 5][..]))
                .unwrap_err()
                .invalid_reason(),
            Some(InvalidReason::SizeLimitExceeded)
        );
    }
}
