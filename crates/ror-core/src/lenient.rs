//! Field-level tolerance for optional request data.
//!
//! A report request with a mistyped optional field still renders; the field
//! is treated as absent and its line is left off the report.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// `deserialize_with` target for optional fields: `null` and values of the
/// wrong shape both become `None`.
pub fn optional<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    if value.is_null() {
        return Ok(None);
    }
    match serde_json::from_value(value) {
        Ok(parsed) => Ok(Some(parsed)),
        Err(e) => {
            tracing::warn!(error = %e, "ignoring malformed optional field");
            Ok(None)
        }
    }
}
