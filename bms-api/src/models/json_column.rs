//! Helpers for list-valued fields persisted as JSON text.

use serde::Serialize;
use serde::de::DeserializeOwned;

/// Decodes a nullable JSON array column. `NULL` reads as an empty list.
pub fn decode_list<T: DeserializeOwned>(raw: Option<&str>) -> Result<Vec<T>, String> {
    match raw {
        Some(json_str) => serde_json::from_str(json_str).map_err(|e| e.to_string()),
        None => Ok(Vec::new()),
    }
}

/// Encodes a list for storage in a nullable JSON column.
pub fn encode_list<T: Serialize>(items: &[T]) -> Result<String, String> {
    serde_json::to_string(items).map_err(|e| e.to_string())
}
