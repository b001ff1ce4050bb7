// JSON helpers used for presentation output; nothing is persisted.
use crate::error::{BlockchainError, Result};
use serde::{Deserialize, Serialize};

/// Serialize data to pretty-printed JSON
pub fn to_json<T: Serialize>(data: &T) -> Result<String> {
    serde_json::to_string_pretty(data)
        .map_err(|e| BlockchainError::Serialization(format!("Serialization failed: {e}")))
}

/// Deserialize data from JSON
pub fn from_json<T>(text: &str) -> Result<T>
where
    T: for<'de> Deserialize<'de>,
{
    serde_json::from_str(text)
        .map_err(|e| BlockchainError::Serialization(format!("Deserialization failed: {e}")))
}
