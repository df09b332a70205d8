//! FlagRecord (spec.md §3): one entry in a GDL `Data[kind]` list. Kept as a
//! loosely typed JSON object — like the rest of the GDL document — since
//! which fields are required and their shapes vary by kind (spec.md §4.7)
//! rather than being worth a per-kind Rust struct.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FlagRecord(pub Map<String, Value>);

impl FlagRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn set(&mut self, key: &str, value: Value) {
        self.0.insert(key.to_string(), value);
    }

    pub fn hash_u32(&self) -> Option<u32> {
        self.get("Hash").and_then(Value::as_u64).map(|v| v as u32)
    }

    pub fn hash_u64(&self) -> Option<u64> {
        self.get("Hash").and_then(Value::as_u64)
    }

    pub fn reset_type_value(&self) -> Option<i32> {
        self.get("ResetTypeValue").and_then(Value::as_i64).map(|v| v as i32)
    }

    pub fn save_file_index(&self) -> Option<i32> {
        self.get("SaveFileIndex").and_then(Value::as_i64).map(|v| v as i32)
    }

    pub fn extra_byte(&self) -> Option<i32> {
        self.get("ExtraByte").and_then(Value::as_i64).map(|v| v as i32)
    }

    pub fn array_size(&self) -> Option<u32> {
        self.get("ArraySize").and_then(Value::as_u64).map(|v| v as u32)
    }

    pub fn original_size(&self) -> Option<u32> {
        self.get("OriginalSize").and_then(Value::as_u64).map(|v| v as u32)
    }

    pub fn size(&self) -> Option<u32> {
        self.get("Size").and_then(Value::as_u64).map(|v| v as u32)
    }

    pub fn default_value(&self) -> Option<&Value> {
        self.get("DefaultValue")
    }

    /// Element count `n` used by `GetSize` (spec.md §4.6): the first
    /// defined of `ArraySize`, `Size`, or `len(DefaultValue)`.
    pub fn array_len(&self) -> Option<usize> {
        if let Some(n) = self.array_size() {
            return Some(n as usize);
        }
        if let Some(n) = self.size() {
            return Some(n as usize);
        }
        self.default_value().and_then(Value::as_array).map(|v| v.len())
    }

    /// For a scalar Binary record, `DefaultValue` holds the blob's byte
    /// length rather than the blob itself (spec.md §4.7).
    pub fn binary_default_len(&self) -> Option<usize> {
        self.default_value().and_then(Value::as_u64).map(|v| v as usize)
    }
}
