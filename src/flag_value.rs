//! FlagValue (spec.md §3): a tagged variant whose shape matches the
//! declaring FlagKind. String capacity (16/32/64, doubled for UTF-16) is a
//! property of the FlagKind, not of the value, so String16/32/64 share one
//! `String` variant here and WString16/32/64 share one `WString` variant.

use serde::{Deserialize, Serialize};

use crate::flag_kind::FlagKind;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FlagValue {
    Bool(bool),
    Int(i32),
    UInt(u32),
    Float(f32),
    Enum(u32),
    Int64(i64),
    UInt64(u64),
    Vector2([f32; 2]),
    Vector3([f32; 3]),
    /// Decoded text, NUL-truncated. Byte capacity enforced at encode time.
    Str(String),
    /// Raw bytes. Base64 only happens at the JSON/diff boundary.
    Binary(Vec<u8>),
    BoolArray(Vec<bool>),
    IntArray(Vec<i32>),
    UIntArray(Vec<u32>),
    FloatArray(Vec<f32>),
    EnumArray(Vec<u32>),
    Int64Array(Vec<i64>),
    UInt64Array(Vec<u64>),
    Vector2Array(Vec<[f32; 2]>),
    Vector3Array(Vec<[f32; 3]>),
    StrArray(Vec<String>),
    BinaryArray(Vec<Vec<u8>>),
    /// Bool64bitKey: raw 64-bit keys. Hex-string rendering happens at the
    /// JSON/diff boundary, same as Binary.
    KeySet(Vec<u64>),
}

impl FlagValue {
    /// Testable property 4 (spec.md §8): every `(type, value)` pair must
    /// satisfy the variant constraint of its FlagKind.
    pub fn matches_kind(&self, kind: FlagKind) -> bool {
        use FlagValue::*;
        match (self, kind) {
            (Bool(_), FlagKind::Bool) => true,
            (Int(_), FlagKind::Int) => true,
            (UInt(_), FlagKind::UInt) => true,
            (Float(_), FlagKind::Float) => true,
            (Enum(_), FlagKind::Enum) => true,
            (Int64(_), FlagKind::Int64) => true,
            (UInt64(_), FlagKind::UInt64) => true,
            (Vector2(_), FlagKind::Vector2) => true,
            (Vector3(_), FlagKind::Vector3) => true,
            (Str(_), FlagKind::String16 | FlagKind::String32 | FlagKind::String64) => true,
            (Str(_), FlagKind::WString16 | FlagKind::WString32 | FlagKind::WString64) => true,
            (Binary(_), FlagKind::Binary) => true,
            (BoolArray(_), FlagKind::BoolArray) => true,
            (IntArray(_), FlagKind::IntArray) => true,
            (UIntArray(_), FlagKind::UIntArray) => true,
            (FloatArray(_), FlagKind::FloatArray) => true,
            (EnumArray(_), FlagKind::EnumArray) => true,
            (Int64Array(_), FlagKind::Int64Array) => true,
            (UInt64Array(_), FlagKind::UInt64Array) => true,
            (Vector2Array(_), FlagKind::Vector2Array) => true,
            (Vector3Array(_), FlagKind::Vector3Array) => true,
            (StrArray(_), FlagKind::String16Array | FlagKind::String32Array | FlagKind::String64Array) => true,
            (StrArray(_), FlagKind::WString16Array | FlagKind::WString32Array | FlagKind::WString64Array) => true,
            (BinaryArray(_), FlagKind::BinaryArray) => true,
            (KeySet(_), FlagKind::Bool64bitKey) => true,
            _ => false,
        }
    }

    pub fn as_array_len(&self) -> Option<usize> {
        use FlagValue::*;
        match self {
            BoolArray(v) => Some(v.len()),
            IntArray(v) => Some(v.len()),
            UIntArray(v) => Some(v.len()),
            FloatArray(v) => Some(v.len()),
            EnumArray(v) => Some(v.len()),
            Int64Array(v) => Some(v.len()),
            UInt64Array(v) => Some(v.len()),
            Vector2Array(v) => Some(v.len()),
            Vector3Array(v) => Some(v.len()),
            StrArray(v) => Some(v.len()),
            BinaryArray(v) => Some(v.len()),
            _ => None,
        }
    }

    /// Build a value of `kind`'s shape from a generic JSON value (the CLI's
    /// decode/encode document format). Coerces per kind rather than relying
    /// on `#[serde(untagged)]` inference, since a bare JSON number is
    /// ambiguous between `Int`/`UInt`/`Float`/`Enum`/`Int64`/`UInt64`.
    pub fn from_json(kind: FlagKind, value: &serde_json::Value) -> Option<Self> {
        use FlagValue::*;
        let vec2 = |v: &serde_json::Value| -> Option<[f32; 2]> {
            Some([v.get("x")?.as_f64()? as f32, v.get("y")?.as_f64()? as f32])
        };
        let vec3 = |v: &serde_json::Value| -> Option<[f32; 3]> {
            Some([
                v.get("x")?.as_f64()? as f32,
                v.get("y")?.as_f64()? as f32,
                v.get("z")?.as_f64()? as f32,
            ])
        };
        let binary = |v: &serde_json::Value| -> Option<Vec<u8>> {
            use base64::engine::general_purpose::STANDARD as BASE64;
            use base64::Engine as _;
            BASE64.decode(v.as_str()?).ok()
        };

        Some(match kind {
            FlagKind::Bool => Bool(value.as_bool()?),
            FlagKind::Int => Int(value.as_i64()? as i32),
            FlagKind::UInt => UInt(value.as_u64()? as u32),
            FlagKind::Float => Float(value.as_f64()? as f32),
            FlagKind::Enum => Enum(value.as_u64()? as u32),
            FlagKind::Int64 => Int64(value.as_i64()?),
            FlagKind::UInt64 => UInt64(value.as_u64()?),
            FlagKind::Vector2 => Vector2(vec2(value)?),
            FlagKind::Vector3 => Vector3(vec3(value)?),
            FlagKind::String16 | FlagKind::String32 | FlagKind::String64
            | FlagKind::WString16 | FlagKind::WString32 | FlagKind::WString64 => {
                Str(value.as_str()?.to_string())
            }
            FlagKind::Binary => Binary(binary(value)?),
            FlagKind::BoolArray => BoolArray(
                value.as_array()?.iter().map(|v| v.as_bool()).collect::<Option<_>>()?,
            ),
            FlagKind::IntArray => IntArray(
                value.as_array()?.iter().map(|v| v.as_i64().map(|n| n as i32)).collect::<Option<_>>()?,
            ),
            FlagKind::UIntArray => UIntArray(
                value.as_array()?.iter().map(|v| v.as_u64().map(|n| n as u32)).collect::<Option<_>>()?,
            ),
            FlagKind::FloatArray => FloatArray(
                value.as_array()?.iter().map(|v| v.as_f64().map(|n| n as f32)).collect::<Option<_>>()?,
            ),
            FlagKind::EnumArray => EnumArray(
                value.as_array()?.iter().map(|v| v.as_u64().map(|n| n as u32)).collect::<Option<_>>()?,
            ),
            FlagKind::Int64Array => Int64Array(
                value.as_array()?.iter().map(|v| v.as_i64()).collect::<Option<_>>()?,
            ),
            FlagKind::UInt64Array => UInt64Array(
                value.as_array()?.iter().map(|v| v.as_u64()).collect::<Option<_>>()?,
            ),
            FlagKind::Vector2Array => Vector2Array(
                value.as_array()?.iter().map(vec2).collect::<Option<_>>()?,
            ),
            FlagKind::Vector3Array => Vector3Array(
                value.as_array()?.iter().map(vec3).collect::<Option<_>>()?,
            ),
            FlagKind::String16Array | FlagKind::String32Array | FlagKind::String64Array
            | FlagKind::WString16Array | FlagKind::WString32Array | FlagKind::WString64Array => {
                StrArray(
                    value
                        .as_array()?
                        .iter()
                        .map(|v| v.as_str().map(str::to_string))
                        .collect::<Option<_>>()?,
                )
            }
            FlagKind::BinaryArray => BinaryArray(
                value.as_array()?.iter().map(binary).collect::<Option<_>>()?,
            ),
            FlagKind::Bool64bitKey => KeySet(
                value
                    .as_array()?
                    .iter()
                    .map(|v| {
                        let s = v.as_str()?;
                        u64::from_str_radix(s.strip_prefix("0x").unwrap_or(s), 16).ok()
                    })
                    .collect::<Option<_>>()?,
            ),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shape_matches_its_declaring_kind() {
        assert!(FlagValue::Int(-5).matches_kind(FlagKind::Int));
        assert!(!FlagValue::Int(-5).matches_kind(FlagKind::UInt));
        assert!(FlagValue::Str("NCRENT".into()).matches_kind(FlagKind::String16));
        assert!(FlagValue::KeySet(vec![1, 2]).matches_kind(FlagKind::Bool64bitKey));
        assert!(!FlagValue::KeySet(vec![1, 2]).matches_kind(FlagKind::UInt64Array));
    }
}
