//! The closed 33-variant FlagKind enumeration (spec.md §3) and its
//! per-kind descriptor, shared by the SAV decoder, the SAV encoder, and the
//! GDL layout engine's `GetSize` so each variant's shape is written once
//! rather than branched on three times (spec.md §9).

use std::fmt;
use std::str::FromStr;

use crate::error::SavDecodeError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u32)]
pub enum FlagKind {
    Bool = 0,
    BoolArray = 1,
    Int = 2,
    IntArray = 3,
    Float = 4,
    FloatArray = 5,
    Enum = 6,
    EnumArray = 7,
    Vector2 = 8,
    Vector2Array = 9,
    Vector3 = 10,
    Vector3Array = 11,
    String16 = 12,
    String16Array = 13,
    String32 = 14,
    String32Array = 15,
    String64 = 16,
    String64Array = 17,
    Binary = 18,
    BinaryArray = 19,
    UInt = 20,
    UIntArray = 21,
    Int64 = 22,
    Int64Array = 23,
    UInt64 = 24,
    UInt64Array = 25,
    WString16 = 26,
    WString16Array = 27,
    WString32 = 28,
    WString32Array = 29,
    WString64 = 30,
    WString64Array = 31,
    Bool64bitKey = 32,
}

/// All 33 variants in ascending type-ID order — the canonical order spec.md
/// §4.6 iterates for `CalcSize`/`UpdateMetaData`, and the order producers
/// should insert fresh types in (spec.md §5) when encoding a `SaveStore`.
pub const CANONICAL_ORDER: [FlagKind; 33] = [
    FlagKind::Bool,
    FlagKind::BoolArray,
    FlagKind::Int,
    FlagKind::IntArray,
    FlagKind::Float,
    FlagKind::FloatArray,
    FlagKind::Enum,
    FlagKind::EnumArray,
    FlagKind::Vector2,
    FlagKind::Vector2Array,
    FlagKind::Vector3,
    FlagKind::Vector3Array,
    FlagKind::String16,
    FlagKind::String16Array,
    FlagKind::String32,
    FlagKind::String32Array,
    FlagKind::String64,
    FlagKind::String64Array,
    FlagKind::Binary,
    FlagKind::BinaryArray,
    FlagKind::UInt,
    FlagKind::UIntArray,
    FlagKind::Int64,
    FlagKind::Int64Array,
    FlagKind::UInt64,
    FlagKind::UInt64Array,
    FlagKind::WString16,
    FlagKind::WString16Array,
    FlagKind::WString32,
    FlagKind::WString32Array,
    FlagKind::WString64,
    FlagKind::WString64Array,
    FlagKind::Bool64bitKey,
];

impl TryFrom<u32> for FlagKind {
    type Error = SavDecodeError;

    fn try_from(v: u32) -> Result<Self, Self::Error> {
        CANONICAL_ORDER
            .iter()
            .copied()
            .find(|k| *k as u32 == v)
            .ok_or(SavDecodeError::UnknownTypeId(v))
    }
}

impl fmt::Display for FlagKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FlagKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CANONICAL_ORDER
            .iter()
            .copied()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| format!("unknown FlagKind name {s:?}"))
    }
}

impl FlagKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FlagKind::Bool => "Bool",
            FlagKind::BoolArray => "BoolArray",
            FlagKind::Int => "Int",
            FlagKind::IntArray => "IntArray",
            FlagKind::Float => "Float",
            FlagKind::FloatArray => "FloatArray",
            FlagKind::Enum => "Enum",
            FlagKind::EnumArray => "EnumArray",
            FlagKind::Vector2 => "Vector2",
            FlagKind::Vector2Array => "Vector2Array",
            FlagKind::Vector3 => "Vector3",
            FlagKind::Vector3Array => "Vector3Array",
            FlagKind::String16 => "String16",
            FlagKind::String16Array => "String16Array",
            FlagKind::String32 => "String32",
            FlagKind::String32Array => "String32Array",
            FlagKind::String64 => "String64",
            FlagKind::String64Array => "String64Array",
            FlagKind::Binary => "Binary",
            FlagKind::BinaryArray => "BinaryArray",
            FlagKind::UInt => "UInt",
            FlagKind::UIntArray => "UIntArray",
            FlagKind::Int64 => "Int64",
            FlagKind::Int64Array => "Int64Array",
            FlagKind::UInt64 => "UInt64",
            FlagKind::UInt64Array => "UInt64Array",
            FlagKind::WString16 => "WString16",
            FlagKind::WString16Array => "WString16Array",
            FlagKind::WString32 => "WString32",
            FlagKind::WString32Array => "WString32Array",
            FlagKind::WString64 => "WString64",
            FlagKind::WString64Array => "WString64Array",
            FlagKind::Bool64bitKey => "Bool64bitKey",
        }
    }

    pub fn is_array(&self) -> bool {
        self.descriptor().is_array
    }

    pub fn descriptor(&self) -> FlagKindDescriptor {
        use ElementShape::*;
        let (element, is_array) = match self {
            FlagKind::Bool => (Bool, false),
            FlagKind::BoolArray => (Bool, true),
            FlagKind::Int => (Int, false),
            FlagKind::IntArray => (Int, true),
            FlagKind::Float => (Float, false),
            FlagKind::FloatArray => (Float, true),
            FlagKind::Enum => (Enum, false),
            FlagKind::EnumArray => (Enum, true),
            FlagKind::Vector2 => (Vector2, false),
            FlagKind::Vector2Array => (Vector2, true),
            FlagKind::Vector3 => (Vector3, false),
            FlagKind::Vector3Array => (Vector3, true),
            FlagKind::String16 => (Str(16), false),
            FlagKind::String16Array => (Str(16), true),
            FlagKind::String32 => (Str(32), false),
            FlagKind::String32Array => (Str(32), true),
            FlagKind::String64 => (Str(64), false),
            FlagKind::String64Array => (Str(64), true),
            FlagKind::Binary => (Bin, false),
            FlagKind::BinaryArray => (Bin, true),
            FlagKind::UInt => (UInt, false),
            FlagKind::UIntArray => (UInt, true),
            FlagKind::Int64 => (Int64, false),
            FlagKind::Int64Array => (Int64, true),
            FlagKind::UInt64 => (UInt64, false),
            FlagKind::UInt64Array => (UInt64, true),
            FlagKind::WString16 => (WStr(32), false),
            FlagKind::WString16Array => (WStr(32), true),
            FlagKind::WString32 => (WStr(64), false),
            FlagKind::WString32Array => (WStr(64), true),
            FlagKind::WString64 => (WStr(128), false),
            FlagKind::WString64Array => (WStr(128), true),
            FlagKind::Bool64bitKey => (KeySet, false),
        };
        let is_inline = matches!(self,
            FlagKind::Bool | FlagKind::Int | FlagKind::Float | FlagKind::Enum | FlagKind::UInt);
        FlagKindDescriptor {
            kind: *self,
            element,
            is_array,
            is_inline,
            is_key_set: matches!(self, FlagKind::Bool64bitKey),
        }
    }
}

/// The shape of a single element (scalar payload, or one array element).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ElementShape {
    Bool,
    Int,
    UInt,
    Float,
    Enum,
    Int64,
    UInt64,
    Vector2,
    Vector3,
    /// UTF-8 string, fixed byte capacity (16/32/64).
    Str(u32),
    /// UTF-16LE string, fixed byte capacity (32/64/128).
    WStr(u32),
    Bin,
    /// Bool64bitKey: a null-terminated run of 64-bit keys, not an element
    /// repeated `n` times like the other arrays.
    KeySet,
}

/// Mechanical per-kind descriptor: element shape, array-ness, and whether
/// the value is stored inline in the key table or referenced by offset.
#[derive(Clone, Copy, Debug)]
pub struct FlagKindDescriptor {
    pub kind: FlagKind,
    pub element: ElementShape,
    pub is_array: bool,
    pub is_inline: bool,
    pub is_key_set: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_numeric_id() {
        for kind in CANONICAL_ORDER {
            assert_eq!(FlagKind::try_from(kind as u32).unwrap(), kind);
        }
    }

    #[test]
    fn round_trips_through_name() {
        for kind in CANONICAL_ORDER {
            assert_eq!(kind.as_str().parse::<FlagKind>().unwrap(), kind);
        }
    }

    #[test]
    fn unknown_id_errors() {
        assert!(FlagKind::try_from(33).is_err());
    }

    #[test]
    fn inline_scalars_match_spec() {
        for kind in [FlagKind::Bool, FlagKind::Int, FlagKind::Float, FlagKind::Enum, FlagKind::UInt] {
            assert!(kind.descriptor().is_inline);
        }
        assert!(!FlagKind::Int64.descriptor().is_inline);
        assert!(!FlagKind::IntArray.descriptor().is_inline);
    }
}
