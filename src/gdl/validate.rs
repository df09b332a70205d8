//! Flag validator (spec.md §4.7): coerces a candidate `FlagRecord` to the
//! exact numeric-width types the codec demands and enforces per-kind field
//! presence and bounds, given a field kind name (one of FlagKind's 33
//! names, or the GDL-only `"Struct"`/`"BoolExp"`).

use serde_json::{json, Value};

use crate::error::GdlError;
use crate::flag_kind::FlagKind;

use super::record::FlagRecord;
use super::reset::EXTRA_BYTE_BIT;

/// The 35 GDL field kinds: FlagKind's 33 plus the two that only ever
/// appear in a GDL document, never in a SAV file.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GdlFieldKind {
    Flag(FlagKind),
    Struct,
    BoolExp,
}

impl GdlFieldKind {
    pub fn parse(name: &str) -> Result<Self, GdlError> {
        match name {
            "Struct" => Ok(Self::Struct),
            "BoolExp" => Ok(Self::BoolExp),
            other => other
                .parse::<FlagKind>()
                .map(Self::Flag)
                .map_err(|_| GdlError::UnknownType(other.to_string())),
        }
    }
}

/// Valid BoolExp operand-list lengths by opcode (spec.md §4.7).
fn expected_bool_exp_len(opcode: u64) -> Option<usize> {
    match opcode {
        0 | 1 | 2 | 10 | 11 | 12 => Some(2),
        3 | 4 | 5 => Some(1),
        8 | 9 | 13 | 14 => Some(3),
        _ => None,
    }
}

pub fn validate_flag(kind_name: &str, record: &mut FlagRecord) -> Result<(), GdlError> {
    let kind = GdlFieldKind::parse(kind_name)?;
    validate_common(kind, record)?;
    match kind {
        GdlFieldKind::Flag(flag_kind) => validate_flag_kind(flag_kind, record),
        GdlFieldKind::Struct => validate_struct(record),
        GdlFieldKind::BoolExp => validate_bool_exp(record),
    }
}

fn validate_common(kind: GdlFieldKind, record: &mut FlagRecord) -> Result<(), GdlError> {
    let hash = record.get("Hash").ok_or(GdlError::MissingField("Hash"))?;
    let hash = hash
        .as_u64()
        .ok_or(GdlError::WrongShape { field: "Hash", expected: "unsigned integer" })?;
    let is_key_set = matches!(kind, GdlFieldKind::Flag(FlagKind::Bool64bitKey));
    record.set("Hash", if is_key_set { json!(hash) } else { json!(hash as u32) });

    if let Some(reset) = record.get("ResetTypeValue") {
        let reset = reset
            .as_i64()
            .ok_or(GdlError::WrongShape { field: "ResetTypeValue", expected: "signed integer" })? as i32;
        record.set("ResetTypeValue", json!(reset));

        if reset & EXTRA_BYTE_BIT != 0 {
            if let Some(extra) = record.get("ExtraByte") {
                let extra = extra
                    .as_i64()
                    .ok_or(GdlError::WrongShape { field: "ExtraByte", expected: "signed integer" })? as i32;
                if !(1..=80).contains(&extra) {
                    return Err(GdlError::ExtraByteOutOfRange(extra));
                }
                record.set("ExtraByte", json!(extra));
            }
        }
    }

    if let Some(index) = record.get("SaveFileIndex") {
        let index = index
            .as_i64()
            .ok_or(GdlError::WrongShape { field: "SaveFileIndex", expected: "signed integer" })? as i32;
        record.set("SaveFileIndex", json!(index));
    }

    Ok(())
}

fn validate_flag_kind(kind: FlagKind, record: &mut FlagRecord) -> Result<(), GdlError> {
    match kind {
        FlagKind::Enum | FlagKind::EnumArray => validate_enum(kind, record),
        FlagKind::Vector2 | FlagKind::Vector2Array => validate_vector(record, 2),
        FlagKind::Vector3 | FlagKind::Vector3Array => validate_vector(record, 3),
        FlagKind::Binary => validate_binary_scalar(record),
        FlagKind::BinaryArray => validate_binary_array(record),
        FlagKind::String16 | FlagKind::String32 | FlagKind::String64
        | FlagKind::WString16 | FlagKind::WString32 | FlagKind::WString64 => {
            validate_string_scalar(kind, record)
        }
        _ if kind.is_array() => validate_array_common(record),
        FlagKind::Bool | FlagKind::Int | FlagKind::UInt | FlagKind::Float
        | FlagKind::Int64 | FlagKind::UInt64 => validate_scalar_default(kind, record),
        _ => Ok(()),
    }
}

/// `Bool`/`Int`/`UInt`/`Float`/`Int64`/`UInt64` all require a `DefaultValue`
/// field (every datatype does except `Bool64bitKey`/`BoolExp`), coerced to
/// the kind's exact width.
fn validate_scalar_default(kind: FlagKind, record: &mut FlagRecord) -> Result<(), GdlError> {
    let default = record.get("DefaultValue").ok_or(GdlError::MissingField("DefaultValue"))?.clone();
    let bad = || GdlError::WrongShape { field: "DefaultValue", expected: "value matching kind" };
    let coerced = match kind {
        FlagKind::Bool => json!(default.as_bool().ok_or_else(bad)?),
        FlagKind::Int => json!(default.as_i64().ok_or_else(bad)? as i32),
        FlagKind::UInt => json!(default.as_u64().ok_or_else(bad)? as u32),
        FlagKind::Float => json!(default.as_f64().ok_or_else(bad)? as f32),
        FlagKind::Int64 => json!(default.as_i64().ok_or_else(bad)?),
        FlagKind::UInt64 => json!(default.as_u64().ok_or_else(bad)?),
        _ => unreachable!("validate_scalar_default only called for scalar numeric/bool kinds"),
    };
    record.set("DefaultValue", coerced);
    Ok(())
}

fn validate_enum(kind: FlagKind, record: &mut FlagRecord) -> Result<(), GdlError> {
    let raw_values = record
        .get("RawValues")
        .and_then(Value::as_array)
        .ok_or(GdlError::MissingField("RawValues"))?
        .clone();
    let values = record
        .get("Values")
        .and_then(Value::as_array)
        .ok_or(GdlError::MissingField("Values"))?
        .clone();
    if raw_values.len() != values.len() {
        return Err(GdlError::WrongShape { field: "Values", expected: "same length as RawValues" });
    }
    let coerced: Vec<Value> = values
        .iter()
        .map(|v| {
            v.as_u64()
                .map(|n| json!(n))
                .ok_or(GdlError::WrongShape { field: "Values", expected: "u64" })
        })
        .collect::<Result<_, _>>()?;
    record.set("Values", Value::Array(coerced));

    if kind == FlagKind::EnumArray {
        let size = record
            .get("Size")
            .and_then(Value::as_u64)
            .ok_or(GdlError::MissingField("Size"))?;
        record.set("Size", json!(size as u32));
    }
    Ok(())
}

fn validate_vector(record: &mut FlagRecord, components: usize) -> Result<(), GdlError> {
    let default = record.get("DefaultValue").ok_or(GdlError::MissingField("DefaultValue"))?.clone();
    let coerce_one = |v: &Value| -> Result<Value, GdlError> {
        let get = |field: &'static str| -> Result<f64, GdlError> {
            v.get(field)
                .and_then(Value::as_f64)
                .ok_or(GdlError::WrongShape { field, expected: "f32" })
        };
        let x = get("x")? as f32;
        let y = get("y")? as f32;
        if components == 2 {
            Ok(json!({ "x": x, "y": y }))
        } else {
            let z = get("z")? as f32;
            Ok(json!({ "x": x, "y": y, "z": z }))
        }
    };

    let coerced = if let Some(list) = default.as_array() {
        Value::Array(list.iter().map(coerce_one).collect::<Result<_, _>>()?)
    } else {
        coerce_one(&default)?
    };
    record.set("DefaultValue", coerced);
    Ok(())
}

fn validate_binary_scalar(record: &mut FlagRecord) -> Result<(), GdlError> {
    let len = record
        .get("DefaultValue")
        .and_then(Value::as_u64)
        .ok_or(GdlError::MissingField("DefaultValue"))?;
    record.set("DefaultValue", json!(len as u32));
    Ok(())
}

fn validate_binary_array(record: &mut FlagRecord) -> Result<(), GdlError> {
    validate_binary_scalar(record)?;
    let array_size = record
        .get("ArraySize")
        .and_then(Value::as_u64)
        .ok_or(GdlError::MissingField("ArraySize"))?;
    record.set("ArraySize", json!(array_size as u32));
    Ok(())
}

fn validate_string_scalar(kind: FlagKind, record: &mut FlagRecord) -> Result<(), GdlError> {
    let capacity_bytes = match kind.descriptor().element {
        crate::flag_kind::ElementShape::Str(c) | crate::flag_kind::ElementShape::WStr(c) => c,
        _ => unreachable!(),
    };
    let capacity_chars = capacity_bytes / if matches!(kind.descriptor().element, crate::flag_kind::ElementShape::WStr(_)) { 2 } else { 1 };
    let value = record
        .get("DefaultValue")
        .and_then(Value::as_str)
        .ok_or(GdlError::MissingField("DefaultValue"))?;
    if value.chars().count() as u32 >= capacity_chars {
        return Err(GdlError::WrongShape { field: "DefaultValue", expected: "shorter than capacity" });
    }
    Ok(())
}

/// Generic array-kind rules (spec.md §4.7): `OriginalSize` present, and a
/// list-typed `DefaultValue`. Excludes EnumArray and BinaryArray, which
/// have their own shape rules handled separately.
fn validate_array_common(record: &mut FlagRecord) -> Result<(), GdlError> {
    let original_size = record
        .get("OriginalSize")
        .and_then(Value::as_u64)
        .ok_or(GdlError::MissingField("OriginalSize"))?;
    record.set("OriginalSize", json!(original_size as u32));

    if !record.get("DefaultValue").map(Value::is_array).unwrap_or(false) {
        return Err(GdlError::WrongShape { field: "DefaultValue", expected: "list" });
    }
    Ok(())
}

fn validate_struct(record: &mut FlagRecord) -> Result<(), GdlError> {
    let items = record
        .get("DefaultValue")
        .and_then(Value::as_array)
        .ok_or(GdlError::MissingField("DefaultValue"))?
        .clone();
    let coerced: Vec<Value> = items
        .iter()
        .map(|item| {
            let hash = item
                .get("Hash")
                .and_then(Value::as_u64)
                .ok_or(GdlError::WrongShape { field: "Hash", expected: "u32" })?;
            let value = item
                .get("Value")
                .and_then(Value::as_u64)
                .ok_or(GdlError::WrongShape { field: "Value", expected: "u32" })?;
            Ok(json!({ "Hash": hash as u32, "Value": value as u32 }))
        })
        .collect::<Result<_, GdlError>>()?;
    record.set("DefaultValue", Value::Array(coerced));
    Ok(())
}

fn validate_bool_exp(record: &mut FlagRecord) -> Result<(), GdlError> {
    let expressions = record
        .get("Values")
        .and_then(Value::as_array)
        .ok_or(GdlError::MissingField("Values"))?
        .clone();
    let coerced: Vec<Value> = expressions
        .iter()
        .map(|exp| validate_bool_exp_one(exp))
        .collect::<Result<_, _>>()?;
    record.set("Values", Value::Array(coerced));
    Ok(())
}

fn validate_bool_exp_one(exp: &Value) -> Result<Value, GdlError> {
    let exp = exp
        .as_array()
        .ok_or(GdlError::WrongShape { field: "Values", expected: "list of expressions" })?;
    let opcode = exp
        .first()
        .and_then(Value::as_u64)
        .ok_or(GdlError::WrongShape { field: "Values", expected: "opcode-headed expression" })?;
    let expected = expected_bool_exp_len(opcode).ok_or(GdlError::InvalidExpression {
        opcode,
        expected: 0,
        actual: exp.len(),
    })?;
    if exp.len() != expected {
        return Err(GdlError::InvalidExpression { opcode, expected, actual: exp.len() });
    }
    let coerced: Vec<Value> = exp
        .iter()
        .map(|v| {
            v.as_u64()
                .map(|n| json!(n))
                .ok_or(GdlError::WrongShape { field: "Values", expected: "u64" })
        })
        .collect::<Result<_, _>>()?;
    Ok(Value::Array(coerced))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn base_record() -> FlagRecord {
        let mut r = FlagRecord::new();
        r.set("Hash", json!(1234));
        r.set("ResetTypeValue", json!(0));
        r.set("SaveFileIndex", json!(0));
        r
    }

    #[test]
    fn validates_a_plain_int_flag() {
        let mut r = base_record();
        r.set("DefaultValue", json!(7));
        assert!(validate_flag("Int", &mut r).is_ok());
    }

    #[test]
    fn plain_int_flag_without_default_value_is_rejected() {
        let mut r = base_record();
        assert!(matches!(
            validate_flag("Int", &mut r),
            Err(GdlError::MissingField("DefaultValue"))
        ));
    }

    #[test]
    fn extra_byte_required_when_reset_bit_set_and_present() {
        let mut r = base_record();
        r.set("ResetTypeValue", json!(EXTRA_BYTE_BIT));
        r.set("ExtraByte", json!(81));
        assert!(matches!(
            validate_flag("Int", &mut r),
            Err(GdlError::ExtraByteOutOfRange(81))
        ));
    }

    #[test]
    fn enum_requires_matching_raw_values_and_values() {
        let mut r = base_record();
        r.set("RawValues", json!(["A", "B"]));
        r.set("Values", json!([1]));
        assert!(matches!(
            validate_flag("Enum", &mut r),
            Err(GdlError::WrongShape { .. })
        ));
    }

    #[test]
    fn string_default_value_must_fit_capacity() {
        let mut r = base_record();
        r.set("DefaultValue", json!("a".repeat(16)));
        assert!(validate_flag("String16", &mut r).is_err());
    }

    #[test]
    fn bool_exp_validates_opcode_operand_count() {
        let mut r = base_record();
        r.set("Values", json!([[3], [0, 5]]));
        assert!(validate_flag("BoolExp", &mut r).is_ok());

        let mut bad = base_record();
        bad.set("Values", json!([[3, 10]]));
        assert!(matches!(
            validate_flag("BoolExp", &mut bad),
            Err(GdlError::InvalidExpression { .. })
        ));
    }

    #[test]
    fn int_array_requires_original_size_and_list_default() {
        let mut r = base_record();
        r.set("DefaultValue", json!([1, 2, 3]));
        assert!(validate_flag("IntArray", &mut r).is_err());
        r.set("OriginalSize", json!(3));
        assert!(validate_flag("IntArray", &mut r).is_ok());
    }
}
