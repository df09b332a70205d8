//! SAV encode (spec.md §4.3): the inverse of decode. Types are walked in
//! the store's own order — the insertion order observed during decode
//! (spec.md §5), matching the source's `for t in self.save_data:` over a
//! plain dict rather than any fixed numeric ordering. Producers building a
//! store from scratch get `CANONICAL_ORDER` for free by inserting fresh
//! types in ascending ID order, as spec.md §5 asks of them. Writes
//! offset-referenced payloads to a separate append region that grows past
//! the key table.

use crate::error::SavEncodeError;
use crate::flag_kind::{ElementShape, FlagKind};
use crate::flag_value::FlagValue;
use crate::io::Writer;

use super::{bool_array_byte_len, SavHeader, HEADER_SIZE, MAGIC, SaveStore};

/// Encode `store` into a SAV buffer of exactly `header.buffer_size` bytes.
pub fn encode(header: &SavHeader, store: &SaveStore) -> Result<Vec<u8>, SavEncodeError> {
    let mut w = Writer::new(header.buffer_size);
    w.write_u32(MAGIC)?;
    w.write_u32(header.format_version)?;
    w.write_u32(header.data_offset)?;
    w.seek(HEADER_SIZE);

    // The append region starts immediately after the key table.
    let mut append_at = header.data_offset as usize;

    for (&kind, table) in store.types() {
        if table.is_empty() {
            continue;
        }
        w.write_u32(0)?;
        w.write_u32(kind as u32)?;
        for (&hash, value) in table.iter() {
            w.write_u32(hash)?;
            append_at = encode_value(&mut w, kind, hash, value, append_at)?;
        }
    }

    debug_assert_eq!(w.tell(), header.data_offset as usize);
    Ok(w.into_inner())
}

/// Write one flag's key-table entry (inline value, or offset into the
/// append region) and return the append cursor's new position.
fn encode_value(
    w: &mut Writer,
    kind: FlagKind,
    hash: u32,
    value: &FlagValue,
    append_at: usize,
) -> Result<usize, SavEncodeError> {
    let d = kind.descriptor();
    if !value.matches_kind(kind) {
        return Err(SavEncodeError::InvalidValue { hash, kind });
    }

    if d.is_inline {
        encode_inline(w, d.element, value)?;
        return Ok(append_at);
    }

    w.write_u32(append_at as u32)?;
    let key_table_pos = w.tell();

    w.seek(append_at);
    if d.is_key_set {
        encode_key_set(w, value)?;
    } else if d.is_array {
        encode_array(w, d.element, hash, value)?;
    } else {
        encode_scalar_ref(w, d.element, hash, value)?;
    }
    w.align_up(4)?;
    let next_append_at = w.tell();

    w.seek(key_table_pos);
    Ok(next_append_at)
}

fn encode_inline(w: &mut Writer, element: ElementShape, value: &FlagValue) -> Result<(), SavEncodeError> {
    match (element, value) {
        (ElementShape::Bool, FlagValue::Bool(b)) => w.write_u32(if *b { 1 } else { 0 }),
        (ElementShape::Int, FlagValue::Int(v)) => w.write_s32(*v),
        (ElementShape::UInt, FlagValue::UInt(v)) => w.write_u32(*v),
        (ElementShape::Float, FlagValue::Float(v)) => w.write_f32(*v),
        (ElementShape::Enum, FlagValue::Enum(v)) => w.write_u32(*v),
        _ => unreachable!("value shape was already checked against kind"),
    }
}

fn encode_scalar_ref(
    w: &mut Writer,
    element: ElementShape,
    hash: u32,
    value: &FlagValue,
) -> Result<(), SavEncodeError> {
    match (element, value) {
        (ElementShape::Int64, FlagValue::Int64(v)) => w.write_s64(*v),
        (ElementShape::UInt64, FlagValue::UInt64(v)) => w.write_u64(*v),
        (ElementShape::Vector2, FlagValue::Vector2(v)) => {
            w.write_f32(v[0])?;
            w.write_f32(v[1])
        }
        (ElementShape::Vector3, FlagValue::Vector3(v)) => {
            w.write_f32(v[0])?;
            w.write_f32(v[1])?;
            w.write_f32(v[2])
        }
        (ElementShape::Str(capacity), FlagValue::Str(s)) => write_utf8_field(w, hash, s, capacity),
        (ElementShape::WStr(capacity), FlagValue::Str(s)) => write_utf16_field(w, hash, s, capacity),
        (ElementShape::Bin, FlagValue::Binary(bytes)) => write_binary(w, bytes),
        _ => unreachable!("value shape was already checked against kind"),
    }
}

fn encode_array(
    w: &mut Writer,
    element: ElementShape,
    hash: u32,
    value: &FlagValue,
) -> Result<(), SavEncodeError> {
    match (element, value) {
        (ElementShape::Bool, FlagValue::BoolArray(items)) => {
            w.write_u32(items.len() as u32)?;
            let n = bool_array_byte_len(items.len());
            let mut bits = vec![0u8; n];
            for (i, &b) in items.iter().enumerate() {
                if b {
                    bits[i / 8] |= 1 << (i % 8);
                }
            }
            w.write_bytes(&bits)
        }
        (ElementShape::Int, FlagValue::IntArray(items)) => {
            w.write_u32(items.len() as u32)?;
            for v in items {
                w.write_s32(*v)?;
            }
            Ok(())
        }
        (ElementShape::UInt, FlagValue::UIntArray(items)) => {
            w.write_u32(items.len() as u32)?;
            for v in items {
                w.write_u32(*v)?;
            }
            Ok(())
        }
        (ElementShape::Float, FlagValue::FloatArray(items)) => {
            w.write_u32(items.len() as u32)?;
            for v in items {
                w.write_f32(*v)?;
            }
            Ok(())
        }
        (ElementShape::Enum, FlagValue::EnumArray(items)) => {
            w.write_u32(items.len() as u32)?;
            for v in items {
                w.write_u32(*v)?;
            }
            Ok(())
        }
        (ElementShape::Int64, FlagValue::Int64Array(items)) => {
            w.write_u32(items.len() as u32)?;
            for v in items {
                w.write_s64(*v)?;
            }
            Ok(())
        }
        (ElementShape::UInt64, FlagValue::UInt64Array(items)) => {
            w.write_u32(items.len() as u32)?;
            for v in items {
                w.write_u64(*v)?;
            }
            Ok(())
        }
        (ElementShape::Vector2, FlagValue::Vector2Array(items)) => {
            w.write_u32(items.len() as u32)?;
            for v in items {
                w.write_f32(v[0])?;
                w.write_f32(v[1])?;
            }
            Ok(())
        }
        (ElementShape::Vector3, FlagValue::Vector3Array(items)) => {
            w.write_u32(items.len() as u32)?;
            for v in items {
                w.write_f32(v[0])?;
                w.write_f32(v[1])?;
                w.write_f32(v[2])?;
            }
            Ok(())
        }
        (ElementShape::Str(capacity), FlagValue::StrArray(items)) => {
            w.write_u32(items.len() as u32)?;
            for s in items {
                write_utf8_field(w, hash, s, capacity)?;
            }
            Ok(())
        }
        (ElementShape::WStr(capacity), FlagValue::StrArray(items)) => {
            w.write_u32(items.len() as u32)?;
            for s in items {
                write_utf16_field(w, hash, s, capacity)?;
            }
            Ok(())
        }
        (ElementShape::Bin, FlagValue::BinaryArray(items)) => {
            w.write_u32(items.len() as u32)?;
            for bytes in items {
                write_binary(w, bytes)?;
            }
            Ok(())
        }
        _ => unreachable!("value shape was already checked against kind"),
    }
}

fn encode_key_set(w: &mut Writer, value: &FlagValue) -> Result<(), SavEncodeError> {
    let FlagValue::KeySet(keys) = value else {
        unreachable!("value shape was already checked against kind");
    };
    for key in keys {
        w.write_u64(*key)?;
    }
    w.write_u64(0)
}

fn write_binary(w: &mut Writer, bytes: &[u8]) -> Result<(), SavEncodeError> {
    w.write_u32(bytes.len() as u32)?;
    w.write_bytes(bytes)
}

fn write_utf8_field(w: &mut Writer, hash: u32, s: &str, capacity: u32) -> Result<(), SavEncodeError> {
    let bytes = s.as_bytes();
    if bytes.len() + 1 > capacity as usize {
        return Err(SavEncodeError::StringTooLong {
            hash,
            len: bytes.len(),
            capacity: capacity as usize,
        });
    }
    w.write_bytes(bytes)?;
    w.write_bytes(&vec![0u8; capacity as usize - bytes.len()])
}

fn write_utf16_field(w: &mut Writer, hash: u32, s: &str, capacity: u32) -> Result<(), SavEncodeError> {
    let units: Vec<u16> = s.encode_utf16().collect();
    let needed_bytes = units.len() * 2 + 2;
    if needed_bytes > capacity as usize {
        return Err(SavEncodeError::StringTooLong {
            hash,
            len: units.len() * 2,
            capacity: capacity as usize,
        });
    }
    if capacity % 2 != 0 {
        return Err(SavEncodeError::Utf16Unaligned { hash });
    }
    for u in &units {
        w.write_u16(*u)?;
    }
    let written = units.len() * 2;
    w.write_bytes(&vec![0u8; capacity as usize - written])
}
