//! SAV decode (spec.md §4.2): header validation, then a flat key-table scan
//! where a zero hash introduces a type switch and any other hash is a flag
//! under the most recently switched-to type.

use crate::error::SavDecodeError;
use crate::flag_kind::{ElementShape, FlagKind};
use crate::flag_value::FlagValue;
use crate::io::Reader;

use super::{bool_array_byte_len, DecodedSav, SavHeader, HEADER_SIZE, MAGIC, SUPPORTED_VERSIONS};

pub fn decode(buf: &[u8]) -> Result<DecodedSav, SavDecodeError> {
    let mut r = Reader::new(buf);

    let magic = r.read_u32()?;
    if magic != MAGIC {
        return Err(SavDecodeError::BadMagic(magic));
    }
    let format_version = r.read_u32()?;
    if !SUPPORTED_VERSIONS.contains(&format_version) {
        return Err(SavDecodeError::UnsupportedVersion(format_version));
    }
    let data_offset = r.read_u32()?;
    r.seek(HEADER_SIZE);

    let mut store = super::SaveStore::new();
    // Mirrors the source's implicit default: a key read before any type
    // switch is encountered is treated as a Bool.
    let mut current_kind = FlagKind::Bool;

    while r.tell() < data_offset as usize {
        let hash = r.read_u32()?;
        if hash == 0 {
            let type_id = r.read_u32()?;
            current_kind = FlagKind::try_from(type_id)?;
            continue;
        }
        if let Some(value) = decode_value(&mut r, current_kind)? {
            store.insert(current_kind, hash, value);
        }
    }

    Ok(DecodedSav {
        header: SavHeader {
            format_version,
            data_offset,
            buffer_size: buf.len(),
        },
        store,
    })
}

/// Decode one flag's value at the cursor. Returns `None` for a null
/// reference offset (spec.md §4.2: "an offset of 0 means the flag carries
/// no value and is skipped").
fn decode_value(r: &mut Reader, kind: FlagKind) -> Result<Option<FlagValue>, SavDecodeError> {
    let d = kind.descriptor();

    if d.is_inline {
        return Ok(Some(decode_inline(r, d.element)?));
    }

    if d.is_key_set {
        let offset = r.read_u32()? as usize;
        if offset == 0 {
            return Ok(None);
        }
        let keys = r.with_seek(offset, decode_key_set)?;
        return Ok(Some(FlagValue::KeySet(keys)));
    }

    let offset = r.read_u32()? as usize;
    if offset == 0 {
        return Ok(None);
    }
    let value = r.with_seek(offset, |r| {
        if d.is_array {
            decode_array(r, d.element)
        } else {
            decode_scalar_ref(r, d.element)
        }
    })?;
    Ok(Some(value))
}

fn decode_inline(r: &mut Reader, element: ElementShape) -> Result<FlagValue, SavDecodeError> {
    Ok(match element {
        ElementShape::Bool => FlagValue::Bool(r.read_u32()? != 0),
        ElementShape::Int => FlagValue::Int(r.read_s32()?),
        ElementShape::UInt => FlagValue::UInt(r.read_u32()?),
        ElementShape::Float => FlagValue::Float(r.read_f32()?),
        ElementShape::Enum => FlagValue::Enum(r.read_u32()?),
        other => unreachable!("{other:?} is never an inline element"),
    })
}

fn decode_scalar_ref(r: &mut Reader, element: ElementShape) -> Result<FlagValue, SavDecodeError> {
    Ok(match element {
        ElementShape::Int64 => FlagValue::Int64(r.read_s64()?),
        ElementShape::UInt64 => FlagValue::UInt64(r.read_u64()?),
        ElementShape::Vector2 => FlagValue::Vector2([r.read_f32()?, r.read_f32()?]),
        ElementShape::Vector3 => {
            FlagValue::Vector3([r.read_f32()?, r.read_f32()?, r.read_f32()?])
        }
        ElementShape::Str(capacity) => FlagValue::Str(decode_utf8_field(r, capacity)?),
        ElementShape::WStr(capacity) => FlagValue::Str(decode_utf16_field(r, capacity)?),
        ElementShape::Bin => FlagValue::Binary(decode_binary(r)?),
        other => unreachable!("{other:?} is never a referenced scalar"),
    })
}

fn decode_array(r: &mut Reader, element: ElementShape) -> Result<FlagValue, SavDecodeError> {
    let count = r.read_u32()? as usize;
    Ok(match element {
        ElementShape::Bool => {
            let n = bool_array_byte_len(count);
            let bits = r.read_bytes(n)?;
            let values = (0..count)
                .map(|i| bits[i / 8] & (1 << (i % 8)) != 0)
                .collect();
            FlagValue::BoolArray(values)
        }
        ElementShape::Int => {
            FlagValue::IntArray((0..count).map(|_| r.read_s32()).collect::<Result<_, _>>()?)
        }
        ElementShape::UInt => {
            FlagValue::UIntArray((0..count).map(|_| r.read_u32()).collect::<Result<_, _>>()?)
        }
        ElementShape::Float => {
            FlagValue::FloatArray((0..count).map(|_| r.read_f32()).collect::<Result<_, _>>()?)
        }
        ElementShape::Enum => {
            FlagValue::EnumArray((0..count).map(|_| r.read_u32()).collect::<Result<_, _>>()?)
        }
        ElementShape::Int64 => {
            FlagValue::Int64Array((0..count).map(|_| r.read_s64()).collect::<Result<_, _>>()?)
        }
        ElementShape::UInt64 => {
            FlagValue::UInt64Array((0..count).map(|_| r.read_u64()).collect::<Result<_, _>>()?)
        }
        ElementShape::Vector2 => FlagValue::Vector2Array(
            (0..count)
                .map(|_| Ok([r.read_f32()?, r.read_f32()?]))
                .collect::<Result<_, SavDecodeError>>()?,
        ),
        ElementShape::Vector3 => FlagValue::Vector3Array(
            (0..count)
                .map(|_| Ok([r.read_f32()?, r.read_f32()?, r.read_f32()?]))
                .collect::<Result<_, SavDecodeError>>()?,
        ),
        ElementShape::Str(capacity) => FlagValue::StrArray(
            (0..count)
                .map(|_| decode_utf8_field(r, capacity))
                .collect::<Result<_, _>>()?,
        ),
        ElementShape::WStr(capacity) => FlagValue::StrArray(
            (0..count)
                .map(|_| decode_utf16_field(r, capacity))
                .collect::<Result<_, _>>()?,
        ),
        ElementShape::Bin => FlagValue::BinaryArray(
            (0..count)
                .map(|_| decode_binary(r))
                .collect::<Result<_, _>>()?,
        ),
        ElementShape::KeySet => unreachable!("Bool64bitKey is never array-shaped"),
    })
}

fn decode_binary(r: &mut Reader) -> Result<Vec<u8>, SavDecodeError> {
    let len = r.read_u32()? as usize;
    Ok(r.read_bytes(len)?.to_vec())
}

fn decode_utf8_field(r: &mut Reader, capacity: u32) -> Result<String, SavDecodeError> {
    let offset = r.tell();
    let raw = r.read_bytes(capacity as usize)?;
    let end = raw.iter().position(|&b| b == 0).unwrap_or(raw.len());
    String::from_utf8(raw[..end].to_vec()).map_err(|_| SavDecodeError::InvalidUtf8 { offset })
}

/// UTF-16LE field: find the first `\x00\x00` run, round its index up to the
/// next even byte, and decode the prefix. If no terminator is found at all,
/// the field is empty (mirrors the source's negative-modulo fallback).
fn decode_utf16_field(r: &mut Reader, capacity: u32) -> Result<String, SavDecodeError> {
    let offset = r.tell();
    let raw = r.read_bytes(capacity as usize)?;
    let cut = match raw.windows(2).position(|w| w == [0, 0]) {
        Some(i) => i + (i % 2),
        None => 0,
    };
    let units: Vec<u16> = raw[..cut]
        .chunks_exact(2)
        .map(|c| u16::from_le_bytes([c[0], c[1]]))
        .collect();
    String::from_utf16(&units).map_err(|_| SavDecodeError::InvalidUtf8 { offset })
}

/// Bool64bitKey: a null-terminated run of 64-bit keys (spec.md §3, §4.2).
fn decode_key_set(r: &mut Reader) -> Result<Vec<u64>, SavDecodeError> {
    let mut keys = Vec::new();
    loop {
        let key = r.read_u64()?;
        if key == 0 {
            break;
        }
        keys.push(key);
    }
    Ok(keys)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header(data_offset: u32, format_version: u32) -> Vec<u8> {
        let mut buf = vec![0u8; HEADER_SIZE];
        buf[0..4].copy_from_slice(&MAGIC.to_le_bytes());
        buf[4..8].copy_from_slice(&format_version.to_le_bytes());
        buf[8..12].copy_from_slice(&data_offset.to_le_bytes());
        buf
    }

    #[test]
    fn rejects_bad_magic() {
        let mut buf = header(HEADER_SIZE as u32, SUPPORTED_VERSIONS[0]);
        buf[0] = 0;
        assert!(matches!(decode(&buf), Err(SavDecodeError::BadMagic(_))));
    }

    #[test]
    fn rejects_unsupported_version() {
        let buf = header(HEADER_SIZE as u32, 1);
        assert!(matches!(
            decode(&buf),
            Err(SavDecodeError::UnsupportedVersion(1))
        ));
    }

    #[test]
    fn decodes_an_inline_bool_flag() {
        let mut body = Vec::new();
        body.extend_from_slice(&0u32.to_le_bytes()); // type switch
        body.extend_from_slice(&(FlagKind::Bool as u32).to_le_bytes());
        body.extend_from_slice(&0xdeadbeefu32.to_le_bytes()); // flag hash
        body.extend_from_slice(&1u32.to_le_bytes()); // inline bool value

        let data_offset = HEADER_SIZE as u32 + body.len() as u32;
        let mut buf = header(data_offset, SUPPORTED_VERSIONS[0]);
        buf.extend_from_slice(&body);

        let decoded = decode(&buf).unwrap();
        assert_eq!(
            decoded.store.get(FlagKind::Bool, 0xdeadbeef),
            Some(&FlagValue::Bool(true))
        );
    }

    #[test]
    fn decodes_bool_array_past_32_bits_on_the_4_byte_grid() {
        // Regression for the §4.6 bit-run formula: 40 bits needs 8 payload
        // bytes (rounded up to the next 4-byte multiple), not 5.
        let bits = (0..40u32).map(|i| i % 3 == 0).collect::<Vec<_>>();
        let mut store = super::super::SaveStore::new();
        store.insert(FlagKind::BoolArray, 0x1, FlagValue::BoolArray(bits.clone()));
        let header = SavHeader {
            format_version: SUPPORTED_VERSIONS[0],
            data_offset: HEADER_SIZE as u32 + 32,
            buffer_size: 4096,
        };
        let buf = super::super::encode::encode(&header, &store).unwrap();
        let decoded = decode(&buf).unwrap();
        assert_eq!(
            decoded.store.get(FlagKind::BoolArray, 0x1),
            Some(&FlagValue::BoolArray(bits))
        );
    }
}
