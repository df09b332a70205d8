//! Error taxonomy for the save-state codec and GDL layout engine.
//!
//! Each family mirrors spec.md §7 one-to-one. Everything propagates through
//! `?`; nothing here retries or logs — that's the caller's job.

use thiserror::Error;

use crate::flag_kind::FlagKind;

#[derive(Debug, Error)]
pub enum SavDecodeError {
    #[error("bad magic: expected 0x01020304, got {0:#010x}")]
    BadMagic(u32),

    #[error("unsupported format_version {0} (expected 4710644 or 4637640)")]
    UnsupportedVersion(u32),

    #[error("unknown FlagKind id {0}")]
    UnknownTypeId(u32),

    #[error("truncated input: needed {needed} bytes at offset {offset}, had {available}")]
    TruncatedInput {
        needed: usize,
        offset: usize,
        available: usize,
    },

    #[error("string at offset {offset} is not valid utf-8")]
    InvalidUtf8 { offset: usize },
}

#[derive(Debug, Error)]
pub enum SavEncodeError {
    #[error("buffer overflow: write of {needed} bytes at offset {offset} exceeds buffer_size {buffer_size}")]
    BufferOverflow {
        offset: usize,
        needed: usize,
        buffer_size: usize,
    },

    #[error("value for flag {hash:#010x} does not match the shape required by {kind:?}")]
    InvalidValue { hash: u32, kind: FlagKind },

    #[error("string value for flag {hash:#010x} is {len} bytes, which does not fit in a {capacity}-byte field")]
    StringTooLong {
        hash: u32,
        len: usize,
        capacity: usize,
    },

    #[error("WString16 payload for flag {hash:#010x} is not 2-byte aligned")]
    Utf16Unaligned { hash: u32 },
}

#[derive(Debug, Error)]
pub enum PatchError {
    #[error("array resize is not supported (flag {hash:#010x}, index {index})")]
    UnsupportedArrayResize { hash: u32, index: usize },

    #[error("unknown identifier {0:?}")]
    UnknownType(String),
}

#[derive(Debug, Error)]
pub enum GdlError {
    #[error("could not determine array size for flag {hash:#010x} of kind {kind}")]
    IndeterminateArraySize { hash: u64, kind: String },

    #[error("ResetTypeValue {0:#x} sets a bit beyond the known reset-event list")]
    InvalidResetType(i32),

    #[error("ExtraByte must be between 1 and 80, got {0}")]
    ExtraByteOutOfRange(i32),

    #[error("invalid BoolExp expression: opcode {opcode} requires length {expected}, got {actual}")]
    InvalidExpression {
        opcode: u64,
        expected: usize,
        actual: usize,
    },

    #[error("flag is missing required field {0:?}")]
    MissingField(&'static str),

    #[error("field {field:?} has the wrong shape: expected {expected}")]
    WrongShape {
        field: &'static str,
        expected: &'static str,
    },

    #[error("unknown GDL field kind {0:?}")]
    UnknownType(String),
}

#[derive(Debug, Error)]
pub enum MapUnitError {
    #[error("map unit {0:?} is out of range (expected A1-J8)")]
    OutOfRangeUnit(String),

    #[error("extra byte {0} is out of range (expected 1-80)")]
    OutOfRangeByte(i32),
}

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    SavDecode(#[from] SavDecodeError),

    #[error(transparent)]
    SavEncode(#[from] SavEncodeError),

    #[error(transparent)]
    Patch(#[from] PatchError),

    #[error(transparent)]
    Gdl(#[from] GdlError),

    #[error(transparent)]
    MapUnit(#[from] MapUnitError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
