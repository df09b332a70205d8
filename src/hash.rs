//! Hash dictionary (spec.md §2, §5): a persistent mapping from a 32-bit
//! name hash (lowercase 8-hex-digit key) to known flag names, with
//! "unknown" sentinel handling and a reverse-registration operation.
//!
//! The hash function itself (MurmurHash3 x86 32-bit, seed 0, unsigned) is
//! out of scope per spec.md §1 — we lean on the `murmur3` crate rather than
//! reimplementing it.

use std::collections::HashMap;
use std::io::Cursor;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::Result;

/// Sentinel recorded for a hash that's been observed but whose name is
/// still unknown.
pub const UNKNOWN_SENTINEL: &str = "???";

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HashDictionary {
    entries: HashMap<String, String>,
}

impl HashDictionary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::new());
        }
        let text = std::fs::read_to_string(path)?;
        let entries: HashMap<String, String> = serde_json::from_str(&text)?;
        Ok(Self { entries })
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let text = serde_json::to_string_pretty(&self.entries)?;
        std::fs::write(path, text)?;
        Ok(())
    }

    /// Lowercase 8-hex-digit key for a hash, e.g. `"0001abcd"`.
    pub fn key(hash: u32) -> String {
        format!("{hash:08x}")
    }

    /// Fallback textual form for a hash with no known name: `0x%08x`.
    pub fn fallback_name(hash: u32) -> String {
        format!("0x{hash:08x}")
    }

    /// Look up the name for `hash`, treating the `"???"` sentinel as absent.
    pub fn get(&self, hash: u32) -> Option<&str> {
        self.entries
            .get(&Self::key(hash))
            .map(String::as_str)
            .filter(|name| *name != UNKNOWN_SENTINEL)
    }

    /// Resolve a hash to a display name for diff/decode output (spec.md
    /// §4.4): the dictionary name if known, else the zero-padded hex
    /// fallback. Routes through `try_reverse_hash` so an unknown hash gets
    /// recorded under the `"???"` sentinel the moment it's observed
    /// (spec.md §5's "mutated only by TryReverseHash ... and
    /// RegisterNewHash"), not left silently unresolved.
    pub fn resolve_name(&mut self, hash: u32) -> String {
        self.try_reverse_hash(hash)
            .unwrap_or_else(|| Self::fallback_name(hash))
    }

    /// Resolve a numeric Enum value to its human name the same way, used by
    /// the diff engine when translating Enum/EnumArray elements.
    pub fn resolve_enum_value(&mut self, value: u32) -> String {
        self.resolve_name(value)
    }

    /// Reverse a diff-document key back to a hash: `0x`-prefixed hex is
    /// taken literally, otherwise the text is hashed by name (patch engine,
    /// spec.md §4.5).
    pub fn name_to_hash(name: &str) -> std::result::Result<u32, std::num::ParseIntError> {
        if let Some(hex) = name.strip_prefix("0x") {
            u32::from_str_radix(hex, 16)
        } else {
            Ok(hash_name(name))
        }
    }

    /// Record an observed-but-unknown hash under the sentinel, mirroring
    /// `TryReverseHash`: returns the known name if one exists, else records
    /// `"???"` for future lookups and returns `None`.
    pub fn try_reverse_hash(&mut self, hash: u32) -> Option<String> {
        let key = Self::key(hash);
        if let Some(name) = self.entries.get(&key) {
            if name != UNKNOWN_SENTINEL {
                return Some(name.clone());
            }
            return None;
        }
        warn!(hash = %key, "recording unknown hash under sentinel");
        self.entries.insert(key, UNKNOWN_SENTINEL.to_string());
        None
    }

    /// Learn a new name for a hash we haven't seen before (`RegisterNewHash`).
    /// Does not overwrite an existing, already-known entry.
    pub fn register_new_hash(&mut self, flag_name: &str) {
        let key = Self::key(hash_name(flag_name));
        self.entries.entry(key).or_insert_with(|| flag_name.to_string());
    }
}

/// MurmurHash3 (x86, 32-bit, seed 0, unsigned) of a flag name — the name
/// hash used as the SAV key-table key and the GDL flag `Hash` field.
pub fn hash_name(name: &str) -> u32 {
    murmur3::murmur3_32(&mut Cursor::new(name.as_bytes()), 0)
        .expect("hashing an in-memory byte cursor never fails")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_is_lowercase_zero_padded_hex() {
        assert_eq!(HashDictionary::key(0xAB), "000000ab");
    }

    #[test]
    fn unknown_hash_falls_back_to_hex() {
        let mut dict = HashDictionary::new();
        assert_eq!(dict.resolve_name(0x1abcd), "0x0001abcd");
    }

    #[test]
    fn sentinel_entries_are_treated_as_absent() {
        let mut dict = HashDictionary::new();
        assert!(dict.try_reverse_hash(0x1234).is_none());
        assert_eq!(dict.get(0x1234), None);
        assert_eq!(dict.resolve_name(0x1234), "0x00001234");
    }

    #[test]
    fn resolve_name_records_the_sentinel_for_a_freshly_observed_hash() {
        let mut dict = HashDictionary::new();
        dict.resolve_name(0x1234);
        assert_eq!(
            dict.entries.get(&HashDictionary::key(0x1234)).map(String::as_str),
            Some(UNKNOWN_SENTINEL)
        );
    }

    #[test]
    fn name_to_hash_accepts_hex_literal_or_hashes_the_name() {
        assert_eq!(HashDictionary::name_to_hash("0x0001abcd").unwrap(), 0x1abcd);
        assert_eq!(HashDictionary::name_to_hash("Game").unwrap(), hash_name("Game"));
    }
}
