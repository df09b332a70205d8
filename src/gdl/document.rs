//! GdlDocument (spec.md §3): the in-memory form of the game-data-list
//! metadata document — a `Data` section keyed by field kind name, and a
//! `MetaData` section the layout engine recomputes on every serialize.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::record::FlagRecord;

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MetaData {
    pub all_data_save_offset: u32,
    pub all_data_save_size: u32,
    pub format_version: u32,
    pub save_data_offset_pos: Vec<u32>,
    pub save_data_size: Vec<u32>,
    /// One string per save directory; an empty string marks an
    /// unpopulated index (spec.md §3).
    pub save_directory: Vec<String>,
    /// Passed through unchanged; the layout engine never inspects it.
    pub save_type_hash: Value,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GdlDocument {
    /// `Data`: one entry per present field kind, keyed by its name (any
    /// of the 33 `FlagKind` names, or `"Struct"`/`"BoolExp"`).
    pub data: IndexMap<String, Vec<FlagRecord>>,
    pub meta_data: MetaData,
}

impl GdlDocument {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self, kind: &str) -> &[FlagRecord] {
        self.data.get(kind).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn records_mut(&mut self, kind: &str) -> &mut Vec<FlagRecord> {
        self.data.entry(kind.to_string()).or_default()
    }

    /// Insert a flag record under `kind`, keyed by its own `Hash` field
    /// (spec.md §2: "callers ... perform inserts/deletes via hash-keyed
    /// operations"). Replaces any existing record with the same hash.
    pub fn insert_flag(&mut self, kind: &str, record: FlagRecord) {
        let hash = record.hash_u64();
        let list = self.records_mut(kind);
        if let Some(existing) = list.iter_mut().find(|r| r.hash_u64() == hash) {
            *existing = record;
        } else {
            list.push(record);
        }
    }

    pub fn delete_flag(&mut self, kind: &str, hash: u64) -> bool {
        let Some(list) = self.data.get_mut(kind) else {
            return false;
        };
        let before = list.len();
        list.retain(|r| r.hash_u64() != Some(hash));
        if list.is_empty() {
            self.data.shift_remove(kind);
        }
        before != list.len()
    }
}
