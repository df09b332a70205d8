//! SaveStore (spec.md §3): an ordered mapping `type -> (ordered mapping
//! hash -> FlagValue)`. Outer order is type-ID ascending during encoding;
//! inner order is insertion order preserved from decoding.

use indexmap::IndexMap;

use crate::flag_kind::FlagKind;
use crate::flag_value::FlagValue;

/// Per-type ordered map of `hash -> FlagValue`.
pub type FlagTable = IndexMap<u32, FlagValue>;

#[derive(Clone, Debug, Default, PartialEq)]
pub struct SaveStore {
    types: IndexMap<FlagKind, FlagTable>,
}

impl SaveStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn types(&self) -> impl Iterator<Item = (&FlagKind, &FlagTable)> {
        self.types.iter()
    }

    pub fn table(&self, kind: FlagKind) -> Option<&FlagTable> {
        self.types.get(&kind)
    }

    pub fn table_mut(&mut self, kind: FlagKind) -> Option<&mut FlagTable> {
        self.types.get_mut(&kind)
    }

    pub fn get(&self, kind: FlagKind, hash: u32) -> Option<&FlagValue> {
        self.types.get(&kind)?.get(&hash)
    }

    /// Insert `(hash -> value)` under `kind`, establishing the inner
    /// mapping on first use (spec.md §4.2).
    pub fn insert(&mut self, kind: FlagKind, hash: u32, value: FlagValue) {
        debug_assert!(
            value.matches_kind(kind),
            "value shape must match its declaring FlagKind"
        );
        self.types.entry(kind).or_default().insert(hash, value);
    }

    pub fn remove(&mut self, kind: FlagKind, hash: u32) -> Option<FlagValue> {
        let table = self.types.get_mut(&kind)?;
        let removed = table.shift_remove(&hash);
        if table.is_empty() {
            self.types.shift_remove(&kind);
        }
        removed
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    pub fn contains_type(&self, kind: FlagKind) -> bool {
        self.types.contains_key(&kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insertion_order_is_preserved_within_a_type() {
        let mut store = SaveStore::new();
        store.insert(FlagKind::Int, 3, FlagValue::Int(3));
        store.insert(FlagKind::Int, 1, FlagValue::Int(1));
        store.insert(FlagKind::Int, 2, FlagValue::Int(2));

        let hashes: Vec<u32> = store.table(FlagKind::Int).unwrap().keys().copied().collect();
        assert_eq!(hashes, vec![3, 1, 2]);
    }

    #[test]
    fn removing_last_flag_of_a_type_drops_the_type_entirely() {
        let mut store = SaveStore::new();
        store.insert(FlagKind::Bool, 1, FlagValue::Bool(true));
        store.remove(FlagKind::Bool, 1);
        assert!(!store.contains_type(FlagKind::Bool));
    }
}
