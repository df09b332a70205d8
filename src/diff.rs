//! Diff engine (spec.md §4.4): compares two stores and produces a
//! structured delta `{type name -> {flag name -> change}}` suitable for
//! JSON rendering.
//!
//! Rather than the source's two literal passes (new-then-old, with the
//! documented risk of writing an outer-type entry before its inner map
//! exists), this walks the union of hashes present under each kind once,
//! always initializing the inner map first. Net behavior is the same:
//! additions, mutations and deletions are all covered, and the result is
//! symmetric under `(A,B) -> (B,A)` up to swapping Old/New.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use indexmap::{IndexMap, IndexSet};
use serde_json::{json, Map, Value};

use crate::flag_kind::{CANONICAL_ORDER, FlagKind};
use crate::flag_value::FlagValue;
use crate::hash::HashDictionary;
use crate::sav::SaveStore;

pub type Delta = IndexMap<String, IndexMap<String, Value>>;

pub fn diff(old: &SaveStore, new: &SaveStore, hashes: &mut HashDictionary) -> Delta {
    let mut result: Delta = IndexMap::new();

    for kind in CANONICAL_ORDER {
        let old_table = old.table(kind);
        let new_table = new.table(kind);
        if old_table.is_none() && new_table.is_none() {
            continue;
        }

        let mut ordered_hashes: IndexSet<u32> = IndexSet::new();
        if let Some(t) = new_table {
            ordered_hashes.extend(t.keys().copied());
        }
        if let Some(t) = old_table {
            ordered_hashes.extend(t.keys().copied());
        }

        let mut inner: IndexMap<String, Value> = IndexMap::new();
        for hash in ordered_hashes {
            let old_val = old_table.and_then(|t| t.get(&hash));
            let new_val = new_table.and_then(|t| t.get(&hash));
            if let Some(change) = diff_one(kind, old_val, new_val, hashes) {
                inner.insert(hashes.resolve_name(hash), change);
            }
        }

        if !inner.is_empty() {
            result.insert(kind.to_string(), inner);
        }
    }

    result
}

fn diff_one(
    kind: FlagKind,
    old_val: Option<&FlagValue>,
    new_val: Option<&FlagValue>,
    hashes: &mut HashDictionary,
) -> Option<Value> {
    if kind == FlagKind::Bool64bitKey {
        return diff_key_set(old_val, new_val);
    }
    if kind.is_array() {
        return diff_array(kind, old_val, new_val, hashes);
    }
    diff_scalar(old_val, new_val, hashes)
}

fn diff_scalar(
    old_val: Option<&FlagValue>,
    new_val: Option<&FlagValue>,
    hashes: &mut HashDictionary,
) -> Option<Value> {
    let old_json = old_val.map(|v| scalar_to_json(v, hashes));
    let new_json = new_val.map(|v| scalar_to_json(v, hashes));
    if old_json == new_json {
        return None;
    }
    Some(json!({
        "Old": old_json.unwrap_or(Value::Null),
        "New": new_json.unwrap_or(Value::Null),
    }))
}

fn diff_key_set(old_val: Option<&FlagValue>, new_val: Option<&FlagValue>) -> Option<Value> {
    let old_set: IndexSet<u64> = key_set(old_val).into_iter().collect();
    let new_set: IndexSet<u64> = key_set(new_val).into_iter().collect();

    let removed: Vec<Value> = old_set
        .iter()
        .filter(|k| !new_set.contains(*k))
        .map(|k| json!(key_hex(*k)))
        .collect();
    let added: Vec<Value> = new_set
        .iter()
        .filter(|k| !old_set.contains(*k))
        .map(|k| json!(key_hex(*k)))
        .collect();

    if removed.is_empty() && added.is_empty() {
        return None;
    }
    Some(json!({ "Old": removed, "New": added }))
}

fn key_set(value: Option<&FlagValue>) -> Vec<u64> {
    match value {
        Some(FlagValue::KeySet(keys)) => keys.clone(),
        _ => Vec::new(),
    }
}

fn key_hex(key: u64) -> String {
    format!("0x{key:016x}")
}

fn diff_array(
    kind: FlagKind,
    old_val: Option<&FlagValue>,
    new_val: Option<&FlagValue>,
    hashes: &mut HashDictionary,
) -> Option<Value> {
    let old_elements = array_elements_json(kind, old_val, hashes);
    let new_elements = array_elements_json(kind, new_val, hashes);
    let len = old_elements.len().max(new_elements.len());

    let mut map = Map::new();
    for i in 0..len {
        let old_el = old_elements.get(i).cloned();
        let new_el = new_elements.get(i).cloned();
        if old_el == new_el {
            continue;
        }
        map.insert(
            i.to_string(),
            json!({
                "Old": old_el.unwrap_or(Value::Null),
                "New": new_el.unwrap_or(Value::Null),
            }),
        );
    }

    if map.is_empty() {
        None
    } else {
        Some(Value::Object(map))
    }
}

fn array_elements_json(kind: FlagKind, value: Option<&FlagValue>, hashes: &mut HashDictionary) -> Vec<Value> {
    use FlagValue::*;
    match value {
        None => Vec::new(),
        Some(BoolArray(v)) => v.iter().map(|b| json!(b)).collect(),
        Some(IntArray(v)) => v.iter().map(|n| json!(n)).collect(),
        Some(UIntArray(v)) => v.iter().map(|n| json!(n)).collect(),
        Some(FloatArray(v)) => v.iter().map(|n| json!(n)).collect(),
        Some(EnumArray(v)) => v.iter().map(|n| json!(hashes.resolve_enum_value(*n))).collect(),
        Some(Int64Array(v)) => v.iter().map(|n| json!(n)).collect(),
        Some(UInt64Array(v)) => v.iter().map(|n| json!(n)).collect(),
        Some(Vector2Array(v)) => v.iter().map(|p| json!({"x": p[0], "y": p[1]})).collect(),
        Some(Vector3Array(v)) => v
            .iter()
            .map(|p| json!({"x": p[0], "y": p[1], "z": p[2]}))
            .collect(),
        Some(StrArray(v)) => v.iter().map(|s| json!(s)).collect(),
        Some(BinaryArray(v)) => v.iter().map(|b| json!(BASE64.encode(b))).collect(),
        Some(other) => unreachable!("{other:?} is not an array shape for {kind:?}"),
    }
}

fn scalar_to_json(value: &FlagValue, hashes: &mut HashDictionary) -> Value {
    use FlagValue::*;
    match value {
        Bool(b) => json!(b),
        Int(v) => json!(v),
        UInt(v) => json!(v),
        Float(v) => json!(v),
        Enum(v) => json!(hashes.resolve_enum_value(*v)),
        Int64(v) => json!(v),
        UInt64(v) => json!(v),
        Vector2(v) => json!({"x": v[0], "y": v[1]}),
        Vector3(v) => json!({"x": v[0], "y": v[1], "z": v[2]}),
        Str(s) => json!(s),
        Binary(b) => json!(BASE64.encode(b)),
        other => unreachable!("{other:?} is not a scalar shape"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hash::hash_name;

    #[test]
    fn boundary_scenario_s2_enum_diff_resolves_names() {
        let mut hashes = HashDictionary::new();
        hashes.register_new_hash("Sunny");
        hashes.register_new_hash("Rain");
        hashes.register_new_hash("Weather");

        let mut old = SaveStore::new();
        old.insert(FlagKind::Enum, hash_name("Weather"), FlagValue::Enum(hash_name("Rain")));
        let mut new = SaveStore::new();
        new.insert(FlagKind::Enum, hash_name("Weather"), FlagValue::Enum(hash_name("Sunny")));

        let delta = diff(&old, &new, &mut hashes);
        let entry = &delta["Enum"]["Weather"];
        assert_eq!(entry["Old"], json!("Rain"));
        assert_eq!(entry["New"], json!("Sunny"));
    }

    #[test]
    fn diff_is_symmetric_up_to_old_new_swap() {
        let mut hashes = HashDictionary::new();
        let mut old = SaveStore::new();
        old.insert(FlagKind::Int, 1, FlagValue::Int(1));
        let mut new = SaveStore::new();
        new.insert(FlagKind::Int, 1, FlagValue::Int(2));
        new.insert(FlagKind::Int, 2, FlagValue::Int(9));

        let forward = diff(&old, &new, &mut hashes);
        let backward = diff(&new, &old, &mut hashes);

        let f = &forward["Int"]["0x00000001"];
        let b = &backward["Int"]["0x00000001"];
        assert_eq!(f["Old"], b["New"]);
        assert_eq!(f["New"], b["Old"]);
    }

    #[test]
    fn key_set_diff_is_a_set_difference() {
        let mut hashes = HashDictionary::new();
        hashes.register_new_hash("Game");
        let mut old = SaveStore::new();
        old.insert(FlagKind::Bool64bitKey, hash_name("Game"), FlagValue::KeySet(vec![1, 2]));
        let mut new = SaveStore::new();
        new.insert(FlagKind::Bool64bitKey, hash_name("Game"), FlagValue::KeySet(vec![2, 3]));

        let delta = diff(&old, &new, &mut hashes);
        let entry = &delta["Bool64bitKey"]["Game"];
        assert_eq!(entry["Old"], json!(["0x0000000000000001"]));
        assert_eq!(entry["New"], json!(["0x0000000000000003"]));
    }

    #[test]
    fn unchanged_stores_produce_an_empty_delta() {
        let mut hashes = HashDictionary::new();
        let mut a = SaveStore::new();
        a.insert(FlagKind::Int, 1, FlagValue::Int(5));
        let b = a.clone();
        assert!(diff(&a, &b, &mut hashes).is_empty());
    }

    #[test]
    fn array_diff_reports_only_changed_indices() {
        let mut hashes = HashDictionary::new();
        let mut old = SaveStore::new();
        old.insert(FlagKind::IntArray, 1, FlagValue::IntArray(vec![1, 2, 3]));
        let mut new = SaveStore::new();
        new.insert(FlagKind::IntArray, 1, FlagValue::IntArray(vec![1, 9, 3, 4]));

        let delta = diff(&old, &new, &mut hashes);
        let entry = delta["IntArray"]["0x00000001"].as_object().unwrap();
        assert_eq!(entry.len(), 2);
        assert_eq!(entry["1"]["New"], json!(9));
        assert_eq!(entry["3"]["New"], json!(4));
    }
}
