//! Patch engine (spec.md §4.5): applies a diff document to a store in
//! place. Non-atomic by design (spec.md §9 design note): on failure,
//! entries already applied stay applied. Callers that need atomicity
//! should clone the store first.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use serde_json::Value;

use crate::diff::Delta;
use crate::error::PatchError;
use crate::flag_kind::FlagKind;
use crate::flag_value::FlagValue;
use crate::hash::HashDictionary;
use crate::sav::SaveStore;

pub fn apply(store: &mut SaveStore, delta: &Delta) -> Result<(), PatchError> {
    for (type_name, entries) in delta {
        let kind: FlagKind = type_name
            .parse()
            .map_err(|_| PatchError::UnknownType(type_name.clone()))?;

        for (name, change) in entries {
            if kind == FlagKind::Bool64bitKey {
                apply_key_set(store, kind, change)?;
                continue;
            }
            let hash = resolve_hash(name)?;
            if kind.is_array() {
                apply_array_entry(store, kind, hash, change)?;
            } else {
                apply_scalar_entry(store, kind, hash, change)?;
            }
        }
    }
    Ok(())
}

fn resolve_hash(name: &str) -> Result<u32, PatchError> {
    HashDictionary::name_to_hash(name).map_err(|_| PatchError::UnknownType(name.to_string()))
}

fn apply_scalar_entry(
    store: &mut SaveStore,
    kind: FlagKind,
    hash: u32,
    change: &Value,
) -> Result<(), PatchError> {
    let new_value = change.get("New").cloned().unwrap_or(Value::Null);
    if new_value.is_null() {
        store.remove(kind, hash);
        return Ok(());
    }
    let value = scalar_from_json(kind, &new_value)?;
    store.insert(kind, hash, value);
    Ok(())
}

fn apply_array_entry(
    store: &mut SaveStore,
    kind: FlagKind,
    hash: u32,
    change: &Value,
) -> Result<(), PatchError> {
    let indices = change
        .as_object()
        .ok_or_else(|| PatchError::UnknownType(format!("{kind} entry is not an index map")))?;

    let table = store
        .table_mut(kind)
        .ok_or(PatchError::UnsupportedArrayResize { hash, index: 0 })?;
    let value = table
        .get_mut(&hash)
        .ok_or(PatchError::UnsupportedArrayResize { hash, index: 0 })?;

    for (idx_str, idx_change) in indices {
        let index: usize = idx_str
            .parse()
            .map_err(|_| PatchError::UnsupportedArrayResize { hash, index: 0 })?;
        let new_value = idx_change.get("New").cloned().unwrap_or(Value::Null);
        if new_value.is_null() {
            return Err(PatchError::UnsupportedArrayResize { hash, index });
        }
        set_array_element(value, index, &new_value, hash)?;
    }
    Ok(())
}

fn apply_key_set(store: &mut SaveStore, kind: FlagKind, change: &Value) -> Result<(), PatchError> {
    let game_hash = crate::hash::hash_name("Game");
    let existing: std::collections::BTreeSet<u64> = match store.get(kind, game_hash) {
        Some(FlagValue::KeySet(keys)) => keys.iter().copied().collect(),
        _ => std::collections::BTreeSet::new(),
    };
    let added = hex_key_set(change.get("New"))?;
    let removed = hex_key_set(change.get("Old"))?;

    let result: Vec<u64> = existing
        .union(&added)
        .copied()
        .filter(|k| !removed.contains(k))
        .collect();
    let mut result = result;
    result.sort_unstable();

    store.insert(kind, game_hash, FlagValue::KeySet(result));
    Ok(())
}

fn hex_key_set(value: Option<&Value>) -> Result<std::collections::BTreeSet<u64>, PatchError> {
    let Some(Value::Array(items)) = value else {
        return Ok(std::collections::BTreeSet::new());
    };
    items
        .iter()
        .map(|v| {
            let s = v
                .as_str()
                .ok_or_else(|| PatchError::UnknownType("Bool64bitKey entry is not a string".into()))?;
            let hex = s.strip_prefix("0x").unwrap_or(s);
            u64::from_str_radix(hex, 16)
                .map_err(|_| PatchError::UnknownType(format!("invalid key literal {s:?}")))
        })
        .collect()
}

fn scalar_from_json(kind: FlagKind, json: &Value) -> Result<FlagValue, PatchError> {
    let bad = || PatchError::UnknownType(format!("value does not fit {kind}"));
    Ok(match kind {
        FlagKind::Bool => FlagValue::Bool(json.as_bool().ok_or_else(bad)?),
        FlagKind::Int => FlagValue::Int(json.as_i64().ok_or_else(bad)? as i32),
        FlagKind::UInt => FlagValue::UInt(json.as_u64().ok_or_else(bad)? as u32),
        FlagKind::Float => FlagValue::Float(json.as_f64().ok_or_else(bad)? as f32),
        FlagKind::Enum => {
            let name = json.as_str().ok_or_else(bad)?;
            FlagValue::Enum(HashDictionary::name_to_hash(name).map_err(|_| bad())?)
        }
        FlagKind::Int64 => FlagValue::Int64(json.as_i64().ok_or_else(bad)?),
        FlagKind::UInt64 => FlagValue::UInt64(json.as_u64().ok_or_else(bad)?),
        FlagKind::Vector2 => FlagValue::Vector2(vector2_from_json(json).ok_or_else(bad)?),
        FlagKind::Vector3 => FlagValue::Vector3(vector3_from_json(json).ok_or_else(bad)?),
        FlagKind::String16 | FlagKind::String32 | FlagKind::String64
        | FlagKind::WString16 | FlagKind::WString32 | FlagKind::WString64 => {
            FlagValue::Str(json.as_str().ok_or_else(bad)?.to_string())
        }
        FlagKind::Binary => {
            let text = json.as_str().ok_or_else(bad)?;
            FlagValue::Binary(BASE64.decode(text).map_err(|_| bad())?)
        }
        _ => return Err(bad()),
    })
}

fn vector2_from_json(json: &Value) -> Option<[f32; 2]> {
    Some([json.get("x")?.as_f64()? as f32, json.get("y")?.as_f64()? as f32])
}

fn vector3_from_json(json: &Value) -> Option<[f32; 3]> {
    Some([
        json.get("x")?.as_f64()? as f32,
        json.get("y")?.as_f64()? as f32,
        json.get("z")?.as_f64()? as f32,
    ])
}

fn set_array_element(value: &mut FlagValue, index: usize, json: &Value, hash: u32) -> Result<(), PatchError> {
    let out_of_range = || PatchError::UnsupportedArrayResize { hash, index };
    match value {
        FlagValue::BoolArray(v) => {
            *v.get_mut(index).ok_or_else(out_of_range)? = json.as_bool().ok_or_else(out_of_range)?;
        }
        FlagValue::IntArray(v) => {
            *v.get_mut(index).ok_or_else(out_of_range)? = json.as_i64().ok_or_else(out_of_range)? as i32;
        }
        FlagValue::UIntArray(v) => {
            *v.get_mut(index).ok_or_else(out_of_range)? = json.as_u64().ok_or_else(out_of_range)? as u32;
        }
        FlagValue::FloatArray(v) => {
            *v.get_mut(index).ok_or_else(out_of_range)? = json.as_f64().ok_or_else(out_of_range)? as f32;
        }
        FlagValue::EnumArray(v) => {
            let name = json.as_str().ok_or_else(out_of_range)?;
            let numeric = HashDictionary::name_to_hash(name).map_err(|_| out_of_range())?;
            *v.get_mut(index).ok_or_else(out_of_range)? = numeric;
        }
        FlagValue::Int64Array(v) => {
            *v.get_mut(index).ok_or_else(out_of_range)? = json.as_i64().ok_or_else(out_of_range)?;
        }
        FlagValue::UInt64Array(v) => {
            *v.get_mut(index).ok_or_else(out_of_range)? = json.as_u64().ok_or_else(out_of_range)?;
        }
        FlagValue::Vector2Array(v) => {
            *v.get_mut(index).ok_or_else(out_of_range)? = vector2_from_json(json).ok_or_else(out_of_range)?;
        }
        FlagValue::Vector3Array(v) => {
            *v.get_mut(index).ok_or_else(out_of_range)? = vector3_from_json(json).ok_or_else(out_of_range)?;
        }
        FlagValue::StrArray(v) => {
            *v.get_mut(index).ok_or_else(out_of_range)? = json.as_str().ok_or_else(out_of_range)?.to_string();
        }
        FlagValue::BinaryArray(v) => {
            let text = json.as_str().ok_or_else(out_of_range)?;
            *v.get_mut(index).ok_or_else(out_of_range)? = BASE64.decode(text).map_err(|_| out_of_range())?;
        }
        _ => return Err(out_of_range()),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diff::diff;
    use crate::hash::hash_name;
    use serde_json::json;

    #[test]
    fn applies_a_scalar_mutation() {
        let mut store = SaveStore::new();
        store.insert(FlagKind::Int, 1, FlagValue::Int(1));
        let delta: Delta = serde_json::from_value(json!({
            "Int": { "0x00000001": { "Old": 1, "New": 2 } }
        }))
        .unwrap();
        apply(&mut store, &delta).unwrap();
        assert_eq!(store.get(FlagKind::Int, 1), Some(&FlagValue::Int(2)));
    }

    #[test]
    fn scalar_delete_on_null_new() {
        let mut store = SaveStore::new();
        store.insert(FlagKind::Int, 1, FlagValue::Int(1));
        let delta: Delta = serde_json::from_value(json!({
            "Int": { "0x00000001": { "Old": 1, "New": null } }
        }))
        .unwrap();
        apply(&mut store, &delta).unwrap();
        assert_eq!(store.get(FlagKind::Int, 1), None);
    }

    #[test]
    fn array_out_of_range_index_fails() {
        let mut store = SaveStore::new();
        store.insert(FlagKind::IntArray, 1, FlagValue::IntArray(vec![1, 2]));
        let delta: Delta = serde_json::from_value(json!({
            "IntArray": { "0x00000001": { "5": { "Old": null, "New": 9 } } }
        }))
        .unwrap();
        assert!(apply(&mut store, &delta).is_err());
    }

    #[test]
    fn patch_inverts_diff_for_scalar_mutation() {
        let mut hashes = HashDictionary::new();
        let mut a = SaveStore::new();
        a.insert(FlagKind::Int, 1, FlagValue::Int(1));
        let mut b = SaveStore::new();
        b.insert(FlagKind::Int, 1, FlagValue::Int(2));

        let delta = diff(&a, &b, &mut hashes);
        apply(&mut a, &delta).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn patch_applies_key_set_union_minus_old() {
        let mut store = SaveStore::new();
        store.insert(FlagKind::Bool64bitKey, hash_name("Game"), FlagValue::KeySet(vec![1, 2]));
        let delta: Delta = serde_json::from_value(json!({
            "Bool64bitKey": {
                "Game": { "Old": ["0x0000000000000001"], "New": ["0x0000000000000003"] }
            }
        }))
        .unwrap();
        apply(&mut store, &delta).unwrap();
        assert_eq!(
            store.get(FlagKind::Bool64bitKey, hash_name("Game")),
            Some(&FlagValue::KeySet(vec![2, 3]))
        );
    }
}
