//! Cross-module integration tests (SPEC_FULL.md §8): full-store round-trip
//! identity (property 1) and the boundary scenarios that need a complete
//! SAV buffer rather than a single module in isolation.

use pretty_assertions::assert_eq;

use gdl_save_tool::flag_kind::FlagKind;
use gdl_save_tool::flag_value::FlagValue;
use gdl_save_tool::sav::{self, SaveStore, SavHeader, HEADER_SIZE, SUPPORTED_VERSIONS};

fn encode_decode(store: &SaveStore, data_offset: u32) -> SaveStore {
    let header = SavHeader {
        format_version: SUPPORTED_VERSIONS[0],
        data_offset,
        buffer_size: 8192,
    };
    let buf = sav::encode(&header, store).unwrap();
    sav::decode(&buf).unwrap().store
}

#[test]
fn testable_property_1_full_store_round_trip_identity() {
    let mut store = SaveStore::new();
    store.insert(FlagKind::Bool, 0x1, FlagValue::Bool(true));
    store.insert(FlagKind::Int, 0x2, FlagValue::Int(-7));
    store.insert(FlagKind::Float, 0x3, FlagValue::Float(3.5));
    store.insert(FlagKind::UInt64, 0x4, FlagValue::UInt64(0xdeadbeefcafe));
    store.insert(FlagKind::Vector3, 0x5, FlagValue::Vector3([1.0, 2.0, 3.0]));
    store.insert(FlagKind::String32, 0x6, FlagValue::Str("Hyrule".into()));
    store.insert(FlagKind::IntArray, 0x7, FlagValue::IntArray(vec![1, 2, 3, 4]));
    store.insert(FlagKind::Binary, 0x8, FlagValue::Binary(vec![0xde, 0xad, 0xbe, 0xef]));
    store.insert(FlagKind::Bool64bitKey, 0x9, FlagValue::KeySet(vec![11, 22, 33]));

    // 9 flags across 9 distinct types: 9 type switches + 9 flag entries.
    let data_offset = HEADER_SIZE as u32 + 8 * 9 + 8 * 9;
    let decoded = encode_decode(&store, data_offset);

    assert_eq!(decoded, store);
}

#[test]
fn boundary_scenario_s5_bool64bitkey_round_trips_a_key_run() {
    let mut store = SaveStore::new();
    let hash = gdl_save_tool::hash::hash_name("Game");
    store.insert(
        FlagKind::Bool64bitKey,
        hash,
        FlagValue::KeySet(vec![0x1111_1111, 0x2222_2222, 0x3333_3333]),
    );

    let data_offset = HEADER_SIZE as u32 + 16;
    let decoded = encode_decode(&store, data_offset);

    assert_eq!(
        decoded.get(FlagKind::Bool64bitKey, hash),
        Some(&FlagValue::KeySet(vec![0x1111_1111, 0x2222_2222, 0x3333_3333]))
    );
}

#[test]
fn boundary_scenario_s6_single_int_flag_sav_layout() {
    let mut store = SaveStore::new();
    store.insert(FlagKind::Int, 0xcafef00d, FlagValue::Int(42));

    let data_offset = HEADER_SIZE as u32 + 16;
    let header = SavHeader {
        format_version: SUPPORTED_VERSIONS[0],
        data_offset,
        buffer_size: 64,
    };
    let buf = sav::encode(&header, &store).unwrap();

    // Header: magic, format_version, data_offset.
    assert_eq!(&buf[0..4], &sav::MAGIC.to_le_bytes());
    assert_eq!(&buf[4..8], &SUPPORTED_VERSIONS[0].to_le_bytes());
    assert_eq!(&buf[8..12], &data_offset.to_le_bytes());

    // Key table: type switch (0, Int) then the one inline flag.
    let key_table = &buf[HEADER_SIZE..data_offset as usize];
    assert_eq!(&key_table[0..4], &0u32.to_le_bytes());
    assert_eq!(&key_table[4..8], &(FlagKind::Int as u32).to_le_bytes());
    assert_eq!(&key_table[8..12], &0xcafef00du32.to_le_bytes());
    assert_eq!(&key_table[12..16], &42i32.to_le_bytes());

    assert_eq!(buf.len(), 64);
}
