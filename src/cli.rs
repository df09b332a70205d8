//! Command surface (SPEC_FULL.md §2, §6): subcommands map 1:1 onto the
//! library entry points in `sav`, `diff`, `patch`, and `gdl`. Kept as a
//! thin shell — the only filesystem access outside `GdlCodec` happens here.

use std::fs;
use std::path::PathBuf;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use tracing::info;

use crate::diff::{self, Delta};
use crate::error::{Error, PatchError, Result};
use crate::flag_kind::FlagKind;
use crate::flag_value::FlagValue;
use crate::gdl::{self, GdlCodec, GdlDocument, JsonGdlCodec};
use crate::hash::HashDictionary;
use crate::patch;
use crate::sav::{self, SavHeader, SaveStore};

#[derive(Parser)]
#[command(author, version, about = "Save-state codec and game-data-list layout engine", long_about = None)]
pub struct Cli {
    /// Hash dictionary file (name -> hash lookups and back).
    #[arg(long, global = true, default_value = "hashes.json")]
    pub hashes: PathBuf,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Decode a SAV file into a human-readable JSON document.
    Decode {
        #[arg(value_name = "SAV_FILE")]
        input: PathBuf,
        #[arg(short, long, value_name = "JSON_FILE")]
        out: PathBuf,
    },
    /// Encode a JSON document (as produced by `decode`) back into a SAV file.
    Encode {
        #[arg(value_name = "JSON_FILE")]
        input: PathBuf,
        #[arg(short, long, value_name = "SAV_FILE")]
        out: PathBuf,
    },
    /// Diff two SAV files, producing a JSON delta document.
    Diff {
        #[arg(value_name = "OLD_SAV")]
        old: PathBuf,
        #[arg(value_name = "NEW_SAV")]
        new: PathBuf,
        #[arg(short, long, value_name = "JSON_FILE")]
        out: PathBuf,
    },
    /// Apply a JSON delta document (as produced by `diff`) to a SAV file.
    Patch {
        #[arg(value_name = "SAV_FILE")]
        base: PathBuf,
        #[arg(value_name = "DELTA_JSON")]
        delta: PathBuf,
        #[arg(short, long, value_name = "SAV_FILE")]
        out: PathBuf,
    },
    /// Operate on a game-data-list metadata document.
    Gdl {
        #[command(subcommand)]
        command: GdlCommands,
    },
}

#[derive(Subcommand)]
pub enum GdlCommands {
    /// Insert or replace a flag record and rebuild MetaData.
    Insert {
        #[arg(value_name = "GDL_JSON")]
        doc: PathBuf,
        /// GDL field kind name, e.g. "Int" or "Bool64bitKey".
        #[arg(long)]
        r#type: String,
        /// Path to a JSON object with the record's fields (must include "Hash").
        #[arg(long, value_name = "RECORD_JSON")]
        record: PathBuf,
        #[arg(short, long, value_name = "GDL_JSON")]
        out: PathBuf,
    },
    /// Delete a flag record by hash and rebuild MetaData.
    Delete {
        #[arg(value_name = "GDL_JSON")]
        doc: PathBuf,
        #[arg(long)]
        r#type: String,
        /// Flag name or `0x`-prefixed hex hash.
        #[arg(long)]
        name: String,
        #[arg(short, long, value_name = "GDL_JSON")]
        out: PathBuf,
    },
    /// Recompute MetaData from Data without otherwise changing the document.
    Rebuild {
        #[arg(value_name = "GDL_JSON")]
        doc: PathBuf,
        #[arg(short, long, value_name = "GDL_JSON")]
        out: PathBuf,
    },
}

/// On-disk shape for `decode`/`encode`: the SAV header plus the flag store,
/// flags keyed by resolved name (falling back to `0x%08x` when unknown).
#[derive(Serialize, Deserialize)]
struct SavDocument {
    format_version: u32,
    data_offset: u32,
    buffer_size: usize,
    flags: Value,
}

pub fn run(cli: Cli) -> Result<()> {
    let mut hashes = HashDictionary::load(&cli.hashes)?;
    // `Decode`/`Diff` resolve names through `resolve_name`, which records a
    // `"???"` sentinel for every freshly observed unknown hash (spec.md §5);
    // `Gdl::Insert` can learn a brand new name via `RegisterNewHash`. Both
    // mutate the dictionary and must be written back.
    let touched = matches!(
        &cli.command,
        Commands::Decode { .. }
            | Commands::Diff { .. }
            | Commands::Gdl { command: GdlCommands::Insert { .. } }
    );

    match cli.command {
        Commands::Decode { input, out } => run_decode(&input, &out, &mut hashes)?,
        Commands::Encode { input, out } => run_encode(&input, &out)?,
        Commands::Diff { old, new, out } => run_diff(&old, &new, &out, &mut hashes)?,
        Commands::Patch { base, delta, out } => run_patch(&base, &delta, &out)?,
        Commands::Gdl { command } => run_gdl(command, &mut hashes)?,
    }

    if touched {
        hashes.save(&cli.hashes)?;
    }
    Ok(())
}

fn run_decode(input: &PathBuf, out: &PathBuf, hashes: &mut HashDictionary) -> Result<()> {
    let buf = fs::read(input)?;
    let decoded = sav::decode(&buf)?;
    info!(flags = decoded.store.types().count(), "decoded save file");

    let doc = SavDocument {
        format_version: decoded.header.format_version,
        data_offset: decoded.header.data_offset,
        buffer_size: decoded.header.buffer_size,
        flags: store_to_json(&decoded.store, hashes),
    };
    fs::write(out, serde_json::to_string_pretty(&doc)?)?;
    Ok(())
}

fn run_encode(input: &PathBuf, out: &PathBuf) -> Result<()> {
    let text = fs::read_to_string(input)?;
    let doc: SavDocument = serde_json::from_str(&text)?;
    let store = json_to_store(&doc.flags)?;
    let header = SavHeader {
        format_version: doc.format_version,
        data_offset: doc.data_offset,
        buffer_size: doc.buffer_size,
    };
    let buf = sav::encode(&header, &store)?;
    fs::write(out, buf)?;
    Ok(())
}

fn run_diff(old: &PathBuf, new: &PathBuf, out: &PathBuf, hashes: &mut HashDictionary) -> Result<()> {
    let old_store = sav::decode(&fs::read(old)?)?.store;
    let new_store = sav::decode(&fs::read(new)?)?.store;
    let delta: Delta = diff::diff(&old_store, &new_store, hashes);
    fs::write(out, serde_json::to_string_pretty(&delta)?)?;
    Ok(())
}

fn run_patch(base: &PathBuf, delta_path: &PathBuf, out: &PathBuf) -> Result<()> {
    let decoded = sav::decode(&fs::read(base)?)?;
    let delta: Delta = serde_json::from_str(&fs::read_to_string(delta_path)?)?;
    let mut store = decoded.store;
    patch::apply(&mut store, &delta)?;
    let buf = sav::encode(&decoded.header, &store)?;
    fs::write(out, buf)?;
    Ok(())
}

fn run_gdl(command: GdlCommands, hashes: &mut HashDictionary) -> Result<()> {
    let codec = JsonGdlCodec;
    match command {
        GdlCommands::Insert { doc, r#type, record, out } => {
            let mut document = read_gdl_doc(&codec, &doc)?;
            let record_text = fs::read_to_string(&record)?;
            let map: Map<String, Value> = serde_json::from_str(&record_text)?;
            let mut flag_record = gdl::FlagRecord(map);
            gdl::validate_flag(&r#type, &mut flag_record)?;
            if let Some(name) = flag_record.get("Name").and_then(Value::as_str) {
                hashes.register_new_hash(name);
            }
            document.insert_flag(&r#type, flag_record);
            gdl::update_meta_data(&mut document)?;
            write_gdl_doc(&codec, &document, &out)
        }
        GdlCommands::Delete { doc, r#type, name, out } => {
            let mut document = read_gdl_doc(&codec, &doc)?;
            let hash = resolve_hash(&name)?;
            document.delete_flag(&r#type, hash as u64);
            gdl::update_meta_data(&mut document)?;
            write_gdl_doc(&codec, &document, &out)
        }
        GdlCommands::Rebuild { doc, out } => {
            let mut document = read_gdl_doc(&codec, &doc)?;
            gdl::update_meta_data(&mut document)?;
            write_gdl_doc(&codec, &document, &out)
        }
    }
}

fn read_gdl_doc(codec: &JsonGdlCodec, path: &PathBuf) -> Result<GdlDocument> {
    let mut file = fs::File::open(path)?;
    codec.read(&mut file)
}

fn write_gdl_doc(codec: &JsonGdlCodec, doc: &GdlDocument, path: &PathBuf) -> Result<()> {
    let mut file = fs::File::create(path)?;
    codec.write(&mut file, doc)
}

fn resolve_hash(name: &str) -> Result<u32> {
    HashDictionary::name_to_hash(name)
        .map_err(|_| Error::Patch(PatchError::UnknownType(name.to_string())))
}

fn store_to_json(store: &SaveStore, hashes: &mut HashDictionary) -> Value {
    let mut out = Map::new();
    for (kind, table) in store.types() {
        let mut inner = Map::new();
        for (hash, value) in table {
            let name = hashes.resolve_name(*hash);
            inner.insert(name, value_to_json(value, hashes));
        }
        out.insert(kind.as_str().to_string(), Value::Object(inner));
    }
    Value::Object(out)
}

/// Mirrors `diff::scalar_to_json`/`array_elements_json`: binary as base64,
/// Bool64bitKey as `0x`-prefixed hex, everything else as its plain JSON shape.
fn value_to_json(value: &FlagValue, hashes: &mut HashDictionary) -> Value {
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
        BoolArray(v) => json!(v),
        IntArray(v) => json!(v),
        UIntArray(v) => json!(v),
        FloatArray(v) => json!(v),
        EnumArray(v) => json!(v.iter().map(|n| hashes.resolve_enum_value(*n)).collect::<Vec<_>>()),
        Int64Array(v) => json!(v),
        UInt64Array(v) => json!(v),
        Vector2Array(v) => json!(v.iter().map(|p| json!({"x": p[0], "y": p[1]})).collect::<Vec<_>>()),
        Vector3Array(v) => {
            json!(v.iter().map(|p| json!({"x": p[0], "y": p[1], "z": p[2]})).collect::<Vec<_>>())
        }
        StrArray(v) => json!(v),
        BinaryArray(v) => json!(v.iter().map(|b| BASE64.encode(b)).collect::<Vec<_>>()),
        KeySet(v) => json!(v.iter().map(|k| format!("0x{k:016x}")).collect::<Vec<_>>()),
    }
}

fn json_to_store(flags: &Value) -> Result<SaveStore> {
    let mut store = SaveStore::new();
    let outer = flags.as_object().ok_or_else(|| {
        Error::Patch(PatchError::UnknownType("flags document root".to_string()))
    })?;
    for (type_name, entries) in outer {
        let kind: FlagKind = type_name
            .parse()
            .map_err(|_| Error::Patch(PatchError::UnknownType(type_name.clone())))?;
        let entries = entries.as_object().ok_or_else(|| {
            Error::Patch(PatchError::UnknownType(type_name.clone()))
        })?;
        for (name, value) in entries {
            let hash = HashDictionary::name_to_hash(name)
                .map_err(|_| Error::Patch(PatchError::UnknownType(name.clone())))?;
            let value = FlagValue::from_json(kind, value).ok_or_else(|| {
                Error::Patch(PatchError::UnknownType(format!("{name} does not fit {kind:?}")))
            })?;
            store.insert(kind, hash, value);
        }
    }
    Ok(store)
}
