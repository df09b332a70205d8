//! `GdlCodec` (spec.md §2, §6 Non-goals): the seam between this crate's
//! in-memory `GdlDocument` and whatever binary hierarchical-document format
//! the game actually reads/writes on disk. Parsing and serializing that
//! binary format is explicitly out of scope (spec.md Non-goals) — this
//! trait documents the shape a real implementation would plug into, and
//! `JsonGdlCodec` is a stand-in that round-trips through JSON so the rest
//! of the crate (insert/delete/layout) can be exercised end to end without
//! the binary reader.

use std::io::{Read, Write};

use crate::error::Error;

use super::document::GdlDocument;

/// Reads and writes a `GdlDocument` against some on-disk representation.
/// A production implementation targets the game's own binary hierarchical
/// document format; `JsonGdlCodec` targets JSON instead.
pub trait GdlCodec {
    fn read(&self, r: &mut dyn Read) -> Result<GdlDocument, Error>;
    fn write(&self, w: &mut dyn Write, doc: &GdlDocument) -> Result<(), Error>;
}

/// Stand-in codec used by the CLI and tests in place of the game's binary
/// document format (out of scope per spec.md Non-goals).
#[derive(Clone, Copy, Debug, Default)]
pub struct JsonGdlCodec;

impl GdlCodec for JsonGdlCodec {
    fn read(&self, r: &mut dyn Read) -> Result<GdlDocument, Error> {
        Ok(serde_json::from_reader(r)?)
    }

    fn write(&self, w: &mut dyn Write, doc: &GdlDocument) -> Result<(), Error> {
        serde_json::to_writer_pretty(w, doc)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn json_codec_round_trips_a_document() {
        let mut doc = GdlDocument::new();
        doc.meta_data.save_directory = vec!["F1".to_string()];
        let mut record = super::super::record::FlagRecord::new();
        record.set("Hash", json!(42));
        doc.insert_flag("Int", record);

        let codec = JsonGdlCodec;
        let mut buf = Vec::new();
        codec.write(&mut buf, &doc).unwrap();

        let decoded = codec.read(&mut buf.as_slice()).unwrap();
        assert_eq!(decoded, doc);
    }
}
