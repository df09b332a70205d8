//! The GDL (game-data-list) side of the codec: the metadata document that
//! tracks, per save directory, which flags exist and how big they are
//! (spec.md §3, §4.6, §4.7). Separate from the SAV binary codec in
//! `crate::sav`, which reads/writes the flag values themselves.

pub mod codec;
pub mod document;
pub mod layout;
pub mod record;
pub mod reset;
pub mod validate;

pub use codec::{GdlCodec, JsonGdlCodec};
pub use document::{GdlDocument, MetaData};
pub use layout::{calc_global_size, calc_size, get_size, update_meta_data, GDL_FIELD_ORDER};
pub use record::FlagRecord;
pub use reset::{calc_reset_type_value, reset_event_names, EXTRA_BYTE_BIT, RESET_EVENTS};
pub use validate::{validate_flag, GdlFieldKind};
