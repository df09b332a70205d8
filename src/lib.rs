//! Save-state codec and game-data-list layout engine.
//!
//! `sav` reads and writes the binary save file; `gdl` tracks the metadata
//! document that records which flags exist and how big they are; `diff`
//! and `patch` compare and mutate a decoded store; `hash` resolves flag
//! names; `map_unit` translates the map-unit grid labels some flags store
//! packed into a byte.

pub mod cli;
pub mod diff;
pub mod error;
pub mod flag_kind;
pub mod flag_value;
pub mod gdl;
pub mod hash;
pub mod io;
pub mod map_unit;
pub mod patch;
pub mod sav;

pub use error::{Error, Result};
