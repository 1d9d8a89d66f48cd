//! Metadata extraction for SRTB rhythm-game chart files.
//!
//! An `.srtb` file is a JSON envelope whose payload is a flat list of
//! key/value string pairs, where most values are themselves JSON and the
//! track-data values embed a very large note sequence. [`envelope::decode`]
//! flattens the envelope without ever materializing the note arrays, and
//! [`chart::project`] turns the result into a validated [`Chart`].

pub mod audio;
pub mod chart;
pub mod envelope;
pub mod error;
pub mod scan;

use std::path::Path;

pub use chart::{project, Chart, DifficultySlot, DifficultyTier};
pub use envelope::{decode, FlattenedMap};
pub use error::SrtbError;

/// Parse chart text into a [`Chart`]. `source_path` is the file the text
/// came from; it only feeds the chart's path metadata.
pub fn load_str(text: &str, source_path: &Path) -> Result<Chart, SrtbError> {
    let map = envelope::decode(text)?;
    chart::project(&map, source_path)
}

/// Read and parse a chart file.
pub fn load_path(path: &Path) -> Result<Chart, SrtbError> {
    let text = std::fs::read_to_string(path)?;
    load_str(&text, path)
}
