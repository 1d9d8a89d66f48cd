use std::collections::BTreeMap;
use std::fmt;

use serde::de::{Deserializer, IgnoredAny, MapAccess, Visitor};
use serde::Deserialize;
use serde_json::Value;

use crate::error::SrtbError;

/// Flattened view of the envelope: logical key to decoded inner value.
///
/// This map is the sole interface between the decoder and the projector.
pub type FlattenedMap = BTreeMap<String, Value>;

const CONTAINER_KEY: &str = "largeStringValuesContainer";
const VALUES_KEY: &str = "values";
const NOTES_FIELD: &str = "notes";

/// Decode the outer chart document into a flattened key/value map.
///
/// The document is a JSON object whose payload is a flat list of
/// `{key, val}` pairs where each `val` is itself a JSON-encoded string.
/// Only the `SO_TrackInfo`, `SO_ClipInfo` and `SO_TrackData` key families
/// carry metadata; everything else is ignored. `SO_TrackData_*` values
/// embed the full note sequence, so they get a partial decode that never
/// builds the note array.
pub fn decode(text: &str) -> Result<FlattenedMap, SrtbError> {
    let document: Value =
        serde_json::from_str(text).map_err(|e| SrtbError::format("outer document", e))?;

    let entries = document
        .get(CONTAINER_KEY)
        .and_then(|container| container.get(VALUES_KEY))
        .and_then(Value::as_array)
        .ok_or_else(|| {
            SrtbError::Schema(format!("{CONTAINER_KEY}.{VALUES_KEY} is absent or not a list"))
        })?;

    let mut map = FlattenedMap::new();
    for entry in entries {
        // Entries without a string key or val are known noise in the
        // source format; skip them rather than fail the whole file.
        let Some(key) = entry.get("key").and_then(Value::as_str) else {
            log::debug!("skipping envelope entry without a key field");
            continue;
        };
        let Some(val) = entry.get("val").and_then(Value::as_str) else {
            log::debug!("skipping envelope entry {key} without a string val field");
            continue;
        };

        if key.starts_with("SO_TrackInfo") || key.starts_with("SO_ClipInfo") {
            let decoded: Value =
                serde_json::from_str(val).map_err(|e| SrtbError::format(key, e))?;
            map.insert(key.to_string(), decoded);
        } else if key.starts_with("SO_TrackData") {
            // Some charts carry a literal "null" track-data payload.
            if val == "null" {
                log::debug!("skipping null track data entry {key}");
                continue;
            }
            let TrackDataMeta(fields) =
                serde_json::from_str(val).map_err(|e| SrtbError::format(key, e))?;
            map.insert(key.to_string(), Value::Object(fields));
        }
    }

    Ok(map)
}

/// A track-data object with its note sequence dropped during parsing.
///
/// The note array can run to thousands of timed events while the caller
/// only wants the handful of metadata fields next to it, so the visitor
/// feeds the `notes` value into `IgnoredAny` instead of building it.
struct TrackDataMeta(serde_json::Map<String, Value>);

impl<'de> Deserialize<'de> for TrackDataMeta {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct MetaVisitor;

        impl<'de> Visitor<'de> for MetaVisitor {
            type Value = TrackDataMeta;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a track data object")
            }

            fn visit_map<A>(self, mut access: A) -> Result<Self::Value, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut fields = serde_json::Map::new();
                while let Some(field) = access.next_key::<String>()? {
                    if field == NOTES_FIELD {
                        access.next_value::<IgnoredAny>()?;
                    } else {
                        fields.insert(field, access.next_value()?);
                    }
                }
                Ok(TrackDataMeta(fields))
            }
        }

        deserializer.deserialize_map(MetaVisitor)
    }
}
