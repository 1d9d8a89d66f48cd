use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::Value;

use crate::envelope::FlattenedMap;
use crate::error::SrtbError;

/// Logical key of the track metadata block.
pub const TRACK_INFO_KEY: &str = "SO_TrackInfo_TrackInfo";
/// Logical key of the (single) audio clip block.
pub const CLIP_INFO_KEY: &str = "SO_ClipInfo_ClipInfo_0";

const SECOND_CLIP_KEY: &str = "SO_ClipInfo_ClipInfo_1";
const TRACK_DATA_PREFIX: &str = "SO_TrackData_";

/// The five fixed difficulty tiers of the chart format.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum DifficultyTier {
    Easy,
    Normal,
    Hard,
    Expert,
    #[serde(rename = "XD")]
    Xd,
}

impl DifficultyTier {
    pub const ALL: [DifficultyTier; 5] = [
        DifficultyTier::Easy,
        DifficultyTier::Normal,
        DifficultyTier::Hard,
        DifficultyTier::Expert,
        DifficultyTier::Xd,
    ];

    /// Map the format's `difficultyType` id to a tier.
    ///
    /// Unknown ids return `None` so future tiers never fail a parse.
    pub fn from_type_id(id: i64) -> Option<Self> {
        match id {
            2 => Some(DifficultyTier::Easy),
            3 => Some(DifficultyTier::Normal),
            4 => Some(DifficultyTier::Hard),
            5 => Some(DifficultyTier::Expert),
            6 => Some(DifficultyTier::Xd),
            _ => None,
        }
    }

    /// The `difficultyType` id the format uses for this tier.
    pub fn type_id(self) -> i64 {
        match self {
            DifficultyTier::Easy => 2,
            DifficultyTier::Normal => 3,
            DifficultyTier::Hard => 4,
            DifficultyTier::Expert => 5,
            DifficultyTier::Xd => 6,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            DifficultyTier::Easy => "Easy",
            DifficultyTier::Normal => "Normal",
            DifficultyTier::Hard => "Hard",
            DifficultyTier::Expert => "Expert",
            DifficultyTier::Xd => "XD",
        }
    }
}

/// One difficulty slot of a chart.
///
/// A tier not present in the source stays at the default.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct DifficultySlot {
    pub defined: bool,
    pub level: u32,
}

/// Validated chart metadata, the output of [`project`].
///
/// Immutable after construction except for `clip_duration_seconds`,
/// which the audio probe fills in exactly once.
#[derive(Clone, Debug, Serialize)]
pub struct Chart {
    pub title: String,
    pub subtitle: String,
    pub artist: String,
    pub charter: String,
    pub easy: DifficultySlot,
    pub normal: DifficultySlot,
    pub hard: DifficultySlot,
    pub expert: DifficultySlot,
    pub xd: DifficultySlot,
    pub album_art_asset_name: String,
    pub clip_asset_name: String,
    pub source_path: PathBuf,
    /// Source file stem, usable as an external catalog key.
    pub file_reference: String,
    pub clip_duration_seconds: Option<u64>,
}

impl Chart {
    pub fn difficulty(&self, tier: DifficultyTier) -> DifficultySlot {
        match tier {
            DifficultyTier::Easy => self.easy,
            DifficultyTier::Normal => self.normal,
            DifficultyTier::Hard => self.hard,
            DifficultyTier::Expert => self.expert,
            DifficultyTier::Xd => self.xd,
        }
    }

    fn difficulty_mut(&mut self, tier: DifficultyTier) -> &mut DifficultySlot {
        match tier {
            DifficultyTier::Easy => &mut self.easy,
            DifficultyTier::Normal => &mut self.normal,
            DifficultyTier::Hard => &mut self.hard,
            DifficultyTier::Expert => &mut self.expert,
            DifficultyTier::Xd => &mut self.xd,
        }
    }
}

/// Project a flattened envelope map into a validated [`Chart`].
///
/// Every required lookup that fails reports the dotted path or the
/// synthesized `SO_TrackData_<assetName>` key that was missing.
pub fn project(map: &FlattenedMap, source_path: &Path) -> Result<Chart, SrtbError> {
    let track_info = map
        .get(TRACK_INFO_KEY)
        .ok_or_else(|| SrtbError::missing(TRACK_INFO_KEY))?;

    let title = require_str(track_info, TRACK_INFO_KEY, "title")?;
    let artist = require_str(track_info, TRACK_INFO_KEY, "artistName")?;
    let charter = require_str(track_info, TRACK_INFO_KEY, "charter")?;
    let album_art = require_str(track_info, TRACK_INFO_KEY, "albumArtReference.assetName")?;
    let subtitle = track_info
        .get("subtitle")
        .and_then(Value::as_str)
        .unwrap_or_default();

    // The format is assumed to carry exactly one clip at index 0. A
    // second clip entry means that assumption no longer holds for this
    // file, so refuse it instead of silently picking a clip.
    if map.contains_key(SECOND_CLIP_KEY) {
        return Err(SrtbError::Schema(
            "multiple clip entries are not supported".to_string(),
        ));
    }
    let clip_info = map
        .get(CLIP_INFO_KEY)
        .ok_or_else(|| SrtbError::missing(CLIP_INFO_KEY))?;
    let clip_asset = require_str(clip_info, CLIP_INFO_KEY, "clipAssetReference.assetName")?;

    let source_path = std::path::absolute(source_path)?;
    let file_reference = source_path
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default();

    let mut chart = Chart {
        title: title.to_string(),
        subtitle: subtitle.to_string(),
        artist: artist.to_string(),
        charter: charter.to_string(),
        easy: DifficultySlot::default(),
        normal: DifficultySlot::default(),
        hard: DifficultySlot::default(),
        expert: DifficultySlot::default(),
        xd: DifficultySlot::default(),
        album_art_asset_name: album_art.to_string(),
        clip_asset_name: clip_asset.to_string(),
        source_path,
        file_reference,
        clip_duration_seconds: None,
    };

    let difficulties = track_info
        .get("difficulties")
        .and_then(Value::as_array)
        .ok_or_else(|| SrtbError::missing(format!("{TRACK_INFO_KEY}.difficulties")))?;

    for (i, entry) in difficulties.iter().enumerate() {
        // Inactive difficulties are intentionally excluded by the editor.
        if entry.get("_active").is_some_and(|active| !is_truthy(active)) {
            continue;
        }
        let asset_name = entry.get("assetName").and_then(Value::as_str).ok_or_else(|| {
            SrtbError::missing(format!("{TRACK_INFO_KEY}.difficulties[{i}].assetName"))
        })?;

        let data_key = format!("{TRACK_DATA_PREFIX}{asset_name}");
        let track_data = map
            .get(&data_key)
            .ok_or_else(|| SrtbError::missing(data_key.clone()))?;

        let type_id = track_data
            .get("difficultyType")
            .and_then(Value::as_i64)
            .ok_or_else(|| SrtbError::missing(format!("{data_key}.difficultyType")))?;
        let rating = track_data
            .get("difficultyRating")
            .and_then(Value::as_u64)
            .unwrap_or(0) as u32;

        match DifficultyTier::from_type_id(type_id) {
            Some(tier) => {
                let slot = chart.difficulty_mut(tier);
                slot.defined = true;
                slot.level = rating;
            }
            None => log::debug!("{data_key}: unknown difficultyType {type_id}, ignoring"),
        }
    }

    Ok(chart)
}

/// Look up a required string at a dotted path below `root`.
fn require_str<'a>(root: &'a Value, base: &str, path: &str) -> Result<&'a str, SrtbError> {
    let mut node = root;
    for segment in path.split('.') {
        node = node
            .get(segment)
            .ok_or_else(|| SrtbError::missing(format!("{base}.{path}")))?;
    }
    node.as_str()
        .ok_or_else(|| SrtbError::missing(format!("{base}.{path}")))
}

/// Python-style truthiness for the `_active` flag, which the editor has
/// written as a bool, a number and null across format revisions.
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn map_from(pairs: &[(&str, Value)]) -> FlattenedMap {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    fn minimal_track_info(difficulties: Value) -> Value {
        json!({
            "title": "Spin Me",
            "artistName": "Artist",
            "charter": "Charter",
            "albumArtReference": { "assetName": "ALBUM" },
            "difficulties": difficulties,
        })
    }

    fn clip_info() -> Value {
        json!({ "clipAssetReference": { "assetName": "CLIP" } })
    }

    #[test]
    fn test_project_minimal_hard_chart() {
        let map = map_from(&[
            (
                TRACK_INFO_KEY,
                minimal_track_info(json!([{ "assetName": "HARD" }])),
            ),
            (CLIP_INFO_KEY, clip_info()),
            (
                "SO_TrackData_HARD",
                json!({ "difficultyType": 4, "difficultyRating": 12 }),
            ),
        ]);

        let chart = project(&map, Path::new("/charts/spin_me.srtb")).unwrap();
        assert_eq!(chart.title, "Spin Me");
        assert_eq!(chart.subtitle, "");
        assert_eq!(chart.artist, "Artist");
        assert_eq!(chart.charter, "Charter");
        assert_eq!(chart.album_art_asset_name, "ALBUM");
        assert_eq!(chart.clip_asset_name, "CLIP");
        assert_eq!(chart.file_reference, "spin_me");
        assert!(chart.source_path.is_absolute());
        assert!(chart.clip_duration_seconds.is_none());

        assert_eq!(
            chart.hard,
            DifficultySlot {
                defined: true,
                level: 12
            }
        );
        for tier in [
            DifficultyTier::Easy,
            DifficultyTier::Normal,
            DifficultyTier::Expert,
            DifficultyTier::Xd,
        ] {
            assert_eq!(chart.difficulty(tier), DifficultySlot::default());
        }
    }

    #[test]
    fn test_subtitle_is_kept_when_present() {
        let mut info = minimal_track_info(json!([]));
        info["subtitle"] = json!("feat. Nobody");
        let map = map_from(&[(TRACK_INFO_KEY, info), (CLIP_INFO_KEY, clip_info())]);

        let chart = project(&map, Path::new("/charts/a.srtb")).unwrap();
        assert_eq!(chart.subtitle, "feat. Nobody");
    }

    #[test]
    fn test_missing_track_info() {
        let map = map_from(&[(CLIP_INFO_KEY, clip_info())]);
        let err = project(&map, Path::new("/charts/a.srtb")).unwrap_err();
        assert!(matches!(
            err,
            SrtbError::MissingField(ref path) if path == TRACK_INFO_KEY
        ));
    }

    #[test]
    fn test_missing_required_field_names_dotted_path() {
        let mut info = minimal_track_info(json!([]));
        info.as_object_mut().unwrap().remove("title");
        let map = map_from(&[(TRACK_INFO_KEY, info), (CLIP_INFO_KEY, clip_info())]);

        let err = project(&map, Path::new("/charts/a.srtb")).unwrap_err();
        assert!(matches!(
            err,
            SrtbError::MissingField(ref path) if path == "SO_TrackInfo_TrackInfo.title"
        ));
    }

    #[test]
    fn test_missing_clip_info() {
        let map = map_from(&[(TRACK_INFO_KEY, minimal_track_info(json!([])))]);
        let err = project(&map, Path::new("/charts/a.srtb")).unwrap_err();
        assert!(matches!(
            err,
            SrtbError::MissingField(ref path) if path == CLIP_INFO_KEY
        ));
    }

    #[test]
    fn test_second_clip_entry_is_rejected() {
        let map = map_from(&[
            (TRACK_INFO_KEY, minimal_track_info(json!([]))),
            (CLIP_INFO_KEY, clip_info()),
            ("SO_ClipInfo_ClipInfo_1", clip_info()),
        ]);
        let err = project(&map, Path::new("/charts/a.srtb")).unwrap_err();
        assert!(matches!(err, SrtbError::Schema(_)));
    }

    #[test]
    fn test_inactive_difficulty_is_skipped() {
        let map = map_from(&[
            (
                TRACK_INFO_KEY,
                minimal_track_info(json!([
                    { "assetName": "EASY", "_active": false },
                    { "assetName": "XD", "_active": true },
                ])),
            ),
            (CLIP_INFO_KEY, clip_info()),
            (
                "SO_TrackData_EASY",
                json!({ "difficultyType": 2, "difficultyRating": 3 }),
            ),
            (
                "SO_TrackData_XD",
                json!({ "difficultyType": 6, "difficultyRating": 21 }),
            ),
        ]);

        let chart = project(&map, Path::new("/charts/a.srtb")).unwrap();
        assert!(!chart.easy.defined);
        assert_eq!(chart.easy.level, 0);
        assert!(chart.xd.defined);
        assert_eq!(chart.xd.level, 21);
    }

    #[test]
    fn test_dangling_difficulty_reference() {
        let map = map_from(&[
            (
                TRACK_INFO_KEY,
                minimal_track_info(json!([{ "assetName": "GHOST" }])),
            ),
            (CLIP_INFO_KEY, clip_info()),
        ]);
        let err = project(&map, Path::new("/charts/a.srtb")).unwrap_err();
        assert!(matches!(
            err,
            SrtbError::MissingField(ref path) if path == "SO_TrackData_GHOST"
        ));
    }

    #[test]
    fn test_unknown_difficulty_type_is_ignored() {
        let map = map_from(&[
            (
                TRACK_INFO_KEY,
                minimal_track_info(json!([{ "assetName": "REMIX" }])),
            ),
            (CLIP_INFO_KEY, clip_info()),
            (
                "SO_TrackData_REMIX",
                json!({ "difficultyType": 9, "difficultyRating": 30 }),
            ),
        ]);

        let chart = project(&map, Path::new("/charts/a.srtb")).unwrap();
        for tier in DifficultyTier::ALL {
            assert_eq!(chart.difficulty(tier), DifficultySlot::default());
        }
    }

    #[test]
    fn test_missing_rating_defaults_to_zero() {
        let map = map_from(&[
            (
                TRACK_INFO_KEY,
                minimal_track_info(json!([{ "assetName": "N" }])),
            ),
            (CLIP_INFO_KEY, clip_info()),
            ("SO_TrackData_N", json!({ "difficultyType": 3 })),
        ]);

        let chart = project(&map, Path::new("/charts/a.srtb")).unwrap();
        assert!(chart.normal.defined);
        assert_eq!(chart.normal.level, 0);
    }

    #[test]
    fn test_tier_type_id_round_trip() {
        for tier in DifficultyTier::ALL {
            assert_eq!(DifficultyTier::from_type_id(tier.type_id()), Some(tier));
        }
        for id in [-1, 0, 1, 7, 100] {
            assert_eq!(DifficultyTier::from_type_id(id), None);
        }
    }

    #[test]
    fn test_active_flag_truthiness() {
        assert!(!is_truthy(&json!(false)));
        assert!(!is_truthy(&json!(0)));
        assert!(!is_truthy(&json!(null)));
        assert!(!is_truthy(&json!("")));
        assert!(is_truthy(&json!(true)));
        assert!(is_truthy(&json!(1)));
        assert!(is_truthy(&json!("yes")));
    }
}
