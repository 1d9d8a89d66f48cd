use std::path::Path;

use lofty::file::AudioFile;

use crate::chart::Chart;

const AUDIO_CLIP_DIR: &str = "AudioClips";
const CLIP_EXTENSIONS: [&str; 2] = ["mp3", "ogg"];

/// Probe the sidecar audio clip for a chart and return its duration in
/// whole seconds.
///
/// Tries `<base_dir>/AudioClips/<clip_asset_name>.mp3` then `.ogg`.
/// Returns `None` when no candidate exists or none is readable; the
/// duration is an enrichment, never a parse requirement.
pub fn resolve_duration(base_dir: &Path, clip_asset_name: &str) -> Option<u64> {
    for ext in CLIP_EXTENSIONS {
        let candidate = base_dir
            .join(AUDIO_CLIP_DIR)
            .join(format!("{clip_asset_name}.{ext}"));
        if !candidate.is_file() {
            continue;
        }
        match lofty::read_from_path(&candidate) {
            Ok(tagged) => return Some(tagged.properties().duration().as_secs()),
            Err(e) => log::debug!("unreadable audio clip {}: {e}", candidate.display()),
        }
    }
    None
}

/// Fill in `clip_duration_seconds` from the chart's own directory.
pub fn enrich(chart: &mut Chart) {
    if let Some(dir) = chart.source_path.parent() {
        chart.clip_duration_seconds = resolve_duration(dir, &chart.clip_asset_name);
    }
}
