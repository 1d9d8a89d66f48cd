use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::chart::Chart;
use crate::error::SrtbError;

/// One chart file seen by the scanner, parsed or failed.
#[derive(Debug)]
pub struct ScannedChart {
    pub path: PathBuf,
    pub result: Result<Chart, SrtbError>,
}

fn is_chart_file(path: &Path) -> bool {
    path.extension()
        .and_then(|s| s.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("srtb"))
        .unwrap_or(false)
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(|s| s.to_str())
        .map(|name| name.starts_with('.'))
        .unwrap_or(false)
}

/// Parse every `*.srtb` file directly under `dir`.
///
/// Custom charts live flat in the game's chart directory, so the walk is
/// non-recursive. Each file is parsed independently; a corrupt chart is
/// reported in its own entry and never aborts the scan. Entries come
/// back in path order.
pub fn scan_charts(dir: &Path) -> Vec<ScannedChart> {
    let mut charts: Vec<ScannedChart> = Vec::new();

    for entry in WalkDir::new(dir)
        .max_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_map(Result::ok)
    {
        let path = entry.path();
        if !path.is_file() || is_hidden(path) || !is_chart_file(path) {
            continue;
        }
        let result = crate::load_path(path);
        if let Err(e) = &result {
            log::warn!("{}: {e}", path.display());
        }
        charts.push(ScannedChart {
            path: path.to_path_buf(),
            result,
        });
    }

    charts
}
