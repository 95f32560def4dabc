use std::fs;
use std::path::{Path, PathBuf};

use super::pcap_engine::CaptureError;

/// Lists regular files directly inside `dir` whose extension equals `ext`
/// (without the leading dot). Not recursive. Sorted by file name so runs are
/// reproducible.
pub fn find_capture_files(dir: &Path, ext: &str) -> Result<Vec<PathBuf>, CaptureError> {
    let ext = ext.trim_start_matches('.');
    let entries = fs::read_dir(dir).map_err(|e| CaptureError::Discovery(dir.to_path_buf(), e))?;

    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| CaptureError::Discovery(dir.to_path_buf(), e))?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        if path.extension().and_then(|e| e.to_str()) == Some(ext) {
            files.push(path);
        }
    }

    files.sort();
    Ok(files)
}

/// Trace name shown to the user: the file name without directories.
pub fn trace_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
