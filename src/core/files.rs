//! File access for documents and generated artifacts.
//!
//! Reads normalize line endings to LF so every parser sees one convention.
//! Writes replace the whole file through a sibling temp file and a rename,
//! so a reader observes either the old or the new content.

use crate::core::error::CanonError;
use std::fs;
use std::io::Write;
use std::path::Path;

pub fn read_text(path: &Path) -> Result<String, CanonError> {
    let raw = fs::read_to_string(path)?;
    Ok(normalize_newlines(raw))
}

/// `None` when the file does not exist; other I/O failures still propagate.
pub fn read_optional(path: &Path) -> Result<Option<String>, CanonError> {
    match fs::read_to_string(path) {
        Ok(raw) => Ok(Some(normalize_newlines(raw))),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(CanonError::IoError(e)),
    }
}

pub fn normalize_newlines(raw: String) -> String {
    if raw.contains('\r') {
        raw.replace("\r\n", "\n").replace('\r', "\n")
    } else {
        raw
    }
}

/// Replace `path` with `content` unless it already matches. Returns whether it wrote.
pub fn write_if_changed(path: &Path, content: &str) -> Result<bool, CanonError> {
    let content = normalize_newlines(content.to_string());
    if read_optional(path)?.as_deref() == Some(content.as_str()) {
        return Ok(false);
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(|| CanonError::NotFound(format!("file name in {}", path.display())))?;
    let tmp_path = path.with_file_name(format!(".{}.tmp", file_name));
    {
        let mut tmp = fs::File::create(&tmp_path)?;
        tmp.write_all(content.as_bytes())?;
        tmp.sync_all()?;
    }
    if let Err(e) = fs::rename(&tmp_path, path) {
        let _ = fs::remove_file(&tmp_path);
        return Err(CanonError::IoError(e));
    }
    tracing::info!(path = %path.display(), "wrote generated file");
    Ok(true)
}
