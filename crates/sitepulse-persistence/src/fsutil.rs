//! File primitives shared by the stores.
//!
//! Replacing writes go through a tempfile in the target directory followed
//! by a rename, so readers never observe a partial file. Appends are a
//! single `write_all` of one line; the log store serializes appenders per
//! site, so lines never interleave.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;

use crate::error::{PersistenceError, Result};

/// Ensures the parent directory of `path` exists.
pub(crate) fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.exists() {
            fs::create_dir_all(parent).map_err(|source| PersistenceError::DirectoryError {
                path: parent.to_path_buf(),
                source,
            })?;
        }
    }
    Ok(())
}

/// Atomically replaces `path` with the JSON serialization of `value`.
pub(crate) fn replace_json<T: serde::Serialize>(path: &Path, value: &T) -> Result<()> {
    ensure_parent(path)?;

    let json = serde_json::to_string_pretty(value)?;
    let dir = path.parent().unwrap_or(Path::new("."));

    let mut temp =
        tempfile::NamedTempFile::new_in(dir).map_err(|source| PersistenceError::WriteError {
            path: path.to_path_buf(),
            source,
        })?;
    temp.write_all(json.as_bytes())
        .and_then(|_| temp.flush())
        .map_err(|source| PersistenceError::WriteError {
            path: path.to_path_buf(),
            source,
        })?;
    temp.persist(path).map_err(|e| PersistenceError::WriteError {
        path: path.to_path_buf(),
        source: e.error,
    })?;

    Ok(())
}

/// Loads JSON from `path`, returning `None` when the file does not exist.
pub(crate) fn load_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    if !path.exists() {
        return Ok(None);
    }
    let data = fs::read_to_string(path).map_err(|source| PersistenceError::ReadError {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(Some(serde_json::from_str(&data)?))
}

/// Appends one JSON line to `path`, creating it (and parents) on first use.
pub(crate) fn append_json_line<T: serde::Serialize>(path: &Path, value: &T) -> Result<()> {
    ensure_parent(path)?;

    let mut line = serde_json::to_string(value)?;
    line.push('\n');

    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|source| PersistenceError::WriteError {
            path: path.to_path_buf(),
            source,
        })?;
    file.write_all(line.as_bytes())
        .map_err(|source| PersistenceError::WriteError {
            path: path.to_path_buf(),
            source,
        })?;

    Ok(())
}

/// Reads every parseable JSON line from `path`.
///
/// Malformed lines are counted and skipped rather than failing the read; a
/// truncated trailing line from a crash must not poison the whole day.
pub(crate) fn read_json_lines<T: serde::de::DeserializeOwned>(
    path: &Path,
) -> Result<(Vec<T>, usize)> {
    let data = fs::read_to_string(path).map_err(|source| PersistenceError::ReadError {
        path: path.to_path_buf(),
        source,
    })?;

    let mut values = Vec::new();
    let mut skipped = 0;
    for line in data.lines() {
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str(line) {
            Ok(value) => values.push(value),
            Err(_) => skipped += 1,
        }
    }
    Ok((values, skipped))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};
    use tempfile::tempdir;

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct Row {
        n: u32,
    }

    #[test]
    fn test_replace_json_creates_parents() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("a/b/state.json");

        replace_json(&path, &Row { n: 1 }).unwrap();

        let loaded: Option<Row> = load_json(&path).unwrap();
        assert_eq!(loaded, Some(Row { n: 1 }));
    }

    #[test]
    fn test_load_json_missing_is_none() {
        let dir = tempdir().unwrap();
        let loaded: Option<Row> = load_json(&dir.path().join("missing.json")).unwrap();
        assert!(loaded.is_none());
    }

    #[test]
    fn test_append_then_read_lines() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("rows.jsonl");

        for n in 0..3 {
            append_json_line(&path, &Row { n }).unwrap();
        }

        let (rows, skipped): (Vec<Row>, usize) = read_json_lines(&path).unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(skipped, 0);
        assert_eq!(rows[2], Row { n: 2 });
    }

    #[test]
    fn test_malformed_line_is_skipped() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("rows.jsonl");

        append_json_line(&path, &Row { n: 1 }).unwrap();
        std::fs::write(
            &path,
            format!("{}{{truncated", std::fs::read_to_string(&path).unwrap()),
        )
        .unwrap();

        let (rows, skipped): (Vec<Row>, usize) = read_json_lines(&path).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(skipped, 1);
    }
}
