//! Disk I/O helpers: crash recovery, load, and atomic write.
//!
//! Every write goes to a temporary companion file first and is renamed over
//! the canonical file only after it reads back as valid JSON. The rename is
//! close to atomic on most platforms. On NTFS it's reliable; on FAT32 or
//! network shares there are no hard guarantees.

use crate::error::{Error, Result};
use crate::serializer::Serializer;
use serde_json::{Map, Value};
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

/// What [`recover`] found next to the canonical file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recovery {
    /// No temporary file, nothing to do.
    NoTempFile,
    /// A complete temporary file was renamed over the canonical file.
    Promoted,
    /// The temporary file holds a torn write. Left in place, canonical file
    /// untouched.
    TornWrite,
}

/// Companion staging path for `path`: `.tmp` goes in front of the last
/// extension (`db.json` -> `db.tmp.json`), or at the end if there is none
/// (`db` -> `db.tmp`).
pub fn tmp_path(path: &Path) -> PathBuf {
    match (path.file_stem(), path.extension()) {
        (Some(stem), Some(ext)) => {
            let mut name = stem.to_os_string();
            name.push(".tmp.");
            name.push(ext);
            path.with_file_name(name)
        }
        _ => {
            let mut name = path.as_os_str().to_os_string();
            name.push(".tmp");
            PathBuf::from(name)
        }
    }
}

/// Promote a leftover temporary file if it holds valid JSON.
pub fn recover<S: Serializer>(path: &Path, serializer: &S) -> Result<Recovery> {
    let tmp = tmp_path(path);
    let bytes = match fs::read(&tmp) {
        Ok(b) => b,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Recovery::NoTempFile),
        Err(e) => return Err(e.into()),
    };
    if !serializer.is_valid(&bytes) {
        return Ok(Recovery::TornWrite);
    }
    fs::rename(&tmp, path)?;
    Ok(Recovery::Promoted)
}

/// Read and decode the canonical file. `Ok(None)` if it is missing or empty;
/// malformed contents come back as [`Error::Deserialize`].
pub fn load<S: Serializer>(path: &Path, serializer: &S) -> Result<Option<Map<String, Value>>> {
    let bytes = match fs::read(path) {
        Ok(b) => b,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    if bytes.is_empty() {
        return Ok(None);
    }
    serializer.deserialize(&bytes).map(Some)
}

/// Write `bytes` to the temporary path, read them back, and rename over
/// `path` only if they still parse. On any failure the canonical file is
/// left as it was.
pub fn atomic_write<S: Serializer>(path: &Path, bytes: &[u8], serializer: &S) -> Result<()> {
    let tmp = tmp_path(path);
    {
        let mut file = fs::File::create(&tmp)?;
        file.write_all(bytes)?;
        file.sync_all()?;
    }
    if !tmp.exists() {
        return Err(Error::Io(format!(
            "temporary file {} missing after write",
            tmp.display()
        )));
    }
    let written = fs::read(&tmp)?;
    if !serializer.is_valid(&written) {
        return Err(Error::Verify(format!(
            "{} does not contain valid JSON",
            tmp.display()
        )));
    }
    fs::rename(&tmp, path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::serializer::JsonSerializer;

    #[test]
    fn tmp_path_inserts_before_extension() {
        assert_eq!(tmp_path(Path::new("db.json")), PathBuf::from("db.tmp.json"));
        assert_eq!(
            tmp_path(Path::new("data/x.y.json")),
            PathBuf::from("data/x.y.tmp.json")
        );
    }

    #[test]
    fn tmp_path_appends_without_extension() {
        assert_eq!(tmp_path(Path::new("db")), PathBuf::from("db.tmp"));
        assert_eq!(tmp_path(Path::new("./data/db")), PathBuf::from("./data/db.tmp"));
    }

    #[test]
    fn recover_without_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("db.json");
        let rec = recover(&path, &JsonSerializer::default()).unwrap();
        assert_eq!(rec, Recovery::NoTempFile);
        assert!(!path.exists());
    }

    #[test]
    fn recover_promotes_valid_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("db.json");
        fs::write(&path, r#"{"old": true}"#).unwrap();
        fs::write(tmp_path(&path), r#"{"new": true}"#).unwrap();

        let rec = recover(&path, &JsonSerializer::default()).unwrap();
        assert_eq!(rec, Recovery::Promoted);
        assert_eq!(fs::read_to_string(&path).unwrap(), r#"{"new": true}"#);
        assert!(!tmp_path(&path).exists());
    }

    #[test]
    fn recover_leaves_torn_write_alone() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("db.json");
        fs::write(&path, r#"{"old": true}"#).unwrap();
        fs::write(tmp_path(&path), r#"{"new": tr"#).unwrap();

        let rec = recover(&path, &JsonSerializer::default()).unwrap();
        assert_eq!(rec, Recovery::TornWrite);
        assert_eq!(fs::read_to_string(&path).unwrap(), r#"{"old": true}"#);
        assert!(tmp_path(&path).exists());
    }

    #[test]
    fn recover_reports_unreadable_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("db.json");
        fs::write(&path, r#"{"keep": 1}"#).unwrap();
        fs::create_dir(tmp_path(&path)).unwrap();

        let err = recover(&path, &JsonSerializer::default()).unwrap_err();
        assert!(matches!(err, Error::Io(_)));
        assert_eq!(fs::read_to_string(&path).unwrap(), r#"{"keep": 1}"#);
    }

    #[test]
    fn load_missing_or_empty_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("db.json");
        let ser = JsonSerializer::default();
        assert_eq!(load(&path, &ser).unwrap(), None);
        fs::write(&path, "").unwrap();
        assert_eq!(load(&path, &ser).unwrap(), None);
    }

    #[test]
    fn load_malformed_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("db.json");
        fs::write(&path, "{not json").unwrap();
        let err = load(&path, &JsonSerializer::default()).unwrap_err();
        assert!(matches!(err, Error::Deserialize(_)));
    }

    #[test]
    fn atomic_write_replaces_and_cleans_up() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("db.json");
        let ser = JsonSerializer::default();
        fs::write(&path, r#"{"v": 1}"#).unwrap();

        atomic_write(&path, br#"{"v": 2}"#, &ser).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), r#"{"v": 2}"#);
        assert!(!tmp_path(&path).exists());
    }

    #[test]
    fn atomic_write_refuses_invalid_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("db.json");
        fs::write(&path, r#"{"v": 1}"#).unwrap();

        let err = atomic_write(&path, b"{\"v\": ", &JsonSerializer::default()).unwrap_err();
        assert!(matches!(err, Error::Verify(_)));
        assert_eq!(fs::read_to_string(&path).unwrap(), r#"{"v": 1}"#);
    }

    #[test]
    fn atomic_write_into_missing_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nope").join("db.json");
        let err = atomic_write(&path, b"{}", &JsonSerializer::default()).unwrap_err();
        assert!(matches!(err, Error::Io(_)));
        assert!(!path.exists());
    }
}
