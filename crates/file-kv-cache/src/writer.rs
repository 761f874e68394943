//! Atomic file persistence
//!
//! Bytes go to a uniquely named sibling first and are renamed over the
//! target, so readers only ever open a complete file.

use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::warn;
use uuid::Uuid;

/// `<target file name>-<uuid>` in the target's directory
pub fn temp_path_for(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(OsString::from)
        .unwrap_or_default();
    name.push(format!("-{}", Uuid::new_v4()));
    path.with_file_name(name)
}

/// Write `bytes` to `path` via temp file and rename
pub fn write_atomic(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let tmp = temp_path_for(path);

    if let Err(e) = fs::write(&tmp, bytes) {
        discard(&tmp);
        return Err(e);
    }

    if let Err(e) = fs::rename(&tmp, path) {
        discard(&tmp);
        return Err(e);
    }

    Ok(())
}

fn discard(tmp: &Path) {
    if let Err(e) = fs::remove_file(tmp) {
        if e.kind() != io::ErrorKind::NotFound {
            warn!(path = ?tmp, error = %e, "Failed to remove temp file");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_temp_path_is_sibling_with_unique_suffix() {
        let target = Path::new("/cache/ab/cd/abcd.cache");
        let a = temp_path_for(target);
        let b = temp_path_for(target);

        assert_eq!(a.parent(), target.parent());
        assert!(a
            .file_name()
            .unwrap()
            .to_str()
            .unwrap()
            .starts_with("abcd.cache-"));
        assert_ne!(a, b);
    }

    #[test]
    fn test_write_atomic_creates_and_replaces() {
        let dir = tempdir().unwrap();
        let target = dir.path().join("entry.cache");

        write_atomic(&target, b"first").unwrap();
        assert_eq!(fs::read(&target).unwrap(), b"first");

        write_atomic(&target, b"second").unwrap();
        assert_eq!(fs::read(&target).unwrap(), b"second");

        // Only the target remains, no temp files left behind
        let names: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(names, vec![OsString::from("entry.cache")]);
    }

    #[test]
    fn test_write_atomic_missing_directory_fails_cleanly() {
        let dir = tempdir().unwrap();
        let target = dir.path().join("missing").join("entry.cache");

        assert!(write_atomic(&target, b"data").is_err());
        assert!(!target.exists());
        assert!(!dir.path().join("missing").exists());
    }

    #[test]
    fn test_rename_failure_removes_temp_file() {
        let dir = tempdir().unwrap();
        // A non-empty directory at the target path makes the rename fail
        let target = dir.path().join("entry.cache");
        fs::create_dir(&target).unwrap();
        fs::write(target.join("occupied"), b"x").unwrap();

        assert!(write_atomic(&target, b"data").is_err());

        let leftovers = fs::read_dir(dir.path())
            .unwrap()
            .filter(|e| e.as_ref().unwrap().file_name() != "entry.cache")
            .count();
        assert_eq!(leftovers, 0);
    }
}
