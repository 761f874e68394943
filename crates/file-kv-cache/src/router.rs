//! Key to shard path routing

use crate::types::ShardPath;
use sha2::{Digest, Sha256};
use std::path::Path;

const ENTRY_SUFFIX: &str = ".cache";

/// Lowercase hex digest of the raw key bytes
pub fn key_digest(key: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(key.as_bytes());
    hex::encode(hasher.finalize())
}

/// Map a key to `<root>/<hex[0:2]>/<hex[2:4]>/<hex>.cache`
pub fn path_for(root: &Path, key: &str) -> ShardPath {
    let digest = key_digest(key);
    let directory = root.join(&digest[0..2]).join(&digest[2..4]);
    let file_path = directory.join(format!("{}{}", digest, ENTRY_SUFFIX));
    ShardPath {
        directory,
        file_path,
    }
}

pub(crate) fn is_entry_file(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(|n| n.ends_with(ENTRY_SUFFIX))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_path_is_deterministic() {
        let root = PathBuf::from("/cache");
        assert_eq!(path_for(&root, "user/10"), path_for(&root, "user/10"));
    }

    #[test]
    fn test_distinct_keys_get_distinct_files() {
        let root = PathBuf::from("/cache");
        let a = path_for(&root, "user/10");
        let b = path_for(&root, "user/11");
        assert_ne!(a.file_path, b.file_path);
    }

    #[test]
    fn test_path_shape() {
        let root = PathBuf::from("/cache");
        let digest = key_digest("user/10");
        let shard = path_for(&root, "user/10");

        assert_eq!(digest.len(), 64);
        assert!(digest
            .chars()
            .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c)));

        let relative = shard.directory.strip_prefix(&root).unwrap();
        let levels: Vec<_> = relative.iter().map(|c| c.to_str().unwrap()).collect();
        assert_eq!(levels, vec![&digest[0..2], &digest[2..4]]);

        assert_eq!(shard.file_path.parent(), Some(shard.directory.as_path()));
        assert_eq!(
            shard.file_path.file_name().unwrap().to_str().unwrap(),
            format!("{}.cache", digest)
        );
    }

    #[test]
    fn test_hostile_keys_stay_under_root() {
        let root = PathBuf::from("/cache");
        for key in ["../../etc/passwd", "/absolute", "a\0b", "with\nnewline"] {
            let shard = path_for(&root, key);
            assert!(shard.file_path.starts_with(&root));
            assert_eq!(shard.file_path.strip_prefix(&root).unwrap().iter().count(), 3);
        }
    }

    #[test]
    fn test_is_entry_file() {
        assert!(is_entry_file(Path::new("/cache/ab/cd/abcd.cache")));
        assert!(!is_entry_file(Path::new(
            "/cache/ab/cd/abcd.cache-2f1c9e0a-0000-4000-8000-000000000000"
        )));
    }
}
