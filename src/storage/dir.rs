//! File-per-key storage in a single directory

use std::fs::{self, DirEntry};
use std::io;
use std::path::{Path, PathBuf};
use tracing::warn;

use super::KvStore;

/// Extension of every file managed by a `DirStore`
const EXTENSION: &str = "json";

/// Stores each key as `<dir>/<key>.json`
///
/// The directory is created lazily on the first write, so constructing a
/// `DirStore` never touches the filesystem.
#[derive(Debug, Clone)]
pub struct DirStore {
    dir: PathBuf,
}

impl DirStore {
    /// Creates a store rooted at `dir`
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Directory holding the files
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Creates the directory if it does not exist yet
    pub fn ensure_dir(&self) -> io::Result<()> {
        fs::create_dir_all(&self.dir)
    }

    fn path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.{}", key, EXTENSION))
    }
}

/// Key of a directory entry, `None` for foreign files and unreadable entries
fn entry_key(entry: io::Result<DirEntry>) -> Option<String> {
    let path = match entry {
        Ok(entry) => entry.path(),
        Err(e) => {
            warn!(error = %e, "skipping unreadable directory entry");
            return None;
        }
    };
    if !path.is_file() || path.extension().and_then(|e| e.to_str()) != Some(EXTENSION) {
        return None;
    }
    path.file_stem().and_then(|s| s.to_str()).map(str::to_string)
}

fn not_found_as_none<T>(result: io::Result<T>) -> io::Result<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e),
    }
}

impl KvStore for DirStore {
    fn get(&self, key: &str) -> io::Result<Option<Vec<u8>>> {
        not_found_as_none(fs::read(self.path(key)))
    }

    fn put(&self, key: &str, value: &[u8]) -> io::Result<()> {
        self.ensure_dir()?;
        fs::write(self.path(key), value)
    }

    fn delete(&self, key: &str) -> io::Result<bool> {
        Ok(not_found_as_none(fs::remove_file(self.path(key)))?.is_some())
    }

    fn list_keys(&self) -> io::Result<Vec<String>> {
        let Some(entries) = not_found_as_none(fs::read_dir(&self.dir))? else {
            return Ok(Vec::new());
        };

        let mut keys: Vec<String> = entries.filter_map(entry_key).collect();
        keys.sort();
        Ok(keys)
    }

    fn size_of(&self, key: &str) -> io::Result<Option<u64>> {
        Ok(not_found_as_none(fs::metadata(self.path(key)))?.map(|m| m.len()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_test_store() -> (DirStore, TempDir) {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let store = DirStore::new(temp_dir.path());
        (store, temp_dir)
    }

    #[test]
    fn test_put_creates_json_file() {
        let (store, temp_dir) = create_test_store();

        store.put("abc", b"{\"x\":1}").expect("Put should succeed");

        let expected_path = temp_dir.path().join("abc.json");
        assert!(expected_path.exists(), "Store file should exist");
        assert_eq!(fs::read(expected_path).unwrap(), b"{\"x\":1}");
    }

    #[test]
    fn test_get_missing_key_is_none() {
        let (store, _temp_dir) = create_test_store();

        assert!(store.get("missing").unwrap().is_none());
        assert!(store.size_of("missing").unwrap().is_none());
    }

    #[test]
    fn test_delete_reports_whether_file_existed() {
        let (store, _temp_dir) = create_test_store();
        store.put("gone", b"1").unwrap();

        assert!(store.delete("gone").unwrap());
        assert!(!store.delete("gone").unwrap());
        assert!(store.get("gone").unwrap().is_none());
    }

    #[test]
    fn test_list_keys_ignores_foreign_files() {
        let (store, temp_dir) = create_test_store();
        store.put("b", b"2").unwrap();
        store.put("a", b"1").unwrap();
        fs::write(temp_dir.path().join("notes.txt"), "hello").unwrap();
        fs::create_dir(temp_dir.path().join("sub.json")).unwrap();

        assert_eq!(store.list_keys().unwrap(), vec!["a", "b"]);
    }

    #[test]
    fn test_unreadable_entry_is_skipped() {
        let err = io::Error::new(io::ErrorKind::PermissionDenied, "denied");
        assert!(entry_key(Err(err)).is_none());
    }

    #[test]
    fn test_list_keys_survives_dangling_links() {
        let (store, temp_dir) = create_test_store();
        store.put("kept", b"1").unwrap();
        #[cfg(unix)]
        std::os::unix::fs::symlink(
            temp_dir.path().join("missing-target"),
            temp_dir.path().join("dangling.json"),
        )
        .unwrap();

        assert_eq!(store.list_keys().unwrap(), vec!["kept"]);
    }

    #[test]
    fn test_missing_directory_behaves_as_empty() {
        let temp_dir = TempDir::new().unwrap();
        let store = DirStore::new(temp_dir.path().join("not").join("yet"));

        assert!(store.list_keys().unwrap().is_empty());
        assert!(store.get("k").unwrap().is_none());
        assert!(!store.delete("k").unwrap());
    }

    #[test]
    fn test_put_creates_nested_directory() {
        let temp_dir = TempDir::new().unwrap();
        let nested = temp_dir.path().join("nested").join("dir");
        let store = DirStore::new(nested.clone());

        store.put("k", b"v").unwrap();

        assert!(nested.join("k.json").exists());
        assert_eq!(store.size_of("k").unwrap(), Some(1));
    }
}
