//! Disk-backed cache store
//!
//! Persists each entry as its own file in an XDG-compliant cache directory so
//! cached API responses survive between runs of the CLI.

use directories::ProjectDirs;
use sha2::{Digest, Sha256};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use super::CacheStore;

/// Distinguishes temp files of concurrent writers within one process
static TEMP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Stores cache entries as files in a directory
///
/// Keys are request URLs, so file names are the hex SHA-256 of the key.
/// I/O failures are logged and otherwise behave like a miss or a no-op.
#[derive(Debug, Clone)]
pub struct DiskStore {
    /// Directory where cache files are stored
    cache_dir: PathBuf,
}

impl DiskStore {
    /// Creates a new DiskStore using the XDG-compliant cache directory
    ///
    /// Uses `~/.cache/fingerbank/` on Linux, or the platform equivalent.
    /// Returns `None` if the cache directory cannot be determined (e.g., no home directory).
    pub fn new() -> Option<Self> {
        let project_dirs = ProjectDirs::from("", "", "fingerbank")?;
        let cache_dir = project_dirs.cache_dir().to_path_buf();
        Some(Self { cache_dir })
    }

    /// Creates a new DiskStore with a custom cache directory
    pub fn with_dir(cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            cache_dir: cache_dir.into(),
        }
    }

    /// Directory holding the cache files
    pub fn dir(&self) -> &Path {
        &self.cache_dir
    }

    /// Returns the path of the file holding the given key
    fn cache_path(&self, key: &str) -> PathBuf {
        let digest = Sha256::digest(key.as_bytes());
        self.cache_dir.join(format!("{}.json", hex::encode(digest)))
    }

    /// Returns a unique sibling path to stage a write to `path`
    ///
    /// Staging in the same directory keeps the final rename on one filesystem.
    fn temp_path(&self, path: &Path) -> PathBuf {
        let n = TEMP_COUNTER.fetch_add(1, Ordering::Relaxed);
        let mut name = path.file_name().unwrap_or_default().to_os_string();
        name.push(format!(".tmp-{}-{}", std::process::id(), n));
        path.with_file_name(name)
    }
}

impl CacheStore for DiskStore {
    fn get(&self, key: &str) -> Option<Vec<u8>> {
        let path = self.cache_path(key);
        match fs::read(&path) {
            Ok(data) => Some(data),
            Err(e) if e.kind() == ErrorKind::NotFound => None,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "failed to read cache file");
                None
            }
        }
    }

    fn set(&self, key: &str, value: &[u8]) {
        let path = self.cache_path(key);
        let tmp_path = self.temp_path(&path);

        // Readers only ever see a complete file: write aside, then rename over.
        let result = fs::create_dir_all(&self.cache_dir)
            .and_then(|_| fs::write(&tmp_path, value))
            .and_then(|_| fs::rename(&tmp_path, &path));

        if let Err(e) = result {
            tracing::warn!(path = %path.display(), error = %e, "failed to write cache file");
            let _ = fs::remove_file(&tmp_path);
        }
    }

    fn delete(&self, key: &str) {
        let path = self.cache_path(key);
        match fs::remove_file(&path) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "failed to remove cache file");
            }
        }
    }

    fn name(&self) -> &'static str {
        "disk"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_test_store() -> (DiskStore, TempDir) {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let store = DiskStore::with_dir(temp_dir.path());
        (store, temp_dir)
    }

    #[test]
    fn test_set_creates_file_in_cache_directory() {
        let (store, temp_dir) = create_test_store();

        store.set("https://api.example/devices/1", b"{\"status_code\":200}");

        let files: Vec<_> = fs::read_dir(temp_dir.path())
            .expect("Should list cache dir")
            .collect();
        assert_eq!(files.len(), 1, "Exactly one cache file should exist");

        let name = files[0].as_ref().unwrap().file_name();
        let name = name.to_string_lossy();
        assert!(name.ends_with(".json"));
        assert_eq!(name.len(), 64 + ".json".len(), "File name should be a sha256 hex digest");
    }

    #[test]
    fn test_get_returns_none_for_missing_key() {
        let (store, _temp_dir) = create_test_store();
        assert!(store.get("nonexistent_key").is_none());
    }

    #[test]
    fn test_set_then_get_roundtrip() {
        let (store, _temp_dir) = create_test_store();

        store.set("k", b"payload");

        assert_eq!(store.get("k"), Some(b"payload".to_vec()));
    }

    #[test]
    fn test_overwrite_existing_entry() {
        let (store, _temp_dir) = create_test_store();

        store.set("k", b"first");
        store.set("k", b"second");

        assert_eq!(store.get("k"), Some(b"second".to_vec()));
    }

    #[test]
    fn test_delete_removes_entry() {
        let (store, _temp_dir) = create_test_store();

        store.set("k", b"payload");
        store.delete("k");

        assert!(store.get("k").is_none());
    }

    #[test]
    fn test_delete_missing_key_is_noop() {
        let (store, _temp_dir) = create_test_store();
        store.delete("never-set");
        assert!(store.get("never-set").is_none());
    }

    #[test]
    fn test_set_creates_directory_if_missing() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let nested_path = temp_dir.path().join("nested").join("cache").join("dir");
        let store = DiskStore::with_dir(nested_path.clone());

        store.set("nested_key", b"1");

        assert!(nested_path.exists(), "Nested directory should be created");
        assert_eq!(store.get("nested_key"), Some(b"1".to_vec()));
    }

    #[test]
    fn test_distinct_keys_use_distinct_files() {
        let (store, _temp_dir) = create_test_store();

        store.set("https://api.example/devices/1", b"one");
        store.set("https://api.example/devices/2", b"two");

        assert_eq!(store.get("https://api.example/devices/1"), Some(b"one".to_vec()));
        assert_eq!(store.get("https://api.example/devices/2"), Some(b"two".to_vec()));
    }

    #[test]
    fn test_concurrent_reads_never_see_partial_writes() {
        use std::sync::atomic::AtomicBool;
        use std::sync::Arc;
        use std::thread;

        const SIZE: usize = 4 * 1024 * 1024;

        let (store, _temp_dir) = create_test_store();
        let store = Arc::new(store);
        let done = Arc::new(AtomicBool::new(false));

        let writer = {
            let store = Arc::clone(&store);
            let done = Arc::clone(&done);
            thread::spawn(move || {
                let payloads = [vec![b'a'; SIZE], vec![b'b'; SIZE]];
                for i in 0..50 {
                    store.set("k", &payloads[i % 2]);
                }
                done.store(true, Ordering::SeqCst);
            })
        };

        let mut reads = 0;
        while !done.load(Ordering::SeqCst) {
            if let Some(data) = store.get("k") {
                reads += 1;
                assert_eq!(data.len(), SIZE, "Read a partially written entry");
                assert!(
                    data.iter().all(|&b| b == data[0]),
                    "Read a mix of two writes"
                );
            }
        }
        writer.join().expect("Writer thread panicked");

        assert_eq!(store.get("k").map(|d| d.len()), Some(SIZE));
        tracing::debug!(reads, "concurrent reads checked");
    }

    #[test]
    fn test_set_leaves_no_temp_files() {
        let (store, temp_dir) = create_test_store();

        store.set("k", b"first");
        store.set("k", b"second");

        let names: Vec<String> = fs::read_dir(temp_dir.path())
            .expect("Should list cache dir")
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names.len(), 1);
        assert!(names[0].ends_with(".json"), "Unexpected file {}", names[0]);
    }

    #[test]
    fn test_new_creates_xdg_compliant_path() {
        if let Some(store) = DiskStore::new() {
            let path_str = store.dir().to_string_lossy();
            assert!(
                path_str.contains("fingerbank"),
                "Cache path should contain project name"
            );
        }
        // Test passes if new() returns None (e.g., no home directory in CI)
    }
}
