use log::debug;
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;

use crate::errors::StoreResult;

use super::KeyValueStore;

/// Durable store keeping one `<key>.json` file per key under a data directory.
///
/// Keys are percent-encoded into file names, so distinct keys never share a
/// file and no key can address a path outside the directory.
///
/// Writes land in a temporary sibling file first and are renamed into place,
/// so a crash mid-write leaves the previous value intact. Concurrent processes
/// sharing the directory are not coordinated: the last writer wins.
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.root.join(format!("{}.json", urlencoding::encode(key)))
    }
}

impl KeyValueStore for FileStore {
    fn get_raw(&self, key: &str) -> StoreResult<Option<String>> {
        match fs::read_to_string(self.path_for(key)) {
            Ok(text) => Ok(Some(text)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    fn set_raw(&self, key: &str, value: &str) -> StoreResult<()> {
        fs::create_dir_all(&self.root)?;
        let path = self.path_for(key);
        let tmp_path = path.with_extension("json.tmp");
        fs::write(&tmp_path, value)?;
        fs::rename(&tmp_path, &path)?;
        debug!("[Store] Wrote {} bytes to {}", value.len(), path.display());
        Ok(())
    }

    fn remove(&self, key: &str) -> StoreResult<()> {
        match fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{KeyValueStoreExt, OFFLINE_QUEUE_KEY};

    #[test]
    fn values_survive_a_new_handle() {
        let dir = tempfile::tempdir().unwrap();
        FileStore::new(dir.path())
            .write(OFFLINE_QUEUE_KEY, &vec!["a", "b"])
            .unwrap();

        let reopened = FileStore::new(dir.path());
        let queue: Vec<String> = reopened.read_or(OFFLINE_QUEUE_KEY, Vec::new());
        assert_eq!(queue, vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn creates_missing_data_directory() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("state").join("punchclock");
        let store = FileStore::new(&nested);
        store.set_raw("api_base", "null").unwrap();
        assert!(nested.join("api_base.json").exists());
    }

    #[test]
    fn missing_file_reads_as_none_and_remove_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());
        assert_eq!(store.get_raw("api_override").unwrap(), None);
        store.remove("api_override").unwrap();
    }

    #[test]
    fn unsafe_key_characters_stay_inside_root() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());
        store.set_raw("../escape", "1").unwrap();
        assert!(dir.path().join("..%2Fescape.json").exists());
        assert_eq!(store.get_raw("../escape").unwrap().as_deref(), Some("1"));
    }

    #[test]
    fn similar_keys_use_distinct_files() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());
        store.set_raw("a.b", "1").unwrap();
        store.set_raw("a_b", "2").unwrap();
        store.set_raw("a/b", "3").unwrap();

        assert_eq!(store.get_raw("a.b").unwrap().as_deref(), Some("1"));
        assert_eq!(store.get_raw("a_b").unwrap().as_deref(), Some("2"));
        assert_eq!(store.get_raw("a/b").unwrap().as_deref(), Some("3"));
    }

    #[test]
    fn corrupt_file_falls_back_to_default() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("offlineUsers.json"), "{{{").unwrap();
        let store = FileStore::new(dir.path());
        let users: std::collections::BTreeMap<String, String> =
            store.read_or("offlineUsers", Default::default());
        assert!(users.is_empty());
    }
}
