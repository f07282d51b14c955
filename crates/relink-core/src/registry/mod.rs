//! Link registry for tracking created symlinks.
//!
//! Maintains one record per link path so later listings, status checks and
//! deletions can be compared against the live filesystem.
//!
//! Every mutation builds the next document, saves it through the store and
//! only then replaces the in-memory copy, so a failed save leaves both the
//! file and the registry unchanged. There is no cross-process locking: two
//! processes mutating the same file race, and the last writer wins.

mod atomic;
mod record;
mod store;

pub use atomic::{atomic_write, backup_path};
pub use record::{LinkRecord, RegistryDocument};
pub use store::{parse_document, render_document, LoadStatus, RegistryStore, TomlFileStore};

use crate::error::Result;
use crate::link::LinkKind;
use crate::paths;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Durable set of link records keyed by canonical link path.
pub struct LinkRegistry {
    store: Box<dyn RegistryStore>,
    document: RegistryDocument,
    load_status: LoadStatus,
}

impl LinkRegistry {
    /// Load the registry from `store`.
    ///
    /// Duplicate keys left by older tools or hand edits collapse to the last
    /// record for each key.
    pub fn open(store: Box<dyn RegistryStore>) -> Self {
        let (mut document, load_status) = store.load();
        let before = document.links.len();
        document.links = dedupe(document.links);
        if document.links.len() != before {
            warn!(
                "Collapsed {} duplicate records in {}",
                before - document.links.len(),
                store.location().display()
            );
        }

        Self {
            store,
            document,
            load_status,
        }
    }

    /// Open a TOML registry file.
    pub fn open_file(path: impl Into<PathBuf>, keep_backup: bool) -> Self {
        Self::open(Box::new(TomlFileStore::new(path).with_backup(keep_backup)))
    }

    pub fn load_status(&self) -> &LoadStatus {
        &self.load_status
    }

    pub fn location(&self) -> PathBuf {
        self.store.location()
    }

    pub fn version(&self) -> u32 {
        self.document.config_version
    }

    /// Record that `link` resolves to `target`, replacing any record for the
    /// same link.
    pub fn upsert(&mut self, link: &Path, target: &Path, kind: LinkKind) -> Result<LinkRecord> {
        let link = paths::absolutize(link)?;
        let key = paths::canonical_key(&link);
        let record = LinkRecord::new(link, target, kind);

        let mut next = self.document.clone();
        match next
            .links
            .iter_mut()
            .find(|existing| paths::canonical_key(&existing.link) == key)
        {
            Some(existing) => {
                existing.target = record.target.clone();
                existing.kind = record.kind;
                existing.created_at = record.created_at;
            }
            None => next.links.push(record.clone()),
        }

        self.commit(next)?;
        debug!("Recorded link {} -> {}", record.link.display(), record.target.display());
        Ok(self
            .get(&record.link)
            .cloned()
            .unwrap_or(record))
    }

    /// Remove the record for `link`. Returns whether one existed.
    pub fn remove(&mut self, link: &Path) -> Result<bool> {
        let key = paths::canonical_key(&paths::absolutize(link)?);
        let mut next = self.document.clone();
        let before = next.links.len();
        next.links
            .retain(|record| paths::canonical_key(&record.link) != key);
        if next.links.len() == before {
            return Ok(false);
        }

        self.commit(next)?;
        debug!("Removed record for {}", link.display());
        Ok(true)
    }

    /// Keep only records matching `keep`; returns the removed ones.
    pub fn retain<F>(&mut self, mut keep: F) -> Result<Vec<LinkRecord>>
    where
        F: FnMut(&LinkRecord) -> bool,
    {
        let (kept, removed): (Vec<_>, Vec<_>) =
            self.document.links.iter().cloned().partition(|r| keep(r));
        if removed.is_empty() {
            return Ok(removed);
        }

        let next = RegistryDocument {
            config_version: self.document.config_version,
            links: kept,
        };
        self.commit(next)?;
        Ok(removed)
    }

    /// Snapshot of all records in insertion order.
    pub fn list(&self) -> &[LinkRecord] {
        &self.document.links
    }

    pub fn get(&self, link: &Path) -> Option<&LinkRecord> {
        let key = paths::canonical_key(link);
        self.document
            .links
            .iter()
            .find(|record| paths::canonical_key(&record.link) == key)
    }

    pub fn len(&self) -> usize {
        self.document.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.document.links.is_empty()
    }

    fn commit(&mut self, mut next: RegistryDocument) -> Result<()> {
        next.config_version = crate::config::RegistryConfig::CURRENT_VERSION;
        self.store.save(&next)?;
        self.document = next;
        Ok(())
    }
}

impl std::fmt::Debug for LinkRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LinkRegistry")
            .field("location", &self.store.location())
            .field("records", &self.document.links.len())
            .finish()
    }
}

/// Keep the last record per canonical key, preserving first-seen order.
fn dedupe(records: Vec<LinkRecord>) -> Vec<LinkRecord> {
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut out: Vec<LinkRecord> = Vec::with_capacity(records.len());
    for record in records {
        let key = paths::canonical_key(&record.link);
        match index.get(&key) {
            Some(&slot) => out[slot] = record,
            None => {
                index.insert(key, out.len());
                out.push(record);
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RelinkError;
    use std::fs;
    use std::io;
    use std::sync::{Arc, Mutex};
    use tempfile::TempDir;

    fn setup_registry() -> (TempDir, LinkRegistry) {
        let temp_dir = TempDir::new().unwrap();
        let registry = LinkRegistry::open_file(temp_dir.path().join("links.toml"), false);
        (temp_dir, registry)
    }

    /// Store that keeps the document in memory and can be told to fail.
    #[derive(Clone, Default)]
    struct FlakyStore {
        saved: Arc<Mutex<Option<RegistryDocument>>>,
        fail: Arc<Mutex<bool>>,
    }

    impl RegistryStore for FlakyStore {
        fn load(&self) -> (RegistryDocument, LoadStatus) {
            (RegistryDocument::default(), LoadStatus::Missing)
        }

        fn save(&self, document: &RegistryDocument) -> Result<()> {
            if *self.fail.lock().unwrap() {
                return Err(RelinkError::from(io::Error::new(
                    io::ErrorKind::Other,
                    "disk full",
                )));
            }
            *self.saved.lock().unwrap() = Some(document.clone());
            Ok(())
        }

        fn location(&self) -> PathBuf {
            PathBuf::from("memory")
        }
    }

    #[test]
    fn test_upsert_and_get() {
        let (temp, mut registry) = setup_registry();
        let link = temp.path().join("app");

        let record = registry
            .upsert(&link, Path::new("/archive/app"), LinkKind::Directory)
            .unwrap();
        assert_eq!(record.target, PathBuf::from("/archive/app"));
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get(&record.link).unwrap().kind, LinkKind::Directory);
    }

    #[test]
    fn test_upsert_replaces_existing_record() {
        let (temp, mut registry) = setup_registry();
        let link = temp.path().join("app");

        registry
            .upsert(&link, Path::new("/t1"), LinkKind::Directory)
            .unwrap();
        registry.upsert(&link, Path::new("/t2"), LinkKind::File).unwrap();

        assert_eq!(registry.len(), 1);
        let record = &registry.list()[0];
        assert_eq!(record.target, PathBuf::from("/t2"));
        assert_eq!(record.kind, LinkKind::File);
    }

    #[test]
    fn test_upsert_matches_dotted_spelling() {
        let (temp, mut registry) = setup_registry();
        let link = temp.path().join("app");
        let dotted = temp.path().join("x").join("..").join("app");

        registry.upsert(&link, Path::new("/t1"), LinkKind::File).unwrap();
        registry.upsert(&dotted, Path::new("/t2"), LinkKind::File).unwrap();
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_remove() {
        let (temp, mut registry) = setup_registry();
        let link = temp.path().join("app");
        registry.upsert(&link, Path::new("/t"), LinkKind::File).unwrap();

        assert!(registry.remove(&link).unwrap());
        assert!(!registry.remove(&link).unwrap());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_persistence_round_trip() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("links.toml");

        let written: Vec<LinkRecord> = {
            let mut registry = LinkRegistry::open_file(&path, false);
            for i in 0..5 {
                let kind = if i % 2 == 0 {
                    LinkKind::Directory
                } else {
                    LinkKind::File
                };
                registry
                    .upsert(
                        &temp_dir.path().join(format!("link{i}")),
                        &temp_dir.path().join(format!("target \"{i}\"")),
                        kind,
                    )
                    .unwrap();
            }
            registry.list().to_vec()
        };

        let registry = LinkRegistry::open_file(&path, false);
        assert!(matches!(registry.load_status(), LoadStatus::Loaded));
        assert_eq!(registry.list(), written.as_slice());
    }

    #[test]
    fn test_corrupt_file_loads_empty_and_is_overwritten_on_save() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("links.toml");
        fs::write(&path, "this is [not toml").unwrap();

        let mut registry = LinkRegistry::open_file(&path, false);
        assert!(registry.load_status().is_recovered());
        assert!(registry.is_empty());
        assert_eq!(registry.version(), 1);

        registry
            .upsert(&temp_dir.path().join("a"), Path::new("/t"), LinkKind::File)
            .unwrap();
        let reloaded = LinkRegistry::open_file(&path, false);
        assert_eq!(reloaded.len(), 1);
    }

    #[test]
    fn test_duplicates_in_file_collapse_to_last() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("links.toml");
        fs::write(
            &path,
            r#"config_version = 1

[[links]]
link = "/data/app"
target = "/old"
type = "directory"
created_at = "2024-01-01T00:00:00Z"

[[links]]
link = "/data/other"
target = "/other"
type = "file"
created_at = "2024-01-01T00:00:00Z"

[[links]]
link = "/data/./app"
target = "/new"
type = "directory"
created_at = "2024-02-01T00:00:00Z"
"#,
        )
        .unwrap();

        let registry = LinkRegistry::open_file(&path, false);
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.list()[0].target, PathBuf::from("/new"));
        assert_eq!(registry.list()[1].target, PathBuf::from("/other"));
    }

    #[test]
    fn test_failed_save_leaves_registry_unchanged() {
        let store = FlakyStore::default();
        let mut registry = LinkRegistry::open(Box::new(store.clone()));
        registry
            .upsert(Path::new("/data/a"), Path::new("/t"), LinkKind::File)
            .unwrap();

        *store.fail.lock().unwrap() = true;
        assert!(registry
            .upsert(Path::new("/data/b"), Path::new("/t"), LinkKind::File)
            .is_err());
        assert!(registry.remove(Path::new("/data/a")).is_err());

        assert_eq!(registry.len(), 1);
        assert_eq!(store.saved.lock().unwrap().as_ref().unwrap().links.len(), 1);
    }

    #[test]
    fn test_retain_returns_removed() {
        let (temp, mut registry) = setup_registry();
        registry
            .upsert(&temp.path().join("keep"), Path::new("/t"), LinkKind::File)
            .unwrap();
        registry
            .upsert(&temp.path().join("drop"), Path::new("/t"), LinkKind::File)
            .unwrap();

        let removed = registry
            .retain(|r| r.link.file_name().unwrap() == "keep")
            .unwrap();
        assert_eq!(removed.len(), 1);
        assert_eq!(registry.len(), 1);
    }
}
