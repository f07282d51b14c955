//! Registry storage backends.
//!
//! Loading never fails: a missing file is an empty registry, and anything
//! that does not parse into the schema is replaced by an empty version-1
//! registry, with the reason kept in [`LoadStatus::Recovered`] so callers
//! can warn about it.

use super::atomic::atomic_write;
use super::record::RegistryDocument;
use crate::config::RegistryConfig;
use crate::error::{RelinkError, Result};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// How the last load went.
#[derive(Debug)]
pub enum LoadStatus {
    /// No registry file yet
    Missing,
    Loaded,
    /// The file was unreadable; an empty default is in use. Holds a
    /// [`RelinkError::RegistryCorrupt`].
    Recovered(RelinkError),
}

impl LoadStatus {
    pub fn is_recovered(&self) -> bool {
        matches!(self, LoadStatus::Recovered(_))
    }
}

/// Durable home of a [`RegistryDocument`].
pub trait RegistryStore: Send + Sync {
    /// Load the document, degrading to the default on any failure.
    fn load(&self) -> (RegistryDocument, LoadStatus);

    /// Persist the whole document atomically.
    fn save(&self, document: &RegistryDocument) -> Result<()>;

    /// Human-readable location for messages.
    fn location(&self) -> PathBuf;
}

/// TOML file store.
///
/// ```toml
/// # relink link registry (generated, edits are overwritten)
/// config_version = 1
///
/// [[links]]
/// link = "/data/app"
/// target = "/archive/app"
/// type = "directory"
/// created_at = "2025-01-01T12:00:00Z"
/// ```
#[derive(Debug, Clone)]
pub struct TomlFileStore {
    path: PathBuf,
    keep_backup: bool,
}

impl TomlFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            keep_backup: false,
        }
    }

    /// Keep a `.bak` copy of the previous file on every save.
    pub fn with_backup(mut self, keep_backup: bool) -> Self {
        self.keep_backup = keep_backup;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn corrupt(&self, message: impl Into<String>) -> LoadStatus {
        let error = RelinkError::RegistryCorrupt {
            path: self.path.clone(),
            message: message.into(),
        };
        warn!("{}; continuing with an empty registry", error);
        LoadStatus::Recovered(error)
    }
}

/// Parse and validate registry text.
pub fn parse_document(text: &str) -> std::result::Result<RegistryDocument, String> {
    let document: RegistryDocument = toml::from_str(text).map_err(|e| e.to_string())?;
    if document.config_version == 0 {
        return Err("config_version must be at least 1".to_string());
    }
    if document.config_version > RegistryConfig::CURRENT_VERSION {
        warn!(
            "Registry version {} is newer than supported version {}; reading it best-effort",
            document.config_version,
            RegistryConfig::CURRENT_VERSION
        );
    }
    Ok(document)
}

/// Render a document with the generated-file header.
pub fn render_document(document: &RegistryDocument) -> Result<String> {
    let body = toml::to_string(document)?;
    Ok(format!("{}\n{}", RegistryConfig::HEADER, body))
}

impl RegistryStore for TomlFileStore {
    fn load(&self) -> (RegistryDocument, LoadStatus) {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!("No registry at {}, starting empty", self.path.display());
                return (RegistryDocument::default(), LoadStatus::Missing);
            }
            Err(e) => return (RegistryDocument::default(), self.corrupt(e.to_string())),
        };

        match parse_document(&text) {
            Ok(document) => {
                debug!(
                    "Loaded {} link records from {}",
                    document.links.len(),
                    self.path.display()
                );
                (document, LoadStatus::Loaded)
            }
            Err(message) => (RegistryDocument::default(), self.corrupt(message)),
        }
    }

    fn save(&self, document: &RegistryDocument) -> Result<()> {
        let text = render_document(document)?;
        atomic_write(&self.path, &text, self.keep_backup)
    }

    fn location(&self) -> PathBuf {
        self.path.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::link::LinkKind;
    use crate::registry::record::LinkRecord;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_is_empty() {
        let temp_dir = TempDir::new().unwrap();
        let store = TomlFileStore::new(temp_dir.path().join("links.toml"));
        let (document, status) = store.load();
        assert_eq!(document, RegistryDocument::default());
        assert!(matches!(status, LoadStatus::Missing));
    }

    #[test]
    fn test_corrupt_file_degrades_to_default() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("links.toml");
        fs::write(&path, "config_version = \"one\"\n[[links]\nlink = ").unwrap();

        let (document, status) = TomlFileStore::new(&path).load();
        assert_eq!(document.config_version, 1);
        assert!(document.links.is_empty());
        match status {
            LoadStatus::Recovered(RelinkError::RegistryCorrupt { path: p, .. }) => {
                assert_eq!(p, path)
            }
            other => panic!("unexpected status: {other:?}"),
        }
    }

    #[test]
    fn test_schema_violation_degrades_to_default() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("links.toml");
        fs::write(
            &path,
            "config_version = 1\n[[links]]\nlink = \"/a\"\ntype = \"pipe\"\n",
        )
        .unwrap();

        let (document, status) = TomlFileStore::new(&path).load();
        assert!(document.links.is_empty());
        assert!(status.is_recovered());
    }

    #[test]
    fn test_version_zero_is_rejected() {
        assert!(parse_document("config_version = 0\n").is_err());
    }

    #[test]
    fn test_comments_blank_lines_and_unknown_keys_are_ignored() {
        let text = r#"
# hand-edited

config_version = 1
comment = "extra"

[[links]]
# the app
link = "/data/app"
target = "/archive/app"
type = "directory"
created_at = "2025-01-01T12:00:00Z"
note = "ignored"
"#;
        let document = parse_document(text).unwrap();
        assert_eq!(document.links.len(), 1);
    }

    #[test]
    fn test_quotes_and_backslashes_survive_round_trip() {
        let temp_dir = TempDir::new().unwrap();
        let store = TomlFileStore::new(temp_dir.path().join("links.toml"));
        let document = RegistryDocument {
            config_version: 1,
            links: vec![LinkRecord::new(
                r#"C:\Users\me\"quoted" dir"#,
                r"D:\archive\it's",
                LinkKind::Directory,
            )],
        };

        store.save(&document).unwrap();
        let text = fs::read_to_string(store.path()).unwrap();
        assert!(text.starts_with(RegistryConfig::HEADER));
        assert!(text.contains("[[links]]"));

        let (loaded, status) = store.load();
        assert!(matches!(status, LoadStatus::Loaded));
        assert_eq!(loaded, document);
    }
}
