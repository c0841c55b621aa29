//! The document being patched, and its filesystem persistence.
//!
//! A [`Document`] is the whole file as one UTF-8 string: no DOM, no structure.
//! [`FsStore`] is the production [`DocumentStore`]; saves go through a temp file
//! in the destination directory and an atomic rename, so an interrupted write
//! never leaves a truncated file behind.

use std::fmt;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::{debug, error, info};

use crate::contract::DocumentStore;

/// Full text of an HTML file.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Document(String);

impl Document {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<String> for Document {
    fn from(text: String) -> Self {
        Self(text)
    }
}

impl From<&str> for Document {
    fn from(text: &str) -> Self {
        Self(text.to_owned())
    }
}

impl AsRef<str> for Document {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("target file {0} does not exist")]
    Missing(PathBuf),
    #[error("failed to read {path}: {source}")]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write {path}: {source}")]
    Unwritable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Reads and writes documents on the local filesystem.
#[derive(Debug, Default, Clone, Copy)]
pub struct FsStore;

impl FsStore {
    pub fn new() -> Self {
        Self
    }
}

impl DocumentStore for FsStore {
    fn load(&self, path: &Path) -> Result<Document, DocumentError> {
        debug!(path = %path.display(), "Loading document");
        match fs::read_to_string(path) {
            Ok(text) => {
                info!(path = %path.display(), bytes = text.len(), "Document loaded");
                Ok(Document(text))
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                error!(path = %path.display(), "Target file does not exist");
                Err(DocumentError::Missing(path.to_path_buf()))
            }
            Err(e) => {
                error!(path = %path.display(), error = ?e, "Failed to read document");
                Err(DocumentError::Unreadable {
                    path: path.to_path_buf(),
                    source: e,
                })
            }
        }
    }

    fn save(&self, path: &Path, document: &Document) -> Result<(), DocumentError> {
        let unwritable = |source: std::io::Error| {
            error!(path = %path.display(), error = ?source, "Failed to write document");
            DocumentError::Unwritable {
                path: path.to_path_buf(),
                source,
            }
        };

        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };

        // Dropping the temp file on any early return removes it.
        let mut tmp = NamedTempFile::new_in(dir).map_err(unwritable)?;
        tmp.write_all(document.as_str().as_bytes())
            .map_err(unwritable)?;
        if let Some(permissions) = target_permissions(path).map_err(unwritable)? {
            tmp.as_file().set_permissions(permissions).map_err(unwritable)?;
        }
        tmp.as_file().sync_all().map_err(unwritable)?;
        tmp.persist(path).map_err(|e| unwritable(e.error))?;

        info!(path = %path.display(), bytes = document.len(), "Document written");
        Ok(())
    }

    fn backup(&self, path: &Path) -> Result<PathBuf, DocumentError> {
        let mut name = path.as_os_str().to_owned();
        name.push(".bak");
        let backup = PathBuf::from(name);
        fs::copy(path, &backup).map_err(|source| {
            error!(path = %path.display(), error = ?source, "Failed to back up document");
            DocumentError::Unwritable {
                path: backup.clone(),
                source,
            }
        })?;
        info!(path = %path.display(), backup = %backup.display(), "Backup written");
        Ok(backup)
    }
}

/// Mode the saved file should carry: the destination's own when it exists,
/// otherwise world-readable rather than the temp file's owner-only default.
fn target_permissions(path: &Path) -> std::io::Result<Option<fs::Permissions>> {
    match fs::metadata(path) {
        Ok(meta) => Ok(Some(meta.permissions())),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(new_file_permissions()),
        Err(e) => Err(e),
    }
}

#[cfg(unix)]
fn new_file_permissions() -> Option<fs::Permissions> {
    use std::os::unix::fs::PermissionsExt;
    Some(fs::Permissions::from_mode(0o644))
}

#[cfg(not(unix))]
fn new_file_permissions() -> Option<fs::Permissions> {
    None
}
