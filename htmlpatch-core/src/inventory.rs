//! Inventory of image files that exist on disk.
//!
//! Built once per run from `<root>/<uploads_dir>` and read-only afterwards.
//! Paths are stored relative to `root` with `/` separators, which is how the
//! exported HTML references them.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, error, info};

#[derive(Debug, Error)]
pub enum InventoryError {
    #[error("uploads directory {0} does not exist")]
    MissingDir(PathBuf),
    #[error("failed to list {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Inventory {
    paths: BTreeSet<String>,
}

impl Inventory {
    pub fn from_paths<I, S>(paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            paths: paths.into_iter().map(Into::into).collect(),
        }
    }

    /// Recursively collect files under `root/uploads_dir` whose extension is in
    /// `extensions` (compared case-insensitively).
    pub fn scan(
        root: &Path,
        uploads_dir: &Path,
        extensions: &[String],
    ) -> Result<Self, InventoryError> {
        let dir = root.join(uploads_dir);
        info!(dir = %dir.display(), "Scanning image inventory");
        if !dir.is_dir() {
            error!(dir = %dir.display(), "Uploads directory not found");
            return Err(InventoryError::MissingDir(dir));
        }

        let extensions: Vec<String> = extensions.iter().map(|e| e.to_lowercase()).collect();

        fn visit_dir(
            dir: &Path,
            root: &Path,
            extensions: &[String],
            paths: &mut BTreeSet<String>,
        ) -> Result<(), InventoryError> {
            let io = |source: std::io::Error| InventoryError::Io {
                path: dir.to_path_buf(),
                source,
            };
            for entry_res in std::fs::read_dir(dir).map_err(io)? {
                let path = entry_res.map_err(io)?.path();
                if path.is_dir() {
                    visit_dir(&path, root, extensions, paths)?;
                    continue;
                }
                let recognised = path
                    .extension()
                    .and_then(|e| e.to_str())
                    .map(|e| extensions.contains(&e.to_lowercase()))
                    .unwrap_or(false);
                if !recognised {
                    continue;
                }
                let Ok(rel_path) = path.strip_prefix(root) else {
                    continue;
                };
                let segments: Vec<String> = rel_path
                    .components()
                    .map(|c| c.as_os_str().to_string_lossy().into_owned())
                    .collect();
                debug!(path = %rel_path.display(), "Inventory entry");
                paths.insert(segments.join("/"));
            }
            Ok(())
        }

        let mut paths = BTreeSet::new();
        visit_dir(&dir, root, &extensions, &mut paths)?;
        info!(count = paths.len(), "Image inventory built");
        Ok(Self { paths })
    }

    pub fn contains(&self, path: &str) -> bool {
        self.paths.contains(path)
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.paths.iter().map(String::as_str)
    }

    /// Existing files that could stand in for a missing `reference`: those
    /// whose path contains both the reference's file stem and its parent
    /// directory. Returned in sorted order.
    pub fn substitutes(&self, reference: &str) -> Vec<&str> {
        let path = Path::new(reference);
        let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
            return Vec::new();
        };
        if stem.is_empty() {
            return Vec::new();
        }
        let parent = path
            .parent()
            .and_then(|p| p.to_str())
            .unwrap_or_default();
        self.iter()
            .filter(|candidate| candidate.contains(stem) && candidate.contains(parent))
            .collect()
    }
}
