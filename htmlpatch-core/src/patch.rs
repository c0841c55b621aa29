//! Top-level orchestration: load → run pipeline → back up → save.
//!
//! The document is loaded once, folded through every rule in memory and
//! persisted exactly once at the end. Nothing is written when the input is
//! missing, when the run is a dry run or when no rule changed the text.
//!
//! Used by the CLI crate and by integration tests with a mock
//! [`DocumentStore`].

use std::path::{Path, PathBuf};

use tracing::{error, info};

use crate::contract::DocumentStore;
use crate::document::{Document, DocumentError};
use crate::executor::{Pipeline, RunReport};

/// What to patch and where the result goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatchRequest {
    pub target: PathBuf,
    /// Alternate destination; the target is overwritten when `None`.
    pub output: Option<PathBuf>,
    pub backup: bool,
    pub dry_run: bool,
}

impl PatchRequest {
    pub fn new(target: impl Into<PathBuf>) -> Self {
        Self {
            target: target.into(),
            output: None,
            backup: false,
            dry_run: false,
        }
    }

    pub fn destination(&self) -> &Path {
        self.output.as_deref().unwrap_or(&self.target)
    }
}

#[derive(Debug)]
pub struct PatchOutcome {
    /// The patched text, whether or not it was written.
    pub document: Document,
    pub report: RunReport,
    /// Whether the destination was written.
    pub written: bool,
    pub destination: PathBuf,
    pub backup: Option<PathBuf>,
}

pub fn patch_file<S>(
    store: &S,
    request: &PatchRequest,
    pipeline: &Pipeline,
) -> Result<PatchOutcome, DocumentError>
where
    S: DocumentStore + ?Sized,
{
    info!(
        target = %request.target.display(),
        rules = pipeline.len(),
        dry_run = request.dry_run,
        "Patching document"
    );

    let document = store.load(&request.target).map_err(|e| {
        error!(target = %request.target.display(), error = %e, "Failed to load document");
        e
    })?;
    let original = document.as_str().to_owned();

    let (patched, report) = pipeline.run(document);
    let destination = request.destination().to_path_buf();
    let changed = patched.as_str() != original;

    info!(
        substitutions = report.total_substitutions(),
        failures = report.failures().count(),
        changed,
        "Rules evaluated"
    );

    if request.dry_run || !changed {
        info!(
            destination = %destination.display(),
            dry_run = request.dry_run,
            "Nothing written"
        );
        return Ok(PatchOutcome {
            document: patched,
            report,
            written: false,
            destination,
            backup: None,
        });
    }

    let backup = if request.backup && destination == request.target {
        let path = store.backup(&request.target).map_err(|e| {
            error!(target = %request.target.display(), error = %e, "Backup failed");
            e
        })?;
        info!(backup = %path.display(), "Backup written");
        Some(path)
    } else {
        None
    };

    store.save(&destination, &patched).map_err(|e| {
        error!(destination = %destination.display(), error = %e, "Failed to save document");
        e
    })?;
    info!(destination = %destination.display(), bytes = patched.len(), "Document saved");

    Ok(PatchOutcome {
        document: patched,
        report,
        written: true,
        destination,
        backup,
    })
}
