//! # contract: the two seams of the pipeline
//!
//! - [`Rule`]: one named, pure rewrite of the document text. Concrete kinds live
//!   in [`crate::rules`]; presets assemble them into a [`crate::executor::Pipeline`].
//! - [`DocumentStore`]: where documents come from and go back to. The
//!   filesystem implementation is [`crate::document::FsStore`].
//!
//! Both traits are annotated for `mockall` so orchestration can be tested
//! without touching disk or building real rules.

use std::path::{Path, PathBuf};

use mockall::automock;
use thiserror::Error;

use crate::document::{Document, DocumentError};

/// The outcome of applying one rule to a document snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rewrite {
    pub text: String,
    /// Number of places where the text actually changed.
    pub substitutions: usize,
    /// Non-fatal findings worth surfacing (e.g. ambiguous matches left alone).
    pub warnings: Vec<String>,
}

impl Rewrite {
    pub fn unchanged(input: &str) -> Self {
        Self {
            text: input.to_owned(),
            substitutions: 0,
            warnings: Vec::new(),
        }
    }

    pub fn changed(text: String, substitutions: usize) -> Self {
        Self {
            text,
            substitutions,
            warnings: Vec::new(),
        }
    }

    pub fn with_warnings(mut self, warnings: Vec<String>) -> Self {
        self.warnings = warnings;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuleError {
    /// The matched markup did not have the shape the rule expects.
    #[error("malformed input: {0}")]
    Malformed(String),
    #[error("{0}")]
    Other(String),
}

/// A single named rewrite. Must be pure: the same input yields the same output.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
pub trait Rule {
    fn name(&self) -> &str;

    /// Rewrite `input`, reporting how many substitutions actually changed text.
    fn apply(&self, input: &str) -> Result<Rewrite, RuleError>;
}

/// Storage for the document under patch.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
pub trait DocumentStore {
    fn load(&self, path: &Path) -> Result<Document, DocumentError>;

    /// Persist `document` at `path`, replacing any previous content.
    fn save(&self, path: &Path, document: &Document) -> Result<(), DocumentError>;

    /// Copy the current file at `path` aside and return the copy's location.
    fn backup(&self, path: &Path) -> Result<PathBuf, DocumentError>;
}
