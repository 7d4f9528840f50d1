//! # Intake Git
//!
//! Repository inspection and trust for the add-repository flow.
//!
//! The controller crate depends only on the [`RepoClassifier`] and
//! [`TrustStore`] traits; the implementations here inspect `.git` layouts
//! directly and persist trust as a JSON set of roots. Classification never
//! fails: every I/O error collapses into [`RepoClassification::Missing`].

mod classification;
mod classifier;
mod error;
mod trust;

pub use classification::RepoClassification;
pub use classifier::{
    discover_repository, resolve_classification, GitDirClassifier, RepoClassifier, RepoLayout,
};
pub use error::{GitIntakeError, Result};
pub use trust::{TrustFile, TrustStore};
