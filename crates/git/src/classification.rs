use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Outcome of inspecting a filesystem path for a usable repository.
///
/// Every failure mode of the underlying inspection collapses into one of
/// these variants; callers never see raw I/O errors.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RepoClassification {
    /// Nothing usable exists at the path.
    Missing,
    /// A repository exists but is owned by a different user and has not
    /// been trusted. `owner_path` is the repository root that was flagged,
    /// which may be an ancestor of the entered path.
    Unsafe { owner_path: PathBuf },
    /// A bare repository (no working tree); unsupported by the add-flow.
    Bare,
    /// A usable, non-bare repository.
    Valid,
}

impl RepoClassification {
    #[must_use]
    pub const fn is_valid(&self) -> bool {
        matches!(self, Self::Valid)
    }

    /// The flagged root for `Unsafe` results, `None` otherwise.
    #[must_use]
    pub fn owner_path(&self) -> Option<&Path> {
        match self {
            Self::Unsafe { owner_path } => Some(owner_path),
            _ => None,
        }
    }
}
