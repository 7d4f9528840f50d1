use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Receipt for a repository accepted by the registration collaborator.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RepositoryHandle {
    pub path: PathBuf,
}

/// External collaborator that takes ownership of a validated repository
/// path. Only reachable through [`crate::ValidationController::submit`]
/// once the gate passes; how (or whether) the repository is persisted is
/// the collaborator's concern.
#[async_trait]
pub trait RepositoryRegistry: Send + Sync {
    async fn register(&self, path: &Path) -> Result<RepositoryHandle>;
}
