use crate::error::{GitIntakeError, Result};
use async_trait::async_trait;
use log::{debug, warn};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

/// Durable record of directories the user has declared safe to operate on
/// even though another user owns them.
#[async_trait]
pub trait TrustStore: Send + Sync {
    /// Whether `path` or any of its ancestors has been trusted.
    async fn is_trusted(&self, path: &Path) -> bool;

    /// Persist that `path` is trusted. Trusting an already-trusted path is
    /// a no-op.
    async fn trust(&self, path: &Path) -> Result<()>;
}

/// File-backed [`TrustStore`]: a JSON set of trusted roots.
///
/// A missing or corrupt file reads as the empty set; corruption is logged
/// and then overwritten by the next successful `trust` call.
pub struct TrustFile {
    path: PathBuf,
}

impl TrustFile {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Default on-disk location, under the platform config directory.
    pub fn default_location() -> Result<PathBuf> {
        let base = dirs::config_dir().ok_or(GitIntakeError::HomeDirUnavailable)?;
        Ok(base.join("repo-intake").join("trusted.json"))
    }

    async fn read_entries(&self) -> BTreeSet<PathBuf> {
        let data = match tokio::fs::read_to_string(&self.path).await {
            Ok(data) => data,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return BTreeSet::new(),
            Err(err) => {
                warn!("Failed to read trust file {:?}: {err}", self.path);
                return BTreeSet::new();
            }
        };
        match serde_json::from_str(&data) {
            Ok(entries) => entries,
            Err(err) => {
                warn!("Ignoring corrupt trust file {:?}: {err}", self.path);
                BTreeSet::new()
            }
        }
    }
}

#[async_trait]
impl TrustStore for TrustFile {
    async fn is_trusted(&self, path: &Path) -> bool {
        self.read_entries()
            .await
            .iter()
            .any(|entry| path.starts_with(entry))
    }

    async fn trust(&self, path: &Path) -> Result<()> {
        let mut entries = self.read_entries().await;
        if !entries.insert(path.to_path_buf()) {
            debug!("{path:?} already trusted");
            return Ok(());
        }
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let data = serde_json::to_string_pretty(&entries)?;
        tokio::fs::write(&self.path, data).await?;
        debug!("Recorded trusted path {path:?}");
        Ok(())
    }
}
