use crate::classification::RepoClassification;
use crate::trust::TrustStore;
use async_trait::async_trait;
use log::debug;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Inspects a filesystem path and classifies its repository usability.
///
/// Infallible by contract: any underlying I/O failure maps to
/// [`RepoClassification::Missing`] rather than surfacing as an error.
#[async_trait]
pub trait RepoClassifier: Send + Sync {
    async fn classify(&self, path: &Path) -> RepoClassification;
}

/// Filesystem layout of a discovered repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoLayout {
    /// Top-level directory of the repository, possibly an ancestor of the
    /// entered path.
    pub root: PathBuf,
    /// Whether the repository has no working tree.
    pub bare: bool,
}

/// Production [`RepoClassifier`] backed by direct `.git` inspection.
///
/// Trust decisions consult the same store that [`TrustStore::trust`]
/// writes, so a remediated path classifies differently on the next call.
pub struct GitDirClassifier {
    trust: Arc<dyn TrustStore>,
}

impl GitDirClassifier {
    #[must_use]
    pub fn new(trust: Arc<dyn TrustStore>) -> Self {
        Self { trust }
    }
}

#[async_trait]
impl RepoClassifier for GitDirClassifier {
    async fn classify(&self, path: &Path) -> RepoClassification {
        let Some(layout) = discover_repository(path).await else {
            return RepoClassification::Missing;
        };
        let Some(owned) = current_user_owns(&layout.root).await else {
            // The root vanished or became unreadable mid-inspection.
            return RepoClassification::Missing;
        };
        let trusted = if owned {
            false
        } else {
            self.trust.is_trusted(&layout.root).await
        };
        let classification = resolve_classification(layout, owned, trusted);
        debug!("Classified {path:?} as {classification:?}");
        classification
    }
}

/// Pure decision step shared by [`GitDirClassifier::classify`].
///
/// The ownership check precedes the bare check: a foreign-owned bare
/// repository is `Unsafe`, mirroring git's dubious-ownership refusal.
#[must_use]
pub fn resolve_classification(
    layout: RepoLayout,
    owned: bool,
    trusted: bool,
) -> RepoClassification {
    if !owned && !trusted {
        return RepoClassification::Unsafe {
            owner_path: layout.root,
        };
    }
    if layout.bare {
        RepoClassification::Bare
    } else {
        RepoClassification::Valid
    }
}

/// Walk from `start` toward the filesystem root looking for a repository.
///
/// A directory with a `.git` entry (dir or gitfile) is a non-bare root; a
/// directory shaped like a git dir is a bare root. Returns `None` when the
/// entered path does not exist, is not a directory, or no ancestor holds a
/// repository.
pub async fn discover_repository(start: &Path) -> Option<RepoLayout> {
    let meta = tokio::fs::metadata(start).await.ok()?;
    if !meta.is_dir() {
        return None;
    }

    let mut current = Some(start);
    while let Some(dir) = current {
        if tokio::fs::metadata(dir.join(".git")).await.is_ok() {
            return Some(RepoLayout {
                root: dir.to_path_buf(),
                bare: false,
            });
        }
        if is_git_dir(dir).await {
            return Some(RepoLayout {
                root: dir.to_path_buf(),
                bare: true,
            });
        }
        current = dir.parent();
    }
    None
}

/// Whether `dir` itself has the shape of a git dir: a `HEAD` file next to
/// `objects/` and `refs/` directories.
async fn is_git_dir(dir: &Path) -> bool {
    let head_is_file = tokio::fs::metadata(dir.join("HEAD"))
        .await
        .map(|m| m.is_file())
        .unwrap_or(false);
    if !head_is_file {
        return false;
    }
    let objects = tokio::fs::metadata(dir.join("objects"))
        .await
        .map(|m| m.is_dir())
        .unwrap_or(false);
    let refs = tokio::fs::metadata(dir.join("refs"))
        .await
        .map(|m| m.is_dir())
        .unwrap_or(false);
    objects && refs
}

#[cfg(unix)]
async fn current_user_owns(path: &Path) -> Option<bool> {
    use std::os::unix::fs::MetadataExt;
    let meta = tokio::fs::metadata(path).await.ok()?;
    Some(meta.uid() == nix::unistd::geteuid().as_raw())
}

#[cfg(not(unix))]
async fn current_user_owns(_path: &Path) -> Option<bool> {
    // No uid to compare; repositories always count as owned.
    Some(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trust::TrustFile;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    async fn make_worktree_repo(root: &Path) {
        tokio::fs::create_dir_all(root.join(".git")).await.unwrap();
    }

    async fn make_bare_repo(root: &Path) {
        tokio::fs::create_dir_all(root.join("objects")).await.unwrap();
        tokio::fs::create_dir_all(root.join("refs")).await.unwrap();
        tokio::fs::write(root.join("HEAD"), "ref: refs/heads/main\n")
            .await
            .unwrap();
    }

    fn classifier(temp: &TempDir) -> GitDirClassifier {
        GitDirClassifier::new(Arc::new(TrustFile::new(temp.path().join("trusted.json"))))
    }

    #[tokio::test]
    async fn nonexistent_path_is_missing() {
        let temp = TempDir::new().unwrap();
        let c = classifier(&temp);
        let got = c.classify(&temp.path().join("nope")).await;
        assert_eq!(got, RepoClassification::Missing);
    }

    #[tokio::test]
    async fn plain_directory_is_missing() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("plain");
        tokio::fs::create_dir_all(&dir).await.unwrap();
        let got = classifier(&temp).classify(&dir).await;
        assert_eq!(got, RepoClassification::Missing);
    }

    #[tokio::test]
    async fn file_path_is_missing() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("README");
        tokio::fs::write(&file, "hi").await.unwrap();
        let got = classifier(&temp).classify(&file).await;
        assert_eq!(got, RepoClassification::Missing);
    }

    #[tokio::test]
    async fn worktree_repository_is_valid() {
        let temp = TempDir::new().unwrap();
        let repo = temp.path().join("repo");
        make_worktree_repo(&repo).await;
        let got = classifier(&temp).classify(&repo).await;
        assert_eq!(got, RepoClassification::Valid);
    }

    #[tokio::test]
    async fn gitfile_worktree_is_valid() {
        let temp = TempDir::new().unwrap();
        let repo = temp.path().join("linked");
        tokio::fs::create_dir_all(&repo).await.unwrap();
        tokio::fs::write(repo.join(".git"), "gitdir: ../main/.git/worktrees/linked\n")
            .await
            .unwrap();
        let got = classifier(&temp).classify(&repo).await;
        assert_eq!(got, RepoClassification::Valid);
    }

    #[tokio::test]
    async fn bare_repository_is_bare() {
        let temp = TempDir::new().unwrap();
        let repo = temp.path().join("bare.git");
        make_bare_repo(&repo).await;
        let got = classifier(&temp).classify(&repo).await;
        assert_eq!(got, RepoClassification::Bare);
    }

    #[tokio::test]
    async fn nested_path_resolves_to_ancestor_root() {
        let temp = TempDir::new().unwrap();
        let repo = temp.path().join("repo");
        make_worktree_repo(&repo).await;
        let nested = repo.join("src/deeply/nested");
        tokio::fs::create_dir_all(&nested).await.unwrap();

        let layout = discover_repository(&nested).await.expect("layout");
        assert_eq!(layout.root, repo);
        assert!(!layout.bare);

        let got = classifier(&temp).classify(&nested).await;
        assert_eq!(got, RepoClassification::Valid);
    }

    #[test]
    fn foreign_untrusted_repo_is_unsafe_and_carries_the_root() {
        let layout = RepoLayout {
            root: PathBuf::from("/srv/shared/repo"),
            bare: false,
        };
        let got = resolve_classification(layout, false, false);
        assert_eq!(
            got,
            RepoClassification::Unsafe {
                owner_path: PathBuf::from("/srv/shared/repo")
            }
        );
    }

    #[test]
    fn foreign_trusted_repo_falls_through_to_shape() {
        let worktree = RepoLayout {
            root: PathBuf::from("/srv/shared/repo"),
            bare: false,
        };
        assert_eq!(
            resolve_classification(worktree, false, true),
            RepoClassification::Valid
        );

        let bare = RepoLayout {
            root: PathBuf::from("/srv/shared/bare.git"),
            bare: true,
        };
        assert_eq!(
            resolve_classification(bare, false, true),
            RepoClassification::Bare
        );
    }

    #[test]
    fn owned_bare_repo_is_bare() {
        let layout = RepoLayout {
            root: PathBuf::from("/home/me/bare.git"),
            bare: true,
        };
        assert_eq!(
            resolve_classification(layout, true, false),
            RepoClassification::Bare
        );
    }
}
