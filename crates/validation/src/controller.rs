use crate::error::{Result, ValidationError};
use crate::gate::can_submit;
use crate::registry::{RepositoryHandle, RepositoryRegistry};
use crate::snapshot::{ValidationSnapshot, ValidationState};
use intake_git::{RepoClassification, RepoClassifier, TrustStore};
use log::{debug, warn};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::{mpsc, watch};

/// Handle to the validation actor.
///
/// Cheap to clone; all handles observe the same state. Dropping the last
/// handle shuts the actor down.
#[derive(Clone)]
pub struct ValidationController {
    inner: Arc<ControllerInner>,
}

struct ControllerInner {
    command_tx: mpsc::Sender<Command>,
    snapshot_tx: watch::Sender<ValidationSnapshot>,
    registry: Arc<dyn RepositoryRegistry>,
    // Keeps the watch channel open so publishes succeed even while no
    // caller currently holds a receiver.
    _snapshot_guard: watch::Receiver<ValidationSnapshot>,
}

enum Command {
    SetPath(String),
    RequestTrust,
    Shutdown,
}

/// Completions delivered back into the actor loop by spawned tasks.
enum Completion {
    Classified {
        path: String,
        result: RepoClassification,
    },
    TrustFinished {
        succeeded: bool,
    },
}

impl ValidationController {
    #[must_use]
    pub fn spawn(
        classifier: Arc<dyn RepoClassifier>,
        trust: Arc<dyn TrustStore>,
        registry: Arc<dyn RepositoryRegistry>,
    ) -> Self {
        let (command_tx, command_rx) = mpsc::channel(16);
        let (snapshot_tx, snapshot_guard) = watch::channel(ValidationSnapshot::initial());

        spawn_validation_loop(classifier, trust, command_rx, snapshot_tx.clone());

        Self {
            inner: Arc::new(ControllerInner {
                command_tx,
                snapshot_tx,
                registry,
                _snapshot_guard: snapshot_guard,
            }),
        }
    }

    /// Accept new user input. Empty input resets to the idle state;
    /// anything else is normalized and queued for classification. The
    /// caller never blocks on the classification itself.
    pub async fn set_path(&self, raw: impl Into<String>) -> Result<()> {
        self.inner
            .command_tx
            .send(Command::SetPath(raw.into()))
            .await
            .map_err(|_| ValidationError::ControllerClosed)
    }

    /// Run the trust remediation for the currently flagged repository and
    /// re-validate afterwards. Only meaningful while the classification is
    /// `Unsafe`; the actor ignores the request otherwise.
    pub async fn request_trust(&self) -> Result<()> {
        self.inner
            .command_tx
            .send(Command::RequestTrust)
            .await
            .map_err(|_| ValidationError::ControllerClosed)
    }

    /// Current state, synchronously and without side effects.
    #[must_use]
    pub fn snapshot(&self) -> ValidationSnapshot {
        self.inner.snapshot_tx.subscribe().borrow().clone()
    }

    /// Stream of snapshot changes, for callers that await state
    /// transitions instead of polling.
    #[must_use]
    pub fn snapshot_stream(&self) -> watch::Receiver<ValidationSnapshot> {
        self.inner.snapshot_tx.subscribe()
    }

    #[must_use]
    pub fn can_submit(&self) -> bool {
        can_submit(&self.snapshot())
    }

    /// Hand the validated path to the registration collaborator.
    ///
    /// Refuses unless the gate passes for the snapshot taken at the moment
    /// of the call.
    pub async fn submit(&self) -> Result<RepositoryHandle> {
        let snapshot = self.snapshot();
        if !can_submit(&snapshot) {
            return Err(ValidationError::SubmissionBlocked);
        }
        self.inner.registry.register(Path::new(&snapshot.path)).await
    }
}

impl Drop for ValidationController {
    fn drop(&mut self) {
        if Arc::strong_count(&self.inner) == 1 {
            let _ = self.inner.command_tx.try_send(Command::Shutdown);
        }
    }
}

/// Mutable state owned by the actor task. All mutation happens on one
/// sequential timeline; the staleness check in `apply_classification` is
/// the only ordering defense against concurrently outstanding requests.
struct LoopState {
    path: String,
    state: ValidationState,
    trusting: bool,
}

impl LoopState {
    fn initial() -> Self {
        Self {
            path: String::new(),
            state: ValidationState::Idle,
            trusting: false,
        }
    }

    /// Replace the live path with normalized user input.
    fn apply_input(&mut self, raw: &str) {
        if raw.is_empty() {
            self.path = String::new();
            self.state = ValidationState::Idle;
        } else {
            self.path = intake_paths::normalize(raw).display().to_string();
            self.state = ValidationState::Pending;
        }
    }

    /// Apply a classification result iff it is for the live path.
    /// Responses may arrive out of issue order, so requested-path equality
    /// is the only safe rule.
    fn apply_classification(&mut self, requested_path: &str, result: RepoClassification) -> bool {
        if requested_path != self.path {
            debug!("Discarding stale classification for {requested_path}");
            return false;
        }
        self.state = ValidationState::Classified(result);
        true
    }

    fn snapshot(&self) -> ValidationSnapshot {
        ValidationSnapshot {
            path: self.path.clone(),
            state: self.state.clone(),
            trusting: self.trusting,
        }
    }
}

fn spawn_validation_loop(
    classifier: Arc<dyn RepoClassifier>,
    trust: Arc<dyn TrustStore>,
    mut command_rx: mpsc::Receiver<Command>,
    snapshot_tx: watch::Sender<ValidationSnapshot>,
) {
    tokio::spawn(async move {
        // Held open by the loop itself so completion_rx outlives every
        // spawned classification/trust task.
        let (completion_tx, mut completion_rx) = mpsc::channel(32);
        let mut state = LoopState::initial();

        loop {
            tokio::select! {
                cmd = command_rx.recv() => match cmd {
                    Some(Command::SetPath(raw)) => {
                        state.apply_input(&raw);
                        if !state.path.is_empty() {
                            issue_classification(&classifier, &completion_tx, state.path.clone());
                        }
                        let _ = snapshot_tx.send(state.snapshot());
                    }
                    Some(Command::RequestTrust) => {
                        let ValidationState::Classified(RepoClassification::Unsafe { owner_path }) =
                            &state.state
                        else {
                            warn!("Trust requested while classification is not unsafe; ignoring");
                            continue;
                        };
                        if state.trusting {
                            warn!("Trust already in flight; ignoring repeated request");
                            continue;
                        }
                        state.trusting = true;
                        issue_trust(&trust, &completion_tx, owner_path.clone());
                        let _ = snapshot_tx.send(state.snapshot());
                    }
                    Some(Command::Shutdown) | None => break,
                },
                Some(done) = completion_rx.recv() => match done {
                    Completion::Classified { path, result } => {
                        if state.apply_classification(&path, result) {
                            let _ = snapshot_tx.send(state.snapshot());
                        }
                    }
                    Completion::TrustFinished { succeeded } => {
                        // Re-validate the live path, not the path that was
                        // trusted; edits may have superseded it mid-trust.
                        if succeeded && !state.path.is_empty() {
                            state.state = ValidationState::Pending;
                            issue_classification(&classifier, &completion_tx, state.path.clone());
                        }
                        state.trusting = false;
                        let _ = snapshot_tx.send(state.snapshot());
                    }
                },
            }
        }
    });
}

fn issue_classification(
    classifier: &Arc<dyn RepoClassifier>,
    completion_tx: &mpsc::Sender<Completion>,
    path: String,
) {
    let classifier = classifier.clone();
    let tx = completion_tx.clone();
    tokio::spawn(async move {
        let result = classifier.classify(Path::new(&path)).await;
        let _ = tx.send(Completion::Classified { path, result }).await;
    });
}

fn issue_trust(
    trust: &Arc<dyn TrustStore>,
    completion_tx: &mpsc::Sender<Completion>,
    owner_path: PathBuf,
) {
    let trust = trust.clone();
    let tx = completion_tx.clone();
    tokio::spawn(async move {
        let succeeded = match trust.trust(&owner_path).await {
            Ok(()) => true,
            Err(err) => {
                warn!("Failed to trust {owner_path:?}: {err}");
                false
            }
        };
        let _ = tx.send(Completion::TrustFinished { succeeded }).await;
    });
}
