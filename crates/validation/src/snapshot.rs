use intake_git::RepoClassification;
use serde::{Deserialize, Serialize};

/// Where the current path stands in the validation lifecycle.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ValidationState {
    /// The path is empty and has never been validated.
    Idle,
    /// A classification request is outstanding for the current path.
    Pending,
    /// The latest non-stale classification result.
    Classified(RepoClassification),
}

/// Externally observable state of the validation controller.
///
/// `path` is the normalized form of the latest user input ("" when empty).
/// A classification result only ever refers to this path; responses for
/// superseded paths are discarded before they reach a snapshot.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ValidationSnapshot {
    pub path: String,
    pub state: ValidationState,
    /// Whether the trust remediation action is currently in flight. Gates
    /// only the remediation itself, not the classification spinner.
    pub trusting: bool,
}

impl ValidationSnapshot {
    pub(crate) fn initial() -> Self {
        Self {
            path: String::new(),
            state: ValidationState::Idle,
            trusting: false,
        }
    }

    /// Whether the overall add action is currently permitted.
    #[must_use]
    pub fn can_submit(&self) -> bool {
        crate::gate::can_submit(self)
    }
}
