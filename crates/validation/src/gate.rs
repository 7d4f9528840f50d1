use crate::snapshot::{ValidationSnapshot, ValidationState};
use intake_git::RepoClassification;

/// Whether the add action is permitted for `snapshot`.
///
/// True iff the path is non-empty and classified as a usable, non-bare
/// repository. Pure and total: every other state yields false.
#[must_use]
pub fn can_submit(snapshot: &ValidationSnapshot) -> bool {
    !snapshot.path.is_empty()
        && matches!(
            snapshot.state,
            ValidationState::Classified(RepoClassification::Valid)
        )
}
