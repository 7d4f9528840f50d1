//! # Intake Validation
//!
//! The add-repository validation core: owns the user-entered path,
//! sequences asynchronous classification, discards stale results, and
//! gates submission.
//!
//! ## Architecture
//!
//! ```text
//! user input ──> ValidationController (actor)
//!                     │ set_path: normalize, mark Pending,
//!                     │           spawn classify(path)
//!                     ▼
//!                RepoClassifier (async, may overlap)
//!                     │
//!                     ▼ (requested_path, result)
//!                apply iff requested_path == live path   <── staleness rule
//!                     │
//!                     ▼
//!                ValidationSnapshot ──> can_submit ──> submit(registry)
//!                     │
//!                     └── Unsafe{owner_path} ──> request_trust
//!                           trust(owner_path), then re-validate the
//!                           *live* path at completion time
//! ```
//!
//! Responses may arrive out of issue order, so requested-path equality at
//! arrival time is the only rule that keeps the snapshot coherent; earlier
//! requests for superseded paths are inert, not cancelled.

mod controller;
mod error;
mod gate;
mod registry;
mod snapshot;

pub use controller::ValidationController;
pub use error::{Result, ValidationError};
pub use gate::can_submit;
pub use registry::{RepositoryHandle, RepositoryRegistry};
pub use snapshot::{ValidationSnapshot, ValidationState};
