use thiserror::Error;

pub type Result<T> = std::result::Result<T, ValidationError>;

#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("Validation controller is no longer running")]
    ControllerClosed,

    #[error("Submission blocked: the current path has not validated as a usable repository")]
    SubmissionBlocked,

    #[error("Registration error: {0}")]
    RegistrationError(String),
}
