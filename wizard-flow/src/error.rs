use thiserror::Error;

/// Errors raised by the wizard engine.
///
/// Field and step validation failures are not errors: they are reported
/// through [`crate::ValidationResult`] and [`crate::StepOutcome::Blocked`].
#[derive(Error, Debug)]
pub enum WizardError {
    #[error("Step not found: {0}")]
    StepNotFound(String),

    #[error("Unknown branch: {0}")]
    UnknownBranch(String),

    #[error("Session not found: {0}")]
    SessionNotFound(String),

    #[error("Session belongs to wizard '{found}', expected '{expected}'")]
    WizardMismatch { expected: String, found: String },

    #[error("Invalid field path '{path}': {reason}")]
    InvalidPath { path: String, reason: String },

    #[error("Invalid transition: {0}")]
    InvalidTransition(String),

    #[error("A submission is already in progress")]
    SubmissionInProgress,

    #[error("The wizard has already been submitted")]
    AlreadySubmitted,

    #[error("Submission failed: {0}")]
    SubmissionFailed(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, WizardError>;
