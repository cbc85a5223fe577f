pub mod controller;
pub mod error;
pub mod path;
pub mod rules;
pub mod runner;
pub mod step;
pub mod storage;
pub mod store;
pub mod validation;
pub mod wizard;

// Re-export commonly used types
pub use controller::{
    SUBMISSION_RETRY_MESSAGE, SimulatedSubmission, StepOutcome, SubmissionGate, WizardController,
    WizardHooks, WizardState,
};
pub use error::{Result, WizardError};
pub use path::FieldPath;
pub use rules::{Check, Rule, validate_rules, validate_rules_at};
pub use runner::{WizardCommand, WizardRunner};
pub use step::{FieldKind, FieldSpec, FormStep, Step};
pub use storage::{InMemorySessionStorage, Session, SessionStorage};
pub use store::{FormStore, SetOptions, WatchId};
pub use validation::{ValidationErrors, ValidationResult};
pub use wizard::{StepKey, WizardBuilder, WizardDefinition};
