use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::error::{Result, WizardError};
use crate::path::FieldPath;
use crate::step::Step;
use crate::storage::Session;
use crate::store::{FormStore, SetOptions};
use crate::validation::{ValidationErrors, ValidationResult};
use crate::wizard::WizardDefinition;

/// Top-level message recorded when the host rejects a submission.
pub const SUBMISSION_RETRY_MESSAGE: &str = "Submission failed, please retry.";

/// Controller-owned state of one wizard session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WizardState {
    /// 1-based; `total_steps + 1` is the synthetic success step.
    pub current_step: usize,
    pub is_submitting: bool,
    pub is_submitted: bool,
    pub errors: ValidationErrors,
    pub submission_error: Option<String>,
}

impl Default for WizardState {
    fn default() -> Self {
        Self {
            current_step: 1,
            is_submitting: false,
            is_submitted: false,
            errors: ValidationErrors::new(),
            submission_error: None,
        }
    }
}

/// Result of one controller command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum StepOutcome {
    Updated { path: String },
    ItemAdded { path: String, index: usize },
    ItemRemoved { path: String, index: usize },
    Advanced { from: usize, to: usize },
    Retreated { from: usize, to: usize },
    /// The current step did not validate; the index is unchanged.
    Blocked { errors: ValidationErrors },
    Submitted { step: usize },
    SubmissionFailed { message: String },
}

/// Either the answers to hand to the host, or the errors that stopped the
/// final step from validating.
#[derive(Debug, Clone, PartialEq)]
pub enum SubmissionGate {
    Ready(Value),
    Blocked(ValidationErrors),
}

/// Callbacks a host supplies to observe and complete a wizard run.
#[async_trait]
pub trait WizardHooks: Send + Sync {
    fn on_step_change(&self, _session_id: &str, _step: usize) {}

    fn on_validation_failure(&self, _session_id: &str, _errors: &ValidationErrors) {}

    /// Receives the validated answer tree. The host owns persistence.
    async fn on_submit(&self, session_id: &str, answers: Value) -> Result<()>;
}

/// Stand-in for a backend call: waits, then accepts (or rejects) the answers.
#[derive(Debug, Clone)]
pub struct SimulatedSubmission {
    delay: Duration,
    fail: bool,
}

impl SimulatedSubmission {
    pub fn new(delay: Duration) -> Self {
        Self { delay, fail: false }
    }

    pub fn failing(delay: Duration) -> Self {
        Self { delay, fail: true }
    }
}

#[async_trait]
impl WizardHooks for SimulatedSubmission {
    async fn on_submit(&self, session_id: &str, answers: Value) -> Result<()> {
        let sections = answers.as_object().map_or(0, |sections| sections.len());
        debug!(session_id = %session_id, delay_ms = %self.delay.as_millis(), "Simulating submission");
        tokio::time::sleep(self.delay).await;

        if self.fail {
            return Err(WizardError::SubmissionFailed(
                "simulated backend rejected the submission".to_string(),
            ));
        }
        info!(session_id = %session_id, sections = %sections, "Answers handed off for case creation");
        Ok(())
    }
}

/// Drives one session through its steps.
pub struct WizardController {
    definition: Arc<WizardDefinition>,
    hooks: Arc<dyn WizardHooks>,
    session: Session,
}

impl WizardController {
    pub fn new(definition: Arc<WizardDefinition>, hooks: Arc<dyn WizardHooks>) -> Self {
        let session = Session::new_for(&definition);
        info!(
            session_id = %session.id,
            wizard_id = %definition.id,
            "Starting wizard session"
        );
        Self {
            definition,
            hooks,
            session,
        }
    }

    pub fn resume(
        definition: Arc<WizardDefinition>,
        hooks: Arc<dyn WizardHooks>,
        session: Session,
    ) -> Result<Self> {
        if session.wizard_id != definition.id {
            return Err(WizardError::WizardMismatch {
                expected: definition.id.clone(),
                found: session.wizard_id,
            });
        }
        Ok(Self {
            definition,
            hooks,
            session,
        })
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn into_session(self) -> Session {
        self.session
    }

    pub fn definition(&self) -> &WizardDefinition {
        &self.definition
    }

    pub fn form(&self) -> &FormStore {
        &self.session.form
    }

    pub fn state(&self) -> &WizardState {
        &self.session.state
    }

    pub fn errors(&self) -> &ValidationErrors {
        &self.session.state.errors
    }

    pub fn current_step(&self) -> usize {
        self.session.state.current_step
    }

    pub fn branch(&self) -> Option<String> {
        self.definition.branch_of(&self.session.form)
    }

    pub fn total_steps(&self) -> usize {
        self.definition.total_steps(self.branch().as_deref())
    }

    /// True once the synthetic success step is reached.
    pub fn is_complete(&self) -> bool {
        self.current_step() > self.total_steps()
    }

    /// Descriptor of the current data-entry step.
    pub fn current(&self) -> Result<Arc<dyn Step>> {
        self.definition
            .step(self.branch().as_deref(), self.current_step())
    }

    /// Writes one answer. The field's previous error is cleared; with
    /// `options.validate` the current step's rules are re-run for it.
    pub fn set_field(&mut self, path: &str, value: Value, options: SetOptions) -> Result<StepOutcome> {
        self.ensure_open()?;
        let path = FieldPath::parse(path)?;
        for (list, index) in path.list_entries() {
            if index >= self.session.form.len(&list) {
                return Err(WizardError::InvalidPath {
                    path: path.to_string(),
                    reason: format!("{list} has no entry {index}, add it first"),
                });
            }
        }
        let branch_before = self.branch();

        self.session.form.set_with(&path, value, options)?;
        self.session.state.errors.clear_field(path.as_str());

        if options.validate {
            if let Ok(step) = self.current() {
                let prefix = format!("{path}.");
                let result = step.validate(&self.session.form);
                for (field, message) in result.errors().iter() {
                    if field == path.as_str() || field.starts_with(&prefix) {
                        self.session.state.errors.insert(field, message);
                    }
                }
            }
        }

        self.sync_branch(branch_before);
        debug!(session_id = %self.session.id, path = %path, "Field updated");
        Ok(StepOutcome::Updated {
            path: path.to_string(),
        })
    }

    /// Appends a record to a list section, e.g. one more household member.
    pub fn add_item(&mut self, path: &str, item: Value) -> Result<StepOutcome> {
        self.ensure_open()?;
        let path = FieldPath::parse(path)?;
        let index = self.session.form.append(&path, item)?;
        self.session.state.errors.clear_field(path.as_str());
        debug!(session_id = %self.session.id, path = %path, index = %index, "List entry added");
        Ok(StepOutcome::ItemAdded {
            path: path.to_string(),
            index,
        })
    }

    pub fn remove_item(&mut self, path: &str, index: usize) -> Result<StepOutcome> {
        self.ensure_open()?;
        let path = FieldPath::parse(path)?;
        if index >= self.session.form.len(&path) {
            return Err(WizardError::InvalidPath {
                path: path.index(index).to_string(),
                reason: "no list entry at this index".to_string(),
            });
        }
        self.session.form.remove(&path.index(index));
        self.session.state.errors.shift_list(path.as_str(), index);
        debug!(session_id = %self.session.id, path = %path, index = %index, "List entry removed");
        Ok(StepOutcome::ItemRemoved {
            path: path.to_string(),
            index,
        })
    }

    /// Validates the current step and moves forward on success.
    pub fn advance(&mut self) -> Result<StepOutcome> {
        self.ensure_open()?;
        let from = self.current_step();
        if from >= self.total_steps() {
            return Err(WizardError::InvalidTransition(format!(
                "step {from} is the final step and must be submitted"
            )));
        }

        let step = self.current()?;
        let result = self.check_step(step.as_ref());
        if !result.is_valid() {
            return Ok(self.blocked(step.id(), result.into_errors()));
        }

        // The first step may just have chosen the branch.
        let total = self.total_steps();
        let to = (from + 1).min(total + 1);
        self.session.state.current_step = to;
        info!(
            session_id = %self.session.id,
            wizard_id = %self.definition.id,
            branch = ?self.branch(),
            from = %from,
            to = %to,
            total = %total,
            "Advanced to next step"
        );
        self.hooks.on_step_change(&self.session.id, to);
        Ok(StepOutcome::Advanced { from, to })
    }

    /// Moves one step back without validating. The success step is terminal.
    pub fn retreat(&mut self) -> StepOutcome {
        let from = self.current_step();
        if self.session.state.is_submitted || self.session.state.is_submitting {
            return StepOutcome::Retreated { from, to: from };
        }

        let to = from.saturating_sub(1).max(1);
        self.session.state.current_step = to;
        self.session.state.submission_error = None;
        if to != from {
            debug!(session_id = %self.session.id, from = %from, to = %to, "Moved back");
            self.hooks.on_step_change(&self.session.id, to);
        }
        StepOutcome::Retreated { from, to }
    }

    /// Validates the final step and hands the answers to the host.
    pub async fn submit(&mut self) -> Result<StepOutcome> {
        match self.begin_submission()? {
            SubmissionGate::Blocked(errors) => Ok(StepOutcome::Blocked { errors }),
            SubmissionGate::Ready(answers) => {
                let hooks = self.hooks.clone();
                let session_id = self.session.id.clone();
                let result = hooks.on_submit(&session_id, answers).await;
                Ok(self.finish_submission(result))
            }
        }
    }

    /// First half of [`Self::submit`]: checks the guard, validates the final
    /// step and marks the session as submitting.
    pub fn begin_submission(&mut self) -> Result<SubmissionGate> {
        if self.session.state.is_submitted {
            return Err(WizardError::AlreadySubmitted);
        }
        if self.session.state.is_submitting {
            return Err(WizardError::SubmissionInProgress);
        }

        let current = self.current_step();
        let total = self.total_steps();
        if current != total {
            return Err(WizardError::InvalidTransition(format!(
                "submit is only available on step {total}, current step is {current}"
            )));
        }

        let step = self.current()?;
        let result = self.check_step(step.as_ref());
        if !result.is_valid() {
            let errors = result.into_errors();
            self.blocked(step.id(), errors.clone());
            return Ok(SubmissionGate::Blocked(errors));
        }

        self.session.state.is_submitting = true;
        self.session.state.submission_error = None;
        info!(
            session_id = %self.session.id,
            wizard_id = %self.definition.id,
            "Submitting answers"
        );
        Ok(SubmissionGate::Ready(self.session.form.snapshot()))
    }

    /// Second half of [`Self::submit`]: records the host's verdict.
    pub fn finish_submission(&mut self, result: Result<()>) -> StepOutcome {
        self.session.state.is_submitting = false;
        match result {
            Ok(()) => {
                let step = self.total_steps() + 1;
                self.session.state.is_submitted = true;
                self.session.state.current_step = step;
                info!(
                    session_id = %self.session.id,
                    wizard_id = %self.definition.id,
                    "Wizard submitted"
                );
                self.hooks.on_step_change(&self.session.id, step);
                StepOutcome::Submitted { step }
            }
            Err(e) => {
                warn!(
                    session_id = %self.session.id,
                    error = %e,
                    "Submission failed, staying on final step"
                );
                let message = SUBMISSION_RETRY_MESSAGE.to_string();
                self.session.state.submission_error = Some(message.clone());
                StepOutcome::SubmissionFailed { message }
            }
        }
    }

    fn ensure_open(&self) -> Result<()> {
        if self.session.state.is_submitted {
            return Err(WizardError::AlreadySubmitted);
        }
        if self.session.state.is_submitting {
            return Err(WizardError::SubmissionInProgress);
        }
        Ok(())
    }

    /// Validates a step and replaces that step's errors with the result.
    fn check_step(&mut self, step: &dyn Step) -> ValidationResult {
        let result = step.validate(&self.session.form);
        self.session.state.errors.retain(|path| !step.owns(path));
        self.session.state.errors.merge(result.errors().clone());
        result
    }

    fn blocked(&self, step_id: &str, errors: ValidationErrors) -> StepOutcome {
        warn!(
            session_id = %self.session.id,
            step_id = %step_id,
            error_count = %errors.len(),
            fields = ?errors.paths(),
            "Step validation failed"
        );
        self.hooks.on_validation_failure(&self.session.id, &errors);
        StepOutcome::Blocked { errors }
    }

    fn sync_branch(&mut self, before: Option<String>) {
        let after = self.branch();
        if after == before {
            return;
        }
        let total = self.total_steps();
        info!(
            session_id = %self.session.id,
            from = ?before,
            to = ?after,
            total = %total,
            "Branch changed"
        );
        // Without a known branch only the shared steps exist.
        let last = self.definition.steps_for(after.as_deref()).len().max(1);
        if self.session.state.current_step > last {
            self.session.state.current_step = last;
            self.hooks.on_step_change(&self.session.id, last);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::{Check, Rule};
    use crate::step::FormStep;
    use crate::wizard::WizardBuilder;
    use serde_json::json;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder {
        steps: Mutex<Vec<usize>>,
        failures: Mutex<Vec<Vec<String>>>,
        submitted: Mutex<Option<Value>>,
        reject: bool,
    }

    #[async_trait]
    impl WizardHooks for Recorder {
        fn on_step_change(&self, _session_id: &str, step: usize) {
            self.steps.lock().unwrap().push(step);
        }

        fn on_validation_failure(&self, _session_id: &str, errors: &ValidationErrors) {
            let paths = errors.paths().into_iter().map(str::to_string).collect();
            self.failures.lock().unwrap().push(paths);
        }

        async fn on_submit(&self, _session_id: &str, answers: Value) -> Result<()> {
            if self.reject {
                return Err(WizardError::SubmissionFailed("backend down".into()));
            }
            *self.submitted.lock().unwrap() = Some(answers);
            Ok(())
        }
    }

    fn wizard() -> Arc<WizardDefinition> {
        let mode = FormStep::new("mode", "Mode")
            .rule(Rule::required("mode", "mode required"))
            .rule(Rule::new(
                "mode",
                Check::OneOf(vec!["solo".into(), "group".into()]),
                "pick a mode",
            ));
        let solo_name = FormStep::new("solo.name", "Name")
            .rule(Rule::required("solo.name", "name required"));
        let solo_confirm = FormStep::new("solo.confirm", "Confirm")
            .rule(Rule::new("solo.ok", Check::Checked, "confirm"));
        let group_confirm = FormStep::new("group.confirm", "Confirm")
            .rule(Rule::new("group.ok", Check::Checked, "confirm"));

        Arc::new(
            WizardBuilder::new("trip")
                .branch_selector("mode")
                .placeholder_steps(3)
                .add_step(Arc::new(mode))
                .add_branch_step("solo", Arc::new(solo_name))
                .add_branch_step("solo", Arc::new(solo_confirm))
                .add_branch_step("group", Arc::new(group_confirm))
                .build()
                .unwrap(),
        )
    }

    fn controller(hooks: Arc<Recorder>) -> WizardController {
        WizardController::new(wizard(), hooks)
    }

    #[test]
    fn advance_is_gated_by_the_current_step() {
        let hooks = Arc::new(Recorder::default());
        let mut wizard = controller(hooks.clone());

        let outcome = wizard.advance().unwrap();
        assert!(matches!(outcome, StepOutcome::Blocked { .. }));
        assert_eq!(wizard.current_step(), 1);
        assert_eq!(wizard.errors().get("mode"), Some("mode required"));
        assert_eq!(hooks.failures.lock().unwrap().len(), 1);

        wizard
            .set_field("mode", json!("solo"), SetOptions::default())
            .unwrap();
        assert!(wizard.errors().is_empty());
        assert_eq!(
            wizard.advance().unwrap(),
            StepOutcome::Advanced { from: 1, to: 2 }
        );
        assert_eq!(wizard.total_steps(), 3);
        assert_eq!(*hooks.steps.lock().unwrap(), vec![2]);
    }

    #[test]
    fn retreat_never_validates_and_floors_at_one() {
        let hooks = Arc::new(Recorder::default());
        let mut wizard = controller(hooks);
        assert_eq!(wizard.retreat(), StepOutcome::Retreated { from: 1, to: 1 });

        wizard.set_field("mode", json!("solo"), SetOptions::default()).unwrap();
        wizard.advance().unwrap();
        assert_eq!(wizard.retreat(), StepOutcome::Retreated { from: 2, to: 1 });
        assert!(wizard.errors().is_empty());
    }

    #[test]
    fn validated_writes_refresh_only_the_written_field() {
        let hooks = Arc::new(Recorder::default());
        let mut wizard = controller(hooks);
        wizard.set_field("mode", json!("solo"), SetOptions::default()).unwrap();
        wizard.advance().unwrap();

        wizard
            .set_field("solo.name", json!("  "), SetOptions::validated())
            .unwrap();
        assert_eq!(wizard.errors().get("solo.name"), Some("name required"));
        wizard
            .set_field("solo.name", json!("Ana"), SetOptions::validated())
            .unwrap();
        assert!(wizard.errors().is_empty());
    }

    #[test]
    fn final_step_requires_submit() {
        let hooks = Arc::new(Recorder::default());
        let mut wizard = controller(hooks);
        wizard.set_field("mode", json!("group"), SetOptions::default()).unwrap();
        wizard.advance().unwrap();
        assert_eq!(wizard.total_steps(), 2);
        assert!(matches!(
            wizard.advance(),
            Err(WizardError::InvalidTransition(_))
        ));
    }

    #[tokio::test]
    async fn submit_hands_off_answers_and_reaches_success() {
        let hooks = Arc::new(Recorder::default());
        let mut wizard = controller(hooks.clone());
        wizard.set_field("mode", json!("group"), SetOptions::default()).unwrap();
        wizard.advance().unwrap();

        let blocked = wizard.submit().await.unwrap();
        assert!(matches!(blocked, StepOutcome::Blocked { .. }));
        assert!(!wizard.state().is_submitting);

        wizard.set_field("group.ok", json!(true), SetOptions::default()).unwrap();
        assert_eq!(
            wizard.submit().await.unwrap(),
            StepOutcome::Submitted { step: 3 }
        );
        assert!(wizard.state().is_submitted);
        assert!(wizard.is_complete());
        assert_eq!(
            hooks.submitted.lock().unwrap().clone().unwrap(),
            json!({ "group": { "ok": true }, "mode": "group" })
        );

        assert_eq!(wizard.retreat(), StepOutcome::Retreated { from: 3, to: 3 });
        assert!(matches!(wizard.submit().await, Err(WizardError::AlreadySubmitted)));
        assert!(matches!(
            wizard.set_field("mode", json!("solo"), SetOptions::default()),
            Err(WizardError::AlreadySubmitted)
        ));
    }

    #[tokio::test]
    async fn rejected_submission_stays_on_the_step() {
        let hooks = Arc::new(Recorder {
            reject: true,
            ..Recorder::default()
        });
        let mut wizard = controller(hooks);
        wizard.set_field("mode", json!("group"), SetOptions::default()).unwrap();
        wizard.advance().unwrap();
        wizard.set_field("group.ok", json!(true), SetOptions::default()).unwrap();

        let outcome = wizard.submit().await.unwrap();
        assert_eq!(
            outcome,
            StepOutcome::SubmissionFailed {
                message: SUBMISSION_RETRY_MESSAGE.to_string()
            }
        );
        assert_eq!(wizard.current_step(), 2);
        assert!(!wizard.state().is_submitting);
        assert!(!wizard.state().is_submitted);
        assert_eq!(
            wizard.state().submission_error.as_deref(),
            Some(SUBMISSION_RETRY_MESSAGE)
        );
    }

    #[test]
    fn pending_submission_rejects_a_second_one() {
        let hooks = Arc::new(Recorder::default());
        let mut wizard = controller(hooks);
        wizard.set_field("mode", json!("group"), SetOptions::default()).unwrap();
        wizard.advance().unwrap();
        wizard.set_field("group.ok", json!(true), SetOptions::default()).unwrap();

        assert!(matches!(
            wizard.begin_submission().unwrap(),
            SubmissionGate::Ready(_)
        ));
        assert!(matches!(
            wizard.begin_submission(),
            Err(WizardError::SubmissionInProgress)
        ));
        wizard.finish_submission(Ok(()));
        assert!(wizard.state().is_submitted);
    }

    #[test]
    fn switching_branch_clamps_the_step_and_keeps_answers() {
        let hooks = Arc::new(Recorder::default());
        let mut wizard = controller(hooks);
        wizard.set_field("mode", json!("solo"), SetOptions::default()).unwrap();
        wizard.advance().unwrap();
        wizard.set_field("solo.name", json!("Ana"), SetOptions::default()).unwrap();
        wizard.advance().unwrap();
        assert_eq!(wizard.current_step(), 3);

        wizard.set_field("mode", json!("group"), SetOptions::default()).unwrap();
        assert_eq!(wizard.current_step(), 2);
        assert_eq!(wizard.form().get_sync::<String>("solo.name").as_deref(), Some("Ana"));
    }

    #[tokio::test]
    async fn simulated_submission_can_fail() {
        let ok = SimulatedSubmission::new(Duration::from_millis(1));
        assert!(ok.on_submit("s", json!({})).await.is_ok());
        let failing = SimulatedSubmission::failing(Duration::ZERO);
        assert!(matches!(
            failing.on_submit("s", json!({})).await,
            Err(WizardError::SubmissionFailed(_))
        ));
    }

    #[test]
    fn list_entries_keep_their_errors_when_others_are_removed() {
        let hooks = Arc::new(Recorder::default());
        let mut wizard = controller(hooks);
        wizard.add_item("people", json!({ "email": "" })).unwrap();
        wizard.add_item("people", json!({ "email": "" })).unwrap();
        wizard.session.state.errors.insert("people.1.email", "email required");

        wizard.remove_item("people", 0).unwrap();
        assert_eq!(wizard.errors().get("people.0.email"), Some("email required"));
        assert!(wizard.remove_item("people", 5).is_err());
    }

    #[test]
    fn clearing_the_branch_returns_to_the_shared_steps() {
        let hooks = Arc::new(Recorder::default());
        let mut wizard = controller(hooks.clone());
        wizard.set_field("mode", json!("solo"), SetOptions::default()).unwrap();
        wizard.advance().unwrap();
        assert_eq!(wizard.current_step(), 2);

        wizard.set_field("mode", Value::Null, SetOptions::default()).unwrap();
        assert_eq!(wizard.current_step(), 1);
        assert_eq!(wizard.total_steps(), 3);
        assert_eq!(hooks.steps.lock().unwrap().last(), Some(&1));
        assert!(matches!(wizard.advance().unwrap(), StepOutcome::Blocked { .. }));
    }

    #[test]
    fn writes_only_reach_existing_list_entries() {
        let hooks = Arc::new(Recorder::default());
        let mut wizard = controller(hooks);
        wizard.add_item("people", json!({ "email": "" })).unwrap();

        for path in ["people.1.email", "people.4000000000.email"] {
            assert!(matches!(
                wizard.set_field(path, json!("x@y.fr"), SetOptions::default()),
                Err(WizardError::InvalidPath { .. })
            ));
        }
        assert!(wizard
            .set_field("people.email", json!("x@y.fr"), SetOptions::default())
            .is_err());
        assert_eq!(wizard.form().snapshot()["people"], json!([{ "email": "" }]));

        wizard
            .set_field("people.0.email", json!("x@y.fr"), SetOptions::default())
            .unwrap();
        assert_eq!(wizard.form().len(&FieldPath::parse("people").unwrap()), 1);
    }
}
