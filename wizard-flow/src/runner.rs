//! WizardRunner – loads a session, applies exactly **one** command, and saves
//! the session back to storage.
//!
//! Hosts that drive a wizard one user action at a time (a terminal prompt, a
//! replayed script) use this instead of holding a [`WizardController`]
//! across calls. For a submission the session is saved with its
//! `is_submitting` flag raised *before* the host hook is awaited, so a second
//! submit for the same session is rejected until the first one settles.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tracing::info;

use crate::{
    controller::{StepOutcome, SubmissionGate, WizardController, WizardHooks},
    error::{Result, WizardError},
    storage::{Session, SessionStorage},
    store::SetOptions,
    wizard::WizardDefinition,
};

/// One user action against a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum WizardCommand {
    Set {
        path: String,
        value: Value,
        #[serde(default)]
        validate: bool,
    },
    AddItem {
        path: String,
        #[serde(default)]
        item: Value,
    },
    RemoveItem {
        path: String,
        index: usize,
    },
    Next,
    Previous,
    Submit,
}

/// High-level helper that orchestrates the _load → apply → save_ pattern.
#[derive(Clone)]
pub struct WizardRunner {
    definition: Arc<WizardDefinition>,
    storage: Arc<dyn SessionStorage>,
    hooks: Arc<dyn WizardHooks>,
}

impl WizardRunner {
    pub fn new(
        definition: Arc<WizardDefinition>,
        storage: Arc<dyn SessionStorage>,
        hooks: Arc<dyn WizardHooks>,
    ) -> Self {
        Self {
            definition,
            storage,
            hooks,
        }
    }

    pub fn definition(&self) -> &Arc<WizardDefinition> {
        &self.definition
    }

    /// Creates and stores a fresh session.
    pub async fn start(&self) -> Result<Session> {
        let controller = WizardController::new(self.definition.clone(), self.hooks.clone());
        let session = controller.into_session();
        self.storage.save(session.clone()).await?;
        Ok(session)
    }

    pub async fn load(&self, session_id: &str) -> Result<Session> {
        self.storage
            .get(session_id)
            .await?
            .ok_or_else(|| WizardError::SessionNotFound(session_id.to_string()))
    }

    /// Loads a copy of the session as a controller. Nothing done through it
    /// is stored unless the session is saved back.
    pub async fn controller(&self, session_id: &str) -> Result<WizardController> {
        let session = self.load(session_id).await?;
        WizardController::resume(self.definition.clone(), self.hooks.clone(), session)
    }

    /// Applies **one** command and persists the resulting session.
    pub async fn run(&self, session_id: &str, command: WizardCommand) -> Result<StepOutcome> {
        let mut controller = self.controller(session_id).await?;

        let outcome = match command {
            WizardCommand::Set {
                path,
                value,
                validate,
            } => {
                let options = if validate {
                    SetOptions::validated()
                } else {
                    SetOptions::default()
                };
                controller.set_field(&path, value, options)?
            }
            WizardCommand::AddItem { path, item } => controller.add_item(&path, item)?,
            WizardCommand::RemoveItem { path, index } => controller.remove_item(&path, index)?,
            WizardCommand::Next => controller.advance()?,
            WizardCommand::Previous => controller.retreat(),
            WizardCommand::Submit => return self.submit(controller).await,
        };

        self.storage.save(controller.into_session()).await?;
        Ok(outcome)
    }

    async fn submit(&self, mut controller: WizardController) -> Result<StepOutcome> {
        let answers = match controller.begin_submission()? {
            SubmissionGate::Blocked(errors) => {
                self.storage.save(controller.into_session()).await?;
                return Ok(StepOutcome::Blocked { errors });
            }
            SubmissionGate::Ready(answers) => answers,
        };

        // Persist the in-flight flag so concurrent submits collapse.
        self.storage.save(controller.session().clone()).await?;

        let session_id = controller.session().id.clone();
        info!(session_id = %session_id, "Handing answers to host");
        let result = self.hooks.on_submit(&session_id, answers).await;
        let outcome = controller.finish_submission(result);

        self.storage.save(controller.into_session()).await?;
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::SimulatedSubmission;
    use crate::rules::{Check, Rule};
    use crate::step::FormStep;
    use crate::storage::InMemorySessionStorage;
    use crate::wizard::WizardBuilder;
    use serde_json::json;
    use std::time::Duration;

    fn runner(hooks: Arc<dyn WizardHooks>) -> WizardRunner {
        let definition = WizardBuilder::new("contact")
            .add_step(Arc::new(
                FormStep::new("contact.name", "Name")
                    .rule(Rule::required("contact.name", "name required")),
            ))
            .add_step(Arc::new(
                FormStep::new("contact.confirm", "Confirm")
                    .rule(Rule::new("contact.ok", Check::Checked, "confirm")),
            ))
            .build()
            .unwrap();
        WizardRunner::new(
            Arc::new(definition),
            Arc::new(InMemorySessionStorage::new()),
            hooks,
        )
    }

    #[tokio::test]
    async fn commands_are_applied_and_persisted() {
        let runner = runner(Arc::new(SimulatedSubmission::new(Duration::ZERO)));
        let session = runner.start().await.unwrap();

        let blocked = runner.run(&session.id, WizardCommand::Next).await.unwrap();
        assert!(matches!(blocked, StepOutcome::Blocked { .. }));
        let stored = runner.load(&session.id).await.unwrap();
        assert_eq!(stored.state.errors.get("contact.name"), Some("name required"));

        let commands: Vec<WizardCommand> = serde_json::from_value(json!([
            { "command": "set", "path": "contact.name", "value": "Ana" },
            { "command": "next" },
            { "command": "set", "path": "contact.ok", "value": true },
            { "command": "submit" }
        ]))
        .unwrap();
        let mut last = None;
        for command in commands {
            last = Some(runner.run(&session.id, command).await.unwrap());
        }
        assert_eq!(last, Some(StepOutcome::Submitted { step: 3 }));

        let stored = runner.load(&session.id).await.unwrap();
        assert!(stored.state.is_submitted);
        assert!(stored.state.errors.is_empty());
    }

    #[tokio::test]
    async fn concurrent_submits_collapse_into_one() {
        let runner = runner(Arc::new(SimulatedSubmission::new(Duration::from_millis(50))));
        let session = runner.start().await.unwrap();
        for command in [
            WizardCommand::Set {
                path: "contact.name".into(),
                value: json!("Ana"),
                validate: false,
            },
            WizardCommand::Next,
            WizardCommand::Set {
                path: "contact.ok".into(),
                value: json!(true),
                validate: true,
            },
        ] {
            runner.run(&session.id, command).await.unwrap();
        }

        let (first, second) = tokio::join!(
            runner.run(&session.id, WizardCommand::Submit),
            runner.run(&session.id, WizardCommand::Submit)
        );
        assert_eq!(first.unwrap(), StepOutcome::Submitted { step: 3 });
        assert!(matches!(second, Err(WizardError::SubmissionInProgress)));
    }

    #[tokio::test]
    async fn unknown_sessions_are_reported() {
        let runner = runner(Arc::new(SimulatedSubmission::new(Duration::ZERO)));
        assert!(matches!(
            runner.run("missing", WizardCommand::Previous).await,
            Err(WizardError::SessionNotFound(_))
        ));
    }
}
