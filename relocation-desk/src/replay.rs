//! Replays a recorded answers script against a fresh session.

use anyhow::{Context as _, Result, bail};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;
use tracing::{info, warn};
use wizard_flow::{StepOutcome, ValidationErrors, WizardCommand, WizardRunner};

/// A sequence of wizard commands, as written in a `.json`, `.yaml` or `.yml`
/// file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Script {
    /// Wizard the script was recorded for, checked when present.
    #[serde(default)]
    pub wizard: Option<String>,
    pub commands: Vec<WizardCommand>,
}

impl Script {
    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).context("invalid JSON script")
    }

    pub fn from_yaml(text: &str) -> Result<Self> {
        serde_yaml::from_str(text).context("invalid YAML script")
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("cannot read script {}", path.display()))?;
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("yaml" | "yml") => Self::from_yaml(&text),
            _ => Self::from_json(&text),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ReplayStep {
    pub line: usize,
    pub command: WizardCommand,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outcome: Option<StepOutcome>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReplayReport {
    pub session_id: String,
    pub wizard_id: String,
    pub steps: Vec<ReplayStep>,
    pub current_step: usize,
    pub total_steps: usize,
    pub submitted: bool,
    pub errors: ValidationErrors,
    pub submission_error: Option<String>,
    pub answers: Value,
}

/// Feeds every command to a new session, one runner call each. Rejected
/// commands are recorded and the replay goes on.
pub async fn replay(runner: &WizardRunner, script: Script) -> Result<ReplayReport> {
    let wizard_id = runner.definition().id.clone();
    if let Some(expected) = &script.wizard {
        if *expected != wizard_id {
            bail!("script was recorded for the {expected} wizard, not {wizard_id}");
        }
    }

    let session = runner.start().await?;
    info!(session_id = %session.id, wizard_id = %wizard_id, commands = %script.commands.len(), "Replaying script");

    let mut steps = Vec::with_capacity(script.commands.len());
    for (index, command) in script.commands.into_iter().enumerate() {
        let (outcome, error) = match runner.run(&session.id, command.clone()).await {
            Ok(outcome) => (Some(outcome), None),
            Err(e) => {
                warn!(session_id = %session.id, line = %(index + 1), error = %e, "Command rejected");
                (None, Some(e.to_string()))
            }
        };
        steps.push(ReplayStep {
            line: index + 1,
            command,
            outcome,
            error,
        });
    }

    let controller = runner.controller(&session.id).await?;
    Ok(ReplayReport {
        session_id: session.id,
        wizard_id,
        steps,
        current_step: controller.current_step(),
        total_steps: controller.total_steps(),
        submitted: controller.state().is_submitted,
        errors: controller.errors().clone(),
        submission_error: controller.state().submission_error.clone(),
        answers: controller.form().snapshot(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cases::CaseDirectory;
    use crate::config::DeskConfig;
    use crate::host::Desk;
    use crate::wizards::WizardKind;
    use std::sync::Arc;

    const MULTIPLE_YAML: &str = r#"
wizard: relocation
commands:
  - command: set
    path: relocationType
    value: multiple
  - command: next
  - command: set
    path: multipleDisasterAddress
    value: { street: "3 place Gambetta", postalCode: "31000", city: "Toulouse" }
  - command: next
  - command: set
    path: multiplePersonalData
    value: { firstName: Claire, lastName: Lefèvre, email: claire@example.fr, phone: "0698765432" }
  - command: next
  - command: next
  - command: add_item
    path: multipleRelocationRequests
    item: { firstName: Claire, lastName: Lefèvre, email: claire@example.fr, adults: 2, children: 1, bedrooms: 2 }
  - command: add_item
    path: multipleRelocationRequests
    item: { firstName: Hugo, lastName: Lefèvre, email: "", adults: 1, children: 0, bedrooms: 1 }
  - command: next
  - command: set
    path: multipleRelocationRequests.1.email
    value: hugo@example.fr
  - command: next
  - command: set
    path: multipleArrivalDetails.arrivalDate
    value: "2031-01-10"
  - command: set
    path: multipleArrivalDetails.estimatedDuration
    value: Quelques mois
  - command: next
  - command: set
    path: multipleConsent
    value: { acceptTerms: true, acceptDataProcessing: true }
  - command: submit
  - command: previous
"#;

    fn desk() -> Desk {
        Desk::new(
            DeskConfig::default().with_overrides(Some(0), false),
            Arc::new(CaseDirectory::empty()),
        )
    }

    #[test]
    fn json_scripts_parse() {
        let script = Script::from_json(
            r#"{ "commands": [
                { "command": "set", "path": "relocationType", "value": "single", "validate": true },
                { "command": "remove_item", "path": "multipleRelocationRequests", "index": 0 },
                { "command": "next" }
            ] }"#,
        )
        .unwrap();
        assert_eq!(script.wizard, None);
        assert_eq!(script.commands.len(), 3);
        assert_eq!(script.commands[2], WizardCommand::Next);
    }

    #[tokio::test]
    async fn multiple_branch_script_replays_to_success() {
        let desk = desk();
        let runner = desk.runner(WizardKind::Relocation).unwrap();
        let script = Script::from_yaml(MULTIPLE_YAML).unwrap();

        let report = replay(&runner, script).await.unwrap();

        // The empty request list blocks the first attempt, the missing email
        // the second.
        let blocked: Vec<usize> = report
            .steps
            .iter()
            .filter(|step| matches!(step.outcome, Some(StepOutcome::Blocked { .. })))
            .map(|step| step.line)
            .collect();
        assert_eq!(blocked, vec![7, 10]);

        assert!(report.submitted, "{report:#?}");
        assert_eq!(report.total_steps, 6);
        assert_eq!(report.current_step, 7);
        // Success is terminal.
        assert_eq!(
            report.steps.last().and_then(|step| step.outcome.clone()),
            Some(StepOutcome::Retreated { from: 7, to: 7 })
        );

        let cases = desk.directory().relocation_cases(None);
        assert_eq!(cases.len(), 1);
        assert_eq!(cases[0].people.len(), 2);
    }

    #[tokio::test]
    async fn bundled_scripts_submit() {
        let desk = desk();
        for (kind, script) in [
            (WizardKind::Relocation, Script::from_yaml(include_str!("../scripts/single.yaml"))),
            (WizardKind::Property, Script::from_json(include_str!("../scripts/property.json"))),
        ] {
            let runner = desk.runner(kind).unwrap();
            let report = replay(&runner, script.unwrap()).await.unwrap();
            assert!(report.submitted, "{kind}: {report:#?}");
            assert!(report.steps.iter().all(|step| step.error.is_none()));
        }

        let case = &desk.directory().relocation_cases(None)[0];
        assert_eq!(case.number_of_nights, Some(28));
        assert_eq!(desk.directory().listings()[0].amenities, vec!["wifi", "parking"]);
    }

    #[tokio::test]
    async fn scripts_for_another_wizard_are_refused() {
        let desk = desk();
        let runner = desk.runner(WizardKind::Property).unwrap();
        let script = Script::from_yaml(MULTIPLE_YAML).unwrap();

        assert!(replay(&runner, script).await.is_err());
    }

    #[tokio::test]
    async fn rejected_commands_are_recorded() {
        let desk = desk();
        let runner = desk.runner(WizardKind::Relocation).unwrap();
        let script = Script::from_json(
            r#"{ "commands": [ { "command": "submit" }, { "command": "set", "path": "a..b", "value": 1 } ] }"#,
        )
        .unwrap();

        let report = replay(&runner, script).await.unwrap();
        assert!(report.steps.iter().all(|step| step.error.is_some()));
        assert_eq!(report.current_step, 1);
    }
}
