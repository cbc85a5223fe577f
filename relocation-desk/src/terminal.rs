//! Line-oriented driver: one user command per line, one runner command per
//! user command.

use anyhow::Result;
use serde_json::Value;
use std::io::Write;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::debug;
use wizard_flow::path::pattern_matches;
use wizard_flow::{FieldKind, FieldPath, StepOutcome, WizardCommand, WizardController, WizardRunner};

use crate::steps::{person_template, sections};

const HELP: &str = "\
Commandes :
  show                       afficher l'étape courante
  set <champ> <valeur>       renseigner un champ (JSON ou texte)
  add-person                 ajouter une personne à reloger
  remove-person <n>          retirer la personne n (à partir de 1)
  next                       valider l'étape et continuer
  back                       revenir à l'étape précédente
  submit                     envoyer la demande (dernière étape)
  answers                    afficher toutes les réponses
  help                       afficher cette aide
  quit                       quitter";

/// A parsed input line.
#[derive(Debug, Clone, PartialEq)]
pub enum Input {
    Show,
    /// `set`: the value is typed once the target field is known.
    Set { path: String, raw: String },
    Command(WizardCommand),
    Answers,
    Help,
    Quit,
}

/// Parses one line.
pub fn parse_line(line: &str) -> std::result::Result<Option<Input>, String> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }
    let (verb, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
    let rest = rest.trim();

    let input = match verb {
        "show" => Input::Show,
        "next" => Input::Command(WizardCommand::Next),
        "back" | "previous" => Input::Command(WizardCommand::Previous),
        "submit" => Input::Command(WizardCommand::Submit),
        "answers" => Input::Answers,
        "help" => Input::Help,
        "quit" | "exit" => Input::Quit,
        "set" => {
            let (path, raw) = rest.split_once(char::is_whitespace).unwrap_or((rest, ""));
            if path.is_empty() {
                return Err("usage : set <champ> <valeur>".to_string());
            }
            Input::Set {
                path: path.to_string(),
                raw: raw.trim().to_string(),
            }
        }
        "add-person" => Input::Command(WizardCommand::AddItem {
            path: sections::MULTIPLE_RELOCATION_REQUESTS.to_string(),
            item: person_template(),
        }),
        "remove-person" => {
            let number: usize = rest
                .parse()
                .ok()
                .filter(|n| *n >= 1)
                .ok_or_else(|| "usage : remove-person <n>, n à partir de 1".to_string())?;
            Input::Command(WizardCommand::RemoveItem {
                path: sections::MULTIPLE_RELOCATION_REQUESTS.to_string(),
                index: number - 1,
            })
        }
        other => return Err(format!("commande inconnue : {other} (tapez help)")),
    };
    Ok(Some(input))
}

/// Types a `set` value for its field. Text fields keep what was typed, so
/// `33000` stays a postal code; other fields read JSON first and fall back
/// to text, so `set a.b 3` stores a number and `set a.b Paris` a string.
pub fn parse_value(raw: &str, kind: Option<&FieldKind>) -> Value {
    if raw.is_empty() {
        return Value::String(String::new());
    }
    let parsed = serde_json::from_str::<Value>(raw);
    match kind {
        Some(FieldKind::Text | FieldKind::Date | FieldKind::Choice(_) | FieldKind::File) => {
            match parsed {
                Ok(Value::String(text)) => Value::String(text),
                _ => Value::String(raw.to_string()),
            }
        }
        _ => parsed.unwrap_or_else(|_| Value::String(raw.to_string())),
    }
}

/// Kind of the field a path addresses, looked up across the steps of the
/// current branch.
fn field_kind(controller: &WizardController, path: &str) -> Option<FieldKind> {
    let branch = controller.branch();
    controller
        .definition()
        .steps_for(branch.as_deref())
        .iter()
        .find_map(|step| {
            step.fields()
                .iter()
                .find(|field| pattern_matches(&field.path, path))
                .map(|field| field.kind.clone())
        })
}

/// Runs one session until `quit` or end of input. Returns the session id.
pub async fn run_session<R, W>(runner: &WizardRunner, input: R, out: &mut W) -> Result<String>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    let session = runner.start().await?;
    let session_id = session.id;
    writeln!(out, "Session {session_id} ({})", runner.definition().id)?;
    render(&runner.controller(&session_id).await?, out)?;

    let mut lines = input.lines();
    while let Some(line) = lines.next_line().await? {
        let input = match parse_line(&line) {
            Ok(Some(input)) => input,
            Ok(None) => continue,
            Err(message) => {
                writeln!(out, "{message}")?;
                continue;
            }
        };
        debug!(session_id = %session_id, input = ?input, "Terminal input");

        match input {
            Input::Quit => break,
            Input::Help => writeln!(out, "{HELP}")?,
            Input::Show => render(&runner.controller(&session_id).await?, out)?,
            Input::Answers => {
                let controller = runner.controller(&session_id).await?;
                writeln!(out, "{}", serde_json::to_string_pretty(&controller.form().snapshot())?)?;
            }
            Input::Set { path, raw } => {
                let controller = runner.controller(&session_id).await?;
                let value = parse_value(&raw, field_kind(&controller, &path).as_ref());
                let command = WizardCommand::Set {
                    path,
                    value,
                    validate: true,
                };
                apply(runner, &session_id, command, out).await?;
            }
            Input::Command(command) => apply(runner, &session_id, command, out).await?,
        }
    }

    Ok(session_id)
}

async fn apply<W: Write>(
    runner: &WizardRunner,
    session_id: &str,
    command: WizardCommand,
    out: &mut W,
) -> Result<()> {
    match runner.run(session_id, command).await {
        Ok(outcome) => report(runner, session_id, outcome, out).await,
        Err(e) => {
            writeln!(out, "Erreur : {e}")?;
            Ok(())
        }
    }
}

async fn report<W: Write>(
    runner: &WizardRunner,
    session_id: &str,
    outcome: StepOutcome,
    out: &mut W,
) -> Result<()> {
    let controller = runner.controller(session_id).await?;
    match outcome {
        StepOutcome::Updated { path } => match controller.errors().get(&path) {
            Some(message) => writeln!(out, "  ! {path} : {message}")?,
            None => writeln!(out, "  ok")?,
        },
        StepOutcome::ItemAdded { index, .. } => {
            writeln!(out, "Personne {} ajoutée", index + 1)?;
            render(&controller, out)?;
        }
        StepOutcome::ItemRemoved { index, .. } => {
            writeln!(out, "Personne {} retirée", index + 1)?;
            render(&controller, out)?;
        }
        StepOutcome::Blocked { errors } => {
            writeln!(out, "Veuillez corriger les champs suivants :")?;
            for (path, message) in errors.iter() {
                writeln!(out, "  ! {path} : {message}")?;
            }
        }
        StepOutcome::Advanced { .. } | StepOutcome::Retreated { .. } => render(&controller, out)?,
        StepOutcome::Submitted { .. } => render(&controller, out)?,
        StepOutcome::SubmissionFailed { message } => writeln!(out, "!! {message}")?,
    }
    Ok(())
}

/// Prints the current step: position, title, fields with their answers and
/// errors.
pub fn render<W: Write>(controller: &WizardController, out: &mut W) -> Result<()> {
    if controller.is_complete() {
        writeln!(out, "Merci, votre demande a bien été enregistrée.")?;
        return Ok(());
    }

    let step = controller.current()?;
    writeln!(
        out,
        "\nÉtape {}/{} : {}",
        controller.current_step(),
        controller.total_steps(),
        step.title()
    )?;
    if let Some(message) = &controller.state().submission_error {
        writeln!(out, "!! {message}")?;
    }

    let form = controller.form();
    let errors = controller.errors();
    for field in step.fields() {
        for path in concrete_paths(&field.path, controller) {
            let value = FieldPath::parse(&path)
                .ok()
                .and_then(|path| form.value(&path));
            writeln!(out, "  {} [{path}] : {}", field.label, display(&field.kind, value.as_ref()))?;
            if let Some(message) = errors.get(&path) {
                writeln!(out, "    ! {message}")?;
            }
        }
    }
    Ok(())
}

/// Concrete paths a field pattern currently stands for.
fn concrete_paths(pattern: &str, controller: &WizardController) -> Vec<String> {
    let Some((list, field)) = pattern.split_once(".*.") else {
        return vec![pattern.to_string()];
    };
    let len = FieldPath::parse(list)
        .map(|path| controller.form().len(&path))
        .unwrap_or(0);
    (0..len).map(|index| format!("{list}.{index}.{field}")).collect()
}

fn display(kind: &FieldKind, value: Option<&Value>) -> String {
    match (kind, value) {
        (_, None) => "-".to_string(),
        (FieldKind::Boolean, Some(Value::Bool(true))) => "oui".to_string(),
        (FieldKind::Boolean, Some(Value::Bool(false))) => "non".to_string(),
        (FieldKind::List, Some(Value::Array(items))) => format!("{} élément(s)", items.len()),
        (_, Some(Value::String(s))) => s.clone(),
        (_, Some(other)) => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cases::CaseDirectory;
    use crate::config::DeskConfig;
    use crate::host::Desk;
    use crate::wizards::WizardKind;
    use serde_json::json;
    use std::sync::Arc;
    use wizard_flow::SUBMISSION_RETRY_MESSAGE;

    fn desk(fail: bool) -> Desk {
        Desk::new(
            DeskConfig::default().with_overrides(Some(0), fail),
            Arc::new(CaseDirectory::empty()),
        )
    }

    const PROPERTY_SESSION: &str = "\
set propertyType.kind apartment
set propertyType.title Studio calme centre
next
set propertyAddress.street 9 cours de l'Intendance
set propertyAddress.postalCode \"33000\"
set propertyAddress.city Bordeaux
next
set propertyDetails.surface 28
set propertyDetails.rooms 1
set propertyDetails.bedrooms 0
set propertyDetails.bathrooms 1
set propertyDetails.maxOccupants 2
next
set propertyAvailability.availableFrom 2031-03-01
next
set propertyPricing.nightlyRate 60
next
set propertyHost.hostName Jean Morel
set propertyHost.hostEmail jean@example.fr
set propertyHost.hostPhone 0612345678
set propertyHost.confirmAccuracy true
submit
";

    #[test]
    fn set_lines_keep_the_raw_value() {
        assert_eq!(
            parse_line("set a.city Saint-Denis de la Réunion").unwrap(),
            Some(Input::Set {
                path: "a.city".to_string(),
                raw: "Saint-Denis de la Réunion".to_string(),
            })
        );
        assert_eq!(parse_line("   ").unwrap(), None);
        assert!(parse_line("set").is_err());
        assert!(parse_line("dance").is_err());
        assert!(parse_line("remove-person 0").is_err());
    }

    #[test]
    fn values_follow_the_field_kind() {
        assert_eq!(parse_value("3", Some(&FieldKind::Number)), json!(3));
        assert_eq!(parse_value("true", Some(&FieldKind::Boolean)), json!(true));
        assert_eq!(parse_value("33000", Some(&FieldKind::Text)), json!("33000"));
        assert_eq!(parse_value("\"33000\"", Some(&FieldKind::Text)), json!("33000"));
        assert_eq!(parse_value("2031-05-01", Some(&FieldKind::Date)), json!("2031-05-01"));
        assert_eq!(parse_value("0612345678", None), json!("0612345678"));
        assert_eq!(parse_value("{\"city\": \"Lyon\"}", None), json!({ "city": "Lyon" }));
    }

    #[tokio::test]
    async fn property_session_reaches_success() {
        let desk = desk(false);
        let runner = desk.runner(WizardKind::Property).unwrap();
        let mut out = Vec::new();

        let session_id = run_session(&runner, PROPERTY_SESSION.as_bytes(), &mut out)
            .await
            .unwrap();

        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("Étape 6/6"), "{text}");
        assert!(text.contains("bien été enregistrée"), "{text}");
        assert!(runner.load(&session_id).await.unwrap().state.is_submitted);
        assert_eq!(desk.directory().listings().len(), 1);
    }

    #[tokio::test]
    async fn failed_submission_is_shown_and_can_be_retried() {
        let desk = desk(true);
        let runner = desk.runner(WizardKind::Property).unwrap();
        let mut out = Vec::new();

        let session_id = run_session(&runner, PROPERTY_SESSION.as_bytes(), &mut out)
            .await
            .unwrap();

        let text = String::from_utf8(out).unwrap();
        assert!(text.contains(SUBMISSION_RETRY_MESSAGE), "{text}");
        let session = runner.load(&session_id).await.unwrap();
        assert!(!session.state.is_submitted);
        assert!(!session.state.is_submitting);
        assert_eq!(session.state.current_step, 6);
    }

    #[tokio::test]
    async fn invalid_fields_are_reported_inline() {
        let desk = desk(false);
        let runner = desk.runner(WizardKind::Relocation).unwrap();
        let mut out = Vec::new();
        let script = "next\nset relocationType multiple\nnext\nset multipleDisasterAddress.postalCode 123\nquit\n";

        run_session(&runner, script.as_bytes(), &mut out).await.unwrap();

        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("Veuillez sélectionner un type de relogement"), "{text}");
        assert!(text.contains("Étape 2/6"), "{text}");
        assert!(text.contains("Le code postal doit contenir 5 chiffres"), "{text}");
    }

    fn single_session(arrival: &str) -> String {
        format!(
            "\
set relocationType single
next
set singleInsuranceCoverage.hasInsurance false
next
set singleInsuredData.firstName Marie
set singleInsuredData.lastName Dupont
set singleInsuredData.email marie.dupont@example.fr
set singleInsuranceDetails.insuranceCompany MAIF
set singleInsuranceDetails.policyNumber 20240118
next
set singleDisasterAddress.street 12 rue des Lilas
set singleDisasterAddress.postalCode 33000
set singleDisasterAddress.city Bordeaux
next
set singlePersonalData.firstName Marie
set singlePersonalData.lastName Dupont
set singlePersonalData.email marie.dupont@example.fr
set singlePersonalData.phone 0612345678
next
set singleRelocationPreferences.bedrooms 2
set singleRelocationPreferences.adults 1
next
set singleArrivalDetails.arrivalDate {arrival}
set singleArrivalDetails.estimatedDuration Quelques semaines
next
set singleConsent.acceptTerms true
set singleConsent.acceptDataProcessing true
submit
"
        )
    }

    #[tokio::test]
    async fn digits_typed_into_text_fields_reach_the_case() {
        let desk = desk(false);
        let runner = desk.runner(WizardKind::Relocation).unwrap();
        let tomorrow = (chrono::Local::now().date_naive() + chrono::Duration::days(1))
            .format("%Y-%m-%d")
            .to_string();
        let mut out = Vec::new();

        let session_id = run_session(&runner, single_session(&tomorrow).as_bytes(), &mut out)
            .await
            .unwrap();

        let text = String::from_utf8(out).unwrap();
        assert!(!text.contains(SUBMISSION_RETRY_MESSAGE), "{text}");
        assert!(text.contains("bien été enregistrée"), "{text}");

        let session = runner.load(&session_id).await.unwrap();
        assert!(session.state.is_submitted);
        assert_eq!(
            session.form.snapshot()["singleDisasterAddress"]["postalCode"],
            json!("33000")
        );

        let cases = desk.directory().relocation_cases(None);
        assert_eq!(cases.len(), 1);
        let case = &cases[0];
        assert_eq!(case.disaster_address.postal_code, "33000");
        assert_eq!(case.insured.phone, "0612345678");
        assert_eq!(case.household.adults, 1);
        assert_eq!(case.bedrooms, 2);
        assert_eq!(case.estimated_duration.as_deref(), Some("Quelques semaines"));
        assert_eq!(case.number_of_nights, None);
    }

    #[tokio::test]
    async fn out_of_range_entries_are_refused_without_growing_the_list() {
        let desk = desk(false);
        let runner = desk.runner(WizardKind::Relocation).unwrap();
        let mut out = Vec::new();
        let script = "\
set relocationType multiple
add-person
set multipleRelocationRequests.4000000000.email x@y.fr
set multipleRelocationRequests.email x@y.fr
quit
";

        let session_id = run_session(&runner, script.as_bytes(), &mut out).await.unwrap();

        let text = String::from_utf8(out).unwrap();
        assert_eq!(text.matches("Erreur : Invalid field path").count(), 2, "{text}");
        let session = runner.load(&session_id).await.unwrap();
        let people = &session.form.snapshot()["multipleRelocationRequests"];
        assert_eq!(people.as_array().map(Vec::len), Some(1));
        assert_eq!(people[0]["email"], json!(""));
    }
}
