//! Glue between the wizards and the case directory.

use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info, warn};
use wizard_flow::{
    InMemorySessionStorage, Result, SessionStorage, SimulatedSubmission, ValidationErrors,
    WizardError, WizardHooks, WizardRunner,
};

use crate::cases::CaseDirectory;
use crate::config::DeskConfig;
use crate::wizards::WizardKind;

/// Submission hooks of the desk: the simulated backend call, then the case
/// or listing is recorded in the directory.
pub struct DeskHooks {
    kind: WizardKind,
    backend: SimulatedSubmission,
    directory: Arc<CaseDirectory>,
}

impl DeskHooks {
    pub fn new(kind: WizardKind, config: &DeskConfig, directory: Arc<CaseDirectory>) -> Self {
        let backend = if config.fail_submission {
            SimulatedSubmission::failing(config.submit_delay)
        } else {
            SimulatedSubmission::new(config.submit_delay)
        };
        Self {
            kind,
            backend,
            directory,
        }
    }
}

#[async_trait]
impl WizardHooks for DeskHooks {
    fn on_step_change(&self, session_id: &str, step: usize) {
        debug!(session_id = %session_id, wizard = %self.kind, step = %step, "Step changed");
    }

    fn on_validation_failure(&self, session_id: &str, errors: &ValidationErrors) {
        debug!(session_id = %session_id, wizard = %self.kind, fields = ?errors.paths(), "Answers rejected");
    }

    async fn on_submit(&self, session_id: &str, answers: Value) -> Result<()> {
        self.backend.on_submit(session_id, answers.clone()).await?;

        let recorded = match self.kind {
            WizardKind::Relocation => self
                .directory
                .register_relocation(&answers)
                .map(|case| case.reference),
            WizardKind::Property => self
                .directory
                .register_listing(&answers)
                .map(|listing| listing.id),
        };

        match recorded {
            Ok(reference) => {
                info!(session_id = %session_id, wizard = %self.kind, reference = %reference, "Submission recorded");
                Ok(())
            }
            Err(e) => {
                warn!(session_id = %session_id, error = %e, "Could not record submission");
                Err(WizardError::SubmissionFailed(e.to_string()))
            }
        }
    }
}

/// The desk: one shared case directory and a runner per wizard.
pub struct Desk {
    config: DeskConfig,
    directory: Arc<CaseDirectory>,
    storage: Arc<dyn SessionStorage>,
}

impl Desk {
    pub fn new(config: DeskConfig, directory: Arc<CaseDirectory>) -> Self {
        Self {
            config,
            directory,
            storage: Arc::new(InMemorySessionStorage::new()),
        }
    }

    pub fn directory(&self) -> &Arc<CaseDirectory> {
        &self.directory
    }

    pub fn runner(&self, kind: WizardKind) -> Result<WizardRunner> {
        let definition = Arc::new(kind.definition()?);
        let hooks = Arc::new(DeskHooks::new(kind, &self.config, self.directory.clone()));
        Ok(WizardRunner::new(definition, self.storage.clone(), hooks))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::time::Duration;

    fn config(fail: bool) -> DeskConfig {
        DeskConfig::default().with_overrides(Some(0), fail)
    }

    fn listing_answers() -> Value {
        json!({
            "propertyType": { "kind": "house", "title": "Maison avec jardin" },
            "propertyAddress": { "street": "15 allée des Pins", "postalCode": "33700", "city": "Mérignac" },
            "propertyDetails": { "surface": 110, "rooms": 5, "bedrooms": 3, "bathrooms": 2, "maxOccupants": 6 },
            "propertyAvailability": { "availableFrom": "2031-01-01", "amenities": ["wifi"] },
            "propertyPricing": { "nightlyRate": 120 },
            "propertyHost": {
                "hostName": "Anne Moreau", "hostEmail": "anne@example.fr",
                "hostPhone": "0650607080", "confirmAccuracy": true
            }
        })
    }

    #[tokio::test]
    async fn property_submission_registers_a_listing() {
        let directory = Arc::new(CaseDirectory::empty());
        let hooks = DeskHooks::new(WizardKind::Property, &config(false), directory.clone());

        hooks.on_submit("session", listing_answers()).await.unwrap();

        let listings = directory.listings();
        assert_eq!(listings.len(), 1);
        assert_eq!(listings[0].host.name, "Anne Moreau");
        assert_eq!(listings[0].amenities, vec!["wifi".to_string()]);
    }

    #[tokio::test]
    async fn backend_failure_records_nothing() {
        let directory = Arc::new(CaseDirectory::empty());
        let hooks = DeskHooks::new(WizardKind::Property, &config(true), directory.clone());

        let err = hooks.on_submit("session", listing_answers()).await.unwrap_err();
        assert!(matches!(err, WizardError::SubmissionFailed(_)));
        assert!(directory.listings().is_empty());
    }

    #[tokio::test]
    async fn malformed_answers_fail_the_submission() {
        let directory = Arc::new(CaseDirectory::empty());
        let hooks = DeskHooks::new(WizardKind::Relocation, &config(false), directory.clone());

        let err = hooks
            .on_submit("session", json!({ "relocationType": "single" }))
            .await
            .unwrap_err();
        assert!(matches!(err, WizardError::SubmissionFailed(_)));
        assert!(directory.relocation_cases(None).is_empty());
    }

    #[tokio::test]
    async fn runners_share_one_storage() {
        let desk = Desk::new(
            DeskConfig {
                submit_delay: Duration::ZERO,
                ..DeskConfig::default()
            },
            Arc::new(CaseDirectory::seeded()),
        );
        let relocation = desk.runner(WizardKind::Relocation).unwrap();
        let session = relocation.start().await.unwrap();
        assert_eq!(session.wizard_id, "relocation");

        let property = desk.runner(WizardKind::Property).unwrap();
        assert!(matches!(
            property.controller(&session.id).await,
            Err(WizardError::WizardMismatch { .. })
        ));
    }
}
