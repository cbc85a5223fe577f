use wizard_flow::{Check, FieldKind, FieldSpec, FormStore, Rule, Step};

use super::patterns::DOCUMENT;
use super::types::sections;

pub const HAS_INSURANCE: &str = "singleInsuranceCoverage.hasInsurance";
const CERTIFICATE: &str = "singleInsuranceCoverage.insuranceCertificate";

/// Coverage answer; `None` until the question is answered.
pub fn has_insurance(form: &FormStore) -> Option<bool> {
    form.get_sync::<bool>(HAS_INSURANCE)
}

/// Whether the household holds a home insurance policy. Insured households
/// upload their certificate here; the others describe their policy on the
/// next step.
pub struct InsuranceCoverageStep {
    fields: Vec<FieldSpec>,
    rules: Vec<Rule>,
}

impl InsuranceCoverageStep {
    pub fn new() -> Self {
        Self {
            fields: vec![
                FieldSpec::new(HAS_INSURANCE, "Êtes-vous assuré(e) ?", FieldKind::Boolean),
                FieldSpec::new(CERTIFICATE, "Attestation d'assurance", FieldKind::File),
            ],
            rules: vec![
                Rule::required(HAS_INSURANCE, "Veuillez indiquer si vous êtes assuré(e)"),
                Rule::required(CERTIFICATE, "Veuillez joindre votre attestation d'assurance")
                    .when(|form| has_insurance(form) == Some(true)),
                Rule::new(
                    CERTIFICATE,
                    Check::Pattern(DOCUMENT.clone()),
                    "L'attestation doit être un fichier PDF, JPEG ou PNG",
                )
                .when(|form| has_insurance(form) == Some(true)),
            ],
        }
    }
}

impl Step for InsuranceCoverageStep {
    fn id(&self) -> &str {
        sections::SINGLE_INSURANCE_COVERAGE
    }

    fn title(&self) -> &str {
        "Couverture d'assurance"
    }

    fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    fn rules(&self) -> &[Rule] {
        &self.rules
    }
}
