use wizard_flow::{Check, FieldKind, FieldSpec, Rule, Step};

use super::insurance_coverage::has_insurance;
use super::patterns::{self, COMPANY_NAME, POLICY_NUMBER};
use super::types::sections;

/// Insured person's identity, plus the policy reference when no certificate
/// was uploaded on the coverage step.
pub struct InsuranceDetailsStep {
    fields: Vec<FieldSpec>,
    rules: Vec<Rule>,
}

impl InsuranceDetailsStep {
    pub fn new() -> Self {
        let insured = sections::SINGLE_INSURED_DATA;
        let details = sections::SINGLE_INSURANCE_DETAILS;
        let first_name = format!("{insured}.firstName");
        let last_name = format!("{insured}.lastName");
        let email = format!("{insured}.email");
        let company = format!("{details}.insuranceCompany");
        let policy = format!("{details}.policyNumber");

        let uninsured = |form: &wizard_flow::FormStore| has_insurance(form) == Some(false);

        let mut rules = Vec::new();
        rules.extend(patterns::person_name(&first_name, "Le prénom"));
        rules.extend(patterns::person_name(&last_name, "Le nom"));
        rules.extend(patterns::email(&email));
        rules.extend([
            Rule::required(&company, "Le nom de la compagnie d'assurance est requis").when(uninsured),
            Rule::new(
                &company,
                Check::MinLength(2),
                "Le nom de la compagnie doit contenir au moins 2 caractères",
            )
            .when(uninsured),
            Rule::new(
                &company,
                Check::MaxLength(100),
                "Le nom de la compagnie ne peut pas dépasser 100 caractères",
            )
            .when(uninsured),
            Rule::new(
                &company,
                Check::Pattern(COMPANY_NAME.clone()),
                "Le nom de la compagnie contient des caractères non autorisés",
            )
            .when(uninsured),
            Rule::required(&policy, "Le numéro de police est requis").when(uninsured),
            Rule::new(
                &policy,
                Check::Pattern(POLICY_NUMBER.clone()),
                "Le numéro de police doit contenir 5 à 20 lettres, chiffres ou tirets",
            )
            .when(uninsured),
        ]);

        Self {
            fields: vec![
                FieldSpec::new(first_name, "Prénom de l'assuré(e)", FieldKind::Text),
                FieldSpec::new(last_name, "Nom de l'assuré(e)", FieldKind::Text),
                FieldSpec::new(email, "Email de l'assuré(e)", FieldKind::Text),
                FieldSpec::new(company, "Compagnie d'assurance", FieldKind::Text),
                FieldSpec::new(policy, "Numéro de police", FieldKind::Text),
            ],
            rules,
        }
    }
}

impl Step for InsuranceDetailsStep {
    fn id(&self) -> &str {
        sections::SINGLE_INSURANCE_DETAILS
    }

    fn title(&self) -> &str {
        "Assuré(e) et contrat"
    }

    fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    fn rules(&self) -> &[Rule] {
        &self.rules
    }
}
