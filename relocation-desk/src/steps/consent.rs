use wizard_flow::{Check, FieldKind, FieldSpec, Rule, Step};

/// Final review step: only the two confirmation checkboxes are validated.
pub struct ConsentStep {
    section: &'static str,
    fields: Vec<FieldSpec>,
    rules: Vec<Rule>,
}

impl ConsentStep {
    pub fn new(section: &'static str) -> Self {
        let terms = format!("{section}.acceptTerms");
        let data = format!("{section}.acceptDataProcessing");
        Self {
            section,
            rules: vec![
                Rule::new(&terms, Check::Checked, "Vous devez accepter les conditions générales"),
                Rule::new(
                    &data,
                    Check::Checked,
                    "Vous devez accepter le traitement de vos données personnelles",
                ),
            ],
            fields: vec![
                FieldSpec::new(terms, "J'accepte les conditions générales", FieldKind::Boolean),
                FieldSpec::new(
                    data,
                    "J'accepte le traitement de mes données",
                    FieldKind::Boolean,
                ),
            ],
        }
    }
}

impl Step for ConsentStep {
    fn id(&self) -> &str {
        self.section
    }

    fn title(&self) -> &str {
        "Récapitulatif et consentement"
    }

    fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    fn rules(&self) -> &[Rule] {
        &self.rules
    }
}
