use wizard_flow::{Check, FieldKind, FieldSpec, Rule, Step};

use super::types::{MULTIPLE, SINGLE, sections};

/// First step of the relocation wizard: picks the branch.
pub struct RelocationTypeStep {
    fields: Vec<FieldSpec>,
    rules: Vec<Rule>,
}

impl RelocationTypeStep {
    pub fn new() -> Self {
        let path = sections::RELOCATION_TYPE;
        Self {
            fields: vec![FieldSpec::new(
                path,
                "Type de relogement",
                FieldKind::Choice(vec![SINGLE.to_string(), MULTIPLE.to_string()]),
            )],
            rules: vec![
                Rule::required(path, "Veuillez sélectionner un type de relogement"),
                Rule::new(
                    path,
                    Check::OneOf(vec![SINGLE.to_string(), MULTIPLE.to_string()]),
                    "Type de relogement inconnu",
                ),
            ],
        }
    }
}

impl Step for RelocationTypeStep {
    fn id(&self) -> &str {
        sections::RELOCATION_TYPE
    }

    fn title(&self) -> &str {
        "Type de relogement"
    }

    fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    fn rules(&self) -> &[Rule] {
        &self.rules
    }
}
