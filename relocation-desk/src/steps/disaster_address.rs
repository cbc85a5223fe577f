use wizard_flow::{Check, FieldKind, FieldSpec, Rule, Step};

use super::patterns;

/// Address of the damaged home. Used by both branches under their own section.
pub struct DisasterAddressStep {
    section: &'static str,
    fields: Vec<FieldSpec>,
    rules: Vec<Rule>,
}

impl DisasterAddressStep {
    pub fn new(section: &'static str) -> Self {
        let description = format!("{section}.damageDescription");
        let mut rules = patterns::address(section);
        rules.push(Rule::new(
            &description,
            Check::MaxLength(1000),
            "La description ne peut pas dépasser 1000 caractères",
        ));

        Self {
            section,
            fields: vec![
                FieldSpec::new(format!("{section}.street"), "Adresse du sinistre", FieldKind::Text),
                FieldSpec::new(format!("{section}.postalCode"), "Code postal", FieldKind::Text),
                FieldSpec::new(format!("{section}.city"), "Ville", FieldKind::Text),
                FieldSpec::new(description, "Description des dégâts", FieldKind::Text),
            ],
            rules,
        }
    }
}

impl Step for DisasterAddressStep {
    fn id(&self) -> &str {
        self.section
    }

    fn title(&self) -> &str {
        "Adresse du sinistre"
    }

    fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    fn rules(&self) -> &[Rule] {
        &self.rules
    }
}
