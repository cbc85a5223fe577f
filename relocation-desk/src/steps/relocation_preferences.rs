use wizard_flow::{FieldKind, FieldSpec, Rule, Step};

use super::patterns;
use super::types::sections;

pub struct RelocationPreferencesStep {
    fields: Vec<FieldSpec>,
    rules: Vec<Rule>,
}

impl RelocationPreferencesStep {
    pub fn new() -> Self {
        let section = sections::SINGLE_RELOCATION_PREFERENCES;
        let bedrooms = format!("{section}.bedrooms");
        let adults = format!("{section}.adults");
        let children = format!("{section}.children");
        let pets = format!("{section}.pets");

        let mut rules = Vec::new();
        rules.extend(patterns::count(&bedrooms, "Le nombre de chambres", 1.0, 10.0, true));
        rules.extend(patterns::count(&adults, "Le nombre d'adultes", 1.0, 20.0, true));
        rules.extend(patterns::count(&children, "Le nombre d'enfants", 0.0, 20.0, false));

        Self {
            fields: vec![
                FieldSpec::new(bedrooms, "Chambres", FieldKind::Number),
                FieldSpec::new(adults, "Adultes", FieldKind::Number),
                FieldSpec::new(children, "Enfants", FieldKind::Number),
                FieldSpec::new(pets, "Animaux de compagnie", FieldKind::Boolean),
            ],
            rules,
        }
    }
}

impl Step for RelocationPreferencesStep {
    fn id(&self) -> &str {
        sections::SINGLE_RELOCATION_PREFERENCES
    }

    fn title(&self) -> &str {
        "Préférences de relogement"
    }

    fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    fn rules(&self) -> &[Rule] {
        &self.rules
    }
}
