use wizard_flow::{FieldKind, FieldSpec, Rule, Step};

use super::patterns;

/// Contact details of the person the insurer will call back.
pub struct PersonalDataStep {
    section: &'static str,
    fields: Vec<FieldSpec>,
    rules: Vec<Rule>,
}

impl PersonalDataStep {
    pub fn new(section: &'static str) -> Self {
        let first_name = format!("{section}.firstName");
        let last_name = format!("{section}.lastName");
        let email = format!("{section}.email");
        let phone = format!("{section}.phone");

        let mut rules = Vec::new();
        rules.extend(patterns::person_name(&first_name, "Le prénom"));
        rules.extend(patterns::person_name(&last_name, "Le nom"));
        rules.extend(patterns::email(&email));
        rules.extend(patterns::phone(&phone, true));

        Self {
            section,
            fields: vec![
                FieldSpec::new(first_name, "Prénom", FieldKind::Text),
                FieldSpec::new(last_name, "Nom", FieldKind::Text),
                FieldSpec::new(email, "Email", FieldKind::Text),
                FieldSpec::new(phone, "Téléphone", FieldKind::Text),
            ],
            rules,
        }
    }
}

impl Step for PersonalDataStep {
    fn id(&self) -> &str {
        self.section
    }

    fn title(&self) -> &str {
        "Vos coordonnées"
    }

    fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    fn rules(&self) -> &[Rule] {
        &self.rules
    }
}
