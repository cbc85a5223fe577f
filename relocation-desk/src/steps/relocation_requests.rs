use serde_json::{Value, json};
use wizard_flow::{Check, FieldKind, FieldSpec, Rule, Step};

use super::patterns;
use super::types::sections;

/// Blank household member appended by `addPerson`.
pub fn person_template() -> Value {
    json!({
        "firstName": "",
        "lastName": "",
        "email": "",
        "phone": "",
        "adults": 1,
        "children": 0,
        "bedrooms": 1
    })
}

/// One relocation request per affected household member.
pub struct RelocationRequestsStep {
    fields: Vec<FieldSpec>,
    rules: Vec<Rule>,
}

impl RelocationRequestsStep {
    pub fn new() -> Self {
        let list = sections::MULTIPLE_RELOCATION_REQUESTS;
        let each = |field: &str| format!("{list}.*.{field}");

        let mut rules = vec![Rule::new(
            list,
            Check::MinItems(1),
            "Ajoutez au moins une personne à reloger",
        )];
        rules.extend(patterns::person_name(&each("firstName"), "Le prénom"));
        rules.extend(patterns::person_name(&each("lastName"), "Le nom"));
        rules.extend(patterns::email(&each("email")));
        rules.extend(patterns::phone(&each("phone"), false));
        rules.extend(patterns::count(&each("adults"), "Le nombre d'adultes", 1.0, 20.0, true));
        rules.extend(patterns::count(&each("children"), "Le nombre d'enfants", 0.0, 20.0, false));
        rules.extend(patterns::count(&each("bedrooms"), "Le nombre de chambres", 1.0, 10.0, true));

        Self {
            fields: vec![
                FieldSpec::new(list, "Personnes à reloger", FieldKind::List),
                FieldSpec::new(each("firstName"), "Prénom", FieldKind::Text),
                FieldSpec::new(each("lastName"), "Nom", FieldKind::Text),
                FieldSpec::new(each("email"), "Email", FieldKind::Text),
                FieldSpec::new(each("phone"), "Téléphone", FieldKind::Text),
                FieldSpec::new(each("adults"), "Adultes", FieldKind::Number),
                FieldSpec::new(each("children"), "Enfants", FieldKind::Number),
                FieldSpec::new(each("bedrooms"), "Chambres", FieldKind::Number),
            ],
            rules,
        }
    }
}

impl Step for RelocationRequestsStep {
    fn id(&self) -> &str {
        sections::MULTIPLE_RELOCATION_REQUESTS
    }

    fn title(&self) -> &str {
        "Demandes de relogement"
    }

    fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    fn rules(&self) -> &[Rule] {
        &self.rules
    }
}
