use serde_json::{Value, json};
use tracing::debug;
use wizard_flow::path::Segment;
use wizard_flow::rules::parse_date;
use wizard_flow::{Check, FieldKind, FieldPath, FieldSpec, FormStore, Rule, SetOptions, Step};

use super::types::ESTIMATED_DURATIONS;

/// Arrival date plus either an exact departure date or a duration estimate.
pub struct ArrivalDetailsStep {
    section: &'static str,
    fields: Vec<FieldSpec>,
    rules: Vec<Rule>,
}

impl ArrivalDetailsStep {
    pub fn new(section: &'static str) -> Self {
        let arrival = format!("{section}.arrivalDate");
        let exact = format!("{section}.useExactDates");
        let departure = format!("{section}.departureDate");
        let duration = format!("{section}.estimatedDuration");

        let exact_mode = {
            let exact = exact.clone();
            move |form: &FormStore| form.get_sync::<bool>(&exact) == Some(true)
        };
        let flexible_mode = {
            let exact = exact.clone();
            move |form: &FormStore| form.get_sync::<bool>(&exact) != Some(true)
        };

        let rules = vec![
            Rule::required(&arrival, "La date d'arrivée est requise"),
            Rule::new(&arrival, Check::Date, "Date d'arrivée invalide (AAAA-MM-JJ)"),
            Rule::new(
                &arrival,
                Check::NotInPast,
                "La date d'arrivée ne peut pas être dans le passé",
            ),
            Rule::required(&departure, "La date de départ est requise").when(exact_mode.clone()),
            Rule::new(&departure, Check::Date, "Date de départ invalide (AAAA-MM-JJ)")
                .when(exact_mode.clone()),
            Rule::new(
                &departure,
                Check::DateAfter(arrival.clone()),
                "La date de départ doit être postérieure à la date d'arrivée",
            )
            .when(exact_mode),
            Rule::required(&duration, "Veuillez indiquer une durée estimée")
                .when(flexible_mode.clone()),
            Rule::new(
                &duration,
                Check::OneOf(ESTIMATED_DURATIONS.iter().map(|d| d.to_string()).collect()),
                "Durée estimée inconnue",
            )
            .when(flexible_mode),
        ];

        Self {
            section,
            fields: vec![
                FieldSpec::new(arrival, "Date d'arrivée", FieldKind::Date),
                FieldSpec::new(exact, "Dates exactes connues", FieldKind::Boolean),
                FieldSpec::new(departure, "Date de départ", FieldKind::Date),
                FieldSpec::new(
                    duration,
                    "Durée estimée",
                    FieldKind::Choice(ESTIMATED_DURATIONS.iter().map(|d| d.to_string()).collect()),
                ),
                FieldSpec::new(format!("{section}.numberOfNights"), "Nombre de nuits", FieldKind::Number),
            ],
            rules,
        }
    }
}

impl Step for ArrivalDetailsStep {
    fn id(&self) -> &str {
        self.section
    }

    fn title(&self) -> &str {
        "Dates d'arrivée"
    }

    fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    fn rules(&self) -> &[Rule] {
        &self.rules
    }
}

/// Nights between arrival and departure, when exact dates are in use and
/// departure falls after arrival.
pub fn number_of_nights(form: &FormStore, section: &str) -> Option<i64> {
    if form.get_sync::<bool>(&format!("{section}.useExactDates")) != Some(true) {
        return None;
    }
    let date = |field: &str| {
        FieldPath::parse(&format!("{section}.{field}"))
            .ok()
            .and_then(|path| form.value(&path))
            .as_ref()
            .and_then(parse_date)
    };
    let nights = (date("departureDate")? - date("arrivalDate")?).num_days();
    (nights > 0).then_some(nights)
}

/// Keeps `{section}.numberOfNights` in sync with the date fields, whether
/// they are written one by one or as a whole section.
pub fn nights_watcher(
    section: &'static str,
) -> impl Fn(&FieldPath, &Value, &FormStore) + Send + Sync + 'static {
    move |path: &FieldPath, value: &Value, form: &FormStore| {
        if path.section() != section {
            return;
        }
        match path.rest().first() {
            None if !value.is_object() => return,
            None => {}
            Some(Segment::Key(field))
                if matches!(
                    field.as_str(),
                    "arrivalDate" | "departureDate" | "useExactDates"
                ) => {}
            Some(_) => return,
        }

        let Ok(target) = FieldPath::parse(&format!("{section}.numberOfNights")) else {
            return;
        };
        let nights = number_of_nights(form, section).map(|n| json!(n));
        if form.value(&target) == nights {
            return;
        }
        let nights = nights.unwrap_or(Value::Null);
        if let Err(e) = form.set_with(&target, nights, SetOptions::silent()) {
            debug!(section = %section, error = %e, "Could not refresh the number of nights");
        }
    }
}
