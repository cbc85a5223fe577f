//! Steps of the listing wizard hosts use to offer a home for relocation.

use std::sync::Arc;
use wizard_flow::{Check, FieldKind, FormStep, Rule, Step};

use super::patterns;
use super::types::{PROPERTY_KINDS, sections};

fn path(section: &str, field: &str) -> String {
    format!("{section}.{field}")
}

pub fn property_type_step() -> Arc<dyn Step> {
    let kind = path(sections::PROPERTY_TYPE, "kind");
    let title = path(sections::PROPERTY_TYPE, "title");
    let kinds: Vec<String> = PROPERTY_KINDS.iter().map(|k| k.to_string()).collect();

    Arc::new(
        FormStep::new(sections::PROPERTY_TYPE, "Type de logement")
            .field(&kind, "Type de bien", FieldKind::Choice(kinds.clone()))
            .field(&title, "Titre de l'annonce", FieldKind::Text)
            .rule(Rule::required(&kind, "Le type de logement est requis"))
            .rule(Rule::new(&kind, Check::OneOf(kinds), "Type de logement inconnu"))
            .rule(Rule::required(&title, "Le titre est requis"))
            .rule(Rule::new(&title, Check::MinLength(5), "Le titre doit contenir au moins 5 caractères"))
            .rule(Rule::new(&title, Check::MaxLength(100), "Le titre ne peut pas dépasser 100 caractères")),
    )
}

pub fn property_address_step() -> Arc<dyn Step> {
    let section = sections::PROPERTY_ADDRESS;
    Arc::new(
        FormStep::new(section, "Adresse du logement")
            .field(path(section, "street"), "Adresse", FieldKind::Text)
            .field(path(section, "postalCode"), "Code postal", FieldKind::Text)
            .field(path(section, "city"), "Ville", FieldKind::Text)
            .rules_from(patterns::address(section)),
    )
}

pub fn property_details_step() -> Arc<dyn Step> {
    let section = sections::PROPERTY_DETAILS;
    let surface = path(section, "surface");
    let rooms = path(section, "rooms");
    let bedrooms = path(section, "bedrooms");
    let bathrooms = path(section, "bathrooms");
    let occupants = path(section, "maxOccupants");

    Arc::new(
        FormStep::new(section, "Caractéristiques")
            .field(&surface, "Surface (m²)", FieldKind::Number)
            .field(&rooms, "Pièces", FieldKind::Number)
            .field(&bedrooms, "Chambres", FieldKind::Number)
            .field(&bathrooms, "Salles de bain", FieldKind::Number)
            .field(&occupants, "Occupants maximum", FieldKind::Number)
            .rule(Rule::required(&surface, "La surface est requise"))
            .rule(Rule::new(&surface, Check::Min(9.0), "La surface doit être d'au moins 9 m²"))
            .rules_from(patterns::count(&rooms, "Le nombre de pièces", 1.0, 50.0, true))
            .rules_from(patterns::count(&bedrooms, "Le nombre de chambres", 0.0, 50.0, false))
            .rule(Rule::new(
                &bedrooms,
                Check::NotAbove(rooms.clone()),
                "Il ne peut pas y avoir plus de chambres que de pièces",
            ))
            .rules_from(patterns::count(&bathrooms, "Le nombre de salles de bain", 1.0, 20.0, true))
            .rules_from(patterns::count(&occupants, "Le nombre d'occupants", 1.0, 50.0, true)),
    )
}

pub fn property_availability_step() -> Arc<dyn Step> {
    let section = sections::PROPERTY_AVAILABILITY;
    let from = path(section, "availableFrom");
    let until = path(section, "availableUntil");
    let minimum_stay = path(section, "minimumStay");
    let amenities = path(section, "amenities");

    Arc::new(
        FormStep::new(section, "Disponibilités et équipements")
            .field(&from, "Disponible à partir du", FieldKind::Date)
            .field(&until, "Disponible jusqu'au", FieldKind::Date)
            .field(&minimum_stay, "Séjour minimum (nuits)", FieldKind::Number)
            .field(&amenities, "Équipements", FieldKind::List)
            .rule(Rule::required(&from, "La date de disponibilité est requise"))
            .rule(Rule::new(&from, Check::Date, "Date invalide (AAAA-MM-JJ)"))
            .rule(Rule::new(&until, Check::Date, "Date invalide (AAAA-MM-JJ)"))
            .rule(Rule::new(
                &until,
                Check::DateAfter(from.clone()),
                "La fin de disponibilité doit être postérieure à son début",
            ))
            .rules_from(patterns::count(&minimum_stay, "Le séjour minimum", 1.0, 365.0, false)),
    )
}

pub fn property_pricing_step() -> Arc<dyn Step> {
    let section = sections::PROPERTY_PRICING;
    let rate = path(section, "nightlyRate");
    let cleaning = path(section, "cleaningFee");
    let deposit = path(section, "deposit");

    Arc::new(
        FormStep::new(section, "Tarifs")
            .field(&rate, "Prix par nuit (€)", FieldKind::Number)
            .field(&cleaning, "Frais de ménage (€)", FieldKind::Number)
            .field(&deposit, "Caution (€)", FieldKind::Number)
            .rule(Rule::required(&rate, "Le prix par nuit est requis"))
            .rule(Rule::new(&rate, Check::Above(0.0), "Le prix par nuit doit être positif"))
            .rule(Rule::new(&cleaning, Check::Min(0.0), "Les frais de ménage ne peuvent pas être négatifs"))
            .rule(Rule::new(&deposit, Check::Min(0.0), "La caution ne peut pas être négative")),
    )
}

pub fn property_host_step() -> Arc<dyn Step> {
    let section = sections::PROPERTY_HOST;
    let name = path(section, "hostName");
    let email = path(section, "hostEmail");
    let phone = path(section, "hostPhone");
    let confirm = path(section, "confirmAccuracy");

    Arc::new(
        FormStep::new(section, "Coordonnées de l'hôte")
            .field(&name, "Nom", FieldKind::Text)
            .field(&email, "Email", FieldKind::Text)
            .field(&phone, "Téléphone", FieldKind::Text)
            .field(&confirm, "Je certifie l'exactitude des informations", FieldKind::Boolean)
            .rules_from(patterns::person_name(&name, "Le nom"))
            .rules_from(patterns::email(&email))
            .rules_from(patterns::phone(&phone, true))
            .rule(Rule::new(
                &confirm,
                Check::Checked,
                "Vous devez certifier l'exactitude des informations",
            )),
    )
}
