use chrono::{DateTime, NaiveDate, TimeZone, Utc};

use super::{
    CaseStatus, Contact, Conversation, CostBreakdown, Household, Message, Priority,
    PropertyListing, RelocationCase, Role, Satisfaction,
};
use crate::steps::Address;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap_or_default()
}

fn at(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, h, 0, 0)
        .single()
        .unwrap_or_default()
}

fn contact(name: &str, email: &str, phone: &str) -> Contact {
    Contact {
        name: name.to_string(),
        email: email.to_string(),
        phone: phone.to_string(),
    }
}

fn address(street: &str, postal_code: &str, city: &str) -> Address {
    Address {
        street: street.to_string(),
        postal_code: postal_code.to_string(),
        city: city.to_string(),
    }
}

pub(super) fn cases() -> Vec<RelocationCase> {
    vec![
        RelocationCase {
            id: "case-001".to_string(),
            reference: "REL-3F2A91C4".to_string(),
            status: CaseStatus::Processing,
            priority: Priority::High,
            relocation_type: "single".to_string(),
            insured: contact("Sophie Bernard", "sophie.bernard@example.fr", "06 11 22 33 44"),
            people: Vec::new(),
            disaster_address: address("8 rue du Port", "33000", "Bordeaux"),
            household: Household { adults: 2, children: 2, pets: true },
            bedrooms: 3,
            arrival_date: date(2026, 11, 2),
            number_of_nights: Some(45),
            estimated_duration: None,
            cost: Some(CostBreakdown { nightly_rate: 95.0, nights: 45, cleaning_fee: 60.0 }),
            satisfaction: None,
            created_at: at(2026, 10, 12, 9),
        },
        RelocationCase {
            id: "case-002".to_string(),
            reference: "REL-0B77E512".to_string(),
            status: CaseStatus::Completed,
            priority: Priority::Normal,
            relocation_type: "single".to_string(),
            insured: contact("Karim Haddad", "karim.haddad@example.fr", "07 45 12 78 90"),
            people: Vec::new(),
            disaster_address: address("21 avenue Thiers", "33100", "Bordeaux"),
            household: Household { adults: 1, children: 0, pets: false },
            bedrooms: 1,
            arrival_date: date(2026, 6, 15),
            number_of_nights: Some(21),
            estimated_duration: None,
            cost: Some(CostBreakdown { nightly_rate: 70.0, nights: 21, cleaning_fee: 40.0 }),
            satisfaction: Some(Satisfaction {
                rating: 5,
                comment: Some("Relogement rapide, merci".to_string()),
            }),
            created_at: at(2026, 6, 3, 14),
        },
        RelocationCase {
            id: "case-003".to_string(),
            reference: "REL-91D0AA3E".to_string(),
            status: CaseStatus::Pending,
            priority: Priority::Normal,
            relocation_type: "multiple".to_string(),
            insured: contact("Claire Lefèvre", "claire.lefevre@example.fr", "06 98 76 54 32"),
            people: vec![
                contact("Claire Lefèvre", "claire.lefevre@example.fr", "06 98 76 54 32"),
                contact("Hugo Lefèvre", "hugo.lefevre@example.fr", ""),
            ],
            disaster_address: address("3 place Gambetta", "31000", "Toulouse"),
            household: Household { adults: 3, children: 1, pets: false },
            bedrooms: 3,
            arrival_date: date(2026, 11, 20),
            number_of_nights: None,
            estimated_duration: Some("Quelques mois".to_string()),
            cost: None,
            satisfaction: None,
            created_at: at(2026, 10, 15, 16),
        },
        RelocationCase {
            id: "case-004".to_string(),
            reference: "REL-5C6E0D21".to_string(),
            status: CaseStatus::Initie,
            priority: Priority::Normal,
            relocation_type: "single".to_string(),
            insured: contact("Lucas Petit", "lucas.petit@example.fr", "06 01 02 03 04"),
            people: Vec::new(),
            disaster_address: address("47 quai des Chartrons", "33300", "Bordeaux"),
            household: Household { adults: 2, children: 0, pets: false },
            bedrooms: 1,
            arrival_date: date(2026, 11, 5),
            number_of_nights: Some(10),
            estimated_duration: None,
            cost: None,
            satisfaction: None,
            created_at: at(2026, 10, 18, 8),
        },
        RelocationCase {
            id: "case-005".to_string(),
            reference: "REL-E4418B90".to_string(),
            status: CaseStatus::Cancelled,
            priority: Priority::Normal,
            relocation_type: "single".to_string(),
            insured: contact("Nadia Roux", "nadia.roux@example.fr", "07 88 77 66 55"),
            people: Vec::new(),
            disaster_address: address("2 rue Sainte-Catherine", "69001", "Lyon"),
            household: Household { adults: 1, children: 1, pets: false },
            bedrooms: 2,
            arrival_date: date(2026, 9, 1),
            number_of_nights: Some(14),
            estimated_duration: None,
            cost: None,
            satisfaction: Some(Satisfaction { rating: 3, comment: None }),
            created_at: at(2026, 8, 20, 11),
        },
    ]
}

pub(super) fn listings() -> Vec<PropertyListing> {
    let host = |name: &str, email: &str| contact(name, email, "06 50 60 70 80");
    vec![
        PropertyListing {
            id: "listing-001".to_string(),
            title: "Maison familiale avec jardin".to_string(),
            kind: "house".to_string(),
            address: address("15 allée des Pins", "33700", "Mérignac"),
            bedrooms: 3,
            max_occupants: 6,
            nightly_rate: 110.0,
            available_from: date(2026, 10, 1),
            available_until: None,
            amenities: vec!["wifi".to_string(), "jardin".to_string(), "parking".to_string()],
            host: host("Anne Moreau", "anne.moreau@example.fr"),
        },
        PropertyListing {
            id: "listing-002".to_string(),
            title: "T2 rénové centre-ville".to_string(),
            kind: "apartment".to_string(),
            address: address("9 cours de l'Intendance", "33000", "Bordeaux"),
            bedrooms: 1,
            max_occupants: 3,
            nightly_rate: 75.0,
            available_from: date(2026, 9, 15),
            available_until: Some(date(2027, 3, 31)),
            amenities: vec!["wifi".to_string(), "ascenseur".to_string()],
            host: host("Thomas Garnier", "thomas.garnier@example.fr"),
        },
        PropertyListing {
            id: "listing-003".to_string(),
            title: "Appartement T4 proche tram".to_string(),
            kind: "apartment".to_string(),
            address: address("60 rue de Bègles", "33800", "Bordeaux"),
            bedrooms: 3,
            max_occupants: 5,
            nightly_rate: 98.0,
            available_from: date(2026, 10, 20),
            available_until: Some(date(2026, 12, 10)),
            amenities: vec!["wifi".to_string(), "lave-linge".to_string()],
            host: host("Inès Fabre", "ines.fabre@example.fr"),
        },
        PropertyListing {
            id: "listing-004".to_string(),
            title: "Studio meublé Capitole".to_string(),
            kind: "studio".to_string(),
            address: address("4 rue du Taur", "31000", "Toulouse"),
            bedrooms: 0,
            max_occupants: 2,
            nightly_rate: 55.0,
            available_from: date(2026, 8, 1),
            available_until: None,
            amenities: vec!["wifi".to_string()],
            host: host("Julien Blanc", "julien.blanc@example.fr"),
        },
    ]
}

pub(super) fn conversations() -> Vec<Conversation> {
    let message = |from: Role, body: &str, sent_at: DateTime<Utc>| Message {
        from,
        body: body.to_string(),
        sent_at,
    };
    vec![
        Conversation {
            id: "conv-001".to_string(),
            case_id: "case-001".to_string(),
            subject: "Arrivée au logement de Mérignac".to_string(),
            participants: vec![Role::Insurer, Role::Insured],
            messages: vec![
                message(Role::Insurer, "Un logement vous a été proposé à Mérignac.", at(2026, 10, 13, 10)),
                message(Role::Insured, "Merci, les animaux sont-ils acceptés ?", at(2026, 10, 13, 12)),
            ],
        },
        Conversation {
            id: "conv-002".to_string(),
            case_id: "case-001".to_string(),
            subject: "Disponibilité de la maison".to_string(),
            participants: vec![Role::Insurer, Role::Host],
            messages: vec![message(
                Role::Host,
                "La maison est libre à partir du 1er octobre.",
                at(2026, 10, 12, 15),
            )],
        },
        Conversation {
            id: "conv-003".to_string(),
            case_id: "case-003".to_string(),
            subject: "Relogement de la famille Lefèvre".to_string(),
            participants: vec![Role::Insurer, Role::Insured],
            messages: vec![message(
                Role::Insured,
                "Nous sommes quatre, avez-vous un logement à Toulouse ?",
                at(2026, 10, 16, 9),
            )],
        },
    ]
}
