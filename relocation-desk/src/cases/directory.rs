use anyhow::{Context as _, Result, anyhow};
use chrono::Utc;
use dashmap::DashMap;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::info;
use uuid::Uuid;

use super::{
    CaseStatistics, CaseStatus, Contact, Conversation, Household, PropertyListing, Priority,
    RelocationCase, Role, seed,
};
use crate::steps::{
    Address, ArrivalDetails, MULTIPLE, PersonalData, PropertyAvailability, PropertyDetails,
    PropertyHost, PropertyPricing, PropertyTypeAnswers, RelocationPreferences, RelocationRequest,
    SINGLE, sections,
};

/// In-memory store of cases, listings and conversations shared by the
/// dashboard commands and the wizard submission hooks.
pub struct CaseDirectory {
    cases: DashMap<String, RelocationCase>,
    listings: DashMap<String, PropertyListing>,
    conversations: Vec<Conversation>,
}

impl CaseDirectory {
    pub fn empty() -> Self {
        Self {
            cases: DashMap::new(),
            listings: DashMap::new(),
            conversations: Vec::new(),
        }
    }

    /// Directory pre-filled with the demo records.
    pub fn seeded() -> Self {
        let directory = Self {
            conversations: seed::conversations(),
            ..Self::empty()
        };
        for case in seed::cases() {
            directory.cases.insert(case.id.clone(), case);
        }
        for listing in seed::listings() {
            directory.listings.insert(listing.id.clone(), listing);
        }
        directory
    }

    /// Looks a case up by id or by reference.
    pub fn get_case_by_id(&self, id: &str) -> Option<RelocationCase> {
        if let Some(case) = self.cases.get(id) {
            return Some(case.clone());
        }
        self.cases
            .iter()
            .find(|entry| entry.reference.eq_ignore_ascii_case(id))
            .map(|entry| entry.clone())
    }

    /// Cases, newest first, optionally narrowed to one status.
    pub fn relocation_cases(&self, status: Option<CaseStatus>) -> Vec<RelocationCase> {
        let mut cases: Vec<RelocationCase> = self
            .cases
            .iter()
            .filter(|entry| status.is_none_or(|status| entry.status == status))
            .map(|entry| entry.clone())
            .collect();
        cases.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        cases
    }

    pub fn listings(&self) -> Vec<PropertyListing> {
        let mut listings: Vec<PropertyListing> =
            self.listings.iter().map(|entry| entry.clone()).collect();
        listings.sort_by(|a, b| a.id.cmp(&b.id));
        listings
    }

    /// Threads the given role takes part in, most recently active first.
    pub fn get_conversations(&self, role: Role) -> Vec<Conversation> {
        let mut conversations: Vec<Conversation> = self
            .conversations
            .iter()
            .filter(|conversation| conversation.participants.contains(&role))
            .cloned()
            .collect();
        conversations.sort_by(|a, b| {
            let last = |c: &Conversation| c.last_message().map(|m| m.sent_at);
            last(b).cmp(&last(a))
        });
        conversations
    }

    /// Listings with enough bedrooms and room for the whole household,
    /// free for the stay. Listings in the same department come first, then
    /// the cheapest.
    pub fn get_matching_relocation_options(&self, case: &RelocationCase) -> Vec<PropertyListing> {
        let department = case.disaster_address.department().to_string();
        let mut options: Vec<PropertyListing> = self
            .listings
            .iter()
            .filter(|listing| {
                listing.bedrooms >= case.bedrooms
                    && listing.max_occupants >= case.household.size()
                    && listing.is_available(case.arrival_date, case.number_of_nights)
            })
            .map(|entry| entry.clone())
            .collect();
        options.sort_by(|a, b| {
            let away = |l: &PropertyListing| l.address.department() != department;
            away(a)
                .cmp(&away(b))
                .then(a.nightly_rate.total_cmp(&b.nightly_rate))
        });
        options
    }

    pub fn statistics(&self) -> CaseStatistics {
        let cases = self.relocation_cases(None);
        let mut by_status = BTreeMap::new();
        for case in &cases {
            *by_status.entry(case.status).or_insert(0) += 1;
        }

        let ratings: Vec<f64> = cases
            .iter()
            .filter_map(|case| case.satisfaction.as_ref())
            .map(|satisfaction| f64::from(satisfaction.rating))
            .collect();
        let average_satisfaction =
            (!ratings.is_empty()).then(|| ratings.iter().sum::<f64>() / ratings.len() as f64);

        CaseStatistics {
            total: cases.len(),
            by_status,
            high_priority: cases
                .iter()
                .filter(|case| case.priority == Priority::High)
                .count(),
            people_rehoused: cases
                .iter()
                .filter(|case| case.status == CaseStatus::Completed)
                .map(|case| case.household.size())
                .sum(),
            average_satisfaction,
            total_cost: cases
                .iter()
                .filter_map(|case| case.cost.as_ref())
                .map(|cost| cost.total())
                .sum(),
        }
    }

    /// Opens a case from submitted relocation answers.
    pub fn register_relocation(&self, answers: &Value) -> Result<RelocationCase> {
        let relocation_type: String = section(answers, sections::RELOCATION_TYPE)?;
        let case = match relocation_type.as_str() {
            SINGLE => single_case(answers)?,
            MULTIPLE => multiple_case(answers)?,
            other => return Err(anyhow!("unknown relocation type: {other}")),
        };

        info!(
            case_id = %case.id,
            reference = %case.reference,
            relocation_type = %case.relocation_type,
            household = %case.household.size(),
            "Relocation case opened"
        );
        self.cases.insert(case.id.clone(), case.clone());
        Ok(case)
    }

    /// Publishes a listing from submitted property answers.
    pub fn register_listing(&self, answers: &Value) -> Result<PropertyListing> {
        let kind: PropertyTypeAnswers = section(answers, sections::PROPERTY_TYPE)?;
        let address: Address = section(answers, sections::PROPERTY_ADDRESS)?;
        let details: PropertyDetails = section(answers, sections::PROPERTY_DETAILS)?;
        let availability: PropertyAvailability = section(answers, sections::PROPERTY_AVAILABILITY)?;
        let pricing: PropertyPricing = section(answers, sections::PROPERTY_PRICING)?;
        let host: PropertyHost = section(answers, sections::PROPERTY_HOST)?;

        let listing = PropertyListing {
            id: Uuid::new_v4().to_string(),
            title: kind.title.trim().to_string(),
            kind: kind.kind,
            address,
            bedrooms: details.bedrooms,
            max_occupants: details.max_occupants,
            nightly_rate: pricing.nightly_rate,
            available_from: availability.available_from,
            available_until: availability.available_until,
            amenities: availability.amenities,
            host: Contact {
                name: host.host_name,
                email: host.host_email,
                phone: host.host_phone,
            },
        };

        info!(
            listing_id = %listing.id,
            bedrooms = %listing.bedrooms,
            nightly_rate = %listing.nightly_rate,
            "Listing published"
        );
        self.listings.insert(listing.id.clone(), listing.clone());
        Ok(listing)
    }
}

impl Default for CaseDirectory {
    fn default() -> Self {
        Self::seeded()
    }
}

fn section<T: DeserializeOwned>(answers: &Value, name: &str) -> Result<T> {
    let value = answers
        .get(name)
        .cloned()
        .ok_or_else(|| anyhow!("answers are missing the {name} section"))?;
    serde_json::from_value(value).with_context(|| format!("malformed {name} section"))
}

fn reference() -> String {
    format!("REL-{:08X}", rand::random::<u32>())
}

fn contact(person: &PersonalData) -> Contact {
    Contact {
        name: person.full_name(),
        email: person.email.trim().to_string(),
        phone: person.phone.trim().to_string(),
    }
}

fn priority(household: &Household) -> Priority {
    if household.children > 0 || household.pets {
        Priority::High
    } else {
        Priority::Normal
    }
}

fn open_case(
    relocation_type: &str,
    insured: Contact,
    people: Vec<Contact>,
    disaster_address: Address,
    household: Household,
    bedrooms: u32,
    arrival: ArrivalDetails,
) -> RelocationCase {
    RelocationCase {
        id: Uuid::new_v4().to_string(),
        reference: reference(),
        status: CaseStatus::Initie,
        priority: priority(&household),
        relocation_type: relocation_type.to_string(),
        insured,
        people,
        disaster_address,
        household,
        bedrooms,
        arrival_date: arrival.arrival_date,
        number_of_nights: arrival.number_of_nights.filter(|_| arrival.use_exact_dates),
        estimated_duration: arrival.estimated_duration.filter(|_| !arrival.use_exact_dates),
        cost: None,
        satisfaction: None,
        created_at: Utc::now(),
    }
}

fn single_case(answers: &Value) -> Result<RelocationCase> {
    let person: PersonalData = section(answers, sections::SINGLE_PERSONAL_DATA)?;
    let address: Address = section(answers, sections::SINGLE_DISASTER_ADDRESS)?;
    let preferences: RelocationPreferences =
        section(answers, sections::SINGLE_RELOCATION_PREFERENCES)?;
    let arrival: ArrivalDetails = section(answers, sections::SINGLE_ARRIVAL_DETAILS)?;

    let household = Household {
        adults: preferences.adults,
        children: preferences.children,
        pets: preferences.pets,
    };
    Ok(open_case(
        SINGLE,
        contact(&person),
        Vec::new(),
        address,
        household,
        preferences.bedrooms,
        arrival,
    ))
}

fn multiple_case(answers: &Value) -> Result<RelocationCase> {
    let person: PersonalData = section(answers, sections::MULTIPLE_PERSONAL_DATA)?;
    let address: Address = section(answers, sections::MULTIPLE_DISASTER_ADDRESS)?;
    let requests: Vec<RelocationRequest> =
        section(answers, sections::MULTIPLE_RELOCATION_REQUESTS)?;
    let arrival: ArrivalDetails = section(answers, sections::MULTIPLE_ARRIVAL_DETAILS)?;

    let household = Household {
        adults: requests.iter().map(|r| r.adults).sum(),
        children: requests.iter().map(|r| r.children).sum(),
        pets: false,
    };
    let bedrooms = requests.iter().map(|r| r.bedrooms).sum();
    let people = requests
        .iter()
        .map(|r| Contact {
            name: format!("{} {}", r.first_name.trim(), r.last_name.trim()),
            email: r.email.trim().to_string(),
            phone: r.phone.trim().to_string(),
        })
        .collect();

    Ok(open_case(
        MULTIPLE,
        contact(&person),
        people,
        address,
        household,
        bedrooms,
        arrival,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn multiple_answers() -> Value {
        json!({
            "relocationType": "multiple",
            "multipleDisasterAddress": { "street": "3 place Gambetta", "postalCode": "31000", "city": "Toulouse" },
            "multiplePersonalData": {
                "firstName": "Claire", "lastName": "Lefèvre",
                "email": "claire@example.fr", "phone": "0698765432"
            },
            "multipleRelocationRequests": [
                { "firstName": "Claire", "lastName": "Lefèvre", "email": "claire@example.fr", "phone": "", "adults": 2, "children": 1, "bedrooms": 2 },
                { "firstName": "Hugo", "lastName": "Lefèvre", "email": "hugo@example.fr", "phone": "", "adults": 1, "children": 0, "bedrooms": 1 }
            ],
            "multipleArrivalDetails": {
                "arrivalDate": "2031-01-10", "useExactDates": false,
                "estimatedDuration": "Quelques mois", "numberOfNights": null
            },
            "multipleConsent": { "acceptTerms": true, "acceptDataProcessing": true }
        })
    }

    #[test]
    fn cases_are_found_by_id_or_reference() {
        let directory = CaseDirectory::seeded();
        assert_eq!(
            directory.get_case_by_id("case-002").map(|c| c.reference),
            Some("REL-0B77E512".to_string())
        );
        assert_eq!(
            directory.get_case_by_id("rel-0b77e512").map(|c| c.id),
            Some("case-002".to_string())
        );
        assert!(directory.get_case_by_id("case-999").is_none());
    }

    #[test]
    fn cases_are_listed_newest_first() {
        let directory = CaseDirectory::seeded();
        let cases = directory.relocation_cases(None);
        assert_eq!(cases.len(), 5);
        assert_eq!(cases[0].id, "case-004");

        let pending = directory.relocation_cases(Some(CaseStatus::Pending));
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].id, "case-003");
    }

    #[test]
    fn conversations_are_filtered_by_role() {
        let directory = CaseDirectory::seeded();
        let host = directory.get_conversations(Role::Host);
        assert_eq!(host.len(), 1);
        assert_eq!(host[0].id, "conv-002");

        let insured = directory.get_conversations(Role::Insured);
        assert_eq!(
            insured.iter().map(|c| c.id.as_str()).collect::<Vec<_>>(),
            vec!["conv-003", "conv-001"]
        );
    }

    #[test]
    fn matching_options_fit_the_household() {
        let directory = CaseDirectory::seeded();
        let case = directory.get_case_by_id("case-001").unwrap();
        let options = directory.get_matching_relocation_options(&case);

        // listing-003 closes before the end of the 45 night stay.
        assert_eq!(
            options.iter().map(|l| l.id.as_str()).collect::<Vec<_>>(),
            vec!["listing-001"]
        );

        let small = directory.get_case_by_id("case-004").unwrap();
        let options = directory.get_matching_relocation_options(&small);
        assert_eq!(options[0].id, "listing-002");
        assert!(options.iter().all(|l| l.bedrooms >= 1 && l.max_occupants >= 2));
    }

    #[test]
    fn statistics_count_every_status() {
        let stats = CaseDirectory::seeded().statistics();
        assert_eq!(stats.total, 5);
        assert_eq!(stats.by_status.get(&CaseStatus::Completed), Some(&1));
        assert_eq!(stats.by_status.get(&CaseStatus::Initie), Some(&1));
        assert_eq!(stats.high_priority, 1);
        assert_eq!(stats.people_rehoused, 1);
        assert_eq!(stats.average_satisfaction, Some(4.0));
        assert_eq!(stats.total_cost, 95.0 * 45.0 + 60.0 + 70.0 * 21.0 + 40.0);
    }

    #[test]
    fn multiple_submission_opens_an_initial_case() {
        let directory = CaseDirectory::empty();
        let case = directory.register_relocation(&multiple_answers()).unwrap();

        assert_eq!(case.status, CaseStatus::Initie);
        assert_eq!(case.priority, Priority::High);
        assert_eq!(case.household.size(), 4);
        assert_eq!(case.bedrooms, 3);
        assert_eq!(case.people.len(), 2);
        assert_eq!(case.insured.name, "Claire Lefèvre");
        assert_eq!(case.estimated_duration.as_deref(), Some("Quelques mois"));
        assert!(case.reference.starts_with("REL-"));
        assert_eq!(case.reference.len(), 12);
        assert_eq!(directory.relocation_cases(None).len(), 1);
    }

    #[test]
    fn incomplete_answers_are_rejected() {
        let directory = CaseDirectory::empty();
        let mut answers = multiple_answers();
        answers
            .as_object_mut()
            .unwrap()
            .remove("multipleDisasterAddress");

        let err = directory.register_relocation(&answers).unwrap_err();
        assert!(err.to_string().contains("multipleDisasterAddress"));
        assert!(directory.relocation_cases(None).is_empty());
    }
}
