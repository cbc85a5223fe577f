use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Section names of the answer trees, shared by steps, wizards and the case
/// directory.
pub mod sections {
    pub const RELOCATION_TYPE: &str = "relocationType";

    pub const SINGLE_INSURANCE_COVERAGE: &str = "singleInsuranceCoverage";
    pub const SINGLE_INSURED_DATA: &str = "singleInsuredData";
    pub const SINGLE_INSURANCE_DETAILS: &str = "singleInsuranceDetails";
    pub const SINGLE_DISASTER_ADDRESS: &str = "singleDisasterAddress";
    pub const SINGLE_PERSONAL_DATA: &str = "singlePersonalData";
    pub const SINGLE_RELOCATION_PREFERENCES: &str = "singleRelocationPreferences";
    pub const SINGLE_ARRIVAL_DETAILS: &str = "singleArrivalDetails";
    pub const SINGLE_CONSENT: &str = "singleConsent";

    pub const MULTIPLE_DISASTER_ADDRESS: &str = "multipleDisasterAddress";
    pub const MULTIPLE_PERSONAL_DATA: &str = "multiplePersonalData";
    pub const MULTIPLE_RELOCATION_REQUESTS: &str = "multipleRelocationRequests";
    pub const MULTIPLE_ARRIVAL_DETAILS: &str = "multipleArrivalDetails";
    pub const MULTIPLE_CONSENT: &str = "multipleConsent";

    pub const PROPERTY_TYPE: &str = "propertyType";
    pub const PROPERTY_ADDRESS: &str = "propertyAddress";
    pub const PROPERTY_DETAILS: &str = "propertyDetails";
    pub const PROPERTY_AVAILABILITY: &str = "propertyAvailability";
    pub const PROPERTY_PRICING: &str = "propertyPricing";
    pub const PROPERTY_HOST: &str = "propertyHost";
}

pub const SINGLE: &str = "single";
pub const MULTIPLE: &str = "multiple";

pub const ESTIMATED_DURATIONS: [&str; 4] = [
    "Quelques jours",
    "Quelques semaines",
    "Quelques mois",
    "Plus de six mois",
];

pub const PROPERTY_KINDS: [&str; 4] = ["apartment", "house", "studio", "villa"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct PersonalData {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    #[serde(default)]
    pub phone: String,
}

impl PersonalData {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name.trim(), self.last_name.trim())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    pub street: String,
    pub postal_code: String,
    pub city: String,
}

impl Address {
    /// Two-digit French department code.
    pub fn department(&self) -> &str {
        self.postal_code.get(..2).unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelocationPreferences {
    pub bedrooms: u32,
    pub adults: u32,
    #[serde(default)]
    pub children: u32,
    #[serde(default)]
    pub pets: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArrivalDetails {
    pub arrival_date: NaiveDate,
    #[serde(default)]
    pub use_exact_dates: bool,
    #[serde(default)]
    pub departure_date: Option<NaiveDate>,
    #[serde(default)]
    pub estimated_duration: Option<String>,
    #[serde(default)]
    pub number_of_nights: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelocationRequest {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    #[serde(default)]
    pub phone: String,
    pub adults: u32,
    #[serde(default)]
    pub children: u32,
    pub bedrooms: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyTypeAnswers {
    pub kind: String,
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyDetails {
    pub surface: f64,
    pub rooms: u32,
    #[serde(default)]
    pub bedrooms: u32,
    pub bathrooms: u32,
    pub max_occupants: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyAvailability {
    pub available_from: NaiveDate,
    #[serde(default)]
    pub available_until: Option<NaiveDate>,
    #[serde(default)]
    pub minimum_stay: Option<u32>,
    #[serde(default)]
    pub amenities: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyPricing {
    pub nightly_rate: f64,
    #[serde(default)]
    pub cleaning_fee: Option<f64>,
    #[serde(default)]
    pub deposit: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyHost {
    pub host_name: String,
    pub host_email: String,
    #[serde(default)]
    pub host_phone: String,
}
