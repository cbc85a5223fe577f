//! Insurer-side records: relocation cases, host listings and the message
//! threads around them.

pub mod directory;
mod seed;

pub use directory::CaseDirectory;

use chrono::{DateTime, NaiveDate, Utc};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::steps::Address;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum CaseStatus {
    Initie,
    Processing,
    Completed,
    Pending,
    Cancelled,
}

impl fmt::Display for CaseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            CaseStatus::Initie => "initie",
            CaseStatus::Processing => "processing",
            CaseStatus::Completed => "completed",
            CaseStatus::Pending => "pending",
            CaseStatus::Cancelled => "cancelled",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    Normal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Contact {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Household {
    pub adults: u32,
    pub children: u32,
    #[serde(default)]
    pub pets: bool,
}

impl Household {
    pub fn size(&self) -> u32 {
        self.adults + self.children
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CostBreakdown {
    pub nightly_rate: f64,
    pub nights: u32,
    pub cleaning_fee: f64,
}

impl CostBreakdown {
    pub fn total(&self) -> f64 {
        self.nightly_rate * f64::from(self.nights) + self.cleaning_fee
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Satisfaction {
    /// 1 to 5.
    pub rating: u8,
    #[serde(default)]
    pub comment: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelocationCase {
    pub id: String,
    pub reference: String,
    pub status: CaseStatus,
    pub priority: Priority,
    pub relocation_type: String,
    pub insured: Contact,
    /// Every person to rehouse, the insured included.
    #[serde(default)]
    pub people: Vec<Contact>,
    pub disaster_address: Address,
    pub household: Household,
    pub bedrooms: u32,
    pub arrival_date: NaiveDate,
    #[serde(default)]
    pub number_of_nights: Option<u32>,
    #[serde(default)]
    pub estimated_duration: Option<String>,
    #[serde(default)]
    pub cost: Option<CostBreakdown>,
    #[serde(default)]
    pub satisfaction: Option<Satisfaction>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Insurer,
    Host,
    Insured,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub from: Role,
    pub body: String,
    pub sent_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Conversation {
    pub id: String,
    pub case_id: String,
    pub subject: String,
    pub participants: Vec<Role>,
    pub messages: Vec<Message>,
}

impl Conversation {
    pub fn last_message(&self) -> Option<&Message> {
        self.messages.iter().max_by_key(|message| message.sent_at)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyListing {
    pub id: String,
    pub title: String,
    pub kind: String,
    pub address: Address,
    pub bedrooms: u32,
    pub max_occupants: u32,
    pub nightly_rate: f64,
    pub available_from: NaiveDate,
    #[serde(default)]
    pub available_until: Option<NaiveDate>,
    #[serde(default)]
    pub amenities: Vec<String>,
    pub host: Contact,
}

impl PropertyListing {
    /// Free for the whole stay. Open-ended stays only fit open-ended listings.
    pub fn is_available(&self, arrival: NaiveDate, nights: Option<u32>) -> bool {
        if self.available_from > arrival {
            return false;
        }
        match (self.available_until, nights) {
            (None, _) => true,
            (Some(until), Some(nights)) => {
                arrival + chrono::Duration::days(i64::from(nights)) <= until
            }
            (Some(_), None) => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CaseStatistics {
    pub total: usize,
    pub by_status: BTreeMap<CaseStatus, usize>,
    pub high_priority: usize,
    pub people_rehoused: u32,
    pub average_satisfaction: Option<f64>,
    pub total_cost: f64,
}
