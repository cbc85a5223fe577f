pub mod arrival_details;
pub mod consent;
pub mod disaster_address;
pub mod insurance_coverage;
pub mod insurance_details;
pub mod patterns;
pub mod personal_data;
pub mod property;
pub mod relocation_preferences;
pub mod relocation_requests;
pub mod relocation_type;
pub mod types;

pub use arrival_details::{ArrivalDetailsStep, nights_watcher};
pub use consent::ConsentStep;
pub use disaster_address::DisasterAddressStep;
pub use insurance_coverage::InsuranceCoverageStep;
pub use insurance_details::InsuranceDetailsStep;
pub use personal_data::PersonalDataStep;
pub use relocation_preferences::RelocationPreferencesStep;
pub use relocation_requests::{RelocationRequestsStep, person_template};
pub use relocation_type::RelocationTypeStep;
pub use types::*;
