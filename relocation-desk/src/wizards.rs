//! The two wizards the desk offers: relocation intake and property listing.

use clap::ValueEnum;
use serde_json::json;
use std::fmt;
use std::sync::Arc;
use wizard_flow::{Result, WizardBuilder, WizardDefinition};

use crate::steps::property::{
    property_address_step, property_availability_step, property_details_step,
    property_host_step, property_pricing_step, property_type_step,
};
use crate::steps::{
    ArrivalDetailsStep, ConsentStep, DisasterAddressStep, InsuranceCoverageStep,
    InsuranceDetailsStep, MULTIPLE, PersonalDataStep, RelocationPreferencesStep,
    RelocationRequestsStep, RelocationTypeStep, SINGLE, nights_watcher, sections,
};

pub const RELOCATION_WIZARD_ID: &str = "relocation";
pub const PROPERTY_WIZARD_ID: &str = "property";

/// Step count shown while the relocation type is still unanswered.
pub const PLACEHOLDER_STEPS: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum WizardKind {
    Relocation,
    Property,
}

impl WizardKind {
    pub fn definition(self) -> Result<WizardDefinition> {
        match self {
            WizardKind::Relocation => relocation_wizard(),
            WizardKind::Property => property_wizard(),
        }
    }
}

impl fmt::Display for WizardKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WizardKind::Relocation => f.write_str(RELOCATION_WIZARD_ID),
            WizardKind::Property => f.write_str(PROPERTY_WIZARD_ID),
        }
    }
}

/// Relocation intake. Step 1 picks `single` (8 steps) or `multiple`
/// (6 steps).
pub fn relocation_wizard() -> Result<WizardDefinition> {
    WizardBuilder::new(RELOCATION_WIZARD_ID)
        .branch_selector(sections::RELOCATION_TYPE)
        .placeholder_steps(PLACEHOLDER_STEPS)
        .add_step(Arc::new(RelocationTypeStep::new()))
        // single
        .add_branch_step(SINGLE, Arc::new(InsuranceCoverageStep::new()))
        .add_branch_step(SINGLE, Arc::new(InsuranceDetailsStep::new()))
        .add_branch_step(
            SINGLE,
            Arc::new(DisasterAddressStep::new(sections::SINGLE_DISASTER_ADDRESS)),
        )
        .add_branch_step(
            SINGLE,
            Arc::new(PersonalDataStep::new(sections::SINGLE_PERSONAL_DATA)),
        )
        .add_branch_step(SINGLE, Arc::new(RelocationPreferencesStep::new()))
        .add_branch_step(
            SINGLE,
            Arc::new(ArrivalDetailsStep::new(sections::SINGLE_ARRIVAL_DETAILS)),
        )
        .add_branch_step(SINGLE, Arc::new(ConsentStep::new(sections::SINGLE_CONSENT)))
        // multiple
        .add_branch_step(
            MULTIPLE,
            Arc::new(DisasterAddressStep::new(sections::MULTIPLE_DISASTER_ADDRESS)),
        )
        .add_branch_step(
            MULTIPLE,
            Arc::new(PersonalDataStep::new(sections::MULTIPLE_PERSONAL_DATA)),
        )
        .add_branch_step(MULTIPLE, Arc::new(RelocationRequestsStep::new()))
        .add_branch_step(
            MULTIPLE,
            Arc::new(ArrivalDetailsStep::new(sections::MULTIPLE_ARRIVAL_DETAILS)),
        )
        .add_branch_step(MULTIPLE, Arc::new(ConsentStep::new(sections::MULTIPLE_CONSENT)))
        .default_section(
            sections::SINGLE_RELOCATION_PREFERENCES,
            json!({ "children": 0, "pets": false }),
        )
        .default_section(sections::SINGLE_ARRIVAL_DETAILS, json!({ "useExactDates": false }))
        .default_section(sections::MULTIPLE_ARRIVAL_DETAILS, json!({ "useExactDates": false }))
        .default_section(sections::MULTIPLE_RELOCATION_REQUESTS, json!([]))
        .watch(nights_watcher(sections::SINGLE_ARRIVAL_DETAILS))
        .watch(nights_watcher(sections::MULTIPLE_ARRIVAL_DETAILS))
        .build()
}

/// Property listing intake, a straight six-step sequence.
pub fn property_wizard() -> Result<WizardDefinition> {
    WizardBuilder::new(PROPERTY_WIZARD_ID)
        .add_step(property_type_step())
        .add_step(property_address_step())
        .add_step(property_details_step())
        .add_step(property_availability_step())
        .add_step(property_pricing_step())
        .add_step(property_host_step())
        .default_section(sections::PROPERTY_AVAILABILITY, json!({ "amenities": [] }))
        .build()
}
