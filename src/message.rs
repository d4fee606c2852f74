use serde::{Deserialize, Serialize};

use crate::error::SimulationError;
use crate::financing::PaymentEstimate;
use crate::schema::FinancingOption;
use crate::simulation::{SimulationInputs, SimulationResult};

/// User edit to the simulation form, as read from an event script.
///
/// Discount fields carry the raw text typed by the user; it is coerced on apply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SelectionEvent {
    AddTreatment {
        treatment_id: String,
        #[serde(default = "one")]
        quantity: u32,
    },
    SetQuantity {
        treatment_id: String,
        quantity: u32,
    },
    RemoveTreatment {
        treatment_id: String,
    },
    SelectPlan {
        plan_id: Option<String>,
    },
    SetDiscountPercentage {
        value: String,
    },
    SetFixedDiscount {
        value: String,
    },
    SelectFinancing {
        financing_id: Option<String>,
    },
    SelectTerm {
        term_months: Option<u32>,
    },
    Clear,
}

fn one() -> u32 {
    1
}

/// Snapshot to compute, tagged with the generation it was issued under
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationRequest {
    pub generation: u64,
    pub inputs: SimulationInputs,
    pub financing: Option<FinancingOption>,
    pub term_months: Option<u32>,
}

/// Message sent from the session to the recompute worker
#[derive(Debug)]
pub enum RecomputeMessage {
    Recompute(SimulationRequest),
}

#[derive(Debug, Clone, PartialEq)]
pub struct SimulationOutcome {
    pub generation: u64,
    pub result: Option<SimulationResult>,
    pub payment: Result<Option<PaymentEstimate>, SimulationError>,
}

/// Message sent from the recompute worker back to the session
#[derive(Debug)]
pub enum ResultMessage {
    Computed(SimulationOutcome),
}
