use serde::{Deserialize, Serialize};

use crate::coverage::{CoverageDetail, resolve_coverage};
use crate::schema::{InsurancePlan, SelectedTreatment};

/// Immutable snapshot of everything a cost simulation depends on
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SimulationInputs {
    pub treatments: Vec<SelectedTreatment>,
    pub plan: Option<InsurancePlan>,
    pub discount_percentage: f64,
    pub fixed_discount: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationResult {
    pub subtotal: f64,
    pub percentage_discount_amount: f64,
    pub fixed_discount: f64,
    pub total_discount: f64,
    pub amount_after_discount: f64,
    pub insurance_covered: f64,
    /// Never negative
    pub patient_total: f64,
    pub coverage: Vec<CoverageDetail>,
}

/// Run a cost simulation. Returns `None` when nothing is selected.
///
/// Discounts and insurance coverage are both taken off the original subtotal:
/// coverage is resolved on undiscounted line prices, not on the discounted amount.
pub fn simulate(inputs: &SimulationInputs) -> Option<SimulationResult> {
    if inputs.treatments.is_empty() {
        return None;
    }

    let subtotal: f64 = inputs
        .treatments
        .iter()
        .map(SelectedTreatment::line_total)
        .sum();
    let percentage_discount_amount = subtotal * inputs.discount_percentage / 100.0;
    let total_discount = percentage_discount_amount + inputs.fixed_discount;
    let amount_after_discount = subtotal - total_discount;

    let coverage = resolve_coverage(&inputs.treatments, inputs.plan.as_ref());
    let patient_total = (amount_after_discount - coverage.total_covered).max(0.0);

    Some(SimulationResult {
        subtotal,
        percentage_discount_amount,
        fixed_discount: inputs.fixed_discount,
        total_discount,
        amount_after_discount,
        insurance_covered: coverage.total_covered,
        patient_total,
        coverage: coverage.details,
    })
}
