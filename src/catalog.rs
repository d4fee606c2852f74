use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::SimulationError;
use crate::schema::{
    FinancingOption, InsurancePlan, Treatment, mock_financing, mock_plan, mock_treatments,
};

/// Longest financing term a catalog may offer (40 years)
pub const MAX_TERM_MONTHS: u32 = 480;

/// Reference data the simulator works against: treatments, plans and financing options
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Catalog {
    #[serde(default)]
    pub treatments: Vec<Treatment>,
    #[serde(default)]
    pub insurance_plans: Vec<InsurancePlan>,
    #[serde(default)]
    pub financing_options: Vec<FinancingOption>,
}

impl Catalog {
    pub fn treatment(&self, id: &str) -> Result<&Treatment, SimulationError> {
        self.treatments
            .iter()
            .find(|t| t.id == id)
            .ok_or_else(|| SimulationError::UnknownTreatment(id.to_string()))
    }

    pub fn plan(&self, id: &str) -> Result<&InsurancePlan, SimulationError> {
        self.insurance_plans
            .iter()
            .find(|p| p.id == id)
            .ok_or_else(|| SimulationError::UnknownPlan(id.to_string()))
    }

    pub fn financing(&self, id: &str) -> Result<&FinancingOption, SimulationError> {
        self.financing_options
            .iter()
            .find(|f| f.id == id)
            .ok_or_else(|| SimulationError::UnknownFinancing(id.to_string()))
    }

    /// Case-insensitive search over treatment name, code and category
    pub fn search_treatments(&self, query: &str) -> Vec<&Treatment> {
        let query = query.trim().to_lowercase();
        if query.is_empty() {
            return self.treatments.iter().collect();
        }
        self.treatments
            .iter()
            .filter(|t| {
                t.name.to_lowercase().contains(&query)
                    || t.code.to_lowercase().contains(&query)
                    || t.category
                        .as_deref()
                        .is_some_and(|c| c.to_lowercase().contains(&query))
            })
            .collect()
    }

    /// Check the invariants the cost engine relies on.
    pub fn validate(&self) -> Result<(), SimulationError> {
        let invalid = |msg: String| -> Result<(), SimulationError> {
            Err(SimulationError::InvalidCatalog(msg))
        };

        let mut ids = HashSet::new();
        for treatment in &self.treatments {
            if !ids.insert(treatment.id.as_str()) {
                return invalid(format!("duplicate treatment id {}", treatment.id));
            }
            if !(treatment.base_price.is_finite() && treatment.base_price >= 0.0) {
                return invalid(format!(
                    "treatment {} has invalid price {}",
                    treatment.id, treatment.base_price
                ));
            }
        }

        for plan in &self.insurance_plans {
            if !(plan.deductible.is_finite() && plan.deductible >= 0.0) {
                return invalid(format!(
                    "plan {} has invalid deductible {}",
                    plan.id, plan.deductible
                ));
            }
            let mut covered = HashSet::new();
            for rule in &plan.coverage_rules {
                if !covered.insert(rule.treatment_id.as_str()) {
                    return invalid(format!(
                        "plan {} has more than one rule for {}",
                        plan.id, rule.treatment_id
                    ));
                }
                if !(0.0..=100.0).contains(&rule.coverage_percentage) {
                    return invalid(format!(
                        "plan {} covers {} at {}%",
                        plan.id, rule.treatment_id, rule.coverage_percentage
                    ));
                }
                if rule.max_covered_amount.is_some_and(|cap| !(cap >= 0.0)) {
                    return invalid(format!(
                        "plan {} has a negative cap for {}",
                        plan.id, rule.treatment_id
                    ));
                }
            }
        }

        for option in &self.financing_options {
            if option.terms_months.is_empty() || option.terms_months.contains(&0) {
                return invalid(format!("financing {} has no valid terms", option.id));
            }
            if let Some(term) = option
                .terms_months
                .iter()
                .find(|&&term| term > MAX_TERM_MONTHS)
            {
                return invalid(format!(
                    "financing {} offers {} months, more than {}",
                    option.id, term, MAX_TERM_MONTHS
                ));
            }
            if !(option.annual_rate.is_finite()
                && option.annual_rate >= 0.0
                && option.origination_fee.is_finite()
                && option.origination_fee >= 0.0)
            {
                return invalid(format!("financing {} has a negative rate", option.id));
            }
        }

        Ok(())
    }
}

/// Sample catalog built from the schema fixtures
pub fn mock_catalog() -> Catalog {
    Catalog {
        treatments: mock_treatments(),
        insurance_plans: vec![mock_plan()],
        financing_options: vec![mock_financing()],
    }
}
