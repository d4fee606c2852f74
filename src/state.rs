use crate::sanitize;
use crate::schema::{FinancingOption, InsurancePlan, SelectedTreatment, Treatment};
use crate::simulation::SimulationInputs;

/// Caller-owned state of a cost simulation form.
///
/// Every mutation is a plain synchronous transition; computing the result is
/// left to `simulation::simulate` on a snapshot from `inputs()`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SimulationState {
    selected: Vec<SelectedTreatment>,
    plan: Option<InsurancePlan>,
    discount_percentage: f64,
    fixed_discount: f64,
    financing: Option<FinancingOption>,
    term_months: Option<u32>,
}

impl SimulationState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn selected(&self) -> &[SelectedTreatment] {
        &self.selected
    }

    pub fn plan(&self) -> Option<&InsurancePlan> {
        self.plan.as_ref()
    }

    pub fn discount_percentage(&self) -> f64 {
        self.discount_percentage
    }

    pub fn fixed_discount(&self) -> f64 {
        self.fixed_discount
    }

    pub fn financing(&self) -> Option<&FinancingOption> {
        self.financing.as_ref()
    }

    pub fn term_months(&self) -> Option<u32> {
        self.term_months
    }

    /// Add a treatment; adding one already selected sums the quantities.
    pub fn add_treatment(&mut self, treatment: Treatment, quantity: u32) {
        let quantity = quantity.max(1);
        match self
            .selected
            .iter_mut()
            .find(|s| s.treatment.id == treatment.id)
        {
            Some(existing) => existing.quantity = existing.quantity.saturating_add(quantity),
            None => self.selected.push(SelectedTreatment::new(treatment, quantity)),
        }
    }

    /// Set the quantity of a selected treatment. Zero removes it.
    /// Returns false when the treatment is not selected.
    pub fn set_quantity(&mut self, treatment_id: &str, quantity: u32) -> bool {
        if quantity == 0 {
            return self.remove_treatment(treatment_id);
        }
        match self
            .selected
            .iter_mut()
            .find(|s| s.treatment.id == treatment_id)
        {
            Some(existing) => {
                existing.quantity = quantity;
                true
            }
            None => false,
        }
    }

    pub fn remove_treatment(&mut self, treatment_id: &str) -> bool {
        let before = self.selected.len();
        self.selected.retain(|s| s.treatment.id != treatment_id);
        self.selected.len() != before
    }

    pub fn select_plan(&mut self, plan: Option<InsurancePlan>) {
        self.plan = plan;
    }

    pub fn set_discount_percentage(&mut self, value: f64) {
        self.discount_percentage = sanitize::percentage(value);
    }

    pub fn set_fixed_discount(&mut self, value: f64) {
        self.fixed_discount = sanitize::amount(value);
    }

    /// Switch financing option. A chosen term the new option does not offer is dropped.
    pub fn select_financing(&mut self, option: Option<FinancingOption>) {
        let keep_term = match (&option, self.term_months) {
            (Some(option), Some(term)) => option.offers_term(term),
            _ => false,
        };
        if !keep_term {
            self.term_months = None;
        }
        self.financing = option;
    }

    /// Choose a term. Ignored (and returns false) without a financing option offering it.
    pub fn select_term(&mut self, term: Option<u32>) -> bool {
        match (term, &self.financing) {
            (None, _) => {
                self.term_months = None;
                true
            }
            (Some(term), Some(option)) if option.offers_term(term) => {
                self.term_months = Some(term);
                true
            }
            _ => false,
        }
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    pub fn inputs(&self) -> SimulationInputs {
        SimulationInputs {
            treatments: self.selected.clone(),
            plan: self.plan.clone(),
            discount_percentage: self.discount_percentage,
            fixed_discount: self.fixed_discount,
        }
    }
}
