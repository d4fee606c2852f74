use serde::{Deserialize, Serialize};

use crate::schema::{InsurancePlan, SelectedTreatment};

/// Insurer / patient split for one selected treatment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoverageDetail {
    pub treatment_id: String,
    pub treatment_name: String,
    pub quantity: u32,
    pub line_total: f64,
    /// Percentage applied; 0 when no plan or no rule matched
    pub coverage_percentage: f64,
    pub max_covered_amount: Option<f64>,
    pub covered_amount: f64,
    pub patient_amount: f64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CoverageBreakdown {
    pub details: Vec<CoverageDetail>,
    pub total_covered: f64,
}

/// Resolve insurer coverage for each selected treatment against the full line price.
///
/// A treatment without a matching rule is simply uncovered. The plan's deductible
/// is not applied here.
pub fn resolve_coverage(
    treatments: &[SelectedTreatment],
    plan: Option<&InsurancePlan>,
) -> CoverageBreakdown {
    let details: Vec<CoverageDetail> = treatments
        .iter()
        .map(|selected| {
            let line_total = selected.line_total();
            let rule = plan.and_then(|p| p.rule_for(&selected.treatment.id));

            let (coverage_percentage, max_covered_amount, covered_amount) = match rule {
                Some(rule) => {
                    let by_rate = line_total * rule.coverage_percentage / 100.0;
                    let cap = rule.max_covered_amount.unwrap_or(line_total);
                    (
                        rule.coverage_percentage,
                        rule.max_covered_amount,
                        by_rate.min(cap),
                    )
                }
                None => (0.0, None, 0.0),
            };

            CoverageDetail {
                treatment_id: selected.treatment.id.clone(),
                treatment_name: selected.treatment.name.clone(),
                quantity: selected.quantity,
                line_total,
                coverage_percentage,
                max_covered_amount,
                covered_amount,
                patient_amount: line_total - covered_amount,
            }
        })
        .collect();

    let total_covered = details.iter().map(|d| d.covered_amount).sum();

    CoverageBreakdown {
        details,
        total_covered,
    }
}
