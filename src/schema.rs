use serde::{Deserialize, Serialize};

/// A billable treatment from the clinic catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Treatment {
    pub id: String,
    pub name: String,
    pub code: String,
    pub description: Option<String>,
    pub base_price: f64,
    pub category: Option<String>,
}

/// A treatment picked for a simulation, with its quantity (always >= 1)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectedTreatment {
    pub treatment: Treatment,
    pub quantity: u32,
}

impl SelectedTreatment {
    pub fn new(treatment: Treatment, quantity: u32) -> Self {
        Self {
            treatment,
            quantity: quantity.max(1),
        }
    }

    pub fn line_total(&self) -> f64 {
        self.treatment.base_price * self.quantity as f64
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoverageRule {
    pub treatment_id: String,
    pub coverage_percentage: f64,
    pub max_covered_amount: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsurancePlan {
    pub id: String,
    pub insurer: String,
    pub name: String,
    #[serde(default)]
    pub deductible: f64,
    #[serde(default)]
    pub coverage_rules: Vec<CoverageRule>,
}

impl InsurancePlan {
    /// Coverage rule for a treatment. Plans hold at most one rule per treatment.
    pub fn rule_for(&self, treatment_id: &str) -> Option<&CoverageRule> {
        self.coverage_rules
            .iter()
            .find(|rule| rule.treatment_id == treatment_id)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinancingOption {
    pub id: String,
    pub name: String,
    pub entity: String,
    pub terms_months: Vec<u32>,
    /// Annual interest rate, in percent
    pub annual_rate: f64,
    /// Origination fee, in percent of the financed amount
    #[serde(default)]
    pub origination_fee: f64,
}

impl FinancingOption {
    pub fn offers_term(&self, term: u32) -> bool {
        self.terms_months.contains(&term)
    }
}

/// Sample treatments used by tests and the demo command
pub fn mock_treatments() -> Vec<Treatment> {
    vec![
        Treatment {
            id: "t1".to_string(),
            name: "Root canal".to_string(),
            code: "D3310".to_string(),
            description: Some("Endodontic therapy, anterior tooth".to_string()),
            base_price: 100.0,
            category: Some("endodontics".to_string()),
        },
        Treatment {
            id: "t2".to_string(),
            name: "Prophylaxis".to_string(),
            code: "D1110".to_string(),
            description: None,
            base_price: 50.0,
            category: Some("preventive".to_string()),
        },
        Treatment {
            id: "t3".to_string(),
            name: "Crown".to_string(),
            code: "D2740".to_string(),
            description: Some("Porcelain/ceramic crown".to_string()),
            base_price: 800.0,
            category: Some("prosthodontics".to_string()),
        },
    ]
}

/// Plan covering the root canal at 50% capped at 30 and crowns at 40% uncapped
pub fn mock_plan() -> InsurancePlan {
    InsurancePlan {
        id: "p1".to_string(),
        insurer: "Delta Mutual".to_string(),
        name: "Basic Dental".to_string(),
        deductible: 50.0,
        coverage_rules: vec![
            CoverageRule {
                treatment_id: "t1".to_string(),
                coverage_percentage: 50.0,
                max_covered_amount: Some(30.0),
            },
            CoverageRule {
                treatment_id: "t3".to_string(),
                coverage_percentage: 40.0,
                max_covered_amount: None,
            },
        ],
    }
}

pub fn mock_financing() -> FinancingOption {
    FinancingOption {
        id: "f1".to_string(),
        name: "Smile Credit".to_string(),
        entity: "Clinic Bank".to_string(),
        terms_months: vec![6, 12, 24],
        annual_rate: 6.0,
        origination_fee: 2.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::from_str;

    #[test]
    fn test_schema() {
        let json = r#"
        {
            "id": "p9",
            "insurer": "Acme Health",
            "name": "Gold",
            "deductible": 100.0,
            "coverage_rules": [
                { "treatment_id": "t1", "coverage_percentage": 80.0, "max_covered_amount": 500.0 },
                { "treatment_id": "t2", "coverage_percentage": 100.0, "max_covered_amount": null }
            ]
        }
        "#;

        let plan: InsurancePlan = from_str(json).expect("Failed to parse JSON");
        assert_eq!(plan.id, "p9");
        assert_eq!(plan.deductible, 100.0);
        assert_eq!(plan.coverage_rules.len(), 2);
        assert_eq!(plan.rule_for("t1").unwrap().max_covered_amount, Some(500.0));
        assert_eq!(plan.rule_for("t2").unwrap().max_covered_amount, None);
        assert!(plan.rule_for("t3").is_none());
    }

    #[test]
    fn test_plan_defaults() {
        let plan: InsurancePlan =
            from_str(r#"{ "id": "p0", "insurer": "X", "name": "Empty" }"#).unwrap();
        assert_eq!(plan.deductible, 0.0);
        assert!(plan.coverage_rules.is_empty());
    }

    #[test]
    fn test_selected_treatment_quantity_floor() {
        let selected = SelectedTreatment::new(mock_treatments()[1].clone(), 0);
        assert_eq!(selected.quantity, 1);
        assert_eq!(selected.line_total(), 50.0);
    }

    #[test]
    fn test_financing_terms() {
        let option = mock_financing();
        assert!(option.offers_term(12));
        assert!(!option.offers_term(18));
    }
}
