use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use fake::faker::company::en::CompanyName;
use fake::faker::lorem::en::{Sentence, Word};
use fake::Fake;
use rand::Rng;
use rand::seq::IndexedRandom;

use crate::catalog::Catalog;
use crate::message::SelectionEvent;
use crate::schema::{CoverageRule, FinancingOption, InsurancePlan, Treatment};

const PROCEDURES: [(&str, &str, &str); 10] = [
    ("D0120", "Periodic oral evaluation", "diagnostic"),
    ("D0210", "Full mouth radiographs", "diagnostic"),
    ("D1110", "Prophylaxis", "preventive"),
    ("D1351", "Sealant", "preventive"),
    ("D2391", "Composite filling", "restorative"),
    ("D2740", "Porcelain crown", "prosthodontics"),
    ("D3310", "Root canal, anterior", "endodontics"),
    ("D4341", "Scaling and root planing", "periodontics"),
    ("D6010", "Implant placement", "implants"),
    ("D7140", "Extraction", "oral surgery"),
];

/// Generate a plausible treatment with a random price
pub fn fake_treatment(index: usize) -> Treatment {
    let mut rng = rand::rng();
    let (code, name, category) = PROCEDURES[index % PROCEDURES.len()];
    let price: f64 = rng.random_range(40.0..1500.0);
    Treatment {
        id: format!("t{}", index + 1),
        name: name.to_string(),
        code: code.to_string(),
        description: Some(Sentence(3..8).fake()),
        base_price: (price * 100.0).round() / 100.0,
        category: Some(category.to_string()),
    }
}

/// Generate a plan with rules for roughly half of the given treatments
pub fn fake_plan(index: usize, treatments: &[Treatment]) -> InsurancePlan {
    let mut rng = rand::rng();
    let mut coverage_rules = Vec::new();
    for treatment in treatments {
        if !rng.random_bool(0.5) {
            continue;
        }
        let coverage_percentage = *[50.0, 60.0, 70.0, 80.0, 100.0]
            .choose(&mut rng)
            .unwrap_or(&50.0);
        let max_covered_amount = rng
            .random_bool(0.5)
            .then(|| (rng.random_range(5..50) * 10) as f64);
        coverage_rules.push(CoverageRule {
            treatment_id: treatment.id.clone(),
            coverage_percentage,
            max_covered_amount,
        });
    }
    InsurancePlan {
        id: format!("p{}", index + 1),
        insurer: CompanyName().fake(),
        name: format!("{} plan", Word().fake::<String>()),
        deductible: (rng.random_range(0..10) * 25) as f64,
        coverage_rules,
    }
}

pub fn fake_financing(index: usize) -> FinancingOption {
    let mut rng = rand::rng();
    FinancingOption {
        id: format!("f{}", index + 1),
        name: format!("{} credit", Word().fake::<String>()),
        entity: CompanyName().fake(),
        terms_months: vec![6, 12, 18, 24],
        annual_rate: *[0.0, 4.5, 6.0, 9.9].choose(&mut rng).unwrap_or(&0.0),
        origination_fee: *[0.0, 1.0, 2.0].choose(&mut rng).unwrap_or(&0.0),
    }
}

pub fn fake_catalog(treatment_count: usize) -> Catalog {
    let treatments: Vec<Treatment> = (0..treatment_count.max(1)).map(fake_treatment).collect();
    let insurance_plans = (0..2).map(|i| fake_plan(i, &treatments)).collect();
    let financing_options = (0..2).map(fake_financing).collect();
    Catalog {
        treatments,
        insurance_plans,
        financing_options,
    }
}

/// Random but well-formed form edits against a catalog
pub fn fake_events(catalog: &Catalog, n: usize) -> Vec<SelectionEvent> {
    let mut rng = rand::rng();
    let mut financing_id: Option<String> = None;

    (0..n)
        .map(|_| match rng.random_range(0..10) {
            0..=3 => SelectionEvent::AddTreatment {
                treatment_id: catalog
                    .treatments
                    .choose(&mut rng)
                    .map(|t| t.id.clone())
                    .unwrap_or_default(),
                quantity: rng.random_range(1..=3),
            },
            4 => SelectionEvent::SelectPlan {
                plan_id: catalog.insurance_plans.choose(&mut rng).map(|p| p.id.clone()),
            },
            5 => SelectionEvent::SetDiscountPercentage {
                value: rng.random_range(0..=20u32).to_string(),
            },
            6 => SelectionEvent::SetFixedDiscount {
                value: format!("{:.2}", rng.random_range(0.0..50.0f64)),
            },
            7 => {
                financing_id = catalog
                    .financing_options
                    .choose(&mut rng)
                    .map(|f| f.id.clone());
                SelectionEvent::SelectFinancing {
                    financing_id: financing_id.clone(),
                }
            }
            _ => {
                let term = financing_id
                    .as_deref()
                    .and_then(|id| catalog.financing(id).ok())
                    .and_then(|f| f.terms_months.choose(&mut rng).copied());
                SelectionEvent::SelectTerm { term_months: term }
            }
        })
        .collect()
}

pub fn write_fake_catalog(path: impl AsRef<Path>, catalog: &Catalog) -> anyhow::Result<()> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, catalog)?;
    writer.flush()?;
    Ok(())
}

/// Write n fake events as JSON lines for the replay command
pub fn write_fake_events_jsonl(
    path: impl AsRef<Path>,
    catalog: &Catalog,
    n: usize,
) -> anyhow::Result<()> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    for event in fake_events(catalog, n) {
        writeln!(writer, "{}", serde_json::to_string(&event)?)?;
    }
    writer.flush()?;
    Ok(())
}
