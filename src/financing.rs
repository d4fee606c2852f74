use serde::{Deserialize, Serialize};

use crate::error::SimulationError;
use crate::schema::FinancingOption;

/// Summary of a fixed-rate loan for the patient total
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentEstimate {
    pub option_id: String,
    pub term_months: u32,
    pub principal: f64,
    pub origination_fee: f64,
    pub financed_amount: f64,
    pub monthly_payment: f64,
    pub total_paid: f64,
    pub total_interest: f64,
}

fn check_rate(field: &'static str, value: f64) -> Result<(), SimulationError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(SimulationError::InvalidRate { field, value })
    }
}

/// Fixed monthly payment for `principal` plus its origination fee.
///
/// `Ok(None)` means there is nothing to estimate yet: no positive principal, or
/// no term chosen. A zero-month term or a negative rate is a caller error, as is
/// a term so long that the payment cannot be represented.
pub fn monthly_payment(
    principal: f64,
    annual_rate_pct: f64,
    origination_fee_pct: f64,
    term_months: Option<u32>,
) -> Result<Option<f64>, SimulationError> {
    check_rate("annual_rate", annual_rate_pct)?;
    check_rate("origination_fee", origination_fee_pct)?;
    let term = match term_months {
        Some(0) => return Err(SimulationError::InvalidTerm),
        Some(term) => i32::try_from(term).map_err(|_| SimulationError::InvalidTerm)?,
        None => return Ok(None),
    };
    if !(principal.is_finite() && principal > 0.0) {
        return Ok(None);
    }

    let monthly_rate = annual_rate_pct / 100.0 / 12.0;
    let financed_amount = principal + principal * origination_fee_pct / 100.0;

    let payment = if monthly_rate == 0.0 {
        financed_amount / f64::from(term)
    } else {
        let growth = (1.0 + monthly_rate).powi(term);
        if !growth.is_finite() {
            return Err(SimulationError::InvalidTerm);
        }
        financed_amount * monthly_rate * growth / (growth - 1.0)
    };
    if !payment.is_finite() {
        return Err(SimulationError::InvalidTerm);
    }
    Ok(Some(payment))
}

/// Full estimate for a financing option; the term must be one the option offers.
pub fn estimate(
    principal: f64,
    option: &FinancingOption,
    term_months: Option<u32>,
) -> Result<Option<PaymentEstimate>, SimulationError> {
    if let Some(term) = term_months {
        if term > 0 && !option.offers_term(term) {
            return Err(SimulationError::TermNotOffered {
                option_id: option.id.clone(),
                term,
            });
        }
    }

    let payment = monthly_payment(
        principal,
        option.annual_rate,
        option.origination_fee,
        term_months,
    )?;

    Ok(payment.zip(term_months).map(|(monthly_payment, term)| {
        let origination_fee = principal * option.origination_fee / 100.0;
        let financed_amount = principal + origination_fee;
        let total_paid = monthly_payment * term as f64;
        PaymentEstimate {
            option_id: option.id.clone(),
            term_months: term,
            principal,
            origination_fee,
            financed_amount,
            monthly_payment,
            total_paid,
            total_interest: total_paid - financed_amount,
        }
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::mock_financing;

    #[test]
    fn test_amortized_payment() {
        let payment = monthly_payment(1200.0, 6.0, 2.0, Some(12)).unwrap().unwrap();
        assert!((payment - 105.35).abs() < 0.01, "payment was {payment}");
    }

    #[test]
    fn test_zero_rate_is_straight_division() {
        let payment = monthly_payment(1000.0, 0.0, 3.0, Some(10)).unwrap().unwrap();
        assert!((payment - 103.0).abs() < 1e-9);
        let payment = monthly_payment(500.0, 0.0, 0.0, Some(7)).unwrap().unwrap();
        assert!((payment - 500.0 / 7.0).abs() < 1e-12);
    }

    #[test]
    fn test_nothing_to_estimate() {
        assert_eq!(monthly_payment(0.0, 6.0, 0.0, Some(12)), Ok(None));
        assert_eq!(monthly_payment(-50.0, 6.0, 0.0, Some(12)), Ok(None));
        assert_eq!(monthly_payment(100.0, 6.0, 0.0, None), Ok(None));
    }

    #[test]
    fn test_invalid_inputs_are_rejected() {
        assert_eq!(
            monthly_payment(100.0, 6.0, 0.0, Some(0)),
            Err(SimulationError::InvalidTerm)
        );
        assert!(matches!(
            monthly_payment(100.0, -1.0, 0.0, Some(12)),
            Err(SimulationError::InvalidRate { field: "annual_rate", .. })
        ));
        assert!(matches!(
            monthly_payment(100.0, 5.0, f64::NAN, Some(12)),
            Err(SimulationError::InvalidRate { field: "origination_fee", .. })
        ));
    }

    #[test]
    fn test_overlong_terms_are_rejected() {
        // 1.005^200000 overflows
        assert_eq!(
            monthly_payment(1200.0, 6.0, 2.0, Some(200_000)),
            Err(SimulationError::InvalidTerm)
        );
        // does not fit an i32 exponent
        assert_eq!(
            monthly_payment(1200.0, 6.0, 2.0, Some(3_000_000_000)),
            Err(SimulationError::InvalidTerm)
        );
        // a huge rate overflows even on a short term
        assert_eq!(
            monthly_payment(1200.0, 1e300, 0.0, Some(12)),
            Err(SimulationError::InvalidTerm)
        );
        // interest-free stays finite
        let payment = monthly_payment(1200.0, 0.0, 0.0, Some(200_000)).unwrap().unwrap();
        assert!(payment.is_finite());
    }

    #[test]
    fn test_estimate_never_reports_nan() {
        let mut option = mock_financing();
        option.terms_months.push(200_000);
        assert_eq!(
            estimate(1200.0, &option, Some(200_000)),
            Err(SimulationError::InvalidTerm)
        );
    }

    #[test]
    fn test_estimate() {
        let option = mock_financing();
        let estimate = estimate(1200.0, &option, Some(12)).unwrap().unwrap();
        assert_eq!(estimate.term_months, 12);
        assert_eq!(estimate.origination_fee, 24.0);
        assert_eq!(estimate.financed_amount, 1224.0);
        assert!((estimate.total_paid - 1264.14).abs() < 0.01);
        assert!((estimate.total_interest - 40.14).abs() < 0.01);
    }

    #[test]
    fn test_estimate_rejects_unoffered_term() {
        let option = mock_financing();
        assert_eq!(
            estimate(1200.0, &option, Some(18)),
            Err(SimulationError::TermNotOffered {
                option_id: "f1".to_string(),
                term: 18,
            })
        );
        assert_eq!(estimate(1200.0, &option, None), Ok(None));
    }
}
