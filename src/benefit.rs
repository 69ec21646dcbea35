//! Individual employee end-of-service benefit
//!
//! Compares the statutory lump sum on final salary (unfunded) with a fund
//! that receives each service year's accrual on that year's salary and
//! compounds at the fund return rate (funded).

use crate::error::ConfigError;
use crate::projection::{annual_accrual_rate, gratuity_rate};
use serde::{Deserialize, Serialize};

/// Inputs for one employee
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmployeeProfile {
    /// Monthly basic salary in the previous year
    pub previous_salary: f64,
    pub salary_growth_rate: f64,
    pub tenure_years: f64,
    pub fund_return_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenefitEstimate {
    pub current_salary: f64,
    pub gratuity_rate: f64,
    pub unfunded: f64,
    pub funded: f64,
    /// funded - unfunded
    pub return_differential: f64,
}

pub fn estimate_benefit(profile: &EmployeeProfile) -> Result<BenefitEstimate, ConfigError> {
    let positive = |name: &'static str, value: f64, max: f64| {
        if !(0.0..=max).contains(&value) {
            Err(ConfigError::OutOfRange { name, value, min: 0.0, max })
        } else {
            Ok(())
        }
    };
    positive("previous_salary", profile.previous_salary, f64::MAX)?;
    positive("salary_growth_rate", profile.salary_growth_rate, 1.0)?;
    positive("tenure_years", profile.tenure_years, 60.0)?;
    positive("fund_return_rate", profile.fund_return_rate, 0.15)?;

    let current_salary = profile.previous_salary * (1.0 + profile.salary_growth_rate);
    let rate = gratuity_rate(profile.tenure_years);
    let unfunded = current_salary * rate;

    let service_years = profile.tenure_years.floor() as u32;
    let mut funded = 0.0;
    for year in 0..service_years {
        let salary = profile.previous_salary * (1.0 + profile.salary_growth_rate).powi(year as i32);
        let accrual = salary * annual_accrual_rate(year + 1);
        funded = (funded + accrual) * (1.0 + profile.fund_return_rate);
    }

    Ok(BenefitEstimate {
        current_salary,
        gratuity_rate: rate,
        unfunded,
        funded,
        return_differential: funded - unfunded,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn profile(tenure_years: f64, fund_return_rate: f64) -> EmployeeProfile {
        EmployeeProfile {
            previous_salary: 10_000.0,
            salary_growth_rate: 0.0,
            tenure_years,
            fund_return_rate,
        }
    }

    #[test]
    fn test_flat_salary_no_return_matches_schedule() {
        let estimate = estimate_benefit(&profile(6.0, 0.0)).unwrap();
        assert_relative_eq!(estimate.unfunded, 3749.8, epsilon = 1e-9);
        assert_relative_eq!(estimate.funded, 3749.8, epsilon = 1e-9);
        assert_relative_eq!(estimate.return_differential, 0.0, epsilon = 1e-9);
    }

    #[test]
    fn test_compounding() {
        let estimate = estimate_benefit(&profile(2.0, 0.05)).unwrap();
        let expected = (583.3 * 1.05 + 583.3) * 1.05;
        assert_relative_eq!(estimate.funded, expected, epsilon = 1e-9);
        assert!(estimate.return_differential > 0.0);
    }

    #[test]
    fn test_salary_growth() {
        let p = EmployeeProfile {
            previous_salary: 8_000.0,
            salary_growth_rate: 0.05,
            tenure_years: 3.0,
            fund_return_rate: 0.0,
        };
        let estimate = estimate_benefit(&p).unwrap();
        assert_relative_eq!(estimate.current_salary, 8_400.0);
        assert_relative_eq!(
            estimate.funded,
            (8_000.0 + 8_400.0 + 8_820.0) * 0.05833,
            epsilon = 1e-6
        );
    }

    #[test]
    fn test_under_one_year() {
        let estimate = estimate_benefit(&profile(0.5, 0.04)).unwrap();
        assert_eq!(estimate.unfunded, 0.0);
        assert_eq!(estimate.funded, 0.0);
    }

    #[test]
    fn test_funded_accrues_every_service_year() {
        let estimate = estimate_benefit(&profile(30.0, 0.0)).unwrap();
        // 5 years at 583.3 plus 25 at 833.3
        assert_relative_eq!(estimate.funded, 23_749.0, epsilon = 1e-6);
        // Unfunded lump sum stops growing at 25 years
        assert_relative_eq!(estimate.unfunded, 19_582.5, epsilon = 1e-6);
        assert_relative_eq!(estimate.return_differential, 4_166.5, epsilon = 1e-6);
    }

    #[test]
    fn test_rejects_invalid_profile() {
        assert!(estimate_benefit(&profile(-1.0, 0.04)).is_err());
        assert!(estimate_benefit(&profile(5.0, 0.3)).is_err());
    }
}
