//! Statutory end-of-service gratuity schedule
//!
//! 21 days' basic pay per year of service for the first five years, 30 days
//! per year thereafter, with accrual capped at 25 years.

/// Monthly-salary multiple accrued per year of service in years 1 to 5
pub const EARLY_ACCRUAL: f64 = 0.05833;

/// Monthly-salary multiple accrued per year of service after year 5
pub const LATE_ACCRUAL: f64 = 0.08333;

/// Service below which nothing is payable
pub const VESTING_YEARS: f64 = 1.0;

/// Service at which the accrual rate steps up
pub const STEP_UP_YEARS: f64 = 5.0;

/// Service beyond which nothing further accrues
pub const CAP_YEARS: f64 = 25.0;

/// Gratuity as a multiple of monthly basic salary after `tenure_years` of service
pub fn gratuity_rate(tenure_years: f64) -> f64 {
    if tenure_years < VESTING_YEARS {
        0.0
    } else if tenure_years <= STEP_UP_YEARS {
        tenure_years * EARLY_ACCRUAL
    } else {
        let capped = tenure_years.min(CAP_YEARS);
        STEP_UP_YEARS * EARLY_ACCRUAL + (capped - STEP_UP_YEARS) * LATE_ACCRUAL
    }
}

/// Accrual rate for the service year ending at `year_of_service` (1-based)
pub fn annual_accrual_rate(year_of_service: u32) -> f64 {
    if year_of_service as f64 <= STEP_UP_YEARS {
        EARLY_ACCRUAL
    } else {
        LATE_ACCRUAL
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_schedule_points() {
        assert_eq!(gratuity_rate(0.0), 0.0);
        assert_eq!(gratuity_rate(0.5), 0.0);
        assert_relative_eq!(gratuity_rate(1.0), 0.05833);
        assert_relative_eq!(gratuity_rate(5.0), 0.29165, epsilon = 1e-12);
        assert_relative_eq!(gratuity_rate(6.0), 0.37498, epsilon = 1e-12);
        assert_relative_eq!(gratuity_rate(25.0), 0.29165 + 20.0 * 0.08333, epsilon = 1e-12);
    }

    #[test]
    fn test_cap_holds() {
        assert_eq!(gratuity_rate(25.0), gratuity_rate(30.0));
        assert_eq!(gratuity_rate(25.0), gratuity_rate(60.0));
    }

    #[test]
    fn test_monotonic_in_tenure() {
        let mut previous = gratuity_rate(0.0);
        for half_years in 1..=80 {
            let rate = gratuity_rate(half_years as f64 / 2.0);
            assert!(rate >= previous, "rate fell at tenure {}", half_years as f64 / 2.0);
            previous = rate;
        }
    }

    #[test]
    fn test_per_employee_scenario() {
        let salary = 10_000.0;
        let at_five = salary * gratuity_rate(5.0);
        let at_six = salary * gratuity_rate(6.0);

        assert_relative_eq!(at_five, 2916.5, epsilon = 1e-9);
        assert_relative_eq!(at_six, 3749.8, epsilon = 1e-9);
        assert_relative_eq!(at_six - at_five, 833.3, epsilon = 1e-9);
    }

    #[test]
    fn test_annual_accrual_steps_after_five() {
        assert_eq!(annual_accrual_rate(1), EARLY_ACCRUAL);
        assert_eq!(annual_accrual_rate(5), EARLY_ACCRUAL);
        assert_eq!(annual_accrual_rate(6), LATE_ACCRUAL);
    }
}
