//! Per-cohort fund ledger
//!
//! Each cohort carries two instances: one that never earns a return and one
//! compounding at the scenario's fund return rate. Both start empty at cohort
//! inception and are never shared.

use serde::{Deserialize, Serialize};

/// One year's movement through a ledger
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct LedgerStep {
    pub opening: f64,
    pub earned_return: f64,
    pub contribution: f64,
    pub exit_payout: f64,
    pub closing: f64,
}

impl LedgerStep {
    /// Balance after return and contribution, before exits are paid
    pub fn before_payout(&self) -> f64 {
        self.opening + self.earned_return + self.contribution
    }
}

/// Running fund balance for a single cohort
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FundLedger {
    balance: f64,
    return_rate: f64,
}

impl FundLedger {
    /// Ledger that never earns a return
    pub fn no_return() -> Self {
        Self::with_return(0.0)
    }

    /// Ledger compounding at `return_rate` per year
    pub fn with_return(return_rate: f64) -> Self {
        Self {
            balance: 0.0,
            return_rate,
        }
    }

    pub fn balance(&self) -> f64 {
        self.balance
    }

    /// Roll the balance forward one year: earn the return on the opening
    /// balance, add the contribution, then pay out `exit_ratio` of the total
    pub fn step(&mut self, contribution: f64, exit_ratio: f64) -> LedgerStep {
        let opening = self.balance;
        let earned_return = opening * self.return_rate;
        let before_payout = opening + earned_return + contribution;
        let exit_payout = before_payout * exit_ratio;
        let closing = before_payout - exit_payout;

        self.balance = closing;

        LedgerStep {
            opening,
            earned_return,
            contribution,
            exit_payout,
            closing,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_with_return_scenario() {
        let mut ledger = FundLedger::with_return(0.04);
        ledger.step(1000.0, 0.0);

        let step = ledger.step(500.0, 0.1);
        assert_relative_eq!(step.opening, 1000.0);
        assert_relative_eq!(step.opening + step.earned_return, 1040.0, epsilon = 1e-9);
        assert_relative_eq!(step.before_payout(), 1540.0, epsilon = 1e-9);
        assert_relative_eq!(step.exit_payout, 154.0, epsilon = 1e-9);
        assert_relative_eq!(step.closing, 1386.0, epsilon = 1e-9);
        assert_relative_eq!(ledger.balance(), 1386.0, epsilon = 1e-9);
    }

    #[test]
    fn test_no_return_adds_then_pays() {
        let mut ledger = FundLedger::no_return();
        let first = ledger.step(200.0, 0.25);
        assert_eq!(first.earned_return, 0.0);
        assert_relative_eq!(first.exit_payout, 50.0);
        assert_relative_eq!(first.closing, 150.0);

        let second = ledger.step(0.0, 1.0);
        assert_relative_eq!(second.opening, 150.0);
        assert_eq!(second.closing, 0.0);
    }

    #[test]
    fn test_identity_holds() {
        let mut ledger = FundLedger::with_return(0.06);
        for (contribution, ratio) in [(120.5, 0.0), (80.0, 0.03), (0.0, 0.5), (42.0, 0.11)] {
            let s = ledger.step(contribution, ratio);
            assert_relative_eq!(
                s.closing,
                s.opening + s.earned_return + s.contribution - s.exit_payout,
                epsilon = 1e-6
            );
        }
    }
}
