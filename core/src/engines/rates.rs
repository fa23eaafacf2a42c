//! Rate-setting engine
//!
//! Applies a simple policy rule uniformly to every bank's base rate:
//! `target = base + k × inflation`. Pure snapshot-in / snapshot-out.

use crate::models::ledger::Ledger;
use serde::{Deserialize, Serialize};

/// Rate rule configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateRuleConfig {
    /// Neutral base rate the rule anchors on
    pub base_rate: f64,

    /// Sensitivity to inflation (k)
    pub inflation_sensitivity: f64,
}

impl Default for RateRuleConfig {
    fn default() -> Self {
        Self {
            base_rate: 0.03,
            inflation_sensitivity: 1.5,
        }
    }
}

/// Apply the rate rule to every bank.
///
/// Returns the new snapshot and the rate that was set.
///
/// # Example
/// ```
/// use economy_simulator_core_rs::engines::rates::{apply_rate_rule, RateRuleConfig};
/// use economy_simulator_core_rs::models::bank::Bank;
/// use economy_simulator_core_rs::models::ledger::Ledger;
///
/// let mut ledger = Ledger::new();
/// ledger.add_bank(Bank::new("BANK_A".to_string(), 0.10));
///
/// let (next, rate) = apply_rate_rule(&ledger, 0.02, &RateRuleConfig::default());
/// assert!((rate - 0.06).abs() < 1e-9); // 0.03 + 1.5 × 0.02
/// assert!((next.bank("BANK_A").unwrap().base_rate() - 0.06).abs() < 1e-9);
/// ```
pub fn apply_rate_rule(
    ledger: &Ledger,
    inflation: f64,
    config: &RateRuleConfig,
) -> (Ledger, f64) {
    let target = config.base_rate + config.inflation_sensitivity * inflation;

    let mut next = ledger.clone();
    for bank in next.banks_mut() {
        bank.set_base_rate(target);
    }
    (next, target)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::bank::Bank;

    #[test]
    fn test_rule_applies_uniformly() {
        let mut ledger = Ledger::new();
        ledger.add_bank(Bank::new("BANK_A".to_string(), 0.01));
        ledger.add_bank(Bank::new("BANK_B".to_string(), 0.09));

        let (next, rate) = apply_rate_rule(&ledger, 0.04, &RateRuleConfig::default());

        assert!((rate - 0.09).abs() < 1e-9);
        for bank in next.banks() {
            assert!((bank.base_rate() - rate).abs() < 1e-9);
        }
        // Input snapshot untouched
        assert!((ledger.bank("BANK_A").unwrap().base_rate() - 0.01).abs() < 1e-9);
    }

    #[test]
    fn test_deflation_lowers_target() {
        let mut ledger = Ledger::new();
        ledger.add_bank(Bank::new("BANK_A".to_string(), 0.05));

        let (_, rate) = apply_rate_rule(&ledger, -0.01, &RateRuleConfig::default());
        assert!((rate - 0.015).abs() < 1e-9);
    }
}
