//! Risk assessment engine
//!
//! Pure decision function over a ledger snapshot: given a loan application,
//! compute the applicant's debt-to-income ratio (existing debt plus the new
//! amount against annualized income) and either reject or price the loan
//! with a risk premium on top of the lender's base rate.
//!
//! No state is mutated; the decision is data for the lending engine.

use crate::models::ledger::Ledger;
use serde::{Deserialize, Serialize};

/// A loan application submitted by a collaborator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanApplication {
    /// Borrowing account ID
    pub applicant_id: String,

    /// Lending bank ID
    pub lender_id: String,

    /// Requested principal (i64 pennies)
    pub amount_pennies: i64,

    /// Applicant's monthly income (i64 pennies)
    pub monthly_income_pennies: i64,

    /// Applicant's credit score
    pub credit_score: u32,

    /// Requested term in ticks
    pub term_ticks: usize,
}

/// Risk assessment configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskConfig {
    /// Maximum debt-to-income multiple before rejection
    pub max_debt_to_income: f64,

    /// Hard floor on credit score
    pub min_credit_score: u32,

    /// Score at or above which the prime premium applies
    pub prime_score_floor: u32,

    /// Premium added to the base rate for prime applicants
    pub prime_premium: f64,

    /// Premium added to the base rate for sub-prime applicants
    pub subprime_premium: f64,
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            max_debt_to_income: 5.0,
            min_credit_score: 300,
            prime_score_floor: 600,
            prime_premium: 0.02,
            subprime_premium: 0.05,
        }
    }
}

/// Why an application was rejected
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RejectionReason {
    DebtToIncomeTooHigh { debt_to_income: f64, limit: f64 },
    CreditScoreBelowFloor { score: u32, floor: u32 },
    NonPositiveIncome { monthly_income_pennies: i64 },
    NonPositiveAmount { amount_pennies: i64 },
    UnknownLender { lender_id: String },
}

/// Outcome of a risk assessment
#[derive(Debug, Clone, PartialEq)]
pub enum RiskDecision {
    /// Approved at the given rate (lender base rate + risk premium)
    Approved {
        interest_rate: f64,
        debt_to_income: f64,
    },

    /// Rejected with a typed reason
    Rejected { reason: RejectionReason },
}

impl RiskDecision {
    /// Whether the application was approved
    pub fn is_approved(&self) -> bool {
        matches!(self, RiskDecision::Approved { .. })
    }
}

/// Assess a loan application against the ledger.
///
/// DTI = (existing non-defaulted debt + requested amount) / annual income.
/// Rejects when DTI exceeds the configured multiple or the credit score is
/// below the floor; otherwise prices the loan at the lender's base rate
/// plus a premium (higher for sub-prime scores).
///
/// # Example
/// ```
/// use economy_simulator_core_rs::engines::risk::{
///     assess_loan_application, LoanApplication, RiskConfig, RiskDecision,
/// };
/// use economy_simulator_core_rs::models::bank::Bank;
/// use economy_simulator_core_rs::models::ledger::Ledger;
///
/// let mut ledger = Ledger::new();
/// ledger.add_bank(Bank::new("BANK_A".to_string(), 0.03));
///
/// let app = LoanApplication {
///     applicant_id: "HH_1".to_string(),
///     lender_id: "BANK_A".to_string(),
///     amount_pennies: 100_000,
///     monthly_income_pennies: 500_000,
///     credit_score: 700,
///     term_ticks: 365,
/// };
///
/// // DTI = 100k / 6M ≈ 0.0167, prime score → base 0.03 + 0.02 premium
/// match assess_loan_application(&ledger, &app, &RiskConfig::default()) {
///     RiskDecision::Approved { interest_rate, .. } => {
///         assert!((interest_rate - 0.05).abs() < 1e-9);
///     }
///     RiskDecision::Rejected { .. } => panic!("should approve"),
/// }
/// ```
pub fn assess_loan_application(
    ledger: &Ledger,
    app: &LoanApplication,
    config: &RiskConfig,
) -> RiskDecision {
    if app.amount_pennies <= 0 {
        return RiskDecision::Rejected {
            reason: RejectionReason::NonPositiveAmount {
                amount_pennies: app.amount_pennies,
            },
        };
    }

    let lender = match ledger.bank(&app.lender_id) {
        Some(bank) => bank,
        None => {
            return RiskDecision::Rejected {
                reason: RejectionReason::UnknownLender {
                    lender_id: app.lender_id.clone(),
                },
            }
        }
    };

    if app.credit_score < config.min_credit_score {
        return RiskDecision::Rejected {
            reason: RejectionReason::CreditScoreBelowFloor {
                score: app.credit_score,
                floor: config.min_credit_score,
            },
        };
    }

    if app.monthly_income_pennies <= 0 {
        return RiskDecision::Rejected {
            reason: RejectionReason::NonPositiveIncome {
                monthly_income_pennies: app.monthly_income_pennies,
            },
        };
    }

    let existing_debt = ledger.total_debt_of(&app.applicant_id);
    let annual_income = (app.monthly_income_pennies as f64) * 12.0;
    let debt_to_income = (existing_debt + app.amount_pennies) as f64 / annual_income;

    if debt_to_income > config.max_debt_to_income {
        return RiskDecision::Rejected {
            reason: RejectionReason::DebtToIncomeTooHigh {
                debt_to_income,
                limit: config.max_debt_to_income,
            },
        };
    }

    let premium = if app.credit_score >= config.prime_score_floor {
        config.prime_premium
    } else {
        config.subprime_premium
    };

    RiskDecision::Approved {
        interest_rate: lender.base_rate() + premium,
        debt_to_income,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::bank::{Bank, Loan};

    fn ledger_with_bank(base_rate: f64) -> Ledger {
        let mut ledger = Ledger::new();
        ledger.add_bank(Bank::new("BANK_A".to_string(), base_rate));
        ledger
    }

    fn application(amount: i64, income: i64, score: u32) -> LoanApplication {
        LoanApplication {
            applicant_id: "HH_1".to_string(),
            lender_id: "BANK_A".to_string(),
            amount_pennies: amount,
            monthly_income_pennies: income,
            credit_score: score,
            term_ticks: 365,
        }
    }

    #[test]
    fn test_prime_applicant_approved_with_small_premium() {
        let ledger = ledger_with_bank(0.03);
        let app = application(100_000, 500_000, 700);

        match assess_loan_application(&ledger, &app, &RiskConfig::default()) {
            RiskDecision::Approved {
                interest_rate,
                debt_to_income,
            } => {
                assert!((interest_rate - 0.05).abs() < 1e-9);
                assert!((debt_to_income - 100_000.0 / 6_000_000.0).abs() < 1e-9);
            }
            other => panic!("expected approval, got {:?}", other),
        }
    }

    #[test]
    fn test_subprime_premium_applies_below_prime_floor() {
        let ledger = ledger_with_bank(0.03);
        let app = application(100_000, 500_000, 450);

        match assess_loan_application(&ledger, &app, &RiskConfig::default()) {
            RiskDecision::Approved { interest_rate, .. } => {
                assert!((interest_rate - 0.08).abs() < 1e-9);
            }
            other => panic!("expected approval, got {:?}", other),
        }
    }

    #[test]
    fn test_credit_score_floor_rejects() {
        let ledger = ledger_with_bank(0.03);
        let app = application(100_000, 500_000, 250);

        let decision = assess_loan_application(&ledger, &app, &RiskConfig::default());
        assert_eq!(
            decision,
            RiskDecision::Rejected {
                reason: RejectionReason::CreditScoreBelowFloor {
                    score: 250,
                    floor: 300
                }
            }
        );
    }

    #[test]
    fn test_dti_counts_existing_debt() {
        let mut ledger = ledger_with_bank(0.03);
        let loan_id = ledger.next_id("loan");
        ledger.bank_mut("BANK_A").unwrap().add_loan(Loan::new(
            loan_id,
            "HH_1".to_string(),
            "BANK_A".to_string(),
            5_900_000,
            0.05,
            0,
            365,
        ));

        // Existing 5.9M + new 200k = 6.1M against 1.2M annual income → DTI > 5
        let app = application(200_000, 100_000, 700);
        let decision = assess_loan_application(&ledger, &app, &RiskConfig::default());
        assert!(matches!(
            decision,
            RiskDecision::Rejected {
                reason: RejectionReason::DebtToIncomeTooHigh { .. }
            }
        ));
    }

    #[test]
    fn test_zero_income_rejected() {
        let ledger = ledger_with_bank(0.03);
        let app = application(100_000, 0, 700);

        let decision = assess_loan_application(&ledger, &app, &RiskConfig::default());
        assert!(matches!(
            decision,
            RiskDecision::Rejected {
                reason: RejectionReason::NonPositiveIncome { .. }
            }
        ));
    }

    #[test]
    fn test_unknown_lender_rejected() {
        let ledger = Ledger::new();
        let app = application(100_000, 500_000, 700);

        let decision = assess_loan_application(&ledger, &app, &RiskConfig::default());
        assert!(matches!(
            decision,
            RiskDecision::Rejected {
                reason: RejectionReason::UnknownLender { .. }
            }
        ));
    }
}
