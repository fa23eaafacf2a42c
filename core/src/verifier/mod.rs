//! Integrity Verifier
//!
//! Read-only auditor of ledger invariants. Checking is observability, not
//! control flow: violations are returned as structured diagnostics with
//! the exact numeric discrepancy, never raised — how to react (halt vs
//! flag) is the caller's decision, and a running tick must never crash on
//! an audit.
//!
//! # Checked Invariants
//!
//! Per bank:
//! - no negative reserves in any currency
//! - no loan with `remaining > principal` or `remaining < 0`
//! - no negative deposit balance
//! - the accounting identity:
//!   `reserves + Σ remaining_loan_principal + Σ owned_bond_face ==
//!    Σ deposit_balances + retained_earnings`
//!   (checked in the default currency; bond holdings count as bank assets
//!   so sovereign purchases keep the identity closed)

use crate::models::account::DEFAULT_CURRENCY;
use crate::models::ledger::Ledger;
use std::fmt;

/// A single broken invariant with its exact discrepancy
#[derive(Debug, Clone, PartialEq)]
pub enum IntegrityViolation {
    NegativeReserves {
        bank_id: String,
        currency: String,
        amount: i64,
    },
    LoanRemainingExceedsPrincipal {
        bank_id: String,
        loan_id: String,
        remaining: i64,
        principal: i64,
    },
    NegativeLoanRemaining {
        bank_id: String,
        loan_id: String,
        remaining: i64,
    },
    NegativeDeposit {
        bank_id: String,
        deposit_id: String,
        balance: i64,
    },
    AccountingIdentityBroken {
        bank_id: String,
        assets: i64,
        liabilities_and_equity: i64,
        discrepancy: i64,
    },
}

impl IntegrityViolation {
    /// Bank the violation was found on
    pub fn bank_id(&self) -> &str {
        match self {
            IntegrityViolation::NegativeReserves { bank_id, .. } => bank_id,
            IntegrityViolation::LoanRemainingExceedsPrincipal { bank_id, .. } => bank_id,
            IntegrityViolation::NegativeLoanRemaining { bank_id, .. } => bank_id,
            IntegrityViolation::NegativeDeposit { bank_id, .. } => bank_id,
            IntegrityViolation::AccountingIdentityBroken { bank_id, .. } => bank_id,
        }
    }

    /// Exact numeric discrepancy for the audit log
    pub fn discrepancy(&self) -> i64 {
        match self {
            IntegrityViolation::NegativeReserves { amount, .. } => *amount,
            IntegrityViolation::LoanRemainingExceedsPrincipal {
                remaining,
                principal,
                ..
            } => remaining - principal,
            IntegrityViolation::NegativeLoanRemaining { remaining, .. } => *remaining,
            IntegrityViolation::NegativeDeposit { balance, .. } => *balance,
            IntegrityViolation::AccountingIdentityBroken { discrepancy, .. } => *discrepancy,
        }
    }
}

impl fmt::Display for IntegrityViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IntegrityViolation::NegativeReserves {
                bank_id,
                currency,
                amount,
            } => write!(
                f,
                "Bank {} has negative {} reserves: {}",
                bank_id, currency, amount
            ),
            IntegrityViolation::LoanRemainingExceedsPrincipal {
                bank_id,
                loan_id,
                remaining,
                principal,
            } => write!(
                f,
                "Bank {} loan {} remaining {} exceeds principal {}",
                bank_id, loan_id, remaining, principal
            ),
            IntegrityViolation::NegativeLoanRemaining {
                bank_id,
                loan_id,
                remaining,
            } => write!(
                f,
                "Bank {} loan {} has negative remaining principal: {}",
                bank_id, loan_id, remaining
            ),
            IntegrityViolation::NegativeDeposit {
                bank_id,
                deposit_id,
                balance,
            } => write!(
                f,
                "Bank {} deposit {} has negative balance: {}",
                bank_id, deposit_id, balance
            ),
            IntegrityViolation::AccountingIdentityBroken {
                bank_id,
                assets,
                liabilities_and_equity,
                discrepancy,
            } => write!(
                f,
                "Bank {} accounting identity broken: assets {} vs liabilities+equity {} (off by {})",
                bank_id, assets, liabilities_and_equity, discrepancy
            ),
        }
    }
}

/// Check every ledger invariant, returning all violations found.
///
/// Returns an empty vector on a clean ledger. Never panics.
pub fn check_ledger_integrity(ledger: &Ledger) -> Vec<IntegrityViolation> {
    let mut violations = Vec::new();

    for bank in ledger.banks() {
        for (currency, &amount) in bank.all_reserves() {
            if amount < 0 {
                violations.push(IntegrityViolation::NegativeReserves {
                    bank_id: bank.id().to_string(),
                    currency: currency.clone(),
                    amount,
                });
            }
        }

        for loan in bank.loans() {
            if loan.remaining_principal() > loan.principal() {
                violations.push(IntegrityViolation::LoanRemainingExceedsPrincipal {
                    bank_id: bank.id().to_string(),
                    loan_id: loan.id().to_string(),
                    remaining: loan.remaining_principal(),
                    principal: loan.principal(),
                });
            }
            if loan.remaining_principal() < 0 {
                violations.push(IntegrityViolation::NegativeLoanRemaining {
                    bank_id: bank.id().to_string(),
                    loan_id: loan.id().to_string(),
                    remaining: loan.remaining_principal(),
                });
            }
        }

        for deposit in bank.deposits() {
            if deposit.balance() < 0 {
                violations.push(IntegrityViolation::NegativeDeposit {
                    bank_id: bank.id().to_string(),
                    deposit_id: deposit.id().to_string(),
                    balance: deposit.balance(),
                });
            }
        }

        let assets = bank.reserves(DEFAULT_CURRENCY)
            + bank.total_loan_principal()
            + ledger.treasury().bond_holdings_of(bank.id());
        let liabilities_and_equity = bank.total_deposit_balance() + bank.retained_earnings();
        if assets != liabilities_and_equity {
            violations.push(IntegrityViolation::AccountingIdentityBroken {
                bank_id: bank.id().to_string(),
                assets,
                liabilities_and_equity,
                discrepancy: assets - liabilities_and_equity,
            });
        }
    }

    violations
}

/// Whether every ledger invariant holds.
///
/// Boolean wrapper over [`check_ledger_integrity`] for callers that only
/// branch on the outcome.
pub fn verify_ledger_integrity(ledger: &Ledger) -> bool {
    check_ledger_integrity(ledger).is_empty()
}

/// Diagnostic aggregate of bank and treasury equity.
///
/// Intentionally naive: sums every currency 1:1 without conversion and is
/// a placeholder, never authoritative. Treasury equity is its balances
/// minus outstanding bond face; bank equity is retained earnings.
pub fn system_financial_net_worth(ledger: &Ledger) -> i64 {
    let bank_equity: i64 = ledger.banks().map(|b| b.retained_earnings()).sum();
    let treasury_cash: i64 = ledger.treasury().balances().values().sum();
    bank_equity + treasury_cash - ledger.treasury().outstanding_bond_debt()
}
