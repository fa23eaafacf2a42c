//! Loan booking engine
//!
//! Books an approved loan against a ledger snapshot. This is money
//! creation: the borrower's deposit is conjured paired with the loan
//! liability — no third party funds it. Assets (the loan) and liabilities
//! (the deposit) grow by the same amount, equity is untouched, so the
//! accounting identity holds immediately after booking.
//!
//! Pure snapshot-in / snapshot-out: the input ledger is never mutated.

use crate::models::bank::{Deposit, Loan};
use crate::models::ledger::Ledger;
use crate::models::transaction::{Transaction, TransactionType};
use crate::engines::risk::LoanApplication;
use thiserror::Error;

/// Errors surfaced by the lending engine
#[derive(Debug, Error, PartialEq)]
pub enum LendingError {
    #[error("Unknown lender bank: {id}")]
    UnknownBank { id: String },

    #[error("Loan principal must be positive, got {amount}")]
    NonPositivePrincipal { amount: i64 },
}

/// Book an approved loan: create the loan and simultaneously create or
/// augment the borrower's deposit for the same amount.
///
/// Returns the new ledger snapshot, the booked loan, and a
/// `credit_creation` transaction for the audit log. The caller records the
/// matching money-supply expansion.
///
/// # Example
/// ```
/// use economy_simulator_core_rs::engines::lending::book_loan;
/// use economy_simulator_core_rs::engines::risk::LoanApplication;
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
/// let (ledger, loan, txs) = book_loan(&ledger, &app, 0.05, 10).unwrap();
/// assert_eq!(loan.principal(), 100_000);
/// assert_eq!(ledger.bank("BANK_A").unwrap().total_deposit_balance(), 100_000);
/// assert_eq!(txs.len(), 1);
/// ```
pub fn book_loan(
    ledger: &Ledger,
    app: &LoanApplication,
    interest_rate: f64,
    tick: usize,
) -> Result<(Ledger, Loan, Vec<Transaction>), LendingError> {
    if app.amount_pennies <= 0 {
        return Err(LendingError::NonPositivePrincipal {
            amount: app.amount_pennies,
        });
    }
    if ledger.bank(&app.lender_id).is_none() {
        return Err(LendingError::UnknownBank {
            id: app.lender_id.clone(),
        });
    }

    let mut next = ledger.clone();
    let loan_id = next.next_id("loan");
    let needs_new_deposit = next
        .bank(&app.lender_id)
        .map(|b| b.deposit_of(&app.applicant_id).is_none())
        .unwrap_or(true);
    let deposit_id = needs_new_deposit.then(|| next.next_id("dep"));

    let loan = Loan::new(
        loan_id,
        app.applicant_id.clone(),
        app.lender_id.clone(),
        app.amount_pennies,
        interest_rate,
        tick,
        tick + app.term_ticks,
    );

    {
        let bank = next
            .bank_mut(&app.lender_id)
            .expect("lender existence checked above");
        bank.add_loan(loan.clone());

        match deposit_id {
            None => bank
                .deposit_of_mut(&app.applicant_id)
                .expect("existing deposit located above")
                .credit(app.amount_pennies),
            Some(deposit_id) => bank.add_deposit(Deposit::new(
                deposit_id,
                app.applicant_id.clone(),
                app.amount_pennies,
                0.0,
            )),
        }
    }

    let tx = Transaction::new(
        app.lender_id.clone(),
        app.applicant_id.clone(),
        app.amount_pennies,
        crate::models::account::DEFAULT_CURRENCY.to_string(),
        tick,
    )
    .with_market("credit".to_string())
    .with_transaction_type(TransactionType::CreditCreation)
    .with_metadata("loan_id", loan.id());

    Ok((next, loan, vec![tx]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::bank::Bank;
    use crate::verifier::verify_ledger_integrity;

    fn fixture() -> (Ledger, LoanApplication) {
        let mut ledger = Ledger::new();
        ledger.add_bank(Bank::new("BANK_A".to_string(), 0.03));
        let app = LoanApplication {
            applicant_id: "HH_1".to_string(),
            lender_id: "BANK_A".to_string(),
            amount_pennies: 100_000,
            monthly_income_pennies: 500_000,
            credit_score: 700,
            term_ticks: 365,
        };
        (ledger, app)
    }

    #[test]
    fn test_booking_pairs_loan_and_deposit() {
        let (ledger, app) = fixture();

        let (next, loan, txs) = book_loan(&ledger, &app, 0.05, 10).unwrap();

        assert_eq!(loan.principal(), 100_000);
        assert_eq!(loan.remaining_principal(), 100_000);
        assert_eq!(loan.due_tick(), 375);

        let bank = next.bank("BANK_A").unwrap();
        assert_eq!(bank.total_loan_principal(), 100_000);
        assert_eq!(bank.total_deposit_balance(), 100_000);
        assert_eq!(bank.retained_earnings(), 0);

        assert_eq!(txs.len(), 1);
        assert_eq!(txs[0].transaction_type(), TransactionType::CreditCreation);
        assert_eq!(txs[0].total_pennies(), 100_000);

        // Assets and liabilities grew together
        assert!(verify_ledger_integrity(&next));
    }

    #[test]
    fn test_booking_augments_existing_deposit() {
        let (ledger, app) = fixture();
        let (mid, _, _) = book_loan(&ledger, &app, 0.05, 10).unwrap();
        let (next, _, _) = book_loan(&mid, &app, 0.05, 20).unwrap();

        let bank = next.bank("BANK_A").unwrap();
        // Single deposit record, credited twice
        assert_eq!(bank.deposits().count(), 1);
        assert_eq!(bank.total_deposit_balance(), 200_000);
        assert_eq!(bank.total_loan_principal(), 200_000);
        assert!(verify_ledger_integrity(&next));
    }

    #[test]
    fn test_input_snapshot_is_untouched() {
        let (ledger, app) = fixture();
        let before = ledger.bank("BANK_A").unwrap().total_deposit_balance();

        let _ = book_loan(&ledger, &app, 0.05, 10).unwrap();

        assert_eq!(
            ledger.bank("BANK_A").unwrap().total_deposit_balance(),
            before
        );
        assert_eq!(ledger.bank("BANK_A").unwrap().loans().count(), 0);
    }

    #[test]
    fn test_unknown_bank_is_surfaced() {
        let (_, app) = fixture();
        let empty = Ledger::new();

        let err = book_loan(&empty, &app, 0.05, 10).unwrap_err();
        assert_eq!(
            err,
            LendingError::UnknownBank {
                id: "BANK_A".to_string()
            }
        );
    }
}
