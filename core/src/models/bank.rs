//! Bank balance sheet model
//!
//! Represents a commercial bank's books inside the ledger:
//! - Per-currency reserves (i64 pennies)
//! - Loan book and deposit book, keyed by sequential zero-padded ids so
//!   iteration order is issuance order
//! - Retained earnings (i64 pennies, equity; may go negative on write-offs)
//!
//! # Critical Invariants
//!
//! 1. Per loan: `0 <= remaining_principal <= principal`
//! 2. Per deposit: `balance >= 0`
//! 3. Accounting identity (checked by the verifier):
//!    `reserves + Σ remaining_loan_principal + Σ owned_bond_face ==
//!     Σ deposit_balances + retained_earnings`
//!
//! CRITICAL: All money values are i64 (pennies). Loans and deposits are
//! denominated in the default currency; multi-currency lives at the
//! reserve, treasury and FX level.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// Errors that can occur during loan and deposit operations
#[derive(Debug, Error, PartialEq)]
pub enum LoanError {
    #[error("Repayment {amount} exceeds remaining principal {remaining}")]
    AmountExceedsRemaining { amount: i64, remaining: i64 },

    #[error("Repayment amount must be non-negative, got {amount}")]
    NegativeAmount { amount: i64 },

    #[error("Loan is already defaulted")]
    AlreadyDefaulted,
}

/// Errors that can occur during deposit operations
#[derive(Debug, Error, PartialEq)]
pub enum DepositError {
    #[error("Insufficient deposit balance: required {required}, available {available}")]
    InsufficientBalance { required: i64, available: i64 },
}

/// A loan on a bank's books.
///
/// # Example
/// ```
/// use economy_simulator_core_rs::models::bank::Loan;
///
/// let mut loan = Loan::new(
///     "loan_00000001".to_string(),
///     "FIRM_1".to_string(),
///     "BANK_A".to_string(),
///     100_000,
///     0.05,
///     10,
///     375,
/// );
///
/// loan.repay(40_000).unwrap();
/// assert_eq!(loan.remaining_principal(), 60_000);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Loan {
    /// Sequential loan identifier (e.g. "loan_00000001")
    id: String,

    /// Borrower account ID
    borrower_id: String,

    /// Lending bank ID
    lender_id: String,

    /// Original principal (i64 pennies)
    principal: i64,

    /// Principal still outstanding (i64 pennies)
    remaining_principal: i64,

    /// Annual interest rate (e.g. 0.05 = 5%)
    interest_rate: f64,

    /// Tick when the loan was booked
    origination_tick: usize,

    /// Tick when full principal repayment is due
    due_tick: usize,

    /// Whether the loan has been declared defaulted
    defaulted: bool,
}

impl Loan {
    /// Create a new loan with `remaining == principal`.
    ///
    /// # Panics
    /// Panics if principal is not positive or due tick is not after
    /// origination.
    pub fn new(
        id: String,
        borrower_id: String,
        lender_id: String,
        principal: i64,
        interest_rate: f64,
        origination_tick: usize,
        due_tick: usize,
    ) -> Self {
        assert!(principal > 0, "principal must be positive");
        assert!(
            due_tick > origination_tick,
            "due tick must be after origination"
        );

        Self {
            id,
            borrower_id,
            lender_id,
            principal,
            remaining_principal: principal,
            interest_rate,
            origination_tick,
            due_tick,
            defaulted: false,
        }
    }

    /// Get loan ID
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Get borrower account ID
    pub fn borrower_id(&self) -> &str {
        &self.borrower_id
    }

    /// Get lending bank ID
    pub fn lender_id(&self) -> &str {
        &self.lender_id
    }

    /// Get original principal
    pub fn principal(&self) -> i64 {
        self.principal
    }

    /// Get remaining principal
    pub fn remaining_principal(&self) -> i64 {
        self.remaining_principal
    }

    /// Get annual interest rate
    pub fn interest_rate(&self) -> f64 {
        self.interest_rate
    }

    /// Get origination tick
    pub fn origination_tick(&self) -> usize {
        self.origination_tick
    }

    /// Get due tick
    pub fn due_tick(&self) -> usize {
        self.due_tick
    }

    /// Whether the loan has been declared defaulted
    pub fn is_defaulted(&self) -> bool {
        self.defaulted
    }

    /// Whether interest still accrues (outstanding and not defaulted)
    pub fn is_active(&self) -> bool {
        !self.defaulted && self.remaining_principal > 0
    }

    /// Apply a principal repayment.
    ///
    /// Fails (no state change) if the amount is negative or exceeds the
    /// remaining principal; the `0 <= remaining <= principal` invariant is
    /// preserved structurally.
    pub fn repay(&mut self, amount: i64) -> Result<(), LoanError> {
        if amount < 0 {
            return Err(LoanError::NegativeAmount { amount });
        }
        if amount > self.remaining_principal {
            return Err(LoanError::AmountExceedsRemaining {
                amount,
                remaining: self.remaining_principal,
            });
        }

        self.remaining_principal -= amount;
        Ok(())
    }

    /// Mark the loan defaulted and zero the remaining principal.
    ///
    /// Returns the written-off amount (the caller charges it against the
    /// lender's retained earnings).
    pub fn mark_defaulted(&mut self) -> Result<i64, LoanError> {
        if self.defaulted {
            return Err(LoanError::AlreadyDefaulted);
        }

        let writeoff = self.remaining_principal;
        self.remaining_principal = 0;
        self.defaulted = true;
        Ok(writeoff)
    }
}

/// A customer deposit on a bank's books.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Deposit {
    /// Sequential deposit identifier (e.g. "dep_00000001")
    id: String,

    /// Owning account ID
    owner_id: String,

    /// Current balance (i64 pennies, never negative)
    balance: i64,

    /// Annual interest rate paid on the deposit
    interest_rate: f64,
}

impl Deposit {
    /// Create a new deposit.
    ///
    /// # Panics
    /// Panics if the opening balance is negative.
    pub fn new(id: String, owner_id: String, balance: i64, interest_rate: f64) -> Self {
        assert!(balance >= 0, "deposit balance must be non-negative");
        Self {
            id,
            owner_id,
            balance,
            interest_rate,
        }
    }

    /// Get deposit ID
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Get owning account ID
    pub fn owner_id(&self) -> &str {
        &self.owner_id
    }

    /// Get current balance
    pub fn balance(&self) -> i64 {
        self.balance
    }

    /// Get annual interest rate
    pub fn interest_rate(&self) -> f64 {
        self.interest_rate
    }

    /// Credit the deposit.
    ///
    /// # Panics
    /// Panics if `amount` is negative.
    pub fn credit(&mut self, amount: i64) {
        assert!(amount >= 0, "amount must be non-negative");
        self.balance += amount;
    }

    /// Debit the deposit; fails cleanly when the balance cannot cover it.
    pub fn debit(&mut self, amount: i64) -> Result<(), DepositError> {
        assert!(amount >= 0, "amount must be non-negative");

        if amount > self.balance {
            return Err(DepositError::InsufficientBalance {
                required: amount,
                available: self.balance,
            });
        }

        self.balance -= amount;
        Ok(())
    }
}

/// A commercial bank's balance sheet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bank {
    /// Unique bank identifier (matches its settlement account id)
    id: String,

    /// Base lending rate (annual)
    base_rate: f64,

    /// Per-currency reserves (i64 pennies)
    reserves: BTreeMap<String, i64>,

    /// Loan book, keyed by sequential loan id (iteration = issuance order)
    loans: BTreeMap<String, Loan>,

    /// Deposit book, keyed by sequential deposit id
    deposits: BTreeMap<String, Deposit>,

    /// Retained earnings (equity; negative after heavy write-offs)
    retained_earnings: i64,
}

impl Bank {
    /// Create a new bank with empty books
    pub fn new(id: String, base_rate: f64) -> Self {
        Self {
            id,
            base_rate,
            reserves: BTreeMap::new(),
            loans: BTreeMap::new(),
            deposits: BTreeMap::new(),
            retained_earnings: 0,
        }
    }

    /// Get bank ID
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Get base lending rate
    pub fn base_rate(&self) -> f64 {
        self.base_rate
    }

    /// Set base lending rate (used by the rate-setting engine)
    pub fn set_base_rate(&mut self, rate: f64) {
        self.base_rate = rate;
    }

    /// Reserves in one currency (0 if never held)
    pub fn reserves(&self, currency: &str) -> i64 {
        self.reserves.get(currency).copied().unwrap_or(0)
    }

    /// All per-currency reserves
    pub fn all_reserves(&self) -> &BTreeMap<String, i64> {
        &self.reserves
    }

    /// Adjust reserves by a signed delta
    pub fn adjust_reserves(&mut self, delta: i64, currency: &str) {
        *self.reserves.entry(currency.to_string()).or_insert(0) += delta;
    }

    /// Get retained earnings (equity)
    pub fn retained_earnings(&self) -> i64 {
        self.retained_earnings
    }

    /// Adjust retained earnings by a signed delta (income or write-off)
    pub fn adjust_retained_earnings(&mut self, delta: i64) {
        self.retained_earnings += delta;
    }

    /// Add a loan to the book.
    ///
    /// # Panics
    /// Panics on duplicate loan id.
    pub fn add_loan(&mut self, loan: Loan) {
        let id = loan.id().to_string();
        assert!(
            !self.loans.contains_key(&id),
            "Loan ID {} already exists",
            id
        );
        self.loans.insert(id, loan);
    }

    /// Get a loan by id
    pub fn loan(&self, id: &str) -> Option<&Loan> {
        self.loans.get(id)
    }

    /// Get a loan mutably by id
    pub fn loan_mut(&mut self, id: &str) -> Option<&mut Loan> {
        self.loans.get_mut(id)
    }

    /// Iterate loans in issuance order
    pub fn loans(&self) -> impl Iterator<Item = &Loan> {
        self.loans.values()
    }

    /// Iterate loans mutably in issuance order
    pub fn loans_mut(&mut self) -> impl Iterator<Item = &mut Loan> {
        self.loans.values_mut()
    }

    /// Add a deposit to the book.
    ///
    /// # Panics
    /// Panics on duplicate deposit id.
    pub fn add_deposit(&mut self, deposit: Deposit) {
        let id = deposit.id().to_string();
        assert!(
            !self.deposits.contains_key(&id),
            "Deposit ID {} already exists",
            id
        );
        self.deposits.insert(id, deposit);
    }

    /// Get a deposit by id
    pub fn deposit(&self, id: &str) -> Option<&Deposit> {
        self.deposits.get(id)
    }

    /// Iterate deposits in creation order
    pub fn deposits(&self) -> impl Iterator<Item = &Deposit> {
        self.deposits.values()
    }

    /// First deposit owned by the given account, in creation order
    pub fn deposit_of(&self, owner_id: &str) -> Option<&Deposit> {
        self.deposits.values().find(|d| d.owner_id() == owner_id)
    }

    /// First deposit owned by the given account, mutably
    pub fn deposit_of_mut(&mut self, owner_id: &str) -> Option<&mut Deposit> {
        self.deposits
            .values_mut()
            .find(|d| d.owner_id() == owner_id)
    }

    /// Sum of remaining principal over the loan book
    pub fn total_loan_principal(&self) -> i64 {
        self.loans.values().map(|l| l.remaining_principal()).sum()
    }

    /// Sum of balances over the deposit book
    pub fn total_deposit_balance(&self) -> i64 {
        self.deposits.values().map(|d| d.balance()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_loan() -> Loan {
        Loan::new(
            "loan_00000001".to_string(),
            "FIRM_1".to_string(),
            "BANK_A".to_string(),
            100_000,
            0.05,
            0,
            365,
        )
    }

    #[test]
    fn test_repay_bounds() {
        let mut loan = sample_loan();

        loan.repay(60_000).unwrap();
        assert_eq!(loan.remaining_principal(), 40_000);

        let err = loan.repay(50_000).unwrap_err();
        assert_eq!(
            err,
            LoanError::AmountExceedsRemaining {
                amount: 50_000,
                remaining: 40_000
            }
        );
        assert_eq!(loan.remaining_principal(), 40_000);
    }

    #[test]
    fn test_default_writes_off_remainder() {
        let mut loan = sample_loan();
        loan.repay(25_000).unwrap();

        let writeoff = loan.mark_defaulted().unwrap();
        assert_eq!(writeoff, 75_000);
        assert_eq!(loan.remaining_principal(), 0);
        assert!(loan.is_defaulted());
        assert!(!loan.is_active());

        assert_eq!(loan.mark_defaulted().unwrap_err(), LoanError::AlreadyDefaulted);
    }

    #[test]
    fn test_deposit_debit_insufficient() {
        let mut dep = Deposit::new("dep_00000001".to_string(), "HH_1".to_string(), 500, 0.0);

        let err = dep.debit(600).unwrap_err();
        assert_eq!(
            err,
            DepositError::InsufficientBalance {
                required: 600,
                available: 500
            }
        );
        assert_eq!(dep.balance(), 500);
    }

    #[test]
    fn test_bank_books_iterate_in_issuance_order() {
        let mut bank = Bank::new("BANK_A".to_string(), 0.03);
        for n in 1..=3 {
            bank.add_loan(Loan::new(
                format!("loan_{:08}", n),
                "FIRM_1".to_string(),
                "BANK_A".to_string(),
                10_000 * n,
                0.05,
                0,
                100,
            ));
        }

        let principals: Vec<i64> = bank.loans().map(|l| l.principal()).collect();
        assert_eq!(principals, vec![10_000, 20_000, 30_000]);
        assert_eq!(bank.total_loan_principal(), 60_000);
    }
}
