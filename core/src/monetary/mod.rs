//! Monetary Ledger
//!
//! Tracks the money supply from two independent directions so leaks are
//! detectable:
//! - **Expected M2**: a running baseline adjusted only by explicitly
//!   recorded expansions and contractions (credit creation, mint/burn,
//!   bond redemption)
//! - **Actual M2**: computed live from settlement balances of in-supply
//!   accounts (plus bank deposit money, added by the orchestrator)
//!
//! Any divergence between the two is drift: money that appeared or vanished
//! outside a sanctioned path.
//!
//! The monetary ledger also tracks aggregate system debt. A debt decrease
//! that would underflow below zero is clamped to zero and logged as an
//! anomaly rather than going negative.
//!
//! # Critical Invariants
//!
//! 1. Every expected-M2 adjustment has a matching audit transaction
//! 2. `system_debt >= 0` at all times (clamped, never silently wrong)

pub mod batch;

pub use batch::{execute_batch, BatchError, BatchMutation, BatchTransfer, CommandBatch};

use crate::models::account::AccountRegistry;
use crate::models::event::{EventLog, FinancialEvent};
use crate::models::transaction::{Transaction, TransactionType};
use std::collections::BTreeMap;

/// Pseudo-account id used on the non-economy side of audit records.
const MONEY_SUPPLY_POOL: &str = "money_supply";

/// Tracks expected vs actual money supply and aggregate system debt.
///
/// # Example
/// ```
/// use economy_simulator_core_rs::monetary::MonetaryLedger;
///
/// let mut monetary = MonetaryLedger::new();
/// monetary.seed_expected_m2(1_000_000, "USD");
/// monetary.record_monetary_expansion(50_000, "credit_creation", "USD", 3);
///
/// assert_eq!(monetary.expected_m2("USD"), 1_050_000);
/// assert_eq!(monetary.audit().len(), 1);
/// ```
#[derive(Debug, Clone, Default)]
pub struct MonetaryLedger {
    /// Expected M2 per currency (baseline + recorded changes)
    expected_m2: BTreeMap<String, i64>,

    /// Aggregate system debt (never negative)
    system_debt: i64,

    /// Audit-tagged expansion/contraction transactions
    audit: Vec<Transaction>,

    /// Anomalies and monetary audit events
    events: EventLog,
}

impl MonetaryLedger {
    /// Create a new monetary ledger with zero baselines
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the expected-M2 baseline for one currency.
    ///
    /// Called once at simulation start with the live money-supply balance
    /// so expected and actual begin in agreement.
    pub fn seed_expected_m2(&mut self, amount: i64, currency: &str) {
        self.expected_m2.insert(currency.to_string(), amount);
    }

    /// Expected M2 for one currency
    pub fn expected_m2(&self, currency: &str) -> i64 {
        self.expected_m2.get(currency).copied().unwrap_or(0)
    }

    /// Actual M2 at the settlement level: live sum over in-supply account
    /// balances. Bank deposit money lives in the ledger and is added by the
    /// orchestrator's drift check.
    pub fn actual_m2<R: AccountRegistry + ?Sized>(&self, accounts: &R, currency: &str) -> i64 {
        accounts.money_supply_balance(currency)
    }

    /// Record an authorized money-supply expansion.
    ///
    /// Appends an audit-tagged transaction and raises expected M2.
    ///
    /// # Panics
    /// Panics if `amount` is negative.
    pub fn record_monetary_expansion(
        &mut self,
        amount: i64,
        source: &str,
        currency: &str,
        tick: usize,
    ) {
        assert!(amount >= 0, "amount must be non-negative");

        *self.expected_m2.entry(currency.to_string()).or_insert(0) += amount;
        self.audit.push(
            Transaction::new(
                source.to_string(),
                MONEY_SUPPLY_POOL.to_string(),
                amount,
                currency.to_string(),
                tick,
            )
            .with_market("monetary".to_string())
            .with_transaction_type(TransactionType::MonetaryExpansion)
            .with_metadata("source", source),
        );
        self.events.log(FinancialEvent::MonetaryExpansion {
            tick,
            amount,
            currency: currency.to_string(),
            source: source.to_string(),
        });
    }

    /// Record an authorized money-supply contraction.
    ///
    /// Appends an audit-tagged transaction and lowers expected M2.
    ///
    /// # Panics
    /// Panics if `amount` is negative.
    pub fn record_monetary_contraction(
        &mut self,
        amount: i64,
        source: &str,
        currency: &str,
        tick: usize,
    ) {
        assert!(amount >= 0, "amount must be non-negative");

        *self.expected_m2.entry(currency.to_string()).or_insert(0) -= amount;
        self.audit.push(
            Transaction::new(
                MONEY_SUPPLY_POOL.to_string(),
                source.to_string(),
                amount,
                currency.to_string(),
                tick,
            )
            .with_market("monetary".to_string())
            .with_transaction_type(TransactionType::MonetaryContraction)
            .with_metadata("source", source),
        );
        self.events.log(FinancialEvent::MonetaryContraction {
            tick,
            amount,
            currency: currency.to_string(),
            source: source.to_string(),
        });
    }

    /// Record an increase in aggregate system debt
    ///
    /// # Panics
    /// Panics if `amount` is negative.
    pub fn record_system_debt_increase(&mut self, amount: i64, source: &str, tick: usize) {
        assert!(amount >= 0, "amount must be non-negative");

        self.system_debt += amount;
        self.events.log(FinancialEvent::SystemDebtIncrease {
            tick,
            amount,
            source: source.to_string(),
        });
    }

    /// Record a decrease in aggregate system debt.
    ///
    /// A decrease larger than the outstanding total is clamped to zero and
    /// logged as an anomaly; the counter never goes negative. Returns the
    /// amount actually applied.
    ///
    /// # Panics
    /// Panics if `amount` is negative.
    pub fn record_system_debt_decrease(&mut self, amount: i64, source: &str, tick: usize) -> i64 {
        assert!(amount >= 0, "amount must be non-negative");

        let applied = if amount > self.system_debt {
            self.events.log(FinancialEvent::SystemDebtClamped {
                tick,
                requested: amount,
                outstanding: self.system_debt,
                source: source.to_string(),
            });
            self.system_debt
        } else {
            amount
        };

        self.system_debt -= applied;
        self.events.log(FinancialEvent::SystemDebtDecrease {
            tick,
            amount: applied,
            source: source.to_string(),
        });
        applied
    }

    /// Get aggregate system debt
    pub fn system_debt(&self) -> i64 {
        self.system_debt
    }

    /// Audit-tagged expansion/contraction transactions
    pub fn audit(&self) -> &[Transaction] {
        &self.audit
    }

    /// Monetary audit events (including anomaly clamps)
    pub fn events(&self) -> &EventLog {
        &self.events
    }
}
