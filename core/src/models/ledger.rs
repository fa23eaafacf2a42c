//! Ledger aggregate root
//!
//! Holds the complete banking-system bookkeeping state: the current tick,
//! the treasury, and every bank's balance sheet. The ledger is constructed
//! once at simulation start (seeded from the live account balances),
//! mutated every tick by engine outputs, and discarded at simulation end.
//!
//! The stateless financial engines never mutate a ledger in place: they
//! clone it, transform the clone, and return it together with the
//! transactions they generated. Atomic rollback across chained engine calls
//! is therefore structural — the caller simply keeps the old snapshot.
//!
//! # Critical Invariants
//!
//! 1. Per bank: `reserves + Σ remaining_loan_principal + Σ owned_bond_face
//!    == Σ deposit_balances + retained_earnings` (verified externally)
//! 2. Id counter is monotonic; sequential ids never collide and iteration
//!    order over id-keyed maps is issuance order

use crate::models::bank::{Bank, Deposit, Loan};
use crate::models::treasury::Treasury;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Complete banking-system bookkeeping state.
///
/// # Example
/// ```
/// use economy_simulator_core_rs::models::bank::Bank;
/// use economy_simulator_core_rs::models::ledger::Ledger;
///
/// let mut ledger = Ledger::new();
/// ledger.add_bank(Bank::new("BANK_A".to_string(), 0.03));
///
/// assert_eq!(ledger.num_banks(), 1);
/// assert_eq!(ledger.next_id("loan"), "loan_00000001");
/// assert_eq!(ledger.next_id("dep"), "dep_00000002");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Ledger {
    /// Current simulation tick
    tick: usize,

    /// Government books
    treasury: Treasury,

    /// Bank balance sheets, keyed by bank id
    banks: BTreeMap<String, Bank>,

    /// Monotonic counter backing sequential ids
    id_seq: u64,
}

impl Ledger {
    /// Create an empty ledger at tick 0
    pub fn new() -> Self {
        Self::default()
    }

    /// Get current tick
    pub fn tick(&self) -> usize {
        self.tick
    }

    /// Advance the tick by one
    pub fn advance_tick(&mut self) {
        self.tick += 1;
    }

    /// Set the tick directly (snapshot restore)
    pub fn set_tick(&mut self, tick: usize) {
        self.tick = tick;
    }

    /// Get the treasury
    pub fn treasury(&self) -> &Treasury {
        &self.treasury
    }

    /// Get the treasury mutably
    pub fn treasury_mut(&mut self) -> &mut Treasury {
        &mut self.treasury
    }

    /// Add a bank.
    ///
    /// # Panics
    /// Panics on duplicate bank id.
    pub fn add_bank(&mut self, bank: Bank) {
        let id = bank.id().to_string();
        assert!(
            !self.banks.contains_key(&id),
            "Bank ID {} already exists",
            id
        );
        self.banks.insert(id, bank);
    }

    /// Get a bank by id
    pub fn bank(&self, id: &str) -> Option<&Bank> {
        self.banks.get(id)
    }

    /// Get a bank mutably by id
    pub fn bank_mut(&mut self, id: &str) -> Option<&mut Bank> {
        self.banks.get_mut(id)
    }

    /// Iterate banks in id order
    pub fn banks(&self) -> impl Iterator<Item = &Bank> {
        self.banks.values()
    }

    /// Iterate banks mutably in id order
    pub fn banks_mut(&mut self) -> impl Iterator<Item = &mut Bank> {
        self.banks.values_mut()
    }

    /// Number of banks
    pub fn num_banks(&self) -> usize {
        self.banks.len()
    }

    /// Mint the next sequential id for the given prefix.
    ///
    /// Ids are zero-padded so lexicographic order equals issuance order,
    /// which makes iteration over id-keyed maps deterministic.
    pub fn next_id(&mut self, prefix: &str) -> String {
        self.id_seq += 1;
        format!("{}_{:08}", prefix, self.id_seq)
    }

    /// Sum of remaining principal owed by one borrower across all banks
    pub fn total_debt_of(&self, borrower_id: &str) -> i64 {
        self.banks
            .values()
            .flat_map(|b| b.loans())
            .filter(|l| l.borrower_id() == borrower_id && !l.is_defaulted())
            .map(Loan::remaining_principal)
            .sum()
    }

    /// Sum of deposit balances across every bank (the ledger-side component
    /// of the money supply)
    pub fn total_deposit_money(&self) -> i64 {
        self.banks.values().map(Bank::total_deposit_balance).sum()
    }

    /// First deposit owned by the given account anywhere in the system,
    /// with its bank id
    pub fn deposit_of(&self, owner_id: &str) -> Option<(&str, &Deposit)> {
        self.banks
            .values()
            .find_map(|b| b.deposit_of(owner_id).map(|d| (b.id(), d)))
    }
}
