//! Treasury model
//!
//! The government's books inside the ledger: per-currency balances (the
//! ledger mirror of the government settlement account) and the sovereign
//! bond register. Bonds are keyed by sequential zero-padded ids so
//! iteration order is issuance order.
//!
//! CRITICAL: All money values are i64 (pennies).

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A sovereign bond on the treasury register.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bond {
    /// Sequential bond identifier (e.g. "bond_00000001")
    id: String,

    /// Holder account ID (commercial bank or central bank)
    owner_id: String,

    /// Face value (i64 pennies)
    face_value: i64,

    /// Annual coupon yield (e.g. 0.05 = 5%)
    yield_rate: f64,

    /// Tick when the bond was issued
    issue_tick: usize,

    /// Tick when the face value is redeemed
    maturity_tick: usize,

    /// Currency the bond is denominated in
    currency: String,
}

impl Bond {
    /// Create a new bond.
    ///
    /// # Panics
    /// Panics if the face value is not positive or maturity is not after
    /// issue.
    pub fn new(
        id: String,
        owner_id: String,
        face_value: i64,
        yield_rate: f64,
        issue_tick: usize,
        maturity_tick: usize,
        currency: String,
    ) -> Self {
        assert!(face_value > 0, "face value must be positive");
        assert!(maturity_tick > issue_tick, "maturity must be after issue");

        Self {
            id,
            owner_id,
            face_value,
            yield_rate,
            issue_tick,
            maturity_tick,
            currency,
        }
    }

    /// Get bond ID
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Get holder account ID
    pub fn owner_id(&self) -> &str {
        &self.owner_id
    }

    /// Get face value
    pub fn face_value(&self) -> i64 {
        self.face_value
    }

    /// Get annual coupon yield
    pub fn yield_rate(&self) -> f64 {
        self.yield_rate
    }

    /// Get issue tick
    pub fn issue_tick(&self) -> usize {
        self.issue_tick
    }

    /// Get maturity tick
    pub fn maturity_tick(&self) -> usize {
        self.maturity_tick
    }

    /// Get currency code
    pub fn currency(&self) -> &str {
        &self.currency
    }

    /// Whether the bond has reached maturity at the given tick
    pub fn is_mature(&self, tick: usize) -> bool {
        tick >= self.maturity_tick
    }
}

/// The government's ledger-side books.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Treasury {
    /// Per-currency balances (i64 pennies)
    balances: BTreeMap<String, i64>,

    /// Outstanding bonds, keyed by sequential id (iteration = issuance order)
    bonds: BTreeMap<String, Bond>,
}

impl Treasury {
    /// Create an empty treasury
    pub fn new() -> Self {
        Self::default()
    }

    /// Balance in one currency (0 if never held)
    pub fn balance(&self, currency: &str) -> i64 {
        self.balances.get(currency).copied().unwrap_or(0)
    }

    /// All per-currency balances
    pub fn balances(&self) -> &BTreeMap<String, i64> {
        &self.balances
    }

    /// Adjust a currency balance by a signed delta
    pub fn adjust_balance(&mut self, delta: i64, currency: &str) {
        *self.balances.entry(currency.to_string()).or_insert(0) += delta;
    }

    /// Register a bond.
    ///
    /// # Panics
    /// Panics on duplicate bond id.
    pub fn add_bond(&mut self, bond: Bond) {
        let id = bond.id().to_string();
        assert!(
            !self.bonds.contains_key(&id),
            "Bond ID {} already exists",
            id
        );
        self.bonds.insert(id, bond);
    }

    /// Get a bond by id
    pub fn bond(&self, id: &str) -> Option<&Bond> {
        self.bonds.get(id)
    }

    /// Remove a redeemed bond from the register
    pub fn remove_bond(&mut self, id: &str) -> Option<Bond> {
        self.bonds.remove(id)
    }

    /// Iterate outstanding bonds in issuance order
    pub fn bonds(&self) -> impl Iterator<Item = &Bond> {
        self.bonds.values()
    }

    /// Number of outstanding bonds
    pub fn num_bonds(&self) -> usize {
        self.bonds.len()
    }

    /// Sum of outstanding face value across all bonds
    pub fn outstanding_bond_debt(&self) -> i64 {
        self.bonds.values().map(|b| b.face_value()).sum()
    }

    /// Sum of outstanding face value held by one account
    pub fn bond_holdings_of(&self, owner_id: &str) -> i64 {
        self.bonds
            .values()
            .filter(|b| b.owner_id() == owner_id)
            .map(|b| b.face_value())
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_treasury_balances() {
        let mut treasury = Treasury::new();
        assert_eq!(treasury.balance("USD"), 0);

        treasury.adjust_balance(500_000, "USD");
        treasury.adjust_balance(-100_000, "USD");
        treasury.adjust_balance(30_000, "EUR");

        assert_eq!(treasury.balance("USD"), 400_000);
        assert_eq!(treasury.balance("EUR"), 30_000);
    }

    #[test]
    fn test_bond_register() {
        let mut treasury = Treasury::new();
        treasury.add_bond(Bond::new(
            "bond_00000001".to_string(),
            "BANK_A".to_string(),
            100_000,
            0.05,
            0,
            365,
            "USD".to_string(),
        ));
        treasury.add_bond(Bond::new(
            "bond_00000002".to_string(),
            "CENTRAL_BANK".to_string(),
            250_000,
            0.06,
            10,
            375,
            "USD".to_string(),
        ));

        assert_eq!(treasury.outstanding_bond_debt(), 350_000);
        assert_eq!(treasury.bond_holdings_of("BANK_A"), 100_000);
        assert!(treasury.bond("bond_00000002").unwrap().is_mature(375));
        assert!(!treasury.bond("bond_00000002").unwrap().is_mature(100));
    }
}
