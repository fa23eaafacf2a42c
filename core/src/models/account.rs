//! Account capability and registry
//!
//! Every entity that can hold money (household, firm, bank, government,
//! central bank) satisfies the [`Account`] capability: per-currency balance
//! query, deposit, withdraw, plus optional non-cash portfolio transfer for
//! inheritance and liquidation flows.
//!
//! The capability is resolved ONCE at registration through [`AccountSet`]
//! (or any other [`AccountRegistry`] implementation passed into the
//! settlement engine). There is no process-wide lookup and no per-call type
//! inspection on the hot settlement path.
//!
//! # Overdraft policy
//!
//! Only the central bank and explicitly flagged system accounts may carry a
//! negative balance. That overdraft channel is the sole sanctioned path for
//! currency creation; every other account is hard-constrained by its
//! balance.
//!
//! CRITICAL: All money values are i64 (pennies).

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// Default currency code used when a flow does not specify one.
pub const DEFAULT_CURRENCY: &str = "USD";

/// Errors that can occur during account operations
#[derive(Debug, Error, PartialEq)]
pub enum AccountError {
    #[error("Insufficient funds: required {required}, available {available}")]
    InsufficientFunds { required: i64, available: i64 },
}

/// Economic role of a registered account.
///
/// The role fixes two capabilities at registration time:
/// - whether the account may overdraw (currency creation channel)
/// - whether its balance counts toward the tracked money supply
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountRole {
    Household,
    Firm,
    Bank,
    Government,
    CentralBank,
    /// Non-economic bookkeeping account (e.g. liquidation market maker)
    System,
}

impl AccountRole {
    /// Whether accounts of this role may carry a negative balance
    pub fn overdraft_exempt(&self) -> bool {
        matches!(self, AccountRole::CentralBank | AccountRole::System)
    }

    /// Whether balances of this role count toward the money supply (M2)
    pub fn in_money_supply(&self) -> bool {
        matches!(
            self,
            AccountRole::Household | AccountRole::Firm | AccountRole::Bank
        )
    }
}

/// Capability implemented by every entity that can hold money.
///
/// The settlement engine is the only component that calls the mutating
/// methods; everything else consumes the read side.
pub trait Account {
    /// Unique account identifier
    fn id(&self) -> &str;

    /// Economic role (fixed at registration)
    fn role(&self) -> AccountRole;

    /// Balance in integer pennies for the given currency (0 if never held)
    fn balance(&self, currency: &str) -> i64;

    /// Currencies this account has ever held a balance in
    fn held_currencies(&self) -> Vec<String>;

    /// Credit the account.
    ///
    /// # Panics
    /// Panics if `amount` is negative. Amount validation happens at the
    /// settlement boundary before any account is touched.
    fn deposit(&mut self, amount: i64, currency: &str);

    /// Debit the account. Fails with no state change when funds are
    /// insufficient and the account is not overdraft-exempt.
    fn withdraw(&mut self, amount: i64, currency: &str) -> Result<(), AccountError>;

    /// Adjust balance directly, bypassing the overdraft check.
    ///
    /// # Safety
    /// Reserved for rollback paths inside atomic settlement operations,
    /// where conservation is guaranteed by the surrounding unwind.
    fn adjust_balance(&mut self, delta: i64, currency: &str);

    /// Whether this account may carry a negative balance
    fn is_overdraft_exempt(&self) -> bool {
        self.role().overdraft_exempt()
    }

    /// Whether this account's balance counts toward M2
    fn in_money_supply(&self) -> bool {
        self.role().in_money_supply()
    }

    /// Non-cash holdings (item_id -> quantity)
    fn portfolio(&self) -> &BTreeMap<String, i64>;

    /// Remove and return the entire non-cash portfolio (for escrow)
    fn take_portfolio(&mut self) -> BTreeMap<String, i64>;

    /// Merge received non-cash holdings into the portfolio
    fn receive_portfolio(&mut self, items: BTreeMap<String, i64>);
}

/// A registered settlement participant.
///
/// # Example
/// ```
/// use economy_simulator_core_rs::models::account::{
///     Account, AccountRole, SettlementMember, DEFAULT_CURRENCY,
/// };
///
/// let mut hh = SettlementMember::with_balance(
///     "HH_1".to_string(),
///     AccountRole::Household,
///     1_000_00,
///     DEFAULT_CURRENCY,
/// );
/// assert_eq!(hh.balance(DEFAULT_CURRENCY), 1_000_00);
///
/// hh.withdraw(300_00, DEFAULT_CURRENCY).unwrap();
/// assert_eq!(hh.balance(DEFAULT_CURRENCY), 700_00);
/// assert!(hh.withdraw(10_000_00, DEFAULT_CURRENCY).is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SettlementMember {
    /// Unique account identifier (e.g. "HH_17", "BANK_A", "CENTRAL_BANK")
    id: String,

    /// Economic role, fixed at registration
    role: AccountRole,

    /// Per-currency balances in integer pennies
    balances: BTreeMap<String, i64>,

    /// Non-cash holdings (item_id -> quantity)
    portfolio: BTreeMap<String, i64>,
}

impl SettlementMember {
    /// Create a new member with zero balances
    pub fn new(id: String, role: AccountRole) -> Self {
        Self {
            id,
            role,
            balances: BTreeMap::new(),
            portfolio: BTreeMap::new(),
        }
    }

    /// Create a new member with an opening balance in one currency
    ///
    /// # Panics
    /// Panics if `balance` is negative and the role is not overdraft-exempt.
    pub fn with_balance(id: String, role: AccountRole, balance: i64, currency: &str) -> Self {
        assert!(
            balance >= 0 || role.overdraft_exempt(),
            "opening balance must be non-negative for non-exempt accounts"
        );
        let mut member = Self::new(id, role);
        member.balances.insert(currency.to_string(), balance);
        member
    }

    /// Add a non-cash holding (builder)
    pub fn with_holding(mut self, item_id: &str, quantity: i64) -> Self {
        assert!(quantity > 0, "quantity must be positive");
        *self.portfolio.entry(item_id.to_string()).or_insert(0) += quantity;
        self
    }

    /// All per-currency balances
    pub fn balances(&self) -> &BTreeMap<String, i64> {
        &self.balances
    }
}

impl Account for SettlementMember {
    fn id(&self) -> &str {
        &self.id
    }

    fn role(&self) -> AccountRole {
        self.role
    }

    fn balance(&self, currency: &str) -> i64 {
        self.balances.get(currency).copied().unwrap_or(0)
    }

    fn held_currencies(&self) -> Vec<String> {
        self.balances.keys().cloned().collect()
    }

    fn deposit(&mut self, amount: i64, currency: &str) {
        assert!(amount >= 0, "amount must be non-negative");
        *self.balances.entry(currency.to_string()).or_insert(0) += amount;
    }

    fn withdraw(&mut self, amount: i64, currency: &str) -> Result<(), AccountError> {
        assert!(amount >= 0, "amount must be non-negative");

        let available = self.balance(currency);
        if available < amount && !self.is_overdraft_exempt() {
            return Err(AccountError::InsufficientFunds {
                required: amount,
                available,
            });
        }

        *self.balances.entry(currency.to_string()).or_insert(0) -= amount;
        Ok(())
    }

    fn adjust_balance(&mut self, delta: i64, currency: &str) {
        *self.balances.entry(currency.to_string()).or_insert(0) += delta;
    }

    fn portfolio(&self) -> &BTreeMap<String, i64> {
        &self.portfolio
    }

    fn take_portfolio(&mut self) -> BTreeMap<String, i64> {
        std::mem::take(&mut self.portfolio)
    }

    fn receive_portfolio(&mut self, items: BTreeMap<String, i64>) {
        for (item_id, quantity) in items {
            *self.portfolio.entry(item_id).or_insert(0) += quantity;
        }
    }
}

/// Repository of registered accounts, dependency-injected into every
/// settlement and engine call.
///
/// Implementations must resolve each id to the same account for the life of
/// the registry; the settlement engine relies on that for rollback.
pub trait AccountRegistry {
    /// Look up an account by id
    fn account(&self, id: &str) -> Option<&dyn Account>;

    /// Look up an account mutably by id
    fn account_mut(&mut self, id: &str) -> Option<&mut dyn Account>;

    /// Whether an account with this id is registered
    fn contains(&self, id: &str) -> bool;

    /// Sum of balances over all in-supply accounts for one currency.
    ///
    /// This is the live ("actual") component of M2 at the settlement level.
    fn money_supply_balance(&self, currency: &str) -> i64;

    /// First registered monetary authority (central bank), if any
    fn monetary_authority_id(&self) -> Option<String>;
}

/// In-memory account registry keyed by account id.
///
/// # Example
/// ```
/// use economy_simulator_core_rs::models::account::{
///     AccountRegistry, AccountRole, AccountSet, SettlementMember, DEFAULT_CURRENCY,
/// };
///
/// let mut accounts = AccountSet::new();
/// accounts.register(SettlementMember::with_balance(
///     "HH_1".to_string(),
///     AccountRole::Household,
///     500_00,
///     DEFAULT_CURRENCY,
/// ));
///
/// assert!(accounts.contains("HH_1"));
/// assert_eq!(accounts.money_supply_balance(DEFAULT_CURRENCY), 500_00);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AccountSet {
    accounts: BTreeMap<String, SettlementMember>,
}

impl AccountSet {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            accounts: BTreeMap::new(),
        }
    }

    /// Register an account.
    ///
    /// # Panics
    /// Panics if the id is already registered (duplicate registration is a
    /// wiring bug, not a runtime condition).
    pub fn register(&mut self, member: SettlementMember) {
        let id = member.id().to_string();
        assert!(
            !self.accounts.contains_key(&id),
            "Account ID {} already registered",
            id
        );
        self.accounts.insert(id, member);
    }

    /// Get a registered member by id (concrete type)
    pub fn get(&self, id: &str) -> Option<&SettlementMember> {
        self.accounts.get(id)
    }

    /// Get a registered member mutably by id (concrete type)
    pub fn get_mut(&mut self, id: &str) -> Option<&mut SettlementMember> {
        self.accounts.get_mut(id)
    }

    /// Iterate all registered members in id order
    pub fn members(&self) -> impl Iterator<Item = &SettlementMember> {
        self.accounts.values()
    }

    /// Number of registered accounts
    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    /// Whether the registry is empty
    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }

    /// First account with the given role, in id order
    pub fn first_with_role(&self, role: AccountRole) -> Option<&SettlementMember> {
        self.accounts.values().find(|m| m.role() == role)
    }

    /// Sum of all balances for one currency (supply and non-supply alike)
    pub fn total_balance(&self, currency: &str) -> i64 {
        self.accounts.values().map(|m| m.balance(currency)).sum()
    }
}

impl AccountRegistry for AccountSet {
    fn account(&self, id: &str) -> Option<&dyn Account> {
        self.accounts.get(id).map(|m| m as &dyn Account)
    }

    fn account_mut(&mut self, id: &str) -> Option<&mut dyn Account> {
        self.accounts.get_mut(id).map(|m| m as &mut dyn Account)
    }

    fn contains(&self, id: &str) -> bool {
        self.accounts.contains_key(id)
    }

    fn money_supply_balance(&self, currency: &str) -> i64 {
        self.accounts
            .values()
            .filter(|m| m.in_money_supply())
            .map(|m| m.balance(currency))
            .sum()
    }

    fn monetary_authority_id(&self) -> Option<String> {
        self.accounts
            .values()
            .find(|m| m.role() == AccountRole::CentralBank)
            .map(|m| m.id().to_string())
    }
}
