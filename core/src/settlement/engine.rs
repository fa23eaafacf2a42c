//! Settlement Engine
//!
//! The only component allowed to mutate live account balances. Every
//! operation is all-or-nothing: on any leg's failure, all prior legs in
//! that operation are undone before returning, restoring the exact
//! pre-call state.
//!
//! # Settlement Flow
//!
//! ```text
//! validate (schema)  →  debit debtor  →  credit creditor(s)
//!                            ↑                   |
//!                            └──── reverse on failure
//! ```
//!
//! Crossings of the money-supply boundary (between in-supply accounts and
//! the government / central bank) are reported to the monetary ledger as
//! expansion or contraction. Mint and burn are ordinary transfers against
//! the central bank's overdraft-exempt account — the sole sanctioned
//! channel for currency creation — and are always recorded.
//!
//! # Critical Invariants
//!
//! - **Atomicity**: debit and credit happen together, or neither
//! - **Conservation**: ordinary transfers never change the total of
//!   sender + receiver balances
//! - **Typed failure**: expected failures (insufficient funds) return a
//!   typed error with no state change; they are never panics

use crate::models::account::{AccountError, AccountRegistry};
use crate::models::event::EventLog;
use crate::models::transaction::{Transaction, TransactionType};
use crate::monetary::MonetaryLedger;
use crate::settlement::escrow::SettlementAccount;
use std::collections::BTreeMap;
use thiserror::Error;

/// Errors that can occur during settlement operations
#[derive(Debug, Error, PartialEq)]
pub enum SettlementError {
    /// Malformed input reaching the ledger boundary; rejected before any
    /// state mutation
    #[error("Schema violation: {reason}")]
    SchemaViolation { reason: String },

    /// Expected, recoverable: the debtor cannot cover the amount
    #[error("Insufficient funds for {account_id}: required {required}, available {available}")]
    InsufficientFunds {
        account_id: String,
        required: i64,
        available: i64,
    },

    #[error("Account not found: {id}")]
    AccountNotFound { id: String },

    #[error("Account {id} is not a monetary authority")]
    UnauthorizedMonetaryOperation { id: String },

    #[error("Settlement account not found: {id}")]
    SettlementAccountNotFound { id: String },

    #[error("Settlement account {id} is already closed")]
    SettlementAccountClosed { id: String },
}

/// One credit leg of an atomic settlement
#[derive(Debug, Clone, PartialEq)]
pub struct CreditLeg {
    pub account_id: String,
    pub amount: i64,
    pub memo: String,
}

/// One debtor→creditor leg of a multiparty settlement chain
#[derive(Debug, Clone, PartialEq)]
pub struct TransferLeg {
    pub debtor: String,
    pub creditor: String,
    pub amount: i64,
    pub memo: String,
}

/// A matched bilateral currency exchange
#[derive(Debug, Clone, PartialEq)]
pub struct FxMatch {
    pub party_a_id: String,
    pub party_b_id: String,
    pub amount_a_pennies: i64,
    pub currency_a: String,
    pub amount_b_pennies: i64,
    pub currency_b: String,
    pub rate_a_to_b: f64,
    pub tick: usize,
}

/// Executes transfers and atomic batches against live account balances.
///
/// # Example
/// ```
/// use economy_simulator_core_rs::models::account::{
///     Account, AccountRegistry, AccountRole, AccountSet, SettlementMember, DEFAULT_CURRENCY,
/// };
/// use economy_simulator_core_rs::settlement::SettlementEngine;
///
/// let mut accounts = AccountSet::new();
/// accounts.register(SettlementMember::with_balance(
///     "HH_1".to_string(), AccountRole::Household, 1_000_00, DEFAULT_CURRENCY,
/// ));
/// accounts.register(SettlementMember::new("FIRM_1".to_string(), AccountRole::Firm));
///
/// let mut engine = SettlementEngine::new();
/// let tx = engine
///     .transfer(&mut accounts, "HH_1", "FIRM_1", 250_00, "groceries", DEFAULT_CURRENCY, 5)
///     .unwrap();
///
/// assert_eq!(tx.total_pennies(), 250_00);
/// assert_eq!(accounts.account("HH_1").unwrap().balance(DEFAULT_CURRENCY), 750_00);
/// assert_eq!(accounts.account("FIRM_1").unwrap().balance(DEFAULT_CURRENCY), 250_00);
/// ```
#[derive(Debug, Clone, Default)]
pub struct SettlementEngine {
    /// Append-only log of every completed money movement
    pub(crate) log: Vec<Transaction>,

    /// Audit events (escrow lifecycle, leaks)
    pub(crate) events: EventLog,

    /// Money-supply observer
    pub(crate) monetary: MonetaryLedger,

    /// Open and closed estate settlement accounts, by id
    pub(crate) escrows: BTreeMap<String, SettlementAccount>,

    /// Monotonic counter backing settlement account ids
    pub(crate) escrow_seq: u64,
}

impl SettlementEngine {
    /// Create a new settlement engine with empty logs
    pub fn new() -> Self {
        Self::default()
    }

    /// The completed-transaction log
    pub fn log(&self) -> &[Transaction] {
        &self.log
    }

    /// Audit events recorded by the engine
    pub fn events(&self) -> &EventLog {
        &self.events
    }

    /// The monetary ledger observing this engine
    pub fn monetary(&self) -> &MonetaryLedger {
        &self.monetary
    }

    /// The monetary ledger, mutably (for seeding and debt tracking)
    pub fn monetary_mut(&mut self) -> &mut MonetaryLedger {
        &mut self.monetary
    }

    /// Append externally generated transactions (ledger-engine output) so
    /// the log stays a single audit stream
    pub fn record_transactions(&mut self, transactions: Vec<Transaction>) {
        self.log.extend(transactions);
    }

    /// Transfer `amount` pennies from `debtor` to `creditor`.
    ///
    /// Rejects negative amounts before touching state. Fails cleanly, with
    /// no state change, when the debtor cannot cover the amount and is not
    /// overdraft-exempt. If the credit leg cannot be applied, the debit is
    /// reversed before returning.
    ///
    /// Money-supply boundary crossings are reported to the monetary
    /// ledger.
    pub fn transfer<R: AccountRegistry + ?Sized>(
        &mut self,
        accounts: &mut R,
        debtor: &str,
        creditor: &str,
        amount: i64,
        memo: &str,
        currency: &str,
        tick: usize,
    ) -> Result<Transaction, SettlementError> {
        self.transfer_tagged(
            accounts,
            debtor,
            creditor,
            amount,
            memo,
            currency,
            TransactionType::Transfer,
            tick,
        )
    }

    /// Mint new money: the monetary authority pays `recipient` out of its
    /// overdraft-exempt account. Only the central bank (or another
    /// designated authority) may call this; the expansion is recorded.
    pub fn create_and_transfer<R: AccountRegistry + ?Sized>(
        &mut self,
        accounts: &mut R,
        authority: &str,
        recipient: &str,
        amount: i64,
        memo: &str,
        currency: &str,
        tick: usize,
    ) -> Result<Transaction, SettlementError> {
        self.require_monetary_authority(accounts, authority)?;
        self.transfer_tagged(
            accounts,
            authority,
            recipient,
            amount,
            memo,
            currency,
            TransactionType::MonetaryExpansion,
            tick,
        )
    }

    /// Burn money: `payer` pays the monetary authority, removing the amount
    /// from circulation. The contraction is recorded.
    pub fn transfer_and_destroy<R: AccountRegistry + ?Sized>(
        &mut self,
        accounts: &mut R,
        payer: &str,
        authority: &str,
        amount: i64,
        memo: &str,
        currency: &str,
        tick: usize,
    ) -> Result<Transaction, SettlementError> {
        self.require_monetary_authority(accounts, authority)?;
        self.transfer_tagged(
            accounts,
            payer,
            authority,
            amount,
            memo,
            currency,
            TransactionType::MonetaryContraction,
            tick,
        )
    }

    /// Atomically pay several credits from one debtor.
    ///
    /// Pre-checks the debtor can cover the sum of all credits, withdraws
    /// once, then applies each credit. If any credit cannot be applied, all
    /// already-applied credits and the original withdrawal are reversed,
    /// restoring the exact pre-call state.
    pub fn settle_atomic<R: AccountRegistry + ?Sized>(
        &mut self,
        accounts: &mut R,
        debtor: &str,
        credits: &[CreditLeg],
        currency: &str,
        tick: usize,
    ) -> Result<Vec<Transaction>, SettlementError> {
        // Schema pass: nothing is touched until every leg validates
        for leg in credits {
            validate_amount(leg.amount)?;
            require_account(accounts, &leg.account_id)?;
        }
        let debtor_supply = require_account(accounts, debtor)?;

        let total: i64 = credits.iter().map(|c| c.amount).sum();

        // Single withdrawal covering the whole batch
        {
            let acct = accounts
                .account_mut(debtor)
                .ok_or_else(|| SettlementError::AccountNotFound {
                    id: debtor.to_string(),
                })?;
            acct.withdraw(total, currency)
                .map_err(|e| insufficient(debtor, e))?;
        }

        // Apply credits; unwind everything on failure
        for (applied, leg) in credits.iter().enumerate() {
            match accounts.account_mut(&leg.account_id) {
                Some(acct) => acct.deposit(leg.amount, currency),
                None => {
                    for undo in credits.iter().take(applied) {
                        if let Some(acct) = accounts.account_mut(&undo.account_id) {
                            acct.adjust_balance(-undo.amount, currency);
                        }
                    }
                    if let Some(acct) = accounts.account_mut(debtor) {
                        acct.adjust_balance(total, currency);
                    }
                    return Err(SettlementError::AccountNotFound {
                        id: leg.account_id.clone(),
                    });
                }
            }
        }

        // Commit: record boundary crossings and log transactions
        let mut transactions = Vec::with_capacity(credits.len());
        for leg in credits {
            let creditor_supply = account_supply(accounts, &leg.account_id);
            self.record_supply_crossing(
                debtor_supply,
                creditor_supply,
                leg.amount,
                &leg.memo,
                currency,
                tick,
            );
            let tx = Transaction::new(
                debtor.to_string(),
                leg.account_id.clone(),
                leg.amount,
                currency.to_string(),
                tick,
            )
            .with_memo(&leg.memo);
            self.log.push(tx.clone());
            transactions.push(tx);
        }
        Ok(transactions)
    }

    /// Execute a chain of transfers atomically.
    ///
    /// If any leg fails, every already-executed leg in the chain is undone
    /// in reverse order and the typed error is returned.
    pub fn execute_multiparty_settlement<R: AccountRegistry + ?Sized>(
        &mut self,
        accounts: &mut R,
        legs: &[TransferLeg],
        currency: &str,
        tick: usize,
    ) -> Result<Vec<Transaction>, SettlementError> {
        // Schema pass
        for leg in legs {
            validate_amount(leg.amount)?;
            require_account(accounts, &leg.debtor)?;
            require_account(accounts, &leg.creditor)?;
        }

        // Apply legs in order, tracking how far we got
        let mut applied = 0;
        let mut failure: Option<SettlementError> = None;
        for leg in legs {
            let debit = match accounts.account_mut(&leg.debtor) {
                Some(acct) => acct.withdraw(leg.amount, currency),
                None => {
                    failure = Some(SettlementError::AccountNotFound {
                        id: leg.debtor.clone(),
                    });
                    break;
                }
            };
            match debit {
                Ok(()) => {
                    if let Some(acct) = accounts.account_mut(&leg.creditor) {
                        acct.deposit(leg.amount, currency);
                    }
                    applied += 1;
                }
                Err(e) => {
                    failure = Some(insufficient(&leg.debtor, e));
                    break;
                }
            }
        }

        if let Some(err) = failure {
            // Undo executed legs in reverse order
            for leg in legs.iter().take(applied).rev() {
                if let Some(acct) = accounts.account_mut(&leg.creditor) {
                    acct.adjust_balance(-leg.amount, currency);
                }
                if let Some(acct) = accounts.account_mut(&leg.debtor) {
                    acct.adjust_balance(leg.amount, currency);
                }
            }
            return Err(err);
        }

        // Commit
        let mut transactions = Vec::with_capacity(legs.len());
        for leg in legs {
            let debtor_supply = account_supply(accounts, &leg.debtor);
            let creditor_supply = account_supply(accounts, &leg.creditor);
            self.record_supply_crossing(
                debtor_supply,
                creditor_supply,
                leg.amount,
                &leg.memo,
                currency,
                tick,
            );
            let tx = Transaction::new(
                leg.debtor.clone(),
                leg.creditor.clone(),
                leg.amount,
                currency.to_string(),
                tick,
            )
            .with_memo(&leg.memo);
            self.log.push(tx.clone());
            transactions.push(tx);
        }
        Ok(transactions)
    }

    /// Execute an atomic bilateral two-currency exchange.
    ///
    /// Both legs are pre-validated before either balance changes; failure
    /// of either leg aborts the whole swap with zero mutation.
    pub fn execute_swap<R: AccountRegistry + ?Sized>(
        &mut self,
        accounts: &mut R,
        fx: &FxMatch,
    ) -> Result<(Transaction, Transaction), SettlementError> {
        validate_amount(fx.amount_a_pennies)?;
        validate_amount(fx.amount_b_pennies)?;
        let a_supply = require_account(accounts, &fx.party_a_id)?;
        let b_supply = require_account(accounts, &fx.party_b_id)?;

        // Pre-validate both legs so no mutation can half-apply
        for (party, amount, currency) in [
            (&fx.party_a_id, fx.amount_a_pennies, &fx.currency_a),
            (&fx.party_b_id, fx.amount_b_pennies, &fx.currency_b),
        ] {
            if let Some(acct) = accounts.account(party) {
                if acct.balance(currency) < amount && !acct.is_overdraft_exempt() {
                    return Err(SettlementError::InsufficientFunds {
                        account_id: party.clone(),
                        required: amount,
                        available: acct.balance(currency),
                    });
                }
            }
        }

        // Apply: a pays currency_a to b, b pays currency_b to a
        if let Some(a) = accounts.account_mut(&fx.party_a_id) {
            a.adjust_balance(-fx.amount_a_pennies, &fx.currency_a);
            a.adjust_balance(fx.amount_b_pennies, &fx.currency_b);
        }
        if let Some(b) = accounts.account_mut(&fx.party_b_id) {
            b.adjust_balance(fx.amount_a_pennies, &fx.currency_a);
            b.adjust_balance(-fx.amount_b_pennies, &fx.currency_b);
        }

        // Each leg may cross the supply boundary in its own currency
        self.record_supply_crossing(
            a_supply,
            b_supply,
            fx.amount_a_pennies,
            "fx_swap",
            &fx.currency_a,
            fx.tick,
        );
        self.record_supply_crossing(
            b_supply,
            a_supply,
            fx.amount_b_pennies,
            "fx_swap",
            &fx.currency_b,
            fx.tick,
        );

        let rate = format!("{}", fx.rate_a_to_b);
        let leg_a = Transaction::new(
            fx.party_a_id.clone(),
            fx.party_b_id.clone(),
            fx.amount_a_pennies,
            fx.currency_a.clone(),
            fx.tick,
        )
        .with_market("fx".to_string())
        .with_transaction_type(TransactionType::Swap)
        .with_metadata("rate_a_to_b", &rate);
        let leg_b = Transaction::new(
            fx.party_b_id.clone(),
            fx.party_a_id.clone(),
            fx.amount_b_pennies,
            fx.currency_b.clone(),
            fx.tick,
        )
        .with_market("fx".to_string())
        .with_transaction_type(TransactionType::Swap)
        .with_metadata("rate_a_to_b", &rate);

        self.log.push(leg_a.clone());
        self.log.push(leg_b.clone());
        Ok((leg_a, leg_b))
    }

    // =========================================================================
    // Internals
    // =========================================================================

    /// Shared transfer body used by ordinary transfers, mint/burn, and the
    /// orchestrator's tagged settlement legs (bond purchases, coupons).
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn transfer_tagged<R: AccountRegistry + ?Sized>(
        &mut self,
        accounts: &mut R,
        debtor: &str,
        creditor: &str,
        amount: i64,
        memo: &str,
        currency: &str,
        tag: TransactionType,
        tick: usize,
    ) -> Result<Transaction, SettlementError> {
        validate_amount(amount)?;
        let debtor_supply = require_account(accounts, debtor)?;
        let creditor_supply = require_account(accounts, creditor)?;

        // Debit: clean failure with no state change
        {
            let acct = accounts
                .account_mut(debtor)
                .ok_or_else(|| SettlementError::AccountNotFound {
                    id: debtor.to_string(),
                })?;
            acct.withdraw(amount, currency)
                .map_err(|e| insufficient(debtor, e))?;
        }

        // Credit: if it cannot be applied, reverse the debit first
        match accounts.account_mut(creditor) {
            Some(acct) => acct.deposit(amount, currency),
            None => {
                if let Some(acct) = accounts.account_mut(debtor) {
                    acct.adjust_balance(amount, currency);
                }
                return Err(SettlementError::AccountNotFound {
                    id: creditor.to_string(),
                });
            }
        }

        self.record_supply_crossing(debtor_supply, creditor_supply, amount, memo, currency, tick);

        let tx = Transaction::new(
            debtor.to_string(),
            creditor.to_string(),
            amount,
            currency.to_string(),
            tick,
        )
        .with_transaction_type(tag)
        .with_memo(memo);
        self.log.push(tx.clone());
        Ok(tx)
    }

    /// Report a money-supply boundary crossing to the monetary ledger.
    ///
    /// supply → non-supply is a contraction; non-supply → supply is an
    /// expansion; same-side movements change nothing.
    fn record_supply_crossing(
        &mut self,
        debtor_in_supply: bool,
        creditor_in_supply: bool,
        amount: i64,
        source: &str,
        currency: &str,
        tick: usize,
    ) {
        match (debtor_in_supply, creditor_in_supply) {
            (true, false) => {
                self.monetary
                    .record_monetary_contraction(amount, source, currency, tick)
            }
            (false, true) => {
                self.monetary
                    .record_monetary_expansion(amount, source, currency, tick)
            }
            _ => {}
        }
    }

    fn require_monetary_authority<R: AccountRegistry + ?Sized>(
        &self,
        accounts: &R,
        id: &str,
    ) -> Result<(), SettlementError> {
        let acct = accounts
            .account(id)
            .ok_or_else(|| SettlementError::AccountNotFound { id: id.to_string() })?;
        if !acct.is_overdraft_exempt() {
            return Err(SettlementError::UnauthorizedMonetaryOperation {
                id: id.to_string(),
            });
        }
        Ok(())
    }
}

/// Reject negative amounts before any state is touched
fn validate_amount(amount: i64) -> Result<(), SettlementError> {
    if amount < 0 {
        return Err(SettlementError::SchemaViolation {
            reason: format!("negative amount {}", amount),
        });
    }
    Ok(())
}

/// Resolve an account and return whether it counts in the money supply
fn require_account<R: AccountRegistry + ?Sized>(
    accounts: &R,
    id: &str,
) -> Result<bool, SettlementError> {
    accounts
        .account(id)
        .map(|a| a.in_money_supply())
        .ok_or_else(|| SettlementError::AccountNotFound { id: id.to_string() })
}

/// Whether an already-validated account counts in the money supply
fn account_supply<R: AccountRegistry + ?Sized>(accounts: &R, id: &str) -> bool {
    accounts
        .account(id)
        .map(|a| a.in_money_supply())
        .unwrap_or(false)
}

/// Map an account-level shortfall into the settlement error taxonomy
fn insufficient(account_id: &str, err: AccountError) -> SettlementError {
    let AccountError::InsufficientFunds {
        required,
        available,
    } = err;
    SettlementError::InsufficientFunds {
        account_id: account_id.to_string(),
        required,
        available,
    }
}
