//! Command batch execution
//!
//! A command batch bundles peer transfers and mint/burn mutations into one
//! all-or-nothing unit. The whole batch is validated and projected against
//! current balances before anything is applied: an unresolved agent id, a
//! negative transfer amount, or a shortfall anywhere in the sequence aborts
//! the entire batch with zero state mutation. There is no partial commit.

use crate::models::account::AccountRegistry;
use crate::models::transaction::Transaction;
use crate::settlement::engine::{SettlementEngine, SettlementError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// One peer transfer inside a command batch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchTransfer {
    pub source_id: String,
    pub target_id: String,
    pub amount_pennies: i64,
    pub currency: String,
    pub reason: String,
}

/// One mint/burn mutation inside a command batch.
///
/// `amount_pennies` is signed: positive mints into the target, negative
/// burns out of it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchMutation {
    pub target_id: String,
    pub amount_pennies: i64,
    pub currency: String,
    pub reason: String,
}

/// A batch of transfers and monetary mutations applied atomically
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CommandBatch {
    pub transfers: Vec<BatchTransfer>,
    pub mutations: Vec<BatchMutation>,
    pub tick: usize,
}

/// Errors that abort an entire command batch
#[derive(Debug, Error, PartialEq)]
pub enum BatchError {
    #[error("Unresolved agent id: {id}")]
    UnresolvedAgent { id: String },

    #[error("Invalid amount {amount} in {context}")]
    InvalidAmount { amount: i64, context: String },

    #[error("No monetary authority registered; cannot apply mint/burn mutations")]
    NoMonetaryAuthority,

    #[error("Command {index} would overdraw {account_id}: required {required}, available {available}")]
    InsufficientFunds {
        index: usize,
        account_id: String,
        required: i64,
        available: i64,
    },

    #[error(transparent)]
    Settlement(#[from] SettlementError),
}

/// Execute a command batch against live balances.
///
/// Validation happens in two passes before any mutation:
/// 1. **Schema**: every referenced agent resolves, every transfer amount is
///    non-negative, and a monetary authority exists if mutations are
///    present
/// 2. **Projection**: the whole sequence is simulated against a scratch
///    copy of the touched balances; any overdraw aborts the batch
///
/// Only a batch that projects cleanly is applied, so the apply phase
/// cannot fail part-way and no partial commit can occur.
pub fn execute_batch<R: AccountRegistry + ?Sized>(
    engine: &mut SettlementEngine,
    accounts: &mut R,
    batch: &CommandBatch,
) -> Result<Vec<Transaction>, BatchError> {
    // Pass 1: schema
    for t in &batch.transfers {
        if t.amount_pennies < 0 {
            return Err(BatchError::InvalidAmount {
                amount: t.amount_pennies,
                context: format!("transfer {} -> {}", t.source_id, t.target_id),
            });
        }
        require_resolved(accounts, &t.source_id)?;
        require_resolved(accounts, &t.target_id)?;
    }
    for m in &batch.mutations {
        require_resolved(accounts, &m.target_id)?;
    }
    let authority = if batch.mutations.is_empty() {
        None
    } else {
        Some(
            accounts
                .monetary_authority_id()
                .ok_or(BatchError::NoMonetaryAuthority)?,
        )
    };

    // Pass 2: project the sequence against scratch balances
    let mut projection: BTreeMap<(String, String), i64> = BTreeMap::new();

    for (index, t) in batch.transfers.iter().enumerate() {
        let available = projected_balance(accounts, &mut projection, &t.source_id, &t.currency);
        let exempt = is_exempt(accounts, &t.source_id);
        if available < t.amount_pennies && !exempt {
            return Err(BatchError::InsufficientFunds {
                index,
                account_id: t.source_id.clone(),
                required: t.amount_pennies,
                available,
            });
        }
        *projection
            .get_mut(&(t.source_id.clone(), t.currency.clone()))
            .expect("seeded above") -= t.amount_pennies;
        projected_balance(accounts, &mut projection, &t.target_id, &t.currency);
        *projection
            .get_mut(&(t.target_id.clone(), t.currency.clone()))
            .expect("seeded above") += t.amount_pennies;
    }

    for (offset, m) in batch.mutations.iter().enumerate() {
        if m.amount_pennies < 0 {
            // Burn: the target must cover it
            let burn = -m.amount_pennies;
            let available = projected_balance(accounts, &mut projection, &m.target_id, &m.currency);
            let exempt = is_exempt(accounts, &m.target_id);
            if available < burn && !exempt {
                return Err(BatchError::InsufficientFunds {
                    index: batch.transfers.len() + offset,
                    account_id: m.target_id.clone(),
                    required: burn,
                    available,
                });
            }
            *projection
                .get_mut(&(m.target_id.clone(), m.currency.clone()))
                .expect("seeded above") -= burn;
        } else {
            projected_balance(accounts, &mut projection, &m.target_id, &m.currency);
            *projection
                .get_mut(&(m.target_id.clone(), m.currency.clone()))
                .expect("seeded above") += m.amount_pennies;
        }
    }

    // Apply: cannot fail after a clean projection
    let mut transactions = Vec::new();
    for t in &batch.transfers {
        let tx = engine.transfer(
            accounts,
            &t.source_id,
            &t.target_id,
            t.amount_pennies,
            &t.reason,
            &t.currency,
            batch.tick,
        )?;
        transactions.push(tx);
    }
    if let Some(authority) = authority {
        for m in &batch.mutations {
            let tx = if m.amount_pennies >= 0 {
                engine.create_and_transfer(
                    accounts,
                    &authority,
                    &m.target_id,
                    m.amount_pennies,
                    &m.reason,
                    &m.currency,
                    batch.tick,
                )?
            } else {
                engine.transfer_and_destroy(
                    accounts,
                    &m.target_id,
                    &authority,
                    -m.amount_pennies,
                    &m.reason,
                    &m.currency,
                    batch.tick,
                )?
            };
            transactions.push(tx);
        }
    }

    Ok(transactions)
}

/// Projected balance of an account/currency pair, seeding the scratch map
/// from the live balance on first touch
fn projected_balance<R: AccountRegistry + ?Sized>(
    accounts: &R,
    projection: &mut BTreeMap<(String, String), i64>,
    id: &str,
    currency: &str,
) -> i64 {
    *projection
        .entry((id.to_string(), currency.to_string()))
        .or_insert_with(|| {
            accounts
                .account(id)
                .map(|a| a.balance(currency))
                .unwrap_or(0)
        })
}

fn require_resolved<R: AccountRegistry + ?Sized>(
    accounts: &R,
    id: &str,
) -> Result<(), BatchError> {
    if !accounts.contains(id) {
        return Err(BatchError::UnresolvedAgent { id: id.to_string() });
    }
    Ok(())
}

fn is_exempt<R: AccountRegistry + ?Sized>(accounts: &R, id: &str) -> bool {
    accounts
        .account(id)
        .map(|a| a.is_overdraft_exempt())
        .unwrap_or(false)
}
