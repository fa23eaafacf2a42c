//! Estate settlement escrow
//!
//! Three-phase protocol for resolving a decedent's (or liquidated agent's)
//! holdings without the assets being spendable mid-resolution:
//!
//! 1. `create_settlement` — atomically move the decedent's cash (every
//!    currency) and non-cash portfolio into a transient escrow account
//! 2. `execute_settlement` — distribute per a caller-supplied plan,
//!    tolerating per-leg insufficiency (skipped, not fatal), possibly
//!    across multiple ticks
//! 3. `verify_and_close` — close CLOSED only when the escrow is fully
//!    drained; anything left closes as CLOSED_WITH_LEAK and is surfaced,
//!    never silently zeroed
//!
//! When no heir exists, the caller's plan routes residual assets to the
//! government (escheatment); the escrow itself takes no routing decisions.

use crate::models::account::AccountRegistry;
use crate::models::event::FinancialEvent;
use crate::models::transaction::{Transaction, TransactionType};
use crate::settlement::engine::{SettlementEngine, SettlementError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Lifecycle status of an estate settlement account
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EscrowStatus {
    /// Assets escrowed; distribution may still run
    Open,

    /// Fully drained and closed clean
    Closed,

    /// Closed with undistributed assets remaining (surfaced leak)
    ClosedWithLeak,
}

/// Transient record holding a decedent's assets during resolution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SettlementAccount {
    /// Sequential settlement identifier (e.g. "stl_00000001")
    id: String,

    /// Account whose assets were escrowed
    decedent_id: String,

    /// Designated heir, if any
    heir_id: Option<String>,

    /// Escrowed cash per currency
    cash: BTreeMap<String, i64>,

    /// Escrowed non-cash holdings (item_id -> quantity)
    portfolio: BTreeMap<String, i64>,

    /// Current lifecycle status
    status: EscrowStatus,

    /// Tick when the escrow was opened
    opened_tick: usize,

    /// Tick when the escrow was closed, if closed
    closed_tick: Option<usize>,
}

impl SettlementAccount {
    /// Get settlement ID
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Get the escrowed account's id
    pub fn decedent_id(&self) -> &str {
        &self.decedent_id
    }

    /// Get the designated heir, if any
    pub fn heir_id(&self) -> Option<&str> {
        self.heir_id.as_deref()
    }

    /// Escrowed cash for one currency
    pub fn cash(&self, currency: &str) -> i64 {
        self.cash.get(currency).copied().unwrap_or(0)
    }

    /// Total escrowed cash across all currencies (1:1 diagnostic sum)
    pub fn total_cash(&self) -> i64 {
        self.cash.values().sum()
    }

    /// Escrowed non-cash holdings
    pub fn portfolio(&self) -> &BTreeMap<String, i64> {
        &self.portfolio
    }

    /// Current status
    pub fn status(&self) -> EscrowStatus {
        self.status
    }

    /// Tick when the escrow was opened
    pub fn opened_tick(&self) -> usize {
        self.opened_tick
    }

    /// Tick when the escrow was closed
    pub fn closed_tick(&self) -> Option<usize> {
        self.closed_tick
    }

    /// Whether every asset has been distributed
    pub fn is_drained(&self) -> bool {
        self.cash.values().all(|&v| v == 0) && self.portfolio.values().all(|&q| q == 0)
    }
}

/// One cash leg of a distribution plan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CashDistribution {
    pub recipient_id: String,
    pub amount: i64,
    pub currency: String,
}

/// One non-cash leg of a distribution plan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioDistribution {
    pub recipient_id: String,
    pub item_id: String,
    pub quantity: i64,
}

/// Caller-supplied distribution plan for an open escrow
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DistributionPlan {
    pub cash_legs: Vec<CashDistribution>,
    pub portfolio_legs: Vec<PortfolioDistribution>,
}

/// Outcome of one `execute_settlement` pass
#[derive(Debug, Clone, PartialEq)]
pub struct DistributionReport {
    /// Transactions for the legs that were applied
    pub distributed: Vec<Transaction>,

    /// Legs skipped because the escrow could not cover them or the
    /// recipient was unknown
    pub skipped_legs: usize,
}

impl SettlementEngine {
    /// Open an estate settlement: atomically move the decedent's cash and
    /// non-cash portfolio into a new escrow account.
    ///
    /// After this call the decedent's balances are zero, so nothing can be
    /// spent mid-resolution. Returns the new settlement id.
    pub fn create_settlement<R: AccountRegistry + ?Sized>(
        &mut self,
        accounts: &mut R,
        decedent_id: &str,
        heir_id: Option<String>,
        tick: usize,
    ) -> Result<String, SettlementError> {
        let decedent_in_supply = accounts
            .account(decedent_id)
            .map(|a| a.in_money_supply())
            .unwrap_or(false);
        let (cash, portfolio) = {
            let acct = accounts.account_mut(decedent_id).ok_or_else(|| {
                SettlementError::AccountNotFound {
                    id: decedent_id.to_string(),
                }
            })?;

            // Drain every currency the decedent holds. Balances of
            // non-exempt accounts are never negative, so removing the
            // exact balance cannot fail.
            let balances: Vec<(String, i64)> = acct
                .held_currencies()
                .into_iter()
                .filter_map(|currency| {
                    let balance = acct.balance(&currency);
                    (balance != 0).then_some((currency, balance))
                })
                .collect();
            let mut cash = BTreeMap::new();
            for (currency, balance) in balances {
                acct.adjust_balance(-balance, &currency);
                cash.insert(currency, balance);
            }

            (cash, acct.take_portfolio())
        };

        self.escrow_seq += 1;
        let id = format!("stl_{:08}", self.escrow_seq);
        let escrowed_cash: i64 = cash.values().sum();

        for (currency, amount) in &cash {
            // Escrowed cash leaves circulation until distributed
            if decedent_in_supply {
                self.monetary
                    .record_monetary_contraction(*amount, "estate_escrow", currency, tick);
            }
            self.log.push(
                Transaction::new(
                    decedent_id.to_string(),
                    id.clone(),
                    *amount,
                    currency.clone(),
                    tick,
                )
                .with_market("estate".to_string())
                .with_transaction_type(TransactionType::Escrow)
                .with_memo("assets escrowed"),
            );
        }
        self.events.log(FinancialEvent::EscrowOpened {
            tick,
            settlement_id: id.clone(),
            decedent_id: decedent_id.to_string(),
            escrowed_cash,
        });

        self.escrows.insert(
            id.clone(),
            SettlementAccount {
                id: id.clone(),
                decedent_id: decedent_id.to_string(),
                heir_id,
                cash,
                portfolio,
                status: EscrowStatus::Open,
                opened_tick: tick,
                closed_tick: None,
            },
        );
        Ok(id)
    }

    /// Distribute escrowed assets per the caller's plan.
    ///
    /// A leg the escrow cannot cover (or whose recipient is unknown) is
    /// skipped, not fatal; the plan may be re-run on later ticks as more
    /// legs become coverable.
    pub fn execute_settlement<R: AccountRegistry + ?Sized>(
        &mut self,
        accounts: &mut R,
        settlement_id: &str,
        plan: &DistributionPlan,
        tick: usize,
    ) -> Result<DistributionReport, SettlementError> {
        // Validate amounts up front; a malformed plan is a schema error,
        // not a skippable leg
        for leg in &plan.cash_legs {
            if leg.amount < 0 {
                return Err(SettlementError::SchemaViolation {
                    reason: format!("negative distribution amount {}", leg.amount),
                });
            }
        }
        for leg in &plan.portfolio_legs {
            if leg.quantity < 0 {
                return Err(SettlementError::SchemaViolation {
                    reason: format!("negative distribution quantity {}", leg.quantity),
                });
            }
        }

        {
            let escrow = self.escrows.get(settlement_id).ok_or_else(|| {
                SettlementError::SettlementAccountNotFound {
                    id: settlement_id.to_string(),
                }
            })?;
            if escrow.status != EscrowStatus::Open {
                return Err(SettlementError::SettlementAccountClosed {
                    id: settlement_id.to_string(),
                });
            }
        }

        let mut distributed = Vec::new();
        let mut skipped = 0;

        for leg in &plan.cash_legs {
            let escrow = self
                .escrows
                .get_mut(settlement_id)
                .expect("escrow presence checked above");
            let available = escrow.cash(&leg.currency);
            if available < leg.amount || !accounts.contains(&leg.recipient_id) {
                skipped += 1;
                continue;
            }

            *escrow.cash.entry(leg.currency.clone()).or_insert(0) -= leg.amount;
            let recipient_in_supply = match accounts.account_mut(&leg.recipient_id) {
                Some(acct) => {
                    acct.deposit(leg.amount, &leg.currency);
                    acct.in_money_supply()
                }
                None => false,
            };
            if recipient_in_supply {
                self.monetary.record_monetary_expansion(
                    leg.amount,
                    "estate_distribution",
                    &leg.currency,
                    tick,
                );
            }

            let tx = Transaction::new(
                settlement_id.to_string(),
                leg.recipient_id.clone(),
                leg.amount,
                leg.currency.clone(),
                tick,
            )
            .with_market("estate".to_string())
            .with_transaction_type(TransactionType::Escrow)
            .with_memo("estate distribution");
            self.log.push(tx.clone());
            distributed.push(tx);
        }

        for leg in &plan.portfolio_legs {
            let escrow = self
                .escrows
                .get_mut(settlement_id)
                .expect("escrow presence checked above");
            let available = escrow.portfolio.get(&leg.item_id).copied().unwrap_or(0);
            if available < leg.quantity || !accounts.contains(&leg.recipient_id) {
                skipped += 1;
                continue;
            }

            *escrow.portfolio.entry(leg.item_id.clone()).or_insert(0) -= leg.quantity;
            if let Some(acct) = accounts.account_mut(&leg.recipient_id) {
                let mut items = BTreeMap::new();
                items.insert(leg.item_id.clone(), leg.quantity);
                acct.receive_portfolio(items);
            }
        }

        Ok(DistributionReport {
            distributed,
            skipped_legs: skipped,
        })
    }

    /// Close an estate settlement.
    ///
    /// Returns `true` and status CLOSED when the escrow is fully drained;
    /// otherwise closes it as CLOSED_WITH_LEAK, logs the residue, and
    /// returns `false`. Residual assets stay visible on the closed record.
    pub fn verify_and_close(
        &mut self,
        settlement_id: &str,
        tick: usize,
    ) -> Result<bool, SettlementError> {
        let escrow = self.escrows.get_mut(settlement_id).ok_or_else(|| {
            SettlementError::SettlementAccountNotFound {
                id: settlement_id.to_string(),
            }
        })?;
        if escrow.status != EscrowStatus::Open {
            return Err(SettlementError::SettlementAccountClosed {
                id: settlement_id.to_string(),
            });
        }

        escrow.closed_tick = Some(tick);
        if escrow.is_drained() {
            escrow.status = EscrowStatus::Closed;
            self.events.log(FinancialEvent::EscrowClosed {
                tick,
                settlement_id: settlement_id.to_string(),
            });
            Ok(true)
        } else {
            escrow.status = EscrowStatus::ClosedWithLeak;
            let residual_cash = escrow.total_cash();
            let residual_items = escrow
                .portfolio
                .values()
                .filter(|&&q| q > 0)
                .count();
            self.events.log(FinancialEvent::EscrowLeak {
                tick,
                settlement_id: settlement_id.to_string(),
                residual_cash,
                residual_items,
            });
            Ok(false)
        }
    }

    /// Look up a settlement account by id
    pub fn settlement_account(&self, id: &str) -> Option<&SettlementAccount> {
        self.escrows.get(id)
    }
}
