//! Liquidation engine
//!
//! Winds up a firm against a ledger snapshot: sells remaining inventory at
//! a fixed discount (integer division, no rounding up), applies the
//! proceeds against the firm's outstanding loans in the order encountered,
//! marks any shortfall as defaulted with the unpaid remainder written off
//! against the lending bank's retained earnings (an equity loss), and
//! reports any residual proceeds for distribution to equity holders.
//!
//! Loan payoff order is issuance order — banks in id order, loans within a
//! bank in book order. No seniority or rate ranking is applied.
//!
//! Pure snapshot-in / snapshot-out: the caller routes the cash legs (sale
//! proceeds, repayments, residual) through the settlement engine.

use crate::models::account::DEFAULT_CURRENCY;
use crate::models::ledger::Ledger;
use crate::models::transaction::{Transaction, TransactionType};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A liquidation request submitted by a collaborator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LiquidationRequest {
    /// Firm being wound up
    pub firm_id: String,

    /// Book value of remaining inventory (i64 pennies)
    pub inventory_value_pennies: i64,

    /// Item tag used on the sale transaction
    pub inventory_item_id: String,

    /// Units of inventory sold
    pub inventory_quantity: i64,

    /// Account receiving residual proceeds, if any equity holder exists
    pub equity_holder_id: Option<String>,
}

/// Liquidation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LiquidationConfig {
    /// Fire-sale discount in percent (50 = inventory fetches half its value)
    pub discount_pct: u32,
}

impl Default for LiquidationConfig {
    fn default() -> Self {
        Self { discount_pct: 50 }
    }
}

/// Errors surfaced by the liquidation engine
#[derive(Debug, Error, PartialEq)]
pub enum LiquidationError {
    #[error("Inventory value must be non-negative, got {amount}")]
    NegativeInventoryValue { amount: i64 },

    #[error("Discount must be at most 100 percent, got {discount_pct}")]
    InvalidDiscount { discount_pct: u32 },
}

/// One loan repayment funded by liquidation proceeds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LiquidationRepayment {
    pub loan_id: String,
    pub bank_id: String,
    pub amount: i64,
}

/// One defaulted loan written off against the lender's equity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LiquidationWriteoff {
    pub loan_id: String,
    pub bank_id: String,
    pub amount: i64,
}

/// Outcome of a liquidation pass
#[derive(Debug, Clone, PartialEq)]
pub struct LiquidationOutcome {
    /// Fire-sale proceeds (discounted inventory value)
    pub proceeds: i64,

    /// Repayments applied, in payoff order
    pub repayments: Vec<LiquidationRepayment>,

    /// Write-offs charged to lender equity
    pub writeoffs: Vec<LiquidationWriteoff>,

    /// Proceeds left after all loans were serviced
    pub residual_pennies: i64,

    /// Where the residual should be routed
    pub equity_holder_id: Option<String>,
}

/// Liquidate a firm against the ledger.
///
/// Proceeds = `inventory_value × (100 − discount) / 100` with integer
/// division. Returns the new ledger snapshot, the structured outcome, and
/// the ledger-side transactions (repayments and write-offs); the caller
/// settles the cash legs.
///
/// # Example
/// ```
/// use economy_simulator_core_rs::engines::liquidation::{
///     liquidate_firm, LiquidationConfig, LiquidationRequest,
/// };
/// use economy_simulator_core_rs::models::bank::{Bank, Loan};
/// use economy_simulator_core_rs::models::ledger::Ledger;
///
/// let mut ledger = Ledger::new();
/// let mut bank = Bank::new("BANK_A".to_string(), 0.03);
/// let loan_id = ledger.next_id("loan");
/// bank.add_loan(Loan::new(
///     loan_id, "FIRM_1".to_string(), "BANK_A".to_string(), 40_000, 0.05, 0, 100,
/// ));
/// ledger.add_bank(bank);
///
/// let request = LiquidationRequest {
///     firm_id: "FIRM_1".to_string(),
///     inventory_value_pennies: 50_000,
///     inventory_item_id: "inventory".to_string(),
///     inventory_quantity: 1,
///     equity_holder_id: None,
/// };
///
/// let (next, outcome, _txs) =
///     liquidate_firm(&ledger, &request, &LiquidationConfig::default()).unwrap();
///
/// assert_eq!(outcome.proceeds, 25_000);            // 50% discount
/// assert_eq!(outcome.repayments[0].amount, 25_000); // capped at proceeds
/// assert_eq!(outcome.writeoffs[0].amount, 15_000);  // unpaid remainder
/// assert_eq!(next.bank("BANK_A").unwrap().retained_earnings(), -15_000);
/// ```
pub fn liquidate_firm(
    ledger: &Ledger,
    request: &LiquidationRequest,
    config: &LiquidationConfig,
) -> Result<(Ledger, LiquidationOutcome, Vec<Transaction>), LiquidationError> {
    if request.inventory_value_pennies < 0 {
        return Err(LiquidationError::NegativeInventoryValue {
            amount: request.inventory_value_pennies,
        });
    }
    if config.discount_pct > 100 {
        return Err(LiquidationError::InvalidDiscount {
            discount_pct: config.discount_pct,
        });
    }

    // Fire-sale proceeds: integer division, never rounded up
    let proceeds =
        request.inventory_value_pennies * (100 - config.discount_pct as i64) / 100;

    let mut next = ledger.clone();
    let tick = next.tick();
    let mut remaining_proceeds = proceeds;
    let mut repayments = Vec::new();
    let mut writeoffs = Vec::new();
    let mut transactions = Vec::new();

    // Collect the firm's open loans in encountered order
    let open_loans: Vec<(String, String)> = next
        .banks()
        .flat_map(|bank| {
            bank.loans()
                .filter(|l| l.borrower_id() == request.firm_id && l.is_active())
                .map(|l| (bank.id().to_string(), l.id().to_string()))
                .collect::<Vec<_>>()
        })
        .collect();

    for (bank_id, loan_id) in open_loans {
        let bank = next.bank_mut(&bank_id).expect("bank enumerated above");

        let outstanding = bank
            .loan(&loan_id)
            .expect("loan enumerated above")
            .remaining_principal();
        let repayment = outstanding.min(remaining_proceeds);

        if repayment > 0 {
            bank.loan_mut(&loan_id)
                .expect("loan enumerated above")
                .repay(repayment)
                .expect("repayment capped at remaining principal");
            bank.adjust_reserves(repayment, DEFAULT_CURRENCY);
            remaining_proceeds -= repayment;

            repayments.push(LiquidationRepayment {
                loan_id: loan_id.clone(),
                bank_id: bank_id.clone(),
                amount: repayment,
            });
            transactions.push(
                Transaction::new(
                    request.firm_id.clone(),
                    bank_id.clone(),
                    repayment,
                    DEFAULT_CURRENCY.to_string(),
                    tick,
                )
                .with_market("liquidation".to_string())
                .with_transaction_type(TransactionType::LoanRepayment)
                .with_metadata("loan_id", &loan_id),
            );
        }

        // Anything left on the loan is a shortfall: default and write off
        let shortfall = bank
            .loan(&loan_id)
            .expect("loan enumerated above")
            .remaining_principal();
        if shortfall > 0 {
            let writeoff = bank
                .loan_mut(&loan_id)
                .expect("loan enumerated above")
                .mark_defaulted()
                .expect("loan was active");
            bank.adjust_retained_earnings(-writeoff);

            writeoffs.push(LiquidationWriteoff {
                loan_id: loan_id.clone(),
                bank_id: bank_id.clone(),
                amount: writeoff,
            });
            transactions.push(
                Transaction::new(
                    bank_id.clone(),
                    request.firm_id.clone(),
                    writeoff,
                    DEFAULT_CURRENCY.to_string(),
                    tick,
                )
                .with_market("liquidation".to_string())
                .with_transaction_type(TransactionType::LoanWriteoff)
                .with_metadata("loan_id", &loan_id),
            );
        }
    }

    let outcome = LiquidationOutcome {
        proceeds,
        repayments,
        writeoffs,
        residual_pennies: remaining_proceeds,
        equity_holder_id: request.equity_holder_id.clone(),
    };
    Ok((next, outcome, transactions))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::bank::{Bank, Loan};
    use crate::verifier::verify_ledger_integrity;

    fn request(inventory_value: i64) -> LiquidationRequest {
        LiquidationRequest {
            firm_id: "FIRM_1".to_string(),
            inventory_value_pennies: inventory_value,
            inventory_item_id: "inventory".to_string(),
            inventory_quantity: 1,
            equity_holder_id: Some("HH_OWNER".to_string()),
        }
    }

    fn ledger_with_loan(principal: i64) -> Ledger {
        let mut ledger = Ledger::new();
        let mut bank = Bank::new("BANK_A".to_string(), 0.03);
        let loan_id = ledger.next_id("loan");
        bank.add_loan(Loan::new(
            loan_id,
            "FIRM_1".to_string(),
            "BANK_A".to_string(),
            principal,
            0.05,
            0,
            100,
        ));
        ledger.add_bank(bank);
        ledger
    }

    #[test]
    fn test_shortfall_written_off_against_equity() {
        // Inventory 50,000 → proceeds 25,000; loan 40,000 → 15,000 written off
        let ledger = ledger_with_loan(40_000);

        let (next, outcome, txs) =
            liquidate_firm(&ledger, &request(50_000), &LiquidationConfig::default()).unwrap();

        assert_eq!(outcome.proceeds, 25_000);
        assert_eq!(outcome.repayments.len(), 1);
        assert_eq!(outcome.repayments[0].amount, 25_000);
        assert_eq!(outcome.writeoffs.len(), 1);
        assert_eq!(outcome.writeoffs[0].amount, 15_000);
        assert_eq!(outcome.residual_pennies, 0);

        let bank = next.bank("BANK_A").unwrap();
        assert_eq!(bank.retained_earnings(), -15_000);
        assert_eq!(bank.reserves("USD"), 25_000);
        let loan = bank.loans().next().unwrap();
        assert!(loan.is_defaulted());
        assert_eq!(loan.remaining_principal(), 0);

        assert_eq!(txs.len(), 2);
        assert!(verify_ledger_integrity(&next));
    }

    #[test]
    fn test_residual_routes_to_equity_holder() {
        let ledger = ledger_with_loan(10_000);

        let (next, outcome, _) =
            liquidate_firm(&ledger, &request(50_000), &LiquidationConfig::default()).unwrap();

        assert_eq!(outcome.proceeds, 25_000);
        assert_eq!(outcome.repayments[0].amount, 10_000);
        assert!(outcome.writeoffs.is_empty());
        assert_eq!(outcome.residual_pennies, 15_000);
        assert_eq!(outcome.equity_holder_id.as_deref(), Some("HH_OWNER"));
        assert!(verify_ledger_integrity(&next));
    }

    #[test]
    fn test_payoff_follows_issuance_order() {
        let mut ledger = Ledger::new();
        let mut bank = Bank::new("BANK_A".to_string(), 0.03);
        let first = ledger.next_id("loan");
        let second = ledger.next_id("loan");
        bank.add_loan(Loan::new(
            first.clone(),
            "FIRM_1".to_string(),
            "BANK_A".to_string(),
            20_000,
            0.05,
            0,
            100,
        ));
        bank.add_loan(Loan::new(
            second.clone(),
            "FIRM_1".to_string(),
            "BANK_A".to_string(),
            20_000,
            0.09, // higher rate must NOT jump the queue
            0,
            100,
        ));
        ledger.add_bank(bank);

        let (_, outcome, _) =
            liquidate_firm(&ledger, &request(50_000), &LiquidationConfig::default()).unwrap();

        // 25,000 proceeds: first loan fully repaid, second gets the rest
        assert_eq!(outcome.repayments[0].loan_id, first);
        assert_eq!(outcome.repayments[0].amount, 20_000);
        assert_eq!(outcome.repayments[1].loan_id, second);
        assert_eq!(outcome.repayments[1].amount, 5_000);
        assert_eq!(outcome.writeoffs[0].loan_id, second);
        assert_eq!(outcome.writeoffs[0].amount, 15_000);
    }

    #[test]
    fn test_integer_division_never_rounds_up() {
        let ledger = ledger_with_loan(10_000);
        let (_, outcome, _) =
            liquidate_firm(&ledger, &request(33), &LiquidationConfig::default()).unwrap();

        // 33 × 50 / 100 = 16 (truncated), not 17
        assert_eq!(outcome.proceeds, 16);
    }

    #[test]
    fn test_firm_without_loans_yields_pure_residual() {
        let ledger = Ledger::new();
        let (_, outcome, txs) =
            liquidate_firm(&ledger, &request(50_000), &LiquidationConfig::default()).unwrap();

        assert_eq!(outcome.proceeds, 25_000);
        assert!(outcome.repayments.is_empty());
        assert_eq!(outcome.residual_pennies, 25_000);
        assert!(txs.is_empty());
    }
}
