//! Debt servicing engine
//!
//! Runs once per tick against a ledger snapshot:
//!
//! - Every active, non-defaulted loan accrues daily interest
//!   (`remaining × rate / 365`, rounded to the nearest penny), debited from
//!   the borrower's deposit when it covers the charge and credited to the
//!   lending bank's retained earnings. A deposit that cannot cover the
//!   interest is left untouched and the miss is counted.
//! - At the due tick, full principal repayment is attempted from the
//!   borrower's deposit, falling back to a partial repayment that drains
//!   the deposit. No automatic default is raised here; default is a
//!   separate concern.
//! - Treasury bonds are serviced the same tick: each bond pays a coupon
//!   (`face × yield / 365`, rounded) from the treasury balance to the
//!   holder, and matured bonds are redeemed at face. Coupons the treasury
//!   cannot cover are skipped and reported, not forced.
//!
//! Loan flows stay entirely inside the ledger and are emitted as
//! transactions here. Bond flows touch the treasury/reserve mirrors of
//! settlement accounts; their cash legs ride in the report and the
//! orchestrator settles and logs them.
//!
//! Pure snapshot-in / snapshot-out.

use crate::models::account::DEFAULT_CURRENCY;
use crate::models::ledger::Ledger;
use crate::models::transaction::{Transaction, TransactionType};
use serde::{Deserialize, Serialize};

/// Debt servicing configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServicingConfig {
    /// Days per year used for daily accrual
    pub days_per_year: f64,
}

impl Default for ServicingConfig {
    fn default() -> Self {
        Self { days_per_year: 365.0 }
    }
}

/// One bond coupon paid this tick
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CouponPayment {
    pub bond_id: String,
    pub owner_id: String,
    pub amount: i64,
    pub currency: String,
    /// Whether the holder is a ledger bank (reserves already credited)
    pub owner_is_ledger_bank: bool,
}

/// One bond coupon the treasury could not cover
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkippedCoupon {
    pub bond_id: String,
    pub owner_id: String,
    pub amount: i64,
}

/// One matured bond redeemed at face this tick
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BondRedemptionLeg {
    pub bond_id: String,
    pub owner_id: String,
    pub amount: i64,
    pub currency: String,
    pub owner_is_ledger_bank: bool,
}

/// Per-tick servicing summary
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ServicingReport {
    /// Interest collected into bank equity this tick
    pub interest_collected: i64,

    /// Loans whose borrowers could not cover the interest charge
    pub missed_interest_payments: usize,

    /// Principal repaid at due ticks (full and partial)
    pub principal_repaid: i64,

    /// Due loans that could only repay partially
    pub partial_repayments: usize,

    /// Total debited from deposits (interest + principal); this is deposit
    /// money leaving circulation, recorded as contraction by the caller
    pub deposit_money_destroyed: i64,

    /// Coupons paid from the treasury
    pub coupons: Vec<CouponPayment>,

    /// Coupons skipped for lack of treasury balance
    pub skipped_coupons: Vec<SkippedCoupon>,

    /// Matured bonds redeemed at face
    pub redemptions: Vec<BondRedemptionLeg>,
}

/// Daily accrual on an outstanding amount, rounded to the nearest penny
fn daily_accrual(outstanding: i64, annual_rate: f64, days_per_year: f64) -> i64 {
    (outstanding as f64 * annual_rate / days_per_year).round() as i64
}

/// Service every loan and treasury bond for the ledger's current tick.
///
/// # Example
/// ```
/// use economy_simulator_core_rs::engines::debt_service::{service_debt, ServicingConfig};
/// use economy_simulator_core_rs::models::bank::Bank;
/// use economy_simulator_core_rs::models::ledger::Ledger;
/// use economy_simulator_core_rs::models::treasury::Bond;
///
/// let mut ledger = Ledger::new();
/// ledger.add_bank(Bank::new("BANK_A".to_string(), 0.03));
/// ledger.treasury_mut().adjust_balance(1_000_000, "USD");
/// let bond_id = ledger.next_id("bond");
/// ledger.treasury_mut().add_bond(Bond::new(
///     bond_id, "BANK_A".to_string(), 100_000, 0.05, 0, 365, "USD".to_string(),
/// ));
///
/// let (next, report, _txs) = service_debt(&ledger, &ServicingConfig::default());
///
/// // 100,000 × 0.05 / 365 ≈ 13.7 → 14 pennies
/// assert_eq!(report.coupons[0].amount, 14);
/// assert_eq!(next.treasury().balance("USD"), 999_986);
/// ```
pub fn service_debt(
    ledger: &Ledger,
    config: &ServicingConfig,
) -> (Ledger, ServicingReport, Vec<Transaction>) {
    let mut next = ledger.clone();
    let tick = next.tick();
    let mut report = ServicingReport::default();
    let mut transactions = Vec::new();

    // ------------------------------------------------------------------
    // Loan servicing: interest accrual, then due-tick principal
    // ------------------------------------------------------------------
    let bank_ids: Vec<String> = next.banks().map(|b| b.id().to_string()).collect();
    for bank_id in &bank_ids {
        let loan_ids: Vec<String> = next
            .bank(bank_id)
            .expect("bank enumerated above")
            .loans()
            .filter(|l| l.is_active())
            .map(|l| l.id().to_string())
            .collect();

        for loan_id in loan_ids {
            let bank = next.bank_mut(bank_id).expect("bank enumerated above");
            let (borrower_id, remaining, rate, due_tick) = {
                let loan = bank.loan(&loan_id).expect("loan enumerated above");
                (
                    loan.borrower_id().to_string(),
                    loan.remaining_principal(),
                    loan.interest_rate(),
                    loan.due_tick(),
                )
            };

            // Daily interest, paid only when the deposit fully covers it
            let interest = daily_accrual(remaining, rate, config.days_per_year);
            if interest > 0 {
                let covered = bank
                    .deposit_of(&borrower_id)
                    .map(|d| d.balance() >= interest)
                    .unwrap_or(false);
                if covered {
                    bank.deposit_of_mut(&borrower_id)
                        .expect("deposit located above")
                        .debit(interest)
                        .expect("coverage checked above");
                    bank.adjust_retained_earnings(interest);
                    report.interest_collected += interest;
                    report.deposit_money_destroyed += interest;

                    transactions.push(
                        Transaction::new(
                            borrower_id.clone(),
                            bank_id.clone(),
                            interest,
                            DEFAULT_CURRENCY.to_string(),
                            tick,
                        )
                        .with_market("credit".to_string())
                        .with_transaction_type(TransactionType::LoanInterest)
                        .with_metadata("loan_id", &loan_id),
                    );
                } else {
                    report.missed_interest_payments += 1;
                }
            }

            // Principal falls due: full repayment, else drain the deposit
            if tick >= due_tick && remaining > 0 {
                let available = bank
                    .deposit_of(&borrower_id)
                    .map(|d| d.balance())
                    .unwrap_or(0);
                let repayment = remaining.min(available);
                if repayment > 0 {
                    bank.deposit_of_mut(&borrower_id)
                        .expect("deposit located above")
                        .debit(repayment)
                        .expect("capped at deposit balance");
                    bank.loan_mut(&loan_id)
                        .expect("loan enumerated above")
                        .repay(repayment)
                        .expect("capped at remaining principal");
                    report.principal_repaid += repayment;
                    report.deposit_money_destroyed += repayment;
                    if repayment < remaining {
                        report.partial_repayments += 1;
                    }

                    transactions.push(
                        Transaction::new(
                            borrower_id.clone(),
                            bank_id.clone(),
                            repayment,
                            DEFAULT_CURRENCY.to_string(),
                            tick,
                        )
                        .with_market("credit".to_string())
                        .with_transaction_type(TransactionType::LoanRepayment)
                        .with_metadata("loan_id", &loan_id),
                    );
                } else if available == 0 {
                    report.partial_repayments += 1;
                }
            }
        }
    }

    // ------------------------------------------------------------------
    // Bond servicing: coupons, then redemption at maturity
    // ------------------------------------------------------------------
    let bond_ids: Vec<String> = next.treasury().bonds().map(|b| b.id().to_string()).collect();
    for bond_id in bond_ids {
        let (owner_id, face, yield_rate, currency, mature) = {
            let bond = next
                .treasury()
                .bond(&bond_id)
                .expect("bond enumerated above");
            (
                bond.owner_id().to_string(),
                bond.face_value(),
                bond.yield_rate(),
                bond.currency().to_string(),
                bond.is_mature(tick),
            )
        };
        let owner_is_ledger_bank = next.bank(&owner_id).is_some();

        let coupon = daily_accrual(face, yield_rate, config.days_per_year);
        if coupon > 0 {
            if next.treasury().balance(&currency) >= coupon {
                next.treasury_mut().adjust_balance(-coupon, &currency);
                if owner_is_ledger_bank {
                    let bank = next.bank_mut(&owner_id).expect("checked above");
                    // TODO: credit in bond.currency; coupon crediting
                    // currently assumes USD reserves
                    bank.adjust_reserves(coupon, DEFAULT_CURRENCY);
                    bank.adjust_retained_earnings(coupon);
                }
                report.coupons.push(CouponPayment {
                    bond_id: bond_id.clone(),
                    owner_id: owner_id.clone(),
                    amount: coupon,
                    currency: currency.clone(),
                    owner_is_ledger_bank,
                });
            } else {
                report.skipped_coupons.push(SkippedCoupon {
                    bond_id: bond_id.clone(),
                    owner_id: owner_id.clone(),
                    amount: coupon,
                });
            }
        }

        if mature && next.treasury().balance(&currency) >= face {
            next.treasury_mut().adjust_balance(-face, &currency);
            if owner_is_ledger_bank {
                let bank = next.bank_mut(&owner_id).expect("checked above");
                // Asset swap: bond holding becomes reserves, equity untouched
                bank.adjust_reserves(face, DEFAULT_CURRENCY);
            }
            next.treasury_mut().remove_bond(&bond_id);
            report.redemptions.push(BondRedemptionLeg {
                bond_id,
                owner_id,
                amount: face,
                currency,
                owner_is_ledger_bank,
            });
        }
    }

    (next, report, transactions)
}
