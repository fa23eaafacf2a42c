//! Financial Orchestrator
//!
//! Composes the settlement engine, the monetary ledger, the stateless
//! financial engines and the verifier into the domain operations the
//! simulation loop consumes:
//!
//! ```text
//! For each tick t:
//! 1. process_loan_application (risk → booking pipeline)
//! 2. issue_treasury_bonds (QE or commercial buyer)
//! 3. request_bailout_loan (immutable command, applied elsewhere)
//! 4. service_debt (interest, principal, coupons, redemptions)
//! 5. evaluate_solvency (startup / established state machine)
//! 6. audit_integrity (observability, never control flow)
//! 7. advance_tick
//! ```
//!
//! The orchestrator owns the ledger, the account registry and the
//! settlement engine. Stateless engines work on snapshots; the
//! orchestrator applies a returned snapshot only after every side effect
//! that can fail has succeeded, so a failed operation leaves state
//! untouched.

use crate::engines::debt_service::{service_debt as run_debt_service, ServicingReport};
use crate::engines::lending::{book_loan, LendingError};
use crate::engines::liquidation::{
    liquidate_firm as run_liquidation, LiquidationError, LiquidationOutcome, LiquidationRequest,
};
use crate::engines::rates::apply_rate_rule;
use crate::engines::risk::{
    assess_loan_application, LoanApplication, RejectionReason, RiskDecision,
};
use crate::models::account::{
    Account, AccountRegistry, AccountRole, AccountSet, SettlementMember, DEFAULT_CURRENCY,
};
use crate::models::event::{EventLog, FinancialEvent};
use crate::models::ledger::Ledger;
use crate::models::transaction::{Transaction, TransactionType};
use crate::models::treasury::Bond;
use crate::monetary::{execute_batch, BatchError, CommandBatch};
use crate::settlement::engine::{
    FxMatch, SettlementEngine, SettlementError, TransferLeg,
};
use crate::verifier::check_ledger_integrity;
use thiserror::Error;

// ============================================================================
// Configuration Types
// ============================================================================

pub use crate::engines::liquidation::LiquidationConfig;
pub use crate::engines::rates::RateRuleConfig;
pub use crate::engines::risk::RiskConfig;
pub use crate::engines::debt_service::ServicingConfig;

/// Sovereign bond issuance parameters
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct BondIssueConfig {
    /// Yield floor before the debt load pushes it up
    pub base_yield: f64,

    /// Yield spread per unit of debt-to-GDP
    pub debt_to_gdp_sensitivity: f64,

    /// Yield above which the central bank steps in as buyer
    pub qe_yield_threshold: f64,

    /// Bond term in ticks
    pub term_ticks: usize,

    /// Currency bonds are denominated in
    pub currency: String,
}

impl Default for BondIssueConfig {
    fn default() -> Self {
        Self {
            base_yield: 0.03,
            debt_to_gdp_sensitivity: 0.02,
            qe_yield_threshold: 0.06,
            term_ticks: 365,
            currency: DEFAULT_CURRENCY.to_string(),
        }
    }
}

/// Bailout loan terms
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct BailoutConfig {
    /// Penalty premium on top of the distressed bank's base rate
    pub penalty_premium: f64,

    /// Bailout loan term in ticks
    pub term_ticks: usize,
}

impl Default for BailoutConfig {
    fn default() -> Self {
        Self {
            penalty_premium: 0.03,
            term_ticks: 365,
        }
    }
}

/// Solvency evaluation parameters
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct SolvencyConfig {
    /// Ticks of age below which the startup regime applies
    pub startup_grace_ticks: usize,

    /// Startup regime: cash must cover this many months of wages
    pub startup_cash_multiple: f64,

    /// Established regime: minimum acceptable Z-score
    pub z_score_threshold: f64,
}

impl Default for SolvencyConfig {
    fn default() -> Self {
        Self {
            startup_grace_ticks: 90,
            startup_cash_multiple: 3.0,
            z_score_threshold: 1.8,
        }
    }
}

/// Complete orchestrator configuration
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct OrchestratorConfig {
    pub risk: RiskConfig,
    pub liquidation: LiquidationConfig,
    pub servicing: ServicingConfig,
    pub rate_rule: RateRuleConfig,
    pub solvency: SolvencyConfig,
    pub bond_issue: BondIssueConfig,
    pub bailout: BailoutConfig,
}

// ============================================================================
// Errors
// ============================================================================

/// Errors surfaced by orchestrator operations
#[derive(Debug, Error, PartialEq)]
pub enum SimulationError {
    #[error("Unknown bank: {id}")]
    UnknownBank { id: String },

    #[error("No monetary authority account registered")]
    NoMonetaryAuthority,

    #[error("No government account registered")]
    NoGovernmentAccount,

    #[error("No system account registered to act as liquidation counterparty")]
    NoLiquidationCounterparty,

    #[error("GDP estimate must be positive, got {gdp}")]
    NonPositiveGdp { gdp: i64 },

    #[error("Settlement error: {0}")]
    Settlement(#[from] SettlementError),

    #[error("Lending error: {0}")]
    Lending(#[from] LendingError),

    #[error("Liquidation error: {0}")]
    Liquidation(#[from] LiquidationError),

    #[error("Batch error: {0}")]
    Batch(#[from] BatchError),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("State validation error: {0}")]
    StateValidationError(String),
}

// ============================================================================
// Domain Results
// ============================================================================

/// Summary of a booked loan
#[derive(Debug, Clone, PartialEq)]
pub struct LoanSummary {
    pub loan_id: String,
    pub lender_id: String,
    pub borrower_id: String,
    pub principal: i64,
    pub interest_rate: f64,
    pub due_tick: usize,
}

/// Outcome of the loan application pipeline
#[derive(Debug, Clone, PartialEq)]
pub enum LoanDecision {
    Approved {
        summary: LoanSummary,
        transactions: Vec<Transaction>,
    },
    Rejected {
        reason: RejectionReason,
    },
}

/// A filled treasury bond sale
#[derive(Debug, Clone, PartialEq)]
pub struct BondSale {
    pub bond_id: String,
    pub buyer_id: String,
    pub amount: i64,
    pub yield_rate: f64,
    /// Whether the central bank bought (yield above the QE threshold)
    pub quantitative_easing: bool,
    pub transactions: Vec<Transaction>,
}

/// A covenant attached to a bailout loan
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum Covenant {
    SuspendDividends,
    RestrictNewLending { max_loan_to_reserve_ratio: f64 },
    RepayBy { tick: usize },
}

/// Immutable description of an intended bailout loan.
///
/// The orchestrator never applies this itself; the caller applies it
/// transactionally wherever the bank-resolution flow lives.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct BailoutCommand {
    pub borrower_bank_id: String,
    pub lender_id: String,
    pub amount_pennies: i64,
    pub interest_rate: f64,
    pub due_tick: usize,
    pub covenants: Vec<Covenant>,
    pub issued_tick: usize,
}

/// Which solvency regime applied
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolvencyRegime {
    Startup,
    Established,
}

/// Firm financials snapshot consumed by the solvency evaluation
#[derive(Debug, Clone, PartialEq)]
pub struct SolvencyInput {
    pub firm_id: String,
    pub age_ticks: usize,
    pub cash_pennies: i64,
    pub monthly_wage_bill_pennies: i64,
    pub working_capital_pennies: i64,
    pub total_assets_pennies: i64,
    pub retained_earnings_pennies: i64,
    pub average_profit_pennies: i64,
}

/// Solvency evaluation result
#[derive(Debug, Clone, PartialEq)]
pub struct SolvencyVerdict {
    pub solvent: bool,
    pub regime: SolvencyRegime,
    /// Altman-style score; None in the startup regime
    pub z_score: Option<f64>,
}

/// Result of a firm liquidation, with its settled cash legs
#[derive(Debug, Clone, PartialEq)]
pub struct LiquidationSummary {
    pub outcome: LiquidationOutcome,
    pub transactions: Vec<Transaction>,
}

// ============================================================================
// Orchestrator
// ============================================================================

/// Owns the ledger, the account registry and the settlement engine, and
/// exposes the domain operations consumed by the simulation loop.
pub struct FinancialOrchestrator {
    config: OrchestratorConfig,
    ledger: Ledger,
    accounts: AccountSet,
    engine: SettlementEngine,
}

impl FinancialOrchestrator {
    /// Bootstrap the ledger from live account balances.
    ///
    /// Called once at simulation start: every Bank-role account seeds a
    /// bank whose reserves mirror its settlement balance (booked as
    /// equity), the Government account seeds the treasury, and the
    /// expected-M2 baseline is set to the live money-supply balance so
    /// expected and actual start in agreement.
    pub fn bootstrap(config: OrchestratorConfig, accounts: AccountSet) -> Self {
        let mut ledger = Ledger::new();
        for member in accounts.members() {
            match member.role() {
                AccountRole::Bank => {
                    let mut bank =
                        crate::models::bank::Bank::new(member.id().to_string(), config.rate_rule.base_rate);
                    for (currency, &balance) in member.balances() {
                        bank.adjust_reserves(balance, currency);
                    }
                    // Opening reserves are equity: identity holds from tick 0
                    let opening = bank.reserves(DEFAULT_CURRENCY);
                    bank.adjust_retained_earnings(opening);
                    ledger.add_bank(bank);
                }
                AccountRole::Government => {
                    for (currency, &balance) in member.balances() {
                        ledger.treasury_mut().adjust_balance(balance, currency);
                    }
                }
                _ => {}
            }
        }

        let mut engine = SettlementEngine::new();
        let currencies: std::collections::BTreeSet<String> = accounts
            .members()
            .flat_map(|m| m.balances().keys().cloned())
            .collect();
        for currency in currencies {
            let actual = accounts.money_supply_balance(&currency);
            engine.monetary_mut().seed_expected_m2(actual, &currency);
        }

        Self {
            config,
            ledger,
            accounts,
            engine,
        }
    }

    /// Get the ledger
    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    /// Get the account registry
    pub fn accounts(&self) -> &AccountSet {
        &self.accounts
    }

    /// Get the settlement engine (transaction log, events, monetary ledger)
    pub fn settlement(&self) -> &SettlementEngine {
        &self.engine
    }

    /// Split borrow of the settlement engine and the account registry, for
    /// callers driving settlement operations directly
    pub fn settlement_parts(&mut self) -> (&mut SettlementEngine, &mut AccountSet) {
        (&mut self.engine, &mut self.accounts)
    }

    /// Register a new settlement participant
    pub fn register_account(&mut self, member: SettlementMember) {
        self.accounts.register(member);
    }

    /// Current tick
    pub fn tick(&self) -> usize {
        self.ledger.tick()
    }

    /// Advance the tick by one
    pub fn advance_tick(&mut self) {
        self.ledger.advance_tick();
    }

    /// Convenience transfer at the current tick.
    ///
    /// Keeps the ledger mirrors (treasury balance, bank reserves) in step
    /// with the settlement accounts they shadow.
    pub fn transfer(
        &mut self,
        debtor: &str,
        creditor: &str,
        amount: i64,
        memo: &str,
        currency: &str,
    ) -> Result<Transaction, SimulationError> {
        let tick = self.ledger.tick();
        let tx = self
            .engine
            .transfer(&mut self.accounts, debtor, creditor, amount, memo, currency, tick)?;
        self.sync_ledger_mirrors(std::slice::from_ref(&tx));
        Ok(tx)
    }

    /// Execute a command batch at the current tick
    pub fn execute_batch(&mut self, batch: &CommandBatch) -> Result<Vec<Transaction>, SimulationError> {
        let transactions = execute_batch(&mut self.engine, &mut self.accounts, batch)?;
        self.sync_ledger_mirrors(&transactions);
        Ok(transactions)
    }

    /// Execute an FX swap
    pub fn execute_swap(
        &mut self,
        fx: &FxMatch,
    ) -> Result<(Transaction, Transaction), SimulationError> {
        let (leg_a, leg_b) = self.engine.execute_swap(&mut self.accounts, fx)?;
        self.sync_ledger_mirrors(&[leg_a.clone(), leg_b.clone()]);
        Ok((leg_a, leg_b))
    }

    /// Mirror settled cash flows onto the ledger-side books.
    ///
    /// The treasury balance shadows the government settlement account;
    /// bank reserves shadow bank settlement accounts (with un-attributed
    /// flows booked against retained earnings so the accounting identity
    /// stays closed). Domain operations that already adjust the ledger
    /// themselves (bond issuance, debt servicing, liquidation) bypass
    /// this and keep their explicit handling.
    fn sync_ledger_mirrors(&mut self, transactions: &[Transaction]) {
        for tx in transactions {
            self.apply_mirror(tx.buyer_id(), -tx.total_pennies(), tx.currency());
            self.apply_mirror(tx.seller_id(), tx.total_pennies(), tx.currency());
        }
    }

    fn apply_mirror(&mut self, account_id: &str, delta: i64, currency: &str) {
        if let Some(bank) = self.ledger.bank_mut(account_id) {
            bank.adjust_reserves(delta, currency);
            if currency == DEFAULT_CURRENCY {
                bank.adjust_retained_earnings(delta);
            }
            return;
        }
        let is_government = self
            .accounts
            .get(account_id)
            .map(|m| m.role() == AccountRole::Government)
            .unwrap_or(false);
        if is_government {
            self.ledger.treasury_mut().adjust_balance(delta, currency);
        }
    }

    // ------------------------------------------------------------------
    // Loan pipeline
    // ------------------------------------------------------------------

    /// Run the risk → booking pipeline for a loan application.
    ///
    /// On approval the ledger snapshot is applied, the conjured deposit is
    /// recorded as monetary expansion, and the `credit_creation`
    /// transaction joins the audit log.
    pub fn process_loan_application(
        &mut self,
        app: &LoanApplication,
    ) -> Result<LoanDecision, SimulationError> {
        match assess_loan_application(&self.ledger, app, &self.config.risk) {
            RiskDecision::Rejected { reason } => Ok(LoanDecision::Rejected { reason }),
            RiskDecision::Approved { interest_rate, .. } => {
                let tick = self.ledger.tick();
                let (next, loan, transactions) =
                    book_loan(&self.ledger, app, interest_rate, tick)?;

                self.ledger = next;
                self.engine.monetary_mut().record_monetary_expansion(
                    app.amount_pennies,
                    "credit_creation",
                    DEFAULT_CURRENCY,
                    tick,
                );
                self.engine.monetary_mut().record_system_debt_increase(
                    app.amount_pennies,
                    "loan_booking",
                    tick,
                );
                self.engine.record_transactions(transactions.clone());

                Ok(LoanDecision::Approved {
                    summary: LoanSummary {
                        loan_id: loan.id().to_string(),
                        lender_id: loan.lender_id().to_string(),
                        borrower_id: loan.borrower_id().to_string(),
                        principal: loan.principal(),
                        interest_rate: loan.interest_rate(),
                        due_tick: loan.due_tick(),
                    },
                    transactions,
                })
            }
        }
    }

    // ------------------------------------------------------------------
    // Sovereign debt
    // ------------------------------------------------------------------

    /// Issue treasury bonds for `amount` pennies.
    ///
    /// The resulting yield is `base + sensitivity × debt/GDP`. When it
    /// exceeds the QE threshold the central bank buys (it can always
    /// cover); otherwise the first commercial bank able to cover the
    /// amount buys. Returns `Ok(None)` when no buyer can cover it.
    pub fn issue_treasury_bonds(
        &mut self,
        amount: i64,
        gdp_estimate: i64,
    ) -> Result<Option<BondSale>, SimulationError> {
        if amount <= 0 {
            return Err(SettlementError::SchemaViolation {
                reason: format!("bond issue amount must be positive, got {}", amount),
            }
            .into());
        }
        if gdp_estimate <= 0 {
            return Err(SimulationError::NonPositiveGdp { gdp: gdp_estimate });
        }

        let tick = self.ledger.tick();
        let currency = self.config.bond_issue.currency.clone();
        let debt_after = self.ledger.treasury().outstanding_bond_debt() + amount;
        let debt_to_gdp = debt_after as f64 / gdp_estimate as f64;
        let yield_rate = self.config.bond_issue.base_yield
            + self.config.bond_issue.debt_to_gdp_sensitivity * debt_to_gdp;
        let quantitative_easing = yield_rate > self.config.bond_issue.qe_yield_threshold;

        let buyer_id = if quantitative_easing {
            match self.accounts.monetary_authority_id() {
                Some(id) => id,
                None => return Ok(None),
            }
        } else {
            let candidate = self
                .ledger
                .banks()
                .map(|b| b.id().to_string())
                .find(|id| {
                    self.accounts
                        .get(id)
                        .map(|a| a.balance(&currency) >= amount)
                        .unwrap_or(false)
                });
            match candidate {
                Some(id) => id,
                None => return Ok(None), // no buyer can cover the amount
            }
        };
        let government_id = self
            .accounts
            .first_with_role(AccountRole::Government)
            .map(|m| m.id().to_string())
            .ok_or(SimulationError::NoGovernmentAccount)?;

        // Cash leg first; the ledger is only touched once it settled
        let tx = self.engine.transfer_tagged(
            &mut self.accounts,
            &buyer_id,
            &government_id,
            amount,
            "bond purchase",
            &currency,
            TransactionType::BondPurchase,
            tick,
        )?;

        let bond_id = self.ledger.next_id("bond");
        self.ledger.treasury_mut().adjust_balance(amount, &currency);
        if let Some(bank) = self.ledger.bank_mut(&buyer_id) {
            bank.adjust_reserves(-amount, &currency);
        }
        self.ledger.treasury_mut().add_bond(Bond::new(
            bond_id.clone(),
            buyer_id.clone(),
            amount,
            yield_rate,
            tick,
            tick + self.config.bond_issue.term_ticks,
            currency,
        ));
        self.engine
            .monetary_mut()
            .record_system_debt_increase(amount, "bond_issuance", tick);

        Ok(Some(BondSale {
            bond_id,
            buyer_id,
            amount,
            yield_rate,
            quantitative_easing,
            transactions: vec![tx],
        }))
    }

    /// Build an immutable bailout command for a distressed bank.
    ///
    /// No state is mutated; the caller applies the command transactionally
    /// wherever bank resolution lives.
    pub fn request_bailout_loan(
        &self,
        bank_id: &str,
        amount: i64,
    ) -> Result<BailoutCommand, SimulationError> {
        let bank = self
            .ledger
            .bank(bank_id)
            .ok_or_else(|| SimulationError::UnknownBank {
                id: bank_id.to_string(),
            })?;
        let lender_id = self
            .accounts
            .monetary_authority_id()
            .ok_or(SimulationError::NoMonetaryAuthority)?;

        let tick = self.ledger.tick();
        let due_tick = tick + self.config.bailout.term_ticks;
        Ok(BailoutCommand {
            borrower_bank_id: bank_id.to_string(),
            lender_id,
            amount_pennies: amount,
            interest_rate: bank.base_rate() + self.config.bailout.penalty_premium,
            due_tick,
            covenants: vec![
                Covenant::SuspendDividends,
                Covenant::RestrictNewLending {
                    max_loan_to_reserve_ratio: 10.0,
                },
                Covenant::RepayBy { tick: due_tick },
            ],
            issued_tick: tick,
        })
    }

    // ------------------------------------------------------------------
    // Solvency
    // ------------------------------------------------------------------

    /// Evaluate a firm's solvency.
    ///
    /// Startup regime (age below the grace period): pass iff cash covers
    /// the configured multiple of the monthly wage bill. Established
    /// regime: Altman-style `Z = 1.2·x1 + 1.4·x2 + 3.3·x3` against the
    /// configured threshold.
    pub fn evaluate_solvency(&self, input: &SolvencyInput) -> SolvencyVerdict {
        if input.age_ticks < self.config.solvency.startup_grace_ticks {
            let required =
                self.config.solvency.startup_cash_multiple * input.monthly_wage_bill_pennies as f64;
            return SolvencyVerdict {
                solvent: input.cash_pennies as f64 >= required,
                regime: SolvencyRegime::Startup,
                z_score: None,
            };
        }

        if input.total_assets_pennies <= 0 {
            return SolvencyVerdict {
                solvent: false,
                regime: SolvencyRegime::Established,
                z_score: None,
            };
        }

        let assets = input.total_assets_pennies as f64;
        let x1 = input.working_capital_pennies as f64 / assets;
        let x2 = input.retained_earnings_pennies as f64 / assets;
        let x3 = input.average_profit_pennies as f64 / assets;
        let z = 1.2 * x1 + 1.4 * x2 + 3.3 * x3;

        SolvencyVerdict {
            solvent: z >= self.config.solvency.z_score_threshold,
            regime: SolvencyRegime::Established,
            z_score: Some(z),
        }
    }

    // ------------------------------------------------------------------
    // Debt servicing
    // ------------------------------------------------------------------

    /// Service every loan and bond for the current tick.
    ///
    /// Applies the engine's snapshot, records the deposit money destroyed
    /// by interest and repayments as contraction, settles the bond cash
    /// legs (treasury → holder), and logs skipped coupons.
    pub fn service_debt(&mut self) -> Result<ServicingReport, SimulationError> {
        let tick = self.ledger.tick();
        let (next, report, transactions) = run_debt_service(&self.ledger, &self.config.servicing);

        let needs_government = !report.coupons.is_empty() || !report.redemptions.is_empty();
        let government_id = if needs_government {
            Some(
                self.accounts
                    .first_with_role(AccountRole::Government)
                    .map(|m| m.id().to_string())
                    .ok_or(SimulationError::NoGovernmentAccount)?,
            )
        } else {
            None
        };

        self.ledger = next;
        self.engine.record_transactions(transactions);

        if report.deposit_money_destroyed > 0 {
            self.engine.monetary_mut().record_monetary_contraction(
                report.deposit_money_destroyed,
                "debt_service",
                DEFAULT_CURRENCY,
                tick,
            );
        }
        if report.principal_repaid > 0 {
            self.engine.monetary_mut().record_system_debt_decrease(
                report.principal_repaid,
                "loan_repayment",
                tick,
            );
        }

        // Settle the treasury's cash legs (the ledger mirror was already
        // adjusted by the engine)
        if let Some(government_id) = government_id {
            for coupon in &report.coupons {
                self.engine.transfer_tagged(
                    &mut self.accounts,
                    &government_id,
                    &coupon.owner_id,
                    coupon.amount,
                    "bond coupon",
                    &coupon.currency,
                    TransactionType::BondInterest,
                    tick,
                )?;
            }
            for redemption in &report.redemptions {
                self.engine.transfer_tagged(
                    &mut self.accounts,
                    &government_id,
                    &redemption.owner_id,
                    redemption.amount,
                    "bond redemption",
                    &redemption.currency,
                    TransactionType::BondRedemption,
                    tick,
                )?;
                self.engine.monetary_mut().record_system_debt_decrease(
                    redemption.amount,
                    "bond_redemption",
                    tick,
                );
            }
        }
        for skipped in &report.skipped_coupons {
            self.engine.events.log(FinancialEvent::CouponSkipped {
                tick,
                bond_id: skipped.bond_id.clone(),
                owner_id: skipped.owner_id.clone(),
                amount: skipped.amount,
            });
        }

        Ok(report)
    }

    // ------------------------------------------------------------------
    // Liquidation
    // ------------------------------------------------------------------

    /// Wind up a firm: fire-sale its inventory, repay its loans in
    /// encountered order, write off any shortfall, and route residual
    /// proceeds to the equity holder (or the government when none exists).
    ///
    /// The cash legs settle atomically before the ledger snapshot is
    /// applied; a failed settlement leaves everything untouched.
    pub fn liquidate_firm(
        &mut self,
        request: &LiquidationRequest,
    ) -> Result<LiquidationSummary, SimulationError> {
        let tick = self.ledger.tick();
        let (next, outcome, ledger_transactions) =
            run_liquidation(&self.ledger, request, &self.config.liquidation)?;

        // The fire-sale buyer is the system account (or the monetary
        // authority as a fallback); it is overdraft-exempt, so the sale
        // leg always settles.
        let buyer_id = self
            .accounts
            .first_with_role(AccountRole::System)
            .map(|m| m.id().to_string())
            .or_else(|| self.accounts.monetary_authority_id())
            .ok_or(SimulationError::NoLiquidationCounterparty)?;

        let mut legs = Vec::new();
        if outcome.proceeds > 0 {
            legs.push(TransferLeg {
                debtor: buyer_id,
                creditor: request.firm_id.clone(),
                amount: outcome.proceeds,
                memo: "liquidation_sale".to_string(),
            });
        }
        for repayment in &outcome.repayments {
            legs.push(TransferLeg {
                debtor: request.firm_id.clone(),
                creditor: repayment.bank_id.clone(),
                amount: repayment.amount,
                memo: "liquidation_repayment".to_string(),
            });
        }
        if outcome.residual_pennies > 0 {
            let recipient = outcome.equity_holder_id.clone().or_else(|| {
                self.accounts
                    .first_with_role(AccountRole::Government)
                    .map(|m| m.id().to_string())
            });
            if let Some(recipient) = recipient {
                legs.push(TransferLeg {
                    debtor: request.firm_id.clone(),
                    creditor: recipient,
                    amount: outcome.residual_pennies,
                    memo: "liquidation_residual".to_string(),
                });
            }
        }

        let mut transactions =
            self.engine
                .execute_multiparty_settlement(&mut self.accounts, &legs, DEFAULT_CURRENCY, tick)?;

        // Settlement succeeded: apply the ledger snapshot and the
        // book-only records (write-offs have no cash leg)
        self.ledger = next;
        let writeoff_transactions: Vec<Transaction> = ledger_transactions
            .into_iter()
            .filter(|t| t.transaction_type() == TransactionType::LoanWriteoff)
            .collect();
        self.engine
            .record_transactions(writeoff_transactions.clone());
        for writeoff in &outcome.writeoffs {
            self.engine.events.log(FinancialEvent::LoanDefault {
                tick,
                loan_id: writeoff.loan_id.clone(),
                bank_id: writeoff.bank_id.clone(),
                writeoff: writeoff.amount,
            });
        }
        transactions.extend(writeoff_transactions);

        Ok(LiquidationSummary {
            outcome,
            transactions,
        })
    }

    // ------------------------------------------------------------------
    // Rates, audit, money supply
    // ------------------------------------------------------------------

    /// Apply the rate rule to every bank; returns the rate that was set
    pub fn set_bank_rates(&mut self, inflation: f64) -> f64 {
        let (next, rate) = apply_rate_rule(&self.ledger, inflation, &self.config.rate_rule);
        self.ledger = next;
        rate
    }

    /// Audit ledger integrity, logging every violation with its exact
    /// discrepancy. Returns whether the ledger is clean; never panics.
    pub fn audit_integrity(&mut self) -> bool {
        let tick = self.ledger.tick();
        let violations = check_ledger_integrity(&self.ledger);
        for violation in &violations {
            self.engine.events.log(FinancialEvent::IntegrityViolation {
                tick,
                bank_id: violation.bank_id().to_string(),
                description: violation.to_string(),
                discrepancy: violation.discrepancy(),
            });
        }
        violations.is_empty()
    }

    /// Complete actual M2: live supply-account balances plus bank deposit
    /// money (which lives in the ledger, not in settlement accounts)
    pub fn actual_m2(&self, currency: &str) -> i64 {
        let mut total = self.accounts.money_supply_balance(currency);
        if currency == DEFAULT_CURRENCY {
            total += self.ledger.total_deposit_money();
        }
        total
    }

    /// Drift between actual and expected M2 (zero when every change went
    /// through a sanctioned path)
    pub fn m2_drift(&self, currency: &str) -> i64 {
        self.actual_m2(currency) - self.engine.monetary().expected_m2(currency)
    }

    /// Audit events from the settlement engine
    pub fn events(&self) -> &EventLog {
        self.engine.events()
    }

    /// Orchestrator configuration
    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }
}
