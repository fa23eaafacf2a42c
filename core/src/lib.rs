//! Economy Simulator Core - Financial Settlement & Ledger Engine
//!
//! Penny-exact, double-entry accounting core for an agent-based economic
//! simulator: records all money movement between agents, enforces zero-sum
//! conservation, supports atomic multi-party settlement with full
//! rollback, and tracks money-supply expansion and contraction.
//!
//! # Architecture
//!
//! - **models**: passive domain types (accounts, banks, treasury, ledger,
//!   transactions, audit events)
//! - **settlement**: the only component allowed to mutate live balances
//!   (transfers, atomic batches, mint/burn, FX swaps, estate escrow)
//! - **monetary**: expected-vs-actual money supply tracking and command
//!   batch execution
//! - **engines**: stateless financial engines (risk, lending,
//!   liquidation, debt servicing, rate setting) — pure snapshot to
//!   snapshot
//! - **verifier**: read-only integrity auditor
//! - **orchestrator**: domain operations consumed by the simulation loop
//!
//! # Critical Invariants
//!
//! 1. All money values are i64 (pennies); floating point never touches a
//!    balance
//! 2. Every credit traces to a debit or to an authorized, recorded
//!    mint/burn
//! 3. Multi-leg operations are atomic: any failed leg unwinds every prior
//!    leg before returning

// Module declarations
pub mod engines;
pub mod models;
pub mod monetary;
pub mod orchestrator;
pub mod settlement;
pub mod verifier;

// Re-exports for convenience
pub use engines::{
    apply_rate_rule, assess_loan_application, book_loan, liquidate_firm, service_debt,
    LiquidationConfig, LiquidationRequest, LoanApplication, RateRuleConfig, RiskConfig,
    RiskDecision, ServicingConfig,
};
pub use models::{
    Account, AccountRegistry, AccountRole, AccountSet, Bank, Bond, Deposit, EventLog,
    FinancialEvent, Ledger, Loan, SettlementMember, Transaction, TransactionType, Treasury,
    DEFAULT_CURRENCY,
};
pub use monetary::{execute_batch, BatchError, CommandBatch, MonetaryLedger};
pub use orchestrator::{
    BailoutCommand, FinancialOrchestrator, LedgerSnapshot, LoanDecision, OrchestratorConfig,
    SimulationError, SolvencyInput, SolvencyVerdict,
};
pub use settlement::{
    CreditLeg, DistributionPlan, EscrowStatus, FxMatch, SettlementEngine, SettlementError,
    TransferLeg,
};
pub use verifier::{check_ledger_integrity, system_financial_net_worth, verify_ledger_integrity};

// FFI module (when feature enabled)
#[cfg(feature = "pyo3")]
pub mod ffi;

// PyO3 exports (when feature enabled)
#[cfg(feature = "pyo3")]
use pyo3::prelude::*;

#[cfg(feature = "pyo3")]
#[pymodule]
fn economy_simulator_core_rs(_py: Python<'_>, m: &PyModule) -> PyResult<()> {
    m.add_class::<ffi::PyFinancialCore>()?;
    Ok(())
}
