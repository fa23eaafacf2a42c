//! Stateless financial engines
//!
//! Pure functions over ledger snapshots:
//! `(ledger snapshot, request) -> (new ledger snapshot, transaction list)`.
//!
//! Engines never touch live account balances and never mutate their input
//! snapshot; the orchestrator applies a returned snapshot transactionally
//! (replace-on-success), so rollback across chained engine calls is a
//! structural guarantee rather than a convention.

pub mod debt_service;
pub mod lending;
pub mod liquidation;
pub mod rates;
pub mod risk;

pub use debt_service::{service_debt, ServicingConfig, ServicingReport};
pub use lending::{book_loan, LendingError};
pub use liquidation::{
    liquidate_firm, LiquidationConfig, LiquidationError, LiquidationOutcome, LiquidationRequest,
};
pub use rates::{apply_rate_rule, RateRuleConfig};
pub use risk::{
    assess_loan_application, LoanApplication, RejectionReason, RiskConfig, RiskDecision,
};
