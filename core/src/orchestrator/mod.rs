//! Orchestrator - domain operations for the simulation loop
//!
//! See `engine.rs` for the operations and `checkpoint.rs` for state
//! capture/restore.

pub mod checkpoint;
pub mod engine;

// Re-export main types for convenience
pub use engine::{
    BailoutCommand, BailoutConfig, BondIssueConfig, BondSale, Covenant, FinancialOrchestrator,
    LiquidationSummary, LoanDecision, LoanSummary, OrchestratorConfig, SimulationError,
    SolvencyConfig, SolvencyInput, SolvencyRegime, SolvencyVerdict,
};

// Re-export checkpoint types
pub use checkpoint::{compute_state_digest, validate_snapshot, LedgerSnapshot};
