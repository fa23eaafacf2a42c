//! FFI boundary (PyO3)
//!
//! Minimal, safe surface for the host simulation. Schema enforcement for
//! monetary amounts lives in `types`; the orchestrator wrapper lives in
//! `core`.

pub mod core;
pub mod types;

pub use self::core::PyFinancialCore;
