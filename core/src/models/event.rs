//! Event logging for audit and replay.
//!
//! This module defines the FinancialEvent enum which captures significant
//! state changes that are not themselves money movements (those go to the
//! transaction log). Events enable:
//! - Auditing (every mint/burn and anomaly is traceable)
//! - Debugging (understand what happened and when)
//! - Drift analysis (compare recorded expansions against live balances)
//!
//! # Event Types
//!
//! - **Monetary**: money-supply expansion/contraction, system-debt changes
//! - **Anomaly**: clamped underflows, unpayable coupons
//! - **Integrity**: verifier violations with exact discrepancies
//! - **Escrow**: estate settlement lifecycle, including surfaced leaks

use serde::{Deserialize, Serialize};

/// Audit event capturing a non-transfer state change.
///
/// All events include a tick number for temporal ordering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FinancialEvent {
    /// Money supply grew through an authorized path
    MonetaryExpansion {
        tick: usize,
        amount: i64,
        currency: String,
        source: String,
    },

    /// Money supply shrank through an authorized path
    MonetaryContraction {
        tick: usize,
        amount: i64,
        currency: String,
        source: String,
    },

    /// Aggregate system debt increased
    SystemDebtIncrease {
        tick: usize,
        amount: i64,
        source: String,
    },

    /// Aggregate system debt decreased
    SystemDebtDecrease {
        tick: usize,
        amount: i64,
        source: String,
    },

    /// A debt decrease exceeded outstanding debt and was clamped to zero
    SystemDebtClamped {
        tick: usize,
        requested: i64,
        outstanding: i64,
        source: String,
    },

    /// Verifier found a broken invariant (exact discrepancy attached)
    IntegrityViolation {
        tick: usize,
        bank_id: String,
        description: String,
        discrepancy: i64,
    },

    /// Estate settlement account opened; decedent assets escrowed
    EscrowOpened {
        tick: usize,
        settlement_id: String,
        decedent_id: String,
        escrowed_cash: i64,
    },

    /// Estate settlement account closed clean (fully drained)
    EscrowClosed {
        tick: usize,
        settlement_id: String,
    },

    /// Estate settlement closed with undistributed assets remaining
    EscrowLeak {
        tick: usize,
        settlement_id: String,
        residual_cash: i64,
        residual_items: usize,
    },

    /// Loan marked defaulted; unpaid remainder written off against equity
    LoanDefault {
        tick: usize,
        loan_id: String,
        bank_id: String,
        writeoff: i64,
    },

    /// Bond coupon or redemption skipped (treasury could not cover it)
    CouponSkipped {
        tick: usize,
        bond_id: String,
        owner_id: String,
        amount: i64,
    },
}

impl FinancialEvent {
    /// Get the tick number when this event occurred
    pub fn tick(&self) -> usize {
        match self {
            FinancialEvent::MonetaryExpansion { tick, .. } => *tick,
            FinancialEvent::MonetaryContraction { tick, .. } => *tick,
            FinancialEvent::SystemDebtIncrease { tick, .. } => *tick,
            FinancialEvent::SystemDebtDecrease { tick, .. } => *tick,
            FinancialEvent::SystemDebtClamped { tick, .. } => *tick,
            FinancialEvent::IntegrityViolation { tick, .. } => *tick,
            FinancialEvent::EscrowOpened { tick, .. } => *tick,
            FinancialEvent::EscrowClosed { tick, .. } => *tick,
            FinancialEvent::EscrowLeak { tick, .. } => *tick,
            FinancialEvent::LoanDefault { tick, .. } => *tick,
            FinancialEvent::CouponSkipped { tick, .. } => *tick,
        }
    }

    /// Get a short description of the event type
    pub fn event_type(&self) -> &'static str {
        match self {
            FinancialEvent::MonetaryExpansion { .. } => "MonetaryExpansion",
            FinancialEvent::MonetaryContraction { .. } => "MonetaryContraction",
            FinancialEvent::SystemDebtIncrease { .. } => "SystemDebtIncrease",
            FinancialEvent::SystemDebtDecrease { .. } => "SystemDebtDecrease",
            FinancialEvent::SystemDebtClamped { .. } => "SystemDebtClamped",
            FinancialEvent::IntegrityViolation { .. } => "IntegrityViolation",
            FinancialEvent::EscrowOpened { .. } => "EscrowOpened",
            FinancialEvent::EscrowClosed { .. } => "EscrowClosed",
            FinancialEvent::EscrowLeak { .. } => "EscrowLeak",
            FinancialEvent::LoanDefault { .. } => "LoanDefault",
            FinancialEvent::CouponSkipped { .. } => "CouponSkipped",
        }
    }
}

/// Event log for storing and querying audit events.
///
/// This is a simple wrapper around Vec<FinancialEvent> with convenience
/// methods.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EventLog {
    events: Vec<FinancialEvent>,
}

impl EventLog {
    /// Create a new empty event log
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    /// Add an event to the log
    pub fn log(&mut self, event: FinancialEvent) {
        self.events.push(event);
    }

    /// Get the number of events logged
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Check if the log is empty
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Get all events
    pub fn events(&self) -> &[FinancialEvent] {
        &self.events
    }

    /// Get events for a specific tick
    pub fn events_at_tick(&self, tick: usize) -> Vec<&FinancialEvent> {
        self.events.iter().filter(|e| e.tick() == tick).collect()
    }

    /// Get events of a specific type
    pub fn events_of_type(&self, event_type: &str) -> Vec<&FinancialEvent> {
        self.events
            .iter()
            .filter(|e| e.event_type() == event_type)
            .collect()
    }

    /// Clear all events
    pub fn clear(&mut self) {
        self.events.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_tick() {
        let event = FinancialEvent::MonetaryExpansion {
            tick: 42,
            amount: 100_000,
            currency: "USD".to_string(),
            source: "qe_bond_purchase".to_string(),
        };

        assert_eq!(event.tick(), 42);
        assert_eq!(event.event_type(), "MonetaryExpansion");
    }

    #[test]
    fn test_log_and_query() {
        let mut log = EventLog::new();
        assert!(log.is_empty());

        log.log(FinancialEvent::SystemDebtClamped {
            tick: 3,
            requested: 500,
            outstanding: 200,
            source: "bond_redemption".to_string(),
        });
        log.log(FinancialEvent::EscrowClosed {
            tick: 4,
            settlement_id: "stl_00000001".to_string(),
        });

        assert_eq!(log.len(), 2);
        assert_eq!(log.events_at_tick(3).len(), 1);
        assert_eq!(log.events_of_type("EscrowClosed").len(), 1);
    }
}
