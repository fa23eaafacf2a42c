//! Checkpoint - Save/Restore Ledger State
//!
//! Captures the complete bookkeeping state (ledger + live accounts) for
//! pause/resume and for audit trails across runs.
//!
//! # Critical Invariants
//!
//! - **Determinism**: the digest is computed over canonical JSON with
//!   sorted keys, so identical state always hashes identically
//! - **Conservation**: a snapshot can be validated against an expected
//!   total before it is accepted for restore

use crate::models::account::AccountSet;
use crate::models::ledger::Ledger;
use crate::orchestrator::engine::SimulationError;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Complete bookkeeping state snapshot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerSnapshot {
    /// Tick the snapshot was taken at
    pub tick: usize,

    /// Banking-system books
    pub ledger: Ledger,

    /// Live settlement accounts
    pub accounts: AccountSet,

    /// SHA-256 digest of the canonical snapshot encoding
    pub state_digest: String,
}

impl LedgerSnapshot {
    /// Capture a snapshot of the given state.
    pub fn capture(ledger: &Ledger, accounts: &AccountSet) -> Result<Self, SimulationError> {
        let state_digest = compute_state_digest(&(ledger, accounts))?;
        Ok(Self {
            tick: ledger.tick(),
            ledger: ledger.clone(),
            accounts: accounts.clone(),
            state_digest,
        })
    }

    /// Verify the stored digest still matches the snapshot's contents.
    pub fn verify_digest(&self) -> Result<bool, SimulationError> {
        let recomputed = compute_state_digest(&(&self.ledger, &self.accounts))?;
        Ok(recomputed == self.state_digest)
    }
}

/// Compute a deterministic SHA-256 digest of any serializable state.
///
/// Uses canonical JSON serialization with recursively sorted keys so the
/// digest does not depend on map iteration order.
pub fn compute_state_digest<T: Serialize>(state: &T) -> Result<String, SimulationError> {
    use serde_json::Value;
    use std::collections::BTreeMap;

    let value = serde_json::to_value(state).map_err(|e| {
        SimulationError::SerializationError(format!("State serialization failed: {}", e))
    })?;

    fn canonicalize(value: Value) -> Value {
        match value {
            Value::Object(map) => {
                let sorted: BTreeMap<String, Value> =
                    map.into_iter().map(|(k, v)| (k, canonicalize(v))).collect();
                Value::Object(sorted.into_iter().collect())
            }
            Value::Array(arr) => Value::Array(arr.into_iter().map(canonicalize).collect()),
            other => other,
        }
    }

    let canonical = canonicalize(value);
    let json = serde_json::to_string(&canonical).map_err(|e| {
        SimulationError::SerializationError(format!("State serialization failed: {}", e))
    })?;

    let mut hasher = Sha256::new();
    hasher.update(json.as_bytes());
    Ok(format!("{:x}", hasher.finalize()))
}

/// Validate snapshot conservation before accepting it for restore.
///
/// Checks that the total balance over all settlement accounts in the given
/// currency matches the expected figure recorded when the checkpoint was
/// scheduled.
pub fn validate_snapshot(
    snapshot: &LedgerSnapshot,
    currency: &str,
    expected_total_balance: i64,
) -> Result<(), SimulationError> {
    let total = snapshot.accounts.total_balance(currency);
    if total != expected_total_balance {
        return Err(SimulationError::StateValidationError(format!(
            "Balance conservation violated: expected {}, got {}",
            expected_total_balance, total
        )));
    }
    Ok(())
}
