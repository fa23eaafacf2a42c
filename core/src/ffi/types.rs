//! Type conversion utilities for FFI boundary
//!
//! Converts between Rust types and PyO3-compatible types (PyDict, PyList).
//! This is where the integer-penny schema is enforced on input from the
//! host simulation: a fractional monetary amount is rejected here, before
//! anything reaches the ledger.

use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;
use pyo3::types::PyDict;

use crate::engines::risk::LoanApplication;
use crate::models::account::{AccountRole, SettlementMember};
use crate::models::transaction::Transaction;
use crate::orchestrator::engine::{
    BailoutCommand, BondSale, Covenant, LoanDecision, SolvencyInput, SolvencyRegime,
    SolvencyVerdict,
};

// ========================================================================
// PyDict Extraction Helpers
// ========================================================================

/// Extract a required field from a Python dict with clear error messages.
pub fn extract_required<'py, T: FromPyObject<'py>>(dict: &'py PyDict, key: &str) -> PyResult<T> {
    dict.get_item(key)?
        .ok_or_else(|| PyValueError::new_err(format!("Missing required field '{}'", key)))?
        .extract()
}

/// Extract a field with a default value if missing.
pub fn extract_with_default<'py, T: FromPyObject<'py>>(
    dict: &'py PyDict,
    key: &str,
    default: T,
) -> PyResult<T> {
    match dict.get_item(key)? {
        Some(value) => value.extract(),
        None => Ok(default),
    }
}

/// Convert a Python number to integer pennies.
///
/// Accepts ints directly. A float is accepted only when it carries no
/// fractional part — a non-integer monetary amount is a schema violation
/// and is rejected before any state can be touched.
pub fn pennies_from_py(value: &PyAny, field: &str) -> PyResult<i64> {
    if let Ok(int_value) = value.extract::<i64>() {
        return Ok(int_value);
    }
    let float_value: f64 = value.extract().map_err(|_| {
        PyValueError::new_err(format!("Field '{}' is not a number", field))
    })?;
    if float_value.fract() != 0.0 {
        return Err(PyValueError::new_err(format!(
            "Non-integer penny amount for '{}': {}",
            field, float_value
        )));
    }
    Ok(float_value as i64)
}

/// Parse an account role tag ("household", "firm", "bank", "government",
/// "central_bank", "system")
pub fn role_from_str(tag: &str) -> PyResult<AccountRole> {
    match tag {
        "household" => Ok(AccountRole::Household),
        "firm" => Ok(AccountRole::Firm),
        "bank" => Ok(AccountRole::Bank),
        "government" => Ok(AccountRole::Government),
        "central_bank" => Ok(AccountRole::CentralBank),
        "system" => Ok(AccountRole::System),
        other => Err(PyValueError::new_err(format!(
            "Unknown account role '{}'",
            other
        ))),
    }
}

// ========================================================================
// Configuration Parsers
// ========================================================================

/// Parse one account spec dict: `{id, role, balance?, currency?}`
pub fn parse_account_spec(dict: &PyDict) -> PyResult<SettlementMember> {
    let id: String = extract_required(dict, "id")?;
    let role_tag: String = extract_required(dict, "role")?;
    let role = role_from_str(&role_tag)?;
    let currency: String =
        extract_with_default(dict, "currency", crate::models::account::DEFAULT_CURRENCY.to_string())?;

    let balance = match dict.get_item("balance")? {
        Some(value) => pennies_from_py(value, "balance")?,
        None => 0,
    };

    if balance < 0 && !role.overdraft_exempt() {
        return Err(PyValueError::new_err(format!(
            "Negative opening balance {} for non-exempt account '{}'",
            balance, id
        )));
    }
    Ok(SettlementMember::with_balance(id, role, balance, &currency))
}

/// Parse a loan application dict
pub fn parse_loan_application(dict: &PyDict) -> PyResult<LoanApplication> {
    let amount = match dict.get_item("amount_pennies")? {
        Some(value) => pennies_from_py(value, "amount_pennies")?,
        None => return Err(PyValueError::new_err("Missing required field 'amount_pennies'")),
    };
    let monthly_income = match dict.get_item("monthly_income_pennies")? {
        Some(value) => pennies_from_py(value, "monthly_income_pennies")?,
        None => {
            return Err(PyValueError::new_err(
                "Missing required field 'monthly_income_pennies'",
            ))
        }
    };

    Ok(LoanApplication {
        applicant_id: extract_required(dict, "applicant_id")?,
        lender_id: extract_required(dict, "lender_id")?,
        amount_pennies: amount,
        monthly_income_pennies: monthly_income,
        credit_score: extract_required(dict, "credit_score")?,
        term_ticks: extract_with_default(dict, "term_ticks", 365)?,
    })
}

/// Parse a solvency input dict
pub fn parse_solvency_input(dict: &PyDict) -> PyResult<SolvencyInput> {
    let penny_field = |key: &str| -> PyResult<i64> {
        match dict.get_item(key)? {
            Some(value) => pennies_from_py(value, key),
            None => Ok(0),
        }
    };

    Ok(SolvencyInput {
        firm_id: extract_required(dict, "firm_id")?,
        age_ticks: extract_required(dict, "age_ticks")?,
        cash_pennies: penny_field("cash_pennies")?,
        monthly_wage_bill_pennies: penny_field("monthly_wage_bill_pennies")?,
        working_capital_pennies: penny_field("working_capital_pennies")?,
        total_assets_pennies: penny_field("total_assets_pennies")?,
        retained_earnings_pennies: penny_field("retained_earnings_pennies")?,
        average_profit_pennies: penny_field("average_profit_pennies")?,
    })
}

// ========================================================================
// Result Converters
// ========================================================================

/// Convert a transaction record to a Python dict
pub fn transaction_to_dict<'py>(py: Python<'py>, tx: &Transaction) -> PyResult<&'py PyDict> {
    let dict = PyDict::new(py);
    dict.set_item("id", tx.id())?;
    dict.set_item("buyer_id", tx.buyer_id())?;
    dict.set_item("seller_id", tx.seller_id())?;
    dict.set_item("item_id", tx.item_id())?;
    dict.set_item("quantity", tx.quantity())?;
    dict.set_item("total_pennies", tx.total_pennies())?;
    dict.set_item("currency", tx.currency())?;
    dict.set_item("market_id", tx.market_id())?;
    dict.set_item("transaction_type", tx.transaction_type().as_str())?;
    dict.set_item("tick", tx.tick())?;
    let metadata = PyDict::new(py);
    for (key, value) in tx.metadata() {
        metadata.set_item(key, value)?;
    }
    dict.set_item("metadata", metadata)?;
    Ok(dict)
}

/// Convert a loan decision to a Python dict
pub fn loan_decision_to_dict<'py>(
    py: Python<'py>,
    decision: &LoanDecision,
) -> PyResult<&'py PyDict> {
    let dict = PyDict::new(py);
    match decision {
        LoanDecision::Approved {
            summary,
            transactions,
        } => {
            dict.set_item("approved", true)?;
            dict.set_item("loan_id", &summary.loan_id)?;
            dict.set_item("lender_id", &summary.lender_id)?;
            dict.set_item("borrower_id", &summary.borrower_id)?;
            dict.set_item("principal", summary.principal)?;
            dict.set_item("interest_rate", summary.interest_rate)?;
            dict.set_item("due_tick", summary.due_tick)?;
            let txs: Vec<&PyDict> = transactions
                .iter()
                .map(|tx| transaction_to_dict(py, tx))
                .collect::<PyResult<_>>()?;
            dict.set_item("transactions", txs)?;
        }
        LoanDecision::Rejected { reason } => {
            dict.set_item("approved", false)?;
            dict.set_item("rejection_reason", format!("{:?}", reason))?;
        }
    }
    Ok(dict)
}

/// Convert a bond sale to a Python dict
pub fn bond_sale_to_dict<'py>(py: Python<'py>, sale: &BondSale) -> PyResult<&'py PyDict> {
    let dict = PyDict::new(py);
    dict.set_item("bond_id", &sale.bond_id)?;
    dict.set_item("buyer_id", &sale.buyer_id)?;
    dict.set_item("amount", sale.amount)?;
    dict.set_item("yield_rate", sale.yield_rate)?;
    dict.set_item("quantitative_easing", sale.quantitative_easing)?;
    Ok(dict)
}

/// Convert a solvency verdict to a Python dict
pub fn solvency_verdict_to_dict<'py>(
    py: Python<'py>,
    verdict: &SolvencyVerdict,
) -> PyResult<&'py PyDict> {
    let dict = PyDict::new(py);
    dict.set_item("solvent", verdict.solvent)?;
    dict.set_item(
        "regime",
        match verdict.regime {
            SolvencyRegime::Startup => "startup",
            SolvencyRegime::Established => "established",
        },
    )?;
    dict.set_item("z_score", verdict.z_score)?;
    Ok(dict)
}

/// Convert a bailout command to a Python dict
pub fn bailout_command_to_dict<'py>(
    py: Python<'py>,
    command: &BailoutCommand,
) -> PyResult<&'py PyDict> {
    let dict = PyDict::new(py);
    dict.set_item("borrower_bank_id", &command.borrower_bank_id)?;
    dict.set_item("lender_id", &command.lender_id)?;
    dict.set_item("amount_pennies", command.amount_pennies)?;
    dict.set_item("interest_rate", command.interest_rate)?;
    dict.set_item("due_tick", command.due_tick)?;
    dict.set_item("issued_tick", command.issued_tick)?;
    let covenants: Vec<String> = command
        .covenants
        .iter()
        .map(|c| match c {
            Covenant::SuspendDividends => "suspend_dividends".to_string(),
            Covenant::RestrictNewLending {
                max_loan_to_reserve_ratio,
            } => format!("restrict_new_lending:{}", max_loan_to_reserve_ratio),
            Covenant::RepayBy { tick } => format!("repay_by:{}", tick),
        })
        .collect();
    dict.set_item("covenants", covenants)?;
    Ok(dict)
}
