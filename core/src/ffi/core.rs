//! PyO3 wrapper exposing the financial core to the host simulation
//!
//! The host (behavioral engines, markets, reporting) drives this class:
//! it registers accounts, submits transfer instructions and loan/bond/
//! liquidation requests, and consumes balances, solvency verdicts and the
//! transaction log. Expected failures (insufficient funds) come back as
//! `None`; schema violations and unknown agents raise `ValueError`.

use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;
use pyo3::types::{PyDict, PyList};

use crate::ffi::types::{
    bailout_command_to_dict, bond_sale_to_dict, extract_required, loan_decision_to_dict,
    parse_account_spec, parse_loan_application, parse_solvency_input, pennies_from_py,
    solvency_verdict_to_dict, transaction_to_dict,
};
use crate::models::account::{Account, AccountSet};
use crate::orchestrator::engine::{FinancialOrchestrator, OrchestratorConfig, SimulationError};
use crate::settlement::engine::SettlementError;

/// Map an orchestrator error onto the FFI error policy: insufficient
/// funds is an expected outcome (the caller sees `None`), everything else
/// raises.
fn is_insufficient_funds(err: &SimulationError) -> bool {
    matches!(
        err,
        SimulationError::Settlement(SettlementError::InsufficientFunds { .. })
    )
}

fn sim_err(err: SimulationError) -> PyErr {
    PyValueError::new_err(err.to_string())
}

/// The financial settlement and ledger core, driven from Python.
#[pyclass]
pub struct PyFinancialCore {
    orchestrator: FinancialOrchestrator,
}

#[pymethods]
impl PyFinancialCore {
    /// Create the core from a list of account specs:
    /// `[{id, role, balance?, currency?}, ...]`
    #[new]
    fn new(account_specs: &PyList) -> PyResult<Self> {
        let mut accounts = AccountSet::new();
        for spec in account_specs.iter() {
            let dict: &PyDict = spec.extract()?;
            accounts.register(parse_account_spec(dict)?);
        }
        Ok(Self {
            orchestrator: FinancialOrchestrator::bootstrap(
                OrchestratorConfig::default(),
                accounts,
            ),
        })
    }

    /// Current tick
    fn tick(&self) -> usize {
        self.orchestrator.tick()
    }

    /// Advance the tick by one
    fn advance_tick(&mut self) {
        self.orchestrator.advance_tick();
    }

    /// Balance of an account in integer pennies
    fn balance(&self, account_id: &str, currency: &str) -> PyResult<i64> {
        self.orchestrator
            .accounts()
            .get(account_id)
            .map(|a| a.balance(currency))
            .ok_or_else(|| PyValueError::new_err(format!("Unknown account '{}'", account_id)))
    }

    /// Transfer pennies between two accounts.
    ///
    /// Returns the transaction dict, or `None` when the debtor cannot
    /// cover the amount (no state changed).
    fn transfer(
        &mut self,
        py: Python<'_>,
        debtor: &str,
        creditor: &str,
        amount: &PyAny,
        memo: &str,
        currency: &str,
    ) -> PyResult<Option<PyObject>> {
        let amount = pennies_from_py(amount, "amount")?;
        match self.orchestrator.transfer(debtor, creditor, amount, memo, currency) {
            Ok(tx) => Ok(Some(transaction_to_dict(py, &tx)?.into())),
            Err(err) if is_insufficient_funds(&err) => Ok(None),
            Err(err) => Err(sim_err(err)),
        }
    }

    /// Run the risk → booking pipeline for a loan application dict
    fn process_loan_application(
        &mut self,
        py: Python<'_>,
        application: &PyDict,
    ) -> PyResult<PyObject> {
        let app = parse_loan_application(application)?;
        let decision = self
            .orchestrator
            .process_loan_application(&app)
            .map_err(sim_err)?;
        Ok(loan_decision_to_dict(py, &decision)?.into())
    }

    /// Issue treasury bonds; returns the sale dict or `None` when no
    /// buyer can cover the amount
    fn issue_treasury_bonds(
        &mut self,
        py: Python<'_>,
        amount: &PyAny,
        gdp_estimate: &PyAny,
    ) -> PyResult<Option<PyObject>> {
        let amount = pennies_from_py(amount, "amount")?;
        let gdp = pennies_from_py(gdp_estimate, "gdp_estimate")?;
        let sale = self
            .orchestrator
            .issue_treasury_bonds(amount, gdp)
            .map_err(sim_err)?;
        match sale {
            Some(sale) => Ok(Some(bond_sale_to_dict(py, &sale)?.into())),
            None => Ok(None),
        }
    }

    /// Build an immutable bailout command (no state is mutated)
    fn request_bailout_loan(
        &self,
        py: Python<'_>,
        bank_id: &str,
        amount: &PyAny,
    ) -> PyResult<PyObject> {
        let amount = pennies_from_py(amount, "amount")?;
        let command = self
            .orchestrator
            .request_bailout_loan(bank_id, amount)
            .map_err(sim_err)?;
        Ok(bailout_command_to_dict(py, &command)?.into())
    }

    /// Evaluate firm solvency from a financials dict
    fn evaluate_solvency(&self, py: Python<'_>, input: &PyDict) -> PyResult<PyObject> {
        let input = parse_solvency_input(input)?;
        let verdict = self.orchestrator.evaluate_solvency(&input);
        Ok(solvency_verdict_to_dict(py, &verdict)?.into())
    }

    /// Service every loan and bond for the current tick; returns a
    /// summary dict
    fn service_debt(&mut self, py: Python<'_>) -> PyResult<PyObject> {
        let report = self.orchestrator.service_debt().map_err(sim_err)?;
        let dict = PyDict::new(py);
        dict.set_item("interest_collected", report.interest_collected)?;
        dict.set_item("missed_interest_payments", report.missed_interest_payments)?;
        dict.set_item("principal_repaid", report.principal_repaid)?;
        dict.set_item("partial_repayments", report.partial_repayments)?;
        dict.set_item("coupons_paid", report.coupons.len())?;
        dict.set_item("skipped_coupons", report.skipped_coupons.len())?;
        dict.set_item("bonds_redeemed", report.redemptions.len())?;
        Ok(dict.into())
    }

    /// Audit ledger integrity; returns false (and logs diagnostics) on
    /// any violation, never raises
    fn verify_integrity(&mut self) -> bool {
        self.orchestrator.audit_integrity()
    }

    /// Expected M2 for a currency
    fn expected_m2(&self, currency: &str) -> i64 {
        self.orchestrator.settlement().monetary().expected_m2(currency)
    }

    /// Actual M2 for a currency (live balances + deposit money)
    fn actual_m2(&self, currency: &str) -> i64 {
        self.orchestrator.actual_m2(currency)
    }

    /// Drift between actual and expected M2
    fn m2_drift(&self, currency: &str) -> i64 {
        self.orchestrator.m2_drift(currency)
    }

    /// Number of transactions in the audit log
    fn num_transactions(&self) -> usize {
        self.orchestrator.settlement().log().len()
    }

    /// The most recent `count` transactions as dicts
    fn recent_transactions(&self, py: Python<'_>, count: usize) -> PyResult<Vec<PyObject>> {
        let log = self.orchestrator.settlement().log();
        let start = log.len().saturating_sub(count);
        log[start..]
            .iter()
            .map(|tx| transaction_to_dict(py, tx).map(|d| d.into()))
            .collect()
    }

    /// Register an additional account after construction
    fn register_account(&mut self, spec: &PyDict) -> PyResult<()> {
        let id: String = extract_required(spec, "id")?;
        if self.orchestrator.accounts().get(&id).is_some() {
            return Err(PyValueError::new_err(format!(
                "Account '{}' already registered",
                id
            )));
        }
        self.orchestrator.register_account(parse_account_spec(spec)?);
        Ok(())
    }
}
