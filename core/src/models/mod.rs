//! Domain models
//!
//! Passive data types for the settlement and ledger core:
//! - `account`: the Account capability, concrete settlement members, and
//!   the dependency-injected registry
//! - `bank`: bank balance sheets (loans, deposits, reserves, equity)
//! - `treasury`: government books and the sovereign bond register
//! - `ledger`: the aggregate root the stateless engines operate on
//! - `transaction`: the immutable money-movement log record
//! - `event`: structured audit events (everything that is not a transfer)

pub mod account;
pub mod bank;
pub mod event;
pub mod ledger;
pub mod transaction;
pub mod treasury;

pub use account::{
    Account, AccountError, AccountRegistry, AccountRole, AccountSet, SettlementMember,
    DEFAULT_CURRENCY,
};
pub use bank::{Bank, Deposit, DepositError, Loan, LoanError};
pub use event::{EventLog, FinancialEvent};
pub use ledger::Ledger;
pub use transaction::{Transaction, TransactionType};
pub use treasury::{Bond, Treasury};
