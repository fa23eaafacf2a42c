//! Transaction model
//!
//! Immutable log record for every money movement in the system.
//! Each transaction has:
//! - Buyer (payer) and seller (payee) account IDs
//! - Authoritative integer total in pennies
//! - Item ID and quantity (for goods/asset movements; "cash" for pure transfers)
//! - Currency, market tag, transaction type, tick, metadata
//!
//! CRITICAL: All money values are i64 (pennies). The integer total is the
//! single source of truth; any derived unit price is computed from it, never
//! the reverse.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Classifies a transaction for audit queries.
///
/// Serialized in snake_case so log consumers see stable tags such as
/// `credit_creation` and `bond_interest`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionType {
    /// Ordinary peer transfer (conserves money supply)
    Transfer,

    /// Deposit conjured paired with a loan liability (money creation)
    CreditCreation,

    /// Daily interest on an outstanding loan
    LoanInterest,

    /// Principal repayment (full or partial)
    LoanRepayment,

    /// Unpaid principal written off against lender equity
    LoanWriteoff,

    /// Treasury bond purchase
    BondPurchase,

    /// Treasury bond coupon payment
    BondInterest,

    /// Treasury bond principal redemption at maturity
    BondRedemption,

    /// Inventory fire sale during liquidation
    Liquidation,

    /// Assets moved into or out of an estate settlement account
    Escrow,

    /// One leg of a bilateral currency exchange
    Swap,

    /// Authorized creation of new money
    MonetaryExpansion,

    /// Authorized destruction of money
    MonetaryContraction,
}

impl TransactionType {
    /// Stable snake_case tag (matches the serde encoding)
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Transfer => "transfer",
            TransactionType::CreditCreation => "credit_creation",
            TransactionType::LoanInterest => "loan_interest",
            TransactionType::LoanRepayment => "loan_repayment",
            TransactionType::LoanWriteoff => "loan_writeoff",
            TransactionType::BondPurchase => "bond_purchase",
            TransactionType::BondInterest => "bond_interest",
            TransactionType::BondRedemption => "bond_redemption",
            TransactionType::Liquidation => "liquidation",
            TransactionType::Escrow => "escrow",
            TransactionType::Swap => "swap",
            TransactionType::MonetaryExpansion => "monetary_expansion",
            TransactionType::MonetaryContraction => "monetary_contraction",
        }
    }
}

/// Immutable record of a single money movement.
///
/// # Example
/// ```
/// use economy_simulator_core_rs::models::transaction::{Transaction, TransactionType};
///
/// let tx = Transaction::new(
///     "HH_1".to_string(),
///     "FIRM_1".to_string(),
///     150_00, // $1.50 in pennies
///     "USD".to_string(),
///     42,
/// )
/// .with_item("bread".to_string(), 3)
/// .with_market("goods".to_string());
///
/// assert_eq!(tx.total_pennies(), 150_00);
/// assert_eq!(tx.unit_price_pennies(), 50_00); // derived, never stored
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// Unique transaction identifier (UUID)
    id: String,

    /// Paying account ID
    buyer_id: String,

    /// Receiving account ID
    seller_id: String,

    /// What changed hands ("cash" for pure transfers)
    item_id: String,

    /// Number of units (1 for pure transfers)
    quantity: i64,

    /// Authoritative total in integer pennies
    total_pennies: i64,

    /// Currency code (e.g. "USD")
    currency: String,

    /// Market or subsystem tag (e.g. "settlement", "credit", "sovereign_debt")
    market_id: String,

    /// Transaction classification for audit queries
    transaction_type: TransactionType,

    /// Simulation tick when the movement occurred
    tick: usize,

    /// Free-form audit metadata (memo, source, rates)
    metadata: BTreeMap<String, String>,
}

impl Transaction {
    /// Create a new transaction record.
    ///
    /// Defaults: item "cash", quantity 1, market "settlement",
    /// type [`TransactionType::Transfer`]. Use the `with_*` builders to
    /// override.
    ///
    /// # Arguments
    /// * `buyer_id` - Paying account ID
    /// * `seller_id` - Receiving account ID
    /// * `total_pennies` - Authoritative total (must be non-negative)
    /// * `currency` - Currency code
    /// * `tick` - Simulation tick
    ///
    /// # Panics
    /// Panics if `total_pennies` is negative.
    pub fn new(
        buyer_id: String,
        seller_id: String,
        total_pennies: i64,
        currency: String,
        tick: usize,
    ) -> Self {
        assert!(total_pennies >= 0, "total_pennies must be non-negative");

        Self {
            id: uuid::Uuid::new_v4().to_string(),
            buyer_id,
            seller_id,
            item_id: "cash".to_string(),
            quantity: 1,
            total_pennies,
            currency,
            market_id: "settlement".to_string(),
            transaction_type: TransactionType::Transfer,
            tick,
            metadata: BTreeMap::new(),
        }
    }

    /// Set item and quantity (builder).
    ///
    /// # Panics
    /// Panics if `quantity` is not positive.
    pub fn with_item(mut self, item_id: String, quantity: i64) -> Self {
        assert!(quantity > 0, "quantity must be positive");
        self.item_id = item_id;
        self.quantity = quantity;
        self
    }

    /// Set market tag (builder).
    pub fn with_market(mut self, market_id: String) -> Self {
        self.market_id = market_id;
        self
    }

    /// Set transaction type (builder).
    pub fn with_transaction_type(mut self, transaction_type: TransactionType) -> Self {
        self.transaction_type = transaction_type;
        self
    }

    /// Attach a memo to the metadata map (builder).
    pub fn with_memo(mut self, memo: &str) -> Self {
        self.metadata.insert("memo".to_string(), memo.to_string());
        self
    }

    /// Insert an arbitrary metadata entry (builder).
    pub fn with_metadata(mut self, key: &str, value: &str) -> Self {
        self.metadata.insert(key.to_string(), value.to_string());
        self
    }

    /// Get transaction ID
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Get paying account ID
    pub fn buyer_id(&self) -> &str {
        &self.buyer_id
    }

    /// Get receiving account ID
    pub fn seller_id(&self) -> &str {
        &self.seller_id
    }

    /// Get item ID
    pub fn item_id(&self) -> &str {
        &self.item_id
    }

    /// Get quantity
    pub fn quantity(&self) -> i64 {
        self.quantity
    }

    /// Get the authoritative total in pennies
    pub fn total_pennies(&self) -> i64 {
        self.total_pennies
    }

    /// Get currency code
    pub fn currency(&self) -> &str {
        &self.currency
    }

    /// Get market tag
    pub fn market_id(&self) -> &str {
        &self.market_id
    }

    /// Get transaction type
    pub fn transaction_type(&self) -> TransactionType {
        self.transaction_type
    }

    /// Get tick
    pub fn tick(&self) -> usize {
        self.tick
    }

    /// Get metadata map
    pub fn metadata(&self) -> &BTreeMap<String, String> {
        &self.metadata
    }

    /// Derived unit price in pennies (integer division of the total).
    ///
    /// The total is authoritative; this is a convenience view and loses the
    /// sub-penny remainder for quantities that do not divide evenly.
    pub fn unit_price_pennies(&self) -> i64 {
        self.total_pennies / self.quantity
    }
}
