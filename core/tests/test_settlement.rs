//! Settlement Engine Tests
//!
//! Core transfer semantics: conservation, clean failure with no state
//! change, schema rejection, the money-supply boundary, authority-gated
//! mint/burn, and atomic FX swaps.

use economy_simulator_core_rs::models::account::{
    Account, AccountRegistry, AccountRole, AccountSet, SettlementMember, DEFAULT_CURRENCY,
};
use economy_simulator_core_rs::settlement::{FxMatch, SettlementEngine, SettlementError};
use economy_simulator_core_rs::models::transaction::TransactionType;

// ============================================================================
// Test Helpers
// ============================================================================

fn account(id: &str, role: AccountRole, balance: i64) -> SettlementMember {
    SettlementMember::with_balance(id.to_string(), role, balance, DEFAULT_CURRENCY)
}

fn economy() -> AccountSet {
    let mut accounts = AccountSet::new();
    accounts.register(account("HH_1", AccountRole::Household, 1_000_00));
    accounts.register(account("HH_2", AccountRole::Household, 500_00));
    accounts.register(account("FIRM_1", AccountRole::Firm, 2_000_00));
    accounts.register(account("GOV", AccountRole::Government, 10_000_00));
    accounts.register(account("CENTRAL_BANK", AccountRole::CentralBank, 0));
    accounts
}

// ============================================================================
// Conservation
// ============================================================================

#[test]
fn test_transfer_conserves_pair_sum() {
    let mut accounts = economy();
    let mut engine = SettlementEngine::new();

    let debtor_before = accounts.get("HH_1").unwrap().balance(DEFAULT_CURRENCY);
    let creditor_before = accounts.get("FIRM_1").unwrap().balance(DEFAULT_CURRENCY);

    engine
        .transfer(&mut accounts, "HH_1", "FIRM_1", 375_00, "groceries", DEFAULT_CURRENCY, 1)
        .unwrap();

    let debtor_after = accounts.get("HH_1").unwrap().balance(DEFAULT_CURRENCY);
    let creditor_after = accounts.get("FIRM_1").unwrap().balance(DEFAULT_CURRENCY);

    assert_eq!(debtor_after + creditor_after, debtor_before + creditor_before);
    assert_eq!(debtor_after, 625_00);
    assert_eq!(creditor_after, 2_375_00);
}

#[test]
fn test_transfer_returns_authoritative_total() {
    let mut accounts = economy();
    let mut engine = SettlementEngine::new();

    let tx = engine
        .transfer(&mut accounts, "HH_1", "HH_2", 123_45, "gift", DEFAULT_CURRENCY, 7)
        .unwrap();

    assert_eq!(tx.total_pennies(), 123_45);
    assert_eq!(tx.buyer_id(), "HH_1");
    assert_eq!(tx.seller_id(), "HH_2");
    assert_eq!(tx.currency(), DEFAULT_CURRENCY);
    assert_eq!(tx.tick(), 7);
    assert_eq!(engine.log().len(), 1);
}

// ============================================================================
// Clean Failure
// ============================================================================

#[test]
fn test_insufficient_funds_leaves_both_balances_identical() {
    let mut accounts = economy();
    let mut engine = SettlementEngine::new();
    let before = accounts.clone();

    let err = engine
        .transfer(&mut accounts, "HH_2", "HH_1", 9_999_99, "too much", DEFAULT_CURRENCY, 1)
        .unwrap_err();

    assert_eq!(
        err,
        SettlementError::InsufficientFunds {
            account_id: "HH_2".to_string(),
            required: 9_999_99,
            available: 500_00,
        }
    );
    assert_eq!(accounts, before);
    assert!(engine.log().is_empty());
}

#[test]
fn test_negative_amount_rejected_before_state() {
    let mut accounts = economy();
    let mut engine = SettlementEngine::new();
    let before = accounts.clone();

    let err = engine
        .transfer(&mut accounts, "HH_1", "HH_2", -1, "negative", DEFAULT_CURRENCY, 1)
        .unwrap_err();

    assert!(matches!(err, SettlementError::SchemaViolation { .. }));
    assert_eq!(accounts, before);
}

#[test]
fn test_unknown_accounts_are_typed_errors() {
    let mut accounts = economy();
    let mut engine = SettlementEngine::new();

    let err = engine
        .transfer(&mut accounts, "NOBODY", "HH_1", 1, "x", DEFAULT_CURRENCY, 1)
        .unwrap_err();
    assert_eq!(
        err,
        SettlementError::AccountNotFound {
            id: "NOBODY".to_string()
        }
    );

    let err = engine
        .transfer(&mut accounts, "HH_1", "NOBODY", 1, "x", DEFAULT_CURRENCY, 1)
        .unwrap_err();
    assert_eq!(
        err,
        SettlementError::AccountNotFound {
            id: "NOBODY".to_string()
        }
    );
    assert_eq!(accounts.get("HH_1").unwrap().balance(DEFAULT_CURRENCY), 1_000_00);
}

// ============================================================================
// Money-Supply Boundary
// ============================================================================

#[test]
fn test_tax_and_spend_cross_the_boundary() {
    let mut accounts = economy();
    let mut engine = SettlementEngine::new();
    engine
        .monetary_mut()
        .seed_expected_m2(accounts.money_supply_balance(DEFAULT_CURRENCY), DEFAULT_CURRENCY);

    // Household pays tax: money leaves the supply
    engine
        .transfer(&mut accounts, "HH_1", "GOV", 100_00, "tax", DEFAULT_CURRENCY, 1)
        .unwrap();
    // Government pays a benefit: money re-enters the supply
    engine
        .transfer(&mut accounts, "GOV", "HH_2", 60_00, "benefit", DEFAULT_CURRENCY, 2)
        .unwrap();

    let expected = engine.monetary().expected_m2(DEFAULT_CURRENCY);
    let actual = accounts.money_supply_balance(DEFAULT_CURRENCY);
    assert_eq!(expected, actual, "expected and actual M2 must agree");
    assert_eq!(engine.monetary().audit().len(), 2);
}

#[test]
fn test_peer_transfer_records_no_supply_change() {
    let mut accounts = economy();
    let mut engine = SettlementEngine::new();

    engine
        .transfer(&mut accounts, "HH_1", "FIRM_1", 100_00, "purchase", DEFAULT_CURRENCY, 1)
        .unwrap();

    assert!(engine.monetary().audit().is_empty());
}

// ============================================================================
// Mint / Burn
// ============================================================================

#[test]
fn test_mint_is_logged_as_expansion() {
    let mut accounts = economy();
    let mut engine = SettlementEngine::new();
    engine
        .monetary_mut()
        .seed_expected_m2(accounts.money_supply_balance(DEFAULT_CURRENCY), DEFAULT_CURRENCY);

    let tx = engine
        .create_and_transfer(
            &mut accounts,
            "CENTRAL_BANK",
            "HH_1",
            250_00,
            "helicopter drop",
            DEFAULT_CURRENCY,
            3,
        )
        .unwrap();

    assert_eq!(tx.transaction_type(), TransactionType::MonetaryExpansion);
    assert_eq!(
        accounts.get("CENTRAL_BANK").unwrap().balance(DEFAULT_CURRENCY),
        -250_00
    );
    assert_eq!(
        engine.monetary().expected_m2(DEFAULT_CURRENCY),
        accounts.money_supply_balance(DEFAULT_CURRENCY)
    );
}

#[test]
fn test_unauthorized_mint_is_rejected_with_no_state_change() {
    let mut accounts = economy();
    let mut engine = SettlementEngine::new();
    let before = accounts.clone();

    let err = engine
        .create_and_transfer(
            &mut accounts,
            "FIRM_1",
            "HH_1",
            1_00,
            "counterfeit",
            DEFAULT_CURRENCY,
            3,
        )
        .unwrap_err();

    assert_eq!(
        err,
        SettlementError::UnauthorizedMonetaryOperation {
            id: "FIRM_1".to_string()
        }
    );
    assert_eq!(accounts, before);
    assert!(engine.monetary().audit().is_empty());
}

#[test]
fn test_burn_requires_payer_coverage() {
    let mut accounts = economy();
    let mut engine = SettlementEngine::new();

    let err = engine
        .transfer_and_destroy(
            &mut accounts,
            "HH_2",
            "CENTRAL_BANK",
            9_999_99,
            "sterilization",
            DEFAULT_CURRENCY,
            3,
        )
        .unwrap_err();

    assert!(matches!(err, SettlementError::InsufficientFunds { .. }));
    assert_eq!(accounts.get("HH_2").unwrap().balance(DEFAULT_CURRENCY), 500_00);
}

// ============================================================================
// FX Swap
// ============================================================================

#[test]
fn test_swap_exchanges_both_currencies_atomically() {
    let mut accounts = AccountSet::new();
    accounts.register(SettlementMember::with_balance(
        "FIRM_US".to_string(),
        AccountRole::Firm,
        10_000,
        "USD",
    ));
    accounts.register(SettlementMember::with_balance(
        "FIRM_EU".to_string(),
        AccountRole::Firm,
        9_000,
        "EUR",
    ));
    let mut engine = SettlementEngine::new();

    let (leg_a, leg_b) = engine
        .execute_swap(
            &mut accounts,
            &FxMatch {
                party_a_id: "FIRM_US".to_string(),
                party_b_id: "FIRM_EU".to_string(),
                amount_a_pennies: 1_000,
                currency_a: "USD".to_string(),
                amount_b_pennies: 900,
                currency_b: "EUR".to_string(),
                rate_a_to_b: 0.9,
                tick: 4,
            },
        )
        .unwrap();

    assert_eq!(leg_a.transaction_type(), TransactionType::Swap);
    assert_eq!(leg_b.transaction_type(), TransactionType::Swap);

    let us = accounts.get("FIRM_US").unwrap();
    assert_eq!(us.balance("USD"), 9_000);
    assert_eq!(us.balance("EUR"), 900);
    let eu = accounts.get("FIRM_EU").unwrap();
    assert_eq!(eu.balance("USD"), 1_000);
    assert_eq!(eu.balance("EUR"), 8_100);
}

#[test]
fn test_swap_with_uncovered_leg_mutates_nothing() {
    let mut accounts = AccountSet::new();
    accounts.register(SettlementMember::with_balance(
        "FIRM_US".to_string(),
        AccountRole::Firm,
        10_000,
        "USD",
    ));
    accounts.register(SettlementMember::with_balance(
        "FIRM_EU".to_string(),
        AccountRole::Firm,
        100,
        "EUR",
    ));
    let mut engine = SettlementEngine::new();
    let before = accounts.clone();

    let err = engine
        .execute_swap(
            &mut accounts,
            &FxMatch {
                party_a_id: "FIRM_US".to_string(),
                party_b_id: "FIRM_EU".to_string(),
                amount_a_pennies: 1_000,
                currency_a: "USD".to_string(),
                amount_b_pennies: 900,
                currency_b: "EUR".to_string(),
                rate_a_to_b: 0.9,
                tick: 4,
            },
        )
        .unwrap_err();

    assert!(matches!(err, SettlementError::InsufficientFunds { .. }));
    assert_eq!(accounts, before);
    assert!(engine.log().is_empty());
}
