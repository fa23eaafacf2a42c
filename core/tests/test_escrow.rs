//! Estate Settlement (Escrow) Tests
//!
//! Three-phase protocol: freeze, distribute (tolerating uncoverable
//! legs), close with leak surfacing. Includes the escheatment flow for
//! estates with no heir.

use economy_simulator_core_rs::models::account::{
    Account, AccountRegistry, AccountRole, AccountSet, SettlementMember, DEFAULT_CURRENCY,
};
use economy_simulator_core_rs::settlement::{
    CashDistribution, DistributionPlan, EscrowStatus, PortfolioDistribution, SettlementEngine,
};

// ============================================================================
// Test Helpers
// ============================================================================

fn estate_world() -> (AccountSet, SettlementEngine) {
    let mut accounts = AccountSet::new();
    accounts.register(
        SettlementMember::with_balance(
            "HH_ELDER".to_string(),
            AccountRole::Household,
            100,
            DEFAULT_CURRENCY,
        )
        .with_holding("house", 1)
        .with_holding("tractor", 2),
    );
    accounts.register(SettlementMember::new(
        "HH_CHILD".to_string(),
        AccountRole::Household,
    ));
    accounts.register(SettlementMember::new(
        "GOV".to_string(),
        AccountRole::Government,
    ));
    let mut engine = SettlementEngine::new();
    engine
        .monetary_mut()
        .seed_expected_m2(accounts.money_supply_balance(DEFAULT_CURRENCY), DEFAULT_CURRENCY);
    (accounts, engine)
}

fn cash_to(recipient: &str, amount: i64) -> CashDistribution {
    CashDistribution {
        recipient_id: recipient.to_string(),
        amount,
        currency: DEFAULT_CURRENCY.to_string(),
    }
}

// ============================================================================
// Phase 1: Freeze
// ============================================================================

#[test]
fn test_escrow_freezes_cash_and_portfolio() {
    let (mut accounts, mut engine) = estate_world();

    let id = engine
        .create_settlement(&mut accounts, "HH_ELDER", Some("HH_CHILD".to_string()), 5)
        .unwrap();

    // Nothing is spendable mid-resolution
    let elder = accounts.get("HH_ELDER").unwrap();
    assert_eq!(elder.balance(DEFAULT_CURRENCY), 0);
    assert!(elder.portfolio().is_empty());

    let escrow = engine.settlement_account(&id).unwrap();
    assert_eq!(escrow.status(), EscrowStatus::Open);
    assert_eq!(escrow.cash(DEFAULT_CURRENCY), 100);
    assert_eq!(escrow.portfolio().get("house"), Some(&1));
    assert_eq!(escrow.portfolio().get("tractor"), Some(&2));
    assert_eq!(escrow.heir_id(), Some("HH_CHILD"));
}

// ============================================================================
// Phase 2: Distribute
// ============================================================================

#[test]
fn test_distribution_tolerates_uncoverable_legs_across_ticks() {
    let (mut accounts, mut engine) = estate_world();
    let id = engine
        .create_settlement(&mut accounts, "HH_ELDER", Some("HH_CHILD".to_string()), 5)
        .unwrap();

    // First pass: one leg too large, one fine
    let plan = DistributionPlan {
        cash_legs: vec![cash_to("HH_CHILD", 150), cash_to("HH_CHILD", 70)],
        portfolio_legs: vec![],
    };
    let report = engine
        .execute_settlement(&mut accounts, &id, &plan, 6)
        .unwrap();
    assert_eq!(report.skipped_legs, 1);
    assert_eq!(report.distributed.len(), 1);

    // Later tick: the remainder is distributable
    let plan = DistributionPlan {
        cash_legs: vec![cash_to("HH_CHILD", 30)],
        portfolio_legs: vec![PortfolioDistribution {
            recipient_id: "HH_CHILD".to_string(),
            item_id: "house".to_string(),
            quantity: 1,
        }],
    };
    let report = engine
        .execute_settlement(&mut accounts, &id, &plan, 9)
        .unwrap();
    assert_eq!(report.skipped_legs, 0);

    assert_eq!(accounts.get("HH_CHILD").unwrap().balance(DEFAULT_CURRENCY), 100);
    assert_eq!(accounts.get("HH_CHILD").unwrap().portfolio().get("house"), Some(&1));
}

// ============================================================================
// Phase 3: Close
// ============================================================================

#[test]
fn test_fully_drained_escrow_closes_clean() {
    let (mut accounts, mut engine) = estate_world();
    let id = engine
        .create_settlement(&mut accounts, "HH_ELDER", Some("HH_CHILD".to_string()), 5)
        .unwrap();

    let plan = DistributionPlan {
        cash_legs: vec![cash_to("HH_CHILD", 100)],
        portfolio_legs: vec![
            PortfolioDistribution {
                recipient_id: "HH_CHILD".to_string(),
                item_id: "house".to_string(),
                quantity: 1,
            },
            PortfolioDistribution {
                recipient_id: "HH_CHILD".to_string(),
                item_id: "tractor".to_string(),
                quantity: 2,
            },
        ],
    };
    engine.execute_settlement(&mut accounts, &id, &plan, 6).unwrap();

    assert!(engine.verify_and_close(&id, 7).unwrap());
    assert_eq!(
        engine.settlement_account(&id).unwrap().status(),
        EscrowStatus::Closed
    );
    // Frozen money returned to circulation: no drift
    assert_eq!(
        engine.monetary().expected_m2(DEFAULT_CURRENCY),
        accounts.money_supply_balance(DEFAULT_CURRENCY)
    );
}

#[test]
fn test_leak_is_surfaced_never_silently_zeroed() {
    let (mut accounts, mut engine) = estate_world();
    let id = engine
        .create_settlement(&mut accounts, "HH_ELDER", None, 5)
        .unwrap();

    // Plan totals only 90 of the 100 escrowed pennies and executes fine
    let plan = DistributionPlan {
        cash_legs: vec![cash_to("HH_CHILD", 90)],
        portfolio_legs: vec![
            PortfolioDistribution {
                recipient_id: "HH_CHILD".to_string(),
                item_id: "house".to_string(),
                quantity: 1,
            },
            PortfolioDistribution {
                recipient_id: "HH_CHILD".to_string(),
                item_id: "tractor".to_string(),
                quantity: 2,
            },
        ],
    };
    let report = engine
        .execute_settlement(&mut accounts, &id, &plan, 6)
        .unwrap();
    assert_eq!(report.skipped_legs, 0);

    // verify_and_close must return false and mark the leak
    assert!(!engine.verify_and_close(&id, 7).unwrap());
    let escrow = engine.settlement_account(&id).unwrap();
    assert_eq!(escrow.status(), EscrowStatus::ClosedWithLeak);
    assert_eq!(escrow.cash(DEFAULT_CURRENCY), 10, "residue stays visible");
    assert_eq!(engine.events().events_of_type("EscrowLeak").len(), 1);
}

// ============================================================================
// Escheatment
// ============================================================================

#[test]
fn test_heirless_estate_escheats_to_government() {
    let (mut accounts, mut engine) = estate_world();
    let id = engine
        .create_settlement(&mut accounts, "HH_ELDER", None, 5)
        .unwrap();

    let plan = DistributionPlan {
        cash_legs: vec![cash_to("GOV", 100)],
        portfolio_legs: vec![
            PortfolioDistribution {
                recipient_id: "GOV".to_string(),
                item_id: "house".to_string(),
                quantity: 1,
            },
            PortfolioDistribution {
                recipient_id: "GOV".to_string(),
                item_id: "tractor".to_string(),
                quantity: 2,
            },
        ],
    };
    engine.execute_settlement(&mut accounts, &id, &plan, 6).unwrap();

    assert!(engine.verify_and_close(&id, 7).unwrap());
    assert_eq!(accounts.get("GOV").unwrap().balance(DEFAULT_CURRENCY), 100);
    assert_eq!(accounts.get("GOV").unwrap().portfolio().get("tractor"), Some(&2));
    // Escheated cash left the money supply for good: expected must track it
    assert_eq!(
        engine.monetary().expected_m2(DEFAULT_CURRENCY),
        accounts.money_supply_balance(DEFAULT_CURRENCY)
    );
}
