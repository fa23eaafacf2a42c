//! Conservation Property Tests
//!
//! Randomized sequences of settlement operations must never create or
//! destroy money outside sanctioned paths, and failed operations must
//! leave state byte-identical.

use economy_simulator_core_rs::models::account::{
    Account, AccountRole, AccountSet, SettlementMember, DEFAULT_CURRENCY,
};
use economy_simulator_core_rs::settlement::{CreditLeg, SettlementEngine, TransferLeg};
use proptest::prelude::*;

const IDS: [&str; 4] = ["HH_1", "HH_2", "FIRM_1", "FIRM_2"];

fn world(balances: [i64; 4]) -> AccountSet {
    let mut accounts = AccountSet::new();
    for (id, balance) in IDS.iter().zip(balances) {
        let role = if id.starts_with("HH") {
            AccountRole::Household
        } else {
            AccountRole::Firm
        };
        accounts.register(SettlementMember::with_balance(
            id.to_string(),
            role,
            balance,
            DEFAULT_CURRENCY,
        ));
    }
    accounts
}

fn total(accounts: &AccountSet) -> i64 {
    accounts.total_balance(DEFAULT_CURRENCY)
}

proptest! {
    /// Any sequence of transfers — successful or rejected — conserves the
    /// total balance across all accounts.
    #[test]
    fn prop_transfer_sequences_conserve_total(
        balances in prop::array::uniform4(0i64..100_000),
        ops in prop::collection::vec((0usize..4, 0usize..4, 0i64..50_000), 1..50),
    ) {
        let mut accounts = world(balances);
        let mut engine = SettlementEngine::new();
        let total_before = total(&accounts);

        for (tick, (from, to, amount)) in ops.into_iter().enumerate() {
            if from == to {
                continue;
            }
            // Result intentionally ignored: rejected transfers must not
            // move money either
            let _ = engine.transfer(
                &mut accounts,
                IDS[from],
                IDS[to],
                amount,
                "prop",
                DEFAULT_CURRENCY,
                tick,
            );
        }

        prop_assert_eq!(total(&accounts), total_before);
        // No account may go negative: none of these are overdraft-exempt
        for id in IDS {
            prop_assert!(accounts.get(id).unwrap().balance(DEFAULT_CURRENCY) >= 0);
        }
    }

    /// A rejected transfer leaves every balance byte-identical.
    #[test]
    fn prop_rejected_transfer_is_a_no_op(
        balance in 0i64..1_000,
        excess in 1i64..1_000_000,
    ) {
        let mut accounts = world([balance, 0, 0, 0]);
        let mut engine = SettlementEngine::new();
        let before = accounts.clone();

        let result = engine.transfer(
            &mut accounts,
            "HH_1",
            "HH_2",
            balance + excess,
            "prop",
            DEFAULT_CURRENCY,
            0,
        );

        prop_assert!(result.is_err());
        prop_assert_eq!(&accounts, &before);
    }

    /// settle_atomic either applies every credit or none of them.
    #[test]
    fn prop_settle_atomic_is_all_or_nothing(
        funding in 0i64..50_000,
        amounts in prop::collection::vec(0i64..20_000, 1..6),
    ) {
        let mut accounts = world([funding, 0, 0, 0]);
        let mut engine = SettlementEngine::new();
        let before = accounts.clone();
        let sum: i64 = amounts.iter().sum();

        let credits: Vec<CreditLeg> = amounts
            .iter()
            .enumerate()
            .map(|(i, &amount)| CreditLeg {
                account_id: IDS[1 + i % 3].to_string(),
                amount,
                memo: "prop".to_string(),
            })
            .collect();

        let result = engine.settle_atomic(&mut accounts, "HH_1", &credits, DEFAULT_CURRENCY, 0);

        if sum <= funding {
            prop_assert!(result.is_ok());
            prop_assert_eq!(
                accounts.get("HH_1").unwrap().balance(DEFAULT_CURRENCY),
                funding - sum
            );
        } else {
            prop_assert!(result.is_err());
            prop_assert_eq!(&accounts, &before);
        }
        prop_assert_eq!(total(&accounts), funding);
    }

    /// A multiparty chain that fails anywhere restores the exact pre-state.
    #[test]
    fn prop_failed_chain_restores_pre_state(
        balances in prop::array::uniform4(0i64..10_000),
        legs in prop::collection::vec((0usize..4, 0usize..4, 1i64..30_000), 1..10),
    ) {
        let mut accounts = world(balances);
        let mut engine = SettlementEngine::new();
        let before = accounts.clone();
        let total_before = total(&accounts);

        let chain: Vec<TransferLeg> = legs
            .into_iter()
            .filter(|(from, to, _)| from != to)
            .map(|(from, to, amount)| TransferLeg {
                debtor: IDS[from].to_string(),
                creditor: IDS[to].to_string(),
                amount,
                memo: "prop".to_string(),
            })
            .collect();

        match engine.execute_multiparty_settlement(&mut accounts, &chain, DEFAULT_CURRENCY, 0) {
            Ok(txs) => prop_assert_eq!(txs.len(), chain.len()),
            Err(_) => prop_assert_eq!(&accounts, &before),
        }
        prop_assert_eq!(total(&accounts), total_before);
    }
}
