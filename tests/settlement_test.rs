//! End-to-end settlement scenarios through the public library API.

use chrono::{TimeZone, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::collections::HashMap;
use trip_settle::{
    aggregate, net_balances, settle, toggle_settlement, Balances, Currency, ExchangeRate, Expense,
    Member, MemoryFlagStore, SettleError, SettlementBoard, SettlementFlagStore, Transfer,
};

fn trip_members() -> Vec<Member> {
    vec![
        Member::new("a", "Ann", "ann@example.com"),
        Member::new("b", "Bo", "bo@example.com"),
        Member::new("c", "Cy", "cy@example.com"),
    ]
}

fn expense(id: &str, amount: Decimal, currency: Currency, payer: &str, splits: &[&str]) -> Expense {
    Expense {
        id: id.to_string(),
        description: format!("expense {}", id),
        amount,
        currency,
        payer_id: payer.to_string(),
        split_ids: splits.iter().map(|s| s.to_string()).collect(),
        is_settled: false,
        date: Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap(),
    }
}

fn transfer(from: &str, to: &str, amount: Decimal, is_settled: bool) -> Transfer {
    Transfer {
        from: from.to_string(),
        to: to.to_string(),
        amount,
        is_settled,
    }
}

fn scenario_expenses() -> Vec<Expense> {
    vec![
        expense("e1", dec!(900), Currency::Ntd, "a", &["a", "b", "c"]),
        expense("e2", dec!(300), Currency::Ntd, "b", &["a", "b", "c"]),
    ]
}

#[test]
fn test_three_member_end_to_end() {
    let members = trip_members();
    let expenses = scenario_expenses();
    let rate = ExchangeRate::fallback();

    let balances = aggregate(&expenses, &members, rate.value()).unwrap();
    assert_eq!(balances.get("a"), Some(dec!(500)));
    assert_eq!(balances.get("b"), Some(dec!(-100)));
    assert_eq!(balances.get("c"), Some(dec!(-400)));

    let transfers = settle(&expenses, &members, &rate, &HashMap::new()).unwrap();
    assert_eq!(
        transfers,
        vec![
            transfer("b", "a", dec!(100), false),
            transfer("c", "a", dec!(400), false),
        ]
    );

    let total: Decimal = transfers.iter().map(|t| t.amount).sum();
    assert_eq!(total, dec!(500));
}

#[test]
fn test_pipeline_is_idempotent() {
    let members = trip_members();
    let expenses = vec![
        expense("e1", dec!(12345), Currency::Jpy, "c", &["a", "b", "c"]),
        expense("e2", dec!(777), Currency::Ntd, "a", &["b", "c"]),
        expense("e3", dec!(1000), Currency::Ntd, "b", &["a", "b", "c"]),
    ];
    let rate = ExchangeRate::fetched(dec!(0.2163)).unwrap();
    let mut flags = HashMap::new();
    flags.insert("b-c".to_string(), true);

    let first = settle(&expenses, &members, &rate, &flags).unwrap();
    let second = settle(&expenses, &members, &rate, &flags).unwrap();
    assert_eq!(first, second);
    assert!(!first.is_empty());
}

#[test]
fn test_rate_change_moves_foreign_expenses_only() {
    let members = trip_members();
    let expenses = vec![
        expense("e1", dec!(3000), Currency::Jpy, "a", &["a", "b"]),
        expense("e2", dec!(200), Currency::Ntd, "c", &["b", "c"]),
    ];

    let at_default = settle(&expenses, &members, &ExchangeRate::fallback(), &HashMap::new()).unwrap();
    // 3000 JPY -> 600 NTD, b owes a 300 and c 100
    assert_eq!(
        at_default,
        vec![
            transfer("b", "a", dec!(300), false),
            transfer("b", "c", dec!(100), false),
        ]
    );

    let live = ExchangeRate::fetched(dec!(0.25)).unwrap();
    let at_live = settle(&expenses, &members, &live, &HashMap::new()).unwrap();
    assert_eq!(
        at_live,
        vec![
            transfer("b", "a", dec!(375), false),
            transfer("b", "c", dec!(100), false),
        ]
    );
}

#[test]
fn test_settling_an_expense_removes_its_transfers() {
    let members = trip_members();
    let mut expenses = scenario_expenses();
    expenses[0].is_settled = true;

    let transfers = settle(&expenses, &members, &ExchangeRate::fallback(), &HashMap::new()).unwrap();
    // only e2 remains: b is owed 100 by a and c each
    assert_eq!(
        transfers,
        vec![
            transfer("a", "b", dec!(100), false),
            transfer("c", "b", dec!(100), false),
        ]
    );
}

#[test]
fn test_deleting_an_expense_drops_it_from_settlement() {
    let members = trip_members();
    let expenses = scenario_expenses();
    let remaining = &expenses[1..];

    let all = settle(&expenses, &members, &ExchangeRate::fallback(), &HashMap::new()).unwrap();
    let after = settle(remaining, &members, &ExchangeRate::fallback(), &HashMap::new()).unwrap();
    assert_ne!(all, after);
    assert_eq!(after.len(), 2);
}

#[test]
fn test_invalid_inputs_fail_fast() {
    let members = trip_members();
    let rate = ExchangeRate::fallback();

    let empty = vec![expense("e1", dec!(100), Currency::Ntd, "a", &[])];
    assert!(matches!(
        settle(&empty, &members, &rate, &HashMap::new()),
        Err(SettleError::EmptySplitSet { .. })
    ));

    let stranger = vec![expense("e1", dec!(100), Currency::Ntd, "x", &["a"])];
    assert!(matches!(
        settle(&stranger, &members, &rate, &HashMap::new()),
        Err(SettleError::UnknownMember { .. })
    ));
}

#[tokio::test]
async fn test_toggled_flag_survives_recompute() {
    let store = MemoryFlagStore::new();
    let mut board = SettlementBoard::new();
    board.set_members(trip_members()).unwrap();
    let shown = board.set_expenses(scenario_expenses()).unwrap();

    let target = &shown.transfers[1];
    toggle_settlement(&store, &target.from, &target.to, target.is_settled)
        .await
        .unwrap();

    let settlement = board.set_flags(store.get_all().await.unwrap()).unwrap();
    assert_eq!(
        settlement.transfers,
        vec![
            transfer("b", "a", dec!(100), false),
            transfer("c", "a", dec!(400), true),
        ]
    );

    // a new expense changes c's amount but the pair keeps its flag
    let mut expenses = scenario_expenses();
    expenses.push(expense("e3", dec!(150), Currency::Ntd, "a", &["a", "c"]));
    let settlement = board.set_expenses(expenses).unwrap();
    assert_eq!(settlement.transfers[1], transfer("c", "a", dec!(475), true));
}

#[tokio::test]
async fn test_flag_write_failure_leaves_state_unchanged() {
    let store = MemoryFlagStore::new();
    store.set_flag("c", "a", true).await.unwrap();

    let err = toggle_settlement(&store, "", "a", false).await.unwrap_err();
    assert!(matches!(err, SettleError::FlagWrite { .. }));

    let flags = store.get_all().await.unwrap();
    assert_eq!(flags.len(), 1);
    assert_eq!(flags.get("c-a"), Some(&true));
}

#[test]
fn test_netting_from_hand_built_balances() {
    let balances: Balances = vec![
        ("a".to_string(), dec!(-250)),
        ("b".to_string(), dec!(100)),
        ("c".to_string(), dec!(150)),
    ]
    .into_iter()
    .collect();

    assert_eq!(
        net_balances(&balances),
        vec![
            transfer("a", "b", dec!(100), false),
            transfer("a", "c", dec!(150), false),
        ]
    );
}
