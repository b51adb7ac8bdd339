//! Account statement integration tests.

mod common;

use commission_service::error::LedgerError;
use commission_service::models::TransactionType;
use commission_service::services::PeriodCalculator;
use common::{at, dec, sale, spawn_app, spawn_app_with, tx};

#[tokio::test]
async fn statement_over_whole_month() {
    let app = spawn_app();
    app.seed_simple_ledger("eng-1").await;

    let statement = app
        .service
        .get_account_statement("eng-1", Some(at(2024, 1, 1, 0)), Some(at(2024, 1, 31, 0)))
        .await
        .unwrap();

    assert_eq!(statement.opening_balance, dec("0"));
    assert_eq!(statement.summary.total_commissions, dec("100"));
    assert_eq!(statement.summary.total_withdrawals, dec("40"));
    assert_eq!(statement.summary.total_refunds, dec("10"));
    assert_eq!(statement.summary.net_amount, dec("50"));
    assert_eq!(statement.summary.transaction_count, 3);
    assert_eq!(statement.closing_balance, dec("50"));

    let running: Vec<_> = statement
        .transactions
        .iter()
        .map(|line| line.running_balance)
        .collect();
    assert_eq!(running, vec![dec("100"), dec("60"), dec("50")]);
}

#[tokio::test]
async fn statement_opening_balance_replays_history() {
    let app = spawn_app();
    app.seed_simple_ledger("eng-1").await;

    let statement = app
        .service
        .get_account_statement("eng-1", Some(at(2024, 1, 12, 0)), Some(at(2024, 1, 31, 0)))
        .await
        .unwrap();

    assert_eq!(statement.opening_balance, dec("60"));
    assert_eq!(statement.transactions.len(), 1);
    assert_eq!(statement.transactions[0].transaction_type, TransactionType::Refund);
    assert_eq!(statement.transactions[0].amount, dec("10"));
    assert_eq!(statement.closing_balance, dec("50"));
}

#[tokio::test]
async fn statement_lines_are_ordered_by_created_at() {
    let app = spawn_app();
    // Appended out of chronological order; the log keeps insertion order.
    app.seed_account(
        "eng-1",
        "Asha",
        vec![
            tx("late", TransactionType::Commission, "30", at(2024, 1, 20, 9)),
            tx("early", TransactionType::Commission, "100", at(2024, 1, 5, 9)),
            tx("mid", TransactionType::Withdrawal, "40", at(2024, 1, 10, 9)),
            tx("before", TransactionType::Commission, "5", at(2023, 12, 30, 9)),
        ],
    )
    .await;

    let statement = app
        .service
        .get_account_statement("eng-1", Some(at(2024, 1, 1, 0)), Some(at(2024, 1, 31, 0)))
        .await
        .unwrap();

    let ids: Vec<&str> = statement
        .transactions
        .iter()
        .map(|line| line.transaction_id.as_str())
        .collect();
    assert_eq!(ids, vec!["early", "mid", "late"]);

    let running: Vec<_> = statement
        .transactions
        .iter()
        .map(|line| line.running_balance)
        .collect();
    assert_eq!(running, vec![dec("105"), dec("65"), dec("95")]);
    assert_eq!(statement.opening_balance, dec("5"));
    assert_eq!(statement.closing_balance, dec("95"));
}

#[tokio::test]
async fn statement_bounds_cover_whole_days() {
    let app = spawn_app();
    app.seed_simple_ledger("eng-1").await;

    // Both bounds fall mid-day; the range still spans Jan 5 00:00 to Jan 10 23:59:59.999.
    let statement = app
        .service
        .get_account_statement("eng-1", Some(at(2024, 1, 5, 18)), Some(at(2024, 1, 10, 1)))
        .await
        .unwrap();

    assert_eq!(statement.start, at(2024, 1, 5, 0));
    assert_eq!(statement.transactions.len(), 2);
    assert_eq!(statement.closing_balance, dec("60"));
}

#[tokio::test]
async fn statement_day_boundaries_follow_reporting_offset() {
    // UTC+05:30: 2024-01-09T20:00Z is already Jan 10 locally.
    let app = spawn_app_with(PeriodCalculator::from_offset_minutes(330).unwrap());
    app.seed_account(
        "eng-1",
        "Asha",
        vec![tx(
            "late",
            TransactionType::Commission,
            "25",
            at(2024, 1, 9, 20),
        )],
    )
    .await;

    let jan_9 = app
        .service
        .get_account_statement("eng-1", Some(at(2024, 1, 9, 6)), Some(at(2024, 1, 9, 6)))
        .await
        .unwrap();
    let jan_10 = app
        .service
        .get_account_statement("eng-1", Some(at(2024, 1, 10, 6)), Some(at(2024, 1, 10, 6)))
        .await
        .unwrap();

    assert!(jan_9.transactions.is_empty());
    assert_eq!(jan_10.transactions.len(), 1);
    assert_eq!(jan_10.opening_balance, dec("0"));
}

#[tokio::test]
async fn statement_requires_both_bounds() {
    let app = spawn_app();
    app.seed_simple_ledger("eng-1").await;

    let missing_to = app
        .service
        .get_account_statement("eng-1", Some(at(2024, 1, 1, 0)), None)
        .await;
    let missing_from = app
        .service
        .get_account_statement("eng-1", None, Some(at(2024, 1, 31, 0)))
        .await;

    assert!(matches!(missing_to, Err(LedgerError::InvalidDateRange(_))));
    assert!(matches!(missing_from, Err(LedgerError::InvalidDateRange(_))));
}

#[tokio::test]
async fn statement_rejects_reversed_range() {
    let app = spawn_app();
    app.seed_simple_ledger("eng-1").await;

    let result = app
        .service
        .get_account_statement("eng-1", Some(at(2024, 2, 1, 0)), Some(at(2024, 1, 1, 0)))
        .await;

    assert!(matches!(result, Err(LedgerError::InvalidDateRange(_))));
}

#[tokio::test]
async fn statement_for_unknown_engineer_is_not_found() {
    let app = spawn_app();

    let result = app
        .service
        .get_account_statement("ghost", Some(at(2024, 1, 1, 0)), Some(at(2024, 1, 31, 0)))
        .await;

    match result {
        Err(LedgerError::AccountNotFound(id)) => assert_eq!(id, "ghost"),
        other => panic!("expected AccountNotFound, got {:?}", other),
    }
}

#[tokio::test]
async fn statement_coupon_breakdown_groups_in_range_commissions() {
    let app = spawn_app();
    app.seed_coupon("SAVE10", "Save ten", "10").await;
    app.seed_coupon("VIP", "VIP launch", "12.5").await;
    app.seed_account(
        "eng-1",
        "Asha",
        vec![
            sale("s1", "12.40", "SAVE10", "o1", at(2024, 1, 3, 9)),
            sale("s2", "7.60", "SAVE10", "o2", at(2024, 1, 4, 9)),
            sale("s3", "30", "VIP", "o3", at(2024, 1, 5, 9)),
            // Deleted coupon: counted in the totals, absent from the breakdown.
            sale("s4", "5", "GONE", "o4", at(2024, 1, 6, 9)),
            tx("w1", TransactionType::Withdrawal, "20", at(2024, 1, 7, 9)),
            // Outside the range.
            sale("s5", "99", "VIP", "o5", at(2024, 2, 1, 9)),
        ],
    )
    .await;

    let statement = app
        .service
        .get_account_statement("eng-1", Some(at(2024, 1, 1, 0)), Some(at(2024, 1, 31, 0)))
        .await
        .unwrap();

    assert_eq!(statement.summary.total_commissions, dec("55"));
    assert_eq!(statement.summary.net_amount, dec("35"));
    assert_eq!(statement.coupon_breakdown.len(), 2);

    let save10 = &statement.coupon_breakdown[0];
    assert_eq!(save10.coupon_code, "SAVE10");
    assert_eq!(save10.coupon_name, "Save ten");
    assert_eq!(save10.total_commission, dec("20.00"));
    assert_eq!(save10.transaction_count, 2);

    let vip = &statement.coupon_breakdown[1];
    assert_eq!(vip.coupon_code, "VIP");
    assert_eq!(vip.commission_rate, dec("12.5"));
    assert_eq!(vip.transaction_count, 1);

    // One batched coupon lookup; statements never look up orders.
    assert_eq!(app.store.coupon_queries(), 1);
    assert_eq!(app.store.order_queries(), 0);
}

#[tokio::test]
async fn statement_serializes_camel_case() {
    let app = spawn_app();
    app.seed_simple_ledger("eng-1").await;

    let statement = app
        .service
        .get_account_statement("eng-1", Some(at(2024, 1, 1, 0)), Some(at(2024, 1, 31, 0)))
        .await
        .unwrap();
    let json = serde_json::to_value(&statement).unwrap();

    assert!(json.get("openingBalance").is_some());
    assert!(json.get("couponBreakdown").is_some());
    assert_eq!(json["transactions"][1]["type"], "withdrawal");
    assert!(json["transactions"][0].get("runningBalance").is_some());
}
