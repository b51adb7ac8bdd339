//! Ledger write path integration tests.

mod common;

use commission_service::error::LedgerError;
use commission_service::models::TransactionType;
use commission_service::services::{AccountStore, AppendOutcome};
use common::{at, dec, sale, spawn_app, tx};

#[tokio::test]
async fn appends_move_wallet_balance_by_signed_amount() {
    let app = spawn_app();
    app.seed_simple_ledger("eng-1").await;

    let account = app.store.find_one("eng-1").await.unwrap().unwrap();

    assert_eq!(account.wallet_balance(), dec("50"));
    assert_eq!(account.transactions().len(), 3);
    assert_eq!(account.statistics.total_commissions, dec("100"));
    assert_eq!(account.statistics.total_withdrawals, dec("40"));
    assert_eq!(account.statistics.total_refunds, dec("10"));
    assert_eq!(account.statistics.transaction_count, 3);
    assert_eq!(account.statistics.last_transaction_at, Some(at(2024, 1, 15, 10)));
}

#[tokio::test]
async fn balance_at_replays_up_to_instant() {
    let app = spawn_app();
    app.seed_simple_ledger("eng-1").await;

    let account = app.store.find_one("eng-1").await.unwrap().unwrap();

    assert_eq!(account.balance_at(at(2024, 1, 4, 0)), dec("0"));
    assert_eq!(account.balance_at(at(2024, 1, 10, 10)), dec("60"));
    assert_eq!(account.balance_before(at(2024, 1, 10, 10)), dec("100"));
    assert_eq!(account.balance_at(at(2025, 1, 1, 0)), account.wallet_balance());
}

#[tokio::test]
async fn replayed_transaction_id_is_ignored() {
    let app = spawn_app();
    app.seed_account("eng-1", "Asha", vec![]).await;

    let input = sale("s1", "12.34", "SAVE10", "o1", at(2024, 3, 1, 9));
    let first = app
        .service
        .append_transaction("eng-1", input.clone())
        .await
        .unwrap();
    let replay = app.service.append_transaction("eng-1", input).await.unwrap();

    assert!(matches!(first, AppendOutcome::Appended(ref tx) if tx.transaction_id == "s1"));
    assert_eq!(replay, AppendOutcome::Duplicate);

    let account = app.store.find_one("eng-1").await.unwrap().unwrap();
    assert_eq!(account.wallet_balance(), dec("12.34"));
}

#[tokio::test]
async fn negative_amount_is_rejected_without_writing() {
    let app = spawn_app();
    app.seed_account("eng-1", "Asha", vec![]).await;

    let result = app
        .service
        .append_transaction(
            "eng-1",
            tx("bad", TransactionType::Withdrawal, "-5", at(2024, 3, 1, 9)),
        )
        .await;

    assert!(matches!(result, Err(LedgerError::InvalidAmount(_))));
    let account = app.store.find_one("eng-1").await.unwrap().unwrap();
    assert!(account.transactions().is_empty());
    assert_eq!(account.version, 0);
}

#[tokio::test]
async fn withdrawals_may_overdraw() {
    let app = spawn_app();
    app.seed_account(
        "eng-1",
        "Asha",
        vec![tx("w1", TransactionType::Withdrawal, "25", at(2024, 3, 1, 9))],
    )
    .await;

    let account = app.store.find_one("eng-1").await.unwrap().unwrap();
    assert_eq!(account.wallet_balance(), dec("-25"));
}

#[tokio::test]
async fn append_to_unknown_engineer_is_not_found() {
    let app = spawn_app();

    let result = app
        .service
        .append_transaction(
            "ghost",
            tx("c1", TransactionType::Commission, "1", at(2024, 3, 1, 9)),
        )
        .await;

    assert!(matches!(result, Err(LedgerError::AccountNotFound(_))));
}
