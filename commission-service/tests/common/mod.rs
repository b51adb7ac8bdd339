//! Common test utilities for commission-service integration tests.
//!
//! Tests run against the in-memory store; no database is required.

#![allow(dead_code)]

use chrono::{DateTime, TimeZone, Utc};
use commission_service::models::{CouponMeta, NewTransaction, OrderRevenue, TransactionType};
use commission_service::services::{
    AppendOutcome, AppendPolicy, CommissionService, InMemoryStore, PeriodCalculator,
};
use rust_decimal::Decimal;
use std::sync::{Arc, Once};

static INIT: Once = Once::new();

/// Initialize tracing for tests (only once).
pub fn init_tracing() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter("info,commission_service=debug")
            .with_test_writer()
            .try_init()
            .ok();
    });
}

pub struct TestApp {
    pub store: Arc<InMemoryStore>,
    pub service: CommissionService,
}

/// Build a service over a fresh in-memory store, reporting in UTC.
pub fn spawn_app() -> TestApp {
    spawn_app_with(PeriodCalculator::utc())
}

pub fn spawn_app_with(periods: PeriodCalculator) -> TestApp {
    init_tracing();

    let store = Arc::new(InMemoryStore::new());
    let service = CommissionService::new(
        store.clone(),
        store.clone(),
        store.clone(),
        periods,
        AppendPolicy::default(),
    );

    TestApp { store, service }
}

pub fn dec(value: &str) -> Decimal {
    value.parse().expect("valid decimal literal")
}

pub fn at(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, h, 0, 0)
        .single()
        .expect("valid test timestamp")
}

pub fn tx(
    id: &str,
    transaction_type: TransactionType,
    amount: &str,
    created_at: DateTime<Utc>,
) -> NewTransaction {
    NewTransaction {
        transaction_id: id.to_string(),
        transaction_type,
        amount: dec(amount),
        order_id: None,
        coupon_code: None,
        description: None,
        created_at,
    }
}

/// A commission transaction tied to a coupon and an order.
pub fn sale(
    id: &str,
    amount: &str,
    coupon: &str,
    order: &str,
    created_at: DateTime<Utc>,
) -> NewTransaction {
    NewTransaction {
        coupon_code: Some(coupon.to_string()),
        order_id: Some(order.to_string()),
        ..tx(id, TransactionType::Commission, amount, created_at)
    }
}

impl TestApp {
    /// Open `engineer_id` and append every transaction in order.
    pub async fn seed_account(&self, engineer_id: &str, name: &str, txs: Vec<NewTransaction>) {
        self.service
            .open_account(engineer_id, name, Some(format!("+1-555-{}", engineer_id)))
            .await
            .expect("Failed to open account");

        for input in txs {
            let outcome = self
                .service
                .append_transaction(engineer_id, input)
                .await
                .expect("Failed to append transaction");
            assert!(matches!(outcome, AppendOutcome::Appended(_)));
        }
    }

    pub async fn seed_coupon(&self, code: &str, name: &str, rate: &str) {
        self.store
            .put_coupon(CouponMeta {
                code: code.to_string(),
                name: name.to_string(),
                commission_rate: dec(rate),
                is_deleted: false,
            })
            .await;
    }

    pub async fn seed_order(&self, id: &str, subtotal: &str) {
        self.store
            .put_order(OrderRevenue {
                id: id.to_string(),
                subtotal: dec(subtotal),
            })
            .await;
    }

    /// The simple ledger used across statement scenarios.
    pub async fn seed_simple_ledger(&self, engineer_id: &str) {
        self.seed_account(
            engineer_id,
            "Asha",
            vec![
                tx("c1", TransactionType::Commission, "100", at(2024, 1, 5, 10)),
                tx("w1", TransactionType::Withdrawal, "40", at(2024, 1, 10, 10)),
                tx("r1", TransactionType::Refund, "10", at(2024, 1, 15, 10)),
            ],
        )
        .await;
    }
}
