//! In-process store for embedding the ledger without MongoDB.

use async_trait::async_trait;
use service_core::error::AppError;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::RwLock;

use super::store::{AccountStore, CouponLookup, OrderLookup};
use crate::models::{CouponMeta, EngineerAccount, OrderRevenue};

#[derive(Default)]
pub struct InMemoryStore {
    accounts: RwLock<BTreeMap<String, EngineerAccount>>,
    coupons: RwLock<HashMap<String, CouponMeta>>,
    orders: RwLock<HashMap<String, OrderRevenue>>,
    coupon_queries: AtomicUsize,
    order_queries: AtomicUsize,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn put_coupon(&self, coupon: CouponMeta) {
        self.coupons.write().await.insert(coupon.code.clone(), coupon);
    }

    pub async fn put_order(&self, order: OrderRevenue) {
        self.orders.write().await.insert(order.id.clone(), order);
    }

    /// Number of coupon lookups served so far.
    pub fn coupon_queries(&self) -> usize {
        self.coupon_queries.load(Ordering::SeqCst)
    }

    /// Number of order lookups served so far.
    pub fn order_queries(&self) -> usize {
        self.order_queries.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AccountStore for InMemoryStore {
    async fn find_one(&self, engineer_id: &str) -> Result<Option<EngineerAccount>, AppError> {
        Ok(self.accounts.read().await.get(engineer_id).cloned())
    }

    async fn find_all(&self) -> Result<Vec<EngineerAccount>, AppError> {
        Ok(self.accounts.read().await.values().cloned().collect())
    }

    async fn insert(&self, account: &EngineerAccount) -> Result<bool, AppError> {
        let mut accounts = self.accounts.write().await;
        if accounts.contains_key(&account.engineer_id) {
            return Ok(false);
        }
        accounts.insert(account.engineer_id.clone(), account.clone());
        Ok(true)
    }

    async fn replace_versioned(&self, account: &EngineerAccount) -> Result<bool, AppError> {
        let mut accounts = self.accounts.write().await;
        match accounts.get_mut(&account.engineer_id) {
            Some(stored) if stored.version == account.version => {
                let mut next = account.clone();
                next.version += 1;
                *stored = next;
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

#[async_trait]
impl CouponLookup for InMemoryStore {
    async fn find_by_codes(&self, codes: &[String]) -> Result<Vec<CouponMeta>, AppError> {
        self.coupon_queries.fetch_add(1, Ordering::SeqCst);
        let coupons = self.coupons.read().await;
        Ok(codes
            .iter()
            .filter_map(|code| coupons.get(code))
            .filter(|coupon| !coupon.is_deleted)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl OrderLookup for InMemoryStore {
    async fn find_by_ids(&self, ids: &[String]) -> Result<Vec<OrderRevenue>, AppError> {
        self.order_queries.fetch_add(1, Ordering::SeqCst);
        let orders = self.orders.read().await;
        Ok(ids.iter().filter_map(|id| orders.get(id)).cloned().collect())
    }
}
