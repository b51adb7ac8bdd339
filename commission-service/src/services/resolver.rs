//! Reference resolver: one batched lookup per reference type for a whole
//! working set of transactions.
//!
//! References that no longer resolve (soft-deleted coupons, purged orders)
//! are dropped from the result maps; callers treat them as contributing zero.

use rust_decimal::Decimal;
use service_core::error::AppError;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use tracing::{debug, instrument, warn};

use super::metrics::MISSING_REFERENCES;
use super::store::{CouponLookup, OrderLookup};
use crate::models::{CommissionTransaction, CouponMeta};

/// Deduplicated reference keys across a working set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReferenceKeys {
    coupon_codes: BTreeSet<String>,
    order_ids: BTreeSet<String>,
}

impl ReferenceKeys {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, tx: &CommissionTransaction) {
        if let Some(code) = &tx.coupon_code {
            self.coupon_codes.insert(code.clone());
        }
        if let Some(order_id) = &tx.order_id {
            self.order_ids.insert(order_id.clone());
        }
    }

    pub fn add_coupon(&mut self, code: &str) {
        self.coupon_codes.insert(code.to_string());
    }

    pub fn coupon_codes(&self) -> &BTreeSet<String> {
        &self.coupon_codes
    }

    pub fn order_ids(&self) -> &BTreeSet<String> {
        &self.order_ids
    }

    pub fn is_empty(&self) -> bool {
        self.coupon_codes.is_empty() && self.order_ids.is_empty()
    }
}

impl<'a> FromIterator<&'a CommissionTransaction> for ReferenceKeys {
    fn from_iter<I: IntoIterator<Item = &'a CommissionTransaction>>(iter: I) -> Self {
        let mut keys = Self::new();
        for tx in iter {
            keys.add(tx);
        }
        keys
    }
}

/// Request-scoped lookup results.
#[derive(Debug, Clone, Default)]
pub struct ResolvedReferences {
    coupons: HashMap<String, CouponMeta>,
    order_revenue: HashMap<String, Decimal>,
}

impl ResolvedReferences {
    pub fn coupon(&self, code: &str) -> Option<&CouponMeta> {
        self.coupons.get(code)
    }

    pub fn order_revenue(&self, order_id: &str) -> Option<Decimal> {
        self.order_revenue.get(order_id).copied()
    }

    /// Revenue attributed to `tx`; zero without a resolvable order.
    pub fn revenue_for(&self, tx: &CommissionTransaction) -> Decimal {
        tx.order_id
            .as_deref()
            .and_then(|id| self.order_revenue(id))
            .unwrap_or(Decimal::ZERO)
    }
}

#[derive(Clone)]
pub struct ReferenceResolver {
    coupons: Arc<dyn CouponLookup>,
    orders: Arc<dyn OrderLookup>,
}

impl ReferenceResolver {
    pub fn new(coupons: Arc<dyn CouponLookup>, orders: Arc<dyn OrderLookup>) -> Self {
        Self { coupons, orders }
    }

    /// Resolve every key with at most one query per reference type.
    #[instrument(skip(self, keys), fields(coupon_codes = keys.coupon_codes.len(), order_ids = keys.order_ids.len()))]
    pub async fn resolve(&self, keys: &ReferenceKeys) -> Result<ResolvedReferences, AppError> {
        let mut resolved = ResolvedReferences::default();
        if keys.is_empty() {
            return Ok(resolved);
        }

        if !keys.coupon_codes.is_empty() {
            let codes: Vec<String> = keys.coupon_codes.iter().cloned().collect();
            resolved.coupons = self
                .coupons
                .find_by_codes(&codes)
                .await?
                .into_iter()
                .filter(|coupon| !coupon.is_deleted)
                .map(|coupon| (coupon.code.clone(), coupon))
                .collect();

            let missing = codes.len() - resolved.coupons.len().min(codes.len());
            if missing > 0 {
                warn!(missing, "Coupon references did not resolve; treating as unlabeled");
                MISSING_REFERENCES
                    .with_label_values(&["coupon"])
                    .inc_by(missing as f64);
            }
        }

        if !keys.order_ids.is_empty() {
            let ids: Vec<String> = keys.order_ids.iter().cloned().collect();
            resolved.order_revenue = self
                .orders
                .find_by_ids(&ids)
                .await?
                .into_iter()
                .map(|order| (order.id, order.subtotal))
                .collect();

            let missing = ids.len() - resolved.order_revenue.len().min(ids.len());
            if missing > 0 {
                warn!(missing, "Order references did not resolve; revenue counts as zero");
                MISSING_REFERENCES
                    .with_label_values(&["order"])
                    .inc_by(missing as f64);
            }
        }

        debug!(
            coupons = resolved.coupons.len(),
            orders = resolved.order_revenue.len(),
            "References resolved"
        );

        Ok(resolved)
    }
}
