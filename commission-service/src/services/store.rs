//! Storage seams: the engineer account store and the two read-only
//! reference lookups owned by other services.

use async_trait::async_trait;
use service_core::error::AppError;

use crate::models::{CouponMeta, EngineerAccount, OrderRevenue};

/// Engineer account documents with embedded transactions.
#[async_trait]
pub trait AccountStore: Send + Sync {
    async fn find_one(&self, engineer_id: &str) -> Result<Option<EngineerAccount>, AppError>;

    /// Every account, ordered by `engineer_id`.
    async fn find_all(&self) -> Result<Vec<EngineerAccount>, AppError>;

    /// Insert a new account. Returns `false` if one already exists.
    async fn insert(&self, account: &EngineerAccount) -> Result<bool, AppError>;

    /// Replace the stored account only if its version still equals
    /// `account.version`; the stored copy gets `version + 1`. Returns `false`
    /// on a version mismatch.
    async fn replace_versioned(&self, account: &EngineerAccount) -> Result<bool, AppError>;
}

/// Coupon lookup. Soft-deleted coupons are never returned.
#[async_trait]
pub trait CouponLookup: Send + Sync {
    async fn find_by_codes(&self, codes: &[String]) -> Result<Vec<CouponMeta>, AppError>;
}

/// Settled order lookup.
#[async_trait]
pub trait OrderLookup: Send + Sync {
    async fn find_by_ids(&self, ids: &[String]) -> Result<Vec<OrderRevenue>, AppError>;
}
