//! MongoDB storage for commission-service.
//!
//! Transactions live embedded in the engineer account document, so a
//! statement replay is one document fetch. Long-lived accounts grow without
//! bound; that limit is inherited from the document layout.

use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::{
    bson::{doc, oid::ObjectId, Bson, Document},
    error::{ErrorKind, WriteFailure},
    options::{FindOptions, IndexOptions},
    Client as MongoClient, Collection, Database, IndexModel,
};
use service_core::error::AppError;
use tracing::{info, instrument};

use super::metrics::DB_QUERY_DURATION;
use super::store::{AccountStore, CouponLookup, OrderLookup};
use crate::models::{CouponMeta, EngineerAccount, OrderRevenue};

const DUPLICATE_KEY: i32 = 11000;

#[derive(Clone)]
pub struct CommissionDb {
    client: MongoClient,
    db: Database,
}

impl CommissionDb {
    pub async fn connect(uri: &str, database: &str) -> Result<Self, AppError> {
        info!(database = %database, "Connecting to MongoDB");
        let client = MongoClient::with_uri_str(uri).await.map_err(|e| {
            tracing::error!("Failed to connect to MongoDB: {}", e);
            AppError::DatabaseError(anyhow::anyhow!(e.to_string()))
        })?;
        let db = client.database(database);
        info!(database = %database, "Successfully connected to MongoDB database");
        Ok(Self { client, db })
    }

    pub async fn initialize_indexes(&self) -> Result<(), AppError> {
        info!("Creating MongoDB indexes for commission-service");

        let engineer_index = IndexModel::builder()
            .keys(doc! { "engineer_id": 1 })
            .options(
                IndexOptions::builder()
                    .name("engineer_id_idx".to_string())
                    .unique(true)
                    .build(),
            )
            .build();

        self.accounts()
            .create_index(engineer_index, None)
            .await
            .map_err(|e| {
                tracing::error!("Failed to create engineer_id index: {}", e);
                AppError::DatabaseError(anyhow::anyhow!(e.to_string()))
            })?;

        let coupon_index = IndexModel::builder()
            .keys(doc! { "code": 1 })
            .options(
                IndexOptions::builder()
                    .name("coupon_code_idx".to_string())
                    .unique(true)
                    .build(),
            )
            .build();

        self.coupons()
            .create_index(coupon_index, None)
            .await
            .map_err(|e| {
                tracing::error!("Failed to create coupon code index: {}", e);
                AppError::DatabaseError(anyhow::anyhow!(e.to_string()))
            })?;

        info!("Successfully created all MongoDB indexes");
        Ok(())
    }

    pub async fn health_check(&self) -> Result<(), AppError> {
        self.client
            .database("admin")
            .run_command(doc! { "ping": 1 }, None)
            .await
            .map_err(|e| {
                tracing::error!("MongoDB health check failed: {}", e);
                AppError::DatabaseError(anyhow::anyhow!(e.to_string()))
            })?;
        Ok(())
    }

    pub fn accounts(&self) -> Collection<EngineerAccount> {
        self.db.collection("engineer_accounts")
    }

    pub fn coupons(&self) -> Collection<CouponMeta> {
        self.db.collection("coupons")
    }

    pub fn orders(&self) -> Collection<OrderRevenue> {
        self.db.collection("orders")
    }
}

#[async_trait]
impl AccountStore for CommissionDb {
    #[instrument(skip(self))]
    async fn find_one(&self, engineer_id: &str) -> Result<Option<EngineerAccount>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["find_account"])
            .start_timer();

        let account = self
            .accounts()
            .find_one(doc! { "engineer_id": engineer_id }, None)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to get account: {}", e)))?;

        timer.observe_duration();
        Ok(account)
    }

    #[instrument(skip(self))]
    async fn find_all(&self) -> Result<Vec<EngineerAccount>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["find_accounts"])
            .start_timer();

        let options = FindOptions::builder()
            .sort(doc! { "engineer_id": 1 })
            .build();

        let cursor = self
            .accounts()
            .find(doc! {}, options)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to list accounts: {}", e)))?;

        let accounts: Vec<EngineerAccount> = cursor.try_collect().await.map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to collect accounts: {}", e))
        })?;

        timer.observe_duration();
        Ok(accounts)
    }

    #[instrument(skip(self, account), fields(engineer_id = %account.engineer_id))]
    async fn insert(&self, account: &EngineerAccount) -> Result<bool, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["insert_account"])
            .start_timer();

        let result = self.accounts().insert_one(account, None).await;
        timer.observe_duration();

        match result {
            Ok(_) => Ok(true),
            Err(e) => match *e.kind {
                ErrorKind::Write(WriteFailure::WriteError(ref write_error))
                    if write_error.code == DUPLICATE_KEY =>
                {
                    Ok(false)
                }
                _ => Err(AppError::DatabaseError(anyhow::anyhow!(
                    "Failed to insert account: {}",
                    e
                ))),
            },
        }
    }

    #[instrument(skip(self, account), fields(engineer_id = %account.engineer_id, version = account.version))]
    async fn replace_versioned(&self, account: &EngineerAccount) -> Result<bool, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["replace_account"])
            .start_timer();

        let mut next = account.clone();
        next.version = account.version + 1;

        let result = self
            .accounts()
            .replace_one(
                doc! { "engineer_id": account.engineer_id.as_str(), "version": account.version },
                &next,
                None,
            )
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to save account: {}", e)))?;

        timer.observe_duration();
        Ok(result.matched_count == 1)
    }
}

#[async_trait]
impl CouponLookup for CommissionDb {
    #[instrument(skip(self, codes), fields(count = codes.len()))]
    async fn find_by_codes(&self, codes: &[String]) -> Result<Vec<CouponMeta>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["find_coupons"])
            .start_timer();

        let cursor = self
            .coupons()
            .find(
                doc! { "code": { "$in": codes.to_vec() }, "is_deleted": { "$ne": true } },
                None,
            )
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to find coupons: {}", e)))?;

        let coupons: Vec<CouponMeta> = cursor.try_collect().await.map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to collect coupons: {}", e))
        })?;

        timer.observe_duration();
        Ok(coupons)
    }
}

#[async_trait]
impl OrderLookup for CommissionDb {
    #[instrument(skip(self, ids), fields(count = ids.len()))]
    async fn find_by_ids(&self, ids: &[String]) -> Result<Vec<OrderRevenue>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["find_orders"])
            .start_timer();

        let cursor = self
            .orders()
            .find(order_id_filter(ids), None)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to find orders: {}", e)))?;

        let orders: Vec<OrderRevenue> = cursor.try_collect().await.map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to collect orders: {}", e))
        })?;

        timer.observe_duration();
        Ok(orders)
    }
}

/// Order ids arrive as strings; the orders collection keys by ObjectId, so
/// every id that parses as one is matched in both forms.
fn order_id_filter(ids: &[String]) -> Document {
    let mut keys: Vec<Bson> = Vec::with_capacity(ids.len() * 2);
    for id in ids {
        if let Ok(oid) = ObjectId::parse_str(id) {
            keys.push(Bson::ObjectId(oid));
        }
        keys.push(Bson::String(id.clone()));
    }
    doc! { "_id": { "$in": keys } }
}
