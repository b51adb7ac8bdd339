//! Read-only views of coupon and order records owned by other services.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Coupon fields needed to label commission aggregates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CouponMeta {
    pub code: String,
    pub name: String,
    /// Percentage, 0-100.
    pub commission_rate: Decimal,
    #[serde(default)]
    pub is_deleted: bool,
}

/// Settled order total used to attribute revenue to a commission.
///
/// Order documents are keyed by ObjectId; `id` holds its hex form so it
/// compares directly with the `order_id` recorded on a transaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderRevenue {
    #[serde(rename = "_id", deserialize_with = "order_id::deserialize")]
    pub id: String,
    pub subtotal: Decimal,
}

mod order_id {
    use mongodb::bson::Bson;
    use serde::de::{Deserialize, Deserializer, Error};

    pub fn deserialize<'de, D>(deserializer: D) -> Result<String, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Bson::deserialize(deserializer)? {
            Bson::ObjectId(oid) => Ok(oid.to_hex()),
            Bson::String(id) => Ok(id),
            other => Err(D::Error::custom(format!(
                "unsupported order _id type: {:?}",
                other.element_type()
            ))),
        }
    }
}
