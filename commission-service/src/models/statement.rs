//! Account statement DTOs.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::account::TransactionType;

/// Statement line with running balance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatementLine {
    pub transaction_id: String,
    #[serde(rename = "type")]
    pub transaction_type: TransactionType,
    pub amount: Decimal,
    pub order_id: Option<String>,
    pub coupon_code: Option<String>,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub running_balance: Decimal,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatementSummary {
    pub total_commissions: Decimal,
    pub total_withdrawals: Decimal,
    pub total_refunds: Decimal,
    pub net_amount: Decimal,
    pub transaction_count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CouponBreakdown {
    pub coupon_code: String,
    pub coupon_name: String,
    pub commission_rate: Decimal,
    pub total_commission: Decimal,
    pub transaction_count: u64,
}

/// Account statement for a date range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountStatement {
    pub engineer_id: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub opening_balance: Decimal,
    pub closing_balance: Decimal,
    pub summary: StatementSummary,
    pub transactions: Vec<StatementLine>,
    pub coupon_breakdown: Vec<CouponBreakdown>,
}
