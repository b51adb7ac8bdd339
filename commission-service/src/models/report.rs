//! Commission report DTOs. Computed on demand, never persisted.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::services::period::Period;

/// Input for a commissions report.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommissionsReportQuery {
    pub period: Period,
    #[serde(default)]
    pub from: Option<DateTime<Utc>>,
    #[serde(default)]
    pub to: Option<DateTime<Utc>>,
    #[serde(default)]
    pub engineer_id: Option<String>,
}

impl CommissionsReportQuery {
    pub fn new(period: Period) -> Self {
        Self {
            period,
            from: None,
            to: None,
            engineer_id: None,
        }
    }

    pub fn between(mut self, from: DateTime<Utc>, to: DateTime<Utc>) -> Self {
        self.from = Some(from);
        self.to = Some(to);
        self
    }

    pub fn for_engineer(mut self, engineer_id: impl Into<String>) -> Self {
        self.engineer_id = Some(engineer_id.into());
        self
    }
}

/// Per-coupon commission aggregate. `coupon_name` and `commission_rate` are
/// absent when the coupon no longer resolves.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CouponAggregate {
    pub coupon_code: String,
    pub coupon_name: Option<String>,
    pub commission_rate: Option<Decimal>,
    pub total_commission: Decimal,
    pub total_sales: u64,
    pub total_revenue: Decimal,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineerTotals {
    pub total_commission: Decimal,
    pub total_sales: u64,
    pub total_revenue: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineerReportLine {
    pub engineer_id: String,
    pub engineer_name: String,
    pub engineer_phone: Option<String>,
    pub coupons: Vec<CouponAggregate>,
    pub totals: EngineerTotals,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PeriodBucket {
    pub period_key: String,
    pub total_commission: Decimal,
    pub total_sales: u64,
    pub total_revenue: Decimal,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportSummary {
    pub total_engineers: u64,
    pub total_commissions: Decimal,
    pub total_sales: u64,
    pub total_revenue: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommissionsReport {
    pub period: Period,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub summary: ReportSummary,
    pub engineers: Vec<EngineerReportLine>,
    pub period_breakdown: Vec<PeriodBucket>,
}
