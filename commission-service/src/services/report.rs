//! Report aggregator: per-engineer, per-coupon commission totals plus a
//! global period breakdown.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

use super::metrics::{REPORTS_TOTAL, REPORT_DURATION};
use super::period::PeriodCalculator;
use super::resolver::{ReferenceKeys, ReferenceResolver, ResolvedReferences};
use super::store::AccountStore;
use crate::error::LedgerError;
use crate::models::{
    round_money, CommissionTransaction, CommissionsReport, CommissionsReportQuery,
    CouponAggregate, EngineerAccount, EngineerReportLine, EngineerTotals, PeriodBucket,
    ReportSummary,
};

/// Full-precision running totals for one group.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct Tally {
    pub commission: Decimal,
    pub sales: u64,
    pub revenue: Decimal,
}

impl Tally {
    pub fn record(&mut self, tx: &CommissionTransaction, refs: &ResolvedReferences) {
        self.commission += tx.amount;
        self.sales += 1;
        self.revenue += refs.revenue_for(tx);
    }

    pub fn merge(&mut self, other: &Tally) {
        self.commission += other.commission;
        self.sales += other.sales;
        self.revenue += other.revenue;
    }
}

/// Group transactions by `key`, skipping those without one. Ordered by key.
pub(crate) fn tally_by<'a, K, F>(
    txs: impl IntoIterator<Item = &'a CommissionTransaction>,
    refs: &ResolvedReferences,
    key: F,
) -> BTreeMap<K, Tally>
where
    K: Ord,
    F: Fn(&CommissionTransaction) -> Option<K>,
{
    let mut groups: BTreeMap<K, Tally> = BTreeMap::new();
    for tx in txs {
        if let Some(k) = key(tx) {
            groups.entry(k).or_default().record(tx, refs);
        }
    }
    groups
}

#[derive(Clone)]
pub struct ReportAggregator {
    accounts: Arc<dyn AccountStore>,
    resolver: ReferenceResolver,
    periods: PeriodCalculator,
}

impl ReportAggregator {
    pub fn new(
        accounts: Arc<dyn AccountStore>,
        resolver: ReferenceResolver,
        periods: PeriodCalculator,
    ) -> Self {
        Self {
            accounts,
            resolver,
            periods,
        }
    }

    pub async fn get_commissions_report(
        &self,
        query: &CommissionsReportQuery,
    ) -> Result<CommissionsReport, LedgerError> {
        self.get_commissions_report_at(query, Utc::now()).await
    }

    /// Build the report with relative periods resolved against `now`.
    #[instrument(skip(self, query), fields(period = %query.period, engineer_id = ?query.engineer_id))]
    pub async fn get_commissions_report_at(
        &self,
        query: &CommissionsReportQuery,
        now: DateTime<Utc>,
    ) -> Result<CommissionsReport, LedgerError> {
        let timer = REPORT_DURATION
            .with_label_values(&["commissions"])
            .start_timer();

        let result = self.build(query, now).await;

        timer.observe_duration();
        let status = match &result {
            Ok(_) => "ok",
            Err(e) => {
                warn!(error_kind = e.kind(), error = %e, "Commissions report failed");
                "error"
            }
        };
        REPORTS_TOTAL
            .with_label_values(&["commissions", status])
            .inc();

        result
    }

    async fn build(
        &self,
        query: &CommissionsReportQuery,
        now: DateTime<Utc>,
    ) -> Result<CommissionsReport, LedgerError> {
        let range = self
            .periods
            .calculate_range_at(query.period, query.from, query.to, now)?;

        // The period breakdown spans every engineer even for a filtered report,
        // so all accounts are loaded once.
        let accounts = self.accounts.find_all().await?;

        let in_range: Vec<(&EngineerAccount, Vec<&CommissionTransaction>)> = accounts
            .iter()
            .map(|account| {
                let txs = account
                    .transactions()
                    .iter()
                    .filter(|tx| tx.is_commission() && range.contains(tx.created_at))
                    .collect();
                (account, txs)
            })
            .collect();

        let keys: ReferenceKeys = in_range
            .iter()
            .flat_map(|(_, txs)| txs.iter().copied())
            .collect();
        let refs = self.resolver.resolve(&keys).await?;

        let mut engineers = Vec::new();
        let mut grand = Tally::default();

        for (account, txs) in &in_range {
            if let Some(wanted) = &query.engineer_id {
                if account.engineer_id != *wanted {
                    continue;
                }
            } else if txs.is_empty() {
                continue;
            }

            let groups = tally_by(txs.iter().copied(), &refs, |tx| tx.coupon_code.clone());

            let mut totals = Tally::default();
            let coupons: Vec<CouponAggregate> = groups
                .into_iter()
                .map(|(code, tally)| {
                    totals.merge(&tally);
                    let coupon = refs.coupon(&code);
                    CouponAggregate {
                        coupon_name: coupon.map(|c| c.name.clone()),
                        commission_rate: coupon.map(|c| c.commission_rate),
                        coupon_code: code,
                        total_commission: round_money(tally.commission),
                        total_sales: tally.sales,
                        total_revenue: round_money(tally.revenue),
                    }
                })
                .collect();

            grand.merge(&totals);
            engineers.push(EngineerReportLine {
                engineer_id: account.engineer_id.clone(),
                engineer_name: account.name.clone(),
                engineer_phone: account.phone.clone(),
                coupons,
                totals: EngineerTotals {
                    total_commission: round_money(totals.commission),
                    total_sales: totals.sales,
                    total_revenue: round_money(totals.revenue),
                },
            });
        }

        let period_breakdown = tally_by(
            in_range.iter().flat_map(|(_, txs)| txs.iter().copied()),
            &refs,
            |tx| Some(self.periods.format_bucket_key(query.period, tx.created_at)),
        )
        .into_iter()
        .map(|(period_key, tally)| PeriodBucket {
            period_key,
            total_commission: round_money(tally.commission),
            total_sales: tally.sales,
            total_revenue: round_money(tally.revenue),
        })
        .collect::<Vec<_>>();

        debug!(
            candidates = in_range.len(),
            buckets = period_breakdown.len(),
            "Report aggregated"
        );

        let summary = ReportSummary {
            total_engineers: engineers.len() as u64,
            total_commissions: round_money(grand.commission),
            total_sales: grand.sales,
            total_revenue: round_money(grand.revenue),
        };

        info!(
            start = %range.start,
            end = %range.end,
            engineers = summary.total_engineers,
            total_commissions = %summary.total_commissions,
            "Commissions report generated"
        );

        Ok(CommissionsReport {
            period: query.period,
            start: range.start,
            end: range.end,
            summary,
            engineers,
            period_breakdown,
        })
    }
}
