//! Statement generator: opening balance by full history replay, in-range
//! lines with running balance, closing balance and coupon breakdown.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::{info, instrument, warn};

use super::metrics::{REPORTS_TOTAL, REPORT_DURATION};
use super::period::PeriodCalculator;
use super::report::tally_by;
use super::resolver::{ReferenceKeys, ReferenceResolver};
use super::store::AccountStore;
use crate::error::LedgerError;
use crate::models::{
    round_money, AccountStatement, CommissionTransaction, CouponBreakdown, StatementLine,
    StatementSummary, TransactionType,
};

#[derive(Clone)]
pub struct StatementGenerator {
    accounts: Arc<dyn AccountStore>,
    resolver: ReferenceResolver,
    periods: PeriodCalculator,
}

impl StatementGenerator {
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

    /// Statement for `engineer_id` over the whole local days `from..=to`.
    #[instrument(skip(self), fields(engineer_id = %engineer_id))]
    pub async fn get_account_statement(
        &self,
        engineer_id: &str,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
    ) -> Result<AccountStatement, LedgerError> {
        let timer = REPORT_DURATION.with_label_values(&["statement"]).start_timer();

        let result = self.build(engineer_id, from, to).await;

        timer.observe_duration();
        let status = match &result {
            Ok(_) => "ok",
            Err(e) => {
                warn!(error_kind = e.kind(), error = %e, "Account statement failed");
                "error"
            }
        };
        REPORTS_TOTAL.with_label_values(&["statement", status]).inc();

        result
    }

    async fn build(
        &self,
        engineer_id: &str,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
    ) -> Result<AccountStatement, LedgerError> {
        let (from, to) = match (from, to) {
            (Some(from), Some(to)) => (from, to),
            _ => {
                return Err(LedgerError::InvalidDateRange(
                    "both 'from' and 'to' are required".to_string(),
                ))
            }
        };

        let range = self.periods.day_range(from, to).ok_or_else(|| {
            LedgerError::InvalidDateRange(format!("bounds {} to {} are out of range", from, to))
        })?;
        if range.start > range.end {
            return Err(LedgerError::InvalidDateRange(format!(
                "'from' ({}) is after 'to' ({})",
                from, to
            )));
        }

        let account = self
            .accounts
            .find_one(engineer_id)
            .await?
            .ok_or_else(|| LedgerError::AccountNotFound(engineer_id.to_string()))?;

        // O(n) over full history; there is no checkpoint to start from.
        let opening_balance = account.balance_before(range.start);

        let mut in_range: Vec<&CommissionTransaction> = account
            .transactions()
            .iter()
            .filter(|tx| range.contains(tx.created_at))
            .collect();
        in_range.sort_by_key(|tx| tx.created_at);

        let mut summary = Totals::default();
        let mut running = opening_balance;
        let lines: Vec<StatementLine> = in_range
            .iter()
            .map(|tx| {
                summary.record(tx);
                running += tx.signed_amount();
                StatementLine {
                    transaction_id: tx.transaction_id.clone(),
                    transaction_type: tx.transaction_type,
                    amount: round_money(tx.amount),
                    order_id: tx.order_id.clone(),
                    coupon_code: tx.coupon_code.clone(),
                    description: tx.description.clone(),
                    created_at: tx.created_at,
                    running_balance: round_money(running),
                }
            })
            .collect();

        let net_amount = summary.commissions - summary.withdrawals - summary.refunds;
        let closing_balance = opening_balance + net_amount;

        let commissions = in_range.iter().copied().filter(|tx| tx.is_commission());
        let mut keys = ReferenceKeys::new();
        for tx in commissions.clone() {
            if let Some(code) = &tx.coupon_code {
                keys.add_coupon(code);
            }
        }
        let refs = self.resolver.resolve(&keys).await?;

        let coupon_breakdown = tally_by(commissions, &refs, |tx| tx.coupon_code.clone())
            .into_iter()
            .filter_map(|(code, tally)| {
                let coupon = refs.coupon(&code)?;
                Some(CouponBreakdown {
                    coupon_name: coupon.name.clone(),
                    commission_rate: coupon.commission_rate,
                    coupon_code: code,
                    total_commission: round_money(tally.commission),
                    transaction_count: tally.sales,
                })
            })
            .collect();

        info!(
            start = %range.start,
            end = %range.end,
            lines = lines.len(),
            opening_balance = %opening_balance,
            closing_balance = %closing_balance,
            "Account statement generated"
        );

        Ok(AccountStatement {
            engineer_id: account.engineer_id.clone(),
            start: range.start,
            end: range.end,
            opening_balance: round_money(opening_balance),
            closing_balance: round_money(closing_balance),
            summary: StatementSummary {
                total_commissions: round_money(summary.commissions),
                total_withdrawals: round_money(summary.withdrawals),
                total_refunds: round_money(summary.refunds),
                net_amount: round_money(net_amount),
                transaction_count: summary.count,
            },
            transactions: lines,
            coupon_breakdown,
        })
    }
}

#[derive(Debug, Default)]
struct Totals {
    commissions: Decimal,
    withdrawals: Decimal,
    refunds: Decimal,
    count: u64,
}

impl Totals {
    fn record(&mut self, tx: &CommissionTransaction) {
        match tx.transaction_type {
            TransactionType::Commission => self.commissions += tx.amount,
            TransactionType::Withdrawal => self.withdrawals += tx.amount,
            TransactionType::Refund => self.refunds += tx.amount,
        }
        self.count += 1;
    }
}
