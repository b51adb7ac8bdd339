//! Entry point bundling the two read operations and the write path over one
//! set of stores.

use chrono::{DateTime, Utc};
use std::sync::Arc;

use super::ledger::{AppendOutcome, AppendPolicy, LedgerWriter};
use super::period::PeriodCalculator;
use super::report::ReportAggregator;
use super::resolver::ReferenceResolver;
use super::statement::StatementGenerator;
use super::store::{AccountStore, CouponLookup, OrderLookup};
use crate::error::LedgerError;
use crate::models::{
    AccountStatement, CommissionsReport, CommissionsReportQuery, EngineerAccount, NewTransaction,
};

#[derive(Clone)]
pub struct CommissionService {
    reports: ReportAggregator,
    statements: StatementGenerator,
    ledger: LedgerWriter,
}

impl CommissionService {
    pub fn new(
        accounts: Arc<dyn AccountStore>,
        coupons: Arc<dyn CouponLookup>,
        orders: Arc<dyn OrderLookup>,
        periods: PeriodCalculator,
        policy: AppendPolicy,
    ) -> Self {
        let resolver = ReferenceResolver::new(coupons, orders);
        Self {
            reports: ReportAggregator::new(accounts.clone(), resolver.clone(), periods),
            statements: StatementGenerator::new(accounts.clone(), resolver, periods),
            ledger: LedgerWriter::new(accounts, policy),
        }
    }

    pub async fn get_commissions_report(
        &self,
        query: &CommissionsReportQuery,
    ) -> Result<CommissionsReport, LedgerError> {
        self.reports.get_commissions_report(query).await
    }

    pub async fn get_commissions_report_at(
        &self,
        query: &CommissionsReportQuery,
        now: DateTime<Utc>,
    ) -> Result<CommissionsReport, LedgerError> {
        self.reports.get_commissions_report_at(query, now).await
    }

    pub async fn get_account_statement(
        &self,
        engineer_id: &str,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
    ) -> Result<AccountStatement, LedgerError> {
        self.statements
            .get_account_statement(engineer_id, from, to)
            .await
    }

    pub async fn open_account(
        &self,
        engineer_id: &str,
        name: &str,
        phone: Option<String>,
    ) -> Result<EngineerAccount, LedgerError> {
        self.ledger.open_account(engineer_id, name, phone).await
    }

    pub async fn append_transaction(
        &self,
        engineer_id: &str,
        input: NewTransaction,
    ) -> Result<AppendOutcome, LedgerError> {
        self.ledger.append_transaction(engineer_id, input).await
    }
}
