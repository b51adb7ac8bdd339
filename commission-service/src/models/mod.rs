//! Domain models for commission-service.

mod account;
mod money;
mod reference;
mod report;
mod statement;

pub use account::{
    AccountStatistics, CommissionTransaction, EngineerAccount, NewTransaction, TransactionLog,
    TransactionType,
};
pub use money::{round_money, MONEY_SCALE};
pub use reference::{CouponMeta, OrderRevenue};
pub use report::{
    CommissionsReport, CommissionsReportQuery, CouponAggregate, EngineerReportLine,
    EngineerTotals, PeriodBucket, ReportSummary,
};
pub use statement::{AccountStatement, CouponBreakdown, StatementLine, StatementSummary};
