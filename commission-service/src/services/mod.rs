pub mod commission;
pub mod database;
pub mod ledger;
pub mod memory;
pub mod metrics;
pub mod period;
pub mod report;
pub mod resolver;
pub mod statement;
pub mod store;

pub use commission::CommissionService;
pub use database::CommissionDb;
pub use ledger::{AppendOutcome, AppendPolicy, LedgerWriter};
pub use memory::InMemoryStore;
pub use metrics::{get_metrics, init_metrics};
pub use period::{DateRange, Period, PeriodCalculator};
pub use report::ReportAggregator;
pub use resolver::{ReferenceKeys, ReferenceResolver, ResolvedReferences};
pub use statement::StatementGenerator;
pub use store::{AccountStore, CouponLookup, OrderLookup};
