//! Engineer account model with its embedded, append-only commission log.

use chrono::{DateTime, Utc};
use mongodb::bson::oid::ObjectId;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::LedgerError;

/// Commission transaction types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    Commission,
    Withdrawal,
    Refund,
}

impl TransactionType {
    /// Get string representation for storage.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Commission => "commission",
            Self::Withdrawal => "withdrawal",
            Self::Refund => "refund",
        }
    }

    /// Apply the sign implied by this type to a non-negative magnitude.
    pub fn signed(&self, amount: Decimal) -> Decimal {
        match self {
            Self::Commission => amount,
            Self::Withdrawal | Self::Refund => -amount,
        }
    }
}

impl std::fmt::Display for TransactionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Single ledger event. Immutable once appended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommissionTransaction {
    pub transaction_id: String,
    #[serde(rename = "type")]
    pub transaction_type: TransactionType,
    pub amount: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coupon_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
}

impl CommissionTransaction {
    /// Get signed amount (positive for commission, negative otherwise).
    pub fn signed_amount(&self) -> Decimal {
        self.transaction_type.signed(self.amount)
    }

    pub fn is_commission(&self) -> bool {
        self.transaction_type == TransactionType::Commission
    }
}

/// Input for appending a transaction. `transaction_id` is the caller's
/// idempotency key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewTransaction {
    pub transaction_id: String,
    pub transaction_type: TransactionType,
    pub amount: Decimal,
    pub order_id: Option<String>,
    pub coupon_code: Option<String>,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<NewTransaction> for CommissionTransaction {
    fn from(input: NewTransaction) -> Self {
        Self {
            transaction_id: input.transaction_id,
            transaction_type: input.transaction_type,
            amount: input.amount,
            order_id: input.order_id,
            coupon_code: input.coupon_code,
            description: input.description,
            created_at: input.created_at,
        }
    }
}

/// Ordered-by-insertion transaction log.
///
/// Entries can only be added through [`EngineerAccount::append`]; there is no
/// way to reach a mutable reference to an existing entry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransactionLog(Vec<CommissionTransaction>);

impl TransactionLog {
    pub fn iter(&self) -> std::slice::Iter<'_, CommissionTransaction> {
        self.0.iter()
    }

    pub fn as_slice(&self) -> &[CommissionTransaction] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, transaction_id: &str) -> bool {
        self.0.iter().any(|tx| tx.transaction_id == transaction_id)
    }

    fn push(&mut self, tx: CommissionTransaction) {
        self.0.push(tx);
    }
}

impl<'a> IntoIterator for &'a TransactionLog {
    type Item = &'a CommissionTransaction;
    type IntoIter = std::slice::Iter<'a, CommissionTransaction>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Cached per-account statistics, recomputed from the full log.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AccountStatistics {
    pub total_commissions: Decimal,
    pub total_withdrawals: Decimal,
    pub total_refunds: Decimal,
    pub transaction_count: u64,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "opt_chrono_datetime_as_bson_datetime"
    )]
    pub last_transaction_at: Option<DateTime<Utc>>,
}

/// Engineer commission account (one per engineer).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineerAccount {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub engineer_id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    wallet_balance: Decimal,
    #[serde(default)]
    transactions: TransactionLog,
    #[serde(default)]
    pub statistics: AccountStatistics,
    /// Optimistic concurrency token, bumped on every save.
    #[serde(default)]
    pub version: i64,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_utc: DateTime<Utc>,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub updated_utc: DateTime<Utc>,
}

impl EngineerAccount {
    /// Open an empty account for a newly approved engineer.
    pub fn open(engineer_id: impl Into<String>, name: impl Into<String>, phone: Option<String>) -> Self {
        let now = Utc::now();
        Self {
            id: None,
            engineer_id: engineer_id.into(),
            name: name.into(),
            phone,
            wallet_balance: Decimal::ZERO,
            transactions: TransactionLog::default(),
            statistics: AccountStatistics::default(),
            version: 0,
            created_utc: now,
            updated_utc: now,
        }
    }

    pub fn wallet_balance(&self) -> Decimal {
        self.wallet_balance
    }

    pub fn transactions(&self) -> &TransactionLog {
        &self.transactions
    }

    /// Append a transaction and move the cached balance by its signed amount.
    pub fn append(&mut self, input: NewTransaction) -> Result<&CommissionTransaction, LedgerError> {
        if input.amount < Decimal::ZERO {
            return Err(LedgerError::InvalidAmount(input.amount));
        }
        if self.transactions.contains(&input.transaction_id) {
            return Err(LedgerError::DuplicateTransaction(input.transaction_id));
        }

        let tx = CommissionTransaction::from(input);
        self.wallet_balance += tx.signed_amount();
        self.updated_utc = Utc::now();
        self.transactions.push(tx);

        Ok(&self.transactions.as_slice()[self.transactions.len() - 1])
    }

    /// Full rescan of the log into `statistics`. The wallet balance is only
    /// ever moved by [`EngineerAccount::append`].
    pub fn recompute_statistics(&mut self) {
        let mut stats = AccountStatistics::default();

        for tx in &self.transactions {
            match tx.transaction_type {
                TransactionType::Commission => stats.total_commissions += tx.amount,
                TransactionType::Withdrawal => stats.total_withdrawals += tx.amount,
                TransactionType::Refund => stats.total_refunds += tx.amount,
            }
            stats.transaction_count += 1;
            stats.last_transaction_at = match stats.last_transaction_at {
                Some(last) if last >= tx.created_at => Some(last),
                _ => Some(tx.created_at),
            };
        }

        self.statistics = stats;
    }

    /// Whether `statistics` reflects every entry in the log.
    pub fn statistics_current(&self) -> bool {
        self.statistics.transaction_count == self.transactions.len() as u64
    }

    /// Balance as of `instant`, inclusive.
    pub fn balance_at(&self, instant: DateTime<Utc>) -> Decimal {
        self.transactions
            .iter()
            .filter(|tx| tx.created_at <= instant)
            .map(CommissionTransaction::signed_amount)
            .sum()
    }

    /// Balance of everything strictly before `instant`.
    pub fn balance_before(&self, instant: DateTime<Utc>) -> Decimal {
        self.transactions
            .iter()
            .filter(|tx| tx.created_at < instant)
            .map(CommissionTransaction::signed_amount)
            .sum()
    }
}

// Helper module for optional DateTime<Utc> as BSON DateTime
mod opt_chrono_datetime_as_bson_datetime {
    use chrono::{DateTime, Utc};
    use mongodb::bson;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S>(date: &Option<DateTime<Utc>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match date {
            Some(dt) => bson::DateTime::from_chrono(*dt).serialize(serializer),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Option::<bson::DateTime>::deserialize(deserializer)?;
        Ok(value.map(|dt| dt.to_chrono()))
    }
}
