//! Defines the core data model for transactions.

use rusqlite::types::Type;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::database_id::DatabaseID;

/// An expense or income, i.e. an event where money was either spent or earned.
///
/// The sign of `amount` encodes the direction: positive amounts are income,
/// negative amounts are expenses. Callers that take an unsigned magnitude
/// from user input are expected to negate it before building an expense.
///
/// To create a new `Transaction`, use [Transaction::build].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// The ID of the transaction. Assigned by the store, never mutated.
    pub id: DatabaseID,
    /// A short classification of the transaction, e.g. "Salary", "Groceries".
    ///
    /// Callers must ensure the label is non-empty; the store does not
    /// re-validate it.
    pub label: String,
    /// The amount of money spent or earned in this transaction.
    pub amount: f64,
    /// A free-text description of the transaction. May be empty.
    pub description: String,
    /// When the transaction happened. Defaults to the creation time and is
    /// user-editable afterwards. Persisted with millisecond precision;
    /// finer fractions of a second are dropped on insert.
    pub date: OffsetDateTime,
}

impl Transaction {
    /// Create a new transaction.
    ///
    /// Shortcut for [TransactionBuilder] for discoverability.
    pub fn build(label: &str, amount: f64) -> TransactionBuilder {
        TransactionBuilder {
            id: None,
            label: label.to_owned(),
            amount,
            description: String::new(),
            date: OffsetDateTime::now_utc(),
        }
    }
}

/// A builder for creating [Transaction] instances.
///
/// The label and amount are required up front via [Transaction::build], the
/// remaining fields default sensibly: an unassigned ID, an empty description
/// and the current time.
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionBuilder {
    /// The ID to insert the transaction under.
    ///
    /// `None` lets the store assign the next free ID. An explicit ID that
    /// collides with an existing row causes the insert to be silently
    /// dropped.
    pub id: Option<DatabaseID>,
    /// A short classification of the transaction.
    pub label: String,
    /// The signed monetary amount of the transaction.
    pub amount: f64,
    /// A free-text description of the transaction.
    pub description: String,
    /// The date when the transaction occurred.
    pub date: OffsetDateTime,
}

impl TransactionBuilder {
    /// Set an explicit ID for the transaction.
    pub fn id(mut self, id: Option<DatabaseID>) -> Self {
        self.id = id;
        self
    }

    /// Set the description for the transaction.
    pub fn description(mut self, description: &str) -> Self {
        self.description = description.to_owned();
        self
    }

    /// Set the date for the transaction.
    pub fn date(mut self, date: OffsetDateTime) -> Self {
        self.date = date;
        self
    }

    /// Create a [Transaction] from the builder with the given `id`.
    pub fn finalise(self, id: DatabaseID) -> Transaction {
        Transaction {
            id,
            label: self.label,
            amount: self.amount,
            description: self.description,
            date: self.date,
        }
    }
}

/// The order to sort transactions by date in list and search queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    /// Sort in order of increasing date.
    Ascending,
    /// Sort in order of decreasing date.
    Descending,
}

impl SortOrder {
    /// Convert the persisted sort-preference flag into a sort order.
    pub fn from_ascending(ascending: bool) -> Self {
        if ascending {
            SortOrder::Ascending
        } else {
            SortOrder::Descending
        }
    }
}

/// Convert a transaction date to the epoch millisecond value stored in the
/// database.
///
/// Epoch integers keep `ORDER BY date` correct regardless of the UTC offset
/// the caller attached to the date. Milliseconds cover every date a
/// calendar picker can produce; finer units overflow `i64` within the
/// representable year range of [OffsetDateTime].
pub(crate) fn datetime_to_epoch_millis(date: OffsetDateTime) -> i64 {
    (date.unix_timestamp_nanos() / 1_000_000) as i64
}

/// Convert a stored epoch millisecond value back into a UTC date.
///
/// `column` is the result column the value was read from and is only used
/// for error reporting.
pub(crate) fn datetime_from_epoch_millis(
    millis: i64,
    column: usize,
) -> Result<OffsetDateTime, rusqlite::Error> {
    OffsetDateTime::from_unix_timestamp_nanos(millis as i128 * 1_000_000).map_err(|error| {
        rusqlite::Error::FromSqlConversionFailure(column, Type::Integer, Box::new(error))
    })
}
