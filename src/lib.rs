//! Core library for a quick expense-tracking app.
//!
//! This crate owns the persistence and aggregation logic: a SQLite-backed
//! [TransactionStore] with reactive list/search/point queries, the
//! [compute_totals] dashboard sums, a persisted [SortPreferenceStore], and
//! currency/date rendering in [format]. UI layers (screens, dialogs,
//! navigation) live elsewhere and call into this crate.

#![warn(missing_docs)]

mod app_state;
mod database_id;
pub mod db;
pub mod format;
mod sort_preference;
mod summary;
mod transaction;

pub use app_state::AppState;
pub use database_id::DatabaseID;
pub use sort_preference::SortPreferenceStore;
pub use summary::{Totals, compute_totals};
pub use transaction::{
    SortOrder, Transaction, TransactionBuilder, TransactionFeed, TransactionStore,
    TransactionWatch,
};

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// The requested resource was not found.
    ///
    /// Internally, this error may occur when a query returns no rows.
    /// The store treats missing records on update/delete as no-ops, so this
    /// only surfaces from lookups that demand a row.
    #[error("the requested resource could not be found")]
    NotFound,

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),

    /// A date value could not be rendered as a display string.
    #[error("could not format date: {0}")]
    DateFormat(String),
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::SqlError(error)
            }
        }
    }
}
