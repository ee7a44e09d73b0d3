//! Implements a struct that holds the stores shared by the application's screens.

use std::sync::Arc;

use rusqlite::Connection;
use tokio::sync::Mutex;

use crate::{Error, SortPreferenceStore, TransactionStore, db::initialize};

/// The state shared by every screen of the application.
///
/// Constructed exactly once at process start and passed by handle to
/// consumers. There is no hidden global instance; the store handles are
/// cheap to clone and all share one SQLite connection.
#[derive(Debug, Clone)]
pub struct AppState {
    /// The store for transaction records.
    pub transactions: TransactionStore,
    /// The persisted sort direction for transaction lists.
    pub sort_preference: SortPreferenceStore,
}

impl AppState {
    /// Create a new [AppState] with a SQLite database connection.
    ///
    /// This function will initialize the database by adding the tables for
    /// the domain models, then read the persisted sort preference.
    ///
    /// # Errors
    /// Returns an error if the database cannot be initialized.
    pub async fn new(db_connection: Connection) -> Result<Self, Error> {
        initialize(&db_connection)?;

        let connection = Arc::new(Mutex::new(db_connection));
        let transactions = TransactionStore::new(Arc::clone(&connection));
        let sort_preference = SortPreferenceStore::new(connection).await;

        Ok(Self {
            transactions,
            sort_preference,
        })
    }
}
