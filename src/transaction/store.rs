//! Implements a SQLite backed transaction store with live queries.

use std::sync::Arc;

use rusqlite::{Connection, OptionalExtension, Row};
use tokio::sync::{Mutex, watch};

use crate::{
    Error,
    database_id::DatabaseID,
    db::{CreateTable, MapRow},
    transaction::{
        SortOrder, Transaction, TransactionBuilder,
        core::{datetime_from_epoch_millis, datetime_to_epoch_millis},
        feed::{ListQuery, TransactionFeed, TransactionWatch},
    },
};

/// Stores transactions in a SQLite database.
///
/// All mutations are asynchronous and serialize on the shared connection;
/// after every committed change the store bumps a revision channel so that
/// previously issued [TransactionFeed]s and [TransactionWatch]es re-run
/// their queries. Cloning the store is cheap and every clone shares the
/// same connection and revision channel.
#[derive(Debug, Clone)]
pub struct TransactionStore {
    connection: Arc<Mutex<Connection>>,
    revision: Arc<watch::Sender<u64>>,
}

impl TransactionStore {
    /// Create a new store for the SQLite `connection`.
    ///
    /// The schema must already be set up, see [crate::db::initialize].
    pub fn new(connection: Arc<Mutex<Connection>>) -> Self {
        let (revision, _) = watch::channel(0);

        Self {
            connection,
            revision: Arc::new(revision),
        }
    }

    /// Insert a new transaction into the store.
    ///
    /// When the builder carries no ID, the database assigns the next free
    /// one (IDs increase monotonically and are never reused). An explicit
    /// ID that collides with an existing row causes the insert to be
    /// silently dropped: no record is created and no error is reported.
    ///
    /// # Errors
    /// Returns [Error::SqlError] if there is an SQL error.
    pub async fn insert(&self, builder: TransactionBuilder) -> Result<(), Error> {
        let changed = {
            let connection = self.connection.lock().await;

            connection.execute(
                "INSERT OR IGNORE INTO transactions (id, label, amount, description, date)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                (
                    builder.id,
                    &builder.label,
                    builder.amount,
                    &builder.description,
                    datetime_to_epoch_millis(builder.date),
                ),
            )?
        };

        if changed > 0 {
            self.notify();
        }

        Ok(())
    }

    /// Replace every field except the ID of the stored record matching
    /// `transaction.id`.
    ///
    /// Does nothing if no record with that ID exists; an update never
    /// creates a record.
    ///
    /// # Errors
    /// Returns [Error::SqlError] if there is an SQL error.
    pub async fn update(&self, transaction: &Transaction) -> Result<(), Error> {
        let changed = {
            let connection = self.connection.lock().await;

            connection.execute(
                "UPDATE transactions SET label = ?2, amount = ?3, description = ?4, date = ?5
                 WHERE id = ?1",
                (
                    transaction.id,
                    &transaction.label,
                    transaction.amount,
                    &transaction.description,
                    datetime_to_epoch_millis(transaction.date),
                ),
            )?
        };

        if changed > 0 {
            self.notify();
        }

        Ok(())
    }

    /// Remove the record with the matching `id`.
    ///
    /// Does nothing if no record with that ID exists, so deleting twice has
    /// the same end state as deleting once.
    ///
    /// # Errors
    /// Returns [Error::SqlError] if there is an SQL error.
    pub async fn delete(&self, id: DatabaseID) -> Result<(), Error> {
        let changed = {
            let connection = self.connection.lock().await;

            connection.execute("DELETE FROM transactions WHERE id = ?1", (id,))?
        };

        if changed > 0 {
            self.notify();
        }

        Ok(())
    }

    /// Retrieve a transaction by its `id` without subscribing to changes.
    ///
    /// # Errors
    /// Returns [Error::SqlError] if there is an SQL error. A missing record
    /// is `Ok(None)`, not an error.
    pub async fn get(&self, id: DatabaseID) -> Result<Option<Transaction>, Error> {
        let connection = self.connection.lock().await;

        get_by_id(&connection, id)
    }

    /// Subscribe to the full transaction list ordered by date.
    ///
    /// Ties on equal dates are broken by ID (insertion order) in both
    /// directions, so the ordering is deterministic across calls.
    pub fn list_all(&self, order: SortOrder) -> TransactionFeed {
        self.feed(ListQuery::All { order })
    }

    /// Subscribe to the transactions whose label contains `query`.
    ///
    /// The store wraps `query` in SQL wildcards itself, so callers pass the
    /// raw search text. The empty query matches every transaction. Matching
    /// uses SQLite `LIKE` semantics (ASCII case-insensitive).
    pub fn search(&self, query: &str, order: SortOrder) -> TransactionFeed {
        self.feed(ListQuery::Search {
            pattern: format!("%{query}%"),
            order,
        })
    }

    /// Subscribe to the single record with the matching `id`.
    ///
    /// The watch yields the record immediately if it exists, then again
    /// whenever its contents change. While no record with `id` exists,
    /// nothing is yielded.
    pub fn watch(&self, id: DatabaseID) -> TransactionWatch {
        TransactionWatch::new(
            Arc::clone(&self.connection),
            self.revision.subscribe(),
            id,
        )
    }

    fn feed(&self, query: ListQuery) -> TransactionFeed {
        TransactionFeed::new(
            Arc::clone(&self.connection),
            self.revision.subscribe(),
            query,
        )
    }

    fn notify(&self) {
        self.revision.send_modify(|revision| *revision += 1);
    }
}

impl CreateTable for TransactionStore {
    fn create_table(connection: &Connection) -> Result<(), rusqlite::Error> {
        connection.execute(
            "CREATE TABLE IF NOT EXISTS transactions (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    label TEXT NOT NULL,
                    amount REAL NOT NULL,
                    description TEXT NOT NULL,
                    date INTEGER NOT NULL
                    )",
            (),
        )?;

        // Ensure the sequence starts at 1
        connection.execute(
            "INSERT OR IGNORE INTO sqlite_sequence (name, seq) VALUES ('transactions', 0)",
            (),
        )?;

        Ok(())
    }
}

impl MapRow for TransactionStore {
    type ReturnType = Transaction;

    fn map_row_with_offset(row: &Row, offset: usize) -> Result<Transaction, rusqlite::Error> {
        let id = row.get(offset)?;
        let label = row.get(offset + 1)?;
        let amount = row.get(offset + 2)?;
        let description = row.get(offset + 3)?;
        let date = datetime_from_epoch_millis(row.get(offset + 4)?, offset + 4)?;

        Ok(Transaction {
            id,
            label,
            amount,
            description,
            date,
        })
    }
}

/// Run a list or search query against the database.
pub(crate) fn run_list_query(
    connection: &Connection,
    query: &ListQuery,
) -> Result<Vec<Transaction>, Error> {
    let order_clause = match query.order() {
        SortOrder::Ascending => "ORDER BY date ASC, id ASC",
        SortOrder::Descending => "ORDER BY date DESC, id ASC",
    };

    match query {
        ListQuery::All { .. } => {
            let query_string =
                format!("SELECT id, label, amount, description, date FROM transactions {order_clause}");

            connection
                .prepare(&query_string)?
                .query_map([], TransactionStore::map_row)?
                .map(|maybe_transaction| maybe_transaction.map_err(Error::SqlError))
                .collect()
        }
        ListQuery::Search { pattern, .. } => {
            let query_string = format!(
                "SELECT id, label, amount, description, date FROM transactions \
                 WHERE label LIKE :pattern {order_clause}"
            );

            connection
                .prepare(&query_string)?
                .query_map(&[(":pattern", pattern)], TransactionStore::map_row)?
                .map(|maybe_transaction| maybe_transaction.map_err(Error::SqlError))
                .collect()
        }
    }
}

/// Retrieve a single transaction by ID, `None` if absent.
pub(crate) fn get_by_id(
    connection: &Connection,
    id: DatabaseID,
) -> Result<Option<Transaction>, Error> {
    connection
        .prepare("SELECT id, label, amount, description, date FROM transactions WHERE id = :id")?
        .query_row(&[(":id", &id)], TransactionStore::map_row)
        .optional()
        .map_err(Error::from)
}
