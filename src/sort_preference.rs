//! Persists the date sort direction for transaction lists across restarts.
//!
//! The flag lives in a small `preference` key-value table, separate from
//! the transaction records it orders. `false` (newest first) is both the
//! default for fresh installations and the fallback when the stored value
//! cannot be read.

use std::sync::Arc;

use rusqlite::{Connection, OptionalExtension};
use tokio::sync::{Mutex, watch};

use crate::{Error, db::CreateTable};

/// The key the sort direction is stored under in the preference table.
const SORT_ASCENDING_KEY: &str = "is_asc";

/// Persists and broadcasts the date sort direction for transaction lists.
///
/// Cloning the store is cheap; every clone shares the same connection and
/// broadcast channel.
#[derive(Debug, Clone)]
pub struct SortPreferenceStore {
    connection: Arc<Mutex<Connection>>,
    current: Arc<watch::Sender<bool>>,
}

impl SortPreferenceStore {
    /// Create a store over `connection`, reading the persisted value once.
    ///
    /// A missing or unreadable value falls back to the default `false`
    /// instead of failing. The fault is logged; the next successful
    /// [SortPreferenceStore::write] overwrites whatever was stored.
    pub async fn new(connection: Arc<Mutex<Connection>>) -> Self {
        let initial = {
            let connection = connection.lock().await;
            read_sort_ascending(&connection)
        };
        let (current, _) = watch::channel(initial);

        Self {
            connection,
            current: Arc::new(current),
        }
    }

    /// Subscribe to the sort direction.
    ///
    /// The returned receiver resolves immediately with the current value
    /// and again after every successful [SortPreferenceStore::write].
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        let mut receiver = self.current.subscribe();
        receiver.mark_changed();
        receiver
    }

    /// Read the current sort direction without subscribing.
    pub fn get(&self) -> bool {
        *self.current.borrow()
    }

    /// Persist a new sort direction and notify subscribers.
    ///
    /// # Errors
    /// Returns [Error::SqlError] if persisting fails. Subscribers are not
    /// notified in that case, so observers never see a value that did not
    /// reach the database.
    pub async fn write(&self, ascending: bool) -> Result<(), Error> {
        {
            let connection = self.connection.lock().await;

            connection.execute(
                "INSERT INTO preference (name, value) VALUES (?1, ?2)
                 ON CONFLICT(name) DO UPDATE SET value = excluded.value",
                (SORT_ASCENDING_KEY, ascending),
            )?;
        }

        self.current.send_replace(ascending);

        Ok(())
    }
}

impl CreateTable for SortPreferenceStore {
    fn create_table(connection: &Connection) -> Result<(), rusqlite::Error> {
        connection.execute(
            "CREATE TABLE IF NOT EXISTS preference (
                    name TEXT PRIMARY KEY,
                    value INTEGER NOT NULL
                    )",
            (),
        )?;

        Ok(())
    }
}

/// Read the persisted sort direction, substituting the default on any fault.
fn read_sort_ascending(connection: &Connection) -> bool {
    let result = connection
        .prepare("SELECT value FROM preference WHERE name = :name")
        .and_then(|mut statement| {
            statement
                .query_row(&[(":name", SORT_ASCENDING_KEY)], |row| row.get::<_, bool>(0))
                .optional()
        });

    match result {
        Ok(Some(ascending)) => ascending,
        Ok(None) => false,
        Err(error) => {
            tracing::warn!("could not read the sort preference, using the default: {error}");
            false
        }
    }
}

#[cfg(test)]
mod sort_preference_tests {
    use std::sync::Arc;

    use rusqlite::Connection;
    use tokio::sync::Mutex;

    use crate::db::initialize;

    use super::SortPreferenceStore;

    fn get_test_connection() -> Arc<Mutex<Connection>> {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();

        Arc::new(Mutex::new(conn))
    }

    #[tokio::test]
    async fn defaults_to_descending_before_any_write() {
        let store = SortPreferenceStore::new(get_test_connection()).await;

        assert!(!store.get());
    }

    #[tokio::test]
    async fn subscriber_sees_current_value_immediately() {
        let store = SortPreferenceStore::new(get_test_connection()).await;

        let mut receiver = store.subscribe();

        receiver.changed().await.unwrap();
        assert!(!*receiver.borrow());
    }

    #[tokio::test]
    async fn write_notifies_existing_subscribers() {
        let store = SortPreferenceStore::new(get_test_connection()).await;
        let mut receiver = store.subscribe();
        receiver.changed().await.unwrap();

        store.write(true).await.unwrap();

        receiver.changed().await.unwrap();
        assert!(*receiver.borrow());
    }

    #[tokio::test]
    async fn written_value_survives_a_restart() {
        let connection = get_test_connection();

        let store = SortPreferenceStore::new(Arc::clone(&connection)).await;
        store.write(true).await.unwrap();
        drop(store);

        let reopened = SortPreferenceStore::new(connection).await;
        assert!(reopened.get());
    }

    #[tokio::test]
    async fn unreadable_value_falls_back_to_default() {
        let connection = get_test_connection();
        {
            let conn = connection.lock().await;
            conn.execute(
                "INSERT INTO preference (name, value) VALUES ('is_asc', 'garbage')",
                (),
            )
            .unwrap();
        }

        let store = SortPreferenceStore::new(connection).await;

        assert!(!store.get());
    }

    #[tokio::test]
    async fn missing_table_falls_back_to_default() {
        // No `initialize` call, standing in for unreadable storage.
        let connection = Arc::new(Mutex::new(Connection::open_in_memory().unwrap()));

        let store = SortPreferenceStore::new(connection).await;

        assert!(!store.get());
    }
}
