//! Live query handles handed out by the transaction store.
//!
//! The store does not push diffs. After every committed mutation it bumps a
//! revision channel, and each live handle re-runs its full query on the next
//! poll. This mirrors the usual "re-run query on any write" model of
//! embedded databases and keeps subscribers trivially consistent.

use std::sync::Arc;

use rusqlite::Connection;
use tokio::sync::{Mutex, watch};

use crate::{
    Error,
    database_id::DatabaseID,
    transaction::{
        SortOrder, Transaction,
        store::{get_by_id, run_list_query},
    },
};

/// The query a [TransactionFeed] re-runs after every mutation.
#[derive(Debug, Clone)]
pub(crate) enum ListQuery {
    /// Every stored transaction.
    All {
        /// The date sort direction.
        order: SortOrder,
    },
    /// Transactions whose label matches a `LIKE` pattern.
    Search {
        /// The `LIKE` pattern, already wrapped in wildcards.
        pattern: String,
        /// The date sort direction.
        order: SortOrder,
    },
}

impl ListQuery {
    pub(crate) fn order(&self) -> SortOrder {
        match self {
            ListQuery::All { order } | ListQuery::Search { order, .. } => *order,
        }
    }
}

/// A live view over a transaction list query.
///
/// The first call to [TransactionFeed::next] yields the current results
/// immediately; every later call waits for the next committed mutation and
/// yields a freshly materialized list. Dropping the feed unsubscribes
/// immediately with no further side effects.
#[derive(Debug)]
pub struct TransactionFeed {
    connection: Arc<Mutex<Connection>>,
    revision: watch::Receiver<u64>,
    query: ListQuery,
    primed: bool,
}

impl TransactionFeed {
    pub(crate) fn new(
        connection: Arc<Mutex<Connection>>,
        revision: watch::Receiver<u64>,
        query: ListQuery,
    ) -> Self {
        Self {
            connection,
            revision,
            query,
            primed: false,
        }
    }

    /// Wait for the next snapshot of the query results.
    ///
    /// Returns `None` once the owning store has been dropped; until then
    /// the feed stays subscribed no matter how many snapshots are taken.
    ///
    /// # Errors
    /// Yields an [Error::SqlError] if re-running the query fails. The feed
    /// remains subscribed and can be polled again.
    pub async fn next(&mut self) -> Option<Result<Vec<Transaction>, Error>> {
        if self.primed {
            self.revision.changed().await.ok()?;
        } else {
            // The snapshot taken below already reflects the current
            // revision, so mark it seen up front.
            self.revision.borrow_and_update();
            self.primed = true;
        }

        let connection = self.connection.lock().await;

        Some(run_list_query(&connection, &self.query))
    }
}

/// A live view over a single transaction record.
///
/// Yields the record immediately if it exists, then again whenever its
/// contents change. While no record with the watched ID exists nothing is
/// yielded; mutations that leave the record's contents unchanged are
/// skipped.
#[derive(Debug)]
pub struct TransactionWatch {
    connection: Arc<Mutex<Connection>>,
    revision: watch::Receiver<u64>,
    id: DatabaseID,
    primed: bool,
    last: Option<Transaction>,
}

impl TransactionWatch {
    pub(crate) fn new(
        connection: Arc<Mutex<Connection>>,
        revision: watch::Receiver<u64>,
        id: DatabaseID,
    ) -> Self {
        Self {
            connection,
            revision,
            id,
            primed: false,
            last: None,
        }
    }

    /// Wait until the watched record exists with contents not yet yielded.
    ///
    /// Returns `None` once the owning store has been dropped.
    ///
    /// # Errors
    /// Yields an [Error::SqlError] if the lookup fails. The watch remains
    /// subscribed and can be polled again.
    pub async fn next(&mut self) -> Option<Result<Transaction, Error>> {
        loop {
            if self.primed {
                self.revision.changed().await.ok()?;
            } else {
                self.revision.borrow_and_update();
                self.primed = true;
            }

            let current = {
                let connection = self.connection.lock().await;
                get_by_id(&connection, self.id)
            };

            match current {
                Ok(Some(transaction)) => {
                    if self.last.as_ref() == Some(&transaction) {
                        continue;
                    }

                    self.last = Some(transaction.clone());
                    return Some(Ok(transaction));
                }
                // Absent records yield nothing. Forgetting the last value
                // means a deleted record that reappears is yielded again.
                Ok(None) => {
                    self.last = None;
                    continue;
                }
                Err(error) => return Some(Err(error)),
            }
        }
    }
}

#[cfg(test)]
mod transaction_feed_tests {
    use std::{sync::Arc, time::Duration};

    use rusqlite::Connection;
    use tokio::{sync::Mutex, time::timeout};

    use crate::{SortOrder, Transaction, TransactionStore, db::initialize};

    fn get_test_store() -> TransactionStore {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();

        TransactionStore::new(Arc::new(Mutex::new(conn)))
    }

    #[tokio::test]
    async fn first_snapshot_is_immediate() {
        let store = get_test_store();

        let mut feed = store.list_all(SortOrder::Descending);
        let got = feed.next().await.unwrap().unwrap();

        assert!(got.is_empty());
    }

    #[tokio::test]
    async fn feed_yields_refreshed_list_after_each_mutation() {
        let store = get_test_store();
        let mut feed = store.list_all(SortOrder::Ascending);
        assert!(feed.next().await.unwrap().unwrap().is_empty());

        store
            .insert(Transaction::build("Coffee", -4.5))
            .await
            .unwrap();
        let after_insert = feed.next().await.unwrap().unwrap();
        assert_eq!(after_insert.len(), 1);
        assert_eq!(after_insert[0].label, "Coffee");

        let mut updated = after_insert[0].clone();
        updated.amount = -5.0;
        store.update(&updated).await.unwrap();
        let after_update = feed.next().await.unwrap().unwrap();
        assert_eq!(after_update[0].amount, -5.0);

        store.delete(updated.id).await.unwrap();
        let after_delete = feed.next().await.unwrap().unwrap();
        assert!(after_delete.is_empty());
    }

    #[tokio::test]
    async fn search_feed_tracks_matching_rows_only() {
        let store = get_test_store();
        let mut feed = store.search("Groc", SortOrder::Ascending);
        assert!(feed.next().await.unwrap().unwrap().is_empty());

        store
            .insert(Transaction::build("Groceries", -84.35))
            .await
            .unwrap();
        let got = feed.next().await.unwrap().unwrap();
        assert_eq!(got.len(), 1);

        // A non-matching insert still wakes the feed, which re-runs the
        // query and keeps showing only the matching row.
        store
            .insert(Transaction::build("Salary", 2000.0))
            .await
            .unwrap();
        let got = feed.next().await.unwrap().unwrap();
        assert_eq!(got.len(), 1);
        assert_eq!(got[0].label, "Groceries");
    }

    #[tokio::test]
    async fn feed_completes_when_store_is_dropped() {
        let store = get_test_store();
        let mut feed = store.list_all(SortOrder::Descending);
        assert!(feed.next().await.is_some());

        drop(store);

        assert!(feed.next().await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn watch_yields_nothing_while_record_is_absent() {
        let store = get_test_store();

        let mut watch = store.watch(42);
        let got = timeout(Duration::from_secs(1), watch.next()).await;

        assert!(got.is_err(), "expected no emission for an absent record");
    }

    #[tokio::test]
    async fn watch_follows_the_records_lifecycle() {
        let store = get_test_store();
        store
            .insert(Transaction::build("Coffee", -4.5))
            .await
            .unwrap();

        let mut watch = store.watch(1);
        let initial = watch.next().await.unwrap().unwrap();
        assert_eq!(initial.label, "Coffee");

        // A mutation elsewhere wakes the watch but the record is unchanged,
        // so only the later update is yielded.
        store
            .insert(Transaction::build("Salary", 2000.0))
            .await
            .unwrap();
        let mut updated = initial.clone();
        updated.amount = -6.0;
        store.update(&updated).await.unwrap();

        let got = watch.next().await.unwrap().unwrap();
        assert_eq!(got.amount, -6.0);
    }

    #[tokio::test]
    async fn watch_yields_reinserted_record_after_delete() {
        let store = get_test_store();
        store
            .insert(Transaction::build("Coffee", -4.5).id(Some(5)))
            .await
            .unwrap();

        let mut watch = store.watch(5);
        let first = watch.next().await.unwrap().unwrap();
        assert_eq!(first.amount, -4.5);

        store.delete(5).await.unwrap();
        store
            .insert(Transaction::build("Coffee", -6.0).id(Some(5)))
            .await
            .unwrap();

        let got = watch.next().await.unwrap().unwrap();
        assert_eq!(got.amount, -6.0);
    }

    #[tokio::test]
    async fn watch_completes_when_store_is_dropped() {
        let store = get_test_store();
        let mut watch = store.watch(1);

        drop(store);

        assert!(watch.next().await.is_none());
    }
}
