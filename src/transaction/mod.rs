//! The transaction record model and its SQLite-backed store.

mod core;
mod feed;
mod store;

pub use core::{SortOrder, Transaction, TransactionBuilder};
pub use feed::{TransactionFeed, TransactionWatch};
pub use store::TransactionStore;
