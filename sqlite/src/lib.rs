//! SQLite access layer for the Microsoft Edge Collections database.
//!
//! This crate opens Edge's `collectionsSQLite` file and provides the
//! queries used by the editor: listing, looking up and filtering
//! collections and items, renaming and deleting collections, resolving
//! collection memberships, and generic table scans for inspection.
//!
//! # Architecture
//!
//! - **`store`**: the [`Database`] handle and the scoped named-row mode
//! - **`location`**: default file discovery and path resolution
//! - **`query`**: [`CollectionsQuery`], the single-statement operations
//! - **`backup`**: numbered, never-overwriting file backups and snapshots
//! - **`convert`**: rusqlite values ↔ [`FieldValue`](edge_collections_core::FieldValue)
//!
//! # Quick start
//!
//! ```no_run
//! use edge_collections_sqlite::{CollectionsQuery, Database, snapshot_database};
//!
//! let (db, path) = Database::open(None).unwrap();
//! snapshot_database(&db, &path).unwrap();
//!
//! let query = CollectionsQuery::new(&db);
//! let items = query.list_items().unwrap();
//! for linked in query.link_items_to_collections(&items).unwrap() {
//!     println!("{} is in {} collection(s)", linked.record.title, linked.memberships.len());
//! }
//!
//! let tx = db.transaction().unwrap();
//! query.rename_collection("some-id", "Renamed").unwrap();
//! tx.commit().unwrap();
//! ```
//!
//! # Threading
//!
//! A [`Database`] is single-threaded. Its row mode is connection-wide state
//! toggled through [`Database::named_rows`], and the type is not `Sync`.

mod backup;
mod convert;
mod error;
mod location;
mod query;
mod store;

pub use backup::{backup_database, backup_path, snapshot_database};
pub use error::{Result, SqliteError};
pub use location::{
    DATABASE_FILE_NAME, DEFAULT_PROFILE, default_database_path, resolve_database_path, reveal,
};
pub use query::{CollectionsQuery, TitleMatch};
pub use store::{Database, NamedRows, RowMode};
