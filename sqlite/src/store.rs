//! The open database handle and its row-representation mode.
//!
//! Query results come back as [`RawRow`]s whose shape depends on the
//! handle's current [`RowMode`]. The mode is connection-wide state, so it is
//! only ever switched through the [`NamedRows`] guard, which puts the prior
//! mode back when it goes out of scope, including on `?` early returns and
//! unwinding.
//!
//! [`Database`] is deliberately `!Sync`: the mode toggle must never be
//! observed mid-query from another thread.
//!
//! # Example
//!
//! ```
//! use edge_collections_sqlite::{Database, RowMode};
//!
//! let db = Database::open_in_memory().unwrap();
//! {
//!     let _named = db.named_rows();
//!     assert_eq!(db.row_mode(), RowMode::Named);
//! }
//! assert_eq!(db.row_mode(), RowMode::Positional);
//! ```

use std::cell::Cell;
use std::path::{Path, PathBuf};

use edge_collections_core::{FromRowMap, RawRow, RowMap, collect_mappings};
use rusqlite::{Connection, OpenFlags, Params, Transaction};
use tracing::{debug, info};

use crate::convert;
use crate::error::Result;
use crate::location::{DEFAULT_PROFILE, default_database_path, resolve_database_path};

/// How result rows are represented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RowMode {
    /// Rows are bare value lists.
    #[default]
    Positional,
    /// Rows are addressable by column name.
    Named,
}

/// An open Collections database.
pub struct Database {
    conn: Connection,
    mode: Cell<RowMode>,
}

impl Database {
    /// Wraps an existing connection, starting in [`RowMode::Positional`].
    pub fn new(conn: Connection) -> Self {
        Self {
            conn,
            mode: Cell::new(RowMode::Positional),
        }
    }

    /// Opens the database at `path`, falling back to the default location.
    ///
    /// Returns the handle together with the path that was actually opened.
    ///
    /// # Errors
    ///
    /// - [`NotFound`](crate::SqliteError::NotFound) if neither `path` nor the
    ///   default location exists
    /// - [`InvalidPath`](crate::SqliteError::InvalidPath) if the resolved
    ///   path is not a regular file
    pub fn open(path: Option<&Path>) -> Result<(Self, PathBuf)> {
        Self::open_with_profile(path, DEFAULT_PROFILE)
    }

    /// Like [`open`](Self::open), using the given Edge profile for the
    /// default location.
    pub fn open_with_profile(path: Option<&Path>, profile: &str) -> Result<(Self, PathBuf)> {
        let resolved = resolve_database_path(path, default_database_path(profile))?;
        let conn = Connection::open_with_flags(
            &resolved,
            OpenFlags::SQLITE_OPEN_READ_WRITE
                | OpenFlags::SQLITE_OPEN_URI
                | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;
        info!(path = %resolved.display(), "opened collections database");
        Ok((Self::new(conn), resolved))
    }

    /// Opens a private in-memory database.
    pub fn open_in_memory() -> Result<Self> {
        Ok(Self::new(Connection::open_in_memory()?))
    }

    /// Returns a reference to the underlying connection.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    pub fn row_mode(&self) -> RowMode {
        self.mode.get()
    }

    /// Switches to named rows until the returned guard is dropped.
    pub fn named_rows(&self) -> NamedRows<'_> {
        let previous = self.mode.replace(RowMode::Named);
        NamedRows { db: self, previous }
    }

    /// Runs a row-returning statement, shaping rows by the current mode.
    pub fn query_rows<P: Params>(&self, sql: &str, params: P) -> Result<Vec<RawRow>> {
        let mode = self.row_mode();
        debug!(?mode, sql, "query");

        let mut stmt = self.conn.prepare(sql)?;
        let names: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();
        let mut rows = stmt.query(params)?;

        let mut out = Vec::new();
        while let Some(row) = rows.next()? {
            let shaped = match mode {
                RowMode::Named => convert::named_row(row, &names)?,
                RowMode::Positional => convert::positional_row(row, names.len())?,
            };
            out.push(shaped);
        }
        Ok(out)
    }

    /// Runs a statement in named-row mode and returns the rows as mappings.
    pub fn query_named<P: Params>(&self, sql: &str, params: P) -> Result<Vec<RowMap>> {
        let _named = self.named_rows();
        let rows = self.query_rows(sql, params)?;
        Ok(collect_mappings(rows)?)
    }

    /// Runs a statement in named-row mode and builds typed records.
    pub fn query_records<T: FromRowMap, P: Params>(&self, sql: &str, params: P) -> Result<Vec<T>> {
        self.query_named(sql, params)?
            .iter()
            .map(|map| T::from_row_map(map).map_err(Into::into))
            .collect()
    }

    /// Executes a non-row-returning statement, returning the changed row count.
    pub fn execute<P: Params>(&self, sql: &str, params: P) -> Result<usize> {
        debug!(sql, "execute");
        Ok(self.conn.execute(sql, params)?)
    }

    /// Begins a transaction; edits made through this handle are committed
    /// or rolled back by the caller.
    pub fn transaction(&self) -> Result<Transaction<'_>> {
        Ok(self.conn.unchecked_transaction()?)
    }
}

/// Restores the prior [`RowMode`] when dropped.
#[must_use = "the row mode reverts as soon as the guard is dropped"]
pub struct NamedRows<'a> {
    db: &'a Database,
    previous: RowMode,
}

impl Drop for NamedRows<'_> {
    fn drop(&mut self) {
        self.db.mode.set(self.previous);
    }
}
