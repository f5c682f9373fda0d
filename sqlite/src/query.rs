//! Collection and item queries.
//!
//! Provides [`CollectionsQuery`] for reading, filtering and editing rows of
//! the Collections database. Every operation is a single statement (the
//! linking query is one statement per batch of ids) run against an already
//! open [`Database`]. Mutations are not wrapped in transactions here;
//! committing is up to the caller.
//!
//! # Example
//!
//! ```no_run
//! use edge_collections_sqlite::{CollectionsQuery, Database, TitleMatch};
//!
//! let (db, _path) = Database::open(None).unwrap();
//! let query = CollectionsQuery::new(&db);
//!
//! for summary in query.list_collections().unwrap() {
//!     println!("{} ({})", summary.title, summary.id);
//! }
//!
//! let recipes = query.find_collections_by_title("recipe", TitleMatch::Substring).unwrap();
//! if let Some(collection) = recipes.first() {
//!     let items = query.get_items_in_collection(collection).unwrap();
//!     println!("{} items", items.len());
//! }
//! ```

use std::collections::HashMap;

use edge_collections_core::{
    Collection, CollectionRef, CollectionSummary, CollectionsSyncColumn, CoreError, FieldValue,
    FromRowMap, Item, ItemSummary, ItemsSyncColumn, Linked, Membership, Record, Relationship,
    RowMap, SyncableCollection, SyncableItem, Table, optional_joined,
};
use rusqlite::{params, params_from_iter};
use tracing::{debug, info};

use crate::convert;
use crate::error::Result;
use crate::store::Database;

/// Upper bound on ids bound into one `IN (...)` list.
const LINK_BATCH_SIZE: usize = 500;

/// How a title filter is compared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TitleMatch {
    /// Title equals the text.
    #[default]
    Exact,
    /// Title contains the text (SQL `LIKE`, ASCII case-insensitive).
    Substring,
}

impl TitleMatch {
    pub fn from_like(like: bool) -> Self {
        if like { TitleMatch::Substring } else { TitleMatch::Exact }
    }
}

/// Query interface over an open Collections database.
pub struct CollectionsQuery<'a> {
    db: &'a Database,
}

impl<'a> CollectionsQuery<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Returns the `(id, title)` pair of every collection in table order.
    pub fn list_collections(&self) -> Result<Vec<CollectionSummary>> {
        self.db.query_records("SELECT id, title FROM collections", [])
    }

    /// Loads a single collection by id.
    ///
    /// Returns `None` if no collection has that id.
    pub fn get_collection(&self, id: &str) -> Result<Option<Collection>> {
        let mut rows = self
            .db
            .query_records("SELECT * FROM collections WHERE id = ?1", params![id])?;
        Ok(rows.pop())
    }

    /// Returns all collections whose title equals or contains `title`.
    pub fn find_collections_by_title(&self, title: &str, mode: TitleMatch) -> Result<Vec<Collection>> {
        self.find_by_title(Table::Collections, title, mode)
    }

    /// Sets the title of the collection with the given id.
    ///
    /// Returns the number of rows changed; `0` means no collection matched.
    /// The title is stored as given.
    pub fn rename_collection(&self, id: &str, new_title: &str) -> Result<usize> {
        let changed = self.db.execute(
            "UPDATE collections SET title = ?1 WHERE id = ?2",
            params![new_title, id],
        )?;
        info!(id, changed, "renamed collection");
        Ok(changed)
    }

    /// Deletes the collection with the given id.
    ///
    /// Relationship rows pointing at the collection are left in place.
    /// Returns the number of rows removed; `0` means no collection matched.
    pub fn delete_collection(&self, id: &str) -> Result<usize> {
        let removed = self
            .db
            .execute("DELETE FROM collections WHERE id = ?1", params![id])?;
        info!(id, removed, "deleted collection");
        Ok(removed)
    }

    /// Returns the `(id, title)` pair of every item in table order.
    pub fn list_items(&self) -> Result<Vec<ItemSummary>> {
        self.db.query_records("SELECT id, title FROM items", [])
    }

    /// Loads a single item by id.
    pub fn get_item(&self, id: &str) -> Result<Option<Item>> {
        let mut rows = self
            .db
            .query_records("SELECT * FROM items WHERE id = ?1", params![id])?;
        Ok(rows.pop())
    }

    /// Returns all items whose title equals or contains `title`.
    pub fn find_items_by_title(&self, title: &str, mode: TitleMatch) -> Result<Vec<Item>> {
        self.find_by_title(Table::Items, title, mode)
    }

    /// Returns the items of a collection, ordered by their position in it.
    ///
    /// Accepts a collection id or a previously loaded collection record.
    pub fn get_items_in_collection(&self, collection: impl CollectionRef) -> Result<Vec<Item>> {
        self.db.query_records(
            "SELECT items.* FROM collections_items_relationship cir \
             JOIN items ON items.id = cir.item_id \
             WHERE cir.parent_id = ?1 \
             ORDER BY cir.position",
            params![collection.collection_id()],
        )
    }

    /// Attaches collection memberships to each item.
    ///
    /// All relationship rows for the given items are fetched with one joined
    /// query per batch of ids, then grouped by item id. Memberships are
    /// ordered by position, then by parent id. A relationship whose parent
    /// collection no longer exists yields a membership with `parent: None`.
    ///
    /// Items are returned once per distinct id, in first-seen order.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::MissingId`] if any item has no id.
    pub fn link_items_to_collections<T>(&self, items: &[T]) -> Result<Vec<Linked<T>>>
    where
        T: Record + Clone,
    {
        let mut linked: Vec<Linked<T>> = Vec::with_capacity(items.len());
        let mut ids: Vec<String> = Vec::with_capacity(items.len());
        let mut index: HashMap<String, usize> = HashMap::with_capacity(items.len());

        for item in items {
            let id = item
                .record_id()
                .filter(|id| !id.is_empty())
                .ok_or(CoreError::MissingId)?;
            match index.get(id.as_ref()) {
                Some(&slot) => linked[slot].record = item.clone(),
                None => {
                    index.insert(id.to_string(), linked.len());
                    ids.push(id.into_owned());
                    linked.push(Linked {
                        record: item.clone(),
                        memberships: Vec::new(),
                    });
                }
            }
        }

        for batch in ids.chunks(LINK_BATCH_SIZE) {
            let placeholders = vec!["?"; batch.len()].join(", ");
            let sql = format!(
                "SELECT cir.item_id AS rel_item_id, cir.parent_id AS rel_parent_id, \
                 cir.position AS rel_position, c.* \
                 FROM collections_items_relationship cir \
                 LEFT JOIN collections c ON c.id = cir.parent_id \
                 WHERE cir.item_id IN ({placeholders}) \
                 ORDER BY cir.position, cir.parent_id"
            );
            let rows = self.db.query_named(&sql, params_from_iter(batch.iter()))?;
            debug!(batch = batch.len(), relationships = rows.len(), "linked items");

            for row in &rows {
                let membership = membership_from_row(row)?;
                if let Some(&slot) = index.get(&membership.item_id) {
                    linked[slot].memberships.push(membership);
                }
            }
        }

        Ok(linked)
    }

    /// Returns every relationship row in table order.
    pub fn list_relationships(&self) -> Result<Vec<Relationship>> {
        self.db
            .query_records("SELECT * FROM collections_items_relationship", [])
    }

    /// Returns collections where the collection or its sync row is syncable.
    pub fn check_syncable_collections(&self) -> Result<Vec<SyncableCollection>> {
        let sql = format!(
            "SELECT c.*, {} FROM collections c \
             LEFT JOIN collections_sync s ON c.id = s.collection_id \
             WHERE s.is_syncable = 1 OR c.is_syncable = 1",
            aliased_columns("s", CollectionsSyncColumn::NAMES)
        );
        self.db
            .query_named(&sql, [])?
            .iter()
            .map(|row| -> Result<SyncableCollection> {
                Ok(SyncableCollection {
                    collection: Collection::from_row_map(row)?,
                    sync: optional_joined(row, SYNC_PREFIX, "collection_id")?,
                })
            })
            .collect()
    }

    /// Returns items where the item or its sync row is syncable.
    pub fn check_syncable_items(&self) -> Result<Vec<SyncableItem>> {
        let sql = format!(
            "SELECT i.*, {} FROM items i \
             LEFT JOIN items_sync s ON i.id = s.item_id \
             WHERE s.is_syncable = 1 OR i.is_syncable = 1",
            aliased_columns("s", ItemsSyncColumn::NAMES)
        );
        self.db
            .query_named(&sql, [])?
            .iter()
            .map(|row| -> Result<SyncableItem> {
                Ok(SyncableItem {
                    item: Item::from_row_map(row)?,
                    sync: optional_joined(row, SYNC_PREFIX, "item_id")?,
                })
            })
            .collect()
    }

    /// Returns every row of a table as mappings.
    pub fn scan_table(&self, table: Table) -> Result<Vec<RowMap>> {
        self.db.query_named(&format!("SELECT * FROM {table}"), [])
    }

    /// Like [`scan_table`](Self::scan_table) for an untrusted table name.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::UnknownTable`] before any query is issued if the
    /// name is not in the registry.
    pub fn scan_table_named(&self, table: &str) -> Result<Vec<RowMap>> {
        let table: Table = table.parse()?;
        self.scan_table(table)
    }

    /// Returns at most `limit` rows of a table, in table order.
    pub fn sample_table(&self, table: Table, limit: usize) -> Result<Vec<RowMap>> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        self.db
            .query_named(&format!("SELECT * FROM {table} LIMIT ?1"), params![limit])
    }

    /// Returns the number of rows in a table.
    pub fn count_rows(&self, table: Table) -> Result<u64> {
        let count: i64 = self.db.connection().query_row(
            &format!("SELECT COUNT(*) FROM {table}"),
            [],
            |row| row.get(0),
        )?;
        Ok(count.max(0) as u64)
    }

    /// Returns rows where `column` equals (or, with `like`, contains) `value`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::UnknownColumn`] if `column` is not a column of
    /// `table`.
    pub fn filter_table(
        &self,
        table: Table,
        column: &str,
        value: impl Into<FieldValue>,
        like: bool,
    ) -> Result<Vec<RowMap>> {
        let column = table.column(column)?.as_str();
        let value = value.into();

        if like {
            let text = value.to_text().unwrap_or_default();
            self.db.query_named(
                &format!("SELECT * FROM {table} WHERE {column} LIKE ?1 ESCAPE '\\'"),
                params![like_pattern(&text)],
            )
        } else {
            self.db.query_named(
                &format!("SELECT * FROM {table} WHERE {column} = ?1"),
                [convert::sql_value(&value)],
            )
        }
    }

    fn find_by_title<T: FromRowMap>(&self, table: Table, title: &str, mode: TitleMatch) -> Result<Vec<T>> {
        match mode {
            TitleMatch::Exact => self.db.query_records(
                &format!("SELECT * FROM {table} WHERE title = ?1"),
                params![title],
            ),
            TitleMatch::Substring => self.db.query_records(
                &format!("SELECT * FROM {table} WHERE title LIKE ?1 ESCAPE '\\'"),
                params![like_pattern(title)],
            ),
        }
    }
}

const SYNC_PREFIX: &str = "sync_";

/// Renders `alias.col AS sync_col, ...` for a joined sync table.
fn aliased_columns(alias: &str, columns: &[&str]) -> String {
    columns
        .iter()
        .map(|c| format!("{alias}.{c} AS {SYNC_PREFIX}{c}"))
        .collect::<Vec<_>>()
        .join(", ")
}

fn membership_from_row(row: &RowMap) -> Result<Membership> {
    let relationship = Relationship::from_prefixed(row, "rel_")?;
    Ok(Membership {
        item_id: relationship.item_id,
        parent_id: relationship.parent_id,
        position: relationship.position,
        parent: optional_joined(row, "", "id")?,
    })
}

/// Builds a `LIKE` pattern matching `text` literally anywhere in a value.
fn like_pattern(text: &str) -> String {
    let mut pattern = String::with_capacity(text.len() + 2);
    pattern.push('%');
    for ch in text.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(ch);
    }
    pattern.push('%');
    pattern
}
