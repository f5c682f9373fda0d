//! Static registry of the Collections database tables and their columns.
//!
//! The Edge Collections database has a fixed, externally-owned schema. Every
//! table is a [`Table`] variant and every table has its own column enum, so
//! statically-known lookups such as `CollectionsColumn::Title` cannot
//! misspell a column. Untrusted names (from command-line flags, for example)
//! go through [`Table::from_str`](std::str::FromStr) and [`Table::column`],
//! which whitelist them against the registry before they are interpolated
//! into SQL text.
//!
//! # Examples
//!
//! ```
//! use edge_collections_core::{Table, sanitize_table_and_column};
//!
//! let (table, column) = sanitize_table_and_column("COLLECTIONS", "Title").unwrap();
//! assert_eq!((table, column), ("collections", "title"));
//!
//! assert!(sanitize_table_and_column("collections", "title; DROP TABLE items").is_err());
//! assert!(Table::Items.columns().contains(&"canonical_image_data"));
//! ```

use std::fmt;
use std::str::FromStr;

use crate::error::{CoreError, Result};

macro_rules! columns {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $column:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            /// Every column, in table order.
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// Stored column names, in table order.
            pub const NAMES: &'static [&'static str] = &[$($column),+];

            /// Returns the stored column name.
            pub const fn as_str(self) -> &'static str {
                match self {
                    $($name::$variant => $column),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

columns! {
    /// Columns of the `collections` table.
    CollectionsColumn {
        Id => "id",
        DateCreated => "date_created",
        DateModified => "date_modified",
        Title => "title",
        Position => "position",
        IsSyncable => "is_syncable",
        SuggestionUrl => "suggestion_url",
        SuggestionDismissed => "suggestion_dismissed",
        SuggestionType => "suggestion_type",
        Thumbnail => "thumbnail",
        IsCustomThumbnail => "is_custom_thumbnail",
        Tag => "tag",
        ThumbnailUrl => "thumbnail_url",
        IsMarkedForDeletion => "is_marked_for_deletion",
    }
}

columns! {
    /// Columns of the `items` table.
    ItemsColumn {
        Id => "id",
        DateCreated => "date_created",
        DateModified => "date_modified",
        Title => "title",
        Source => "source",
        EntityBlob => "entity_blob",
        FaviconUrl => "favicon_url",
        CanonicalImageData => "canonical_image_data",
        CanonicalImageUrl => "canonical_image_url",
        TextContent => "text_content",
        HtmlContent => "html_content",
        Type => "type",
        Progressing => "progressing",
        IsSyncable => "is_syncable",
        Color => "color",
        ThirdPartyData => "third_party_data",
        RemoteUrl => "remote_url",
        Tag => "tag",
        IsMarkedForDeletion => "is_marked_for_deletion",
    }
}

columns! {
    /// Columns of the `collections_sync` table.
    CollectionsSyncColumn {
        CollectionId => "collection_id",
        IsSyncable => "is_syncable",
        ServerId => "server_id",
        DateLastSynced => "date_last_synced",
    }
}

columns! {
    /// Columns of the `items_sync` table.
    ItemsSyncColumn {
        ItemId => "item_id",
        IsSyncable => "is_syncable",
        ServerId => "server_id",
        DateLastSynced => "date_last_synced",
    }
}

columns! {
    /// Columns of the `collections_items_relationship` table.
    RelationshipColumn {
        ItemId => "item_id",
        ParentId => "parent_id",
        Position => "position",
    }
}

columns! {
    /// Columns of the `favicons` table.
    FaviconsColumn {
        Url => "url",
        Data => "data",
    }
}

columns! {
    /// Columns of the `meta` table.
    MetaColumn {
        Key => "key",
        Value => "value",
    }
}

columns! {
    /// Columns of the `comments` table.
    CommentsColumn {
        Id => "id",
        ParentId => "parent_id",
        Text => "text",
        Properties => "properties",
    }
}

columns! {
    /// Columns of the `items_offline_data` table.
    ItemsOfflineDataColumn {
        ItemId => "item_id",
        OfflineFileData => "offline_file_data",
    }
}

columns! {
    /// Columns of the `collections_prism` table.
    CollectionsPrismColumn {
        Id => "id",
        DateModified => "date_modified",
        Title => "title",
    }
}

/// A table of the Collections database.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Table {
    Collections,
    Items,
    CollectionsSync,
    ItemsSync,
    CollectionsItemsRelationship,
    Favicons,
    Meta,
    Comments,
    ItemsOfflineData,
    CollectionsPrism,
}

impl Table {
    /// Every table, in registry order.
    pub const ALL: [Table; 10] = [
        Table::Collections,
        Table::Items,
        Table::CollectionsSync,
        Table::ItemsSync,
        Table::CollectionsItemsRelationship,
        Table::Favicons,
        Table::Meta,
        Table::Comments,
        Table::ItemsOfflineData,
        Table::CollectionsPrism,
    ];

    /// Returns the stored table name.
    pub const fn name(self) -> &'static str {
        match self {
            Table::Collections => "collections",
            Table::Items => "items",
            Table::CollectionsSync => "collections_sync",
            Table::ItemsSync => "items_sync",
            Table::CollectionsItemsRelationship => "collections_items_relationship",
            Table::Favicons => "favicons",
            Table::Meta => "meta",
            Table::Comments => "comments",
            Table::ItemsOfflineData => "items_offline_data",
            Table::CollectionsPrism => "collections_prism",
        }
    }

    /// Returns the table's column names in their fixed order.
    pub const fn columns(self) -> &'static [&'static str] {
        match self {
            Table::Collections => CollectionsColumn::NAMES,
            Table::Items => ItemsColumn::NAMES,
            Table::CollectionsSync => CollectionsSyncColumn::NAMES,
            Table::ItemsSync => ItemsSyncColumn::NAMES,
            Table::CollectionsItemsRelationship => RelationshipColumn::NAMES,
            Table::Favicons => FaviconsColumn::NAMES,
            Table::Meta => MetaColumn::NAMES,
            Table::Comments => CommentsColumn::NAMES,
            Table::ItemsOfflineData => ItemsOfflineDataColumn::NAMES,
            Table::CollectionsPrism => CollectionsPrismColumn::NAMES,
        }
    }

    /// Resolves a column name (case-insensitive) against this table.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::UnknownColumn`] if the table has no such column.
    pub fn column(self, name: &str) -> Result<Column> {
        let index = self
            .columns()
            .iter()
            .position(|candidate| candidate.eq_ignore_ascii_case(name))
            .ok_or_else(|| CoreError::UnknownColumn {
                table: self.name().to_string(),
                column: name.to_string(),
            })?;

        let column = match self {
            Table::Collections => Column::Collections(CollectionsColumn::ALL[index]),
            Table::Items => Column::Items(ItemsColumn::ALL[index]),
            Table::CollectionsSync => Column::CollectionsSync(CollectionsSyncColumn::ALL[index]),
            Table::ItemsSync => Column::ItemsSync(ItemsSyncColumn::ALL[index]),
            Table::CollectionsItemsRelationship => {
                Column::CollectionsItemsRelationship(RelationshipColumn::ALL[index])
            }
            Table::Favicons => Column::Favicons(FaviconsColumn::ALL[index]),
            Table::Meta => Column::Meta(MetaColumn::ALL[index]),
            Table::Comments => Column::Comments(CommentsColumn::ALL[index]),
            Table::ItemsOfflineData => Column::ItemsOfflineData(ItemsOfflineDataColumn::ALL[index]),
            Table::CollectionsPrism => Column::CollectionsPrism(CollectionsPrismColumn::ALL[index]),
        };
        Ok(column)
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Table {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        Table::ALL
            .into_iter()
            .find(|table| table.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| CoreError::UnknownTable(s.to_string()))
    }
}

/// A column of a specific table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Column {
    Collections(CollectionsColumn),
    Items(ItemsColumn),
    CollectionsSync(CollectionsSyncColumn),
    ItemsSync(ItemsSyncColumn),
    CollectionsItemsRelationship(RelationshipColumn),
    Favicons(FaviconsColumn),
    Meta(MetaColumn),
    Comments(CommentsColumn),
    ItemsOfflineData(ItemsOfflineDataColumn),
    CollectionsPrism(CollectionsPrismColumn),
}

impl Column {
    /// Returns the table this column belongs to.
    pub const fn table(self) -> Table {
        match self {
            Column::Collections(_) => Table::Collections,
            Column::Items(_) => Table::Items,
            Column::CollectionsSync(_) => Table::CollectionsSync,
            Column::ItemsSync(_) => Table::ItemsSync,
            Column::CollectionsItemsRelationship(_) => Table::CollectionsItemsRelationship,
            Column::Favicons(_) => Table::Favicons,
            Column::Meta(_) => Table::Meta,
            Column::Comments(_) => Table::Comments,
            Column::ItemsOfflineData(_) => Table::ItemsOfflineData,
            Column::CollectionsPrism(_) => Table::CollectionsPrism,
        }
    }

    /// Returns the stored column name.
    pub const fn as_str(self) -> &'static str {
        match self {
            Column::Collections(c) => c.as_str(),
            Column::Items(c) => c.as_str(),
            Column::CollectionsSync(c) => c.as_str(),
            Column::ItemsSync(c) => c.as_str(),
            Column::CollectionsItemsRelationship(c) => c.as_str(),
            Column::Favicons(c) => c.as_str(),
            Column::Meta(c) => c.as_str(),
            Column::Comments(c) => c.as_str(),
            Column::ItemsOfflineData(c) => c.as_str(),
            Column::CollectionsPrism(c) => c.as_str(),
        }
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.table(), self.as_str())
    }
}

impl From<CollectionsColumn> for Column {
    fn from(c: CollectionsColumn) -> Self {
        Column::Collections(c)
    }
}

impl From<ItemsColumn> for Column {
    fn from(c: ItemsColumn) -> Self {
        Column::Items(c)
    }
}

/// Validates a table and column name pair against the registry.
///
/// Returns the exact stored spelling of both identifiers, suitable for
/// interpolation into SQL text.
///
/// # Errors
///
/// Returns [`CoreError::UnknownTable`] or [`CoreError::UnknownColumn`] if
/// either name is not in the registry.
pub fn sanitize_table_and_column(table: &str, column: &str) -> Result<(&'static str, &'static str)> {
    let table: Table = table.parse()?;
    let column = table.column(column)?;
    Ok((table.name(), column.as_str()))
}
