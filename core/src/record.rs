//! Typed records for the Collections tables.
//!
//! Each record is built from a named [`RowMap`] in a single step at the
//! storage boundary. Columns whose storage class is not fixed by the Edge
//! schema (thumbnails, JSON tags, content blobs) stay as [`FieldValue`]s and
//! are decoded on demand. Flags are SQLite integers; `NULL` reads as
//! `false`.

use std::borrow::Cow;

use serde::Serialize;

use crate::error::{CoreError, Result};
use crate::shape::{FieldValue, RowMap, decode_value_as};

/// Builds a record from a named row.
pub trait FromRowMap: Sized {
    /// Reads the record from columns whose names start with `prefix`.
    ///
    /// Joined queries alias the columns of secondary tables (for example
    /// `sync_is_syncable`) so they do not collide with the primary table.
    fn from_prefixed(map: &RowMap, prefix: &str) -> Result<Self>;

    fn from_row_map(map: &RowMap) -> Result<Self> {
        Self::from_prefixed(map, "")
    }
}

/// A record addressable by id, optionally carrying a title.
pub trait Record {
    /// The record's id as text; numeric ids are rendered.
    fn record_id(&self) -> Option<Cow<'_, str>>;

    fn record_title(&self) -> Option<&str> {
        None
    }

    /// The `"<title>\n <id>"` label used by list views.
    fn display_name(&self) -> String {
        format!(
            "{}\n {}",
            self.record_title().unwrap_or_default(),
            self.record_id().unwrap_or_default()
        )
    }
}

impl<T: Record + ?Sized> Record for &T {
    fn record_id(&self) -> Option<Cow<'_, str>> {
        (**self).record_id()
    }

    fn record_title(&self) -> Option<&str> {
        (**self).record_title()
    }
}

impl Record for RowMap {
    fn record_id(&self) -> Option<Cow<'_, str>> {
        match self.get("id")? {
            FieldValue::Text(s) => Some(Cow::Borrowed(s.as_str())),
            other => other.to_text().map(Cow::Owned),
        }
    }

    fn record_title(&self) -> Option<&str> {
        self.get("title").and_then(FieldValue::as_str)
    }
}

/// Anything that names a collection: an id or a fetched collection record.
pub trait CollectionRef {
    fn collection_id(&self) -> &str;
}

impl CollectionRef for str {
    fn collection_id(&self) -> &str {
        self
    }
}

impl CollectionRef for String {
    fn collection_id(&self) -> &str {
        self
    }
}

impl<T: CollectionRef + ?Sized> CollectionRef for &T {
    fn collection_id(&self) -> &str {
        (**self).collection_id()
    }
}

struct Fields<'a> {
    map: &'a RowMap,
    prefix: &'a str,
}

impl<'a> Fields<'a> {
    fn get(&self, column: &str) -> Option<&'a FieldValue> {
        if self.prefix.is_empty() {
            self.map.get(column)
        } else {
            self.map.get(&format!("{}{column}", self.prefix))
        }
    }

    fn required_text(&self, column: &str) -> Result<String> {
        self.text(column)
            .ok_or_else(|| CoreError::MissingField(format!("{}{column}", self.prefix)))
    }

    fn text(&self, column: &str) -> Option<String> {
        self.get(column).and_then(FieldValue::to_text)
    }

    fn real(&self, column: &str) -> Option<f64> {
        self.get(column).and_then(FieldValue::as_f64)
    }

    fn integer(&self, column: &str) -> Option<i64> {
        self.get(column).and_then(FieldValue::as_i64)
    }

    fn flag(&self, column: &str) -> bool {
        self.get(column).is_some_and(FieldValue::as_bool)
    }

    fn value(&self, column: &str) -> FieldValue {
        self.get(column).cloned().unwrap_or_default()
    }
}

/// The `(id, title)` pair returned by collection listings.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CollectionSummary {
    pub id: String,
    pub title: String,
}

/// A full row of the `collections` table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Collection {
    pub id: String,
    pub title: String,
    pub date_created: Option<f64>,
    pub date_modified: Option<f64>,
    pub position: Option<i64>,
    pub is_syncable: bool,
    pub suggestion_url: Option<String>,
    pub suggestion_dismissed: bool,
    pub suggestion_type: FieldValue,
    pub thumbnail: FieldValue,
    pub is_custom_thumbnail: bool,
    pub tag: FieldValue,
    pub thumbnail_url: Option<String>,
    pub is_marked_for_deletion: bool,
}

impl Collection {
    /// Decodes the JSON `tag` column.
    pub fn decode_tag(&self) -> Result<serde_json::Value> {
        decode_value_as(&self.tag, "tag")
    }

    /// Decodes the JSON-encoded `thumbnail` blob.
    pub fn decode_thumbnail(&self) -> Result<serde_json::Value> {
        decode_value_as(&self.thumbnail, "thumbnail")
    }

    pub fn summary(&self) -> CollectionSummary {
        CollectionSummary {
            id: self.id.clone(),
            title: self.title.clone(),
        }
    }
}

/// The `(id, title)` pair returned by item listings.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ItemSummary {
    pub id: String,
    pub title: String,
}

/// A full row of the `items` table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Item {
    pub id: String,
    pub title: String,
    pub date_created: Option<f64>,
    pub date_modified: Option<f64>,
    pub source: FieldValue,
    pub entity_blob: FieldValue,
    pub favicon_url: Option<String>,
    pub canonical_image_data: FieldValue,
    pub canonical_image_url: FieldValue,
    pub text_content: FieldValue,
    pub html_content: FieldValue,
    #[serde(rename = "type")]
    pub item_type: Option<String>,
    pub progressing: Option<i64>,
    pub is_syncable: bool,
    pub color: FieldValue,
    pub third_party_data: FieldValue,
    pub remote_url: Option<String>,
    pub tag: FieldValue,
    pub is_marked_for_deletion: bool,
}

impl Item {
    pub fn decode_tag(&self) -> Result<serde_json::Value> {
        decode_value_as(&self.tag, "tag")
    }

    pub fn decode_source(&self) -> Result<serde_json::Value> {
        decode_value_as(&self.source, "source")
    }

    pub fn decode_entity_blob(&self) -> Result<serde_json::Value> {
        decode_value_as(&self.entity_blob, "entity_blob")
    }

    pub fn decode_canonical_image_data(&self) -> Result<serde_json::Value> {
        decode_value_as(&self.canonical_image_data, "canonical_image_data")
    }

    pub fn decode_third_party_data(&self) -> Result<serde_json::Value> {
        decode_value_as(&self.third_party_data, "third_party_data")
    }

    pub fn summary(&self) -> ItemSummary {
        ItemSummary {
            id: self.id.clone(),
            title: self.title.clone(),
        }
    }
}

/// A row of `collections_sync`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CollectionSync {
    pub collection_id: String,
    pub is_syncable: bool,
    pub server_id: Option<String>,
    pub date_last_synced: Option<f64>,
}

/// A row of `items_sync`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ItemSync {
    pub item_id: String,
    pub is_syncable: bool,
    pub server_id: Option<String>,
    pub date_last_synced: Option<f64>,
}

/// A collection together with its optional sync row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SyncableCollection {
    #[serde(flatten)]
    pub collection: Collection,
    pub sync: Option<CollectionSync>,
}

/// An item together with its optional sync row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SyncableItem {
    #[serde(flatten)]
    pub item: Item,
    pub sync: Option<ItemSync>,
}

/// A row of `collections_items_relationship`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Relationship {
    pub item_id: String,
    pub parent_id: String,
    pub position: Option<i64>,
}

/// One collection membership of an item, with the parent collection row.
///
/// `parent` is `None` when the relationship row points at a collection that
/// no longer exists.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Membership {
    pub item_id: String,
    pub parent_id: String,
    pub position: Option<i64>,
    pub parent: Option<Collection>,
}

/// A record augmented with its collection memberships.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Linked<T> {
    #[serde(flatten)]
    pub record: T,
    pub memberships: Vec<Membership>,
}

impl<T> Linked<T> {
    /// Whether any membership points at the given collection.
    pub fn is_in(&self, collection: impl CollectionRef) -> bool {
        let id = collection.collection_id();
        self.memberships.iter().any(|m| m.parent_id == id)
    }
}

impl FromRowMap for CollectionSummary {
    fn from_prefixed(map: &RowMap, prefix: &str) -> Result<Self> {
        let f = Fields { map, prefix };
        Ok(Self {
            id: f.required_text("id")?,
            title: f.text("title").unwrap_or_default(),
        })
    }
}

impl FromRowMap for Collection {
    fn from_prefixed(map: &RowMap, prefix: &str) -> Result<Self> {
        let f = Fields { map, prefix };
        Ok(Self {
            id: f.required_text("id")?,
            title: f.text("title").unwrap_or_default(),
            date_created: f.real("date_created"),
            date_modified: f.real("date_modified"),
            position: f.integer("position"),
            is_syncable: f.flag("is_syncable"),
            suggestion_url: f.text("suggestion_url"),
            suggestion_dismissed: f.flag("suggestion_dismissed"),
            suggestion_type: f.value("suggestion_type"),
            thumbnail: f.value("thumbnail"),
            is_custom_thumbnail: f.flag("is_custom_thumbnail"),
            tag: f.value("tag"),
            thumbnail_url: f.text("thumbnail_url"),
            is_marked_for_deletion: f.flag("is_marked_for_deletion"),
        })
    }
}

impl FromRowMap for ItemSummary {
    fn from_prefixed(map: &RowMap, prefix: &str) -> Result<Self> {
        let f = Fields { map, prefix };
        Ok(Self {
            id: f.required_text("id")?,
            title: f.text("title").unwrap_or_default(),
        })
    }
}

impl FromRowMap for Item {
    fn from_prefixed(map: &RowMap, prefix: &str) -> Result<Self> {
        let f = Fields { map, prefix };
        Ok(Self {
            id: f.required_text("id")?,
            title: f.text("title").unwrap_or_default(),
            date_created: f.real("date_created"),
            date_modified: f.real("date_modified"),
            source: f.value("source"),
            entity_blob: f.value("entity_blob"),
            favicon_url: f.text("favicon_url"),
            canonical_image_data: f.value("canonical_image_data"),
            canonical_image_url: f.value("canonical_image_url"),
            text_content: f.value("text_content"),
            html_content: f.value("html_content"),
            item_type: f.text("type"),
            progressing: f.integer("progressing"),
            is_syncable: f.flag("is_syncable"),
            color: f.value("color"),
            third_party_data: f.value("third_party_data"),
            remote_url: f.text("remote_url"),
            tag: f.value("tag"),
            is_marked_for_deletion: f.flag("is_marked_for_deletion"),
        })
    }
}

impl FromRowMap for CollectionSync {
    fn from_prefixed(map: &RowMap, prefix: &str) -> Result<Self> {
        let f = Fields { map, prefix };
        Ok(Self {
            collection_id: f.required_text("collection_id")?,
            is_syncable: f.flag("is_syncable"),
            server_id: f.text("server_id"),
            date_last_synced: f.real("date_last_synced"),
        })
    }
}

impl FromRowMap for ItemSync {
    fn from_prefixed(map: &RowMap, prefix: &str) -> Result<Self> {
        let f = Fields { map, prefix };
        Ok(Self {
            item_id: f.required_text("item_id")?,
            is_syncable: f.flag("is_syncable"),
            server_id: f.text("server_id"),
            date_last_synced: f.real("date_last_synced"),
        })
    }
}

impl FromRowMap for Relationship {
    fn from_prefixed(map: &RowMap, prefix: &str) -> Result<Self> {
        let f = Fields { map, prefix };
        Ok(Self {
            item_id: f.required_text("item_id")?,
            parent_id: f.required_text("parent_id")?,
            position: f.integer("position"),
        })
    }
}

/// Reads an optional joined record: `None` when its key column is null.
pub fn optional_joined<T: FromRowMap>(map: &RowMap, prefix: &str, key: &str) -> Result<Option<T>> {
    let present = map
        .get(&format!("{prefix}{key}"))
        .is_some_and(|v| !v.is_null());
    if present {
        T::from_prefixed(map, prefix).map(Some)
    } else {
        Ok(None)
    }
}

macro_rules! titled_record {
    ($($ty:ty),+) => {
        $(
            impl Record for $ty {
                fn record_id(&self) -> Option<Cow<'_, str>> {
                    Some(Cow::Borrowed(&self.id))
                }

                fn record_title(&self) -> Option<&str> {
                    Some(&self.title)
                }
            }
        )+
    };
}

titled_record!(Collection, CollectionSummary, Item, ItemSummary);

impl<T: Record> Record for Linked<T> {
    fn record_id(&self) -> Option<Cow<'_, str>> {
        self.record.record_id()
    }

    fn record_title(&self) -> Option<&str> {
        self.record.record_title()
    }
}

impl Record for SyncableCollection {
    fn record_id(&self) -> Option<Cow<'_, str>> {
        self.collection.record_id()
    }

    fn record_title(&self) -> Option<&str> {
        self.collection.record_title()
    }
}

impl Record for SyncableItem {
    fn record_id(&self) -> Option<Cow<'_, str>> {
        self.item.record_id()
    }

    fn record_title(&self) -> Option<&str> {
        self.item.record_title()
    }
}

impl CollectionRef for Collection {
    fn collection_id(&self) -> &str {
        &self.id
    }
}

impl CollectionRef for CollectionSummary {
    fn collection_id(&self) -> &str {
        &self.id
    }
}
