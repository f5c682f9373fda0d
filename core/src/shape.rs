//! Row shaping: dynamic field values, ordered row mappings, blob decoding
//! and blob truncation for display.
//!
//! Rows leave the store as [`RawRow`]s. When the store is in named-row mode
//! each row is a [`RowMap`] keyed by column name; otherwise it is a bare
//! positional list. [`rows_to_mappings`] turns the former into mappings and
//! rejects the latter.
//!
//! # Examples
//!
//! ```
//! use edge_collections_core::{FieldValue, RowMap, truncate_blobs, DEFAULT_BLOB_FIELDS};
//!
//! let mut row = RowMap::new();
//! row.insert("id", "c1");
//! row.insert("thumbnail", vec![b'x'; 100]);
//!
//! let mut rows = vec![row];
//! truncate_blobs(&mut rows, DEFAULT_BLOB_FIELDS, 4);
//! assert_eq!(rows[0].get("thumbnail"), Some(&FieldValue::Blob(b"xxxx...".to_vec())));
//! ```

use serde::de::DeserializeOwned;
use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::error::{CoreError, Result};

/// Fields shortened by [`truncate_blobs`] unless the caller picks others.
pub const DEFAULT_BLOB_FIELDS: &[&str] = &[
    "thumbnail",
    "canonical_image_data",
    "canonical_image_url",
    "entity_blob",
    "source",
    "third_party_data",
];

/// Number of characters (or bytes) kept by [`truncate_blobs`] by default.
pub const DEFAULT_TRUNCATE_LIMIT: usize = 40;

/// Appended to every truncated value.
pub const TRUNCATION_MARKER: &str = "...";

/// A single SQLite value, independent of the driver.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum FieldValue {
    #[default]
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
    Blob(Vec<u8>),
}

impl FieldValue {
    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }

    /// Returns the text if this is a `Text` value.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the raw bytes of a `Text` or `Blob` value.
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            FieldValue::Text(s) => Some(s.as_bytes()),
            FieldValue::Blob(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            FieldValue::Integer(i) => Some(*i),
            FieldValue::Text(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FieldValue::Integer(i) => Some(*i as f64),
            FieldValue::Real(r) => Some(*r),
            FieldValue::Text(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Interprets the value as a SQLite boolean flag. `NULL` is `false`.
    pub fn as_bool(&self) -> bool {
        match self {
            FieldValue::Null => false,
            FieldValue::Integer(i) => *i != 0,
            FieldValue::Real(r) => *r != 0.0,
            FieldValue::Text(s) => matches!(s.trim(), "1" | "true" | "TRUE" | "True"),
            FieldValue::Blob(b) => !b.is_empty(),
        }
    }

    /// Renders the value as text; blobs are decoded as lossy UTF-8.
    pub fn to_text(&self) -> Option<String> {
        match self {
            FieldValue::Null => None,
            FieldValue::Integer(i) => Some(i.to_string()),
            FieldValue::Real(r) => Some(r.to_string()),
            FieldValue::Text(s) => Some(s.clone()),
            FieldValue::Blob(b) => Some(String::from_utf8_lossy(b).into_owned()),
        }
    }

    /// Length in characters for text and in bytes for blobs.
    pub fn len(&self) -> Option<usize> {
        match self {
            FieldValue::Text(s) => Some(s.chars().count()),
            FieldValue::Blob(b) => Some(b.len()),
            _ => None,
        }
    }

    /// SQLite storage class name, used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            FieldValue::Null => "null",
            FieldValue::Integer(_) => "integer",
            FieldValue::Real(_) => "real",
            FieldValue::Text(_) => "text",
            FieldValue::Blob(_) => "blob",
        }
    }
}

impl Serialize for FieldValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            FieldValue::Null => serializer.serialize_none(),
            FieldValue::Integer(i) => serializer.serialize_i64(*i),
            FieldValue::Real(r) => serializer.serialize_f64(*r),
            FieldValue::Text(s) => serializer.serialize_str(s),
            FieldValue::Blob(b) => serializer.serialize_str(&String::from_utf8_lossy(b)),
        }
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        FieldValue::Integer(value)
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        FieldValue::Real(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Integer(value as i64)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

impl From<Vec<u8>> for FieldValue {
    fn from(value: Vec<u8>) -> Self {
        FieldValue::Blob(value)
    }
}

impl From<&[u8]> for FieldValue {
    fn from(value: &[u8]) -> Self {
        FieldValue::Blob(value.to_vec())
    }
}

impl<T: Into<FieldValue>> From<Option<T>> for FieldValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(FieldValue::Null, Into::into)
    }
}

/// An ordered column-name → value mapping for one row.
///
/// Keys keep the order in which they were first inserted. Inserting an
/// existing key replaces its value in place, so for joined rows with
/// repeated column names the later column wins.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RowMap {
    entries: Vec<(String, FieldValue)>,
}

impl RowMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
        }
    }

    /// Inserts or replaces a value, returning the previous one.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<FieldValue>) -> Option<FieldValue> {
        let key = key.into();
        let value = value.into();
        match self.get_mut(&key) {
            Some(slot) => Some(std::mem::replace(slot, value)),
            None => {
                self.entries.push((key, value));
                None
            }
        }
    }

    pub fn get(&self, key: &str) -> Option<&FieldValue> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut FieldValue> {
        self.entries
            .iter_mut()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }

    /// Removes a key, keeping the order of the remaining entries.
    pub fn remove(&mut self, key: &str) -> Option<FieldValue> {
        let index = self.entries.iter().position(|(k, _)| k == key)?;
        Some(self.entries.remove(index).1)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Returns the value at `key` rendered as text, if present and non-null.
    pub fn text(&self, key: &str) -> Option<String> {
        self.get(key).and_then(FieldValue::to_text)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<String>, V: Into<FieldValue>> FromIterator<(K, V)> for RowMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = RowMap::new();
        for (k, v) in iter {
            map.insert(k, v);
        }
        map
    }
}

impl IntoIterator for RowMap {
    type Item = (String, FieldValue);
    type IntoIter = std::vec::IntoIter<(String, FieldValue)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl Serialize for RowMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (k, v) in &self.entries {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

/// A row as produced by the store, shaped by its current row mode.
#[derive(Debug, Clone, PartialEq)]
pub enum RawRow {
    /// Addressable by column name.
    Named(RowMap),
    /// Addressable by index only.
    Positional(Vec<FieldValue>),
}

/// Converts rows into mappings, lazily and in input order.
///
/// Each call returns a fresh iterator. A positional row yields
/// [`CoreError::TypeMismatch`] at its position.
pub fn rows_to_mappings<I>(rows: I) -> impl Iterator<Item = Result<RowMap>>
where
    I: IntoIterator<Item = RawRow>,
{
    rows.into_iter().enumerate().map(|(index, row)| match row {
        RawRow::Named(map) => Ok(map),
        RawRow::Positional(_) => Err(CoreError::TypeMismatch(format!(
            "row {index} is positional; named rows are required"
        ))),
    })
}

/// Collects [`rows_to_mappings`], failing on the first positional row.
pub fn collect_mappings<I>(rows: I) -> Result<Vec<RowMap>>
where
    I: IntoIterator<Item = RawRow>,
{
    rows_to_mappings(rows).collect()
}

/// Parses the text or bytes stored at `key` as JSON.
///
/// The mapping is not modified.
///
/// # Errors
///
/// - [`CoreError::MissingField`] if `key` is absent
/// - [`CoreError::TypeMismatch`] if the value is neither text nor blob
/// - [`CoreError::Json`] if the content is not valid JSON
pub fn decode_blob(map: &RowMap, key: &str) -> Result<serde_json::Value> {
    decode_blob_as(map, key)
}

/// Like [`decode_blob`], deserializing into any `serde` type.
pub fn decode_blob_as<T: DeserializeOwned>(map: &RowMap, key: &str) -> Result<T> {
    let value = map
        .get(key)
        .ok_or_else(|| CoreError::MissingField(key.to_string()))?;
    decode_value_as(value, key)
}

pub(crate) fn decode_value_as<T: DeserializeOwned>(value: &FieldValue, key: &str) -> Result<T> {
    let bytes = value.as_bytes().ok_or_else(|| {
        CoreError::TypeMismatch(format!(
            "field '{key}' holds {} and cannot be decoded as JSON",
            value.kind()
        ))
    })?;
    Ok(serde_json::from_slice(bytes)?)
}

/// Shortens oversized text/blob values in place for display.
///
/// For every mapping and every listed field, a value longer than `limit`
/// (characters for text, bytes for blobs) is replaced by its first `limit`
/// units followed by [`TRUNCATION_MARKER`]. Text stays text and blobs stay
/// blobs. Missing, null, empty and numeric values are left alone.
pub fn truncate_blobs<S: AsRef<str>>(maps: &mut [RowMap], fields: &[S], limit: usize) {
    for map in maps.iter_mut() {
        for field in fields {
            if let Some(value) = map.get_mut(field.as_ref()) {
                truncate_value(value, limit);
            }
        }
    }
}

/// Truncates a single value; see [`truncate_blobs`].
pub fn truncate_value(value: &mut FieldValue, limit: usize) {
    match value {
        FieldValue::Text(s) => {
            if let Some((cut, _)) = s.char_indices().nth(limit) {
                s.truncate(cut);
                s.push_str(TRUNCATION_MARKER);
            }
        }
        FieldValue::Blob(b) => {
            if b.len() > limit {
                b.truncate(limit);
                b.extend_from_slice(TRUNCATION_MARKER.as_bytes());
            }
        }
        _ => {}
    }
}
