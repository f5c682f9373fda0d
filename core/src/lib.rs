//! Core types for working with the Microsoft Edge Collections database.
//!
//! This crate has no database driver dependency. It defines:
//!
//! - [`Table`] and the per-table column enums: the fixed registry of table
//!   and column names, used to whitelist identifiers before they are placed
//!   in SQL text ([`sanitize_table_and_column`]).
//! - [`FieldValue`], [`RowMap`] and [`RawRow`]: driver-independent row
//!   shapes, plus [`rows_to_mappings`], [`decode_blob`] and
//!   [`truncate_blobs`].
//! - [`Collection`], [`Item`], [`Membership`] and the other typed records,
//!   built from named rows through [`FromRowMap`].
//!
//! # Example
//!
//! ```
//! use edge_collections_core::*;
//!
//! let row = RowMap::from_iter([
//!     ("id", FieldValue::from("c1")),
//!     ("title", FieldValue::from("Recipes")),
//!     ("tag", FieldValue::from(r#"{"color":"green"}"#)),
//! ]);
//!
//! let collection = Collection::from_row_map(&row).unwrap();
//! assert_eq!(collection.title, "Recipes");
//! assert_eq!(decode_blob(&row, "tag").unwrap()["color"], "green");
//!
//! let (table, column) = sanitize_table_and_column("collections", "TITLE").unwrap();
//! assert_eq!(format!("{table}.{column}"), "collections.title");
//! ```

mod error;
mod record;
mod registry;
mod shape;

pub use error::{CoreError, Result};
pub use record::*;
pub use registry::*;
pub use shape::{
    DEFAULT_BLOB_FIELDS, DEFAULT_TRUNCATE_LIMIT, FieldValue, RawRow, RowMap, TRUNCATION_MARKER,
    collect_mappings, decode_blob, decode_blob_as, rows_to_mappings, truncate_blobs,
    truncate_value,
};
