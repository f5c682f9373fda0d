//! Conversion between rusqlite values and driver-independent row shapes.

use edge_collections_core::{FieldValue, RawRow, RowMap};
use rusqlite::Row;
use rusqlite::types::{Value, ValueRef};

/// Copies a borrowed SQLite value into a [`FieldValue`].
///
/// Text that is not valid UTF-8 is decoded lossily.
pub(crate) fn field_value(value: ValueRef<'_>) -> FieldValue {
    match value {
        ValueRef::Null => FieldValue::Null,
        ValueRef::Integer(i) => FieldValue::Integer(i),
        ValueRef::Real(r) => FieldValue::Real(r),
        ValueRef::Text(t) => FieldValue::Text(String::from_utf8_lossy(t).into_owned()),
        ValueRef::Blob(b) => FieldValue::Blob(b.to_vec()),
    }
}

/// Converts a [`FieldValue`] into an owned rusqlite value for binding.
pub(crate) fn sql_value(value: &FieldValue) -> Value {
    match value {
        FieldValue::Null => Value::Null,
        FieldValue::Integer(i) => Value::Integer(*i),
        FieldValue::Real(r) => Value::Real(*r),
        FieldValue::Text(s) => Value::Text(s.clone()),
        FieldValue::Blob(b) => Value::Blob(b.clone()),
    }
}

/// Reads every column of `row` as a named mapping.
pub(crate) fn named_row(row: &Row<'_>, names: &[String]) -> rusqlite::Result<RawRow> {
    let mut map = RowMap::with_capacity(names.len());
    for (index, name) in names.iter().enumerate() {
        map.insert(name.as_str(), field_value(row.get_ref(index)?));
    }
    Ok(RawRow::Named(map))
}

/// Reads every column of `row` by position.
pub(crate) fn positional_row(row: &Row<'_>, width: usize) -> rusqlite::Result<RawRow> {
    let mut values = Vec::with_capacity(width);
    for index in 0..width {
        values.push(field_value(row.get_ref(index)?));
    }
    Ok(RawRow::Positional(values))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::Connection;

    #[test]
    fn test_field_value_covers_storage_classes() {
        let conn = Connection::open_in_memory().unwrap();
        let row: Vec<FieldValue> = conn
            .query_row("SELECT NULL, 7, 1.5, 'txt', x'00ff'", [], |row| {
                (0..5)
                    .map(|i| row.get_ref(i).map(field_value))
                    .collect::<rusqlite::Result<Vec<_>>>()
            })
            .unwrap();

        assert_eq!(
            row,
            vec![
                FieldValue::Null,
                FieldValue::Integer(7),
                FieldValue::Real(1.5),
                FieldValue::Text("txt".into()),
                FieldValue::Blob(vec![0x00, 0xff]),
            ]
        );
    }

    #[test]
    fn test_sql_value_round_trips_through_sqlite() {
        let conn = Connection::open_in_memory().unwrap();
        let value = FieldValue::Blob(b"abc".to_vec());
        let back = conn
            .query_row("SELECT ?1", [sql_value(&value)], |row| {
                row.get_ref(0).map(field_value)
            })
            .unwrap();
        assert_eq!(back, value);
    }
}
