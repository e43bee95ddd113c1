//! Row normalization: renaming and transform
//!
//! Turns a raw text batch into the batch actually persisted: assigns the
//! descriptor's canonical column names positionally and applies the table's
//! transform. The chunk reader hands every source field through unchanged
//! and adds no columns of its own, so any width deviation is malformed
//! source data.

use crate::catalog::TableDescriptor;
use crate::error::{LoadError, Result};
use crate::model::{Column, NormalizedBatch, RawBatch, Value};

/// Normalize one raw batch for its destination table.
///
/// Fails with `ShapeMismatch` when a row's width differs from the
/// descriptor's declared column count.
pub fn normalize(raw: RawBatch, descriptor: &TableDescriptor) -> Result<NormalizedBatch> {
    let expected = descriptor.columns.len();
    let mut rows = Vec::with_capacity(raw.len());

    for fields in raw.rows {
        if fields.len() != expected {
            return Err(LoadError::ShapeMismatch {
                table: descriptor.table_name.to_string(),
                expected,
                actual: fields.len(),
            });
        }

        rows.push(fields.into_iter().map(cell_value).collect());
    }

    let columns = descriptor.columns.iter().map(|c| Column::text(*c)).collect();
    let renamed = NormalizedBatch { columns, rows };

    descriptor.transform.apply(descriptor.table_name, renamed)
}

/// Empty source fields persist as NULL, everything else as text
fn cell_value(field: String) -> Value {
    if field.is_empty() {
        Value::Null
    } else {
        Value::Text(field)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::catalog::Transform;
    use encoding_rs::WINDOWS_1252;

    fn descriptor(columns: &'static [&'static str], transform: Transform) -> TableDescriptor {
        TableDescriptor {
            label: "orders",
            table_name: "orders",
            columns,
            encoding: WINDOWS_1252,
            transform,
        }
    }

    fn raw(rows: &[&[&str]]) -> RawBatch {
        RawBatch::new(
            rows.iter()
                .map(|r| r.iter().map(|f| f.to_string()).collect())
                .collect(),
        )
    }

    #[test]
    fn test_identity_rename_matches_descriptor_columns() {
        let desc = descriptor(&["id", "amount"], Transform::Identity);
        let batch = normalize(raw(&[&["1", "10.0"], &["2", "20.5"]]), &desc).unwrap();

        let names: Vec<&str> = batch.columns.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["id", "amount"]);
        assert_eq!(batch.len(), 2);
        assert_eq!(batch.rows[1][1], Value::Text("20.5".to_string()));
    }

    #[test]
    fn test_shape_mismatch_is_rejected() {
        let desc = descriptor(&["id", "amount"], Transform::Identity);
        let err = normalize(raw(&[&["1", "10.0", "x", "y"]]), &desc).unwrap_err();
        assert!(matches!(
            err,
            LoadError::ShapeMismatch {
                expected: 2,
                actual: 4,
                ..
            }
        ));
    }

    #[test]
    fn test_one_extra_field_is_a_shape_mismatch() {
        // a row one field too wide must fail, not load with its fields
        // shifted into the wrong columns
        let desc = descriptor(&["id", "amount"], Transform::Identity);
        let err = normalize(raw(&[&["1", "10.0", "junk"]]), &desc).unwrap_err();
        assert!(matches!(
            err,
            LoadError::ShapeMismatch {
                expected: 2,
                actual: 3,
                ..
            }
        ));
    }

    #[test]
    fn test_one_missing_field_is_a_shape_mismatch() {
        let desc = descriptor(&["id", "amount"], Transform::Identity);
        let err = normalize(raw(&[&["1"]]), &desc).unwrap_err();
        assert!(matches!(
            err,
            LoadError::ShapeMismatch {
                expected: 2,
                actual: 1,
                ..
            }
        ));
    }

    #[test]
    fn test_empty_fields_become_null() {
        let desc = descriptor(&["id", "amount"], Transform::Identity);
        let batch = normalize(raw(&[&["1", ""]]), &desc).unwrap();
        assert!(batch.rows[0][1].is_null());
    }

    #[test]
    fn test_transform_errors_propagate() {
        let desc = descriptor(&["capital_social"], Transform::CapitalSocial);
        let err = normalize(raw(&[&["abc"]]), &desc).unwrap_err();
        assert!(matches!(err, LoadError::Transform { .. }));
    }

    #[test]
    fn test_row_count_is_preserved() {
        let desc = descriptor(&["id"], Transform::Identity);
        let batch = normalize(raw(&[&["1"], &["2"], &["3"]]), &desc).unwrap();
        assert_eq!(batch.len(), 3);
    }
}
