//! Batch data model shared by the reader, normalizer and writer

/// A fixed-size batch of raw rows read from one source file.
///
/// Every field is opaque text; type coercion is deferred to the table's
/// transform. Produced by the chunk reader and consumed (moved, never
/// mutated in place) by the normalizer.
#[derive(Debug, Clone, PartialEq)]
pub struct RawBatch {
    pub rows: Vec<Vec<String>>,
}

impl RawBatch {
    pub fn new(rows: Vec<Vec<String>>) -> Self {
        Self { rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// SQL type of one destination column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Text,
    Double,
}

impl ColumnType {
    /// Postgres type name used when the destination table is created
    pub fn sql_type(self) -> &'static str {
        match self {
            ColumnType::Text => "TEXT",
            ColumnType::Double => "DOUBLE PRECISION",
        }
    }
}

/// One destination column: canonical name plus its persisted type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    pub name: String,
    pub ty: ColumnType,
}

impl Column {
    pub fn text(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ty: ColumnType::Text,
        }
    }

    pub fn double(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ty: ColumnType::Double,
        }
    }
}

/// A single cell value after normalization
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Text(String),
    Double(f64),
}

impl Value {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_double(&self) -> Option<f64> {
        match self {
            Value::Double(f) => Some(*f),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

/// A batch with canonical column names and transformed values, ready to be
/// appended to the destination table. Same row count as the raw batch it
/// came from; written to storage and discarded.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedBatch {
    pub columns: Vec<Column>,
    pub rows: Vec<Vec<Value>>,
}

impl NormalizedBatch {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Index of a column by name
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }
}
