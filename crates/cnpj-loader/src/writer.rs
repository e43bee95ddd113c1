//! Bulk writes to the destination tables
//!
//! Each chunk is appended inside its own transaction: it commits or fails
//! as a unit, and a failing chunk never disturbs rows committed by earlier
//! chunks of the same file.

use crate::error::Result;
use crate::model::{Column, ColumnType, NormalizedBatch};
use sqlx::{PgPool, Postgres, QueryBuilder};
use tracing::debug;

/// Postgres caps bind parameters per statement at 65535; inserts are split
/// so `rows_per_statement * columns` stays under it.
pub const PG_BIND_LIMIT: usize = 65_535;

/// How many rows fit into one INSERT statement for a given column count
pub(crate) fn rows_per_statement(column_count: usize) -> usize {
    (PG_BIND_LIMIT / column_count.max(1)).max(1)
}

/// Quote an identifier for interpolation into DDL/DML text
fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// `INSERT INTO "t" ("a", "b") ` prefix for a batch's column set
pub(crate) fn insert_prefix(table: &str, columns: &[Column]) -> String {
    let cols: Vec<String> = columns.iter().map(|c| quote_ident(&c.name)).collect();
    format!("INSERT INTO {} ({}) ", quote_ident(table), cols.join(", "))
}

/// `CREATE TABLE IF NOT EXISTS` statement for a batch's column set
pub(crate) fn create_table_statement(table: &str, columns: &[Column]) -> String {
    let cols: Vec<String> = columns
        .iter()
        .map(|c| format!("{} {}", quote_ident(&c.name), c.ty.sql_type()))
        .collect();
    format!(
        "CREATE TABLE IF NOT EXISTS {} ({})",
        quote_ident(table),
        cols.join(", ")
    )
}

/// Destination-table operations the loaders drive.
///
/// `BulkWriter` implements this against Postgres; tests substitute an
/// in-memory sink to exercise loader behavior without a database.
#[allow(async_fn_in_trait)]
pub trait TableSink {
    /// Drop the destination table if it exists. Absence is not an error.
    async fn drop_table(&self, table: &str) -> Result<()>;

    /// Create the destination table for the given schema if it does not
    /// exist yet.
    async fn ensure_table(&self, table: &str, columns: &[Column]) -> Result<()>;

    /// Append one normalized batch as a unit. Returns the number of rows
    /// written.
    async fn append_chunk(&self, table: &str, batch: &NormalizedBatch) -> Result<u64>;
}

/// Writer over the shared pool
pub struct BulkWriter {
    pool: PgPool,
}

impl BulkWriter {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Drop the destination table if it exists. Absence is not an error.
    pub async fn drop_table(&self, table: &str) -> Result<()> {
        sqlx::query(&format!("DROP TABLE IF EXISTS {}", quote_ident(table)))
            .execute(&self.pool)
            .await?;
        debug!(table, "dropped destination table");
        Ok(())
    }

    /// Create the destination table from the transform's output schema.
    /// Idempotent, so later files of the same table append instead.
    pub async fn ensure_table(&self, table: &str, columns: &[Column]) -> Result<()> {
        sqlx::query(&create_table_statement(table, columns))
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Append one normalized batch in a single transaction. Returns the
    /// number of rows written.
    pub async fn append_chunk(&self, table: &str, batch: &NormalizedBatch) -> Result<u64> {
        if batch.is_empty() {
            return Ok(0);
        }

        let mut tx = self.pool.begin().await?;
        let prefix = insert_prefix(table, &batch.columns);

        for rows in batch.rows.chunks(rows_per_statement(batch.columns.len())) {
            let mut query_builder: QueryBuilder<Postgres> = QueryBuilder::new(&prefix);

            query_builder.push_values(rows.iter(), |mut b, row| {
                for (value, column) in row.iter().zip(batch.columns.iter()) {
                    match column.ty {
                        ColumnType::Text => {
                            b.push_bind(value.as_text().map(str::to_owned));
                        },
                        ColumnType::Double => {
                            b.push_bind(value.as_double());
                        },
                    }
                }
            });

            query_builder.build().execute(&mut *tx).await?;
        }

        tx.commit().await?;
        Ok(batch.len() as u64)
    }
}

impl TableSink for BulkWriter {
    async fn drop_table(&self, table: &str) -> Result<()> {
        BulkWriter::drop_table(self, table).await
    }

    async fn ensure_table(&self, table: &str, columns: &[Column]) -> Result<()> {
        BulkWriter::ensure_table(self, table, columns).await
    }

    async fn append_chunk(&self, table: &str, batch: &NormalizedBatch) -> Result<u64> {
        BulkWriter::append_chunk(self, table, batch).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::model::Column;

    #[test]
    fn test_rows_per_statement_respects_bind_limit() {
        assert_eq!(rows_per_statement(1), PG_BIND_LIMIT);
        assert_eq!(rows_per_statement(7), PG_BIND_LIMIT / 7);
        assert!(rows_per_statement(30) * 30 <= PG_BIND_LIMIT);
        // degenerate widths still make progress
        assert_eq!(rows_per_statement(0), PG_BIND_LIMIT);
        assert_eq!(rows_per_statement(PG_BIND_LIMIT * 2), 1);
    }

    #[test]
    fn test_insert_prefix() {
        let columns = vec![Column::text("id"), Column::double("amount")];
        assert_eq!(
            insert_prefix("orders", &columns),
            "INSERT INTO \"orders\" (\"id\", \"amount\") "
        );
    }

    #[test]
    fn test_create_table_statement() {
        let columns = vec![Column::text("cnpj_basico"), Column::double("capital_social")];
        assert_eq!(
            create_table_statement("empresa", &columns),
            "CREATE TABLE IF NOT EXISTS \"empresa\" \
             (\"cnpj_basico\" TEXT, \"capital_social\" DOUBLE PRECISION)"
        );
    }

    #[test]
    fn test_quote_ident_escapes_quotes() {
        assert_eq!(quote_ident("a\"b"), "\"a\"\"b\"");
    }
}
