//! Secondary index creation, run once after all tables are loaded
//!
//! Every indexed table shares the `cnpj_basico` join column. An index that
//! already exists is expected and skipped; any other failure is recorded in
//! the report instead of being swallowed.

use sqlx::PgPool;
use tracing::{debug, info, warn};

/// Join column shared by all indexed tables
pub const JOIN_COLUMN: &str = "cnpj_basico";

/// (index name, table) pairs to create
pub const INDEX_TARGETS: &[(&str, &str)] = &[
    ("empresa_cnpj", "empresa"),
    ("estabelecimento_cnpj", "estabelecimento"),
    ("socios_cnpj", "socios"),
    ("simples_cnpj", "simples"),
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IndexStatus {
    Created,
    AlreadyExists,
    Failed(String),
}

#[derive(Debug, Clone)]
pub struct IndexOutcome {
    pub index: String,
    pub table: String,
    pub status: IndexStatus,
}

#[derive(Debug, Clone, Default)]
pub struct IndexReport {
    pub outcomes: Vec<IndexOutcome>,
}

impl IndexReport {
    pub fn has_failures(&self) -> bool {
        self.outcomes
            .iter()
            .any(|o| matches!(o.status, IndexStatus::Failed(_)))
    }

    pub fn failures(&self) -> impl Iterator<Item = &IndexOutcome> {
        self.outcomes
            .iter()
            .filter(|o| matches!(o.status, IndexStatus::Failed(_)))
    }
}

pub(crate) fn create_index_statement(index: &str, table: &str) -> String {
    format!(
        "CREATE INDEX \"{}\" ON \"{}\" (\"{}\")",
        index, table, JOIN_COLUMN
    )
}

/// SQLSTATE 42P07: relation (here, the index) already exists
fn is_duplicate(error: &sqlx::Error) -> bool {
    error
        .as_database_error()
        .and_then(|db| db.code())
        .map(|code| code == "42P07")
        .unwrap_or(false)
}

/// Create every target index on one scoped connection. Pre-existing
/// indices are skipped; other errors are recorded and surfaced.
pub async fn build_indices(pool: &PgPool) -> Result<IndexReport, sqlx::Error> {
    let mut conn = pool.acquire().await?;
    let mut report = IndexReport::default();

    for &(index, table) in INDEX_TARGETS {
        let status = match sqlx::query(&create_index_statement(index, table))
            .execute(&mut *conn)
            .await
        {
            Ok(_) => {
                info!(index, table, column = JOIN_COLUMN, "index created");
                IndexStatus::Created
            },
            Err(e) if is_duplicate(&e) => {
                debug!(index, table, "index already exists, skipping");
                IndexStatus::AlreadyExists
            },
            Err(e) => {
                warn!(index, table, error = %e, "index creation failed");
                IndexStatus::Failed(e.to_string())
            },
        };

        report.outcomes.push(IndexOutcome {
            index: index.to_string(),
            table: table.to_string(),
            status,
        });
    }

    Ok(report)
}
