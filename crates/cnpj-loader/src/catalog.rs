//! Table catalog: one descriptor per destination table
//!
//! The catalog is built once at startup and handed to the database loader;
//! it is read-only for the rest of the run. Column layouts follow the
//! Receita Federal CNPJ dump layout: semicolon-delimited, no header,
//! Latin-1 encoded.

use crate::error::{LoadError, Result};
use crate::model::{ColumnType, NormalizedBatch, Value};
use encoding_rs::Encoding;

/// Table-specific batch transform, applied after column renaming.
///
/// Each variant is a pure batch-to-batch mapping; the destination table's
/// actual schema is whatever the transform's output implies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transform {
    /// Pass the batch through unchanged (all columns stay text)
    Identity,
    /// `empresa` only: `capital_social` carries a decimal comma in the
    /// source; rewrite it with a dot and cast the column to double
    CapitalSocial,
}

impl Transform {
    /// Apply the transform to a renamed batch
    pub fn apply(&self, table: &str, batch: NormalizedBatch) -> Result<NormalizedBatch> {
        match self {
            Transform::Identity => Ok(batch),
            Transform::CapitalSocial => cast_decimal_comma(table, batch, "capital_social"),
        }
    }
}

/// Rewrite one text column's decimal comma and cast it to double.
/// Null cells stay null; anything unparseable is a transform error.
fn cast_decimal_comma(
    table: &str,
    mut batch: NormalizedBatch,
    column: &str,
) -> Result<NormalizedBatch> {
    let idx = batch
        .column_index(column)
        .ok_or_else(|| LoadError::transform(table, column, "column not present in batch"))?;

    batch.columns[idx].ty = ColumnType::Double;

    for row in &mut batch.rows {
        let cell = &mut row[idx];
        *cell = match cell {
            Value::Null => Value::Null,
            Value::Text(s) => {
                let normalized = s.replace(',', ".");
                let parsed: f64 = normalized.parse().map_err(|_| {
                    LoadError::transform(table, column, format!("not a number: {:?}", s))
                })?;
                Value::Double(parsed)
            },
            Value::Double(f) => Value::Double(*f),
        };
    }

    Ok(batch)
}

/// Static metadata for one destination table
#[derive(Debug, Clone)]
pub struct TableDescriptor {
    /// Human-readable dataset name, used in logs and progress labels
    pub label: &'static str,
    /// Destination relation name, unique within the catalog
    pub table_name: &'static str,
    /// Canonical column names, in source order
    pub columns: &'static [&'static str],
    /// Text encoding of the source files
    pub encoding: &'static Encoding,
    /// Batch transform applied before writing
    pub transform: Transform,
}

/// The full, ordered set of destination tables for one run
#[derive(Debug, Clone)]
pub struct Catalog {
    tables: Vec<TableDescriptor>,
}

impl Catalog {
    pub fn new(tables: Vec<TableDescriptor>) -> Self {
        Self { tables }
    }

    /// Descriptors in declared (deterministic) order
    pub fn tables(&self) -> &[TableDescriptor] {
        &self.tables
    }

    /// Look up a descriptor by destination table name
    pub fn get(&self, table_name: &str) -> Option<&TableDescriptor> {
        self.tables.iter().find(|t| t.table_name == table_name)
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// The standard Receita Federal CNPJ catalog
    pub fn rfb() -> Self {
        use encoding_rs::WINDOWS_1252;

        Self::new(vec![
            TableDescriptor {
                label: "empresa",
                table_name: "empresa",
                columns: &[
                    "cnpj_basico",
                    "razao_social",
                    "natureza_juridica",
                    "qualificacao_responsavel",
                    "capital_social",
                    "porte_empresa",
                    "ente_federativo_responsavel",
                ],
                encoding: WINDOWS_1252,
                transform: Transform::CapitalSocial,
            },
            TableDescriptor {
                label: "estabelecimento",
                table_name: "estabelecimento",
                columns: &[
                    "cnpj_basico",
                    "cnpj_ordem",
                    "cnpj_dv",
                    "identificador_matriz_filial",
                    "nome_fantasia",
                    "situacao_cadastral",
                    "data_situacao_cadastral",
                    "motivo_situacao_cadastral",
                    "nome_cidade_exterior",
                    "pais",
                    "data_inicio_atividade",
                    "cnae_fiscal_principal",
                    "cnae_fiscal_secundaria",
                    "tipo_logradouro",
                    "logradouro",
                    "numero",
                    "complemento",
                    "bairro",
                    "cep",
                    "uf",
                    "municipio",
                    "ddd_1",
                    "telefone_1",
                    "ddd_2",
                    "telefone_2",
                    "ddd_fax",
                    "fax",
                    "correio_eletronico",
                    "situacao_especial",
                    "data_situacao_especial",
                ],
                encoding: WINDOWS_1252,
                transform: Transform::Identity,
            },
            TableDescriptor {
                label: "socios",
                table_name: "socios",
                columns: &[
                    "cnpj_basico",
                    "identificador_socio",
                    "nome_socio_razao_social",
                    "cpf_cnpj_socio",
                    "qualificacao_socio",
                    "data_entrada_sociedade",
                    "pais",
                    "representante_legal",
                    "nome_do_representante",
                    "qualificacao_representante_legal",
                    "faixa_etaria",
                ],
                encoding: WINDOWS_1252,
                transform: Transform::Identity,
            },
            TableDescriptor {
                label: "simples",
                table_name: "simples",
                columns: &[
                    "cnpj_basico",
                    "opcao_pelo_simples",
                    "data_opcao_simples",
                    "data_exclusao_simples",
                    "opcao_mei",
                    "data_opcao_mei",
                    "data_exclusao_mei",
                ],
                encoding: WINDOWS_1252,
                transform: Transform::Identity,
            },
            TableDescriptor {
                label: "cnae",
                table_name: "cnae",
                columns: &["codigo", "descricao"],
                encoding: WINDOWS_1252,
                transform: Transform::Identity,
            },
            TableDescriptor {
                label: "motivo da situação cadastral",
                table_name: "moti",
                columns: &["codigo", "descricao"],
                encoding: WINDOWS_1252,
                transform: Transform::Identity,
            },
            TableDescriptor {
                label: "município",
                table_name: "munic",
                columns: &["codigo", "descricao"],
                encoding: WINDOWS_1252,
                transform: Transform::Identity,
            },
            TableDescriptor {
                label: "natureza jurídica",
                table_name: "natju",
                columns: &["codigo", "descricao"],
                encoding: WINDOWS_1252,
                transform: Transform::Identity,
            },
            TableDescriptor {
                label: "país",
                table_name: "pais",
                columns: &["codigo", "descricao"],
                encoding: WINDOWS_1252,
                transform: Transform::Identity,
            },
            TableDescriptor {
                label: "qualificação de sócios",
                table_name: "quals",
                columns: &["codigo", "descricao"],
                encoding: WINDOWS_1252,
                transform: Transform::Identity,
            },
        ])
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::model::Column;

    fn batch(columns: Vec<Column>, rows: Vec<Vec<Value>>) -> NormalizedBatch {
        NormalizedBatch { columns, rows }
    }

    #[test]
    fn test_rfb_catalog_order_is_stable() {
        let names: Vec<&str> = Catalog::rfb()
            .tables()
            .iter()
            .map(|t| t.table_name)
            .collect();
        assert_eq!(
            names,
            vec![
                "empresa",
                "estabelecimento",
                "socios",
                "simples",
                "cnae",
                "moti",
                "munic",
                "natju",
                "pais",
                "quals"
            ]
        );
    }

    #[test]
    fn test_rfb_table_names_unique() {
        let catalog = Catalog::rfb();
        let mut names: Vec<&str> = catalog.tables().iter().map(|t| t.table_name).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), catalog.len());
    }

    #[test]
    fn test_catalog_lookup() {
        let catalog = Catalog::rfb();
        assert_eq!(catalog.get("empresa").unwrap().columns.len(), 7);
        assert_eq!(catalog.get("estabelecimento").unwrap().columns.len(), 30);
        assert!(catalog.get("nope").is_none());
    }

    #[test]
    fn test_identity_transform_is_noop() {
        let input = batch(
            vec![Column::text("codigo"), Column::text("descricao")],
            vec![vec![
                Value::Text("1".to_string()),
                Value::Text("abc".to_string()),
            ]],
        );
        let output = Transform::Identity.apply("cnae", input.clone()).unwrap();
        assert_eq!(output, input);
    }

    #[test]
    fn test_capital_social_transform() {
        let input = batch(
            vec![Column::text("cnpj_basico"), Column::text("capital_social")],
            vec![
                vec![
                    Value::Text("123".to_string()),
                    Value::Text("1000,50".to_string()),
                ],
                vec![Value::Text("456".to_string()), Value::Null],
            ],
        );
        let output = Transform::CapitalSocial.apply("empresa", input).unwrap();

        assert_eq!(output.columns[1].ty, ColumnType::Double);
        assert_eq!(output.rows[0][1], Value::Double(1000.50));
        assert_eq!(output.rows[1][1], Value::Null);
        // untouched column keeps its text value
        assert_eq!(output.rows[0][0], Value::Text("123".to_string()));
    }

    #[test]
    fn test_capital_social_rejects_garbage() {
        let input = batch(
            vec![Column::text("capital_social")],
            vec![vec![Value::Text("not-a-number".to_string())]],
        );
        let err = Transform::CapitalSocial.apply("empresa", input).unwrap_err();
        assert!(matches!(err, LoadError::Transform { .. }));
    }
}
