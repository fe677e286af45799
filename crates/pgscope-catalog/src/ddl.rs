//! `CREATE TABLE` reconstruction.
//!
//! The catalog aggregates the column, constraint and index fragments in one
//! query; [`DdlFragments::render`] lays them out as a single script.

use crate::queries;
use pgscope_core::{Connection, Result, Value};

/// Pieces of a `CREATE TABLE` script, each already in catalog order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DdlFragments {
    /// Quoted, schema-qualified table name
    pub table: String,
    /// One indented line per column, joined with `,\n`
    pub column_definitions: String,
    /// One indented `CONSTRAINT <name> ...` line per constraint, joined with `,\n`
    pub table_constraints: String,
    /// One `CREATE INDEX ...;` per index not backing a constraint, joined with `\n`
    pub trailing_index_statements: String,
}

impl DdlFragments {
    /// Assemble the script:
    ///
    /// ```text
    /// CREATE TABLE "schema"."table" (
    /// <columns>[,
    /// <constraints>]
    /// );
    /// <indexes>
    /// ```
    pub fn render(&self) -> String {
        let mut ddl = format!("CREATE TABLE {} (\n", self.table);
        ddl.push_str(&self.column_definitions);
        if !self.table_constraints.is_empty() {
            if !self.column_definitions.is_empty() {
                ddl.push_str(",\n");
            }
            ddl.push_str(&self.table_constraints);
        }
        ddl.push_str("\n);\n");
        ddl.push_str(&self.trailing_index_statements);
        ddl
    }
}

/// Generates `CREATE TABLE` scripts for ordinary tables.
pub struct DdlGenerator<'a> {
    conn: &'a dyn Connection,
}

impl<'a> DdlGenerator<'a> {
    pub fn new(conn: &'a dyn Connection) -> Self {
        Self { conn }
    }

    /// The `CREATE TABLE` script for `schema.table`.
    ///
    /// Best effort: returns `None` when the table is not an ordinary table or
    /// when any catalog query fails. The failure is logged, not returned.
    #[tracing::instrument(skip(self))]
    pub async fn generate(&self, schema: &str, table: &str) -> Option<String> {
        match self.fetch_fragments(schema, table).await {
            Ok(Some(fragments)) => Some(fragments.render()),
            Ok(None) => {
                tracing::debug!("no ordinary table found");
                None
            }
            Err(e) => {
                tracing::warn!(error = %e, "CREATE TABLE generation failed");
                None
            }
        }
    }

    /// Run the aggregate catalog query and return its fragments, or `None`
    /// when the relation is missing or not an ordinary table.
    pub async fn fetch_fragments(&self, schema: &str, table: &str) -> Result<Option<DdlFragments>> {
        let result = self
            .conn
            .query(
                queries::CREATE_TABLE_FRAGMENTS,
                &[Value::from(schema), Value::from(table)],
            )
            .await?;

        let Some(row) = result.rows.first() else {
            return Ok(None);
        };

        let fragment = |column: &str| row.text(column).unwrap_or_default().to_string();
        Ok(Some(DdlFragments {
            table: fragment("table_name"),
            column_definitions: fragment("column_definitions"),
            table_constraints: fragment("table_constraints"),
            trailing_index_statements: fragment("index_statements"),
        }))
    }
}
