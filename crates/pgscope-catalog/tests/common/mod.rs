//! Common test utilities and mocks

#![allow(dead_code)]

use async_trait::async_trait;
use pgscope_core::{Connection, PgscopeError, QueryResult, Result, Value};
use std::sync::Arc;

/// Mock connection for testing catalog logic without a real database.
///
/// Responses are chosen by SQL pattern: the first registered pattern
/// contained in the query text wins, otherwise the query returns no rows.
pub struct MockConnection {
    /// SQL-pattern-based responses
    pub query_responses: Vec<(String, QueryResult)>,
    /// Queries containing one of these patterns fail with a query error
    pub failing_patterns: Vec<String>,
    /// Text returned by `copy_out_text`
    pub copy_output: Option<String>,
    /// Log of all SQL executed with its bound parameters
    pub query_log: Arc<parking_lot::Mutex<Vec<(String, Vec<Value>)>>>,
}

impl MockConnection {
    pub fn new() -> Self {
        Self {
            query_responses: vec![],
            failing_patterns: vec![],
            copy_output: None,
            query_log: Arc::new(parking_lot::Mutex::new(Vec::new())),
        }
    }

    /// Register a response for queries containing the given SQL pattern.
    pub fn with_query_response(
        mut self,
        sql_contains: impl Into<String>,
        result: QueryResult,
    ) -> Self {
        self.query_responses.push((sql_contains.into(), result));
        self
    }

    /// Make every query containing `sql_contains` fail.
    pub fn with_failure_on(mut self, sql_contains: impl Into<String>) -> Self {
        self.failing_patterns.push(sql_contains.into());
        self
    }

    pub fn with_copy_output(mut self, output: impl Into<String>) -> Self {
        self.copy_output = Some(output.into());
        self
    }

    pub fn query_count(&self) -> usize {
        self.query_log.lock().len()
    }

    pub fn query_log(&self) -> Vec<(String, Vec<Value>)> {
        self.query_log.lock().clone()
    }
}

#[async_trait]
impl Connection for MockConnection {
    fn driver_name(&self) -> &str {
        "mock"
    }

    async fn query(&self, sql: &str, params: &[Value]) -> Result<QueryResult> {
        self.query_log.lock().push((sql.to_string(), params.to_vec()));

        if self.failing_patterns.iter().any(|p| sql.contains(p.as_str())) {
            return Err(PgscopeError::Query("permission denied for table pg_class".into()));
        }

        for (pattern, result) in &self.query_responses {
            if sql.contains(pattern.as_str()) {
                return Ok(result.clone());
            }
        }
        Ok(QueryResult::empty())
    }

    async fn copy_out_text(&self, sql: &str) -> Result<String> {
        self.query_log.lock().push((sql.to_string(), Vec::new()));

        if self.failing_patterns.iter().any(|p| sql.contains(p.as_str())) {
            return Err(PgscopeError::Query("COPY failed".into()));
        }
        Ok(self.copy_output.clone().unwrap_or_default())
    }

    async fn close(&self) -> Result<()> {
        Ok(())
    }

    fn is_closed(&self) -> bool {
        false
    }
}

/// Patterns that identify each catalog query.
pub mod patterns {
    pub const PRIMARY_KEYS: &str = "contype = 'p'";
    pub const FOREIGN_KEYS: &str = "contype = 'f'";
    pub const INDEXES: &str = "pg_catalog.pg_indexes";
    pub const COLUMNS: &str = "NOT attr.attnotnull AS is_nullable";
    pub const FUNCTION_ARGUMENTS: &str = "pg_get_function_arguments";
    pub const CREATE_TABLE: &str = "WITH tbl AS";
}

pub fn constraint_rows(rows: &[(&str, &str)]) -> QueryResult {
    QueryResult::from_values(
        &["constraint_name", "constraint_definition"],
        rows.iter()
            .map(|(name, def)| vec![Value::from(*name), Value::from(*def)]),
    )
}

pub fn index_rows(rows: &[(&str, &str)]) -> QueryResult {
    QueryResult::from_values(
        &["indexname", "indexdef"],
        rows.iter()
            .map(|(name, def)| vec![Value::from(*name), Value::from(*def)]),
    )
}

/// `(name, format_type output, default, nullable)`
pub fn column_rows(rows: &[(&str, &str, Option<&str>, bool)]) -> QueryResult {
    QueryResult::from_values(
        &["column_name", "data_type", "column_default", "is_nullable"],
        rows.iter().map(|(name, ty, default, nullable)| {
            vec![
                Value::from(*name),
                Value::from(*ty),
                Value::from(*default),
                Value::Bool(*nullable),
            ]
        }),
    )
}

/// `public.orders`: `id int not null`, `total numeric`, primary key on `id`.
pub fn orders_connection() -> MockConnection {
    MockConnection::new()
        .with_query_response(
            patterns::PRIMARY_KEYS,
            constraint_rows(&[("orders_pkey", "PRIMARY KEY (id)")]),
        )
        .with_query_response(
            patterns::COLUMNS,
            column_rows(&[
                ("id", "integer", None, false),
                ("total", "numeric", None, true),
            ]),
        )
}
