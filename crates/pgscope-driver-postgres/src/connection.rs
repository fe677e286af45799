//! PostgreSQL connection implementation

use crate::tls::build_tls_connector;
use crate::values::{PgValue, postgres_to_value};
use async_trait::async_trait;
use futures::TryStreamExt;
use pgscope_core::{
    Connection, ConnectionConfig, PgscopeError, QueryCancelHandle, QueryResult, Result, Row,
    SslMode, Value,
};
use std::sync::Arc;
use std::sync::OnceLock;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::Mutex;
use tokio_postgres::{CancelToken, Client, NoTls, types::ToSql};

/// Dedicated Tokio runtime for PostgreSQL I/O.
///
/// Connections and their background tasks live here, so a connection can be
/// driven from any executor, including a caller that owns no Tokio runtime.
fn get_postgres_runtime() -> &'static tokio::runtime::Runtime {
    static RUNTIME: OnceLock<tokio::runtime::Runtime> = OnceLock::new();
    RUNTIME.get_or_init(|| {
        tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .enable_all()
            .thread_name("pgscope-postgres-runtime")
            .build()
            .expect("Failed to create Tokio runtime for PostgreSQL driver")
    })
}

/// Cancel handle for PostgreSQL queries.
///
/// Wraps the tokio-postgres `CancelToken`; callable from any thread.
pub struct PostgresCancelHandle {
    cancel_token: CancelToken,
}

impl QueryCancelHandle for PostgresCancelHandle {
    fn cancel(&self) {
        tracing::debug!("sending cancel request to PostgreSQL server");
        let cancel_token = self.cancel_token.clone();
        get_postgres_runtime().spawn(async move {
            if let Err(e) = cancel_token.cancel_query(NoTls).await {
                tracing::warn!(error = %e, "failed to cancel PostgreSQL query");
            }
        });
    }
}

fn format_postgres_error(error: &tokio_postgres::Error) -> String {
    let Some(db_error) = error.as_db_error() else {
        return error.to_string();
    };

    let mut message = db_error.message().to_string();

    if let Some(detail) = db_error.detail().filter(|d| !d.trim().is_empty()) {
        message.push_str(&format!(" (detail: {})", detail));
    }
    if let Some(hint) = db_error.hint().filter(|h| !h.trim().is_empty()) {
        message.push_str(&format!(" (hint: {})", hint));
    }

    match db_error.code().code() {
        "42501" => format!("permission denied: {}", message),
        "42P01" => format!("undefined table: {}", message),
        "57014" => format!("query canceled: {}", message),
        code => format!("{} (code: {})", message, code),
    }
}

fn query_error(context: &str, error: &tokio_postgres::Error) -> PgscopeError {
    if error.is_closed() {
        return PgscopeError::Connection(format!("{}: connection closed", context));
    }
    PgscopeError::Query(format!("{}: {}", context, format_postgres_error(error)))
}

/// PostgreSQL connection wrapper
pub struct PostgresConnection {
    client: Arc<Mutex<Option<Client>>>,
    cancel_token: CancelToken,
    closed: AtomicBool,
}

impl PostgresConnection {
    /// Connect to a PostgreSQL database
    pub async fn connect(config: &ConnectionConfig) -> Result<Self> {
        let port = config.get_port();
        tracing::info!(
            host = %config.host,
            port = port,
            database = config.database.as_deref().unwrap_or(""),
            ssl_mode = %config.ssl_mode,
            "connecting to PostgreSQL database"
        );

        let mut pg_config = tokio_postgres::Config::new();
        pg_config.host(&config.host).port(port);

        if let Some(database) = &config.database {
            pg_config.dbname(database);
        }
        if let Some(user) = &config.username {
            pg_config.user(user);
        }
        if let Some(password) = &config.password {
            pg_config.password(password);
        }
        if let Some(application_name) = &config.application_name {
            pg_config.application_name(application_name);
        }
        if let Some(timeout) = config.get_string("connect_timeout") {
            let seconds = timeout.parse::<u64>().map_err(|_| {
                PgscopeError::Configuration(format!("invalid connect_timeout '{}'", timeout))
            })?;
            pg_config.connect_timeout(Duration::from_secs(seconds));
        }
        pg_config.ssl_mode(match config.ssl_mode {
            SslMode::Disable => tokio_postgres::config::SslMode::Disable,
            SslMode::Prefer => tokio_postgres::config::SslMode::Prefer,
            SslMode::Require => tokio_postgres::config::SslMode::Require,
        });

        let runtime = get_postgres_runtime();

        let client = if config.ssl_mode == SslMode::Disable {
            let (client, connection) = runtime
                .spawn(async move { pg_config.connect(NoTls).await })
                .await
                .map_err(|e| {
                    PgscopeError::Connection(format!("PostgreSQL connection task failed: {}", e))
                })?
                .map_err(|e| {
                    PgscopeError::Connection(format!("Failed to connect to PostgreSQL: {}", e))
                })?;
            runtime.spawn(async move {
                if let Err(e) = connection.await {
                    tracing::error!(error = %e, "PostgreSQL connection error");
                }
            });
            client
        } else {
            let tls = build_tls_connector(config)?;
            let (client, connection) = runtime
                .spawn(async move { pg_config.connect(tls).await })
                .await
                .map_err(|e| {
                    PgscopeError::Connection(format!("PostgreSQL connection task failed: {}", e))
                })?
                .map_err(|e| {
                    PgscopeError::Connection(format!("Failed to connect to PostgreSQL: {}", e))
                })?;
            runtime.spawn(async move {
                if let Err(e) = connection.await {
                    tracing::error!(error = %e, "PostgreSQL connection error");
                }
            });
            client
        };

        tracing::info!(host = %config.host, port = port, "PostgreSQL connection established");

        Ok(Self {
            cancel_token: client.cancel_token(),
            client: Arc::new(Mutex::new(Some(client))),
            closed: AtomicBool::new(false),
        })
    }
}

#[async_trait]
impl Connection for PostgresConnection {
    fn driver_name(&self) -> &str {
        "postgresql"
    }

    #[tracing::instrument(skip(self, sql, params), fields(sql_preview = %sql.chars().take(100).collect::<String>()))]
    async fn query(&self, sql: &str, params: &[Value]) -> Result<QueryResult> {
        let start_time = std::time::Instant::now();

        let guard = self.client.lock().await;
        let client = guard
            .as_ref()
            .ok_or_else(|| PgscopeError::Connection("connection is closed".into()))?;

        // Prepare first so we know the target type of each parameter
        let statement = client
            .prepare(sql)
            .await
            .map_err(|e| query_error("Failed to prepare query", &e))?;

        let param_types = statement.params();
        let pg_params: Vec<PgValue> = params
            .iter()
            .enumerate()
            .map(|(i, value)| {
                let target = param_types.get(i).unwrap_or(&tokio_postgres::types::Type::TEXT);
                PgValue::for_type(value, target)
            })
            .collect();
        let param_refs: Vec<&(dyn ToSql + Sync)> =
            pg_params.iter().map(|p| p as &(dyn ToSql + Sync)).collect();

        let pg_rows = client
            .query(&statement, &param_refs)
            .await
            .map_err(|e| query_error("Failed to execute query", &e))?;

        // Column names come from the statement so empty results still carry them
        let columns: Vec<String> = statement
            .columns()
            .iter()
            .map(|col| col.name().to_string())
            .collect();

        let mut rows = Vec::with_capacity(pg_rows.len());
        for pg_row in &pg_rows {
            let values = (0..columns.len())
                .map(|idx| postgres_to_value(pg_row, idx))
                .collect::<Result<Vec<_>>>()?;
            rows.push(Row::new(columns.clone(), values));
        }

        let execution_time_ms = start_time.elapsed().as_millis() as u64;
        tracing::debug!(
            row_count = rows.len(),
            execution_time_ms = execution_time_ms,
            "query executed successfully"
        );

        Ok(QueryResult {
            columns,
            rows,
            execution_time_ms,
        })
    }

    #[tracing::instrument(skip(self, sql), fields(sql_preview = %sql.chars().take(100).collect::<String>()))]
    async fn copy_out_text(&self, sql: &str) -> Result<String> {
        let guard = self.client.lock().await;
        let client = guard
            .as_ref()
            .ok_or_else(|| PgscopeError::Connection("connection is closed".into()))?;

        let stream = client
            .copy_out(sql)
            .await
            .map_err(|e| query_error("Failed to start COPY", &e))?;
        futures::pin_mut!(stream);

        let mut buffer = Vec::new();
        while let Some(chunk) = stream
            .try_next()
            .await
            .map_err(|e| query_error("Failed to read COPY data", &e))?
        {
            buffer.extend_from_slice(&chunk);
        }

        tracing::debug!(bytes = buffer.len(), "COPY finished");
        String::from_utf8(buffer)
            .map_err(|e| PgscopeError::Query(format!("COPY output is not valid UTF-8: {}", e)))
    }

    async fn close(&self) -> Result<()> {
        tracing::info!("closing PostgreSQL connection");
        // Dropping the client ends the background connection task
        self.client.lock().await.take();
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    fn cancel_handle(&self) -> Option<Arc<dyn QueryCancelHandle>> {
        Some(Arc::new(PostgresCancelHandle {
            cancel_token: self.cancel_token.clone(),
        }))
    }
}
