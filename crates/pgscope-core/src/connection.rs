//! Connection trait

use crate::{PgscopeError, QueryResult, Result, Value};
use async_trait::async_trait;
use std::sync::Arc;

/// Handle for cancelling a running query from any thread.
///
/// A hung catalog query is interrupted here, at the connection layer, rather
/// than by timeouts inside the catalog engine.
pub trait QueryCancelHandle: Send + Sync {
    /// Cancel the currently running query on the associated connection.
    ///
    /// Idempotent. If no query is running, this is a no-op.
    fn cancel(&self);
}

/// An opened database connection.
///
/// Implementations must serve one statement at a time: callers never overlap
/// queries on the same connection, and a driver may rely on that.
#[async_trait]
pub trait Connection: Send + Sync {
    /// Get the driver name (e.g., "postgresql")
    fn driver_name(&self) -> &str;

    /// Execute a query that returns rows, binding `params` positionally.
    async fn query(&self, sql: &str, params: &[Value]) -> Result<QueryResult>;

    /// Run a `COPY ... TO STDOUT` statement and return the text it produced.
    async fn copy_out_text(&self, sql: &str) -> Result<String> {
        let _ = sql;
        Err(PgscopeError::NotSupported(format!(
            "COPY TO STDOUT is not supported by the {} driver",
            self.driver_name()
        )))
    }

    /// Close the connection
    async fn close(&self) -> Result<()>;

    /// Check if the connection is closed
    fn is_closed(&self) -> bool;

    /// Get a handle that can be used to cancel running queries.
    ///
    /// Returns `None` if the driver doesn't support query cancellation.
    fn cancel_handle(&self) -> Option<Arc<dyn QueryCancelHandle>> {
        None
    }
}
