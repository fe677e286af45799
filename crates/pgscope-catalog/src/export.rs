//! Whole-object data export.

use crate::ObjectRef;
use crate::queries;
use pgscope_core::{Connection, Result};

/// Every row of `object` as a pretty-printed JSON array. An empty object
/// yields `[]`.
#[tracing::instrument(skip(conn, object), fields(object = %object))]
pub async fn select_all_as_json(conn: &dyn Connection, object: &ObjectRef) -> Result<String> {
    let result = conn
        .query(&queries::select_all_as_json(&object.qualified_name()), &[])
        .await?;

    let json = result
        .scalar()
        .and_then(|value| value.as_str())
        .unwrap_or("[]")
        .to_string();
    tracing::debug!(bytes = json.len(), "JSON export finished");
    Ok(json)
}

/// Every row of `object` as CSV with a header line, streamed through
/// `COPY ... TO STDOUT`.
#[tracing::instrument(skip(conn, object), fields(object = %object))]
pub async fn select_all_as_csv(conn: &dyn Connection, object: &ObjectRef) -> Result<String> {
    conn.copy_out_text(&queries::copy_all_as_csv(&object.qualified_name()))
        .await
}
