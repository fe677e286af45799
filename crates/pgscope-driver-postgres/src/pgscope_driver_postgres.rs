//! PostgreSQL driver implementation

mod connection;
mod tls;
mod values;

pub use connection::{PostgresCancelHandle, PostgresConnection};
pub use tls::{TlsError, build_tls_connector};
