//! Error types for the table layer.

use gambit_transport::ConnectionId;

/// Errors returned by [`TableHandle`](crate::TableHandle) operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TableError {
    /// The connection is already registered with this table.
    #[error("connection {0} is already at the table")]
    AlreadyConnected(ConnectionId),

    /// The connection is not registered with this table.
    #[error("connection {0} is not at the table")]
    NotConnected(ConnectionId),

    /// The table actor has stopped and its command channel is closed.
    #[error("table is unavailable")]
    Unavailable,
}
