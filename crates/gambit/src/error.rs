//! Unified error type for the Gambit server.

use gambit_protocol::ProtocolError;
use gambit_table::TableError;
use gambit_transport::TransportError;

/// Top-level error that wraps the crate-specific errors.
///
/// `#[from]` on each variant lets `?` lift sub-crate errors into this one.
/// Move refusals never show up here: the table reports them to the
/// submitting client as `MoveRejected`.
#[derive(Debug, thiserror::Error)]
pub enum GambitError {
    /// Connection, send or receive failure.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A frame could not be encoded or decoded.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// The table rejected a lifecycle request or has stopped.
    #[error(transparent)]
    Table(#[from] TableError),

    /// The server address could not be resolved or inspected.
    #[error("server address: {0}")]
    Address(#[from] std::io::Error),
}
