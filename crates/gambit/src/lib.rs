//! # Gambit
//!
//! Real-time, server-authoritative two-seat turn tables over WebSockets.
//!
//! One server hosts one table. The first two clients take the seats, later
//! ones watch. Moves are judged by a pluggable [`MoveOracle`] and every
//! accepted move is fanned out to all connections in a fixed order, ending
//! with the authoritative position.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use gambit::prelude::*;
//! # use gambit_chess::ChessRules;
//!
//! # async fn start() -> Result<(), GambitError> {
//! let server = GambitServerBuilder::new()
//!     .bind("0.0.0.0:8080")
//!     .build::<ChessRules>()
//!     .await?;
//! server.run().await
//! # }
//! ```
//!
//! [`MoveOracle`]: gambit_table::MoveOracle

mod error;
mod handler;
mod server;

pub use error::GambitError;
pub use server::{GambitServer, GambitServerBuilder, ServerConfig};

/// Everything needed to host a table.
pub mod prelude {
    pub use crate::{GambitError, GambitServer, GambitServerBuilder, ServerConfig};
    pub use gambit_protocol::{Codec, Envelope, Inbound, JsonCodec, Outbound, Role, Seat, SoundCue};
    pub use gambit_table::{
        Evaluation, MoveOracle, OracleError, Phase, SoloMovePolicy, TableConfig, TableHandle,
        TableInfo,
    };
    pub use gambit_transport::ConnectionId;
}
