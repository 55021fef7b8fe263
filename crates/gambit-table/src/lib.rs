//! Authoritative two-seat turn tables.
//!
//! A table holds one game position, two seats and any number of
//! spectators. It runs as an isolated Tokio task (actor model): every
//! connect, move and reset goes through its command queue, so turn
//! enforcement needs no locks.
//!
//! The rules of the game live behind [`MoveOracle`]; the table only
//! arbitrates turns, applies verdicts and fans results out.
//!
//! # Key types
//!
//! - [`MoveOracle`]: the rules engine a table is parameterised by
//! - [`spawn_table`] / [`TableHandle`]: start a table and talk to it
//! - [`TableConfig`]: reset delay, solo-move policy, queue size
//! - [`Phase`]: whose turn it is, or game over
//! - [`submit_move`]: the turn arbiter, usable without an actor

mod actor;
mod arbiter;
mod config;
mod error;
pub mod fanout;
mod oracle;
mod table;

pub use actor::{spawn_table, TableHandle, TableInfo};
pub use arbiter::{submit_move, IgnoreReason, Ruling};
pub use config::{Phase, SoloMovePolicy, TableConfig};
pub use error::TableError;
pub use fanout::{ConnectionSender, TableOutbound};
pub use oracle::{Evaluation, MoveOracle, OracleError};
pub use table::{MoveRecord, Table};
