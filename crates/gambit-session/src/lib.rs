//! Seat arbitration for Gambit tables.
//!
//! A table has exactly two seats. This crate decides which connection sits
//! where ([`SeatRegistry`]) and keeps the occupancy honest as clients come
//! and go.
//!
//! # How it fits in the stack
//!
//! ```text
//! Table Layer (above)    ← asks "may this connection move right now?"
//!     ↕
//! Session Layer (this)   ← seat slots, spectators, occupancy
//!     ↕
//! Protocol Layer (below) ← provides Seat, Role; transport gives ConnectionId
//! ```

mod registry;

pub use registry::SeatRegistry;
