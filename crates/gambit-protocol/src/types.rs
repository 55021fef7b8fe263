//! Core protocol types for Gambit's wire format.
//!
//! Everything in this module travels "on the wire": it is serialized by a
//! [`Codec`](crate::Codec), pushed through a connection, and decoded on the
//! other side. The game-specific parts (position, move, annotation) are
//! generic parameters so that this crate stays ignorant of the rules being
//! played; the table layer fills them in from its move oracle.

use std::fmt;

use gambit_transport::ConnectionId;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Seats and roles
// ---------------------------------------------------------------------------

/// One of the two move-making roles at a table.
///
/// `First` moves first in a fresh game (white in chess). The turn indicator
/// of every position names exactly one of these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Seat {
    First,
    Second,
}

impl Seat {
    /// Both seats, in binding order.
    pub const ALL: [Seat; 2] = [Seat::First, Seat::Second];

    /// Returns the opposing seat.
    pub fn other(self) -> Self {
        match self {
            Self::First => Self::Second,
            Self::Second => Self::First,
        }
    }

    /// Slot index (0 or 1), used by fixed-size seat tables.
    pub fn index(self) -> usize {
        match self {
            Self::First => 0,
            Self::Second => 1,
        }
    }
}

impl fmt::Display for Seat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::First => write!(f, "first-mover"),
            Self::Second => write!(f, "second-mover"),
        }
    }
}

/// What a connection is allowed to do at the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    /// Bound to a seat; may move when that seat is on turn.
    Seated(Seat),
    /// Observes only. Never moves.
    Spectator,
}

impl Role {
    /// Returns the bound seat, if any.
    pub fn seat(self) -> Option<Seat> {
        match self {
            Self::Seated(seat) => Some(seat),
            Self::Spectator => None,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Seated(seat) => write!(f, "{seat}"),
            Self::Spectator => write!(f, "spectator"),
        }
    }
}

/// The category of sound a client should play for an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SoundCue {
    /// A quiet (non-capturing) move.
    Move,
    /// A move that captured a piece.
    Capture,
    /// The game just ended.
    GameOver,
}

// ---------------------------------------------------------------------------
// Recipient: who should receive an outbound message?
// ---------------------------------------------------------------------------

/// Addressing for one outbound message produced by the table.
///
/// The table builds a list of `(Recipient, Outbound)` pairs and the
/// dispatcher resolves each recipient against the live connections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Recipient {
    /// Every connection at the table, seated or spectating.
    All,
    /// One specific connection.
    Connection(ConnectionId),
    /// Everyone except the given connection.
    AllExcept(ConnectionId),
}

impl Recipient {
    /// Returns `true` if a message addressed this way reaches `conn`.
    pub fn includes(&self, conn: ConnectionId) -> bool {
        match self {
            Self::All => true,
            Self::Connection(target) => *target == conn,
            Self::AllExcept(excluded) => *excluded != conn,
        }
    }
}

// ---------------------------------------------------------------------------
// Inbound: client → server
// ---------------------------------------------------------------------------

/// Messages a client may send.
///
/// `#[serde(tag = "type")]` produces internally tagged JSON, e.g.
/// `{ "type": "SubmitMove", "mv": { "from": "e2", "to": "e4" } }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Inbound<M> {
    /// "I want to play this move." Only honored from the seat on turn.
    SubmitMove { mv: M },

    /// "My lobby countdown finished." Starts a fresh game when the
    /// second seat has just been filled.
    Ready,

    /// "I'm still here." Answered with [`Outbound::HeartbeatAck`].
    Heartbeat { client_time: u64 },

    /// "I'm leaving." The server closes the connection.
    Leave { reason: String },
}

// ---------------------------------------------------------------------------
// Outbound: server → client
// ---------------------------------------------------------------------------

/// Messages the server pushes to clients.
///
/// `P` is the position snapshot, `M` the move descriptor, `A` the oracle's
/// per-move annotation (for chess: SAN plus capture/check flags).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Outbound<P, M, A> {
    /// Sent once, to the new connection only, right after it joins.
    RoleAssigned { role: Role },

    /// Number of bound seats (0, 1 or 2). Broadcast on every change.
    Occupancy { seated: usize },

    /// Authoritative position. Any client may resynchronize from it.
    Position { position: P },

    /// The raw move just played, for everyone except its author.
    MoveMade { mv: M },

    /// Move-list line. `number` is the 1-based ply within the current
    /// game, so re-delivery can be detected client-side.
    MoveListEntry {
        number: u32,
        seat: Seat,
        mv: M,
        annotation: A,
    },

    /// Which sound to play.
    Sound { cue: SoundCue },

    /// The submitted move was refused. Only the author receives this.
    MoveRejected { mv: M, reason: String },

    /// The game ended; a reset position follows after a short delay.
    GameOver,

    /// Reply to [`Inbound::Heartbeat`].
    HeartbeatAck { client_time: u64, server_time: u64 },

    /// Protocol-level problem with something the client sent.
    /// `code` follows HTTP-style conventions (400 = bad request).
    Error { code: u16, message: String },
}

// ---------------------------------------------------------------------------
// Envelope: the top-level wire format
// ---------------------------------------------------------------------------

/// The top-level frame. Every message on the wire is an `Envelope`.
///
/// ```text
/// ┌─────────────────────────────────┐
/// │ seq: 42                         │  ← per-direction ordering
/// │ timestamp: 15000                │  ← ms since the sender started
/// │ ┌─────────────────────────────┐ │
/// │ │ payload: Inbound / Outbound │ │
/// │ └─────────────────────────────┘ │
/// └─────────────────────────────────┘
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope<T> {
    /// Auto-incrementing sequence number. Each side keeps its own counter.
    #[serde(default)]
    pub seq: u64,

    /// Milliseconds since the sender started. Clients may send 0.
    #[serde(default)]
    pub timestamp: u64,

    /// The message itself.
    pub payload: T,
}

// =========================================================================
// Tests
// =========================================================================
