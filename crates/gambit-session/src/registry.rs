//! The seat registry: who sits where at one table.
//!
//! This is the Session Registry of the table: two seat slots plus the set of
//! spectators. It is pure in-memory state with no I/O and no locking; the
//! table actor that owns it serializes every call.
//!
//! # Invariants
//!
//! - At most one connection is bound to each seat.
//! - A connection is bound to at most one seat, and a seated connection is
//!   never simultaneously recorded as a spectator.
//! - The occupancy is *derived* from the slots on every read, so it always
//!   equals the number of non-empty seats.

use std::collections::HashSet;

use gambit_protocol::{Role, Seat};
use gambit_transport::ConnectionId;

/// Tracks seat bindings and spectators for one table.
///
/// ## Lifecycle
///
/// ```text
/// connect ──→ bind_seat() ──→ Seated(First) | Seated(Second) | Spectator
///                                   │
/// disconnect ──→ release_seat() ────┘  (slot empties immediately)
/// ```
#[derive(Debug, Default, Clone)]
pub struct SeatRegistry {
    /// Indexed by [`Seat::index`].
    seats: [Option<ConnectionId>; 2],
    spectators: HashSet<ConnectionId>,
}

impl SeatRegistry {
    /// Creates an empty registry: both seats free, no spectators.
    pub fn new() -> Self {
        Self::default()
    }

    /// Assigns a role to a connection.
    ///
    /// The first free seat in binding order (`First`, then `Second`) is
    /// taken; with both seats occupied the connection becomes a spectator.
    ///
    /// Idempotent: a connection that is already known keeps the role it
    /// has. A spectator does not get upgraded by calling this again after a
    /// seat frees up; seats are handed out at connect time only.
    pub fn bind_seat(&mut self, conn: ConnectionId) -> Role {
        let current = self.seat_of(conn);
        if current != Role::Spectator || self.spectators.contains(&conn) {
            return current;
        }

        for seat in Seat::ALL {
            let slot = &mut self.seats[seat.index()];
            if slot.is_none() {
                *slot = Some(conn);
                tracing::info!(%conn, %seat, "seat bound");
                return Role::Seated(seat);
            }
        }

        self.spectators.insert(conn);
        tracing::info!(%conn, spectators = self.spectators.len(), "spectator joined");
        Role::Spectator
    }

    /// Forgets a connection, emptying its seat if it held one.
    ///
    /// Returns the freed seat, or `None` for spectators and for connections
    /// the registry has never seen. Safe to call more than once.
    pub fn release_seat(&mut self, conn: ConnectionId) -> Option<Seat> {
        if self.spectators.remove(&conn) {
            tracing::debug!(%conn, "spectator left");
            return None;
        }

        let seat = self.seat_of(conn).seat()?;
        self.seats[seat.index()] = None;
        tracing::info!(%conn, %seat, "seat released");
        Some(seat)
    }

    /// Looks up a connection's role. Unknown connections are spectators:
    /// they can observe nothing and move nothing.
    pub fn seat_of(&self, conn: ConnectionId) -> Role {
        Seat::ALL
            .into_iter()
            .find(|seat| self.seats[seat.index()] == Some(conn))
            .map_or(Role::Spectator, Role::Seated)
    }

    /// Returns the connection bound to `seat`, if any.
    pub fn occupant(&self, seat: Seat) -> Option<ConnectionId> {
        self.seats[seat.index()]
    }

    /// Number of bound seats: 0, 1 or 2.
    pub fn occupancy(&self) -> usize {
        self.seats.iter().filter(|slot| slot.is_some()).count()
    }

    /// Returns `true` when both seats are bound.
    pub fn is_full(&self) -> bool {
        self.occupancy() == Seat::ALL.len()
    }

    /// Number of connections recorded as spectators.
    pub fn spectator_count(&self) -> usize {
        self.spectators.len()
    }

    /// Returns `true` if the registry knows this connection in any role.
    pub fn contains(&self, conn: ConnectionId) -> bool {
        self.spectators.contains(&conn) || self.seat_of(conn) != Role::Spectator
    }
}

// =========================================================================
// Tests
// =========================================================================
