//! Table configuration and the derived turn phase.

use std::time::Duration;

use gambit_protocol::Seat;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// TableConfig
// ---------------------------------------------------------------------------

/// Whether a lone seated player may move before the opposing seat fills.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SoloMovePolicy {
    /// Moves are accepted as long as the mover owns the seat on turn,
    /// even with nobody in the other seat.
    #[default]
    Allow,
    /// Moves are silently dropped until both seats are bound.
    RequireOpponent,
}

/// Configuration for one table instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableConfig {
    /// How long a finished game stays on screen before the table resets
    /// itself to the initial position.
    pub reset_delay: Duration,

    /// See [`SoloMovePolicy`].
    pub solo_moves: SoloMovePolicy,

    /// Capacity of the actor's command queue. Senders wait when it is full.
    pub channel_size: usize,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            reset_delay: Duration::from_secs(1),
            solo_moves: SoloMovePolicy::Allow,
            channel_size: 64,
        }
    }
}

// ---------------------------------------------------------------------------
// Phase
// ---------------------------------------------------------------------------

/// Where a table is in its turn cycle.
///
/// Never stored: it is computed from the position's turn indicator and the
/// termination flag, so "game over but still someone's turn" cannot exist.
///
/// ```text
/// Awaiting(First) ⇄ Awaiting(Second)
///        │                 │
///        └──(terminal)──→ GameOver ──(reset)──→ Awaiting(First)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    /// Waiting for the given seat to move.
    Awaiting(Seat),
    /// The last move ended the game; only a reset leaves this phase.
    GameOver,
}

impl Phase {
    /// The seat allowed to move, or `None` once the game is over.
    pub fn on_turn(self) -> Option<Seat> {
        match self {
            Self::Awaiting(seat) => Some(seat),
            Self::GameOver => None,
        }
    }

    /// Returns `true` in the terminal phase.
    pub fn is_over(self) -> bool {
        matches!(self, Self::GameOver)
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Awaiting(seat) => write!(f, "awaiting {seat}"),
            Self::GameOver => write!(f, "game over"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_config_default() {
        let config = TableConfig::default();
        assert_eq!(config.reset_delay, Duration::from_secs(1));
        assert_eq!(config.solo_moves, SoloMovePolicy::Allow);
        assert_eq!(config.channel_size, 64);
    }

    #[test]
    fn test_phase_on_turn() {
        assert_eq!(Phase::Awaiting(Seat::Second).on_turn(), Some(Seat::Second));
        assert_eq!(Phase::GameOver.on_turn(), None);
    }

    #[test]
    fn test_phase_is_over() {
        assert!(Phase::GameOver.is_over());
        assert!(!Phase::Awaiting(Seat::First).is_over());
    }

    #[test]
    fn test_phase_display() {
        assert_eq!(Phase::Awaiting(Seat::First).to_string(), "awaiting first-mover");
        assert_eq!(Phase::GameOver.to_string(), "game over");
    }
}
