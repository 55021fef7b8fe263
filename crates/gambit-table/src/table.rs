//! The authoritative game surface and the record of one accepted move.

use gambit_protocol::Seat;
use gambit_transport::ConnectionId;

use crate::{Evaluation, MoveOracle, Phase};

/// The single authoritative position of a table.
///
/// Owned by the table actor. The arbiter is the only code that advances it
/// and the lifecycle code is the only code that resets it.
pub struct Table<O: MoveOracle> {
    position: O::Position,
    finished: bool,
    /// Identifies the current game. Bumped on every reset, so work that was
    /// scheduled for an earlier game can tell it has been superseded.
    generation: u64,
    /// Moves accepted in the current game.
    plies: u32,
}

impl<O: MoveOracle> Table<O> {
    /// A fresh table at the oracle's initial position, generation 0.
    pub fn new() -> Self {
        Self {
            position: O::initial_position(),
            finished: false,
            generation: 0,
            plies: 0,
        }
    }

    /// The current position.
    pub fn position(&self) -> &O::Position {
        &self.position
    }

    /// The derived turn phase.
    pub fn phase(&self) -> Phase {
        if self.finished {
            Phase::GameOver
        } else {
            Phase::Awaiting(O::turn(&self.position))
        }
    }

    /// The current game's generation.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Number of moves accepted since the last reset.
    pub fn plies(&self) -> u32 {
        self.plies
    }

    /// Installs the oracle's resulting position. Returns the 1-based ply
    /// number of the move just applied.
    pub(crate) fn advance(
        &mut self,
        evaluation: &Evaluation<O::Position, O::Annotation>,
    ) -> u32 {
        self.position = evaluation.position.clone();
        self.finished = evaluation.terminal;
        self.plies += 1;
        self.plies
    }

    /// Back to the initial position, as a new generation.
    pub(crate) fn reset(&mut self) {
        self.position = O::initial_position();
        self.finished = false;
        self.plies = 0;
        self.generation += 1;
    }
}

impl<O: MoveOracle> Default for Table<O> {
    fn default() -> Self {
        Self::new()
    }
}

/// One accepted transition. Produced once per accepted move, fanned out,
/// then dropped.
pub struct MoveRecord<O: MoveOracle> {
    /// The connection that submitted the move.
    pub mover: ConnectionId,
    /// The seat it moved for.
    pub seat: Seat,
    /// 1-based ply within the current game.
    pub number: u32,
    /// The move as submitted.
    pub mv: O::Move,
    /// Position after the move.
    pub position: O::Position,
    /// Oracle-provided annotation (e.g. algebraic notation).
    pub annotation: O::Annotation,
    /// Whether something was captured.
    pub captured: bool,
    /// Whether this move ended the game.
    pub terminal: bool,
}
