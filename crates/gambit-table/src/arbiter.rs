//! Turn arbitration: decides whether a submitted move gets to touch the
//! table, and applies it if so.

use std::panic::{self, AssertUnwindSafe};

use gambit_protocol::{Role, Seat};
use gambit_session::SeatRegistry;
use gambit_transport::ConnectionId;

use crate::{MoveOracle, MoveRecord, OracleError, Phase, SoloMovePolicy, Table};

/// Why a submission was dropped without any notification.
///
/// Silent drops never reveal anything about seat occupancy to the sender.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    /// The game is over and waiting for its reset.
    TableFinished,
    /// The sender does not hold the seat on turn (spectators included).
    NotYourTurn,
    /// Policy requires both seats bound and the opposing one is empty.
    OpponentMissing,
}

/// Outcome of one submission.
pub enum Ruling<O: MoveOracle> {
    /// Dropped silently. Table untouched.
    Ignored(IgnoreReason),
    /// Refused by the oracle (or the oracle faulted). Table untouched;
    /// only the sender is told.
    Rejected {
        mover: ConnectionId,
        mv: O::Move,
        reason: String,
    },
    /// Applied. The table now holds `record.position`.
    Accepted(MoveRecord<O>),
}

/// Runs one move submission against the table.
///
/// 1. Nobody moves in [`Phase::GameOver`].
/// 2. The sender must be bound to the seat on turn.
/// 3. With [`SoloMovePolicy::RequireOpponent`] the other seat must be bound.
/// 4. The oracle judges the move. Errors *and panics* inside the oracle are
///    caught here and turned into a rejection, so a malformed move can never
///    take the table down.
pub fn submit_move<O: MoveOracle>(
    table: &mut Table<O>,
    seats: &SeatRegistry,
    policy: SoloMovePolicy,
    conn: ConnectionId,
    mv: O::Move,
) -> Ruling<O> {
    let seat = match authorize(table.phase(), seats, policy, conn) {
        Ok(seat) => seat,
        Err(reason) => return Ruling::Ignored(reason),
    };

    let verdict = panic::catch_unwind(AssertUnwindSafe(|| {
        O::evaluate(table.position(), &mv)
    }));

    let evaluation = match verdict {
        Ok(Ok(evaluation)) => evaluation,
        Ok(Err(e)) => {
            tracing::debug!(%conn, %seat, error = %e, "move rejected");
            return Ruling::Rejected {
                mover: conn,
                mv,
                reason: e.to_string(),
            };
        }
        Err(_) => {
            let e = OracleError::Malformed("move could not be evaluated".into());
            tracing::warn!(%conn, %seat, "oracle panicked while evaluating move");
            return Ruling::Rejected {
                mover: conn,
                mv,
                reason: e.to_string(),
            };
        }
    };

    let number = table.advance(&evaluation);
    tracing::debug!(
        %conn,
        %seat,
        number,
        captured = evaluation.captured,
        terminal = evaluation.terminal,
        "move accepted"
    );

    Ruling::Accepted(MoveRecord {
        mover: conn,
        seat,
        number,
        mv,
        position: evaluation.position,
        annotation: evaluation.annotation,
        captured: evaluation.captured,
        terminal: evaluation.terminal,
    })
}

/// Checks phase, seat ownership and the solo-move policy.
fn authorize(
    phase: Phase,
    seats: &SeatRegistry,
    policy: SoloMovePolicy,
    conn: ConnectionId,
) -> Result<Seat, IgnoreReason> {
    let on_turn = phase.on_turn().ok_or(IgnoreReason::TableFinished)?;

    if seats.seat_of(conn) != Role::Seated(on_turn) {
        return Err(IgnoreReason::NotYourTurn);
    }

    if policy == SoloMovePolicy::RequireOpponent
        && seats.occupant(on_turn.other()).is_none()
    {
        return Err(IgnoreReason::OpponentMissing);
    }

    Ok(on_turn)
}
