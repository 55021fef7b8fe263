//! The `MoveOracle` trait: the rules engine a table plays by.
//!
//! The table never knows the rules of the game. It hands the current
//! position and a candidate move to the oracle and trusts the verdict:
//! legality, resulting position, capture, termination and notation all come
//! from here.

use serde::{de::DeserializeOwned, Serialize};

use gambit_protocol::Seat;

/// The verdict for an accepted move.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Evaluation<P, A> {
    /// Position after the move. Its turn indicator names the next mover.
    pub position: P,
    /// Whether the move captured something (drives the sound cue).
    pub captured: bool,
    /// Whether the resulting position ends the game
    /// (mate, stalemate, draw by rule...).
    pub terminal: bool,
    /// Oracle-specific description of the move, e.g. algebraic notation.
    pub annotation: A,
}

/// Why the oracle refused a move.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OracleError {
    /// Well-formed, but not a legal move in this position.
    #[error("illegal move: {0}")]
    Illegal(String),

    /// The move (or the position) could not even be interpreted.
    #[error("malformed input: {0}")]
    Malformed(String),
}

/// The rules engine contract.
///
/// Associated functions rather than methods: an oracle is a stateless
/// type-level strategy and the table is parameterised by it.
///
/// # Example
///
/// ```rust
/// use gambit_protocol::Seat;
/// use gambit_table::{Evaluation, MoveOracle, OracleError};
///
/// /// Players alternately add 1 or 2; whoever reaches 10 ends the game.
/// struct RaceToTen;
///
/// impl MoveOracle for RaceToTen {
///     type Position = u32;
///     type Move = u32;
///     type Annotation = String;
///
///     fn initial_position() -> u32 {
///         0
///     }
///
///     fn turn(position: &u32) -> Seat {
///         if position % 2 == 0 { Seat::First } else { Seat::Second }
///     }
///
///     fn evaluate(
///         position: &u32,
///         mv: &u32,
///     ) -> Result<Evaluation<u32, String>, OracleError> {
///         if !(1..=2).contains(mv) {
///             return Err(OracleError::Illegal(format!("cannot add {mv}")));
///         }
///         let next = position + mv;
///         Ok(Evaluation {
///             position: next,
///             captured: false,
///             terminal: next >= 10,
///             annotation: format!("+{mv}"),
///         })
///     }
/// }
///
/// assert_eq!(RaceToTen::turn(&RaceToTen::initial_position()), Seat::First);
/// ```
pub trait MoveOracle: Send + Sync + 'static {
    /// A complete, serializable game position. Sent verbatim to clients as
    /// the resynchronization snapshot.
    type Position: Clone + Send + Sync + Serialize + DeserializeOwned;

    /// A move descriptor as clients submit it.
    type Move: Clone + Send + Sync + Serialize + DeserializeOwned;

    /// Per-move annotation for the move list.
    type Annotation: Clone + Send + Sync + Serialize + DeserializeOwned;

    /// The position every game starts from.
    fn initial_position() -> Self::Position;

    /// Whose turn it is in `position`.
    fn turn(position: &Self::Position) -> Seat;

    /// Judges `mv` against `position`.
    ///
    /// # Errors
    /// [`OracleError::Illegal`] for a legal-format move that the rules
    /// forbid, [`OracleError::Malformed`] for input that cannot be parsed.
    fn evaluate(
        position: &Self::Position,
        mv: &Self::Move,
    ) -> Result<Evaluation<Self::Position, Self::Annotation>, OracleError>;
}
