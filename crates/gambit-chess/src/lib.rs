//! Standard chess as a Gambit [`MoveOracle`].
//!
//! Positions travel as FEN strings, moves as `{ from, to, promotion? }`
//! square pairs, and every accepted move is annotated with its SAN. The
//! rules themselves (legality, check, mate, draws) come from `shakmaty`.
//!
//! ```rust
//! use gambit_chess::{ChessMove, ChessRules};
//! use gambit_protocol::Seat;
//! use gambit_table::MoveOracle;
//!
//! let start = ChessRules::initial_position();
//! let eval = ChessRules::evaluate(&start, &ChessMove::new("e2", "e4")).unwrap();
//! assert_eq!(eval.annotation.san, "e4");
//! assert_eq!(ChessRules::turn(&eval.position), Seat::Second);
//! ```

use std::fmt;

use gambit_protocol::Seat;
use gambit_table::{Evaluation, MoveOracle, OracleError};
use serde::{Deserialize, Serialize};
use shakmaty::fen::Fen;
use shakmaty::san::SanPlus;
use shakmaty::zobrist::{Zobrist64, ZobristHash};
use shakmaty::{CastlingMode, Chess, Color, EnPassantMode, Move, Position, Role, Square};

/// FEN of the standard starting position.
pub const START_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

/// Fifty full moves without a capture or pawn move.
const FIFTY_MOVE_HALFMOVES: u32 = 100;

/// Occurrences of one position that end the game.
const REPETITION_LIMIT: usize = 3;

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

/// A position in Forsyth-Edwards Notation. Serialized as the bare string.
///
/// Positions produced by [`ChessRules`] also remember the Zobrist keys of
/// the earlier positions since the last capture or pawn move, which is what
/// threefold repetition is judged on. That history stays on the server: a
/// position decoded from the wire starts with none.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct ChessPosition {
    fen: String,
    history: Vec<u64>,
}

impl ChessPosition {
    /// Wraps a FEN string. Not validated until it is evaluated against.
    pub fn new(fen: impl Into<String>) -> Self {
        Self {
            fen: fen.into(),
            history: Vec::new(),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.fen
    }

    /// The side to move, read from the FEN's active-color field.
    /// White moves first, so anything but `b` reads as [`Seat::First`].
    pub fn side_to_move(&self) -> Seat {
        match self.fen.split_whitespace().nth(1) {
            Some("b") => Seat::Second,
            _ => Seat::First,
        }
    }

    /// How many times the current position has occurred, given its key.
    fn occurrences(&self, key: u64) -> usize {
        self.history.iter().filter(|&&k| k == key).count() + 1
    }
}

impl From<String> for ChessPosition {
    fn from(fen: String) -> Self {
        Self::new(fen)
    }
}

impl From<ChessPosition> for String {
    fn from(position: ChessPosition) -> Self {
        position.fen
    }
}

impl Default for ChessPosition {
    fn default() -> Self {
        Self::new(START_FEN)
    }
}

impl fmt::Display for ChessPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.fen)
    }
}

/// A move as clients submit it: origin and target squares in algebraic
/// form (`"e2"`, `"e4"`). Castling is the king's two-square move.
///
/// `promotion` (`q`, `r`, `b` or `n`) only matters for pawn moves onto the
/// last rank, where it defaults to a queen. It is ignored elsewhere.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChessMove {
    pub from: String,
    pub to: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub promotion: Option<char>,
}

impl ChessMove {
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            promotion: None,
        }
    }

    pub fn with_promotion(mut self, piece: char) -> Self {
        self.promotion = Some(piece);
        self
    }
}

impl fmt::Display for ChessMove {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.from, self.to)?;
        if let Some(piece) = self.promotion {
            write!(f, "{piece}")?;
        }
        Ok(())
    }
}

/// Move-list annotation for an accepted chess move.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChessAnnotation {
    /// Standard algebraic notation including the check/mate suffix,
    /// e.g. `Qxf7#`.
    pub san: String,
    /// Lowercase letter of the captured piece, if any.
    pub captured: Option<char>,
    /// The move gives check.
    pub check: bool,
    /// The move gives checkmate.
    pub mate: bool,
}

// ---------------------------------------------------------------------------
// Oracle
// ---------------------------------------------------------------------------

/// Standard chess rules.
///
/// A game ends on checkmate, stalemate, insufficient material, threefold
/// repetition, or when the fifty-move rule applies.
pub struct ChessRules;

impl MoveOracle for ChessRules {
    type Position = ChessPosition;
    type Move = ChessMove;
    type Annotation = ChessAnnotation;

    fn initial_position() -> ChessPosition {
        ChessPosition::default()
    }

    fn turn(position: &ChessPosition) -> Seat {
        position.side_to_move()
    }

    fn evaluate(
        position: &ChessPosition,
        mv: &ChessMove,
    ) -> Result<Evaluation<ChessPosition, ChessAnnotation>, OracleError> {
        let mut pos = parse_position(position)?;
        let from = parse_square(&mv.from)?;
        let to = parse_square(&mv.to)?;
        let promotion = mv.promotion.map(parse_promotion).transpose()?;

        let mover = pos.turn();
        let chosen = pos
            .legal_moves()
            .into_iter()
            .find(|m| {
                m.from() == Some(from)
                    && destination(m, mover) == to
                    && promotion_matches(m, promotion)
            })
            .ok_or_else(|| OracleError::Illegal(mv.to_string()))?;

        let before = repetition_key(&pos);
        let captured = chosen.capture().map(Role::char);
        let san = SanPlus::from_move_and_play_unchecked(&mut pos, &chosen);

        // A capture or pawn move resets the halfmove clock; nothing before
        // it can recur.
        let history = if pos.halfmoves() == 0 {
            Vec::new()
        } else {
            let mut history = position.history.clone();
            history.push(before);
            history
        };
        let key = repetition_key(&pos);

        let mate = pos.is_checkmate();
        let next = ChessPosition {
            fen: Fen::from_setup(pos.clone().into_setup(EnPassantMode::Legal)).to_string(),
            history,
        };
        let repetitions = next.occurrences(key);
        let terminal = mate
            || pos.is_stalemate()
            || pos.is_insufficient_material()
            || pos.halfmoves() >= FIFTY_MOVE_HALFMOVES
            || repetitions >= REPETITION_LIMIT;

        tracing::trace!(%san, fen = %next, repetitions, terminal, "chess move evaluated");

        Ok(Evaluation {
            position: next,
            captured: captured.is_some(),
            terminal,
            annotation: ChessAnnotation {
                san: san.to_string(),
                captured,
                check: pos.is_check(),
                mate,
            },
        })
    }
}

fn parse_position(position: &ChessPosition) -> Result<Chess, OracleError> {
    let fen = position
        .as_str()
        .parse::<Fen>()
        .map_err(|e| OracleError::Malformed(format!("invalid FEN: {e}")))?;
    fen.into_position(CastlingMode::Standard)
        .map_err(|e| OracleError::Malformed(format!("impossible position: {e}")))
}

/// Identity of a position for repetition: placement, side to move,
/// castling rights and a capturable en-passant square.
fn repetition_key(pos: &Chess) -> u64 {
    pos.zobrist_hash::<Zobrist64>(EnPassantMode::Legal).0
}

fn parse_square(square: &str) -> Result<Square, OracleError> {
    square
        .parse::<Square>()
        .map_err(|_| OracleError::Malformed(format!("invalid square {square:?}")))
}

fn parse_promotion(piece: char) -> Result<Role, OracleError> {
    match Role::from_char(piece.to_ascii_lowercase()) {
        Some(role @ (Role::Queen | Role::Rook | Role::Bishop | Role::Knight)) => Ok(role),
        _ => Err(OracleError::Malformed(format!(
            "cannot promote to {piece:?}"
        ))),
    }
}

/// Where the moving piece lands. Castling moves are stored king-takes-rook,
/// clients name the king's own target square.
fn destination(m: &Move, mover: Color) -> Square {
    match m.castling_side() {
        Some(side) => side.king_to(mover),
        None => m.to(),
    }
}

fn promotion_matches(m: &Move, requested: Option<Role>) -> bool {
    match m.promotion() {
        None => true,
        Some(role) => role == requested.unwrap_or(Role::Queen),
    }
}
