//! Rules coverage for the chess oracle.

use gambit_chess::{ChessMove, ChessPosition, ChessRules, START_FEN};
use gambit_protocol::Seat;
use gambit_table::{MoveOracle, OracleError};

fn play(position: &ChessPosition, from: &str, to: &str) -> ChessPosition {
    ChessRules::evaluate(position, &ChessMove::new(from, to))
        .unwrap_or_else(|e| panic!("{from}{to} refused: {e}"))
        .position
}

// =========================================================================
// Legal play
// =========================================================================

#[test]
fn test_evaluate_opening_move_updates_fen_and_turn() {
    let start = ChessRules::initial_position();
    assert_eq!(start.as_str(), START_FEN);
    assert_eq!(ChessRules::turn(&start), Seat::First);

    let eval = ChessRules::evaluate(&start, &ChessMove::new("e2", "e4")).unwrap();

    assert_eq!(
        eval.position.as_str(),
        "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq - 0 1"
    );
    assert_eq!(ChessRules::turn(&eval.position), Seat::Second);
    assert!(!eval.captured);
    assert!(!eval.terminal);
    assert_eq!(eval.annotation.san, "e4");
}

#[test]
fn test_evaluate_scholars_mate_is_terminal() {
    let mut pos = ChessRules::initial_position();
    for (from, to) in [
        ("e2", "e4"),
        ("e7", "e5"),
        ("f1", "c4"),
        ("b8", "c6"),
        ("d1", "h5"),
        ("g8", "f6"),
    ] {
        pos = play(&pos, from, to);
    }

    let eval = ChessRules::evaluate(&pos, &ChessMove::new("h5", "f7")).unwrap();

    assert!(eval.terminal);
    assert!(eval.captured);
    assert_eq!(eval.annotation.san, "Qxf7#");
    assert_eq!(eval.annotation.captured, Some('p'));
    assert!(eval.annotation.check);
    assert!(eval.annotation.mate);
}

#[test]
fn test_evaluate_castling_as_king_two_square_move() {
    let pos = ChessPosition::new("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1");

    let short = ChessRules::evaluate(&pos, &ChessMove::new("e1", "g1")).unwrap();
    assert_eq!(short.annotation.san, "O-O");
    assert!(short.position.as_str().starts_with("r3k2r/8/8/8/8/8/8/R4RK1 b kq"));

    let long = ChessRules::evaluate(&pos, &ChessMove::new("e1", "c1")).unwrap();
    assert_eq!(long.annotation.san, "O-O-O");
}

#[test]
fn test_evaluate_promotion_defaults_to_queen() {
    let pos = ChessPosition::new("8/P7/7k/8/8/8/8/K7 w - - 0 1");

    let eval = ChessRules::evaluate(&pos, &ChessMove::new("a7", "a8")).unwrap();
    assert_eq!(eval.annotation.san, "a8=Q");
}

#[test]
fn test_evaluate_underpromotion_honors_requested_piece() {
    let pos = ChessPosition::new("8/P7/7k/8/8/8/8/K7 w - - 0 1");

    let mv = ChessMove::new("a7", "a8").with_promotion('n');
    let eval = ChessRules::evaluate(&pos, &mv).unwrap();
    assert_eq!(eval.annotation.san, "a8=N");
}

#[test]
fn test_evaluate_promotion_field_ignored_on_ordinary_moves() {
    let start = ChessRules::initial_position();
    let mv = ChessMove::new("e2", "e4").with_promotion('q');
    assert!(ChessRules::evaluate(&start, &mv).is_ok());
}

// =========================================================================
// Terminal conditions other than mate
// =========================================================================

#[test]
fn test_evaluate_stalemate_is_terminal_without_mate() {
    let pos = ChessPosition::new("k7/8/2K5/8/8/8/8/1Q6 w - - 0 1");

    let eval = ChessRules::evaluate(&pos, &ChessMove::new("b1", "b6")).unwrap();
    assert!(eval.terminal);
    assert!(!eval.annotation.mate);
    assert!(!eval.annotation.check);
}

#[test]
fn test_evaluate_insufficient_material_is_terminal() {
    let pos = ChessPosition::new("k7/8/8/8/8/8/1p6/K7 w - - 0 1");

    let eval = ChessRules::evaluate(&pos, &ChessMove::new("a1", "b2")).unwrap();
    assert!(eval.terminal);
    assert_eq!(eval.annotation.captured, Some('p'));
}

#[test]
fn test_evaluate_fifty_move_rule_is_terminal() {
    let pos = ChessPosition::new("k7/8/8/8/8/8/8/KR6 w - - 99 80");

    let eval = ChessRules::evaluate(&pos, &ChessMove::new("b1", "b2")).unwrap();
    assert!(eval.terminal);
    assert!(!eval.annotation.mate);
}

#[test]
fn test_evaluate_threefold_repetition_is_terminal() {
    let shuffle = [("g1", "f3"), ("g8", "f6"), ("f3", "g1"), ("f6", "g8")];
    let mut pos = ChessRules::initial_position();

    // Start position seen at plies 0 and 4.
    for (from, to) in shuffle {
        pos = play(&pos, from, to);
    }
    assert_eq!(pos.as_str(), START_FEN.replace(" 0 1", " 4 3"));

    for (from, to) in &shuffle[..3] {
        let eval = ChessRules::evaluate(&pos, &ChessMove::new(*from, *to)).unwrap();
        assert!(!eval.terminal, "{from}{to} ended the game early");
        pos = eval.position;
    }

    // Third occurrence of the start position.
    let eval = ChessRules::evaluate(&pos, &ChessMove::new("f6", "g8")).unwrap();
    assert!(eval.terminal);
    assert!(!eval.annotation.mate);
}

#[test]
fn test_evaluate_pawn_move_clears_repetition_history() {
    let mut pos = ChessRules::initial_position();
    for (from, to) in [("g1", "f3"), ("g8", "f6"), ("f3", "g1"), ("f6", "g8")] {
        pos = play(&pos, from, to);
    }
    // Irreversible: the earlier shuffles can never recur.
    pos = play(&pos, "e2", "e4");
    pos = play(&pos, "e7", "e5");

    for (from, to) in [("g1", "f3"), ("g8", "f6"), ("f3", "g1"), ("f6", "g8")] {
        let eval = ChessRules::evaluate(&pos, &ChessMove::new(from, to)).unwrap();
        assert!(!eval.terminal);
        pos = eval.position;
    }
}

#[test]
fn test_evaluate_position_from_wire_starts_without_history() {
    // Same FEN, but decoded: prior occurrences are unknown.
    let mut pos = ChessRules::initial_position();
    for (from, to) in [("g1", "f3"), ("g8", "f6"), ("f3", "g1"), ("f6", "g8")] {
        pos = play(&pos, from, to);
    }
    let decoded: ChessPosition =
        serde_json::from_value(serde_json::to_value(&pos).unwrap()).unwrap();
    assert_eq!(decoded.as_str(), pos.as_str());
    assert_ne!(decoded, pos);
}

// =========================================================================
// Refusals
// =========================================================================

#[test]
fn test_evaluate_illegal_move_is_rejected() {
    let start = ChessRules::initial_position();
    let err = ChessRules::evaluate(&start, &ChessMove::new("e2", "e5")).unwrap_err();
    assert_eq!(err, OracleError::Illegal("e2e5".into()));
}

#[test]
fn test_evaluate_opponent_piece_is_rejected() {
    // Black's pawn while White is to move.
    let start = ChessRules::initial_position();
    let err = ChessRules::evaluate(&start, &ChessMove::new("e7", "e5")).unwrap_err();
    assert!(matches!(err, OracleError::Illegal(_)));
}

#[test]
fn test_evaluate_bad_square_is_malformed() {
    let start = ChessRules::initial_position();
    let err = ChessRules::evaluate(&start, &ChessMove::new("z9", "e4")).unwrap_err();
    assert!(matches!(err, OracleError::Malformed(_)));
}

#[test]
fn test_evaluate_bad_promotion_piece_is_malformed() {
    let pos = ChessPosition::new("8/P7/7k/8/8/8/8/K7 w - - 0 1");
    let mv = ChessMove::new("a7", "a8").with_promotion('k');
    let err = ChessRules::evaluate(&pos, &mv).unwrap_err();
    assert!(matches!(err, OracleError::Malformed(_)));
}

#[test]
fn test_evaluate_unparsable_fen_is_malformed() {
    let pos = ChessPosition::new("not a position");
    let err = ChessRules::evaluate(&pos, &ChessMove::new("e2", "e4")).unwrap_err();
    assert!(matches!(err, OracleError::Malformed(_)));
}

// =========================================================================
// Wire shapes
// =========================================================================

#[test]
fn test_chess_move_json_promotion_is_optional() {
    let mv: ChessMove = serde_json::from_str(r#"{"from":"e2","to":"e4"}"#).unwrap();
    assert_eq!(mv, ChessMove::new("e2", "e4"));

    let json = serde_json::to_value(ChessMove::new("b7", "b8").with_promotion('r')).unwrap();
    assert_eq!(json["promotion"], "r");
}

#[test]
fn test_chess_position_serializes_as_bare_fen() {
    let json = serde_json::to_string(&ChessRules::initial_position()).unwrap();
    assert_eq!(json, format!("\"{START_FEN}\""));
}
