//! End-to-end search tests against [`corvid::search::get_best_move`].

use corvid::book::NullBook;
use corvid::eval::{Evaluator, MaterialEvaluator};
use corvid::position::Position;
use corvid::search::{get_best_move, GoLimits, SearchState};
use corvid::types::Move;

fn search(fen: &str, depth: u32) -> (String, i32) {
    let pos = Position::from_fen(fen).unwrap();
    let mut state = SearchState::new(16);
    let evaluator = MaterialEvaluator;
    let book = NullBook;
    let mut last_score = 0;
    let best = get_best_move(
        &mut state,
        &evaluator as &dyn Evaluator,
        &book,
        &pos,
        depth,
        &GoLimits::default(),
        |info| last_score = info.score_cp,
    );
    (best.to_string(), last_score)
}

#[test]
fn smoke_test_runs_four_depths_and_returns_a_legal_move() {
    let pos = Position::startpos();
    let mut state = SearchState::new(16);
    let evaluator = MaterialEvaluator;
    let book = NullBook;
    let mut depths_seen = Vec::new();
    let best = get_best_move(
        &mut state,
        &evaluator as &dyn Evaluator,
        &book,
        &pos,
        4,
        &GoLimits::default(),
        |info| depths_seen.push(info.depth),
    );
    assert_eq!(depths_seen, vec![1, 2, 3, 4]);
    assert_ne!(best, Move::null());
    let legal = pos.generate_legal_moves();
    assert!(legal.iter().any(|&m| m == best));
}

#[test]
fn finds_back_rank_mate_in_one() {
    let (uci, score) = search("6k1/5ppp/8/8/8/8/8/4Q2K w - - 0 1", 3);
    assert_eq!(uci, "e1e8");
    assert!(score >= 49_000 - 3);
}

#[test]
fn checkmated_side_has_no_legal_move() {
    let pos = Position::from_fen("7k/5Q2/6K1/8/8/8/8/8 b - - 0 1").unwrap();
    assert!(pos.generate_legal_moves().is_empty());
    let mut state = SearchState::new(16);
    let evaluator = MaterialEvaluator;
    let book = NullBook;
    let best = get_best_move(
        &mut state,
        &evaluator as &dyn Evaluator,
        &book,
        &pos,
        1,
        &GoLimits::default(),
        |_| {},
    );
    assert_eq!(best, Move::null());
}

#[test]
fn en_passant_capture_is_reachable_from_the_root() {
    let mut pos =
        Position::from_fen("rnbqkbnr/ppp1p1pp/8/3pPp2/8/8/PPPP1PPP/RNBQKBNR w KQkq f6 0 3").unwrap();
    let mv = pos.parse_move("e5f6").expect("en passant should be legal");
    assert!(mv.is_en_passant());
    pos.make_move(mv);
    assert!(pos.piece_at("f5".parse().unwrap()).is_none());
}

#[test]
fn neither_side_may_castle_through_an_attacking_rook() {
    let pos = Position::from_fen("r3k2r/8/8/8/8/8/4r3/R3K2R w KQkq - 0 1").unwrap();
    let legal = pos.generate_legal_moves();
    assert!(!legal.iter().any(|m| m.is_castle_kingside() || m.is_castle_queenside()));
}

#[test]
fn fourfold_repetition_is_detected_and_scored_as_a_draw() {
    let mut pos = Position::startpos();
    for mv_text in ["g1f3", "g8f6", "f3g1", "f6g8", "g1f3", "g8f6", "f3g1", "f6g8"] {
        let mv = pos.parse_move(mv_text).unwrap();
        pos.make_move(mv);
    }
    assert!(pos.is_repetition());
}
