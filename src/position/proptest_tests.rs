//! Property-based invariants over random legal move sequences.
//!
//! The teacher's equivalent suite drives an unmake stack and selects moves
//! with `rand`; this core has no undo stack (it clones instead, see the
//! module doc comment) and carries no `rand` dependency, so move selection
//! here comes from proptest's own index strategy instead.

use proptest::prelude::*;

use super::Position;

fn index_strategy() -> impl Strategy<Value = Vec<usize>> {
    prop::collection::vec(any::<usize>(), 1..=20)
}

/// Play up to `indices.len()` random legal moves from `pos`, stopping early
/// at a terminal position, returning every position visited (including the
/// start).
fn play_random_game(start: &Position, indices: &[usize]) -> Vec<Position> {
    let mut trace = vec![start.clone()];
    let mut pos = start.clone();
    for &raw_index in indices {
        let moves = pos.generate_legal_moves();
        if moves.is_empty() {
            break;
        }
        let mv = moves.iter().copied().nth(raw_index % moves.len()).unwrap();
        pos.make_move(mv);
        trace.push(pos.clone());
    }
    trace
}

proptest! {
    /// Every position along a random legal game has a hash matching the one
    /// recomputed from its FEN from scratch.
    #[test]
    fn hash_matches_recomputation_from_fen(indices in index_strategy()) {
        let start = Position::startpos();
        for pos in play_random_game(&start, &indices) {
            let recomputed = Position::from_fen(&pos.to_fen()).unwrap();
            prop_assert_eq!(pos.hash(), recomputed.hash());
        }
    }

    /// FEN round-trip preserves the position: re-parsing a position's own
    /// FEN text yields a position with the same FEN text and hash.
    #[test]
    fn fen_roundtrip_is_stable(indices in index_strategy()) {
        let start = Position::startpos();
        for pos in play_random_game(&start, &indices) {
            let fen = pos.to_fen();
            let restored = Position::from_fen(&fen).unwrap();
            prop_assert_eq!(restored.to_fen(), fen);
            prop_assert_eq!(restored.hash(), pos.hash());
        }
    }

    /// Every legal move generated from a reachable position, once made,
    /// leaves the mover's own king safe — the legality filter's whole job.
    #[test]
    fn legal_moves_never_leave_the_mover_in_check(
        indices in index_strategy(),
        extra in any::<usize>(),
    ) {
        let start = Position::startpos();
        let trace = play_random_game(&start, &indices);
        let pos = trace.last().unwrap();
        let moves = pos.generate_legal_moves();
        if !moves.is_empty() {
            let mv = moves.iter().copied().nth(extra % moves.len()).unwrap();
            let mover = pos.side_to_move();
            let mut child = pos.clone();
            child.make_move(mv);
            let king_sq = child.king_square(mover).expect("king must remain on the board");
            prop_assert!(!child.is_square_attacked(king_sq, child.side_to_move()));
        }
    }
}
