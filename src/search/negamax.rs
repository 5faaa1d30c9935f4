//! Alpha-beta negamax with PVS, the pruning/reduction stack, and the
//! transposition table.

use crate::eval::Evaluator;
use crate::position::Position;
use crate::tt::Bound;
use crate::types::{Move, MoveList, EMPTY_MOVE};

use super::ordering::{history_kind, score_move};
use super::quiescence::quiescence;
use super::{SearchState, INF, MATE_SCORE};

const RFP_MAX_DEPTH: i32 = 7;
const RFP_MARGIN_PER_PLY: i32 = 80;
const NULL_MOVE_MIN_DEPTH: i32 = 3;
const RAZOR_MAX_DEPTH: i32 = 3;
const RAZOR_MARGIN_PER_PLY: i32 = 300;
const LMR_MIN_DEPTH: i32 = 3;
const LMR_MIN_MOVE_INDEX: usize = 3;

/// Negamax from the side-to-move's perspective: a higher score is always
/// better for whoever is about to move in `pos`.
///
/// `pos` is mutated in place only for the null-move pruning probe (saved
/// and restored via [`Position::make_null_move`]/[`Position::unmake_null_move`]);
/// every other child is explored on a cloned copy, per the core's
/// copy-on-recurse architecture.
pub(crate) fn negamax(
    state: &mut SearchState,
    evaluator: &dyn Evaluator,
    pos: &mut Position,
    mut depth: i32,
    mut alpha: i32,
    beta: i32,
    ply: usize,
) -> i32 {
    state.nodes += 1;
    if state.nodes & 4095 == 0 {
        state.poll_time();
    }
    if state.should_stop() {
        return 0;
    }

    if ply > 0 && pos.is_repetition() {
        return 0;
    }

    let original_alpha = alpha;
    let key = pos.hash();
    let mut tt_move = EMPTY_MOVE;
    if let Some(probe) = state.tt.probe(key, depth.max(0) as u32, ply as u32, alpha, beta) {
        tt_move = probe.best_move;
        if probe.cutoff_usable {
            return probe.score;
        }
    }

    let in_check = pos.is_in_check();
    if in_check {
        depth += 1;
    }

    if depth <= 0 {
        return quiescence(state, evaluator, pos, alpha, beta, ply);
    }

    let static_eval = evaluator.evaluate(pos);

    if depth <= RFP_MAX_DEPTH && !in_check && ply > 0 && static_eval - RFP_MARGIN_PER_PLY * depth >= beta {
        return static_eval;
    }

    if depth >= NULL_MOVE_MIN_DEPTH && !in_check && ply > 0 && static_eval >= beta {
        let reduction = if depth > 6 { 3 } else { 2 };
        let undo = pos.make_null_move();
        let score = -negamax(
            state,
            evaluator,
            pos,
            depth - 1 - reduction,
            -beta,
            -beta + 1,
            ply + 1,
        );
        pos.unmake_null_move(undo);
        if state.should_stop() {
            return 0;
        }
        if score >= beta {
            return beta;
        }
    }

    if depth <= RAZOR_MAX_DEPTH && !in_check && ply > 0 && static_eval + RAZOR_MARGIN_PER_PLY * depth < alpha {
        let score = quiescence(state, evaluator, pos, alpha, beta, ply);
        if score < alpha {
            return score;
        }
    }

    let pseudo = pos.generate_pseudo_moves();
    let scored = score_and_sort(pos, &pseudo, ply, tt_move, state);

    let mut best_score = -INF;
    let mut best_move = EMPTY_MOVE;
    let mut legal = 0usize;

    for (i, &mv) in scored.iter().enumerate() {
        let mut child = pos.clone();
        child.make_move(mv);
        let us = pos.side_to_move();
        let Some(king_sq) = child.king_square(us) else {
            continue;
        };
        if child.is_square_attacked(king_sq, child.side_to_move()) {
            continue;
        }
        legal += 1;

        let is_quiet = !mv.is_capture() && !mv.is_promotion();
        let is_killer = {
            let slot = state.killers.get(ply);
            mv == slot[0] || mv == slot[1]
        };
        let reduction = if depth >= LMR_MIN_DEPTH
            && i > LMR_MIN_MOVE_INDEX
            && !in_check
            && is_quiet
            && !is_killer
        {
            if i > 8 && depth > 6 {
                2
            } else {
                1
            }
        } else {
            0
        };

        let score = if legal == 1 {
            -negamax(state, evaluator, &mut child, depth - 1, -beta, -alpha, ply + 1)
        } else {
            let mut s = -negamax(
                state,
                evaluator,
                &mut child,
                depth - 1 - reduction,
                -alpha - 1,
                -alpha,
                ply + 1,
            );
            if s > alpha && reduction > 0 {
                s = -negamax(state, evaluator, &mut child, depth - 1, -alpha - 1, -alpha, ply + 1);
            }
            if s > alpha && s < beta {
                s = -negamax(state, evaluator, &mut child, depth - 1, -beta, -alpha, ply + 1);
            }
            s
        };

        if state.should_stop() {
            return 0;
        }

        if score > best_score {
            best_score = score;
            best_move = mv;
        }
        if score > alpha {
            alpha = score;
            if is_quiet {
                state.killers.push(ply, mv);
                let kind = history_kind(pos, mv.from());
                state.history.add(kind, mv.to().as_index(), depth * depth);
            }
        }
        if alpha >= beta {
            break;
        }
    }

    if legal == 0 {
        return if in_check { -MATE_SCORE + ply as i32 } else { 0 };
    }

    let bound = if best_score >= beta {
        Bound::Lower
    } else if best_score <= original_alpha {
        Bound::Upper
    } else {
        Bound::Exact
    };
    state.tt.store(key, best_score, best_move, depth.max(0) as u32, bound, ply as u32);

    best_score
}

fn score_and_sort(
    pos: &Position,
    pseudo: &MoveList,
    ply: usize,
    tt_move: Move,
    state: &SearchState,
) -> Vec<Move> {
    let mut scored: Vec<(i32, Move)> = pseudo
        .iter()
        .map(|&mv| (score_move(mv, pos, ply, tt_move, &state.killers, &state.history), mv))
        .collect();
    scored.sort_by_key(|&(score, _)| std::cmp::Reverse(score));
    scored.into_iter().map(|(_, mv)| mv).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::eval::MaterialEvaluator;

    #[test]
    fn mate_in_one_is_found() {
        let mut state = SearchState::new(1);
        state.start_new_search(u64::MAX);
        let mut pos = Position::from_fen("4k3/8/4K3/4Q3/8/8/8/8 w - - 0 1").unwrap();
        let score = negamax(&mut state, &MaterialEvaluator, &mut pos, 3, -INF, INF, 0);
        assert!(score >= MATE_SCORE - 3);
    }

    #[test]
    fn checkmated_side_returns_mate_score_for_mover() {
        let mut state = SearchState::new(1);
        state.start_new_search(u64::MAX);
        let mut pos = Position::from_fen("7k/5Q2/6K1/8/8/8/8/8 b - - 0 1").unwrap();
        let score = negamax(&mut state, &MaterialEvaluator, &mut pos, 1, -INF, INF, 0);
        assert!(score <= -MATE_SCORE + 1);
    }

    #[test]
    fn repetition_scores_as_draw() {
        let mut state = SearchState::new(1);
        state.start_new_search(u64::MAX);
        let mut pos = Position::startpos();
        for mv_text in ["g1f3", "g8f6", "f3g1", "f6g8"] {
            let mv = pos.parse_move(mv_text).unwrap();
            pos.make_move(mv);
        }
        assert!(pos.is_repetition() == false);
        // One more round brings the exact starting position back.
        for mv_text in ["g1f3", "g8f6", "f3g1", "f6g8"] {
            let mv = pos.parse_move(mv_text).unwrap();
            pos.make_move(mv);
        }
        assert!(pos.is_repetition());
        let score = negamax(&mut state, &MaterialEvaluator, &mut pos, 2, -INF, INF, 1);
        assert_eq!(score, 0);
    }
}
