//! Iterative-deepening search: [`get_best_move`] drives [`negamax::negamax`]
//! across increasing depths under a time budget, backed by the
//! transposition table and the killer/history move-ordering tables.

mod negamax;
mod ordering;
mod quiescence;
mod time;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use crate::book::OpeningBook;
use crate::eval::Evaluator;
use crate::position::Position;
use crate::tt::TranspositionTable;
use crate::types::{Move, EMPTY_MOVE};

pub use ordering::{HistoryTable, KillerTable};
pub use time::{time_budget_ms, GoLimits};

/// Upper bound on any legal score; also doubles as "infinity" for the
/// alpha-beta window at the root.
pub const INF: i32 = 50_000;
/// Score reported for a mate delivered on this move (ply 0). Mates found
/// deeper in the tree are reported as `MATE_SCORE - ply` so that shorter
/// mates always score higher than longer ones.
pub const MATE_SCORE: i32 = 49_000;

/// Mutable state threaded through one `go` search: the transposition table
/// (which persists across searches until `ucinewgame` clears it), the
/// killer/history ordering tables (reset every search), node accounting,
/// and the cooperative stop flag polled every 4096 nodes.
pub struct SearchState {
    pub(crate) tt: TranspositionTable,
    pub(crate) killers: KillerTable,
    pub(crate) history: HistoryTable,
    pub(crate) nodes: u64,
    stop: Arc<AtomicBool>,
    start_time: Instant,
    budget_ms: u64,
}

impl SearchState {
    #[must_use]
    pub fn new(tt_size_mb: usize) -> Self {
        SearchState {
            tt: TranspositionTable::new(tt_size_mb),
            killers: KillerTable::new(),
            history: HistoryTable::new(),
            nodes: 0,
            stop: Arc::new(AtomicBool::new(false)),
            start_time: Instant::now(),
            budget_ms: u64::MAX,
        }
    }

    /// A clone of the stop flag, for a UCI `stop` command handler running
    /// on the same thread's input loop to arm before the next poll.
    #[must_use]
    pub fn stop_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.stop)
    }

    /// Reset per-search bookkeeping (node count, killers, history, stop
    /// flag, clock) without touching the transposition table.
    pub(crate) fn start_new_search(&mut self, budget_ms: u64) {
        self.nodes = 0;
        self.killers.clear();
        self.history.clear();
        self.stop.store(false, Ordering::Relaxed);
        self.start_time = Instant::now();
        self.budget_ms = budget_ms;
    }

    pub(crate) fn elapsed_ms(&self) -> u64 {
        self.start_time.elapsed().as_millis() as u64
    }

    pub(crate) fn poll_time(&mut self) {
        if self.elapsed_ms() >= self.budget_ms {
            self.stop.store(true, Ordering::Relaxed);
        }
    }

    pub(crate) fn should_stop(&self) -> bool {
        self.stop.load(Ordering::Relaxed)
    }

    pub fn clear_tt(&mut self) {
        self.tt.clear();
    }
}

/// One completed-depth report, suitable for a UCI `info` line.
pub struct SearchInfo {
    pub depth: u32,
    pub score_cp: i32,
    pub nodes: u64,
    pub time_ms: u64,
    pub best_move: Move,
}

/// Drive iterative deepening from `pos` up to `max_depth`, calling
/// `on_info` after every depth that completes inside the time budget.
/// Consults `book` before searching at all; falls through to the tree
/// search on a miss.
///
/// Returns the best move found, or `Move::null()` if there is no legal
/// move in `pos`.
pub fn get_best_move(
    state: &mut SearchState,
    evaluator: &dyn Evaluator,
    book: &dyn OpeningBook,
    pos: &Position,
    max_depth: u32,
    limits: &GoLimits,
    mut on_info: impl FnMut(&SearchInfo),
) -> Move {
    if let Some(mv) = book.lookup(pos) {
        return mv;
    }

    let budget_ms = time_budget_ms(limits, pos.side_to_move()).saturating_sub(50);
    state.start_new_search(budget_ms);

    let legal = pos.generate_legal_moves();
    if legal.is_empty() {
        return EMPTY_MOVE;
    }

    let mut root_moves: Vec<Move> = legal.iter().copied().collect();
    root_moves.sort_by_key(|&mv| {
        std::cmp::Reverse(ordering::score_move(
            mv,
            pos,
            0,
            EMPTY_MOVE,
            &state.killers,
            &state.history,
        ))
    });
    let mut best_move = root_moves[0];

    let soft_limit = (budget_ms as f64 * 0.6) as u64;

    for depth in 1..=max_depth {
        if depth > 1 && state.elapsed_ms() > soft_limit {
            break;
        }

        let mut depth_best_score = -INF;
        let mut depth_best_move = root_moves[0];
        let mut scored: Vec<(i32, Move)> = Vec::with_capacity(root_moves.len());

        for &mv in &root_moves {
            let mut child = pos.clone();
            child.make_move(mv);
            let score = -negamax::negamax(state, evaluator, &mut child, depth as i32 - 1, -INF, INF, 1);
            if state.should_stop() && depth > 1 {
                break;
            }
            scored.push((score, mv));
            if score > depth_best_score {
                depth_best_score = score;
                depth_best_move = mv;
            }
        }

        if state.should_stop() && depth > 1 {
            break;
        }

        scored.sort_by_key(|&(score, _)| std::cmp::Reverse(score));
        root_moves = scored.iter().map(|&(_, mv)| mv).collect();
        best_move = depth_best_move;

        on_info(&SearchInfo {
            depth,
            score_cp: depth_best_score,
            nodes: state.nodes,
            time_ms: state.elapsed_ms(),
            best_move,
        });

        if state.should_stop() {
            break;
        }
    }

    best_move
}
