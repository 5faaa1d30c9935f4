//! Transposition table for caching search results.
//!
//! Uses Zobrist hashes to store and retrieve negamax bounds, allowing the
//! search to short-circuit subtrees it has already resolved to sufficient
//! depth. Fixed-size, single-entry-per-slot with depth-preferred
//! replacement: unlike the teacher's four-way bucket scheme, node counts
//! here are small enough that a single slot per index keeps the table
//! simple without materially hurting hit rate.

use crate::types::Move;

/// Mate scores carry a sign and a distance-to-mate; anything with this much
/// magnitude or more is a mate score rather than a material evaluation.
pub const MATE_THRESHOLD: i32 = 20_000;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Bound {
    /// Exact score (alpha < score < beta at the node that stored it).
    Exact,
    /// Upper bound: true score is at most the stored value (failed low).
    Upper,
    /// Lower bound: true score is at least the stored value (failed high).
    Lower,
}

#[derive(Clone, Copy, Debug)]
struct TTEntry {
    key: u64,
    score: i32,
    best_move: Move,
    depth: u32,
    bound: Bound,
}

/// Result of a successful probe: the stored move is always returned (for
/// move ordering) even when the score itself isn't usable for a cutoff.
pub struct ProbeResult {
    pub score: i32,
    pub best_move: Move,
    pub depth: u32,
    pub bound: Bound,
    pub cutoff_usable: bool,
}

pub struct TranspositionTable {
    entries: Vec<Option<TTEntry>>,
    mask: u64,
}

impl TranspositionTable {
    /// Build a table sized to the largest power-of-two entry count whose
    /// total byte size does not exceed `size_mb` megabytes.
    #[must_use]
    pub fn new(size_mb: usize) -> Self {
        let entry_size = std::mem::size_of::<TTEntry>().max(1);
        let bytes = size_mb.saturating_mul(1024 * 1024);
        let n = (bytes / entry_size).max(1);
        let num_entries = if n.is_power_of_two() {
            n
        } else {
            n.next_power_of_two() / 2
        }
        .max(1);
        TranspositionTable {
            entries: vec![None; num_entries],
            mask: (num_entries - 1) as u64,
        }
    }

    #[inline]
    fn index(&self, key: u64) -> usize {
        (key & self.mask) as usize
    }

    /// Look up `key`. `current_depth` and `(alpha, beta)` decide whether the
    /// stored bound is usable for an immediate cutoff at this node; the
    /// stored move is returned regardless, for move ordering.
    pub fn probe(&self, key: u64, current_depth: u32, ply: u32, alpha: i32, beta: i32) -> Option<ProbeResult> {
        let entry = self.entries[self.index(key)].as_ref()?;
        if entry.key != key {
            return None;
        }
        let score = restore_mate_score(entry.score, ply);
        let cutoff_usable = entry.depth >= current_depth
            && match entry.bound {
                Bound::Exact => true,
                Bound::Upper => score <= alpha,
                Bound::Lower => score >= beta,
            };
        Some(ProbeResult {
            score,
            best_move: entry.best_move,
            depth: entry.depth,
            bound: entry.bound,
            cutoff_usable,
        })
    }

    /// Store a result, adjusting mate scores to be relative to the root
    /// before writing them out. Depth-preferred replacement: a new entry
    /// always wins ties and always overwrites a shallower one.
    pub fn store(&mut self, key: u64, score: i32, best_move: Move, depth: u32, bound: Bound, ply: u32) {
        let idx = self.index(key);
        let slot = &mut self.entries[idx];
        let should_replace = match slot {
            None => true,
            Some(existing) => existing.key == 0 || existing.depth <= depth,
        };
        if should_replace {
            *slot = Some(TTEntry {
                key,
                score: adjust_mate_score(score, ply),
                best_move,
                depth,
                bound,
            });
        }
    }

    /// Drop all entries (used on `ucinewgame`).
    pub fn clear(&mut self) {
        for slot in &mut self.entries {
            *slot = None;
        }
    }

    /// Approximate hash-full permille, sampling at most the first 1000 slots
    /// as the `info hashfull` field does not need exact precision.
    #[must_use]
    pub fn hashfull_per_mille(&self) -> u32 {
        let sample = self.entries.len().min(1000);
        if sample == 0 {
            return 0;
        }
        let filled = self.entries[..sample].iter().filter(|e| e.is_some()).count();
        ((filled * 1000) / sample) as u32
    }
}

/// Convert a score relative to the current node (`ply` plies from root) into
/// one relative to the root, for storage: mate-in-N becomes mate-in-(N+ply).
fn adjust_mate_score(score: i32, ply: u32) -> i32 {
    let ply = ply as i32;
    if score > MATE_THRESHOLD {
        score + ply
    } else if score < -MATE_THRESHOLD {
        score - ply
    } else {
        score
    }
}

/// Reverse of [`adjust_mate_score`]: translate a root-relative stored mate
/// score back to one relative to the probing node.
fn restore_mate_score(score: i32, ply: u32) -> i32 {
    let ply = ply as i32;
    if score > MATE_THRESHOLD {
        score - ply
    } else if score < -MATE_THRESHOLD {
        score + ply
    } else {
        score
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Square;

    fn dummy_move() -> Move {
        Move::quiet(Square::new(1, 4), Square::new(3, 4))
    }

    #[test]
    fn exact_entry_round_trips_at_same_ply() {
        let mut tt = TranspositionTable::new(1);
        tt.store(42, 150, dummy_move(), 5, Bound::Exact, 0);
        let result = tt.probe(42, 5, 0, -1000, 1000).unwrap();
        assert_eq!(result.score, 150);
        assert!(result.cutoff_usable);
    }

    #[test]
    fn shallower_requirement_still_usable() {
        let mut tt = TranspositionTable::new(1);
        tt.store(7, 10, dummy_move(), 8, Bound::Exact, 0);
        let result = tt.probe(7, 4, 0, -1000, 1000).unwrap();
        assert!(result.cutoff_usable);
    }

    #[test]
    fn insufficient_depth_is_not_usable_for_cutoff() {
        let mut tt = TranspositionTable::new(1);
        tt.store(7, 10, dummy_move(), 2, Bound::Exact, 0);
        let result = tt.probe(7, 8, 0, -1000, 1000).unwrap();
        assert!(!result.cutoff_usable);
    }

    #[test]
    fn mate_score_distance_is_correct_after_round_trip_through_different_ply() {
        // A mate found 3 plies deep at the storing node (mate-in-2 from
        // there) must come back out reporting the correct distance when
        // probed from a shallower ply in a later, different search.
        let mut tt = TranspositionTable::new(1);
        let mate_in_2_from_node = super::MATE_THRESHOLD + 1000 - 3;
        tt.store(99, mate_in_2_from_node, dummy_move(), 6, Bound::Exact, 3);
        let result = tt.probe(99, 6, 1, -1_000_000, 1_000_000).unwrap();
        // Stored root-relative score is mate_in_2_from_node + 3; restoring
        // at ply=1 should give mate_in_2_from_node + 3 - 1.
        assert_eq!(result.score, mate_in_2_from_node + 3 - 1);
    }

    #[test]
    fn upper_bound_only_usable_below_alpha() {
        let mut tt = TranspositionTable::new(1);
        tt.store(5, 100, dummy_move(), 3, Bound::Upper, 0);
        assert!(tt.probe(5, 3, 0, 200, 300).unwrap().cutoff_usable);
        assert!(!tt.probe(5, 3, 0, 50, 300).unwrap().cutoff_usable);
    }

    #[test]
    fn lower_bound_only_usable_above_beta() {
        let mut tt = TranspositionTable::new(1);
        tt.store(5, 100, dummy_move(), 3, Bound::Lower, 0);
        assert!(tt.probe(5, 3, 0, -300, 50).unwrap().cutoff_usable);
        assert!(!tt.probe(5, 3, 0, -300, 200).unwrap().cutoff_usable);
    }
}
