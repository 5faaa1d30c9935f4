//! Time budgeting for the `go` command.

use crate::types::Color;

/// Time-related fields parsed from a `go` command. All are optional because
/// a UCI client may supply any subset (or none, for `go infinite` /
/// `go depth N`).
#[derive(Debug, Clone, Copy, Default)]
pub struct GoLimits {
    pub movetime_ms: Option<u64>,
    pub white_time_ms: Option<u64>,
    pub black_time_ms: Option<u64>,
    pub white_inc_ms: Option<u64>,
    pub black_inc_ms: Option<u64>,
}

const MOVES_TO_GO_ESTIMATE: u64 = 25;
const HARD_CAP_PERCENT: u64 = 90;

/// Resolve `limits` into a single millisecond budget for `side`: an
/// explicit `movetime` wins outright; otherwise `time_left/25 + increment`
/// capped at 90% of the side's remaining time; with neither field present
/// the search is unlimited (bounded only by `max_depth`).
#[must_use]
pub fn time_budget_ms(limits: &GoLimits, side: Color) -> u64 {
    if let Some(movetime) = limits.movetime_ms {
        return movetime;
    }

    let (time_left, inc) = match side {
        Color::White => (limits.white_time_ms, limits.white_inc_ms.unwrap_or(0)),
        Color::Black => (limits.black_time_ms, limits.black_inc_ms.unwrap_or(0)),
    };

    match time_left {
        Some(time_left) => {
            let base = time_left / MOVES_TO_GO_ESTIMATE + inc;
            let hard_cap = time_left * HARD_CAP_PERCENT / 100;
            base.min(hard_cap)
        }
        None => u64::MAX,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn movetime_takes_priority() {
        let limits = GoLimits {
            movetime_ms: Some(1234),
            white_time_ms: Some(60_000),
            ..Default::default()
        };
        assert_eq!(time_budget_ms(&limits, Color::White), 1234);
    }

    #[test]
    fn incremental_budget_uses_moves_to_go_estimate_plus_increment() {
        let limits = GoLimits {
            white_time_ms: Some(25_000),
            white_inc_ms: Some(100),
            ..Default::default()
        };
        assert_eq!(time_budget_ms(&limits, Color::White), 1_100);
    }

    #[test]
    fn incremental_budget_is_capped_at_ninety_percent_of_remaining() {
        let limits = GoLimits {
            white_time_ms: Some(1_000),
            white_inc_ms: Some(10_000),
            ..Default::default()
        };
        assert_eq!(time_budget_ms(&limits, Color::White), 900);
    }

    #[test]
    fn no_time_fields_is_unlimited() {
        let limits = GoLimits::default();
        assert_eq!(time_budget_ms(&limits, Color::White), u64::MAX);
    }

    #[test]
    fn black_side_uses_black_fields() {
        let limits = GoLimits {
            black_time_ms: Some(50_000),
            black_inc_ms: Some(0),
            white_time_ms: Some(999_999),
            ..Default::default()
        };
        assert_eq!(time_budget_ms(&limits, Color::Black), 2_000);
    }
}
