//! The UCI command loop.
//!
//! Unlike a threaded orchestrator that spawns a search thread per `go` and
//! communicates over a channel, this loop runs the search synchronously on
//! the same thread that reads stdin. `stop` can only take effect at the
//! node-count poll inside the search itself — there is no separate thread
//! to interrupt.

use std::io::{self, BufRead, Write};

use log::{info, warn};

use crate::book::{NullBook, OpeningBook};
use crate::eval::{Evaluator, MaterialEvaluator};
use crate::position::Position;
use crate::search::{get_best_move, GoLimits, SearchInfo, SearchState};
use crate::types::Move;

const ENGINE_NAME: &str = "corvid";
const ENGINE_AUTHOR: &str = "corvid contributors";
const DEFAULT_TT_SIZE_MB: usize = 64;
const DEFAULT_MAX_DEPTH: u32 = 64;

#[derive(Debug, Clone)]
enum UciCommand {
    Uci,
    IsReady,
    UciNewGame,
    Position(Vec<String>),
    Go(Vec<String>),
    Stop,
    Quit,
    Unknown(String),
}

fn parse_uci_command(line: &str) -> Option<UciCommand> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return None;
    }
    let parts: Vec<&str> = trimmed.split_whitespace().collect();
    let owned = || parts.iter().map(|p| (*p).to_string()).collect();

    Some(match parts[0] {
        "uci" => UciCommand::Uci,
        "isready" => UciCommand::IsReady,
        "ucinewgame" => UciCommand::UciNewGame,
        "position" => UciCommand::Position(owned()),
        "go" => UciCommand::Go(owned()),
        "stop" => UciCommand::Stop,
        "quit" => UciCommand::Quit,
        _ => UciCommand::Unknown(trimmed.to_string()),
    })
}

fn parse_go_limits(parts: &[String]) -> (GoLimits, Option<u32>) {
    let mut limits = GoLimits::default();
    let mut depth = None;
    let mut i = 1;
    while i < parts.len() {
        let next_u64 = |i: usize| parts.get(i + 1).and_then(|s| s.parse::<u64>().ok());
        match parts[i].as_str() {
            "movetime" => {
                limits.movetime_ms = next_u64(i);
                i += 2;
            }
            "wtime" => {
                limits.white_time_ms = next_u64(i);
                i += 2;
            }
            "btime" => {
                limits.black_time_ms = next_u64(i);
                i += 2;
            }
            "winc" => {
                limits.white_inc_ms = next_u64(i);
                i += 2;
            }
            "binc" => {
                limits.black_inc_ms = next_u64(i);
                i += 2;
            }
            "depth" => {
                depth = parts.get(i + 1).and_then(|s| s.parse::<u32>().ok());
                i += 2;
            }
            "infinite" => {
                i += 1;
            }
            _ => i += 1,
        }
    }
    (limits, depth)
}

fn apply_position_command(pos: &mut Position, parts: &[String]) {
    let mut i = 1;
    if i >= parts.len() {
        return;
    }
    if parts[i] == "startpos" {
        *pos = Position::startpos();
        i += 1;
    } else if parts[i] == "fen" {
        let fen_start = i + 1;
        let fen_end = parts[fen_start..]
            .iter()
            .position(|p| p == "moves")
            .map_or(parts.len(), |offset| fen_start + offset);
        if fen_end <= fen_start {
            warn!("position fen command missing FEN fields");
            return;
        }
        let fen = parts[fen_start..fen_end].join(" ");
        match Position::from_fen(&fen) {
            Ok(parsed) => *pos = parsed,
            Err(e) => {
                warn!("rejecting position fen: {e}");
                return;
            }
        }
        i = fen_end;
    } else {
        return;
    }

    if i < parts.len() && parts[i] == "moves" {
        i += 1;
        while i < parts.len() {
            match pos.parse_move(&parts[i]) {
                Ok(mv) => pos.make_move(mv),
                Err(e) => warn!("rejecting move '{}': {e}", parts[i]),
            }
            i += 1;
        }
    }
}

fn format_info_line(info: &SearchInfo) -> String {
    let nps = if info.time_ms > 0 {
        info.nodes * 1000 / info.time_ms
    } else {
        0
    };
    format!(
        "info depth {} score cp {} nodes {} time {} nps {} pv {}",
        info.depth, info.score_cp, info.nodes, info.time_ms, nps, info.best_move
    )
}

fn format_bestmove(mv: Move) -> String {
    if mv == crate::types::EMPTY_MOVE {
        "bestmove 0000".to_string()
    } else {
        format!("bestmove {mv}")
    }
}

/// Run the UCI loop on stdin/stdout until `quit` or EOF.
pub fn run<R: BufRead, W: Write>(mut input: R, mut output: W) -> io::Result<()> {
    let mut pos = Position::startpos();
    let mut state = SearchState::new(DEFAULT_TT_SIZE_MB);
    let evaluator = MaterialEvaluator;
    let book = NullBook;

    let mut line = String::new();
    loop {
        line.clear();
        if input.read_line(&mut line)? == 0 {
            break;
        }

        let Some(command) = parse_uci_command(&line) else {
            continue;
        };

        match command {
            UciCommand::Uci => {
                writeln!(output, "id name {ENGINE_NAME}")?;
                writeln!(output, "id author {ENGINE_AUTHOR}")?;
                writeln!(output, "uciok")?;
            }
            UciCommand::IsReady => {
                writeln!(output, "readyok")?;
            }
            UciCommand::UciNewGame => {
                pos = Position::startpos();
                state.clear_tt();
            }
            UciCommand::Position(parts) => {
                apply_position_command(&mut pos, &parts);
            }
            UciCommand::Go(parts) => {
                let (limits, depth) = parse_go_limits(&parts);
                let max_depth = depth.unwrap_or(DEFAULT_MAX_DEPTH);
                let best = get_best_move(
                    &mut state,
                    &evaluator as &dyn Evaluator,
                    &book as &dyn OpeningBook,
                    &pos,
                    max_depth,
                    &limits,
                    |info| {
                        let _ = writeln!(output, "{}", format_info_line(info));
                    },
                );
                writeln!(output, "{}", format_bestmove(best))?;
            }
            UciCommand::Stop => {
                state.stop_handle().store(true, std::sync::atomic::Ordering::Relaxed);
            }
            UciCommand::Quit => break,
            UciCommand::Unknown(text) => {
                info!("ignoring unrecognized command: {text}");
            }
        }
        output.flush()?;
    }
    Ok(())
}
