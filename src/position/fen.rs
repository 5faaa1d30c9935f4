//! FEN parsing and formatting.
//!
//! Accepts the standard four required fields (placement, side to move,
//! castling rights, en-passant square) plus the two optional trailing move
//! counters, defaulting them to `0` and `1` when absent.

use crate::error::FenError;
use crate::types::{CastlingRights, Color, Piece, Square};
use crate::zobrist::ZOBRIST;

use super::Position;

pub const START_POSITION_FEN: &str =
    "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

pub(crate) fn parse(fen: &str) -> Result<Position, FenError> {
    let parts: Vec<&str> = fen.split_whitespace().collect();
    if parts.len() < 4 {
        return Err(FenError::TooFewParts { found: parts.len() });
    }

    let mut pos = Position::empty();

    let ranks: Vec<&str> = parts[0].split('/').collect();
    if ranks.len() != 8 {
        return Err(FenError::InvalidRank { rank: ranks.len() });
    }
    for (rank_from_top, rank_str) in ranks.iter().enumerate() {
        let rank = 7 - rank_from_top;
        let mut file = 0usize;
        for c in rank_str.chars() {
            if let Some(skip) = c.to_digit(10) {
                file += skip as usize;
                if file > 8 {
                    return Err(FenError::TooManyFiles { rank, files: file });
                }
                continue;
            }
            if file >= 8 {
                return Err(FenError::TooManyFiles { rank, files: file + 1 });
            }
            let color = if c.is_ascii_uppercase() {
                Color::White
            } else {
                Color::Black
            };
            let piece = Piece::from_char(c).ok_or(FenError::InvalidPiece { char: c })?;
            let sq = Square::new(rank, file);
            pos.set_piece(sq, color, piece);
            pos.hash ^= ZOBRIST.piece(color, piece, sq);
            file += 1;
        }
        if file != 8 {
            return Err(FenError::TooManyFiles { rank, files: file });
        }
    }

    pos.side_to_move = match parts[1] {
        "w" => Color::White,
        "b" => Color::Black,
        other => {
            return Err(FenError::InvalidSideToMove {
                found: other.to_string(),
            })
        }
    };
    if pos.side_to_move == Color::Black {
        pos.hash ^= ZOBRIST.side();
    }

    let mut castling = CastlingRights::none();
    if parts[2] != "-" {
        for c in parts[2].chars() {
            match c {
                'K' => castling.set(Color::White, true),
                'Q' => castling.set(Color::White, false),
                'k' => castling.set(Color::Black, true),
                'q' => castling.set(Color::Black, false),
                other => return Err(FenError::InvalidCastling { char: other }),
            }
        }
    }
    pos.castling = castling;
    pos.hash ^= ZOBRIST.castling(castling);

    pos.en_passant = if parts[3] == "-" {
        None
    } else {
        let sq: Square = parts[3].parse().map_err(|_| FenError::InvalidEnPassant {
            found: parts[3].to_string(),
        })?;
        Some(sq)
    };
    if let Some(sq) = pos.en_passant {
        pos.hash ^= ZOBRIST.en_passant(sq);
    }

    pos.halfmove_clock = parts.get(4).and_then(|s| s.parse().ok()).unwrap_or(0);
    pos.fullmove_number = parts.get(5).and_then(|s| s.parse().ok()).unwrap_or(1);

    Ok(pos)
}

pub(crate) fn format(pos: &Position) -> String {
    let mut placement = String::new();
    for rank_from_top in 0..8 {
        let rank = 7 - rank_from_top;
        let mut empty_run = 0u32;
        for file in 0..8 {
            let sq = Square::new(rank, file);
            match pos.piece_at(sq) {
                Some((color, piece)) => {
                    if empty_run > 0 {
                        placement.push_str(&empty_run.to_string());
                        empty_run = 0;
                    }
                    placement.push(piece.to_fen_char(color));
                }
                None => empty_run += 1,
            }
        }
        if empty_run > 0 {
            placement.push_str(&empty_run.to_string());
        }
        if rank_from_top != 7 {
            placement.push('/');
        }
    }

    let side = if pos.side_to_move == Color::White {
        "w"
    } else {
        "b"
    };

    let mut castling = String::new();
    if pos.castling.has(Color::White, true) {
        castling.push('K');
    }
    if pos.castling.has(Color::White, false) {
        castling.push('Q');
    }
    if pos.castling.has(Color::Black, true) {
        castling.push('k');
    }
    if pos.castling.has(Color::Black, false) {
        castling.push('q');
    }
    if castling.is_empty() {
        castling.push('-');
    }

    let ep = pos
        .en_passant
        .map(|sq| sq.to_string())
        .unwrap_or_else(|| "-".to_string());

    format!(
        "{placement} {side} {castling} {ep} {} {}",
        pos.halfmove_clock, pos.fullmove_number
    )
}
