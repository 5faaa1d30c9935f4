//! Attack detection: is a given square attacked by a given color?
//!
//! Implemented as a direct ray/offset scan outward from the queried square
//! rather than by asking the move generator "does any piece attack this
//! square", because castling legality needs to probe squares the king has
//! not yet reached, and doing that through move generation would mean
//! generating moves for a hypothetical position that doesn't exist yet.
//! Sliding attacks are computed with simple ray-walking rather than magic
//! bitboards: the position sizes involved here (single-query attack checks,
//! not perft-scale generation) don't justify a magic table.

use crate::types::{Bitboard, Color, Piece, Square};

use super::Position;

const KNIGHT_OFFSETS: [(i32, i32); 8] = [
    (1, 2),
    (2, 1),
    (2, -1),
    (1, -2),
    (-1, -2),
    (-2, -1),
    (-2, 1),
    (-1, 2),
];

const KING_OFFSETS: [(i32, i32); 8] = [
    (1, 0),
    (1, 1),
    (0, 1),
    (-1, 1),
    (-1, 0),
    (-1, -1),
    (0, -1),
    (1, -1),
];

const BISHOP_DIRS: [(i32, i32); 4] = [(1, 1), (1, -1), (-1, 1), (-1, -1)];
const ROOK_DIRS: [(i32, i32); 4] = [(1, 0), (-1, 0), (0, 1), (0, -1)];

pub(crate) fn is_square_attacked(pos: &Position, square: Square, by_color: Color) -> bool {
    let rank = square.rank() as i32;
    let file = square.file() as i32;

    let pawns = pos.pieces[by_color.index()][Piece::Pawn.index()];
    let pawn_rank_offset = match by_color {
        Color::White => -1,
        Color::Black => 1,
    };
    for df in [-1, 1] {
        if let Some(sq) = offset(rank, file, pawn_rank_offset, df) {
            if pawns.contains(sq) {
                return true;
            }
        }
    }

    let knights = pos.pieces[by_color.index()][Piece::Knight.index()];
    for (dr, df) in KNIGHT_OFFSETS {
        if let Some(sq) = offset(rank, file, dr, df) {
            if knights.contains(sq) {
                return true;
            }
        }
    }

    let king = pos.pieces[by_color.index()][Piece::King.index()];
    for (dr, df) in KING_OFFSETS {
        if let Some(sq) = offset(rank, file, dr, df) {
            if king.contains(sq) {
                return true;
            }
        }
    }

    let occupied = pos.occupied();
    let bishops_queens = pos.pieces[by_color.index()][Piece::Bishop.index()]
        .or(pos.pieces[by_color.index()][Piece::Queen.index()]);
    if ray_hits(rank, file, &BISHOP_DIRS, occupied, bishops_queens) {
        return true;
    }

    let rooks_queens = pos.pieces[by_color.index()][Piece::Rook.index()]
        .or(pos.pieces[by_color.index()][Piece::Queen.index()]);
    if ray_hits(rank, file, &ROOK_DIRS, occupied, rooks_queens) {
        return true;
    }

    false
}

#[inline]
fn offset(rank: i32, file: i32, dr: i32, df: i32) -> Option<Square> {
    let r = rank + dr;
    let f = file + df;
    if (0..8).contains(&r) && (0..8).contains(&f) {
        Some(Square::new(r as usize, f as usize))
    } else {
        None
    }
}

fn ray_hits(rank: i32, file: i32, dirs: &[(i32, i32); 4], occupied: Bitboard, attackers: Bitboard) -> bool {
    for &(dr, df) in dirs {
        let mut r = rank;
        let mut f = file;
        loop {
            r += dr;
            f += df;
            if !(0..8).contains(&r) || !(0..8).contains(&f) {
                break;
            }
            let sq = Square::new(r as usize, f as usize);
            if attackers.contains(sq) {
                return true;
            }
            if occupied.contains(sq) {
                break;
            }
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::position::Position;

    #[test]
    fn startpos_e3_is_attacked_by_white_pawn() {
        let pos = Position::startpos();
        assert!(pos.is_square_attacked(Square::new(2, 4), Color::White));
        assert!(!pos.is_square_attacked(Square::new(2, 4), Color::Black));
    }

    #[test]
    fn rook_attack_blocked_by_intervening_piece() {
        let open = Position::from_fen("8/8/8/8/8/8/R7/4K2k w - - 0 1").unwrap();
        assert!(open.is_square_attacked(Square::new(7, 0), Color::White)); // a8, clear file
        let blocked = Position::from_fen("8/8/8/8/8/p7/R7/4K2k w - - 0 1").unwrap();
        assert!(!blocked.is_square_attacked(Square::new(7, 0), Color::White)); // a8, blocked by pawn on a3
    }

    #[test]
    fn knight_attacks_l_shape() {
        let pos = Position::from_fen("8/8/8/8/4N3/8/8/4K2k w - - 0 1").unwrap();
        assert!(pos.is_square_attacked(Square::new(5, 2), Color::White));
        assert!(!pos.is_square_attacked(Square::new(4, 2), Color::White));
    }
}
