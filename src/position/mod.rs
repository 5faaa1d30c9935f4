//! Chess position representation: bitboards, Zobrist hash, and the single
//! `make_move` transition the rest of the core builds on.
//!
//! A [`Position`] is a plain, cheaply-`Clone`-able value type. The search
//! explores the game tree by cloning a `Position` at every recursive step and
//! calling [`Position::make_move`] on the clone; there is no undo stack for
//! ordinary moves (see [`Position::make_null_move`] for the one exception,
//! used only by null-move pruning).

mod attacks;
mod fen;
mod movegen;
#[cfg(test)]
mod proptest_tests;

use std::fmt;

use crate::error::{FenError, MoveParseError};
use crate::types::{
    bit_for_square, Bitboard, CastlingRights, Color, Move, MoveKind, MoveList, Piece, Square,
};
use crate::zobrist::ZOBRIST;

pub use fen::START_POSITION_FEN;

const OCC_BOTH: usize = 2;

/// Saved state needed to reverse [`Position::make_null_move`].
///
/// Null moves are the one place the core mutates and later restores a
/// `Position` in place rather than cloning, because they never change piece
/// placement: there is nothing to recompute, only the en-passant square, the
/// hash, and the side to move to swap back.
#[derive(Clone, Copy, Debug)]
pub struct NullMoveUndo {
    en_passant: Option<Square>,
    hash: u64,
}

/// A chess position: bitboards, side to move, castling/en-passant state,
/// move counters, and an incrementally maintained Zobrist hash plus the
/// history of hashes needed for repetition detection.
#[derive(Clone, Debug)]
pub struct Position {
    pub(crate) pieces: [[Bitboard; 6]; 2],
    occupancy: [Bitboard; 3],
    pub(crate) side_to_move: Color,
    pub(crate) en_passant: Option<Square>,
    pub(crate) castling: CastlingRights,
    pub(crate) halfmove_clock: u32,
    pub(crate) fullmove_number: u32,
    pub(crate) hash: u64,
    history: Vec<u64>,
}

impl Position {
    /// An empty board with White to move and no castling rights. Used as the
    /// starting point for FEN parsing and tests; not a legal chess position
    /// on its own.
    #[must_use]
    pub fn empty() -> Self {
        Position {
            pieces: [[Bitboard::EMPTY; 6]; 2],
            occupancy: [Bitboard::EMPTY; 3],
            side_to_move: Color::White,
            en_passant: None,
            castling: CastlingRights::none(),
            halfmove_clock: 0,
            fullmove_number: 1,
            hash: 0,
            history: Vec::new(),
        }
    }

    /// The standard chess starting position.
    #[must_use]
    pub fn startpos() -> Self {
        Self::from_fen(START_POSITION_FEN).expect("startpos FEN is well-formed")
    }

    /// Parse a FEN-like placement string (see module `fen`).
    pub fn from_fen(fen: &str) -> Result<Self, FenError> {
        fen::parse(fen)
    }

    /// Format this position back into a FEN string.
    #[must_use]
    pub fn to_fen(&self) -> String {
        fen::format(self)
    }

    #[must_use]
    pub fn side_to_move(&self) -> Color {
        self.side_to_move
    }

    #[must_use]
    pub fn castling_rights(&self) -> CastlingRights {
        self.castling
    }

    #[must_use]
    pub fn en_passant_square(&self) -> Option<Square> {
        self.en_passant
    }

    #[must_use]
    pub fn hash(&self) -> u64 {
        self.hash
    }

    #[must_use]
    pub fn halfmove_clock(&self) -> u32 {
        self.halfmove_clock
    }

    #[must_use]
    pub fn fullmove_number(&self) -> u32 {
        self.fullmove_number
    }

    /// Clear repetition history. Called on `ucinewgame` and at the start of
    /// every root search, per the protocol contract in §6.
    pub fn clear_history(&mut self) {
        self.history.clear();
    }

    #[must_use]
    pub(crate) fn occupancy(&self, color: Color) -> Bitboard {
        self.occupancy[color.index()]
    }

    #[must_use]
    pub(crate) fn occupied(&self) -> Bitboard {
        self.occupancy[OCC_BOTH]
    }

    /// Bitboard of all `piece`s of `color`. Used by the evaluator and move
    /// ordering, which need per-kind occupancy rather than `piece_at`'s
    /// one-square-at-a-time lookup.
    #[must_use]
    pub fn piece_bitboard(&self, color: Color, piece: Piece) -> Bitboard {
        self.pieces[color.index()][piece.index()]
    }

    #[must_use]
    pub fn piece_at(&self, sq: Square) -> Option<(Color, Piece)> {
        if !self.occupancy[OCC_BOTH].contains(sq) {
            return None;
        }
        for &color in &[Color::White, Color::Black] {
            for piece in PIECE_KINDS {
                if self.pieces[color.index()][piece.index()].contains(sq) {
                    return Some((color, piece));
                }
            }
        }
        None
    }

    fn set_piece(&mut self, sq: Square, color: Color, piece: Piece) {
        self.pieces[color.index()][piece.index()] =
            self.pieces[color.index()][piece.index()].or(bit_for_square(sq));
        self.occupancy[color.index()] = self.occupancy[color.index()].or(bit_for_square(sq));
        self.occupancy[OCC_BOTH] = self.occupancy[OCC_BOTH].or(bit_for_square(sq));
    }

    fn clear_piece(&mut self, sq: Square, color: Color, piece: Piece) {
        let mask = bit_for_square(sq).not();
        self.pieces[color.index()][piece.index()] =
            self.pieces[color.index()][piece.index()].and(mask);
        self.occupancy[color.index()] = self.occupancy[color.index()].and(mask);
        self.occupancy[OCC_BOTH] = self.occupancy[OCC_BOTH].and(mask);
    }

    #[must_use]
    pub fn king_square(&self, color: Color) -> Option<Square> {
        let bb = self.pieces[color.index()][Piece::King.index()];
        if bb.is_empty() {
            None
        } else {
            Some(Square::from_index(bb.0.trailing_zeros() as usize))
        }
    }

    /// True if the side to move's king is attacked. Treated defensively: a
    /// missing king (an illegal position callers must not supply, per §7) is
    /// reported as "in check" rather than panicking.
    #[must_use]
    pub fn is_in_check(&self) -> bool {
        match self.king_square(self.side_to_move) {
            Some(sq) => self.is_square_attacked(sq, self.side_to_move.opponent()),
            None => true,
        }
    }

    /// True iff the current hash already appears earlier in this game's
    /// history (§9: comparing the full hash already accounts for side to
    /// move and castling rights, so no extra bookkeeping is required).
    #[must_use]
    pub fn is_repetition(&self) -> bool {
        self.history.iter().any(|&h| h == self.hash)
    }

    /// Apply `mv` to this position in place. There is no corresponding
    /// "unmake": the search clones the position before calling this, per the
    /// architecture mandated in the design notes.
    pub fn make_move(&mut self, mv: Move) {
        self.history.push(self.hash);

        let from = mv.from();
        let to = mv.to();
        let us = self.side_to_move;
        let them = us.opponent();

        let (_, piece) = self
            .piece_at(from)
            .expect("make_move called with no piece on the from-square");
        let captured = self.piece_at(to);

        // Reset or advance the halfmove clock before mutating the board
        // (pawn move or any capture resets it; §9 flags this as missing in
        // the source and explicitly required here for the 50-move rule).
        if piece == Piece::Pawn || captured.is_some() || mv.kind() == MoveKind::EnPassant {
            self.halfmove_clock = 0;
        } else {
            self.halfmove_clock += 1;
        }
        if us == Color::Black {
            self.fullmove_number += 1;
        }

        // Move the piece itself.
        self.clear_piece(from, us, piece);
        self.hash ^= ZOBRIST.piece(us, piece, from);

        if let Some((cap_color, cap_piece)) = captured {
            self.clear_piece(to, cap_color, cap_piece);
            self.hash ^= ZOBRIST.piece(cap_color, cap_piece, to);
        }

        match mv.kind() {
            MoveKind::Promotion => {
                let promoted = mv.promotion().unwrap_or(Piece::Queen);
                self.set_piece(to, us, promoted);
                self.hash ^= ZOBRIST.piece(us, promoted, to);
            }
            MoveKind::EnPassant => {
                self.set_piece(to, us, piece);
                self.hash ^= ZOBRIST.piece(us, piece, to);
                let captured_sq = ep_victim_square(to, us);
                self.clear_piece(captured_sq, them, Piece::Pawn);
                self.hash ^= ZOBRIST.piece(them, Piece::Pawn, captured_sq);
            }
            MoveKind::Castling => {
                self.set_piece(to, us, piece);
                self.hash ^= ZOBRIST.piece(us, piece, to);
                let (rook_from, rook_to) = castling_rook_squares(to, us);
                self.clear_piece(rook_from, us, Piece::Rook);
                self.hash ^= ZOBRIST.piece(us, Piece::Rook, rook_from);
                self.set_piece(rook_to, us, Piece::Rook);
                self.hash ^= ZOBRIST.piece(us, Piece::Rook, rook_to);
            }
            MoveKind::Normal => {
                self.set_piece(to, us, piece);
                self.hash ^= ZOBRIST.piece(us, piece, to);
            }
        }

        // Castling rights: clear bits touched by the move on either end.
        let old_castling = self.castling;
        let mut rights = self.castling;
        clear_rights_touching(&mut rights, from);
        clear_rights_touching(&mut rights, to);
        if old_castling != rights {
            self.hash ^= ZOBRIST.castling(old_castling);
            self.hash ^= ZOBRIST.castling(rights);
            self.castling = rights;
        }

        // En-passant target: clear the old one, set a new one only for a
        // pawn double push.
        if let Some(old_ep) = self.en_passant {
            self.hash ^= ZOBRIST.en_passant(old_ep);
        }
        self.en_passant = None;
        if piece == Piece::Pawn && from.as_index().abs_diff(to.as_index()) == 16 {
            let ep_sq = Square::from_index((from.as_index() + to.as_index()) / 2);
            self.en_passant = Some(ep_sq);
            self.hash ^= ZOBRIST.en_passant(ep_sq);
        }

        self.side_to_move = them;
        self.hash ^= ZOBRIST.side();
    }

    /// Apply a null move: flip the side to move without moving any piece.
    /// Returns the state needed to restore the position with
    /// [`Position::unmake_null_move`].
    pub fn make_null_move(&mut self) -> NullMoveUndo {
        let undo = NullMoveUndo {
            en_passant: self.en_passant,
            hash: self.hash,
        };
        if let Some(ep) = self.en_passant {
            self.hash ^= ZOBRIST.en_passant(ep);
        }
        self.en_passant = None;
        self.side_to_move = self.side_to_move.opponent();
        self.hash ^= ZOBRIST.side();
        undo
    }

    /// Reverse a previous [`Position::make_null_move`].
    pub fn unmake_null_move(&mut self, undo: NullMoveUndo) {
        self.side_to_move = self.side_to_move.opponent();
        self.en_passant = undo.en_passant;
        self.hash = undo.hash;
    }

    /// Parse a UCI move string (`e2e4`, `e7e8q`) against this position's
    /// legal moves, resolving castling / en-passant / promotion flags.
    pub fn parse_move(&mut self, text: &str) -> Result<Move, MoveParseError> {
        if text.len() < 4 || text.len() > 5 {
            return Err(MoveParseError::InvalidLength { len: text.len() });
        }
        let from: Square = text[0..2]
            .parse()
            .map_err(|_| MoveParseError::InvalidSquare { notation: text.to_string() })?;
        let to: Square = text[2..4]
            .parse()
            .map_err(|_| MoveParseError::InvalidSquare { notation: text.to_string() })?;
        let promotion = if text.len() == 5 {
            Some(Piece::from_char(text.as_bytes()[4] as char).ok_or_else(|| {
                MoveParseError::InvalidPromotion {
                    char: text.as_bytes()[4] as char,
                }
            })?)
        } else {
            None
        };

        let legal = self.generate_legal_moves();
        legal
            .iter()
            .copied()
            .find(|m| m.from() == from && m.to() == to && m.promotion() == promotion)
            .ok_or_else(|| MoveParseError::IllegalMove { notation: text.to_string() })
    }

    /// Render a move as UCI text (`e2e4`, `e7e8q`).
    #[must_use]
    pub fn format_move(mv: Move) -> String {
        mv.to_string()
    }

    /// All legal moves from this position (pseudo-legal generation followed
    /// by the king-safety filter in `movegen`).
    #[must_use]
    pub fn generate_legal_moves(&self) -> MoveList {
        movegen::generate_legal_moves(self)
    }

    /// Pseudo-legal moves only (used internally by search, which applies its
    /// own legality check after making each move).
    #[must_use]
    pub(crate) fn generate_pseudo_moves(&self) -> MoveList {
        movegen::generate_pseudo_moves(self)
    }

    /// Is `square` attacked by any piece of `by_color`, given the current
    /// occupancy? Implemented as a direct scan from `square`; does not call
    /// move generation (§4.4), so it is safe to use *during* move generation
    /// for castling legality.
    #[must_use]
    pub fn is_square_attacked(&self, square: Square, by_color: Color) -> bool {
        attacks::is_square_attacked(self, square, by_color)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_fen())
    }
}

const PIECE_KINDS: [Piece; 6] = [
    Piece::Pawn,
    Piece::Knight,
    Piece::Bishop,
    Piece::Rook,
    Piece::Queen,
    Piece::King,
];

#[inline]
fn ep_victim_square(ep_target: Square, mover: Color) -> Square {
    match mover {
        Color::White => Square::from_index(ep_target.as_index() - 8),
        Color::Black => Square::from_index(ep_target.as_index() + 8),
    }
}

#[inline]
fn castling_rook_squares(king_to: Square, color: Color) -> (Square, Square) {
    let rank = match color {
        Color::White => 0,
        Color::Black => 7,
    };
    if king_to.file() == 6 {
        // kingside: rook from h-file to f-file
        (Square::new(rank, 7), Square::new(rank, 5))
    } else {
        // queenside: rook from a-file to d-file
        (Square::new(rank, 0), Square::new(rank, 3))
    }
}

fn clear_rights_touching(rights: &mut CastlingRights, sq: Square) {
    match (sq.rank(), sq.file()) {
        (0, 4) => {
            rights.remove(Color::White, true);
            rights.remove(Color::White, false);
        }
        (7, 4) => {
            rights.remove(Color::Black, true);
            rights.remove(Color::Black, false);
        }
        (0, 0) => rights.remove(Color::White, false),
        (0, 7) => rights.remove(Color::White, true),
        (7, 0) => rights.remove(Color::Black, false),
        (7, 7) => rights.remove(Color::Black, true),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn startpos_hash_matches_recomputation() {
        let pos = Position::startpos();
        let recomputed = fen::parse(START_POSITION_FEN).unwrap();
        assert_eq!(pos.hash, recomputed.hash);
    }

    #[test]
    fn occupancy_invariant_holds_after_moves() {
        let mut pos = Position::startpos();
        for mv_text in ["e2e4", "e7e5", "g1f3", "b8c6"] {
            let mv = pos.parse_move(mv_text).unwrap();
            pos.make_move(mv);
            assert_eq!(
                pos.occupancy(Color::White).or(pos.occupancy(Color::Black)),
                pos.occupied()
            );
            assert!(pos.occupancy(Color::White).and(pos.occupancy(Color::Black)).is_empty());
        }
    }

    #[test]
    fn double_push_sets_en_passant_target() {
        let mut pos = Position::startpos();
        let mv = pos.parse_move("e2e4").unwrap();
        pos.make_move(mv);
        assert_eq!(pos.en_passant_square(), Some(Square::new(2, 4))); // e3
    }

    #[test]
    fn is_repetition_detects_revisited_hash() {
        let mut pos = Position::startpos();
        for mv_text in ["g1f3", "g8f6", "f3g1", "f6g8"] {
            let mv = pos.parse_move(mv_text).unwrap();
            pos.make_move(mv);
        }
        assert!(!pos.is_repetition());
        for mv_text in ["g1f3", "g8f6", "f3g1", "f6g8"] {
            let mv = pos.parse_move(mv_text).unwrap();
            pos.make_move(mv);
        }
        assert!(pos.is_repetition());
    }
}
