//! Zobrist hashing for chess positions.
//!
//! Provides incrementally-updatable 64-bit position hashes used by the
//! transposition table and repetition detection. Keys are generated once at
//! startup by a small deterministic xorshift generator rather than pulled
//! from a general-purpose RNG crate, so that a given build always produces
//! the same keys and the same search is reproducible across runs.

use once_cell::sync::Lazy;

use crate::types::{CastlingRights, Color, Piece, Square};

/// Deterministic xorshift64* generator, seeded once and iterated to fill the
/// key tables below. Not used anywhere else; cryptographic quality is not a
/// requirement, only a low collision rate across ~2^16 keys.
struct XorShift64(u64);

impl XorShift64 {
    fn next(&mut self) -> u64 {
        let mut x = self.0;
        x ^= x >> 12;
        x ^= x << 25;
        x ^= x >> 27;
        self.0 = x;
        x.wrapping_mul(0x2545_F491_4F6C_DD1D)
    }
}

/// Combined (color, piece) index into `piece_keys`, in the order
/// {WP, WN, WB, WR, WQ, WK, BP, BN, BB, BR, BQ, BK}.
#[inline]
pub(crate) const fn piece_key_index(color: Color, piece: Piece) -> usize {
    color.zobrist_offset() + piece.index()
}

pub(crate) struct ZobristKeys {
    pub(crate) piece_keys: [[u64; 64]; 12],
    pub(crate) en_passant_keys: [u64; 64],
    pub(crate) castle_keys: [u64; 16],
    pub(crate) side_key: u64,
}

impl ZobristKeys {
    // Fixed seed: the exact values are arbitrary, but must not change between
    // builds, or transposition tables and test fixtures built against one
    // binary would silently mismatch another.
    const SEED: u64 = 0x9E37_79B9_7F4A_7C15;

    fn new() -> Self {
        let mut rng = XorShift64(Self::SEED);
        let mut piece_keys = [[0u64; 64]; 12];
        for kind in &mut piece_keys {
            for key in kind.iter_mut() {
                *key = rng.next();
            }
        }

        let mut en_passant_keys = [0u64; 64];
        for key in en_passant_keys.iter_mut() {
            *key = rng.next();
        }

        let mut castle_keys = [0u64; 16];
        for key in castle_keys.iter_mut() {
            *key = rng.next();
        }

        let side_key = rng.next();

        ZobristKeys {
            piece_keys,
            en_passant_keys,
            castle_keys,
            side_key,
        }
    }

    #[inline]
    pub(crate) fn piece(&self, color: Color, piece: Piece, sq: Square) -> u64 {
        self.piece_keys[piece_key_index(color, piece)][sq.as_index()]
    }

    #[inline]
    pub(crate) fn en_passant(&self, sq: Square) -> u64 {
        self.en_passant_keys[sq.as_index()]
    }

    #[inline]
    pub(crate) fn castling(&self, rights: CastlingRights) -> u64 {
        self.castle_keys[rights.as_u8() as usize]
    }

    #[inline]
    pub(crate) fn side(&self) -> u64 {
        self.side_key
    }
}

pub(crate) static ZOBRIST: Lazy<ZobristKeys> = Lazy::new(ZobristKeys::new);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_are_reproducible_across_instances() {
        let a = ZobristKeys::new();
        let b = ZobristKeys::new();
        assert_eq!(a.piece_keys, b.piece_keys);
        assert_eq!(a.side_key, b.side_key);
        assert_eq!(a.castle_keys, b.castle_keys);
    }

    #[test]
    fn piece_keys_are_pairwise_distinct() {
        let keys = ZobristKeys::new();
        let mut seen = std::collections::HashSet::new();
        for kind in &keys.piece_keys {
            for &k in kind {
                assert!(seen.insert(k), "duplicate zobrist key generated");
            }
        }
    }
}
