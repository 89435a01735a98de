// Zobrist hashing with precomputed key tables.
//
// The board maintains its hash incrementally during make/unmake;
// `recalc_full` is the from-scratch reference used at FEN setup and by the
// consistency tests. Keys come from a fixed-seed RNG so hashes are stable
// across runs.

use std::sync::OnceLock;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::board::{Board, Color, PieceKind};
use crate::utils::pop_lsb;

const KEY_SEED: u64 = 0xA1F1_E4E5_D2D4_C7C5;

pub struct ZobristKeys {
    /// One key per (piece, color, square); index = color * 6 + kind.
    pub piece: [[u64; 64]; 12],
    /// One key present iff Black is to move.
    pub side: u64,
    /// One key per castling-rights combination (KQkq bits).
    pub castling: [u64; 16],
    /// One key per en-passant file.
    pub ep_file: [u64; 8],
}

static KEYS: OnceLock<ZobristKeys> = OnceLock::new();

impl ZobristKeys {
    fn new() -> Self {
        let mut rng = StdRng::seed_from_u64(KEY_SEED);
        let mut piece = [[0u64; 64]; 12];
        for row in piece.iter_mut() {
            for key in row.iter_mut() {
                *key = rng.random();
            }
        }
        let side = rng.random();
        let mut castling = [0u64; 16];
        for key in castling.iter_mut() {
            *key = rng.random();
        }
        let mut ep_file = [0u64; 8];
        for key in ep_file.iter_mut() {
            *key = rng.random();
        }
        Self {
            piece,
            side,
            castling,
            ep_file,
        }
    }
}

#[inline(always)]
pub fn init_zobrist() {
    KEYS.get_or_init(ZobristKeys::new);
}

#[inline]
pub fn keys() -> &'static ZobristKeys {
    KEYS.get_or_init(ZobristKeys::new)
}

fn piece_index(kind: PieceKind, color: Color) -> usize {
    (color as usize) * 6 + (kind as usize)
}

/// From-scratch hash of the current position.
pub fn recalc_full(board: &Board) -> u64 {
    let k = keys();
    let mut h = 0u64;

    for kind in PieceKind::ALL {
        for color in [Color::White, Color::Black] {
            let mut bb = board.piece_bb(kind, color);
            while let Some(sq) = pop_lsb(&mut bb) {
                h ^= k.piece[piece_index(kind, color)][sq];
            }
        }
    }
    if board.side == Color::Black {
        h ^= k.side;
    }
    h ^= k.castling[board.castling as usize];
    if let Some(ep_sq) = board.ep {
        h ^= k.ep_file[(ep_sq % 8) as usize];
    }
    h
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::START_FEN;

    #[test]
    fn test_keys_are_deterministic_and_distinct() {
        let k = keys();
        assert_ne!(k.piece[0][0], k.piece[0][1]);
        assert_ne!(k.side, 0);
        // Same OnceLock instance on repeated access
        assert_eq!(k.side, keys().side);
    }

    #[test]
    fn test_recalc_differs_by_side_to_move() {
        crate::init();
        let mut board = Board::new();
        board.set_from_fen(START_FEN).unwrap();
        let white_hash = recalc_full(&board);
        board
            .set_from_fen("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR b KQkq - 0 1")
            .unwrap();
        assert_eq!(white_hash ^ keys().side, recalc_full(&board));
    }
}
