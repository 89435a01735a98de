// Bitboard masks, bit iteration and leaper attack tables.
//
// Squares are indexed 0-63 rank-major with A1 = 0, H8 = 63. Every table in
// the crate uses this mapping.

use std::sync::OnceLock;

use crate::board::Color;

// File masks (A is column 0, H column 7)
pub const FILE_A: u64 = 0x0101010101010101;
pub const FILE_H: u64 = 0x8080808080808080;

pub const NOT_FILE_A: u64 = !FILE_A;
pub const NOT_FILE_H: u64 = !FILE_H;

// Rank masks (A1 is square 0)
pub const RANK_1: u64 = 0x00000000000000FF;
pub const RANK_2: u64 = 0x000000000000FF00;
pub const RANK_7: u64 = 0x00FF000000000000;
pub const RANK_8: u64 = 0xFF00000000000000;

// Bit operations
#[inline]
pub fn pop_lsb(bb: &mut u64) -> Option<usize> {
    if *bb == 0 {
        return None;
    }
    let lsb = bb.trailing_zeros() as usize;
    *bb &= *bb - 1;
    Some(lsb)
}

#[inline]
pub fn count_bits(bb: u64) -> u32 {
    bb.count_ones()
}

pub struct BitIter {
    bb: u64,
}

impl Iterator for BitIter {
    type Item = usize;
    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        pop_lsb(&mut self.bb)
    }
}

#[inline]
pub fn iter_bits(bb: u64) -> BitIter {
    BitIter { bb }
}

// Precomputed leaper attack tables, filled once behind OnceLock.
static KNIGHT_ATTACKS: OnceLock<[u64; 64]> = OnceLock::new();
static KING_ATTACKS: OnceLock<[u64; 64]> = OnceLock::new();
static PAWN_ATTACKS: OnceLock<[[u64; 64]; 2]> = OnceLock::new();

fn build_delta_table(deltas: &[(i8, i8)]) -> [u64; 64] {
    let mut attacks = [0u64; 64];

    for sq in 0..64 {
        let file = (sq % 8) as i8;
        let rank = (sq / 8) as i8;
        let mut attack_mask = 0u64;

        for &(df, dr) in deltas {
            let new_file = file + df;
            let new_rank = rank + dr;
            if (0..8).contains(&new_file) && (0..8).contains(&new_rank) {
                attack_mask |= 1u64 << (new_rank * 8 + new_file);
            }
        }
        attacks[sq] = attack_mask;
    }
    attacks
}

fn init_knight_attacks() -> [u64; 64] {
    const KNIGHT_OFFSETS: [(i8, i8); 8] = [
        (-2, -1),
        (-2, 1),
        (-1, -2),
        (-1, 2),
        (1, -2),
        (1, 2),
        (2, -1),
        (2, 1),
    ];
    build_delta_table(&KNIGHT_OFFSETS)
}

fn init_king_attacks() -> [u64; 64] {
    const KING_OFFSETS: [(i8, i8); 8] = [
        (-1, -1),
        (-1, 0),
        (-1, 1),
        (0, -1),
        (0, 1),
        (1, -1),
        (1, 0),
        (1, 1),
    ];
    build_delta_table(&KING_OFFSETS)
}

// Capture squares only; pushes are handled by the pawn move generator since
// they depend on occupancy, not on a fixed offset set.
fn init_pawn_attacks() -> [[u64; 64]; 2] {
    let white = build_delta_table(&[(-1, 1), (1, 1)]);
    let black = build_delta_table(&[(-1, -1), (1, -1)]);
    [white, black]
}

#[inline(always)]
pub fn init_attack_tables() {
    KNIGHT_ATTACKS.get_or_init(init_knight_attacks);
    KING_ATTACKS.get_or_init(init_king_attacks);
    PAWN_ATTACKS.get_or_init(init_pawn_attacks);
}

#[inline]
pub fn knight_attacks(sq: usize) -> u64 {
    KNIGHT_ATTACKS.get_or_init(init_knight_attacks)[sq]
}

#[inline]
pub fn king_attacks(sq: usize) -> u64 {
    KING_ATTACKS.get_or_init(init_king_attacks)[sq]
}

/// Squares a pawn of `color` on `sq` attacks (captures only, not pushes).
#[inline]
pub fn pawn_attacks(color: Color, sq: usize) -> u64 {
    PAWN_ATTACKS.get_or_init(init_pawn_attacks)[color as usize][sq]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pop_lsb_drains_bits() {
        let mut bb = 0b1010_0001u64;
        assert_eq!(pop_lsb(&mut bb), Some(0));
        assert_eq!(pop_lsb(&mut bb), Some(5));
        assert_eq!(pop_lsb(&mut bb), Some(7));
        assert_eq!(pop_lsb(&mut bb), None);
    }

    #[test]
    fn test_knight_attacks_corner_and_center() {
        // a1: only b3 and c2
        assert_eq!(count_bits(knight_attacks(0)), 2);
        // d4: full 8-move wheel
        assert_eq!(count_bits(knight_attacks(27)), 8);
    }

    #[test]
    fn test_king_attacks_edge() {
        // e1: d1, f1, d2, e2, f2
        assert_eq!(count_bits(king_attacks(4)), 5);
        assert_eq!(count_bits(king_attacks(27)), 8);
    }

    #[test]
    fn test_pawn_attacks_respect_board_edges() {
        // White pawn on a2 attacks only b3
        assert_eq!(pawn_attacks(Color::White, 8), 1u64 << 17);
        // Black pawn on h7 attacks only g6
        assert_eq!(pawn_attacks(Color::Black, 55), 1u64 << 46);
        // White pawn on e2 attacks d3 and f3
        assert_eq!(pawn_attacks(Color::White, 12), (1u64 << 19) | (1u64 << 21));
    }
}
