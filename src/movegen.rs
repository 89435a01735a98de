//! Two-phase move generation.
//!
//! Phase 1 builds every pseudolegal move for the side to move (king
//! destinations are pre-filtered against the enemy attack set, castling
//! checks path emptiness and safety). Phase 2 filters the list with
//! try-then-revert: apply the move, recompute the enemy attack bitboard, and
//! drop the move if the mover's own king is attacked.

use crate::board::{
    move_flag, new_move, Board, Color, Move, PieceKind, CASTLE_BK, CASTLE_BQ, CASTLE_WK,
    CASTLE_WQ, FLAG_CAPTURE, FLAG_CASTLE_KING, FLAG_CASTLE_QUEEN, FLAG_DOUBLE_PUSH,
    FLAG_EN_PASSANT, FLAG_NONE, FLAG_PROMOTION,
};
use crate::magic;
use crate::utils::{
    iter_bits, king_attacks, knight_attacks, pawn_attacks, NOT_FILE_A, NOT_FILE_H, RANK_1,
    RANK_2, RANK_7, RANK_8,
};

/// Upper bound on moves in any chess position (the known maximum is 218).
pub const MAX_MOVES: usize = 256;

/// Fixed-capacity move buffer. Filtering removes by swap-with-last, so the
/// order of surviving moves is not preserved and callers must not rely on it.
pub struct MoveList {
    moves: [Move; MAX_MOVES],
    len: usize,
}

impl MoveList {
    pub fn new() -> Self {
        Self {
            moves: [0; MAX_MOVES],
            len: 0,
        }
    }

    #[inline]
    pub fn push(&mut self, mv: Move) {
        debug_assert!(self.len < MAX_MOVES);
        self.moves[self.len] = mv;
        self.len += 1;
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// O(1) removal; the last element takes the removed slot.
    #[inline]
    pub fn swap_remove(&mut self, idx: usize) -> Move {
        debug_assert!(idx < self.len);
        let mv = self.moves[idx];
        self.len -= 1;
        self.moves[idx] = self.moves[self.len];
        mv
    }

    pub fn iter(&self) -> impl Iterator<Item = Move> + '_ {
        self.moves[..self.len].iter().copied()
    }

    pub fn as_slice(&self) -> &[Move] {
        &self.moves[..self.len]
    }

    /// Order-independent containment, for test comparisons.
    pub fn contains(&self, mv: Move) -> bool {
        self.as_slice().contains(&mv)
    }
}

impl Default for MoveList {
    fn default() -> Self {
        Self::new()
    }
}

impl std::ops::Index<usize> for MoveList {
    type Output = Move;
    fn index(&self, idx: usize) -> &Move {
        &self.moves[..self.len][idx]
    }
}

// ============================================================================
// ATTACK SET GENERATION
// ============================================================================

/// Union of every square attacked by `color`'s pieces against the current
/// occupancy. This is the check-detection primitive: a king standing on any
/// of these squares is attacked.
pub fn attacks(board: &Board, color: Color) -> u64 {
    let occ = board.occ;
    let mut att = 0u64;

    let pawns = board.piece_bb(PieceKind::Pawn, color);
    att |= match color {
        Color::White => ((pawns & NOT_FILE_A) << 7) | ((pawns & NOT_FILE_H) << 9),
        Color::Black => ((pawns & NOT_FILE_A) >> 9) | ((pawns & NOT_FILE_H) >> 7),
    };

    for sq in iter_bits(board.piece_bb(PieceKind::Knight, color)) {
        att |= knight_attacks(sq);
    }
    for sq in iter_bits(board.piece_bb(PieceKind::King, color)) {
        att |= king_attacks(sq);
    }
    for sq in iter_bits(board.piece_bb(PieceKind::Bishop, color)) {
        att |= magic::bishop_attacks(sq, occ);
    }
    for sq in iter_bits(board.piece_bb(PieceKind::Rook, color)) {
        att |= magic::rook_attacks(sq, occ);
    }
    for sq in iter_bits(board.piece_bb(PieceKind::Queen, color)) {
        att |= magic::queen_attacks(sq, occ);
    }
    att
}

/// Whether `color`'s king stands inside a precomputed enemy attack set.
/// A missing king (degenerate test positions) is never in check.
#[inline]
pub fn is_check(board: &Board, color: Color, enemy_attacks: u64) -> bool {
    board.piece_bb(PieceKind::King, color) & enemy_attacks != 0
}

/// Convenience form that recomputes the enemy attack set.
pub fn in_check(board: &Board, color: Color) -> bool {
    is_check(board, color, attacks(board, color.opponent()))
}

// ============================================================================
// PHASE 1 - PSEUDOLEGAL GENERATION
// ============================================================================

/// Appends every pseudolegal move for the side to move. A position without a
/// king for that side yields no moves instead of failing.
pub fn pseudolegal_moves(board: &Board, list: &mut MoveList) {
    let side = board.side;
    if board.piece_bb(PieceKind::King, side) == 0 {
        return;
    }

    // Needed up front: king moves and castling filter against it.
    let enemy_attacks = attacks(board, side.opponent());

    pawn_moves(board, side, list);
    knight_moves(board, side, list);
    king_moves(board, side, enemy_attacks, list);
    slider_moves(board, side, PieceKind::Bishop, list);
    slider_moves(board, side, PieceKind::Rook, list);
    slider_moves(board, side, PieceKind::Queen, list);
}

fn pawn_moves(board: &Board, side: Color, list: &mut MoveList) {
    let pawns = board.piece_bb(PieceKind::Pawn, side);
    let enemy_occ = board.occupancy(side.opponent());
    let (promo_rank, start_rank) = match side {
        Color::White => (RANK_8, RANK_2),
        Color::Black => (RANK_1, RANK_7),
    };
    let ep_bb = board.ep.map_or(0u64, |sq| 1u64 << sq);

    for from in iter_bits(pawns) {
        // Pushes. A pawn on its own promotion rank (malformed position) has
        // nowhere to push.
        let push_to = match side {
            Color::White if from < 56 => Some(from + 8),
            Color::Black if from >= 8 => Some(from - 8),
            _ => None,
        };
        if let Some(to) = push_to {
            if !board.is_occupied(to) {
                if (1u64 << to) & promo_rank != 0 {
                    push_promotions(list, from, to, None);
                } else {
                    list.push(new_move(from, to, PieceKind::Pawn, None, None, FLAG_NONE));
                    if (1u64 << from) & start_rank != 0 {
                        let to2 = match side {
                            Color::White => from + 16,
                            Color::Black => from - 16,
                        };
                        if !board.is_occupied(to2) {
                            list.push(new_move(
                                from,
                                to2,
                                PieceKind::Pawn,
                                None,
                                None,
                                FLAG_DOUBLE_PUSH,
                            ));
                        }
                    }
                }
            }
        }

        // Captures, including capture-promotions
        let att = pawn_attacks(side, from);
        for to in iter_bits(att & enemy_occ) {
            let captured = board.piece_on(to).map(|(kind, _)| kind);
            if (1u64 << to) & promo_rank != 0 {
                push_promotions(list, from, to, captured);
            } else {
                list.push(new_move(
                    from,
                    to,
                    PieceKind::Pawn,
                    captured,
                    None,
                    FLAG_CAPTURE,
                ));
            }
        }

        // En passant: the target square itself is empty, the victim is not
        if att & ep_bb != 0 {
            let to = (att & ep_bb).trailing_zeros() as usize;
            list.push(new_move(
                from,
                to,
                PieceKind::Pawn,
                Some(PieceKind::Pawn),
                None,
                FLAG_EN_PASSANT | FLAG_CAPTURE,
            ));
        }
    }
}

fn push_promotions(list: &mut MoveList, from: usize, to: usize, captured: Option<PieceKind>) {
    let flags = if captured.is_some() {
        FLAG_PROMOTION | FLAG_CAPTURE
    } else {
        FLAG_PROMOTION
    };
    for kind in [
        PieceKind::Queen,
        PieceKind::Rook,
        PieceKind::Bishop,
        PieceKind::Knight,
    ] {
        list.push(new_move(from, to, PieceKind::Pawn, captured, Some(kind), flags));
    }
}

fn knight_moves(board: &Board, side: Color, list: &mut MoveList) {
    let own_occ = board.occupancy(side);
    for from in iter_bits(board.piece_bb(PieceKind::Knight, side)) {
        let att = knight_attacks(from) & !own_occ;
        push_targets(board, side, PieceKind::Knight, from, att, list);
    }
}

fn king_moves(board: &Board, side: Color, enemy_attacks: u64, list: &mut MoveList) {
    let own_occ = board.occupancy(side);
    for from in iter_bits(board.piece_bb(PieceKind::King, side)) {
        // Eagerly drop destinations inside the enemy attack set; stepping
        // away along an attacker's ray is caught by the legality filter.
        let att = king_attacks(from) & !own_occ & !enemy_attacks;
        push_targets(board, side, PieceKind::King, from, att, list);
    }
    castling_moves(board, side, enemy_attacks, list);
}

fn castling_moves(board: &Board, side: Color, enemy_attacks: u64, list: &mut MoveList) {
    let (ks_right, qs_right, base) = match side {
        Color::White => (CASTLE_WK, CASTLE_WQ, 0usize),
        Color::Black => (CASTLE_BK, CASTLE_BQ, 56usize),
    };
    let king_home = base + 4;
    if board.piece_bb(PieceKind::King, side) & (1u64 << king_home) == 0 {
        return;
    }

    // Kingside: f and g files empty, e-f-g never attacked, rook at home
    if board.castling & ks_right != 0 {
        let rook_home = base + 7;
        let empty_mask = (1u64 << (base + 5)) | (1u64 << (base + 6));
        let path_mask = (1u64 << king_home) | empty_mask;
        if board.occ & empty_mask == 0
            && enemy_attacks & path_mask == 0
            && board.piece_bb(PieceKind::Rook, side) & (1u64 << rook_home) != 0
        {
            list.push(new_move(
                king_home,
                base + 6,
                PieceKind::King,
                None,
                None,
                FLAG_CASTLE_KING,
            ));
        }
    }

    // Queenside: b, c and d files empty, e-d-c never attacked (b may be)
    if board.castling & qs_right != 0 {
        let rook_home = base;
        let empty_mask = (1u64 << (base + 1)) | (1u64 << (base + 2)) | (1u64 << (base + 3));
        let path_mask = (1u64 << king_home) | (1u64 << (base + 3)) | (1u64 << (base + 2));
        if board.occ & empty_mask == 0
            && enemy_attacks & path_mask == 0
            && board.piece_bb(PieceKind::Rook, side) & (1u64 << rook_home) != 0
        {
            list.push(new_move(
                king_home,
                base + 2,
                PieceKind::King,
                None,
                None,
                FLAG_CASTLE_QUEEN,
            ));
        }
    }
}

fn slider_moves(board: &Board, side: Color, kind: PieceKind, list: &mut MoveList) {
    let lookup: fn(usize, u64) -> u64 = match kind {
        PieceKind::Bishop => magic::bishop_attacks,
        PieceKind::Rook => magic::rook_attacks,
        PieceKind::Queen => magic::queen_attacks,
        _ => unreachable!("not a slider"),
    };
    let own_occ = board.occupancy(side);
    for from in iter_bits(board.piece_bb(kind, side)) {
        let att = lookup(from, board.occ) & !own_occ;
        push_targets(board, side, kind, from, att, list);
    }
}

/// Appends a move per target square, tagging captures with the victim kind.
fn push_targets(
    board: &Board,
    side: Color,
    piece: PieceKind,
    from: usize,
    targets: u64,
    list: &mut MoveList,
) {
    let enemy_occ = board.occupancy(side.opponent());
    for to in iter_bits(targets) {
        if enemy_occ & (1u64 << to) != 0 {
            let captured = board.piece_on(to).map(|(kind, _)| kind);
            list.push(new_move(from, to, piece, captured, None, FLAG_CAPTURE));
        } else {
            list.push(new_move(from, to, piece, None, None, FLAG_NONE));
        }
    }
}

// ============================================================================
// PHASE 2 - LEGALITY FILTERING
// ============================================================================

/// Every strictly legal move for the side to move. Pseudolegal moves are
/// vetted by applying them, recomputing the enemy attack set and rejecting
/// any move that leaves the mover's own king attacked; the trial application
/// is always reverted.
pub fn legal_moves(board: &mut Board) -> MoveList {
    let mut list = MoveList::new();
    pseudolegal_moves(board, &mut list);

    let mover = board.side;
    let mut i = 0;
    while i < list.len() {
        let mv = list[i];
        board.make_move(mv);
        let enemy_attacks = attacks(board, mover.opponent());
        let illegal = is_check(board, mover, enemy_attacks);
        board.unmake_move(mv);
        if illegal {
            list.swap_remove(i);
        } else {
            i += 1;
        }
    }
    list
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{move_to_uci, FLAG_NONE};

    #[test]
    fn test_move_list_push_and_swap_remove() {
        let mut list = MoveList::new();
        let a = new_move(0, 1, PieceKind::Rook, None, None, FLAG_NONE);
        let b = new_move(0, 2, PieceKind::Rook, None, None, FLAG_NONE);
        let c = new_move(0, 3, PieceKind::Rook, None, None, FLAG_NONE);
        list.push(a);
        list.push(b);
        list.push(c);
        assert_eq!(list.len(), 3);
        assert_eq!(list.swap_remove(0), a);
        assert_eq!(list.len(), 2);
        assert_eq!(list[0], c); // last element took the vacated slot
        assert!(list.contains(b));
        assert!(!list.contains(a));
    }

    #[test]
    fn test_startpos_has_twenty_moves() {
        crate::init();
        let mut board = Board::new();
        board.set_startpos();
        let moves = legal_moves(&mut board);
        assert_eq!(moves.len(), 20);
    }

    #[test]
    fn test_no_king_yields_no_moves() {
        crate::init();
        let mut board = Board::new();
        board.set_from_fen("8/8/8/3r4/8/8/8/4K3 b - - 0 1").unwrap();
        let moves = legal_moves(&mut board);
        assert_eq!(moves.len(), 0, "kingless side must generate zero moves");
    }

    #[test]
    fn test_king_cannot_step_along_checking_ray() {
        crate::init();
        // Rook on e8 checks the king on e4; e3 stays on the ray and is
        // illegal even though the pre-move attack set does not cover it.
        let mut board = Board::new();
        board.set_from_fen("4r3/8/8/8/4K3/8/8/8 w - - 0 1").unwrap();
        let moves = legal_moves(&mut board);
        for mv in moves.iter() {
            assert_ne!(move_to_uci(mv), "e4e3", "king fled along the rook ray");
        }
    }
}
