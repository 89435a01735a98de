// Board model: piece bitboards, castling/en-passant state, make/unmake with
// incremental Zobrist maintenance, and FEN setup.
//
// Square mapping: A1 = 0, B1 = 1, ..., H8 = 63, consistent with every attack
// table in the crate.

use crate::zobrist;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Color {
    White = 0,
    Black = 1,
}

impl Color {
    #[inline]
    pub fn opponent(self) -> Color {
        match self {
            Color::White => Color::Black,
            Color::Black => Color::White,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PieceKind {
    Pawn = 0,
    Knight = 1,
    Bishop = 2,
    Rook = 3,
    Queen = 4,
    King = 5,
}

impl PieceKind {
    pub const ALL: [PieceKind; 6] = [
        PieceKind::Pawn,
        PieceKind::Knight,
        PieceKind::Bishop,
        PieceKind::Rook,
        PieceKind::Queen,
        PieceKind::King,
    ];

    fn from_nibble(v: u32) -> PieceKind {
        match v {
            0 => PieceKind::Pawn,
            1 => PieceKind::Knight,
            2 => PieceKind::Bishop,
            3 => PieceKind::Rook,
            4 => PieceKind::Queen,
            5 => PieceKind::King,
            _ => unreachable!("invalid piece nibble in move encoding"),
        }
    }
}

// Index into the piece_bb array: white = kind, black = 6 + kind
fn piece_index(kind: PieceKind, color: Color) -> usize {
    (color as usize) * 6 + (kind as usize)
}

pub type Move = u32;

// Move layout, 32 bits:
// Bits 0-5: from (0-63)
// Bits 6-11: to (0-63)
// Bits 12-15: moving piece (0-5)
// Bits 16-19: captured piece (0-5, 0xF = none)
// Bits 20-23: promotion piece (0-5, 0xF = none)
// Bits 24-29: flags
pub const FLAG_NONE: u32 = 0;
pub const FLAG_EN_PASSANT: u32 = 1 << 24;
pub const FLAG_CASTLE_KING: u32 = 1 << 25;
pub const FLAG_CASTLE_QUEEN: u32 = 1 << 26;
pub const FLAG_PROMOTION: u32 = 1 << 27;
pub const FLAG_CAPTURE: u32 = 1 << 28;
pub const FLAG_DOUBLE_PUSH: u32 = 1 << 29;

pub fn new_move(
    from: usize,
    to: usize,
    piece: PieceKind,
    captured: Option<PieceKind>,
    promotion: Option<PieceKind>,
    flags: u32,
) -> Move {
    let cap = captured.map(|p| p as u32).unwrap_or(0xF);
    let prom = promotion.map(|p| p as u32).unwrap_or(0xF);
    (from as u32 & 0x3F)
        | ((to as u32 & 0x3F) << 6)
        | ((piece as u32 & 0xF) << 12)
        | ((cap & 0xF) << 16)
        | ((prom & 0xF) << 20)
        | flags
}

pub fn move_from_sq(m: Move) -> usize {
    (m & 0x3F) as usize
}

pub fn move_to_sq(m: Move) -> usize {
    ((m >> 6) & 0x3F) as usize
}

pub fn move_piece(m: Move) -> PieceKind {
    PieceKind::from_nibble((m >> 12) & 0xF)
}

pub fn move_captured(m: Move) -> Option<PieceKind> {
    let v = (m >> 16) & 0xF;
    if v == 0xF {
        None
    } else {
        Some(PieceKind::from_nibble(v))
    }
}

pub fn move_promotion(m: Move) -> Option<PieceKind> {
    let v = (m >> 20) & 0xF;
    if v == 0xF {
        None
    } else {
        Some(PieceKind::from_nibble(v))
    }
}

pub fn move_flag(m: Move, flag: u32) -> bool {
    (m & flag) != 0
}

/// Square index to coordinate notation ("a1".."h8")
fn square_to_uci(sq: usize) -> String {
    let file_char = (b'a' + (sq % 8) as u8) as char;
    let rank_char = (b'1' + (sq / 8) as u8) as char;
    format!("{}{}", file_char, rank_char)
}

/// Long algebraic notation, e.g. "e2e4" or "e7e8q"
pub fn move_to_uci(m: Move) -> String {
    let mut uci = format!(
        "{}{}",
        square_to_uci(move_from_sq(m)),
        square_to_uci(move_to_sq(m))
    );
    if let Some(promo) = move_promotion(m) {
        uci.push(match promo {
            PieceKind::Knight => 'n',
            PieceKind::Bishop => 'b',
            PieceKind::Rook => 'r',
            _ => 'q',
        });
    }
    uci
}

/// Everything needed to reverse one make_move exactly.
#[derive(Debug, Clone, Copy)]
struct Undo {
    mv: Move,
    captured_sq: Option<usize>,
    prev_castling: u8,
    prev_ep: Option<u8>,
    prev_halfmove: u16,
    prev_fullmove: u16,
    prev_zobrist: u64,
}

// Castling rights bits: 3=K, 2=Q, 1=k, 0=q
pub const CASTLE_WK: u8 = 0b1000;
pub const CASTLE_WQ: u8 = 0b0100;
pub const CASTLE_BK: u8 = 0b0010;
pub const CASTLE_BQ: u8 = 0b0001;

#[derive(Clone)]
pub struct Board {
    // 12 bitboards: 0-5 = white p,n,b,r,q,k; 6-11 = black p,n,b,r,q,k
    piece_bb: [u64; 12],
    pub white_occ: u64,
    pub black_occ: u64,
    pub occ: u64,
    pub side: Color,
    pub castling: u8,
    pub ep: Option<u8>, // en-passant target square or None
    pub halfmove: u16,
    pub fullmove: u16,
    pub zobrist: u64,
    undo_stack: Vec<Undo>,
}

pub const START_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

impl Board {
    /// Empty board; populate via `set_from_fen` / `set_startpos`.
    pub fn new() -> Self {
        Self {
            piece_bb: [0; 12],
            white_occ: 0,
            black_occ: 0,
            occ: 0,
            side: Color::White,
            castling: 0,
            ep: None,
            halfmove: 0,
            fullmove: 1,
            zobrist: 0,
            undo_stack: Vec::with_capacity(128),
        }
    }

    pub fn piece_bb(&self, kind: PieceKind, color: Color) -> u64 {
        self.piece_bb[piece_index(kind, color)]
    }

    /// Piece (kind, color) on square `sq`, or None
    pub fn piece_on(&self, sq: usize) -> Option<(PieceKind, Color)> {
        let mask = 1u64 << sq;
        if self.occ & mask == 0 {
            return None;
        }
        let color = if self.white_occ & mask != 0 {
            Color::White
        } else {
            Color::Black
        };
        for kind in PieceKind::ALL {
            if self.piece_bb[piece_index(kind, color)] & mask != 0 {
                return Some((kind, color));
            }
        }
        None
    }

    pub fn occupancy(&self, color: Color) -> u64 {
        match color {
            Color::White => self.white_occ,
            Color::Black => self.black_occ,
        }
    }

    fn set_piece(&mut self, sq: usize, kind: PieceKind, color: Color) {
        self.piece_bb[piece_index(kind, color)] |= 1u64 << sq;
    }

    fn remove_piece(&mut self, sq: usize, kind: PieceKind, color: Color) {
        self.piece_bb[piece_index(kind, color)] &= !(1u64 << sq);
    }

    fn refresh_occupancy(&mut self) {
        self.white_occ = 0;
        self.black_occ = 0;
        for i in 0..6 {
            self.white_occ |= self.piece_bb[i];
        }
        for i in 6..12 {
            self.black_occ |= self.piece_bb[i];
        }
        self.occ = self.white_occ | self.black_occ;
    }

    pub fn is_occupied(&self, sq: usize) -> bool {
        (1u64 << sq) & self.occ != 0
    }

    // Make / unmake ----------------------------------------------------------

    /// Applies `mv` for the side to move and pushes an undo record. The move
    /// must be one produced by the generator for this position.
    pub fn make_move(&mut self, mv: Move) {
        let from = move_from_sq(mv);
        let to = move_to_sq(mv);
        let piece = move_piece(mv);
        let captured = move_captured(mv);
        let color = self.side;
        let enemy = color.opponent();

        debug_assert!(self.piece_bb(piece, color) & (1u64 << from) != 0);

        // The en-passant victim sits behind the arrival square.
        let captured_sq = if move_flag(mv, FLAG_EN_PASSANT) {
            Some(if color == Color::White { to - 8 } else { to + 8 })
        } else if captured.is_some() {
            Some(to)
        } else {
            None
        };

        self.undo_stack.push(Undo {
            mv,
            captured_sq,
            prev_castling: self.castling,
            prev_ep: self.ep,
            prev_halfmove: self.halfmove,
            prev_fullmove: self.fullmove,
            prev_zobrist: self.zobrist,
        });

        let k = zobrist::keys();
        let landed = move_promotion(mv).unwrap_or(piece);

        // Hash: mover leaves origin, lands (possibly promoted), victim removed
        self.zobrist ^= k.piece[piece_index(piece, color)][from];
        self.zobrist ^= k.piece[piece_index(landed, color)][to];
        if let (Some(capt), Some(cap_sq)) = (captured, captured_sq) {
            self.zobrist ^= k.piece[piece_index(capt, enemy)][cap_sq];
        }
        self.zobrist ^= k.side;

        // Castling rights: own king/rook moves, and rook captures on the
        // opponent's home squares
        let old_castling = self.castling;
        self.update_castling_after_move(color, piece, from);
        if captured == Some(PieceKind::Rook) {
            self.update_castling_on_rook_capture(to);
        }
        if old_castling != self.castling {
            self.zobrist ^= k.castling[old_castling as usize];
            self.zobrist ^= k.castling[self.castling as usize];
        }

        // En-passant file toggle
        if let Some(ep_sq) = self.ep {
            self.zobrist ^= k.ep_file[(ep_sq % 8) as usize];
        }
        let new_ep = if move_flag(mv, FLAG_DOUBLE_PUSH) {
            Some(((from + to) / 2) as u8)
        } else {
            None
        };
        if let Some(ep_sq) = new_ep {
            self.zobrist ^= k.ep_file[(ep_sq % 8) as usize];
        }

        // Piece placement
        self.remove_piece(from, piece, color);
        if let (Some(capt), Some(cap_sq)) = (captured, captured_sq) {
            self.remove_piece(cap_sq, capt, enemy);
        }
        self.set_piece(to, landed, color);

        // Castling relocates the rook as well
        if move_flag(mv, FLAG_CASTLE_KING | FLAG_CASTLE_QUEEN) {
            let (rook_from, rook_to) = castle_rook_squares(mv, color);
            self.remove_piece(rook_from, PieceKind::Rook, color);
            self.set_piece(rook_to, PieceKind::Rook, color);
            self.zobrist ^= k.piece[piece_index(PieceKind::Rook, color)][rook_from];
            self.zobrist ^= k.piece[piece_index(PieceKind::Rook, color)][rook_to];
        }

        self.refresh_occupancy();
        self.ep = new_ep;

        self.halfmove += 1;
        if piece == PieceKind::Pawn || captured.is_some() {
            self.halfmove = 0;
        }
        self.side = enemy;
        if self.side == Color::White {
            self.fullmove += 1;
        }
    }

    /// Reverses the most recently applied move. Calling this with anything
    /// other than that move is a precondition violation.
    pub fn unmake_move(&mut self, mv: Move) {
        let undo = self
            .undo_stack
            .pop()
            .expect("unmake_move called without a matching make_move");
        debug_assert_eq!(
            undo.mv, mv,
            "unmake_move must receive the most recently applied move"
        );

        let color = self.side.opponent(); // the side that made the move
        self.side = color;
        self.castling = undo.prev_castling;
        self.ep = undo.prev_ep;
        self.halfmove = undo.prev_halfmove;
        self.fullmove = undo.prev_fullmove;

        let from = move_from_sq(mv);
        let to = move_to_sq(mv);
        let piece = move_piece(mv);
        let landed = move_promotion(mv).unwrap_or(piece);

        self.remove_piece(to, landed, color);
        self.set_piece(from, piece, color);

        if let (Some(capt), Some(cap_sq)) = (move_captured(mv), undo.captured_sq) {
            self.set_piece(cap_sq, capt, color.opponent());
        }

        if move_flag(mv, FLAG_CASTLE_KING | FLAG_CASTLE_QUEEN) {
            let (rook_from, rook_to) = castle_rook_squares(mv, color);
            self.remove_piece(rook_to, PieceKind::Rook, color);
            self.set_piece(rook_from, PieceKind::Rook, color);
        }

        self.refresh_occupancy();
        self.zobrist = undo.prev_zobrist;
    }

    fn update_castling_after_move(&mut self, side: Color, piece: PieceKind, from: usize) {
        if piece == PieceKind::King {
            match side {
                Color::White => self.castling &= !(CASTLE_WK | CASTLE_WQ),
                Color::Black => self.castling &= !(CASTLE_BK | CASTLE_BQ),
            }
        }
        if piece == PieceKind::Rook {
            match from {
                7 => self.castling &= !CASTLE_WK,  // h1
                0 => self.castling &= !CASTLE_WQ,  // a1
                63 => self.castling &= !CASTLE_BK, // h8
                56 => self.castling &= !CASTLE_BQ, // a8
                _ => {}
            }
        }
    }

    fn update_castling_on_rook_capture(&mut self, captured_sq: usize) {
        match captured_sq {
            7 => self.castling &= !CASTLE_WK,
            0 => self.castling &= !CASTLE_WQ,
            63 => self.castling &= !CASTLE_BK,
            56 => self.castling &= !CASTLE_BQ,
            _ => {}
        }
    }

    // FEN setup --------------------------------------------------------------

    /// Starting position.
    pub fn set_startpos(&mut self) {
        self.set_from_fen(START_FEN)
            .expect("start position FEN is valid");
    }

    /// Loads a position from a FEN string. All six fields are required. On
    /// error the board contents are unspecified and a descriptive message is
    /// returned.
    pub fn set_from_fen(&mut self, fen: &str) -> Result<(), &'static str> {
        let mut parts = fen.trim().split_whitespace();
        let piece_part = parts.next().ok_or("FEN missing piece placement")?;
        let side_part = parts.next().ok_or("FEN missing side to move")?;
        let castle_part = parts.next().ok_or("FEN missing castling rights")?;
        let ep_part = parts.next().ok_or("FEN missing en-passant square")?;
        let halfmove_part = parts.next().ok_or("FEN missing halfmove clock")?;
        let fullmove_part = parts.next().ok_or("FEN missing fullmove number")?;

        self.piece_bb = [0; 12];
        self.undo_stack.clear();

        // Piece placement, rank 8 down to rank 1
        let mut ranks = 0;
        for (rank_idx, rank_part) in piece_part.split('/').enumerate() {
            if rank_idx > 7 {
                return Err("FEN has more than 8 ranks");
            }
            let rank = 7 - rank_idx;
            let mut file = 0usize;
            for ch in rank_part.chars() {
                if let Some(skip) = ch.to_digit(10) {
                    file += skip as usize;
                } else {
                    if file > 7 {
                        return Err("FEN rank describes more than 8 squares");
                    }
                    let (kind, color) = piece_from_char(ch).ok_or("invalid piece character")?;
                    self.set_piece(rank * 8 + file, kind, color);
                    file += 1;
                }
            }
            if file != 8 {
                return Err("FEN rank does not describe 8 squares");
            }
            ranks += 1;
        }
        if ranks != 8 {
            return Err("FEN has fewer than 8 ranks");
        }

        self.refresh_occupancy();

        self.side = match side_part {
            "w" => Color::White,
            "b" => Color::Black,
            _ => return Err("invalid side to move"),
        };

        self.castling = 0;
        for ch in castle_part.chars() {
            match ch {
                'K' => self.castling |= CASTLE_WK,
                'Q' => self.castling |= CASTLE_WQ,
                'k' => self.castling |= CASTLE_BK,
                'q' => self.castling |= CASTLE_BQ,
                '-' => {}
                _ => return Err("invalid castling character"),
            }
        }

        self.ep = match ep_part {
            "-" => None,
            s => {
                let bytes = s.as_bytes();
                if bytes.len() != 2 {
                    return Err("invalid en-passant square");
                }
                let file = bytes[0].wrapping_sub(b'a');
                let rank = bytes[1].wrapping_sub(b'1');
                if file > 7 || (rank != 2 && rank != 5) {
                    return Err("invalid en-passant square");
                }
                Some(rank * 8 + file)
            }
        };

        self.halfmove = halfmove_part.parse().map_err(|_| "invalid halfmove clock")?;
        self.fullmove = fullmove_part.parse().map_err(|_| "invalid fullmove number")?;

        self.zobrist = zobrist::recalc_full(self);

        Ok(())
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}

fn castle_rook_squares(mv: Move, color: Color) -> (usize, usize) {
    if move_flag(mv, FLAG_CASTLE_KING) {
        match color {
            Color::White => (7, 5),   // h1 -> f1
            Color::Black => (63, 61), // h8 -> f8
        }
    } else {
        match color {
            Color::White => (0, 3),   // a1 -> d1
            Color::Black => (56, 59), // a8 -> d8
        }
    }
}

fn piece_from_char(ch: char) -> Option<(PieceKind, Color)> {
    let color = if ch.is_ascii_uppercase() {
        Color::White
    } else {
        Color::Black
    };
    let kind = match ch.to_ascii_lowercase() {
        'p' => PieceKind::Pawn,
        'n' => PieceKind::Knight,
        'b' => PieceKind::Bishop,
        'r' => PieceKind::Rook,
        'q' => PieceKind::Queen,
        'k' => PieceKind::King,
        _ => return None,
    };
    Some((kind, color))
}

fn piece_to_char(kind: PieceKind, color: Color) -> char {
    let ch = match kind {
        PieceKind::Pawn => 'p',
        PieceKind::Knight => 'n',
        PieceKind::Bishop => 'b',
        PieceKind::Rook => 'r',
        PieceKind::Queen => 'q',
        PieceKind::King => 'k',
    };
    match color {
        Color::White => ch.to_ascii_uppercase(),
        Color::Black => ch,
    }
}

// Simple board rendering for debugging
impl std::fmt::Display for Board {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for rank in (0..8).rev() {
            for file in 0..8 {
                match self.piece_on(rank * 8 + file) {
                    Some((kind, color)) => write!(f, "{} ", piece_to_char(kind, color))?,
                    None => write!(f, ". ")?,
                }
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::movegen;

    #[test]
    fn test_move_encoding_round_trip() {
        let mv = new_move(
            12,
            28,
            PieceKind::Pawn,
            None,
            None,
            FLAG_DOUBLE_PUSH,
        );
        assert_eq!(move_from_sq(mv), 12);
        assert_eq!(move_to_sq(mv), 28);
        assert_eq!(move_piece(mv), PieceKind::Pawn);
        assert_eq!(move_captured(mv), None);
        assert_eq!(move_promotion(mv), None);
        assert!(move_flag(mv, FLAG_DOUBLE_PUSH));

        let promo = new_move(
            52,
            61,
            PieceKind::Pawn,
            Some(PieceKind::Rook),
            Some(PieceKind::Queen),
            FLAG_PROMOTION | FLAG_CAPTURE,
        );
        assert_eq!(move_captured(promo), Some(PieceKind::Rook));
        assert_eq!(move_promotion(promo), Some(PieceKind::Queen));
        assert_eq!(move_to_uci(promo), "e7f8q");
    }

    #[test]
    fn test_fen_rejects_malformed_input() {
        let mut board = Board::new();
        assert!(board.set_from_fen("").is_err());
        assert!(board.set_from_fen("8/8/8/8/8/8/8/8 x - - 0 1").is_err());
        assert!(board
            .set_from_fen("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP w KQkq - 0 1")
            .is_err());
        assert!(board
            .set_from_fen("9/8/8/8/8/8/8/8 w - - 0 1")
            .is_err());
        assert!(board.set_from_fen("8/8/8/8/8/8/8/8 w - e5 0 1").is_err());
    }

    #[test]
    fn test_make_unmake_zobrist_invariant() {
        crate::init();
        let mut board = Board::new();
        board.set_startpos();
        let original_hash = board.zobrist;
        let moves = movegen::legal_moves(&mut board);
        for i in 0..moves.len() {
            let mv = moves[i];
            board.make_move(mv);
            board.unmake_move(mv);
            assert_eq!(
                board.zobrist,
                original_hash,
                "mismatched Zobrist after make/unmake of {}",
                move_to_uci(mv)
            );
        }
    }

    #[test]
    fn test_double_push_sets_en_passant_target() {
        crate::init();
        let mut board = Board::new();
        board.set_startpos();
        let mv = new_move(12, 28, PieceKind::Pawn, None, None, FLAG_DOUBLE_PUSH); // e2e4
        board.make_move(mv);
        assert_eq!(board.ep, Some(20)); // e3
        board.unmake_move(mv);
        assert_eq!(board.ep, None);
    }

    #[test]
    fn test_castling_relocates_rook_and_restores_it() {
        crate::init();
        let mut board = Board::new();
        board
            .set_from_fen("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1")
            .unwrap();
        let mv = new_move(4, 6, PieceKind::King, None, None, FLAG_CASTLE_KING);
        board.make_move(mv);
        assert_eq!(board.piece_on(5), Some((PieceKind::Rook, Color::White)));
        assert_eq!(board.piece_on(7), None);
        assert_eq!(board.castling & (CASTLE_WK | CASTLE_WQ), 0);
        board.unmake_move(mv);
        assert_eq!(board.piece_on(7), Some((PieceKind::Rook, Color::White)));
        assert_eq!(board.piece_on(4), Some((PieceKind::King, Color::White)));
        assert_ne!(board.castling & CASTLE_WK, 0);
    }
}
