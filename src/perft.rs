//! Perft: node counting over the legal move tree, for validating and
//! benchmarking the generator against known-correct totals.

use crate::board::{Board, Move};
use crate::movegen;

/// Counts leaf positions reachable in exactly `depth` plies. `depth <= 1`
/// returns the legal-move count directly, skipping one recursion layer. The
/// board is restored to its entry state on every path.
pub fn perft(board: &mut Board, depth: u32) -> u64 {
    let moves = movegen::legal_moves(board);
    if depth <= 1 {
        return moves.len() as u64;
    }

    let mut nodes = 0u64;
    for mv in moves.iter() {
        board.make_move(mv);
        nodes += perft(board, depth - 1);
        board.unmake_move(mv);
    }
    nodes
}

/// "Divide" perft: the subtree node count below each root move. Comparing
/// the per-move counts against a reference engine localizes generator bugs
/// to a single root move.
pub fn divide(board: &mut Board, depth: u32) -> Vec<(Move, u64)> {
    let moves = movegen::legal_moves(board);
    let mut counts = Vec::with_capacity(moves.len());

    for mv in moves.iter() {
        board.make_move(mv);
        let nodes = if depth <= 1 { 1 } else { perft(board, depth - 1) };
        board.unmake_move(mv);
        counts.push((mv, nodes));
    }
    counts
}
