pub mod board;
pub mod magic;
pub mod movegen;
pub mod perft;
pub mod utils;
pub mod zobrist;

/// Warms up every lazily initialized table (leaper attacks, magic tables,
/// Zobrist keys). All of them also self-initialize on first use; calling this
/// up front keeps table construction out of timed code.
pub fn init() {
    utils::init_attack_tables();
    magic::init();
    zobrist::init_zobrist();
}
