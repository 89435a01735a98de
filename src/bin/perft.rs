use std::process::ExitCode;

use clap::Parser;

use alfiere::board::{move_to_uci, Board, START_FEN};
use alfiere::perft::{divide, perft};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Position to search ("startpos" or a FEN string)
    #[arg(short, long, default_value_t = String::from("startpos"))]
    fen: String,

    #[arg(short, long, default_value_t = 4)]
    depth: u32,

    /// Print the subtree node count below each root move
    #[arg(long)]
    divide: bool,

    /// Expected node count; exit nonzero on mismatch
    #[arg(short, long)]
    expected: Option<u64>,
}

fn main() -> ExitCode {
    let args = Args::parse();
    let fen = if args.fen == "startpos" {
        START_FEN
    } else {
        args.fen.as_str()
    };

    alfiere::init();

    let mut board = Board::new();
    if let Err(e) = board.set_from_fen(fen) {
        eprintln!("bad FEN '{}': {}", fen, e);
        return ExitCode::FAILURE;
    }

    if args.divide {
        let counts = divide(&mut board, args.depth);
        let mut total = 0u64;
        for (mv, nodes) in &counts {
            println!("{} {}", move_to_uci(*mv), nodes);
            total += nodes;
        }
        println!("\n{}", total);
        return ExitCode::SUCCESS;
    }

    let start = std::time::Instant::now();
    let nodes = perft(&mut board, args.depth);
    let duration = start.elapsed();

    println!(
        "perft({}) = {} nodes ({} ms, {:.2} Mnps)",
        args.depth,
        nodes,
        duration.as_millis(),
        nodes as f64 / (duration.as_micros() as f64)
    );

    match args.expected {
        Some(expected) if expected != nodes => {
            println!("failed: expected {} got {}", expected, nodes);
            ExitCode::FAILURE
        }
        Some(_) => {
            println!("passed");
            ExitCode::SUCCESS
        }
        None => ExitCode::SUCCESS,
    }
}
