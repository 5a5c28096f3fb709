use clap::Parser;

use tesuji::game::{Color, Position, Ruleset};
use tesuji::games::go::Board;
use tesuji::mcts::{SearchConfig, Searcher};

/// Self-play driver: the engine plays both sides, reusing the tree
/// across moves via reroot.
#[derive(Parser)]
#[command(name = "selfplay")]
struct Args {
    /// Board size.
    #[arg(long, default_value_t = 9)]
    size: usize,

    /// Iterations per move.
    #[arg(long, default_value_t = 1000)]
    iterations: usize,

    /// Worker threads.
    #[arg(long, default_value_t = 1)]
    threads: usize,

    /// Maximum rollout depth.
    #[arg(long, default_value_t = 100)]
    playout_depth: usize,

    #[arg(long, default_value_t = 6.5)]
    komi: f64,

    /// Stop after this many plies even if the game is not over.
    #[arg(long, default_value_t = 60)]
    plies: usize,

    /// Master RNG seed for reproducible games.
    #[arg(long)]
    seed: Option<u64>,

    /// Per-move deadline in milliseconds instead of an iteration budget.
    #[arg(long)]
    deadline_ms: Option<u64>,

    /// Dump per-move root statistics as JSON lines.
    #[arg(long)]
    stats: bool,
}

fn main() {
    pretty_env_logger::init();
    let args = Args::parse();

    let mut config = SearchConfig::default()
        .iterations(args.iterations)
        .playout_depth(args.playout_depth)
        .thread_count(args.threads)
        .komi(args.komi);
    if let Some(seed) = args.seed {
        config = config.seed(seed);
    }
    if let Some(ms) = args.deadline_ms {
        config = config.deadline_ms(ms);
    }

    let mut board = Board::new(args.size);
    let mut searcher: Searcher<Board> = Searcher::new(config);
    let mut color = Color::Black;

    for ply in 1..=args.plies {
        if board.is_terminal() {
            break;
        }

        let mv = searcher.search(&board, color);
        if args.stats {
            println!(
                "{}",
                serde_json::to_string(&searcher.root_stats()).expect("stats serialize")
            );
        }

        board = board.apply(&mv).expect("engine returned an illegal move");
        println!("move {ply}: {mv}");
        println!("{board}");

        if !searcher.reroot(&mv) {
            // Not reachable from the old root; the next search call
            // grows a fresh tree.
            log::debug!("tree discarded after {mv}");
        }
        color = color.opponent();
    }

    let (black, white) = board.score(Ruleset::Chinese, args.komi);
    println!("final score: black {black} - white {white}");
    println!(
        "winner: {}",
        if black > white { "black" } else { "white" }
    );
}
