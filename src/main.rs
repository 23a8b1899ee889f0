//! Blokus-MCTS command line.
//!
//! ## Usage
//!
//! - `blokus-mcts` - Show a demo
//! - `blokus-mcts search -m e10,f10` - Search a position after the given moves
//! - `blokus-mcts selfplay` - Play a game against itself

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use flexi_logger::Logger;
use log::info;

use blokus_mcts::board::Board;
use blokus_mcts::color::Color;
use blokus_mcts::constants::N_SIMS;
use blokus_mcts::search::{SearchParams, SearchResult, search};
use blokus_mcts::shared_const::{SearchConfig, SharedConst};
use blokus_mcts::variant::Variant;

/// Blokus-MCTS: Monte Carlo simulation core for Blokus-family games
#[derive(Parser)]
#[command(name = "blokus-mcts")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Game variant (classic, classic_2, duo, junior, trigon, trigon_2, trigon_3)
    #[arg(short, long, default_value = "duo", global = true)]
    variant: Variant,

    /// Simulations per search
    #[arg(short = 'n', long, default_value_t = N_SIMS, global = true)]
    sims: usize,

    /// Worker threads (0 = number of cores)
    #[arg(short, long, default_value_t = 0, global = true)]
    threads: usize,

    /// Random seed
    #[arg(long, default_value_t = 0, global = true)]
    seed: u64,

    /// Log specification, e.g. "info" or "blokus_mcts=debug"
    #[arg(long, default_value = "info", global = true)]
    log_level: String,

    /// Do not score unbroken symmetric positions as draws
    #[arg(long, global = true)]
    no_symmetry: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Search the position reached by the given moves
    Search {
        /// Moves in point list notation, one per color in turn ("pass" allowed)
        #[arg(short, long, value_delimiter = ' ')]
        moves: Vec<String>,
    },
    /// Play a full game with the search on all colors
    Selfplay,
    /// Run a short demo
    Demo,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let _logger = Logger::try_with_env_or_str(&cli.log_level)?
        .format(flexi_logger::colored_default_format)
        .start()?;

    let config = SearchConfig {
        detect_symmetry: !cli.no_symmetry,
        ..SearchConfig::default()
    };
    let params = SearchParams {
        nu_simulations: cli.sims,
        nu_threads: cli.threads,
        seed: cli.seed,
        ..SearchParams::default()
    };

    match cli.command {
        Some(Commands::Search { moves }) => run_search(cli.variant, &moves, config, &params),
        Some(Commands::Selfplay) => run_selfplay(cli.variant, config, &params),
        Some(Commands::Demo) | None => run_demo(cli.variant, config, &params),
    }
}

fn setup_board(variant: Variant, moves: &[String]) -> Result<Board> {
    let mut bd = Board::new(variant);
    for s in moves {
        let mv = bd
            .board_const()
            .parse_move(s)
            .with_context(|| format!("invalid move '{s}'"))?;
        let c = bd.to_play();
        bd.play_checked(c, mv)
            .with_context(|| format!("cannot play '{s}' for color {c}"))?;
    }
    Ok(bd)
}

fn print_result(bd: &Board, result: &SearchResult) {
    let bc = bd.board_const();
    println!("Best move: {}", bc.move_to_string(result.best));
    if let Some(child) = result.children.iter().find(|c| c.mv == result.best) {
        println!(
            "Visits: {}/{}  value: {:.3}",
            child.visits,
            result.nu_simulations,
            child.value()
        );
    }
    println!("Score: {}", result.score);
}

fn run_search(
    variant: Variant,
    moves: &[String],
    config: SearchConfig,
    params: &SearchParams,
) -> Result<()> {
    let bd = setup_board(variant, moves)?;
    println!("{bd}");
    let shared = SharedConst::new(&bd, config);
    let result = search(&shared, params);
    if result.best.is_null() {
        bail!("the game is over");
    }
    print_result(&bd, &result);
    Ok(())
}

fn run_selfplay(variant: Variant, config: SearchConfig, params: &SearchParams) -> Result<()> {
    let mut bd = Board::new(variant);
    let mut params = params.clone();
    loop {
        let shared = SharedConst::new(&bd, config.clone());
        let result = search(&shared, &params);
        if result.best.is_null() {
            break;
        }
        let c = bd.to_play();
        info!("color {c}: {}", bd.board_const().move_to_string(result.best));
        bd.play_checked(c, result.best)?;
        params.seed = params.seed.wrapping_add(1);
    }
    println!("{bd}");
    for c in bd.colors() {
        println!(
            "Color {c}: {} points (bonus {})",
            bd.points_with_bonus(c),
            bd.bonus(c)
        );
    }
    Ok(())
}

fn run_demo(variant: Variant, config: SearchConfig, params: &SearchParams) -> Result<()> {
    println!("Blokus-MCTS: Monte Carlo simulation core ({variant})\n");

    println!("=== Move Tables ===");
    let bd = Board::new(variant);
    let bc = bd.board_const();
    println!(
        "{} pieces, {} moves, {} points per color",
        bc.nu_pieces(),
        bc.nu_moves(),
        bc.total_piece_points()
    );
    let c0 = Color::new(0);
    let first = bd.gen_legal_moves(c0);
    println!("Legal first moves for color {c0}: {}", first.len());
    if let Some(&mv) = first.first() {
        println!("For example: {}", bc.move_to_string(mv));
    }

    println!("\n=== Search Demo ===");
    let demo_params = SearchParams {
        nu_simulations: params.nu_simulations.min(500),
        ..params.clone()
    };
    println!("Running {} simulations...", demo_params.nu_simulations);
    let shared = SharedConst::new(&bd, config);
    let result = search(&shared, &demo_params);
    print_result(&bd, &result);

    if result.best.is_regular() {
        let mut bd = bd.clone();
        bd.play(c0, result.best);
        println!("\n{bd}");
    }
    Ok(())
}
