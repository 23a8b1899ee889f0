//! Blokus-MCTS: the simulation core of a Monte Carlo tree search player for
//! Blokus-family tile-placement games.
//!
//! This crate provides the per-thread simulation state that a tree search
//! drives: incremental move generation, prior knowledge for node expansion,
//! a playout policy and multi-player evaluation. It supports the Classic,
//! Duo, Junior and Trigon variants.
//!
//! ## Modules
//!
//! - [`constants`] - Board sizes, search defaults and heuristic weights
//! - [`variant`] - Game variants and their rules
//! - [`color`] - Colors and per-color maps
//! - [`geometry`] - Square and triangle board geometries
//! - [`piece`] - Piece sets and their orientations
//! - [`board_const`] - Precomputed move tables, shared between threads
//! - [`board`] - Board state with play, undo and scoring
//! - [`move_list`], [`marker`] - Move containers for generation
//! - [`local_value`] - Locality of moves to the last opponent moves
//! - [`symmetry`] - Symmetric draw detection
//! - [`scoring`] - Game results for any number of players
//! - [`shared_const`] - Per-search data shared by all states
//! - [`state`] - The simulation state
//! - [`search`] - Node expansion interface and a flat parallel driver
//! - [`stats`] - Running statistics
//!
//! ## Example
//!
//! ```
//! use blokus_mcts::board::Board;
//! use blokus_mcts::search::{search, SearchParams};
//! use blokus_mcts::shared_const::{SearchConfig, SharedConst};
//! use blokus_mcts::variant::Variant;
//!
//! let bd = Board::new(Variant::Duo);
//! let shared = SharedConst::new(&bd, SearchConfig::default());
//! let params = SearchParams { nu_simulations: 10, nu_threads: 1, ..SearchParams::default() };
//! let result = search(&shared, &params);
//! println!("Best move: {}", bd.board_const().move_to_string(result.best));
//! ```

pub mod board;
pub mod board_const;
pub mod color;
pub mod constants;
pub mod geometry;
pub mod local_value;
pub mod marker;
pub mod move_list;
pub mod piece;
pub mod scoring;
pub mod search;
pub mod shared_const;
pub mod state;
pub mod stats;
pub mod symmetry;
pub mod variant;
