//! Constants for board dimensions, search defaults, and heuristic weights.
//!
//! This module contains the tunable parameters of the simulation core.
//! Most values were tuned empirically against reference playout statistics;
//! changing them changes move selection.

// =============================================================================
// Board Geometry
// =============================================================================

/// Maximum number of colors in any variant.
pub const MAX_COLORS: usize = 4;

/// Edge length of the square board in Classic variants.
pub const CLASSIC_SIZE: u32 = 20;

/// Edge length of the square board in Duo and Junior.
pub const DUO_SIZE: u32 = 14;

/// Edge length (in triangle pairs) of the hexagonal Trigon board.
pub const TRIGON_SIZE: u32 = 9;

/// Edge length of the smaller hexagonal board used with three colors.
pub const TRIGON_3_SIZE: u32 = 8;

/// Stretch of the y-axis on triangular boards (approximately sqrt(3)) so that
/// Euclidean distances match the real board shape.
pub const TRIGON_Y_RATIO: f32 = 1.732;

// =============================================================================
// Scoring
// =============================================================================

/// Bonus for placing all pieces.
pub const BONUS_ALL_PIECES: u32 = 15;

/// Additional bonus if the last piece placed was the one-cell piece.
pub const BONUS_MONOMINO_LAST: u32 = 5;

// =============================================================================
// Search Defaults
// =============================================================================

/// Default weight of the score in the blended playout result.
pub const SCORE_MODIFICATION: f32 = 0.1;

/// Default number of simulations per search.
pub const N_SIMS: usize = 3000;

/// Exploration constant of the flat UCB driver.
pub const UCB_EXPLORE: f32 = 0.3;

/// Value used to initialize children in the flat driver.
pub const INIT_VALUE: f32 = 0.5;

// =============================================================================
// Playout Policy
// =============================================================================

/// Number of random draws used to prefer the largest playable piece.
pub const PLAYOUT_MAX_TRY: u32 = 3;

/// Early playout termination is only used while the search started before
/// this many rounds of moves.
pub const TERMINATE_EARLY_ROUNDS: usize = 10;

/// Local value of a point that is a live attach point of an opponent's last move.
pub const LOCAL_ATTACH: u32 = 0x100;

/// Local value of a live neighbor of such an attach point.
pub const LOCAL_ADJ: u32 = 0x001;

// =============================================================================
// Prior Knowledge (tree expansion)
// =============================================================================

/// Point value of an opponent's live attach point.
pub const PRIOR_OPP_ATTACH: f32 = 5.0;

/// Point value of a live neighbor of an opponent's attach point.
pub const PRIOR_OPP_ATTACH_ADJ: f32 = 4.0;

/// Value of a new attach point of the color to play.
pub const PRIOR_OWN_ATTACH: f32 = 1.0;

/// Value of a new attach point that is already forbidden.
pub const PRIOR_DEAD_ATTACH: f32 = -5.0;

/// Penalty for making an own attach point forbidden.
pub const PRIOR_KILL_OWN_ATTACH: f32 = -2.0;

/// Penalty for creating a new forbidden point.
pub const PRIOR_NEW_FORBIDDEN: f32 = -0.2;

/// Bonus for touching the paired color of the same player.
pub const PRIOR_CONNECT: f32 = 2.0;

/// Scale of the heuristic difference to the best move before the exp(-x)
/// approximation is applied.
pub const PRIOR_HEURISTIC_SCALE: f32 = 0.3;

/// Weight of the symmetry bonus in the expansion value.
pub const PRIOR_SYMMETRY_WEIGHT: f32 = 5.0;

/// Number of pieces on board below which classic expansions prune moves far
/// from the center.
pub const CLASSIC_DIST_TO_CENTER_PIECES: u32 = 13;

/// Same for the triangular boards.
pub const TRIGON_DIST_TO_CENTER_PIECES: u32 = 5;

/// Number of pieces on board below which classic expansions prefer moves
/// that connect the two colors of a player.
pub const CLASSIC_CONNECT_PIECES: u32 = 14;

/// Distances to the center at most this (after scaling by 4) are treated as
/// equal on the classic board.
pub const CLASSIC_MIN_DIST_TO_CENTER: f32 = 10.0;

// =============================================================================
// Symmetric Draw Detection
// =============================================================================

/// Minimum pieces on board before symmetry counts in Duo and Junior.
pub const SYMMETRY_MIN_PIECES_DUO: u32 = 3;

/// Minimum pieces on board before symmetry counts in Trigon with two players.
pub const SYMMETRY_MIN_PIECES_TRIGON: u32 = 5;
