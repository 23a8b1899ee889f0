//! Read-only data shared by all simulation states of one search.
//!
//! [`SharedConst`] is built once from the root position before the workers
//! start and is only borrowed afterwards. It holds:
//! - the root board and the color to play
//! - per color, the moves already forbidden at the root (they stay forbidden
//!   in every descendant position)
//! - the point reflection table used for symmetric draw detection
//! - the schedule of pieces considered in playouts by number of pieces on
//!   board

use crate::board::{Board, Float};
use crate::board_const::Move;
use crate::color::{Color, ColorMap};
use crate::constants::SCORE_MODIFICATION;
use crate::marker::MoveMarker;
use crate::piece::PieceMap;
use crate::symmetry::SymmetricPoints;
use crate::variant::{BoardType, PieceSet};

/// Run-time search options.
#[derive(Clone, Debug, PartialEq)]
pub struct SearchConfig {
    /// Score unbroken symmetric positions as draws in symmetric variants.
    pub detect_symmetry: bool,
    /// Do not use symmetric draw detection when searching for the second
    /// player, who would otherwise aim for the draw.
    pub avoid_symmetric_draw: bool,
    /// Weight of the score in the playout result.
    pub score_modification: Float,
}

impl Default for SearchConfig {
    fn default() -> Self {
        SearchConfig {
            detect_symmetry: true,
            avoid_symmetric_draw: true,
            score_modification: SCORE_MODIFICATION,
        }
    }
}

/// Which pieces playouts generate moves for at a given stage of the game.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Considered {
    Size(u8),
    MinSize(u8),
    All,
}

fn considered_at(board_type: BoardType, piece_set: PieceSet, rounds: u32) -> Considered {
    match (board_type, piece_set) {
        (BoardType::Classic, _) if rounds < 2 => Considered::Size(5),
        (BoardType::Classic, _) if rounds < 5 => Considered::MinSize(4),
        (BoardType::Duo, PieceSet::Junior) if rounds < 2 => Considered::MinSize(4),
        (BoardType::Duo, PieceSet::Junior) => Considered::All,
        (BoardType::Duo, _) if rounds < 2 => Considered::Size(5),
        (BoardType::Duo, _) if rounds < 4 => Considered::MinSize(4),
        (BoardType::Trigon | BoardType::Trigon3, _) if rounds < 2 => Considered::Size(6),
        (BoardType::Trigon | BoardType::Trigon3, _) if rounds < 4 => Considered::MinSize(5),
        _ => Considered::All,
    }
}

pub struct SharedConst {
    pub board: Board,
    pub to_play: Color,
    pub config: SearchConfig,
    pub symmetric_points: SymmetricPoints,
    is_forbidden_at_root: ColorMap<MoveMarker>,
    /// Distinct considered-piece sets.
    considered_sets: Vec<PieceMap<bool>>,
    /// Index into `considered_sets` by number of pieces on board.
    considered_by_pieces: Vec<usize>,
    considered_all: usize,
    min_move_all_considered: u32,
}

impl SharedConst {
    /// Precompute everything for a search from the position of `bd` with
    /// `bd.to_play()` to move.
    pub fn new(bd: &Board, config: SearchConfig) -> Self {
        let bc = bd.board_const();
        let nu_moves = bc.nu_moves();

        let is_forbidden_at_root = ColorMap::from_fn(|c| {
            let mut marker = MoveMarker::new(nu_moves);
            if c.to_int() < bd.nu_colors() {
                for i in 0..nu_moves {
                    let mv = Move::from_index(i);
                    if bd.is_forbidden(c, mv) {
                        marker.set(mv);
                    }
                }
            }
            marker
        });

        let nu_instances: u32 = bc
            .pieces()
            .map(|piece| bc.piece_info(piece).nu_instances as u32)
            .sum();
        let max_onboard = bd.nu_colors() as u32 * nu_instances;
        let mut considered_sets: Vec<PieceMap<bool>> = Vec::new();
        let mut intern = |set: PieceMap<bool>| -> usize {
            match considered_sets.iter().position(|s| *s == set) {
                Some(i) => i,
                None => {
                    considered_sets.push(set);
                    considered_sets.len() - 1
                }
            }
        };
        let make_set = |considered: Considered| {
            let mut set = PieceMap::new(bc.nu_pieces(), false);
            for piece in bc.pieces() {
                let size = bc.piece_info(piece).size;
                set[piece] = match considered {
                    Considered::Size(n) => size == n,
                    Considered::MinSize(n) => size >= n,
                    Considered::All => true,
                };
            }
            set
        };
        let considered_all = intern(make_set(Considered::All));
        let mut considered_by_pieces = Vec::with_capacity(max_onboard as usize + 1);
        let mut min_move_all_considered = max_onboard;
        for n in 0..=max_onboard {
            let rounds = n / bd.nu_colors() as u32;
            let index = intern(make_set(considered_at(bc.board_type(), bc.piece_set(), rounds)));
            if index == considered_all {
                min_move_all_considered = min_move_all_considered.min(n);
            }
            considered_by_pieces.push(index);
        }

        log::debug!(
            "shared const: {} considered sets, all pieces from {} pieces on board",
            considered_sets.len(),
            min_move_all_considered
        );

        SharedConst {
            board: bd.clone(),
            to_play: bd.to_play(),
            config,
            symmetric_points: SymmetricPoints::new(bd.geometry()),
            is_forbidden_at_root,
            considered_sets,
            considered_by_pieces,
            considered_all,
            min_move_all_considered,
        }
    }

    #[inline]
    pub fn is_forbidden_at_root(&self, c: Color, mv: Move) -> bool {
        self.is_forbidden_at_root[c].get(mv)
    }

    /// Index of the considered-piece set for a number of pieces on board.
    #[inline]
    pub fn considered_index(&self, nu_onboard_pieces: u32) -> usize {
        self.considered_by_pieces
            .get(nu_onboard_pieces as usize)
            .copied()
            .unwrap_or(self.considered_all)
    }

    /// Index of the set containing all pieces.
    #[inline]
    pub fn considered_all_index(&self) -> usize {
        self.considered_all
    }

    #[inline]
    pub fn considered_set(&self, index: usize) -> &PieceMap<bool> {
        &self.considered_sets[index]
    }

    /// Number of pieces on board from which on all pieces are considered.
    pub fn min_move_all_considered(&self) -> u32 {
        self.min_move_all_considered
    }
}
