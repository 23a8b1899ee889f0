//! Locality of playout moves.
//!
//! Playouts prefer moves that answer the opponents' most recent moves. A
//! point gets value `0x100` if it is a live attach point of such a move (not
//! forbidden for the opponent) and at least `0x001` if it is a live neighbor
//! of one. The value of a move is the sum over its points, so the count of
//! attach points it occupies dominates the count of neighbors.

use crate::board::Board;
use crate::board_const::Move;
use crate::constants::{LOCAL_ADJ, LOCAL_ATTACH};
use crate::geometry::{Geometry, Grid, Point};
use crate::move_list::MoveList;

pub struct LocalValue {
    value: Grid<u32>,
    points: Vec<Point>,
}

impl LocalValue {
    pub fn new(geometry: &Geometry) -> Self {
        LocalValue {
            value: Grid::new(geometry, 0),
            points: Vec::new(),
        }
    }

    /// Recompute the point values for the color to play.
    ///
    /// Looks at the last `nu_colors - 1` moves and skips those of the color to
    /// play, its paired color and passes.
    pub fn init(&mut self, bd: &Board) {
        for &p in &self.points {
            self.value[p] = 0;
        }
        self.points.clear();
        let to_play = bd.to_play();
        let second_color = bd.second_color(to_play);
        let bc = bd.board_const();
        let geometry = bd.geometry();
        let nu_moves = bd.nu_moves();
        let first = nu_moves.saturating_sub(bd.nu_colors() as usize - 1);
        for i in (first..nu_moves).rev() {
            let m = bd.get_move(i);
            if m.color == to_play || m.color == second_color || !m.mv.is_regular() {
                continue;
            }
            let c = m.color;
            for &p in bc.move_info_ext(m.mv).attach_points.iter() {
                if bd.is_forbidden_at(p, c) {
                    continue;
                }
                if self.value[p] == 0 {
                    self.points.push(p);
                }
                self.value[p] = LOCAL_ATTACH;
                for &q in geometry.adj(p) {
                    if !bd.is_forbidden_at(q, c) && self.value[q] == 0 {
                        self.value[q] = LOCAL_ADJ;
                        self.points.push(q);
                    }
                }
            }
        }
    }

    #[cfg(test)]
    pub fn get(&self, p: Point) -> u32 {
        self.value[p]
    }

    pub fn move_value(&self, points: &[Point]) -> u32 {
        points.iter().map(|&p| self.value[p]).sum()
    }
}

/// Moves with the highest local value seen during a generation pass, and the
/// largest playable piece sizes.
#[derive(Debug, Default)]
pub struct LocalMoves {
    pub moves: MoveList,
    pub max_value: u32,
    /// Largest piece size among all legal moves.
    pub max_piece_size: usize,
    /// Largest piece size among the local moves.
    pub max_piece_size_local: usize,
}

impl LocalMoves {
    /// Forget all moves. A move needs local value at least 1 to count.
    pub fn clear(&mut self) {
        self.moves.clear();
        self.max_value = 1;
        self.max_piece_size = 0;
        self.max_piece_size_local = 0;
    }

    /// Record a legal move of the given size and local value.
    pub fn add(&mut self, mv: Move, value: u32, piece_size: usize) {
        self.max_piece_size = self.max_piece_size.max(piece_size);
        if value < self.max_value {
            return;
        }
        if value > self.max_value {
            self.moves.clear();
            self.max_value = value;
            self.max_piece_size_local = piece_size;
        } else {
            self.max_piece_size_local = self.max_piece_size_local.max(piece_size);
        }
        self.moves.push(mv);
    }
}
