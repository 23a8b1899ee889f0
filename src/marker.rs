//! Membership markers for moves and points.
//!
//! [`MoveMarker`] is a bitset over the move table used to keep move lists
//! duplicate-free during generation. It must be fully clear between
//! generation passes; [`MarkedMoves`] enforces this by clearing exactly the
//! bits of the moves it collected when it goes out of scope.

use crate::board_const::Move;
use crate::geometry::{Geometry, Grid, Point};
use crate::move_list::MoveList;

/// One bit per regular move.
#[derive(Clone, Debug)]
pub struct MoveMarker {
    bits: Vec<u64>,
}

impl MoveMarker {
    pub fn new(nu_moves: usize) -> Self {
        MoveMarker {
            bits: vec![0; nu_moves.div_ceil(64)],
        }
    }

    #[inline]
    pub fn get(&self, mv: Move) -> bool {
        let i = mv.index();
        self.bits[i / 64] & (1 << (i % 64)) != 0
    }

    #[inline]
    pub fn set(&mut self, mv: Move) {
        let i = mv.index();
        self.bits[i / 64] |= 1 << (i % 64);
    }

    #[inline]
    pub fn clear(&mut self, mv: Move) {
        let i = mv.index();
        self.bits[i / 64] &= !(1 << (i % 64));
    }

    pub fn is_clear(&self) -> bool {
        self.bits.iter().all(|&w| w == 0)
    }
}

/// Scoped collection of moves into a list while marking them.
///
/// Every marked move must end up in the list. Dropping the collector clears
/// the marks of all moves in the list, leaving the marker clear.
pub struct MarkedMoves<'a> {
    marker: &'a mut MoveMarker,
    moves: &'a mut MoveList,
}

impl<'a> MarkedMoves<'a> {
    pub fn new(marker: &'a mut MoveMarker, moves: &'a mut MoveList) -> Self {
        debug_assert!(marker.is_clear(), "move marker not clear at scope start");
        MarkedMoves { marker, moves }
    }

    #[inline]
    pub fn is_marked(&self, mv: Move) -> bool {
        self.marker.get(mv)
    }

    /// Add `mv` unless already collected. Returns true if it was added.
    #[inline]
    pub fn insert(&mut self, mv: Move) -> bool {
        if self.marker.get(mv) {
            return false;
        }
        self.marker.set(mv);
        self.moves.push(mv);
        true
    }

    /// Mark every move already in the list.
    pub fn mark_all(&mut self) {
        for mv in self.moves.iter() {
            self.marker.set(mv);
        }
    }

    pub fn moves(&self) -> &MoveList {
        self.moves
    }
}

impl Drop for MarkedMoves<'_> {
    fn drop(&mut self) {
        for mv in self.moves.iter() {
            self.marker.clear(mv);
        }
        debug_assert!(self.marker.is_clear(), "move marker not clear at scope end");
    }
}

/// Set of points, cleared as a whole.
#[derive(Clone, Debug)]
pub struct PointMarker(Grid<bool>);

impl PointMarker {
    pub fn new(geometry: &Geometry) -> Self {
        PointMarker(Grid::new(geometry, false))
    }

    #[inline]
    pub fn get(&self, p: Point) -> bool {
        self.0[p]
    }

    #[inline]
    pub fn set(&mut self, p: Point) {
        self.0[p] = true;
    }

    pub fn clear(&mut self) {
        self.0.fill(false);
    }
}
