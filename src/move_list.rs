//! Unordered, duplicate-free list of moves.

use std::ops::Index;

use crate::board_const::Move;

/// Move list with O(1) removal. The order of the moves carries no meaning.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MoveList(Vec<Move>);

impl MoveList {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[inline]
    pub fn push(&mut self, mv: Move) {
        self.0.push(mv);
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }

    /// Remove the move at `i` by moving the last move into its slot.
    #[inline]
    pub fn remove_fast(&mut self, i: usize) {
        self.0.swap_remove(i);
    }

    /// Keep only the moves for which `keep` returns true. Uses
    /// [`MoveList::remove_fast`], so the order changes.
    pub fn retain_fast(&mut self, mut keep: impl FnMut(Move) -> bool) {
        let mut i = 0;
        while i < self.0.len() {
            if keep(self.0[i]) {
                i += 1;
            } else {
                self.remove_fast(i);
            }
        }
    }

    pub fn contains(&self, mv: Move) -> bool {
        self.0.contains(&mv)
    }

    pub fn as_slice(&self) -> &[Move] {
        &self.0
    }

    pub fn iter(&self) -> impl Iterator<Item = Move> + '_ {
        self.0.iter().copied()
    }
}

impl Index<usize> for MoveList {
    type Output = Move;

    #[inline]
    fn index(&self, i: usize) -> &Move {
        &self.0[i]
    }
}
