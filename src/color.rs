//! Colors, per-color maps, and colored moves.

use std::fmt;
use std::ops::{Index, IndexMut};

use crate::board_const::Move;
use crate::constants::MAX_COLORS;

/// A piece color. Colors are numbered `0..nu_colors` and play in that order.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Color(u8);

impl Color {
    #[inline]
    pub const fn new(i: u8) -> Self {
        debug_assert!((i as usize) < MAX_COLORS);
        Color(i)
    }

    #[inline]
    pub const fn to_int(self) -> u8 {
        self.0
    }

    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// The color that plays after this one.
    #[inline]
    pub fn next(self, nu_colors: u8) -> Color {
        debug_assert!(self.0 < nu_colors);
        if self.0 + 1 == nu_colors { Color(0) } else { Color(self.0 + 1) }
    }

    /// The color that played before this one.
    #[inline]
    pub fn previous(self, nu_colors: u8) -> Color {
        debug_assert!(nu_colors > 1 && self.0 < nu_colors);
        if self.0 == 0 { Color(nu_colors - 1) } else { Color(self.0 - 1) }
    }

    /// Iterate over the first `nu_colors` colors.
    pub fn all(nu_colors: u8) -> impl Iterator<Item = Color> + Clone {
        (0..nu_colors).map(Color)
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0 + 1)
    }
}

/// A value for each of the (at most four) colors.
#[derive(Debug, PartialEq, Eq, Default)]
pub struct ColorMap<T>(pub [T; MAX_COLORS]);

impl<T: Clone> Clone for ColorMap<T> {
    fn clone(&self) -> Self {
        ColorMap(self.0.clone())
    }

    fn clone_from(&mut self, source: &Self) {
        for (dst, src) in self.0.iter_mut().zip(source.0.iter()) {
            dst.clone_from(src);
        }
    }
}

impl<T> ColorMap<T> {
    pub fn from_fn(mut f: impl FnMut(Color) -> T) -> Self {
        ColorMap(std::array::from_fn(|i| f(Color(i as u8))))
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.0.iter()
    }
}

impl<T: Copy> ColorMap<T> {
    pub fn filled(value: T) -> Self {
        ColorMap([value; MAX_COLORS])
    }

    pub fn fill(&mut self, value: T) {
        self.0 = [value; MAX_COLORS];
    }
}

impl<T> Index<Color> for ColorMap<T> {
    type Output = T;

    #[inline]
    fn index(&self, c: Color) -> &T {
        &self.0[c.index()]
    }
}

impl<T> IndexMut<Color> for ColorMap<T> {
    #[inline]
    fn index_mut(&mut self, c: Color) -> &mut T {
        &mut self.0[c.index()]
    }
}

/// A move together with the color that played it.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ColorMove {
    pub color: Color,
    pub mv: Move,
}

impl ColorMove {
    pub fn new(color: Color, mv: Move) -> Self {
        Self { color, mv }
    }

    pub fn is_pass(&self) -> bool {
        self.mv.is_pass()
    }
}

/// A move as seen by the search tree: the player is the color index.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct PlayerMove {
    pub player: u8,
    pub mv: Move,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_next_previous_cycle() {
        for nu_colors in 2..=4u8 {
            for c in Color::all(nu_colors) {
                assert_eq!(c.next(nu_colors).previous(nu_colors), c);
            }
            assert_eq!(Color::new(nu_colors - 1).next(nu_colors), Color::new(0));
            assert_eq!(Color::new(0).previous(nu_colors), Color::new(nu_colors - 1));
        }
    }

    #[test]
    fn test_color_map_index() {
        let mut map = ColorMap::filled(0u32);
        map[Color::new(2)] = 7;
        assert_eq!(map.0, [0, 0, 7, 0]);
        let ids = ColorMap::from_fn(|c| c.to_int());
        assert_eq!(ids.0, [0, 1, 2, 3]);
    }
}
