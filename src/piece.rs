//! Piece catalogues.
//!
//! The classic and trigon piece sets are every free polyform up to a given
//! size, found by growth enumeration:
//!
//! - Start from the single cell.
//! - Grow every shape of size `k` by one neighbouring cell.
//! - Keep one canonical representative per equivalence class under the
//!   symmetry group of the grid (8 transforms on squares, 12 on triangles).
//!
//! Shapes use local `(x, y)` coordinates with the same triangle orientation
//! rule as the board (see [`crate::geometry`]).

use std::collections::BTreeSet;
use std::ops::{Index, IndexMut};

use crate::variant::PieceSet;

/// Cells of a shape in local coordinates, sorted.
pub type Shape = Vec<(i32, i32)>;

/// Index of a piece in the catalogue of a [`PieceSet`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Piece(u8);

impl Piece {
    #[inline]
    pub fn new(i: usize) -> Self {
        debug_assert!(i < u8::MAX as usize);
        Piece(i as u8)
    }

    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// A value for each piece of a catalogue.
#[derive(Debug, PartialEq, Eq, Default)]
pub struct PieceMap<T>(Vec<T>);

impl<T: Clone> Clone for PieceMap<T> {
    fn clone(&self) -> Self {
        PieceMap(self.0.clone())
    }

    fn clone_from(&mut self, source: &Self) {
        self.0.clone_from(&source.0);
    }
}

impl<T: Clone> PieceMap<T> {
    pub fn new(nu_pieces: usize, value: T) -> Self {
        PieceMap(vec![value; nu_pieces])
    }
}

impl<T> PieceMap<T> {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Piece, &T)> {
        self.0.iter().enumerate().map(|(i, v)| (Piece::new(i), v))
    }
}

impl<T> Index<Piece> for PieceMap<T> {
    type Output = T;

    #[inline]
    fn index(&self, piece: Piece) -> &T {
        &self.0[piece.index()]
    }
}

impl<T> IndexMut<Piece> for PieceMap<T> {
    #[inline]
    fn index_mut(&mut self, piece: Piece) -> &mut T {
        &mut self.0[piece.index()]
    }
}

/// A piece of the catalogue together with its distinct orientations.
#[derive(Clone, Debug)]
pub struct PieceInfo {
    pub name: String,
    /// Number of cells.
    pub size: u8,
    /// How many copies each color starts with.
    pub nu_instances: u8,
    /// Distinct normalized orientations (rotations and reflections).
    pub orientations: Vec<Shape>,
}

/// Build the catalogue of a piece set.
pub fn build_pieces(piece_set: PieceSet) -> Vec<PieceInfo> {
    let (shapes, is_trigon, nu_instances) = match piece_set {
        PieceSet::Classic => (free_polyforms(5, false), false, 1),
        PieceSet::Trigon => (free_polyforms(6, true), true, 1),
        PieceSet::Junior => (junior_shapes(), false, 2),
    };
    let mut letter = [0u8; 8];
    shapes
        .into_iter()
        .map(|shape| {
            let size = shape.len();
            let name = format!("{size}{}", (b'a' + letter[size]) as char);
            letter[size] += 1;
            PieceInfo {
                name,
                size: size as u8,
                nu_instances,
                orientations: orientations(&shape, is_trigon),
            }
        })
        .collect()
}

/// All free polyforms with 1 to `max_size` cells, ordered by size.
pub fn free_polyforms(max_size: usize, is_trigon: bool) -> Vec<Shape> {
    let mut result = Vec::new();
    let mut current: BTreeSet<Shape> = BTreeSet::new();
    current.insert(vec![(0, 0)]);
    for _ in 1..max_size {
        let mut next = BTreeSet::new();
        for shape in &current {
            for &(x, y) in shape {
                for n in neighbors(x, y, is_trigon) {
                    if shape.contains(&n) {
                        continue;
                    }
                    let mut grown = shape.clone();
                    grown.push(n);
                    next.insert(canonical(&grown, is_trigon));
                }
            }
        }
        result.extend(std::mem::replace(&mut current, next));
    }
    result.extend(current);
    result
}

/// Distinct orientations of a shape, each normalized.
pub fn orientations(shape: &[(i32, i32)], is_trigon: bool) -> Vec<Shape> {
    let mut seen = BTreeSet::new();
    transforms(shape, is_trigon)
        .into_iter()
        .filter(|s| seen.insert(s.clone()))
        .collect()
}

fn canonical(shape: &[(i32, i32)], is_trigon: bool) -> Shape {
    transforms(shape, is_trigon)
        .into_iter()
        .min()
        .unwrap_or_default()
}

fn neighbors(x: i32, y: i32, is_trigon: bool) -> Vec<(i32, i32)> {
    if !is_trigon {
        vec![(x, y - 1), (x - 1, y), (x + 1, y), (x, y + 1)]
    } else if (x + y) % 2 == 0 {
        vec![(x - 1, y), (x + 1, y), (x, y + 1)]
    } else {
        vec![(x, y - 1), (x - 1, y), (x + 1, y)]
    }
}

/// Every image of `shape` under the grid's symmetry group, normalized.
fn transforms(shape: &[(i32, i32)], is_trigon: bool) -> Vec<Shape> {
    if is_trigon {
        let mut cells: Vec<(i32, i32, i32)> = shape.iter().map(|&(x, y)| to_abc(x, y)).collect();
        let mut result = Vec::with_capacity(12);
        for _ in 0..6 {
            result.push(normalize_trigon(cells.iter().map(|&(a, b, c)| from_abc(a, b, c))));
            result.push(normalize_trigon(cells.iter().map(|&(a, b, c)| from_abc(b, a, c))));
            for cell in &mut cells {
                let (a, b, c) = *cell;
                *cell = (1 - b, 1 - c, 1 - a);
            }
        }
        result
    } else {
        let maps: [fn(i32, i32) -> (i32, i32); 8] = [
            |x, y| (x, y),
            |x, y| (-y, x),
            |x, y| (-x, -y),
            |x, y| (y, -x),
            |x, y| (-x, y),
            |x, y| (y, x),
            |x, y| (x, -y),
            |x, y| (-y, -x),
        ];
        maps.iter()
            .map(|f| normalize_square(shape.iter().map(|&(x, y)| f(x, y))))
            .collect()
    }
}

fn normalize_square(cells: impl Iterator<Item = (i32, i32)>) -> Shape {
    let cells: Vec<_> = cells.collect();
    let min_x = cells.iter().map(|c| c.0).min().unwrap_or(0);
    let min_y = cells.iter().map(|c| c.1).min().unwrap_or(0);
    let mut shape: Shape = cells.iter().map(|&(x, y)| (x - min_x, y - min_y)).collect();
    shape.sort_unstable();
    shape
}

/// Shift to `min_y == 0` and `min_x` in `{0, 1}`, keeping the orientation of
/// each triangle (the shift must have an even coordinate sum).
fn normalize_trigon(cells: impl Iterator<Item = (i32, i32)>) -> Shape {
    let cells: Vec<_> = cells.collect();
    let min_x = cells.iter().map(|c| c.0).min().unwrap_or(0);
    let min_y = cells.iter().map(|c| c.1).min().unwrap_or(0);
    let dy = -min_y;
    let mut dx = -min_x;
    if (dx + dy).rem_euclid(2) != 0 {
        dx += 1;
    }
    let mut shape: Shape = cells.iter().map(|&(x, y)| (x + dx, y + dy)).collect();
    shape.sort_unstable();
    shape
}

/// Triangle coordinates: `a + b + c` is 2 for up and 1 for down triangles.
fn to_abc(x: i32, y: i32) -> (i32, i32, i32) {
    let sum = if (x + y).rem_euclid(2) == 0 { 2 } else { 1 };
    ((x + sum + y) / 2, (sum + y - x) / 2, -y)
}

fn from_abc(a: i32, b: i32, c: i32) -> (i32, i32) {
    (a - b, -c)
}

fn junior_shapes() -> Vec<Shape> {
    let shapes: [&[(i32, i32)]; 12] = [
        &[(0, 0)],
        &[(0, 0), (1, 0)],
        &[(0, 0), (1, 0), (2, 0)],
        &[(0, 0), (0, 1), (1, 1)],
        &[(0, 0), (1, 0), (2, 0), (3, 0)],
        &[(0, 0), (0, 1), (0, 2), (1, 2)],
        &[(0, 0), (1, 0), (0, 1), (1, 1)],
        &[(0, 0), (1, 0), (2, 0), (1, 1)],
        &[(0, 0), (1, 0), (1, 1), (2, 1)],
        &[(0, 0), (0, 1), (0, 2), (0, 3), (1, 3)],
        &[(0, 0), (1, 0), (0, 1), (1, 1), (0, 2)],
        &[(0, 0), (2, 0), (0, 1), (1, 1), (2, 1)],
    ];
    shapes.iter().map(|s| normalize_square(s.iter().copied())).collect()
}
