//! Board geometry: points, grids, adjacency on square and triangular boards.
//!
//! Points are stored as a 1D index `y * width + x` into a rectangle that
//! encloses the board. Cells of the rectangle that are not part of the board
//! (the corners of the hexagonal Trigon boards) are never handed out.
//!
//! On triangular boards a cell with even `x + y` points up: its neighbors are
//! left, right and below. A cell with odd `x + y` points down. Boards with an
//! even edge length get one padding column on the left so that this rule
//! holds for every size.

use std::fmt;
use std::ops::{Index, IndexMut};

use crate::color::{Color, ColorMap};
use crate::constants::{CLASSIC_SIZE, DUO_SIZE, TRIGON_3_SIZE, TRIGON_SIZE};
use crate::variant::BoardType;

/// A board cell.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Point(u16);

impl Point {
    pub const NULL: Point = Point(u16::MAX);

    #[inline]
    pub(crate) fn from_index(i: usize) -> Self {
        debug_assert!(i < u16::MAX as usize);
        Point(i as u16)
    }

    #[inline]
    pub fn index(self) -> usize {
        debug_assert!(!self.is_null());
        self.0 as usize
    }

    #[inline]
    pub fn is_null(self) -> bool {
        self == Point::NULL
    }
}

/// A value for each cell of the enclosing rectangle.
#[derive(Debug, PartialEq, Eq)]
pub struct Grid<T>(Vec<T>);

impl<T: Clone> Grid<T> {
    pub fn new(geometry: &Geometry, value: T) -> Self {
        Grid(vec![value; geometry.range()])
    }

    pub fn fill(&mut self, value: T) {
        self.0.fill(value);
    }
}

impl<T: Clone> Clone for Grid<T> {
    fn clone(&self) -> Self {
        Grid(self.0.clone())
    }

    fn clone_from(&mut self, source: &Self) {
        self.0.clone_from(&source.0);
    }
}

impl<T> Index<Point> for Grid<T> {
    type Output = T;

    #[inline]
    fn index(&self, p: Point) -> &T {
        &self.0[p.index()]
    }
}

impl<T> IndexMut<Point> for Grid<T> {
    #[inline]
    fn index_mut(&mut self, p: Point) -> &mut T {
        &mut self.0[p.index()]
    }
}

/// Geometry of one board type.
pub struct Geometry {
    board_type: BoardType,
    width: u32,
    height: u32,
    /// Edge length of a triangular board, 0 for square boards.
    trigon_size: u32,
    x_offset: u32,
    /// Sum of the x-coordinates of a point and its point reflection.
    mirror_x_sum: u32,
    onboard: Vec<bool>,
    points: Vec<Point>,
    adj: Vec<Vec<Point>>,
    diag: Vec<Vec<Point>>,
    starting_points: ColorMap<Vec<Point>>,
}

impl Geometry {
    pub fn new(board_type: BoardType) -> Self {
        let (width, height, trigon_size, x_offset) = match board_type {
            BoardType::Classic => (CLASSIC_SIZE, CLASSIC_SIZE, 0, 0),
            BoardType::Duo => (DUO_SIZE, DUO_SIZE, 0, 0),
            BoardType::Trigon => trigon_dimensions(TRIGON_SIZE),
            BoardType::Trigon3 => trigon_dimensions(TRIGON_3_SIZE),
        };
        let mirror_x_sum = if trigon_size == 0 {
            width - 1
        } else {
            2 * x_offset + 4 * trigon_size - 2
        };
        let mut geometry = Geometry {
            board_type,
            width,
            height,
            trigon_size,
            x_offset,
            mirror_x_sum,
            onboard: Vec::new(),
            points: Vec::new(),
            adj: Vec::new(),
            diag: Vec::new(),
            starting_points: ColorMap::default(),
        };
        let range = (width * height) as usize;
        geometry.onboard = (0..range)
            .map(|i| geometry.init_is_onboard(i as u32 % width, i as u32 / width))
            .collect();
        geometry.points = (0..range)
            .filter(|&i| geometry.onboard[i])
            .map(Point::from_index)
            .collect();
        geometry.adj = vec![Vec::new(); range];
        geometry.diag = vec![Vec::new(); range];
        for i in 0..geometry.points.len() {
            let p = geometry.points[i];
            let (x, y) = (geometry.x(p) as i32, geometry.y(p) as i32);
            let adj: Vec<Point> = geometry
                .adj_coords(x, y)
                .into_iter()
                .filter_map(|(x, y)| geometry.point_at(x, y))
                .collect();
            let diag: Vec<Point> = geometry
                .diag_coords(x, y)
                .into_iter()
                .filter_map(|(x, y)| geometry.point_at(x, y))
                .collect();
            geometry.adj[p.index()] = adj;
            geometry.diag[p.index()] = diag;
        }
        geometry.starting_points = geometry.init_starting_points();
        geometry
    }

    pub fn board_type(&self) -> BoardType {
        self.board_type
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn is_trigon(&self) -> bool {
        self.trigon_size != 0
    }

    /// Size of the enclosing rectangle (the length of a `Grid`).
    pub fn range(&self) -> usize {
        (self.width * self.height) as usize
    }

    /// All on-board points in index order.
    pub fn points(&self) -> &[Point] {
        &self.points
    }

    #[inline]
    pub fn x(&self, p: Point) -> u32 {
        p.index() as u32 % self.width
    }

    #[inline]
    pub fn y(&self, p: Point) -> u32 {
        p.index() as u32 / self.width
    }

    /// The on-board point at the given coordinates.
    pub fn point_at(&self, x: i32, y: i32) -> Option<Point> {
        if x < 0 || y < 0 || x >= self.width as i32 || y >= self.height as i32 {
            return None;
        }
        let i = (y as u32 * self.width + x as u32) as usize;
        self.onboard[i].then(|| Point::from_index(i))
    }

    /// Edge-adjacent points.
    #[inline]
    pub fn adj(&self, p: Point) -> &[Point] {
        &self.adj[p.index()]
    }

    /// Points that touch `p` only at a corner.
    #[inline]
    pub fn diag(&self, p: Point) -> &[Point] {
        &self.diag[p.index()]
    }

    pub fn starting_points(&self, c: Color) -> &[Point] {
        &self.starting_points[c]
    }

    /// Point reflection through the board center.
    pub fn mirror(&self, p: Point) -> Point {
        let x = self.mirror_x_sum - self.x(p);
        let y = self.height - 1 - self.y(p);
        Point::from_index((y * self.width + x) as usize)
    }

    /// Center of the board in point coordinates.
    pub fn center(&self) -> (f32, f32) {
        (
            0.5 * self.mirror_x_sum as f32,
            0.5 * self.height as f32 - 0.5,
        )
    }

    /// Short label of a point like `c4` (column letter, row counted from the bottom).
    pub fn label(&self, p: Point) -> String {
        let x = self.x(p);
        let mut s = String::new();
        if x >= 26 {
            s.push((b'a' + (x / 26 - 1) as u8) as char);
        }
        s.push((b'a' + (x % 26) as u8) as char);
        format!("{s}{}", self.height - self.y(p))
    }

    /// Parse a label produced by [`Geometry::label`].
    pub fn parse_label(&self, s: &str) -> Option<Point> {
        let s = s.trim();
        let split = s.find(|c: char| c.is_ascii_digit())?;
        let (col, row) = s.split_at(split);
        let col = col.as_bytes();
        let x = match col {
            [c] if c.is_ascii_lowercase() => (c - b'a') as i32,
            [h, c] if h.is_ascii_lowercase() && c.is_ascii_lowercase() => {
                (((h - b'a') as i32 + 1) * 26) + (c - b'a') as i32
            }
            _ => return None,
        };
        let row: i32 = row.parse().ok()?;
        self.point_at(x, self.height as i32 - row)
    }

    fn init_is_onboard(&self, x: u32, y: u32) -> bool {
        if !self.is_trigon() {
            return true;
        }
        if x < self.x_offset {
            return false;
        }
        let x = x - self.x_offset;
        let sz = self.trigon_size;
        let dy = y.min(self.height - y - 1);
        let min_x = sz - dy - 1;
        let max_x = 4 * sz - 2 - min_x;
        x >= min_x && x <= max_x
    }

    fn adj_coords(&self, x: i32, y: i32) -> Vec<(i32, i32)> {
        if !self.is_trigon() {
            vec![(x, y - 1), (x - 1, y), (x + 1, y), (x, y + 1)]
        } else if (x + y) % 2 == 0 {
            vec![(x - 1, y), (x + 1, y), (x, y + 1)]
        } else {
            vec![(x, y - 1), (x - 1, y), (x + 1, y)]
        }
    }

    fn diag_coords(&self, x: i32, y: i32) -> Vec<(i32, i32)> {
        if !self.is_trigon() {
            vec![(x - 1, y - 1), (x + 1, y - 1), (x - 1, y + 1), (x + 1, y + 1)]
        } else if (x + y) % 2 == 0 {
            vec![
                (x - 2, y),
                (x + 2, y),
                (x - 1, y - 1),
                (x + 1, y - 1),
                (x + 1, y + 1),
                (x - 1, y + 1),
                (x, y - 1),
                (x - 2, y + 1),
                (x + 2, y + 1),
            ]
        } else {
            vec![
                (x - 2, y),
                (x + 2, y),
                (x - 1, y + 1),
                (x + 1, y + 1),
                (x + 1, y - 1),
                (x - 1, y - 1),
                (x, y + 1),
                (x - 2, y - 1),
                (x + 2, y - 1),
            ]
        }
    }

    fn init_starting_points(&self) -> ColorMap<Vec<Point>> {
        let (w, h) = (self.width as i32, self.height as i32);
        let at = |coords: &[(i32, i32)]| -> Vec<Point> {
            coords
                .iter()
                .filter_map(|&(x, y)| self.point_at(x, y))
                .collect()
        };
        match self.board_type {
            BoardType::Classic => ColorMap([
                at(&[(0, 0)]),
                at(&[(w - 1, 0)]),
                at(&[(w - 1, h - 1)]),
                at(&[(0, h - 1)]),
            ]),
            BoardType::Duo => ColorMap([
                at(&[(4, 4)]),
                at(&[(w - 5, h - 5)]),
                Vec::new(),
                Vec::new(),
            ]),
            BoardType::Trigon | BoardType::Trigon3 => {
                let cx = self.mirror_x_sum as i32 / 2;
                let shared = at(&[
                    (cx, 3),
                    (cx - 8, 6),
                    (cx + 8, 6),
                    (cx - 8, h - 7),
                    (cx + 8, h - 7),
                    (cx, h - 4),
                ]);
                ColorMap::from_fn(|_| shared.clone())
            }
        }
    }
}

fn trigon_dimensions(sz: u32) -> (u32, u32, u32, u32) {
    let x_offset = (sz + 1) % 2;
    (4 * sz - 1 + x_offset, 2 * sz, sz, x_offset)
}

impl fmt::Debug for Geometry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Geometry")
            .field("board_type", &self.board_type)
            .field("width", &self.width)
            .field("height", &self.height)
            .field("nu_points", &self.points.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_square_sizes() {
        let g = Geometry::new(BoardType::Classic);
        assert_eq!(g.points().len(), 400);
        let g = Geometry::new(BoardType::Duo);
        assert_eq!(g.points().len(), 196);
        let corner = g.point_at(0, 0).unwrap();
        assert_eq!(g.adj(corner).len(), 2);
        assert_eq!(g.diag(corner).len(), 1);
    }

    #[test]
    fn test_trigon_sizes() {
        // A hexagon with edge n has 6 * n * n triangles.
        let g = Geometry::new(BoardType::Trigon);
        assert_eq!(g.points().len(), 6 * 9 * 9);
        let g = Geometry::new(BoardType::Trigon3);
        assert_eq!(g.points().len(), 6 * 8 * 8);
    }

    #[test]
    fn test_trigon_adjacency_is_symmetric() {
        for board_type in [BoardType::Trigon, BoardType::Trigon3] {
            let g = Geometry::new(board_type);
            for &p in g.points() {
                assert!(g.adj(p).len() <= 3);
                for &q in g.adj(p) {
                    assert!(g.adj(q).contains(&p), "adjacency not symmetric");
                }
                for &q in g.diag(p) {
                    assert!(g.diag(q).contains(&p), "diagonals not symmetric");
                    assert!(!g.adj(p).contains(&q));
                }
            }
        }
    }

    #[test]
    fn test_mirror_stays_on_board() {
        for board_type in [
            BoardType::Classic,
            BoardType::Duo,
            BoardType::Trigon,
            BoardType::Trigon3,
        ] {
            let g = Geometry::new(board_type);
            for &p in g.points() {
                let m = g.mirror(p);
                assert!(g.point_at(g.x(m) as i32, g.y(m) as i32).is_some());
                assert_eq!(g.mirror(m), p);
            }
        }
    }

    #[test]
    fn test_starting_points_on_board() {
        let g = Geometry::new(BoardType::Trigon3);
        assert_eq!(g.starting_points(Color::new(2)).len(), 6);
        let g = Geometry::new(BoardType::Duo);
        let p0 = g.starting_points(Color::new(0))[0];
        let p1 = g.starting_points(Color::new(1))[0];
        assert_eq!(g.mirror(p0), p1);
    }

    #[test]
    fn test_label_roundtrip() {
        let g = Geometry::new(BoardType::Trigon);
        for &p in g.points() {
            assert_eq!(g.parse_label(&g.label(p)), Some(p));
        }
    }
}
