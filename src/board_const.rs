//! Precomputed move tables shared by all boards of a variant family.
//!
//! A [`BoardConst`] holds everything that depends only on the board type and
//! the piece set:
//! - the [`Geometry`] and the piece catalogue
//! - one [`MoveInfo`] per placement of every piece orientation
//! - [`MoveInfoExt`] with attach points, adjacent points and the mirrored move
//! - the lookup of moves of a piece covering a point
//!
//! Tables are built at most once per key by a [`Registry`].

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, OnceLock, PoisonError};

use thiserror::Error;

use crate::geometry::{Geometry, Point};
use crate::piece::{Piece, PieceInfo, build_pieces};
use crate::variant::{BoardType, PieceSet, Variant};

/// A piece placement, or one of the special values [`Move::PASS`] and [`Move::NULL`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Move(u32);

impl Move {
    pub const PASS: Move = Move(u32::MAX - 1);
    pub const NULL: Move = Move(u32::MAX);

    #[inline]
    pub(crate) fn from_index(i: usize) -> Self {
        debug_assert!(i < Move::PASS.0 as usize);
        Move(i as u32)
    }

    /// Index into the move table. Only valid for regular moves.
    #[inline]
    pub fn index(self) -> usize {
        debug_assert!(self.is_regular());
        self.0 as usize
    }

    #[inline]
    pub fn is_regular(self) -> bool {
        self.0 < Move::PASS.0
    }

    #[inline]
    pub fn is_pass(self) -> bool {
        self == Move::PASS
    }

    #[inline]
    pub fn is_null(self) -> bool {
        self == Move::NULL
    }
}

#[derive(Clone, Debug)]
pub struct MoveInfo {
    pub piece: Piece,
    /// Covered points in index order.
    pub points: Box<[Point]>,
}

#[derive(Clone, Debug)]
pub struct MoveInfoExt {
    /// Points touching the move only at a corner. The move's color may attach
    /// its next pieces there.
    pub attach_points: Box<[Point]>,
    /// Points sharing an edge with the move; forbidden for the same color
    /// once the move is played.
    pub adj_points: Box<[Point]>,
    /// The placement mirrored through the board center.
    pub symmetric_move: Move,
    /// The move covers a point together with its mirror image, so the other
    /// player cannot answer with the mirrored move.
    pub breaks_symmetry: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseMoveError {
    #[error("empty move")]
    Empty,
    #[error("invalid point '{0}'")]
    InvalidPoint(String),
    #[error("no piece covers exactly '{0}'")]
    NoSuchMove(String),
}

pub struct BoardConst {
    board_type: BoardType,
    piece_set: PieceSet,
    geometry: Geometry,
    pieces: Vec<PieceInfo>,
    move_info: Vec<MoveInfo>,
    move_info_ext: Vec<MoveInfoExt>,
    /// Indexed by `piece * range + point`.
    moves_at: Vec<Box<[Move]>>,
    lookup: HashMap<Box<[Point]>, Move>,
    total_piece_points: u32,
}

impl BoardConst {
    pub fn new(board_type: BoardType, piece_set: PieceSet) -> Self {
        let geometry = Geometry::new(board_type);
        let pieces = build_pieces(piece_set);
        let range = geometry.range();

        let mut move_info = Vec::new();
        for (i, piece) in pieces.iter().enumerate() {
            for shape in &piece.orientations {
                for ty in -1..geometry.height() as i32 {
                    for tx in -2..geometry.width() as i32 {
                        if geometry.is_trigon() && (tx + ty).rem_euclid(2) != 0 {
                            continue;
                        }
                        let points: Option<Vec<Point>> = shape
                            .iter()
                            .map(|&(x, y)| geometry.point_at(x + tx, y + ty))
                            .collect();
                        if let Some(mut points) = points {
                            points.sort_unstable();
                            move_info.push(MoveInfo {
                                piece: Piece::new(i),
                                points: points.into_boxed_slice(),
                            });
                        }
                    }
                }
            }
        }

        let lookup: HashMap<Box<[Point]>, Move> = move_info
            .iter()
            .enumerate()
            .map(|(i, info)| (info.points.clone(), Move::from_index(i)))
            .collect();

        let mut moves_at = vec![Vec::new(); pieces.len() * range];
        for (i, info) in move_info.iter().enumerate() {
            for p in info.points.iter() {
                moves_at[info.piece.index() * range + p.index()].push(Move::from_index(i));
            }
        }

        let move_info_ext = move_info
            .iter()
            .map(|info| compute_info_ext(&geometry, &lookup, &info.points))
            .collect();

        let total_piece_points = pieces
            .iter()
            .map(|p| p.size as u32 * p.nu_instances as u32)
            .sum();

        log::debug!(
            "built move table for {:?}/{:?}: {} moves",
            board_type,
            piece_set,
            move_info.len()
        );

        BoardConst {
            board_type,
            piece_set,
            geometry,
            pieces,
            move_info,
            move_info_ext,
            moves_at: moves_at.into_iter().map(Vec::into_boxed_slice).collect(),
            lookup,
            total_piece_points,
        }
    }

    pub fn board_type(&self) -> BoardType {
        self.board_type
    }

    pub fn piece_set(&self) -> PieceSet {
        self.piece_set
    }

    pub fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    pub fn nu_pieces(&self) -> usize {
        self.pieces.len()
    }

    pub fn pieces(&self) -> impl Iterator<Item = Piece> + Clone {
        (0..self.pieces.len()).map(Piece::new)
    }

    pub fn piece_info(&self, piece: Piece) -> &PieceInfo {
        &self.pieces[piece.index()]
    }

    /// Number of regular moves.
    pub fn nu_moves(&self) -> usize {
        self.move_info.len()
    }

    #[inline]
    pub fn move_info(&self, mv: Move) -> &MoveInfo {
        &self.move_info[mv.index()]
    }

    #[inline]
    pub fn move_info_ext(&self, mv: Move) -> &MoveInfoExt {
        &self.move_info_ext[mv.index()]
    }

    /// Moves of `piece` that cover `p`.
    #[inline]
    pub fn moves_at(&self, piece: Piece, p: Point) -> &[Move] {
        &self.moves_at[piece.index() * self.geometry.range() + p.index()]
    }

    /// Sum of the sizes of all piece instances of one color.
    pub fn total_piece_points(&self) -> u32 {
        self.total_piece_points
    }

    /// The move covering exactly the given points.
    pub fn find_move(&self, points: &[Point]) -> Option<Move> {
        let mut points = points.to_vec();
        points.sort_unstable();
        self.lookup.get(points.as_slice()).copied()
    }

    /// Move notation: comma-separated point labels, or `pass`.
    pub fn move_to_string(&self, mv: Move) -> String {
        if mv.is_pass() {
            return "pass".to_string();
        }
        if mv.is_null() {
            return "null".to_string();
        }
        self.move_info(mv)
            .points
            .iter()
            .map(|&p| self.geometry.label(p))
            .collect::<Vec<_>>()
            .join(",")
    }

    pub fn parse_move(&self, s: &str) -> Result<Move, ParseMoveError> {
        let s = s.trim();
        if s.is_empty() {
            return Err(ParseMoveError::Empty);
        }
        if s.eq_ignore_ascii_case("pass") {
            return Ok(Move::PASS);
        }
        let points = s
            .split(',')
            .map(|label| {
                self.geometry
                    .parse_label(&label.to_ascii_lowercase())
                    .ok_or_else(|| ParseMoveError::InvalidPoint(label.trim().to_string()))
            })
            .collect::<Result<Vec<_>, _>>()?;
        self.find_move(&points)
            .ok_or_else(|| ParseMoveError::NoSuchMove(s.to_string()))
    }
}

fn compute_info_ext(
    geometry: &Geometry,
    lookup: &HashMap<Box<[Point]>, Move>,
    points: &[Point],
) -> MoveInfoExt {
    let mut adj_points = Vec::new();
    for &p in points {
        for &q in geometry.adj(p) {
            if !points.contains(&q) && !adj_points.contains(&q) {
                adj_points.push(q);
            }
        }
    }
    let mut attach_points = Vec::new();
    for &p in points {
        for &q in geometry.diag(p) {
            if !points.contains(&q) && !adj_points.contains(&q) && !attach_points.contains(&q) {
                attach_points.push(q);
            }
        }
    }
    let mut mirrored: Vec<Point> = points.iter().map(|&p| geometry.mirror(p)).collect();
    let breaks_symmetry = mirrored.iter().any(|p| points.contains(p));
    mirrored.sort_unstable();
    let symmetric_move = lookup.get(mirrored.as_slice()).copied().unwrap_or(Move::NULL);
    MoveInfoExt {
        attach_points: attach_points.into_boxed_slice(),
        adj_points: adj_points.into_boxed_slice(),
        symmetric_move,
        breaks_symmetry,
    }
}

impl fmt::Debug for BoardConst {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoardConst")
            .field("board_type", &self.board_type)
            .field("piece_set", &self.piece_set)
            .field("nu_pieces", &self.pieces.len())
            .field("nu_moves", &self.move_info.len())
            .finish()
    }
}

/// Cache of move tables, keyed by board type and piece set.
///
/// Each table is built at most once per registry; callers share it through
/// an `Arc`.
#[derive(Default)]
pub struct Registry {
    tables: Mutex<HashMap<(BoardType, PieceSet), Arc<BoardConst>>>,
}

static GLOBAL_REGISTRY: OnceLock<Registry> = OnceLock::new();

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide registry.
    pub fn global() -> &'static Registry {
        GLOBAL_REGISTRY.get_or_init(Registry::new)
    }

    pub fn get(&self, variant: Variant) -> Arc<BoardConst> {
        let key = (variant.board_type(), variant.piece_set());
        // A panic while building leaves the map untouched, so a poisoned
        // lock is still consistent.
        let mut tables = self.tables.lock().unwrap_or_else(PoisonError::into_inner);
        tables
            .entry(key)
            .or_insert_with(|| Arc::new(BoardConst::new(key.0, key.1)))
            .clone()
    }

    /// Number of tables built so far.
    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.tables.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_move_counts_nonzero() {
        let registry = Registry::new();
        for v in [Variant::Duo, Variant::Junior, Variant::Trigon3] {
            let bc = registry.get(v);
            assert!(bc.nu_moves() > 0);
            for i in 0..bc.nu_moves() {
                let info = bc.move_info(Move::from_index(i));
                let size = bc.piece_info(info.piece).size as usize;
                assert_eq!(info.points.len(), size);
            }
        }
    }

    #[test]
    fn test_registry_shares_tables() {
        let registry = Registry::new();
        assert!(registry.is_empty());
        let a = registry.get(Variant::Duo);
        let b = registry.get(Variant::Duo);
        assert!(Arc::ptr_eq(&a, &b));
        let c = registry.get(Variant::Junior);
        assert!(!Arc::ptr_eq(&a, &c));
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_moves_at_cover_point() {
        let bc = Registry::global().get(Variant::Duo);
        let g = bc.geometry();
        let p = g.point_at(4, 4).unwrap();
        for piece in bc.pieces() {
            let moves = bc.moves_at(piece, p);
            assert!(!moves.is_empty());
            for &mv in moves {
                assert_eq!(bc.move_info(mv).piece, piece);
                assert!(bc.move_info(mv).points.contains(&p));
            }
        }
    }

    #[test]
    fn test_symmetric_move_is_involution() {
        let bc = Registry::global().get(Variant::Duo);
        for i in 0..bc.nu_moves() {
            let mv = Move::from_index(i);
            let symm = bc.move_info_ext(mv).symmetric_move;
            assert!(!symm.is_null());
            assert_eq!(bc.move_info_ext(symm).symmetric_move, mv);
        }
    }

    #[test]
    fn test_move_notation() {
        let bc = Registry::global().get(Variant::Duo);
        let mv = bc.parse_move("a1,b1").unwrap();
        assert_eq!(bc.move_info(mv).points.len(), 2);
        assert_eq!(bc.move_to_string(mv), "a1,b1");
        assert_eq!(bc.parse_move(" B1 , A1 "), Ok(mv));
        assert_eq!(bc.parse_move("pass"), Ok(Move::PASS));
        assert!(matches!(bc.parse_move("a1,c1"), Err(ParseMoveError::NoSuchMove(_))));
        assert!(matches!(bc.parse_move("z99"), Err(ParseMoveError::InvalidPoint(_))));
    }
}
