//! Detection of positions where the second player mirrors the first.
//!
//! In Duo, Junior and Trigon with two players the second player can copy
//! every move of the first player through the board center. Such a position
//! is a draw unless the first player breaks the symmetry, so playouts score
//! unbroken symmetric positions as 0.5.

use crate::board::Board;
use crate::board_const::Move;
use crate::color::Color;
use crate::geometry::{Geometry, Grid, Point};

/// Point reflection table. `mirror(mirror(p)) == p` for every point.
#[derive(Clone, Debug)]
pub struct SymmetricPoints(Grid<Point>);

impl SymmetricPoints {
    pub fn new(geometry: &Geometry) -> Self {
        let mut grid = Grid::new(geometry, Point::NULL);
        for &p in geometry.points() {
            grid[p] = geometry.mirror(p);
        }
        SymmetricPoints(grid)
    }

    #[inline]
    pub fn mirror(&self, p: Point) -> Point {
        self.0[p]
    }
}

/// The color a mirrored stone must have: colors 0/1 and 2/3 are swapped.
#[inline]
pub fn symmetric_state(s: Option<Color>) -> Option<Color> {
    s.map(|c| Color::new(c.to_int() ^ 1))
}

/// True if the first player of a pair is to play.
#[inline]
pub fn is_first_player(c: Color) -> bool {
    c.to_int() % 2 == 0
}

/// Full scan of the board.
///
/// With the first player to play, the position must be symmetric. With the
/// second player to play, the last move (by the previous color) may still be
/// unanswered: its points and their empty mirror points are tolerated.
pub fn check_symmetry_broken(bd: &Board, symmetric_points: &SymmetricPoints) -> bool {
    let to_play = bd.to_play();
    let geometry = bd.geometry();
    if is_first_player(to_play) {
        return geometry.points().iter().any(|&p| {
            bd.point_state(p) != symmetric_state(bd.point_state(symmetric_points.mirror(p)))
        });
    }
    let nu_moves = bd.nu_moves();
    if nu_moves == 0 {
        // The second player moving first only happens in setup positions.
        return true;
    }
    let previous = bd.previous_color(to_play);
    let last = bd.get_move(nu_moves - 1);
    if last.color != previous || !last.mv.is_regular() {
        return true;
    }
    let points = &bd.board_const().move_info(last.mv).points;
    for &p in geometry.points() {
        let symm_p = symmetric_points.mirror(p);
        let s1 = bd.point_state(p);
        let s2 = bd.point_state(symm_p);
        if s1 == symmetric_state(s2) {
            continue;
        }
        let unanswered = (points.contains(&p) && s1 == Some(previous) && s2.is_none())
            || (points.contains(&symm_p) && s1.is_none() && s2 == Some(previous));
        if !unanswered {
            return true;
        }
    }
    false
}

/// Incremental check after `mv` was played on a position that was
/// symmetric. Returns true if the move broke the symmetry.
pub fn update_symmetry_broken(
    bd: &Board,
    symmetric_points: &SymmetricPoints,
    mv: Move,
) -> bool {
    debug_assert!(mv.is_regular());
    let points = &bd.board_const().move_info(mv).points;
    let to_play = bd.to_play();
    if is_first_player(to_play) {
        // The second player answered: the answer must be the mirror image of
        // the first player's last move, not just lie on its mirror points.
        let nu_moves = bd.nu_moves();
        if nu_moves < 2 {
            return true;
        }
        let first = bd.get_move(nu_moves - 2);
        if first.mv.is_pass() || bd.board_const().move_info_ext(first.mv).symmetric_move != mv {
            return true;
        }
        let expected = symmetric_state(Some(first.color));
        points
            .iter()
            .any(|&p| bd.point_state(symmetric_points.mirror(p)) != expected)
    } else {
        // The first player moved: the mirror points must still be free.
        points
            .iter()
            .any(|&p| bd.point_state(symmetric_points.mirror(p)).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::variant::{BoardType, Variant};

    #[test]
    fn test_symmetric_points_involution() {
        for board_type in [BoardType::Duo, BoardType::Trigon] {
            let g = Geometry::new(board_type);
            let sp = SymmetricPoints::new(&g);
            for &p in g.points() {
                assert_eq!(sp.mirror(sp.mirror(p)), p);
            }
        }
    }

    #[test]
    fn test_symmetric_state() {
        assert_eq!(symmetric_state(None), None);
        assert_eq!(symmetric_state(Some(Color::new(0))), Some(Color::new(1)));
        assert_eq!(symmetric_state(Some(Color::new(3))), Some(Color::new(2)));
    }

    #[test]
    fn test_mirrored_duo_position_is_symmetric() {
        let mut bd = Board::new(Variant::Duo);
        let sp = SymmetricPoints::new(bd.geometry());
        assert!(!check_symmetry_broken(&bd, &sp));
        let mv = bd.board_const().parse_move("e10,f10").unwrap();
        bd.play(Color::new(0), mv);
        assert!(!update_symmetry_broken(&bd, &sp, mv));
        // Second player to play, last move unanswered: still symmetric.
        assert!(!check_symmetry_broken(&bd, &sp));
        let answer = bd.board_const().move_info_ext(mv).symmetric_move;
        bd.play(Color::new(1), answer);
        assert!(!update_symmetry_broken(&bd, &sp, answer));
        assert!(!check_symmetry_broken(&bd, &sp));
    }

    #[test]
    fn test_other_answer_breaks_symmetry() {
        let mut bd = Board::new(Variant::Duo);
        let sp = SymmetricPoints::new(bd.geometry());
        let mv = bd.board_const().parse_move("e10,f10").unwrap();
        bd.play(Color::new(0), mv);
        // j5 is the starting point of color 1; a monomino is not the mirror.
        let answer = bd.board_const().parse_move("j5").unwrap();
        bd.play(Color::new(1), answer);
        assert!(update_symmetry_broken(&bd, &sp, answer));
        assert!(check_symmetry_broken(&bd, &sp));
    }
}
