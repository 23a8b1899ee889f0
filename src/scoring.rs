//! Game results in [0, 1] for any number of players.
//!
//! With two players (counting paired colors as one player) the result is
//! 1, 0 or 0.5 for win, loss or tie. With more players, the colors are ranked
//! by points: rank `i` of `n` (ascending, 0-based) is worth `i / (n - 1)`, and
//! tied colors share the average of the ranks they span. A sole winner gets
//! 1, a sole last place 0.

use crate::board::{Board, Float};
use crate::color::Color;

/// Points of the player owning `c`, including the paired color.
fn player_points(bd: &Board, c: Color) -> u32 {
    let second = bd.second_color(c);
    if second == c {
        bd.points_with_bonus(c)
    } else {
        bd.points_with_bonus(c) + bd.points_with_bonus(second)
    }
}

/// Result of the game from the view of color `c`.
pub fn game_result(bd: &Board, c: Color) -> Float {
    if bd.variant().nu_players() == 2 {
        let own = player_points(bd, c);
        let other = player_points(bd, c.next(bd.nu_colors()));
        return match own.cmp(&other) {
            std::cmp::Ordering::Greater => 1.0,
            std::cmp::Ordering::Less => 0.0,
            std::cmp::Ordering::Equal => 0.5,
        };
    }
    let points: Vec<u32> = bd.colors().map(|c| bd.points_with_bonus(c)).collect();
    rank_result(&points, c.index())
}

/// Rank value of entry `i` among `points`, averaged over ties.
pub fn rank_result(points: &[u32], i: usize) -> Float {
    let n = points.len();
    debug_assert!(n >= 2);
    let mut sorted = points.to_vec();
    sorted.sort_unstable();
    let own = points[i];
    let (sum, count) = sorted
        .iter()
        .enumerate()
        .filter(|&(_, &p)| p == own)
        .fold((0.0, 0u32), |(sum, count), (rank, _)| {
            (sum + rank as Float / (n - 1) as Float, count + 1)
        });
    sum / count as Float
}

/// Blend a game result with the score:
/// `(1 - w) * result + 0.5 * (w + score * k)`.
///
/// `k` is `w` divided by the total points of a piece set, which keeps the
/// score term inside `[-w/2, w/2]` and the blend inside `[0, 1]`.
#[inline]
pub fn blend_result(game_result: Float, score: Float, w: Float, k: Float) -> Float {
    (1.0 - w) * game_result + 0.5 * (w + score * k)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::variant::Variant;

    fn approx(a: Float, b: Float) -> bool {
        (a - b).abs() < 1e-5
    }

    #[test]
    fn test_rank_result_with_tie() {
        let points = [10, 5, 5, 20];
        assert!(approx(rank_result(&points, 3), 1.0));
        assert!(approx(rank_result(&points, 0), 2.0 / 3.0));
        assert!(approx(rank_result(&points, 1), 1.0 / 6.0));
        assert!(approx(rank_result(&points, 2), 1.0 / 6.0));
    }

    #[test]
    fn test_rank_result_all_tied() {
        for i in 0..3 {
            assert!(approx(rank_result(&[7, 7, 7], i), 0.5));
        }
    }

    #[test]
    fn test_two_player_result() {
        let mut bd = Board::new(Variant::Duo);
        let c0 = Color::new(0);
        let c1 = Color::new(1);
        assert_eq!(game_result(&bd, c0), 0.5);
        assert_eq!(game_result(&bd, c1), 0.5);
        let mv = bd.board_const().parse_move("e10").unwrap();
        bd.play(c0, mv);
        assert_eq!(game_result(&bd, c0), 1.0);
        assert_eq!(game_result(&bd, c1), 0.0);
    }

    #[test]
    fn test_blend_stays_in_range() {
        let w = 0.1;
        let k = w / 89.0;
        assert!(approx(blend_result(0.5, 0.0, w, k), 0.5));
        assert!(approx(blend_result(1.0, 89.0, w, k), 1.0));
        assert!(approx(blend_result(0.0, -89.0, w, k), 0.0));
    }
}
