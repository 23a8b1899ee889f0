//! Mutable game board.
//!
//! The board keeps, per color, the grid of forbidden points (occupied, or
//! edge-adjacent to the color's own pieces) and the list of attach points
//! (corner-adjacent to the color's own pieces). These two make the legality
//! test of a move a scan over its points.
//!
//! The board owns one optional snapshot. `restore_snapshot` copies the saved
//! state back field by field, reusing allocations, which makes it cheap
//! enough to run at the start of every simulation.

use std::fmt;
use std::sync::Arc;

use thiserror::Error;

use crate::board_const::{BoardConst, Move, Registry};
use crate::color::{Color, ColorMap, ColorMove};
use crate::constants::{BONUS_ALL_PIECES, BONUS_MONOMINO_LAST};
use crate::geometry::{Geometry, Grid, Point};
use crate::piece::{Piece, PieceMap};
use crate::variant::{PieceSet, Variant};

/// Score and result values.
pub type Float = f32;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BoardError {
    #[error("color {0} does not play in this variant")]
    InvalidColor(u8),
    #[error("null move")]
    NullMove,
    #[error("illegal move {0}")]
    IllegalMove(String),
}

#[derive(Debug, PartialEq, Eq)]
struct BoardState {
    to_play: Color,
    point_state: Grid<Option<Color>>,
    forbidden: ColorMap<Grid<bool>>,
    is_attach_point: ColorMap<Grid<bool>>,
    attach_points: ColorMap<Vec<Point>>,
    pieces_left: ColorMap<Vec<Piece>>,
    nu_left: ColorMap<PieceMap<u8>>,
    nu_onboard: ColorMap<u32>,
    points: ColorMap<u32>,
    bonus: ColorMap<u32>,
    moves: Vec<ColorMove>,
}

impl BoardState {
    fn new(bc: &BoardConst) -> Self {
        let geometry = bc.geometry();
        let mut nu_left = PieceMap::new(bc.nu_pieces(), 0);
        for piece in bc.pieces() {
            nu_left[piece] = bc.piece_info(piece).nu_instances;
        }
        BoardState {
            to_play: Color::new(0),
            point_state: Grid::new(geometry, None),
            forbidden: ColorMap::from_fn(|_| Grid::new(geometry, false)),
            is_attach_point: ColorMap::from_fn(|_| Grid::new(geometry, false)),
            attach_points: ColorMap::default(),
            pieces_left: ColorMap::from_fn(|_| bc.pieces().collect()),
            nu_left: ColorMap::from_fn(|_| nu_left.clone()),
            nu_onboard: ColorMap::filled(0),
            points: ColorMap::filled(0),
            bonus: ColorMap::filled(0),
            moves: Vec::new(),
        }
    }
}

impl Clone for BoardState {
    fn clone(&self) -> Self {
        BoardState {
            to_play: self.to_play,
            point_state: self.point_state.clone(),
            forbidden: self.forbidden.clone(),
            is_attach_point: self.is_attach_point.clone(),
            attach_points: self.attach_points.clone(),
            pieces_left: self.pieces_left.clone(),
            nu_left: self.nu_left.clone(),
            nu_onboard: self.nu_onboard.clone(),
            points: self.points.clone(),
            bonus: self.bonus.clone(),
            moves: self.moves.clone(),
        }
    }

    fn clone_from(&mut self, source: &Self) {
        self.to_play = source.to_play;
        self.point_state.clone_from(&source.point_state);
        self.forbidden.clone_from(&source.forbidden);
        self.is_attach_point.clone_from(&source.is_attach_point);
        self.attach_points.clone_from(&source.attach_points);
        self.pieces_left.clone_from(&source.pieces_left);
        self.nu_left.clone_from(&source.nu_left);
        self.nu_onboard.clone_from(&source.nu_onboard);
        self.points.clone_from(&source.points);
        self.bonus.clone_from(&source.bonus);
        self.moves.clone_from(&source.moves);
    }
}

pub struct Board {
    variant: Variant,
    nu_colors: u8,
    bc: Arc<BoardConst>,
    state: BoardState,
    snapshot: Option<BoardState>,
}

impl Board {
    /// An empty board using the process-wide move table registry.
    pub fn new(variant: Variant) -> Self {
        Self::with_board_const(variant, Registry::global().get(variant))
    }

    pub fn with_board_const(variant: Variant, bc: Arc<BoardConst>) -> Self {
        debug_assert_eq!(bc.board_type(), variant.board_type());
        let state = BoardState::new(&bc);
        Board {
            variant,
            nu_colors: variant.nu_colors(),
            bc,
            state,
            snapshot: None,
        }
    }

    pub fn variant(&self) -> Variant {
        self.variant
    }

    pub fn nu_colors(&self) -> u8 {
        self.nu_colors
    }

    pub fn board_const(&self) -> &Arc<BoardConst> {
        &self.bc
    }

    pub fn geometry(&self) -> &Geometry {
        self.bc.geometry()
    }

    pub fn colors(&self) -> impl Iterator<Item = Color> + Clone {
        Color::all(self.nu_colors)
    }

    pub fn to_play(&self) -> Color {
        self.state.to_play
    }

    pub fn set_to_play(&mut self, c: Color) {
        debug_assert!(c.to_int() < self.nu_colors);
        self.state.to_play = c;
    }

    pub fn next_color(&self, c: Color) -> Color {
        c.next(self.nu_colors)
    }

    pub fn previous_color(&self, c: Color) -> Color {
        c.previous(self.nu_colors)
    }

    pub fn second_color(&self, c: Color) -> Color {
        self.variant.second_color(c)
    }

    #[inline]
    pub fn point_state(&self, p: Point) -> Option<Color> {
        self.state.point_state[p]
    }

    #[inline]
    pub fn is_forbidden_at(&self, p: Point, c: Color) -> bool {
        self.state.forbidden[c][p]
    }

    /// The forbidden grid of a color, for scans over many points.
    #[inline]
    pub fn forbidden(&self, c: Color) -> &Grid<bool> {
        &self.state.forbidden[c]
    }

    /// True if any point of the move is forbidden for `c`.
    pub fn is_forbidden(&self, c: Color, mv: Move) -> bool {
        let forbidden = &self.state.forbidden[c];
        self.bc.move_info(mv).points.iter().any(|&p| forbidden[p])
    }

    #[inline]
    pub fn is_attach_point(&self, p: Point, c: Color) -> bool {
        self.state.is_attach_point[c][p]
    }

    /// Attach points of `c`. Points may have become forbidden since they were
    /// added.
    pub fn attach_points(&self, c: Color) -> &[Point] {
        &self.state.attach_points[c]
    }

    /// Pieces with at least one instance left.
    pub fn pieces_left(&self, c: Color) -> &[Piece] {
        &self.state.pieces_left[c]
    }

    pub fn nu_left(&self, c: Color, piece: Piece) -> u8 {
        self.state.nu_left[c][piece]
    }

    pub fn is_first_piece(&self, c: Color) -> bool {
        self.state.nu_onboard[c] == 0
    }

    pub fn starting_points(&self, c: Color) -> &[Point] {
        self.bc.geometry().starting_points(c)
    }

    /// Number of pieces on the board, all colors.
    pub fn nu_onboard_pieces(&self) -> u32 {
        self.state.nu_onboard.iter().sum()
    }

    pub fn nu_onboard_pieces_of(&self, c: Color) -> u32 {
        self.state.nu_onboard[c]
    }

    pub fn nu_moves(&self) -> usize {
        self.state.moves.len()
    }

    pub fn get_move(&self, i: usize) -> ColorMove {
        self.state.moves[i]
    }

    pub fn moves(&self) -> &[ColorMove] {
        &self.state.moves
    }

    pub fn points(&self, c: Color) -> u32 {
        self.state.points[c]
    }

    pub fn bonus(&self, c: Color) -> u32 {
        self.state.bonus[c]
    }

    pub fn points_with_bonus(&self, c: Color) -> u32 {
        self.state.points[c] + self.state.bonus[c]
    }

    /// Score of `c` including bonuses (see [`Board::score_without_bonus`]).
    pub fn score(&self, c: Color) -> Float {
        self.score_from(c, |c| self.points_with_bonus(c))
    }

    /// Score of `c` relative to the other colors:
    /// - two colors: own points minus the opponent's
    /// - paired colors: the pair's sum minus the other pair's sum
    /// - otherwise: own points minus the mean of the others
    pub fn score_without_bonus(&self, c: Color) -> Float {
        self.score_from(c, |c| self.points(c))
    }

    fn score_from(&self, c: Color, points: impl Fn(Color) -> u32) -> Float {
        if self.nu_colors == 2 {
            let other = c.next(2);
            return points(c) as Float - points(other) as Float;
        }
        if self.variant.has_paired_colors() {
            let own = points(c) + points(self.second_color(c));
            let other_color = c.next(self.nu_colors);
            let other = points(other_color) + points(self.second_color(other_color));
            return own as Float - other as Float;
        }
        let own = points(c) as Float;
        let others: u32 = self.colors().filter(|&i| i != c).map(&points).sum();
        own - others as Float / (self.nu_colors - 1) as Float
    }

    /// Upper bound on the number of moves (including passes) in a game.
    pub fn max_game_moves(&self) -> usize {
        let instances: usize = self
            .bc
            .pieces()
            .map(|piece| self.bc.piece_info(piece).nu_instances as usize)
            .sum();
        self.nu_colors as usize * (instances + 1)
    }

    pub fn is_legal(&self, c: Color, mv: Move) -> bool {
        if mv.is_pass() {
            return true;
        }
        if !mv.is_regular() {
            return false;
        }
        let info = self.bc.move_info(mv);
        if self.state.nu_left[c][info.piece] == 0 {
            return false;
        }
        let forbidden = &self.state.forbidden[c];
        if info.points.iter().any(|&p| forbidden[p]) {
            return false;
        }
        if self.is_first_piece(c) {
            let starting = self.starting_points(c);
            info.points.iter().any(|p| starting.contains(p))
        } else {
            info.points.iter().any(|&p| self.state.is_attach_point[c][p])
        }
    }

    /// All legal moves of `c` by testing every move of the table.
    pub fn gen_legal_moves(&self, c: Color) -> Vec<Move> {
        (0..self.bc.nu_moves())
            .map(Move::from_index)
            .filter(|&mv| self.is_legal(c, mv))
            .collect()
    }

    pub fn has_legal_move(&self, c: Color) -> bool {
        (0..self.bc.nu_moves())
            .map(Move::from_index)
            .any(|mv| self.is_legal(c, mv))
    }

    pub fn play(&mut self, c: Color, mv: Move) {
        if mv.is_pass() {
            self.play_pass(c);
        } else {
            self.play_nonpass(c, mv);
        }
    }

    /// Validate and play a move.
    pub fn play_checked(&mut self, c: Color, mv: Move) -> Result<(), BoardError> {
        if c.to_int() >= self.nu_colors {
            return Err(BoardError::InvalidColor(c.to_int()));
        }
        if mv.is_null() {
            return Err(BoardError::NullMove);
        }
        if !self.is_legal(c, mv) {
            return Err(BoardError::IllegalMove(self.bc.move_to_string(mv)));
        }
        self.play(c, mv);
        Ok(())
    }

    pub fn play_pass(&mut self, c: Color) {
        self.state.moves.push(ColorMove::new(c, Move::PASS));
        self.state.to_play = c.next(self.nu_colors);
    }

    pub fn play_nonpass(&mut self, c: Color, mv: Move) {
        debug_assert!(self.is_legal(c, mv), "illegal move");
        let bc = &*self.bc;
        let info = bc.move_info(mv);
        let info_ext = bc.move_info_ext(mv);
        let s = &mut self.state;
        let piece = info.piece;
        s.nu_left[c][piece] -= 1;
        if s.nu_left[c][piece] == 0 {
            s.pieces_left[c].retain(|&p| p != piece);
        }
        for &p in info.points.iter() {
            s.point_state[p] = Some(c);
            for i in Color::all(self.nu_colors) {
                s.forbidden[i][p] = true;
            }
        }
        for &p in info_ext.adj_points.iter() {
            s.forbidden[c][p] = true;
        }
        for &p in info_ext.attach_points.iter() {
            if !s.forbidden[c][p] && !s.is_attach_point[c][p] {
                s.is_attach_point[c][p] = true;
                s.attach_points[c].push(p);
            }
        }
        s.nu_onboard[c] += 1;
        let size = bc.piece_info(piece).size as u32;
        s.points[c] += size;
        if s.pieces_left[c].is_empty() && bc.piece_set() != PieceSet::Junior {
            s.bonus[c] = BONUS_ALL_PIECES;
            if size == 1 {
                s.bonus[c] += BONUS_MONOMINO_LAST;
            }
        }
        s.moves.push(ColorMove::new(c, mv));
        s.to_play = c.next(self.nu_colors);
    }

    /// Take back the last move by replaying the rest of the history.
    pub fn undo(&mut self) {
        let Some(last) = self.state.moves.pop() else {
            return;
        };
        let history = std::mem::take(&mut self.state.moves);
        self.state = BoardState::new(&self.bc);
        for m in history {
            self.play(m.color, m.mv);
        }
        self.state.to_play = last.color;
    }

    pub fn take_snapshot(&mut self) {
        match &mut self.snapshot {
            Some(snapshot) => snapshot.clone_from(&self.state),
            None => self.snapshot = Some(self.state.clone()),
        }
    }

    pub fn restore_snapshot(&mut self) {
        debug_assert!(self.snapshot.is_some(), "no snapshot taken");
        if let Some(snapshot) = &self.snapshot {
            self.state.clone_from(snapshot);
        }
    }

    /// Make this board a copy of `other` (without its snapshot).
    pub fn copy_from(&mut self, other: &Board) {
        self.variant = other.variant;
        self.nu_colors = other.nu_colors;
        if !Arc::ptr_eq(&self.bc, &other.bc) {
            self.bc = Arc::clone(&other.bc);
            self.snapshot = None;
        }
        self.state.clone_from(&other.state);
    }

    /// True if the observable state equals the other board's.
    pub fn same_position(&self, other: &Board) -> bool {
        self.variant == other.variant && self.state == other.state
    }
}

impl Clone for Board {
    fn clone(&self) -> Self {
        Board {
            variant: self.variant,
            nu_colors: self.nu_colors,
            bc: Arc::clone(&self.bc),
            state: self.state.clone(),
            snapshot: self.snapshot.clone(),
        }
    }
}

impl fmt::Debug for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Board")
            .field("variant", &self.variant)
            .field("nu_moves", &self.nu_moves())
            .field("to_play", &self.to_play())
            .finish()
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let g = self.geometry();
        for y in 0..g.height() {
            write!(f, "{:>3} ", g.height() - y)?;
            for x in 0..g.width() {
                let c = match g.point_at(x as i32, y as i32) {
                    None => ' ',
                    Some(p) => match self.point_state(p) {
                        Some(c) => (b'1' + c.to_int()) as char,
                        None if g.is_trigon() => {
                            if (x + y) % 2 == 0 { '^' } else { 'v' }
                        }
                        None => '.',
                    },
                };
                write!(f, "{c}")?;
                if !g.is_trigon() {
                    write!(f, " ")?;
                }
            }
            writeln!(f)?;
        }
        for c in self.colors() {
            write!(f, "Color {c}: {} points", self.points_with_bonus(c))?;
            if self.bonus(c) > 0 {
                write!(f, " (bonus {})", self.bonus(c))?;
            }
            writeln!(f, ", {} pieces left", self.pieces_left(c).len())?;
        }
        writeln!(f, "To play: {}", self.to_play())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn duo_move(bd: &Board, s: &str) -> Move {
        bd.board_const().parse_move(s).unwrap()
    }

    fn duo_move_point(bd: &Board, s: &str) -> Point {
        bd.geometry().parse_label(s).unwrap()
    }

    #[test]
    fn test_first_move_must_cover_starting_point() {
        let mut bd = Board::new(Variant::Duo);
        let c0 = Color::new(0);
        let off = duo_move(&bd, "a1,b1");
        assert!(!bd.is_legal(c0, off));
        assert!(matches!(bd.play_checked(c0, off), Err(BoardError::IllegalMove(_))));
        // (4, 4) is e10 on a 14x14 board.
        let on = duo_move(&bd, "e10,f10");
        assert!(bd.is_legal(c0, on));
        bd.play_checked(c0, on).unwrap();
        assert_eq!(bd.points(c0), 2);
        assert_eq!(bd.to_play(), Color::new(1));
        assert!(!bd.attach_points(c0).is_empty());
    }

    #[test]
    fn test_adjacent_own_piece_forbidden() {
        let mut bd = Board::new(Variant::Duo);
        let c0 = Color::new(0);
        bd.play(c0, duo_move(&bd, "e10,f10"));
        // Edge contact with own piece.
        assert!(!bd.is_legal(c0, duo_move(&bd, "e11")));
        assert!(bd.is_forbidden_at(duo_move_point(&bd, "e11"), c0));
        // Corner contact.
        assert!(bd.is_legal(c0, duo_move(&bd, "d11")));
        assert!(bd.is_attach_point(duo_move_point(&bd, "d11"), c0));
        // The other color may touch along an edge but still needs its start.
        assert!(!bd.is_forbidden_at(duo_move_point(&bd, "g10"), Color::new(1)));
        assert!(!bd.is_legal(Color::new(1), duo_move(&bd, "g10")));
    }

    #[test]
    fn test_gen_legal_moves_first_piece() {
        let bd = Board::new(Variant::Duo);
        let moves = bd.gen_legal_moves(Color::new(0));
        let start = bd.starting_points(Color::new(0))[0];
        assert!(!moves.is_empty());
        for mv in moves {
            assert!(bd.board_const().move_info(mv).points.contains(&start));
        }
    }

    #[test]
    fn test_undo_restores_previous_state() {
        let mut bd = Board::new(Variant::Duo);
        let before = bd.clone();
        bd.play(Color::new(0), duo_move(&bd, "e10,f10"));
        bd.undo();
        assert!(bd.same_position(&before));
    }

    #[test]
    fn test_score_two_colors() {
        let mut bd = Board::new(Variant::Duo);
        bd.play(Color::new(0), duo_move(&bd, "e10,f10"));
        assert_eq!(bd.score(Color::new(0)), 2.0);
        assert_eq!(bd.score(Color::new(1)), -2.0);
    }

    #[test]
    fn test_max_game_moves() {
        assert_eq!(Board::new(Variant::Duo).max_game_moves(), 2 * 22);
        assert_eq!(Board::new(Variant::Junior).max_game_moves(), 2 * 25);
        assert_eq!(Board::new(Variant::Trigon3).max_game_moves(), 3 * 23);
    }
}
