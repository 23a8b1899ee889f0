//! Per-worker simulation state.
//!
//! A [`State`] owns a board and runs one simulation at a time:
//!
//! 1. [`State::start_simulation`] restores the root position.
//! 2. [`State::play_in_tree`] replays the moves of the tree walk.
//! 3. [`State::finish_in_tree`] updates symmetry tracking.
//! 4. [`State::gen_children`] expands a node with prior knowledge.
//! 5. [`State::gen_and_play_playout_move`] plays until it returns false.
//! 6. [`State::evaluate_playout`] returns the result for every color.
//!
//! Legal moves are kept per color in move lists that are updated
//! incrementally. A list is only valid for the positions reached since its
//! last update, so playouts update the list of the color to play before
//! every move. Incremental updates rely on two facts:
//! - a point never stops being forbidden within a simulation, so a move that
//!   was illegal stays illegal;
//! - new legal moves can only appear at attach points created by the color's
//!   own new pieces, or for pieces that became considered.

use std::sync::Arc;

use log::{Level, debug, log_enabled, trace};

use crate::board::{Board, Float};
use crate::board_const::{BoardConst, Move};
use crate::color::{Color, ColorMap, PlayerMove};
use crate::constants::{
    CLASSIC_CONNECT_PIECES, CLASSIC_DIST_TO_CENTER_PIECES, CLASSIC_MIN_DIST_TO_CENTER,
    MAX_COLORS, PLAYOUT_MAX_TRY, PRIOR_CONNECT, PRIOR_DEAD_ATTACH, PRIOR_HEURISTIC_SCALE,
    PRIOR_KILL_OWN_ATTACH, PRIOR_NEW_FORBIDDEN, PRIOR_OPP_ATTACH, PRIOR_OPP_ATTACH_ADJ,
    PRIOR_OWN_ATTACH, PRIOR_SYMMETRY_WEIGHT, TERMINATE_EARLY_ROUNDS, TRIGON_DIST_TO_CENTER_PIECES,
    TRIGON_Y_RATIO,
};
use crate::geometry::{Grid, Point};
use crate::local_value::{LocalMoves, LocalValue};
use crate::marker::{MarkedMoves, MoveMarker, PointMarker};
use crate::move_list::MoveList;
use crate::piece::Piece;
use crate::scoring::{blend_result, game_result};
use crate::search::NodeExpander;
use crate::shared_const::SharedConst;
use crate::stats::RunningStats;
use crate::symmetry::{check_symmetry_broken, is_first_player, update_symmetry_broken};
use crate::variant::{BoardType, Variant};

/// Piecewise linear approximation of `exp(-x)` for `x >= 0`.
///
/// Breakpoints at 0.5, 2 and 4. The third segment is clamped so that the
/// function stays positive and non-increasing.
pub fn approx_exp_decay(x: Float) -> Float {
    if x < 0.5 {
        1.0 - 0.9 * x
    } else if x < 2.0 {
        0.45 - 0.2 * (x - 0.45)
    } else if x < 4.0 {
        (0.27 - 0.08 * (x - 0.27)).max(0.0248)
    } else {
        0.0248 / (x - 3.0)
    }
}

/// Starting point for the first piece of `c`: the one farthest from the
/// occupied starting points, counting those of the same player twice.
fn find_best_starting_point(bd: &Board, c: Color) -> Option<Point> {
    let g = bd.geometry();
    let ratio = if g.is_trigon() { TRIGON_Y_RATIO } else { 1.0 };
    let mut best = None;
    let mut max_distance = -1.0;
    for &p in bd.starting_points(c) {
        if bd.is_forbidden_at(p, c) {
            continue;
        }
        let (px, py) = (g.x(p) as f32, g.y(p) as f32);
        let mut d = 0.0;
        for i in bd.colors() {
            for &pp in bd.starting_points(i) {
                let Some(s) = bd.point_state(pp) else {
                    continue;
                };
                let dx = g.x(pp) as f32 - px;
                let dy = ratio * (g.y(pp) as f32 - py);
                let weight = if s == c || s == bd.second_color(c) { 2.0 } else { 1.0 };
                d += weight * (dx * dx + dy * dy).sqrt();
            }
        }
        if d > max_distance {
            best = Some(p);
            max_distance = d;
        }
    }
    best
}

fn considered_index(shared: &SharedConst, bd: &Board, consider_all_pieces: bool) -> usize {
    if consider_all_pieces {
        shared.considered_all_index()
    } else {
        shared.considered_index(bd.nu_onboard_pieces())
    }
}

struct GenContext<'b> {
    bd: &'b Board,
    bc: &'b BoardConst,
    shared: &'b SharedConst,
}

/// Local value lookup and the collected local moves of a generation pass.
struct LocalScan<'b> {
    value: &'b LocalValue,
    moves: &'b mut LocalMoves,
}

/// Collect the legal moves of `c` covering `p` for the pieces accepted by
/// `include`.
fn add_moves_at(
    ctx: &GenContext<'_>,
    c: Color,
    p: Point,
    include: impl Fn(Piece) -> bool,
    collector: &mut MarkedMoves<'_>,
    scan: &mut Option<LocalScan<'_>>,
) {
    let forbidden = ctx.bd.forbidden(c);
    for &piece in ctx.bd.pieces_left(c) {
        if !include(piece) {
            continue;
        }
        for &mv in ctx.bc.moves_at(piece, p) {
            if ctx.shared.is_forbidden_at_root(c, mv) || collector.is_marked(mv) {
                continue;
            }
            let points = &ctx.bc.move_info(mv).points;
            if points.iter().any(|&q| forbidden[q]) {
                continue;
            }
            collector.insert(mv);
            if let Some(scan) = scan {
                scan.moves.add(mv, scan.value.move_value(points), points.len());
            }
        }
    }
}

#[derive(Copy, Clone, Debug, Default)]
struct MoveFeatures {
    /// Estimated value in score points.
    heuristic: Float,
    dist_to_center: u32,
    /// Touches the paired color of the same player.
    connect: bool,
}

pub struct State<'a> {
    shared: &'a SharedConst,
    bd: Board,
    bc: Arc<BoardConst>,
    nu_colors: u8,
    nu_moves_initial: usize,
    /// Consecutive passes at the end of the current position.
    nu_passes: u32,

    moves: ColorMap<MoveList>,
    marker: MoveMarker,
    moves_added_at: ColorMap<PointMarker>,
    /// Index of the considered-piece set each move list was built with.
    is_piece_considered: ColorMap<usize>,
    consider_all_pieces: bool,
    is_move_list_initialized: ColorMap<bool>,
    has_moves: ColorMap<bool>,
    /// Move number of the last update of each move list.
    last_update: ColorMap<usize>,

    local_value: LocalValue,
    local: LocalMoves,

    features: Vec<MoveFeatures>,
    max_heuristic: Float,
    min_dist_to_center: u32,
    has_connect_move: bool,
    dist_to_center: Grid<u32>,
    point_value: Grid<Float>,
    attach_point_value: Grid<Float>,
    adj_point_value: Grid<Float>,

    check_symmetric_draw: bool,
    is_symmetry_broken: bool,
    score_modification_factor: Float,

    rng: fastrand::Rng,
    stat_score: RunningStats,
    nu_simulations: u64,
    nu_playout_moves: u64,
    nu_last_good_reply_moves: u64,
}

impl<'a> State<'a> {
    /// A state with a randomly seeded generator, ready for simulations.
    pub fn new(shared: &'a SharedConst) -> Self {
        Self::with_seed(shared, fastrand::u64(..))
    }

    pub fn with_seed(shared: &'a SharedConst, seed: u64) -> Self {
        let bd = shared.board.clone();
        let bc = Arc::clone(bd.board_const());
        let g = bc.geometry();
        let mut state = State {
            shared,
            nu_colors: bd.nu_colors(),
            nu_moves_initial: 0,
            nu_passes: 0,
            moves: ColorMap::default(),
            marker: MoveMarker::new(bc.nu_moves()),
            moves_added_at: ColorMap::from_fn(|_| PointMarker::new(g)),
            is_piece_considered: ColorMap::filled(0),
            consider_all_pieces: false,
            is_move_list_initialized: ColorMap::filled(false),
            has_moves: ColorMap::filled(true),
            last_update: ColorMap::filled(0),
            local_value: LocalValue::new(g),
            local: LocalMoves::default(),
            features: Vec::new(),
            max_heuristic: 0.0,
            min_dist_to_center: u32::MAX,
            has_connect_move: false,
            dist_to_center: Grid::new(g, 0),
            point_value: Grid::new(g, 0.0),
            attach_point_value: Grid::new(g, 0.0),
            adj_point_value: Grid::new(g, 0.0),
            check_symmetric_draw: false,
            is_symmetry_broken: true,
            score_modification_factor: 0.0,
            rng: fastrand::Rng::with_seed(seed),
            stat_score: RunningStats::new(),
            nu_simulations: 0,
            nu_playout_moves: 0,
            nu_last_good_reply_moves: 0,
            bd,
            bc,
        };
        state.start_search(shared);
        state
    }

    /// Reset the state for a new search from the root position of `shared`.
    pub fn start_search(&mut self, shared: &'a SharedConst) {
        self.shared = shared;
        let root = &shared.board;
        self.bd.copy_from(root);
        self.bd.set_to_play(shared.to_play);
        self.bd.take_snapshot();
        if !Arc::ptr_eq(&self.bc, root.board_const()) {
            self.bc = Arc::clone(root.board_const());
            let g = self.bc.geometry();
            self.marker = MoveMarker::new(self.bc.nu_moves());
            self.moves_added_at = ColorMap::from_fn(|_| PointMarker::new(g));
            self.local_value = LocalValue::new(g);
            self.dist_to_center = Grid::new(g, 0);
            self.point_value = Grid::new(g, 0.0);
            self.attach_point_value = Grid::new(g, 0.0);
            self.adj_point_value = Grid::new(g, 0.0);
        }
        self.nu_colors = root.nu_colors();
        self.nu_moves_initial = root.nu_moves();
        self.score_modification_factor =
            shared.config.score_modification / self.bc.total_piece_points() as Float;
        self.nu_simulations = 0;
        self.nu_playout_moves = 0;
        self.nu_last_good_reply_moves = 0;
        self.stat_score.clear();

        let config = &shared.config;
        self.check_symmetric_draw = root.variant().is_symmetric()
            && config.detect_symmetry
            && !(!is_first_player(shared.to_play) && config.avoid_symmetric_draw)
            && !check_symmetry_broken(&self.bd, &shared.symmetric_points);

        let g = self.bc.geometry();
        let (center_x, center_y) = g.center();
        let ratio = if g.is_trigon() { TRIGON_Y_RATIO } else { 1.0 };
        let is_classic = self.bc.board_type() == BoardType::Classic;
        for &p in g.points() {
            let dx = g.x(p) as f32 - center_x;
            let dy = ratio * (g.y(p) as f32 - center_y);
            // Distances that differ by at most 0.25 count as equal.
            let mut d = (4.0 * (dx * dx + dy * dy).sqrt()).round();
            if is_classic {
                d = d.max(CLASSIC_MIN_DIST_TO_CENTER);
            }
            self.dist_to_center[p] = d as u32;
        }

        debug!(
            "start search: variant={} to_play={} moves={} symmetric_draw={}",
            root.variant(),
            shared.to_play,
            self.nu_moves_initial,
            self.check_symmetric_draw
        );
    }

    /// Reset to the root position.
    pub fn start_simulation(&mut self, n: usize) {
        trace!("simulation {n}");
        self.nu_simulations += 1;
        self.bd.restore_snapshot();
        self.consider_all_pieces = false;
        for c in Color::all(self.nu_colors) {
            self.has_moves[c] = true;
            self.is_move_list_initialized[c] = false;
            self.moves_added_at[c].clear();
        }
        // Assumes alternating colors in the history of the root position.
        self.nu_passes = self
            .bd
            .moves()
            .iter()
            .rev()
            .take_while(|m| m.is_pass())
            .count() as u32;
        self.is_symmetry_broken = !self.check_symmetric_draw;
    }

    pub fn play_in_tree(&mut self, mv: Move) {
        let to_play = self.bd.to_play();
        if mv.is_pass() {
            self.bd.play_pass(to_play);
            self.nu_passes += 1;
        } else {
            debug_assert!(self.bd.is_legal(to_play, mv), "illegal move in tree");
            self.bd.play_nonpass(to_play, mv);
            self.nu_passes = 0;
        }
        if log_enabled!(Level::Trace) {
            trace!("in tree: {}", self.bc.move_to_string(mv));
        }
    }

    /// Must be called after the last tree move and before
    /// [`State::gen_children`] or the playout.
    pub fn finish_in_tree(&mut self) {
        trace!("finish in tree");
        if self.check_symmetric_draw {
            self.is_symmetry_broken = check_symmetry_broken(&self.bd, &self.shared.symmetric_points);
        }
    }

    /// Expand the current position: one child per candidate move with a
    /// prior value and count. Adds a single pass child if there are no moves,
    /// and nothing if the game is over.
    pub fn gen_children<E: NodeExpander + ?Sized>(&mut self, expander: &mut E, init_val: Float) {
        if self.nu_passes == self.nu_colors as u32 {
            return;
        }
        let to_play = self.bd.to_play();
        self.init_move_list_without_local(to_play);
        if self.moves[to_play].is_empty() {
            expander.add_child(Move::PASS, 0.5, 0.0);
            return;
        }
        self.compute_features();

        let bd = &self.bd;
        let bc: &BoardConst = &self.bc;
        let moves = &self.moves[to_play];
        let mut symmetric_mv = Move::NULL;
        let mut has_symmetry_breaker = false;
        if self.check_symmetric_draw && !self.is_symmetry_broken {
            let nu_moves = bd.nu_moves();
            if !is_first_player(to_play) {
                if nu_moves > 0 {
                    let last = bd.get_move(nu_moves - 1);
                    if !last.is_pass() {
                        symmetric_mv = bc.move_info_ext(last.mv).symmetric_move;
                    }
                }
            } else if nu_moves > 0 {
                has_symmetry_breaker = moves.iter().any(|mv| bc.move_info_ext(mv).breaks_symmetry);
            }
        }
        let prune_unconnected = bc.board_type() == BoardType::Classic
            && bd.nu_onboard_pieces() < CLASSIC_CONNECT_PIECES
            && self.has_connect_move;

        for (i, mv) in moves.iter().enumerate() {
            let features = &self.features[i];
            if self.min_dist_to_center != u32::MAX
                && features.dist_to_center != self.min_dist_to_center
            {
                continue;
            }
            if prune_unconnected && !features.connect {
                continue;
            }
            let heuristic =
                approx_exp_decay(PRIOR_HEURISTIC_SCALE * (self.max_heuristic - features.heuristic));
            // Rescale to [0.1, 1] so that no move is starved of exploration.
            let mut value = 0.1 + 0.9 * heuristic;
            let mut count = 1.0;
            value += init_val;
            count += 1.0;
            let symmetry_match = if !symmetric_mv.is_null() {
                Some(mv == symmetric_mv)
            } else if has_symmetry_breaker {
                Some(bc.move_info_ext(mv).breaks_symmetry)
            } else {
                None
            };
            if let Some(matches) = symmetry_match {
                value += PRIOR_SYMMETRY_WEIGHT * if matches { 1.0 } else { 0.1 };
                count += PRIOR_SYMMETRY_WEIGHT;
            }
            expander.add_child(mv, value / count, count);
        }
    }

    /// Play a child created by [`State::gen_children`].
    pub fn play_expanded_child(&mut self, mv: Move) {
        if mv.is_pass() {
            self.play_playout_pass();
        } else {
            self.play_playout_nonpass(mv);
        }
        if log_enabled!(Level::Trace) {
            trace!("expanded child {}\n{}", self.bc.move_to_string(mv), self.bd);
        }
    }

    /// Play one playout move. Returns false when the playout is over.
    ///
    /// `last_good_reply` is played if it is legal. Otherwise the move is drawn
    /// from the local moves (or all moves if there are none), preferring the
    /// largest playable piece size.
    pub fn gen_and_play_playout_move(&mut self, last_good_reply: Move) -> bool {
        let nu_colors = self.nu_colors;
        if self.nu_passes == nu_colors as u32 {
            return false;
        }
        if self.is_symmetric_draw() {
            trace!("terminate playout: symmetry not broken");
            return false;
        }
        let to_play = self.bd.to_play();
        self.nu_playout_moves += 1;
        if last_good_reply.is_regular() && self.bd.is_legal(to_play, last_good_reply) {
            trace!("playing last good reply");
            self.nu_last_good_reply_moves += 1;
            self.play_playout_nonpass(last_good_reply);
            return true;
        }

        self.refresh_move_list(to_play);
        self.has_moves[to_play] = !self.moves[to_play].is_empty();
        if !self.has_moves[to_play] {
            let variant = self.bd.variant();
            let lost_early = self.nu_moves_initial < TERMINATE_EARLY_ROUNDS * nu_colors as usize
                && (matches!(variant, Variant::Duo | Variant::Junior)
                    || (matches!(variant, Variant::Classic2 | Variant::Trigon2)
                        && !self.has_moves[self.bd.second_color(to_play)]));
            if lost_early && self.bd.score_without_bonus(to_play) < 0.0 {
                trace!("terminate playout: no moves and negative score");
                return false;
            }
            self.play_playout_pass();
            return true;
        }

        let (moves, max_piece_size) = if self.local.moves.is_empty() {
            (self.moves[to_play].as_slice(), self.local.max_piece_size)
        } else {
            (self.local.moves.as_slice(), self.local.max_piece_size_local)
        };
        if log_enabled!(Level::Trace) {
            trace!(
                "moves: {}, local: {}, local value: {:#x}",
                self.moves[to_play].len(),
                self.local.moves.len(),
                self.local.max_value
            );
        }
        let mut nu_try = 0;
        let mv = loop {
            nu_try += 1;
            let mv = moves[self.rng.usize(..moves.len())];
            if self.bc.move_info(mv).points.len() >= max_piece_size || nu_try >= PLAYOUT_MAX_TRY {
                break mv;
            }
        };
        self.play_playout_nonpass(mv);
        true
    }

    /// Result per color, scoring unbroken symmetric positions as draws.
    pub fn evaluate_playout(&mut self) -> [Float; MAX_COLORS] {
        if self.is_symmetric_draw() {
            trace!("result: 0.5 (symmetry)");
            self.stat_score.add(0.0);
            let mut result = [0.0; MAX_COLORS];
            for c in Color::all(self.nu_colors) {
                result[c.index()] = 0.5;
            }
            return result;
        }
        self.evaluate_terminal()
    }

    /// Result per color blended with the score.
    pub fn evaluate_terminal(&mut self) -> [Float; MAX_COLORS] {
        let w = self.shared.config.score_modification;
        let mut result = [0.0; MAX_COLORS];
        for c in Color::all(self.nu_colors) {
            let score = self.bd.score(c);
            let rank = game_result(&self.bd, c);
            result[c.index()] = blend_result(rank, score, w, self.score_modification_factor);
            if c == self.shared.to_play {
                self.stat_score.add(score as f64);
            }
            trace!(
                "result color {c}: score={score} game_result={rank} result={}",
                result[c.index()]
            );
        }
        result
    }

    pub fn get_move(&self, n: usize) -> PlayerMove {
        let m = self.bd.get_move(n);
        PlayerMove {
            player: m.color.to_int(),
            mv: m.mv,
        }
    }

    pub fn get_nu_moves(&self) -> usize {
        self.bd.nu_moves()
    }

    pub fn get_to_play(&self) -> u8 {
        self.bd.to_play().to_int()
    }

    pub fn board(&self) -> &Board {
        &self.bd
    }

    /// Current move list of `c`. Only valid right after it was generated or
    /// updated.
    pub fn move_list(&self, c: Color) -> &[Move] {
        self.moves[c].as_slice()
    }

    /// Local moves found by the last generation pass with local values.
    pub fn local_moves(&self) -> &[Move] {
        self.local.moves.as_slice()
    }

    pub fn is_symmetry_broken(&self) -> bool {
        self.is_symmetry_broken
    }

    pub fn check_symmetric_draw(&self) -> bool {
        self.check_symmetric_draw
    }

    pub fn stat_score(&self) -> &RunningStats {
        &self.stat_score
    }

    pub fn nu_simulations(&self) -> u64 {
        self.nu_simulations
    }

    pub fn nu_playout_moves(&self) -> u64 {
        self.nu_playout_moves
    }

    pub fn nu_last_good_reply_moves(&self) -> u64 {
        self.nu_last_good_reply_moves
    }

    pub fn dump(&self) -> String {
        format!("State:\n{}", self.bd)
    }

    pub fn info(&self) -> String {
        let mut s = format!("Sco: {}", self.stat_score);
        if self.nu_playout_moves > 0 {
            let lgr = 100.0 * self.nu_last_good_reply_moves as f64 / self.nu_playout_moves as f64;
            s.push_str(&format!(", LGR: {lgr:.1}%"));
        }
        s
    }

    /// Update the move list of `c` incrementally, or generate it if it was
    /// not initialized in this simulation.
    pub fn refresh_move_list(&mut self, c: Color) {
        if self.is_move_list_initialized[c] {
            self.update_move_list(c);
        } else {
            self.init_move_list_with_local(c);
        }
    }

    /// Generate the move list of `c` from scratch, collecting local moves.
    pub fn init_move_list_with_local(&mut self, c: Color) {
        self.init_move_list(c, true);
    }

    /// Generate the move list of `c` from scratch.
    pub fn init_move_list_without_local(&mut self, c: Color) {
        self.init_move_list(c, false);
    }

    fn init_move_list(&mut self, c: Color, with_local: bool) {
        loop {
            let shared = self.shared;
            let bd = &self.bd;
            let bc: &BoardConst = &self.bc;
            let index = considered_index(shared, bd, self.consider_all_pieces);
            self.is_piece_considered[c] = index;
            let considered = shared.considered_set(index);
            self.local.clear();
            let mut scan = if with_local {
                self.local_value.init(bd);
                Some(LocalScan {
                    value: &self.local_value,
                    moves: &mut self.local,
                })
            } else {
                None
            };
            self.moves[c].clear();
            let is_empty = {
                let mut collector = MarkedMoves::new(&mut self.marker, &mut self.moves[c]);
                let ctx = GenContext { bd, bc, shared };
                if bd.is_first_piece(c) {
                    // Only one starting point: the incremental update relies on
                    // the list depending on forbidden points alone.
                    if let Some(p) = find_best_starting_point(bd, c) {
                        add_moves_at(&ctx, c, p, |piece| considered[piece], &mut collector, &mut None);
                        self.moves_added_at[c].set(p);
                    }
                } else {
                    for &p in bd.attach_points(c) {
                        if !bd.is_forbidden_at(p, c) {
                            add_moves_at(&ctx, c, p, |piece| considered[piece], &mut collector, &mut scan);
                            self.moves_added_at[c].set(p);
                        }
                    }
                }
                collector.moves().is_empty()
            };
            self.is_move_list_initialized[c] = true;
            self.last_update[c] = self.bd.nu_moves();
            if !is_empty || self.consider_all_pieces {
                return;
            }
            self.consider_all_pieces = true;
        }
    }

    /// Bring the move list of `c` up to date with the moves played since its
    /// last update.
    pub fn update_move_list(&mut self, c: Color) {
        debug_assert!(self.is_move_list_initialized[c]);
        let shared = self.shared;
        let bd = &self.bd;
        let bc: &BoardConst = &self.bc;
        self.local_value.init(bd);
        self.local.clear();
        let local_value = &self.local_value;
        let local = &mut self.local;

        // Old moves that are still legal
        let forbidden = bd.forbidden(c);
        self.moves[c].retain_fast(|mv| {
            let info = bc.move_info(mv);
            if bd.nu_left(c, info.piece) == 0 || info.points.iter().any(|&p| forbidden[p]) {
                return false;
            }
            local.add(mv, local_value.move_value(&info.points), info.points.len());
            true
        });

        let mut collector = MarkedMoves::new(&mut self.marker, &mut self.moves[c]);
        collector.mark_all();
        let ctx = GenContext { bd, bc, shared };
        let mut scan = Some(LocalScan {
            value: local_value,
            moves: local,
        });

        // New moves at attach points of the pieces this color played since
        let mut old = shared.considered_set(self.is_piece_considered[c]);
        let mut i = self.last_update[c];
        while i < bd.nu_moves() {
            let m = bd.get_move(i);
            debug_assert_eq!(m.color, c, "colors do not alternate");
            if m.mv.is_regular() {
                for &p in bc.move_info_ext(m.mv).attach_points.iter() {
                    if !bd.is_forbidden_at(p, c) && !self.moves_added_at[c].get(p) {
                        add_moves_at(&ctx, c, p, |piece| old[piece], &mut collector, &mut scan);
                        self.moves_added_at[c].set(p);
                    }
                }
            }
            i += self.nu_colors as usize;
        }

        // Moves of pieces that were not considered at the last update. If
        // there are still none, all pieces are considered from now on, as in
        // a full generation.
        let mut new_index = considered_index(shared, bd, self.consider_all_pieces);
        loop {
            if new_index != self.is_piece_considered[c] {
                let new = shared.considered_set(new_index);
                debug_assert!(bd.pieces_left(c).iter().all(|&piece| !old[piece] || new[piece]));
                if bd.pieces_left(c).iter().any(|&piece| !old[piece] && new[piece]) {
                    for &p in bd.attach_points(c) {
                        if !bd.is_forbidden_at(p, c) {
                            add_moves_at(
                                &ctx,
                                c,
                                p,
                                |piece| !old[piece] && new[piece],
                                &mut collector,
                                &mut scan,
                            );
                        }
                    }
                }
                self.is_piece_considered[c] = new_index;
                old = new;
            }
            if !collector.moves().is_empty() || self.consider_all_pieces {
                break;
            }
            self.consider_all_pieces = true;
            new_index = shared.considered_all_index();
        }
        drop(collector);
        self.last_update[c] = self.bd.nu_moves();
    }

    fn is_symmetric_draw(&self) -> bool {
        self.check_symmetric_draw
            && !self.is_symmetry_broken
            && self.bd.nu_onboard_pieces() >= self.bd.variant().symmetry_min_nu_pieces()
    }

    fn play_playout_nonpass(&mut self, mv: Move) {
        let to_play = self.bd.to_play();
        debug_assert!(self.bd.is_legal(to_play, mv), "illegal playout move");
        self.bd.play_nonpass(to_play, mv);
        self.nu_passes = 0;
        if self.check_symmetric_draw
            && !self.is_symmetry_broken
            && update_symmetry_broken(&self.bd, &self.shared.symmetric_points, mv)
        {
            self.is_symmetry_broken = true;
        }
        if log_enabled!(Level::Trace) {
            trace!("play {}", self.bc.move_to_string(mv));
        }
    }

    fn play_playout_pass(&mut self) {
        let to_play = self.bd.to_play();
        self.bd.play_pass(to_play);
        self.nu_passes += 1;
        // A pass either breaks the symmetry or ends the game.
        self.is_symmetry_broken = true;
        trace!("pass {to_play}");
    }

    /// Heuristic features of the moves of the color to play, in move list
    /// order.
    fn compute_features(&mut self) {
        let bd = &self.bd;
        let bc: &BoardConst = &self.bc;
        let g = bc.geometry();
        let to_play = bd.to_play();
        let second_color = bd.second_color(to_play);
        let moves = &self.moves[to_play];

        self.point_value.fill(1.0);
        for i in bd.colors() {
            if i == to_play || i == second_color {
                continue;
            }
            for &p in bd.attach_points(i) {
                if bd.is_forbidden_at(p, i) {
                    continue;
                }
                self.point_value[p] = PRIOR_OPP_ATTACH;
                for &q in g.adj(p) {
                    if !bd.is_forbidden_at(q, i) {
                        self.point_value[q] = self.point_value[q].max(PRIOR_OPP_ATTACH_ADJ);
                    }
                }
            }
        }
        for &p in g.points() {
            let s = bd.point_state(p);
            let forbidden = bd.is_forbidden_at(p, to_play);
            self.attach_point_value[p] = if forbidden && s != Some(to_play) {
                PRIOR_DEAD_ATTACH
            } else {
                PRIOR_OWN_ATTACH
            };
            self.adj_point_value[p] = if !forbidden {
                if bd.is_attach_point(p, to_play) {
                    PRIOR_KILL_OWN_ATTACH
                } else {
                    PRIOR_NEW_FORBIDDEN
                }
            } else if s == Some(second_color) {
                PRIOR_CONNECT
            } else {
                0.0
            };
        }

        let nu_onboard = bd.nu_onboard_pieces();
        let compute_dist_to_center = match bc.board_type() {
            BoardType::Classic => nu_onboard < CLASSIC_DIST_TO_CENTER_PIECES,
            BoardType::Trigon | BoardType::Trigon3 => nu_onboard < TRIGON_DIST_TO_CENTER_PIECES,
            BoardType::Duo => false,
        };
        let check_connect =
            bc.board_type() == BoardType::Classic && nu_onboard < CLASSIC_CONNECT_PIECES;
        self.features.clear();
        self.max_heuristic = Float::MIN;
        self.min_dist_to_center = u32::MAX;
        self.has_connect_move = false;
        for mv in moves.iter() {
            let info = bc.move_info(mv);
            let info_ext = bc.move_info_ext(mv);
            let mut features = MoveFeatures {
                heuristic: 0.0,
                dist_to_center: u32::MAX,
                connect: false,
            };
            for &p in info.points.iter() {
                features.heuristic += self.point_value[p];
            }
            for &p in info_ext.attach_points.iter() {
                features.heuristic += self.attach_point_value[p];
            }
            for &p in info_ext.adj_points.iter() {
                features.heuristic += self.adj_point_value[p];
                if check_connect && bd.point_state(p) == Some(second_color) {
                    features.connect = true;
                }
            }
            if features.connect {
                self.has_connect_move = true;
            }
            if compute_dist_to_center {
                for &p in info.points.iter() {
                    features.dist_to_center = features.dist_to_center.min(self.dist_to_center[p]);
                }
                self.min_dist_to_center = self.min_dist_to_center.min(features.dist_to_center);
            }
            self.max_heuristic = self.max_heuristic.max(features.heuristic);
            self.features.push(features);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::ChildInfo;
    use crate::shared_const::SearchConfig;

    fn shared_for(variant: Variant) -> SharedConst {
        SharedConst::new(&Board::new(variant), SearchConfig::default())
    }

    #[test]
    fn test_approx_exp_decay_monotone_and_positive() {
        let mut last = approx_exp_decay(0.0);
        assert_eq!(last, 1.0);
        let mut x = 0.0;
        while x < 50.0 {
            let y = approx_exp_decay(x);
            assert!(y > 0.0, "not positive at {x}");
            assert!(y <= last + 1e-6, "increasing at {x}");
            last = y;
            x += 0.01;
        }
    }

    #[test]
    fn test_first_moves_cover_one_starting_point() {
        let shared = shared_for(Variant::Classic);
        let mut state = State::with_seed(&shared, 1);
        state.start_simulation(0);
        let c0 = Color::new(0);
        state.init_move_list_with_local(c0);
        let start = state.board().starting_points(c0)[0];
        let bc = Arc::clone(state.board().board_const());
        assert!(!state.move_list(c0).is_empty());
        for &mv in state.move_list(c0) {
            let info = bc.move_info(mv);
            assert!(info.points.contains(&start));
            // Only the largest pieces are considered at the start.
            assert_eq!(bc.piece_info(info.piece).size, 5);
        }
    }

    #[test]
    fn test_gen_children_values_in_range() {
        let shared = shared_for(Variant::Duo);
        let mut state = State::with_seed(&shared, 2);
        state.start_simulation(0);
        state.finish_in_tree();
        let mut children: Vec<ChildInfo> = Vec::new();
        state.gen_children(&mut children, 0.5);
        assert!(!children.is_empty());
        for child in &children {
            assert!(child.mv.is_regular());
            assert!(child.value > 0.0 && child.value <= 1.0);
            assert!(child.count >= 2.0);
        }
    }

    #[test]
    fn test_trigon_first_move_uses_single_starting_point() {
        let shared = shared_for(Variant::Trigon3);
        let mut state = State::with_seed(&shared, 3);
        state.start_simulation(0);
        let c0 = Color::new(0);
        state.init_move_list_without_local(c0);
        let bc = Arc::clone(state.board().board_const());
        let starts = state.board().starting_points(c0).to_vec();
        let covered: std::collections::HashSet<Point> = state
            .move_list(c0)
            .iter()
            .flat_map(|&mv| bc.move_info(mv).points.iter().copied())
            .filter(|p| starts.contains(p))
            .collect();
        assert_eq!(covered.len(), 1);
    }

    #[test]
    fn test_playout_terminates() {
        let shared = shared_for(Variant::Junior);
        let mut state = State::with_seed(&shared, 4);
        let bound = state.board().max_game_moves();
        for n in 0..3 {
            state.start_simulation(n);
            state.finish_in_tree();
            let mut nu_calls = 0;
            while state.gen_and_play_playout_move(Move::NULL) {
                nu_calls += 1;
                assert!(nu_calls <= bound, "playout too long");
            }
            let result = state.evaluate_playout();
            for value in &result[..2] {
                assert!((0.0..=1.0).contains(value));
            }
        }
    }

    #[test]
    fn test_info_reports_score() {
        let shared = shared_for(Variant::Duo);
        let mut state = State::with_seed(&shared, 5);
        state.start_simulation(0);
        state.finish_in_tree();
        while state.gen_and_play_playout_move(Move::NULL) {}
        state.evaluate_playout();
        assert!(state.info().starts_with("Sco: "));
        assert!(state.dump().contains("To play"));
    }
}
