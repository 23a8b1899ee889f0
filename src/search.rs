//! Search driver on top of the simulation state.
//!
//! The tree search that normally owns [`State`] only needs two things from
//! it: a way to receive expanded children ([`NodeExpander`]) and a playout
//! policy hook for last-good-reply moves ([`LastGoodReply`]). This module
//! provides both, plus a flat root-parallel driver:
//! - the root is expanded once with prior knowledge
//! - every worker thread owns one [`State`] and picks root children by UCB
//! - visit counts and values of all workers are summed at the end

use log::{debug, info, warn};
use rayon::prelude::*;

use crate::board::Float;
use crate::board_const::{BoardConst, Move};
use crate::color::{Color, ColorMap};
use crate::constants::{INIT_VALUE, N_SIMS, UCB_EXPLORE};
use crate::shared_const::SharedConst;
use crate::state::State;
use crate::stats::RunningStats;

/// Receiver of the children of an expanded node.
pub trait NodeExpander {
    /// Add a child with a prior `value` in [0, 1] weighted as `count` visits.
    fn add_child(&mut self, mv: Move, value: Float, count: Float);
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ChildInfo {
    pub mv: Move,
    pub value: Float,
    pub count: Float,
}

impl NodeExpander for Vec<ChildInfo> {
    fn add_child(&mut self, mv: Move, value: Float, count: Float) {
        self.push(ChildInfo { mv, value, count });
    }
}

/// Last-good-reply table: per color, the reply that last won a playout
/// after a given opponent move.
#[derive(Clone, Debug)]
pub struct LastGoodReply {
    replies: ColorMap<Vec<Move>>,
}

impl LastGoodReply {
    pub fn new(nu_moves: usize) -> Self {
        LastGoodReply {
            replies: ColorMap::from_fn(|_| vec![Move::NULL; nu_moves]),
        }
    }

    /// Stored reply of `c` to `previous`, or `Move::NULL`.
    pub fn get(&self, c: Color, previous: Move) -> Move {
        if previous.is_regular() {
            self.replies[c][previous.index()]
        } else {
            Move::NULL
        }
    }

    pub fn store(&mut self, c: Color, previous: Move, reply: Move) {
        if previous.is_regular() && reply.is_regular() {
            self.replies[c][previous.index()] = reply;
        }
    }

    /// Remove the reply of `c` to `previous` if it is `reply`.
    pub fn forget(&mut self, c: Color, previous: Move, reply: Move) {
        if previous.is_regular() && self.replies[c][previous.index()] == reply {
            self.replies[c][previous.index()] = Move::NULL;
        }
    }
}

#[derive(Clone, Debug)]
pub struct SearchParams {
    pub nu_simulations: usize,
    /// Number of worker threads; 0 uses the rayon default.
    pub nu_threads: usize,
    pub seed: u64,
    pub explore: Float,
}

impl Default for SearchParams {
    fn default() -> Self {
        SearchParams {
            nu_simulations: N_SIMS,
            nu_threads: 0,
            seed: 0,
            explore: UCB_EXPLORE,
        }
    }
}

/// Statistics of one root child.
#[derive(Clone, Debug)]
pub struct ChildStats {
    pub mv: Move,
    pub prior_value: Float,
    pub prior_count: Float,
    pub visits: u32,
    pub value_sum: f64,
}

impl ChildStats {
    fn new(child: &ChildInfo) -> Self {
        ChildStats {
            mv: child.mv,
            prior_value: child.value,
            prior_count: child.count,
            visits: 0,
            value_sum: 0.0,
        }
    }

    /// Mean value including the prior.
    #[inline]
    pub fn value(&self) -> f64 {
        let count = self.prior_count as f64 + self.visits as f64;
        if count == 0.0 {
            return INIT_VALUE as f64;
        }
        (self.prior_value as f64 * self.prior_count as f64 + self.value_sum) / count
    }
}

#[derive(Clone, Debug)]
pub struct SearchResult {
    /// Most visited move, `Move::PASS` if there are no legal moves and
    /// `Move::NULL` if the game is over.
    pub best: Move,
    pub children: Vec<ChildStats>,
    /// Score of the color to play at the end of the playouts.
    pub score: RunningStats,
    pub nu_simulations: usize,
    pub nu_playout_moves: u64,
    pub nu_last_good_reply_moves: u64,
}

fn ucb_urgency(child: &ChildStats, log_total: f64, explore: f64) -> f64 {
    let count = child.prior_count as f64 + child.visits as f64;
    child.value() + explore * (log_total / count.max(1.0)).sqrt()
}

fn most_urgent(children: &[ChildStats], total_visits: u64, explore: f64) -> usize {
    let log_total = ((total_visits + 1) as f64).ln();
    children
        .iter()
        .enumerate()
        .max_by(|(_, a), (_, b)| {
            ucb_urgency(a, log_total, explore)
                .partial_cmp(&ucb_urgency(b, log_total, explore))
                .unwrap_or(std::cmp::Ordering::Equal)
        })
        .map(|(i, _)| i)
        .unwrap_or(0)
}

struct WorkerResult {
    children: Vec<ChildStats>,
    score: RunningStats,
    nu_playout_moves: u64,
    nu_last_good_reply_moves: u64,
}

/// Play the rest of the game from the current position of `state`.
fn playout(state: &mut State<'_>, lgr: &LastGoodReply) {
    loop {
        let n = state.get_nu_moves();
        let reply = if n > 0 {
            lgr.get(Color::new(state.get_to_play()), state.get_move(n - 1).mv)
        } else {
            Move::NULL
        };
        if !state.gen_and_play_playout_move(reply) {
            break;
        }
    }
}

/// Update the replies of every color with the moves of the last simulation.
fn update_last_good_reply(
    state: &State<'_>,
    lgr: &mut LastGoodReply,
    first: usize,
    result: &[Float],
) {
    for i in first.max(1)..state.get_nu_moves() {
        let previous = state.get_move(i - 1).mv;
        let reply = state.get_move(i);
        let c = Color::new(reply.player);
        if result[c.index()] > 0.5 {
            lgr.store(c, previous, reply.mv);
        } else {
            lgr.forget(c, previous, reply.mv);
        }
    }
}

/// Share of `total` simulations run by `worker` out of `nu_workers`.
fn worker_simulations(total: usize, nu_workers: usize, worker: usize) -> usize {
    total / nu_workers + usize::from(worker < total % nu_workers)
}

fn run_worker(
    shared: &SharedConst,
    root_children: &[ChildInfo],
    params: &SearchParams,
    worker: usize,
    nu_simulations: usize,
) -> WorkerResult {
    let mut state = State::with_seed(shared, params.seed.wrapping_add(worker as u64));
    let mut lgr = LastGoodReply::new(shared.board.board_const().nu_moves());
    let mut children: Vec<ChildStats> = root_children.iter().map(ChildStats::new).collect();
    let to_play = shared.to_play;
    let first = shared.board.nu_moves();
    for n in 0..nu_simulations {
        let i = most_urgent(&children, n as u64, params.explore as f64);
        state.start_simulation(n);
        state.finish_in_tree();
        state.play_expanded_child(children[i].mv);
        playout(&mut state, &lgr);
        let result = state.evaluate_playout();
        update_last_good_reply(&state, &mut lgr, first, &result);
        children[i].visits += 1;
        children[i].value_sum += result[to_play.index()] as f64;
    }
    debug!("worker {worker}: {}", state.info());
    WorkerResult {
        children,
        score: state.stat_score().clone(),
        nu_playout_moves: state.nu_playout_moves(),
        nu_last_good_reply_moves: state.nu_last_good_reply_moves(),
    }
}

/// Run a flat Monte Carlo search from the root of `shared`.
pub fn search(shared: &SharedConst, params: &SearchParams) -> SearchResult {
    let mut root = State::with_seed(shared, params.seed);
    root.start_simulation(0);
    root.finish_in_tree();
    let mut root_children: Vec<ChildInfo> = Vec::new();
    root.gen_children(&mut root_children, INIT_VALUE);

    let mut result = SearchResult {
        best: Move::NULL,
        children: root_children.iter().map(ChildStats::new).collect(),
        score: RunningStats::new(),
        nu_simulations: 0,
        nu_playout_moves: 0,
        nu_last_good_reply_moves: 0,
    };
    match root_children.as_slice() {
        [] => {
            info!("game over, nothing to search");
            return result;
        }
        [only] => {
            result.best = only.mv;
            return result;
        }
        _ => {}
    }

    let nu_threads = if params.nu_threads == 0 {
        rayon::current_num_threads()
    } else {
        params.nu_threads
    };
    let run = || -> Vec<WorkerResult> {
        (0..nu_threads)
            .into_par_iter()
            .map(|worker| {
                let n = worker_simulations(params.nu_simulations, nu_threads, worker);
                run_worker(shared, &root_children, params, worker, n)
            })
            .collect()
    };
    let workers = match rayon::ThreadPoolBuilder::new()
        .num_threads(nu_threads)
        .build()
    {
        Ok(pool) => pool.install(run),
        Err(e) => {
            warn!("cannot build a pool of {nu_threads} threads, using the global pool: {e}");
            run()
        }
    };

    for worker in &workers {
        for (total, child) in result.children.iter_mut().zip(&worker.children) {
            total.visits += child.visits;
            total.value_sum += child.value_sum;
        }
        result.score.merge(&worker.score);
        result.nu_playout_moves += worker.nu_playout_moves;
        result.nu_last_good_reply_moves += worker.nu_last_good_reply_moves;
    }
    result.nu_simulations = params.nu_simulations;
    result.best = best_move(&result.children);

    let bc = shared.board.board_const();
    info!(
        "{} simulations on {} threads, best {} value {:.3}, score {}",
        result.nu_simulations,
        nu_threads,
        bc.move_to_string(result.best),
        result
            .children
            .iter()
            .find(|c| c.mv == result.best)
            .map_or(0.0, |c| c.value()),
        result.score
    );
    dump_children(bc, &result.children);
    result
}

/// Most visited child.
fn best_move(children: &[ChildStats]) -> Move {
    children
        .iter()
        .max_by_key(|c| c.visits)
        .map(|c| c.mv)
        .unwrap_or(Move::PASS)
}

/// Log the most visited children.
pub fn dump_children(bc: &BoardConst, children: &[ChildStats]) {
    let mut sorted: Vec<&ChildStats> = children.iter().collect();
    sorted.sort_by(|a, b| b.visits.cmp(&a.visits));
    for child in sorted.iter().take(10) {
        debug!(
            "move {} visits={} prior={:.3} value={:.3}",
            bc.move_to_string(child.mv),
            child.visits,
            child.prior_value,
            child.value()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::Board;
    use crate::shared_const::SearchConfig;
    use crate::variant::Variant;

    #[test]
    fn test_last_good_reply_store_and_forget() {
        let mut lgr = LastGoodReply::new(10);
        let c = Color::new(1);
        let prev = Move::from_index(3);
        let reply = Move::from_index(7);
        assert_eq!(lgr.get(c, prev), Move::NULL);
        lgr.store(c, prev, reply);
        assert_eq!(lgr.get(c, prev), reply);
        assert_eq!(lgr.get(Color::new(0), prev), Move::NULL);
        lgr.forget(c, prev, Move::from_index(8));
        assert_eq!(lgr.get(c, prev), reply);
        lgr.forget(c, prev, reply);
        assert_eq!(lgr.get(c, prev), Move::NULL);
        assert_eq!(lgr.get(c, Move::PASS), Move::NULL);
    }

    #[test]
    fn test_most_urgent_prefers_unvisited_prior() {
        let children = vec![
            ChildStats::new(&ChildInfo { mv: Move::from_index(0), value: 0.3, count: 2.0 }),
            ChildStats::new(&ChildInfo { mv: Move::from_index(1), value: 0.7, count: 2.0 }),
        ];
        assert_eq!(most_urgent(&children, 0, 0.3), 1);
    }

    #[test]
    fn test_worker_simulations_sum_to_total() {
        for (total, nu_workers) in [(30, 4), (3, 8), (16, 4), (0, 2)] {
            let sum: usize = (0..nu_workers)
                .map(|w| worker_simulations(total, nu_workers, w))
                .sum();
            assert_eq!(sum, total);
        }
        assert_eq!(worker_simulations(30, 4, 0), 8);
        assert_eq!(worker_simulations(30, 4, 3), 7);
    }

    #[test]
    fn test_search_small() {
        let bd = Board::new(Variant::Duo);
        let shared = SharedConst::new(&bd, SearchConfig::default());
        let params = SearchParams {
            nu_simulations: 20,
            nu_threads: 2,
            seed: 7,
            ..SearchParams::default()
        };
        let result = search(&shared, &params);
        assert!(result.best.is_regular());
        assert!(bd.is_legal(bd.to_play(), result.best));
        let visits: u32 = result.children.iter().map(|c| c.visits).sum();
        assert_eq!(visits as usize, result.nu_simulations);
        assert_eq!(result.score.count() as usize, result.nu_simulations);
    }
}
