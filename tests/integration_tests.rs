//! Integration tests for blokus-mcts
//!
//! These tests drive the simulation state the way a tree search does and
//! compare its incremental move lists against full move generation on the
//! board.

use std::collections::HashSet;
use std::sync::Arc;

use blokus_mcts::board::{Board, Float};
use blokus_mcts::board_const::Move;
use blokus_mcts::color::Color;
use blokus_mcts::search::{ChildInfo, SearchParams, search};
use blokus_mcts::shared_const::{SearchConfig, SharedConst};
use blokus_mcts::state::State;
use blokus_mcts::variant::Variant;

// =============================================================================
// Helper functions
// =============================================================================

fn as_set(moves: &[Move]) -> HashSet<Move> {
    moves.iter().copied().collect()
}

fn shared_for(bd: &Board) -> SharedConst {
    SharedConst::new(bd, SearchConfig::default())
}

/// Run one simulation without tree moves and return the result.
fn run_playout(state: &mut State<'_>, n: usize) -> [Float; 4] {
    state.start_simulation(n);
    state.finish_in_tree();
    while state.gen_and_play_playout_move(Move::NULL) {}
    state.evaluate_playout()
}

/// Legal pentomino move of the first color that does not touch its mirror
/// image, together with the mirrored answer.
fn symmetric_opening(bd: &Board) -> (Move, Move) {
    let bc = Arc::clone(bd.board_const());
    let c0 = Color::new(0);
    let mv = bd
        .gen_legal_moves(c0)
        .into_iter()
        .find(|&mv| {
            let info = bc.move_info(mv);
            bc.piece_info(info.piece).size == 5 && !bc.move_info_ext(mv).breaks_symmetry
        })
        .expect("no opening move");
    (mv, bc.move_info_ext(mv).symmetric_move)
}

// =============================================================================
// Move lists
// =============================================================================

#[test]
fn test_incremental_move_list_matches_full_generation() {
    let config = SearchConfig {
        detect_symmetry: false,
        ..SearchConfig::default()
    };
    for variant in Variant::ALL {
        let root = Board::new(variant);
        let shared = SharedConst::new(&root, config.clone());
        for seed in [1, 2] {
            // `incremental` plays the playout and updates its lists in place,
            // `full` replays the same moves and regenerates from scratch.
            let mut incremental = State::with_seed(&shared, seed);
            let mut full = State::with_seed(&shared, seed + 100);
            incremental.start_simulation(0);
            incremental.finish_in_tree();
            full.start_simulation(0);
            full.finish_in_tree();
            loop {
                let bd = incremental.board();
                let c = bd.to_play();
                let nu_moves = bd.nu_moves();
                incremental.refresh_move_list(c);
                full.init_move_list_with_local(c);
                let updated = as_set(incremental.move_list(c));
                assert_eq!(updated.len(), incremental.move_list(c).len(), "duplicate moves");
                assert_eq!(
                    updated,
                    as_set(full.move_list(c)),
                    "{variant} seed {seed}: after {nu_moves} moves"
                );
                let legal = as_set(&incremental.board().gen_legal_moves(c));
                assert!(updated.is_subset(&legal), "{variant}: illegal move in list");
                if updated.is_empty() {
                    assert!(legal.is_empty(), "{variant}: missed moves");
                }

                if !incremental.gen_and_play_playout_move(Move::NULL) {
                    break;
                }
                let n = incremental.get_nu_moves();
                full.play_expanded_child(incremental.get_move(n - 1).mv);
                assert!(full.board().same_position(incremental.board()));
            }
        }
    }
}

#[test]
fn test_update_twice_is_unchanged() {
    let root = Board::new(Variant::Duo);
    let config = SearchConfig {
        detect_symmetry: false,
        ..SearchConfig::default()
    };
    let shared = SharedConst::new(&root, config);
    let mut state = State::with_seed(&shared, 3);
    state.start_simulation(0);
    for _ in 0..6 {
        assert!(state.gen_and_play_playout_move(Move::NULL));
    }
    let c = state.board().to_play();
    state.refresh_move_list(c);
    let first = as_set(state.move_list(c));
    state.update_move_list(c);
    assert_eq!(as_set(state.move_list(c)), first);
}

#[test]
fn test_local_moves_are_legal_moves() {
    let root = Board::new(Variant::Classic);
    let shared = shared_for(&root);
    let mut state = State::with_seed(&shared, 5);
    state.start_simulation(0);
    for _ in 0..24 {
        let c = state.board().to_play();
        state.refresh_move_list(c);
        let all = as_set(state.move_list(c));
        assert!(as_set(state.local_moves()).is_subset(&all));
        if !state.gen_and_play_playout_move(Move::NULL) {
            break;
        }
    }
}

// =============================================================================
// Simulations
// =============================================================================

#[test]
fn test_playout_length_is_bounded() {
    for variant in [Variant::Classic2, Variant::Trigon3, Variant::Junior] {
        let root = Board::new(variant);
        let shared = shared_for(&root);
        let mut state = State::with_seed(&shared, 11);
        let bound = root.max_game_moves();
        for n in 0..2 {
            state.start_simulation(n);
            state.finish_in_tree();
            let mut nu_moves = 0;
            while state.gen_and_play_playout_move(Move::NULL) {
                nu_moves += 1;
                assert!(nu_moves <= bound, "{variant}: playout too long");
            }
        }
    }
}

#[test]
fn test_results_sum_to_half_the_colors() {
    for variant in [Variant::Classic, Variant::Classic2, Variant::Trigon3, Variant::Duo] {
        let root = Board::new(variant);
        let shared = shared_for(&root);
        let mut state = State::with_seed(&shared, 13);
        let result = run_playout(&mut state, 0);
        let nu_colors = root.nu_colors() as usize;
        let sum: Float = result[..nu_colors].iter().sum();
        assert!(
            (sum - nu_colors as Float / 2.0).abs() < 1e-4,
            "{variant}: {result:?}"
        );
    }
}

#[test]
fn test_start_simulation_restores_root() {
    let mut root = Board::new(Variant::Duo);
    let (m0, m1) = symmetric_opening(&root);
    root.play(Color::new(0), m0);
    root.play(Color::new(1), m1);
    let shared = shared_for(&root);
    let mut state = State::with_seed(&shared, 17);
    run_playout(&mut state, 0);
    assert!(!state.board().same_position(&root));
    state.start_simulation(1);
    assert!(state.board().same_position(&root));
    assert_eq!(state.get_nu_moves(), 2);
    assert_eq!(state.get_move(1).player, 1);
    assert_eq!(state.get_move(1).mv, m1);
}

#[test]
fn test_last_good_reply_is_played_when_legal() {
    let root = Board::new(Variant::Duo);
    let shared = shared_for(&root);
    let mut state = State::with_seed(&shared, 19);
    state.start_simulation(0);
    state.finish_in_tree();
    // A small piece that the playout policy would not consider this early.
    let bc = Arc::clone(root.board_const());
    let reply = root
        .gen_legal_moves(Color::new(0))
        .into_iter()
        .find(|&mv| bc.move_info(mv).points.len() == 2)
        .expect("no domino move");
    assert!(state.gen_and_play_playout_move(reply));
    assert_eq!(state.get_move(0).mv, reply);
    assert_eq!(state.nu_last_good_reply_moves(), 1);

    // Illegal replies are ignored.
    assert!(state.gen_and_play_playout_move(reply));
    assert_ne!(state.get_move(1).mv, reply);
    assert_eq!(state.nu_last_good_reply_moves(), 1);
}

#[test]
fn test_gen_children_at_game_end() {
    let mut root = Board::new(Variant::Duo);
    root.play(Color::new(0), Move::PASS);
    root.play(Color::new(1), Move::PASS);
    let shared = shared_for(&root);
    let mut state = State::with_seed(&shared, 23);
    state.start_simulation(0);
    state.finish_in_tree();
    let mut children: Vec<ChildInfo> = Vec::new();
    state.gen_children(&mut children, 0.5);
    assert!(children.is_empty());
    assert!(!state.gen_and_play_playout_move(Move::NULL));
}

// =============================================================================
// Symmetric draws
// =============================================================================

#[test]
fn test_symmetric_position_is_a_draw() {
    let root = Board::new(Variant::Duo);
    let shared = shared_for(&root);
    let mut state = State::with_seed(&shared, 29);
    assert!(state.check_symmetric_draw());

    let mut bd = root.clone();
    let (m0, m1) = symmetric_opening(&bd);
    bd.play(Color::new(0), m0);
    bd.play(Color::new(1), m1);
    let (m2, m3) = {
        let bc = Arc::clone(bd.board_const());
        let c0 = Color::new(0);
        bd.gen_legal_moves(c0)
            .into_iter()
            .filter(|&mv| !bc.move_info_ext(mv).breaks_symmetry)
            .map(|mv| (mv, bc.move_info_ext(mv).symmetric_move))
            .find(|&(mv, symm)| {
                let mut after = bd.clone();
                after.play(c0, mv);
                after.is_legal(Color::new(1), symm)
            })
            .expect("no symmetric continuation")
    };

    state.start_simulation(0);
    for mv in [m0, m1, m2, m3] {
        state.play_in_tree(mv);
    }
    state.finish_in_tree();
    assert!(!state.is_symmetry_broken());
    assert!(!state.gen_and_play_playout_move(Move::NULL));
    let result = state.evaluate_playout();
    assert_eq!(&result[..2], &[0.5, 0.5]);
}

#[test]
fn test_second_player_avoids_symmetric_draw() {
    let mut root = Board::new(Variant::Duo);
    let (m0, m1) = symmetric_opening(&root);
    root.play(Color::new(0), m0);

    let shared = shared_for(&root);
    let state = State::with_seed(&shared, 31);
    assert!(!state.check_symmetric_draw());

    let config = SearchConfig {
        avoid_symmetric_draw: false,
        ..SearchConfig::default()
    };
    let shared = SharedConst::new(&root, config);
    let mut state = State::with_seed(&shared, 31);
    assert!(state.check_symmetric_draw());
    state.start_simulation(0);
    state.finish_in_tree();
    let mut children: Vec<ChildInfo> = Vec::new();
    state.gen_children(&mut children, 0.5);
    let best = children
        .iter()
        .max_by(|a, b| a.value.total_cmp(&b.value))
        .expect("no children");
    assert_eq!(best.mv, m1);
}

#[test]
fn test_answer_on_mirror_points_only_breaks_symmetry() {
    let mut root = Board::new(Variant::Duo);
    let (m0, _) = symmetric_opening(&root);
    root.play(Color::new(0), m0);
    let config = SearchConfig {
        avoid_symmetric_draw: false,
        ..SearchConfig::default()
    };
    let shared = SharedConst::new(&root, config);
    let mut state = State::with_seed(&shared, 41);
    assert!(state.check_symmetric_draw());
    state.start_simulation(0);
    state.finish_in_tree();
    assert!(!state.is_symmetry_broken());

    // A monomino on the mirror of the opening's starting point is not the
    // mirrored opening.
    let bc = Arc::clone(root.board_const());
    let answer = bc.parse_move("j5").unwrap();
    assert!(root.is_legal(Color::new(1), answer));
    state.play_expanded_child(answer);
    assert!(state.is_symmetry_broken());

    // A third piece that keeps its mirror points free must not end the
    // playout as a symmetric draw.
    let c0 = Color::new(0);
    let bd = state.board().clone();
    let mv = bd
        .gen_legal_moves(c0)
        .into_iter()
        .find(|&mv| {
            !bc.move_info_ext(mv).breaks_symmetry
                && bc
                    .move_info(bc.move_info_ext(mv).symmetric_move)
                    .points
                    .iter()
                    .all(|&p| bd.point_state(p).is_none())
        })
        .expect("no free continuation");
    state.play_expanded_child(mv);
    assert_eq!(state.board().nu_onboard_pieces(), 3);
    assert!(state.is_symmetry_broken());
    assert!(state.gen_and_play_playout_move(Move::NULL));
}

#[test]
fn test_symmetric_position_with_two_pieces_continues() {
    let mut root = Board::new(Variant::Duo);
    let (m0, m1) = symmetric_opening(&root);
    root.play(Color::new(0), m0);
    root.play(Color::new(1), m1);
    let shared = shared_for(&root);
    let mut state = State::with_seed(&shared, 43);
    assert!(state.check_symmetric_draw());
    state.start_simulation(0);
    state.finish_in_tree();
    assert!(!state.is_symmetry_broken());
    assert!(root.nu_onboard_pieces() < root.variant().symmetry_min_nu_pieces());
    assert!(state.gen_and_play_playout_move(Move::NULL));
    assert_eq!(state.get_nu_moves(), 3);
}

#[test]
fn test_pass_breaks_symmetry() {
    let root = Board::new(Variant::Junior);
    let shared = shared_for(&root);
    let mut state = State::with_seed(&shared, 37);
    state.start_simulation(0);
    state.play_expanded_child(Move::PASS);
    assert!(state.is_symmetry_broken());
}

// =============================================================================
// Shared tables and the search driver
// =============================================================================

#[test]
fn test_board_tables_are_shared() {
    let a = Board::new(Variant::Classic);
    let b = Board::new(Variant::Classic2);
    let c = Board::new(Variant::Duo);
    assert!(Arc::ptr_eq(a.board_const(), b.board_const()));
    assert!(!Arc::ptr_eq(a.board_const(), c.board_const()));
}

#[test]
fn test_search_is_deterministic_with_one_thread() {
    let root = Board::new(Variant::Junior);
    let shared = shared_for(&root);
    let params = SearchParams {
        nu_simulations: 30,
        nu_threads: 1,
        seed: 99,
        ..SearchParams::default()
    };
    let first = search(&shared, &params);
    let second = search(&shared, &params);
    assert!(root.is_legal(root.to_play(), first.best));
    assert_eq!(first.best, second.best);
    let visits: Vec<u32> = first.children.iter().map(|c| c.visits).collect();
    let again: Vec<u32> = second.children.iter().map(|c| c.visits).collect();
    assert_eq!(visits, again);
}

#[test]
fn test_search_with_threads_returns_legal_move() {
    let mut root = Board::new(Variant::Classic);
    let c0 = Color::new(0);
    let first = root.gen_legal_moves(c0)[0];
    root.play(c0, first);
    let shared = shared_for(&root);
    let params = SearchParams {
        nu_simulations: 16,
        nu_threads: 4,
        seed: 1,
        ..SearchParams::default()
    };
    let result = search(&shared, &params);
    assert!(root.is_legal(root.to_play(), result.best));
    assert_eq!(result.nu_simulations, 16);
}

#[test]
fn test_search_runs_exactly_the_requested_simulations() {
    let root = Board::new(Variant::Duo);
    let shared = shared_for(&root);
    let params = SearchParams {
        nu_simulations: 30,
        nu_threads: 4,
        seed: 5,
        ..SearchParams::default()
    };
    let result = search(&shared, &params);
    assert_eq!(result.nu_simulations, 30);
    let visits: u32 = result.children.iter().map(|c| c.visits).sum();
    assert_eq!(visits, 30);
    assert_eq!(result.score.count(), 30);
}
