#![allow(clippy::float_cmp)]

use std::thread;

use std::time::Duration;

use approx::assert_abs_diff_eq;
use lpkit::{
    Algorithm, Backtracking, BoundKind, BranchCutConfig, Direction, Error, InteriorConfig, LimitReached, Problem,
    SimplexConfig, SolutionStatus, SolveState, Solver, VarKind, Verbosity,
};

fn quiet_simplex() -> Solver {
    Solver::new(SimplexConfig::default().with_verbosity(Verbosity::Off))
}

fn quiet_branch_cut() -> Solver {
    Solver::new(
        BranchCutConfig::default()
            .with_verbosity(Verbosity::Off)
            .with_relaxation(SimplexConfig::default().with_verbosity(Verbosity::Off)),
    )
}

/// Adds `count` columns bounded below by zero.
fn add_nonnegative(problem: &mut Problem, count: usize) -> usize {
    let first = problem.add_columns(count).unwrap();
    for column in first..first + count {
        problem.set_column_bounds(column, BoundKind::Lower, 0.0, 0.0).unwrap();
    }
    first
}

/// maximize 3x + 5y
/// subject to 2x + 4y <= 100, 3x + 2y <= 90, x + y <= 40, x, y >= 0
fn production() -> Problem {
    let mut problem = Problem::new().unwrap();
    problem.set_name(Some("production")).unwrap();
    problem.set_direction(Direction::Maximize);
    problem.add_rows(3).unwrap();
    add_nonnegative(&mut problem, 2);
    problem.set_objective_coefficient(1, 3.0).unwrap();
    problem.set_objective_coefficient(2, 5.0).unwrap();
    let rows = [([2.0, 4.0], 100.0), ([3.0, 2.0], 90.0), ([1.0, 1.0], 40.0)];
    for (row, (coefs, rhs)) in rows.iter().enumerate() {
        problem.set_row_bounds(row + 1, BoundKind::Upper, 0.0, *rhs).unwrap();
        problem.set_row_coefficients(row + 1, &[1, 2], coefs).unwrap();
    }
    problem
}

/// x + y <= 1, x + y >= 2, x, y >= 0
fn contradictory() -> Problem {
    let mut problem = Problem::new().unwrap();
    problem.add_rows(2).unwrap();
    add_nonnegative(&mut problem, 2);
    problem.set_row_bounds(1, BoundKind::Upper, 0.0, 1.0).unwrap();
    problem.set_row_bounds(2, BoundKind::Lower, 2.0, 0.0).unwrap();
    for row in 1..=2 {
        problem.set_row_coefficients(row, &[1, 2], &[1.0, 1.0]).unwrap();
    }
    problem
}

#[test]
fn test_production_simplex() {
    let mut problem = production();
    let report = quiet_simplex().solve(&mut problem).unwrap();
    assert_eq!(report.status, SolutionStatus::Optimal);
    assert_eq!(report.limit, None);
    assert_eq!(problem.solve_state(), SolveState::Solved(SolutionStatus::Optimal));

    let solution = problem.solution(Algorithm::Simplex).unwrap();
    assert_abs_diff_eq!(solution.objective_value, 135.0, epsilon = 1e-6);
    assert_abs_diff_eq!(solution.column_primal[0], 20.0, epsilon = 1e-6);
    assert_abs_diff_eq!(solution.column_primal[1], 15.0, epsilon = 1e-6);
    assert_abs_diff_eq!(solution.row_value(3).unwrap(), 35.0, epsilon = 1e-6);

    let duals = solution.row_dual.unwrap();
    assert_abs_diff_eq!(duals[0], 1.125, epsilon = 1e-6);
    assert_abs_diff_eq!(duals[1], 0.25, epsilon = 1e-6);
    assert_abs_diff_eq!(duals[2], 0.0, epsilon = 1e-6);
}

#[test]
fn test_production_interior_point() {
    let mut problem = production();
    let solver = Solver::new(InteriorConfig::default().with_verbosity(Verbosity::Off));
    let report = solver.solve(&mut problem).unwrap();
    assert_eq!(report.algorithm, Algorithm::InteriorPoint);
    assert_eq!(report.status, SolutionStatus::Optimal);

    let solution = problem.solution(Algorithm::InteriorPoint).unwrap();
    assert_abs_diff_eq!(solution.objective_value, 135.0, epsilon = 1e-5);
    assert_abs_diff_eq!(solution.column_primal[0], 20.0, epsilon = 1e-5);
    assert_abs_diff_eq!(solution.column_primal[1], 15.0, epsilon = 1e-5);
    assert!(matches!(problem.solution(Algorithm::Simplex), Err(Error::SolverNotRun(_))));
}

#[test]
fn test_infeasible() {
    let mut problem = contradictory();
    let report = quiet_simplex().solve(&mut problem).unwrap();
    assert_eq!(report.status, SolutionStatus::Infeasible);
    assert_eq!(problem.solution(Algorithm::Simplex).unwrap().status, SolutionStatus::Infeasible);
}

#[test]
fn test_unbounded() {
    // maximize x + y subject to x - y <= 1
    let mut problem = Problem::new().unwrap();
    problem.set_direction(Direction::Maximize);
    problem.add_rows(1).unwrap();
    add_nonnegative(&mut problem, 2);
    problem.set_row_bounds(1, BoundKind::Upper, 0.0, 1.0).unwrap();
    problem.set_row_coefficients(1, &[1, 2], &[1.0, -1.0]).unwrap();
    problem.set_objective_coefficient(1, 1.0).unwrap();
    problem.set_objective_coefficient(2, 1.0).unwrap();

    let report = quiet_simplex().solve(&mut problem).unwrap();
    assert_eq!(report.status, SolutionStatus::Unbounded);

    let interior = Solver::new(InteriorConfig::default().with_verbosity(Verbosity::Off));
    let report = interior.solve(&mut problem).unwrap();
    assert_eq!(report.status, SolutionStatus::Unbounded);
    assert_eq!(problem.solution(Algorithm::InteriorPoint).unwrap().status, SolutionStatus::Unbounded);
}

#[test]
fn test_infinite_column_sides_solve_like_their_kind() {
    // maximize x + y subject to x + y <= 10, y >= 0
    let inf = f64::INFINITY;
    for (kind, lower, upper) in [(BoundKind::Lower, -inf, 0.0), (BoundKind::Upper, 0.0, inf)] {
        let mut problem = Problem::new().unwrap();
        problem.set_direction(Direction::Maximize);
        problem.add_rows(1).unwrap();
        problem.add_columns(2).unwrap();
        problem.set_column_bounds(1, kind, lower, upper).unwrap();
        problem.set_column_bounds(2, BoundKind::Lower, 0.0, 0.0).unwrap();
        problem.set_row_bounds(1, BoundKind::Upper, 0.0, 10.0).unwrap();
        problem.set_row_coefficients(1, &[1, 2], &[1.0, 1.0]).unwrap();
        problem.set_objective_coefficient(1, 1.0).unwrap();
        problem.set_objective_coefficient(2, 1.0).unwrap();

        let report = quiet_simplex().solve(&mut problem).unwrap();
        assert_eq!(report.status, SolutionStatus::Optimal, "{kind:?}");
        let solution = problem.solution(Algorithm::Simplex).unwrap();
        assert_abs_diff_eq!(solution.objective_value, 10.0, epsilon = 1e-6);
    }

    // same objective with x in (-inf, 5] and y in [0, 1]
    let mut problem = Problem::new().unwrap();
    problem.set_direction(Direction::Maximize);
    problem.add_rows(1).unwrap();
    problem.add_columns(2).unwrap();
    problem.set_column_bounds(1, BoundKind::Double, -inf, 5.0).unwrap();
    problem.set_column_bounds(2, BoundKind::Double, 0.0, 1.0).unwrap();
    problem.set_row_bounds(1, BoundKind::Upper, 0.0, 10.0).unwrap();
    problem.set_row_coefficients(1, &[1, 2], &[1.0, 1.0]).unwrap();
    problem.set_objective_coefficient(1, 1.0).unwrap();
    problem.set_objective_coefficient(2, 1.0).unwrap();
    let report = quiet_simplex().solve(&mut problem).unwrap();
    assert_eq!(report.status, SolutionStatus::Optimal);
    let solution = problem.solution(Algorithm::Simplex).unwrap();
    assert_abs_diff_eq!(solution.objective_value, 6.0, epsilon = 1e-6);
}

#[test]
fn test_objective_limit_is_reported() {
    let mut problem = production();
    let config = SimplexConfig::default()
        .with_verbosity(Verbosity::Off)
        .with_objective_limits(None, Some(50.0));
    let report = Solver::new(config).solve(&mut problem).unwrap();
    assert_eq!(report.limit, Some(LimitReached::ObjectiveUpperLimit));
    assert_eq!(report.status, SolutionStatus::Feasible);
    let solution = problem.solution(Algorithm::Simplex).unwrap();
    assert_eq!(solution.limit, Some(LimitReached::ObjectiveUpperLimit));
    assert!(solution.objective_value > 50.0);
}

#[test]
fn test_branch_cut_short_circuits_on_infeasible_relaxation() {
    let mut problem = contradictory();
    problem.set_column_kind(1, VarKind::Integer).unwrap();
    problem.set_column_kind(2, VarKind::Binary).unwrap();

    let report = quiet_branch_cut().solve(&mut problem).unwrap();
    assert_eq!(report.status, SolutionStatus::Infeasible);
    assert_eq!(report.relaxation, Some(SolutionStatus::Infeasible));
    assert!(!report.search_ran);

    let stats = problem.engine_stats();
    assert_eq!(stats.simplex_calls, 1);
    assert_eq!(stats.intopt_calls, 0);

    let solution = problem.solution(Algorithm::BranchCut).unwrap();
    assert_eq!(solution.status, SolutionStatus::Infeasible);
    assert_eq!(solution.gap, None);
}

#[test]
fn test_branch_cut_binary_knapsack() {
    // maximize 10a + 13b + 7c subject to 4a + 6b + 3c <= 9, binary
    let mut problem = Problem::new().unwrap();
    problem.set_direction(Direction::Maximize);
    problem.add_rows(1).unwrap();
    problem.add_columns(3).unwrap();
    problem.set_row_bounds(1, BoundKind::Upper, 0.0, 9.0).unwrap();
    problem.set_row_coefficients(1, &[1, 2, 3], &[4.0, 6.0, 3.0]).unwrap();
    for (column, value) in [(1, 10.0), (2, 13.0), (3, 7.0)] {
        problem.set_column_kind(column, VarKind::Binary).unwrap();
        problem.set_objective_coefficient(column, value).unwrap();
    }

    let report = quiet_branch_cut().solve(&mut problem).unwrap();
    assert!(report.search_ran);
    assert_eq!(report.status, SolutionStatus::Optimal);
    assert_eq!(problem.engine_stats().intopt_calls, 1);

    let solution = problem.solution(Algorithm::BranchCut).unwrap();
    assert_abs_diff_eq!(solution.objective_value, 20.0, epsilon = 1e-6);
    assert_abs_diff_eq!(solution.column_primal[1], 1.0, epsilon = 1e-6);
    assert_abs_diff_eq!(solution.column_primal[2], 1.0, epsilon = 1e-6);
    assert_abs_diff_eq!(solution.gap.unwrap(), 0.0, epsilon = 1e-9);
}

/// 25-item binary knapsack. The relaxation bound is 526.6 and the integer
/// optimum is 525.
fn knapsack() -> Problem {
    let values: Vec<f64> = (0..25).map(|i| ((37 * i + 11) % 41 + 10) as f64).collect();
    let weights: Vec<f64> = (0..25).map(|i| ((53 * i + 7) % 47 + 12) as f64).collect();
    let mut problem = Problem::new().unwrap();
    problem.set_direction(Direction::Maximize);
    problem.add_rows(1).unwrap();
    problem.add_columns(25).unwrap();
    problem.set_row_bounds(1, BoundKind::Upper, 0.0, 432.0).unwrap();
    let columns: Vec<usize> = (1..=25).collect();
    problem.set_row_coefficients(1, &columns, &weights).unwrap();
    for (&column, &value) in columns.iter().zip(&values) {
        problem.set_column_kind(column, VarKind::Binary).unwrap();
        problem.set_objective_coefficient(column, value).unwrap();
    }
    problem
}

fn depth_first() -> BranchCutConfig {
    BranchCutConfig::default()
        .with_verbosity(Verbosity::Off)
        .with_relaxation(SimplexConfig::default().with_verbosity(Verbosity::Off))
        .with_backtracking(Backtracking::DepthFirst)
}

#[test]
fn test_branch_cut_stops_on_gap() {
    let mut problem = knapsack();
    let report = Solver::new(depth_first().with_mip_gap(0.2)).solve(&mut problem).unwrap();
    assert!(report.search_ran);
    assert_eq!(report.status, SolutionStatus::Feasible);
    assert_eq!(report.limit, Some(LimitReached::Gap));

    let solution = problem.solution(Algorithm::BranchCut).unwrap();
    assert_eq!(solution.status, SolutionStatus::Feasible);
    assert_eq!(solution.limit, Some(LimitReached::Gap));
    let gap = solution.gap.unwrap();
    assert!(gap > 0.0 && gap <= 0.2, "gap {gap}");
    assert!(solution.objective_value <= 525.0 + 1e-6);
    assert!(solution.column_primal.iter().all(|&x| x == 0.0 || x == 1.0));
}

#[test]
fn test_branch_cut_stops_on_time_limit() {
    let mut problem = knapsack();
    let config = depth_first().with_time_limit(Duration::from_millis(1));
    let report = Solver::new(config).solve(&mut problem).unwrap();
    assert!(report.search_ran);
    assert_eq!(report.limit, Some(LimitReached::Time));
    assert!(
        matches!(report.status, SolutionStatus::Feasible | SolutionStatus::Undefined),
        "{:?}",
        report.status
    );

    let solution = problem.solution(Algorithm::BranchCut).unwrap();
    assert_eq!(solution.limit, Some(LimitReached::Time));
    assert_eq!(solution.gap.is_some(), report.status == SolutionStatus::Feasible);
}

#[test]
fn test_delete_renumbers_rows() {
    let mut problem = Problem::new().unwrap();
    problem.add_rows(3).unwrap();
    problem.add_columns(1).unwrap();
    for row in 1..=3 {
        problem.set_row_coefficients(row, &[1], &[row as f64]).unwrap();
        problem.set_row_name(row, Some(&format!("r{row}"))).unwrap();
    }

    problem.delete_rows(&[2]).unwrap();
    assert_eq!(problem.row_count(), 2);
    assert_eq!(problem.row_name(1).unwrap().as_deref(), Some("r1"));
    assert_eq!(problem.row_name(2).unwrap().as_deref(), Some("r3"));
    assert_eq!(problem.row_coefficients(2).unwrap(), vec![(1, 3.0)]);
    assert_eq!(
        problem.row_coefficients(3),
        Err(Error::InvalidRowIndex { index: 3, count: 2 })
    );
}

#[test]
fn test_solution_requires_fresh_solve() {
    let mut problem = production();
    assert_eq!(
        problem.solution(Algorithm::Simplex),
        Err(Error::SolverNotRun(Algorithm::Simplex))
    );

    quiet_simplex().solve(&mut problem).unwrap();
    assert!(problem.solution(Algorithm::Simplex).is_ok());

    // renaming is not a data change
    problem.set_row_name(1, Some("labour")).unwrap();
    assert!(problem.solution(Algorithm::Simplex).is_ok());

    problem.set_row_bounds(3, BoundKind::Upper, 0.0, 30.0).unwrap();
    assert_eq!(problem.solve_state(), SolveState::Unsolved);
    assert_eq!(
        problem.solution(Algorithm::Simplex),
        Err(Error::SolverNotRun(Algorithm::Simplex))
    );

    quiet_simplex().solve(&mut problem).unwrap();
    let solution = problem.solution(Algorithm::Simplex).unwrap();
    assert_eq!(solution.row_primal.len(), 3);
}

#[test]
fn test_mismatched_lengths_leave_problem_unchanged() {
    let mut problem = production();
    quiet_simplex().solve(&mut problem).unwrap();
    let before = problem.nonzero_count();

    let err = problem.set_row_coefficients(1, &[1, 2, 1], &[1.0, 1.0]).unwrap_err();
    assert_eq!(err, Error::MismatchedLength { indices: 3, values: 2 });
    assert_eq!(problem.nonzero_count(), before);
    // a rejected call is not a mutation
    assert!(problem.solution(Algorithm::Simplex).is_ok());
}

#[test]
fn test_clone_solves_independently() {
    let mut original = production();
    let mut copy = original.try_clone().unwrap();
    copy.set_row_bounds(3, BoundKind::Upper, 0.0, 20.0).unwrap();

    quiet_simplex().solve(&mut original).unwrap();
    quiet_simplex().solve(&mut copy).unwrap();
    let a = original.solution(Algorithm::Simplex).unwrap();
    let b = copy.solution(Algorithm::Simplex).unwrap();
    assert_abs_diff_eq!(a.objective_value, 135.0, epsilon = 1e-6);
    assert!(b.objective_value < a.objective_value);
    assert_eq!(copy.name().as_deref(), Some("production"));
}

#[test]
fn test_independent_problems_across_threads() {
    let handles: Vec<_> = (0..4)
        .map(|k| {
            thread::spawn(move || {
                let mut problem = production();
                problem.set_row_bounds(1, BoundKind::Upper, 0.0, 100.0 + k as f64).unwrap();
                quiet_simplex().solve(&mut problem).unwrap();
                problem.solution(Algorithm::Simplex).unwrap().objective_value
            })
        })
        .collect();

    let objectives: Vec<f64> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    assert_abs_diff_eq!(objectives[0], 135.0, epsilon = 1e-6);
    for pair in objectives.windows(2) {
        assert!(pair[1] >= pair[0]);
    }
}

#[test]
fn test_problem_moves_to_another_thread() {
    let problem = production();
    let solved = thread::spawn(move || {
        let mut problem = problem;
        quiet_simplex().solve(&mut problem).unwrap();
        problem
    })
    .join()
    .unwrap();
    assert_eq!(solved.solve_state(), SolveState::Solved(SolutionStatus::Optimal));
}

#[cfg(feature = "serde")]
#[test]
fn test_serde_round_trip() {
    let config = BranchCutConfig::default().with_mip_gap(0.01);
    let json = serde_json::to_string(&config).unwrap();
    let back: BranchCutConfig = serde_json::from_str(&json).unwrap();
    assert_eq!(back, config);

    let mut problem = production();
    quiet_simplex().solve(&mut problem).unwrap();
    let solution = problem.solution(Algorithm::Simplex).unwrap();
    let json = serde_json::to_value(&solution).unwrap();
    assert_eq!(json["status"], "Optimal");
    assert_eq!(json["algorithm"], "Simplex");
}
