use std::ffi::c_int;

use lpkit_engine as engine;
use lpkit_engine::Prob;

use crate::error::{Error, Result};
use crate::problem::Problem;
use crate::solver::LimitReached;
use crate::types::{Algorithm, SolutionStatus};

/// Guards the gap denominator against incumbents near zero.
const GAP_EPSILON: f64 = f64::EPSILON;

/// Values of one solve, copied out of the engine.
///
/// A solution owns its data: changing or dropping the problem afterwards does
/// not affect it. Index vectors are 0-based, so the value of row `i` sits at
/// `row_primal[i - 1]`.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Solution {
    pub algorithm: Algorithm,
    pub status: SolutionStatus,
    pub objective_value: f64,
    /// Row activities.
    pub row_primal: Vec<f64>,
    /// Row duals. `None` for branch-and-cut.
    pub row_dual: Option<Vec<f64>>,
    pub column_primal: Vec<f64>,
    /// Reduced costs. `None` for branch-and-cut.
    pub column_dual: Option<Vec<f64>>,
    /// Relative distance between incumbent and best bound. Branch-and-cut
    /// only, and only when an incumbent exists.
    pub gap: Option<f64>,
    pub limit: Option<LimitReached>,
}

/// `|bound - incumbent| / max(|incumbent|, eps)`
pub fn relative_gap(incumbent: f64, bound: f64) -> f64 {
    (bound - incumbent).abs() / incumbent.abs().max(GAP_EPSILON)
}

struct Accessors {
    objective: unsafe fn(*const Prob) -> f64,
    row_primal: unsafe fn(*const Prob, c_int) -> f64,
    row_dual: Option<unsafe fn(*const Prob, c_int) -> f64>,
    column_primal: unsafe fn(*const Prob, c_int) -> f64,
    column_dual: Option<unsafe fn(*const Prob, c_int) -> f64>,
}

impl Accessors {
    fn of(algorithm: Algorithm) -> Self {
        match algorithm {
            Algorithm::Simplex => Self {
                objective: engine::get_obj_val,
                row_primal: engine::get_row_prim,
                row_dual: Some(engine::get_row_dual),
                column_primal: engine::get_col_prim,
                column_dual: Some(engine::get_col_dual),
            },
            Algorithm::InteriorPoint => Self {
                objective: engine::ipt_obj_val,
                row_primal: engine::ipt_row_prim,
                row_dual: Some(engine::ipt_row_dual),
                column_primal: engine::ipt_col_prim,
                column_dual: Some(engine::ipt_col_dual),
            },
            Algorithm::BranchCut => Self {
                objective: engine::mip_obj_val,
                row_primal: engine::mip_row_val,
                row_dual: None,
                column_primal: engine::mip_col_val,
                column_dual: None,
            },
        }
    }
}

/// Reads `count` values through a 1-based per-index accessor.
fn collect(raw: *const Prob, count: usize, get: unsafe fn(*const Prob, c_int) -> f64) -> Vec<f64> {
    // SAFETY: `raw` is live for the caller's borrow of the problem and every
    // index lies in 1..=count.
    (1..=count).map(|k| unsafe { get(raw, k as c_int) }).collect()
}

impl Solution {
    /// Copies the result of the last `algorithm` solve out of `problem`.
    ///
    /// Fails with [`Error::SolverNotRun`] unless that solve completed after the
    /// last change to the problem data. A branch-and-cut solve also leaves a
    /// simplex solution for its relaxation.
    pub fn extract(problem: &Problem, algorithm: Algorithm) -> Result<Self> {
        let record = problem.solve_record(algorithm).ok_or(Error::SolverNotRun(algorithm))?;
        let raw = problem.raw().cast_const();
        let (m, n) = (problem.row_count(), problem.column_count());
        let get = Accessors::of(algorithm);

        let objective_value = unsafe { (get.objective)(raw) };
        let gap = match algorithm {
            Algorithm::BranchCut if record.status.has_solution() => {
                let bound = unsafe { engine::mip_obj_bound(raw) };
                Some(relative_gap(objective_value, bound))
            }
            _ => None,
        };

        Ok(Self {
            algorithm,
            status: record.status,
            objective_value,
            row_primal: collect(raw, m, get.row_primal),
            row_dual: get.row_dual.map(|f| collect(raw, m, f)),
            column_primal: collect(raw, n, get.column_primal),
            column_dual: get.column_dual.map(|f| collect(raw, n, f)),
            gap,
            limit: record.limit,
        })
    }

    pub fn is_optimal(&self) -> bool {
        self.status == SolutionStatus::Optimal
    }

    /// Value of 1-based `column`, if it exists.
    pub fn column_value(&self, column: usize) -> Option<f64> {
        column.checked_sub(1).and_then(|k| self.column_primal.get(k)).copied()
    }

    /// Activity of 1-based `row`, if it exists.
    pub fn row_value(&self, row: usize) -> Option<f64> {
        row.checked_sub(1).and_then(|k| self.row_primal.get(k)).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{BranchCutConfig, SimplexConfig, Verbosity};
    use crate::solver::Solver;
    use crate::types::{BoundKind, Direction, VarKind};
    use approx::assert_relative_eq;

    #[test]
    fn test_relative_gap() {
        assert_relative_eq!(relative_gap(100.0, 110.0), 0.1);
        assert_relative_eq!(relative_gap(-50.0, -40.0), 0.2);
        assert_eq!(relative_gap(3.0, 3.0), 0.0);
        // near-zero incumbent falls back to epsilon
        assert_relative_eq!(relative_gap(0.0, 1e-12), 1e-12 / f64::EPSILON);
    }

    #[test]
    fn test_extract_requires_solve() {
        let p = Problem::new().unwrap();
        for &algorithm in Algorithm::ALL {
            assert_eq!(Solution::extract(&p, algorithm), Err(Error::SolverNotRun(algorithm)));
        }
    }

    /// max 5a + 4b s.t. 6a + 4b <= 24, a + 2b <= 6, a, b integer >= 0
    fn mip() -> Problem {
        let mut p = Problem::new().unwrap();
        p.set_direction(Direction::Maximize);
        p.add_rows(2).unwrap();
        p.add_columns(2).unwrap();
        p.set_row_bounds(1, BoundKind::Upper, 0.0, 24.0).unwrap();
        p.set_row_bounds(2, BoundKind::Upper, 0.0, 6.0).unwrap();
        p.set_row_coefficients(1, &[1, 2], &[6.0, 4.0]).unwrap();
        p.set_row_coefficients(2, &[1, 2], &[1.0, 2.0]).unwrap();
        for (column, cost) in [(1, 5.0), (2, 4.0)] {
            p.set_column_bounds(column, BoundKind::Lower, 0.0, 0.0).unwrap();
            p.set_column_kind(column, VarKind::Integer).unwrap();
            p.set_objective_coefficient(column, cost).unwrap();
        }
        p
    }

    #[test]
    fn test_branch_cut_solution_shape() {
        let mut p = mip();
        let config = BranchCutConfig::default()
            .with_verbosity(Verbosity::Off)
            .with_relaxation(SimplexConfig::default().with_verbosity(Verbosity::Off));
        Solver::new(config).solve(&mut p).unwrap();

        let solution = p.solution(Algorithm::BranchCut).unwrap();
        assert!(solution.is_optimal());
        assert_relative_eq!(solution.objective_value, 20.0, epsilon = 1e-6);
        assert_eq!(solution.row_dual, None);
        assert_eq!(solution.column_dual, None);
        assert_eq!(solution.row_primal.len(), 2);
        let gap = solution.gap.unwrap();
        assert!(gap < 1e-6, "gap {gap}");

        // the relaxation stays available
        let relaxation = p.solution(Algorithm::Simplex).unwrap();
        assert_relative_eq!(relaxation.objective_value, 21.0, epsilon = 1e-6);
        assert!(relaxation.row_dual.is_some());
        assert!(matches!(p.solution(Algorithm::InteriorPoint), Err(Error::SolverNotRun(_))));
    }

    #[test]
    fn test_solution_outlives_mutation() {
        let mut p = mip();
        Solver::new(SimplexConfig::default().with_verbosity(Verbosity::Off))
            .solve(&mut p)
            .unwrap();
        let solution = p.solution(Algorithm::Simplex).unwrap();
        p.delete_rows(&[1]).unwrap();
        drop(p);
        assert_eq!(solution.row_primal.len(), 2);
        assert_relative_eq!(solution.column_value(1).unwrap(), 3.0, epsilon = 1e-6);
        assert_relative_eq!(solution.column_value(2).unwrap(), 1.5, epsilon = 1e-6);
        assert_eq!(solution.column_value(0), None);
        assert_eq!(solution.row_value(3), None);
    }
}
