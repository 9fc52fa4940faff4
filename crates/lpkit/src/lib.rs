//! Problem modeling and solve orchestration for LP and MIP problems.
//!
//! Build a [`Problem`], pick a [`Solver`] configuration, solve, then take a
//! [`Solution`] snapshot:
//!
//! ```
//! use lpkit::{Algorithm, BoundKind, Direction, Problem, Solver};
//!
//! let mut problem = Problem::new()?;
//! problem.set_direction(Direction::Maximize);
//! problem.add_rows(1)?;
//! problem.add_columns(2)?;
//! problem.set_row_bounds(1, BoundKind::Upper, 0.0, 4.0)?;
//! problem.set_row_coefficients(1, &[1, 2], &[1.0, 2.0])?;
//! for column in 1..=2 {
//!     problem.set_column_bounds(column, BoundKind::Lower, 0.0, 0.0)?;
//!     problem.set_objective_coefficient(column, 1.0)?;
//! }
//!
//! Solver::simplex().solve(&mut problem)?;
//! let solution = problem.solution(Algorithm::Simplex)?;
//! assert!((solution.objective_value - 4.0).abs() < 1e-9);
//! # Ok::<(), lpkit::Error>(())
//! ```

mod buffer;
pub mod config;
mod error;
mod handle;
mod problem;
mod solution;
mod solver;
mod types;

pub use config::{
    Backtracking, BranchCutConfig, Branching, ConfigError, InteriorConfig, Ordering, Preprocessing, Pricing,
    RatioTest, SimplexConfig, SimplexMethod, SolverConfig, Verbosity,
};
pub use error::{Error, ErrorKind, Result};
pub use problem::{EngineStats, Problem, SolveState, SparseMatrix};
pub use solution::{Solution, relative_gap};
pub use solver::{LimitReached, SolveReport, Solver};
pub use types::{Algorithm, Bound, BoundKind, Direction, InvalidCodeError, NativeCode, SolutionStatus, VarKind};
