//! Solve orchestration.
//!
//! Each family has one table from engine return codes to what they mean for
//! the caller: a finished solve, a limit, a status decided without a solution,
//! or an error.

use lpkit_engine::consts::*;
use lpkit_engine::{self as engine, Prob};
use tracing::{debug, warn};

use crate::config::{BranchCutConfig, InteriorConfig, SimplexConfig, SolverConfig};
use crate::error::{Error, Result};
use crate::problem::{Problem, SolveRecord};
use crate::types::{Algorithm, NativeCode, SolutionStatus};

/// Condition that stopped a solve early. Not an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum LimitReached {
    Iterations,
    Time,
    ObjectiveLowerLimit,
    ObjectiveUpperLimit,
    /// The relative gap fell below the configured tolerance.
    Gap,
}

/// Summary of one [`Solver::solve`] call.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SolveReport {
    pub algorithm: Algorithm,
    pub status: SolutionStatus,
    pub limit: Option<LimitReached>,
    /// Status of the relaxation solved ahead of branch-and-cut.
    pub relaxation: Option<SolutionStatus>,
    /// Whether the integer search was entered.
    pub search_ran: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Failure {
    BadBasis,
    Singular,
    IllConditioned,
    IncorrectBounds,
    NoRootBasis,
    NoConvergence,
    Instability,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Meaning {
    /// Read the status from the engine.
    Solved,
    Limit(LimitReached),
    /// Decided without a usable solution.
    Status(SolutionStatus),
    Fails(Failure),
}

type CodeTable = &'static [(NativeCode, Meaning)];

const SIMPLEX_CODES: CodeTable = &[
    (OK, Meaning::Solved),
    (EBADB, Meaning::Fails(Failure::BadBasis)),
    (ESING, Meaning::Fails(Failure::Singular)),
    (ECOND, Meaning::Fails(Failure::IllConditioned)),
    (EBOUND, Meaning::Fails(Failure::IncorrectBounds)),
    (EOBJLL, Meaning::Limit(LimitReached::ObjectiveLowerLimit)),
    (EOBJUL, Meaning::Limit(LimitReached::ObjectiveUpperLimit)),
    (EITLIM, Meaning::Limit(LimitReached::Iterations)),
    (ETMLIM, Meaning::Limit(LimitReached::Time)),
    (ENOPFS, Meaning::Status(SolutionStatus::Infeasible)),
    (ENODFS, Meaning::Status(SolutionStatus::Unbounded)),
];

const INTERIOR_CODES: CodeTable = &[
    (OK, Meaning::Solved),
    // The engine status tells an infeasible primal from an unbounded one.
    (ENOFEAS, Meaning::Solved),
    (ENOCVG, Meaning::Fails(Failure::NoConvergence)),
    (EITLIM, Meaning::Limit(LimitReached::Iterations)),
    (EINSTAB, Meaning::Fails(Failure::Instability)),
];

const INTOPT_CODES: CodeTable = &[
    (OK, Meaning::Solved),
    (EBOUND, Meaning::Fails(Failure::IncorrectBounds)),
    (EROOT, Meaning::Fails(Failure::NoRootBasis)),
    (ENOPFS, Meaning::Status(SolutionStatus::Infeasible)),
    (ENODFS, Meaning::Status(SolutionStatus::Unbounded)),
    (EMIPGAP, Meaning::Limit(LimitReached::Gap)),
    (ETMLIM, Meaning::Limit(LimitReached::Time)),
];

fn interpret(table: CodeTable, algorithm: Algorithm, code: NativeCode) -> Result<Meaning> {
    let meaning = table
        .iter()
        .find(|&&(known, _)| known == code)
        .map(|&(_, meaning)| meaning)
        .ok_or(Error::Engine { algorithm, code })?;
    match meaning {
        Meaning::Fails(failure) => Err(match failure {
            Failure::BadBasis => Error::BadBasis { algorithm },
            Failure::Singular => Error::SingularMatrix { algorithm },
            Failure::IllConditioned => Error::IllConditioned { algorithm },
            Failure::IncorrectBounds => Error::IncorrectBounds { algorithm },
            Failure::NoRootBasis => Error::NoRootBasis,
            Failure::NoConvergence => Error::NoConvergence { algorithm },
            Failure::Instability => Error::NumericalInstability { algorithm },
        }),
        meaning => Ok(meaning),
    }
}

/// Turns a non-fatal meaning and the engine's own status into a record.
fn settle(meaning: Meaning, engine_status: NativeCode) -> Result<SolveRecord> {
    let reported = SolutionStatus::from_native(engine_status)?;
    Ok(match meaning {
        Meaning::Limit(limit) => SolveRecord {
            status: if reported.has_solution() {
                SolutionStatus::Feasible
            } else {
                SolutionStatus::Undefined
            },
            limit: Some(limit),
        },
        Meaning::Status(status) => SolveRecord { status, limit: None },
        _ => SolveRecord {
            status: reported,
            limit: None,
        },
    })
}

/// Runs one solver family against a [`Problem`].
#[derive(Debug, Clone, PartialEq)]
pub struct Solver {
    config: SolverConfig,
}

impl Default for Solver {
    fn default() -> Self {
        Self::new(SimplexConfig::default())
    }
}

impl Solver {
    pub fn new(config: impl Into<SolverConfig>) -> Self {
        Self { config: config.into() }
    }

    pub fn simplex() -> Self {
        Self::new(SimplexConfig::default())
    }

    pub fn interior() -> Self {
        Self::new(InteriorConfig::default())
    }

    pub fn branch_cut() -> Self {
        Self::new(BranchCutConfig::default())
    }

    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    pub fn algorithm(&self) -> Algorithm {
        self.config.algorithm()
    }

    /// Solves `problem` and records the outcome on it for later extraction.
    ///
    /// Limits are reported in the returned [`SolveReport`], never as errors.
    /// On error the problem is left unsolved.
    pub fn solve(&self, problem: &mut Problem) -> Result<SolveReport> {
        self.config.validate()?;
        let algorithm = self.algorithm();
        debug!(
            component = "solver",
            operation = "solve",
            algorithm = %algorithm,
            rows = problem.row_count(),
            columns = problem.column_count(),
            "starting"
        );

        problem.begin_solve();
        let result = match &self.config {
            SolverConfig::Simplex(config) => run_simplex(problem, config).map(|record| SolveReport {
                algorithm,
                status: record.status,
                limit: record.limit,
                relaxation: None,
                search_ran: false,
            }),
            SolverConfig::Interior(config) => run_interior(problem, config).map(|record| SolveReport {
                algorithm,
                status: record.status,
                limit: record.limit,
                relaxation: None,
                search_ran: false,
            }),
            SolverConfig::BranchCut(config) => run_branch_cut(problem, config),
        };

        match &result {
            Ok(report) => {
                problem.finish_solve(report.status);
                debug!(
                    component = "solver",
                    operation = "solve",
                    algorithm = %algorithm,
                    status = ?report.status,
                    limit = ?report.limit,
                    "finished"
                );
            }
            Err(err) => {
                problem.abort_solve();
                warn!(component = "solver", operation = "solve", algorithm = %algorithm, error = %err, "failed");
            }
        }
        result
    }
}

fn call_engine<P>(problem: &Problem, parm: &P, entry: unsafe fn(*mut Prob, *const P) -> NativeCode) -> NativeCode {
    // SAFETY: the handle is live for the borrow and `parm` outlives the call.
    unsafe { entry(problem.raw(), parm) }
}

fn warn_limit(algorithm: Algorithm, record: &SolveRecord) {
    if let Some(limit) = record.limit {
        warn!(
            component = "solver",
            operation = "solve",
            algorithm = %algorithm,
            limit = ?limit,
            status = ?record.status,
            "stopped on limit"
        );
    }
}

fn run_simplex(problem: &mut Problem, config: &SimplexConfig) -> Result<SolveRecord> {
    let code = call_engine(problem, &config.to_native(), engine::simplex);
    let meaning = interpret(SIMPLEX_CODES, Algorithm::Simplex, code)?;
    let record = settle(meaning, unsafe { engine::get_status(problem.raw()) })?;
    warn_limit(Algorithm::Simplex, &record);
    problem.record(Algorithm::Simplex, record);
    Ok(record)
}

fn run_interior(problem: &mut Problem, config: &InteriorConfig) -> Result<SolveRecord> {
    let code = call_engine(problem, &config.to_native(), engine::interior);
    let meaning = interpret(INTERIOR_CODES, Algorithm::InteriorPoint, code)?;
    let record = settle(meaning, unsafe { engine::ipt_status(problem.raw()) })?;
    warn_limit(Algorithm::InteriorPoint, &record);
    problem.record(Algorithm::InteriorPoint, record);
    Ok(record)
}

/// Relaxation first; the integer search runs only from an optimal relaxation.
fn run_branch_cut(problem: &mut Problem, config: &BranchCutConfig) -> Result<SolveReport> {
    if problem.integer_column_count() == 0 {
        return Err(Error::NoIntegerColumns);
    }

    let relaxation = run_simplex(problem, &config.relaxation)?;
    let report = |record: SolveRecord, search_ran| SolveReport {
        algorithm: Algorithm::BranchCut,
        status: record.status,
        limit: record.limit,
        relaxation: Some(relaxation.status),
        search_ran,
    };

    if relaxation.status != SolutionStatus::Optimal {
        // An integer problem is never more feasible than its relaxation.
        let record = match (relaxation.status, relaxation.limit) {
            (SolutionStatus::Infeasible | SolutionStatus::Unbounded, _) => SolveRecord {
                status: relaxation.status,
                limit: None,
            },
            (_, limit) => SolveRecord {
                status: SolutionStatus::Undefined,
                limit,
            },
        };
        warn!(
            component = "solver",
            operation = "branch_cut",
            relaxation = ?relaxation.status,
            status = ?record.status,
            "relaxation not optimal; skipping integer search"
        );
        problem.record(Algorithm::BranchCut, record);
        return Ok(report(record, false));
    }

    let code = call_engine(problem, &config.to_native(), engine::intopt);
    let meaning = interpret(INTOPT_CODES, Algorithm::BranchCut, code)?;
    let record = settle(meaning, unsafe { engine::mip_status(problem.raw()) })?;
    warn_limit(Algorithm::BranchCut, &record);
    problem.record(Algorithm::BranchCut, record);
    Ok(report(record, true))
}
